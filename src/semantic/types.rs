//! Type table: declared types, resolved type references and generic substitution

use crate::syntax::TypeDeclKind;
use std::collections::HashMap;
use std::fmt;

/// Index of a declared type in the [`TypeTable`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DefId(pub u32);

/// A resolved static type
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Ty {
    /// Built-in type by CLR metadata name (`Int32`, `Object`, ...)
    Primitive(&'static str),
    /// Type of the `null` literal
    Null,
    /// Type parameter of a declared generic type
    Param { owner: DefId, index: usize },
    /// Type parameter of a generic method
    MethodParam(String),
    /// Declared type, with type arguments when generic
    Named { def: DefId, args: Vec<Ty> },
    Array(Box<Ty>),
    Nullable(Box<Ty>),
}

const PREDEFINED: &[(&str, &str)] = &[
    ("bool", "Boolean"),
    ("byte", "Byte"),
    ("sbyte", "SByte"),
    ("short", "Int16"),
    ("ushort", "UInt16"),
    ("int", "Int32"),
    ("uint", "UInt32"),
    ("long", "Int64"),
    ("ulong", "UInt64"),
    ("float", "Single"),
    ("double", "Double"),
    ("decimal", "Decimal"),
    ("char", "Char"),
    ("string", "String"),
    ("object", "Object"),
    ("void", "Void"),
];

// Widening order used for binary numeric promotion
const NUMERIC_RANK: &[&str] = &[
    "Byte", "SByte", "Int16", "UInt16", "Char", "Int32", "UInt32", "Int64", "UInt64", "Single",
    "Double", "Decimal",
];

impl Ty {
    /// Built-in type for a C# keyword such as `int`
    pub fn predefined(keyword: &str) -> Option<Ty> {
        PREDEFINED
            .iter()
            .find(|(kw, _)| *kw == keyword)
            .map(|(_, clr)| Ty::Primitive(*clr))
    }

    /// Built-in type by metadata name, optionally `System.` qualified
    pub fn from_clr_name(name: &str) -> Option<Ty> {
        let name = name.strip_prefix("System.").unwrap_or(name);
        PREDEFINED
            .iter()
            .find(|(_, clr)| *clr == name)
            .map(|(_, clr)| Ty::Primitive(*clr))
    }

    pub fn boolean() -> Ty {
        Ty::Primitive("Boolean")
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Ty::Primitive(name) if NUMERIC_RANK.contains(name))
    }

    /// Wider of two numeric primitives, at least `Int32`
    pub fn promote(a: &Ty, b: &Ty) -> Option<Ty> {
        let rank = |ty: &Ty| match ty {
            Ty::Primitive(name) => NUMERIC_RANK.iter().position(|n| n == name),
            _ => None,
        };
        let int32 = NUMERIC_RANK.iter().position(|n| *n == "Int32")?;
        let widest = rank(a)?.max(rank(b)?).max(int32);
        Some(Ty::Primitive(NUMERIC_RANK[widest]))
    }

    /// Replace type parameters of `owner` by `args`
    pub fn subst(&self, owner: DefId, args: &[Ty]) -> Ty {
        match self {
            Ty::Param { owner: o, index } if *o == owner => {
                args.get(*index).cloned().unwrap_or_else(|| self.clone())
            }
            Ty::Named { def, args: inner } => Ty::Named {
                def: *def,
                args: inner.iter().map(|a| a.subst(owner, args)).collect(),
            },
            Ty::Array(elem) => Ty::Array(Box::new(elem.subst(owner, args))),
            Ty::Nullable(inner) => Ty::Nullable(Box::new(inner.subst(owner, args))),
            _ => self.clone(),
        }
    }
}

/// Kind of a type member
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberKind {
    Field,
    Property,
    Method,
}

impl fmt::Display for MemberKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            MemberKind::Field => "field",
            MemberKind::Property => "property",
            MemberKind::Method => "method",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone)]
pub struct MemberDef {
    pub name: String,
    pub kind: MemberKind,
    /// Declared type (return type for methods); `None` when unresolved or `void`
    pub ty: Option<Ty>,
    pub is_static: bool,
}

/// User-defined conversion operator declared on a type
#[derive(Debug, Clone)]
pub struct ConversionDef {
    pub implicit: bool,
    pub source: Option<Ty>,
    pub target: Option<Ty>,
}

#[derive(Debug, Clone)]
pub struct TypeDef {
    pub name: String,
    pub namespace: Option<String>,
    pub kind: TypeDeclKind,
    pub type_params: Vec<String>,
    /// Base class, with substitution applied relative to this type's parameters
    pub base: Option<Ty>,
    pub members: Vec<MemberDef>,
    pub conversions: Vec<ConversionDef>,
}

impl TypeDef {
    pub fn qualified_name(&self) -> String {
        match &self.namespace {
            Some(ns) => format!("{}.{}", ns, self.name),
            None => self.name.clone(),
        }
    }

    pub fn is_value_type(&self) -> bool {
        matches!(self.kind, TypeDeclKind::Struct | TypeDeclKind::Enum)
    }
}

/// A member found by lookup, with the owner's type arguments substituted
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedMember {
    /// Type that declares the member
    pub owner: Ty,
    pub name: String,
    pub kind: MemberKind,
    pub ty: Option<Ty>,
    pub is_static: bool,
}

/// Implicit conversion reachable from a type through its base chain
#[derive(Debug, Clone, PartialEq)]
pub struct ImplicitConversion {
    /// Instantiation of the type that declares the operator
    pub declared_in: Ty,
    pub target: Ty,
}

// Bound on base-chain walks; protects against cyclic inheritance in broken code
const MAX_BASE_DEPTH: usize = 64;

/// Arena of all types declared in a compilation unit
#[derive(Debug, Clone, Default)]
pub struct TypeTable {
    defs: Vec<TypeDef>,
    /// (simple name, arity) -> declarations
    by_name: HashMap<(String, usize), Vec<DefId>>,
}

impl TypeTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn declare(&mut self, def: TypeDef) -> DefId {
        let id = DefId(self.defs.len() as u32);
        self.by_name
            .entry((def.name.clone(), def.type_params.len()))
            .or_default()
            .push(id);
        self.defs.push(def);
        id
    }

    pub fn def(&self, id: DefId) -> &TypeDef {
        &self.defs[id.0 as usize]
    }

    pub(crate) fn def_mut(&mut self, id: DefId) -> &mut TypeDef {
        &mut self.defs[id.0 as usize]
    }

    pub fn len(&self) -> usize {
        self.defs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.defs.is_empty()
    }

    /// Find a declared type by possibly qualified name and arity.
    /// Unqualified names prefer a declaration in `namespace`.
    pub fn find(&self, name: &str, arity: usize, namespace: Option<&str>) -> Option<DefId> {
        let (qualifier, simple) = match name.rsplit_once('.') {
            Some((q, s)) => (Some(q), s),
            None => (None, name),
        };
        let candidates = self.by_name.get(&(simple.to_string(), arity))?;
        if let Some(qualifier) = qualifier {
            return candidates.iter().copied().find(|id| {
                let def = self.def(*id);
                def.namespace.as_deref() == Some(qualifier)
                    || def
                        .namespace
                        .as_deref()
                        .is_some_and(|ns| ns.ends_with(&format!(".{}", qualifier)))
            });
        }
        candidates
            .iter()
            .copied()
            .find(|id| namespace.is_some() && self.def(*id).namespace.as_deref() == namespace)
            .or_else(|| candidates.first().copied())
    }

    /// Whether any declared type lives in (or below) the given namespace
    pub fn has_namespace(&self, namespace: &str) -> bool {
        self.defs.iter().any(|d| {
            d.namespace.as_deref().is_some_and(|ns| {
                ns == namespace || ns.starts_with(&format!("{}.", namespace))
            })
        })
    }

    /// Simple metadata name of a type (`Int32`, `NetInt`, `T`)
    pub fn name_of(&self, ty: &Ty) -> String {
        match ty {
            Ty::Primitive(name) => name.to_string(),
            Ty::Null => "null".to_string(),
            Ty::Param { owner, index } => self
                .def(*owner)
                .type_params
                .get(*index)
                .cloned()
                .unwrap_or_default(),
            Ty::MethodParam(name) => name.clone(),
            Ty::Named { def, .. } => self.def(*def).name.clone(),
            Ty::Array(elem) => format!("{}[]", self.name_of(elem)),
            Ty::Nullable(_) => "Nullable".to_string(),
        }
    }

    /// Source-like rendering including type arguments, for notes and debugging
    pub fn display(&self, ty: &Ty) -> String {
        match ty {
            Ty::Named { def, args } if !args.is_empty() => {
                let args: Vec<_> = args.iter().map(|a| self.display(a)).collect();
                format!("{}<{}>", self.def(*def).name, args.join(", "))
            }
            Ty::Array(elem) => format!("{}[]", self.display(elem)),
            Ty::Nullable(inner) => format!("{}?", self.display(inner)),
            _ => self.name_of(ty),
        }
    }

    pub fn is_value_type(&self, ty: &Ty) -> bool {
        match ty {
            Ty::Primitive(name) => !matches!(*name, "String" | "Object"),
            Ty::Named { def, .. } => self.def(*def).is_value_type(),
            Ty::Nullable(_) => true,
            _ => false,
        }
    }

    /// Base class of a type, substituted for its type arguments
    pub fn base_of(&self, ty: &Ty) -> Option<Ty> {
        let Ty::Named { def, args } = ty else {
            return None;
        };
        self.def(*def).base.as_ref().map(|b| b.subst(*def, args))
    }

    /// The type followed by its base classes
    pub fn base_chain(&self, ty: &Ty) -> Vec<Ty> {
        let mut chain = vec![ty.clone()];
        let mut current = ty.clone();
        while let Some(base) = self.base_of(&current) {
            if chain.len() >= MAX_BASE_DEPTH || chain.contains(&base) {
                break;
            }
            chain.push(base.clone());
            current = base;
        }
        chain
    }

    /// Look up a field, property or method by name on a type and its bases
    pub fn lookup_member(&self, ty: &Ty, name: &str) -> Option<ResolvedMember> {
        for owner in self.base_chain(ty) {
            let Ty::Named { def, args } = &owner else {
                continue;
            };
            if let Some(member) = self.def(*def).members.iter().find(|m| m.name == name) {
                return Some(ResolvedMember {
                    owner: owner.clone(),
                    name: member.name.clone(),
                    kind: member.kind,
                    ty: member.ty.as_ref().map(|t| t.subst(*def, args)),
                    is_static: member.is_static,
                });
            }
        }
        None
    }

    /// Every implicit user-defined conversion declared on a type or its bases,
    /// with type arguments substituted
    pub fn implicit_conversions(&self, ty: &Ty) -> Vec<ImplicitConversion> {
        let mut out = Vec::new();
        for owner in self.base_chain(ty) {
            let Ty::Named { def, args } = &owner else {
                continue;
            };
            for conversion in &self.def(*def).conversions {
                if !conversion.implicit {
                    continue;
                }
                if let Some(target) = &conversion.target {
                    out.push(ImplicitConversion {
                        declared_in: owner.clone(),
                        target: target.subst(*def, args),
                    });
                }
            }
        }
        out
    }
}

/// Borrowed view of a static type for queries by the analysis layer
#[derive(Debug, Clone, Copy)]
pub struct TypeDescriptor<'a> {
    table: &'a TypeTable,
    ty: &'a Ty,
}

impl<'a> TypeDescriptor<'a> {
    pub fn new(table: &'a TypeTable, ty: &'a Ty) -> Self {
        Self { table, ty }
    }

    pub fn ty(&self) -> &'a Ty {
        self.ty
    }

    pub fn table(&self) -> &'a TypeTable {
        self.table
    }

    /// Simple metadata name
    pub fn name(&self) -> String {
        self.table.name_of(self.ty)
    }

    pub fn implicit_conversions(&self) -> Vec<ImplicitConversion> {
        self.table.implicit_conversions(self.ty)
    }
}
