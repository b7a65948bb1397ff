//! Declares the types of a compilation unit and records static types of expressions

use super::types::{
    ConversionDef, DefId, MemberDef, MemberKind, ResolvedMember, Ty, TypeDef, TypeTable,
};
use super::SemanticModel;
use crate::syntax::*;
use std::collections::HashMap;

/// Build the semantic model for a parsed compilation unit
pub fn bind(unit: &CompilationUnit) -> SemanticModel {
    let decls = unit.all_types();
    let mut table = TypeTable::new();
    let ids: Vec<DefId> = decls
        .iter()
        .map(|decl| {
            table.declare(TypeDef {
                name: decl.name.name.clone(),
                namespace: decl.namespace.clone(),
                kind: decl.kind,
                type_params: decl.type_params.iter().map(|p| p.name.clone()).collect(),
                base: None,
                members: Vec::new(),
                conversions: Vec::new(),
            })
        })
        .collect();

    for (decl, id) in decls.iter().zip(&ids) {
        declare_signatures(&mut table, decl, *id);
    }

    let (types, members) = {
        let mut binder = Binder::new(&table);
        for (decl, id) in decls.iter().zip(&ids) {
            binder.bind_type_decl(decl, *id);
        }
        (binder.types, binder.members)
    };
    log::debug!(
        "bound {} types, {} typed expressions, {} member references",
        table.len(),
        types.len(),
        members.len()
    );
    SemanticModel::new(table, types, members)
}

/// `Foo<T, U>` seen from inside its own declaration
fn self_type(table: &TypeTable, def: DefId) -> Ty {
    let args = (0..table.def(def).type_params.len())
        .map(|index| Ty::Param { owner: def, index })
        .collect();
    Ty::Named { def, args }
}

fn declare_signatures(table: &mut TypeTable, decl: &TypeDecl, id: DefId) {
    let (base, members, conversions) = {
        let resolver = Resolver {
            table: &*table,
            namespace: decl.namespace.as_deref(),
            owner: Some(id),
            method_params: &[],
        };

        let base = match decl.kind {
            TypeDeclKind::Class | TypeDeclKind::Record => decl
                .bases
                .iter()
                .filter_map(|b| resolver.resolve(b))
                .find(|ty| match ty {
                    Ty::Named { def, .. } => {
                        *def != id && table.def(*def).kind != TypeDeclKind::Interface
                    }
                    _ => false,
                }),
            _ => None,
        };

        let mut members = Vec::new();
        let mut conversions = Vec::new();
        for member in &decl.members {
            match member {
                Member::Field {
                    ty,
                    declarators,
                    is_static,
                } => {
                    let ty = resolver.resolve(ty);
                    members.extend(declarators.iter().map(|d| MemberDef {
                        name: d.name.name.clone(),
                        kind: MemberKind::Field,
                        ty: ty.clone(),
                        is_static: *is_static,
                    }));
                }
                Member::Property {
                    ty, name, is_static, ..
                } => members.push(MemberDef {
                    name: name.name.clone(),
                    kind: MemberKind::Property,
                    ty: resolver.resolve(ty),
                    is_static: *is_static,
                }),
                Member::Method {
                    return_type,
                    name,
                    type_params,
                    is_static,
                    ..
                } => {
                    let method_params: Vec<String> =
                        type_params.iter().map(|p| p.name.clone()).collect();
                    let resolver = Resolver {
                        method_params: &method_params,
                        ..resolver
                    };
                    members.push(MemberDef {
                        name: name.name.clone(),
                        kind: MemberKind::Method,
                        ty: return_type.as_ref().and_then(|t| resolver.resolve(t)),
                        is_static: *is_static,
                    });
                }
                Member::Conversion {
                    implicit,
                    target,
                    params,
                    ..
                } => conversions.push(ConversionDef {
                    implicit: *implicit,
                    source: params
                        .first()
                        .and_then(|p| p.ty.as_ref())
                        .and_then(|t| resolver.resolve(t)),
                    target: resolver.resolve(target),
                }),
                Member::EnumMember { name, .. } => members.push(MemberDef {
                    name: name.name.clone(),
                    kind: MemberKind::Field,
                    ty: Some(self_type(table, id)),
                    is_static: true,
                }),
                Member::Constructor { .. } | Member::Operator { .. } | Member::Type(_) => {}
            }
        }
        (base, members, conversions)
    };

    let def = table.def_mut(id);
    def.base = base;
    def.members = members;
    def.conversions = conversions;
}

/// Turns type syntax into resolved types within one lexical context
#[derive(Clone, Copy)]
struct Resolver<'a> {
    table: &'a TypeTable,
    namespace: Option<&'a str>,
    owner: Option<DefId>,
    method_params: &'a [String],
}

impl Resolver<'_> {
    fn resolve(&self, ty: &TypeSyntax) -> Option<Ty> {
        match &ty.kind {
            TypeSyntaxKind::Predefined(keyword) => Ty::predefined(keyword),
            TypeSyntaxKind::Named { segments, args } => {
                if segments.len() == 1 && args.is_empty() {
                    if let Some(param) = self.type_param(&segments[0].name) {
                        return Some(param);
                    }
                }
                let args = args
                    .iter()
                    .map(|a| self.resolve(a))
                    .collect::<Option<Vec<_>>>()?;
                let name = segments
                    .iter()
                    .map(|s| s.name.as_str())
                    .collect::<Vec<_>>()
                    .join(".");
                match self.table.find(&name, args.len(), self.namespace) {
                    Some(def) => Some(Ty::Named { def, args }),
                    None if args.is_empty() => Ty::from_clr_name(&name),
                    None => None,
                }
            }
            TypeSyntaxKind::Array(elem) => Some(Ty::Array(Box::new(self.resolve(elem)?))),
            TypeSyntaxKind::Nullable(inner) => {
                let inner = self.resolve(inner)?;
                if self.table.is_value_type(&inner) {
                    Some(Ty::Nullable(Box::new(inner)))
                } else {
                    // nullable reference annotation
                    Some(inner)
                }
            }
        }
    }

    fn type_param(&self, name: &str) -> Option<Ty> {
        if let Some(owner) = self.owner {
            let params = &self.table.def(owner).type_params;
            if let Some(index) = params.iter().position(|p| p == name) {
                return Some(Ty::Param { owner, index });
            }
        }
        self.method_params
            .iter()
            .any(|p| p == name)
            .then(|| Ty::MethodParam(name.to_string()))
    }

    /// A simple name used as an expression that denotes a type
    fn type_name(&self, name: &str) -> Option<Ty> {
        if let Some(ty) = Ty::predefined(name) {
            return Some(ty);
        }
        if let Some(param) = self.type_param(name) {
            return Some(param);
        }
        match self.table.find(name, 0, self.namespace) {
            Some(def) => Some(Ty::Named { def, args: Vec::new() }),
            None => Ty::from_clr_name(name),
        }
    }
}

/// What an expression denotes during binding
#[derive(Debug, Clone)]
enum Bound {
    Value(Option<Ty>),
    Type(Ty),
    Namespace(String),
    /// Method group, with the method's return type
    Method(Option<Ty>),
}

struct Binder<'t> {
    table: &'t TypeTable,
    types: HashMap<ExprId, Ty>,
    members: HashMap<ExprId, ResolvedMember>,
    scopes: Vec<HashMap<String, Option<Ty>>>,
    owner: Option<DefId>,
    self_ty: Option<Ty>,
    namespace: Option<String>,
    method_params: Vec<String>,
}

impl<'t> Binder<'t> {
    fn new(table: &'t TypeTable) -> Self {
        Self {
            table,
            types: HashMap::new(),
            members: HashMap::new(),
            scopes: Vec::new(),
            owner: None,
            self_ty: None,
            namespace: None,
            method_params: Vec::new(),
        }
    }

    fn resolver(&self) -> Resolver<'_> {
        Resolver {
            table: self.table,
            namespace: self.namespace.as_deref(),
            owner: self.owner,
            method_params: &self.method_params,
        }
    }

    fn resolve(&self, ty: &TypeSyntax) -> Option<Ty> {
        self.resolver().resolve(ty)
    }

    // ---- scopes ----

    fn push_scope(&mut self) {
        self.scopes.push(HashMap::new());
    }

    fn pop_scope(&mut self) {
        self.scopes.pop();
    }

    fn declare_local(&mut self, name: &str, ty: Option<Ty>) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.to_string(), ty);
        }
    }

    fn lookup_local(&self, name: &str) -> Option<Option<Ty>> {
        self.scopes
            .iter()
            .rev()
            .find_map(|scope| scope.get(name).cloned())
    }

    fn declare_params(&mut self, params: &[Param]) {
        for param in params {
            if let Some(default) = &param.default {
                self.bind_value(default);
            }
            let ty = param.ty.as_ref().and_then(|t| self.resolve(t));
            self.declare_local(&param.name.name, ty);
        }
    }

    // ---- declarations ----

    fn bind_type_decl(&mut self, decl: &TypeDecl, def: DefId) {
        self.owner = Some(def);
        self.self_ty = Some(self_type(self.table, def));
        self.namespace = decl.namespace.clone();

        for member in &decl.members {
            match member {
                Member::Field { declarators, .. } => {
                    for init in declarators.iter().filter_map(|d| d.init.as_ref()) {
                        self.bind_value(init);
                    }
                }
                Member::Property {
                    ty,
                    accessors,
                    expression_body,
                    initializer,
                    ..
                } => {
                    if let Some(init) = initializer {
                        self.bind_value(init);
                    }
                    if let Some(body) = expression_body {
                        self.bind_value(body);
                    }
                    for accessor in accessors {
                        self.push_scope();
                        if matches!(accessor.name.name.as_str(), "set" | "init") {
                            let value_ty = self.resolve(ty);
                            self.declare_local("value", value_ty);
                        }
                        if let Some(body) = &accessor.body {
                            self.bind_body(body);
                        }
                        self.pop_scope();
                    }
                }
                Member::Method {
                    type_params,
                    params,
                    body,
                    ..
                } => {
                    self.method_params = type_params.iter().map(|p| p.name.clone()).collect();
                    self.bind_function(params, body.as_ref());
                    self.method_params.clear();
                }
                Member::Constructor { params, body, .. }
                | Member::Conversion { params, body, .. }
                | Member::Operator { params, body, .. } => {
                    self.bind_function(params, body.as_ref());
                }
                Member::EnumMember { value, .. } => {
                    if let Some(value) = value {
                        self.bind_value(value);
                    }
                }
                // bound on its own from the unit's type list
                Member::Type(_) => {}
            }
        }
    }

    fn bind_function(&mut self, params: &[Param], body: Option<&Body>) {
        self.push_scope();
        self.declare_params(params);
        if let Some(body) = body {
            self.bind_body(body);
        }
        self.pop_scope();
    }

    fn bind_body(&mut self, body: &Body) {
        match body {
            Body::Block(block) => self.bind_block(block),
            Body::Expr(expr) => {
                self.bind_value(expr);
            }
        }
    }

    // ---- statements ----

    fn bind_block(&mut self, block: &Block) {
        self.push_scope();
        for stmt in &block.stmts {
            self.bind_stmt(stmt);
        }
        self.pop_scope();
    }

    fn bind_stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Block(block) => self.bind_block(block),
            Stmt::Empty(_) | Stmt::Break(_) | Stmt::Continue(_) | Stmt::Return(None, _) => {}
            Stmt::Local { ty, declarators } => {
                let declared = if ty.is_var() { None } else { self.resolve(ty) };
                for declarator in declarators {
                    let init_ty = declarator.init.as_ref().and_then(|e| self.bind_value(e));
                    let local_ty = if ty.is_var() { init_ty } else { declared.clone() };
                    self.declare_local(&declarator.name.name, local_ty);
                }
            }
            Stmt::Expr(expr) | Stmt::Return(Some(expr), _) => {
                self.bind_value(expr);
            }
            Stmt::If {
                cond,
                then_branch,
                else_branch,
            } => {
                self.bind_value(cond);
                self.bind_stmt(then_branch);
                if let Some(else_branch) = else_branch {
                    self.bind_stmt(else_branch);
                }
            }
            Stmt::While { cond, body } => {
                self.bind_value(cond);
                self.bind_stmt(body);
            }
            Stmt::Foreach {
                ty,
                name,
                iterable,
                body,
            } => {
                let iterable_ty = self.bind_value(iterable);
                let element_ty = if ty.is_var() {
                    match iterable_ty {
                        Some(Ty::Array(elem)) => Some(*elem),
                        Some(Ty::Primitive("String")) => Some(Ty::Primitive("Char")),
                        _ => None,
                    }
                } else {
                    self.resolve(ty)
                };
                self.push_scope();
                self.declare_local(&name.name, element_ty);
                self.bind_stmt(body);
                self.pop_scope();
            }
        }
    }

    // ---- expressions ----

    /// Bind an expression used as a value and return its static type
    fn bind_value(&mut self, expr: &Expr) -> Option<Ty> {
        match self.bind_expr(expr) {
            Bound::Value(ty) => ty,
            Bound::Type(_) | Bound::Namespace(_) | Bound::Method(_) => None,
        }
    }

    fn bind_expr(&mut self, expr: &Expr) -> Bound {
        let bound = self.bind_kind(expr);
        if let Bound::Value(Some(ty)) = &bound {
            self.types.insert(expr.id, ty.clone());
        }
        bound
    }

    fn record_member(&mut self, id: ExprId, member: ResolvedMember) -> Bound {
        let bound = match member.kind {
            MemberKind::Method => Bound::Method(member.ty.clone()),
            MemberKind::Field | MemberKind::Property => Bound::Value(member.ty.clone()),
        };
        self.members.insert(id, member);
        bound
    }

    fn bind_kind(&mut self, expr: &Expr) -> Bound {
        match &expr.kind {
            ExprKind::Literal(literal) => Bound::Value(Some(literal_type(literal))),
            ExprKind::Name(ident) => self.bind_name(expr.id, &ident.name),
            ExprKind::This => Bound::Value(self.self_ty.clone()),
            ExprKind::Base => {
                let base = self.self_ty.as_ref().and_then(|t| self.table.base_of(t));
                Bound::Value(base)
            }
            ExprKind::Member {
                target,
                name,
                conditional,
            } => self.bind_member(expr.id, target, &name.name, *conditional),
            ExprKind::Paren(inner) => match self.bind_expr(inner) {
                Bound::Value(ty) => Bound::Value(ty),
                _ => Bound::Value(None),
            },
            ExprKind::Cast { ty, expr: operand } => {
                self.bind_value(operand);
                Bound::Value(self.resolve(ty))
            }
            ExprKind::Binary { op, left, right } => {
                let left = self.bind_value(left);
                let right = self.bind_value(right);
                Bound::Value(binary_type(*op, left, right))
            }
            ExprKind::Unary { op, operand } => {
                let operand = self.bind_value(operand);
                Bound::Value(match op {
                    UnaryOp::Not => Some(Ty::boolean()),
                    UnaryOp::Neg | UnaryOp::Plus | UnaryOp::BitNot => {
                        operand.and_then(|t| Ty::promote(&t, &t))
                    }
                    _ => operand,
                })
            }
            ExprKind::Assign { target, value, .. } => {
                let target = self.bind_value(target);
                self.bind_value(value);
                Bound::Value(target)
            }
            ExprKind::Conditional {
                cond,
                when_true,
                when_false,
            } => {
                self.bind_value(cond);
                let when_true = self.bind_value(when_true);
                let when_false = self.bind_value(when_false);
                Bound::Value(match when_true {
                    Some(Ty::Null) | None => when_false.or(when_true),
                    some => some,
                })
            }
            ExprKind::Is { expr: operand, .. } => {
                self.bind_value(operand);
                Bound::Value(Some(Ty::boolean()))
            }
            ExprKind::As { expr: operand, ty } => {
                self.bind_value(operand);
                Bound::Value(self.resolve(ty))
            }
            ExprKind::Invoke { callee, args } => {
                let callee = self.bind_expr(callee);
                for arg in args {
                    self.bind_value(arg);
                }
                match callee {
                    Bound::Method(ret) => Bound::Value(ret),
                    _ => Bound::Value(None),
                }
            }
            ExprKind::Index { target, args } => {
                let target = self.bind_value(target);
                for arg in args {
                    self.bind_value(arg);
                }
                Bound::Value(match target {
                    Some(Ty::Array(elem)) => Some(*elem),
                    Some(Ty::Primitive("String")) => Some(Ty::Primitive("Char")),
                    _ => None,
                })
            }
            ExprKind::New {
                ty,
                args,
                initializer,
            } => {
                let created = ty.as_ref().and_then(|t| self.resolve(t));
                for arg in args {
                    self.bind_value(arg);
                }
                match initializer {
                    Some(Initializer::Object(items)) => {
                        for (_, value) in items {
                            self.bind_value(value);
                        }
                    }
                    Some(Initializer::Collection(items)) => {
                        for item in items {
                            self.bind_value(item);
                        }
                    }
                    None => {}
                }
                Bound::Value(created)
            }
            ExprKind::TypeOf(_) => Bound::Value(None),
            ExprKind::Default(ty) => Bound::Value(ty.as_ref().and_then(|t| self.resolve(t))),
            ExprKind::Lambda { params, body } => {
                self.push_scope();
                self.declare_params(params);
                match body {
                    LambdaBody::Expr(body) => {
                        self.bind_value(body);
                    }
                    LambdaBody::Block(block) => self.bind_block(block),
                }
                self.pop_scope();
                Bound::Value(None)
            }
        }
    }

    fn bind_name(&mut self, id: ExprId, name: &str) -> Bound {
        if let Some(ty) = self.lookup_local(name) {
            return Bound::Value(ty);
        }
        let member = self
            .self_ty
            .as_ref()
            .and_then(|self_ty| self.table.lookup_member(self_ty, name));
        if let Some(member) = member {
            return self.record_member(id, member);
        }
        if let Some(ty) = self.resolver().type_name(name) {
            return Bound::Type(ty);
        }
        if self.table.has_namespace(name) {
            return Bound::Namespace(name.to_string());
        }
        Bound::Value(None)
    }

    fn bind_member(&mut self, id: ExprId, target: &Expr, name: &str, conditional: bool) -> Bound {
        let receiver = match self.bind_expr(target) {
            Bound::Value(Some(ty)) | Bound::Type(ty) => ty,
            Bound::Namespace(namespace) => {
                let qualified = format!("{}.{}", namespace, name);
                if let Some(def) = self.table.find(&qualified, 0, None) {
                    return Bound::Type(Ty::Named {
                        def,
                        args: Vec::new(),
                    });
                }
                if self.table.has_namespace(&qualified) {
                    return Bound::Namespace(qualified);
                }
                return Bound::Value(None);
            }
            Bound::Value(None) | Bound::Method(_) => return Bound::Value(None),
        };

        let receiver = match receiver {
            Ty::Nullable(inner) if conditional => *inner,
            other => other,
        };
        let Some(member) = self.table.lookup_member(&receiver, name) else {
            return Bound::Value(None);
        };
        match self.record_member(id, member) {
            // `a?.b` lifts value-typed results to nullable
            Bound::Value(Some(ty))
                if conditional && self.table.is_value_type(&ty) && !matches!(ty, Ty::Nullable(_)) =>
            {
                Bound::Value(Some(Ty::Nullable(Box::new(ty))))
            }
            bound => bound,
        }
    }
}

fn literal_type(literal: &Literal) -> Ty {
    match literal {
        Literal::Int(text) => {
            let suffix = text.to_ascii_lowercase();
            if suffix.ends_with("ul") || suffix.ends_with("lu") {
                Ty::Primitive("UInt64")
            } else if suffix.ends_with('l') {
                Ty::Primitive("Int64")
            } else if suffix.ends_with('u') {
                Ty::Primitive("UInt32")
            } else {
                Ty::Primitive("Int32")
            }
        }
        Literal::Real(text) => match text.chars().last().map(|c| c.to_ascii_lowercase()) {
            Some('f') => Ty::Primitive("Single"),
            Some('m') => Ty::Primitive("Decimal"),
            _ => Ty::Primitive("Double"),
        },
        Literal::Str(_) => Ty::Primitive("String"),
        Literal::Char(_) => Ty::Primitive("Char"),
        Literal::Bool(_) => Ty::boolean(),
        Literal::Null => Ty::Null,
    }
}

fn binary_type(op: BinaryOp, left: Option<Ty>, right: Option<Ty>) -> Option<Ty> {
    match op {
        op if op.is_comparison() => Some(Ty::boolean()),
        BinaryOp::And | BinaryOp::Or => Some(Ty::boolean()),
        BinaryOp::Coalesce => match left {
            Some(Ty::Nullable(inner)) => Some(*inner),
            Some(Ty::Null) | None => right,
            left => left,
        },
        BinaryOp::Add
            if left == Some(Ty::Primitive("String")) || right == Some(Ty::Primitive("String")) =>
        {
            Some(Ty::Primitive("String"))
        }
        BinaryOp::BitAnd | BinaryOp::BitOr | BinaryOp::BitXor
            if left == Some(Ty::boolean()) && right == Some(Ty::boolean()) =>
        {
            Some(Ty::boolean())
        }
        _ => Ty::promote(left.as_ref()?, right.as_ref()?),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::SourceText;
    use pretty_assertions::assert_eq;

    const NETCODE: &str = "
        namespace Netcode
        {
            public class NetInt : NetFieldBase<int, NetInt> { }
            public class NetRef : NetFieldBase<object, NetRef> { }
            public class NetFieldBase<T, TSelf> where TSelf : NetFieldBase<T, TSelf>
            {
                public T Value { get; set; }
                public static implicit operator T(NetFieldBase<T, TSelf> field) => field.Value;
            }
        }
        namespace StardewValley
        {
            using Netcode;
            class Item
            {
                public NetInt category { get; } = new NetInt { Value = 42 };
                public readonly NetRef owner = new NetRef();
                public int Category => this.category.Value;
            }
        }";

    /// Bind `body` inside a method next to the Netcode types and return the
    /// model plus the source text of every typed expression with its type name
    fn typed(body: &str) -> (SemanticModel, Vec<(String, String)>) {
        let src = format!(
            "{}\nnamespace SampleMod {{ using StardewValley; using Netcode; class ModEntry {{ void Entry(Item item) {{ {} }} }} }}",
            NETCODE, body
        );
        let source = SourceText::new(&src);
        let unit = crate::syntax::parse(&source).unwrap();
        let model = bind(&unit);
        let start = src.find("void Entry").unwrap();
        let mut out = Vec::new();
        for expr in unit.expressions() {
            if expr.span.start < start {
                continue;
            }
            if let Some(ty) = model.type_of(expr.id) {
                out.push((source.slice(expr.span).unwrap().to_string(), ty.name()));
            }
        }
        (model, out)
    }

    fn type_named<'a>(types: &'a [(String, String)], text: &str) -> Option<&'a str> {
        types
            .iter()
            .find(|(t, _)| t == text)
            .map(|(_, ty)| ty.as_str())
    }

    #[test]
    fn test_locals_and_literals() {
        let (_, types) = typed("NetInt intField = new NetInt { Value = 42 }; var x = intField; if (x < 42L);");
        assert_eq!(type_named(&types, "new NetInt { Value = 42 }"), Some("NetInt"));
        assert_eq!(type_named(&types, "42"), Some("Int32"));
        assert_eq!(type_named(&types, "x"), Some("NetInt"));
        assert_eq!(type_named(&types, "42L"), Some("Int64"));
        assert_eq!(type_named(&types, "x < 42L"), Some("Boolean"));
    }

    #[test]
    fn test_member_access_forms() {
        let (_, types) = typed("var a = item.category; var b = (item).category; var c = ((Item)item).category; var d = item?.category; var e = item.category.Value;");
        for text in ["item.category", "(item).category", "((Item)item).category", "item?.category"] {
            assert_eq!(type_named(&types, text), Some("NetInt"), "{}", text);
        }
        assert_eq!(type_named(&types, "item.category.Value"), Some("Int32"));
        assert_eq!(type_named(&types, "(Item)item"), Some("Item"));
    }

    #[test]
    fn test_conditional_access_lifts_value_types() {
        let (model, _) = typed("var v = item?.Category;");
        let lifted = model
            .types()
            .values()
            .any(|ty| matches!(ty, Ty::Nullable(inner) if **inner == Ty::Primitive("Int32")));
        assert!(lifted);
    }

    #[test]
    fn test_member_symbols() {
        let src = format!("{}\nclass C {{ void M(StardewValley.Item item) {{ var a = item.owner; var b = item.category; }} }}", NETCODE);
        let source = SourceText::new(&src);
        let unit = crate::syntax::parse(&source).unwrap();
        let model = bind(&unit);
        let mut symbols: Vec<_> = unit
            .expressions()
            .into_iter()
            .filter_map(|e| model.member_symbol(e.id).map(|m| (source.slice(e.span).unwrap(), m.kind, model.table().name_of(&m.owner))))
            .filter(|(text, _, _)| text.starts_with("item."))
            .collect();
        symbols.sort_by(|a, b| a.0.cmp(b.0));
        assert_eq!(
            symbols,
            vec![
                ("item.category", MemberKind::Property, "Item".to_string()),
                ("item.owner", MemberKind::Field, "Item".to_string()),
            ]
        );
    }

    #[test]
    fn test_generic_member_in_declaring_type() {
        let (model, _) = typed("");
        let table = model.table();
        let base = table.find("NetFieldBase", 2, None).unwrap();
        let conversion = &table.def(base).conversions[0];
        assert!(conversion.implicit);
        assert_eq!(conversion.target, Some(Ty::Param { owner: base, index: 0 }));
        let net_ref = table.find("Netcode.NetRef", 0, None).unwrap();
        let value = table
            .lookup_member(&Ty::Named { def: net_ref, args: vec![] }, "Value")
            .unwrap();
        assert_eq!(value.ty, Some(Ty::Primitive("Object")));
    }

    #[test]
    fn test_unresolved_names_have_no_type() {
        let (_, types) = typed("var a = missing.category; var b = item.missing; System.Console.WriteLine(a);");
        assert_eq!(type_named(&types, "missing.category"), None);
        assert_eq!(type_named(&types, "item.missing"), None);
        assert_eq!(type_named(&types, "a"), None);
    }

    #[test]
    fn test_binary_types() {
        let (_, types) = typed("var s = \"a\" + 1; var d = 1 + 2.5; var n = !true; var c = item ?? null;");
        assert_eq!(type_named(&types, "\"a\" + 1"), Some("String"));
        assert_eq!(type_named(&types, "1 + 2.5"), Some("Double"));
        assert_eq!(type_named(&types, "!true"), Some("Boolean"));
        assert_eq!(type_named(&types, "item ?? null"), Some("Item"));
    }
}
