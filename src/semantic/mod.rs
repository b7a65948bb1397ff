//! Static types and member symbols for a parsed compilation unit

mod binder;
pub mod types;

pub use binder::bind;
pub use types::{
    DefId, ImplicitConversion, MemberKind, ResolvedMember, Ty, TypeDescriptor, TypeTable,
};

use crate::syntax::ExprId;
use std::collections::HashMap;

/// Result of binding: the type table plus per-expression facts.
/// Expressions the binder could not resolve have no entry.
#[derive(Debug, Clone, Default)]
pub struct SemanticModel {
    table: TypeTable,
    types: HashMap<ExprId, Ty>,
    members: HashMap<ExprId, ResolvedMember>,
}

impl SemanticModel {
    pub fn new(
        table: TypeTable,
        types: HashMap<ExprId, Ty>,
        members: HashMap<ExprId, ResolvedMember>,
    ) -> Self {
        Self {
            table,
            types,
            members,
        }
    }

    pub fn table(&self) -> &TypeTable {
        &self.table
    }

    pub fn types(&self) -> &HashMap<ExprId, Ty> {
        &self.types
    }

    /// Static type of an expression
    pub fn type_of(&self, id: ExprId) -> Option<TypeDescriptor<'_>> {
        self.types.get(&id).map(|ty| self.describe(ty))
    }

    /// Field, property or method referenced by a name or member access
    pub fn member_symbol(&self, id: ExprId) -> Option<&ResolvedMember> {
        self.members.get(&id)
    }

    pub fn describe<'a>(&'a self, ty: &'a Ty) -> TypeDescriptor<'a> {
        TypeDescriptor::new(&self.table, ty)
    }
}
