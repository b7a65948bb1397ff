//! Recognizes the expression shapes the rules report on

use super::classifier::{classify, WrapperInfo};
use crate::semantic::{MemberKind, ResolvedMember, SemanticModel};
use crate::syntax::{BinaryOp, Expr, ExprKind};

/// A comparison where exactly one operand is implicitly converted from a wrapper
#[derive(Debug, Clone)]
pub struct ImplicitComparison<'e> {
    pub op: BinaryOp,
    /// The wrapper-typed operand, as written
    pub operand: &'e Expr,
    pub wrapper: WrapperInfo,
}

/// Member access whose field or property is declared with a wrapper type
#[derive(Debug, Clone)]
pub struct WrapperFieldAccess<'e> {
    /// The whole access expression, including parentheses and casts on the receiver
    pub access: &'e Expr,
    /// Receiver with parentheses and casts stripped
    pub receiver: &'e Expr,
    pub member: &'e ResolvedMember,
    pub wrapper: WrapperInfo,
    pub suggested_property: String,
}

fn wrapper_of(model: &SemanticModel, expr: &Expr) -> Option<WrapperInfo> {
    model.type_of(expr.id).and_then(classify)
}

/// `a < b`, `a == b`, ... with exactly one wrapper operand
pub fn match_implicit_comparison<'e>(
    model: &SemanticModel,
    expr: &'e Expr,
) -> Option<ImplicitComparison<'e>> {
    let ExprKind::Binary { op, left, right } = &expr.kind else {
        return None;
    };
    if !op.is_comparison() {
        return None;
    }
    let (operand, wrapper) = match (wrapper_of(model, left), wrapper_of(model, right)) {
        (Some(wrapper), None) => (&**left, wrapper),
        (None, Some(wrapper)) => (&**right, wrapper),
        // both sides wrapped, or neither
        _ => return None,
    };
    Some(ImplicitComparison {
        op: *op,
        operand,
        wrapper,
    })
}

/// `x.field`, `(x).field` or `((T)x).field` where the member's type is a wrapper.
/// Null-conditional access is not matched, including links further down a
/// `a?.b.field` chain.
pub fn match_field_access<'e>(
    model: &'e SemanticModel,
    expr: &'e Expr,
) -> Option<WrapperFieldAccess<'e>> {
    let ExprKind::Member {
        target,
        name,
        conditional: false,
    } = &expr.kind
    else {
        return None;
    };
    if continues_conditional_chain(target) {
        return None;
    }
    let member = model.member_symbol(expr.id)?;
    if member.kind == MemberKind::Method {
        return None;
    }
    let wrapper = classify(model.describe(member.ty.as_ref()?))?;
    Some(WrapperFieldAccess {
        access: expr,
        receiver: unwrap_receiver(target),
        member,
        wrapper,
        suggested_property: suggest_property_name(&name.name),
    })
}

/// Whether `receiver` belongs to a `?.` chain, as in `a?.b.c` or `a?.M().c`.
/// Parentheses end a chain, so `(a?.b).c` is a plain access.
fn continues_conditional_chain(receiver: &Expr) -> bool {
    let mut current = receiver;
    loop {
        match &current.kind {
            ExprKind::Member {
                conditional: true, ..
            } => return true,
            ExprKind::Member { target, .. } | ExprKind::Index { target, .. } => current = target,
            ExprKind::Invoke { callee, .. } => current = callee,
            _ => return false,
        }
    }
}

/// Strip parentheses and casts around a receiver
pub fn unwrap_receiver(expr: &Expr) -> &Expr {
    let mut current = expr;
    loop {
        match &current.kind {
            ExprKind::Paren(inner) => current = inner,
            ExprKind::Cast { expr: inner, .. } => current = inner,
            _ => return current,
        }
    }
}

/// Member name with its first character upper-cased
pub fn suggest_property_name(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
