//! Syntax tree for the C# subset

use crate::source::Span;

#[derive(Debug, Clone, Default)]
pub struct CompilationUnit {
    pub types: Vec<TypeDecl>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ident {
    pub name: String,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct TypeSyntax {
    pub kind: TypeSyntaxKind,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub enum TypeSyntaxKind {
    /// `int`, `object`, `void`, ...
    Predefined(String),
    /// Possibly qualified name; only the last segment carries type arguments
    Named {
        segments: Vec<Ident>,
        args: Vec<TypeSyntax>,
    },
    Array(Box<TypeSyntax>),
    Nullable(Box<TypeSyntax>),
}

impl TypeSyntax {
    /// The implicitly typed local marker (`var x = ...`)
    pub fn is_var(&self) -> bool {
        matches!(
            &self.kind,
            TypeSyntaxKind::Named { segments, args } if args.is_empty()
                && segments.len() == 1
                && segments[0].name == "var"
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeDeclKind {
    Class,
    Struct,
    Interface,
    Record,
    Enum,
}

#[derive(Debug, Clone)]
pub struct TypeDecl {
    pub kind: TypeDeclKind,
    pub name: Ident,
    /// Enclosing namespace, dotted
    pub namespace: Option<String>,
    pub type_params: Vec<Ident>,
    pub bases: Vec<TypeSyntax>,
    pub members: Vec<Member>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct Param {
    /// `None` for implicitly typed lambda parameters
    pub ty: Option<TypeSyntax>,
    pub name: Ident,
    pub default: Option<Expr>,
}

#[derive(Debug, Clone)]
pub enum Body {
    Block(Block),
    Expr(Expr),
}

#[derive(Debug, Clone)]
pub struct Accessor {
    /// `get`, `set` or `init`
    pub name: Ident,
    pub body: Option<Body>,
}

#[derive(Debug, Clone)]
pub struct VarDeclarator {
    pub name: Ident,
    pub init: Option<Expr>,
}

#[derive(Debug, Clone)]
pub enum Member {
    Field {
        ty: TypeSyntax,
        declarators: Vec<VarDeclarator>,
        is_static: bool,
    },
    Property {
        ty: TypeSyntax,
        name: Ident,
        accessors: Vec<Accessor>,
        /// `T Name => expr;`
        expression_body: Option<Expr>,
        initializer: Option<Expr>,
        is_static: bool,
    },
    Method {
        /// `None` for `void`
        return_type: Option<TypeSyntax>,
        name: Ident,
        type_params: Vec<Ident>,
        params: Vec<Param>,
        body: Option<Body>,
        is_static: bool,
    },
    Constructor {
        name: Ident,
        params: Vec<Param>,
        body: Option<Body>,
    },
    /// `implicit operator T(...)` / `explicit operator T(...)`
    Conversion {
        implicit: bool,
        target: TypeSyntax,
        params: Vec<Param>,
        body: Option<Body>,
    },
    /// Overloaded operator such as `operator ==`
    Operator {
        return_type: TypeSyntax,
        op: String,
        params: Vec<Param>,
        body: Option<Body>,
    },
    EnumMember {
        name: Ident,
        value: Option<Expr>,
    },
    Type(TypeDecl),
}

#[derive(Debug, Clone)]
pub struct Block {
    pub stmts: Vec<Stmt>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub enum Stmt {
    Block(Block),
    Empty(Span),
    Local {
        ty: TypeSyntax,
        declarators: Vec<VarDeclarator>,
    },
    Expr(Expr),
    If {
        cond: Expr,
        then_branch: Box<Stmt>,
        else_branch: Option<Box<Stmt>>,
    },
    While {
        cond: Expr,
        body: Box<Stmt>,
    },
    Foreach {
        ty: TypeSyntax,
        name: Ident,
        iterable: Expr,
        body: Box<Stmt>,
    },
    Return(Option<Expr>, Span),
    Break(Span),
    Continue(Span),
}

/// Identity of an expression node within one compilation unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ExprId(pub u32);

#[derive(Debug, Clone)]
pub struct Expr {
    pub id: ExprId,
    pub kind: ExprKind,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Literal {
    Int(String),
    Real(String),
    Str(String),
    Char(String),
    Bool(bool),
    Null,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
    And,
    Or,
    Coalesce,
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    BitAnd,
    BitOr,
    BitXor,
}

impl BinaryOp {
    /// Relational or equality operator
    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge | BinaryOp::Eq | BinaryOp::Ne
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
            BinaryOp::Coalesce => "??",
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Rem => "%",
            BinaryOp::BitAnd => "&",
            BinaryOp::BitOr => "|",
            BinaryOp::BitXor => "^",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Not,
    Neg,
    Plus,
    BitNot,
    PreIncrement,
    PreDecrement,
    PostIncrement,
    PostDecrement,
}

#[derive(Debug, Clone)]
pub enum Initializer {
    /// `{ Name = value, ... }`
    Object(Vec<(Ident, Expr)>),
    /// `{ a, b, ... }`
    Collection(Vec<Expr>),
}

#[derive(Debug, Clone)]
pub enum LambdaBody {
    Expr(Box<Expr>),
    Block(Block),
}

#[derive(Debug, Clone)]
pub enum ExprKind {
    Literal(Literal),
    Name(Ident),
    This,
    Base,
    /// `target.name`, or `target?.name` when `conditional`
    Member {
        target: Box<Expr>,
        name: Ident,
        conditional: bool,
    },
    Paren(Box<Expr>),
    Cast {
        ty: TypeSyntax,
        expr: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    /// Plain (`op == None`) or compound assignment
    Assign {
        op: Option<BinaryOp>,
        target: Box<Expr>,
        value: Box<Expr>,
    },
    Conditional {
        cond: Box<Expr>,
        when_true: Box<Expr>,
        when_false: Box<Expr>,
    },
    Is {
        expr: Box<Expr>,
        ty: TypeSyntax,
    },
    As {
        expr: Box<Expr>,
        ty: TypeSyntax,
    },
    Invoke {
        callee: Box<Expr>,
        args: Vec<Expr>,
    },
    Index {
        target: Box<Expr>,
        args: Vec<Expr>,
    },
    New {
        /// `None` for `new[] { ... }` and target-typed `new()`
        ty: Option<TypeSyntax>,
        args: Vec<Expr>,
        initializer: Option<Initializer>,
    },
    TypeOf(TypeSyntax),
    Default(Option<TypeSyntax>),
    Lambda {
        params: Vec<Param>,
        body: LambdaBody,
    },
}

impl Expr {
    /// Direct sub-expressions in source order
    pub fn children(&self) -> Vec<&Expr> {
        match &self.kind {
            ExprKind::Literal(_)
            | ExprKind::Name(_)
            | ExprKind::This
            | ExprKind::Base
            | ExprKind::TypeOf(_)
            | ExprKind::Default(_) => Vec::new(),
            ExprKind::Member { target, .. } => vec![target],
            ExprKind::Paren(inner) => vec![inner],
            ExprKind::Cast { expr, .. } | ExprKind::Is { expr, .. } | ExprKind::As { expr, .. } => {
                vec![expr]
            }
            ExprKind::Binary { left, right, .. } => vec![left, right],
            ExprKind::Unary { operand, .. } => vec![operand],
            ExprKind::Assign { target, value, .. } => vec![target, value],
            ExprKind::Conditional {
                cond,
                when_true,
                when_false,
            } => vec![cond, when_true, when_false],
            ExprKind::Invoke { callee, args } => {
                std::iter::once(callee.as_ref()).chain(args.iter()).collect()
            }
            ExprKind::Index { target, args } => {
                std::iter::once(target.as_ref()).chain(args.iter()).collect()
            }
            ExprKind::New {
                args, initializer, ..
            } => {
                let mut children: Vec<&Expr> = args.iter().collect();
                match initializer {
                    Some(Initializer::Object(items)) => {
                        children.extend(items.iter().map(|(_, value)| value))
                    }
                    Some(Initializer::Collection(items)) => children.extend(items.iter()),
                    None => {}
                }
                children
            }
            ExprKind::Lambda { params, body } => {
                let mut children: Vec<&Expr> =
                    params.iter().filter_map(|p| p.default.as_ref()).collect();
                match body {
                    LambdaBody::Expr(expr) => children.push(expr),
                    LambdaBody::Block(block) => {
                        block.stmts.iter().for_each(|s| s.collect_exprs(&mut children))
                    }
                }
                children
            }
        }
    }

    /// Innermost expression after stripping parentheses
    pub fn without_parens(&self) -> &Expr {
        let mut expr = self;
        while let ExprKind::Paren(inner) = &expr.kind {
            expr = inner;
        }
        expr
    }

    /// Pre-order walk over this expression and everything below it
    pub fn walk<'a>(&'a self, out: &mut Vec<&'a Expr>) {
        let mut stack = vec![self];
        while let Some(expr) = stack.pop() {
            out.push(expr);
            stack.extend(expr.children().into_iter().rev());
        }
    }
}

impl Stmt {
    /// Top-level expressions directly owned by this statement (recursing into nested statements)
    pub fn collect_exprs<'a>(&'a self, out: &mut Vec<&'a Expr>) {
        match self {
            Stmt::Block(block) => block.stmts.iter().for_each(|s| s.collect_exprs(out)),
            Stmt::Empty(_) | Stmt::Break(_) | Stmt::Continue(_) | Stmt::Return(None, _) => {}
            Stmt::Local { declarators, .. } => {
                out.extend(declarators.iter().filter_map(|d| d.init.as_ref()))
            }
            Stmt::Expr(expr) | Stmt::Return(Some(expr), _) => out.push(expr),
            Stmt::If {
                cond,
                then_branch,
                else_branch,
            } => {
                out.push(cond);
                then_branch.collect_exprs(out);
                if let Some(else_branch) = else_branch {
                    else_branch.collect_exprs(out);
                }
            }
            Stmt::While { cond, body } => {
                out.push(cond);
                body.collect_exprs(out);
            }
            Stmt::Foreach { iterable, body, .. } => {
                out.push(iterable);
                body.collect_exprs(out);
            }
        }
    }
}

impl Body {
    fn collect_exprs<'a>(&'a self, out: &mut Vec<&'a Expr>) {
        match self {
            Body::Block(block) => block.stmts.iter().for_each(|s| s.collect_exprs(out)),
            Body::Expr(expr) => out.push(expr),
        }
    }
}

impl Member {
    fn collect_exprs<'a>(&'a self, out: &mut Vec<&'a Expr>) {
        match self {
            Member::Field { declarators, .. } => {
                out.extend(declarators.iter().filter_map(|d| d.init.as_ref()))
            }
            Member::Property {
                accessors,
                expression_body,
                initializer,
                ..
            } => {
                for accessor in accessors {
                    if let Some(body) = &accessor.body {
                        body.collect_exprs(out);
                    }
                }
                out.extend(expression_body.iter());
                out.extend(initializer.iter());
            }
            Member::Method { params, body, .. }
            | Member::Constructor { params, body, .. }
            | Member::Conversion { params, body, .. }
            | Member::Operator { params, body, .. } => {
                out.extend(params.iter().filter_map(|p| p.default.as_ref()));
                if let Some(body) = body {
                    body.collect_exprs(out);
                }
            }
            Member::EnumMember { value, .. } => out.extend(value.iter()),
            Member::Type(decl) => decl.collect_exprs(out),
        }
    }
}

impl TypeDecl {
    fn collect_exprs<'a>(&'a self, out: &mut Vec<&'a Expr>) {
        for member in &self.members {
            member.collect_exprs(out);
        }
    }

    /// This declaration followed by all nested declarations
    pub fn all_types(&self) -> Vec<&TypeDecl> {
        let mut out = vec![self];
        for member in &self.members {
            if let Member::Type(nested) = member {
                out.extend(nested.all_types());
            }
        }
        out
    }
}

impl CompilationUnit {
    /// Every expression node in the unit, pre-order, in source order
    pub fn expressions(&self) -> Vec<&Expr> {
        let mut roots = Vec::new();
        for decl in &self.types {
            decl.collect_exprs(&mut roots);
        }
        let mut out = Vec::with_capacity(roots.len() * 4);
        for root in roots {
            root.walk(&mut out);
        }
        out
    }

    /// All type declarations including nested ones
    pub fn all_types(&self) -> Vec<&TypeDecl> {
        self.types.iter().flat_map(|t| t.all_types()).collect()
    }
}
