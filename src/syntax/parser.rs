//! Recursive descent parser producing a [`CompilationUnit`]

use super::ast::*;
use super::lexer::{tokenize, Punct, Token, TokenKind};
use super::ParseError;
use crate::source::{SourceText, Span};

const PREDEFINED_TYPES: &[&str] = &[
    "bool", "byte", "sbyte", "short", "ushort", "int", "uint", "long", "ulong", "float",
    "double", "decimal", "char", "string", "object", "void",
];

const MODIFIERS: &[&str] = &[
    "public", "private", "protected", "internal", "static", "readonly", "const", "virtual",
    "override", "abstract", "sealed", "extern", "unsafe", "volatile", "new", "event",
];

const CONTEXTUAL_MODIFIERS: &[&str] = &["partial", "async", "required"];

/// Deepest expression tree accepted; binding and dropping the tree recurse per level
const MAX_EXPR_DEPTH: u32 = 256;

/// Deepest recursion through nested expressions, statements and type arguments
const MAX_NESTING: usize = 128;

#[derive(Debug)]
struct SyntaxError {
    offset: usize,
    message: String,
    /// Nesting limit hit; backtracking must not retry another parse
    fatal: bool,
}

impl SyntaxError {
    fn limit(offset: usize, message: String) -> Self {
        SyntaxError {
            offset,
            message,
            fatal: true,
        }
    }
}

type PResult<T> = Result<T, SyntaxError>;

/// Parse a whole source file
pub fn parse(source: &SourceText) -> Result<CompilationUnit, ParseError> {
    let tokens = tokenize(source.as_str())
        .map_err(|e| ParseError::at(source, e.offset, e.message))?;
    let mut parser = Parser {
        tokens,
        pos: 0,
        next_id: 0,
        depths: Vec::new(),
        nesting: 0,
    };
    parser
        .compilation_unit()
        .map_err(|e| ParseError::at(source, e.offset, e.message))
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    next_id: u32,
    /// Tree depth of each expression built so far, indexed by `ExprId`
    depths: Vec<u32>,
    nesting: usize,
}

impl Parser {
    // ---- token helpers ----

    fn peek(&self) -> &Token {
        self.peek_at(0)
    }

    fn peek_at(&self, n: usize) -> &Token {
        let idx = (self.pos + n).min(self.tokens.len() - 1);
        &self.tokens[idx]
    }

    fn bump(&mut self) -> Token {
        let token = self.peek().clone();
        if token.kind != TokenKind::Eof {
            self.pos += 1;
        }
        token
    }

    fn prev_end(&self) -> usize {
        if self.pos == 0 {
            0
        } else {
            self.tokens[self.pos - 1].span.end
        }
    }

    fn at(&self, punct: Punct) -> bool {
        self.peek().is_punct(punct)
    }

    fn at_keyword(&self, word: &str) -> bool {
        self.peek().is_keyword(word)
    }

    fn eat(&mut self, punct: Punct) -> bool {
        if self.at(punct) {
            self.bump();
            true
        } else {
            false
        }
    }

    fn eat_keyword(&mut self, word: &str) -> bool {
        if self.at_keyword(word) {
            self.bump();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, punct: Punct) -> PResult<Span> {
        if self.at(punct) {
            Ok(self.bump().span)
        } else {
            Err(self.error(format!("expected '{}'", punct.as_str())))
        }
    }

    fn expect_keyword(&mut self, word: &str) -> PResult<Span> {
        if self.at_keyword(word) {
            Ok(self.bump().span)
        } else {
            Err(self.error(format!("expected '{}'", word)))
        }
    }

    fn expect_ident(&mut self) -> PResult<Ident> {
        if self.peek().kind == TokenKind::Ident {
            let token = self.bump();
            Ok(Ident {
                name: token.text,
                span: token.span,
            })
        } else {
            Err(self.error("expected identifier"))
        }
    }

    fn error(&self, message: impl Into<String>) -> SyntaxError {
        let token = self.peek();
        let found = if token.kind == TokenKind::Eof {
            "end of file".to_string()
        } else {
            format!("'{}'", token.text)
        };
        SyntaxError {
            offset: token.span.start,
            message: format!("{}, found {}", message.into(), found),
            fatal: false,
        }
    }

    /// Run `f`, rewinding the token position (and node ids) if it fails
    fn attempt<T>(&mut self, f: impl FnOnce(&mut Self) -> PResult<T>) -> PResult<Option<T>> {
        let (pos, next_id) = (self.pos, self.next_id);
        match f(self) {
            Ok(value) => Ok(Some(value)),
            Err(err) if err.fatal => Err(err),
            Err(_) => {
                self.pos = pos;
                self.next_id = next_id;
                self.depths.truncate(next_id as usize);
                Ok(None)
            }
        }
    }

    /// Run `f` one nesting level deeper, failing once the level limit is reached
    fn nested<T>(&mut self, f: impl FnOnce(&mut Self) -> PResult<T>) -> PResult<T> {
        if self.nesting >= MAX_NESTING {
            let message = format!("nesting too deep (limit {})", MAX_NESTING);
            return Err(SyntaxError::limit(self.peek().span.start, message));
        }
        self.nesting += 1;
        let result = f(self);
        self.nesting -= 1;
        result
    }

    fn mk_expr(&mut self, kind: ExprKind, span: Span) -> PResult<Expr> {
        let expr = Expr {
            id: ExprId(self.next_id),
            kind,
            span,
        };
        let depth = 1 + expr
            .children()
            .iter()
            .filter_map(|child| self.depths.get(child.id.0 as usize))
            .max()
            .copied()
            .unwrap_or(0);
        if depth > MAX_EXPR_DEPTH {
            return Err(SyntaxError::limit(
                span.start,
                format!("expression nested deeper than {} levels", MAX_EXPR_DEPTH),
            ));
        }
        self.next_id += 1;
        self.depths.push(depth);
        Ok(expr)
    }

    /// Skip a balanced `open ... close` group starting at the current token
    fn skip_balanced(&mut self, open: Punct, close: Punct) -> PResult<()> {
        self.expect(open)?;
        let mut depth = 1;
        while depth > 0 {
            let token = self.bump();
            match token.kind {
                TokenKind::Eof => {
                    return Err(SyntaxError {
                        offset: token.span.start,
                        message: format!("expected '{}', found end of file", close.as_str()),
                        fatal: false,
                    })
                }
                TokenKind::Punct(p) if p == open => depth += 1,
                TokenKind::Punct(p) if p == close => depth -= 1,
                _ => {}
            }
        }
        Ok(())
    }

    fn skip_attributes(&mut self) -> PResult<()> {
        while self.at(Punct::LBracket) {
            self.skip_balanced(Punct::LBracket, Punct::RBracket)?;
        }
        Ok(())
    }

    /// Consume modifiers; returns whether `static` or `const` was among them
    fn modifiers(&mut self) -> bool {
        let mut is_static = false;
        loop {
            let token = self.peek();
            let is_modifier = (token.kind == TokenKind::Keyword
                && MODIFIERS.contains(&token.text.as_str()))
                || (token.kind == TokenKind::Ident
                    && CONTEXTUAL_MODIFIERS.contains(&token.text.as_str())
                    && self.peek_at(1).kind != TokenKind::Punct(Punct::LParen));
            // `new(` starts an expression; as a modifier `new` is followed by a type or keyword
            let starts_new_expr =
                token.is_keyword("new") && self.peek_at(1).is_punct(Punct::LParen);
            if !is_modifier || starts_new_expr {
                return is_static;
            }
            if token.is_keyword("static") || token.is_keyword("const") {
                is_static = true;
            }
            self.bump();
        }
    }

    fn qualified_name(&mut self) -> PResult<String> {
        let mut name = self.expect_ident()?.name;
        while self.eat(Punct::Dot) {
            name.push('.');
            name.push_str(&self.expect_ident()?.name);
        }
        Ok(name)
    }

    // ---- declarations ----

    fn compilation_unit(&mut self) -> PResult<CompilationUnit> {
        let mut types = Vec::new();
        let mut namespace: Option<String> = None;
        while self.peek().kind != TokenKind::Eof {
            if self.at_keyword("namespace") {
                self.bump();
                let name = self.qualified_name()?;
                if self.eat(Punct::Semi) {
                    // file-scoped namespace covers the rest of the file
                    namespace = Some(name);
                    continue;
                }
                self.expect(Punct::LBrace)?;
                types.extend(self.namespace_body(Some(join_namespace(&namespace, &name)))?);
                self.expect(Punct::RBrace)?;
                continue;
            }
            types.extend(self.namespace_member(&namespace)?);
        }
        Ok(CompilationUnit { types })
    }

    fn namespace_body(&mut self, namespace: Option<String>) -> PResult<Vec<TypeDecl>> {
        let mut types = Vec::new();
        while !self.at(Punct::RBrace) && self.peek().kind != TokenKind::Eof {
            if self.eat_keyword("namespace") {
                let name = self.qualified_name()?;
                self.expect(Punct::LBrace)?;
                types.extend(self.namespace_body(Some(join_namespace(&namespace, &name)))?);
                self.expect(Punct::RBrace)?;
                continue;
            }
            types.extend(self.namespace_member(&namespace)?);
        }
        Ok(types)
    }

    fn namespace_member(&mut self, namespace: &Option<String>) -> PResult<Option<TypeDecl>> {
        if self.eat_keyword("using") {
            while !self.eat(Punct::Semi) {
                if self.peek().kind == TokenKind::Eof {
                    return Err(self.error("expected ';'"));
                }
                self.bump();
            }
            return Ok(None);
        }
        self.skip_attributes()?;
        self.modifiers();
        self.nested(|p| p.type_decl(namespace)).map(Some)
    }

    fn at_type_decl(&self) -> bool {
        let token = self.peek();
        token.is_keyword("class")
            || token.is_keyword("struct")
            || token.is_keyword("interface")
            || token.is_keyword("enum")
            || (token.is_contextual("record")
                && self.peek_at(1).kind != TokenKind::Punct(Punct::LParen))
    }

    fn type_decl(&mut self, namespace: &Option<String>) -> PResult<TypeDecl> {
        let start = self.peek().span.start;
        let kind = if self.eat_keyword("class") {
            TypeDeclKind::Class
        } else if self.eat_keyword("struct") {
            TypeDeclKind::Struct
        } else if self.eat_keyword("interface") {
            TypeDeclKind::Interface
        } else if self.eat_keyword("enum") {
            TypeDeclKind::Enum
        } else if self.peek().is_contextual("record") {
            self.bump();
            if !self.eat_keyword("class") {
                self.eat_keyword("struct");
            }
            TypeDeclKind::Record
        } else {
            return Err(self.error("expected type declaration"));
        };

        let name = self.expect_ident()?;
        let type_params = self.type_params()?;
        if kind == TypeDeclKind::Record && self.at(Punct::LParen) {
            self.skip_balanced(Punct::LParen, Punct::RParen)?;
        }

        let mut bases = Vec::new();
        if self.eat(Punct::Colon) {
            bases.push(self.parse_type()?);
            while self.eat(Punct::Comma) {
                bases.push(self.parse_type()?);
            }
        }
        self.skip_constraints();

        let mut members = Vec::new();
        if kind == TypeDeclKind::Record && self.eat(Punct::Semi) {
            return Ok(TypeDecl {
                kind,
                name,
                namespace: namespace.clone(),
                type_params,
                bases,
                members,
                span: Span::new(start, self.prev_end()),
            });
        }

        self.expect(Punct::LBrace)?;
        if kind == TypeDeclKind::Enum {
            members = self.enum_members()?;
        } else {
            while !self.at(Punct::RBrace) {
                if self.peek().kind == TokenKind::Eof {
                    return Err(self.error("expected '}'"));
                }
                if let Some(member) = self.member(&name.name, namespace)? {
                    members.push(member);
                }
            }
        }
        self.expect(Punct::RBrace)?;
        self.eat(Punct::Semi);

        Ok(TypeDecl {
            kind,
            name,
            namespace: namespace.clone(),
            type_params,
            bases,
            members,
            span: Span::new(start, self.prev_end()),
        })
    }

    fn type_params(&mut self) -> PResult<Vec<Ident>> {
        let mut params = Vec::new();
        if !self.eat(Punct::Lt) {
            return Ok(params);
        }
        loop {
            self.skip_attributes()?;
            // variance annotations
            if !self.eat_keyword("in") {
                self.eat_keyword("out");
            }
            params.push(self.expect_ident()?);
            if !self.eat(Punct::Comma) {
                break;
            }
        }
        self.expect(Punct::Gt)?;
        Ok(params)
    }

    /// Skip `where T : ...` clauses up to the body or terminator
    fn skip_constraints(&mut self) {
        if !self.peek().is_contextual("where") {
            return;
        }
        while !(self.at(Punct::LBrace)
            || self.at(Punct::Semi)
            || self.at(Punct::Arrow)
            || self.peek().kind == TokenKind::Eof)
        {
            self.bump();
        }
    }

    fn enum_members(&mut self) -> PResult<Vec<Member>> {
        let mut members = Vec::new();
        while !self.at(Punct::RBrace) {
            self.skip_attributes()?;
            let name = self.expect_ident()?;
            let value = if self.eat(Punct::Assign) {
                Some(self.parse_expr()?)
            } else {
                None
            };
            members.push(Member::EnumMember { name, value });
            if !self.eat(Punct::Comma) {
                break;
            }
        }
        Ok(members)
    }

    fn member(&mut self, type_name: &str, namespace: &Option<String>) -> PResult<Option<Member>> {
        self.skip_attributes()?;
        let is_static = self.modifiers();

        if self.at_type_decl() {
            return self
                .nested(|p| p.type_decl(namespace))
                .map(|decl| Some(Member::Type(decl)));
        }

        if self.at_keyword("implicit") || self.at_keyword("explicit") {
            let implicit = self.bump().text == "implicit";
            self.expect_keyword("operator")?;
            let target = self.parse_type()?;
            let params = self.params()?;
            let body = self.body()?;
            return Ok(Some(Member::Conversion {
                implicit,
                target,
                params,
                body,
            }));
        }

        if self.peek().is_contextual(type_name) && self.peek_at(1).is_punct(Punct::LParen) {
            let name = self.expect_ident()?;
            let params = self.params()?;
            if self.eat(Punct::Colon) {
                // constructor initializer: `: base(...)` / `: this(...)`
                self.bump();
                self.args(Punct::LParen, Punct::RParen)?;
            }
            let body = self.body()?;
            return Ok(Some(Member::Constructor { name, params, body }));
        }

        if self.eat(Punct::Tilde) {
            // finalizer
            self.expect_ident()?;
            self.params()?;
            self.body()?;
            return Ok(None);
        }

        let return_type = if self.eat_keyword("void") {
            None
        } else {
            Some(self.parse_type()?)
        };

        if self.eat_keyword("operator") {
            let op = self.bump().text;
            let params = self.params()?;
            let body = self.body()?;
            let return_type =
                return_type.ok_or_else(|| self.error("operator must return a value"))?;
            return Ok(Some(Member::Operator {
                return_type,
                op,
                params,
                body,
            }));
        }

        if self.eat_keyword("this") {
            // indexer
            self.skip_balanced(Punct::LBracket, Punct::RBracket)?;
            if self.at(Punct::LBrace) {
                self.accessors()?;
            } else {
                self.body()?;
            }
            return Ok(None);
        }

        let mut name = self.expect_ident()?;
        // explicit interface implementation: `IFoo.Bar`
        while self.eat(Punct::Dot) {
            name = self.expect_ident()?;
        }

        if self.at(Punct::Lt) || self.at(Punct::LParen) {
            let type_params = self.type_params()?;
            let params = self.params()?;
            self.skip_constraints();
            let body = self.body()?;
            return Ok(Some(Member::Method {
                return_type,
                name,
                type_params,
                params,
                body,
                is_static,
            }));
        }

        let ty = return_type.ok_or_else(|| self.error("expected '('"))?;

        if self.at(Punct::LBrace) {
            let accessors = self.accessors()?;
            let initializer = if self.eat(Punct::Assign) {
                let init = self.parse_expr()?;
                self.expect(Punct::Semi)?;
                Some(init)
            } else {
                None
            };
            return Ok(Some(Member::Property {
                ty,
                name,
                accessors,
                expression_body: None,
                initializer,
                is_static,
            }));
        }

        if self.eat(Punct::Arrow) {
            let body = self.parse_expr()?;
            self.expect(Punct::Semi)?;
            return Ok(Some(Member::Property {
                ty,
                name,
                accessors: Vec::new(),
                expression_body: Some(body),
                initializer: None,
                is_static,
            }));
        }

        let declarators = self.declarators_after(name)?;
        self.expect(Punct::Semi)?;
        Ok(Some(Member::Field {
            ty,
            declarators,
            is_static,
        }))
    }

    fn accessors(&mut self) -> PResult<Vec<Accessor>> {
        self.expect(Punct::LBrace)?;
        let mut accessors = Vec::new();
        while !self.eat(Punct::RBrace) {
            self.skip_attributes()?;
            self.modifiers();
            let name = self.expect_ident()?;
            let body = self.body()?;
            accessors.push(Accessor { name, body });
        }
        Ok(accessors)
    }

    /// `;`, `=> expr;` or a block
    fn body(&mut self) -> PResult<Option<Body>> {
        if self.eat(Punct::Semi) {
            return Ok(None);
        }
        if self.eat(Punct::Arrow) {
            let expr = self.parse_expr()?;
            self.expect(Punct::Semi)?;
            return Ok(Some(Body::Expr(expr)));
        }
        Ok(Some(Body::Block(self.block()?)))
    }

    fn params(&mut self) -> PResult<Vec<Param>> {
        self.expect(Punct::LParen)?;
        let mut params = Vec::new();
        if self.eat(Punct::RParen) {
            return Ok(params);
        }
        loop {
            self.skip_attributes()?;
            while ["ref", "out", "in", "params", "this"]
                .iter()
                .any(|kw| self.at_keyword(kw))
            {
                self.bump();
            }
            let ty = self.parse_type()?;
            let name = self.expect_ident()?;
            let default = if self.eat(Punct::Assign) {
                Some(self.parse_expr()?)
            } else {
                None
            };
            params.push(Param {
                ty: Some(ty),
                name,
                default,
            });
            if !self.eat(Punct::Comma) {
                break;
            }
        }
        self.expect(Punct::RParen)?;
        Ok(params)
    }

    fn declarators_after(&mut self, first: Ident) -> PResult<Vec<VarDeclarator>> {
        let mut declarators = Vec::new();
        let mut name = first;
        loop {
            let init = if self.eat(Punct::Assign) {
                Some(self.parse_var_init()?)
            } else {
                None
            };
            declarators.push(VarDeclarator { name, init });
            if !self.eat(Punct::Comma) {
                break;
            }
            name = self.expect_ident()?;
        }
        Ok(declarators)
    }

    /// Variable initializer; a bare `{ ... }` is an array initializer
    fn parse_var_init(&mut self) -> PResult<Expr> {
        if self.at(Punct::LBrace) {
            let start = self.peek().span.start;
            let initializer = self.initializer()?;
            let span = Span::new(start, self.prev_end());
            return self.mk_expr(
                ExprKind::New {
                    ty: None,
                    args: Vec::new(),
                    initializer: Some(initializer),
                },
                span,
            );
        }
        self.parse_expr()
    }

    // ---- types ----

    fn parse_type(&mut self) -> PResult<TypeSyntax> {
        let start = self.peek().span.start;
        let token = self.peek().clone();
        let predefined =
            token.kind == TokenKind::Keyword && PREDEFINED_TYPES.contains(&token.text.as_str());
        let mut ty = if predefined {
            self.bump();
            TypeSyntax {
                kind: TypeSyntaxKind::Predefined(token.text),
                span: token.span,
            }
        } else if token.kind == TokenKind::Ident {
            let mut segments = vec![self.expect_ident()?];
            let mut args = Vec::new();
            loop {
                if self.at(Punct::Lt) {
                    args = self.type_args()?;
                }
                if self.at(Punct::Dot) && self.peek_at(1).kind == TokenKind::Ident {
                    self.bump();
                    segments.push(self.expect_ident()?);
                    args.clear();
                } else {
                    break;
                }
            }
            TypeSyntax {
                kind: TypeSyntaxKind::Named { segments, args },
                span: Span::new(start, self.prev_end()),
            }
        } else {
            return Err(self.error("expected type"));
        };

        loop {
            if self.at(Punct::Question) && self.nullable_suffix_follows() {
                self.bump();
                ty = TypeSyntax {
                    kind: TypeSyntaxKind::Nullable(Box::new(ty)),
                    span: Span::new(start, self.prev_end()),
                };
            } else if self.at(Punct::LBracket)
                && (self.peek_at(1).is_punct(Punct::RBracket)
                    || self.peek_at(1).is_punct(Punct::Comma))
            {
                self.skip_balanced(Punct::LBracket, Punct::RBracket)?;
                ty = TypeSyntax {
                    kind: TypeSyntaxKind::Array(Box::new(ty)),
                    span: Span::new(start, self.prev_end()),
                };
            } else {
                break;
            }
        }
        Ok(ty)
    }

    /// Whether a `?` after a type is a nullable marker rather than a conditional operator
    fn nullable_suffix_follows(&self) -> bool {
        let next = self.peek_at(1);
        match &next.kind {
            TokenKind::Punct(p) => matches!(
                p,
                Punct::RParen | Punct::Gt | Punct::Comma | Punct::LBracket | Punct::RBracket
            ),
            TokenKind::Ident => {
                let after = self.peek_at(2);
                after.is_punct(Punct::Assign)
                    || after.is_punct(Punct::Semi)
                    || after.is_punct(Punct::Comma)
                    || after.is_punct(Punct::RParen)
                    || after.is_punct(Punct::LBrace)
                    || after.is_punct(Punct::Arrow)
                    || after.is_keyword("in")
            }
            _ => false,
        }
    }

    fn type_args(&mut self) -> PResult<Vec<TypeSyntax>> {
        self.expect(Punct::Lt)?;
        let mut args = vec![self.nested(Self::parse_type)?];
        while self.eat(Punct::Comma) {
            args.push(self.nested(Self::parse_type)?);
        }
        self.expect(Punct::Gt)?;
        Ok(args)
    }

    // ---- statements ----

    fn block(&mut self) -> PResult<Block> {
        let start = self.expect(Punct::LBrace)?.start;
        let mut stmts = Vec::new();
        while !self.at(Punct::RBrace) {
            if self.peek().kind == TokenKind::Eof {
                return Err(self.error("expected '}'"));
            }
            stmts.push(self.stmt()?);
        }
        self.bump();
        Ok(Block {
            stmts,
            span: Span::new(start, self.prev_end()),
        })
    }

    fn stmt(&mut self) -> PResult<Stmt> {
        self.nested(Self::statement)
    }

    fn statement(&mut self) -> PResult<Stmt> {
        if self.at(Punct::LBrace) {
            return Ok(Stmt::Block(self.block()?));
        }
        if self.at(Punct::Semi) {
            return Ok(Stmt::Empty(self.bump().span));
        }
        if self.eat_keyword("if") {
            self.expect(Punct::LParen)?;
            let cond = self.parse_expr()?;
            self.expect(Punct::RParen)?;
            let then_branch = Box::new(self.stmt()?);
            let else_branch = if self.eat_keyword("else") {
                Some(Box::new(self.stmt()?))
            } else {
                None
            };
            return Ok(Stmt::If {
                cond,
                then_branch,
                else_branch,
            });
        }
        if self.eat_keyword("while") {
            self.expect(Punct::LParen)?;
            let cond = self.parse_expr()?;
            self.expect(Punct::RParen)?;
            let body = Box::new(self.stmt()?);
            return Ok(Stmt::While { cond, body });
        }
        if self.eat_keyword("foreach") {
            self.expect(Punct::LParen)?;
            let ty = self.parse_type()?;
            let name = self.expect_ident()?;
            self.expect_keyword("in")?;
            let iterable = self.parse_expr()?;
            self.expect(Punct::RParen)?;
            let body = Box::new(self.stmt()?);
            return Ok(Stmt::Foreach {
                ty,
                name,
                iterable,
                body,
            });
        }
        if self.at_keyword("return") {
            let start = self.bump().span.start;
            let value = if self.at(Punct::Semi) {
                None
            } else {
                Some(self.parse_expr()?)
            };
            self.expect(Punct::Semi)?;
            return Ok(Stmt::Return(value, Span::new(start, self.prev_end())));
        }
        if self.at_keyword("break") || self.at_keyword("continue") {
            let token = self.bump();
            self.expect(Punct::Semi)?;
            let span = Span::new(token.span.start, self.prev_end());
            return Ok(if token.text == "break" {
                Stmt::Break(span)
            } else {
                Stmt::Continue(span)
            });
        }

        self.eat_keyword("const");
        if let Some(local) = self.attempt(Self::local_decl)? {
            return Ok(local);
        }

        let expr = self.parse_expr()?;
        self.expect(Punct::Semi)?;
        Ok(Stmt::Expr(expr))
    }

    fn local_decl(&mut self) -> PResult<Stmt> {
        let ty = self.parse_type()?;
        let starts_declarator = self.peek().kind == TokenKind::Ident
            && (self.peek_at(1).is_punct(Punct::Assign)
                || self.peek_at(1).is_punct(Punct::Semi)
                || self.peek_at(1).is_punct(Punct::Comma));
        if !starts_declarator {
            return Err(self.error("expected local declaration"));
        }
        let first = self.expect_ident()?;
        let declarators = self.declarators_after(first)?;
        self.expect(Punct::Semi)?;
        Ok(Stmt::Local { ty, declarators })
    }

    // ---- expressions ----

    fn parse_expr(&mut self) -> PResult<Expr> {
        self.nested(Self::assignment)
    }

    fn assignment(&mut self) -> PResult<Expr> {
        if self.at_lambda() {
            return self.lambda();
        }
        let target = self.conditional()?;
        let op = match &self.peek().kind {
            TokenKind::Punct(Punct::Assign) => Some(None),
            TokenKind::Punct(Punct::PlusEq) => Some(Some(BinaryOp::Add)),
            TokenKind::Punct(Punct::MinusEq) => Some(Some(BinaryOp::Sub)),
            TokenKind::Punct(Punct::StarEq) => Some(Some(BinaryOp::Mul)),
            TokenKind::Punct(Punct::SlashEq) => Some(Some(BinaryOp::Div)),
            TokenKind::Punct(Punct::PercentEq) => Some(Some(BinaryOp::Rem)),
            TokenKind::Punct(Punct::QuestionQuestionEq) => Some(Some(BinaryOp::Coalesce)),
            _ => None,
        };
        let Some(op) = op else {
            return Ok(target);
        };
        self.bump();
        let value = self.nested(Self::assignment)?;
        let span = target.span.to(value.span);
        self.mk_expr(
            ExprKind::Assign {
                op,
                target: Box::new(target),
                value: Box::new(value),
            },
            span,
        )
    }

    fn at_lambda(&self) -> bool {
        if self.peek().kind == TokenKind::Ident && self.peek_at(1).is_punct(Punct::Arrow) {
            return true;
        }
        if !self.at(Punct::LParen) {
            return false;
        }
        let mut depth = 0;
        let mut idx = self.pos;
        while idx < self.tokens.len() {
            match self.tokens[idx].kind {
                TokenKind::Punct(Punct::LParen) => depth += 1,
                TokenKind::Punct(Punct::RParen) => {
                    depth -= 1;
                    if depth == 0 {
                        return self
                            .tokens
                            .get(idx + 1)
                            .is_some_and(|t| t.is_punct(Punct::Arrow));
                    }
                }
                TokenKind::Eof => return false,
                _ => {}
            }
            idx += 1;
        }
        false
    }

    fn lambda(&mut self) -> PResult<Expr> {
        let start = self.peek().span.start;
        let mut params = Vec::new();
        if self.peek().kind == TokenKind::Ident {
            params.push(Param {
                ty: None,
                name: self.expect_ident()?,
                default: None,
            });
        } else {
            self.expect(Punct::LParen)?;
            while !self.eat(Punct::RParen) {
                let ty = if self.peek().kind == TokenKind::Ident
                    && (self.peek_at(1).is_punct(Punct::Comma)
                        || self.peek_at(1).is_punct(Punct::RParen))
                {
                    None
                } else {
                    Some(self.parse_type()?)
                };
                params.push(Param {
                    ty,
                    name: self.expect_ident()?,
                    default: None,
                });
                if !self.eat(Punct::Comma) {
                    self.expect(Punct::RParen)?;
                    break;
                }
            }
        }
        self.expect(Punct::Arrow)?;
        let body = if self.at(Punct::LBrace) {
            LambdaBody::Block(self.block()?)
        } else {
            LambdaBody::Expr(Box::new(self.parse_expr()?))
        };
        let span = Span::new(start, self.prev_end());
        self.mk_expr(ExprKind::Lambda { params, body }, span)
    }

    fn conditional(&mut self) -> PResult<Expr> {
        let cond = self.coalesce()?;
        if !self.eat(Punct::Question) {
            return Ok(cond);
        }
        let when_true = self.parse_expr()?;
        self.expect(Punct::Colon)?;
        let when_false = self.parse_expr()?;
        let span = cond.span.to(when_false.span);
        self.mk_expr(
            ExprKind::Conditional {
                cond: Box::new(cond),
                when_true: Box::new(when_true),
                when_false: Box::new(when_false),
            },
            span,
        )
    }

    fn coalesce(&mut self) -> PResult<Expr> {
        let left = self.binary(0)?;
        if !self.eat(Punct::QuestionQuestion) {
            return Ok(left);
        }
        let right = self.nested(Self::coalesce)?;
        self.mk_binary(BinaryOp::Coalesce, left, right)
    }

    fn mk_binary(&mut self, op: BinaryOp, left: Expr, right: Expr) -> PResult<Expr> {
        let span = left.span.to(right.span);
        self.mk_expr(
            ExprKind::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            },
            span,
        )
    }

    /// Left-associative binary operators by precedence level (0 = loosest)
    fn binary(&mut self, level: usize) -> PResult<Expr> {
        const LEVELS: &[&[(Punct, BinaryOp)]] = &[
            &[(Punct::OrOr, BinaryOp::Or)],
            &[(Punct::AndAnd, BinaryOp::And)],
            &[(Punct::Pipe, BinaryOp::BitOr)],
            &[(Punct::Caret, BinaryOp::BitXor)],
            &[(Punct::Amp, BinaryOp::BitAnd)],
            &[(Punct::EqEq, BinaryOp::Eq), (Punct::NotEq, BinaryOp::Ne)],
            &[
                (Punct::Lt, BinaryOp::Lt),
                (Punct::Le, BinaryOp::Le),
                (Punct::Gt, BinaryOp::Gt),
                (Punct::Ge, BinaryOp::Ge),
            ],
            &[(Punct::Plus, BinaryOp::Add), (Punct::Minus, BinaryOp::Sub)],
            &[
                (Punct::Star, BinaryOp::Mul),
                (Punct::Slash, BinaryOp::Div),
                (Punct::Percent, BinaryOp::Rem),
            ],
        ];
        const RELATIONAL: usize = 6;

        if level == LEVELS.len() {
            return self.unary();
        }
        let mut left = self.binary(level + 1)?;
        loop {
            if level == RELATIONAL && (self.at_keyword("is") || self.at_keyword("as")) {
                let is = self.bump().text == "is";
                let ty = self.parse_type()?;
                let span = left.span.to(ty.span);
                let expr = Box::new(left);
                left = self.mk_expr(
                    if is {
                        ExprKind::Is { expr, ty }
                    } else {
                        ExprKind::As { expr, ty }
                    },
                    span,
                )?;
                continue;
            }
            let op = LEVELS[level]
                .iter()
                .find(|(punct, _)| self.at(*punct))
                .map(|(_, op)| *op);
            let Some(op) = op else {
                break;
            };
            self.bump();
            let right = self.binary(level + 1)?;
            left = self.mk_binary(op, left, right)?;
        }
        Ok(left)
    }

    fn unary(&mut self) -> PResult<Expr> {
        let start = self.peek().span.start;
        let op = match &self.peek().kind {
            TokenKind::Punct(Punct::Not) => Some(UnaryOp::Not),
            TokenKind::Punct(Punct::Minus) => Some(UnaryOp::Neg),
            TokenKind::Punct(Punct::Plus) => Some(UnaryOp::Plus),
            TokenKind::Punct(Punct::Tilde) => Some(UnaryOp::BitNot),
            TokenKind::Punct(Punct::PlusPlus) => Some(UnaryOp::PreIncrement),
            TokenKind::Punct(Punct::MinusMinus) => Some(UnaryOp::PreDecrement),
            _ => None,
        };
        if let Some(op) = op {
            self.bump();
            let operand = self.nested(Self::unary)?;
            let span = Span::new(start, operand.span.end);
            return self.mk_expr(
                ExprKind::Unary {
                    op,
                    operand: Box::new(operand),
                },
                span,
            );
        }
        if self.at(Punct::LParen) {
            if let Some(cast) = self.attempt(Self::cast)? {
                return Ok(cast);
            }
        }
        self.postfix()
    }

    /// `(T)operand`, following the C# disambiguation rule
    fn cast(&mut self) -> PResult<Expr> {
        let start = self.expect(Punct::LParen)?.start;
        let ty = self.parse_type()?;
        self.expect(Punct::RParen)?;
        let next = self.peek();
        let starts_operand = match &next.kind {
            TokenKind::Ident
            | TokenKind::Int
            | TokenKind::Real
            | TokenKind::Str
            | TokenKind::Char => true,
            TokenKind::Keyword => !matches!(next.text.as_str(), "is" | "as"),
            TokenKind::Punct(p) => matches!(p, Punct::LParen | Punct::Not | Punct::Tilde),
            TokenKind::Eof => false,
        };
        if !(is_predefined(&ty) || starts_operand) {
            return Err(self.error("not a cast"));
        }
        let operand = self.nested(Self::unary)?;
        let span = Span::new(start, operand.span.end);
        self.mk_expr(
            ExprKind::Cast {
                ty,
                expr: Box::new(operand),
            },
            span,
        )
    }

    fn postfix(&mut self) -> PResult<Expr> {
        let mut expr = self.primary()?;
        loop {
            if self.at(Punct::Dot) || self.at(Punct::QuestionDot) {
                let conditional = self.bump().is_punct(Punct::QuestionDot);
                let name = self.member_name()?;
                let span = expr.span.to(name.span);
                expr = self.mk_expr(
                    ExprKind::Member {
                        target: Box::new(expr),
                        name,
                        conditional,
                    },
                    span,
                )?;
            } else if self.at(Punct::LParen) {
                let args = self.args(Punct::LParen, Punct::RParen)?;
                let span = Span::new(expr.span.start, self.prev_end());
                expr = self.mk_expr(
                    ExprKind::Invoke {
                        callee: Box::new(expr),
                        args,
                    },
                    span,
                )?;
            } else if self.at(Punct::LBracket) {
                let args = self.args(Punct::LBracket, Punct::RBracket)?;
                let span = Span::new(expr.span.start, self.prev_end());
                expr = self.mk_expr(
                    ExprKind::Index {
                        target: Box::new(expr),
                        args,
                    },
                    span,
                )?;
            } else if self.at(Punct::PlusPlus) || self.at(Punct::MinusMinus) {
                let op = if self.bump().is_punct(Punct::PlusPlus) {
                    UnaryOp::PostIncrement
                } else {
                    UnaryOp::PostDecrement
                };
                let span = Span::new(expr.span.start, self.prev_end());
                expr = self.mk_expr(
                    ExprKind::Unary {
                        op,
                        operand: Box::new(expr),
                    },
                    span,
                )?;
            } else {
                return Ok(expr);
            }
        }
    }

    /// Member names may be contextual keywords but also e.g. `.Equals`, `.ToString`
    fn member_name(&mut self) -> PResult<Ident> {
        if self.peek().kind == TokenKind::Ident || self.peek().kind == TokenKind::Keyword {
            let token = self.bump();
            return Ok(Ident {
                name: token.text,
                span: token.span,
            });
        }
        Err(self.error("expected member name"))
    }

    fn args(&mut self, open: Punct, close: Punct) -> PResult<Vec<Expr>> {
        self.expect(open)?;
        let mut args = Vec::new();
        if self.eat(close) {
            return Ok(args);
        }
        loop {
            // named argument
            if self.peek().kind == TokenKind::Ident && self.peek_at(1).is_punct(Punct::Colon) {
                self.bump();
                self.bump();
            }
            let is_out = self.at_keyword("out");
            while ["ref", "out", "in"].iter().any(|kw| self.at_keyword(kw)) {
                self.bump();
            }
            let declared = if is_out {
                self.attempt(|p| {
                    p.parse_type()?;
                    let name = p.expect_ident()?;
                    p.mk_expr(ExprKind::Name(name.clone()), name.span)
                })?
            } else {
                None
            };
            match declared {
                Some(expr) => args.push(expr),
                None => args.push(self.parse_expr()?),
            }
            if !self.eat(Punct::Comma) {
                break;
            }
        }
        self.expect(close)?;
        Ok(args)
    }

    fn primary(&mut self) -> PResult<Expr> {
        let token = self.peek().clone();
        let span = token.span;
        let kind = match &token.kind {
            TokenKind::Int => ExprKind::Literal(Literal::Int(token.text.clone())),
            TokenKind::Real => ExprKind::Literal(Literal::Real(token.text.clone())),
            TokenKind::Str => ExprKind::Literal(Literal::Str(token.text.clone())),
            TokenKind::Char => ExprKind::Literal(Literal::Char(token.text.clone())),
            TokenKind::Ident => ExprKind::Name(Ident {
                name: token.text.clone(),
                span,
            }),
            TokenKind::Keyword => match token.text.as_str() {
                "true" => ExprKind::Literal(Literal::Bool(true)),
                "false" => ExprKind::Literal(Literal::Bool(false)),
                "null" => ExprKind::Literal(Literal::Null),
                "this" => ExprKind::This,
                "base" => ExprKind::Base,
                "new" => return self.new_expr(),
                "typeof" => {
                    self.bump();
                    self.expect(Punct::LParen)?;
                    let ty = self.parse_type()?;
                    self.expect(Punct::RParen)?;
                    let span = Span::new(span.start, self.prev_end());
                    return self.mk_expr(ExprKind::TypeOf(ty), span);
                }
                "default" => {
                    self.bump();
                    let ty = if self.eat(Punct::LParen) {
                        let ty = self.parse_type()?;
                        self.expect(Punct::RParen)?;
                        Some(ty)
                    } else {
                        None
                    };
                    let span = Span::new(span.start, self.prev_end());
                    return self.mk_expr(ExprKind::Default(ty), span);
                }
                // static access on a predefined type, e.g. `int.Parse`
                word if PREDEFINED_TYPES.contains(&word) => ExprKind::Name(Ident {
                    name: token.text.clone(),
                    span,
                }),
                _ => return Err(self.error("expected expression")),
            },
            TokenKind::Punct(Punct::LParen) => {
                self.bump();
                let inner = self.parse_expr()?;
                self.expect(Punct::RParen)?;
                let span = Span::new(span.start, self.prev_end());
                return self.mk_expr(ExprKind::Paren(Box::new(inner)), span);
            }
            _ => return Err(self.error("expected expression")),
        };
        self.bump();
        self.mk_expr(kind, span)
    }

    fn new_expr(&mut self) -> PResult<Expr> {
        let start = self.expect_keyword("new")?.start;
        let mut ty = None;
        let mut args = Vec::new();
        let mut initializer = None;

        if self.at(Punct::LBracket) {
            // `new[] { ... }`
            self.skip_balanced(Punct::LBracket, Punct::RBracket)?;
        } else if !self.at(Punct::LParen) && !self.at(Punct::LBrace) {
            let element = self.parse_type()?;
            if self.at(Punct::LBracket) {
                args = self.args(Punct::LBracket, Punct::RBracket)?;
                let span = Span::new(element.span.start, self.prev_end());
                ty = Some(TypeSyntax {
                    kind: TypeSyntaxKind::Array(Box::new(element)),
                    span,
                });
            } else {
                ty = Some(element);
            }
        }
        if self.at(Punct::LParen) {
            args = self.args(Punct::LParen, Punct::RParen)?;
        }
        if self.at(Punct::LBrace) {
            initializer = Some(self.initializer()?);
        }
        let span = Span::new(start, self.prev_end());
        self.mk_expr(
            ExprKind::New {
                ty,
                args,
                initializer,
            },
            span,
        )
    }

    fn initializer(&mut self) -> PResult<Initializer> {
        self.expect(Punct::LBrace)?;
        let is_object =
            self.peek().kind == TokenKind::Ident && self.peek_at(1).is_punct(Punct::Assign);
        if is_object {
            let mut items = Vec::new();
            while !self.at(Punct::RBrace) {
                let name = self.expect_ident()?;
                self.expect(Punct::Assign)?;
                let value = self.parse_var_init()?;
                items.push((name, value));
                if !self.eat(Punct::Comma) {
                    break;
                }
            }
            self.expect(Punct::RBrace)?;
            return Ok(Initializer::Object(items));
        }
        let mut items = Vec::new();
        while !self.at(Punct::RBrace) {
            items.push(self.parse_var_init()?);
            if !self.eat(Punct::Comma) {
                break;
            }
        }
        self.expect(Punct::RBrace)?;
        Ok(Initializer::Collection(items))
    }
}

fn is_predefined(ty: &TypeSyntax) -> bool {
    match &ty.kind {
        TypeSyntaxKind::Predefined(_) => true,
        TypeSyntaxKind::Nullable(inner) | TypeSyntaxKind::Array(inner) => is_predefined(inner),
        TypeSyntaxKind::Named { .. } => false,
    }
}

fn join_namespace(outer: &Option<String>, name: &str) -> String {
    match outer {
        Some(outer) => format!("{}.{}", outer, name),
        None => name.to_string(),
    }
}
