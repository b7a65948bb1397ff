//! Tokenizer for the C# subset understood by the front end

use crate::source::Span;
use thiserror::Error;

/// Tokenizer failure at a byte offset
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct LexError {
    pub offset: usize,
    pub message: String,
}

/// Punctuation and operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Punct {
    LBrace,
    RBrace,
    LParen,
    RParen,
    LBracket,
    RBracket,
    Semi,
    Comma,
    Dot,
    QuestionDot,
    Question,
    QuestionQuestion,
    Colon,
    Arrow,
    Assign,
    EqEq,
    NotEq,
    Lt,
    Le,
    Gt,
    Ge,
    AndAnd,
    OrOr,
    Not,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    PlusPlus,
    MinusMinus,
    PlusEq,
    MinusEq,
    StarEq,
    SlashEq,
    PercentEq,
    QuestionQuestionEq,
    Amp,
    Pipe,
    Caret,
    Tilde,
}

impl Punct {
    pub fn as_str(self) -> &'static str {
        match self {
            Punct::LBrace => "{",
            Punct::RBrace => "}",
            Punct::LParen => "(",
            Punct::RParen => ")",
            Punct::LBracket => "[",
            Punct::RBracket => "]",
            Punct::Semi => ";",
            Punct::Comma => ",",
            Punct::Dot => ".",
            Punct::QuestionDot => "?.",
            Punct::Question => "?",
            Punct::QuestionQuestion => "??",
            Punct::Colon => ":",
            Punct::Arrow => "=>",
            Punct::Assign => "=",
            Punct::EqEq => "==",
            Punct::NotEq => "!=",
            Punct::Lt => "<",
            Punct::Le => "<=",
            Punct::Gt => ">",
            Punct::Ge => ">=",
            Punct::AndAnd => "&&",
            Punct::OrOr => "||",
            Punct::Not => "!",
            Punct::Plus => "+",
            Punct::Minus => "-",
            Punct::Star => "*",
            Punct::Slash => "/",
            Punct::Percent => "%",
            Punct::PlusPlus => "++",
            Punct::MinusMinus => "--",
            Punct::PlusEq => "+=",
            Punct::MinusEq => "-=",
            Punct::StarEq => "*=",
            Punct::SlashEq => "/=",
            Punct::PercentEq => "%=",
            Punct::QuestionQuestionEq => "??=",
            Punct::Amp => "&",
            Punct::Pipe => "|",
            Punct::Caret => "^",
            Punct::Tilde => "~",
        }
    }
}

// Longest operators first so prefixes never shadow them.
const PUNCTUATION: &[(&str, Punct)] = &[
    ("??=", Punct::QuestionQuestionEq),
    ("?.", Punct::QuestionDot),
    ("??", Punct::QuestionQuestion),
    ("=>", Punct::Arrow),
    ("==", Punct::EqEq),
    ("!=", Punct::NotEq),
    ("<=", Punct::Le),
    (">=", Punct::Ge),
    ("&&", Punct::AndAnd),
    ("||", Punct::OrOr),
    ("++", Punct::PlusPlus),
    ("--", Punct::MinusMinus),
    ("+=", Punct::PlusEq),
    ("-=", Punct::MinusEq),
    ("*=", Punct::StarEq),
    ("/=", Punct::SlashEq),
    ("%=", Punct::PercentEq),
    ("{", Punct::LBrace),
    ("}", Punct::RBrace),
    ("(", Punct::LParen),
    (")", Punct::RParen),
    ("[", Punct::LBracket),
    ("]", Punct::RBracket),
    (";", Punct::Semi),
    (",", Punct::Comma),
    (".", Punct::Dot),
    ("?", Punct::Question),
    (":", Punct::Colon),
    ("=", Punct::Assign),
    ("<", Punct::Lt),
    (">", Punct::Gt),
    ("!", Punct::Not),
    ("+", Punct::Plus),
    ("-", Punct::Minus),
    ("*", Punct::Star),
    ("/", Punct::Slash),
    ("%", Punct::Percent),
    ("&", Punct::Amp),
    ("|", Punct::Pipe),
    ("^", Punct::Caret),
    ("~", Punct::Tilde),
];

const KEYWORDS: &[&str] = &[
    "abstract", "as", "base", "bool", "break", "byte", "case", "catch", "char", "checked",
    "class", "const", "continue", "decimal", "default", "delegate", "do", "double", "else",
    "enum", "event", "explicit", "extern", "false", "finally", "fixed", "float", "for",
    "foreach", "goto", "if", "implicit", "in", "int", "interface", "internal", "is", "lock",
    "long", "namespace", "new", "null", "object", "operator", "out", "override", "params",
    "private", "protected", "public", "readonly", "ref", "return", "sbyte", "sealed", "short",
    "sizeof", "stackalloc", "static", "string", "struct", "switch", "this", "throw", "true",
    "try", "typeof", "uint", "ulong", "unchecked", "unsafe", "ushort", "using", "virtual",
    "void", "volatile", "while",
];

/// Check whether a word is a reserved C# keyword
pub fn is_keyword(word: &str) -> bool {
    KEYWORDS.contains(&word)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    /// Identifier or contextual keyword (`var`, `get`, `where`, ...)
    Ident,
    /// Reserved keyword
    Keyword,
    Int,
    Real,
    Str,
    Char,
    Punct(Punct),
    Eof,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    /// Identifier/keyword name, or the literal's source text
    pub text: String,
    pub span: Span,
}

impl Token {
    pub fn is_punct(&self, punct: Punct) -> bool {
        self.kind == TokenKind::Punct(punct)
    }

    pub fn is_keyword(&self, word: &str) -> bool {
        self.kind == TokenKind::Keyword && self.text == word
    }

    /// Identifier with the given contextual meaning
    pub fn is_contextual(&self, word: &str) -> bool {
        self.kind == TokenKind::Ident && self.text == word
    }
}

struct Lexer<'a> {
    src: &'a str,
    pos: usize,
    tokens: Vec<Token>,
    /// True while only whitespace has been seen on the current line
    line_start: bool,
}

/// Split source text into tokens, ending with an `Eof` token
pub fn tokenize(src: &str) -> Result<Vec<Token>, LexError> {
    let mut lexer = Lexer {
        src,
        pos: 0,
        tokens: Vec::new(),
        line_start: true,
    };
    lexer.run()?;
    Ok(lexer.tokens)
}

impl<'a> Lexer<'a> {
    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn peek_at(&self, n: usize) -> Option<char> {
        self.rest().chars().nth(n)
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn error(&self, offset: usize, message: impl Into<String>) -> LexError {
        LexError {
            offset,
            message: message.into(),
        }
    }

    fn push(&mut self, kind: TokenKind, text: String, start: usize) {
        self.tokens.push(Token {
            kind,
            text,
            span: Span::new(start, self.pos),
        });
        self.line_start = false;
    }

    fn run(&mut self) -> Result<(), LexError> {
        while let Some(c) = self.peek() {
            let start = self.pos;
            match c {
                '\n' => {
                    self.bump();
                    self.line_start = true;
                }
                c if c.is_whitespace() => {
                    self.bump();
                }
                '#' if self.line_start => self.skip_line(),
                '/' if self.peek_at(1) == Some('/') => self.skip_line(),
                '/' if self.peek_at(1) == Some('*') => self.skip_block_comment()?,
                '"' => {
                    self.bump();
                    self.regular_string(start)?;
                    let text = self.src[start..self.pos].to_string();
                    self.push(TokenKind::Str, text, start);
                }
                '@' | '$' if self.starts_special_string() => {
                    self.special_string(start)?;
                    let text = self.src[start..self.pos].to_string();
                    self.push(TokenKind::Str, text, start);
                }
                '\'' => self.char_literal(start)?,
                '@' if self.peek_at(1).is_some_and(is_ident_start) => {
                    self.bump();
                    let name = self.ident_tail();
                    // `@class` is an identifier, never a keyword
                    self.push(TokenKind::Ident, name, start);
                }
                c if is_ident_start(c) => {
                    let name = self.ident_tail();
                    let kind = if is_keyword(&name) {
                        TokenKind::Keyword
                    } else {
                        TokenKind::Ident
                    };
                    self.push(kind, name, start);
                }
                c if c.is_ascii_digit() => self.number(start),
                '.' if self.peek_at(1).is_some_and(|d| d.is_ascii_digit()) => self.number(start),
                _ => self.punct(start)?,
            }
        }

        let end = self.src.len();
        self.tokens.push(Token {
            kind: TokenKind::Eof,
            text: String::new(),
            span: Span::new(end, end),
        });
        Ok(())
    }

    fn skip_line(&mut self) {
        while let Some(c) = self.peek() {
            if c == '\n' {
                break;
            }
            self.bump();
        }
    }

    fn skip_block_comment(&mut self) -> Result<(), LexError> {
        let start = self.pos;
        self.pos += 2;
        match self.rest().find("*/") {
            Some(idx) => {
                self.pos += idx + 2;
                Ok(())
            }
            None => Err(self.error(start, "unterminated block comment")),
        }
    }

    fn ident_tail(&mut self) -> String {
        let start = self.pos;
        while self.peek().is_some_and(is_ident_continue) {
            self.bump();
        }
        self.src[start..self.pos].to_string()
    }

    fn number(&mut self, start: usize) {
        let mut real = false;
        if self.rest().starts_with("0x") || self.rest().starts_with("0X") {
            self.pos += 2;
            while self.peek().is_some_and(|c| c.is_ascii_hexdigit() || c == '_') {
                self.bump();
            }
        } else {
            while self.peek().is_some_and(|c| c.is_ascii_digit() || c == '_') {
                self.bump();
            }
            if self.peek() == Some('.') && self.peek_at(1).is_some_and(|c| c.is_ascii_digit()) {
                real = true;
                self.bump();
                while self.peek().is_some_and(|c| c.is_ascii_digit() || c == '_') {
                    self.bump();
                }
            }
            if matches!(self.peek(), Some('e' | 'E')) {
                let sign = matches!(self.peek_at(1), Some('+' | '-'));
                let digit_at = if sign { 2 } else { 1 };
                if self.peek_at(digit_at).is_some_and(|c| c.is_ascii_digit()) {
                    real = true;
                    self.pos += digit_at;
                    while self.peek().is_some_and(|c| c.is_ascii_digit()) {
                        self.bump();
                    }
                }
            }
        }
        while let Some(c) = self.peek() {
            match c {
                'f' | 'F' | 'd' | 'D' | 'm' | 'M' => {
                    real = true;
                    self.bump();
                }
                'l' | 'L' | 'u' | 'U' => {
                    self.bump();
                }
                _ => break,
            }
        }
        let text = self.src[start..self.pos].to_string();
        let kind = if real { TokenKind::Real } else { TokenKind::Int };
        self.push(kind, text, start);
    }

    fn starts_special_string(&self) -> bool {
        let rest = self.rest();
        rest.starts_with("@\"")
            || rest.starts_with("$\"")
            || rest.starts_with("$@\"")
            || rest.starts_with("@$\"")
    }

    /// Verbatim and/or interpolated string; the prefix has not been consumed
    fn special_string(&mut self, start: usize) -> Result<(), LexError> {
        let mut verbatim = false;
        let mut interpolated = false;
        while let Some(c) = self.peek() {
            match c {
                '@' => verbatim = true,
                '$' => interpolated = true,
                _ => break,
            }
            self.bump();
        }
        self.bump(); // opening quote
        let mut depth = 0usize;
        loop {
            let Some(c) = self.bump() else {
                return Err(self.error(start, "unterminated string literal"));
            };
            match c {
                '{' if interpolated => {
                    if depth == 0 && self.peek() == Some('{') {
                        self.bump();
                    } else {
                        depth += 1;
                    }
                }
                '}' if interpolated && depth > 0 => depth -= 1,
                '"' if depth > 0 => self.regular_string(start)?,
                '"' if verbatim && self.peek() == Some('"') => {
                    self.bump();
                }
                '"' => return Ok(()),
                '\\' if !verbatim => {
                    self.bump();
                }
                '\n' if !verbatim && depth == 0 => {
                    return Err(self.error(start, "newline in string literal"));
                }
                _ => {}
            }
        }
    }

    /// Body of a regular string; the opening quote has been consumed
    fn regular_string(&mut self, start: usize) -> Result<(), LexError> {
        loop {
            match self.bump() {
                Some('"') => return Ok(()),
                Some('\\') => {
                    self.bump();
                }
                Some('\n') | None => {
                    return Err(self.error(start, "unterminated string literal"));
                }
                Some(_) => {}
            }
        }
    }

    fn char_literal(&mut self, start: usize) -> Result<(), LexError> {
        self.bump();
        loop {
            match self.bump() {
                Some('\'') => break,
                Some('\\') => {
                    self.bump();
                }
                Some('\n') | None => {
                    return Err(self.error(start, "unterminated character literal"));
                }
                Some(_) => {}
            }
        }
        let text = self.src[start..self.pos].to_string();
        self.push(TokenKind::Char, text, start);
        Ok(())
    }

    fn punct(&mut self, start: usize) -> Result<(), LexError> {
        let rest = self.rest();
        for (text, punct) in PUNCTUATION {
            if rest.starts_with(text) {
                self.pos += text.len();
                self.push(TokenKind::Punct(*punct), text.to_string(), start);
                return Ok(());
            }
        }
        let c = self.peek().unwrap_or_default();
        Err(self.error(start, format!("unexpected character '{}'", c)))
    }
}

fn is_ident_start(c: char) -> bool {
    c == '_' || c.is_alphabetic()
}

fn is_ident_continue(c: char) -> bool {
    c == '_' || c.is_alphanumeric()
}
