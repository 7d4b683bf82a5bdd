// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! The lexer implementation using logos.

use logos::Logos;
use thiserror::Error;
use tl_ast::token::{Token, TokenKind};
use tl_ast::{LineMap, Pos};

/// Raw token type for logos. Literal text is kept, not parsed.
#[derive(Logos, Debug, Clone, Copy, PartialEq)]
#[logos(skip r"[ \t\r\n\f]+")]
#[logos(skip r"#[^\n]*")]
enum RawToken {
    // === Keywords ===
    #[token("var")]
    Var,
    #[token("fun")]
    Fun,
    #[token("const")]
    Const,
    #[token("if")]
    If,
    #[token("while")]
    While,
    #[token("return")]
    Return,
    #[token("async")]
    Async,
    #[token("await")]
    Await,
    #[token("true")]
    #[token("false")]
    Bool,

    // === Type names ===
    #[token("int")]
    IntType,
    #[token("float")]
    FloatType,
    #[token("bool")]
    BoolType,

    // === Word operators ===
    #[token("and")]
    And,
    #[token("or")]
    Or,
    #[token("not")]
    Not,
    #[token("xor")]
    Xor,

    // === Operators (longer first) ===
    #[token(":=")]
    Assign,
    #[token("<>")]
    NotEq,
    #[token("<=")]
    LtEq,
    #[token(">=")]
    GtEq,
    #[token("=")]
    Eq,
    #[token("<")]
    Lt,
    #[token(">")]
    Gt,
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("/")]
    Slash,
    #[token("^")]
    Caret,

    // === Delimiters ===
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token(":")]
    Colon,
    #[token(",")]
    Comma,

    // === Literals ===
    #[regex(r"[0-9]+\.[0-9]+([eE][-+]?[0-9]+)?")]
    Float,
    #[regex(r"[0-9]+")]
    Int,

    // === Identifier (keywords win on equal length) ===
    #[regex(r"[a-zA-Z_][a-zA-Z0-9_]*")]
    Ident,
}

impl From<RawToken> for TokenKind {
    fn from(raw: RawToken) -> Self {
        match raw {
            RawToken::Var => TokenKind::Var,
            RawToken::Fun => TokenKind::Fun,
            RawToken::Const => TokenKind::Const,
            RawToken::If => TokenKind::If,
            RawToken::While => TokenKind::While,
            RawToken::Return => TokenKind::Return,
            RawToken::Async => TokenKind::Async,
            RawToken::Await => TokenKind::Await,
            RawToken::Bool => TokenKind::BoolLit,
            RawToken::IntType => TokenKind::IntType,
            RawToken::FloatType => TokenKind::FloatType,
            RawToken::BoolType => TokenKind::BoolType,
            RawToken::And => TokenKind::And,
            RawToken::Or => TokenKind::Or,
            RawToken::Not => TokenKind::Not,
            RawToken::Xor => TokenKind::Xor,
            RawToken::Assign => TokenKind::Assign,
            RawToken::NotEq => TokenKind::NotEq,
            RawToken::LtEq => TokenKind::LtEq,
            RawToken::GtEq => TokenKind::GtEq,
            RawToken::Eq => TokenKind::Eq,
            RawToken::Lt => TokenKind::Lt,
            RawToken::Gt => TokenKind::Gt,
            RawToken::Plus => TokenKind::Plus,
            RawToken::Minus => TokenKind::Minus,
            RawToken::Star => TokenKind::Star,
            RawToken::Slash => TokenKind::Slash,
            RawToken::Caret => TokenKind::Caret,
            RawToken::LBrace => TokenKind::LBrace,
            RawToken::RBrace => TokenKind::RBrace,
            RawToken::LParen => TokenKind::LParen,
            RawToken::RParen => TokenKind::RParen,
            RawToken::Colon => TokenKind::Colon,
            RawToken::Comma => TokenKind::Comma,
            RawToken::Float => TokenKind::FloatLit,
            RawToken::Int => TokenKind::IntLit,
            RawToken::Ident => TokenKind::Ident,
        }
    }
}

/// Maximum number of errors to collect before stopping.
const MAX_ERRORS: usize = 20;

/// The lexer for tl source code.
pub struct Lexer<'a> {
    source: &'a str,
    line_map: LineMap,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self { source, line_map: LineMap::new(source) }
    }

    /// Tokenize the entire source, collecting errors instead of stopping at the first.
    ///
    /// Adjacent unmatched characters are reported as one error.
    pub fn tokenize(&self) -> LexResult {
        let mut tokens = Vec::new();
        let mut errors: Vec<LexError> = Vec::new();
        let mut error_end = None;
        let mut raw = RawToken::lexer(self.source);

        while let Some(result) = raw.next() {
            let span = raw.span();
            let pos = self.line_map.pos(span.start);

            match result {
                Ok(kind) => tokens.push(Token::new(kind.into(), raw.slice(), pos)),
                Err(()) => {
                    if error_end == Some(span.start) {
                        if let Some(last) = errors.last_mut() {
                            last.text.push_str(raw.slice());
                        }
                    } else if errors.len() >= MAX_ERRORS {
                        break;
                    } else {
                        errors.push(LexError { line: pos.line, column: pos.column, text: raw.slice().to_string() });
                    }
                    error_end = Some(span.end);
                }
            }
        }

        tokens.push(Token::eof());
        tracing::trace!(tokens = tokens.len(), errors = errors.len(), "lexed source");

        LexResult { tokens, errors }
    }
}

/// Result of lexing: tokens plus any errors found.
#[derive(Debug)]
pub struct LexResult {
    pub tokens: Vec<Token>,
    pub errors: Vec<LexError>,
}

impl LexResult {
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }
}

/// An unmatched character sequence.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unexpected `{text}` at {line}:{column}")]
pub struct LexError {
    pub line: u32,
    pub column: u32,
    pub text: String,
}

impl LexError {
    pub fn pos(&self) -> Pos {
        Pos::new(self.line, self.column)
    }
}
