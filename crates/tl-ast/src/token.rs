// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Token definitions shared by the lexer and the parser.

use crate::Pos;

/// A token produced by the lexer.
///
/// Literal values stay in `text`; the parser converts them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub line: u32,
    pub column: u32,
    pub kind: TokenKind,
    pub text: String,
}

impl Token {
    pub fn new(kind: TokenKind, text: impl Into<String>, pos: Pos) -> Self {
        Self { line: pos.line, column: pos.column, kind, text: text.into() }
    }

    /// The end-of-input marker. Its line number carries no meaning.
    pub fn eof() -> Self {
        Self { line: 0, column: 0, kind: TokenKind::Eof, text: String::new() }
    }

    pub fn pos(&self) -> Pos {
        Pos::new(self.line, self.column)
    }
}

/// The kind of token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    // Literals
    IntLit,
    FloatLit,
    BoolLit,

    Ident,

    // Keywords
    Var,
    Fun,
    Const,
    If,
    While,
    Return,
    Async,
    Await,

    // Type names
    IntType,
    FloatType,
    BoolType,

    // Operators
    Assign,
    Plus,
    Minus,
    Star,
    Slash,
    Caret,
    And,
    Or,
    Not,
    Xor,
    Eq,
    NotEq,
    Lt,
    Gt,
    LtEq,
    GtEq,

    // Delimiters
    LBrace,
    RBrace,
    LParen,
    RParen,
    Colon,
    Comma,

    Eof,
}

impl TokenKind {
    /// Get a user-friendly name for error messages.
    pub fn display_name(&self) -> &'static str {
        match self {
            TokenKind::IntLit => "an integer",
            TokenKind::FloatLit => "a float",
            TokenKind::BoolLit => "'true' or 'false'",
            TokenKind::Ident => "a name",
            TokenKind::Var => "'var'",
            TokenKind::Fun => "'fun'",
            TokenKind::Const => "'const'",
            TokenKind::If => "'if'",
            TokenKind::While => "'while'",
            TokenKind::Return => "'return'",
            TokenKind::Async => "'async'",
            TokenKind::Await => "'await'",
            TokenKind::IntType => "'int'",
            TokenKind::FloatType => "'float'",
            TokenKind::BoolType => "'bool'",
            TokenKind::Assign => "':='",
            TokenKind::Plus => "'+'",
            TokenKind::Minus => "'-'",
            TokenKind::Star => "'*'",
            TokenKind::Slash => "'/'",
            TokenKind::Caret => "'^'",
            TokenKind::And => "'and'",
            TokenKind::Or => "'or'",
            TokenKind::Not => "'not'",
            TokenKind::Xor => "'xor'",
            TokenKind::Eq => "'='",
            TokenKind::NotEq => "'<>'",
            TokenKind::Lt => "'<'",
            TokenKind::Gt => "'>'",
            TokenKind::LtEq => "'<='",
            TokenKind::GtEq => "'>='",
            TokenKind::LBrace => "'{'",
            TokenKind::RBrace => "'}'",
            TokenKind::LParen => "'('",
            TokenKind::RParen => "')'",
            TokenKind::Colon => "':'",
            TokenKind::Comma => "','",
            TokenKind::Eof => "end of file",
        }
    }

    /// Tokens that open a declaration at top level or inside a block.
    pub fn starts_decl(&self) -> bool {
        matches!(self, TokenKind::Var | TokenKind::Fun | TokenKind::Const)
    }

    /// Tokens that open a statement.
    pub fn starts_stmt(&self) -> bool {
        matches!(
            self,
            TokenKind::Ident
                | TokenKind::LBrace
                | TokenKind::If
                | TokenKind::While
                | TokenKind::Return
                | TokenKind::Async
                | TokenKind::Await
        )
    }
}
