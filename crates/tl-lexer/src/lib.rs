// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Lexer for tl scripts.
//!
//! Tokenizes source code into the flat token stream the parser consumes.

mod lexer;

pub use lexer::{LexError, LexResult, Lexer};
