// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Shared pipeline helpers: read, lex, parse.
//!
//! Each step reports its own diagnostics and exits the process on failure.

use std::process;

use tl_ast::token::Token;
use tl_ast::Environment;
use tl_diagnostics::{Diagnostic, ToDiagnostic};

use crate::{output, show_diagnostics, Format};

/// Result of the frontend pipeline (read → lex → parse).
pub struct FrontendResult {
    pub source: String,
    pub env: Environment,
    /// Parse warnings not yet shown. Always empty in human mode.
    pub pending: Vec<Diagnostic>,
}

pub fn read_source(path: &str) -> String {
    match std::fs::read_to_string(path) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("{}: reading {}: {}", output::error_label(), output::file_path(path), e);
            process::exit(1);
        }
    }
}

/// Tokenize, or report every lexical error and exit. Parsing is never attempted on bad input.
pub fn lex(source: &str, path: &str, format: Format) -> Vec<Token> {
    let result = tl_lexer::Lexer::new(source).tokenize();
    if !result.is_ok() {
        let diags: Vec<Diagnostic> = result.errors.iter().map(|e| e.to_diagnostic()).collect();
        show_diagnostics(&diags, source, path, "lex", format);
        if format == Format::Human {
            eprintln!("\n{}", output::banner_fail("Lex", result.errors.len()));
        }
        process::exit(1);
    }
    tracing::debug!(tokens = result.tokens.len(), "lexed {}", path);
    result.tokens
}

/// Parse with the standard prelude.
///
/// Skipped-token warnings do not stop the pipeline. Human mode shows them
/// right away; JSON mode hands them back for the command's single report.
pub fn parse(tokens: Vec<Token>, source: &str, path: &str, format: Format) -> (Environment, Vec<Diagnostic>) {
    match tl_parser::Parser::new(tokens).parse() {
        Ok(out) => {
            let warnings: Vec<Diagnostic> = out.warnings.iter().map(|w| w.to_diagnostic()).collect();
            if format == Format::Human {
                show_diagnostics(&warnings, source, path, "parse", format);
                return (out.env, Vec::new());
            }
            (out.env, warnings)
        }
        Err(err) => {
            tracing::debug!(kind = ?err.kind, "parse failed");
            show_diagnostics(&[err.to_diagnostic()], source, path, "parse", format);
            if format == Format::Human {
                eprintln!("\n{}", output::banner_fail("Parse", 1));
            }
            process::exit(1);
        }
    }
}

pub fn run_frontend(path: &str, format: Format) -> FrontendResult {
    let source = read_source(path);
    let tokens = lex(&source, path, format);
    let (env, pending) = parse(tokens, &source, path, format);
    FrontendResult { source, env, pending }
}
