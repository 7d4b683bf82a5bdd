// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Error code registry.
//!
//! Maps the stable codes (L0001, P0002, ...) to titles and categories.

use std::collections::HashMap;
use std::fmt;

/// Registry of all known codes.
pub struct ErrorCodeRegistry {
    codes: HashMap<&'static str, ErrorCodeInfo>,
}

pub struct ErrorCodeInfo {
    pub code: &'static str,
    pub title: &'static str,
    pub category: ErrorCategory,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Lexical,
    Syntax,
    Resolution,
    Type,
    Runtime,
    Optimizer,
    Assertion,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorCategory::Lexical => "Lexical",
            ErrorCategory::Syntax => "Syntax",
            ErrorCategory::Resolution => "Resolution",
            ErrorCategory::Type => "Type",
            ErrorCategory::Runtime => "Runtime",
            ErrorCategory::Optimizer => "Optimizer",
            ErrorCategory::Assertion => "Assertion",
        };
        f.write_str(name)
    }
}

macro_rules! register_codes {
    ($($code:literal => ($title:literal, $cat:expr)),* $(,)?) => {{
        let mut map = HashMap::new();
        $(
            map.insert($code, ErrorCodeInfo {
                code: $code,
                title: $title,
                category: $cat,
            });
        )*
        map
    }};
}

impl Default for ErrorCodeRegistry {
    fn default() -> Self {
        use ErrorCategory::*;

        Self {
            codes: register_codes! {
                // Lexer (L00xx)
                "L0001" => ("unexpected character", Lexical),

                // Parser (P00xx)
                "P0001" => ("unexpected token", Syntax),
                "P0002" => ("duplicate identifier", Resolution),
                "P0003" => ("undefined identifier", Resolution),
                "P0004" => ("malformed parameter list", Syntax),
                "P0005" => ("invalid constant expression", Syntax),
                "P0006" => ("mismatched constant type", Type),
                "P0007" => ("invalid literal", Syntax),
                "P0008" => ("not assignable", Resolution),
                "P0009" => ("not callable", Resolution),
                "P0010" => ("arity mismatch", Type),
                "P0011" => ("async target type mismatch", Type),
                "P0012" => ("chained comparison", Syntax),
                "P0013" => ("inconsistent function table", Resolution),
                "P0014" => ("invalid extern type", Type),
                "P0050" => ("skipped token", Syntax),

                // Evaluator (R00xx)
                "R0001" => ("mismatched types", Type),
                "R0002" => ("uninitialized variable", Runtime),
                "R0003" => ("unknown async target", Runtime),
                "R0004" => ("division by zero", Runtime),
                "R0005" => ("integer overflow", Runtime),
                "R0006" => ("invalid operands", Type),
                "R0007" => ("native function failed", Runtime),
                "R0008" => ("async call failed", Runtime),
                "R0009" => ("arity mismatch", Type),
                "R0010" => ("return outside of function", Runtime),
                "R0011" => ("async call never awaited", Runtime),

                // Optimizer (O00xx)
                "O0001" => ("mismatched types", Type),
                "O0002" => ("invalid operands", Type),
                "O0003" => ("optimization changed behavior", Optimizer),

                // Assertions
                "A0001" => ("assertion failed", Assertion),
            },
        }
    }
}

impl ErrorCodeRegistry {
    pub fn get(&self, code: &str) -> Option<&ErrorCodeInfo> {
        self.codes.get(code)
    }

    pub fn all(&self) -> impl Iterator<Item = &ErrorCodeInfo> {
        self.codes.values()
    }
}
