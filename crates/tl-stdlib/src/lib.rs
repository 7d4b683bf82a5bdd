// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! tl standard library.
//!
//! Provides the prelude: the identifiers bound into scope 0 of every program
//! before any embedder externs and before the script itself.

mod builtins;

pub use builtins::BuiltinKind;

use tl_ast::{ExternIdentifier, ValType, Value};

/// Value of the `pi` prelude constant.
pub const PI: f64 = 3.1415;

/// Information about a built-in function, for tooling.
#[derive(Debug, Clone)]
pub struct BuiltinInfo {
    pub name: &'static str,
    pub kind: BuiltinKind,
    pub arity: usize,
}

/// Returns all built-in functions in injection order.
pub fn builtins() -> Vec<BuiltinInfo> {
    [
        (BuiltinKind::WriteLn, 1),
        (BuiltinKind::Assert, 1),
        (BuiltinKind::AssertEquals, 2),
        (BuiltinKind::ReadInt, 0),
    ]
    .into_iter()
    .map(|(kind, arity)| BuiltinInfo { name: kind.name(), kind, arity })
    .collect()
}

/// The default identifier set.
pub fn prelude() -> Vec<ExternIdentifier> {
    vec![
        ExternIdentifier::function("writeLn", &[("value", ValType::Any)], ValType::None, builtins::write_ln),
        ExternIdentifier::function("assert", &[("condition", ValType::Bool)], ValType::None, builtins::assert),
        ExternIdentifier::function(
            "assertEquals",
            &[("expected", ValType::Any), ("actual", ValType::Any)],
            ValType::None,
            builtins::assert_equals,
        ),
        ExternIdentifier::function("readInt", &[], ValType::Int, builtins::read_int),
        ExternIdentifier::Constant { name: "pi".to_string(), ty: ValType::Float, value: Value::Float(PI) },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use tl_ast::{AssertionReport, Host, NativeCall, Pos};

    #[derive(Default)]
    struct RecordingHost {
        lines: Mutex<Vec<String>>,
        input: Mutex<VecDeque<String>>,
        reports: Mutex<Vec<AssertionReport>>,
    }

    impl Host for RecordingHost {
        fn write_line(&self, text: &str) {
            self.lines.lock().unwrap().push(text.to_string());
        }

        fn read_line(&self) -> Option<String> {
            self.input.lock().unwrap().pop_front()
        }

        fn report_assertion(&self, report: AssertionReport) {
            self.reports.lock().unwrap().push(report);
        }
    }

    fn call(name: &str, host: &RecordingHost, args: &[Value]) -> Result<Option<Value>, tl_ast::NativeError> {
        let body = prelude()
            .into_iter()
            .find_map(|ext| match ext {
                ExternIdentifier::Function { name: n, body, .. } if n == name => Some(body),
                _ => None,
            })
            .unwrap();
        body(&NativeCall { host, pos: Pos::new(3, 7) }, args)
    }

    #[test]
    fn prelude_matches_builtin_listing() {
        let prelude = prelude();
        for info in builtins() {
            let found = prelude.iter().any(|ext| match ext {
                ExternIdentifier::Function { name, params, .. } => {
                    name == info.name && params.as_ref().map_or(0, Vec::len) == info.arity
                }
                _ => false,
            });
            assert!(found, "{} missing from prelude", info.name);
        }
        assert!(prelude.iter().any(|ext| ext.name() == "pi"));
    }

    #[test]
    fn write_ln_prints_display_form() {
        let host = RecordingHost::default();
        assert_eq!(call("writeLn", &host, &[Value::Float(2.0)]), Ok(None));
        assert_eq!(call("writeLn", &host, &[Value::Bool(false)]), Ok(None));
        assert_eq!(*host.lines.lock().unwrap(), vec!["2.0", "false"]);
    }

    #[test]
    fn failed_assertions_are_reported_not_raised() {
        let host = RecordingHost::default();
        assert_eq!(call("assert", &host, &[Value::Bool(false)]), Ok(None));
        assert_eq!(call("assertEquals", &host, &[Value::Int(1), Value::Float(1.0)]), Ok(None));
        assert_eq!(call("assertEquals", &host, &[Value::Int(4), Value::Int(4)]), Ok(None));

        let reports = host.reports.lock().unwrap();
        assert_eq!(reports.len(), 3);
        assert!(!reports[0].passed);
        assert_eq!(reports[0].pos, Pos::new(3, 7));
        assert!(!reports[1].passed);
        assert!(reports[2].passed);
    }

    #[test]
    fn read_int_parses_lines() {
        let host = RecordingHost::default();
        host.input.lock().unwrap().extend([" 42 ".to_string(), "nope".to_string()]);
        assert_eq!(call("readInt", &host, &[]), Ok(Some(Value::Int(42))));
        assert!(call("readInt", &host, &[]).is_err());
        assert!(call("readInt", &host, &[]).is_err());
    }
}
