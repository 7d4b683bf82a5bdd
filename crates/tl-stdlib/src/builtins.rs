// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Built-in functions for the tl prelude.

use std::fmt;

use tl_ast::{AssertionReport, NativeCall, NativeError, Value};

/// Identifies a built-in function
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuiltinKind {
    /// writeLn(value) - prints the value and a newline
    WriteLn,
    /// assert(condition) - reports pass/fail, never aborts
    Assert,
    /// assertEquals(expected, actual) - reports pass/fail, never aborts
    AssertEquals,
    /// readInt() - reads one integer line from input
    ReadInt,
}

impl BuiltinKind {
    pub fn name(self) -> &'static str {
        match self {
            BuiltinKind::WriteLn => "writeLn",
            BuiltinKind::Assert => "assert",
            BuiltinKind::AssertEquals => "assertEquals",
            BuiltinKind::ReadInt => "readInt",
        }
    }
}

impl fmt::Display for BuiltinKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn arg(args: &[Value], index: usize, kind: BuiltinKind) -> Result<Value, NativeError> {
    args.get(index)
        .copied()
        .ok_or_else(|| NativeError::new(format!("{} is missing argument {}", kind, index + 1)))
}

pub(crate) fn write_ln(call: &NativeCall<'_>, args: &[Value]) -> Result<Option<Value>, NativeError> {
    let value = arg(args, 0, BuiltinKind::WriteLn)?;
    call.host.write_line(&value.to_string());
    Ok(None)
}

pub(crate) fn assert(call: &NativeCall<'_>, args: &[Value]) -> Result<Option<Value>, NativeError> {
    let value = arg(args, 0, BuiltinKind::Assert)?;
    let passed = value
        .as_bool()
        .ok_or_else(|| NativeError::new(format!("assert expects a bool, found {}", value.ty())))?;
    call.host.report_assertion(AssertionReport {
        passed,
        pos: call.pos,
        message: if passed { "assertion holds".to_string() } else { "assertion failed".to_string() },
    });
    Ok(None)
}

pub(crate) fn assert_equals(call: &NativeCall<'_>, args: &[Value]) -> Result<Option<Value>, NativeError> {
    let expected = arg(args, 0, BuiltinKind::AssertEquals)?;
    let actual = arg(args, 1, BuiltinKind::AssertEquals)?;
    // Values of different types are never equal, even 1 and 1.0.
    let passed = expected == actual;
    let message = if passed {
        format!("{} equals {}", expected, actual)
    } else {
        format!("expected {} `{}`, found {} `{}`", expected.ty(), expected, actual.ty(), actual)
    };
    call.host.report_assertion(AssertionReport { passed, pos: call.pos, message });
    Ok(None)
}

pub(crate) fn read_int(call: &NativeCall<'_>, _args: &[Value]) -> Result<Option<Value>, NativeError> {
    let line = call
        .host
        .read_line()
        .ok_or_else(|| NativeError::new("readInt reached end of input"))?;
    let trimmed = line.trim();
    trimmed
        .parse::<i64>()
        .map(|n| Some(Value::Int(n)))
        .map_err(|_| NativeError::new(format!("readInt expected an integer, found `{}`", trimmed)))
}
