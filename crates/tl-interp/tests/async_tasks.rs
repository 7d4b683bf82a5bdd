// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! `async`/`await` behavior.

use std::sync::Arc;

use tl_ast::Environment;
use tl_interp::{CapturedHost, Evaluator, RunReport, RuntimeDiagnostic, RuntimeError};
use tl_parser::Parser;

fn build(src: &str) -> Arc<Environment> {
    let lexed = tl_lexer::Lexer::new(src).tokenize();
    assert!(lexed.is_ok(), "Lex errors: {:?}", lexed.errors);
    Arc::new(Parser::new(lexed.tokens).parse().unwrap_or_else(|e| panic!("parse failed: {}", e)).env)
}

fn run(src: &str) -> (Result<RunReport, RuntimeDiagnostic>, CapturedHost) {
    let host = CapturedHost::new();
    let mut evaluator = Evaluator::new(build(src), Arc::new(host.clone()));
    (evaluator.run(), host)
}

const SLOW_ADD: &str = "fun slowAdd(a: int, b: int): int {\n var i: int = 0\n while i < 1000 { i := i + 1 }\n return a + b\n}\n";

#[test]
fn awaited_result_is_stored_in_target() {
    let src = format!("{}async r: int = slowAdd(2, 3)\nawait r\nwriteLn(r)", SLOW_ADD);
    let (result, host) = run(&src);
    let report = result.unwrap();
    assert!(report.leaked_tasks.is_empty());
    assert_eq!(host.output(), vec!["5"]);
}

#[test]
fn async_into_existing_variable() {
    let src = format!("{}var r: int = 0\nasync r := slowAdd(20, 22)\nawait r\nwriteLn(r)", SLOW_ADD);
    assert_eq!(run(&src).1.output(), vec!["42"]);
}

#[test]
fn many_tasks_complete_independently() {
    let src = format!(
        "{}async a: int = slowAdd(1, 1)\nasync b: int = slowAdd(2, 2)\nasync c: int = slowAdd(3, 3)\nawait c\nawait a\nawait b\nwriteLn(a + b + c)",
        SLOW_ADD
    );
    assert_eq!(run(&src).1.output(), vec!["12"]);
}

#[test]
fn tasks_can_await_nested_tasks() {
    let src = format!(
        "{}fun outer(n: int): int {{\n async inner: int = slowAdd(n, n)\n await inner\n return inner * 10\n}}\nasync r: int = outer(2)\nawait r\nwriteLn(r)",
        SLOW_ADD
    );
    assert_eq!(run(&src).1.output(), vec!["40"]);
}

#[test]
fn arguments_are_evaluated_before_the_task_starts() {
    let src = format!("{}var x: int = 1\nasync r: int = slowAdd(x, x)\nx := 100\nawait r\nwriteLn(r)", SLOW_ADD);
    assert_eq!(run(&src).1.output(), vec!["2"]);
}

#[test]
fn tasks_share_globals() {
    let src = "var hits: int = 0\nfun bump(): int {\n hits := hits + 1\n return hits\n}\nasync r: int = bump()\nawait r\nwriteLn(hits)";
    assert_eq!(run(src).1.output(), vec!["1"]);
}

#[test]
fn awaiting_without_a_pending_task_fails() {
    let err = run("var r: int\nawait r").0.unwrap_err();
    assert_eq!(err.error, RuntimeError::UnknownAsyncTarget { name: "r".into() });

    let src = format!("{}async r: int = slowAdd(1, 2)\nawait r\nawait r", SLOW_ADD);
    let err = run(&src).0.unwrap_err();
    assert!(matches!(err.error, RuntimeError::UnknownAsyncTarget { .. }));
}

#[test]
fn task_failures_surface_at_await() {
    let src = "fun boom(d: int): int { return 10 / d }\nasync r: int = boom(0)\nwriteLn(1)\nawait r\nwriteLn(2)";
    let (result, host) = run(src);
    let err = result.unwrap_err();
    assert_eq!(err.pos.line, 4);
    assert!(matches!(err.error, RuntimeError::TaskFailed { ref function, .. } if function == "boom"));
    assert_eq!(err.root_cause().error, RuntimeError::DivisionByZero);
    assert_eq!(err.root_cause().pos.line, 1);
    assert_eq!(host.output(), vec!["1"]);
}

#[test]
fn unawaited_tasks_are_reported_as_leaks() {
    let src = format!("{}async r: int = slowAdd(1, 2)\nasync s: int = slowAdd(3, 4)\nawait s", SLOW_ADD);
    let report = run(&src).0.unwrap();
    assert_eq!(report.leaked_tasks.len(), 1);
    assert_eq!(report.leaked_tasks[0].target, "r");
    assert_eq!(report.leaked_tasks[0].function, "slowAdd");
}

#[test]
fn restarting_a_pending_target_leaks_the_first_task() {
    let src = format!("{}var r: int\nasync r := slowAdd(1, 2)\nasync r := slowAdd(3, 4)\nawait r\nwriteLn(r)", SLOW_ADD);
    let (result, host) = run(&src);
    let report = result.unwrap();
    assert_eq!(host.output(), vec!["7"]);
    assert_eq!(report.leaked_tasks.len(), 1);
}

#[test]
fn async_native_calls_run_on_workers() {
    let (result, host) = run("async n: int = readInt()\nawait n");
    let err = result.unwrap_err();
    assert!(matches!(err.root_cause().error, RuntimeError::Native { .. }));
    assert!(host.output().is_empty());
}

#[test]
fn recursion_between_async_and_await_keeps_each_task() {
    let src = format!(
        "{}fun f(n: int): int {{\n if n = 0 {{ return 0 }}\n async a: int = slowAdd(n, n * 9)\n var b: int = f(n - 1)\n await a\n return a + b\n}}\nwriteLn(f(2))",
        SLOW_ADD
    );
    let (result, host) = run(&src);
    let report = result.unwrap();
    assert!(report.leaked_tasks.is_empty());
    assert_eq!(host.output(), vec!["30"]);
}

#[test]
fn returning_before_await_leaks_the_local_task() {
    let src = format!(
        "{}fun early(): int {{\n async a: int = slowAdd(1, 2)\n return 5\n}}\nwriteLn(early())\nwriteLn(early())",
        SLOW_ADD
    );
    let (result, host) = run(&src);
    let report = result.unwrap();
    assert_eq!(host.output(), vec!["5", "5"]);
    assert_eq!(report.leaked_tasks.len(), 2);
    assert_eq!(report.leaked_tasks[0].target, "a");
}
