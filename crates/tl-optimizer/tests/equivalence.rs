// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Optimizing a program never changes what it prints or reports.

use std::sync::Arc;

use tl_ast::Environment;
use tl_interp::{CapturedHost, Evaluator};
use tl_parser::Parser;

fn parse(src: &str) -> Environment {
    let lexed = tl_lexer::Lexer::new(src).tokenize();
    assert!(lexed.is_ok(), "Lex errors: {:?}", lexed.errors);
    Parser::new(lexed.tokens).parse().unwrap_or_else(|e| panic!("parse failed: {}", e)).env
}

/// Output lines plus the rendered runtime error, if any.
fn observe(env: Environment, input: &[&str]) -> (Vec<String>, Option<String>, usize) {
    let host = CapturedHost::new().with_input(input.iter().copied());
    let result = Evaluator::new(Arc::new(env), Arc::new(host.clone())).run();
    let error = result.err().map(|e| e.error.to_string());
    (host.output(), error, host.failed_assertions())
}

fn assert_equivalent(src: &str, input: &[&str]) {
    let plain = parse(src);
    let mut folded = plain.clone();
    tl_optimizer::optimize(&mut folded).unwrap_or_else(|e| panic!("optimize failed: {} at {}", e, e.pos));
    assert_eq!(observe(plain, input), observe(folded, input), "program:\n{}", src);
}

#[test]
fn arithmetic_and_constants() {
    assert_equivalent("const k: int = 6\nvar x: int = k * 7\nwriteLn(x)\nwriteLn(x / 4 + 1.5)\nwriteLn(pi * 2)", &[]);
}

#[test]
fn side_effects_in_call_order() {
    let src = "var log: int = 0\n\
               fun note(n: int): int {\n log := log * 10 + n\n writeLn(log)\n return n\n}\n\
               var a: int = note(1) + note(2)\n\
               writeLn(a)\n\
               note(3)\n\
               writeLn(log)";
    assert_equivalent(src, &[]);
}

#[test]
fn pure_helpers_and_loops() {
    let src = "fun sq(n: int): int { return n * n }\n\
               fun sum(n: int): int {\n var i: int = 0\n var s: int = 0\n while i < n {\n  i := i + 1\n  s := s + sq(i)\n }\n return s\n}\n\
               writeLn(sum(10))\n\
               var i: int = 0\n\
               while i < 3 { writeLn(sq(i) + 1)\n i := i + 1 }";
    assert_equivalent(src, &[]);
}

#[test]
fn loops_whose_conditions_call_global_readers() {
    let src = "var g: int = 0\n\
               fun more(): bool { return g < 1 }\n\
               fun first(): bool { return g = 0 }\n\
               while more() {\n if first() { writeLn(1) }\n g := 5\n}\n\
               writeLn(g)";
    assert_equivalent(src, &[]);
}

#[test]
fn input_dependent_branches() {
    let src = "var n: int = readInt()\n\
               var x: int = 10\n\
               if n > 5 { x := x + n }\n\
               if true { x := x * 2 }\n\
               if false { x := 0 }\n\
               writeLn(x)";
    assert_equivalent(src, &["7"]);
    assert_equivalent(src, &["1"]);
}

#[test]
fn assertions_report_identically() {
    assert_equivalent("assert(1 + 1 = 2)\nassert(2 * 2 = 5)\nassertEquals(3, 1 + 2)\nassertEquals(1, 1.0)", &[]);
}

#[test]
fn runtime_faults_are_preserved() {
    assert_equivalent("writeLn(1)\nvar z: int = 4 / 0\nwriteLn(2)", &[]);
    assert_equivalent("fun half(n: int): int { return 10 / n }\nwriteLn(half(5))\nwriteLn(half(0))", &[]);
}

#[test]
fn async_tasks() {
    let src = "var total: int = 0\n\
               fun add(n: int): int {\n total := total + n\n return total\n}\n\
               async r: int = add(2 + 3)\n\
               await r\n\
               writeLn(r)\n\
               writeLn(total + 1)";
    assert_equivalent(src, &[]);
}

#[test]
fn empty_blocks_vanish_without_trace() {
    assert_equivalent("{ }\nfun nothing() { }\nnothing()\n{ { } }\nwriteLn(1)", &[]);
}
