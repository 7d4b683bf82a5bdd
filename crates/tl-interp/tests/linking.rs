// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Exporting a module's globals into another program.

use std::sync::Arc;

use tl_ast::{ExternIdentifier, ValType, Value};
use tl_interp::{export_module, CapturedHost, Evaluator};
use tl_parser::Parser;

fn tokens(src: &str) -> Vec<tl_ast::token::Token> {
    let lexed = tl_lexer::Lexer::new(src).tokenize();
    assert!(lexed.is_ok(), "Lex errors: {:?}", lexed.errors);
    lexed.tokens
}

const LIBRARY: &str = "const scale: int = 3\nvar calls: int = 0\nfun scaled(n: int): int {\n calls := calls + 1\n return n * scale\n}\ncalls := 10";

#[test]
fn module_globals_become_externs() {
    let env = Arc::new(Parser::new(tokens(LIBRARY)).without_prelude().parse().unwrap().env);
    let exports = export_module(env, Arc::new(CapturedHost::new())).unwrap();
    assert_eq!(exports.len(), 3);

    assert!(matches!(
        &exports[0],
        ExternIdentifier::Constant { name, ty: ValType::Int, value: Value::Int(3) } if name == "scale"
    ));
    assert!(matches!(
        &exports[1],
        ExternIdentifier::Variable { name, default: Some(Value::Int(10)), .. } if name == "calls"
    ));
    let ExternIdentifier::Function { name, params, ret, .. } = &exports[2] else {
        panic!("expected a function export");
    };
    assert_eq!(name, "scaled");
    assert_eq!(params.as_deref(), Some(&[("n".to_string(), ValType::Int)][..]));
    assert_eq!(*ret, ValType::Int);
}

#[test]
fn exported_functions_call_back_into_the_module() {
    let library = Arc::new(Parser::new(tokens(LIBRARY)).without_prelude().parse().unwrap().env);
    let exports = export_module(library, Arc::new(CapturedHost::new())).unwrap();

    let app = "writeLn(scaled(2))\nwriteLn(scaled(5))\nwriteLn(calls + scale)";
    let env = Parser::new(tokens(app)).with_externs(exports).parse().unwrap().env;
    let host = CapturedHost::new();
    Evaluator::new(Arc::new(env), Arc::new(host.clone())).run().unwrap();
    // `calls` was copied at export time; the module's own counter moves independently.
    assert_eq!(host.output(), vec!["6", "15", "13"]);
}

#[test]
fn exporting_a_program_with_the_prelude_reexports_it() {
    let env = Arc::new(Parser::new(tokens("var x: int = 1")).parse().unwrap().env);
    let exports = export_module(env, Arc::new(CapturedHost::new())).unwrap();
    assert!(exports.iter().any(|ext| ext.name() == "writeLn"));

    let consumer = Parser::new(tokens("writeLn(x)")).without_prelude().with_externs(exports).parse().unwrap().env;
    let host = CapturedHost::new();
    Evaluator::new(Arc::new(consumer), Arc::new(host.clone())).run().unwrap();
    assert_eq!(host.output(), vec!["1"]);
}

#[test]
fn module_errors_surface_as_native_errors() {
    let library = "fun half(n: int): int { return 10 / n }";
    let env = Arc::new(Parser::new(tokens(library)).without_prelude().parse().unwrap().env);
    let exports = export_module(env, Arc::new(CapturedHost::new())).unwrap();
    let consumer = Parser::new(tokens("var h: int = half(0)")).without_prelude().with_externs(exports).parse().unwrap().env;
    let err = Evaluator::new(Arc::new(consumer), Arc::new(CapturedHost::new())).run().unwrap_err();
    assert!(matches!(err.error, tl_interp::RuntimeError::Native { ref function, .. } if function == "half"));
}
