// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Parser for tl scripts.
//!
//! Transforms a token stream into a typed AST plus the flat constant,
//! variable and function tables, resolving every name along the way.

mod error;
mod hints;
mod parser;
mod scope;

pub use error::{AstError, AstErrorKind, ParseWarning};
pub use parser::{ParseOutput, Parser};
pub use scope::{Category, Identifier, SymbolTable};

#[cfg(test)]
mod tests {
    use super::*;
    use tl_ast::{
        BinOp, Environment, ExprKind, ExternIdentifier, FunctionBody, GlobalIdentifier, Node, NodeKind, Owner,
        UnOp, ValType, Value,
    };

    fn parse(src: &str) -> Result<ParseOutput, AstError> {
        let lex_result = tl_lexer::Lexer::new(src).tokenize();
        assert!(lex_result.is_ok(), "Lex errors: {:?}", lex_result.errors);
        Parser::new(lex_result.tokens).parse()
    }

    fn env(src: &str) -> Environment {
        match parse(src) {
            Ok(output) => output.env,
            Err(e) => panic!("parse failed: {} at {:?}", e, e.pos),
        }
    }

    fn error(src: &str) -> AstErrorKind {
        match parse(src) {
            Ok(_) => panic!("expected a parse error for {:?}", src),
            Err(e) => e.kind,
        }
    }

    fn user_nodes(env: &Environment) -> &[Node] {
        &env.root.nodes
    }

    #[test]
    fn inner_block_shadows_outer_variable() {
        let env = env("var x: int = 1\n{ var x: float = 2.0\n x := 3.0 }\nx := 4");
        let nodes = user_nodes(&env);
        let NodeKind::Block(block) = &nodes[1].kind else { panic!("expected block") };
        let NodeKind::Assign { var: inner, .. } = &block.nodes[1].kind else { panic!("expected assign") };
        let NodeKind::Assign { var: outer, .. } = &nodes[2].kind else { panic!("expected assign") };
        assert_ne!(inner, outer);
        assert_eq!(env.variable(*inner).ty, ValType::Float);
        assert_eq!(env.variable(*outer).ty, ValType::Int);
    }

    #[test]
    fn redeclaration_in_same_scope_is_rejected() {
        assert_eq!(
            error("{ var x: int\n var x: float }"),
            AstErrorKind::DuplicateIdentifier { name: "x".into() }
        );
        // Sibling blocks are independent scopes.
        env("{ var x: int }\n{ var x: float }");
    }

    #[test]
    fn categories_share_one_namespace_per_scope() {
        assert_eq!(
            error("const a: int = 1\nvar a: int"),
            AstErrorKind::DuplicateIdentifier { name: "a".into() }
        );
    }

    #[test]
    fn parameters_are_local_to_the_function() {
        env("fun f(a: int): int { return a }");
        assert_eq!(
            error("fun f(a: int): int { return a }\na := 1"),
            AstErrorKind::UndefinedIdentifier { name: "a".into() }
        );
        assert_eq!(
            error("fun f(a: int) { var a: int }"),
            AstErrorKind::DuplicateIdentifier { name: "a".into() }
        );
        // A nested block may shadow a parameter.
        env("fun f(a: int) { { var a: float } }");
    }

    #[test]
    fn variable_slots_follow_their_owner() {
        let env = env("var g: int\nfun f(a: int, b: int) { var c: int\n { var d: int } }\nvar h: int");
        let g = env.global_variable("g").unwrap();
        let h = env.global_variable("h").unwrap();
        assert_eq!(env.variable(g).slot, 0);
        assert_eq!(env.variable(h).slot, 1);
        assert_eq!(env.global_count, 2);

        let f = env.global_function("f").unwrap();
        let function = env.function(f);
        assert_eq!(function.local_count, 4);
        assert_eq!(function.params.len(), 2);
        for (slot, param) in function.params.iter().enumerate() {
            assert_eq!(env.variable(param.var).owner, Owner::Function(f));
            assert_eq!(env.variable(param.var).slot, slot);
        }
    }

    #[test]
    fn recursive_functions_resolve_themselves() {
        let env = env("fun fact(n: int): int {\n if n <= 1 { return 1 }\n return n * fact(n - 1)\n}");
        let f = env.global_function("fact").unwrap();
        let body = env.function(f).block().unwrap();
        assert_eq!(body.nodes.len(), 2);
    }

    #[test]
    fn precedence_and_associativity() {
        let env = env("var x: int = 1 + 2 * 3\nvar y: int = 2 ^ 3 ^ 2\nvar z: int = -2 ^ 2");
        let init = |i: usize| match &user_nodes(&env)[i].kind {
            NodeKind::VarDecl { init: Some(expr), .. } => expr.clone(),
            other => panic!("unexpected node {:?}", other),
        };

        let ExprKind::BinOp { op: BinOp::Add, right, .. } = init(0).kind else { panic!("expected add") };
        assert!(matches!(right.kind, ExprKind::BinOp { op: BinOp::Mul, .. }));

        let ExprKind::BinOp { op: BinOp::Pow, left, right } = init(1).kind else { panic!("expected pow") };
        assert_eq!(left.as_literal(), Some(Value::Int(2)));
        assert!(matches!(right.kind, ExprKind::BinOp { op: BinOp::Pow, .. }));

        let ExprKind::BinOp { op: BinOp::Pow, left, .. } = init(2).kind else { panic!("expected pow") };
        assert!(matches!(left.kind, ExprKind::UnOp { op: UnOp::Neg, .. }));
    }

    #[test]
    fn comparisons_do_not_chain() {
        env("var b: bool = 1 < 2");
        env("var b: bool = (1 < 2) = true");
        assert_eq!(error("var b: bool = 1 < 2 < 3"), AstErrorKind::ChainedComparison);
    }

    #[test]
    fn constant_initializers_are_literals_or_constants() {
        let env = env("const a: int = 5\nconst b: int = a");
        let b = env.global_constant("b").unwrap();
        assert_eq!(env.constant(b).value, Value::Int(5));

        assert!(matches!(
            error("const a: int = 5\nconst c: int = a + 1"),
            AstErrorKind::InvalidConstantExpression { .. }
        ));
        assert!(matches!(
            error("const a: int = 5\nconst d: float = a"),
            AstErrorKind::InvalidConstantExpression { .. }
        ));
        assert!(matches!(error("var v: int\nconst e: int = v"), AstErrorKind::InvalidConstantExpression { .. }));
        assert_eq!(
            error("const f: int = 1.5"),
            AstErrorKind::TypeMismatch { name: "f".into(), expected: ValType::Int, found: ValType::Float }
        );
    }

    #[test]
    fn constants_and_calls_are_not_assignable() {
        assert_eq!(error("const a: int = 1\na := 2"), AstErrorKind::NotAssignable { name: "a".into() });
        assert_eq!(error("var v: int\nv(1)"), AstErrorKind::NotCallable { name: "v".into() });
    }

    #[test]
    fn call_arity_is_checked() {
        assert_eq!(
            error("fun f(a: int) { }\nf(1, 2)"),
            AstErrorKind::ArityMismatch { name: "f".into(), expected: 1, found: 2 }
        );
        assert!(matches!(error("writeLn()"), AstErrorKind::ArityMismatch { expected: 1, found: 0, .. }));
    }

    #[test]
    fn async_declares_target_of_callee_type() {
        let env = env("fun slowAdd(a: int, b: int): int { return a + b }\nasync r: int = slowAdd(2, 3)\nawait r");
        let r = env.global_variable("r").unwrap();
        assert_eq!(env.variable(r).ty, ValType::Int);
        let nodes = user_nodes(&env);
        assert!(matches!(&nodes[1].kind, NodeKind::Async { target, .. } if *target == r));
        assert!(matches!(&nodes[2].kind, NodeKind::Await(v) if *v == r));

        self::env("fun g(): bool { return true }\nvar t: bool\nasync t := g()\nawait t");
    }

    #[test]
    fn async_target_must_match_return_type() {
        assert!(matches!(
            error("fun slowAdd(a: int, b: int): int { return a + b }\nasync r: float = slowAdd(2, 3)"),
            AstErrorKind::AsyncTargetMismatch { ret: ValType::Int, target_ty: ValType::Float, .. }
        ));
        assert!(matches!(
            error("fun p() { }\nvar t: int\nasync t := p()"),
            AstErrorKind::AsyncTargetMismatch { ret: ValType::None, .. }
        ));
    }

    #[test]
    fn unexpected_top_level_tokens_are_skipped_with_a_warning() {
        let output = parse(") var x: int = 1").unwrap();
        assert_eq!(output.warnings.len(), 1);
        assert_eq!(output.warnings[0].text, ")");
        assert_eq!(output.env.root.nodes.len(), 1);

        assert!(matches!(error("{ ) }"), AstErrorKind::UnexpectedToken { .. }));
    }

    #[test]
    fn missing_closing_brace_is_an_error() {
        let err = parse("fun f() { var a: int").unwrap_err();
        assert_eq!(err.kind, AstErrorKind::UnexpectedToken { expected: "'}'".into(), found: "end of file".into() });
        assert!(err.hint().is_some());
    }

    #[test]
    fn malformed_parameter_lists_are_reported() {
        assert!(matches!(error("fun f(a int) { }"), AstErrorKind::InvalidParameterList { .. }));
        assert!(matches!(error("fun f(a: int,) { }"), AstErrorKind::InvalidParameterList { .. }));
    }

    #[test]
    fn prelude_is_bound_before_the_script() {
        let env = env("writeLn(pi)");
        let write_ln = env.global_function("writeLn").unwrap();
        assert!(env.function(write_ln).is_native());
        assert_eq!(env.globals.first(), Some(&GlobalIdentifier::Fun(write_ln)));

        let tokens = tl_lexer::Lexer::new("writeLn(1)").tokenize().tokens;
        let err = Parser::new(tokens).without_prelude().parse().unwrap_err();
        assert_eq!(err.kind, AstErrorKind::UndefinedIdentifier { name: "writeLn".into() });
    }

    #[test]
    fn extern_identifiers_are_bound_and_checked() {
        let externs = vec![
            ExternIdentifier::Variable { name: "limit".into(), ty: ValType::Int, default: Some(Value::Int(10)) },
            ExternIdentifier::function("twice", &[("n", ValType::Int)], ValType::Int, |_, args| {
                Ok(args[0].as_int().map(|n| Value::Int(n * 2)))
            }),
        ];
        let tokens = tl_lexer::Lexer::new("limit := twice(limit)").tokenize().tokens;
        let env = Parser::new(tokens).with_externs(externs).parse().unwrap().env;
        let limit = env.global_variable("limit").unwrap();
        assert_eq!(env.variable(limit).default, Some(Value::Int(10)));
        let twice = env.global_function("twice").unwrap();
        assert!(matches!(env.function(twice).body, FunctionBody::Precompiled(_)));

        let clash = vec![ExternIdentifier::Constant { name: "pi".into(), ty: ValType::Float, value: Value::Float(3.0) }];
        let err = Parser::new(Vec::new()).with_externs(clash).parse().unwrap_err();
        assert_eq!(err.kind, AstErrorKind::DuplicateIdentifier { name: "pi".into() });
        assert_eq!(err.pos, None);

        let bad = vec![ExternIdentifier::Variable { name: "v".into(), ty: ValType::Any, default: None }];
        let err = Parser::new(Vec::new()).with_externs(bad).parse().unwrap_err();
        assert!(matches!(err.kind, AstErrorKind::InvalidExternType { .. }));
    }
}
