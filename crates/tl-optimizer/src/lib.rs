// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Constant folding for tl programs.
//!
//! Rewrites the tree in place: subexpressions whose value is fixed by
//! literals, constants, propagated variable values and side-effect-free calls
//! become literals, side-effect-free call statements disappear, and empty
//! blocks are dropped. Folding is best effort per statement and never changes
//! what a program prints, reads or reports.

mod consteval;
mod effects;
mod error;
mod fold;
mod state;
mod stmt;

pub use effects::has_side_effects;
pub use error::{OptimizeError, OptimizeErrorKind};

use tl_ast::Environment;

/// Default limit on loop iterations plus calls for one compile-time call.
pub const DEFAULT_BRANCH_QUOTA: usize = 1000;

/// What a pass changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OptimizeStats {
    pub folded_exprs: usize,
    pub elided_calls: usize,
    pub removed_blocks: usize,
}

pub struct Optimizer<'a> {
    env: &'a mut Environment,
    branch_quota: usize,
}

impl<'a> Optimizer<'a> {
    pub fn new(env: &'a mut Environment) -> Self {
        Self { env, branch_quota: DEFAULT_BRANCH_QUOTA }
    }

    pub fn with_branch_quota(mut self, quota: usize) -> Self {
        self.branch_quota = quota;
        self
    }

    /// Fold the program. On error the environment is left as it was.
    pub fn optimize(self) -> Result<OptimizeStats, OptimizeError> {
        let mut working = self.env.clone();
        let stats = stmt::Pass::new(&mut working, self.branch_quota).run()?;
        *self.env = working;
        tracing::debug!(
            folded_exprs = stats.folded_exprs,
            elided_calls = stats.elided_calls,
            removed_blocks = stats.removed_blocks,
            "optimized program"
        );
        Ok(stats)
    }
}

/// Fold `env` with the default branch quota.
pub fn optimize(env: &mut Environment) -> Result<OptimizeStats, OptimizeError> {
    Optimizer::new(env).optimize()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tl_ast::{ExprKind, FunId, Node, NodeKind, OpError, ValType, Value};
    use tl_parser::Parser;

    fn parse(src: &str) -> Environment {
        let lexed = tl_lexer::Lexer::new(src).tokenize();
        assert!(lexed.is_ok(), "Lex errors: {:?}", lexed.errors);
        Parser::new(lexed.tokens).parse().unwrap_or_else(|e| panic!("parse failed: {}", e)).env
    }

    fn optimized(src: &str) -> (Environment, OptimizeStats) {
        let mut env = parse(src);
        let stats = optimize(&mut env).unwrap_or_else(|e| panic!("optimize failed: {} at {}", e, e.pos));
        (env, stats)
    }

    fn literal_init(node: &Node) -> Option<Value> {
        match &node.kind {
            NodeKind::VarDecl { init: Some(expr), .. } | NodeKind::Assign { expr, .. } => expr.as_literal(),
            _ => None,
        }
    }

    fn user_function(env: &Environment, name: &str) -> FunId {
        env.global_function(name).unwrap_or_else(|| panic!("no function `{}`", name))
    }

    #[test]
    fn arithmetic_on_literals_folds() {
        let (env, stats) = optimized("var x: int = 2 + 3 * 4");
        assert_eq!(literal_init(&env.root.nodes[0]), Some(Value::Int(14)));
        assert_eq!(stats.folded_exprs, 2);
    }

    #[test]
    fn known_values_propagate_forward() {
        let (env, _) = optimized("const k: int = 5\nvar x: int = k * 2\nvar y: int = x + 1\nx := y - x");
        assert_eq!(literal_init(&env.root.nodes[1]), Some(Value::Int(10)));
        assert_eq!(literal_init(&env.root.nodes[2]), Some(Value::Int(11)));
        assert_eq!(literal_init(&env.root.nodes[3]), Some(Value::Int(1)));
    }

    #[test]
    fn unknown_values_leave_the_statement_as_parsed() {
        let (env, _) = optimized("var n: int = readInt()\nvar m: int = n + 1\nvar k: int = 4 * 2");
        let NodeKind::VarDecl { init: Some(expr), .. } = &env.root.nodes[1].kind else {
            panic!("expected a declaration");
        };
        assert!(matches!(expr.kind, ExprKind::BinOp { .. }));
        assert_eq!(literal_init(&env.root.nodes[2]), Some(Value::Int(8)));
    }

    #[test]
    fn pure_calls_are_replaced_by_their_value() {
        let (env, stats) = optimized("fun sq(n: int): int { return n * n }\nvar x: int = sq(7) + 1");
        assert_eq!(literal_init(&env.root.nodes[1]), Some(Value::Int(50)));
        assert_eq!(stats.elided_calls, 1);
    }

    #[test]
    fn pure_call_statements_disappear() {
        let (env, _) = optimized("fun id(n: int): int { return n }\nid(3)\nwriteLn(1)");
        assert_eq!(env.root.nodes.len(), 2);
        assert!(matches!(env.root.nodes[1].kind, NodeKind::CallStmt(_)));
    }

    #[test]
    fn impure_calls_stay_but_their_effect_is_tracked() {
        let src = "var hits: int = 0\nfun bump(): int {\n hits := hits + 1\n return hits\n}\nvar a: int = bump()\nvar b: int = hits * 10";
        let (env, _) = optimized(src);
        let NodeKind::VarDecl { init: Some(expr), .. } = &env.root.nodes[2].kind else {
            panic!("expected a declaration");
        };
        assert!(matches!(expr.kind, ExprKind::Call(_)));
        assert_eq!(literal_init(&env.root.nodes[3]), Some(Value::Int(10)));
    }

    #[test]
    fn native_calls_keep_running_with_folded_arguments() {
        let (env, _) = optimized("writeLn(6 * 7)");
        let NodeKind::CallStmt(call) = &env.root.nodes[0].kind else {
            panic!("expected a call statement");
        };
        assert_eq!(call.args[0].as_literal(), Some(Value::Int(42)));
    }

    #[test]
    fn functions_that_print_are_never_elided() {
        let (env, _) = optimized("fun show(n: int) { writeLn(n) }\nshow(1)");
        assert!(matches!(env.root.nodes[1].kind, NodeKind::CallStmt(_)));
        assert!(has_side_effects(&env, user_function(&env, "show")));
    }

    #[test]
    fn empty_blocks_and_functions_are_removed_in_order() {
        let (env, stats) = optimized("writeLn(1)\n{ }\nfun nothing() { }\n{ var x: int = 1 }\nwriteLn(2)");
        assert_eq!(env.root.nodes.len(), 3);
        assert!(matches!(env.root.nodes[0].kind, NodeKind::CallStmt(_)));
        assert!(matches!(env.root.nodes[1].kind, NodeKind::Block(_)));
        assert!(matches!(env.root.nodes[2].kind, NodeKind::CallStmt(_)));
        assert_eq!(stats.removed_blocks, 2);
        // The table entry survives.
        assert!(env.global_function("nothing").is_some());
    }

    #[test]
    fn if_bodies_follow_the_known_condition() {
        let (env, _) = optimized("var x: int = 1\nif 1 < 2 { x := x + 1 }\nif false { x := x + 1 }\nvar y: int = x");
        let NodeKind::If { cond, body } = &env.root.nodes[1].kind else { panic!("expected if") };
        assert_eq!(cond.as_literal(), Some(Value::Bool(true)));
        assert_eq!(literal_init(&body.nodes[0]), Some(Value::Int(2)));

        let NodeKind::If { body, .. } = &env.root.nodes[2].kind else { panic!("expected if") };
        assert!(matches!(&body.nodes[0].kind, NodeKind::Assign { expr, .. } if expr.as_literal().is_none()));
        assert_eq!(literal_init(&env.root.nodes[3]), Some(Value::Int(2)));
    }

    #[test]
    fn unknown_if_invalidates_what_it_assigns() {
        let (env, _) = optimized("var x: int = 1\nif readInt() > 0 { x := 5 }\nvar y: int = x");
        assert_eq!(literal_init(&env.root.nodes[2]), None);
    }

    #[test]
    fn loops_reading_variables_are_untouched() {
        let src = "var i: int = 0\nwhile i < 3 { i := i + 1 + 1 }\nvar j: int = i";
        let before = parse(src);
        let (after, _) = optimized(src);
        assert_eq!(before.root.nodes[1], after.root.nodes[1]);
        assert_eq!(literal_init(&after.root.nodes[2]), None);
    }

    #[test]
    fn loops_calling_global_readers_are_untouched() {
        let src = "var g: int = 0\n\
                   fun more(): bool { return g < 1 }\n\
                   fun first(): bool { return g = 0 }\n\
                   while more() {\n if first() { writeLn(1) }\n g := 5\n}";
        let before = parse(src);
        let (after, _) = optimized(src);
        assert_eq!(before.root.nodes[3], after.root.nodes[3]);
    }

    #[test]
    fn loop_bails_stay_inside_the_loop() {
        let src = "fun count(n: int): int {\n var i: int = 0\n while i < n { i := i + 1 }\n var k: int = 2 * 3\n return i + k\n}\n\
                   var j: int = readInt()\n\
                   while j > 0 { j := j - 1 }\n\
                   var z: int = 4 * 5";
        let (env, _) = optimized(src);
        let body = env.function(user_function(&env, "count")).block().expect("user function body");
        assert_eq!(literal_init(&body.nodes[2]), Some(Value::Int(6)));
        assert_eq!(literal_init(&env.root.nodes[3]), Some(Value::Int(20)));
    }

    #[test]
    fn non_boolean_condition_is_fatal() {
        let mut env = parse("if 1 + 1 { writeLn(1) }");
        let before = env.root.clone();
        let err = optimize(&mut env).unwrap_err();
        assert!(matches!(
            err.kind,
            OptimizeErrorKind::TypeMismatch { expected: ValType::Bool, found: ValType::Int, .. }
        ));
        assert_eq!(env.root, before);
    }

    #[test]
    fn operator_type_errors_on_known_operands_are_fatal() {
        let mut env = parse("var b: bool = true + 1");
        let err = optimize(&mut env).unwrap_err();
        assert!(matches!(err.kind, OptimizeErrorKind::InvalidOperands(OpError::TypeMismatch { .. })));
    }

    #[test]
    fn division_by_zero_is_left_for_the_runtime() {
        let (env, _) = optimized("var x: int = 1 / 0");
        assert_eq!(literal_init(&env.root.nodes[0]), None);
    }

    #[test]
    fn exhausted_quota_keeps_the_call() {
        let src = "fun spin(n: int): int {\n var i: int = 0\n while i < n { i := i + 1 }\n return i\n}\nvar x: int = spin(50)";
        let mut env = parse(src);
        Optimizer::new(&mut env).with_branch_quota(10).optimize().unwrap();
        assert!(matches!(&env.root.nodes[1].kind, NodeKind::VarDecl { init: Some(e), .. } if matches!(e.kind, ExprKind::Call(_))));

        let (env, _) = optimized(src);
        assert_eq!(literal_init(&env.root.nodes[1]), Some(Value::Int(50)));
    }

    #[test]
    fn recursive_calls_are_evaluated_but_kept() {
        let src = "fun fact(n: int): int {\n if n < 2 { return 1 }\n return n * fact(n - 1)\n}\nvar f: int = fact(5)\nvar g: int = f + 0";
        let (env, _) = optimized(src);
        // A body with a nested call counts as side-effecting.
        assert!(has_side_effects(&env, user_function(&env, "fact")));
        assert_eq!(literal_init(&env.root.nodes[1]), None);
        assert_eq!(literal_init(&env.root.nodes[2]), Some(Value::Int(120)));
    }
}
