// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! The recursive-descent AST builder.
//!
//! Every identifier is bound while parsing: declarations go through the
//! [`SymbolTable`] and land in the flat tables of the [`Environment`] under
//! construction, uses are resolved to table ids on the spot.

use std::mem;

use tl_ast::token::{Token, TokenKind};
use tl_ast::{
    BinOp, Block, Call, ConstId, Constant, Environment, Expr, ExprKind, ExternIdentifier, FunId, Function,
    FunctionBody, GlobalIdentifier, Node, NodeKind, Owner, Param, Pos, UnOp, ValType, Value, VarId, Variable,
};

use crate::error::{AstError, AstErrorKind, ParseWarning};
use crate::scope::{Category, Identifier, SymbolTable};

/// A successfully built program.
#[derive(Debug)]
pub struct ParseOutput {
    pub env: Environment,
    pub warnings: Vec<ParseWarning>,
}

/// The AST builder for tl token streams.
pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    symbols: SymbolTable,
    env: Environment,
    /// Functions whose parameters or body are being declared, innermost last.
    owners: Vec<FunId>,
    warnings: Vec<ParseWarning>,
    externs: Vec<ExternIdentifier>,
    prelude: bool,
}

impl Parser {
    pub fn new(mut tokens: Vec<Token>) -> Self {
        if tokens.last().map(|t| t.kind) != Some(TokenKind::Eof) {
            tokens.push(Token::eof());
        }
        Self {
            tokens,
            pos: 0,
            symbols: SymbolTable::new(),
            env: Environment::default(),
            owners: Vec::new(),
            warnings: Vec::new(),
            externs: Vec::new(),
            prelude: true,
        }
    }

    /// Bind embedder identifiers into scope 0, after the prelude.
    pub fn with_externs(mut self, externs: Vec<ExternIdentifier>) -> Self {
        self.externs.extend(externs);
        self
    }

    /// Skip the default identifier set.
    pub fn without_prelude(mut self) -> Self {
        self.prelude = false;
        self
    }

    // =========================================================================
    // Top-Level Parsing
    // =========================================================================

    /// Build the program. The first structural or resolution error aborts.
    pub fn parse(mut self) -> Result<ParseOutput, AstError> {
        let mut injected = if self.prelude { tl_stdlib::prelude() } else { Vec::new() };
        injected.extend(mem::take(&mut self.externs));
        for ext in injected {
            self.inject(ext)?;
        }

        while !self.at_end() {
            let kind = self.current_kind();
            if kind.starts_decl() || kind.starts_stmt() {
                let node = self.parse_node()?;
                self.env.root.nodes.push(node);
            } else {
                let token = self.advance().clone();
                tracing::warn!(line = token.line, column = token.column, "skipping unexpected token `{}`", token.text);
                self.warnings.push(ParseWarning { pos: token.pos(), text: token.text });
            }
        }

        tracing::debug!(
            constants = self.env.constants.len(),
            variables = self.env.variables.len(),
            functions = self.env.functions.len(),
            "built program"
        );
        Ok(ParseOutput { env: self.env, warnings: self.warnings })
    }

    // =========================================================================
    // Extern Injection
    // =========================================================================

    fn inject(&mut self, ext: ExternIdentifier) -> Result<(), AstError> {
        let invalid = |name: &str, ty: ValType| {
            AstError::unpositioned(AstErrorKind::InvalidExternType { name: name.to_string(), ty })
        };
        match ext {
            ExternIdentifier::Function { name, params, ret, body } => {
                if ret == ValType::Any {
                    return Err(invalid(&name, ret));
                }
                for (param, ty) in params.iter().flatten() {
                    if *ty == ValType::None {
                        return Err(invalid(&format!("{}({})", name, param), *ty));
                    }
                }
                let id = self.declare_fun(name, ret, FunctionBody::Precompiled(body), None)?;
                if let Some(params) = params {
                    let scope = self.symbols.reserve_scope();
                    self.symbols.enter(scope);
                    self.owners.push(id);
                    let bound = self.declare_params(params.into_iter().map(|(n, t)| (n, t, None)).collect());
                    self.owners.pop();
                    self.symbols.exit();
                    self.env.function_mut(id).params = bound?;
                }
            }
            ExternIdentifier::Constant { name, ty, value } => {
                if matches!(ty, ValType::None | ValType::Any) {
                    return Err(invalid(&name, ty));
                }
                if value.ty() != ty {
                    return Err(AstError::unpositioned(AstErrorKind::TypeMismatch { name, expected: ty, found: value.ty() }));
                }
                self.declare_const(name, ty, value, None)?;
            }
            ExternIdentifier::Variable { name, ty, default } => {
                if matches!(ty, ValType::None | ValType::Any) {
                    return Err(invalid(&name, ty));
                }
                if let Some(value) = default.filter(|v| v.ty() != ty) {
                    return Err(AstError::unpositioned(AstErrorKind::TypeMismatch { name, expected: ty, found: value.ty() }));
                }
                self.declare_var(name, ty, default, None)?;
            }
        }
        Ok(())
    }

    // =========================================================================
    // Token Navigation
    // =========================================================================

    fn current(&self) -> &Token {
        let last = self.tokens.len() - 1;
        &self.tokens[self.pos.min(last)]
    }

    fn current_kind(&self) -> TokenKind {
        self.current().kind
    }

    fn current_pos(&self) -> Pos {
        self.current().pos()
    }

    fn at_end(&self) -> bool {
        self.current_kind() == TokenKind::Eof
    }

    fn advance(&mut self) -> &Token {
        let index = self.pos.min(self.tokens.len() - 1);
        if !self.at_end() {
            self.pos += 1;
        }
        &self.tokens[index]
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.current_kind() == kind
    }

    fn match_token(&mut self, kind: TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Consume a token of `kind` and return its position.
    fn expect(&mut self, kind: TokenKind) -> Result<Pos, AstError> {
        if self.check(kind) {
            Ok(self.advance().pos())
        } else {
            Err(AstError::expected(kind.display_name(), self.current_kind(), self.current_pos()))
        }
    }

    fn expect_name(&mut self) -> Result<(String, Pos), AstError> {
        if self.check(TokenKind::Ident) {
            let token = self.advance();
            Ok((token.text.clone(), token.pos()))
        } else {
            Err(AstError::expected("a name", self.current_kind(), self.current_pos()))
        }
    }

    fn expect_type(&mut self) -> Result<ValType, AstError> {
        let ty = match self.current_kind() {
            TokenKind::IntType => ValType::Int,
            TokenKind::FloatType => ValType::Float,
            TokenKind::BoolType => ValType::Bool,
            other => return Err(AstError::expected("a type", other, self.current_pos())),
        };
        self.advance();
        Ok(ty)
    }

    // =========================================================================
    // Symbol Binding
    // =========================================================================

    fn declare(&mut self, category: Category, name: &str, ty: ValType, pos: Option<Pos>) -> Result<u32, AstError> {
        let at_module = self.symbols.current_scope() == 0;
        let ref_id = self
            .symbols
            .declare(category, name, ty)
            .map_err(|_| AstError::duplicate(name, pos))?
            .ref_id;
        if at_module {
            self.env.globals.push(match category {
                Category::Const => GlobalIdentifier::Const(ConstId(ref_id)),
                Category::Var => GlobalIdentifier::Var(VarId(ref_id)),
                Category::Fun => GlobalIdentifier::Fun(FunId(ref_id)),
            });
        }
        Ok(ref_id)
    }

    fn declare_const(&mut self, name: String, ty: ValType, value: Value, pos: Option<Pos>) -> Result<ConstId, AstError> {
        let id = ConstId(self.declare(Category::Const, &name, ty, pos)?);
        self.env.constants.push(Constant { name, ty, value });
        Ok(id)
    }

    fn declare_var(&mut self, name: String, ty: ValType, default: Option<Value>, pos: Option<Pos>) -> Result<VarId, AstError> {
        let id = VarId(self.declare(Category::Var, &name, ty, pos)?);
        let (owner, slot) = match self.owners.last() {
            Some(&fun) => {
                let function = self.env.function_mut(fun);
                function.local_count += 1;
                (Owner::Function(fun), function.local_count - 1)
            }
            None => {
                self.env.global_count += 1;
                (Owner::Global, self.env.global_count - 1)
            }
        };
        self.env.variables.push(Variable { name, ty, owner, slot, default });
        Ok(id)
    }

    fn declare_fun(&mut self, name: String, ret: ValType, body: FunctionBody, pos: Option<Pos>) -> Result<FunId, AstError> {
        let id = FunId(self.declare(Category::Fun, &name, ret, pos)?);
        self.env.functions.push(Function { name, params: Vec::new(), ret, body, local_count: 0 });
        Ok(id)
    }

    fn declare_params(&mut self, params: Vec<(String, ValType, Option<Pos>)>) -> Result<Vec<Param>, AstError> {
        let mut bound = Vec::with_capacity(params.len());
        for (name, ty, pos) in params {
            let var = self.declare_var(name, ty, None, pos)?;
            bound.push(Param { var, ty });
        }
        Ok(bound)
    }

    fn lookup(&self, name: &str, pos: Pos) -> Result<Identifier, AstError> {
        self.symbols.resolve(name).cloned().ok_or_else(|| AstError::undefined(name, pos))
    }

    fn lookup_var(&self, name: &str, pos: Pos) -> Result<VarId, AstError> {
        let ident = self.lookup(name, pos)?;
        match ident.category {
            Category::Var => Ok(VarId(ident.ref_id)),
            _ => Err(AstError::new(AstErrorKind::NotAssignable { name: name.to_string() }, pos)),
        }
    }

    // =========================================================================
    // Declarations
    // =========================================================================

    fn parse_const_decl(&mut self) -> Result<Node, AstError> {
        let pos = self.expect(TokenKind::Const)?;
        let (name, name_pos) = self.expect_name()?;
        self.expect(TokenKind::Colon)?;
        let ty = self.expect_type()?;
        self.expect(TokenKind::Eq)?;
        let value = self.parse_const_initializer(&name, ty)?;
        let id = self.declare_const(name, ty, value, Some(name_pos))?;
        Ok(Node::new(NodeKind::ConstDecl(id), pos))
    }

    /// A literal, or a constant of the same type. Nothing else.
    fn parse_const_initializer(&mut self, name: &str, ty: ValType) -> Result<Value, AstError> {
        let token = self.current().clone();
        let invalid = || AstError::new(AstErrorKind::InvalidConstantExpression { name: name.to_string(), ty }, token.pos());

        let value = match token.kind {
            TokenKind::IntLit | TokenKind::FloatLit | TokenKind::BoolLit => literal_value(&token)?,
            TokenKind::Ident => match self.symbols.resolve(&token.text) {
                Some(ident) if ident.category == Category::Const && ident.declared_type == ty => {
                    self.env.constants[ident.ref_id as usize].value
                }
                _ => return Err(invalid()),
            },
            _ => return Err(invalid()),
        };
        self.advance();

        if continues_expression(self.current_kind()) {
            return Err(invalid());
        }
        if value.ty() != ty {
            return Err(AstError::new(
                AstErrorKind::TypeMismatch { name: name.to_string(), expected: ty, found: value.ty() },
                token.pos(),
            ));
        }
        Ok(value)
    }

    fn parse_var_decl(&mut self) -> Result<Node, AstError> {
        let pos = self.expect(TokenKind::Var)?;
        let (name, name_pos) = self.expect_name()?;
        self.expect(TokenKind::Colon)?;
        let ty = self.expect_type()?;
        // The initializer sees the enclosing declaration of the same name, if any.
        let init = if self.match_token(TokenKind::Eq) { Some(self.parse_expr()?) } else { None };
        let var = self.declare_var(name, ty, None, Some(name_pos))?;
        Ok(Node::new(NodeKind::VarDecl { var, init }, pos))
    }

    fn parse_fun_decl(&mut self) -> Result<Node, AstError> {
        let pos = self.expect(TokenKind::Fun)?;
        let (name, name_pos) = self.expect_name()?;
        let params = self.parse_param_list()?;
        let ret = if self.match_token(TokenKind::Colon) { self.expect_type()? } else { ValType::None };

        // Declared before the body so the function can call itself.
        let placeholder = Block { scope_index: 0, nodes: Vec::new(), pos };
        let id = self.declare_fun(name, ret, FunctionBody::Block(placeholder), Some(name_pos))?;

        // Parameters and body share one scope reserved before the body is parsed.
        let scope = self.symbols.reserve_scope();
        self.symbols.enter(scope);
        self.owners.push(id);
        let body = self.parse_function_body(id, params, scope);
        self.owners.pop();
        self.symbols.exit();

        self.env.function_mut(id).body = FunctionBody::Block(body?);
        Ok(Node::new(NodeKind::FunDecl(id), pos))
    }

    fn parse_function_body(
        &mut self,
        id: FunId,
        params: Vec<(String, ValType, Option<Pos>)>,
        scope: u32,
    ) -> Result<Block, AstError> {
        let bound = self.declare_params(params)?;
        self.env.function_mut(id).params = bound;
        let pos = self.expect(TokenKind::LBrace)?;
        let nodes = self.parse_block_nodes()?;
        Ok(Block { scope_index: scope, nodes, pos })
    }

    fn parse_param_list(&mut self) -> Result<Vec<(String, ValType, Option<Pos>)>, AstError> {
        self.expect(TokenKind::LParen)?;
        let mut params = Vec::new();
        if self.match_token(TokenKind::RParen) {
            return Ok(params);
        }
        loop {
            let (name, pos) = self.expect_name().map_err(malformed_params)?;
            self.expect(TokenKind::Colon).map_err(malformed_params)?;
            let ty = self.expect_type().map_err(malformed_params)?;
            params.push((name, ty, Some(pos)));
            if self.match_token(TokenKind::Comma) {
                continue;
            }
            self.expect(TokenKind::RParen).map_err(malformed_params)?;
            return Ok(params);
        }
    }

    // =========================================================================
    // Statements
    // =========================================================================

    fn parse_node(&mut self) -> Result<Node, AstError> {
        let pos = self.current_pos();
        match self.current_kind() {
            TokenKind::Const => self.parse_const_decl(),
            TokenKind::Var => self.parse_var_decl(),
            TokenKind::Fun => self.parse_fun_decl(),
            TokenKind::LBrace => Ok(Node::new(NodeKind::Block(self.parse_block()?), pos)),
            TokenKind::If => {
                self.advance();
                let cond = self.parse_expr()?;
                let body = self.parse_block()?;
                Ok(Node::new(NodeKind::If { cond, body }, pos))
            }
            TokenKind::While => {
                self.advance();
                let cond = self.parse_expr()?;
                let body = self.parse_block()?;
                Ok(Node::new(NodeKind::While { cond, body }, pos))
            }
            TokenKind::Return => {
                self.advance();
                Ok(Node::new(NodeKind::Return(self.parse_expr()?), pos))
            }
            TokenKind::Async => self.parse_async(),
            TokenKind::Await => {
                self.advance();
                let (name, name_pos) = self.expect_name()?;
                Ok(Node::new(NodeKind::Await(self.lookup_var(&name, name_pos)?), pos))
            }
            TokenKind::Ident => self.parse_ident_stmt(),
            other => Err(AstError::expected("a statement", other, pos)),
        }
    }

    /// `{ ... }` with a fresh scope.
    fn parse_block(&mut self) -> Result<Block, AstError> {
        let pos = self.expect(TokenKind::LBrace)?;
        let scope_index = self.symbols.enter_block();
        let nodes = self.parse_block_nodes();
        self.symbols.exit();
        Ok(Block { scope_index, nodes: nodes?, pos })
    }

    /// Nodes up to and including the closing `}`.
    fn parse_block_nodes(&mut self) -> Result<Vec<Node>, AstError> {
        let mut nodes = Vec::new();
        while !self.check(TokenKind::RBrace) {
            if self.at_end() {
                return Err(AstError::expected("'}'", TokenKind::Eof, self.current_pos()));
            }
            nodes.push(self.parse_node()?);
        }
        self.advance();
        Ok(nodes)
    }

    /// `name := expr` or `name(args)`.
    fn parse_ident_stmt(&mut self) -> Result<Node, AstError> {
        let (name, pos) = self.expect_name()?;
        let ident = self.lookup(&name, pos)?;
        match ident.category {
            Category::Var => {
                if self.check(TokenKind::LParen) {
                    return Err(AstError::new(AstErrorKind::NotCallable { name }, pos));
                }
                self.expect(TokenKind::Assign)?;
                let expr = self.parse_expr()?;
                Ok(Node::new(NodeKind::Assign { var: VarId(ident.ref_id), expr }, pos))
            }
            Category::Fun => Ok(Node::new(NodeKind::CallStmt(self.parse_call(&ident, pos)?), pos)),
            Category::Const => Err(AstError::new(AstErrorKind::NotAssignable { name }, pos)),
        }
    }

    /// `async name: type = call(...)` declares the target, `async name := call(...)` reuses one.
    fn parse_async(&mut self) -> Result<Node, AstError> {
        let pos = self.expect(TokenKind::Async)?;
        let (name, name_pos) = self.expect_name()?;

        let (target, call) = if self.match_token(TokenKind::Colon) {
            let ty = self.expect_type()?;
            self.expect(TokenKind::Eq)?;
            let call = self.parse_async_call(&name, ty)?;
            (self.declare_var(name, ty, None, Some(name_pos))?, call)
        } else {
            self.expect(TokenKind::Assign)?;
            let target = self.lookup_var(&name, name_pos)?;
            let ty = self.env.variable(target).ty;
            (target, self.parse_async_call(&name, ty)?)
        };
        Ok(Node::new(NodeKind::Async { target, call }, pos))
    }

    fn parse_async_call(&mut self, target: &str, target_ty: ValType) -> Result<Call, AstError> {
        let (callee, pos) = self.expect_name()?;
        let ident = self.lookup(&callee, pos)?;
        if ident.category != Category::Fun {
            return Err(AstError::new(AstErrorKind::NotCallable { name: callee }, pos));
        }
        let call = self.parse_call(&ident, pos)?;
        let ret = self.env.function(call.fun).ret;
        if ret == ValType::None || ret != target_ty {
            return Err(AstError::new(
                AstErrorKind::AsyncTargetMismatch { target: target.to_string(), target_ty, callee, ret },
                pos,
            ));
        }
        Ok(call)
    }

    /// Argument list of a call to the function `ident`.
    fn parse_call(&mut self, ident: &Identifier, pos: Pos) -> Result<Call, AstError> {
        let fun = FunId(ident.ref_id);
        let function = self.env.function(fun);
        if function.ret != ident.declared_type {
            return Err(AstError::new(AstErrorKind::InconsistentFunctionTable { name: ident.name.clone() }, pos));
        }
        let expected = function.params.len();

        self.expect(TokenKind::LParen)?;
        let mut args = Vec::new();
        if !self.match_token(TokenKind::RParen) {
            loop {
                args.push(self.parse_expr()?);
                if !self.match_token(TokenKind::Comma) {
                    self.expect(TokenKind::RParen)?;
                    break;
                }
            }
        }

        if args.len() != expected {
            return Err(AstError::new(
                AstErrorKind::ArityMismatch { name: ident.name.clone(), expected, found: args.len() },
                pos,
            ));
        }
        Ok(Call { fun, args })
    }

    // =========================================================================
    // Expressions
    // =========================================================================

    /// Relational level: a single, non-associative comparison.
    pub(crate) fn parse_expr(&mut self) -> Result<Expr, AstError> {
        let left = self.parse_additive()?;
        let Some(op) = relational_op(self.current_kind()) else {
            return Ok(left);
        };
        let pos = self.advance().pos();
        let right = self.parse_additive()?;
        if relational_op(self.current_kind()).is_some() {
            return Err(AstError::new(AstErrorKind::ChainedComparison, self.current_pos()));
        }
        Ok(binary(op, left, right, pos))
    }

    fn parse_additive(&mut self) -> Result<Expr, AstError> {
        let mut left = self.parse_multiplicative()?;
        loop {
            let op = match self.current_kind() {
                TokenKind::Plus => BinOp::Add,
                TokenKind::Minus => BinOp::Sub,
                TokenKind::Or => BinOp::Or,
                TokenKind::Xor => BinOp::Xor,
                _ => return Ok(left),
            };
            let pos = self.advance().pos();
            let right = self.parse_multiplicative()?;
            left = binary(op, left, right, pos);
        }
    }

    fn parse_multiplicative(&mut self) -> Result<Expr, AstError> {
        let mut left = self.parse_power()?;
        loop {
            let op = match self.current_kind() {
                TokenKind::Star => BinOp::Mul,
                TokenKind::Slash => BinOp::Div,
                TokenKind::And => BinOp::And,
                _ => return Ok(left),
            };
            let pos = self.advance().pos();
            let right = self.parse_power()?;
            left = binary(op, left, right, pos);
        }
    }

    /// `unary [^ power]`, right-associative.
    fn parse_power(&mut self) -> Result<Expr, AstError> {
        let base = self.parse_unary()?;
        if !self.check(TokenKind::Caret) {
            return Ok(base);
        }
        let pos = self.advance().pos();
        let exponent = self.parse_power()?;
        Ok(binary(BinOp::Pow, base, exponent, pos))
    }

    fn parse_unary(&mut self) -> Result<Expr, AstError> {
        let op = match self.current_kind() {
            TokenKind::Plus => UnOp::Plus,
            TokenKind::Minus => UnOp::Neg,
            TokenKind::Not => UnOp::Not,
            _ => return self.parse_base(),
        };
        let pos = self.advance().pos();
        let operand = self.parse_unary()?;
        Ok(Expr::new(ExprKind::UnOp { op, operand: Box::new(operand) }, pos))
    }

    fn parse_base(&mut self) -> Result<Expr, AstError> {
        let token = self.current().clone();
        let pos = token.pos();
        match token.kind {
            TokenKind::IntLit | TokenKind::FloatLit | TokenKind::BoolLit => {
                self.advance();
                Ok(Expr::literal(literal_value(&token)?, pos))
            }
            TokenKind::Ident => {
                self.advance();
                let ident = self.lookup(&token.text, pos)?;
                let kind = match ident.category {
                    Category::Const => ExprKind::ConstRef(ConstId(ident.ref_id)),
                    Category::Var => ExprKind::VarRef(VarId(ident.ref_id)),
                    Category::Fun => ExprKind::Call(self.parse_call(&ident, pos)?),
                };
                Ok(Expr::new(kind, pos))
            }
            TokenKind::LParen => {
                self.advance();
                let mut inner = self.parse_expr()?;
                self.expect(TokenKind::RParen)?;
                inner.pos = pos;
                Ok(inner)
            }
            other => Err(AstError::expected("an expression", other, pos)),
        }
    }
}

// =============================================================================
// Helpers
// =============================================================================

fn binary(op: BinOp, left: Expr, right: Expr, pos: Pos) -> Expr {
    Expr::new(ExprKind::BinOp { op, left: Box::new(left), right: Box::new(right) }, pos)
}

fn relational_op(kind: TokenKind) -> Option<BinOp> {
    Some(match kind {
        TokenKind::Eq => BinOp::Eq,
        TokenKind::NotEq => BinOp::NotEq,
        TokenKind::Lt => BinOp::Lt,
        TokenKind::Gt => BinOp::Gt,
        TokenKind::LtEq => BinOp::LtEq,
        TokenKind::GtEq => BinOp::GtEq,
        _ => return None,
    })
}

/// Tokens that would extend an expression past its first operand.
fn continues_expression(kind: TokenKind) -> bool {
    relational_op(kind).is_some()
        || matches!(
            kind,
            TokenKind::Plus
                | TokenKind::Minus
                | TokenKind::Star
                | TokenKind::Slash
                | TokenKind::Caret
                | TokenKind::And
                | TokenKind::Or
                | TokenKind::Xor
                | TokenKind::LParen
        )
}

fn literal_value(token: &Token) -> Result<Value, AstError> {
    let invalid = || AstError::new(AstErrorKind::InvalidLiteral { text: token.text.clone() }, token.pos());
    match token.kind {
        TokenKind::IntLit => token.text.parse().map(Value::Int).map_err(|_| invalid()),
        TokenKind::FloatLit => token.text.parse().map(Value::Float).map_err(|_| invalid()),
        TokenKind::BoolLit => Ok(Value::Bool(token.text == "true")),
        _ => Err(invalid()),
    }
}

fn malformed_params(err: AstError) -> AstError {
    AstError { kind: AstErrorKind::InvalidParameterList { reason: err.kind.to_string() }, pos: err.pos }
}
