//! Recursive-descent parsing, with Pratt-style precedence climbing for expressions.
use crate::arena::{Arena, ExprId, StmtId};
use crate::ast::{BinOp, Expr, IfTail, Program, Scope, Stmt, Term};
use crate::error::CompileError;
use crate::scanner::{Token, TokenKind};

/// Parse a whole token stream into a [Program] plus the [Arena] that owns its nodes.
pub fn parse(tokens: Vec<Token<'_>>) -> Result<(Program, Arena<'_>), CompileError> {
    Parser::new(tokens).parse_program()
}

/// Parser state: the token stream, a read cursor, and the arena everything gets
/// allocated into.
struct Parser<'a> {
    tokens: Vec<Token<'a>>,
    pos: usize,
    arena: Arena<'a>,
}

/// Binary operator precedence, per spec §4.2.2: `+`/`-` bind loosest, `*`/`/` tightest.
/// Both rows are left-associative, which `parse_expr` encodes by recursing with
/// `min_prec + 1` on the right-hand side.
fn bin_op(kind: TokenKind) -> Option<(u8, BinOp)> {
    match kind {
        TokenKind::Plus => Some((0, BinOp::Add)),
        TokenKind::Minus => Some((0, BinOp::Sub)),
        TokenKind::Star => Some((1, BinOp::Mul)),
        TokenKind::FSlash => Some((1, BinOp::Div)),
        _ => None,
    }
}

impl<'a> Parser<'a> {
    fn new(tokens: Vec<Token<'a>>) -> Self {
        Parser { tokens, pos: 0, arena: Arena::new() }
    }

    fn parse_program(mut self) -> Result<(Program, Arena<'a>), CompileError> {
        let mut stmts = Vec::new();
        while !self.is_at_end() {
            stmts.push(self.parse_stmt()?);
        }
        Ok((stmts, self.arena))
    }

    ////////////////////////////////////////// Statements //////////////////////////////////////////

    fn parse_stmt(&mut self) -> Result<StmtId, CompileError> {
        if self.check(TokenKind::Exit) && self.check_at(1, TokenKind::OpenParen) {
            return self.parse_exit_stmt();
        }
        if self.check(TokenKind::Let) {
            return self.parse_let_stmt();
        }
        if self.check(TokenKind::Ident) && self.check_at(1, TokenKind::Eq) {
            return self.parse_assign_stmt();
        }
        if self.check(TokenKind::OpenCurly) {
            let scope = self.parse_scope()?;
            return Ok(self.arena.alloc_stmt(Stmt::Scope(scope)));
        }
        if self.check(TokenKind::If) {
            return self.parse_if_stmt();
        }

        Err(self.error_expected("a statement"))
    }

    fn parse_exit_stmt(&mut self) -> Result<StmtId, CompileError> {
        self.advance(); // `exit`
        self.advance(); // `(`
        let expr = self.parse_expr(0)?;
        self.expect(TokenKind::CloseParen, "`)`")?;
        self.expect(TokenKind::Semi, "`;`")?;
        Ok(self.arena.alloc_stmt(Stmt::Exit(expr)))
    }

    fn parse_let_stmt(&mut self) -> Result<StmtId, CompileError> {
        self.advance(); // `let`
        let name = self.expect(TokenKind::Ident, "an identifier after `let`")?;
        self.expect(TokenKind::Eq, "`=`")?;
        let expr = self.parse_expr(0)?;
        self.expect(TokenKind::Semi, "`;`")?;
        Ok(self.arena.alloc_stmt(Stmt::Let(name, expr)))
    }

    fn parse_assign_stmt(&mut self) -> Result<StmtId, CompileError> {
        let name = self.advance();
        self.advance(); // `=`
        let expr = self.parse_expr(0)?;
        self.expect(TokenKind::Semi, "`;`")?;
        Ok(self.arena.alloc_stmt(Stmt::Assign(name, expr)))
    }

    fn parse_if_stmt(&mut self) -> Result<StmtId, CompileError> {
        self.advance(); // `if`
        self.expect(TokenKind::OpenParen, "`(`")?;
        let cond = self.parse_expr(0)?;
        self.expect(TokenKind::CloseParen, "`)`")?;
        let body = self.parse_scope()?;
        let tail = self.parse_if_tail()?;
        Ok(self.arena.alloc_stmt(Stmt::If { cond, body, tail }))
    }

    fn parse_if_tail(&mut self) -> Result<Option<IfTail>, CompileError> {
        if self.check(TokenKind::Elif) {
            self.advance();
            self.expect(TokenKind::OpenParen, "`(`")?;
            let cond = self.parse_expr(0)?;
            self.expect(TokenKind::CloseParen, "`)`")?;
            let body = self.parse_scope()?;
            let tail = self.parse_if_tail()?.map(Box::new);
            return Ok(Some(IfTail::Elif { cond, body, tail }));
        }
        if self.check(TokenKind::Else) {
            self.advance();
            let body = self.parse_scope()?;
            return Ok(Some(IfTail::Else(body)));
        }
        Ok(None)
    }

    /// Parse a `{ ... }` block. Assumes the opening brace has not yet been consumed.
    fn parse_scope(&mut self) -> Result<Scope, CompileError> {
        self.expect(TokenKind::OpenCurly, "`{`")?;
        let mut stmts = Vec::new();
        while !self.check(TokenKind::CloseCurly) && !self.is_at_end() {
            stmts.push(self.parse_stmt()?);
        }
        self.expect(TokenKind::CloseCurly, "`}`")?;
        Ok(stmts)
    }

    ////////////////////////////////////////// Expressions //////////////////////////////////////////

    /// Pratt-style precedence climbing: parse a term, then keep folding in binary
    /// operators whose precedence is at least `min_prec`, recursing with `prec + 1` on
    /// the right to get left-associativity.
    ///
    /// Note: the reference parser's version of this loop calls its token-consuming
    /// helper twice per operator (`Token op = consume(); const auto [type, line, value]
    /// = consume();` in `original_source/parser.hpp`), silently eating the token after
    /// the operator on every binary expression. That is not replicated here — the
    /// operator is consumed exactly once.
    fn parse_expr(&mut self, min_prec: u8) -> Result<ExprId, CompileError> {
        let mut lhs = self.parse_term()?;

        loop {
            let Some((prec, op)) = self.peek().and_then(|t| bin_op(t.kind())) else {
                break;
            };
            if prec < min_prec {
                break;
            }

            self.advance(); // the operator, exactly once
            let rhs = self.parse_expr(prec + 1)?;
            lhs = self.arena.alloc_expr(Expr::Bin(op, lhs, rhs));
        }

        Ok(lhs)
    }

    fn parse_term(&mut self) -> Result<ExprId, CompileError> {
        if self.check(TokenKind::IntLit) {
            let token = self.advance();
            return Ok(self.arena.alloc_expr(Expr::Term(Term::IntLit(token))));
        }
        if self.check(TokenKind::Ident) {
            let token = self.advance();
            return Ok(self.arena.alloc_expr(Expr::Term(Term::Ident(token))));
        }
        if self.check(TokenKind::OpenParen) {
            self.advance();
            let inner = self.parse_expr(0)?;
            self.expect(TokenKind::CloseParen, "`)` to close this group")?;
            return Ok(self.arena.alloc_expr(Expr::Term(Term::Paren(inner))));
        }

        Err(self.error_expected("an expression"))
    }

    ///////////////////////////////////////////// Cursor /////////////////////////////////////////////

    fn is_at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    fn peek(&self) -> Option<Token<'a>> {
        self.tokens.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<Token<'a>> {
        self.tokens.get(self.pos + offset).copied()
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.peek().is_some_and(|t| t.kind() == kind)
    }

    fn check_at(&self, offset: usize, kind: TokenKind) -> bool {
        self.peek_at(offset).is_some_and(|t| t.kind() == kind)
    }

    fn advance(&mut self) -> Token<'a> {
        let token = self.tokens[self.pos];
        self.pos += 1;
        token
    }

    fn expect(&mut self, kind: TokenKind, expected: &str) -> Result<Token<'a>, CompileError> {
        if self.check(kind) {
            return Ok(self.advance());
        }
        Err(self.error_expected(expected))
    }

    /// The source line to blame for a parse error: the line of the last consumed
    /// token, per spec §4.2 — or line 1 if nothing has been consumed yet.
    fn last_consumed_line(&self) -> usize {
        if self.pos == 0 {
            self.tokens.first().map(|t| t.line()).unwrap_or(1)
        } else {
            self.tokens[self.pos - 1].line()
        }
    }

    fn error_expected(&self, expected: &str) -> CompileError {
        CompileError::Parse {
            line: self.last_consumed_line(),
            expected: expected.to_string(),
        }
    }
}

////////////////////////////////////////////// Tests //////////////////////////////////////////////

#[cfg(test)]
mod test {
    use super::*;
    use crate::scanner::tokenize;

    fn parse_source(source: &str) -> (Program, Arena<'_>) {
        let tokens = tokenize(source).expect("valid tokens");
        parse(tokens).expect("valid parse")
    }

    #[test]
    fn parses_exit_of_int_lit() {
        let (program, arena) = parse_source("exit(0);");
        assert_eq!(1, program.len());
        match arena.stmt(program[0]) {
            Stmt::Exit(expr) => match arena.expr(*expr) {
                Expr::Term(Term::IntLit(tok)) => assert_eq!(Some("0"), tok.value()),
                other => panic!("expected IntLit, got {other:?}"),
            },
            other => panic!("expected Exit, got {other:?}"),
        }
    }

    #[test]
    fn precedence_groups_multiplication_tighter_than_addition() {
        // 2 + 3 * 4  =>  Add(2, Mul(3, 4))
        let (program, arena) = parse_source("exit(2 + 3 * 4);");
        let Stmt::Exit(expr) = arena.stmt(program[0]) else { panic!("expected Exit") };

        match arena.expr(*expr) {
            Expr::Bin(BinOp::Add, lhs, rhs) => {
                assert!(matches!(arena.expr(*lhs), Expr::Term(Term::IntLit(_))));
                assert!(matches!(arena.expr(*rhs), Expr::Bin(BinOp::Mul, _, _)));
            }
            other => panic!("expected top-level Add, got {other:?}"),
        }
    }

    #[test]
    fn parenthesization_only_wraps_does_not_change_shape() {
        let (program_a, arena_a) = parse_source("exit((2 + 3) * 4);");
        let Stmt::Exit(expr_a) = arena_a.stmt(program_a[0]) else { panic!() };
        match arena_a.expr(*expr_a) {
            Expr::Bin(BinOp::Mul, lhs, _rhs) => {
                assert!(matches!(arena_a.expr(*lhs), Expr::Term(Term::Paren(_))));
            }
            other => panic!("expected top-level Mul, got {other:?}"),
        }
    }

    #[test]
    fn left_associativity_of_same_precedence_operators() {
        // 10 - 5 - 2  =>  Sub(Sub(10, 5), 2)
        let (program, arena) = parse_source("exit(10 - 5 - 2);");
        let Stmt::Exit(expr) = arena.stmt(program[0]) else { panic!() };
        match arena.expr(*expr) {
            Expr::Bin(BinOp::Sub, lhs, rhs) => {
                assert!(matches!(arena.expr(*rhs), Expr::Term(Term::IntLit(_))));
                assert!(matches!(arena.expr(*lhs), Expr::Bin(BinOp::Sub, _, _)));
            }
            other => panic!("expected top-level Sub, got {other:?}"),
        }
    }

    #[test]
    fn missing_close_paren_is_a_parse_error() {
        let tokens = tokenize("exit(1").unwrap();
        let err = parse(tokens).unwrap_err();
        assert!(matches!(err, CompileError::Parse { .. }));
    }

    #[test]
    fn if_elif_else_chain_parses() {
        let (program, arena) = parse_source(
            "let a = 0; if (0) { a = 1; } elif (0) { a = 2; } else { a = 3; } exit(a);",
        );
        assert_eq!(3, program.len());
        match arena.stmt(program[1]) {
            Stmt::If { tail: Some(IfTail::Elif { tail, .. }), .. } => {
                assert!(matches!(tail.as_deref(), Some(IfTail::Else(_))));
            }
            other => panic!("expected If with an Elif tail, got {other:?}"),
        }
    }

    #[test]
    fn nested_scope_parses_as_its_own_node() {
        let (program, arena) = parse_source("let x = 1; { let x = 7; } exit(x);");
        match arena.stmt(program[1]) {
            Stmt::Scope(inner) => assert_eq!(1, inner.len()),
            other => panic!("expected Scope, got {other:?}"),
        }
    }
}
