//! The RoyC abstract syntax tree.
//!
//! Every node lives in an [Arena](crate::arena::Arena); interior nodes refer to their
//! children by [ExprId]/[StmtId] handles rather than owning pointers, so the tree here
//! is really a graph of small `Copy` handles with the actual payloads stored
//! elsewhere. See `crate::arena` for why.
use crate::arena::{ExprId, StmtId};
use crate::scanner::Token;

/// A `{ ... }` block: an ordered sequence of statement handles. Scope *entry* and
/// *exit* bookkeeping (the variable/scope tables of spec §3.3) lives in the generator,
/// not here — the AST only records which statements are inside the braces.
pub type Scope = Vec<StmtId>;

/// A binary arithmetic operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
}

/// A leaf of an expression tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Term<'a> {
    /// An integer literal. The token carries the decimal-digit text.
    IntLit(Token<'a>),
    /// A reference to a previously-declared variable. The token carries the name.
    Ident(Token<'a>),
    /// A parenthesized sub-expression.
    Paren(ExprId),
}

/// An expression: either a single [Term], or a binary operation over two
/// sub-expressions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr<'a> {
    Term(Term<'a>),
    Bin(BinOp, ExprId, ExprId),
}

/// The optional continuation of an `if`: zero or more `elif`s, optionally terminated by
/// an `else`. Chains right-recursively, same as the grammar in spec §4.2.3.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IfTail {
    Elif {
        cond: ExprId,
        body: Scope,
        tail: Option<Box<IfTail>>,
    },
    Else(Scope),
}

/// A single RoyC statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Stmt<'a> {
    Exit(ExprId),
    Let(Token<'a>, ExprId),
    Assign(Token<'a>, ExprId),
    Scope(Scope),
    If {
        cond: ExprId,
        body: Scope,
        tail: Option<IfTail>,
    },
}

/// A whole RoyC program: its top-level statements, in source order.
pub type Program = Vec<StmtId>;
