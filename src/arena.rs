//! A bump-allocator for AST nodes.
//!
//! The reference compiler allocates every AST node from a single fixed-size
//! `ArenaAllocator` (`original_source/arena.hpp`): one contiguous buffer, advanced by an
//! offset, never individually freed. Its `alloc<T>()` has a latent bug — the offset is
//! advanced by `sizeof(T)` *through* a `T*`, which multiplies the step by `sizeof(T)` a
//! second time and walks off the buffer almost immediately. [Arena] keeps the same
//! contract (grow-only, bulk release, no individual free) without the unsoundness: it's
//! two flat `Vec`s, one per node kind, and a node's "address" is just its index. A
//! `Vec` that only ever grows by pushing already *is* a bump allocator — the allocation
//! never fails, which is the "grow instead of raising OutOfArena" option the spec
//! explicitly allows.
use crate::ast::{Expr, Stmt};

/// Initial reservation for each node pool, chosen so that a program hitting it would
/// already be pathologically large; same spirit as the reference's 4 MiB buffer, but
/// expressed as "how many nodes", not "how many bytes", since Rust's `Vec` does not
/// need a byte-addressed arena to get the same bulk-allocate/bulk-free behavior.
const INITIAL_CAPACITY: usize = 1024;

/// A non-owning handle to a [Stmt] allocated in an [Arena]. Valid for the arena's
/// lifetime; never dereferenced without one in hand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StmtId(u32);

/// A non-owning handle to an [Expr] allocated in an [Arena].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ExprId(u32);

/// Owns every [Stmt] and [Expr] node produced while parsing one program. Dropping the
/// arena releases all of them at once; there is no way to free a single node early.
///
/// The lifetime `'a` is the lifetime of the source text the tokens inside `Let`,
/// `Assign`, `IntLit`, and `Ident` nodes borrow from.
#[derive(Debug, Default)]
pub struct Arena<'a> {
    stmts: Vec<Stmt<'a>>,
    exprs: Vec<Expr<'a>>,
}

impl<'a> Arena<'a> {
    /// Create an empty arena with room for [INITIAL_CAPACITY] nodes of each kind before
    /// its pools need to grow.
    pub fn new() -> Self {
        Arena {
            stmts: Vec::with_capacity(INITIAL_CAPACITY),
            exprs: Vec::with_capacity(INITIAL_CAPACITY),
        }
    }

    /// Allocate a [Stmt], returning a handle that outlives this call.
    pub fn alloc_stmt(&mut self, stmt: Stmt<'a>) -> StmtId {
        let id = StmtId(self.stmts.len() as u32);
        self.stmts.push(stmt);
        id
    }

    /// Allocate an [Expr], returning a handle that outlives this call.
    pub fn alloc_expr(&mut self, expr: Expr<'a>) -> ExprId {
        let id = ExprId(self.exprs.len() as u32);
        self.exprs.push(expr);
        id
    }

    /// Dereference a [StmtId] allocated by this arena.
    pub fn stmt(&self, id: StmtId) -> &Stmt<'a> {
        &self.stmts[id.0 as usize]
    }

    /// Dereference an [ExprId] allocated by this arena.
    pub fn expr(&self, id: ExprId) -> &Expr<'a> {
        &self.exprs[id.0 as usize]
    }
}
