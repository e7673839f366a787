//! RoyC: a tiny imperative-language compiler.
//!
//! Source text flows through three stages, each consuming the previous one's output
//! and none calling back into an earlier one:
//!
//! ```text
//! source text -> [scanner] -> tokens -> [parser] -> AST -> [generator] -> assembly text
//! ```
//!
//! Every AST node lives in a single [arena::Arena] whose lifetime spans parsing and
//! generation, then is released in bulk. See each module's docs for its stage.

pub mod arena;
pub mod ast;
pub mod error;
pub mod generator;
pub mod parser;
pub mod scanner;

/// The type returned by the compiler's three core stages. The error is always
/// [error::CompileError]; the driver binary wraps it in a richer
/// [error::DriverError] that also covers I/O and toolchain failures.
///
/// ```
/// fn compile() -> royc::Result<()> {
///     Ok(())
/// }
/// ```
pub type Result<T> = std::result::Result<T, error::CompileError>;

/// Re-exports the items most programs built on top of this crate will need.
pub mod prelude {
    pub use crate::arena::{Arena, ExprId, StmtId};
    pub use crate::error::{CompileError, DriverError};
    pub use crate::scanner::{Token, TokenKind};
}

/// Run the full pipeline — tokenize, parse, generate — over one source string.
pub fn compile(source: &str) -> Result<String> {
    let tokens = scanner::tokenize(source)?;
    let (program, arena) = parser::parse(tokens)?;
    generator::generate(&program, &arena)
}
