//! Error types for every stage of the pipeline, and for the driver that wraps them.
use thiserror::Error;

/// Any error raised while turning RoyC source text into assembly.
///
/// This is the type returned by [`crate::scanner`], [`crate::parser`], and
/// [`crate::generator`]. The driver (`main.rs`) wraps it in [`DriverError`] alongside
/// I/O and toolchain failures.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CompileError {
    /// Raised by the tokenizer when it encounters a character it cannot classify.
    #[error("[line {line}] lex error: unexpected character {character:?}")]
    Lex { line: usize, character: char },

    /// Raised by the parser when an expected construct is missing.
    #[error("[line {line}] parse error: expected {expected}")]
    Parse { line: usize, expected: String },

    /// Raised by the generator: an undeclared identifier, or a duplicate `let`
    /// within the same scope.
    #[error("[line {line}] codegen error: {message}")]
    Codegen { line: usize, message: String },
}

/// The top-level error returned by the driver in `main.rs`.
///
/// This is deliberately a separate type from [`CompileError`]: the core library never
/// touches the filesystem or spawns processes, so it has no use for an I/O or
/// toolchain variant. Keeping them apart also keeps `CompileError` usable from tests
/// that never go near a file.
#[derive(Debug, Error)]
pub enum DriverError {
    #[error(transparent)]
    Compile(#[from] CompileError),

    #[error("could not read {path}: {source}")]
    Io {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{tool} exited with {status}")]
    Toolchain {
        tool: &'static str,
        status: std::process::ExitStatus,
    },
}
