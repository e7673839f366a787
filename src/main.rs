//! The `royc` driver: reads a source file, runs it through the compiler, assembles
//! and links the result.
//!
//! This binary is the "external driver" the core library declines to be: it owns the
//! filesystem and the external assembler/linker toolchain. The library crate never
//! touches either.
use std::path::PathBuf;
use std::process::Command;

use clap::Parser;
use royc::error::DriverError;

/// Compile a RoyC source file to a native executable.
#[derive(Parser, Debug)]
#[command(name = "royc", author, version, about)]
struct Cli {
    /// Path to the RoyC source file to compile.
    input: PathBuf,

    /// Stop after writing the `.asm` file; do not invoke the assembler or linker.
    #[arg(long)]
    emit_asm_only: bool,

    /// Increase logging verbosity. May be repeated (`-v`, `-vv`).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() {
    let cli = Cli::parse();
    init_logger(cli.verbose);

    if let Err(err) = run(&cli) {
        tracing::error!(%err, "compilation failed");
        eprintln!("royc: {err}");
        std::process::exit(1);
    }
}

fn init_logger(verbose: u8) {
    let default_level = match verbose {
        0 => "royc=info",
        1 => "royc=debug",
        _ => "royc=trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .without_time()
        .init();
}

fn run(cli: &Cli) -> Result<(), DriverError> {
    let source = std::fs::read_to_string(&cli.input).map_err(|source| DriverError::Io {
        path: cli.input.clone(),
        source,
    })?;
    tracing::info!(path = %cli.input.display(), "read source");

    let asm = royc::compile(&source)?;
    tracing::info!(bytes = asm.len(), "generated assembly");

    let asm_path = cli.input.with_extension("asm");
    std::fs::write(&asm_path, &asm).map_err(|source| DriverError::Io {
        path: asm_path.clone(),
        source,
    })?;
    tracing::info!(path = %asm_path.display(), "wrote assembly");

    if cli.emit_asm_only {
        return Ok(());
    }

    let obj_path = cli.input.with_extension("o");
    let exe_path = cli.input.with_extension("");
    assemble_and_link(&asm_path, &obj_path, &exe_path)
}

/// Invoke `nasm` then `ld` against a Linux ELF64 target.
///
/// The reference driver assembles with `-fwin64`, a Windows object format, while the
/// generator emits a Linux `syscall`-based exit sequence — the two disagree about the
/// target platform. This targets `elf64` throughout instead.
fn assemble_and_link(asm_path: &std::path::Path, obj_path: &std::path::Path, exe_path: &std::path::Path) -> Result<(), DriverError> {
    run_tool(
        "nasm",
        Command::new("nasm").arg("-f").arg("elf64").arg("-o").arg(obj_path).arg(asm_path),
    )?;
    tracing::info!(path = %obj_path.display(), "assembled object file");

    run_tool(
        "ld",
        Command::new("ld").arg("-o").arg(exe_path).arg(obj_path),
    )?;
    tracing::info!(path = %exe_path.display(), "linked executable");

    Ok(())
}

fn run_tool(tool: &'static str, mut command: Command) -> Result<(), DriverError> {
    let status = command
        .status()
        .map_err(|source| DriverError::Io { path: PathBuf::from(tool), source })?;
    if !status.success() {
        return Err(DriverError::Toolchain { tool, status });
    }
    Ok(())
}
