//! Binary entry point for the tugedit CLI.
//!
//! Every command reads one Python file and prints a JSON response on
//! stdout. Errors are JSON too, with a stable code and a matching exit
//! status.
//!
//! ## Usage
//!
//! ```bash
//! # Indentation for line 12
//! tugedit indent --file src/app.py --line 12
//!
//! # Enclosing definitions at line 40, column 9
//! tugedit defun-path --file src/app.py --at 40:9
//!
//! # Re-indent lines 10-30 in place
//! tugedit reindent --file src/app.py --start 10 --end 30 --write
//! ```

use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;

use tugedit::cli::{
    run_bounds, run_context, run_dedent_match, run_defun_path, run_electric, run_guess_indent,
    run_indent, run_levels, run_move, run_reindent, run_shift, BoundsKind, EditOptions, Motion,
};
use tugedit_core::error::{OutputErrorCode, TugEditError};
use tugedit_core::output::{emit_response, ErrorResponse};

// ============================================================================
// CLI Structure
// ============================================================================

/// Python indentation and navigation queries for editors.
///
/// All output is JSON.
#[derive(Parser, Debug)]
#[command(
    name = "tugedit",
    version,
    about = "Python indentation and navigation queries for editors"
)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,
    #[command(subcommand)]
    command: Command,
}

/// Global arguments shared by all subcommands.
#[derive(Parser, Debug)]
struct GlobalArgs {
    /// Configuration file (default: nearest .tugedit/config.toml).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Indent unit override, in columns.
    #[arg(long, global = true)]
    indent_unit: Option<usize>,

    /// Log level for tracing output.
    #[arg(long, global = true, value_enum, default_value = "warn")]
    log_level: LogLevel,
}

impl GlobalArgs {
    fn options(&self) -> EditOptions {
        EditOptions {
            config: self.config.clone(),
            indent_unit: self.indent_unit,
        }
    }
}

/// Log level for tracing output.
#[derive(Clone, Copy, Debug, ValueEnum)]
enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    fn to_tracing_level(self) -> tracing::Level {
        match self {
            LogLevel::Trace => tracing::Level::TRACE,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Error => tracing::Level::ERROR,
        }
    }
}

/// Structural motion for `move`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum MotionArg {
    ForwardBlock,
    BackwardBlock,
    UpBlock,
    ForwardStatement,
    BackwardStatement,
    BeginningOfDefun,
    EndOfDefun,
}

impl From<MotionArg> for Motion {
    fn from(arg: MotionArg) -> Self {
        match arg {
            MotionArg::ForwardBlock => Motion::ForwardBlock,
            MotionArg::BackwardBlock => Motion::BackwardBlock,
            MotionArg::UpBlock => Motion::UpBlock,
            MotionArg::ForwardStatement => Motion::ForwardStatement,
            MotionArg::BackwardStatement => Motion::BackwardStatement,
            MotionArg::BeginningOfDefun => Motion::BeginningOfDefun,
            MotionArg::EndOfDefun => Motion::EndOfDefun,
        }
    }
}

/// CLI subcommands.
#[derive(Subcommand, Debug)]
enum Command {
    /// Indentation a line should have.
    Indent {
        /// Python file.
        #[arg(long)]
        file: PathBuf,
        /// Line number (1-indexed).
        #[arg(long)]
        line: u32,
    },
    /// Indentation levels to cycle through for a line.
    Levels {
        #[arg(long)]
        file: PathBuf,
        #[arg(long)]
        line: u32,
    },
    /// String, comment and bracket nesting at a location.
    Context {
        #[arg(long)]
        file: PathBuf,
        /// Location (line:col).
        #[arg(long)]
        at: String,
    },
    /// Bounds of the statement at a location.
    Statement {
        #[arg(long)]
        file: PathBuf,
        #[arg(long)]
        at: String,
    },
    /// Bounds of the block at a location.
    Block {
        #[arg(long)]
        file: PathBuf,
        #[arg(long)]
        at: String,
    },
    /// Bounds of the function or class at a location, with decorators.
    Defun {
        #[arg(long)]
        file: PathBuf,
        #[arg(long)]
        at: String,
    },
    /// Names of the functions and classes enclosing a location.
    #[command(name = "defun-path")]
    DefunPath {
        #[arg(long)]
        file: PathBuf,
        #[arg(long)]
        at: String,
    },
    /// Header closed by an else/elif/except/finally line.
    #[command(name = "dedent-match")]
    DedentMatch {
        #[arg(long)]
        file: PathBuf,
        #[arg(long)]
        line: u32,
    },
    /// Where a structural motion from a location lands.
    Move {
        /// Motion to perform.
        #[arg(value_enum)]
        motion: MotionArg,
        #[arg(long)]
        file: PathBuf,
        #[arg(long)]
        at: String,
    },
    /// Re-indent a range of lines (default: the whole file).
    Reindent {
        #[arg(long)]
        file: PathBuf,
        /// First line (default: 1).
        #[arg(long)]
        start: Option<u32>,
        /// Last line (default: last line of the file).
        #[arg(long)]
        end: Option<u32>,
        /// Write the result back to the file.
        #[arg(long)]
        write: bool,
    },
    /// Shift a range of lines right (or left with --left).
    Shift {
        #[arg(long)]
        file: PathBuf,
        #[arg(long)]
        start: u32,
        #[arg(long)]
        end: u32,
        /// Columns to shift by (default: the indent unit).
        #[arg(long)]
        count: Option<usize>,
        /// Shift left instead of right.
        #[arg(long)]
        left: bool,
        /// Write the result back to the file.
        #[arg(long)]
        write: bool,
    },
    /// Line up a completed dedent keyword line with its header.
    Electric {
        #[arg(long)]
        file: PathBuf,
        #[arg(long)]
        line: u32,
        /// Write the result back to the file.
        #[arg(long)]
        write: bool,
    },
    /// Guess the indent unit of a file.
    #[command(name = "guess-indent")]
    GuessIndent {
        #[arg(long)]
        file: PathBuf,
    },
}

// ============================================================================
// Main
// ============================================================================

fn main() -> ExitCode {
    let cli = Cli::parse();

    init_tracing(cli.global.log_level);

    match execute(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let error_code = OutputErrorCode::from(&err);
            let response = ErrorResponse::from_error(&err);

            // Errors go to stdout as JSON, like every other response
            let _ = emit_response(&response, &mut io::stdout());
            let _ = io::stdout().flush();

            ExitCode::from(error_code.code())
        }
    }
}

/// Initialize tracing subscriber.
fn init_tracing(level: LogLevel) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.to_tracing_level().to_string()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

/// Execute the CLI command.
fn execute(cli: Cli) -> Result<(), TugEditError> {
    let options = cli.global.options();
    match cli.command {
        Command::Indent { file, line } => emit(&run_indent(&file, line, &options)?),
        Command::Levels { file, line } => emit(&run_levels(&file, line, &options)?),
        Command::Context { file, at } => emit(&run_context(&file, &at, &options)?),
        Command::Statement { file, at } => {
            emit(&run_bounds(&file, &at, BoundsKind::Statement, &options)?)
        }
        Command::Block { file, at } => emit(&run_bounds(&file, &at, BoundsKind::Block, &options)?),
        Command::Defun { file, at } => emit(&run_bounds(&file, &at, BoundsKind::Defun, &options)?),
        Command::DefunPath { file, at } => emit(&run_defun_path(&file, &at, &options)?),
        Command::DedentMatch { file, line } => emit(&run_dedent_match(&file, line, &options)?),
        Command::Move { motion, file, at } => {
            emit(&run_move(&file, motion.into(), &at, &options)?)
        }
        Command::Reindent {
            file,
            start,
            end,
            write,
        } => emit(&run_reindent(&file, start, end, write, &options)?),
        Command::Shift {
            file,
            start,
            end,
            count,
            left,
            write,
        } => emit(&run_shift(&file, start, end, count, left, write, &options)?),
        Command::Electric { file, line, write } => {
            emit(&run_electric(&file, line, write, &options)?)
        }
        Command::GuessIndent { file } => emit(&run_guess_indent(&file, &options)?),
    }
}

/// Write a response to stdout.
fn emit<T: Serialize>(response: &T) -> Result<(), TugEditError> {
    emit_response(response, &mut io::stdout()).map_err(|e| TugEditError::internal(e.to_string()))?;
    let _ = io::stdout().flush();
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================
