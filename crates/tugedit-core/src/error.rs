//! Error types and error code constants for tugedit.
//!
//! The engine itself never fails on malformed Python: unterminated strings,
//! brackets and comments are valid states, and queries without an answer
//! return `None`. What remains are caller errors:
//!
//! - [`ConfigError`]: invalid configuration, rejected when it is built
//! - [`EditError`]: region operations that cannot be applied as a whole
//! - [`TugEditError`]: the unified type the CLI renders as JSON
//!
//! ## Error Code Mapping
//!
//! - `2`: Invalid arguments (bad input from caller, invalid configuration)
//! - `3`: No result (the query has no defined answer at that position)
//! - `4`: Apply errors (an edit could not be applied)
//! - `10`: Internal errors (I/O, unexpected state)

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use crate::patch::Span;

// ============================================================================
// Output Error Codes
// ============================================================================

/// Error codes for JSON output.
///
/// These codes map to CLI exit codes and appear in JSON error responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum OutputErrorCode {
    /// Invalid arguments from caller (bad input, invalid configuration).
    InvalidArguments = 2,
    /// The query has no defined result.
    NoResult = 3,
    /// Apply errors (edits rejected).
    ApplyError = 4,
    /// Internal errors (I/O, unexpected state).
    InternalError = 10,
}

impl OutputErrorCode {
    /// Get the numeric code value.
    pub fn code(&self) -> u8 {
        *self as u8
    }
}

impl fmt::Display for OutputErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

// ============================================================================
// Subsystem Errors
// ============================================================================

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Indent unit must be a positive number of columns.
    #[error("invalid indent unit {0}: must be greater than zero")]
    InvalidIndentUnit(i64),

    /// Tab width must be a positive number of columns.
    #[error("invalid tab width {0}: must be greater than zero")]
    InvalidTabWidth(i64),

    /// Dedent keyword outside `else`, `elif`, `except`, `finally`.
    #[error("unknown dedent keyword '{0}'")]
    UnknownDedentKeyword(String),

    /// Config file could not be read.
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Config file is not valid TOML for the expected schema.
    #[error("failed to parse config file {path}: {message}")]
    Parse { path: PathBuf, message: String },
}

/// Errors from edit operations (set indentation, shift, re-indent).
#[derive(Debug, Error)]
pub enum EditError {
    /// Line does not exist in the buffer.
    #[error("line {line} is out of range (buffer has {line_count} lines)")]
    LineOutOfRange { line: u32, line_count: u32 },

    /// Region start is after region end.
    #[error("invalid region: start line {start} is after end line {end}")]
    InvalidRegion { start: u32, end: u32 },

    /// Shifting left would remove more indentation than a line has.
    #[error("can't shift line {line} left by {requested}: it is only indented by {indentation}")]
    ShiftTooFar {
        line: u32,
        indentation: usize,
        requested: usize,
    },

    /// Edit span outside the buffer or splitting a character.
    #[error("edit span {span} is out of bounds (buffer length {len})")]
    SpanOutOfBounds { span: Span, len: usize },

    /// Two edits in one transaction overlap.
    #[error("overlapping edits at {first} and {second}")]
    OverlappingEdits { first: Span, second: Span },
}

// ============================================================================
// Unified Error Type
// ============================================================================

/// Unified error type for CLI output.
#[derive(Debug, Error)]
pub enum TugEditError {
    /// Invalid arguments from caller.
    #[error("invalid arguments: {message}")]
    InvalidArguments { message: String },

    /// The query has no defined result at the requested position.
    #[error("no {query} at {line}:{col}")]
    NoResult {
        query: String,
        line: u32,
        col: u32,
    },

    /// File not found.
    #[error("file not found: {path}")]
    FileNotFound { path: String },

    /// Configuration error.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Edit error.
    #[error(transparent)]
    Edit(#[from] EditError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Internal error (bug or unexpected state).
    #[error("internal error: {message}")]
    InternalError { message: String },
}

impl TugEditError {
    /// Create an InvalidArguments error.
    pub fn invalid_args(message: impl Into<String>) -> Self {
        TugEditError::InvalidArguments {
            message: message.into(),
        }
    }

    /// Create a NoResult error.
    pub fn no_result(query: impl Into<String>, line: u32, col: u32) -> Self {
        TugEditError::NoResult {
            query: query.into(),
            line,
            col,
        }
    }

    /// Create an InternalError.
    pub fn internal(message: impl Into<String>) -> Self {
        TugEditError::InternalError {
            message: message.into(),
        }
    }

    /// Stable string code for JSON error responses.
    pub fn code_name(&self) -> &'static str {
        match self {
            TugEditError::InvalidArguments { .. } => "InvalidArguments",
            TugEditError::NoResult { .. } => "NoResult",
            TugEditError::FileNotFound { .. } => "FileNotFound",
            TugEditError::Config(_) => "InvalidConfig",
            TugEditError::Edit(_) => "ApplyError",
            TugEditError::Io(_) => "IoError",
            TugEditError::InternalError { .. } => "InternalError",
        }
    }
}

impl From<&TugEditError> for OutputErrorCode {
    fn from(err: &TugEditError) -> Self {
        match err {
            TugEditError::InvalidArguments { .. }
            | TugEditError::FileNotFound { .. }
            | TugEditError::Config(_) => OutputErrorCode::InvalidArguments,
            TugEditError::NoResult { .. } => OutputErrorCode::NoResult,
            TugEditError::Edit(EditError::LineOutOfRange { .. })
            | TugEditError::Edit(EditError::InvalidRegion { .. }) => {
                OutputErrorCode::InvalidArguments
            }
            TugEditError::Edit(_) => OutputErrorCode::ApplyError,
            TugEditError::Io(_) | TugEditError::InternalError { .. } => {
                OutputErrorCode::InternalError
            }
        }
    }
}

/// Result type for CLI-level operations.
pub type TugEditResult<T> = Result<T, TugEditError>;

// ============================================================================
// Tests
// ============================================================================
