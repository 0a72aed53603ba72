//! JSON output types and serialization for CLI responses.
//!
//! These types form the contract between the `tugedit` binary and the
//! editor integrations that call it.
//!
//! ## Design Principles
//!
//! 1. **Status first:** Every response has `status` as its first field
//! 2. **Deterministic:** Same input -> same output (field order, array ordering)
//! 3. **Nullable vs absent:** Explicit `null` for "no value"; absent field means "not applicable"
//! 4. **Versioned:** Schema version in every response
//! 5. **Positions carry both coordinates:** 1-indexed line/col plus byte offset

use std::io::{self, Write};

use serde::{Deserialize, Serialize};

use crate::error::{OutputErrorCode, TugEditError};
use crate::patch::Span;
use crate::text::SourceBuffer;

/// Current schema version for all responses.
pub const SCHEMA_VERSION: &str = "1";

fn ok_status() -> String {
    "ok".to_string()
}

fn schema_version() -> String {
    SCHEMA_VERSION.to_string()
}

// ============================================================================
// Shared Types
// ============================================================================

/// A position in a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    /// 1-indexed line.
    pub line: u32,
    /// 1-indexed column (Unicode scalar values).
    pub col: u32,
    /// 0-indexed byte offset.
    pub offset: usize,
}

impl Position {
    /// Build a position from a byte offset in `buffer`.
    pub fn from_offset(buffer: &SourceBuffer, offset: usize) -> Self {
        let offset = buffer.floor_char_boundary(offset);
        let (line, col) = buffer.position(offset);
        Position { line, col, offset }
    }
}

/// A range in a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Range {
    pub start: Position,
    pub end: Position,
}

impl Range {
    pub fn from_span(buffer: &SourceBuffer, span: Span) -> Self {
        Range {
            start: Position::from_offset(buffer, span.start),
            end: Position::from_offset(buffer, span.end),
        }
    }
}

/// An open string in a lexical context response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StringInfo {
    /// The quote character (`'` or `"`).
    pub quote: String,
    /// 1 for single-quoted, 3 for triple-quoted.
    pub fence_len: u8,
    /// Where the string (including any prefix) starts.
    pub start: Position,
}

// ============================================================================
// Responses
// ============================================================================

/// Response for `indent`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndentResponse {
    pub status: String,
    pub schema_version: String,
    pub file: String,
    pub line: u32,
    /// Indentation status name (`no_indent`, `inside_paren`, ...).
    pub context: String,
    /// Anchor the status refers to; `null` for `no_indent`.
    pub anchor: Option<Position>,
    pub indentation: usize,
}

impl IndentResponse {
    pub fn new(
        file: impl Into<String>,
        line: u32,
        context: impl Into<String>,
        anchor: Option<Position>,
        indentation: usize,
    ) -> Self {
        IndentResponse {
            status: ok_status(),
            schema_version: schema_version(),
            file: file.into(),
            line,
            context: context.into(),
            anchor,
            indentation,
        }
    }
}

/// Response for `levels`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LevelsResponse {
    pub status: String,
    pub schema_version: String,
    pub file: String,
    pub line: u32,
    pub levels: Vec<usize>,
    pub current: usize,
}

impl LevelsResponse {
    pub fn new(file: impl Into<String>, line: u32, levels: Vec<usize>, current: usize) -> Self {
        LevelsResponse {
            status: ok_status(),
            schema_version: schema_version(),
            file: file.into(),
            line,
            levels,
            current,
        }
    }
}

/// Response for `context`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextResponse {
    pub status: String,
    pub schema_version: String,
    pub file: String,
    pub position: Position,
    pub in_string: Option<StringInfo>,
    pub in_comment: Option<Position>,
    pub paren_depth: u32,
    /// Open brackets, innermost last.
    pub paren_starts: Vec<Position>,
}

impl ContextResponse {
    pub fn new(
        file: impl Into<String>,
        position: Position,
        in_string: Option<StringInfo>,
        in_comment: Option<Position>,
        paren_starts: Vec<Position>,
    ) -> Self {
        ContextResponse {
            status: ok_status(),
            schema_version: schema_version(),
            file: file.into(),
            position,
            in_string,
            in_comment,
            paren_depth: paren_starts.len() as u32,
            paren_starts,
        }
    }
}

/// Response for `statement`, `block` and `defun`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoundsResponse {
    pub status: String,
    pub schema_version: String,
    pub file: String,
    /// `statement`, `block` or `defun`.
    pub kind: String,
    pub range: Range,
}

impl BoundsResponse {
    pub fn new(file: impl Into<String>, kind: impl Into<String>, range: Range) -> Self {
        BoundsResponse {
            status: ok_status(),
            schema_version: schema_version(),
            file: file.into(),
            kind: kind.into(),
            range,
        }
    }
}

/// Response for `defun-path`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefunPathResponse {
    pub status: String,
    pub schema_version: String,
    pub file: String,
    pub position: Position,
    /// Enclosing definition names, outermost first.
    pub path: Vec<String>,
    /// Dotted name, `null` at module level.
    pub qualified_name: Option<String>,
}

impl DefunPathResponse {
    pub fn new(file: impl Into<String>, position: Position, path: Vec<String>) -> Self {
        let qualified_name = if path.is_empty() {
            None
        } else {
            Some(path.join("."))
        };
        DefunPathResponse {
            status: ok_status(),
            schema_version: schema_version(),
            file: file.into(),
            position,
            path,
            qualified_name,
        }
    }
}

/// Response for `dedent-match`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DedentMatchResponse {
    pub status: String,
    pub schema_version: String,
    pub file: String,
    pub line: u32,
    /// The header the dedent keyword closes.
    pub opener: Position,
}

impl DedentMatchResponse {
    pub fn new(file: impl Into<String>, line: u32, opener: Position) -> Self {
        DedentMatchResponse {
            status: ok_status(),
            schema_version: schema_version(),
            file: file.into(),
            line,
            opener,
        }
    }
}

/// Response for `move`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MotionResponse {
    pub status: String,
    pub schema_version: String,
    pub file: String,
    /// Motion name (`forward-block`, `end-of-defun`, ...).
    pub motion: String,
    pub from: Position,
    pub to: Position,
}

impl MotionResponse {
    pub fn new(
        file: impl Into<String>,
        motion: impl Into<String>,
        from: Position,
        to: Position,
    ) -> Self {
        MotionResponse {
            status: ok_status(),
            schema_version: schema_version(),
            file: file.into(),
            motion: motion.into(),
            from,
            to,
        }
    }
}

/// Response for `reindent`, `shift` and `electric`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegionEditResponse {
    pub status: String,
    pub schema_version: String,
    pub file: String,
    /// `reindent`, `shift-left`, `shift-right` or `electric`.
    pub operation: String,
    pub start_line: u32,
    pub end_line: u32,
    pub lines_changed: usize,
    /// Whether the result was written back to the file.
    pub written: bool,
    /// Resulting text when not written back.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl RegionEditResponse {
    pub fn new(
        file: impl Into<String>,
        operation: impl Into<String>,
        start_line: u32,
        end_line: u32,
        lines_changed: usize,
    ) -> Self {
        RegionEditResponse {
            status: ok_status(),
            schema_version: schema_version(),
            file: file.into(),
            operation: operation.into(),
            start_line,
            end_line,
            lines_changed,
            written: false,
            text: None,
        }
    }

    /// Record the outcome: either written back, or the new text inline.
    pub fn with_result(mut self, written: bool, text: String) -> Self {
        self.written = written;
        self.text = if written { None } else { Some(text) };
        self
    }
}

/// Response for `guess-indent`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuessIndentResponse {
    pub status: String,
    pub schema_version: String,
    pub file: String,
    /// Detected unit, `null` if the file has no usable block.
    pub guessed: Option<usize>,
    /// Unit in effect (detected or configured).
    pub indent_unit: usize,
}

impl GuessIndentResponse {
    pub fn new(file: impl Into<String>, guessed: Option<usize>, indent_unit: usize) -> Self {
        GuessIndentResponse {
            status: ok_status(),
            schema_version: schema_version(),
            file: file.into(),
            guessed,
            indent_unit,
        }
    }
}

// ============================================================================
// Error Response
// ============================================================================

/// Error details for JSON output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorInfo {
    /// Stable error code name.
    pub code: String,
    /// Numeric exit code.
    pub exit_code: u8,
    /// Human-readable message.
    pub message: String,
}

impl ErrorInfo {
    pub fn from_error(err: &TugEditError) -> Self {
        ErrorInfo {
            code: err.code_name().to_string(),
            exit_code: OutputErrorCode::from(err).code(),
            message: err.to_string(),
        }
    }
}

/// Error response envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub status: String,
    pub schema_version: String,
    pub error: ErrorInfo,
}

impl ErrorResponse {
    pub fn from_error(err: &TugEditError) -> Self {
        ErrorResponse {
            status: "error".to_string(),
            schema_version: schema_version(),
            error: ErrorInfo::from_error(err),
        }
    }
}

// ============================================================================
// Emit
// ============================================================================

/// Emit a response as pretty-printed JSON to a writer.
pub fn emit_response<T: Serialize>(response: &T, writer: &mut impl Write) -> io::Result<()> {
    let json = serde_json::to_string_pretty(response)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    writeln!(writer, "{}", json)
}

/// Emit a response as compact JSON (single line) to a writer.
pub fn emit_response_compact<T: Serialize>(
    response: &T,
    writer: &mut impl Write,
) -> io::Result<()> {
    let json = serde_json::to_string(response)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    writeln!(writer, "{}", json)
}

// ============================================================================
// Tests
// ============================================================================
