//! CLI front door.
//!
//! Each `run_*` function loads one Python file into a [`Document`], answers
//! one query and returns the response for `main.rs` to emit as JSON. Edits
//! are written back only when asked; otherwise the new text is returned in
//! the response.
//!
//! ## Configuration
//!
//! An explicit `--config` file wins. Otherwise `.tugedit/config.toml` is
//! searched upward from the file's directory, falling back to the defaults.
//! `--indent-unit` overrides both, including any guessed unit.
//!
//! ## Error Handling
//!
//! All functions return `Result<T, TugEditError>`. Queries without an answer
//! (no enclosing block, no dedent match, no further motion target) are
//! reported as `NoResult`.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use tugedit_core::config::EditConfig;
use tugedit_core::error::{TugEditError, TugEditResult};
use tugedit_core::output::{
    BoundsResponse, ContextResponse, DedentMatchResponse, DefunPathResponse, GuessIndentResponse,
    IndentResponse, LevelsResponse, MotionResponse, Position, Range, RegionEditResponse,
    StringInfo,
};
use tugedit_python::detect::guess_indent_unit;
use tugedit_python::navigation;
use tugedit_python::region::{electric_dedent, indent_region, shift_left, shift_right};
use tugedit_python::Document;

// ============================================================================
// Options
// ============================================================================

/// Settings shared by every command.
#[derive(Debug, Clone, Default)]
pub struct EditOptions {
    /// Explicit configuration file.
    pub config: Option<PathBuf>,
    /// Indent unit override.
    pub indent_unit: Option<usize>,
}

/// Which bounds `run_bounds` reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundsKind {
    Statement,
    Block,
    Defun,
}

impl BoundsKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BoundsKind::Statement => "statement",
            BoundsKind::Block => "block",
            BoundsKind::Defun => "defun",
        }
    }
}

/// Structural cursor motions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Motion {
    ForwardBlock,
    BackwardBlock,
    UpBlock,
    ForwardStatement,
    BackwardStatement,
    BeginningOfDefun,
    EndOfDefun,
}

impl Motion {
    pub fn as_str(&self) -> &'static str {
        match self {
            Motion::ForwardBlock => "forward-block",
            Motion::BackwardBlock => "backward-block",
            Motion::UpBlock => "up-block",
            Motion::ForwardStatement => "forward-statement",
            Motion::BackwardStatement => "backward-statement",
            Motion::BeginningOfDefun => "beginning-of-defun",
            Motion::EndOfDefun => "end-of-defun",
        }
    }

    /// Target offset of the motion from `offset`.
    pub fn target(&self, doc: &Document, offset: usize) -> Option<usize> {
        match self {
            Motion::ForwardBlock => navigation::forward_block(doc, offset),
            Motion::BackwardBlock => navigation::backward_block(doc, offset),
            Motion::UpBlock => navigation::up_block(doc, offset),
            Motion::ForwardStatement => navigation::forward_statement(doc, offset),
            Motion::BackwardStatement => navigation::backward_statement(doc, offset),
            Motion::BeginningOfDefun => navigation::beginning_of_defun(doc, offset),
            Motion::EndOfDefun => navigation::end_of_defun(doc, offset),
        }
    }
}

// ============================================================================
// Loading
// ============================================================================

/// Load the configuration that applies to `file`.
pub fn load_config(file: &Path, options: &EditOptions) -> TugEditResult<EditConfig> {
    let config = match &options.config {
        Some(path) => EditConfig::load(path)?,
        None => {
            let dir = file
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or(Path::new("."));
            EditConfig::load_from_dir(dir)?
        }
    };
    Ok(config)
}

/// Read `file` into a document configured for it.
pub fn open_document(file: &Path, options: &EditOptions) -> TugEditResult<Document> {
    if !file.is_file() {
        return Err(TugEditError::FileNotFound {
            path: file.display().to_string(),
        });
    }
    let text = fs::read_to_string(file)?;
    let config = load_config(file, options)?;
    let mut doc = Document::with_config(text, &config)?;
    if let Some(unit) = options.indent_unit {
        doc.set_indent_unit(unit)?;
    }
    debug!(
        "opened {} ({} lines, indent unit {})",
        file.display(),
        doc.line_count(),
        doc.indent_unit()
    );
    Ok(doc)
}

/// Parse a `line:col` location (both 1-indexed).
pub fn parse_location(at: &str) -> TugEditResult<(u32, u32)> {
    let invalid = || {
        TugEditError::invalid_args(format!(
            "invalid location '{}', expected line:col",
            at
        ))
    };
    let (line, col) = at.split_once(':').ok_or_else(invalid)?;
    let line: u32 = line.trim().parse().map_err(|_| invalid())?;
    let col: u32 = col.trim().parse().map_err(|_| invalid())?;
    if line == 0 || col == 0 {
        return Err(invalid());
    }
    Ok((line, col))
}

fn offset_at(doc: &Document, at: &str) -> TugEditResult<usize> {
    let (line, col) = parse_location(at)?;
    doc.check_line(line)?;
    Ok(doc.buffer().offset_at(line, col))
}

fn position(doc: &Document, offset: usize) -> Position {
    Position::from_offset(doc.buffer(), offset)
}

fn write_back(file: &Path, doc: &Document, write: bool) -> TugEditResult<bool> {
    if !write || doc.revision() == 0 {
        return Ok(false);
    }
    fs::write(file, doc.text())?;
    info!("wrote {}", file.display());
    Ok(true)
}

fn region_response(
    file: &Path,
    doc: &Document,
    operation: &str,
    (start, end): (u32, u32),
    lines_changed: usize,
    write: bool,
) -> TugEditResult<RegionEditResponse> {
    let written = write_back(file, doc, write)?;
    Ok(
        RegionEditResponse::new(file.display().to_string(), operation, start, end, lines_changed)
            .with_result(written, doc.text().to_string()),
    )
}

// ============================================================================
// Queries
// ============================================================================

/// Indentation of `line` and the status that decided it.
pub fn run_indent(file: &Path, line: u32, options: &EditOptions) -> TugEditResult<IndentResponse> {
    let doc = open_document(file, options)?;
    doc.check_line(line)?;
    let status = doc.indent_context(line);
    let anchor = status.anchor().map(|a| position(&doc, a));
    Ok(IndentResponse::new(
        file.display().to_string(),
        line,
        status.name(),
        anchor,
        doc.compute_indentation(line),
    ))
}

/// Indentation levels of `line`.
pub fn run_levels(file: &Path, line: u32, options: &EditOptions) -> TugEditResult<LevelsResponse> {
    let doc = open_document(file, options)?;
    doc.check_line(line)?;
    let levels = doc.indentation_levels(line);
    Ok(LevelsResponse::new(
        file.display().to_string(),
        line,
        levels.levels().to_vec(),
        levels.current(),
    ))
}

/// Lexical context at a location.
pub fn run_context(file: &Path, at: &str, options: &EditOptions) -> TugEditResult<ContextResponse> {
    let doc = open_document(file, options)?;
    let offset = offset_at(&doc, at)?;
    let state = doc.lexical_context(offset);
    let in_string = state.in_string.map(|s| StringInfo {
        quote: s.quote.to_string(),
        fence_len: s.fence_len,
        start: position(&doc, s.start),
    });
    Ok(ContextResponse::new(
        file.display().to_string(),
        position(&doc, offset),
        in_string,
        state.in_comment.map(|c| position(&doc, c)),
        state
            .paren_starts
            .iter()
            .map(|&p| position(&doc, p))
            .collect(),
    ))
}

/// Statement, block or defun bounds at a location.
pub fn run_bounds(
    file: &Path,
    at: &str,
    kind: BoundsKind,
    options: &EditOptions,
) -> TugEditResult<BoundsResponse> {
    let doc = open_document(file, options)?;
    let offset = offset_at(&doc, at)?;
    let span = match kind {
        BoundsKind::Statement => Some(doc.statement_bounds(offset)),
        BoundsKind::Block => doc.block_bounds(offset),
        BoundsKind::Defun => doc.defun_bounds(offset),
    };
    let span = span.ok_or_else(|| no_result(&doc, kind.as_str(), offset))?;
    Ok(BoundsResponse::new(
        file.display().to_string(),
        kind.as_str(),
        Range::from_span(doc.buffer(), span),
    ))
}

/// Names of the definitions enclosing a location.
pub fn run_defun_path(
    file: &Path,
    at: &str,
    options: &EditOptions,
) -> TugEditResult<DefunPathResponse> {
    let doc = open_document(file, options)?;
    let offset = offset_at(&doc, at)?;
    Ok(DefunPathResponse::new(
        file.display().to_string(),
        position(&doc, offset),
        doc.enclosing_defun_path(offset),
    ))
}

/// The header a dedent keyword line closes.
pub fn run_dedent_match(
    file: &Path,
    line: u32,
    options: &EditOptions,
) -> TugEditResult<DedentMatchResponse> {
    let doc = open_document(file, options)?;
    doc.check_line(line)?;
    let opener = doc
        .dedent_match(line)
        .ok_or_else(|| TugEditError::no_result("dedent match", line, 1))?;
    Ok(DedentMatchResponse::new(
        file.display().to_string(),
        line,
        position(&doc, opener),
    ))
}

/// Where a structural motion from a location lands.
pub fn run_move(
    file: &Path,
    motion: Motion,
    at: &str,
    options: &EditOptions,
) -> TugEditResult<MotionResponse> {
    let doc = open_document(file, options)?;
    let offset = offset_at(&doc, at)?;
    let target = motion
        .target(&doc, offset)
        .ok_or_else(|| no_result(&doc, motion.as_str(), offset))?;
    Ok(MotionResponse::new(
        file.display().to_string(),
        motion.as_str(),
        position(&doc, offset),
        position(&doc, target),
    ))
}

/// The indent unit guessed from the file, and the one in effect.
pub fn run_guess_indent(file: &Path, options: &EditOptions) -> TugEditResult<GuessIndentResponse> {
    let doc = open_document(file, options)?;
    Ok(GuessIndentResponse::new(
        file.display().to_string(),
        guess_indent_unit(&doc),
        doc.indent_unit(),
    ))
}

fn no_result(doc: &Document, query: &str, offset: usize) -> TugEditError {
    let (line, col) = doc.buffer().position(offset);
    TugEditError::no_result(query, line, col)
}

// ============================================================================
// Edits
// ============================================================================

/// Re-indent `start..=end`, the whole file by default.
pub fn run_reindent(
    file: &Path,
    start: Option<u32>,
    end: Option<u32>,
    write: bool,
    options: &EditOptions,
) -> TugEditResult<RegionEditResponse> {
    let mut doc = open_document(file, options)?;
    let start = start.unwrap_or(1);
    let end = end.unwrap_or(doc.line_count());
    let changed = indent_region(&mut doc, start, end)?;
    region_response(file, &doc, "reindent", (start, end), changed, write)
}

/// Shift `start..=end` right, or left with `left`.
pub fn run_shift(
    file: &Path,
    start: u32,
    end: u32,
    count: Option<usize>,
    left: bool,
    write: bool,
    options: &EditOptions,
) -> TugEditResult<RegionEditResponse> {
    let mut doc = open_document(file, options)?;
    let (operation, changed) = if left {
        ("shift-left", shift_left(&mut doc, start, end, count)?)
    } else {
        ("shift-right", shift_right(&mut doc, start, end, count)?)
    };
    region_response(file, &doc, operation, (start, end), changed, write)
}

/// Line a completed dedent keyword line up with its header.
pub fn run_electric(
    file: &Path,
    line: u32,
    write: bool,
    options: &EditOptions,
) -> TugEditResult<RegionEditResponse> {
    let mut doc = open_document(file, options)?;
    let changed = usize::from(electric_dedent(&mut doc, line)?);
    region_response(file, &doc, "electric", (line, line), changed, write)
}

// ============================================================================
// Tests
// ============================================================================
