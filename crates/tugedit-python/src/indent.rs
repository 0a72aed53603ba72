//! The indentation calculator: a concrete column for every line.

use tracing::debug;

use crate::context::{indent_context, IndentStatus};
use crate::continuation::{
    assignment_continuation_start, block_continuation_start, line_ends_backslash,
    statement_start_line,
};
use crate::document::Document;
use crate::keywords::{block_keyword, block_keyword_end, return_from_import_end, DedentKeyword};

/// How the indentation of a line was decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndentReport {
    pub line: u32,
    pub status: IndentStatus,
    pub indentation: usize,
}

/// The indentation `line` should have, in columns.
pub fn compute_indentation(doc: &Document, line: u32) -> usize {
    indent_report(doc, line).indentation
}

/// Compute the indentation of `line` along with the status that decided it.
pub fn indent_report(doc: &Document, line: u32) -> IndentReport {
    let line = line.clamp(1, doc.line_count());
    let status = indent_context(doc, line);
    let indentation = match status {
        IndentStatus::NoIndent => 0,
        IndentStatus::AfterBeginningOfBlock(header) => {
            doc.buffer().indentation_at(header) + doc.indent_unit()
        }
        IndentStatus::AfterLine(previous) => after_line(doc, line, previous),
        IndentStatus::InsideString(start) => doc.buffer().indentation_at(start),
        IndentStatus::AfterBackslash(anchor) => after_backslash(doc, line, anchor),
        IndentStatus::InsideParen(open) => inside_paren(doc, line, open),
    };
    debug!("line {}: {} -> {}", line, status, indentation);
    IndentReport {
        line,
        status,
        indentation,
    }
}

fn after_line(doc: &Document, line: u32, previous: usize) -> usize {
    let base = doc.buffer().indentation_at(previous);
    let text = doc.buffer().line_text(line);
    if DedentKeyword::at_line_start(text, &doc.settings().dedent_keywords).is_some() {
        base.saturating_sub(doc.indent_unit())
    } else {
        base
    }
}

// ============================================================================
// Backslash Continuations
// ============================================================================

fn after_backslash(doc: &Document, line: u32, anchor: usize) -> usize {
    let buffer = doc.buffer();
    let unit = doc.indent_unit();
    let previous = line - 1;

    if buffer.line_text(line).trim_start().starts_with('.') {
        return match last_top_level_dot(doc, previous) {
            Some(dot) => buffer.column(dot),
            None => buffer.indentation(previous) + unit,
        };
    }

    if let Some(header) = block_continuation_start(doc, line) {
        let header_line = buffer.line_of_offset(header);
        let text = buffer.line_text(header_line);
        if let Some((_, end)) = block_keyword_end(text) {
            return buffer.column(buffer.line_start(header_line) + end);
        }
    }

    if let Some(target) = assignment_continuation_start(doc, line) {
        return buffer.column(target);
    }

    if previous > 1 && line_ends_backslash(doc, previous - 1) {
        return buffer.indentation(previous);
    }
    let anchor_line = buffer.line_of_offset(anchor);
    match return_from_import_end(buffer.line_text(anchor_line)) {
        Some(end) => buffer.column(buffer.line_start(anchor_line) + end),
        None => buffer.indentation(previous) + unit,
    }
}

/// The last `.` at the top level of the statement ending on `line`.
///
/// Dots of numeric literals count too: `1.5 \` followed by `.real` aligns
/// under the `.` of `1.5`.
fn last_top_level_dot(doc: &Document, line: u32) -> Option<usize> {
    let buffer = doc.buffer();
    let start = statement_start_line(doc, line);
    doc.code_chars(buffer.line_start(start), buffer.line_end(line))
        .filter(|c| c.ch == '.' && c.depth == 0)
        .last()
        .map(|c| c.offset)
}

// ============================================================================
// Brackets
// ============================================================================

fn inside_paren(doc: &Document, line: u32, open: usize) -> usize {
    let buffer = doc.buffer();
    let unit = doc.indent_unit();
    let open_line = buffer.line_of_offset(open);
    let starts_with_closer = buffer
        .line_text(line)
        .trim_start()
        .starts_with([')', ']', '}']);

    if starts_with_closer {
        let depth = doc.line_start_state(line).paren_depth();
        let open_line_depth = doc.line_start_state(open_line).paren_depth();
        if depth.saturating_sub(1) <= open_line_depth {
            return buffer.indentation(open_line);
        }
    }

    let after_open = &buffer.text()[open + 1..buffer.line_end(open_line)];
    let rest = after_open.trim_start();
    let hanging = rest.is_empty() || rest.starts_with('#');

    let base = if hanging {
        buffer.indentation(open_line) + unit
    } else {
        buffer.column(open + 1 + (after_open.len() - rest.len()))
    };

    if starts_with_closer {
        base.saturating_sub(unit)
    } else if hanging && block_keyword(buffer.line_text(open_line)).is_some() {
        base + unit
    } else {
        base
    }
}

// ============================================================================
// Tests
// ============================================================================
