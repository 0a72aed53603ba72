//! Statement, block and defun boundaries, and movement across them.
//!
//! Nothing here keeps a tree. Every query walks the buffer from the cursor,
//! statement by statement, bounded by the buffer start and end.
//!
//! A block is a [block header](crate::context::is_block_header) at
//! indentation `k` followed by every statement indented deeper than `k`,
//! skipping blank and comment-only lines. A defun is a block whose header is
//! `def` or `class`, extended backward over its decorators.

use tugedit_core::patch::Span;

use crate::context::{is_blank_or_comment, is_block_header, next_code_line, previous_code_line};
use crate::continuation::{statement_end_line, statement_start_line};
use crate::document::Document;
use crate::keywords::{defun_name, is_decorator};

// ============================================================================
// Line Helpers
// ============================================================================

/// The line holding `offset`.
fn line_at(doc: &Document, offset: usize) -> u32 {
    let buffer = doc.buffer();
    buffer.line_of_offset(buffer.floor_char_boundary(offset))
}

/// `line` if it holds code, else the nearest code line above it.
pub fn code_line_at_or_before(doc: &Document, line: u32) -> Option<u32> {
    if !is_blank_or_comment(doc, line) {
        Some(line)
    } else {
        previous_code_line(doc, line)
    }
}

/// First line of the statement at `offset`, resolving blank and comment
/// lines to the statement above.
fn statement_at(doc: &Document, offset: usize) -> Option<u32> {
    code_line_at_or_before(doc, line_at(doc, offset)).map(|l| statement_start_line(doc, l))
}

/// Start line of the statement before the one starting at `line`.
pub fn previous_statement_start(doc: &Document, line: u32) -> Option<u32> {
    previous_code_line(doc, line).map(|l| statement_start_line(doc, l))
}

/// Start line of the statement after the one containing `line`.
pub fn next_statement_start(doc: &Document, line: u32) -> Option<u32> {
    next_code_line(doc, statement_end_line(doc, line))
}

fn indentation(doc: &Document, line: u32) -> usize {
    doc.buffer().indentation(line)
}

fn start_offset(doc: &Document, line: u32) -> usize {
    doc.buffer().indentation_end(line)
}

fn is_defun_header(doc: &Document, line: u32) -> bool {
    defun_name(doc.buffer().line_text(line)).is_some() && is_block_header(doc, line)
}

/// Last line of the block headed at `header`.
pub fn block_end_line(doc: &Document, header: u32) -> u32 {
    let k = indentation(doc, header);
    let mut last = statement_end_line(doc, header);
    let mut line = last + 1;
    while line <= doc.line_count() {
        if is_blank_or_comment(doc, line) {
            line += 1;
            continue;
        }
        if indentation(doc, line) <= k {
            break;
        }
        last = statement_end_line(doc, line);
        line = last + 1;
    }
    last
}

/// The nearest header above the statement at `line` that encloses it and
/// satisfies `accept`.
///
/// Headers that enclose the statement but are rejected are walked through.
/// A shallower statement that is not a header ends the search.
pub fn enclosing_header(
    doc: &Document,
    line: u32,
    accept: impl Fn(&Document, u32) -> bool,
) -> Option<u32> {
    let mut threshold = indentation(doc, line);
    let mut current = line;
    while threshold > 0 {
        let candidate = previous_statement_start(doc, current)?;
        let k = indentation(doc, candidate);
        if k < threshold {
            if !is_block_header(doc, candidate) {
                return None;
            }
            if accept(doc, candidate) {
                return Some(candidate);
            }
            threshold = k;
        }
        current = candidate;
    }
    None
}

/// The block header at `line`: the first non-blank offset of its
/// statement, if that statement is a header.
pub fn block_header_at(doc: &Document, line: u32) -> Option<usize> {
    let start = statement_start_line(doc, line);
    is_block_header(doc, start).then(|| start_offset(doc, start))
}

// ============================================================================
// Bounds
// ============================================================================

/// Span of the logical statement containing `offset`, from its first
/// non-blank character to the end of its last line.
pub fn statement_bounds(doc: &Document, offset: usize) -> Span {
    let line = line_at(doc, offset);
    let start = statement_start_line(doc, line);
    let end = statement_end_line(doc, line);
    Span::new(start_offset(doc, start), doc.buffer().line_end(end))
}

/// Span of the block containing `offset`: the block headed by the
/// statement there, or else the nearest enclosing block.
pub fn block_bounds(doc: &Document, offset: usize) -> Option<Span> {
    let statement = statement_at(doc, offset)?;
    let header = if is_block_header(doc, statement) {
        statement
    } else {
        enclosing_header(doc, statement, |_, _| true)?
    };
    Some(block_span(doc, header, header))
}

fn block_span(doc: &Document, first: u32, header: u32) -> Span {
    Span::new(
        start_offset(doc, first),
        doc.buffer().line_end(block_end_line(doc, header)),
    )
}

/// The definition a decorator statement at `line` applies to.
fn decorated_definition(doc: &Document, line: u32) -> Option<u32> {
    let k = indentation(doc, line);
    let mut current = line;
    loop {
        let next = next_statement_start(doc, current)?;
        if indentation(doc, next) != k {
            return None;
        }
        let text = doc.buffer().line_text(next);
        if is_decorator(text) {
            current = next;
            continue;
        }
        return is_defun_header(doc, next).then_some(next);
    }
}

/// First decorator line of the definition at `header`, or `header` itself.
fn first_decorator_line(doc: &Document, header: u32) -> u32 {
    let k = indentation(doc, header);
    let mut first = header;
    while first > 1 {
        let above = statement_start_line(doc, first - 1);
        if is_blank_or_comment(doc, above)
            || indentation(doc, above) != k
            || !is_decorator(doc.buffer().line_text(above))
        {
            break;
        }
        first = above;
    }
    first
}

/// The `def` or `class` line for the statement at `offset`: the statement
/// itself, the definition it decorates, or the nearest enclosing one.
fn defun_header_at(doc: &Document, offset: usize) -> Option<u32> {
    let statement = statement_at(doc, offset)?;
    if is_decorator(doc.buffer().line_text(statement)) {
        if let Some(def) = decorated_definition(doc, statement) {
            return Some(def);
        }
    }
    if is_defun_header(doc, statement) {
        return Some(statement);
    }
    enclosing_header(doc, statement, is_defun_header)
}

/// Span of the function or class containing `offset`, including its
/// decorators.
pub fn defun_bounds(doc: &Document, offset: usize) -> Option<Span> {
    let header = defun_header_at(doc, offset)?;
    Some(block_span(doc, first_decorator_line(doc, header), header))
}

/// Names of the functions and classes enclosing `offset`, outermost first.
pub fn enclosing_defun_path(doc: &Document, offset: usize) -> Vec<String> {
    let mut path = Vec::new();
    let mut current = defun_header_at(doc, offset);
    while let Some(header) = current {
        if let Some(name) = defun_name(doc.buffer().line_text(header)) {
            path.push(name.to_string());
        }
        current = enclosing_header(doc, header, is_defun_header);
    }
    path.reverse();
    path
}

// ============================================================================
// Movement
// ============================================================================

/// Next block boundary after `offset`.
///
/// Moves to the next header inside the current block (the block headed at
/// point, else the enclosing one), descending into children and across
/// siblings. When none remains, moves to the end of that block, then
/// ascends. `None` at the top level with no header after.
pub fn forward_block(doc: &Document, offset: usize) -> Option<usize> {
    let buffer = doc.buffer();
    let line = line_at(doc, offset);
    let (mut after, mut parent) = match code_line_at_or_before(doc, line) {
        Some(code) => {
            let statement = statement_start_line(doc, code);
            let parent = if is_block_header(doc, statement) {
                Some(statement)
            } else {
                enclosing_header(doc, statement, |_, _| true)
            };
            (statement_end_line(doc, statement), parent)
        }
        None => (line - 1, None),
    };

    loop {
        let limit = parent
            .map(|h| block_end_line(doc, h))
            .unwrap_or(doc.line_count());
        let mut candidate = next_code_line(doc, after);
        while let Some(line) = candidate.filter(|&l| l <= limit) {
            if is_block_header(doc, line) {
                return Some(start_offset(doc, line));
            }
            candidate = next_statement_start(doc, line);
        }

        let header = parent?;
        let end = buffer.line_end(limit);
        if end > offset {
            return Some(end);
        }
        after = limit;
        parent = enclosing_header(doc, header, |_, _| true);
    }
}

/// Previous block boundary before `offset`.
///
/// Moves to the start of the header at point, else the previous header
/// inside the enclosing block, else the enclosing header itself.
pub fn backward_block(doc: &Document, offset: usize) -> Option<usize> {
    let statement = statement_at(doc, offset)?;
    let start = start_offset(doc, statement);
    if start < offset && is_block_header(doc, statement) {
        return Some(start);
    }

    let parent = enclosing_header(doc, statement, |_, _| true);
    let floor = parent.unwrap_or(0);
    let mut current = statement;
    while let Some(line) = previous_statement_start(doc, current) {
        if line <= floor {
            break;
        }
        if is_block_header(doc, line) {
            return Some(start_offset(doc, line));
        }
        current = line;
    }
    parent.map(|h| start_offset(doc, h))
}

/// Start of the header of the block strictly enclosing the statement at
/// `offset`.
pub fn up_block(doc: &Document, offset: usize) -> Option<usize> {
    let statement = statement_at(doc, offset)?;
    enclosing_header(doc, statement, |_, _| true).map(|h| start_offset(doc, h))
}

/// Start of the next statement, skipping blank and comment lines.
pub fn forward_statement(doc: &Document, offset: usize) -> Option<usize> {
    let line = line_at(doc, offset);
    let next = if is_blank_or_comment(doc, line) && statement_start_line(doc, line) == line {
        next_code_line(doc, line)
    } else {
        next_statement_start(doc, line)
    };
    next.map(|l| start_offset(doc, l))
}

/// Start of the current statement, or of the previous one when already
/// there.
pub fn backward_statement(doc: &Document, offset: usize) -> Option<usize> {
    let statement = statement_at(doc, offset)?;
    let start = start_offset(doc, statement);
    if start < offset {
        return Some(start);
    }
    previous_statement_start(doc, statement).map(|l| start_offset(doc, l))
}

/// Start of the definition containing `offset`, or of the one before it
/// when already there.
pub fn beginning_of_defun(doc: &Document, offset: usize) -> Option<usize> {
    let bounds = defun_bounds(doc, offset)?;
    if bounds.start < offset {
        return Some(bounds.start);
    }
    let buffer = doc.buffer();
    let previous = buffer
        .line_start(buffer.line_of_offset(bounds.start))
        .checked_sub(1)?;
    defun_bounds(doc, previous)
        .map(|b| b.start)
        .filter(|&start| start < bounds.start)
}

/// End of the definition containing `offset`, or of the next one when
/// already at or past that end.
pub fn end_of_defun(doc: &Document, offset: usize) -> Option<usize> {
    if let Some(bounds) = defun_bounds(doc, offset) {
        if bounds.end > offset {
            return Some(bounds.end);
        }
    }
    let mut line = line_at(doc, offset);
    while let Some(next) = next_statement_start(doc, line) {
        if is_defun_header(doc, next) {
            return Some(doc.buffer().line_end(block_end_line(doc, next)));
        }
        line = next;
    }
    None
}

// ============================================================================
// Tests
// ============================================================================
