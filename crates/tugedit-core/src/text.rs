//! Source buffers and line/column addressing.
//!
//! [`SourceBuffer`] owns the text of one file together with a line-start
//! index, so every line lookup is a binary search instead of a rescan.
//!
//! ## Coordinate Conventions
//!
//! - Byte offsets are **0-indexed**
//! - Lines are **1-indexed** (matching editor conventions)
//! - Line values of 0 are treated as 1, values past the last line are
//!   clamped to the last line
//! - Positions reported by [`SourceBuffer::position`] use 1-indexed columns
//!   counting Unicode scalar values
//! - Indentation widths and display columns ([`SourceBuffer::indentation`],
//!   [`SourceBuffer::column`]) are **0-based** and expand tabs to the
//!   buffer's tab width
//!
//! A trailing newline produces a final empty line: `"a\n"` has two lines.
//! Lines end before `"\n"` or `"\r\n"`.

use crate::patch::Span;

/// Tab width used when none is configured.
pub const DEFAULT_TAB_WIDTH: usize = 8;

/// An immutable snapshot of source text with a line index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceBuffer {
    text: String,
    line_starts: Vec<usize>,
    tab_width: usize,
}

impl SourceBuffer {
    /// Create a buffer with the default tab width.
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        let line_starts = compute_line_starts(&text);
        SourceBuffer {
            text,
            line_starts,
            tab_width: DEFAULT_TAB_WIDTH,
        }
    }

    /// Set the tab width used for display columns. Zero is treated as one.
    pub fn with_tab_width(mut self, tab_width: usize) -> Self {
        self.tab_width = tab_width.max(1);
        self
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn tab_width(&self) -> usize {
        self.tab_width
    }

    /// Number of lines, counting the empty line after a trailing newline.
    pub fn line_count(&self) -> u32 {
        self.line_starts.len() as u32
    }

    /// Check whether a 1-indexed line exists.
    pub fn has_line(&self, line: u32) -> bool {
        line >= 1 && line <= self.line_count()
    }

    fn index(&self, line: u32) -> usize {
        (line.max(1) as usize - 1).min(self.line_starts.len() - 1)
    }

    /// Byte offset of the first character of `line`.
    pub fn line_start(&self, line: u32) -> usize {
        self.line_starts[self.index(line)]
    }

    /// Byte offset just past the last character of `line`, excluding the
    /// line terminator.
    pub fn line_end(&self, line: u32) -> usize {
        let idx = self.index(line);
        match self.line_starts.get(idx + 1) {
            Some(&next) => {
                let newline = next - 1;
                if newline > self.line_starts[idx] && self.text.as_bytes()[newline - 1] == b'\r' {
                    newline - 1
                } else {
                    newline
                }
            }
            None => self.text.len(),
        }
    }

    /// Byte offset where the line after `line` starts, or the buffer length
    /// for the last line.
    pub fn next_line_start(&self, line: u32) -> usize {
        self.line_starts
            .get(self.index(line) + 1)
            .copied()
            .unwrap_or(self.text.len())
    }

    /// Text of `line` without its terminator.
    pub fn line_text(&self, line: u32) -> &str {
        &self.text[self.line_start(line)..self.line_end(line)]
    }

    /// The 1-indexed line containing `offset`. Offsets past the end map to
    /// the last line.
    pub fn line_of_offset(&self, offset: usize) -> u32 {
        self.line_starts.partition_point(|&start| start <= offset) as u32
    }

    /// Byte offset of the first non-whitespace character of `line`, or the
    /// line end for blank lines.
    pub fn indentation_end(&self, line: u32) -> usize {
        let start = self.line_start(line);
        start + leading_whitespace_len(self.line_text(line))
    }

    /// Indentation width of `line` in display columns.
    pub fn indentation(&self, line: u32) -> usize {
        let text = self.line_text(line);
        display_width(&text[..leading_whitespace_len(text)], self.tab_width)
    }

    /// Indentation width of the line containing `offset`.
    pub fn indentation_at(&self, offset: usize) -> usize {
        self.indentation(self.line_of_offset(offset))
    }

    /// Display column of `offset` within its line.
    pub fn column(&self, offset: usize) -> usize {
        let offset = self.floor_char_boundary(offset);
        let start = self.line_start(self.line_of_offset(offset));
        display_width(&self.text[start..offset], self.tab_width)
    }

    /// Whether `line` contains only whitespace.
    pub fn is_blank(&self, line: u32) -> bool {
        self.line_text(line).trim().is_empty()
    }

    /// Convert a byte offset to a 1-indexed `(line, col)` position.
    ///
    /// Columns count Unicode scalar values, not bytes.
    pub fn position(&self, offset: usize) -> (u32, u32) {
        let offset = self.floor_char_boundary(offset);
        let line = self.line_of_offset(offset);
        let start = self.line_start(line);
        let col = self.text[start..offset].chars().count() as u32 + 1;
        (line, col)
    }

    /// Convert a 1-indexed `(line, col)` position to a byte offset.
    ///
    /// Columns count Unicode scalar values. Columns past the end of the line
    /// clamp to the line end.
    pub fn offset_at(&self, line: u32, col: u32) -> usize {
        let start = self.line_start(line);
        let end = self.line_end(line);
        let skip = (col.max(1) - 1) as usize;
        self.text[start..end]
            .char_indices()
            .nth(skip)
            .map(|(i, _)| start + i)
            .unwrap_or(end)
    }

    /// Extract the text covered by `span`.
    ///
    /// Returns `None` if the span is out of bounds or splits a character.
    pub fn slice(&self, span: Span) -> Option<&str> {
        self.text.get(span.start..span.end)
    }

    /// Largest char boundary at or before `offset`, clamped to the buffer.
    pub fn floor_char_boundary(&self, offset: usize) -> usize {
        let mut offset = offset.min(self.text.len());
        while !self.text.is_char_boundary(offset) {
            offset -= 1;
        }
        offset
    }

    /// Replace the text covered by `span` and rebuild the line index.
    ///
    /// The caller is responsible for validating the span.
    pub(crate) fn splice(&mut self, span: Span, replacement: &str) {
        self.text.replace_range(span.start..span.end, replacement);
        self.line_starts = compute_line_starts(&self.text);
    }
}

fn compute_line_starts(text: &str) -> Vec<usize> {
    let mut starts = vec![0];
    starts.extend(
        text.bytes()
            .enumerate()
            .filter(|&(_, b)| b == b'\n')
            .map(|(i, _)| i + 1),
    );
    starts
}

// ============================================================================
// Whitespace Utilities
// ============================================================================

/// Length in bytes of the leading spaces, tabs and form feeds of `text`.
pub fn leading_whitespace_len(text: &str) -> usize {
    text.len() - text.trim_start_matches([' ', '\t', '\x0c']).len()
}

/// Display width of `text`, expanding tabs to the next multiple of
/// `tab_width`.
pub fn display_width(text: &str, tab_width: usize) -> usize {
    let tab_width = tab_width.max(1);
    text.chars().fold(0, |width, ch| match ch {
        '\t' => (width / tab_width + 1) * tab_width,
        '\x0c' => width,
        _ => width + 1,
    })
}

/// Build leading whitespace that is `width` columns wide.
///
/// With `use_tabs`, as many tabs as fit are used and the remainder is
/// padded with spaces.
pub fn indent_string(width: usize, use_tabs: bool, tab_width: usize) -> String {
    if use_tabs && tab_width > 0 {
        let mut indent = "\t".repeat(width / tab_width);
        indent.push_str(&" ".repeat(width % tab_width));
        indent
    } else {
        " ".repeat(width)
    }
}

// ============================================================================
// Tests
// ============================================================================
