//! Indentation context: which rule decides the indentation of a line, and
//! the anchor offset that rule measures from.

use std::fmt;

use crate::continuation::{line_ends_backslash, statement_end_line, statement_start_line};
use crate::document::Document;
use crate::keywords::block_keyword;

/// The indentation status of a line. Each anchor is a byte offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndentStatus {
    /// First line of the buffer, or nothing but blank and comment lines
    /// above.
    NoIndent,
    /// Inside brackets; anchored on the innermost open bracket.
    InsideParen(usize),
    /// Inside a string; anchored on the string start.
    InsideString(usize),
    /// After a backslash continuation; anchored on the previous line.
    AfterBackslash(usize),
    /// First line of a block body; anchored on the header.
    AfterBeginningOfBlock(usize),
    /// Anything else; anchored on the previous statement.
    AfterLine(usize),
}

impl IndentStatus {
    pub fn name(&self) -> &'static str {
        match self {
            IndentStatus::NoIndent => "no_indent",
            IndentStatus::InsideParen(_) => "inside_paren",
            IndentStatus::InsideString(_) => "inside_string",
            IndentStatus::AfterBackslash(_) => "after_backslash",
            IndentStatus::AfterBeginningOfBlock(_) => "after_beginning_of_block",
            IndentStatus::AfterLine(_) => "after_line",
        }
    }

    pub fn anchor(&self) -> Option<usize> {
        match *self {
            IndentStatus::NoIndent => None,
            IndentStatus::InsideParen(a)
            | IndentStatus::InsideString(a)
            | IndentStatus::AfterBackslash(a)
            | IndentStatus::AfterBeginningOfBlock(a)
            | IndentStatus::AfterLine(a) => Some(a),
        }
    }
}

impl fmt::Display for IndentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.anchor() {
            Some(anchor) => write!(f, "{}@{}", self.name(), anchor),
            None => f.write_str(self.name()),
        }
    }
}

/// Classify `line`. Rules are tried in a fixed order; the first that
/// applies wins.
pub fn indent_context(doc: &Document, line: u32) -> IndentStatus {
    let buffer = doc.buffer();
    let line = line.clamp(1, doc.line_count());
    if line == 1 {
        return IndentStatus::NoIndent;
    }

    let state = doc.line_start_state(line);
    if let Some(open) = state.innermost_paren() {
        return IndentStatus::InsideParen(open);
    }
    if let Some(string) = state.in_string {
        return IndentStatus::InsideString(string.start);
    }
    if line_ends_backslash(doc, line - 1) {
        return IndentStatus::AfterBackslash(buffer.line_start(line - 1));
    }

    let Some(previous) = previous_code_line(doc, line) else {
        return IndentStatus::NoIndent;
    };
    let start = statement_start_line(doc, previous);
    let anchor = buffer.indentation_end(start);
    if is_block_header(doc, start) {
        IndentStatus::AfterBeginningOfBlock(anchor)
    } else {
        IndentStatus::AfterLine(anchor)
    }
}

/// Whether `line` is blank or holds only a comment. Lines starting inside a
/// string are neither.
pub fn is_blank_or_comment(doc: &Document, line: u32) -> bool {
    let text = doc.buffer().line_text(line).trim_start();
    if !text.is_empty() && !text.starts_with('#') {
        return false;
    }
    doc.line_start_state(line).in_string.is_none()
}

/// Nearest line above `line` that is not blank or comment-only.
pub fn previous_code_line(doc: &Document, line: u32) -> Option<u32> {
    (1..line).rev().find(|&l| !is_blank_or_comment(doc, l))
}

/// Nearest line below `line` that is not blank or comment-only.
pub fn next_code_line(doc: &Document, line: u32) -> Option<u32> {
    (line + 1..=doc.line_count()).find(|&l| !is_blank_or_comment(doc, l))
}

/// Whether the last code character of lines `start..=end` is a colon at
/// the bracket depth of `start`.
pub fn ends_with_colon(doc: &Document, start: u32, end: u32) -> bool {
    let buffer = doc.buffer();
    doc.code_chars(buffer.line_start(start), buffer.line_end(end))
        .filter(|c| !c.ch.is_whitespace() && c.ch != '\\')
        .last()
        .is_some_and(|c| c.ch == ':' && c.depth == 0)
}

/// Whether the statement containing `line` is a block header: it starts
/// with a block keyword and its last code character is a colon.
pub fn is_block_header(doc: &Document, line: u32) -> bool {
    let start = statement_start_line(doc, line);
    if block_keyword(doc.buffer().line_text(start)).is_none() {
        return false;
    }
    ends_with_colon(doc, start, statement_end_line(doc, start))
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn status(text: &str, line: u32) -> IndentStatus {
        indent_context(&Document::new(text), line)
    }

    #[test]
    fn first_line_has_no_indent() {
        assert_eq!(status("    x = 1\n", 1), IndentStatus::NoIndent);
    }

    #[test]
    fn only_comments_above_is_no_indent() {
        assert_eq!(status("# header\n\nx = 1\n", 3), IndentStatus::NoIndent);
    }

    #[test]
    fn inside_paren_anchors_innermost_bracket() {
        assert_eq!(status("foo(a, [1,\n", 2), IndentStatus::InsideParen(7));
    }

    #[test]
    fn inside_string_anchors_string_start() {
        assert_eq!(status("x = f'''abc\n", 2), IndentStatus::InsideString(4));
    }

    #[test]
    fn colon_inside_unterminated_string_is_still_a_string() {
        assert_eq!(
            status("s = '''\nif x:\n", 3),
            IndentStatus::InsideString(4)
        );
    }

    #[test]
    fn after_backslash_anchors_previous_line() {
        assert_eq!(status("a = 1\nx = 2 + \\\n", 3), IndentStatus::AfterBackslash(6));
    }

    #[test]
    fn after_block_header() {
        assert_eq!(
            status("def f():\n    if x:  # note\n\n", 3),
            IndentStatus::AfterBeginningOfBlock(13)
        );
    }

    #[test]
    fn multi_line_header_anchors_first_line() {
        let text = "if (a and\n        b):\n";
        assert_eq!(status(text, 3), IndentStatus::AfterBeginningOfBlock(0));
    }

    #[test]
    fn header_without_colon_is_a_plain_line() {
        assert_eq!(status("if x\n", 2), IndentStatus::AfterLine(0));
    }

    #[test]
    fn after_line_anchors_statement_start() {
        let text = "def f():\n    x = g(1,\n          2)\n\n    # c\n";
        assert_eq!(status(text, 6), IndentStatus::AfterLine(13));
    }

    #[test]
    fn names_and_display() {
        assert_eq!(IndentStatus::InsideParen(3).name(), "inside_paren");
        assert_eq!(IndentStatus::AfterLine(7).to_string(), "after_line@7");
        assert_eq!(IndentStatus::NoIndent.anchor(), None);
    }

    #[test]
    fn colon_detection_ignores_comments_and_strings() {
        let doc = Document::new("if x:  # y\nd = {'a:'\nz = x[1:\n");
        assert!(ends_with_colon(&doc, 1, 1));
        assert!(!ends_with_colon(&doc, 2, 2));
        assert!(!ends_with_colon(&doc, 3, 3));
    }
}
