//! Continuation analysis: whether a physical line continues onto the next,
//! and where the logical statement it belongs to starts and ends.

use crate::document::Document;
use crate::keywords::block_keyword;
use crate::lexical::CodeChar;

/// Why a line continues onto the next one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContinuationKind {
    /// A bracket is still open after the line.
    Paren,
    /// A string is still open after the line.
    String,
    /// The line ends in a backslash outside strings and comments.
    Backslash,
    None,
}

/// Assignment operators, longest first.
const ASSIGNMENT_OPERATORS: &[&str] = &[
    "**=", "//=", ">>=", "<<=", "+=", "-=", "*=", "/=", "%=", "&=", "^=", "|=", "@=", "=",
];

/// Every operator a run of operator characters can tokenize into, longest
/// first.
const OPERATORS: &[&str] = &[
    "**=", "//=", ">>=", "<<=", "...", "->", ":=", "==", "!=", "<=", ">=", "+=", "-=", "*=",
    "/=", "%=", "&=", "^=", "|=", "@=", "**", "//", "<<", ">>", "+", "-", "*", "/", "%", "@",
    "&", "|", "^", "~", "<", ">", "=", ":", "!", ".",
];

fn is_operator_char(c: char) -> bool {
    matches!(
        c,
        '=' | '+' | '-' | '*' | '/' | '%' | '<' | '>' | '&' | '^' | '|' | '@' | '!' | ':' | '~' | '.'
    )
}

/// Whether `line` ends in an odd run of backslashes outside strings and
/// comments.
pub fn line_ends_backslash(doc: &Document, line: u32) -> bool {
    let buffer = doc.buffer();
    if !buffer.has_line(line) {
        return false;
    }
    let text = buffer.line_text(line);
    let run = text.bytes().rev().take_while(|&b| b == b'\\').count();
    if run % 2 == 0 {
        return false;
    }
    let last = buffer.line_end(line) - 1;
    doc.lexical_context(last).is_code()
}

/// Why `line` continues onto the next line, checked in the order paren,
/// string, backslash.
pub fn continuation_kind(doc: &Document, line: u32) -> ContinuationKind {
    let buffer = doc.buffer();
    if !buffer.has_line(line) {
        return ContinuationKind::None;
    }
    let after = doc.lexical_context(buffer.next_line_start(line));
    if after.paren_depth() > 0 {
        ContinuationKind::Paren
    } else if after.in_string.is_some() {
        ContinuationKind::String
    } else if line_ends_backslash(doc, line) {
        ContinuationKind::Backslash
    } else {
        ContinuationKind::None
    }
}

pub fn line_continues(doc: &Document, line: u32) -> bool {
    continuation_kind(doc, line) != ContinuationKind::None
}

/// First line of the logical statement containing `line`.
pub fn statement_start_line(doc: &Document, line: u32) -> u32 {
    let mut line = line.clamp(1, doc.line_count());
    while line > 1 && line_continues(doc, line - 1) {
        line -= 1;
    }
    line
}

/// Last line of the logical statement containing `line`.
pub fn statement_end_line(doc: &Document, line: u32) -> u32 {
    let count = doc.line_count();
    let mut line = line.clamp(1, count);
    while line < count && line_continues(doc, line) {
        line += 1;
    }
    line
}

/// For a continuation line, the first non-blank offset of its statement's
/// first line if that line starts with a block keyword.
///
/// The colon is not required: the header may still be mid-edit.
pub fn block_continuation_start(doc: &Document, line: u32) -> Option<usize> {
    let start = statement_start_line(doc, line);
    if start == line {
        return None;
    }
    block_keyword(doc.buffer().line_text(start))?;
    Some(doc.buffer().indentation_end(start))
}

/// For a continuation line, the offset just past the first top-level
/// assignment operator on its statement's first line, skipping whitespace.
///
/// Returns `None` when the statement starts with a block keyword or when the
/// first line has no assignment.
pub fn assignment_continuation_start(doc: &Document, line: u32) -> Option<usize> {
    let start = statement_start_line(doc, line);
    if start == line {
        return None;
    }
    let buffer = doc.buffer();
    let text = buffer.line_text(start);
    if block_keyword(text).is_some() {
        return None;
    }

    let chars: Vec<CodeChar> = doc
        .code_chars(buffer.line_start(start), buffer.line_end(start))
        .collect();
    let end = find_assignment(&chars)?;

    let rest = &buffer.text()[end..buffer.line_end(start)];
    Some(end + (rest.len() - rest.trim_start_matches([' ', '\t']).len()))
}

/// Byte offset just past the first top-level assignment operator.
fn find_assignment(chars: &[CodeChar]) -> Option<usize> {
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        if c.depth != 0 || !is_operator_char(c.ch) {
            i += 1;
            continue;
        }
        // Collect a run of adjacent operator characters.
        let mut j = i + 1;
        while j < chars.len()
            && chars[j].depth == 0
            && is_operator_char(chars[j].ch)
            && chars[j].offset == chars[j - 1].offset + chars[j - 1].ch.len_utf8()
        {
            j += 1;
        }
        let run: String = chars[i..j].iter().map(|c| c.ch).collect();
        let mut pos = 0;
        while pos < run.len() {
            let token = OPERATORS
                .iter()
                .find(|op| run[pos..].starts_with(**op))
                .copied()
                .unwrap_or(&run[pos..pos + 1]);
            if ASSIGNMENT_OPERATORS.contains(&token) {
                return Some(chars[i].offset + pos + token.len());
            }
            pos += token.len();
        }
        i = j;
    }
    None
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    mod kind_tests {
        use super::*;

        #[test]
        fn paren_continuation() {
            let doc = Document::new("foo(1,\n    2)\nx\n");
            assert_eq!(continuation_kind(&doc, 1), ContinuationKind::Paren);
            assert_eq!(continuation_kind(&doc, 2), ContinuationKind::None);
        }

        #[test]
        fn string_continuation() {
            let doc = Document::new("s = '''a\nb'''\n");
            assert_eq!(continuation_kind(&doc, 1), ContinuationKind::String);
            assert!(!line_continues(&doc, 2));
        }

        #[test]
        fn backslash_continuation() {
            let doc = Document::new("x = 1 + \\\n    2\n");
            assert_eq!(continuation_kind(&doc, 1), ContinuationKind::Backslash);
            assert!(line_ends_backslash(&doc, 1));
        }

        #[test]
        fn paren_wins_over_backslash() {
            let doc = Document::new("f(a, \\\n  b)\n");
            assert_eq!(continuation_kind(&doc, 1), ContinuationKind::Paren);
        }

        #[test]
        fn even_backslashes_do_not_continue() {
            let doc = Document::new("x = y \\\\\nz\n");
            assert!(!line_ends_backslash(&doc, 1));
        }

        #[test]
        fn backslash_in_comment_does_not_continue() {
            let doc = Document::new("x = 1  # path\\\ny = 2\n");
            assert!(!line_continues(&doc, 1));
        }

        #[test]
        fn comment_after_open_paren_still_continues() {
            let doc = Document::new("f(  # why\n  a)\n");
            assert_eq!(continuation_kind(&doc, 1), ContinuationKind::Paren);
        }
    }

    mod statement_tests {
        use super::*;

        #[test]
        fn statement_spans_continuations() {
            let doc = Document::new("a = 1\nb = (1,\n     2,\n     3)\nc = 4\n");
            assert_eq!(statement_start_line(&doc, 4), 2);
            assert_eq!(statement_start_line(&doc, 2), 2);
            assert_eq!(statement_end_line(&doc, 2), 4);
            assert_eq!(statement_end_line(&doc, 3), 4);
            assert_eq!(statement_end_line(&doc, 5), 5);
        }

        #[test]
        fn unterminated_bracket_runs_to_eof() {
            let doc = Document::new("x = [\n1,\n2");
            assert_eq!(statement_end_line(&doc, 1), 3);
            assert_eq!(statement_start_line(&doc, 3), 1);
        }
    }

    mod start_tests {
        use super::*;

        #[test]
        fn block_continuation() {
            let doc = Document::new("if a and \\\n   b:\n    pass\n");
            assert_eq!(block_continuation_start(&doc, 2), Some(0));
            assert_eq!(block_continuation_start(&doc, 1), None);
            assert_eq!(block_continuation_start(&doc, 3), None);
        }

        #[test]
        fn block_continuation_without_colon_yet() {
            let doc = Document::new("    while (a and\n");
            assert_eq!(block_continuation_start(&doc, 2), Some(4));
        }

        #[test]
        fn assignment_continuation() {
            let doc = Document::new("total = a + \\\n    b\n");
            assert_eq!(assignment_continuation_start(&doc, 2), Some(8));
        }

        #[test]
        fn augmented_assignment() {
            let doc = Document::new("x //= y + \\\n   z\n");
            assert_eq!(assignment_continuation_start(&doc, 2), Some(6));
        }

        #[test]
        fn comparisons_are_not_assignments() {
            for text in [
                "ok = a == b or \\\n c\n",
                "x <= y and \\\n z\n",
                "y != z or \\\n w\n",
                "(n := 10) > \\\n m\n",
            ] {
                let doc = Document::new(text);
                let expected = text.starts_with("ok").then_some(5);
                assert_eq!(
                    assignment_continuation_start(&doc, 2),
                    expected,
                    "for {:?}",
                    text
                );
            }
        }

        #[test]
        fn assignment_inside_brackets_is_ignored() {
            let doc = Document::new("f(x=1) + \\\n  g\n");
            assert_eq!(assignment_continuation_start(&doc, 2), None);
        }

        #[test]
        fn assignment_inside_string_is_ignored() {
            let doc = Document::new("print('a = b') or \\\n  c\n");
            assert_eq!(assignment_continuation_start(&doc, 2), None);
        }

        #[test]
        fn bare_operator_still_aligns_past_it() {
            let doc = Document::new("x = \\\n    1\n");
            assert_eq!(assignment_continuation_start(&doc, 2), Some(4));
        }

        #[test]
        fn annotated_assignment() {
            let doc = Document::new("x: int = 1 + \\\n  2\n");
            assert_eq!(assignment_continuation_start(&doc, 2), Some(9));
        }

        #[test]
        fn block_headers_are_not_assignments() {
            let doc = Document::new("for x in y == \\\n   z:\n");
            assert_eq!(assignment_continuation_start(&doc, 2), None);
        }
    }
}
