//! Edits to the indentation of lines and regions.
//!
//! Every operation builds an [`EditSet`] and applies it through
//! [`Document::apply`], so a rejected operation leaves the document
//! untouched.

use tracing::debug;

use tugedit_core::error::EditError;
use tugedit_core::patch::{EditSet, Span, TextEdit};
use tugedit_core::text::indent_string;

use crate::context::IndentStatus;
use crate::dedent::electric_match;
use crate::document::Document;
use crate::indent::indent_report;
use crate::keywords::{is_block_ender, DedentKeyword};

/// The edit replacing the leading whitespace of `line` with `column`
/// columns of indentation.
fn indentation_edit(doc: &Document, line: u32, column: usize) -> TextEdit {
    let buffer = doc.buffer();
    let settings = doc.settings();
    TextEdit::replace(
        Span::new(buffer.line_start(line), buffer.indentation_end(line)),
        indent_string(column, settings.use_tabs, settings.tab_width),
    )
}

fn check_region(doc: &Document, start: u32, end: u32) -> Result<(), EditError> {
    if start > end {
        return Err(EditError::InvalidRegion { start, end });
    }
    doc.check_line(start)?;
    doc.check_line(end)
}

/// Replace the leading whitespace of `line`. Returns whether the text
/// changed.
pub fn set_indentation(doc: &mut Document, line: u32, column: usize) -> Result<bool, EditError> {
    doc.check_line(line)?;
    let edit = indentation_edit(doc, line, column);
    Ok(doc.apply(EditSet::new().with_edit(edit))? > 0)
}

/// Indent every non-blank line in `start..=end` by `count` columns, the
/// indent unit by default. Returns the number of lines changed.
pub fn shift_right(
    doc: &mut Document,
    start: u32,
    end: u32,
    count: Option<usize>,
) -> Result<usize, EditError> {
    check_region(doc, start, end)?;
    let count = count.unwrap_or(doc.indent_unit());
    let buffer = doc.buffer();
    let mut edits = EditSet::new();
    for line in start..=end {
        if !buffer.is_blank(line) {
            edits.push(indentation_edit(doc, line, buffer.indentation(line) + count));
        }
    }
    let changed = doc.apply(edits)?;
    debug!("shifted lines {}-{} right by {}", start, end, count);
    Ok(changed)
}

/// Dedent every non-blank line in `start..=end` by `count` columns, the
/// indent unit by default.
///
/// Fails with [`EditError::ShiftTooFar`], changing nothing, if any line is
/// indented by less than `count`.
pub fn shift_left(
    doc: &mut Document,
    start: u32,
    end: u32,
    count: Option<usize>,
) -> Result<usize, EditError> {
    check_region(doc, start, end)?;
    let count = count.unwrap_or(doc.indent_unit());
    let buffer = doc.buffer();
    let mut edits = EditSet::new();
    for line in start..=end {
        if buffer.is_blank(line) {
            continue;
        }
        let indentation = buffer.indentation(line);
        if indentation < count {
            return Err(EditError::ShiftTooFar {
                line,
                indentation,
                requested: count,
            });
        }
        edits.push(indentation_edit(doc, line, indentation - count));
    }
    let changed = doc.apply(edits)?;
    debug!("shifted lines {}-{} left by {}", start, end, count);
    Ok(changed)
}

/// Re-indent every line in `start..=end`, top to bottom.
///
/// Blank lines and lines that start inside a string are left alone. A line
/// following `return`, `pass`, `raise`, `break` or `continue` keeps its
/// indentation unless that is deeper than the computed one. Returns the
/// number of lines changed.
pub fn indent_region(doc: &mut Document, start: u32, end: u32) -> Result<usize, EditError> {
    check_region(doc, start, end)?;
    let mut changed = 0;
    for line in start..=end {
        if doc.buffer().is_blank(line) || doc.line_start_state(line).in_string.is_some() {
            continue;
        }
        let report = indent_report(doc, line);
        let current = doc.buffer().indentation(line);
        let target = if follows_block_ender(doc, line, report.status) {
            current.min(report.indentation)
        } else {
            report.indentation
        };
        if set_indentation(doc, line, target)? {
            changed += 1;
        }
    }
    debug!("re-indented lines {}-{}: {} changed", start, end, changed);
    Ok(changed)
}

fn follows_block_ender(doc: &Document, line: u32, status: IndentStatus) -> bool {
    let IndentStatus::AfterLine(previous) = status else {
        return false;
    };
    let buffer = doc.buffer();
    is_block_ender(buffer.line_text(buffer.line_of_offset(previous)))
        && DedentKeyword::at_line_start(buffer.line_text(line), &doc.settings().dedent_keywords)
            .is_none()
}

/// Line up a dedent keyword line that has just received its colon with the
/// header it closes. Returns whether the line moved.
pub fn electric_dedent(doc: &mut Document, line: u32) -> Result<bool, EditError> {
    doc.check_line(line)?;
    let Some(header) = electric_match(doc, line) else {
        return Ok(false);
    };
    let column = doc.buffer().indentation_at(header);
    set_indentation(doc, line, column)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Settings;

    mod set_indentation_tests {
        use super::*;

        #[test]
        fn replaces_leading_whitespace() {
            let mut doc = Document::new("if x:\n\t  y = 1\n");
            assert!(set_indentation(&mut doc, 2, 4).unwrap());
            assert_eq!(doc.text(), "if x:\n    y = 1\n");
            assert!(!set_indentation(&mut doc, 2, 4).unwrap());
            assert_eq!(doc.revision(), 1);
        }

        #[test]
        fn writes_tabs_when_configured() {
            let settings = Settings {
                use_tabs: true,
                tab_width: 4,
                ..Settings::default()
            };
            let mut doc = Document::with_settings("x\n", settings);
            set_indentation(&mut doc, 1, 6).unwrap();
            assert_eq!(doc.text(), "\t  x\n");
        }

        #[test]
        fn out_of_range_line() {
            let mut doc = Document::new("x\n");
            let err = set_indentation(&mut doc, 9, 0).unwrap_err();
            assert!(matches!(err, EditError::LineOutOfRange { line: 9, .. }));
        }
    }

    mod shift_tests {
        use super::*;

        const TEXT: &str = "def f():\n    a = 1\n\n    if a:\n        b\n";

        #[test]
        fn shift_right_skips_blank_lines() {
            let mut doc = Document::new(TEXT);
            assert_eq!(shift_right(&mut doc, 2, 5, None).unwrap(), 3);
            assert_eq!(
                doc.text(),
                "def f():\n        a = 1\n\n        if a:\n            b\n"
            );
        }

        #[test]
        fn shift_round_trip() {
            for n in 1..=4 {
                let mut doc = Document::new(TEXT);
                shift_right(&mut doc, 1, 5, Some(n)).unwrap();
                shift_left(&mut doc, 1, 5, Some(n)).unwrap();
                assert_eq!(doc.text(), TEXT, "round trip by {}", n);
            }
        }

        #[test]
        fn over_shifting_left_is_rejected_whole() {
            let mut doc = Document::new(TEXT);
            let err = shift_left(&mut doc, 2, 5, Some(8)).unwrap_err();
            assert!(matches!(
                err,
                EditError::ShiftTooFar {
                    line: 2,
                    indentation: 4,
                    requested: 8
                }
            ));
            assert_eq!(doc.text(), TEXT);
            assert_eq!(doc.revision(), 0);
        }

        #[test]
        fn inverted_region_is_rejected() {
            let mut doc = Document::new(TEXT);
            assert!(matches!(
                shift_right(&mut doc, 4, 2, None),
                Err(EditError::InvalidRegion { start: 4, end: 2 })
            ));
        }
    }

    mod indent_region_tests {
        use super::*;

        #[test]
        fn reindents_flat_code() {
            let mut doc = Document::new("def f():\nx = 1\nif x:\ny = 2\nreturn y\n");
            indent_region(&mut doc, 1, 5).unwrap();
            assert_eq!(
                doc.text(),
                "def f():\n    x = 1\n    if x:\n        y = 2\n        return y\n"
            );
        }

        #[test]
        fn keeps_valid_dedents() {
            let text = "def f():\n    if x:\n        return 1\n    return 2\n";
            let mut doc = Document::new(text);
            assert_eq!(indent_region(&mut doc, 1, 4).unwrap(), 0);
            assert_eq!(doc.text(), text);
        }

        #[test]
        fn over_indented_line_after_return_is_pulled_in() {
            let mut doc = Document::new("def f():\n    return 1\n            x = 2\n");
            assert_eq!(indent_region(&mut doc, 1, 3).unwrap(), 1);
            assert_eq!(doc.buffer().line_text(3), "    x = 2");
        }

        #[test]
        fn string_bodies_are_untouched() {
            let text = "def f():\n  s = '''\n      keep\n'''\n";
            let mut doc = Document::new(text);
            indent_region(&mut doc, 1, 4).unwrap();
            assert_eq!(doc.text(), "def f():\n    s = '''\n      keep\n'''\n");
        }

        #[test]
        fn reindenting_is_idempotent() {
            let text = "class A:\n    def f(self,\n          a):\n        return (a +\n                1)\n";
            let mut doc = Document::new(text);
            indent_region(&mut doc, 1, 5).unwrap();
            let once = doc.text().to_string();
            indent_region(&mut doc, 1, 5).unwrap();
            assert_eq!(doc.text(), once);
        }
    }

    mod electric_tests {
        use super::*;

        #[test]
        fn else_moves_to_its_if() {
            let mut doc = Document::new("if a:\n    if b:\n        x\n        else:\n");
            assert!(electric_dedent(&mut doc, 4).unwrap());
            assert_eq!(doc.buffer().line_text(4), "    else:");
        }

        #[test]
        fn no_match_is_a_noop() {
            let mut doc = Document::new("x = 1\n    else:\n");
            assert!(!electric_dedent(&mut doc, 2).unwrap());
            assert_eq!(doc.revision(), 0);
        }
    }
}
