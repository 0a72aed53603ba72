//! The dedent matcher: which block header an `else`, `elif`, `except` or
//! `finally` line closes.

use crate::context::ends_with_colon;
use crate::continuation::{statement_end_line, statement_start_line};
use crate::document::Document;
use crate::keywords::{block_keyword, DedentKeyword};
use crate::navigation::previous_statement_start;

/// The configured dedent keyword `line` starts with.
pub fn dedent_keyword(doc: &Document, line: u32) -> Option<DedentKeyword> {
    if !doc.buffer().has_line(line) || statement_start_line(doc, line) != line {
        return None;
    }
    DedentKeyword::at_line_start(
        doc.buffer().line_text(line),
        &doc.settings().dedent_keywords,
    )
}

fn closes(doc: &Document, keyword: DedentKeyword, header: u32) -> bool {
    block_keyword(doc.buffer().line_text(header))
        .is_some_and(|opener| keyword.closes(opener, doc.settings().chained_handlers))
}

/// Offset of the header that the dedent keyword on `line` closes.
///
/// Statements indented deeper than the keyword line are skipped; the first
/// statement at the same indentation must start with a keyword the dedent
/// keyword may close. Anything else is no match.
pub fn dedent_match(doc: &Document, line: u32) -> Option<usize> {
    let keyword = dedent_keyword(doc, line)?;
    let buffer = doc.buffer();
    let k = buffer.indentation(line);

    let mut current = line;
    while let Some(candidate) = previous_statement_start(doc, current) {
        let indentation = buffer.indentation(candidate);
        if indentation > k {
            current = candidate;
            continue;
        }
        if indentation == k && closes(doc, keyword, candidate) {
            return Some(buffer.indentation_end(candidate));
        }
        return None;
    }
    None
}

/// The header a just-typed dedent keyword line should line up with.
///
/// Unlike [`dedent_match`], the line may still sit at the indentation of
/// the body it follows. Walking back, each statement shallower than every
/// one seen so far is a candidate, and the first header the keyword can
/// close wins. The line must end in a colon.
pub fn electric_match(doc: &Document, line: u32) -> Option<usize> {
    let keyword = dedent_keyword(doc, line)?;
    if !ends_with_colon(doc, line, statement_end_line(doc, line)) {
        return None;
    }
    let buffer = doc.buffer();
    let mut limit = buffer.indentation(line) + 1;
    let mut current = line;
    while let Some(candidate) = previous_statement_start(doc, current) {
        let indentation = buffer.indentation(candidate);
        if indentation < limit {
            if closes(doc, keyword, candidate) {
                return Some(buffer.indentation_end(candidate));
            }
            if indentation == 0 {
                return None;
            }
            limit = indentation;
        }
        current = candidate;
    }
    None
}

// ============================================================================
// Tests
// ============================================================================
