//! Indent-unit detection.

use tracing::trace;

use crate::context::{is_block_header, next_code_line};
use crate::continuation::{statement_end_line, statement_start_line};
use crate::document::Document;

/// Smallest and largest indent unit a guess may produce.
pub const GUESS_RANGE: std::ops::RangeInclusive<usize> = 2..=8;

/// Guess the indent unit of a buffer from its first block whose body is
/// indented by a plausible amount.
pub fn guess_indent_unit(doc: &Document) -> Option<usize> {
    let buffer = doc.buffer();
    let mut line = 1;
    while line <= doc.line_count() {
        let end = statement_end_line(doc, line);
        if statement_start_line(doc, line) == line
            && doc.line_start_state(line).in_string.is_none()
            && is_block_header(doc, line)
        {
            if let Some(body) = next_code_line(doc, end) {
                let header = buffer.indentation(line);
                let delta = buffer.indentation(body).saturating_sub(header);
                if GUESS_RANGE.contains(&delta) {
                    return Some(delta);
                }
                trace!("line {}: body offset {} discarded", line, delta);
            }
        }
        line = end + 1;
    }
    None
}

// ============================================================================
// Tests
// ============================================================================
