//! Spans and atomic text edits.
//!
//! Every mutation the engine performs on a buffer (setting a line's
//! indentation, shifting or re-indenting a region) is expressed as an
//! [`EditSet`] and applied all-or-nothing:
//! - Overlapping edits are detected before anything is touched
//! - Out-of-bounds spans and spans that split a character are rejected
//! - Edits are applied in reverse offset order so spans stay valid

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::EditError;
use crate::text::SourceBuffer;

// ============================================================================
// Core Types
// ============================================================================

/// Byte range within a buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Span {
    /// Start byte offset (inclusive).
    pub start: usize,
    /// End byte offset (exclusive).
    pub end: usize,
}

impl Span {
    /// Create a new span.
    ///
    /// # Panics
    /// Panics if `start > end`.
    pub fn new(start: usize, end: usize) -> Self {
        assert!(
            start <= end,
            "Span start ({}) must be <= end ({})",
            start,
            end
        );
        Span { start, end }
    }

    /// Length of the span in bytes.
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    /// Check if span is empty.
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Check if this span overlaps with another.
    ///
    /// Adjacent spans (one ends where another starts) do NOT overlap, but an
    /// empty span sitting at the same offset as another edit's start does.
    pub fn overlaps(&self, other: &Span) -> bool {
        if self.start == other.start {
            return true;
        }
        self.start < other.end && other.start < self.end
    }

    /// Check if this span contains an offset.
    pub fn contains_offset(&self, offset: usize) -> bool {
        self.start <= offset && offset < self.end
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.start, self.end)
    }
}

/// Replace the text in `span` with `text`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextEdit {
    pub span: Span,
    pub text: String,
}

impl TextEdit {
    pub fn replace(span: Span, text: impl Into<String>) -> Self {
        TextEdit {
            span,
            text: text.into(),
        }
    }

    pub fn insert(offset: usize, text: impl Into<String>) -> Self {
        Self::replace(Span::new(offset, offset), text)
    }

    pub fn delete(span: Span) -> Self {
        Self::replace(span, "")
    }

    /// Whether applying the edit leaves the buffer unchanged.
    pub fn is_noop(&self, buffer: &SourceBuffer) -> bool {
        buffer.slice(self.span) == Some(self.text.as_str())
    }
}

/// An ordered collection of edits applied as one transaction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EditSet {
    edits: Vec<TextEdit>,
}

impl EditSet {
    pub fn new() -> Self {
        EditSet::default()
    }

    /// Add an edit (builder style).
    pub fn with_edit(mut self, edit: TextEdit) -> Self {
        self.edits.push(edit);
        self
    }

    pub fn push(&mut self, edit: TextEdit) {
        self.edits.push(edit);
    }

    pub fn edits(&self) -> &[TextEdit] {
        &self.edits
    }

    pub fn is_empty(&self) -> bool {
        self.edits.is_empty()
    }

    pub fn len(&self) -> usize {
        self.edits.len()
    }

    /// Smallest start offset touched by any edit.
    pub fn first_offset(&self) -> Option<usize> {
        self.edits.iter().map(|e| e.span.start).min()
    }

    /// Drop edits that would not change `buffer`.
    pub fn without_noops(self, buffer: &SourceBuffer) -> Self {
        EditSet {
            edits: self
                .edits
                .into_iter()
                .filter(|e| !e.is_noop(buffer))
                .collect(),
        }
    }

    /// Return the first pair of overlapping spans, if any.
    pub fn detect_conflict(&self) -> Option<(Span, Span)> {
        let mut spans: Vec<Span> = self.edits.iter().map(|e| e.span).collect();
        spans.sort_by_key(|s| (s.start, s.end));
        spans
            .windows(2)
            .find(|pair| pair[0].overlaps(&pair[1]))
            .map(|pair| (pair[0], pair[1]))
    }

    /// Validate every edit against `buffer` without applying anything.
    pub fn validate(&self, buffer: &SourceBuffer) -> Result<(), EditError> {
        for edit in &self.edits {
            if buffer.slice(edit.span).is_none() {
                return Err(EditError::SpanOutOfBounds {
                    span: edit.span,
                    len: buffer.len(),
                });
            }
        }
        if let Some((first, second)) = self.detect_conflict() {
            return Err(EditError::OverlappingEdits { first, second });
        }
        Ok(())
    }

    /// Apply all edits to `buffer` atomically.
    ///
    /// Either every edit applies, or the buffer is left untouched.
    pub fn apply(&self, buffer: &mut SourceBuffer) -> Result<(), EditError> {
        self.validate(buffer)?;

        let mut ordered: Vec<&TextEdit> = self.edits.iter().collect();
        // Apply from end to start to preserve offsets
        ordered.sort_by(|a, b| b.span.start.cmp(&a.span.start));
        for edit in ordered {
            buffer.splice(edit.span, &edit.text);
        }
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    mod span_tests {
        use super::*;

        #[test]
        fn adjacent_spans_do_not_overlap() {
            assert!(!Span::new(0, 4).overlaps(&Span::new(4, 8)));
            assert!(Span::new(0, 5).overlaps(&Span::new(4, 8)));
        }

        #[test]
        fn inserts_at_same_offset_conflict() {
            assert!(Span::new(3, 3).overlaps(&Span::new(3, 3)));
            assert!(Span::new(3, 3).overlaps(&Span::new(3, 6)));
        }

        #[test]
        #[should_panic(expected = "must be <= end")]
        fn inverted_span_panics() {
            let _ = Span::new(5, 2);
        }

        #[test]
        fn display() {
            assert_eq!(Span::new(1, 4).to_string(), "[1, 4)");
        }
    }

    mod apply_tests {
        use super::*;

        #[test]
        fn edits_apply_in_reverse_order() {
            let mut buffer = SourceBuffer::new("a\nb\nc\n");
            let edits = EditSet::new()
                .with_edit(TextEdit::insert(0, "    "))
                .with_edit(TextEdit::insert(4, "    "));
            edits.apply(&mut buffer).expect("apply");
            assert_eq!(buffer.text(), "    a\nb\n    c\n");
        }

        #[test]
        fn overlapping_edits_leave_buffer_untouched() {
            let mut buffer = SourceBuffer::new("hello world");
            let edits = EditSet::new()
                .with_edit(TextEdit::replace(Span::new(0, 5), "HELLO"))
                .with_edit(TextEdit::replace(Span::new(3, 8), "x"));
            let err = edits.apply(&mut buffer).unwrap_err();
            assert!(matches!(err, EditError::OverlappingEdits { .. }));
            assert_eq!(buffer.text(), "hello world");
        }

        #[test]
        fn out_of_bounds_is_rejected() {
            let mut buffer = SourceBuffer::new("short");
            let edits = EditSet::new().with_edit(TextEdit::delete(Span::new(2, 50)));
            let err = edits.apply(&mut buffer).unwrap_err();
            assert!(matches!(err, EditError::SpanOutOfBounds { len: 5, .. }));
        }

        #[test]
        fn noops_are_dropped() {
            let buffer = SourceBuffer::new("    x\n");
            let edits = EditSet::new()
                .with_edit(TextEdit::replace(Span::new(0, 4), "    "))
                .without_noops(&buffer);
            assert!(edits.is_empty());
        }
    }
}
