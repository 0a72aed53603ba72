//! Indentation levels: the equally plausible stops for a line, and cycling
//! among them on repeated indent requests.

use crate::document::Document;
use crate::indent::compute_indentation;

/// Candidate indentations for a line.
///
/// `levels` starts with 0 and is non-decreasing; its last entry is the
/// computed indentation. `current` selects the level that is applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndentLevels {
    levels: Vec<usize>,
    current: usize,
}

impl IndentLevels {
    pub fn levels(&self) -> &[usize] {
        &self.levels
    }

    /// Index of the selected level.
    pub fn current(&self) -> usize {
        self.current
    }

    /// The selected indentation.
    pub fn current_level(&self) -> usize {
        self.levels[self.current]
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    /// The same levels with the next one selected.
    pub fn cycled(&self) -> IndentLevels {
        IndentLevels {
            levels: self.levels.clone(),
            current: cycle(&self.levels, self.current),
        }
    }
}

/// Split `indentation` into stops `0, unit, 2*unit, ...`, plus the exact
/// indentation when it is not a multiple of `unit`. The last stop is
/// selected.
pub fn levels(indentation: usize, indent_unit: usize) -> IndentLevels {
    let mut levels = vec![0];
    if indent_unit == 0 {
        if indentation > 0 {
            levels.push(indentation);
        }
    } else {
        let steps = indentation / indent_unit;
        levels.extend((1..=steps).map(|step| step * indent_unit));
        if indentation % indent_unit != 0 {
            levels.push(indentation);
        }
    }
    let current = levels.len() - 1;
    IndentLevels { levels, current }
}

/// The index after `index`: one level shallower, wrapping from the first
/// level back to the last.
pub fn cycle(levels: &[usize], index: usize) -> usize {
    if levels.is_empty() {
        return 0;
    }
    if index == 0 || index >= levels.len() {
        levels.len() - 1
    } else {
        index - 1
    }
}

/// The indentation levels of `line`.
pub fn indentation_levels(doc: &Document, line: u32, indent_unit: usize) -> IndentLevels {
    levels(compute_indentation(doc, line), indent_unit)
}

/// Cycling state for one line of one document.
///
/// The host keeps the value returned by [`Document::indent_line`] and
/// passes it back on the next request. It is only honored for the same
/// line at the same document revision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndentCycle {
    pub line: u32,
    pub levels: IndentLevels,
    pub revision: u64,
}

// ============================================================================
// Tests
// ============================================================================
