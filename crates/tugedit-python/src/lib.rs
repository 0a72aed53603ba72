//! Python language support for tugedit.
//!
//! This crate answers the questions a Python editing mode asks about a
//! buffer, without parsing it:
//! - Lexical context: string, comment and bracket nesting at any offset
//! - Indentation: the column a line should have, and the levels to cycle
//!   through on repeated indent requests
//! - Navigation: statement, block and definition bounds and movement
//! - Dedent matching for `else`, `elif`, `except` and `finally`
//! - Region edits: shifting, re-indenting and electric dedent
//!
//! Everything hangs off a [`Document`], which owns the text, the settings
//! and a scan cache that keeps queries on large buffers cheap. Malformed
//! Python is never an error; queries without an answer return `None`.

pub mod context;
pub mod continuation;
pub mod dedent;
pub mod detect;
pub mod document;
pub mod indent;
pub mod keywords;
pub mod levels;
pub mod lexical;
pub mod navigation;
pub mod region;

#[cfg(test)]
mod test_helpers;

pub use context::{indent_context, IndentStatus};
pub use dedent::dedent_match;
pub use detect::guess_indent_unit;
pub use document::{Document, Settings};
pub use indent::{compute_indentation, IndentReport};
pub use keywords::DedentKeyword;
pub use levels::{cycle, indentation_levels, IndentCycle, IndentLevels};
pub use lexical::{lexical_context, LexicalState, OpenString};
pub use navigation::{block_bounds, defun_bounds, enclosing_defun_path, statement_bounds};
pub use tugedit_core::patch::Span;
