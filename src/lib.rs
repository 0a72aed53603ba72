//! tugedit: Python indentation and structural navigation for editors.
//!
//! The engine answers the questions an editing mode asks on every
//! keystroke: what indentation a line should have, whether an offset sits
//! in a string or comment, where the enclosing block or definition begins
//! and ends, and which header an `else` closes. It works on raw text and
//! never fails on malformed or half-typed Python.

// Core infrastructure - re-exported from tugedit-core
pub use tugedit_core::config;
pub use tugedit_core::error;
pub use tugedit_core::output;
pub use tugedit_core::patch;
pub use tugedit_core::text;

// Language engine
pub use tugedit_python as python;
pub use tugedit_python::{
    block_bounds, compute_indentation, cycle, dedent_match, defun_bounds, enclosing_defun_path,
    indentation_levels, lexical_context, statement_bounds, Document, IndentLevels, IndentStatus,
    LexicalState, Settings, Span,
};

// Front door
pub mod cli;
