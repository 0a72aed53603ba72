//! Core infrastructure for tugedit: text buffers, edits, configuration,
//! errors and JSON output.
//!
//! Nothing in this crate knows about Python. The language engine lives in
//! `tugedit-python` and builds on these types.

pub mod config;
pub mod error;
pub mod output;
pub mod patch;
pub mod text;
