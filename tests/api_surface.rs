//! Compile-only test to verify public API surface.
//!
//! This file serves as a compile-time contract for the public API.
//! If this file fails to compile, the public API has regressed.
//!
//! Run with: cargo test -- api_surface

// Allow unused imports - this test is about compile-time verification, not runtime usage
#![allow(unused_imports)]

// ============================================================================
// Core Infrastructure Types
// ============================================================================

use tugedit::config::{find_config_file, DedentConfig, EditConfig, IndentConfig, CONFIG_DIR};
use tugedit::error::{ConfigError, EditError, OutputErrorCode, TugEditError, TugEditResult};
use tugedit::output::{
    emit_response, emit_response_compact, BoundsResponse, ContextResponse, DedentMatchResponse,
    DefunPathResponse, ErrorInfo, ErrorResponse, GuessIndentResponse, IndentResponse,
    LevelsResponse, MotionResponse, Position, Range, RegionEditResponse, StringInfo,
    SCHEMA_VERSION,
};
use tugedit::patch::{EditSet, Span, TextEdit};
use tugedit::text::{display_width, indent_string, SourceBuffer, DEFAULT_TAB_WIDTH};

// ============================================================================
// Python Engine
// ============================================================================

use tugedit::python::continuation::{continuation_kind, line_continues, ContinuationKind};
use tugedit::python::dedent::{dedent_keyword, electric_match};
use tugedit::python::detect::guess_indent_unit;
use tugedit::python::keywords::{block_keyword, defun_name, DedentKeyword};
use tugedit::python::lexical::{classify, CodeChar, CodeChars, OpenString, ScanCache, Scanner};
use tugedit::python::navigation::{
    backward_block, backward_statement, beginning_of_defun, end_of_defun, forward_block,
    forward_statement, up_block,
};
use tugedit::python::region::{
    electric_dedent, indent_region, set_indentation, shift_left, shift_right,
};
use tugedit::{
    block_bounds, compute_indentation, cycle, dedent_match, defun_bounds, enclosing_defun_path,
    indentation_levels, lexical_context, statement_bounds, Document, IndentLevels, IndentStatus,
    LexicalState, Settings,
};

// ============================================================================
// Front Door
// ============================================================================

use tugedit::cli::{
    load_config, open_document, parse_location, run_bounds, run_context, run_dedent_match,
    run_defun_path, run_electric, run_guess_indent, run_indent, run_levels, run_move,
    run_reindent, run_shift, BoundsKind, EditOptions, Motion,
};

#[test]
fn api_surface_compiles() {
    let doc = Document::new("def f():\n    pass\n");
    assert_eq!(compute_indentation(&doc, 2), 4);
    assert_eq!(enclosing_defun_path(&doc, 14), vec!["f"]);
}
