//! The document: a source buffer, its settings and its scan cache.
//!
//! Every engine query takes a `&Document`. Queries share the scan cache
//! through a `RefCell`, so a `Document` must not be shared across threads;
//! the host serializes calls. Edits go through `&mut Document`, which drops
//! stale checkpoints and bumps the revision counter.

use std::cell::RefCell;

use tracing::debug;

use tugedit_core::config::EditConfig;
use tugedit_core::error::{ConfigError, EditError};
use tugedit_core::patch::{EditSet, Span};
use tugedit_core::text::{SourceBuffer, DEFAULT_TAB_WIDTH};

use crate::context::{self, IndentStatus};
use crate::detect;
use crate::keywords::DedentKeyword;
use crate::lexical::{CodeChars, LexicalState, ScanCache, Scanner};
use crate::levels::{self, IndentCycle, IndentLevels};
use crate::{dedent, indent, navigation, region};

// ============================================================================
// Settings
// ============================================================================

/// Buffer-scoped engine settings, validated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Columns per indentation level, always > 0.
    pub indent_unit: usize,
    pub tab_width: usize,
    pub use_tabs: bool,
    pub dedent_keywords: Vec<DedentKeyword>,
    pub chained_handlers: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            indent_unit: 4,
            tab_width: DEFAULT_TAB_WIDTH,
            use_tabs: false,
            dedent_keywords: DedentKeyword::ALL.to_vec(),
            chained_handlers: false,
        }
    }
}

impl TryFrom<&EditConfig> for Settings {
    type Error = ConfigError;

    fn try_from(config: &EditConfig) -> Result<Self, Self::Error> {
        let dedent_keywords = config
            .dedent
            .keywords
            .iter()
            .map(|k| k.parse())
            .collect::<Result<Vec<DedentKeyword>, _>>()?;
        Ok(Settings {
            indent_unit: config.indent.unit()?,
            tab_width: config.indent.tab_width()?,
            use_tabs: config.indent.use_tabs,
            dedent_keywords,
            chained_handlers: config.dedent.chained_handlers,
        })
    }
}

// ============================================================================
// Document
// ============================================================================

/// A Python source buffer under edit.
#[derive(Debug)]
pub struct Document {
    buffer: SourceBuffer,
    settings: Settings,
    cache: RefCell<ScanCache>,
    revision: u64,
}

impl Document {
    /// A document with default settings. The indent unit is not guessed.
    pub fn new(text: impl Into<String>) -> Self {
        Self::with_settings(text, Settings::default())
    }

    pub fn with_settings(text: impl Into<String>, settings: Settings) -> Self {
        Document {
            buffer: SourceBuffer::new(text).with_tab_width(settings.tab_width),
            settings,
            cache: RefCell::new(ScanCache::new()),
            revision: 0,
        }
    }

    /// A document configured from `config`.
    ///
    /// When `indent.guess_indent` is set, the indent unit is taken from the
    /// first block in the text, falling back to the configured unit.
    pub fn with_config(text: impl Into<String>, config: &EditConfig) -> Result<Self, ConfigError> {
        let mut doc = Self::with_settings(text, Settings::try_from(config)?);
        if config.indent.guess_indent {
            match detect::guess_indent_unit(&doc) {
                Some(unit) => {
                    debug!("guessed indent unit {}", unit);
                    doc.settings.indent_unit = unit;
                }
                None => debug!(
                    "no indent unit detected, using {}",
                    doc.settings.indent_unit
                ),
            }
        }
        Ok(doc)
    }

    pub fn buffer(&self) -> &SourceBuffer {
        &self.buffer
    }

    pub fn text(&self) -> &str {
        self.buffer.text()
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn indent_unit(&self) -> usize {
        self.settings.indent_unit
    }

    /// Change the indent unit. Zero is rejected.
    pub fn set_indent_unit(&mut self, unit: usize) -> Result<(), ConfigError> {
        if unit == 0 {
            return Err(ConfigError::InvalidIndentUnit(0));
        }
        self.settings.indent_unit = unit;
        Ok(())
    }

    /// Counter bumped by every applied edit.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn line_count(&self) -> u32 {
        self.buffer.line_count()
    }

    /// Check that `line` exists.
    pub fn check_line(&self, line: u32) -> Result<(), EditError> {
        if self.buffer.has_line(line) {
            Ok(())
        } else {
            Err(EditError::LineOutOfRange {
                line,
                line_count: self.buffer.line_count(),
            })
        }
    }

    /// Apply an edit set atomically.
    ///
    /// Edits that would not change the text are dropped first; if nothing
    /// remains the revision is left alone.
    pub fn apply(&mut self, edits: EditSet) -> Result<usize, EditError> {
        let edits = edits.without_noops(&self.buffer);
        if edits.is_empty() {
            return Ok(0);
        }
        edits.apply(&mut self.buffer)?;
        if let Some(first) = edits.first_offset() {
            self.cache.get_mut().invalidate_from(first);
        }
        self.revision += 1;
        Ok(edits.len())
    }

    // ------------------------------------------------------------------------
    // Lexical access
    // ------------------------------------------------------------------------

    /// Lexical state before the character at `offset`.
    pub fn lexical_context(&self, offset: usize) -> LexicalState {
        self.cache.borrow_mut().classify(&self.buffer, offset)
    }

    /// Lexical state at the start of `line`.
    pub fn line_start_state(&self, line: u32) -> LexicalState {
        self.lexical_context(self.buffer.line_start(line))
    }

    pub(crate) fn scanner_at(&self, offset: usize) -> Scanner {
        self.cache.borrow_mut().scanner_at(&self.buffer, offset)
    }

    /// Code characters in `[start, end)`.
    pub fn code_chars(&self, start: usize, end: usize) -> CodeChars<'_> {
        CodeChars::new(self.buffer.text(), self.scanner_at(start), end)
    }

    // ------------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------------

    pub fn indent_context(&self, line: u32) -> IndentStatus {
        context::indent_context(self, line)
    }

    pub fn compute_indentation(&self, line: u32) -> usize {
        indent::compute_indentation(self, line)
    }

    pub fn indentation_levels(&self, line: u32) -> IndentLevels {
        levels::indentation_levels(self, line, self.indent_unit())
    }

    pub fn statement_bounds(&self, offset: usize) -> Span {
        navigation::statement_bounds(self, offset)
    }

    pub fn block_bounds(&self, offset: usize) -> Option<Span> {
        navigation::block_bounds(self, offset)
    }

    pub fn defun_bounds(&self, offset: usize) -> Option<Span> {
        navigation::defun_bounds(self, offset)
    }

    pub fn enclosing_defun_path(&self, offset: usize) -> Vec<String> {
        navigation::enclosing_defun_path(self, offset)
    }

    pub fn dedent_match(&self, line: u32) -> Option<usize> {
        dedent::dedent_match(self, line)
    }

    // ------------------------------------------------------------------------
    // Edits
    // ------------------------------------------------------------------------

    /// Indent `line`, cycling through its levels on repeated requests.
    ///
    /// `previous` is the value returned by the last call. It cycles only if
    /// it was for the same line and nothing has edited the document since;
    /// otherwise the levels are recomputed and the natural indentation is
    /// applied.
    pub fn indent_line(
        &mut self,
        line: u32,
        previous: Option<&IndentCycle>,
    ) -> Result<IndentCycle, EditError> {
        self.check_line(line)?;
        let levels = match previous {
            Some(prev) if prev.line == line && prev.revision == self.revision => {
                prev.levels.cycled()
            }
            _ => self.indentation_levels(line),
        };
        region::set_indentation(self, line, levels.current_level())?;
        Ok(IndentCycle {
            line,
            levels,
            revision: self.revision,
        })
    }

    pub fn set_indentation(&mut self, line: u32, column: usize) -> Result<bool, EditError> {
        region::set_indentation(self, line, column)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tugedit_core::patch::TextEdit;

    #[test]
    fn settings_from_config() {
        let mut config = EditConfig::default();
        config.indent.unit = 2;
        config.dedent.keywords = vec!["else".to_string()];
        let settings = Settings::try_from(&config).unwrap();
        assert_eq!(settings.indent_unit, 2);
        assert_eq!(settings.dedent_keywords, vec![DedentKeyword::Else]);
    }

    #[test]
    fn invalid_config_is_rejected() {
        let mut config = EditConfig::default();
        config.indent.unit = 0;
        assert!(matches!(
            Document::with_config("", &config),
            Err(ConfigError::InvalidIndentUnit(0))
        ));
        assert!(Document::new("").set_indent_unit(0).is_err());
    }

    #[test]
    fn with_config_guesses_indent_unit() {
        let config = EditConfig::default();
        let doc = Document::with_config("if x:\n  y = 1\n", &config).unwrap();
        assert_eq!(doc.indent_unit(), 2);

        let mut config = EditConfig::default();
        config.indent.guess_indent = false;
        let doc = Document::with_config("if x:\n  y = 1\n", &config).unwrap();
        assert_eq!(doc.indent_unit(), 4);
    }

    #[test]
    fn edits_bump_revision_and_refresh_lexical_state() {
        let mut doc = Document::new("x = 1\ny = 2\n");
        let probe = doc.buffer().line_start(2);
        assert!(doc.lexical_context(probe).is_code());

        let edits = EditSet::new().with_edit(TextEdit::insert(4, "'''"));
        assert_eq!(doc.apply(edits).unwrap(), 1);
        assert_eq!(doc.revision(), 1);
        let probe = doc.buffer().line_start(2);
        assert!(doc.lexical_context(probe).in_string.is_some());
    }

    #[test]
    fn noop_edits_leave_revision_alone() {
        let mut doc = Document::new("x = 1\n");
        let edits = EditSet::new().with_edit(TextEdit::replace(Span::new(0, 1), "x"));
        assert_eq!(doc.apply(edits).unwrap(), 0);
        assert_eq!(doc.revision(), 0);
    }

    #[test]
    fn check_line_bounds() {
        let doc = Document::new("a\nb");
        assert!(doc.check_line(2).is_ok());
        assert!(matches!(
            doc.check_line(3),
            Err(EditError::LineOutOfRange {
                line: 3,
                line_count: 2
            })
        ));
    }
}
