//! Configuration handling for tugedit.
//!
//! Configuration lives in `.tugedit/config.toml`, found by searching upward
//! from the directory of the file being edited. Every field has a default,
//! so an empty file (or no file at all) is a valid configuration.
//!
//! ```toml
//! [indent]
//! unit = 4
//! tab_width = 8
//! guess_indent = true
//! use_tabs = false
//!
//! [dedent]
//! keywords = ["else", "elif", "except", "finally"]
//! chained_handlers = false
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ConfigError;

/// Directory holding the project configuration file.
pub const CONFIG_DIR: &str = ".tugedit";

/// Configuration file name inside [`CONFIG_DIR`].
pub const CONFIG_FILE: &str = "config.toml";

/// Keywords that may appear in `dedent.keywords`.
pub const KNOWN_DEDENT_KEYWORDS: &[&str] = &["else", "elif", "except", "finally"];

/// tugedit configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct EditConfig {
    /// Indentation settings
    #[serde(default)]
    pub indent: IndentConfig,

    /// Dedent keyword settings
    #[serde(default)]
    pub dedent: DedentConfig,
}

/// Indentation configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct IndentConfig {
    /// Columns per indentation level
    #[serde(default = "default_unit")]
    pub unit: i64,

    /// Display width of a tab character
    #[serde(default = "default_tab_width")]
    pub tab_width: i64,

    /// Detect the indent unit from the first block in the file
    #[serde(default = "default_guess_indent")]
    pub guess_indent: bool,

    /// Write indentation with tabs where possible
    #[serde(default)]
    pub use_tabs: bool,
}

/// Dedent keyword configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DedentConfig {
    /// Keywords whose lines dedent to the block they continue
    #[serde(default = "default_dedent_keywords")]
    pub keywords: Vec<String>,

    /// Let `except` close a preceding `except` and `finally` close a `try`
    #[serde(default)]
    pub chained_handlers: bool,
}

fn default_unit() -> i64 {
    4
}

fn default_tab_width() -> i64 {
    8
}

fn default_guess_indent() -> bool {
    true
}

fn default_dedent_keywords() -> Vec<String> {
    KNOWN_DEDENT_KEYWORDS.iter().map(|k| k.to_string()).collect()
}

impl Default for IndentConfig {
    fn default() -> Self {
        Self {
            unit: default_unit(),
            tab_width: default_tab_width(),
            guess_indent: default_guess_indent(),
            use_tabs: false,
        }
    }
}

impl Default for DedentConfig {
    fn default() -> Self {
        Self {
            keywords: default_dedent_keywords(),
            chained_handlers: false,
        }
    }
}

impl IndentConfig {
    /// The indent unit, rejecting values ≤ 0.
    pub fn unit(&self) -> Result<usize, ConfigError> {
        positive(self.unit).ok_or(ConfigError::InvalidIndentUnit(self.unit))
    }

    /// The tab width, rejecting values ≤ 0.
    pub fn tab_width(&self) -> Result<usize, ConfigError> {
        positive(self.tab_width).ok_or(ConfigError::InvalidTabWidth(self.tab_width))
    }
}

fn positive(value: i64) -> Option<usize> {
    usize::try_from(value).ok().filter(|&v| v > 0)
}

impl EditConfig {
    /// Check every field, returning the first problem found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.indent.unit()?;
        self.indent.tab_width()?;
        if let Some(unknown) = self
            .dedent
            .keywords
            .iter()
            .find(|k| !KNOWN_DEDENT_KEYWORDS.contains(&k.as_str()))
        {
            return Err(ConfigError::UnknownDedentKeyword(unknown.clone()));
        }
        Ok(())
    }

    /// Parse and validate configuration from TOML text.
    pub fn from_toml(content: &str, path: &Path) -> Result<Self, ConfigError> {
        let config: EditConfig = toml::from_str(content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml(&content, path)?;
        debug!("loaded config from {}", path.display());
        Ok(config)
    }

    /// Load configuration from the nearest `.tugedit/config.toml` at or
    /// above `start`, or the defaults when there is none.
    pub fn load_from_dir(start: &Path) -> Result<Self, ConfigError> {
        match find_config_file(start) {
            Some(path) => Self::load(&path),
            None => Ok(EditConfig::default()),
        }
    }
}

/// Find `.tugedit/config.toml` by searching upward from `start`, stopping
/// at the filesystem root.
pub fn find_config_file(start: &Path) -> Option<PathBuf> {
    let mut current = Some(start);
    while let Some(dir) = current {
        let candidate = dir.join(CONFIG_DIR).join(CONFIG_FILE);
        if candidate.is_file() {
            return Some(candidate);
        }
        current = dir.parent();
    }
    None
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = EditConfig::default();
        assert_eq!(config.indent.unit().unwrap(), 4);
        assert_eq!(config.indent.tab_width().unwrap(), 8);
        assert!(config.indent.guess_indent);
        assert_eq!(
            config.dedent.keywords,
            vec!["else", "elif", "except", "finally"]
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn empty_toml_is_default() {
        let config = EditConfig::from_toml("", Path::new("config.toml")).unwrap();
        assert_eq!(config, EditConfig::default());
    }

    #[test]
    fn partial_toml_keeps_other_defaults() {
        let config =
            EditConfig::from_toml("[indent]\nunit = 2\n", Path::new("config.toml")).unwrap();
        assert_eq!(config.indent.unit().unwrap(), 2);
        assert_eq!(config.indent.tab_width().unwrap(), 8);
        assert_eq!(config.dedent, DedentConfig::default());
    }

    #[test]
    fn non_positive_indent_unit_is_rejected() {
        for unit in ["0", "-4"] {
            let err = EditConfig::from_toml(
                &format!("[indent]\nunit = {}\n", unit),
                Path::new("config.toml"),
            )
            .unwrap_err();
            assert!(
                matches!(err, ConfigError::InvalidIndentUnit(_)),
                "unit {} should be rejected, got {:?}",
                unit,
                err
            );
        }
    }

    #[test]
    fn unknown_dedent_keyword_is_rejected() {
        let err = EditConfig::from_toml(
            "[dedent]\nkeywords = [\"else\", \"return\"]\n",
            Path::new("config.toml"),
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::UnknownDedentKeyword(ref k) if k == "return"));
    }

    #[test]
    fn malformed_toml_is_a_parse_error() {
        let err = EditConfig::from_toml("[indent\n", Path::new("bad.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert!(err.to_string().contains("bad.toml"));
    }

    #[test]
    fn load_from_dir_searches_upward() {
        let temp = tempfile::tempdir().unwrap();
        let config_dir = temp.path().join(CONFIG_DIR);
        fs::create_dir_all(&config_dir).unwrap();
        fs::write(config_dir.join(CONFIG_FILE), "[indent]\nunit = 2\n").unwrap();
        let nested = temp.path().join("pkg").join("sub");
        fs::create_dir_all(&nested).unwrap();

        let config = EditConfig::load_from_dir(&nested).unwrap();
        assert_eq!(config.indent.unit().unwrap(), 2);
    }

    #[test]
    fn load_from_dir_without_config_uses_defaults() {
        let temp = tempfile::tempdir().unwrap();
        let config = EditConfig::load_from_dir(temp.path()).unwrap();
        assert_eq!(config, EditConfig::default());
    }
}
