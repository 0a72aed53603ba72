//! Python keyword grammars used by the indentation and navigation rules.
//!
//! All patterns apply to the text of a single physical line.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;

use tugedit_core::error::ConfigError;

/// A line that begins a block: `def`, `class`, `if`, `for`, ... with an
/// optional `async`.
static BLOCK_START: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^[ \t\x0c]*(?:async[ \t]+)?(def|class|if|elif|else|try|except|finally|for|while|with|match|case)\b[ \t]*",
    )
    .expect("valid regex")
});

/// A function or class definition, capturing its name.
static DEFUN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[ \t\x0c]*(?:async[ \t]+)?(def|class)[ \t]+([^\W\d]\w*)").expect("valid regex")
});

/// A decorator line.
static DECORATOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[ \t\x0c]*@").expect("valid regex"));

/// Keywords whose continuation lines align past the keyword.
static RETURN_FROM_IMPORT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[ \t\x0c]*(return|from|import)[ \t]+").expect("valid regex")
});

/// Statements after which control never falls through to the next line.
static BLOCK_ENDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[ \t\x0c]*(return|pass|raise|break|continue)\b").expect("valid regex")
});

/// `match` and `case` are only keywords when a subject follows them.
const SOFT_KEYWORDS: &[&str] = &["match", "case"];

/// The block keyword a line starts with, with the byte offset just past the
/// keyword and any following whitespace.
pub fn block_keyword_end(line: &str) -> Option<(&str, usize)> {
    let caps = BLOCK_START.captures(line)?;
    let keyword = caps.get(1)?.as_str();
    let end = caps.get(0)?.end();
    if SOFT_KEYWORDS.contains(&keyword) && !soft_keyword_subject(&line[end..]) {
        return None;
    }
    Some((keyword, end))
}

/// The block keyword a line starts with.
pub fn block_keyword(line: &str) -> Option<&str> {
    block_keyword_end(line).map(|(keyword, _)| keyword)
}

fn soft_keyword_subject(rest: &str) -> bool {
    match rest.chars().next() {
        None => false,
        Some(c) => !matches!(c, '=' | '.' | ',' | ')' | ']' | '}' | ':' | ';' | '#'),
    }
}

/// The name defined by a `def` or `class` line.
pub fn defun_name(line: &str) -> Option<&str> {
    DEFUN.captures(line).and_then(|c| c.get(2)).map(|m| m.as_str())
}

pub fn is_decorator(line: &str) -> bool {
    DECORATOR.is_match(line)
}

pub fn is_block_ender(line: &str) -> bool {
    BLOCK_ENDER.is_match(line)
}

/// Byte offset past a leading `return`, `from` or `import` and the
/// whitespace after it.
pub fn return_from_import_end(line: &str) -> Option<usize> {
    RETURN_FROM_IMPORT.find(line).map(|m| m.end())
}

/// Whether `text` starts with `word` as a whole word.
pub fn starts_with_word(text: &str, word: &str) -> bool {
    text.strip_prefix(word)
        .is_some_and(|rest| !rest.chars().next().is_some_and(is_identifier_char))
}

pub fn is_identifier_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

// ============================================================================
// Dedent Keywords
// ============================================================================

/// A keyword whose line sits level with the block it continues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DedentKeyword {
    Else,
    Elif,
    Except,
    Finally,
}

impl DedentKeyword {
    pub const ALL: [DedentKeyword; 4] = [
        DedentKeyword::Else,
        DedentKeyword::Elif,
        DedentKeyword::Except,
        DedentKeyword::Finally,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DedentKeyword::Else => "else",
            DedentKeyword::Elif => "elif",
            DedentKeyword::Except => "except",
            DedentKeyword::Finally => "finally",
        }
    }

    /// Block keywords this keyword may close.
    pub fn closes_keywords(&self, chained_handlers: bool) -> &'static [&'static str] {
        match (self, chained_handlers) {
            (DedentKeyword::Elif, _) => &["if", "elif"],
            (DedentKeyword::Else, _) => &["if", "elif", "except", "for", "while"],
            (DedentKeyword::Except, false) => &["try"],
            (DedentKeyword::Except, true) => &["try", "except"],
            (DedentKeyword::Finally, false) => &["except", "else"],
            (DedentKeyword::Finally, true) => &["except", "else", "try"],
        }
    }

    /// Whether a header starting with `opener` can be closed by this keyword.
    pub fn closes(&self, opener: &str, chained_handlers: bool) -> bool {
        self.closes_keywords(chained_handlers).contains(&opener)
    }

    /// The keyword among `enabled` that `line` starts with, after leading
    /// whitespace.
    pub fn at_line_start(line: &str, enabled: &[DedentKeyword]) -> Option<DedentKeyword> {
        let text = line.trim_start();
        enabled
            .iter()
            .copied()
            .find(|kw| starts_with_word(text, kw.as_str()))
    }
}

impl fmt::Display for DedentKeyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DedentKeyword {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DedentKeyword::ALL
            .into_iter()
            .find(|kw| kw.as_str() == s)
            .ok_or_else(|| ConfigError::UnknownDedentKeyword(s.to_string()))
    }
}

// ============================================================================
// Tests
// ============================================================================
