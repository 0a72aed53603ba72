//! Lexical classification of Python source.
//!
//! [`Scanner`] is a resumable state machine that walks the text one
//! character at a time and tracks whether it is inside a string, a comment,
//! or nested brackets. [`classify`] runs it from the buffer start;
//! [`ScanCache`] keeps checkpoints so repeated queries on a large buffer
//! resume from a nearby state instead of rescanning the whole prefix.
//!
//! # Rules
//!
//! - A string opens on `'` or `"` in code; three identical quotes open a
//!   triple-quoted string. Up to two prefix letters (`r`, `u`, `b`, `f` in
//!   any case) directly before the quote belong to the string start.
//! - Inside any string a backslash escapes the next character.
//! - A string closes on an unescaped fence matching its quote and length.
//!   A single-quoted string also ends at an unescaped newline.
//! - `#` in code starts a comment that runs to the end of the line.
//! - `(`, `[` and `{` share one depth counter. Closers pop the innermost
//!   opener regardless of kind; a closer at depth zero is ignored.
//!
//! Unterminated strings, comments and brackets at the end of the buffer are
//! valid states, never errors.

use tracing::trace;

use tugedit_core::text::SourceBuffer;

use crate::document::Document;

/// Lines between scan checkpoints.
pub const CHECKPOINT_INTERVAL: u32 = 64;

/// Characters before an edit whose scan decisions may have looked at it.
const LOOKAHEAD: usize = 3;

// ============================================================================
// Lexical State
// ============================================================================

/// A string that has been opened but not yet closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpenString {
    /// The quote character, `'` or `"`.
    pub quote: char,
    /// 1 for single-quoted strings, 3 for triple-quoted strings.
    pub fence_len: u8,
    /// Offset of the string start, including any prefix letters.
    pub start: usize,
}

impl OpenString {
    pub fn is_triple(&self) -> bool {
        self.fence_len == 3
    }
}

/// The lexical context before the character at some offset.
///
/// At most one of `in_string` and `in_comment` is set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LexicalState {
    pub in_string: Option<OpenString>,
    /// Offset of the `#` that started the current comment.
    pub in_comment: Option<usize>,
    /// Offsets of the open brackets, innermost last.
    pub paren_starts: Vec<usize>,
}

impl LexicalState {
    /// Number of open brackets.
    pub fn paren_depth(&self) -> u32 {
        self.paren_starts.len() as u32
    }

    /// Offset of the innermost open bracket.
    pub fn innermost_paren(&self) -> Option<usize> {
        self.paren_starts.last().copied()
    }

    /// Whether the position is outside strings and comments.
    pub fn is_code(&self) -> bool {
        self.in_string.is_none() && self.in_comment.is_none()
    }

    /// Start of the innermost construct: the string or comment start, else
    /// the innermost open bracket.
    pub fn innermost_start(&self) -> Option<usize> {
        self.in_string
            .map(|s| s.start)
            .or(self.in_comment)
            .or_else(|| self.innermost_paren())
    }
}

// ============================================================================
// Scanner
// ============================================================================

/// Resumable character-at-a-time lexer.
///
/// A scanner is positioned at a byte offset and holds the state *before*
/// the character at that offset.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Scanner {
    offset: usize,
    state: LexicalState,
    /// Characters still belonging to the current multi-character token
    /// (escape sequence or fence).
    skip: u8,
    /// Close the open string once `skip` reaches zero.
    close_pending: bool,
}

impl Scanner {
    /// A scanner at the start of a buffer.
    pub fn new() -> Self {
        Scanner::default()
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn state(&self) -> &LexicalState {
        &self.state
    }

    pub fn into_state(self) -> LexicalState {
        self.state
    }

    /// Whether the scanner is between tokens, with no escape or fence half
    /// consumed.
    pub fn at_token_boundary(&self) -> bool {
        self.skip == 0
    }

    /// Scan forward until the scanner is at or past `target`.
    pub fn advance_to(&mut self, text: &str, target: usize) {
        let target = target.min(text.len());
        while self.offset < target {
            if !self.step(text) {
                break;
            }
        }
    }

    /// Consume one character. Returns `false` at the end of the text.
    pub fn step(&mut self, text: &str) -> bool {
        let Some(ch) = text[self.offset..].chars().next() else {
            return false;
        };
        let at = self.offset;
        self.offset += ch.len_utf8();

        if self.skip > 0 {
            self.skip -= 1;
            if self.skip == 0 && self.close_pending {
                self.close_pending = false;
                self.state.in_string = None;
            }
            return true;
        }

        if let Some(open) = self.state.in_string {
            self.step_in_string(text, at, ch, open);
        } else if self.state.in_comment.is_some() {
            if ch == '\n' {
                self.state.in_comment = None;
            }
        } else {
            self.step_in_code(text, at, ch);
        }
        true
    }

    fn step_in_string(&mut self, text: &str, at: usize, ch: char, open: OpenString) {
        match ch {
            '\\' => {
                let rest = &text[self.offset..];
                self.skip = if rest.starts_with("\r\n") {
                    2
                } else if rest.is_empty() {
                    0
                } else {
                    1
                };
            }
            '\n' if !open.is_triple() => {
                self.state.in_string = None;
            }
            c if c == open.quote => {
                if !open.is_triple() {
                    self.state.in_string = None;
                } else if repeats(text, at, c, 3) {
                    self.skip = 2;
                    self.close_pending = true;
                }
            }
            _ => {}
        }
    }

    fn step_in_code(&mut self, text: &str, at: usize, ch: char) {
        match ch {
            '#' => self.state.in_comment = Some(at),
            '\'' | '"' => {
                let triple = repeats(text, at, ch, 3);
                if triple {
                    self.skip = 2;
                }
                self.state.in_string = Some(OpenString {
                    quote: ch,
                    fence_len: if triple { 3 } else { 1 },
                    start: prefix_start(text, at),
                });
            }
            '(' | '[' | '{' => self.state.paren_starts.push(at),
            ')' | ']' | '}' => {
                self.state.paren_starts.pop();
            }
            _ => {}
        }
    }
}

/// Whether `count` copies of `ch` start at `at`.
fn repeats(text: &str, at: usize, ch: char, count: usize) -> bool {
    text[at..].chars().take(count).filter(|&c| c == ch).count() == count
}

/// Start of a string whose quote is at `quote`, including prefix letters.
fn prefix_start(text: &str, quote: usize) -> usize {
    let before = &text[..quote];
    let letters = before
        .bytes()
        .rev()
        .take_while(|b| b.is_ascii_alphanumeric() || *b == b'_')
        .count();
    let word = &before[before.len() - letters..];
    let is_prefix = match word.len() {
        1 => is_prefix_letter(word.as_bytes()[0]),
        2 => {
            let (a, b) = (
                word.as_bytes()[0].to_ascii_lowercase(),
                word.as_bytes()[1].to_ascii_lowercase(),
            );
            a != b && matches!((a, b), (b'r', b'b' | b'f') | (b'b' | b'f', b'r'))
        }
        _ => false,
    };
    if is_prefix {
        quote - word.len()
    } else {
        quote
    }
}

fn is_prefix_letter(b: u8) -> bool {
    matches!(b.to_ascii_lowercase(), b'r' | b'u' | b'b' | b'f')
}

/// Lexical state before the character at `offset`, scanning from the start
/// of `text`.
///
/// Offsets inside a multi-byte character are moved back to its start.
/// Offsets past the end report the state at the end of the text.
pub fn classify(text: &str, offset: usize) -> LexicalState {
    let mut scanner = Scanner::new();
    scanner.advance_to(text, floor_boundary(text, offset));
    scanner.into_state()
}

/// Lexical state before the character at `offset` of a document, served
/// from its scan cache.
pub fn lexical_context(doc: &Document, offset: usize) -> LexicalState {
    doc.lexical_context(offset)
}

fn floor_boundary(text: &str, offset: usize) -> usize {
    let mut offset = offset.min(text.len());
    while !text.is_char_boundary(offset) {
        offset -= 1;
    }
    offset
}

// ============================================================================
// Scan Cache
// ============================================================================

/// Scanner checkpoints for one buffer.
///
/// Checkpoints are recorded at the start of every [`CHECKPOINT_INTERVAL`]th
/// line as scans pass them, plus the position of the most recent query.
/// After an edit, [`ScanCache::invalidate_from`] must be called with the
/// edit's start offset.
#[derive(Debug, Clone, Default)]
pub struct ScanCache {
    checkpoints: Vec<Scanner>,
    last: Option<Scanner>,
}

impl ScanCache {
    pub fn new() -> Self {
        ScanCache::default()
    }

    /// Number of line-start checkpoints currently held.
    pub fn checkpoint_count(&self) -> usize {
        self.checkpoints.len()
    }

    /// Lexical state before the character at `offset`.
    pub fn classify(&mut self, buffer: &SourceBuffer, offset: usize) -> LexicalState {
        self.scanner_at(buffer, offset).into_state()
    }

    /// A scanner positioned at `offset`, resumed from the nearest state at
    /// or before it.
    pub fn scanner_at(&mut self, buffer: &SourceBuffer, offset: usize) -> Scanner {
        let target = buffer.floor_char_boundary(offset);
        let mut scanner = self.resume_point(target);
        let text = buffer.text();

        loop {
            let line = buffer.line_of_offset(scanner.offset());
            let next_line = ((line - 1) / CHECKPOINT_INTERVAL + 1) * CHECKPOINT_INTERVAL + 1;
            if !buffer.has_line(next_line) {
                break;
            }
            let checkpoint = buffer.line_start(next_line);
            if checkpoint > target {
                break;
            }
            scanner.advance_to(text, checkpoint);
            self.record(scanner.clone());
        }

        scanner.advance_to(text, target);
        self.last = Some(scanner.clone());
        scanner
    }

    fn resume_point(&self, target: usize) -> Scanner {
        let idx = self
            .checkpoints
            .partition_point(|cp| cp.offset() <= target);
        let checkpoint = idx.checked_sub(1).map(|i| &self.checkpoints[i]);
        let last = self.last.as_ref().filter(|s| s.offset() <= target);

        let best = match (checkpoint, last) {
            (Some(cp), Some(last)) if last.offset() > cp.offset() => Some(last),
            (Some(cp), _) => Some(cp),
            (None, last) => last,
        };
        match best {
            Some(scanner) => {
                trace!("scan cache hit at {} for {}", scanner.offset(), target);
                scanner.clone()
            }
            None => Scanner::new(),
        }
    }

    fn record(&mut self, scanner: Scanner) {
        if !scanner.at_token_boundary() {
            return;
        }
        match self
            .checkpoints
            .binary_search_by_key(&scanner.offset(), |cp| cp.offset())
        {
            Ok(_) => {}
            Err(idx) => self.checkpoints.insert(idx, scanner),
        }
    }

    /// Drop every state that an edit starting at `offset` may have changed.
    pub fn invalidate_from(&mut self, offset: usize) {
        let before = self.checkpoints.len();
        self.checkpoints.retain(|cp| cp.offset() + LOOKAHEAD <= offset);
        if self
            .last
            .as_ref()
            .is_some_and(|s| s.offset() + LOOKAHEAD > offset)
        {
            self.last = None;
        }
        trace!(
            "scan cache invalidated from {}: dropped {} checkpoints",
            offset,
            before - self.checkpoints.len()
        );
    }

    /// Forget everything.
    pub fn clear(&mut self) {
        self.checkpoints.clear();
        self.last = None;
    }
}

// ============================================================================
// Code Characters
// ============================================================================

/// A character in code context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodeChar {
    pub offset: usize,
    pub ch: char,
    /// Bracket depth relative to the start of the iteration. Brackets
    /// themselves report the depth outside them.
    pub depth: i32,
}

/// Iterator over the characters of a range that are outside strings and
/// comments.
///
/// Quote characters and `#` are never yielded: a character is yielded only
/// if the state is code both before and after it.
#[derive(Debug, Clone)]
pub struct CodeChars<'a> {
    text: &'a str,
    scanner: Scanner,
    end: usize,
    base_depth: i32,
}

impl<'a> CodeChars<'a> {
    /// Iterate from the scanner's position up to `end` (exclusive).
    pub fn new(text: &'a str, scanner: Scanner, end: usize) -> Self {
        let base_depth = scanner.state().paren_depth() as i32;
        CodeChars {
            text,
            scanner,
            end: end.min(text.len()),
            base_depth,
        }
    }

    /// Iterate over `text[start..end]`, scanning from the start of `text`.
    pub fn from_start(text: &'a str, start: usize, end: usize) -> Self {
        let mut scanner = Scanner::new();
        scanner.advance_to(text, floor_boundary(text, start));
        CodeChars::new(text, scanner, end)
    }
}

impl Iterator for CodeChars<'_> {
    type Item = CodeChar;

    fn next(&mut self) -> Option<CodeChar> {
        while self.scanner.offset() < self.end {
            let offset = self.scanner.offset();
            let ch = self.text[offset..].chars().next()?;
            let before_code = self.scanner.at_token_boundary() && self.scanner.state().is_code();
            let before_depth = self.scanner.state().paren_depth() as i32;
            self.scanner.step(self.text);
            let after_code = self.scanner.state().is_code();
            if before_code && after_code {
                let after_depth = self.scanner.state().paren_depth() as i32;
                return Some(CodeChar {
                    offset,
                    ch,
                    depth: before_depth.min(after_depth) - self.base_depth,
                });
            }
        }
        None
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    /// Classify at the offset of the first occurrence of `marker` in `text`.
    fn at(text: &str, marker: &str) -> LexicalState {
        let offset = text
            .find(marker)
            .unwrap_or_else(|| panic!("marker {:?} not in {:?}", marker, text));
        classify(text, offset)
    }

    mod string_tests {
        use super::*;

        #[test]
        fn single_quoted_string() {
            let text = "x = 'abc' + y";
            let state = at(text, "b");
            let open = state.in_string.expect("inside string");
            assert_eq!(open.quote, '\'');
            assert_eq!(open.fence_len, 1);
            assert_eq!(open.start, 4);
            assert!(at(text, "+").is_code());
        }

        #[test]
        fn opening_quote_is_before_the_string() {
            let text = "x = 'abc'";
            assert!(classify(text, 4).is_code());
            assert!(classify(text, 5).in_string.is_some());
            assert!(classify(text, 8).in_string.is_some());
            assert!(classify(text, 9).is_code());
        }

        #[test]
        fn triple_quoted_string_spans_lines() {
            let text = "s = \"\"\"first\nsecond ' \"\nthird\"\"\"\nx = 1\n";
            let state = at(text, "second");
            let open = state.in_string.expect("inside docstring");
            assert_eq!(open.fence_len, 3);
            assert_eq!(open.start, 4);
            assert!(at(text, "x = 1").is_code());
        }

        #[test]
        fn closing_fence_is_still_inside_until_consumed() {
            let text = "'''a'''b";
            assert!(classify(text, 5).in_string.is_some());
            assert!(classify(text, 6).in_string.is_some());
            assert!(classify(text, 7).is_code());
        }

        #[test]
        fn back_to_back_strings() {
            let text = "a = '''x''' '''y''' + 'z' \"w\" + q";
            assert!(at(text, "+ '").is_code());
            assert!(at(text, "q").is_code());
            assert!(at(text, "y").in_string.is_some());
            assert!(at(text, "w").in_string.is_some());
        }

        #[test]
        fn empty_string_is_closed() {
            let text = "x = '' + y";
            assert!(at(text, "+").is_code());
        }

        #[test]
        fn escaped_quote_does_not_close() {
            let text = r#"x = "a\"b" + c"#;
            assert!(at(text, "b").in_string.is_some());
            assert!(at(text, "+").is_code());
        }

        #[test]
        fn escaped_backslash_before_quote_closes() {
            let text = r#"x = "a\\" + c"#;
            assert!(at(text, "+").is_code());
        }

        #[test]
        fn single_quoted_string_ends_at_newline() {
            let text = "x = 'abc\ny = 1\n";
            assert!(at(text, "y").is_code());
        }

        #[test]
        fn escaped_newline_continues_single_quoted_string() {
            let text = "x = 'abc\\\ndef'\ny = 1\n";
            assert!(at(text, "def").in_string.is_some());
            assert!(at(text, "y").is_code());
        }

        #[test]
        fn crlf_escape_is_one_token() {
            let text = "x = 'abc\\\r\ndef'\r\ny = 1";
            assert!(at(text, "def").in_string.is_some());
            assert!(at(text, "y").is_code());
        }

        #[test]
        fn prefixes_are_part_of_the_string_start() {
            for (text, start) in [
                ("x = r'a'", 4),
                ("x = Rb'a'", 4),
                ("x = bR'a'", 4),
                ("x = f'''a'''", 4),
                ("x = u\"a\"", 4),
            ] {
                let state = classify(text, text.len() - 2);
                assert_eq!(
                    state.in_string.map(|s| s.start),
                    Some(start),
                    "prefix start for {:?}",
                    text
                );
            }
        }

        #[test]
        fn identifiers_ending_in_prefix_letters_are_not_prefixes() {
            let text = "x = bar'a'";
            let state = classify(text, 8);
            assert_eq!(state.in_string.map(|s| s.start), Some(7));
        }

        #[test]
        fn hash_inside_string_is_not_a_comment() {
            let text = "x = '# not a comment' + y";
            let state = at(text, "not");
            assert!(state.in_string.is_some());
            assert!(state.in_comment.is_none());
            assert!(at(text, "+").is_code());
        }

        #[test]
        fn unterminated_triple_string_persists_to_eof() {
            let text = "x = '''abc\n\ndef(";
            let state = classify(text, text.len());
            assert!(state.in_string.is_some());
            assert_eq!(state.paren_depth(), 0);
        }
    }

    mod comment_tests {
        use super::*;

        #[test]
        fn comment_runs_to_end_of_line() {
            let text = "x = 1  # note (\ny = 2\n";
            let state = at(text, "note");
            assert_eq!(state.in_comment, Some(7));
            assert_eq!(state.paren_depth(), 0);
            assert!(at(text, "y").is_code());
        }

        #[test]
        fn newline_is_inside_the_comment() {
            let text = "# c\nx";
            assert!(classify(text, 3).in_comment.is_some());
            assert!(classify(text, 4).is_code());
        }

        #[test]
        fn quote_inside_comment_opens_nothing() {
            let text = "# it's\nx = 1\n";
            assert!(at(text, "x").is_code());
        }
    }

    mod paren_tests {
        use super::*;

        #[test]
        fn nested_brackets_share_one_depth() {
            let text = "f(a, [b, {c: (d";
            let state = classify(text, text.len());
            assert_eq!(state.paren_depth(), 4);
            assert_eq!(state.paren_starts, vec![1, 5, 9, 13]);
            assert_eq!(state.innermost_paren(), Some(13));
        }

        #[test]
        fn mismatched_closers_still_pop() {
            let text = "f(a]";
            assert_eq!(classify(text, 4).paren_depth(), 0);
        }

        #[test]
        fn stray_closer_is_ignored() {
            let text = ")) x = (";
            let state = classify(text, text.len());
            assert_eq!(state.paren_starts, vec![7]);
        }

        #[test]
        fn brackets_in_strings_and_comments_do_not_count() {
            let text = "f('(', \"[\", # {\n";
            assert_eq!(classify(text, text.len()).paren_depth(), 1);
        }
    }

    mod cache_tests {
        use super::*;

        fn long_buffer() -> SourceBuffer {
            let mut text = String::from("x = '''\n");
            for i in 0..200 {
                text.push_str(&format!("line {}\n", i));
            }
            text.push_str("'''\ny = (1,\n");
            SourceBuffer::new(text)
        }

        #[test]
        fn cached_results_match_fresh_scans() {
            let buffer = long_buffer();
            let mut cache = ScanCache::new();
            let end = buffer.len();
            for offset in [end, 10, end / 2, 700, end - 3, 0] {
                assert_eq!(
                    cache.classify(&buffer, offset),
                    classify(buffer.text(), offset),
                    "offset {}",
                    offset
                );
            }
            assert!(cache.checkpoint_count() >= 3);
        }

        #[test]
        fn invalidation_drops_later_checkpoints() {
            let buffer = long_buffer();
            let mut cache = ScanCache::new();
            cache.classify(&buffer, buffer.len());
            let count = cache.checkpoint_count();
            cache.invalidate_from(buffer.line_start(100));
            assert!(cache.checkpoint_count() < count);
            cache.invalidate_from(0);
            assert_eq!(cache.checkpoint_count(), 0);
        }

        #[test]
        fn edit_before_cached_state_is_seen() {
            let mut buffer = long_buffer();
            let mut cache = ScanCache::new();
            let probe = buffer.line_start(150);
            assert!(cache.classify(&buffer, probe).in_string.is_some());

            // Remove the opening fence: the probe is now code.
            buffer = SourceBuffer::new(buffer.text().replacen("'''", "", 1));
            cache.invalidate_from(4);
            let probe = buffer.line_start(150);
            assert_eq!(cache.classify(&buffer, probe), classify(buffer.text(), probe));
        }
    }

    mod code_chars_tests {
        use super::*;

        fn code(text: &str) -> String {
            CodeChars::from_start(text, 0, text.len())
                .map(|c| c.ch)
                .collect()
        }

        #[test]
        fn skips_strings_and_comments() {
            assert_eq!(code("a = 'x#' + b  # c"), "a =  + b  ");
        }

        #[test]
        fn depth_is_relative_to_start() {
            let text = "f(a, (b)) = c";
            let depths: Vec<(char, i32)> = CodeChars::from_start(text, 0, text.len())
                .filter(|c| !c.ch.is_whitespace())
                .map(|c| (c.ch, c.depth))
                .collect();
            assert_eq!(
                depths,
                vec![
                    ('f', 0),
                    ('(', 0),
                    ('a', 1),
                    (',', 1),
                    ('(', 1),
                    ('b', 2),
                    (')', 1),
                    (')', 0),
                    ('=', 0),
                    ('c', 0),
                ]
            );
        }

        #[test]
        fn starting_inside_brackets_can_go_negative() {
            let text = "f(a) + b";
            let depths: Vec<i32> = CodeChars::from_start(text, 2, text.len())
                .map(|c| c.depth)
                .collect();
            assert_eq!(depths[0], 0);
            assert_eq!(*depths.last().unwrap(), -1);
        }
    }
}
