//! Helpers for writing engine tests against literal source text.

/// Cursor marker recognized by [`marked`].
pub const CURSOR: &str = "<|>";

/// Remove the cursor marker from `source`, returning the text and the byte
/// offset where the marker was.
///
/// # Panics
///
/// Panics if `source` does not contain exactly one marker.
pub fn marked(source: &str) -> (String, usize) {
    let offset = source
        .find(CURSOR)
        .unwrap_or_else(|| panic!("no cursor marker {} in {:?}", CURSOR, source));
    assert_eq!(
        source.matches(CURSOR).count(),
        1,
        "more than one cursor marker in {:?}",
        source
    );
    (source.replacen(CURSOR, "", 1), offset)
}

/// Byte offset of the first occurrence of `needle` in `source`.
///
/// # Panics
///
/// Panics if `needle` does not occur.
pub fn offset_of(source: &str, needle: &str) -> usize {
    source
        .find(needle)
        .unwrap_or_else(|| panic!("{:?} not found in {:?}", needle, source))
}
