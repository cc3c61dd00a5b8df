//! Character/byte offset conversion.
//!
//! Every public offset in this crate counts Unicode scalar values, not
//! bytes. Regex matches and `str::find` return byte offsets, so they are
//! converted here at the boundary.

/// Number of characters in `text`.
pub fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// Converts a byte offset into a character offset.
///
/// Offsets past the end (or inside a multi-byte character) count only
/// the characters that start before `byte_idx`.
pub fn byte_to_char(text: &str, byte_idx: usize) -> usize {
    text.char_indices()
        .take_while(|(idx, _)| *idx < byte_idx)
        .count()
}

/// Converts a character offset into a byte offset, clamped to `text.len()`.
pub fn char_to_byte(text: &str, char_idx: usize) -> usize {
    text.char_indices()
        .nth(char_idx)
        .map_or(text.len(), |(idx, _)| idx)
}

/// Slices `text` by character offsets, clamping both ends to the text.
///
/// Returns an empty string when `start >= end` after clamping.
pub fn slice_chars(text: &str, start: usize, end: usize) -> &str {
    let len = char_len(text);
    let start = start.min(len);
    let end = end.min(len);
    if start >= end {
        return "";
    }
    &text[char_to_byte(text, start)..char_to_byte(text, end)]
}
