//! ANSI-aware text measurement, padding, and truncation.
//!
//! Rendered lines carry embedded SGR escape sequences (`ESC [ … m` and
//! friends) that occupy zero columns on screen. Every width calculation in
//! the renderer goes through these helpers so color never corrupts layout.
//! All functions are pure and total; already-fitting input passes through
//! unchanged.

use std::borrow::Cow;

use memchr::memchr;

const ESC: u8 = 0x1b;

/// Truncation marker appended by [`truncate`].
pub const TRUNCATION_MARKER: char = '~';

/// End index (exclusive) of the escape sequence starting at `start`.
///
/// Recognized pattern: `ESC [ … letter`. A lone ESC not followed by `[`
/// is consumed by itself so malformed input cannot stall the scan.
fn escape_end(bytes: &[u8], start: usize) -> usize {
    debug_assert_eq!(bytes[start], ESC);
    if bytes.get(start + 1) != Some(&b'[') {
        return start + 1;
    }
    let mut i = start + 2;
    while i < bytes.len() {
        if bytes[i].is_ascii_alphabetic() {
            return i + 1;
        }
        i += 1;
    }
    bytes.len()
}

/// Number of visible columns in `s`, excluding escape sequences.
#[must_use]
pub fn visible_len(s: &str) -> usize {
    let bytes = s.as_bytes();
    let mut len = 0;
    let mut i = 0;
    while i < bytes.len() {
        match memchr(ESC, &bytes[i..]) {
            Some(off) => {
                len += s[i..i + off].chars().count();
                i = escape_end(bytes, i + off);
            }
            None => {
                len += s[i..].chars().count();
                break;
            }
        }
    }
    len
}

/// Fit `s` to exactly `width` visible columns.
///
/// Characters and escape sequences are copied verbatim; only visible
/// characters count toward `width`. Once the budget is spent, remaining
/// visible characters are dropped but escape sequences still pass through,
/// so a trailing SGR reset survives truncation. Short input is right-padded
/// with spaces.
#[must_use]
pub fn pad_to_width(s: &str, width: usize) -> String {
    let bytes = s.as_bytes();
    let mut out = String::with_capacity(s.len().max(width));
    let mut visible = 0;
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == ESC {
            let end = escape_end(bytes, i);
            out.push_str(&s[i..end]);
            i = end;
        } else {
            // Safe: i is on a char boundary because escapes are pure ASCII.
            let ch = s[i..].chars().next().unwrap_or(' ');
            if visible < width {
                out.push(ch);
                visible += 1;
            }
            i += ch.len_utf8();
        }
    }
    for _ in visible..width {
        out.push(' ');
    }
    out
}

/// Shorten a raw (uncolored) string to at most `max` characters, marking
/// the cut with [`TRUNCATION_MARKER`]. Applied to table cell content
/// before coloring, so it never has to reason about escapes.
#[must_use]
pub fn truncate(s: &str, max: usize) -> Cow<'_, str> {
    if s.chars().count() <= max {
        return Cow::Borrowed(s);
    }
    let mut out: String = s.chars().take(max.saturating_sub(1)).collect();
    out.push(TRUNCATION_MARKER);
    Cow::Owned(out)
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn visible_len_ignores_sgr() {
        assert_eq!(visible_len("\x1b[31mRed\x1b[0m"), 3);
        assert_eq!(visible_len("Normal"), 6);
        assert_eq!(visible_len(""), 0);
        assert_eq!(visible_len("\x1b[1m\x1b[7m"), 0);
    }

    #[test]
    fn visible_len_counts_chars_not_bytes() {
        assert_eq!(visible_len("héllo"), 5);
    }

    #[test]
    fn lone_escape_is_zero_width() {
        assert_eq!(visible_len("a\x1bb"), 2);
    }

    #[test]
    fn unterminated_escape_is_swallowed() {
        assert_eq!(visible_len("ok\x1b[31"), 2);
    }

    #[test]
    fn pad_extends_short_input() {
        assert_eq!(pad_to_width("ab", 5), "ab   ");
        assert_eq!(visible_len(&pad_to_width("ab", 5)), 5);
    }

    #[test]
    fn pad_cuts_long_input_but_keeps_escapes() {
        let padded = pad_to_width("\x1b[31mabcdef\x1b[0m", 3);
        assert_eq!(visible_len(&padded), 3);
        assert!(padded.starts_with("\x1b[31mabc"));
        assert!(padded.ends_with("\x1b[0m"), "reset must survive: {padded:?}");
    }

    #[test]
    fn pad_is_idempotent_for_exact_input() {
        let exact = pad_to_width("abc", 3);
        assert_eq!(pad_to_width(&exact, 3), exact);
    }

    #[test]
    fn truncate_marks_the_cut() {
        assert_eq!(truncate("This is a very long string", 10), "This is a~");
        assert_eq!(truncate("Short", 10), "Short");
        assert_eq!(truncate("exact", 5), "exact");
        assert_eq!(truncate("over", 1), "~");
    }

    proptest! {
        #[test]
        fn pad_always_hits_exact_width(s in "\\PC*", width in 0usize..120) {
            prop_assert_eq!(visible_len(&pad_to_width(&s, width)), width);
        }

        #[test]
        fn pad_with_colors_hits_exact_width(s in "\\PC{0,40}", width in 0usize..80) {
            let colored = format!("\x1b[33m{s}\x1b[0m");
            prop_assert_eq!(visible_len(&pad_to_width(&colored, width)), width);
        }

        #[test]
        fn truncate_never_exceeds_max(s in "\\PC*", max in 1usize..64) {
            let out = truncate(&s, max);
            prop_assert!(out.chars().count() <= max);
        }
    }
}
