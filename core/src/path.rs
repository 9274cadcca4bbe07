//! Route pattern helpers shared by insertion and matching

use memchr::memchr2;

/// Sigil introducing a named single-segment parameter (`:id`)
pub const PARAM_SIGIL: u8 = b':';

/// Sigil introducing a catch-all parameter (`*filepath`)
pub const CATCH_ALL_SIGIL: u8 = b'*';

#[inline]
pub(crate) fn is_sigil(byte: u8) -> bool {
    byte == PARAM_SIGIL || byte == CATCH_ALL_SIGIL
}

/// Length of the longest shared prefix of `a` and `b`, in bytes
///
/// Works on raw bytes, so the result may fall inside a multi-byte
/// character; tree segments are stored as bytes for that reason.
#[inline]
pub fn longest_common_prefix(a: impl AsRef<[u8]>, b: impl AsRef<[u8]>) -> usize {
    a.as_ref()
        .iter()
        .zip(b.as_ref())
        .take_while(|(x, y)| x == y)
        .count()
}

/// First wildcard token found in a pattern
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Wildcard<'a> {
    /// The token including its sigil, e.g. `:id` or `*filepath`
    pub token: &'a str,
    /// Byte offset of the sigil
    pub start: usize,
    /// False when a second sigil appears before the segment ends
    pub valid: bool,
}

impl<'a> Wildcard<'a> {
    /// Name without the sigil
    #[inline]
    pub fn name(&self) -> &'a str {
        &self.token[1..]
    }

    #[inline]
    pub fn is_catch_all(&self) -> bool {
        self.token.as_bytes()[0] == CATCH_ALL_SIGIL
    }

    /// Offset one past the end of the token
    #[inline]
    pub fn end(&self) -> usize {
        self.start + self.token.len()
    }
}

/// Locate the first `:name` / `*name` token in `pattern`
///
/// The token runs up to the next `/` or the end of the pattern. Another
/// sigil inside that run marks the token invalid.
pub fn find_wildcard(pattern: &str) -> Option<Wildcard<'_>> {
    let (start, end, valid) = wildcard_span(pattern.as_bytes())?;
    Some(Wildcard {
        token: &pattern[start..end],
        start,
        valid,
    })
}

/// Byte-level core of [`find_wildcard`]: `(start, end, valid)` of the first
/// token. Both bounds sit on ASCII bytes, so they are always char boundaries.
pub(crate) fn wildcard_span(bytes: &[u8]) -> Option<(usize, usize, bool)> {
    let start = memchr2(PARAM_SIGIL, CATCH_ALL_SIGIL, bytes)?;

    let mut valid = true;
    for (offset, &byte) in bytes[start + 1..].iter().enumerate() {
        match byte {
            b'/' => return Some((start, start + 1 + offset, valid)),
            PARAM_SIGIL | CATCH_ALL_SIGIL => valid = false,
            _ => {}
        }
    }

    Some((start, bytes.len(), valid))
}

/// Number of wildcard sigils in `pattern`
///
/// Upper bound on the parameters a match against this pattern can produce.
#[inline]
pub fn count_wildcards(pattern: &str) -> usize {
    pattern.bytes().filter(|&b| is_sigil(b)).count()
}

/// Check a full route pattern for syntax errors before it touches a tree
///
/// Returns the reason as a static string so the caller can wrap it in its
/// own error type together with the pattern.
pub(crate) fn validate_pattern(pattern: &str) -> Result<(), &'static str> {
    if pattern.is_empty() {
        return Err("pattern is empty");
    }
    if !pattern.starts_with('/') {
        return Err("pattern must begin with '/'");
    }

    let mut offset = 0;
    while let Some(wildcard) = find_wildcard(&pattern[offset..]) {
        let start = offset + wildcard.start;
        let end = offset + wildcard.end();

        if !wildcard.valid {
            return Err("only one wildcard per path segment is allowed");
        }
        if wildcard.token.len() < 2 {
            return Err("wildcards must be named with a non-empty name");
        }
        if wildcard.is_catch_all() {
            if end != pattern.len() {
                return Err("catch-all routes are only allowed at the end of the path");
            }
            if pattern.as_bytes()[start - 1] != b'/' {
                return Err("catch-all must directly follow a '/'");
            }
        }

        offset = end;
    }

    Ok(())
}
