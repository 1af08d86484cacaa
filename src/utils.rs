//! Filename helpers

/// Characters stripped from titles when building filenames
const DISALLOWED_CHARS: &[char] = &['\\', '/', '*', '?', ':', '"', '<', '>', '|'];

/// Maximum length of a sanitized filename stem, in characters
const MAX_STEM_CHARS: usize = 150;

/// Sanitize a title into a safe filename stem.
///
/// Strips path-hostile characters, replaces spaces with underscores, and
/// truncates to 150 characters (on character boundaries, so multi-byte
/// titles are never split mid-codepoint).
///
/// # Examples
///
/// ```
/// use shelf_dl::utils::sanitize_filename;
///
/// assert_eq!(sanitize_filename("The Women"), "The_Women");
/// assert_eq!(sanitize_filename(r#"What/If?: "A Story""#), "WhatIf_A_Story");
/// ```
#[must_use]
pub fn sanitize_filename(title: &str) -> String {
    title
        .chars()
        .filter(|c| !DISALLOWED_CHARS.contains(c))
        .map(|c| if c == ' ' { '_' } else { c })
        .take(MAX_STEM_CHARS)
        .collect()
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_disallowed_characters() {
        assert_eq!(sanitize_filename(r#"a\b/c*d?e:f"g<h>i|j"#), "abcdefghij");
    }

    #[test]
    fn replaces_spaces_with_underscores() {
        assert_eq!(
            sanitize_filename("The God of the Woods"),
            "The_God_of_the_Woods"
        );
    }

    #[test]
    fn truncates_long_titles_to_150_chars() {
        let long = "a".repeat(400);
        assert_eq!(sanitize_filename(&long).len(), 150);
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        let long = "ä".repeat(200);
        let sanitized = sanitize_filename(&long);
        assert_eq!(sanitized.chars().count(), 150);
    }

    #[test]
    fn empty_input_stays_empty() {
        assert_eq!(sanitize_filename(""), "");
    }
}
