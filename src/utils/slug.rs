//! URL slugification utilities.
//!
//! Converts destination path components and heading anchors to URL-safe formats.

use crate::config::SlugMode;

/// Characters forbidden in path components and fragments
const FORBIDDEN_CHARS: &[char] = &[
    '<', '>', ':', '|', '?', '*', '#', '\\', '/', '(', ')', '[', ']', '"', '\'', '\t', '\r',
    '\n',
];

// ============================================================================
// Slugification
// ============================================================================

/// Convert text to a slug according to `mode`.
pub fn slugify(text: &str, mode: SlugMode) -> String {
    match mode {
        SlugMode::Safe => sanitize_text(text),
        SlugMode::On => ascii_slug(text),
        SlugMode::No => text.to_owned(),
    }
}

/// Transliterate to ASCII, lowercase, and join alphanumeric runs with `-`.
fn ascii_slug(text: &str) -> String {
    let ascii = deunicode::deunicode(text);
    let mut slug = String::with_capacity(ascii.len());
    let mut pending_dash = false;

    for c in ascii.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }

    slug
}

/// Remove forbidden characters and replace whitespace with underscores
fn sanitize_text(text: &str) -> String {
    text.trim()
        .chars()
        .filter(|c| !FORBIDDEN_CHARS.contains(c))
        .map(|c| if c.is_whitespace() { '_' } else { c })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_text_removes_forbidden_chars() {
        assert_eq!(sanitize_text("a<b>c:d|e?f*g#h\\i(j)k[l]m/n"), "abcdefghijklmn");
    }

    #[test]
    fn test_sanitize_text_replaces_whitespace() {
        assert_eq!(sanitize_text("  Hello World  "), "Hello_World");
    }

    #[test]
    fn test_sanitize_text_preserves_unicode() {
        assert_eq!(sanitize_text("Café"), "Café");
    }

    #[test]
    fn test_sanitize_text_mixed_content() {
        assert_eq!(
            sanitize_text("My Article (2024) - Part #1"),
            "My_Article_2024_-_Part_1"
        );
    }

    #[test]
    fn test_ascii_slug() {
        assert_eq!(ascii_slug("Zero-Cost Abstractions?"), "zero-cost-abstractions");
        assert_eq!(ascii_slug("  Café au lait  "), "cafe-au-lait");
        assert_eq!(ascii_slug("x86_64 & SIMD"), "x86-64-simd");
        assert_eq!(ascii_slug("---"), "");
    }

    #[test]
    fn test_slugify_modes() {
        assert_eq!(slugify("Hot Loops", SlugMode::On), "hot-loops");
        assert_eq!(slugify("Hot Loops", SlugMode::Safe), "Hot_Loops");
        assert_eq!(slugify("Hot Loops", SlugMode::No), "Hot Loops");
    }
}
