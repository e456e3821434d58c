//! Masking of identifier-like tokens before user text leaves the process.
//!
//! Tokens shaped like a tax identifier (5 letters, 4 digits, 1 letter) are
//! replaced by a constant placeholder. Everything else passes through.

use std::sync::OnceLock;

use regex::Regex;

/// Replacement for every masked token.
pub const MASK: &str = "1111111111";

fn identifier_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[A-Za-z]{5}[0-9]{4}[A-Za-z]$").expect("identifier pattern is valid")
    })
}

/// Whether a single token would be masked.
pub fn is_sensitive(token: &str) -> bool {
    identifier_pattern().is_match(token)
}

/// Mask sensitive tokens. Words are rejoined with single spaces.
pub fn redact(text: &str) -> String {
    text.split_whitespace()
        .map(|word| if is_sensitive(word) { MASK } else { word })
        .collect::<Vec<_>>()
        .join(" ")
}
