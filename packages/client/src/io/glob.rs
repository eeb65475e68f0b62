//! File name glob patterns
//!
//! Supports `*`, `?` and literal characters, matched case-insensitively
//! against a bare file name.

use regex::Regex;

use crate::error::{CertError, Result};

#[derive(Debug, Clone)]
pub struct GlobPattern {
    pattern: String,
    regex: Regex,
}

impl GlobPattern {
    pub fn new(pattern: &str) -> Result<Self> {
        let mut expression = String::from("(?i)^");

        for c in pattern.chars() {
            match c {
                '*' => expression.push_str(".*"),
                '?' => expression.push('.'),
                _ => expression.push_str(&regex::escape(c.encode_utf8(&mut [0u8; 4]))),
            }
        }
        expression.push('$');

        let regex = Regex::new(&expression)
            .map_err(|e| CertError::invalid_argument(format!("invalid file pattern '{pattern}': {e}")))?;

        Ok(Self {
            pattern: pattern.to_string(),
            regex,
        })
    }

    #[must_use]
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    #[must_use]
    pub fn matches(&self, file_name: &str) -> bool {
        self.regex.is_match(file_name)
    }
}

/// Whether any of the patterns matches the file name.
#[must_use]
pub fn matches_any(patterns: &[GlobPattern], file_name: &str) -> bool {
    patterns.iter().any(|pattern| pattern.matches(file_name))
}
