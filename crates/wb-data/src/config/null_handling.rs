//! Missing-value tokens

use serde::{Serialize, Deserialize};

/// Cell values that are read as missing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NullConfig {
    /// Tokens treated as null
    pub patterns: Vec<String>,

    /// Trim whitespace before matching
    pub trim_whitespace: bool,

    /// Match tokens case sensitively
    pub case_sensitive: bool,
}

impl Default for NullConfig {
    fn default() -> Self {
        Self {
            patterns: ["", "-", "N/A", "null", "None"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            trim_whitespace: true,
            case_sensitive: false,
        }
    }
}

impl NullConfig {
    /// Check if a value should be treated as null
    pub fn is_null(&self, value: &str) -> bool {
        let value = if self.trim_whitespace { value.trim() } else { value };

        self.patterns.iter().any(|pattern| {
            if self.case_sensitive {
                value == pattern
            } else {
                value.eq_ignore_ascii_case(pattern)
            }
        })
    }

    /// Add a null token
    pub fn add_pattern(&mut self, pattern: impl Into<String>) {
        let pattern = pattern.into();
        if !self.patterns.contains(&pattern) {
            self.patterns.push(pattern);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_tokens() {
        let config = NullConfig::default();
        assert!(config.is_null(""));
        assert!(config.is_null("  "));
        assert!(config.is_null("n/a"));
        assert!(config.is_null("NULL"));
        assert!(config.is_null(" none "));
        assert!(!config.is_null("0"));
        assert!(!config.is_null("nothing"));
        // read as a float, not a missing value
        assert!(!config.is_null("NaN"));
    }

    #[test]
    fn test_case_sensitive_matching() {
        let mut config = NullConfig {
            case_sensitive: true,
            ..NullConfig::default()
        };
        config.add_pattern("missing");
        assert!(config.is_null("missing"));
        assert!(!config.is_null("MISSING"));
        assert!(!config.is_null("n/a"));
    }
}
