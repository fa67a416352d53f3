//! Wildcard patterns for class and method names
//!
//! `*` matches any run of characters; everything else is literal. Patterns
//! are anchored at both ends.

use crate::error::ConfigurationError;
use regex::Regex;
use std::fmt;

/// Compiled wildcard pattern
#[derive(Clone)]
pub struct WildcardPattern {
    source: String,
    regex: Regex,
}

impl WildcardPattern {
    /// Compile `pattern`
    ///
    /// # Errors
    /// Returns [`ConfigurationError::InvalidPattern`] if the translated
    /// expression does not compile.
    pub fn new(pattern: &str) -> Result<Self, ConfigurationError> {
        let translated = pattern
            .split('*')
            .map(regex::escape)
            .collect::<Vec<_>>()
            .join(".*");
        let regex = Regex::new(&format!("^{translated}$")).map_err(|source| {
            ConfigurationError::InvalidPattern {
                pattern: pattern.to_string(),
                source,
            }
        })?;

        Ok(Self {
            source: pattern.to_string(),
            regex,
        })
    }

    /// Check if `value` matches
    #[inline]
    #[must_use]
    pub fn matches(&self, value: &str) -> bool {
        self.regex.is_match(value)
    }
}

impl fmt::Debug for WildcardPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("WildcardPattern").field(&self.source).finish()
    }
}

impl PartialEq for WildcardPattern {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

impl Eq for WildcardPattern {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literal_pattern_matches_exactly() {
        let p = WildcardPattern::new("com.shop.Cart").unwrap();
        assert!(p.matches("com.shop.Cart"));
        assert!(!p.matches("com.shop.CartItem"));
        assert!(!p.matches("comXshop.Cart"));
    }

    #[test]
    fn star_matches_any_run() {
        let p = WildcardPattern::new("com.shop.*Service").unwrap();
        assert!(p.matches("com.shop.OrderService"));
        assert!(p.matches("com.shop.Service"));
        assert!(p.matches("com.shop.impl.OrderService"));
        assert!(!p.matches("com.shop.OrderServiceImpl"));
    }

    #[test]
    fn lone_star_matches_everything() {
        let p = WildcardPattern::new("*").unwrap();
        assert!(p.matches(""));
        assert!(p.matches("anything.at.All"));
    }

    #[test]
    fn regex_metacharacters_are_literal() {
        let p = WildcardPattern::new("a+b(c)").unwrap();
        assert!(p.matches("a+b(c)"));
        assert!(!p.matches("aab(c)"));
    }
}
