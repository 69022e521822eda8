//! `Cache-Control` directive parsing.

use std::collections::BTreeMap;

/// Parsed `Cache-Control` directives, keyed by lower-cased name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CacheControl {
    directives: BTreeMap<String, Option<String>>,
}

impl CacheControl {
    /// Parse a (possibly comma-joined) header value. Unknown directives are
    /// kept; for duplicates the first occurrence wins.
    pub fn parse(value: &str) -> Self {
        let mut directives = BTreeMap::new();
        for part in value.split(',') {
            let part = part.trim();
            if part.is_empty() {
                continue;
            }
            let (name, argument) = match part.split_once('=') {
                Some((name, argument)) => (name.trim(), Some(argument.trim().trim_matches('"').to_string())),
                None => (part, None),
            };
            directives.entry(name.to_ascii_lowercase()).or_insert(argument);
        }
        Self { directives }
    }

    pub fn has(&self, name: &str) -> bool {
        self.directives.contains_key(name)
    }

    /// Argument of a directive, if the directive carries one.
    pub fn argument(&self, name: &str) -> Option<&str> {
        self.directives.get(name).and_then(|argument| argument.as_deref())
    }

    /// Delta-seconds argument of a directive. Malformed values read as absent.
    pub fn seconds(&self, name: &str) -> Option<u64> {
        self.argument(name).and_then(|argument| argument.parse().ok())
    }

    pub fn insert(&mut self, name: &str, argument: Option<String>) {
        self.directives.insert(name.to_string(), argument);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_flags_and_arguments() {
        let cc = CacheControl::parse("public, Max-Age=60, s-maxage=\"120\", no-transform");
        assert!(cc.has("public"));
        assert!(cc.has("no-transform"));
        assert_eq!(cc.seconds("max-age"), Some(60));
        assert_eq!(cc.seconds("s-maxage"), Some(120));
        assert!(!cc.has("no-store"));
    }

    #[test]
    fn test_parse_first_duplicate_wins() {
        let cc = CacheControl::parse("max-age=10, max-age=99");
        assert_eq!(cc.seconds("max-age"), Some(10));
    }

    #[test]
    fn test_malformed_seconds_read_as_absent() {
        let cc = CacheControl::parse("max-age=soon, max-stale");
        assert!(cc.has("max-age"));
        assert_eq!(cc.seconds("max-age"), None);
        assert!(cc.has("max-stale"));
        assert_eq!(cc.argument("max-stale"), None);
    }

    #[test]
    fn test_parse_empty_segments() {
        assert_eq!(CacheControl::parse(" , ,"), CacheControl::default());
    }
}
