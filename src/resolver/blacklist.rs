use crate::core::{DepackError, DepackResult};
use regex::Regex;

/// Package names that are never packed
///
/// Entries are exact names (`aws-sdk`) or regular expressions wrapped in
/// slashes (`/^@aws-sdk\//`).
#[derive(Debug, Clone, Default)]
pub struct Blacklist {
    patterns: Vec<BlacklistPattern>,
}

#[derive(Debug, Clone)]
enum BlacklistPattern {
    Exact(String),
    Regex(Regex),
}

impl BlacklistPattern {
    fn parse(entry: &str) -> DepackResult<Self> {
        let trimmed = entry.trim();
        match trimmed
            .strip_prefix('/')
            .and_then(|rest| rest.strip_suffix('/'))
        {
            Some(expr) if !expr.is_empty() => Regex::new(expr)
                .map(BlacklistPattern::Regex)
                .map_err(|e| {
                    DepackError::Config(format!("Invalid blacklist pattern '{}': {}", entry, e))
                }),
            _ => Ok(BlacklistPattern::Exact(trimmed.to_string())),
        }
    }

    fn matches(&self, name: &str) -> bool {
        match self {
            BlacklistPattern::Exact(exact) => exact == name,
            BlacklistPattern::Regex(regex) => regex.is_match(name),
        }
    }
}

impl Blacklist {
    /// Compile configured entries
    pub fn new<S: AsRef<str>>(entries: &[S]) -> DepackResult<Self> {
        let patterns = entries
            .iter()
            .map(|e| BlacklistPattern::parse(e.as_ref()))
            .collect::<DepackResult<Vec<_>>>()?;
        Ok(Self { patterns })
    }

    /// Check if a package name matches any entry
    pub fn matches(&self, name: &str) -> bool {
        self.patterns.iter().any(|p| p.matches(name))
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}
