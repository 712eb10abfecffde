//! Version Ranges
//!
//! npm-style range expressions (`^2.0.0`, `~1.4`, `>=1.2.3 <2.0.0`,
//! `1.2.3 - 2.0.0`, `1.x || 3.1.0`) evaluated with the `semver` crate.

use std::fmt;
use std::str::FromStr;

use semver::{Version, VersionReq};

/// A set of alternative comparator sets; a version satisfies the range when
/// it satisfies any alternative.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupportedRange {
    source: String,
    alternatives: Vec<VersionReq>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeParseError {
    pub range: String,
    pub reason: String,
}

impl fmt::Display for RangeParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid version range '{}': {}", self.range, self.reason)
    }
}

impl std::error::Error for RangeParseError {}

impl SupportedRange {
    pub fn parse(range: &str) -> Result<Self, RangeParseError> {
        let mut alternatives = Vec::new();

        for alternative in range.split("||") {
            let translated = translate_comparator_set(alternative.trim());
            let req = VersionReq::parse(&translated).map_err(|e| RangeParseError {
                range: range.to_string(),
                reason: e.to_string(),
            })?;
            alternatives.push(req);
        }

        Ok(Self {
            source: range.to_string(),
            alternatives,
        })
    }

    /// Whether `version` falls inside the range. Unparsable versions never do.
    pub fn satisfies(&self, version: &str) -> bool {
        match parse_version(version) {
            Some(version) => self.alternatives.iter().any(|req| req.matches(&version)),
            None => false,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }
}

impl FromStr for SupportedRange {
    type Err = RangeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for SupportedRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

fn parse_version(version: &str) -> Option<Version> {
    let trimmed = version.trim();
    let trimmed = trimmed.strip_prefix('=').unwrap_or(trimmed).trim_start();
    let trimmed = trimmed.strip_prefix('v').unwrap_or(trimmed);
    Version::parse(trimmed).ok()
}

/// Rewrite one npm comparator set into the comma-separated form `semver`
/// parses. Bare versions are exact matches in npm but caret requirements in
/// `semver`, so they get an explicit `=`.
fn translate_comparator_set(set: &str) -> String {
    if set.is_empty() {
        return "*".to_string();
    }

    let tokens: Vec<&str> = set.split_whitespace().collect();

    if tokens.len() == 3 && tokens[1] == "-" {
        return format!(
            ">={}, <={}",
            strip_v(tokens[0]),
            strip_v(tokens[2])
        );
    }

    // npm allows whitespace between an operator and its version (`>= 1.2.0`)
    let mut comparators: Vec<String> = Vec::new();
    let mut pending_op: Option<&str> = None;
    for token in tokens {
        if is_bare_operator(token) {
            pending_op = Some(token);
            continue;
        }
        let comparator = match pending_op.take() {
            Some(op) => format!("{}{}", op, strip_v(token)),
            None => normalize_comparator(token),
        };
        comparators.push(comparator);
    }

    if comparators.is_empty() {
        return "*".to_string();
    }
    comparators.join(", ")
}

fn normalize_comparator(token: &str) -> String {
    let op_len = token
        .find(|c: char| !matches!(c, '<' | '>' | '=' | '^' | '~'))
        .unwrap_or(token.len());
    let (op, version) = token.split_at(op_len);
    let version = strip_v(version);

    if !op.is_empty() {
        return format!("{}{}", op, version);
    }
    let core = version.split(['-', '+']).next().unwrap_or(version);
    if core.contains(['*', 'x', 'X']) {
        return version.to_string();
    }
    format!("={}", version)
}

fn is_bare_operator(token: &str) -> bool {
    matches!(token, "<" | ">" | "=" | "<=" | ">=" | "^" | "~")
}

fn strip_v(version: &str) -> &str {
    version.strip_prefix('v').unwrap_or(version)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn satisfies(version: &str, range: &str) -> bool {
        SupportedRange::parse(range).unwrap().satisfies(version)
    }

    #[test]
    fn test_caret_range() {
        assert!(satisfies("2.0.0", "^2.0.0"));
        assert!(satisfies("2.3.0", "^2.0.0"));
        assert!(!satisfies("1.9.0", "^2.0.0"));
        assert!(!satisfies("3.0.0", "^2.0.0"));
    }

    #[test]
    fn test_tilde_range() {
        assert!(satisfies("1.4.9", "~1.4.0"));
        assert!(!satisfies("1.5.0", "~1.4.0"));
    }

    #[test]
    fn test_bare_version_is_exact() {
        assert!(satisfies("2.1.0", "2.1.0"));
        assert!(!satisfies("2.1.1", "2.1.0"));
    }

    #[test]
    fn test_comparator_set() {
        assert!(satisfies("1.5.0", ">=1.2.0 <2.0.0"));
        assert!(!satisfies("2.0.0", ">=1.2.0 <2.0.0"));
        assert!(satisfies("1.5.0", ">= 1.2.0 < 2.0.0"));
    }

    #[test]
    fn test_hyphen_range() {
        assert!(satisfies("1.2.3", "1.2.3 - 2.3.4"));
        assert!(satisfies("2.3.4", "1.2.3 - 2.3.4"));
        assert!(!satisfies("2.3.5", "1.2.3 - 2.3.4"));
    }

    #[test]
    fn test_alternatives_and_wildcards() {
        assert!(satisfies("1.7.0", "1.x || 3.1.0"));
        assert!(satisfies("3.1.0", "1.x || 3.1.0"));
        assert!(!satisfies("2.0.0", "1.x || 3.1.0"));
        assert!(satisfies("9.9.9", "*"));
    }

    #[test]
    fn test_version_prefixes() {
        assert!(satisfies("v2.3.0", "^2.0.0"));
        assert!(satisfies("=2.3.0", "^2.0.0"));
    }

    #[test]
    fn test_garbage_version_never_satisfies() {
        assert!(!satisfies("not-a-version", "*"));
        assert!(!satisfies("", "^2.0.0"));
    }

    #[test]
    fn test_invalid_range_is_an_error() {
        assert!(SupportedRange::parse("^^2").is_err());
    }
}
