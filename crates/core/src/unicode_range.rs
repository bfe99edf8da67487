//! Parsing of CSS `unicode-range` style specifications.
//!
//! Accepts comma-separated tokens of the form `U+HHHH` or `U+HHHH-HHHH`.
//! Malformed tokens are skipped with a warning; parsing never fails.

use std::{collections::BTreeSet, fmt};

use log::warn;

/// Highest valid Unicode codepoint.
pub const MAX_CODEPOINT: u32 = 0x10FFFF;

/// A token that was skipped while parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseWarning {
    pub token: String,
    pub reason: &'static str,
}

impl fmt::Display for ParseWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid unicode range token '{}': {}", self.token, self.reason)
    }
}

/// Parsed codepoints plus the tokens that could not be parsed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UnicodeRange {
    pub codepoints: BTreeSet<u32>,
    pub warnings: Vec<ParseWarning>,
}

impl UnicodeRange {
    /// Parse a range specification, collecting warnings instead of logging them.
    pub fn parse(spec: &str) -> Self {
        let mut result = Self::default();

        for token in spec.split(',').map(str::trim).filter(|t| !t.is_empty()) {
            match parse_token(token) {
                Ok((start, end)) => result.codepoints.extend(start..=end),
                Err(reason) => {
                    result.warnings.push(ParseWarning { token: token.to_string(), reason })
                }
            }
        }

        result
    }
}

/// Parse a range specification into a set of codepoints.
///
/// Malformed tokens are logged and skipped.
pub fn parse_unicode_range(spec: &str) -> BTreeSet<u32> {
    let parsed = UnicodeRange::parse(spec);
    for warning in &parsed.warnings {
        warn!("{warning}");
    }
    parsed.codepoints
}

fn parse_token(token: &str) -> Result<(u32, u32), &'static str> {
    let (start, end) = match token.split_once('-') {
        Some((start, end)) => (parse_bound(start)?, parse_bound(end)?),
        None => {
            let cp = parse_bound(token)?;
            (cp, cp)
        }
    };

    if start > end {
        return Err("range start is greater than range end");
    }
    Ok((start, end))
}

fn parse_bound(bound: &str) -> Result<u32, &'static str> {
    let bound = bound.trim();
    let digits = match bound.get(..2) {
        Some(prefix) if prefix.eq_ignore_ascii_case("u+") => bound[2..].trim_start(),
        _ => bound,
    };

    if digits.is_empty() {
        return Err("missing bound");
    }
    if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err("not a hexadecimal value");
    }

    let value = u32::from_str_radix(digits, 16).map_err(|_| "value out of range")?;
    if value > MAX_CODEPOINT {
        return Err("value above U+10FFFF");
    }
    Ok(value)
}
