//! Pattern matching for rules: literal substrings or regular expressions.
//!
//! Counting and replacing happen in the same pass, so the reported count is
//! always the number of occurrences that were actually replaced.

use regex::{Regex, RegexBuilder};
use serde::Deserialize;
use std::fmt;
use thiserror::Error;

/// Regex flags a rule may enable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegexFlag {
    /// `^` and `$` match at line boundaries
    Multiline,
    /// `.` also matches `\n`
    #[serde(alias = "dot_all", alias = "s")]
    Dotall,
    #[serde(alias = "case_insensitive", alias = "i")]
    Ignorecase,
    /// Whitespace and `#` comments in the pattern are ignored
    Verbose,
}

impl fmt::Display for RegexFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RegexFlag::Multiline => "multiline",
            RegexFlag::Dotall => "dotall",
            RegexFlag::Ignorecase => "ignorecase",
            RegexFlag::Verbose => "verbose",
        };
        f.write_str(name)
    }
}

#[derive(Error, Debug)]
pub enum PatternError {
    #[error("invalid regex '{pattern}': {source}")]
    InvalidRegex {
        pattern: String,
        source: regex::Error,
    },
}

/// A compiled `from` pattern.
#[derive(Debug, Clone)]
pub enum Matcher {
    /// Exact substring; the replacement is inserted verbatim.
    Literal(String),
    /// Regular expression; the replacement may use `$1` / `${name}`.
    Regex { regex: Regex, flags: Vec<RegexFlag> },
}

/// Output of [`Matcher::substitute`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Substitution {
    pub content: String,
    /// Non-overlapping occurrences found (and replaced).
    pub count: usize,
}

impl Matcher {
    pub fn literal(pattern: impl Into<String>) -> Self {
        Matcher::Literal(pattern.into())
    }

    /// Compile `pattern` with the given flags.
    pub fn regex(pattern: &str, flags: &[RegexFlag]) -> Result<Self, PatternError> {
        let mut builder = RegexBuilder::new(pattern);
        for flag in flags {
            match flag {
                RegexFlag::Multiline => builder.multi_line(true),
                RegexFlag::Dotall => builder.dot_matches_new_line(true),
                RegexFlag::Ignorecase => builder.case_insensitive(true),
                RegexFlag::Verbose => builder.ignore_whitespace(true),
            };
        }
        let regex = builder.build().map_err(|source| PatternError::InvalidRegex {
            pattern: pattern.to_string(),
            source,
        })?;

        let mut unique = Vec::with_capacity(flags.len());
        for flag in flags {
            if !unique.contains(flag) {
                unique.push(*flag);
            }
        }
        Ok(Matcher::Regex {
            regex,
            flags: unique,
        })
    }

    /// The pattern as written.
    pub fn as_str(&self) -> &str {
        match self {
            Matcher::Literal(text) => text,
            Matcher::Regex { regex, .. } => regex.as_str(),
        }
    }

    pub fn is_regex(&self) -> bool {
        matches!(self, Matcher::Regex { .. })
    }

    pub fn flags(&self) -> &[RegexFlag] {
        match self {
            Matcher::Literal(_) => &[],
            Matcher::Regex { flags, .. } => flags,
        }
    }

    /// Count non-overlapping occurrences without replacing.
    pub fn count(&self, content: &str) -> usize {
        match self {
            Matcher::Literal(text) => content.matches(text.as_str()).count(),
            Matcher::Regex { regex, .. } => regex.find_iter(content).count(),
        }
    }

    /// Replace every occurrence in `content` with `replacement`.
    pub fn substitute(&self, content: &str, replacement: &str) -> Substitution {
        match self {
            Matcher::Literal(text) => Substitution {
                count: content.matches(text.as_str()).count(),
                content: content.replace(text.as_str(), replacement),
            },
            Matcher::Regex { regex, .. } => {
                let mut out = String::with_capacity(content.len());
                let mut last = 0;
                let mut count = 0;

                for caps in regex.captures_iter(content) {
                    let Some(whole) = caps.get(0) else { continue };
                    out.push_str(&content[last..whole.start()]);
                    caps.expand(replacement, &mut out);
                    last = whole.end();
                    count += 1;
                }
                out.push_str(&content[last..]);

                Substitution {
                    content: out,
                    count,
                }
            }
        }
    }
}
