use crate::brand::Condition;
use crate::pattern::{Matcher, RegexFlag};
use serde::Deserialize;
use std::fmt;

/// A rule table: ordered groups of find/replace rules.
#[derive(Debug, Deserialize, Default, Clone)]
pub struct RuleSet {
    #[serde(default)]
    pub meta: Metadata,
    #[serde(default)]
    pub groups: Vec<GroupDefinition>,
}

impl RuleSet {
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut issues = Vec::new();

        if self.groups.is_empty() {
            issues.push(ValidationIssue::EmptyRuleSet);
        }

        for (group_idx, group) in self.groups.iter().enumerate() {
            let group_location = format!("group {}", group_idx + 1);

            if group.file.trim().is_empty() {
                issues.push(ValidationIssue::MissingField {
                    location: Some(group_location.clone()),
                    field: "file",
                });
            }
            if group.rules.is_empty() {
                issues.push(ValidationIssue::EmptyGroup {
                    location: group_location,
                });
            }

            for (rule_idx, rule) in group.rules.iter().enumerate() {
                let location = Some(rule_location(group_idx, &group.file, rule_idx));

                if rule.from.is_empty() {
                    issues.push(ValidationIssue::MissingField {
                        location: location.clone(),
                        field: "from",
                    });
                    continue;
                }

                if !rule.regex && !rule.flags.is_empty() {
                    issues.push(ValidationIssue::InvalidCombo {
                        location: location.clone(),
                        message: "flags require regex = true".to_string(),
                    });
                }

                if rule.regex {
                    if let Err(e) = Matcher::regex(&rule.from, &rule.flags) {
                        issues.push(ValidationIssue::InvalidPattern {
                            location,
                            message: e.to_string(),
                        });
                    }
                }
            }
        }

        if issues.is_empty() {
            Ok(())
        } else {
            Err(ValidationError { issues })
        }
    }

    /// Total number of rules across all groups.
    pub fn rule_count(&self) -> usize {
        self.groups.iter().map(|g| g.rules.len()).sum()
    }
}

/// `<file>#<n> (group <g>)` with 1-based indices, used in diagnostics.
///
/// A target may appear in several groups, so the group ordinal is part of
/// the location.
pub fn rule_location(group_idx: usize, file: &str, rule_idx: usize) -> String {
    format!("{}#{} (group {})", file, rule_idx + 1, group_idx + 1)
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct Metadata {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// Rules sharing one target file, applied in order.
#[derive(Debug, Deserialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct GroupDefinition {
    /// Target path relative to the source root
    pub file: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub rules: Vec<RuleDefinition>,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct RuleDefinition {
    /// Literal text, or a regex when `regex = true`
    pub from: String,
    /// Replacement template; empty removes the match
    #[serde(default)]
    pub to: String,
    /// Expected number of matches
    #[serde(default = "default_times")]
    pub times: usize,
    #[serde(default, rename = "if")]
    pub condition: Condition,
    #[serde(default)]
    pub regex: bool,
    #[serde(default)]
    pub flags: Vec<RegexFlag>,
    #[serde(default)]
    pub description: Option<String>,
}

fn default_times() -> usize {
    1
}

#[derive(Debug, Clone)]
pub struct ValidationError {
    pub issues: Vec<ValidationIssue>,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, issue) in self.issues.iter().enumerate() {
            if idx > 0 {
                writeln!(f)?;
            }
            write!(f, "{issue}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

#[derive(Debug, Clone)]
pub enum ValidationIssue {
    EmptyRuleSet,
    EmptyGroup {
        location: String,
    },
    MissingField {
        location: Option<String>,
        field: &'static str,
    },
    InvalidCombo {
        location: Option<String>,
        message: String,
    },
    InvalidPattern {
        location: Option<String>,
        message: String,
    },
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationIssue::EmptyRuleSet => write!(f, "rule set contains no groups"),
            ValidationIssue::EmptyGroup { location } => write!(f, "{location} has no rules"),
            ValidationIssue::MissingField { location, field } => match location {
                Some(loc) => write!(f, "rule '{loc}' missing required field '{field}'"),
                None => write!(f, "rule missing required field '{field}'"),
            },
            ValidationIssue::InvalidCombo { location, message } => match location {
                Some(loc) => write!(f, "rule '{loc}' has invalid configuration: {message}"),
                None => write!(f, "invalid rule configuration: {message}"),
            },
            ValidationIssue::InvalidPattern { location, message } => match location {
                Some(loc) => write!(f, "rule '{loc}' has invalid pattern: {message}"),
                None => write!(f, "invalid rule pattern: {message}"),
            },
        }
    }
}
