//! Building rule tables in code instead of TOML.
//!
//! ```
//! use rebrand_patcher::config::{RuleDefinition, RuleSetBuilder};
//!
//! let rules = RuleSetBuilder::new("custom-text")
//!     .group(
//!         "Cargo.toml",
//!         [
//!             RuleDefinition::replace("\"RustDesk Remote Desktop\"", "\"{{description}}\"").times(2),
//!             RuleDefinition::replace("com.carriez.rustdesk", "{{identifier}}"),
//!         ],
//!     )
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(rules.rule_count(), 2);
//! ```

use crate::brand::Condition;
use crate::config::schema::{GroupDefinition, Metadata, RuleDefinition, RuleSet, ValidationError};
use crate::pattern::RegexFlag;

#[derive(Debug, Default, Clone)]
pub struct RuleSetBuilder {
    rules: RuleSet,
}

impl RuleSetBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            rules: RuleSet {
                meta: Metadata {
                    name: name.into(),
                    description: None,
                },
                groups: Vec::new(),
            },
        }
    }

    pub fn description(mut self, text: impl Into<String>) -> Self {
        self.rules.meta.description = Some(text.into());
        self
    }

    /// Append a group of rules for `file`.
    pub fn group(
        mut self,
        file: impl Into<String>,
        rules: impl IntoIterator<Item = RuleDefinition>,
    ) -> Self {
        self.rules.groups.push(GroupDefinition {
            file: file.into(),
            description: None,
            rules: rules.into_iter().collect(),
        });
        self
    }

    /// Append a group with a description shown in the trace.
    pub fn described_group(
        mut self,
        file: impl Into<String>,
        description: impl Into<String>,
        rules: impl IntoIterator<Item = RuleDefinition>,
    ) -> Self {
        self.rules.groups.push(GroupDefinition {
            file: file.into(),
            description: Some(description.into()),
            rules: rules.into_iter().collect(),
        });
        self
    }

    pub fn build(self) -> Result<RuleSet, ValidationError> {
        self.rules.validate()?;
        Ok(self.rules)
    }
}

impl RuleDefinition {
    /// Literal replacement expected once.
    pub fn replace(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            times: 1,
            condition: Condition::default(),
            regex: false,
            flags: Vec::new(),
            description: None,
        }
    }

    /// Literal removal expected once.
    pub fn remove(from: impl Into<String>) -> Self {
        Self::replace(from, "")
    }

    /// Regex replacement expected once.
    pub fn regex(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            regex: true,
            ..Self::replace(from, to)
        }
    }

    pub fn times(mut self, times: usize) -> Self {
        self.times = times;
        self
    }

    pub fn when(mut self, condition: impl Into<Condition>) -> Self {
        self.condition = condition.into();
        self
    }

    pub fn flag(mut self, flag: RegexFlag) -> Self {
        if !self.flags.contains(&flag) {
            self.flags.push(flag);
        }
        self
    }

    pub fn describe(mut self, text: impl Into<String>) -> Self {
        self.description = Some(text.into());
        self
    }
}
