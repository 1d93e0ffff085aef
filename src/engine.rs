//! Rule engine - applies find/replace rules and verifies their match counts
//!
//! Each enabled rule reads its target, replaces every occurrence of its
//! pattern and writes the result back, whether or not the number of matches
//! equals the expected count. A wrong count is a [`CountMismatch`]: reported
//! and summed, never fatal. Only I/O, pattern and configuration errors abort
//! a run ([`ApplicationError`]).
//!
//! Rules on one target run strictly in order; each sees the output of the
//! previous one.

use crate::brand::{BrandConfig, BrandError};
use crate::config::schema::{rule_location, RuleDefinition, RuleSet};
use crate::edit::{EditError, OverlayStore, Store};
use crate::pattern::{Matcher, PatternError, RegexFlag, Substitution};
use crate::safety::{SafetyError, SourceRoot};
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, trace};

/// A rule ready to apply: pattern compiled, replacement rendered, condition
/// evaluated.
#[derive(Debug, Clone)]
pub struct Rule {
    pub matcher: Matcher,
    pub replacement: String,
    /// Number of matches the rule expects to find
    pub expected: usize,
    pub enabled: bool,
    pub description: Option<String>,
}

impl Rule {
    pub fn literal(pattern: impl Into<String>, replacement: impl Into<String>) -> Self {
        Self {
            matcher: Matcher::literal(pattern),
            replacement: replacement.into(),
            expected: 1,
            enabled: true,
            description: None,
        }
    }

    pub fn regex(
        pattern: &str,
        replacement: impl Into<String>,
        flags: &[RegexFlag],
    ) -> Result<Self, PatternError> {
        Ok(Self {
            matcher: Matcher::regex(pattern, flags)?,
            ..Self::literal("", replacement)
        })
    }

    pub fn expect(mut self, count: usize) -> Self {
        self.expected = count;
        self
    }

    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn describe(mut self, text: impl Into<String>) -> Self {
        self.description = Some(text.into());
        self
    }
}

/// Rules sharing one target, applied in declaration order.
#[derive(Debug, Clone)]
pub struct RuleGroup {
    /// Target as written in the rule table
    pub name: String,
    pub target: PathBuf,
    pub description: Option<String>,
    pub rules: Vec<Rule>,
}

impl RuleGroup {
    pub fn new(target: impl Into<PathBuf>, rules: Vec<Rule>) -> Self {
        let target = target.into();
        Self {
            name: target.display().to_string(),
            target,
            description: None,
            rules,
        }
    }

    pub fn has_enabled_rules(&self) -> bool {
        self.rules.iter().any(|rule| rule.enabled)
    }
}

/// Actual match count differed from the expected one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CountMismatch {
    pub expected: usize,
    pub actual: usize,
}

impl CountMismatch {
    /// `|actual - expected|`
    pub fn magnitude(&self) -> usize {
        self.actual.abs_diff(self.expected)
    }
}

impl fmt::Display for CountMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "expected {} replacement(s), found {}",
            self.expected, self.actual
        )
    }
}

/// Result of applying a single rule
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use = "RuleOutcome should be checked for count mismatches"]
pub enum RuleOutcome {
    /// Condition was false; the target was not touched
    Skipped,
    /// Every occurrence was replaced and the target rewritten
    Applied { actual: usize, expected: usize },
}

impl RuleOutcome {
    pub fn actual(&self) -> usize {
        match self {
            RuleOutcome::Skipped => 0,
            RuleOutcome::Applied { actual, .. } => *actual,
        }
    }

    pub fn mismatch(&self) -> Option<CountMismatch> {
        match *self {
            RuleOutcome::Applied { actual, expected } if actual != expected => {
                Some(CountMismatch { expected, actual })
            }
            _ => None,
        }
    }

    /// Mismatch magnitude; zero for skipped rules.
    pub fn magnitude(&self) -> usize {
        self.mismatch().map_or(0, |m| m.magnitude())
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, RuleOutcome::Skipped)
    }
}

/// Outcomes of one group, in rule order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupReport {
    pub name: String,
    pub target: PathBuf,
    pub outcomes: Vec<RuleOutcome>,
}

impl GroupReport {
    pub fn total_mismatch(&self) -> usize {
        self.outcomes.iter().map(RuleOutcome::magnitude).sum()
    }

    /// `(rule index, mismatch)` for every rule whose count was off.
    pub fn mismatches(&self) -> impl Iterator<Item = (usize, CountMismatch)> + '_ {
        self.outcomes
            .iter()
            .enumerate()
            .filter_map(|(idx, outcome)| outcome.mismatch().map(|m| (idx, m)))
    }

    /// Whether any rule rewrote the target.
    pub fn touched(&self) -> bool {
        self.outcomes.iter().any(|outcome| !outcome.is_skipped())
    }
}

/// Outcomes of a whole run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    pub groups: Vec<GroupReport>,
}

impl RunReport {
    /// Sum of all mismatch magnitudes; zero means every rule matched exactly.
    pub fn total_mismatch(&self) -> usize {
        self.groups.iter().map(GroupReport::total_mismatch).sum()
    }

    pub fn is_clean(&self) -> bool {
        self.total_mismatch() == 0
    }

    pub fn applied(&self) -> usize {
        self.outcomes().filter(|o| !o.is_skipped()).count()
    }

    pub fn skipped(&self) -> usize {
        self.outcomes().filter(|o| o.is_skipped()).count()
    }

    fn outcomes(&self) -> impl Iterator<Item = &RuleOutcome> {
        self.groups.iter().flat_map(|g| g.outcomes.iter())
    }

    /// Targets rewritten at least once, deduplicated, in first-touch order.
    pub fn touched_targets(&self) -> Vec<&Path> {
        let mut targets: Vec<&Path> = Vec::new();
        for group in self.groups.iter().filter(|g| g.touched()) {
            if !targets.contains(&group.target.as_path()) {
                targets.push(&group.target);
            }
        }
        targets
    }
}

/// Errors that abort a run
#[derive(Error, Debug)]
pub enum ApplicationError {
    #[error(transparent)]
    Edit(#[from] EditError),

    #[error(transparent)]
    Safety(#[from] SafetyError),

    #[error("rule '{location}': {source}")]
    Pattern {
        location: String,
        source: PatternError,
    },

    #[error("rule '{location}': {source}")]
    Brand {
        location: String,
        source: BrandError,
    },
}

/// Receives outcomes while a run is in progress.
///
/// Everything up to a fatal error has already been reported when the error
/// is returned.
pub trait Observer {
    fn group_started(&mut self, _group: &RuleGroup) {}

    fn rule_finished(&mut self, group: &RuleGroup, index: usize, outcome: &RuleOutcome);

    /// Called once per group that rewrote its target, with the content before
    /// the first rule and after the last one.
    fn content_changed(&mut self, _group: &RuleGroup, _before: &str, _after: &str) {}

    fn group_finished(&mut self, _group: &RuleGroup, _report: &GroupReport) {}
}

impl Observer for () {
    fn rule_finished(&mut self, _group: &RuleGroup, _index: usize, _outcome: &RuleOutcome) {}
}

/// Resolve a rule table against a brand configuration and source root.
///
/// Renders every replacement, evaluates every condition and compiles every
/// regex up front, so configuration errors abort before any file is written.
/// Targets of groups with at least one enabled rule must exist.
pub fn resolve(
    rules: &RuleSet,
    brand: &BrandConfig,
    root: &SourceRoot,
) -> Result<Vec<RuleGroup>, ApplicationError> {
    let mut groups = Vec::with_capacity(rules.groups.len());

    for (group_idx, group) in rules.groups.iter().enumerate() {
        let resolved_rules = group
            .rules
            .iter()
            .enumerate()
            .map(|(idx, rule)| {
                resolve_rule(rule, brand, &rule_location(group_idx, &group.file, idx))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let mut resolved = RuleGroup {
            name: group.file.clone(),
            target: root.join(&group.file),
            description: group.description.clone(),
            rules: resolved_rules,
        };
        if resolved.has_enabled_rules() {
            resolved.target = root.validate_path(&group.file)?;
        }

        groups.push(resolved);
    }

    Ok(groups)
}

fn resolve_rule(
    rule: &RuleDefinition,
    brand: &BrandConfig,
    location: &str,
) -> Result<Rule, ApplicationError> {
    let brand_error = |source| ApplicationError::Brand {
        location: location.to_string(),
        source,
    };

    let enabled = rule.condition.evaluate(brand).map_err(brand_error)?;

    let (matcher, replacement) = if rule.regex {
        let matcher =
            Matcher::regex(&rule.from, &rule.flags).map_err(|source| ApplicationError::Pattern {
                location: location.to_string(),
                source,
            })?;
        let replacement = brand
            .render_regex_replacement(&rule.to)
            .map_err(brand_error)?;
        (matcher, replacement)
    } else {
        let replacement = brand.render(&rule.to).map_err(brand_error)?;
        (Matcher::literal(rule.from.as_str()), replacement)
    };

    Ok(Rule {
        matcher,
        replacement,
        expected: rule.times,
        enabled,
        description: rule.description.clone(),
    })
}

struct Executed {
    before: String,
    after: String,
    actual: usize,
}

fn execute(
    store: &mut impl Store,
    target: &Path,
    rule: &Rule,
) -> Result<Option<Executed>, ApplicationError> {
    if !rule.enabled {
        trace!(path = %target.display(), pattern = rule.matcher.as_str(), "condition not met");
        return Ok(None);
    }

    let before = store.read(target)?;
    let Substitution {
        content: after,
        count,
    } = rule.matcher.substitute(&before, &rule.replacement);

    // Written even when the count is off; mismatches are reported, not prevented
    store.write(target, &after)?;

    debug!(
        path = %target.display(),
        actual = count,
        expected = rule.expected,
        "applied rule"
    );

    Ok(Some(Executed {
        before,
        after,
        actual: count,
    }))
}

/// Apply one rule to `target`.
///
/// A disabled rule performs no I/O and returns [`RuleOutcome::Skipped`].
pub fn apply_rule(
    store: &mut impl Store,
    target: &Path,
    rule: &Rule,
) -> Result<RuleOutcome, ApplicationError> {
    Ok(match execute(store, target, rule)? {
        None => RuleOutcome::Skipped,
        Some(executed) => RuleOutcome::Applied {
            actual: executed.actual,
            expected: rule.expected,
        },
    })
}

/// Apply every rule of `group` in order.
pub fn apply_rule_group<S, O>(
    store: &mut S,
    group: &RuleGroup,
    observer: &mut O,
) -> Result<GroupReport, ApplicationError>
where
    S: Store,
    O: Observer + ?Sized,
{
    observer.group_started(group);

    let mut outcomes = Vec::with_capacity(group.rules.len());
    let mut original: Option<String> = None;
    let mut current: Option<String> = None;

    for (idx, rule) in group.rules.iter().enumerate() {
        let outcome = match execute(store, &group.target, rule)? {
            None => RuleOutcome::Skipped,
            Some(executed) => {
                original.get_or_insert(executed.before);
                current = Some(executed.after);
                RuleOutcome::Applied {
                    actual: executed.actual,
                    expected: rule.expected,
                }
            }
        };
        observer.rule_finished(group, idx, &outcome);
        outcomes.push(outcome);
    }

    if let (Some(before), Some(after)) = (&original, &current) {
        observer.content_changed(group, before, after);
    }

    let report = GroupReport {
        name: group.name.clone(),
        target: group.target.clone(),
        outcomes,
    };
    observer.group_finished(group, &report);

    Ok(report)
}

/// Apply every group in declaration order.
pub fn apply_all<S, O>(
    store: &mut S,
    groups: &[RuleGroup],
    observer: &mut O,
) -> Result<RunReport, ApplicationError>
where
    S: Store,
    O: Observer + ?Sized,
{
    let mut report = RunReport::default();
    for group in groups {
        report.groups.push(apply_rule_group(store, group, observer)?);
    }
    Ok(report)
}

/// Run every group against an in-memory overlay; nothing is written to disk.
pub fn check_all<O>(groups: &[RuleGroup], observer: &mut O) -> Result<RunReport, ApplicationError>
where
    O: Observer + ?Sized,
{
    apply_all(&mut OverlayStore::new(), groups, observer)
}
