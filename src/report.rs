//! Console trace of a run.
//!
//! Every rule is printed with its target, pattern, replacement and the
//! actual/expected count, so a maintainer can audit exactly what changed.
//! Count mismatches get a banner that is hard to miss in CI logs.

use crate::config::rule_location;
use crate::engine::{Observer, RuleGroup, RuleOutcome, RunReport};
use colored::Colorize;
use similar::{ChangeTag, TextDiff};
use std::fmt::Write as _;
use std::path::Path;

const MISMATCH_BANNER: &str = "\
┌──────────────────────────────────────────┐
│ ERROR: incorrect number of replacements! │
└──────────────────────────────────────────┘";

/// Indent every line of `text` with a tab.
fn indented(text: &str) -> String {
    if text.is_empty() {
        return "\t".to_string();
    }
    text.lines()
        .map(|line| format!("\t{line}"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Trace for one rule, without a trailing newline.
pub fn rule_trace(group: &RuleGroup, index: usize, outcome: &RuleOutcome) -> String {
    let Some(rule) = group.rules.get(index) else {
        return String::new();
    };

    let mut out = String::new();
    let _ = write!(out, "{}:", group.name.bold());

    if let Some(description) = &rule.description {
        let _ = write!(out, " {}", format!("({description})").dimmed());
    }

    match outcome {
        RuleOutcome::Skipped => {
            let _ = write!(out, " {}", "condition not met, skipping".cyan());
        }
        RuleOutcome::Applied { actual, expected } => {
            let counts = format!("replaced {actual}/{expected} times:");
            let counts = if actual == expected {
                counts.green()
            } else {
                counts.red()
            };
            let _ = writeln!(out, " {counts}");

            if rule.matcher.is_regex() {
                let flags = rule
                    .matcher
                    .flags()
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>();
                let flags = if flags.is_empty() {
                    "none".to_string()
                } else {
                    flags.join(", ")
                };
                let _ = writeln!(out, "{}", format!("(regex enabled, flags: {flags})").dimmed());
            }

            let _ = writeln!(out, "{}", indented(rule.matcher.as_str()));
            let _ = writeln!(out, "\t=>");
            let _ = write!(out, "{}", indented(&rule.replacement));

            if actual != expected {
                let _ = write!(out, "\n{}", MISMATCH_BANNER.red().bold());
            }
        }
    }

    out
}

/// Unified diff between two versions of a target.
pub fn content_diff(name: &str, before: &str, after: &str) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", format!("--- {name} (original)").dimmed());
    let _ = writeln!(out, "{}", format!("+++ {name} (rebranded)").dimmed());

    let diff = TextDiff::from_lines(before, after);
    for change in diff.iter_all_changes() {
        let line = match change.tag() {
            ChangeTag::Delete => format!("-{change}").red(),
            ChangeTag::Insert => format!("+{change}").green(),
            ChangeTag::Equal => continue,
        };
        let _ = write!(out, "{line}");
        if change.missing_newline() {
            out.push('\n');
        }
    }

    out
}

/// Summary block printed after a run.
pub fn summary(report: &RunReport, root: &Path) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", "Summary:".bold());
    let _ = writeln!(out, "  {} applied", report.applied().to_string().green());
    let _ = writeln!(out, "  {} skipped", report.skipped().to_string().cyan());

    for (group_idx, group) in report.groups.iter().enumerate() {
        for (idx, mismatch) in group.mismatches() {
            let location = rule_location(group_idx, &group.name, idx);
            let _ = writeln!(out, "  {} {}: {}", "✗".red(), location, mismatch);
        }
    }

    let total = report.total_mismatch();
    let total_text = format!("errors: {total}");
    let _ = writeln!(
        out,
        "  {}",
        if total == 0 {
            total_text.green()
        } else {
            total_text.red().bold()
        }
    );

    let touched = report.touched_targets();
    if !touched.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "The following files (might) have been changed:");
        let names = touched
            .iter()
            .map(|target| {
                target
                    .strip_prefix(root)
                    .unwrap_or(target)
                    .display()
                    .to_string()
            })
            .collect::<Vec<_>>();
        let _ = write!(out, "{}", names.join(" "));
    }

    out
}

/// Prints the trace to stdout as rules finish.
#[derive(Debug, Default)]
pub struct ConsoleReporter {
    show_diff: bool,
}

impl ConsoleReporter {
    pub fn new(show_diff: bool) -> Self {
        Self { show_diff }
    }
}

impl Observer for ConsoleReporter {
    fn group_started(&mut self, group: &RuleGroup) {
        if let Some(description) = &group.description {
            println!("{}", format!("# {description}").dimmed());
        }
    }

    fn rule_finished(&mut self, group: &RuleGroup, index: usize, outcome: &RuleOutcome) {
        println!("{}", rule_trace(group, index, outcome));
        println!();
    }

    fn content_changed(&mut self, group: &RuleGroup, before: &str, after: &str) {
        if self.show_diff && before != after {
            println!("{}", content_diff(&group.name, before, after));
        }
    }
}
