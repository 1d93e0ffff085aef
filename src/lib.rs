//! Rebrand Patcher: declarative white-labeling of a source tree
//!
//! A rule table names target files and, per target, an ordered list of
//! find/replace rules. Every rule states how many matches it expects to find.
//! Applying a rule replaces *every* occurrence and writes the file back; a
//! wrong match count is reported as a mismatch, summed over the run, and
//! turned into a non-zero exit by the CLI. Silent drift between the rules and
//! an evolving upstream tree is what the counts catch.
//!
//! # Architecture
//!
//! - [`config`]: TOML rule tables (built-in or from disk), validation and a
//!   builder
//! - [`brand`]: the JSON brand configuration, `{{field}}` templates and rule
//!   conditions
//! - [`engine`]: resolves a rule table against a brand configuration, then
//!   applies it through a [`edit::Store`]
//! - [`report`]: the console trace of a run
//! - [`relocate`]: copies generated image assets into the tree
//!
//! # Safety
//!
//! - Every template, condition and regex is resolved before the first write
//! - Atomic file writes (tempfile + fsync + rename), permissions preserved
//! - Targets must stay inside the source root and out of `.git/`
//! - UTF-8 validation on read
//!
//! # Example
//!
//! ```no_run
//! use rebrand_patcher::{apply_all, resolve, BrandConfig, FileStore, RuleSetBuilder, SourceRoot};
//! use rebrand_patcher::config::RuleDefinition;
//!
//! let rules = RuleSetBuilder::new("branding")
//!     .group(
//!         "res/rustdesk.desktop",
//!         vec![RuleDefinition::replace("Name=RustDesk", "Name={{app_name}}")],
//!     )
//!     .build()?;
//! let brand = BrandConfig::from_json(r#"{"app_name": "Acme Remote"}"#)?;
//! let root = SourceRoot::new("/src/rustdesk")?;
//!
//! let groups = resolve(&rules, &brand, &root)?;
//! let report = apply_all(&mut FileStore, &groups, &mut ())?;
//! println!("errors: {}", report.total_mismatch());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod brand;
pub mod config;
pub mod edit;
pub mod engine;
pub mod pattern;
pub mod relocate;
pub mod report;
pub mod safety;

// Re-exports
pub use brand::{BrandConfig, BrandError, Condition};
pub use config::{
    load_builtin, load_from_dir, load_from_path, load_from_str, load_tables, ConfigError,
    RuleSet, RuleSetBuilder, TableSource, ValidationError,
};
pub use edit::{EditError, FileStore, OverlayStore, Store};
pub use engine::{
    apply_all, apply_rule, apply_rule_group, check_all, resolve, ApplicationError,
    CountMismatch, GroupReport, Observer, Rule, RuleGroup, RuleOutcome, RunReport,
};
pub use pattern::{Matcher, PatternError, RegexFlag};
pub use relocate::{relocate_assets, RelocateError, Relocation};
pub use report::ConsoleReporter;
pub use safety::{SafetyError, SourceRoot};
