pub mod builder;
pub mod loader;
pub mod schema;

pub use builder::RuleSetBuilder;
pub use loader::{
    load_builtin, load_from_dir, load_from_path, load_from_str, load_tables, ConfigError,
    LoadedTable, TableSource, BUILTIN_TABLES,
};
pub use schema::{
    rule_location, GroupDefinition, Metadata, RuleDefinition, RuleSet, ValidationError,
    ValidationIssue,
};
