//! Rule table loading.
//!
//! Tables come from three places: the tables compiled into the binary, a
//! single `.toml` file, or every `.toml` file directly inside a directory.
//! Every table is validated as it is loaded, and each loaded table is paired
//! with its [`TableSource`] so later errors can name it.

use crate::config::schema::{RuleSet, ValidationError};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

/// Rule tables shipped with the tool, in application order.
pub const BUILTIN_TABLES: &[(&str, &str)] = &[
    ("branding.toml", include_str!("../../rules/branding.toml")),
    ("ui_edits.toml", include_str!("../../rules/ui_edits.toml")),
];

/// Where a rule table was read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableSource {
    Builtin(&'static str),
    File(PathBuf),
}

impl fmt::Display for TableSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TableSource::Builtin(name) => write!(f, "built-in {}", name),
            TableSource::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// A validated rule table and its origin.
pub type LoadedTable = (TableSource, RuleSet);

#[derive(Debug)]
pub enum ConfigError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Walk {
        dir: PathBuf,
        source: walkdir::Error,
    },
    EmptyDir {
        dir: PathBuf,
    },
    Toml {
        origin: Option<TableSource>,
        source: toml_edit::de::Error,
    },
    Validation {
        origin: Option<TableSource>,
        source: ValidationError,
    },
}

impl ConfigError {
    fn with_origin(self, origin: TableSource) -> Self {
        match self {
            ConfigError::Toml { origin: None, source } => ConfigError::Toml {
                origin: Some(origin),
                source,
            },
            ConfigError::Validation { origin: None, source } => ConfigError::Validation {
                origin: Some(origin),
                source,
            },
            other => other,
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io { path, source } => {
                write!(f, "failed to read rule table {}: {}", path.display(), source)
            }
            ConfigError::Walk { dir, source } => {
                write!(f, "failed to list rule tables in {}: {}", dir.display(), source)
            }
            ConfigError::EmptyDir { dir } => {
                write!(f, "no .toml rule tables found in {}", dir.display())
            }
            ConfigError::Toml { origin, source } => match origin {
                Some(origin) => write!(f, "failed to parse rule table {}: {}", origin, source),
                None => write!(f, "failed to parse rule table: {}", source),
            },
            ConfigError::Validation { origin, source } => match origin {
                Some(origin) => write!(f, "invalid rule table {}:\n{}", origin, source),
                None => write!(f, "invalid rule table:\n{}", source),
            },
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io { source, .. } => Some(source),
            ConfigError::Walk { source, .. } => Some(source),
            ConfigError::EmptyDir { .. } => None,
            ConfigError::Toml { source, .. } => Some(source),
            ConfigError::Validation { source, .. } => Some(source),
        }
    }
}

/// Parse and validate a rule table.
pub fn load_from_str(input: &str) -> Result<RuleSet, ConfigError> {
    let rules: RuleSet = toml_edit::de::from_str(input).map_err(|source| ConfigError::Toml {
        origin: None,
        source,
    })?;
    rules.validate().map_err(|source| ConfigError::Validation {
        origin: None,
        source,
    })?;
    Ok(rules)
}

pub fn load_from_path(path: impl AsRef<Path>) -> Result<RuleSet, ConfigError> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    load_from_str(&contents)
        .map_err(|error| error.with_origin(TableSource::File(path.to_path_buf())))
}

/// The tables compiled into the binary.
pub fn load_builtin() -> Result<Vec<LoadedTable>, ConfigError> {
    BUILTIN_TABLES
        .iter()
        .map(|&(name, contents)| -> Result<LoadedTable, ConfigError> {
            let origin = TableSource::Builtin(name);
            let rules =
                load_from_str(contents).map_err(|error| error.with_origin(origin.clone()))?;
            Ok((origin, rules))
        })
        .collect()
}

/// Every `.toml` file directly inside `dir`, sorted by file name.
///
/// A directory without any table is an error.
pub fn load_from_dir(dir: impl AsRef<Path>) -> Result<Vec<LoadedTable>, ConfigError> {
    let dir = dir.as_ref();

    let mut files = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1) {
        let entry = entry.map_err(|source| ConfigError::Walk {
            dir: dir.to_path_buf(),
            source,
        })?;
        if entry.file_type().is_file()
            && entry.path().extension().and_then(|s| s.to_str()) == Some("toml")
        {
            files.push(entry.into_path());
        }
    }

    if files.is_empty() {
        return Err(ConfigError::EmptyDir {
            dir: dir.to_path_buf(),
        });
    }
    files.sort();

    files
        .into_iter()
        .map(|path| -> Result<LoadedTable, ConfigError> {
            let rules = load_from_path(&path)?;
            Ok((TableSource::File(path), rules))
        })
        .collect()
}

/// Load the tables named on the command line, or the built-in ones when
/// `paths` is empty. A directory contributes every table inside it.
pub fn load_tables(paths: &[PathBuf]) -> Result<Vec<LoadedTable>, ConfigError> {
    let tables = if paths.is_empty() {
        load_builtin()?
    } else {
        let mut tables = Vec::new();
        for path in paths {
            if path.is_dir() {
                tables.extend(load_from_dir(path)?);
            } else {
                tables.push((TableSource::File(path.clone()), load_from_path(path)?));
            }
        }
        tables
    };

    for (origin, rules) in &tables {
        debug!(
            %origin,
            groups = rules.groups.len(),
            rules = rules.rule_count(),
            "loaded rule table"
        );
    }

    Ok(tables)
}
