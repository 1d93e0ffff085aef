//! Brand configuration: the white-label values rules substitute into the tree.
//!
//! The configuration is a flat JSON object (`app_name`, `company`,
//! `identifier`, ...). Rule replacements and conditions reference its fields
//! with `{{field}}` placeholders. There are no defaults: a placeholder naming
//! a field the configuration lacks is an error.
//!
//! Two fields are filled in when the configuration does not set them:
//! - `org`: `identifier` without its last dot-separated segment
//! - `year`: the current calendar year

use chrono::Datelike;
use regex::Regex;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BrandError {
    #[error("failed to read brand configuration from {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid brand configuration JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("brand configuration must be a JSON object")]
    NotAnObject,

    #[error("unknown brand field '{name}'{}", did_you_mean(.suggestion))]
    MissingField {
        name: String,
        suggestion: Option<String>,
    },

    #[error("brand field '{name}' is not a scalar value")]
    NotScalar { name: String },
}

fn did_you_mean(suggestion: &Option<String>) -> String {
    match suggestion {
        Some(name) => format!(" (did you mean '{name}'?)"),
        None => String::new(),
    }
}

fn placeholder_regex() -> &'static Regex {
    static PLACEHOLDER: OnceLock<Regex> = OnceLock::new();
    PLACEHOLDER.get_or_init(|| {
        Regex::new(r"\{\{\s*([A-Za-z_][A-Za-z0-9_]*)\s*\}\}")
            .expect("placeholder pattern is a valid regex")
    })
}

/// Field names referenced by `template`, in order of appearance.
pub fn placeholders(template: &str) -> impl Iterator<Item = &str> {
    placeholder_regex()
        .captures_iter(template)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// The field name if `text` consists of exactly one placeholder.
fn single_placeholder(text: &str) -> Option<&str> {
    let text = text.trim();
    let caps = placeholder_regex().captures(text)?;
    let whole = caps.get(0)?;
    if whole.start() == 0 && whole.end() == text.len() {
        caps.get(1).map(|m| m.as_str())
    } else {
        None
    }
}

/// Immutable set of named brand values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BrandConfig {
    fields: BTreeMap<String, Value>,
}

impl BrandConfig {
    pub fn from_json(input: &str) -> Result<Self, BrandError> {
        match serde_json::from_str(input)? {
            Value::Object(map) => Ok(Self::from_map(map)),
            _ => Err(BrandError::NotAnObject),
        }
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, BrandError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| BrandError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&contents)
    }

    /// Build from a JSON object, filling in `org` and `year` when absent.
    pub fn from_map(map: Map<String, Value>) -> Self {
        let mut fields: BTreeMap<String, Value> = map.into_iter().collect();

        if !fields.contains_key("org") {
            let org = fields
                .get("identifier")
                .and_then(Value::as_str)
                .map(|identifier| match identifier.rsplit_once('.') {
                    Some((org, _)) => org.to_string(),
                    None => String::new(),
                });
            if let Some(org) = org {
                fields.insert("org".to_string(), Value::String(org));
            }
        }

        fields
            .entry("year".to_string())
            .or_insert_with(|| Value::from(chrono::Local::now().year()));

        Self { fields }
    }

    /// Set a field, replacing any previous value.
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    pub fn field(&self, name: &str) -> Result<&Value, BrandError> {
        self.fields
            .get(name)
            .ok_or_else(|| BrandError::MissingField {
                name: name.to_string(),
                suggestion: self.closest_field(name),
            })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Replace every `{{field}}` in `template` with the field's text.
    pub fn render(&self, template: &str) -> Result<String, BrandError> {
        self.render_with(template, |text| Cow::Borrowed(text))
    }

    /// Like [`render`](Self::render), escaping `$` in substituted values so
    /// they stay literal inside a regex replacement.
    pub fn render_regex_replacement(&self, template: &str) -> Result<String, BrandError> {
        self.render_with(template, |text| {
            if text.contains('$') {
                Cow::Owned(text.replace('$', "$$"))
            } else {
                Cow::Borrowed(text)
            }
        })
    }

    fn render_with(
        &self,
        template: &str,
        escape: impl Fn(&str) -> Cow<'_, str>,
    ) -> Result<String, BrandError> {
        let mut out = String::with_capacity(template.len());
        let mut last = 0;

        for caps in placeholder_regex().captures_iter(template) {
            let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            out.push_str(&template[last..whole.start()]);
            let text = self.scalar_text(name.as_str())?;
            out.push_str(&escape(&text));
            last = whole.end();
        }
        out.push_str(&template[last..]);

        Ok(out)
    }

    fn scalar_text(&self, name: &str) -> Result<String, BrandError> {
        match self.field(name)? {
            Value::String(text) => Ok(text.clone()),
            Value::Null => Ok(String::new()),
            Value::Bool(flag) => Ok(flag.to_string()),
            Value::Number(number) => Ok(number.to_string()),
            Value::Array(_) | Value::Object(_) => Err(BrandError::NotScalar {
                name: name.to_string(),
            }),
        }
    }

    fn closest_field(&self, name: &str) -> Option<String> {
        self.fields
            .keys()
            .map(|candidate| (strsim::jaro_winkler(name, candidate), candidate))
            .filter(|(score, _)| *score >= 0.8)
            .max_by(|a, b| a.0.total_cmp(&b.0))
            .map(|(_, candidate)| candidate.clone())
    }
}

/// The `if` predicate of a rule.
///
/// Accepts a real boolean, an integer (`0` is false) or a string. Strings are
/// rendered against the brand configuration; a string that is exactly one
/// placeholder takes the truthiness of the referenced value itself.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum Condition {
    Bool(bool),
    Int(i64),
    Text(String),
}

impl Default for Condition {
    fn default() -> Self {
        Condition::Bool(true)
    }
}

impl From<bool> for Condition {
    fn from(value: bool) -> Self {
        Condition::Bool(value)
    }
}

impl From<&str> for Condition {
    fn from(value: &str) -> Self {
        Condition::Text(value.to_string())
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Condition::Bool(flag) => write!(f, "{flag}"),
            Condition::Int(number) => write!(f, "{number}"),
            Condition::Text(text) => write!(f, "{text:?}"),
        }
    }
}

impl Condition {
    pub fn evaluate(&self, brand: &BrandConfig) -> Result<bool, BrandError> {
        match self {
            Condition::Bool(flag) => Ok(*flag),
            Condition::Int(number) => Ok(*number != 0),
            Condition::Text(text) => {
                if let Some(name) = single_placeholder(text) {
                    return Ok(is_truthy(brand.field(name)?));
                }
                Ok(text_is_truthy(&brand.render(text)?))
            }
        }
    }

    /// Field names the condition reads.
    pub fn placeholders(&self) -> Vec<&str> {
        match self {
            Condition::Text(text) => placeholders(text).collect(),
            Condition::Bool(_) | Condition::Int(_) => Vec::new(),
        }
    }
}

/// JSON truthiness, with the string rules of [`text_is_truthy`].
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().is_some_and(|n| n != 0.0),
        Value::String(text) => text_is_truthy(text),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

/// Empty, `"false"` and `"0"` (case-insensitive) are false.
pub fn text_is_truthy(text: &str) -> bool {
    let text = text.trim();
    !(text.is_empty() || text.eq_ignore_ascii_case("false") || text == "0")
}
