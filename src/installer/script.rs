use std::path::Path;

use indexmap::IndexMap;
use log::error;
use serde_json::{Map, Value};

use crate::error::SetupError;

use super::interpreter::{Extra, InstallerFile};

/// Fields every install script must carry.
const REQUIRED_FIELDS: &[&str] = &["name", "runner", "version"];
/// Fields that are filled with an empty string when absent.
const TEXT_FIELDS: &[&str] = &["description", "notes"];

/// One way of installing one game.
#[derive(Debug, Clone, PartialEq)]
pub struct InstallerScript {
    pub name: String,
    pub game_slug: String,
    pub version: String,
    pub runner: String,
    pub description: String,
    pub notes: String,
    /// Slug of a game that has to be installed first.
    pub requires: Option<String>,
    pub creates_game_folder: bool,
    pub files: Vec<InstallerFile>,
    pub extras: IndexMap<String, Vec<Extra>>,
    /// The script as it was read.
    pub raw: Value,
}

impl InstallerScript {
    /// Pretty-printed source, as shown by "view source".
    pub fn source(&self) -> String {
        serde_json::to_string_pretty(&self.raw).unwrap_or_default()
    }

    fn from_object(obj: Map<String, Value>) -> Result<Self, SetupError> {
        let text = |key: &str| obj.get(key).and_then(Value::as_str).map(str::to_string);
        let body = obj.get("script").cloned().unwrap_or(Value::Null);

        let name = text("name").unwrap_or_default();
        let requires = text("requires").or_else(|| {
            body.get("requires")
                .and_then(Value::as_str)
                .map(str::to_string)
        });
        let creates_game_folder = obj
            .get("creates_game_folder")
            .and_then(Value::as_bool)
            .unwrap_or(requires.is_none());

        let files = match body.get("files") {
            Some(Value::Array(items)) => items
                .iter()
                .map(InstallerFile::from_script_entry)
                .collect::<Result<Vec<_>, _>>()?,
            _ => Vec::new(),
        };
        let extras = match body.get("extras") {
            Some(v) => serde_json::from_value(v.clone())?,
            None => IndexMap::new(),
        };

        Ok(InstallerScript {
            game_slug: text("game_slug")
                .or_else(|| text("slug"))
                .unwrap_or_else(|| slugify(&name)),
            name,
            version: field_string(&obj, "version"),
            runner: text("runner").unwrap_or_default(),
            description: text("description").unwrap_or_default(),
            notes: text("notes").unwrap_or_default(),
            requires,
            creates_game_folder,
            files,
            extras,
            raw: Value::Object(obj),
        })
    }
}

/// Versions are usually strings, but a bare number is accepted.
fn field_string(obj: &Map<String, Value>, key: &str) -> String {
    match obj.get(key) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}

fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.ends_with('-') && !slug.is_empty() {
            slug.push('-');
        }
    }
    slug.trim_end_matches('-').to_string()
}

// ── Validation ────────────────────────────────────────────────────────────────

/// Fills optional text fields and checks the mandatory ones.
pub fn validate_scripts(raw: Vec<Value>) -> Result<Vec<InstallerScript>, SetupError> {
    if raw.is_empty() {
        return Err(SetupError::NoInstaller);
    }
    raw.into_iter()
        .map(|script| {
            let mut obj = match script {
                Value::Object(obj) => obj,
                other => {
                    error!("Invalid script: {}", other);
                    return Err(SetupError::Scripting(
                        "Install script is not an object".to_string(),
                    ));
                }
            };
            for field in TEXT_FIELDS {
                let empty = obj.get(*field).map_or(true, |v| v.is_null() || v == "");
                if empty {
                    obj.insert(field.to_string(), Value::String(String::new()));
                }
            }
            for field in REQUIRED_FIELDS {
                if !obj.contains_key(*field) {
                    error!("Invalid script: {}", Value::Object(obj.clone()));
                    return Err(SetupError::MissingField(field.to_string()));
                }
            }
            InstallerScript::from_object(obj)
        })
        .collect()
}

/// Reads a JSON file holding one script or an array of scripts.
pub fn load_scripts(path: &Path) -> Result<Vec<InstallerScript>, SetupError> {
    let text = std::fs::read_to_string(path)?;
    let value: Value = serde_json::from_str(&text)?;
    let raw = match value {
        Value::Array(items) => items,
        single => vec![single],
    };
    validate_scripts(raw)
}
