//! Rule and migration-unit records
//!
//! Rules are plain data: a pattern, a replacement template or a callback id, a
//! description, file globs, and a priority. A migration unit is an ordered,
//! named set of rules for one version step, loadable from YAML so third-party
//! rule sets work without touching the engine.

use crate::error::MigrateError;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

/// Captured metavariable bindings for one match
pub type Captures = BTreeMap<String, String>;

/// A pure replacement callback: `(captures, file_path) -> replacement text`.
///
/// Callbacks must be deterministic with respect to their inputs; the executor
/// treats their output exactly like a literal replacement.
pub type RuleCallback = fn(&Captures, &Path) -> String;

/// Named registry of replacement callbacks
#[derive(Default)]
pub struct CallbackRegistry {
    map: HashMap<String, RuleCallback>,
}

impl CallbackRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, id: &str, callback: RuleCallback) {
        self.map.insert(id.to_string(), callback);
    }

    pub fn get(&self, id: &str) -> Option<RuleCallback> {
        self.map.get(id).copied()
    }
}

/// A single migration rule
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rule {
    /// Stable identifier, unique within its unit
    pub id: String,

    /// Structural pattern with `$NAME` / `$$$NAME` metavariables
    pub pattern: String,

    /// Replacement template; ignored when `callback` is set
    #[serde(default)]
    pub replacement: String,

    /// Id of a registered callback computing the replacement
    #[serde(default)]
    pub callback: Option<String>,

    /// Human-readable description of the change
    #[serde(default)]
    pub description: String,

    /// File globs this rule applies to
    #[serde(default = "default_globs", rename = "files")]
    pub file_globs: Vec<String>,

    /// Higher priority rules run first within a unit
    #[serde(default)]
    pub priority: i32,
}

fn default_globs() -> Vec<String> {
    vec!["**/*.rs".to_string()]
}

impl Rule {
    /// Shorthand for a template rule over Rust sources
    pub fn new(id: &str, pattern: &str, replacement: &str, description: &str) -> Self {
        Rule {
            id: id.to_string(),
            pattern: pattern.to_string(),
            replacement: replacement.to_string(),
            callback: None,
            description: description.to_string(),
            file_globs: default_globs(),
            priority: 0,
        }
    }

    /// Shorthand for a callback rule over Rust sources
    pub fn with_callback(id: &str, pattern: &str, callback: &str, description: &str) -> Self {
        Rule {
            id: id.to_string(),
            pattern: pattern.to_string(),
            replacement: String::new(),
            callback: Some(callback.to_string()),
            description: description.to_string(),
            file_globs: default_globs(),
            priority: 0,
        }
    }

    pub fn priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn globs(mut self, globs: &[&str]) -> Self {
        self.file_globs = globs.iter().map(|g| g.to_string()).collect();
        self
    }

    /// Whether this rule computes its replacement through a callback
    pub fn requires_callback(&self) -> bool {
        self.callback.is_some()
    }
}

/// One version-to-version migration step, possibly split into ordered parts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MigrationUnit {
    #[serde(rename = "from")]
    pub from_version: String,

    #[serde(rename = "to")]
    pub to_version: String,

    /// Ascending application order among units sharing the same version pair
    #[serde(default)]
    pub part: Option<u32>,

    #[serde(default)]
    pub description: String,

    pub rules: Vec<Rule>,
}

impl MigrationUnit {
    pub fn new(from: &str, to: &str, description: &str, rules: Vec<Rule>) -> Self {
        MigrationUnit {
            from_version: from.to_string(),
            to_version: to.to_string(),
            part: None,
            description: description.to_string(),
            rules,
        }
    }

    pub fn part(mut self, part: u32) -> Self {
        self.part = Some(part);
        self
    }

    /// Display key, e.g. `0.16->0.17 part 2`
    pub fn key(&self) -> String {
        match self.part {
            Some(p) => format!("{}->{} part {}", self.from_version, self.to_version, p),
            None => format!("{}->{}", self.from_version, self.to_version),
        }
    }

    /// Union of the unit's rule globs, deduplicated in declaration order
    pub fn file_globs(&self) -> Vec<String> {
        let mut seen = Vec::new();
        for rule in &self.rules {
            for glob in &rule.file_globs {
                if !seen.contains(glob) {
                    seen.push(glob.clone());
                }
            }
        }
        seen
    }

    /// Load a unit from YAML text
    pub fn from_yaml(text: &str) -> Result<MigrationUnit, MigrateError> {
        Ok(serde_yaml::from_str(text)?)
    }

    /// Load a unit from a YAML file
    pub fn from_path(path: &Path) -> Result<MigrationUnit, MigrateError> {
        let text = std::fs::read_to_string(path)?;
        MigrationUnit::from_yaml(&text)
    }
}

/// Substitute captured bindings into a replacement template.
///
/// `$$$NAME` references are expanded before `$NAME` so variadic names never
/// collide with single ones; unknown references expand to nothing.
pub fn expand_template(template: &str, captures: &Captures) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(i) = rest.find('$') {
        out.push_str(&rest[..i]);
        rest = &rest[i..];
        let skip = if rest.starts_with("$$$") { 3 } else { 1 };
        let name_end = rest[skip..]
            .char_indices()
            .find(|(_, c)| !(c.is_ascii_alphanumeric() || *c == '_'))
            .map(|(j, _)| skip + j)
            .unwrap_or(rest.len());
        let name = &rest[skip..name_end];
        let valid = name
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
        if !valid {
            out.push('$');
            rest = &rest[1..];
            continue;
        }
        if let Some(value) = captures.get(name) {
            out.push_str(value);
        }
        rest = &rest[name_end..];
    }
    out.push_str(rest);
    out
}
