//! Frontmatter documents: slash-commands, agents, skills and hook files.
//!
//! A document is an optional `---` delimited metadata block followed by a
//! Markdown body. Commands are parsed tolerantly ([`parse_document`]);
//! agent and skill definitions must carry a block with the required fields
//! ([`parse_definition`]).

mod parser;
mod render;
pub mod syntax;

use std::fmt;
use std::str::FromStr;

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use thiserror::Error;

pub use parser::{parse_definition, parse_document};
pub use render::render_document;

/// Frontmatter key listing tool-access grants
pub const ALLOWED_TOOLS: &str = "allowed-tools";
/// Frontmatter key for the one-line summary
pub const DESCRIPTION: &str = "description";
/// Frontmatter key documenting positional arguments
pub const ARGUMENT_HINT: &str = "argument-hint";
/// Frontmatter key naming an agent or skill
pub const NAME: &str = "name";

/// A single frontmatter value
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum MetaValue {
    /// Scalar (possibly multi-line) string
    Text(String),
    /// Inline `[a, b]` list or block `- item` sequence
    List(Vec<String>),
}

impl MetaValue {
    /// The scalar text, if this is not a list
    pub fn as_str(&self) -> Option<&str> {
        match self {
            MetaValue::Text(s) => Some(s),
            MetaValue::List(_) => None,
        }
    }

    /// `true`/`false` scalars read as booleans
    pub fn as_bool(&self) -> Option<bool> {
        match self.as_str()?.trim() {
            "true" => Some(true),
            "false" => Some(false),
            _ => None,
        }
    }

    /// Items of a list. A scalar is split on top-level commas so that
    /// `allowed-tools: Read, Bash(git:*)` reads the same as the list form.
    pub fn items(&self) -> Vec<String> {
        match self {
            MetaValue::List(items) => items.clone(),
            MetaValue::Text(s) => parser::split_list(s),
        }
    }

    /// Empty string or empty list
    pub fn is_empty(&self) -> bool {
        match self {
            MetaValue::Text(s) => s.trim().is_empty(),
            MetaValue::List(items) => items.is_empty(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Entry {
    key: String,
    value: MetaValue,
    /// 1-based line in the raw text; `None` for synthesized entries
    line: Option<usize>,
}

/// Insertion-ordered frontmatter mapping
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Metadata {
    entries: Vec<Entry>,
}

impl Metadata {
    /// Look up a value by key
    pub fn get(&self, key: &str) -> Option<&MetaValue> {
        self.entries.iter().find(|e| e.key == key).map(|e| &e.value)
    }

    /// Scalar text for a key
    pub fn text(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(MetaValue::as_str)
    }

    /// Boolean view of a scalar (`true`/`false`)
    pub fn flag(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(MetaValue::as_bool)
    }

    /// List view of a key; missing keys yield an empty list
    pub fn list(&self, key: &str) -> Vec<String> {
        self.get(key).map(MetaValue::items).unwrap_or_default()
    }

    /// Key is present with a non-empty value
    pub fn has_value(&self, key: &str) -> bool {
        self.get(key).is_some_and(|v| !v.is_empty())
    }

    /// Line of the key in the raw text, when it came from parsing
    pub fn line_of(&self, key: &str) -> Option<usize> {
        self.entries.iter().find(|e| e.key == key).and_then(|e| e.line)
    }

    /// Insert or replace. A replaced entry keeps its position and line.
    pub fn insert(&mut self, key: impl Into<String>, value: MetaValue) {
        let key = key.into();
        match self.entries.iter_mut().find(|e| e.key == key) {
            Some(entry) => entry.value = value,
            None => self.entries.push(Entry {
                key,
                value,
                line: None,
            }),
        }
    }

    pub(crate) fn insert_at_line(&mut self, key: String, value: MetaValue, line: usize) {
        self.insert(key.clone(), value);
        if let Some(entry) = self.entries.iter_mut().find(|e| e.key == key) {
            entry.line = Some(line);
        }
    }

    /// Iterate entries in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &MetaValue)> {
        self.entries.iter().map(|e| (e.key.as_str(), &e.value))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Serialize for Metadata {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for entry in &self.entries {
            map.serialize_entry(&entry.key, &entry.value)?;
        }
        map.end()
    }
}

/// Raw text split into frontmatter and body
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParsedDocument {
    /// Frontmatter entries (empty when there is no block)
    pub metadata: Metadata,
    /// Everything after the closing marker, trimmed
    pub body: String,
    /// 1-based line of the first body character in the raw text
    pub body_line: usize,
    /// Whether a complete `---` block was found
    pub has_frontmatter: bool,
}

impl ParsedDocument {
    /// Tool grants from `allowed-tools`
    pub fn tool_grants(&self) -> Vec<String> {
        self.metadata.list(ALLOWED_TOOLS)
    }

    /// Map a byte offset in `body` to a 1-based raw-text line
    pub fn line_of_body_offset(&self, offset: usize) -> usize {
        let offset = offset.min(self.body.len());
        self.body_line + self.body.as_bytes()[..offset].iter().filter(|&&b| b == b'\n').count()
    }
}

/// Artifact kinds that require frontmatter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DefinitionKind {
    Agent,
    Skill,
}

impl DefinitionKind {
    /// Fields that must be present and non-empty
    pub fn required_fields(self) -> &'static [&'static str] {
        match self {
            DefinitionKind::Agent => &[NAME, DESCRIPTION],
            DefinitionKind::Skill => &[NAME, DESCRIPTION],
        }
    }
}

impl fmt::Display for DefinitionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DefinitionKind::Agent => write!(f, "agent"),
            DefinitionKind::Skill => write!(f, "skill"),
        }
    }
}

impl FromStr for DefinitionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "agent" => Ok(DefinitionKind::Agent),
            "skill" => Ok(DefinitionKind::Skill),
            other => Err(format!("unknown definition kind: {other} (expected agent or skill)")),
        }
    }
}

/// Strict parsing failures for agent/skill definitions
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DocumentError {
    /// No complete `---` block at the top of the file
    #[error("{kind} definition has no frontmatter block")]
    MissingFrontmatter { kind: DefinitionKind },

    /// A required frontmatter field is absent or empty
    #[error("{kind} definition is missing required field: {field}")]
    MissingField {
        kind: DefinitionKind,
        field: &'static str,
    },
}
