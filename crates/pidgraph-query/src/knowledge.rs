//! Domain knowledge base: ISA tag letters, equipment types, control
//! strategies, safety systems and common diagram issues.

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{QueryError, Result};

/// Free-form fields of one entry (`description`, `function`, `fault_modes`, ...).
pub type EntryFields = Map<String, Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    InstrumentTag,
    Equipment,
    ProcessLogic,
    SafetySystem,
    CommonIssue,
}

impl EntryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryKind::InstrumentTag => "instrument_tag",
            EntryKind::Equipment => "equipment",
            EntryKind::ProcessLogic => "process_logic",
            EntryKind::SafetySystem => "safety_system",
            EntryKind::CommonIssue => "common_issue",
        }
    }

    /// Field paired with `description` when building embedding text.
    fn detail_field(&self) -> &'static str {
        match self {
            EntryKind::ProcessLogic => "control_strategy",
            EntryKind::CommonIssue => "impact",
            _ => "function",
        }
    }
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Borrowed view of one entry.
#[derive(Debug, Clone, Copy)]
pub struct EntryRef<'a> {
    pub kind: EntryKind,
    pub key: &'a str,
    pub fields: &'a EntryFields,
}

impl EntryRef<'_> {
    pub fn field_str(&self, name: &str) -> Option<&str> {
        self.fields.get(name).and_then(Value::as_str)
    }

    pub fn description(&self) -> &str {
        self.field_str("description").unwrap_or("")
    }

    /// `"{key}: {description} {detail}"`.
    pub fn embedding_text(&self) -> String {
        format!(
            "{}: {} {}",
            self.key,
            self.description(),
            self.field_str(self.kind.detail_field()).unwrap_or("")
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KnowledgeBase {
    pub instrument_tags: BTreeMap<String, EntryFields>,
    pub equipment: BTreeMap<String, EntryFields>,
    pub process_logic: BTreeMap<String, EntryFields>,
    pub safety_systems: BTreeMap<String, EntryFields>,
    pub common_issues: BTreeMap<String, EntryFields>,
}

impl KnowledgeBase {
    pub fn from_json_str(s: &str) -> Result<Self> {
        Ok(serde_json::from_str(s)?)
    }

    pub fn from_json_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|source| QueryError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let kb = Self::from_json_str(&content)?;
        tracing::debug!(path = %path.display(), entries = kb.len(), "loaded knowledge base");
        Ok(kb)
    }

    pub fn section(&self, kind: EntryKind) -> &BTreeMap<String, EntryFields> {
        match kind {
            EntryKind::InstrumentTag => &self.instrument_tags,
            EntryKind::Equipment => &self.equipment,
            EntryKind::ProcessLogic => &self.process_logic,
            EntryKind::SafetySystem => &self.safety_systems,
            EntryKind::CommonIssue => &self.common_issues,
        }
    }

    pub fn get(&self, kind: EntryKind, key: &str) -> Option<EntryRef<'_>> {
        self.section(kind)
            .get_key_value(key)
            .map(|(key, fields)| EntryRef { kind, key, fields })
    }

    /// All entries, section by section, keys in sorted order.
    pub fn entries(&self) -> impl Iterator<Item = EntryRef<'_>> + '_ {
        [
            EntryKind::InstrumentTag,
            EntryKind::Equipment,
            EntryKind::ProcessLogic,
            EntryKind::SafetySystem,
            EntryKind::CommonIssue,
        ]
        .into_iter()
        .flat_map(move |kind| {
            self.section(kind)
                .iter()
                .map(move |(key, fields)| EntryRef { kind, key, fields })
        })
    }

    pub fn len(&self) -> usize {
        self.instrument_tags.len()
            + self.equipment.len()
            + self.process_logic.len()
            + self.safety_systems.len()
            + self.common_issues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
