//! In-memory station directory.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use serde::Deserialize;
use tracing::info;

use crate::domain::StationCode;

use super::StationDirectory;
use super::error::StationError;

/// One station as stored in the directory file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct StationEntry {
    pub code: String,
    pub name: String,
    pub city: String,
    pub state: String,
}

/// Stations keyed by their display key, `"CODE | Name, State"`.
#[derive(Debug, Clone, Default)]
pub struct StationTable {
    entries: BTreeMap<String, (StationCode, StationEntry)>,
    by_code: HashMap<StationCode, String>,
}

/// Display key for a station.
pub fn display_key(code: &str, name: &str, state: &str) -> String {
    format!("{code} | {name}, {state}")
}

impl StationTable {
    /// Build a table from the directory file's JSON.
    ///
    /// The file is an object of entries; its keys are ignored and rebuilt
    /// from each entry so they are always well formed.
    pub fn from_json(json: &str) -> Result<Self, StationError> {
        let raw: BTreeMap<String, StationEntry> = serde_json::from_str(json)?;
        Self::from_entries(raw.into_values())
    }

    /// Load the directory file.
    pub fn load(path: &Path) -> Result<Self, StationError> {
        let table = Self::from_json(&std::fs::read_to_string(path)?)?;
        info!(path = %path.display(), stations = table.len(), "loaded station directory");
        Ok(table)
    }

    pub fn from_entries(
        entries: impl IntoIterator<Item = StationEntry>,
    ) -> Result<Self, StationError> {
        let mut table = Self::default();
        for entry in entries {
            let code = StationCode::parse_normalized(&entry.code).map_err(|source| {
                StationError::InvalidCode {
                    name: entry.name.clone(),
                    source,
                }
            })?;
            let key = display_key(code.as_str(), &entry.name, &entry.state);
            table.by_code.insert(code, key.clone());
            table.entries.insert(key, (code, entry));
        }
        Ok(table)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All display keys, sorted.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Display key for a code.
    pub fn key_for_code(&self, code: StationCode) -> Option<&str> {
        self.by_code.get(&code).map(String::as_str)
    }

    /// `"Name, State"` for a display key or code.
    pub fn name_and_state_for(&self, display_name: &str) -> Option<String> {
        self.lookup(display_name)
            .map(|(_, e)| format!("{}, {}", e.name, e.state))
    }

    /// Display keys whose code or name starts with `prefix`, ignoring case.
    pub fn search(&self, prefix: &str, limit: usize) -> Vec<&str> {
        let prefix = prefix.trim().to_lowercase();
        if prefix.is_empty() {
            return Vec::new();
        }
        self.entries
            .iter()
            .filter(|(_, (_, e))| {
                e.code.to_lowercase().starts_with(&prefix)
                    || e.name.to_lowercase().starts_with(&prefix)
            })
            .map(|(key, _)| key.as_str())
            .take(limit)
            .collect()
    }

    /// Accepts either a display key or a bare code.
    fn lookup(&self, display_name: &str) -> Option<&(StationCode, StationEntry)> {
        let display_name = display_name.trim();
        if let Some(found) = self.entries.get(display_name) {
            return Some(found);
        }
        let code = display_name.split_whitespace().next()?;
        let code = StationCode::parse_normalized(code).ok()?;
        self.entries.get(self.by_code.get(&code)?)
    }
}

impl StationDirectory for StationTable {
    fn code_for(&self, display_name: &str) -> Option<StationCode> {
        self.lookup(display_name).map(|(code, _)| *code)
    }

    fn city_state_for(&self, display_name: &str) -> Option<String> {
        self.lookup(display_name)
            .map(|(_, e)| format!("{}, {}", e.city, e.state))
    }
}
