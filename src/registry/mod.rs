//! Curated registries of doctors, technicians and work types.
//!
//! Loaded once from a JSON file at startup and never mutated. Entry
//! order in the file is the order the resolver scans, so it decides
//! which entry wins when a search string matches several.

pub mod resolver;

pub use resolver::*;

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("Cannot read registry file {path}: {reason}")]
    Io { path: String, reason: String },

    #[error("Registry JSON is invalid: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Registry entry {kind} #{id} has an empty name")]
    EmptyName { kind: RegistryKind, id: i64 },

    #[error("Duplicate {kind} id {id} in registry")]
    DuplicateId { kind: RegistryKind, id: i64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegistryKind {
    Doctor,
    Technician,
    WorkType,
}

impl RegistryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Doctor => "doctor",
            Self::Technician => "technician",
            Self::WorkType => "work_type",
        }
    }
}

impl std::fmt::Display for RegistryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One registry entry: canonical spelling plus alternate spellings.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegistryEntry {
    pub id: i64,
    pub name: String,
    pub aliases: Vec<String>,
}

impl RegistryEntry {
    /// Case-insensitive containment of `needle` (already lowercased)
    /// in the canonical name or any alias.
    fn matches(&self, needle: &str) -> bool {
        self.name.to_lowercase().contains(needle)
            || self.aliases.iter().any(|a| a.to_lowercase().contains(needle))
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Registry {
    doctors: Vec<RegistryEntry>,
    technicians: Vec<RegistryEntry>,
    work_types: Vec<RegistryEntry>,
}

/// On-disk entry shape. `full_name`/`short_name` are the legacy alias
/// fields; `aliases` allows any number of extra spellings.
#[derive(Deserialize)]
struct RawEntry {
    id: i64,
    name: String,
    #[serde(default)]
    full_name: Option<String>,
    #[serde(default)]
    short_name: Option<String>,
    #[serde(default)]
    aliases: Vec<String>,
}

#[derive(Deserialize)]
struct RawRegistry {
    #[serde(default)]
    doctors: Vec<RawEntry>,
    #[serde(default)]
    technicians: Vec<RawEntry>,
    #[serde(default)]
    work_types: Vec<RawEntry>,
}

impl Registry {
    pub fn load(path: &Path) -> Result<Self, RegistryError> {
        let json = std::fs::read_to_string(path).map_err(|e| RegistryError::Io {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        let registry = Self::from_json(&json)?;
        tracing::info!(
            path = %path.display(),
            doctors = registry.doctors.len(),
            technicians = registry.technicians.len(),
            work_types = registry.work_types.len(),
            "Registry loaded"
        );
        Ok(registry)
    }

    pub fn from_json(json: &str) -> Result<Self, RegistryError> {
        let raw: RawRegistry = serde_json::from_str(json)?;
        Ok(Self {
            doctors: convert_entries(RegistryKind::Doctor, raw.doctors)?,
            technicians: convert_entries(RegistryKind::Technician, raw.technicians)?,
            work_types: convert_entries(RegistryKind::WorkType, raw.work_types)?,
        })
    }

    pub fn entries(&self, kind: RegistryKind) -> &[RegistryEntry] {
        match kind {
            RegistryKind::Doctor => &self.doctors,
            RegistryKind::Technician => &self.technicians,
            RegistryKind::WorkType => &self.work_types,
        }
    }

    /// First entry, in load order, whose name or alias contains
    /// `search` ignoring case. Blank searches never match.
    pub fn find(&self, kind: RegistryKind, search: &str) -> Option<&RegistryEntry> {
        let needle = search.trim().to_lowercase();
        if needle.is_empty() {
            return None;
        }
        self.entries(kind).iter().find(|entry| entry.matches(&needle))
    }

    pub fn get(&self, kind: RegistryKind, id: i64) -> Option<&RegistryEntry> {
        self.entries(kind).iter().find(|entry| entry.id == id)
    }

    /// Canonical name for a resolved reference.
    pub fn name_of(&self, kind: RegistryKind, id: i64) -> Option<&str> {
        self.get(kind, id).map(|entry| entry.name.as_str())
    }

    pub fn contains(&self, kind: RegistryKind, id: i64) -> bool {
        self.get(kind, id).is_some()
    }
}

fn convert_entries(
    kind: RegistryKind,
    raw: Vec<RawEntry>,
) -> Result<Vec<RegistryEntry>, RegistryError> {
    let mut entries: Vec<RegistryEntry> = Vec::with_capacity(raw.len());
    for item in raw {
        if item.name.trim().is_empty() {
            return Err(RegistryError::EmptyName { kind, id: item.id });
        }
        if entries.iter().any(|e| e.id == item.id) {
            return Err(RegistryError::DuplicateId { kind, id: item.id });
        }
        let aliases = item
            .full_name
            .into_iter()
            .chain(item.short_name)
            .chain(item.aliases)
            .filter(|a| !a.trim().is_empty())
            .collect();
        entries.push(RegistryEntry {
            id: item.id,
            name: item.name,
            aliases,
        });
    }
    Ok(entries)
}
