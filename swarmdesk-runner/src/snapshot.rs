//! Desk state on disk: agents, journal, tick counter and active headline as
//! pretty JSON.
//!
//! Every snapshot carries a `schema_version`; newer versions are rejected on
//! load.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use swarmdesk_core::domain::Agent;

use crate::error::DeskError;
use crate::journal::Journal;

/// Current schema version for persisted snapshots.
pub const SCHEMA_VERSION: u32 = 1;

fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeskSnapshot {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub saved_at: DateTime<Utc>,
    pub tick: u64,
    pub agents: Vec<Agent>,
    pub journal: Journal,
    /// Id of the active headline.
    pub active_news: Option<String>,
}

impl DeskSnapshot {
    pub fn check_version(&self) -> Result<(), DeskError> {
        if self.schema_version > SCHEMA_VERSION {
            return Err(DeskError::SchemaVersion {
                found: self.schema_version,
                supported: SCHEMA_VERSION,
            });
        }
        Ok(())
    }

    pub fn to_json(&self) -> Result<String, DeskError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self, DeskError> {
        let snapshot: DeskSnapshot = serde_json::from_str(json)?;
        snapshot.check_version()?;
        Ok(snapshot)
    }

    pub fn save(&self, path: &Path) -> Result<(), DeskError> {
        std::fs::write(path, self.to_json()?).map_err(|e| DeskError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })
    }

    pub fn load(path: &Path) -> Result<Self, DeskError> {
        let json = std::fs::read_to_string(path).map_err(|e| DeskError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::from_json(&json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use swarmdesk_core::domain::{Persona, StrategyKind};

    fn sample() -> DeskSnapshot {
        let mut journal = Journal::new(5);
        journal.info(Some("scalper"), "Analyzed BTCUSDT: no cross", Utc::now());
        DeskSnapshot {
            schema_version: SCHEMA_VERSION,
            saved_at: Utc::now(),
            tick: 12,
            agents: Persona::roster().into_iter().map(|p| Agent::new(p, 100.0)).collect(),
            journal,
            active_news: Some("n1".into()),
        }
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("desk.json");
        let snapshot = sample();
        snapshot.save(&path).unwrap();

        let loaded = DeskSnapshot::load(&path).unwrap();
        assert_eq!(loaded.tick, 12);
        assert_eq!(loaded.agents, snapshot.agents);
        assert_eq!(loaded.journal.len(), 1);
        assert_eq!(loaded.active_news.as_deref(), Some("n1"));
    }

    #[test]
    fn missing_version_defaults_to_current() {
        let mut value = serde_json::to_value(sample()).unwrap();
        value.as_object_mut().unwrap().remove("schema_version");
        let loaded = DeskSnapshot::from_json(&value.to_string()).unwrap();
        assert_eq!(loaded.schema_version, SCHEMA_VERSION);
    }

    #[test]
    fn newer_version_is_rejected() {
        let mut snapshot = sample();
        snapshot.schema_version = SCHEMA_VERSION + 1;
        let json = snapshot.to_json().unwrap();
        assert!(matches!(
            DeskSnapshot::from_json(&json),
            Err(DeskError::SchemaVersion { .. })
        ));
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            DeskSnapshot::load(&dir.path().join("absent.json")),
            Err(DeskError::Io { .. })
        ));
    }

    #[test]
    fn agent_ids_survive() {
        let loaded = DeskSnapshot::from_json(&sample().to_json().unwrap()).unwrap();
        let ids: Vec<_> = loaded.agents.iter().map(|a| a.id.as_str().to_string()).collect();
        assert_eq!(ids[0], Persona::preset(StrategyKind::ALL[0]).name);
    }
}
