//! Engine state persistence.
//!
//! One [`EngineState`] record survives between poll cycles: the current
//! tone/identifier positions, the last alert set, what was last spoken,
//! and which trigger titles have already fired. The file is rewritten in
//! full on every save so a crash mid-cycle can never resurrect stale
//! fields, and the write goes through a temp file + rename so a partial
//! write cannot corrupt the previous state.

use crate::alerts::AlertCollection;
use crate::error::{AlertError, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Position of a switchable audio asset (courtesy tone or identifier).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SwitchPosition {
    /// Normal asset active.
    Normal,
    /// Weather asset active.
    Wx,
    /// Never transitioned (first run).
    #[default]
    Unset,
}

impl std::fmt::Display for SwitchPosition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Normal => write!(f, "NORMAL"),
            Self::Wx => write!(f, "WX"),
            Self::Unset => write!(f, "unset"),
        }
    }
}

/// Cross-cycle engine memory.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EngineState {
    /// Courtesy tone currently active.
    pub current_tone: SwitchPosition,
    /// Station identifier currently active.
    pub current_identifier: SwitchPosition,
    /// Alert set from the last cycle, in sorted iteration order.
    pub last_alerts: AlertCollection,
    /// Title to zone codes of the last spoken announcement.
    pub last_spoken: IndexMap<String, Vec<String>>,
    /// Titles currently considered active.
    pub active_alert_titles: BTreeSet<String>,
    /// Titles whose trigger mappings have fired during this activation.
    pub processed_trigger_titles: BTreeSet<String>,
}

/// File-backed store for [`EngineState`].
pub struct StateStore {
    path: PathBuf,
}

impl StateStore {
    /// Create a store over the given state file path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether a state file exists (false means first run).
    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Load the persisted state. Returns defaults when the file is missing
    /// or cannot be parsed; never fails.
    pub fn load(&self) -> EngineState {
        let bytes = match std::fs::read(&self.path) {
            Ok(b) => b,
            Err(_) => return EngineState::default(),
        };

        match serde_json::from_slice(&bytes) {
            Ok(state) => state,
            Err(e) => {
                debug!("state file {} unparsable ({e}), using defaults", self.path.display());
                EngineState::default()
            }
        }
    }

    /// Persist the state, fully overwriting the previous file.
    ///
    /// # Errors
    ///
    /// Returns an error if the state directory cannot be created or the
    /// file cannot be written or renamed into place.
    pub fn save(&self, state: &EngineState) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                AlertError::State(format!(
                    "cannot create state directory {}: {e}",
                    parent.display()
                ))
            })?;
        }

        let json = serde_json::to_string_pretty(state)
            .map_err(|e| AlertError::State(format!("cannot serialize state: {e}")))?;

        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, json).map_err(|e| {
            AlertError::State(format!("cannot write state to {}: {e}", tmp.display()))
        })?;
        std::fs::rename(&tmp, &self.path).map_err(|e| {
            AlertError::State(format!(
                "cannot move state into place at {}: {e}",
                self.path.display()
            ))
        })?;

        Ok(())
    }
}
