//! Run checkpoint persistence for partial re-execution.
//!
//! After each executed checkpoint the engine can persist a [`RunCheckpoint`]
//! to a state directory. A later invocation reads it back with
//! [`load_checkpoint`] and starts its window at [`RunCheckpoint::next_label`]
//! instead of from `begin`.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use qlsynth_types::{Family, Label, Result, SynthError};

const CHECKPOINT_FILE: &str = "checkpoint.json";

/// Progress of one pipeline execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunCheckpoint {
    pub run_id: Uuid,
    pub family: Family,
    /// Checkpoints of this run that finished, in order.
    pub completed_labels: Vec<Label>,
    /// Where a continuation run should start; `None` once `verilog` is done.
    pub next_label: Option<Label>,
    /// RFC 3339 timestamp of when the checkpoint was taken.
    pub timestamp: String,
}

impl RunCheckpoint {
    pub fn new(run_id: Uuid, family: Family, completed_labels: Vec<Label>) -> Self {
        let next_label = completed_labels.last().and_then(|l| l.next());
        Self {
            run_id,
            family,
            completed_labels,
            next_label,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn is_finished(&self) -> bool {
        self.next_label.is_none()
    }

    /// A run may only be continued under the family it started with.
    pub fn ensure_family(&self, family: Family) -> Result<()> {
        if self.family != family {
            return Err(SynthError::FamilyMismatch {
                expected: family.name().to_string(),
                found: self.family.name().to_string(),
            });
        }
        Ok(())
    }
}

/// Write `checkpoint` to `<state_dir>/checkpoint.json`, creating the
/// directory if needed.
pub fn save_checkpoint(checkpoint: &RunCheckpoint, state_dir: &Path) -> Result<PathBuf> {
    std::fs::create_dir_all(state_dir)?;
    let path = state_dir.join(CHECKPOINT_FILE);
    let json = serde_json::to_string_pretty(checkpoint)?;
    std::fs::write(&path, json)?;
    tracing::debug!(path = %path.display(), "Checkpoint saved");
    Ok(path)
}

/// Returns `Ok(None)` when no checkpoint was ever written (or it was cleared).
pub fn load_checkpoint(state_dir: &Path) -> Result<Option<RunCheckpoint>> {
    let path = state_dir.join(CHECKPOINT_FILE);
    if !path.try_exists()? {
        return Ok(None);
    }
    let json = std::fs::read_to_string(&path)?;
    Ok(Some(serde_json::from_str(&json)?))
}

pub fn clear_checkpoint(state_dir: &Path) -> Result<()> {
    let path = state_dir.join(CHECKPOINT_FILE);
    if path.try_exists()? {
        std::fs::remove_file(&path)?;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
