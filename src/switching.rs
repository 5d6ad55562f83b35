//! Courtesy tone and station identifier switching.
//!
//! The repeater controller plays whatever file sits in the active slot, so
//! "switching" means overwriting the active slot file(s) with the normal or
//! weather source asset. Transitions are idempotent: when the recorded
//! position already matches the target, no files are touched.

use crate::config::SkywatchConfig;
use crate::error::{AlertError, Result};
use crate::state::SwitchPosition;
use std::path::Path;
use tracing::{debug, info};

/// Whether a transition actually rewrote the active slot files.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionOutcome {
    /// Slot files were overwritten.
    Changed,
    /// Already at the target position.
    Unchanged,
}

/// Performs tone and identifier slot overwrites.
pub struct AssetSwitch<'a> {
    config: &'a SkywatchConfig,
}

impl<'a> AssetSwitch<'a> {
    /// Create a switch over the loaded configuration.
    pub fn new(config: &'a SkywatchConfig) -> Self {
        Self { config }
    }

    /// Pick the target position for a set of active alert titles: weather
    /// while any trigger title is active, normal otherwise. Matching is by
    /// exact title.
    pub fn select_target<'t>(
        active_titles: impl IntoIterator<Item = &'t str>,
        trigger_titles: &[String],
    ) -> SwitchPosition {
        let triggered = active_titles
            .into_iter()
            .any(|title| trigger_titles.iter().any(|t| t == title));
        if triggered {
            SwitchPosition::Wx
        } else {
            SwitchPosition::Normal
        }
    }

    /// Move the courtesy tones to `target`, overwriting both active slots.
    ///
    /// # Errors
    ///
    /// Returns an error if a source asset cannot be copied into its slot.
    pub fn switch_tones(
        &self,
        current: SwitchPosition,
        target: SwitchPosition,
    ) -> Result<TransitionOutcome> {
        if current == target {
            debug!("tones already {target}, nothing to do");
            return Ok(TransitionOutcome::Unchanged);
        }

        let tones = &self.config.tones;
        let (primary_src, link_src) = match target {
            SwitchPosition::Normal => (tones.normal_primary.as_str(), tones.normal_link.as_str()),
            SwitchPosition::Wx => (tones.wx.as_str(), tones.wx.as_str()),
            SwitchPosition::Unset => {
                return Err(AlertError::Switch("cannot switch tones to unset".to_owned()));
            }
        };

        info!("changing courtesy tones from {current} to {target}");
        copy_slot(&tones.tone_dir, primary_src, &tones.active_primary)?;
        copy_slot(&tones.tone_dir, link_src, &tones.active_link)?;
        Ok(TransitionOutcome::Changed)
    }

    /// Move the station identifier to `target`, overwriting the active slot.
    ///
    /// # Errors
    ///
    /// Returns an error if the source asset cannot be copied into its slot.
    pub fn switch_identifier(
        &self,
        current: SwitchPosition,
        target: SwitchPosition,
    ) -> Result<TransitionOutcome> {
        if current == target {
            debug!("identifier already {target}, nothing to do");
            return Ok(TransitionOutcome::Unchanged);
        }

        let id = &self.config.identifier;
        let source = match target {
            SwitchPosition::Normal => id.normal.as_str(),
            SwitchPosition::Wx => id.wx.as_str(),
            SwitchPosition::Unset => {
                return Err(AlertError::Switch(
                    "cannot switch identifier to unset".to_owned(),
                ));
            }
        };

        info!("changing identifier from {current} to {target}");
        copy_slot(&id.id_dir, source, &id.active)?;
        Ok(TransitionOutcome::Changed)
    }
}

/// Overwrite one active slot file with a source asset from the same
/// directory.
fn copy_slot(dir: &Path, source: &str, slot: &str) -> Result<()> {
    let from = dir.join(source);
    let to = dir.join(slot);
    debug!("copying {} over {}", from.display(), to.display());
    std::fs::copy(&from, &to).map_err(|e| {
        AlertError::Switch(format!(
            "cannot copy {} over {}: {e}",
            from.display(),
            to.display()
        ))
    })?;
    Ok(())
}
