//! Per-cycle orchestration.
//!
//! One [`Engine::run_cycle`] call is one poll: load the persisted state,
//! collect and sort the current alerts, diff against the previous cycle,
//! and when something changed run the whole output side (announcements,
//! tail message, tone/identifier switching, triggers, dashboard file,
//! notification digest) before persisting the new state.

use crate::alerts::{AlertCollection, AlertDiff, AlertNormalizer, sort_and_truncate};
use crate::audio::{AssemblyMode, AudioAssembler, ClipSource, Playout};
use crate::config::SkywatchConfig;
use crate::error::Result;
use crate::exec::CommandRunner;
use crate::feed::AlertSource;
use crate::notify::PushoverNotifier;
use crate::state::{EngineState, StateStore, SwitchPosition};
use crate::switching::{AssetSwitch, TransitionOutcome};
use crate::triggers::TriggerDispatcher;
use crate::zones::ZoneNames;
use chrono::{DateTime, Utc};
use std::collections::BTreeSet;
use tracing::{debug, info};

/// Drives one poll cycle end to end.
pub struct Engine<'a> {
    config: &'a SkywatchConfig,
    source: &'a dyn AlertSource,
    clips: &'a dyn ClipSource,
    runner: &'a dyn CommandRunner,
    notifier: Option<PushoverNotifier>,
}

impl<'a> Engine<'a> {
    /// Assemble an engine from its collaborators.
    pub fn new(
        config: &'a SkywatchConfig,
        source: &'a dyn AlertSource,
        clips: &'a dyn ClipSource,
        runner: &'a dyn CommandRunner,
    ) -> Self {
        Self {
            config,
            source,
            clips,
            runner,
            notifier: PushoverNotifier::from_config(&config.notifications),
        }
    }

    /// Run one poll cycle at the given instant.
    ///
    /// # Errors
    ///
    /// Returns an error if state cannot be persisted, generated audio
    /// cannot be written, or a tone/identifier switch fails. Feed
    /// failures, missing clips, and notification failures are handled
    /// internally and never abort the cycle.
    pub fn run_cycle(&self, now: DateTime<Utc>) -> Result<()> {
        std::fs::create_dir_all(&self.config.paths.data_dir)?;

        let store = StateStore::new(self.config.paths.state_file());
        let first_run = !store.exists();
        let mut state = store.load();

        if first_run {
            info!("first run, initializing repeater assets");
            self.initialize_assets(&mut state)?;
            store.save(&state)?;
        }

        let collected =
            AlertNormalizer::new(self.config).collect(self.source, &state.last_alerts, now);
        let current = sort_and_truncate(collected, self.config.alerting.max_alerts);
        let diff = AlertDiff::compute(&state.last_alerts, &current);

        if diff.is_empty() {
            info!("alerts unchanged ({} active)", current.len());
            return Ok(());
        }

        self.process_change(&store, &mut state, &current, &diff)?;
        store.save(&state)?;
        Ok(())
    }

    /// First-run asset initialization: known tone/identifier positions and
    /// a silent tail message.
    fn initialize_assets(&self, state: &mut EngineState) -> Result<()> {
        let switch = AssetSwitch::new(self.config);
        if self.config.tones.enable {
            switch.switch_tones(state.current_tone, SwitchPosition::Normal)?;
            state.current_tone = SwitchPosition::Normal;
        }
        if self.config.identifier.enable {
            switch.switch_identifier(state.current_identifier, SwitchPosition::Normal)?;
            state.current_identifier = SwitchPosition::Normal;
        }
        if self.config.tail_message.enable {
            Playout::new(self.config, self.runner).silence_tail_message()?;
        }
        Ok(())
    }

    /// Run the output side of a changed cycle.
    fn process_change(
        &self,
        store: &StateStore,
        state: &mut EngineState,
        current: &AlertCollection,
        diff: &AlertDiff,
    ) -> Result<()> {
        let zone_names = ZoneNames::load(self.config.paths.zone_names_file.as_deref());
        let mut digest: Vec<String> = Vec::new();

        for title in &diff.added {
            let zones = describe_zones(&current.zone_set(title), &zone_names);
            info!("new alert: {title} ({zones})");
            digest.push(format!("New: {title} ({zones})"));
        }
        for title in &diff.removed {
            info!("cleared alert: {title}");
            digest.push(format!("Cleared: {title}"));
        }
        for title in diff.changed.keys() {
            let zones = describe_zones(&current.zone_set(title), &zone_names);
            info!("updated alert: {title}, now covering {zones}");
            digest.push(format!("Updated: {title} ({zones})"));
        }

        let went_all_clear = current.is_empty();
        state.last_alerts = current.clone();
        state.active_alert_titles = current.titles().map(str::to_owned).collect();

        // Zone-membership changes do not alter the title list, so the
        // dashboard is only rewritten when titles appeared or cleared.
        if let Some(path) = &self.config.paths.dashboard_file
            && (!diff.added.is_empty() || !diff.removed.is_empty())
        {
            let text: Vec<&str> = current.titles().collect();
            std::fs::write(path, text.join("<br>"))?;
        }

        let switch = AssetSwitch::new(self.config);
        if self.config.tones.enable {
            let target =
                AssetSwitch::select_target(current.titles(), &self.config.tones.trigger_titles);
            if switch.switch_tones(state.current_tone, target)? == TransitionOutcome::Changed {
                state.current_tone = target;
                // The slot copy cannot be rolled back, so the recorded
                // position is persisted before anything else can fail.
                store.save(state)?;
                if self.config.notifications.debug {
                    digest.push(format!("Courtesy tones switched to {target}"));
                }
            }
        }
        if self.config.identifier.enable {
            let target = AssetSwitch::select_target(
                current.titles(),
                &self.config.identifier.trigger_titles,
            );
            if switch.switch_identifier(state.current_identifier, target)?
                == TransitionOutcome::Changed
            {
                state.current_identifier = target;
                store.save(state)?;
                if self.config.notifications.debug {
                    digest.push(format!("Identifier switched to {target}"));
                }
            }
        }

        let dispatcher = TriggerDispatcher::new(self.config, self.runner);
        dispatcher.dispatch(&diff.added, &mut state.processed_trigger_titles);
        dispatcher.retire(&diff.removed, &mut state.processed_trigger_titles);

        let assembler = AudioAssembler::new(self.config, self.clips);
        let playout = Playout::new(self.config, self.runner);

        if went_all_clear {
            state.last_spoken.clear();
            if self.config.alerting.say_all_clear {
                info!("all alerts cleared, announcing all clear");
                // Take the old tail out of rotation before speaking over it.
                if self.config.tail_message.enable {
                    playout.silence_tail_message()?;
                }
                let buffer = assembler.build_all_clear();
                playout.dispatch(&buffer, &self.config.paths.all_clear_file())?;
            }
            digest.push("All alerts have cleared".to_owned());
        } else if self.config.alerting.say_alert {
            self.announce(state, current, diff, &assembler, &playout)?;
        }

        for title in &diff.removed {
            state.last_spoken.shift_remove(title);
        }

        if self.config.tail_message.enable {
            if current.is_empty() {
                playout.silence_tail_message()?;
            } else {
                let assembly = assembler.build(current, AssemblyMode::TailMessage);
                playout.write_tail_message(&assembly.buffer)?;
            }
            if self.config.notifications.debug {
                digest.push("Tail message updated".to_owned());
            }
        }

        if let Some(notifier) = &self.notifier {
            notifier.send("Skywatch", &digest.join("\n"));
        }
        Ok(())
    }

    /// Speak the announcement for this cycle's changes, skipping titles
    /// already spoken for the same zone set.
    fn announce(
        &self,
        state: &mut EngineState,
        current: &AlertCollection,
        diff: &AlertDiff,
        assembler: &AudioAssembler<'_>,
        playout: &Playout<'_>,
    ) -> Result<()> {
        let mut to_speak = AlertCollection::new();
        if self.config.alerting.say_alert_all {
            for (title, occurrences) in current.iter() {
                to_speak.insert(title, occurrences.to_vec());
            }
        } else {
            for title in &diff.added {
                if let Some(occurrences) = current.get(title) {
                    to_speak.insert(title.clone(), occurrences.to_vec());
                }
            }
            // Zone membership changes are only audible when zone
            // identifier clips are configured and more than one zone is
            // involved.
            if self.config.alerting.say_changed && self.config.has_zone_clips() {
                for title in diff.changed.keys() {
                    if current.zone_set(title).len() > 1
                        && let Some(occurrences) = current.get(title)
                    {
                        to_speak.insert(title.clone(), occurrences.to_vec());
                    }
                }
            }
        }

        let mut spoken = AlertCollection::new();
        for (title, occurrences) in to_speak.iter() {
            let zones: Vec<String> = current.zone_set(title).into_iter().collect();
            if state.last_spoken.get(title).is_some_and(|prev| *prev == zones) {
                debug!("{title} already announced for the same zones, skipping");
                continue;
            }
            spoken.insert(title, occurrences.to_vec());
        }
        if spoken.is_empty() {
            debug!("nothing new to announce");
            return Ok(());
        }

        let assembly = assembler.build(&spoken, AssemblyMode::Announcement);
        if assembly.alerts_included == 0 {
            debug!("announcement fully blocked, not playing");
            return Ok(());
        }

        // Take the old tail out of rotation before speaking over it; the
        // rebuilt tail is written after playback finishes.
        if self.config.tail_message.enable {
            playout.silence_tail_message()?;
        }
        playout.dispatch(&assembly.buffer, &self.config.paths.announcement_file())?;
        for title in spoken.titles() {
            state
                .last_spoken
                .insert(title.to_owned(), current.zone_set(title).into_iter().collect());
        }
        Ok(())
    }
}

/// Comma-joined human names for a zone set.
fn describe_zones(zones: &BTreeSet<String>, names: &ZoneNames) -> String {
    zones
        .iter()
        .map(|z| names.display_name(z).to_owned())
        .collect::<Vec<_>>()
        .join(", ")
}
