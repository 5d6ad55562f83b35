//! Scripted trigger dispatch.
//!
//! Trigger mappings pair glob patterns with either shell commands or DTMF
//! functions. They are evaluated against the titles that newly appeared
//! this cycle; a title fires each mapping at most once per activation, and
//! the fired set is retired when the title clears so a later reappearance
//! fires again.

use crate::config::{ActionKind, MatchMode, SkywatchConfig, TriggerMapping};
use crate::exec::CommandRunner;
use std::collections::BTreeSet;
use tracing::{debug, error, info, warn};
use wildmatch::WildMatch;

/// Evaluates trigger mappings and executes their actions.
pub struct TriggerDispatcher<'a> {
    config: &'a SkywatchConfig,
    runner: &'a dyn CommandRunner,
}

impl<'a> TriggerDispatcher<'a> {
    /// Create a dispatcher over the configuration and command runner.
    pub fn new(config: &'a SkywatchConfig, runner: &'a dyn CommandRunner) -> Self {
        Self { config, runner }
    }

    /// Evaluate every mapping against the newly appeared titles, executing
    /// matching actions and recording fired titles in `processed`.
    ///
    /// Under [`MatchMode::Any`] a mapping fires when at least one title
    /// matches; under [`MatchMode::All`] it fires when the number of
    /// matched titles equals the number of patterns. Each title counts at
    /// most once per mapping. Execution failures are logged, never fatal.
    pub fn dispatch(&self, added: &[String], processed: &mut BTreeSet<String>) {
        if !self.config.triggers.enable {
            return;
        }

        // Mappings are evaluated independently against this cycle's new
        // titles: a title that fires one mapping can still fire the next,
        // so only titles fired on a previous cycle are held back.
        let already_fired = processed.clone();

        for mapping in &self.config.triggers.mappings {
            let patterns: Vec<WildMatch> =
                mapping.patterns.iter().map(|p| WildMatch::new(p)).collect();

            let mut matched: Vec<&str> = Vec::new();
            for title in added {
                if already_fired.contains(title) {
                    debug!("trigger already fired for {title}, skipping");
                    continue;
                }
                if matched.contains(&title.as_str()) {
                    continue;
                }
                if patterns.iter().any(|p| p.matches(title)) {
                    matched.push(title);
                }
            }

            let fire = match mapping.match_mode {
                MatchMode::Any => !matched.is_empty(),
                MatchMode::All => matched.len() == mapping.patterns.len(),
            };
            if !fire {
                continue;
            }

            for title in matched {
                processed.insert(title.to_owned());
                self.execute(mapping, title);
            }
        }
    }

    /// Drop cleared titles from the fired set so they can fire again on a
    /// later activation.
    pub fn retire(&self, removed: &[String], processed: &mut BTreeSet<String>) {
        for title in removed {
            if processed.remove(title) {
                debug!("trigger for {title} retired, alert cleared");
            }
        }
    }

    fn execute(&self, mapping: &TriggerMapping, title: &str) {
        match mapping.action {
            ActionKind::Shell => {
                for template in &mapping.commands {
                    let command = template.replace("{alert_title}", title);
                    info!("trigger for {title}: running {command}");
                    if let Err(e) = self.runner.run_shell(&command) {
                        error!("trigger command failed: {e}");
                    }
                }
            }
            ActionKind::Dtmf => {
                for node in &mapping.nodes {
                    for function in &mapping.commands {
                        let command = format!(
                            "{} -rx \"rpt fun {node} {function}\"",
                            self.config.node.asterisk_path
                        );
                        info!("trigger for {title}: DTMF {function} on node {node}");
                        if let Err(e) = self.runner.run_shell(&command) {
                            error!("trigger DTMF dispatch failed: {e}");
                        }
                    }
                }
            }
            ActionKind::Unknown => {
                warn!("trigger for {title} has an unrecognized action, not firing");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;
    use std::cell::RefCell;

    #[derive(Default)]
    struct RecordingRunner {
        commands: RefCell<Vec<String>>,
    }

    impl CommandRunner for RecordingRunner {
        fn run_shell(&self, command: &str) -> crate::error::Result<()> {
            self.commands.borrow_mut().push(command.to_owned());
            Ok(())
        }
    }

    fn shell_mapping(patterns: &[&str], match_mode: MatchMode) -> TriggerMapping {
        TriggerMapping {
            patterns: patterns.iter().map(|p| (*p).to_owned()).collect(),
            match_mode,
            action: ActionKind::Shell,
            commands: vec!["alert-hook '{alert_title}'".to_owned()],
            nodes: Vec::new(),
        }
    }

    fn config_with(mappings: Vec<TriggerMapping>) -> SkywatchConfig {
        let mut config = SkywatchConfig::default();
        config.triggers.enable = true;
        config.triggers.mappings = mappings;
        config
    }

    fn titles(entries: &[&str]) -> Vec<String> {
        entries.iter().map(|t| (*t).to_owned()).collect()
    }

    #[test]
    fn any_mode_fires_per_matched_title() {
        let config = config_with(vec![shell_mapping(&["Tornado *"], MatchMode::Any)]);
        let runner = RecordingRunner::default();
        let mut processed = BTreeSet::new();

        TriggerDispatcher::new(&config, &runner).dispatch(
            &titles(&["Tornado Warning", "Tornado Watch", "Flood Watch"]),
            &mut processed,
        );

        assert_eq!(
            *runner.commands.borrow(),
            vec![
                "alert-hook 'Tornado Warning'".to_owned(),
                "alert-hook 'Tornado Watch'".to_owned(),
            ]
        );
        assert!(processed.contains("Tornado Warning"));
        assert!(processed.contains("Tornado Watch"));
        assert!(!processed.contains("Flood Watch"));
    }

    #[test]
    fn one_title_fires_every_matching_mapping_in_one_cycle() {
        let first = TriggerMapping {
            patterns: vec!["Tornado *".to_owned()],
            match_mode: MatchMode::Any,
            action: ActionKind::Shell,
            commands: vec!["hook-one '{alert_title}'".to_owned()],
            nodes: Vec::new(),
        };
        let second = TriggerMapping {
            patterns: vec!["* Warning".to_owned()],
            match_mode: MatchMode::Any,
            action: ActionKind::Shell,
            commands: vec!["hook-two '{alert_title}'".to_owned()],
            nodes: Vec::new(),
        };
        let config = config_with(vec![first, second]);
        let runner = RecordingRunner::default();
        let mut processed = BTreeSet::new();

        TriggerDispatcher::new(&config, &runner)
            .dispatch(&titles(&["Tornado Warning"]), &mut processed);

        assert_eq!(
            *runner.commands.borrow(),
            vec![
                "hook-one 'Tornado Warning'".to_owned(),
                "hook-two 'Tornado Warning'".to_owned(),
            ]
        );
    }

    #[test]
    fn all_mode_count_is_unaffected_by_an_earlier_mapping_firing() {
        let any = shell_mapping(&["Tornado Warning"], MatchMode::Any);
        let all = shell_mapping(&["Tornado Warning", "Flood Watch"], MatchMode::All);
        let config = config_with(vec![any, all]);
        let runner = RecordingRunner::default();
        let mut processed = BTreeSet::new();

        TriggerDispatcher::new(&config, &runner).dispatch(
            &titles(&["Tornado Warning", "Flood Watch"]),
            &mut processed,
        );

        // The ANY mapping fires for the warning, and the ALL mapping still
        // counts both titles: one fire from the first, two from the second.
        assert_eq!(runner.commands.borrow().len(), 3);
    }

    #[test]
    fn all_mode_requires_matched_count_to_equal_pattern_count() {
        let config = config_with(vec![shell_mapping(
            &["Tornado Warning", "Flood Watch"],
            MatchMode::All,
        )]);
        let runner = RecordingRunner::default();
        let mut processed = BTreeSet::new();
        let dispatcher = TriggerDispatcher::new(&config, &runner);

        dispatcher.dispatch(&titles(&["Tornado Warning"]), &mut processed);
        assert!(runner.commands.borrow().is_empty());

        dispatcher.dispatch(&titles(&["Tornado Warning", "Flood Watch"]), &mut processed);
        assert_eq!(runner.commands.borrow().len(), 2);
    }

    #[test]
    fn fired_title_does_not_fire_again_until_retired() {
        let config = config_with(vec![shell_mapping(&["Tornado Warning"], MatchMode::Any)]);
        let runner = RecordingRunner::default();
        let mut processed = BTreeSet::new();
        let dispatcher = TriggerDispatcher::new(&config, &runner);

        let added = titles(&["Tornado Warning"]);
        dispatcher.dispatch(&added, &mut processed);
        dispatcher.dispatch(&added, &mut processed);
        assert_eq!(runner.commands.borrow().len(), 1);

        dispatcher.retire(&added, &mut processed);
        assert!(processed.is_empty());
        dispatcher.dispatch(&added, &mut processed);
        assert_eq!(runner.commands.borrow().len(), 2);
    }

    #[test]
    fn dtmf_action_sends_every_function_to_every_node() {
        let mut config = config_with(vec![TriggerMapping {
            patterns: vec!["Tornado Warning".to_owned()],
            match_mode: MatchMode::Any,
            action: ActionKind::Dtmf,
            commands: vec!["*911".to_owned()],
            nodes: vec!["1999".to_owned(), "2000".to_owned()],
        }]);
        config.node.asterisk_path = "/usr/sbin/asterisk".to_owned();
        let runner = RecordingRunner::default();
        let mut processed = BTreeSet::new();

        TriggerDispatcher::new(&config, &runner)
            .dispatch(&titles(&["Tornado Warning"]), &mut processed);

        assert_eq!(
            *runner.commands.borrow(),
            vec![
                "/usr/sbin/asterisk -rx \"rpt fun 1999 *911\"".to_owned(),
                "/usr/sbin/asterisk -rx \"rpt fun 2000 *911\"".to_owned(),
            ]
        );
    }

    #[test]
    fn unknown_action_never_fires_commands() {
        let config = config_with(vec![TriggerMapping {
            patterns: vec!["*".to_owned()],
            action: ActionKind::Unknown,
            commands: vec!["should-not-run".to_owned()],
            ..TriggerMapping::default()
        }]);
        let runner = RecordingRunner::default();
        let mut processed = BTreeSet::new();

        TriggerDispatcher::new(&config, &runner)
            .dispatch(&titles(&["Tornado Warning"]), &mut processed);
        assert!(runner.commands.borrow().is_empty());
        // The title still counts as fired for this activation.
        assert!(processed.contains("Tornado Warning"));
    }

    #[test]
    fn disabled_triggers_do_nothing() {
        let mut config = config_with(vec![shell_mapping(&["*"], MatchMode::Any)]);
        config.triggers.enable = false;
        let runner = RecordingRunner::default();
        let mut processed = BTreeSet::new();

        TriggerDispatcher::new(&config, &runner)
            .dispatch(&titles(&["Tornado Warning"]), &mut processed);
        assert!(runner.commands.borrow().is_empty());
        assert!(processed.is_empty());
    }
}
