//! Announcement dispatch to the repeater nodes.
//!
//! Assembled audio is written to disk and handed to asterisk with
//! `rpt localplay`, which takes the file stem without extension. Playback
//! is fire-and-forget on asterisk's side, so after dispatch we block for
//! the audio duration plus a grace period; the caller must not rewrite the
//! tail message underneath a playing announcement.

use crate::audio::buffer::AudioBuffer;
use crate::config::SkywatchConfig;
use crate::error::Result;
use crate::exec::CommandRunner;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, error, info};

/// Duration of the silence written over a retired tail message.
const SILENT_TAIL_MS: u64 = 100;

/// Writes assembled audio and plays it on the configured nodes.
pub struct Playout<'a> {
    config: &'a SkywatchConfig,
    runner: &'a dyn CommandRunner,
}

impl<'a> Playout<'a> {
    /// Create a playout over the configuration and command runner.
    pub fn new(config: &'a SkywatchConfig, runner: &'a dyn CommandRunner) -> Self {
        Self { config, runner }
    }

    /// Write `buffer` to `path` and play it on every configured node, then
    /// block until the audio plus the grace period has elapsed. Per-node
    /// dispatch failures are logged, not returned.
    ///
    /// # Errors
    ///
    /// Returns an error if the WAV file cannot be written.
    pub fn dispatch(&self, buffer: &AudioBuffer, path: &Path) -> Result<()> {
        buffer.write_wav_file(path)?;

        let stem = path.with_extension("");
        for node in &self.config.node.nodes {
            info!("playing {} on node {node}", path.display());
            let command = format!(
                "{} -rx \"rpt localplay {node} {}\"",
                self.config.node.asterisk_path,
                stem.display()
            );
            if let Err(e) = self.runner.run_shell(&command) {
                error!("playback dispatch to node {node} failed: {e}");
            }
        }

        if !self.config.node.nodes.is_empty() {
            let wait =
                buffer.duration_secs_ceil() + self.config.node.post_announcement_grace_secs;
            if wait > 0 {
                debug!("blocking {wait}s for playback to finish");
                std::thread::sleep(Duration::from_secs(wait));
            }
        }

        Ok(())
    }

    /// Write the standing tail message file without playing anything.
    ///
    /// # Errors
    ///
    /// Returns an error if the WAV file cannot be written.
    pub fn write_tail_message(&self, buffer: &AudioBuffer) -> Result<()> {
        let path = &self.config.tail_message.path;
        debug!("writing tail message to {}", path.display());
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        buffer.write_wav_file(path)
    }

    /// Overwrite the tail message with a short silence.
    ///
    /// # Errors
    ///
    /// Returns an error if the WAV file cannot be written.
    pub fn silence_tail_message(&self) -> Result<()> {
        debug!("silencing tail message");
        self.write_tail_message(&AudioBuffer::silence_with_format(SILENT_TAIL_MS, 8_000, 1))
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

    fn config_in(dir: &tempfile::TempDir) -> SkywatchConfig {
        let mut config = SkywatchConfig::default();
        config.node.nodes = vec!["1999".to_owned()];
        config.node.post_announcement_grace_secs = 0;
        config.tail_message.path = dir.path().join("wx-tail.wav");
        config
    }

    #[test]
    fn dispatch_writes_wav_and_plays_stem_on_each_node() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config_in(&dir);
        config.node.nodes.push("2000".to_owned());
        let runner = RecordingRunner::default();
        let playout = Playout::new(&config, &runner);

        let path = dir.path().join("alert.wav");
        let buffer = AudioBuffer::silence_with_format(100, 8_000, 1);
        playout.dispatch(&buffer, &path).unwrap();

        assert!(path.exists());
        let stem = dir.path().join("alert");
        assert_eq!(
            *runner.commands.borrow(),
            vec![
                format!("/usr/sbin/asterisk -rx \"rpt localplay 1999 {}\"", stem.display()),
                format!("/usr/sbin/asterisk -rx \"rpt localplay 2000 {}\"", stem.display()),
            ]
        );
    }

    #[test]
    fn dispatch_without_nodes_only_writes_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config_in(&dir);
        config.node.nodes.clear();
        let runner = RecordingRunner::default();
        let playout = Playout::new(&config, &runner);

        let path = dir.path().join("alert.wav");
        playout
            .dispatch(&AudioBuffer::silence_with_format(100, 8_000, 1), &path)
            .unwrap();

        assert!(path.exists());
        assert!(runner.commands.borrow().is_empty());
    }

    #[test]
    fn silence_tail_message_writes_short_silence() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(&dir);
        let runner = RecordingRunner::default();
        let playout = Playout::new(&config, &runner);

        playout.silence_tail_message().unwrap();

        let written = AudioBuffer::from_wav_file(&config.tail_message.path).unwrap();
        assert_eq!(written.duration_ms(), 100);
        assert!(runner.commands.borrow().is_empty());
    }

    #[test]
    fn write_tail_message_overwrites_previous_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(&dir);
        let runner = RecordingRunner::default();
        let playout = Playout::new(&config, &runner);

        playout
            .write_tail_message(&AudioBuffer::silence_with_format(500, 8_000, 1))
            .unwrap();
        playout
            .write_tail_message(&AudioBuffer::silence_with_format(200, 8_000, 1))
            .unwrap();

        let written = AudioBuffer::from_wav_file(&config.tail_message.path).unwrap();
        assert_eq!(written.duration_ms(), 200);
    }
}
