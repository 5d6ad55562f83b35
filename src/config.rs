//! Configuration types for the alert engine.
//!
//! Everything the original module-scope constants covered lives here as one
//! immutable [`SkywatchConfig`] constructed once at startup and passed by
//! reference into every component.

use crate::error::{AlertError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level configuration for the alert engine.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SkywatchConfig {
    /// Alert fetching, sorting, and announcement settings.
    pub alerting: AlertingConfig,
    /// Glob block lists applied globally and per output mode.
    pub blocking: BlockingConfig,
    /// Standing tail message settings.
    pub tail_message: TailMessageConfig,
    /// Courtesy tone switching settings.
    pub tones: CourtesyToneConfig,
    /// Station identifier switching settings.
    pub identifier: IdentifierConfig,
    /// Scripted trigger mappings.
    pub triggers: TriggerConfig,
    /// Push notification settings.
    pub notifications: NotifyConfig,
    /// Repeater node / playback dispatch settings.
    pub node: NodeConfig,
    /// Data directory and auxiliary file paths.
    pub paths: PathsConfig,
    /// Synthetic alert injection for testing.
    pub inject: InjectConfig,
    /// Logging settings.
    pub logging: LogConfig,
}

impl SkywatchConfig {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            AlertError::Config(format!("cannot read config {}: {e}", path.display()))
        })?;
        toml::from_str(&text)
            .map_err(|e| AlertError::Config(format!("cannot parse config {}: {e}", path.display())))
    }

    /// Zone codes in configured order.
    pub fn zone_codes(&self) -> Vec<&str> {
        self.alerting.zones.iter().map(|z| z.code.as_str()).collect()
    }

    /// Returns `true` if at least one zone has an identifier clip configured.
    pub fn has_zone_clips(&self) -> bool {
        self.alerting.zones.iter().any(|z| z.clip.is_some())
    }

    /// Identifier clip path for a zone code, if one is configured.
    pub fn zone_clip(&self, zone_code: &str) -> Option<&str> {
        self.alerting
            .zones
            .iter()
            .find(|z| z.code == zone_code)
            .and_then(|z| z.clip.as_deref())
    }
}

/// One configured alert zone.
///
/// Accepts either a plain string (`"OHC055"`) or a table with an associated
/// identifier clip (`{ code = "OHC055", clip = "OHC055.wav" }`); both shapes
/// normalize into this canonical form at load time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "ZoneEntryShape")]
pub struct ZoneEntry {
    /// Zone code the alert feed is queried with.
    pub code: String,
    /// Identifier clip announced for this zone, relative to the sounds path.
    pub clip: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ZoneEntryShape {
    Code(String),
    Full { code: String, clip: Option<String> },
}

impl From<ZoneEntryShape> for ZoneEntry {
    fn from(shape: ZoneEntryShape) -> Self {
        match shape {
            ZoneEntryShape::Code(code) => Self { code, clip: None },
            ZoneEntryShape::Full { code, clip } => Self { code, clip },
        }
    }
}

/// Which feed timestamps bound an alert's active window.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeBasis {
    /// Use the `onset` and `ends` fields.
    #[default]
    Onset,
    /// Use the `effective` and `expires` fields.
    Effective,
}

/// Alert fetching, sorting, and announcement configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertingConfig {
    /// Zones to poll, in announcement order.
    pub zones: Vec<ZoneEntry>,
    /// Maximum number of alerts kept after sorting.
    pub max_alerts: usize,
    /// Which feed timestamps bound the active window.
    pub time_basis: TimeBasis,
    /// Root directory of the voice clip library.
    pub sounds_path: PathBuf,
    /// Separator effect played before each alert clip (under `ALERTS/EFFECTS`).
    pub separator_clip: String,
    /// Attention effect played at the start of an announcement.
    pub intro_clip: String,
    /// Effect played at the start of the all-clear message.
    pub all_clear_clip: String,
    /// Announce the "multiple instances" clip when an alert has more than
    /// one distinct description or end time.
    pub with_multiples: bool,
    /// Speak announcements when the alert set changes.
    pub say_alert: bool,
    /// Speak every active alert on change rather than only new ones.
    pub say_alert_all: bool,
    /// Speak an all-clear message when the last alert clears.
    pub say_all_clear: bool,
    /// Speak alerts whose zone membership changed.
    pub say_changed: bool,
    /// Clip appended after a spoken announcement.
    pub announcement_suffix: Option<String>,
    /// Clip appended after the all-clear message.
    pub all_clear_suffix: Option<String>,
}

impl Default for AlertingConfig {
    fn default() -> Self {
        Self {
            zones: Vec::new(),
            max_alerts: 99,
            time_basis: TimeBasis::default(),
            sounds_path: PathBuf::from("SOUNDS"),
            separator_clip: "Woodblock.wav".to_owned(),
            intro_clip: "Duncecap.wav".to_owned(),
            all_clear_clip: "Triangle.wav".to_owned(),
            with_multiples: true,
            say_alert: false,
            say_alert_all: false,
            say_all_clear: false,
            say_changed: true,
            announcement_suffix: None,
            all_clear_suffix: None,
        }
    }
}

/// Glob block lists. Patterns are case-sensitive shell-style globs matched
/// against the full alert title.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BlockingConfig {
    /// Titles discarded during normalization, before any other processing.
    pub global: Vec<String>,
    /// Titles skipped when building spoken announcements.
    pub announcement: Vec<String>,
    /// Titles skipped when building the tail message.
    pub tail_message: Vec<String>,
}

/// Standing tail message configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TailMessageConfig {
    /// Whether the tail message is maintained at all.
    pub enable: bool,
    /// Output path of the tail message WAV.
    pub path: PathBuf,
    /// Announce zone identifier clips in the tail message.
    pub zone_identifiers: bool,
    /// Clip appended after the tail message body.
    pub suffix: Option<String>,
}

impl Default for TailMessageConfig {
    fn default() -> Self {
        Self {
            enable: false,
            path: PathBuf::from("/tmp/skywatch/wx-tail.wav"),
            zone_identifiers: false,
            suffix: None,
        }
    }
}

/// Courtesy tone switching configuration.
///
/// Two active slots (primary and link) are overwritten with either the
/// normal pair or the weather tone.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CourtesyToneConfig {
    /// Whether automatic tone switching is enabled.
    pub enable: bool,
    /// Directory containing the tone assets.
    pub tone_dir: PathBuf,
    /// Alert titles that select the weather tone while active.
    pub trigger_titles: Vec<String>,
    /// Normal tone source for the primary slot.
    pub normal_primary: String,
    /// Normal tone source for the link slot.
    pub normal_link: String,
    /// Weather tone source (copied over both slots).
    pub wx: String,
    /// Active primary slot filename.
    pub active_primary: String,
    /// Active link slot filename.
    pub active_link: String,
}

impl Default for CourtesyToneConfig {
    fn default() -> Self {
        Self {
            enable: false,
            tone_dir: PathBuf::from("SOUNDS/TONES"),
            trigger_titles: Vec::new(),
            normal_primary: "Boop.wav".to_owned(),
            normal_link: "Beep.wav".to_owned(),
            wx: "Stardust.wav".to_owned(),
            active_primary: "CT1.wav".to_owned(),
            active_link: "CT2.wav".to_owned(),
        }
    }
}

/// Station identifier switching configuration. One active slot.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IdentifierConfig {
    /// Whether automatic identifier switching is enabled.
    pub enable: bool,
    /// Directory containing the identifier assets.
    pub id_dir: PathBuf,
    /// Alert titles that select the weather identifier while active.
    pub trigger_titles: Vec<String>,
    /// Normal identifier source.
    pub normal: String,
    /// Weather identifier source.
    pub wx: String,
    /// Active slot filename.
    pub active: String,
}

impl Default for IdentifierConfig {
    fn default() -> Self {
        Self {
            enable: false,
            id_dir: PathBuf::from("SOUNDS/ID"),
            trigger_titles: Vec::new(),
            normal: "NORMALID.wav".to_owned(),
            wx: "WXID.wav".to_owned(),
            active: "RPTID.wav".to_owned(),
        }
    }
}

/// How a trigger mapping combines its patterns.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MatchMode {
    /// Fire when at least one pattern matches a new alert title.
    #[default]
    Any,
    /// Fire when the matched-title count equals the pattern count.
    All,
}

/// What a trigger mapping executes when it fires.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ActionKind {
    /// Run each command through the shell.
    #[default]
    Shell,
    /// Send each command as a DTMF function to each node.
    Dtmf,
    /// Unrecognized action kinds parse but never fire.
    #[serde(other)]
    Unknown,
}

/// One trigger rule: glob patterns over newly appeared alert titles plus the
/// action to fire when they match.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TriggerMapping {
    /// Shell-style glob patterns matched against new alert titles.
    pub patterns: Vec<String>,
    /// Match policy across patterns.
    pub match_mode: MatchMode,
    /// Action kind executed on fire.
    pub action: ActionKind,
    /// Command templates; `{alert_title}` is replaced with the matched title.
    pub commands: Vec<String>,
    /// Target nodes for DTMF actions.
    pub nodes: Vec<String>,
}

/// Scripted trigger configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TriggerConfig {
    /// Whether trigger dispatch runs at all.
    pub enable: bool,
    /// Trigger rules, evaluated in order.
    pub mappings: Vec<TriggerMapping>,
}

/// Push notification configuration (Pushover-style form POST).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NotifyConfig {
    /// Whether change digests are sent at all.
    pub enable: bool,
    /// Include tone/identifier/tail housekeeping lines in the digest.
    pub debug: bool,
    /// Pushover user key.
    pub user_key: String,
    /// Pushover API token.
    pub api_token: String,
}

/// Repeater node and playback dispatch configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    /// Node numbers announcements are played on.
    pub nodes: Vec<String>,
    /// Silence prepended to generated audio, in milliseconds.
    pub audio_delay_ms: u64,
    /// Path to the asterisk binary used for playback and DTMF dispatch.
    pub asterisk_path: String,
    /// Seconds to block after an announcement finishes, so the tail message
    /// cannot double-announce over it.
    pub post_announcement_grace_secs: u64,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            nodes: Vec::new(),
            audio_delay_ms: 0,
            asterisk_path: "/usr/sbin/asterisk".to_owned(),
            post_announcement_grace_secs: 10,
        }
    }
}

/// Data directory and auxiliary file paths.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Directory holding the state file and generated audio.
    pub data_dir: PathBuf,
    /// Dashboard compatibility file listing active titles, if maintained.
    pub dashboard_file: Option<PathBuf>,
    /// Markdown file of `| Name | Code |` tables used to humanize zone
    /// codes in notifications.
    pub zone_names_file: Option<PathBuf>,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("/tmp/skywatch"),
            dashboard_file: None,
            zone_names_file: None,
        }
    }
}

impl PathsConfig {
    /// Path of the persisted engine state file.
    pub fn state_file(&self) -> PathBuf {
        self.data_dir.join("state.json")
    }

    /// Path the spoken announcement WAV is written to before dispatch.
    pub fn announcement_file(&self) -> PathBuf {
        self.data_dir.join("alert.wav")
    }

    /// Path the all-clear WAV is written to before dispatch.
    pub fn all_clear_file(&self) -> PathBuf {
        self.data_dir.join("allclear.wav")
    }
}

/// A synthetic alert injected instead of polling the feed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct InjectedAlert {
    /// Alert title; severity derives from its last word.
    pub title: String,
    /// Zone codes the alert covers. Empty means "assign from the configured
    /// zone list", one more zone per successive injected alert.
    pub zones: Vec<String>,
    /// End time as `%Y-%m-%dT%H:%M:%SZ`; defaults to one hour from now.
    pub end_time: Option<String>,
}

/// Synthetic alert injection for testing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct InjectConfig {
    /// Whether injection replaces feed polling entirely.
    pub enable: bool,
    /// Alerts to inject.
    pub alerts: Vec<InjectedAlert>,
}

/// Logging configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Enable debug-level logging.
    pub debug: bool,
    /// Log file path (stderr only when unset).
    pub path: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;

    #[test]
    fn default_config_parses_from_empty_toml() {
        let config: SkywatchConfig = toml::from_str("").unwrap();
        assert_eq!(config.alerting.max_alerts, 99);
        assert_eq!(config.alerting.time_basis, TimeBasis::Onset);
        assert_eq!(config.node.post_announcement_grace_secs, 10);
        assert!(!config.tail_message.enable);
    }

    #[test]
    fn zone_entry_accepts_plain_string() {
        let config: SkywatchConfig = toml::from_str(
            r#"
            [alerting]
            zones = ["OHC055", "OHC085"]
            "#,
        )
        .unwrap();
        assert_eq!(config.alerting.zones.len(), 2);
        assert_eq!(config.alerting.zones[0].code, "OHC055");
        assert!(config.alerting.zones[0].clip.is_none());
        assert!(!config.has_zone_clips());
    }

    #[test]
    fn zone_entry_accepts_table_with_clip() {
        let config: SkywatchConfig = toml::from_str(
            r#"
            [alerting]
            zones = [
                { code = "OHC055", clip = "GEAUGA.wav" },
                "OHC085",
            ]
            "#,
        )
        .unwrap();
        assert_eq!(config.alerting.zones[0].clip.as_deref(), Some("GEAUGA.wav"));
        assert!(config.has_zone_clips());
        assert_eq!(config.zone_clip("OHC055"), Some("GEAUGA.wav"));
        assert_eq!(config.zone_clip("OHC085"), None);
        assert_eq!(config.zone_clip("nowhere"), None);
    }

    #[test]
    fn time_basis_parses_lowercase() {
        let config: SkywatchConfig = toml::from_str(
            r#"
            [alerting]
            time_basis = "effective"
            "#,
        )
        .unwrap();
        assert_eq!(config.alerting.time_basis, TimeBasis::Effective);
    }

    #[test]
    fn trigger_mapping_unknown_action_parses() {
        let config: SkywatchConfig = toml::from_str(
            r#"
            [[triggers.mappings]]
            patterns = ["Tornado *"]
            action = "TELNET"
            "#,
        )
        .unwrap();
        assert_eq!(config.triggers.mappings[0].action, ActionKind::Unknown);
        assert_eq!(config.triggers.mappings[0].match_mode, MatchMode::Any);
    }

    #[test]
    fn trigger_mapping_match_mode_uppercase() {
        let config: SkywatchConfig = toml::from_str(
            r#"
            [[triggers.mappings]]
            patterns = ["*"]
            match_mode = "ALL"
            action = "DTMF"
            "#,
        )
        .unwrap();
        assert_eq!(config.triggers.mappings[0].match_mode, MatchMode::All);
        assert_eq!(config.triggers.mappings[0].action, ActionKind::Dtmf);
    }

    #[test]
    fn state_file_path_under_data_dir() {
        let paths = PathsConfig::default();
        assert!(paths.state_file().to_string_lossy().ends_with("state.json"));
    }

    #[test]
    fn load_missing_file_is_config_error() {
        let err = SkywatchConfig::load(Path::new("/nonexistent/skywatch.toml")).unwrap_err();
        assert!(matches!(err, AlertError::Config(_)));
    }
}
