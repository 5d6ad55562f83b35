//! # skywatch
//!
//! Severe weather alert engine for Asterisk/app_rpt repeater controllers.
//!
//! Each invocation is one poll cycle: the configured zones are polled
//! against the NWS active-alerts feed, the results are normalized, sorted
//! by severity, and diffed against the previous cycle. When the alert set
//! changed, the engine speaks an announcement over the repeater, rebuilds
//! the standing tail message, switches courtesy tones and the station
//! identifier, fires scripted triggers, and sends a change digest.
//!
//! ## Architecture
//!
//! - [`feed`]: blocking NWS client behind the [`feed::AlertSource`] seam
//! - [`alerts`]: normalization, severity sorting, cross-cycle diffing
//! - [`audio`]: PCM buffers, the clip library, sequence assembly, playout
//! - [`switching`]: courtesy tone and identifier slot overwrites
//! - [`triggers`]: glob-matched shell/DTMF actions on new alerts
//! - [`state`]: the persisted cross-cycle engine memory
//! - [`engine`]: the per-cycle orchestrator tying it all together

pub mod alerts;
pub mod audio;
pub mod catalog;
pub mod config;
pub mod engine;
pub mod error;
pub mod exec;
pub mod feed;
pub mod notify;
pub mod state;
pub mod switching;
pub mod triggers;
pub mod zones;

pub use config::SkywatchConfig;
pub use engine::Engine;
pub use error::{AlertError, Result};
