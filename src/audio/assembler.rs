//! Deterministic audio-sequence assembly.
//!
//! Builds one linear clip sequence for an alert collection, in the
//! collection's iteration order. The same routine drives both the spoken
//! announcement and the standing tail message; only the block list, the
//! leading header, and the suffix/pad rules differ between the two modes.
//! Missing clips are recoverable: the affected segment is skipped and the
//! build continues.

use crate::alerts::{AlertCollection, ZoneOccurrence};
use crate::audio::buffer::AudioBuffer;
use crate::audio::clips::{
    self, ALL_CLEAR_BODY, ANNOUNCEMENT_HEADER, ClipSource, MULTIPLE_INSTANCES,
};
use crate::config::SkywatchConfig;
use std::collections::BTreeSet;
use tracing::{debug, error};
use wildmatch::WildMatch;

/// Repeater channel output format.
pub const OUTPUT_SAMPLE_RATE: u32 = 8_000;
/// Repeater channel output channel count.
pub const OUTPUT_CHANNELS: u16 = 1;

/// Silence emitted when there is nothing to announce.
const EMPTY_SILENCE_MS: u64 = 100;
/// Gap before the first zone identifier of an alert.
const FIRST_ZONE_GAP_MS: u64 = 600;
/// Gap between subsequent zone identifiers.
const NEXT_ZONE_GAP_MS: u64 = 400;
/// Gap after the last zone identifier of an alert.
const TRAILING_ZONE_GAP_MS: u64 = 600;
/// Gap before the "multiple instances" clip.
const MULTIPLES_GAP_MS: u64 = 200;
/// Gap before the header clip and before an announcement suffix.
const WORD_GAP_MS: u64 = 600;
/// Gap before a tail message suffix.
const TAIL_SUFFIX_GAP_MS: u64 = 1000;

/// Which output a build is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssemblyMode {
    /// One-shot spoken announcement.
    Announcement,
    /// Standing tail message.
    TailMessage,
}

/// A finished build: the output buffer plus how many alerts made it in.
#[derive(Debug, Clone)]
pub struct Assembly {
    /// Assembled audio, already in the output format.
    pub buffer: AudioBuffer,
    /// Alerts that contributed at least their title clip.
    pub alerts_included: usize,
}

/// Builds announcement and tail-message audio from an alert collection.
pub struct AudioAssembler<'a> {
    config: &'a SkywatchConfig,
    clips: &'a dyn ClipSource,
}

impl<'a> AudioAssembler<'a> {
    /// Create an assembler over the configuration and clip library.
    pub fn new(config: &'a SkywatchConfig, clips: &'a dyn ClipSource) -> Self {
        Self { config, clips }
    }

    /// Build the audio sequence for a collection in the given mode.
    pub fn build(&self, alerts: &AlertCollection, mode: AssemblyMode) -> Assembly {
        let blocked: Vec<WildMatch> = match mode {
            AssemblyMode::Announcement => &self.config.blocking.announcement,
            AssemblyMode::TailMessage => &self.config.blocking.tail_message,
        }
        .iter()
        .map(|p| WildMatch::new(p))
        .collect();

        let survivors: Vec<(&str, &[ZoneOccurrence])> = alerts
            .iter()
            .filter(|(title, _)| {
                let is_blocked = blocked.iter().any(|p| p.matches(title));
                if is_blocked {
                    debug!("assembler: blocking {title} as per configuration");
                }
                !is_blocked
            })
            .collect();

        if survivors.is_empty() {
            debug!("assembler: nothing to announce, producing fixed silence");
            return Assembly {
                buffer: self.output_silence(),
                alerts_included: 0,
            };
        }

        let zone_identifiers = match mode {
            AssemblyMode::Announcement => self.config.has_zone_clips(),
            AssemblyMode::TailMessage => {
                self.config.tail_message.zone_identifiers && self.config.has_zone_clips()
            }
        };

        let separator = self.load_recoverable(&clips::effect_clip(&self.config.alerting.separator_clip));

        let mut combined = AudioBuffer::empty();

        if mode == AssemblyMode::Announcement {
            if let Some(intro) = self.load_recoverable(&clips::effect_clip(&self.config.alerting.intro_clip)) {
                combined.append(&intro);
            }
            combined.append(&AudioBuffer::silence(WORD_GAP_MS));
            if let Some(header) = self.load_recoverable(ANNOUNCEMENT_HEADER) {
                combined.append(&header);
            }
        }

        let mut alerts_included = 0;
        for (title, occurrences) in survivors {
            let Some(clip_path) = clips::hazard_clip(title) else {
                error!("assembler: alert not in catalog: {title}");
                continue;
            };
            let Some(title_clip) = self.load_recoverable(&clip_path) else {
                continue;
            };

            if let Some(separator) = &separator {
                combined.append(separator);
            }
            combined.append(&title_clip);
            debug!("assembler: added {title} ({clip_path})");
            alerts_included += 1;

            if self.config.alerting.with_multiples && has_multiple_instances(occurrences) {
                debug!("assembler: multiple distinct instances of {title}");
                if let Some(multiples) = self.load_recoverable(MULTIPLE_INSTANCES) {
                    combined.append(&AudioBuffer::silence(MULTIPLES_GAP_MS));
                    combined.append(&multiples);
                }
            }

            if zone_identifiers {
                self.append_zone_identifiers(&mut combined, title, occurrences);
            }
        }

        if alerts_included == 0 {
            debug!("assembler: all alerts blocked or unplayable, producing fixed silence");
            return Assembly {
                buffer: self.output_silence(),
                alerts_included: 0,
            };
        }

        combined = self.finish(combined, mode);

        Assembly {
            buffer: combined,
            alerts_included,
        }
    }

    /// Build the all-clear message: the all-clear effect, a gap, the spoken
    /// body, and the optional configured suffix.
    pub fn build_all_clear(&self) -> AudioBuffer {
        let mut combined = AudioBuffer::empty();

        if let Some(effect) =
            self.load_recoverable(&clips::effect_clip(&self.config.alerting.all_clear_clip))
        {
            combined.append(&effect);
        }
        combined.append(&AudioBuffer::silence(WORD_GAP_MS));
        if let Some(body) = self.load_recoverable(ALL_CLEAR_BODY) {
            combined.append(&body);
        }

        if let Some(suffix) = &self.config.alerting.all_clear_suffix {
            debug!("assembler: adding all clear suffix {suffix}");
            if let Some(clip) = self.load_recoverable(suffix) {
                combined.append(&AudioBuffer::silence(WORD_GAP_MS));
                combined.append(&clip);
            }
        }

        if self.config.node.audio_delay_ms > 0 {
            combined = with_leading_silence(combined, self.config.node.audio_delay_ms);
        }

        combined.resampled(OUTPUT_SAMPLE_RATE, OUTPUT_CHANNELS)
    }

    /// Append the identifier clips for every not-yet-announced zone of one
    /// alert, with the configured gap pattern.
    fn append_zone_identifiers(
        &self,
        combined: &mut AudioBuffer,
        title: &str,
        occurrences: &[ZoneOccurrence],
    ) {
        let mut announced: BTreeSet<&str> = BTreeSet::new();
        let mut any_appended = false;

        for occurrence in occurrences {
            let Some(clip_path) = self.config.zone_clip(&occurrence.zone_code) else {
                continue;
            };
            if !announced.insert(&occurrence.zone_code) {
                continue;
            }
            match self.clips.load(clip_path) {
                Ok(clip) => {
                    let gap = if any_appended {
                        NEXT_ZONE_GAP_MS
                    } else {
                        FIRST_ZONE_GAP_MS
                    };
                    debug!(
                        "assembler: adding {} identifier {clip_path} to {title}",
                        occurrence.zone_code
                    );
                    combined.append(&AudioBuffer::silence(gap));
                    combined.append(&clip);
                    any_appended = true;
                }
                Err(e) => error!("assembler: zone identifier clip unavailable: {e}"),
            }
        }

        if any_appended {
            combined.append(&AudioBuffer::silence(TRAILING_ZONE_GAP_MS));
        }
    }

    /// Apply the per-mode suffix and leading-pad rules, then convert to the
    /// output format. In tail mode the suffix and the leading pad are
    /// mutually exclusive; an announcement may carry both.
    fn finish(&self, mut combined: AudioBuffer, mode: AssemblyMode) -> AudioBuffer {
        match mode {
            AssemblyMode::Announcement => {
                if let Some(suffix) = &self.config.alerting.announcement_suffix {
                    debug!("assembler: adding announcement suffix {suffix}");
                    if let Some(clip) = self.load_recoverable(suffix) {
                        combined.append(&AudioBuffer::silence(WORD_GAP_MS));
                        combined.append(&clip);
                    }
                }
                if self.config.node.audio_delay_ms > 0 {
                    combined = with_leading_silence(combined, self.config.node.audio_delay_ms);
                }
            }
            AssemblyMode::TailMessage => {
                if let Some(suffix) = &self.config.tail_message.suffix {
                    debug!("assembler: adding tail message suffix {suffix}");
                    if let Some(clip) = self.load_recoverable(suffix) {
                        combined.append(&AudioBuffer::silence(TAIL_SUFFIX_GAP_MS));
                        combined.append(&clip);
                    }
                } else if self.config.node.audio_delay_ms > 0 {
                    combined = with_leading_silence(combined, self.config.node.audio_delay_ms);
                }
            }
        }

        combined.resampled(OUTPUT_SAMPLE_RATE, OUTPUT_CHANNELS)
    }

    /// The fixed short silence used when there is nothing to play.
    pub fn output_silence(&self) -> AudioBuffer {
        AudioBuffer::silence_with_format(EMPTY_SILENCE_MS, OUTPUT_SAMPLE_RATE, OUTPUT_CHANNELS)
    }

    fn load_recoverable(&self, relative: &str) -> Option<AudioBuffer> {
        match self.clips.load(relative) {
            Ok(clip) => Some(clip),
            Err(e) => {
                error!("assembler: {e}");
                None
            }
        }
    }
}

/// More than one distinct description or end-time string among an alert's
/// occurrences.
fn has_multiple_instances(occurrences: &[ZoneOccurrence]) -> bool {
    let descriptions: BTreeSet<&str> =
        occurrences.iter().map(|o| o.description.as_str()).collect();
    if descriptions.len() > 1 {
        return true;
    }
    let end_times: BTreeSet<String> = occurrences.iter().map(|o| o.end_time.to_rfc3339()).collect();
    end_times.len() > 1
}

/// Prepend silence in the buffer's own format.
fn with_leading_silence(buffer: AudioBuffer, duration_ms: u64) -> AudioBuffer {
    let mut out = if buffer.sample_rate() == 0 {
        AudioBuffer::silence(duration_ms)
    } else {
        AudioBuffer::silence_with_format(duration_ms, buffer.sample_rate(), buffer.channels())
    };
    out.append(&buffer);
    out
}
