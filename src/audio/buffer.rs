//! PCM buffer primitives for clip assembly.
//!
//! A thin i16 PCM buffer with just the operations the assembler needs:
//! WAV load/store via `hound`, silence generation, concatenation, and
//! resampling down to the repeater's 8 kHz mono output format.

use crate::error::{AlertError, Result};
use std::path::Path;

/// Sample rate used for generated silence when no clip has set one yet.
const DEFAULT_SAMPLE_RATE: u32 = 8_000;

/// An interleaved i16 PCM buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioBuffer {
    samples: Vec<i16>,
    sample_rate: u32,
    channels: u16,
}

impl AudioBuffer {
    /// An empty buffer that adopts the format of the first appended clip.
    pub fn empty() -> Self {
        Self {
            samples: Vec::new(),
            sample_rate: 0,
            channels: 0,
        }
    }

    /// Silence of the given duration at a specific format.
    pub fn silence_with_format(duration_ms: u64, sample_rate: u32, channels: u16) -> Self {
        let frames = (u64::from(sample_rate) * duration_ms / 1000) as usize;
        Self {
            samples: vec![0; frames * usize::from(channels)],
            sample_rate,
            channels,
        }
    }

    /// Silence of the given duration at the default format.
    pub fn silence(duration_ms: u64) -> Self {
        Self::silence_with_format(duration_ms, DEFAULT_SAMPLE_RATE, 1)
    }

    /// Load a WAV file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or decoded.
    pub fn from_wav_file(path: &Path) -> Result<Self> {
        let mut reader = hound::WavReader::open(path)
            .map_err(|e| AlertError::Audio(format!("cannot open {}: {e}", path.display())))?;
        let spec = reader.spec();

        let samples: Vec<i16> = match spec.sample_format {
            hound::SampleFormat::Int => {
                let shift = spec.bits_per_sample.saturating_sub(16);
                reader
                    .samples::<i32>()
                    .map(|s| s.map(|v| (v >> shift) as i16))
                    .collect::<std::result::Result<_, _>>()
                    .map_err(|e| {
                        AlertError::Audio(format!("cannot decode {}: {e}", path.display()))
                    })?
            }
            hound::SampleFormat::Float => reader
                .samples::<f32>()
                .map(|s| s.map(|v| (v.clamp(-1.0, 1.0) * f32::from(i16::MAX)) as i16))
                .collect::<std::result::Result<_, _>>()
                .map_err(|e| AlertError::Audio(format!("cannot decode {}: {e}", path.display())))?,
        };

        Ok(Self {
            samples,
            sample_rate: spec.sample_rate,
            channels: spec.channels,
        })
    }

    /// Write the buffer as a 16-bit PCM WAV file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be created or written.
    pub fn write_wav_file(&self, path: &Path) -> Result<()> {
        let spec = hound::WavSpec {
            channels: self.channels.max(1),
            sample_rate: if self.sample_rate == 0 {
                DEFAULT_SAMPLE_RATE
            } else {
                self.sample_rate
            },
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };

        let mut writer = hound::WavWriter::create(path, spec)
            .map_err(|e| AlertError::Audio(format!("cannot create {}: {e}", path.display())))?;
        for sample in &self.samples {
            writer
                .write_sample(*sample)
                .map_err(|e| AlertError::Audio(format!("cannot write {}: {e}", path.display())))?;
        }
        writer
            .finalize()
            .map_err(|e| AlertError::Audio(format!("cannot finalize {}: {e}", path.display())))?;
        Ok(())
    }

    /// Append another buffer, converting it to this buffer's format if the
    /// rates or channel counts differ. An empty buffer adopts the appended
    /// buffer's format.
    pub fn append(&mut self, other: &AudioBuffer) {
        if self.sample_rate == 0 {
            *self = other.clone();
            return;
        }
        if other.sample_rate == self.sample_rate && other.channels == self.channels {
            self.samples.extend_from_slice(&other.samples);
        } else {
            let converted = other.resampled(self.sample_rate, self.channels);
            self.samples.extend_from_slice(&converted.samples);
        }
    }

    /// Convert to the given sample rate and channel count.
    ///
    /// Channel conversion averages down to mono or duplicates mono out;
    /// rate conversion is linear interpolation, which is plenty for voice
    /// clips headed to an 8 kHz repeater channel.
    pub fn resampled(&self, sample_rate: u32, channels: u16) -> Self {
        if self.sample_rate == 0 {
            return Self {
                samples: Vec::new(),
                sample_rate,
                channels,
            };
        }

        let mono: Vec<i16> = if self.channels <= 1 {
            self.samples.clone()
        } else {
            let step = usize::from(self.channels);
            self.samples
                .chunks_exact(step)
                .map(|frame| {
                    let sum: i32 = frame.iter().map(|s| i32::from(*s)).sum();
                    (sum / step as i32) as i16
                })
                .collect()
        };

        let resampled_mono = if sample_rate == self.sample_rate {
            mono
        } else {
            let out_len =
                (mono.len() as u64 * u64::from(sample_rate) / u64::from(self.sample_rate)) as usize;
            let ratio = f64::from(self.sample_rate) / f64::from(sample_rate);
            (0..out_len)
                .map(|i| {
                    let pos = i as f64 * ratio;
                    let base = pos as usize;
                    let frac = pos - base as f64;
                    let a = f64::from(*mono.get(base).unwrap_or(&0));
                    let b = f64::from(*mono.get(base + 1).unwrap_or(&(mono.last().copied().unwrap_or(0))));
                    (a + (b - a) * frac) as i16
                })
                .collect()
        };

        let samples = if channels <= 1 {
            resampled_mono
        } else {
            let mut out = Vec::with_capacity(resampled_mono.len() * usize::from(channels));
            for sample in resampled_mono {
                for _ in 0..channels {
                    out.push(sample);
                }
            }
            out
        };

        Self {
            samples,
            sample_rate,
            channels: channels.max(1),
        }
    }

    /// Duration in milliseconds.
    pub fn duration_ms(&self) -> u64 {
        if self.sample_rate == 0 || self.channels == 0 {
            return 0;
        }
        let frames = self.samples.len() as u64 / u64::from(self.channels);
        frames * 1000 / u64::from(self.sample_rate)
    }

    /// Duration in whole seconds, rounded up. Used to size the
    /// post-announcement wait.
    pub fn duration_secs_ceil(&self) -> u64 {
        self.duration_ms().div_ceil(1000)
    }

    /// Whether the buffer holds no samples.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Sample rate in Hz (0 for a fresh empty buffer).
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Channel count.
    pub fn channels(&self) -> u16 {
        self.channels
    }
}
