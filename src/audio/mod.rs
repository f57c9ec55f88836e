// Offline synthesis: envelopes, tones, scales and the overlap-add sequencer.
pub mod envelope;
pub mod scales;
pub mod sequence;
pub mod tone;

pub use envelope::{interpolate, Envelope};
pub use scales::Scale;
pub use sequence::{find_bounds, linspace, Sequence};
pub use tone::{Tone, Waveform};

use serde::Deserialize;

use crate::error::Error;

/// Output channel layout.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(try_from = "u16")]
pub enum Channels {
    #[default]
    Mono,
    Stereo,
}

impl Channels {
    #[inline]
    pub fn count(self) -> usize {
        match self {
            Channels::Mono => 1,
            Channels::Stereo => 2,
        }
    }
}

impl TryFrom<u16> for Channels {
    type Error = Error;

    fn try_from(n: u16) -> Result<Self, Error> {
        match n {
            1 => Ok(Channels::Mono),
            2 => Ok(Channels::Stereo),
            _ => Err(Error::UnsupportedChannels(n)),
        }
    }
}

/// Settings for one render pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderOptions {
    pub sample_rate: u32,
    /// Scale the finished buffer so its peak is 1.0.
    pub normalize: bool,
    pub channels: Channels,
    /// Base seed for the per-tone noise generators.
    pub noise_seed: u64,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            sample_rate: 96_000,
            normalize: true,
            channels: Channels::Mono,
            noise_seed: 0,
        }
    }
}

impl RenderOptions {
    pub fn new(sample_rate: u32) -> Self {
        Self {
            sample_rate,
            ..Default::default()
        }
    }

    pub fn normalized(mut self, normalize: bool) -> Self {
        self.normalize = normalize;
        self
    }

    pub fn stereo(mut self) -> Self {
        self.channels = Channels::Stereo;
        self
    }

    pub fn with_noise_seed(mut self, seed: u64) -> Self {
        self.noise_seed = seed;
        self
    }
}

/// Interleaved floating-point samples.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioBuffer {
    sample_rate: u32,
    channels: Channels,
    samples: Vec<f64>,
}

impl AudioBuffer {
    /// `frames` frames of silence.
    pub fn silent(sample_rate: u32, channels: Channels, frames: usize) -> Self {
        Self {
            sample_rate,
            channels,
            samples: vec![0.0; frames * channels.count()],
        }
    }

    #[inline]
    pub fn sample_rate(&self) -> u32 { self.sample_rate }
    #[inline]
    pub fn channels(&self) -> Channels { self.channels }

    /// Number of frames (samples per channel).
    pub fn frames(&self) -> usize {
        self.samples.len() / self.channels.count()
    }

    pub fn samples(&self) -> &[f64] {
        &self.samples
    }

    pub fn into_samples(self) -> Vec<f64> {
        self.samples
    }

    /// Samples of one channel, in time order.
    pub fn channel(&self, index: usize) -> impl Iterator<Item = f64> + '_ {
        self.samples
            .iter()
            .skip(index)
            .step_by(self.channels.count())
            .copied()
    }

    /// Largest absolute sample value.
    pub fn peak(&self) -> f64 {
        self.samples.iter().fold(0.0f64, |m, s| m.max(s.abs()))
    }

    /// Add interleaved `samples` starting at frame `offset`; anything past
    /// the end is dropped.
    pub fn add_at(&mut self, offset: usize, samples: &[f64]) {
        let start = (offset * self.channels.count()).min(self.samples.len());
        for (dst, src) in self.samples[start..].iter_mut().zip(samples) {
            *dst += src;
        }
    }

    /// Add another buffer of the same layout sample by sample.
    pub fn mix(&mut self, other: &AudioBuffer) {
        debug_assert_eq!(self.channels, other.channels);
        self.add_at(0, &other.samples);
    }

    /// Divide by the peak so the loudest sample is ±1.0. Silence is left as
    /// is.
    pub fn normalize(&mut self) {
        let peak = self.peak();
        if peak == 0.0 || !peak.is_finite() {
            return;
        }
        for s in &mut self.samples {
            *s /= peak;
        }
    }
}
