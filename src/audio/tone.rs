//! A single enveloped note.
//!
//! Tones are rendered against an arbitrary array of timestamps rather than a
//! running phase, so any slice of a tone can be synthesized independently.

use std::f64::consts::{FRAC_PI_2, PI};
use std::str::FromStr;

use rand::Rng;
use rand_distr::StandardNormal;
use serde::Deserialize;

use super::envelope::Envelope;
use super::Channels;
use crate::error::{Error, Result};

/// Carrier waveform.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub enum Waveform {
    Sine,
    #[default]
    Square,
}

impl Waveform {
    /// Carrier value at `phase` radians.
    #[inline]
    pub fn sample(self, phase: f64) -> f64 {
        let s = phase.sin();
        match self {
            Waveform::Sine => s,
            // f64::signum maps 0.0 to 1.0
            Waveform::Square if s == 0.0 => 0.0,
            Waveform::Square => s.signum(),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Waveform::Sine => "sine",
            Waveform::Square => "square",
        }
    }
}

impl FromStr for Waveform {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "sine" | "sin" => Ok(Waveform::Sine),
            "square" => Ok(Waveform::Square),
            _ => Err(Error::UnknownWaveform(s.to_string())),
        }
    }
}

impl TryFrom<String> for Waveform {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

/// One note event: when it starts, how it is shaped and how it sounds.
#[derive(Debug, Clone, PartialEq)]
pub struct Tone {
    start_time: f64,
    envelope: Envelope,
    pitch: f64,
    volume: f64,
    pan: f64,
    wave: Waveform,
    noise_ratio: f64,
}

impl Tone {
    /// A centred, noiseless 440 Hz sine at time zero with unit volume.
    pub fn new(envelope: Envelope) -> Self {
        Self {
            start_time: 0.0,
            envelope,
            pitch: 440.0,
            volume: 1.0,
            pan: 0.5,
            wave: Waveform::Sine,
            noise_ratio: 0.0,
        }
    }

    /// Same tone starting at `start_time` seconds.
    pub fn at(mut self, start_time: f64) -> Self {
        self.start_time = start_time;
        self
    }

    pub fn with_pitch(mut self, pitch: f64) -> Self {
        self.pitch = pitch;
        self
    }

    pub fn with_volume(mut self, volume: f64) -> Self {
        self.volume = volume;
        self
    }

    /// `0.0` is hard left, `1.0` hard right; clamped when rendering.
    pub fn with_pan(mut self, pan: f64) -> Self {
        self.pan = pan;
        self
    }

    pub fn with_wave(mut self, wave: Waveform) -> Self {
        self.wave = wave;
        self
    }

    /// Fraction of Gaussian noise mixed into the carrier.
    pub fn with_noise_ratio(mut self, noise_ratio: f64) -> Result<Self> {
        if !(0.0..=1.0).contains(&noise_ratio) {
            return Err(Error::InvalidNoiseRatio(noise_ratio));
        }
        self.noise_ratio = noise_ratio;
        Ok(self)
    }

    pub fn start_time(&self) -> f64 { self.start_time }
    pub fn envelope(&self) -> &Envelope { &self.envelope }
    pub fn pitch(&self) -> f64 { self.pitch }
    pub fn volume(&self) -> f64 { self.volume }
    pub fn pan(&self) -> f64 { self.pan }
    pub fn wave(&self) -> Waveform { self.wave }
    pub fn noise_ratio(&self) -> f64 { self.noise_ratio }

    /// Length of the envelope in seconds.
    pub fn duration(&self) -> f64 {
        self.envelope.duration()
    }

    /// Time at which the tone falls silent.
    pub fn end_time(&self) -> f64 {
        self.start_time + self.duration()
    }

    /// Constant-power gains `(left, right)` for the clamped pan position.
    pub fn pan_gains(&self) -> (f64, f64) {
        let pan = self.pan.clamp(0.0, 1.0);
        (((1.0 - pan) * FRAC_PI_2).sin(), (pan * FRAC_PI_2).sin())
    }

    /// Mono samples at the global timestamps `t`. One standard-normal value
    /// is drawn from `rng` per timestamp.
    pub fn render<R: Rng + ?Sized>(&self, t: &[f64], rng: &mut R) -> Vec<f64> {
        let omega = 2.0 * PI * self.pitch;
        let r = self.noise_ratio;
        t.iter()
            .map(|&t| {
                let u = t - self.start_time;
                let carrier = self.wave.sample(omega * u);
                let noise: f64 = rng.sample(StandardNormal);
                let mixed = (1.0 - r) * carrier + r * noise;
                self.volume * self.envelope.level(u) * mixed
            })
            .collect()
    }

    /// Panned `[left, right]` frames at the timestamps `t`.
    pub fn render_stereo<R: Rng + ?Sized>(&self, t: &[f64], rng: &mut R) -> Vec<[f64; 2]> {
        let (left, right) = self.pan_gains();
        self.render(t, rng)
            .into_iter()
            .map(|s| [left * s, right * s])
            .collect()
    }

    /// Interleaved samples for `channels`.
    pub fn render_channels<R: Rng + ?Sized>(
        &self,
        t: &[f64],
        channels: Channels,
        rng: &mut R,
    ) -> Vec<f64> {
        match channels {
            Channels::Mono => self.render(t, rng),
            Channels::Stereo => self.render_stereo(t, rng).into_iter().flatten().collect(),
        }
    }

    /// Seed for this tone's noise generator, derived from `base` and every
    /// parameter of the tone so it does not depend on render order.
    /// `occurrence` tells apart tones that are otherwise identical.
    pub fn noise_seed(&self, base: u64, occurrence: u32) -> u64 {
        let mut state = base;
        let [a, d, s, l, r] = [
            self.envelope.attack(),
            self.envelope.decay(),
            self.envelope.sustain_time(),
            self.envelope.sustain_level(),
            self.envelope.release(),
        ];
        for value in [
            self.start_time,
            self.pitch,
            self.volume,
            self.pan,
            self.noise_ratio,
            a,
            d,
            s,
            l,
            r,
        ] {
            state ^= value.to_bits();
            splitmix64(&mut state);
        }
        state ^= self.wave as u64;
        splitmix64(&mut state);
        state ^= occurrence as u64;
        splitmix64(&mut state)
    }
}

/// SplitMix64 step.
fn splitmix64(state: &mut u64) -> u64 {
    *state = state.wrapping_add(0x9e37_79b9_7f4a_7c15);
    let mut z = *state;
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    z ^ (z >> 31)
}
