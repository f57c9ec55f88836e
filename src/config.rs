//! Configuration loader for automatone.
//!
//! * Looks for `automatone.toml` in the cwd unless overridden by `--config`.
//! * Every key is optional; missing keys take the defaults below.
//! * A file that exists but does not parse is an error, never silently
//!   replaced by defaults.

use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

use serde::Deserialize;

use crate::activations::CombineMode;
use crate::audio::{Channels, Envelope, RenderOptions, Scale, Waveform};
use crate::error::Result;
use crate::rules::RuleSelection;

pub const DEFAULT_CONFIG_PATH: &str = "automatone.toml";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GeneratorConfig {
    /// Explicit rules, or how many to draw at random.
    pub rules: RuleSelection,
    /// Number of pitches (automaton width).
    pub tone_range: usize,
    /// Number of time steps kept.
    pub sequence_length: usize,
    /// Initial generations discarded.
    pub skip: usize,
    /// Random first generation and rule draw; `None` means a single centred
    /// live cell.
    pub seed: Option<u64>,
    pub combine: CombineMode,
    pub sample_rate: u32,
    /// Seconds between successive time steps.
    pub interval: f64,
    pub envelope: Envelope,
    pub scale: Scale,
    /// Frequency of the lowest pitch in Hz.
    pub root_frequency: f64,
    pub pan: f64,
    pub volume: f64,
    pub wave: Waveform,
    pub noise_ratio: f64,
    pub channels: Channels,
    pub normalize: bool,
    pub output_root: PathBuf,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            rules: RuleSelection::default(),
            tone_range: 24,
            sequence_length: 256,
            skip: 128,
            seed: None,
            combine: CombineMode::Product,
            sample_rate: 96_000,
            interval: 0.125,
            envelope: Envelope::default(),
            scale: Scale::Pentatonic,
            root_frequency: 440.0,
            pan: 0.5,
            volume: 0.5,
            wave: Waveform::Square,
            noise_ratio: 0.1,
            channels: Channels::Mono,
            normalize: true,
            output_root: PathBuf::from("/tmp/just-another-music-generator"),
        }
    }
}

impl GeneratorConfig {
    /// Load from a TOML file; a missing file yields the defaults.
    pub fn load(path: Option<&str>) -> Result<Self> {
        let p = path.unwrap_or(DEFAULT_CONFIG_PATH);
        match fs::read_to_string(p) {
            Ok(text) => Self::from_toml(&text),
            Err(e) if e.kind() == ErrorKind::NotFound && path.is_none() => {
                log::debug!("no {p}, using defaults");
                Ok(Self::default())
            }
            Err(e) => Err(e.into()),
        }
    }

    pub fn from_toml(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Render settings derived from this config.
    pub fn render_options(&self) -> RenderOptions {
        RenderOptions {
            sample_rate: self.sample_rate,
            normalize: self.normalize,
            channels: self.channels,
            noise_seed: self.seed.unwrap_or(0),
        }
    }
}
