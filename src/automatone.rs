//! One generated piece: a rule set, an automaton window and a voice.
//!
//! An `Automatone` owns fully resolved parameters. Its activation matrix,
//! pitch table and tone sequence are derived on demand, and its textual
//! summary doubles as the identity used to name output directories.

use std::fmt;

use log::{debug, info};
use rand::rngs::StdRng;
use rand::SeedableRng;
use sha2::{Digest, Sha256};

use crate::activations::{combine, combine_random, trigger_sounds, ActivationMatrix, CombineMode};
use crate::audio::{AudioBuffer, RenderOptions, Scale, Sequence, Tone};
use crate::config::GeneratorConfig;
use crate::error::{Error, Result};
use crate::rules::{format_rules, RuleSelection};
use crate::Rule;

#[derive(Debug, Clone, PartialEq)]
pub struct Automatone {
    rules: Vec<Rule>,
    seed: Option<u64>,
    tone_range: usize,
    sequence_length: usize,
    skip: usize,
    combine: CombineMode,
    interval: f64,
    scale: Scale,
    root_frequency: f64,
    voice: Tone,
}

impl Automatone {
    /// Resolve a config into a piece. A random rule count is drawn from
    /// the config seed (or from entropy when there is none).
    pub fn from_config(config: &GeneratorConfig) -> Result<Self> {
        for (field, value) in [
            ("interval", config.interval),
            ("root_frequency", config.root_frequency),
            ("pan", config.pan),
            ("volume", config.volume),
        ] {
            if !value.is_finite() {
                return Err(Error::NonFinite { field, value });
            }
        }
        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let rules = config.rules.resolve(&mut rng)?;
        let voice = Tone::new(config.envelope)
            .with_pan(config.pan)
            .with_volume(config.volume)
            .with_wave(config.wave)
            .with_noise_ratio(config.noise_ratio)?;
        Ok(Self {
            rules,
            seed: config.seed,
            tone_range: config.tone_range,
            sequence_length: config.sequence_length,
            skip: config.skip,
            combine: config.combine,
            interval: config.interval,
            scale: config.scale,
            root_frequency: config.root_frequency,
            voice,
        })
    }

    /// A piece over explicit rules with the default voice and dimensions.
    pub fn new(rules: Vec<Rule>) -> Result<Self> {
        Self::from_config(&GeneratorConfig {
            rules: RuleSelection::List(rules),
            ..Default::default()
        })
    }

    pub fn with_dimensions(mut self, tone_range: usize, sequence_length: usize, skip: usize) -> Self {
        self.tone_range = tone_range;
        self.sequence_length = sequence_length;
        self.skip = skip;
        self
    }

    pub fn with_scale(mut self, scale: Scale, root_frequency: f64) -> Self {
        self.scale = scale;
        self.root_frequency = root_frequency;
        self
    }

    pub fn with_interval(mut self, interval: f64) -> Self {
        self.interval = interval;
        self
    }

    /// Envelope, pan, volume, wave and noise of every triggered tone.
    pub fn with_voice(mut self, voice: Tone) -> Self {
        self.voice = voice;
        self
    }

    pub fn with_seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_combine(mut self, combine: CombineMode) -> Self {
        self.combine = combine;
        self
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn tone_range(&self) -> usize {
        self.tone_range
    }

    pub fn sequence_length(&self) -> usize {
        self.sequence_length
    }

    /// SHA-256 of the parameter summary, hex encoded.
    pub fn hash(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.to_string().as_bytes());
        format!("{:x}", hasher.finalize())
    }

    pub fn activations(&self) -> ActivationMatrix {
        match self.seed {
            Some(seed) => combine_random(
                &self.rules,
                self.tone_range,
                self.sequence_length,
                self.skip,
                self.combine,
                seed,
            ),
            None => combine(
                &self.rules,
                self.tone_range,
                self.sequence_length,
                self.skip,
                self.combine,
            ),
        }
    }

    /// Pitch of every activation column.
    pub fn frequencies(&self) -> Vec<f64> {
        self.scale.frequencies(self.tone_range, self.root_frequency)
    }

    pub fn sequence(&self) -> Sequence {
        let sequence = trigger_sounds(
            &self.activations(),
            self.interval,
            &self.voice,
            &self.frequencies(),
        );
        debug!("{} tones, {:.3}s", sequence.len(), sequence.duration());
        sequence
    }

    pub fn render_audio(&self, options: &RenderOptions) -> Result<AudioBuffer> {
        info!("rendering automatone {}", self.hash());
        self.sequence().render_parallel(options)
    }
}

/// Parameter summary, one `key: value` per line.
impl fmt::Display for Automatone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let env = self.voice.envelope();
        writeln!(f, "Selected rules: {}", format_rules(&self.rules))?;
        match self.seed {
            Some(seed) => writeln!(f, "Random seed: {seed}")?,
            None => writeln!(f, "Random seed: -1")?,
        }
        writeln!(f, "Tone range: {}", self.tone_range)?;
        writeln!(f, "Sequence length: {}", self.sequence_length)?;
        writeln!(f, "Skip: {}", self.skip)?;
        writeln!(f, "Combine: {}", self.combine.name())?;
        writeln!(f, "Tone interval: {}", self.interval)?;
        writeln!(
            f,
            "ADSLR: {}, {}, {}, {}, {}",
            env.attack(),
            env.decay(),
            env.sustain_time(),
            env.sustain_level(),
            env.release()
        )?;
        writeln!(f, "Scale: {}", self.scale.name())?;
        writeln!(f, "Root frequency: {}", self.root_frequency)?;
        writeln!(f, "Pan: {}", self.voice.pan())?;
        writeln!(f, "Volume: {}", self.voice.volume())?;
        writeln!(f, "Wave: {}", self.voice.wave().name())?;
        writeln!(f, "Noise ratio: {}", self.voice.noise_ratio())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small() -> Automatone {
        Automatone::new(vec![Rule::new(30)]).unwrap().with_dimensions(24, 64, 32)
    }

    #[test]
    fn hash_is_stable_and_parameter_sensitive() {
        let a = small();
        assert_eq!(a.hash(), small().hash());
        assert_eq!(a.hash().len(), 64);
        assert_ne!(a.hash(), small().with_interval(0.25).hash());
        assert_ne!(a.hash(), Automatone::new(vec![Rule::new(45)]).unwrap().hash());
    }

    #[test]
    fn activations_have_requested_shape() {
        let m = small().activations();
        assert_eq!((m.rows(), m.cols()), (64, 24));
        assert!(m.active_count() > 0);
    }

    #[test]
    fn sequence_has_a_tone_per_activation() {
        let piece = small();
        assert_eq!(piece.sequence().len(), piece.activations().active_count());
    }

    #[test]
    fn render_produces_normalized_audio() {
        let piece = Automatone::new(vec![Rule::new(30)])
            .unwrap()
            .with_dimensions(12, 16, 8)
            .with_interval(0.05);
        let buf = piece.render_audio(&RenderOptions::new(4000)).unwrap();
        assert_eq!(buf.frames(), 4000);
        assert!((buf.peak() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn from_config_draws_seeded_rules() {
        let config = GeneratorConfig {
            rules: RuleSelection::Count(3),
            seed: Some(99),
            ..Default::default()
        };
        let a = Automatone::from_config(&config).unwrap();
        let b = Automatone::from_config(&config).unwrap();
        assert_eq!(a.rules().len(), 3);
        assert_eq!(a.rules(), b.rules());
        assert_eq!(a.activations(), b.activations());
    }

    #[test]
    fn from_config_validates_noise() {
        let config = GeneratorConfig {
            noise_ratio: 2.0,
            ..Default::default()
        };
        assert!(Automatone::from_config(&config).is_err());
    }

    #[test]
    fn summary_lists_parameters() {
        let text = small().to_string();
        assert!(text.starts_with("Selected rules: [30]\nRandom seed: -1\n"));
        assert!(text.contains("Scale: pentatonic\n"));
        assert!(text.ends_with("Noise ratio: 0.1\n"));
    }

    #[test]
    fn default_voice_matches_default_config() {
        let piece = small();
        let defaults = GeneratorConfig::default();
        assert_eq!(piece.voice.noise_ratio(), defaults.noise_ratio);
        assert_eq!(piece.voice.volume(), defaults.volume);
        assert_eq!(piece.voice.wave(), defaults.wave);
        assert_eq!(*piece.voice.envelope(), defaults.envelope);
    }

    #[test]
    fn from_config_rejects_non_finite_values() {
        for config in [
            GeneratorConfig { pan: f64::NAN, ..Default::default() },
            GeneratorConfig { volume: f64::INFINITY, ..Default::default() },
            GeneratorConfig { root_frequency: f64::NAN, ..Default::default() },
            GeneratorConfig { interval: f64::NEG_INFINITY, ..Default::default() },
        ] {
            assert!(matches!(
                Automatone::from_config(&config),
                Err(Error::NonFinite { .. })
            ));
        }
    }
}
