//! Crate-wide error type.

/// Everything that can go wrong while configuring or rendering a piece.
///
/// Degenerate inputs (no rules, no tones, a silent buffer) are not errors;
/// they render to well-defined empty or silent output.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("unknown waveform '{0}' (expected 'sine' or 'square')")]
    UnknownWaveform(String),
    #[error("unknown scale '{0}' (expected 'major', 'pentatonic' or 'chromatic')")]
    UnknownScale(String),
    #[error("unknown combine mode '{0}' (expected 'product' or 'sum')")]
    UnknownCombineMode(String),
    #[error("invalid envelope: {field} = {value} must be finite and non-negative")]
    InvalidEnvelope { field: &'static str, value: f64 },
    #[error("invalid envelope specification '{0}' (expected five comma-separated numbers)")]
    InvalidEnvelopeSpec(String),
    #[error("invalid configuration: {field} = {value} must be finite")]
    NonFinite { field: &'static str, value: f64 },
    #[error("noise ratio {0} outside [0, 1]")]
    InvalidNoiseRatio(f64),
    #[error("cannot pick {0} distinct rules from 1..=254")]
    TooManyRules(usize),
    #[error("invalid rule list '{0}' (expected a count or comma-separated rules in 0..=255)")]
    InvalidRules(String),
    #[error("sample rate must be positive")]
    InvalidSampleRate,
    #[error("unsupported channel count {0} (expected 1 or 2)")]
    UnsupportedChannels(u16),
    #[error("malformed config: {0}")]
    Config(#[from] toml::de::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("wav output failed: {0}")]
    Wav(#[from] hound::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
