//! Musical scales for mapping automaton columns to pitches.
//! Column `m` of the activation grid becomes the `m`-th degree of the scale,
//! climbing one octave every `len - 1` degrees.

use std::str::FromStr;

use serde::Deserialize;

use crate::error::{Error, Result};

/// Scales as semitone offsets from the root, octave included.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub enum Scale {
    /// Ionian mode
    Major,
    /// Minor pentatonic
    Pentatonic,
    /// All twelve semitones
    Chromatic,
}

impl Default for Scale {
    fn default() -> Self {
        Scale::Pentatonic
    }
}

impl Scale {
    /// Semitone offsets; the last entry is the octave.
    pub fn offsets(self) -> &'static [u32] {
        match self {
            Scale::Major => &[0, 2, 4, 5, 7, 9, 11, 12],
            Scale::Pentatonic => &[0, 3, 5, 7, 10, 12],
            Scale::Chromatic => &[0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12],
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Scale::Major => "major",
            Scale::Pentatonic => "pentatonic",
            Scale::Chromatic => "chromatic",
        }
    }

    /// Semitones above the root for scale degree `index`.
    pub fn note(self, index: usize) -> u32 {
        let offsets = self.offsets();
        let per_octave = offsets.len() - 1;
        let octave = (index / per_octave) as u32;
        octave * 12 + offsets[index % per_octave]
    }

    /// Equal-tempered frequency of degree `index` above `root` Hz.
    pub fn frequency(self, index: usize, root: f64) -> f64 {
        root * 2f64.powf(self.note(index) as f64 / 12.0)
    }

    /// Frequencies of the first `count` degrees.
    pub fn frequencies(self, count: usize, root: f64) -> Vec<f64> {
        (0..count).map(|m| self.frequency(m, root)).collect()
    }
}

impl FromStr for Scale {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "major" => Ok(Scale::Major),
            "pentatonic" => Ok(Scale::Pentatonic),
            "chromatic" => Ok(Scale::Chromatic),
            _ => Err(Error::UnknownScale(s.to_string())),
        }
    }
}

impl TryFrom<String> for Scale {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}
