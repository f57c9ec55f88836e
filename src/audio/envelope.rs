//! Piecewise-linear ADSR envelope evaluated at arbitrary times.
//!
//! The curve is the sum of four linear segments keyed on five ordered
//! breakpoints. Segments are half-open, so adjacent segments never overlap
//! and the level at the final breakpoint is zero.

use std::str::FromStr;

use serde::Deserialize;

use crate::error::{Error, Result};

/// Linear ramp from `level_a` at `ta` to `level_b` at `tb`, zero outside
/// `[ta, tb)`. A zero-width segment is zero everywhere.
#[inline]
pub fn interpolate(t: f64, ta: f64, tb: f64, level_a: f64, level_b: f64) -> f64 {
    if tb == ta || t < ta || t >= tb {
        return 0.0;
    }
    level_a + (level_b - level_a) * (t - ta) / (tb - ta)
}

/// Attack, decay, sustain and release, in seconds; `sustain_level` is a
/// linear gain.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(try_from = "RawEnvelope")]
pub struct Envelope {
    attack: f64,
    decay: f64,
    sustain_time: f64,
    sustain_level: f64,
    release: f64,
}

impl Default for Envelope {
    fn default() -> Self {
        Self {
            attack: 0.01,
            decay: 0.02,
            sustain_time: 0.03,
            sustain_level: 0.5,
            release: 0.04,
        }
    }
}

impl Envelope {
    /// Rejects negative or non-finite segment lengths and a non-finite level.
    pub fn new(
        attack: f64,
        decay: f64,
        sustain_time: f64,
        sustain_level: f64,
        release: f64,
    ) -> Result<Self> {
        for (field, value) in [
            ("attack", attack),
            ("decay", decay),
            ("sustain_time", sustain_time),
            ("release", release),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(Error::InvalidEnvelope { field, value });
            }
        }
        if !sustain_level.is_finite() {
            return Err(Error::InvalidEnvelope {
                field: "sustain_level",
                value: sustain_level,
            });
        }
        Ok(Self {
            attack,
            decay,
            sustain_time,
            sustain_level,
            release,
        })
    }

    pub fn attack(&self) -> f64 { self.attack }
    pub fn decay(&self) -> f64 { self.decay }
    pub fn sustain_time(&self) -> f64 { self.sustain_time }
    pub fn sustain_level(&self) -> f64 { self.sustain_level }
    pub fn release(&self) -> f64 { self.release }

    /// Segment boundaries `[0, attack end, decay end, sustain end, release end]`.
    pub fn breakpoints(&self) -> [f64; 5] {
        let t1 = self.attack;
        let t2 = t1 + self.decay;
        let t3 = t2 + self.sustain_time;
        let t4 = t3 + self.release;
        [0.0, t1, t2, t3, t4]
    }

    /// Total length in seconds.
    pub fn duration(&self) -> f64 {
        self.breakpoints()[4]
    }

    /// Envelope level at `t` seconds after the onset.
    pub fn level(&self, t: f64) -> f64 {
        let [t0, t1, t2, t3, t4] = self.breakpoints();
        let s = self.sustain_level;
        interpolate(t, t0, t1, 0.0, 1.0)
            + interpolate(t, t1, t2, 1.0, s)
            + interpolate(t, t2, t3, s, s)
            + interpolate(t, t3, t4, s, 0.0)
    }
}

#[derive(Deserialize)]
struct RawEnvelope {
    attack: f64,
    decay: f64,
    sustain_time: f64,
    sustain_level: f64,
    release: f64,
}

impl TryFrom<RawEnvelope> for Envelope {
    type Error = Error;

    fn try_from(raw: RawEnvelope) -> Result<Self> {
        Envelope::new(
            raw.attack,
            raw.decay,
            raw.sustain_time,
            raw.sustain_level,
            raw.release,
        )
    }
}

/// Parses `attack,decay,sustain_time,sustain_level,release`, optionally in
/// square brackets.
impl FromStr for Envelope {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || Error::InvalidEnvelopeSpec(s.to_string());
        let values = s
            .trim()
            .trim_start_matches('[')
            .trim_end_matches(']')
            .split(',')
            .map(|v| v.trim().parse::<f64>().map_err(|_| invalid()))
            .collect::<Result<Vec<_>>>()?;
        match values[..] {
            [a, d, st, sl, r] => Envelope::new(a, d, st, sl, r),
            _ => Err(invalid()),
        }
    }
}
