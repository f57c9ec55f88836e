//! Activation matrices: which pitch sounds at which time step.
//!
//! One automaton grid is simulated per rule and the grids are folded into a
//! single `sequence_length x tone_range` matrix. Cells are then turned into
//! tone events by [`trigger_sounds`].

use std::str::FromStr;

use log::{debug, warn};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rayon::prelude::*;
use serde::Deserialize;

use crate::audio::{Sequence, Tone};
use crate::error::{Error, Result};
use crate::{simulate, simulate_random, AutomatonGrid, Rule};

/// How per-rule grids are reduced into one matrix.
#[derive(Debug, Default, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CombineMode {
    /// A cell fires only when every rule's grid has it on.
    #[default]
    Product,
    /// A cell holds the number of rules that have it on.
    Sum,
}

impl CombineMode {
    #[inline]
    fn apply(self, a: u32, b: u32) -> u32 {
        match self {
            CombineMode::Product => a * b,
            CombineMode::Sum => a + b,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            CombineMode::Product => "product",
            CombineMode::Sum => "sum",
        }
    }
}

impl FromStr for CombineMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "product" | "and" => Ok(CombineMode::Product),
            "sum" => Ok(CombineMode::Sum),
            _ => Err(Error::UnknownCombineMode(s.to_string())),
        }
    }
}

/// Dense time x pitch matrix of activation levels.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ActivationMatrix {
    rows: usize,
    cols: usize,
    data: Vec<u32>,
}

impl ActivationMatrix {
    /// All-zero matrix.
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            data: vec![0; rows * cols],
        }
    }

    /// Number of time steps.
    #[inline]
    pub fn rows(&self) -> usize { self.rows }
    /// Number of pitches.
    #[inline]
    pub fn cols(&self) -> usize { self.cols }

    /// Level at time step `row`, pitch `col`; zero out of range.
    pub fn get(&self, row: usize, col: usize) -> u32 {
        if row >= self.rows || col >= self.cols {
            return 0;
        }
        self.data[row * self.cols + col]
    }

    pub fn is_active(&self, row: usize, col: usize) -> bool {
        self.get(row, col) != 0
    }

    /// Number of non-zero cells.
    pub fn active_count(&self) -> usize {
        self.data.iter().filter(|&&v| v != 0).count()
    }

    /// Non-zero cells as `(row, col, level)` in row-major order.
    pub fn active_cells(&self) -> impl Iterator<Item = (usize, usize, u32)> + '_ {
        let cols = self.cols;
        self.data
            .iter()
            .enumerate()
            .filter(|&(_, &v)| v != 0)
            .map(move |(i, &v)| (i / cols, i % cols, v))
    }

    /// Elementwise combination of two same-shaped matrices.
    fn zip_with(mut self, other: &Self, mode: CombineMode) -> Self {
        debug_assert_eq!((self.rows, self.cols), (other.rows, other.cols));
        for (a, &b) in self.data.iter_mut().zip(&other.data) {
            *a = mode.apply(*a, b);
        }
        self
    }

    /// Concatenate matrices along the time axis, zero-padding narrower ones
    /// to the widest.
    pub fn stack(matrices: &[ActivationMatrix]) -> Self {
        let cols = matrices.iter().map(|m| m.cols).max().unwrap_or(0);
        let rows = matrices.iter().map(|m| m.rows).sum();
        let mut out = Self::zeros(rows, cols);
        let mut offset = 0;
        for m in matrices {
            for r in 0..m.rows {
                let dst = (offset + r) * cols;
                out.data[dst..dst + m.cols]
                    .copy_from_slice(&m.data[r * m.cols..(r + 1) * m.cols]);
            }
            offset += m.rows;
        }
        out
    }
}

impl From<&AutomatonGrid> for ActivationMatrix {
    fn from(grid: &AutomatonGrid) -> Self {
        let data = (0..grid.rows())
            .flat_map(|y| (0..grid.cols()).map(move |x| grid.get(x, y) as u32))
            .collect();
        Self {
            rows: grid.rows(),
            cols: grid.cols(),
            data,
        }
    }
}

/// Fold same-shaped matrices with `mode`; an empty input yields zeros.
pub fn reduce(
    matrices: Vec<ActivationMatrix>,
    rows: usize,
    cols: usize,
    mode: CombineMode,
) -> ActivationMatrix {
    matrices
        .into_iter()
        .reduce(|acc, m| acc.zip_with(&m, mode))
        .unwrap_or_else(|| ActivationMatrix::zeros(rows, cols))
}

/// Simulate every rule from a centred seed and reduce the grids.
pub fn combine(
    rules: &[Rule],
    tone_range: usize,
    sequence_length: usize,
    skip: usize,
    mode: CombineMode,
) -> ActivationMatrix {
    combine_with(rules, tone_range, sequence_length, mode, |rule| {
        simulate(rule, tone_range, sequence_length, skip)
    })
}

/// Like [`combine`], but every rule starts from the same random first
/// generation drawn from a generator seeded with `seed`.
pub fn combine_random(
    rules: &[Rule],
    tone_range: usize,
    sequence_length: usize,
    skip: usize,
    mode: CombineMode,
    seed: u64,
) -> ActivationMatrix {
    combine_with(rules, tone_range, sequence_length, mode, |rule| {
        let mut rng = StdRng::seed_from_u64(seed);
        simulate_random(rule, tone_range, sequence_length, skip, &mut rng)
    })
}

fn combine_with<F>(
    rules: &[Rule],
    tone_range: usize,
    sequence_length: usize,
    mode: CombineMode,
    run: F,
) -> ActivationMatrix
where
    F: Fn(Rule) -> AutomatonGrid + Sync,
{
    for rule in rules.iter().filter(|r| r.is_degenerate()) {
        warn!("rule {rule} produces a constant grid");
    }
    let grids: Vec<ActivationMatrix> = rules
        .par_iter()
        .map(|&rule| ActivationMatrix::from(&run(rule)))
        .collect();
    let matrix = reduce(grids, sequence_length, tone_range, mode);
    debug!(
        "combined {} rules ({}): {} of {} cells active",
        rules.len(),
        mode.name(),
        matrix.active_count(),
        sequence_length * tone_range
    );
    matrix
}

/// Turn every non-zero cell into a tone.
///
/// Row `n` starts at `interval * n`; column `m` sounds at `frequencies[m]`.
/// The template supplies envelope, pan, waveform and noise; its volume is
/// scaled by the cell level so summed matrices play louder where rules
/// agree. Columns without a frequency are ignored.
pub fn trigger_sounds(
    activations: &ActivationMatrix,
    interval: f64,
    template: &Tone,
    frequencies: &[f64],
) -> Sequence {
    let mut sequence = Sequence::new();
    for (row, col, level) in activations.active_cells() {
        let Some(&pitch) = frequencies.get(col) else {
            continue;
        };
        sequence.add(
            template
                .clone()
                .at(interval * row as f64)
                .with_pitch(pitch)
                .with_volume(template.volume() * level as f64),
        );
    }
    sequence
}
