//! automatone — music from elementary cellular automata.
//!
//! The crate is a pure signal pipeline: an automaton grid per rule, an
//! activation matrix combining them, tone events triggered from that matrix,
//! and an overlap-add renderer producing one sample buffer.
//! Automaton rows are bit-packed in row-major `Vec<u64>`; neighbour lookup
//! always wraps around.
//!
//! # Example
//! ```
//! use automatone::{simulate, Rule};
//! let grid = simulate(Rule::new(30), 5, 2, 0);
//! assert_eq!(grid.to_rows(), vec![vec![0, 0, 1, 0, 0], vec![0, 1, 1, 1, 0]]);
//! ```

use std::fmt;

use rand::Rng;
use serde::Deserialize;

pub mod activations;
pub mod audio;
pub mod automatone;
pub mod composition;
pub mod config;
pub mod error;
pub mod io;
pub mod rules;

pub use activations::{combine, combine_random, trigger_sounds, ActivationMatrix, CombineMode};
pub use audio::{AudioBuffer, Envelope, RenderOptions, Scale, Sequence, Tone, Waveform};
pub use automatone::Automatone;
pub use composition::Composition;
pub use config::GeneratorConfig;
pub use error::{Error, Result};
pub use rules::{choose_rules, RuleSelection};

/// Wolfram code of an elementary cellular automaton.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Deserialize)]
#[serde(transparent)]
pub struct Rule(u8);

impl Rule {
    pub const fn new(number: u8) -> Self {
        Self(number)
    }

    #[inline]
    pub fn number(self) -> u8 {
        self.0
    }

    /// Output bits for every neighbourhood, MSB first: index 0 is pattern
    /// `111`, index 7 is pattern `000`.
    pub fn table(self) -> [u8; 8] {
        let mut table = [0u8; 8];
        for (i, bit) in table.iter_mut().enumerate() {
            *bit = (self.0 >> (7 - i)) & 1;
        }
        table
    }

    /// Next state of a cell given its `(left, center, right)` neighbourhood.
    #[inline]
    pub fn apply(self, left: bool, center: bool, right: bool) -> bool {
        let z = (left as u8) << 2 | (center as u8) << 1 | right as u8;
        self.table()[7 - z as usize] == 1
    }

    /// Rules 0 and 255 produce all-off or all-on grids.
    pub fn is_degenerate(self) -> bool {
        self.0 == 0 || self.0 == u8::MAX
    }
}

impl From<u8> for Rule {
    fn from(number: u8) -> Self {
        Self(number)
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Space-time diagram of one automaton run: `rows` time steps of `cols`
/// cells each.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AutomatonGrid {
    cols: usize,
    rows: usize,
    data: Vec<u64>, // rows * ceil(cols/64)
}

impl AutomatonGrid {
    fn new(cols: usize, rows: usize) -> Self {
        let words_per_row = (cols + 63) / 64;
        Self {
            cols,
            rows,
            data: vec![0; words_per_row * rows],
        }
    }

    /// Width in cells.
    #[inline]
    pub fn cols(&self) -> usize { self.cols }
    /// Number of time steps.
    #[inline]
    pub fn rows(&self) -> usize { self.rows }

    /// Return `true` if `(x, y)` within bounds **and alive**.
    pub fn is_alive(&self, x: usize, y: usize) -> bool {
        if x >= self.cols || y >= self.rows {
            return false;
        }
        let idx = y * self.words_per_row() + x / 64;
        let bit = 1u64 << (x & 63);
        self.data[idx] & bit != 0
    }

    /// Cell value as `0` or `1`.
    #[inline]
    pub fn get(&self, x: usize, y: usize) -> u8 {
        self.is_alive(x, y) as u8
    }

    fn set_row(&mut self, y: usize, row: &[bool]) {
        let base = y * self.words_per_row();
        for (x, &alive) in row.iter().enumerate() {
            let bit = 1u64 << (x & 63);
            if alive {
                self.data[base + x / 64] |= bit;
            } else {
                self.data[base + x / 64] &= !bit;
            }
        }
    }

    /// Row `y` as booleans; empty when out of range.
    pub fn row(&self, y: usize) -> Vec<bool> {
        if y >= self.rows {
            return Vec::new();
        }
        (0..self.cols).map(|x| self.is_alive(x, y)).collect()
    }

    /// Dense copy as nested `0`/`1` rows.
    pub fn to_rows(&self) -> Vec<Vec<u8>> {
        (0..self.rows)
            .map(|y| (0..self.cols).map(|x| self.get(x, y)).collect())
            .collect()
    }

    /// Count the total number of live cells
    pub fn live_cell_count(&self) -> usize {
        self.data.iter().map(|w| w.count_ones() as usize).sum()
    }

    #[inline]
    fn words_per_row(&self) -> usize { (self.cols + 63) / 64 }
}

/// Life 1.x style text: `*` alive, `.` dead, one line per time step.
impl fmt::Display for AutomatonGrid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for y in 0..self.rows {
            for x in 0..self.cols {
                f.write_str(if self.is_alive(x, y) { "*" } else { "." })?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// Advance one row by a single generation with wraparound neighbours.
pub fn step(row: &[bool], rule: Rule) -> Vec<bool> {
    let len = row.len();
    (0..len)
        .map(|x| {
            let left = row[neighbour_coord(x, -1, len)];
            let right = row[neighbour_coord(x, 1, len)];
            rule.apply(left, row[x], right)
        })
        .collect()
}

/// All cells dead except the middle one.
pub fn center_row(size: usize) -> Vec<bool> {
    let mut row = vec![false; size];
    if size > 0 {
        row[size / 2] = true;
    }
    row
}

/// Each cell alive with probability one half.
pub fn random_row<R: Rng + ?Sized>(size: usize, rng: &mut R) -> Vec<bool> {
    (0..size).map(|_| rng.gen_bool(0.5)).collect()
}

/// Run `rule` from a single live centre cell, discarding the first `skip`
/// generations and keeping the next `steps`.
///
/// The result depends only on the arguments.
pub fn simulate(rule: Rule, size: usize, steps: usize, skip: usize) -> AutomatonGrid {
    simulate_from(rule, &center_row(size), steps, skip)
}

/// Like [`simulate`], but the first generation is drawn from `rng`.
pub fn simulate_random<R: Rng + ?Sized>(
    rule: Rule,
    size: usize,
    steps: usize,
    skip: usize,
    rng: &mut R,
) -> AutomatonGrid {
    simulate_from(rule, &random_row(size, rng), steps, skip)
}

/// Run `rule` from an explicit first generation.
///
/// `steps + skip` generations are produced (the seed counts as the first);
/// the returned grid holds the last `steps` of them.
pub fn simulate_from(rule: Rule, seed: &[bool], steps: usize, skip: usize) -> AutomatonGrid {
    let mut grid = AutomatonGrid::new(seed.len(), steps);
    if steps == 0 {
        return grid;
    }
    let total = steps + skip;
    let mut row = seed.to_vec();
    for generation in 0..total {
        if generation >= skip {
            grid.set_row(generation - skip, &row);
        }
        if generation + 1 < total {
            row = step(&row, rule);
        }
    }
    grid
}

#[inline]
fn neighbour_coord(pos: usize, delta: isize, len: usize) -> usize {
    (pos as isize + delta).rem_euclid(len as isize) as usize
}

// ---------- tests ----------
#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn rule_30_table_is_msb_first() {
        assert_eq!(Rule::new(30).table(), [0, 0, 0, 1, 1, 1, 1, 0]);
    }

    #[test]
    fn step_rule_0_keeps_zeros() {
        let row = vec![false; 50];
        assert_eq!(step(&row, Rule::new(0)), row);
    }

    #[test]
    fn step_rule_30_from_single_cell() {
        let row = [false, true, false];
        assert_eq!(step(&row, Rule::new(30)), vec![true, true, true]);
    }

    #[test]
    fn simulate_shape() {
        let grid = simulate(Rule::new(30), 13, 37, 0);
        assert_eq!((grid.rows(), grid.cols()), (37, 13));
    }

    #[test]
    fn simulate_rule_30_unskipped() {
        let grid = simulate(Rule::new(30), 5, 2, 0);
        assert_eq!(grid.to_rows(), vec![vec![0, 0, 1, 0, 0], vec![0, 1, 1, 1, 0]]);
    }

    #[test]
    fn simulate_skip_shifts_window() {
        let grid = simulate(Rule::new(30), 5, 2, 1);
        assert_eq!(grid.to_rows(), vec![vec![0, 1, 1, 1, 0], vec![1, 1, 0, 0, 1]]);
    }

    #[test]
    fn rule_0_is_silent_after_seed() {
        let grid = simulate(Rule::new(0), 9, 6, 0);
        assert_eq!(grid.live_cell_count(), 1);
        assert!(grid.is_alive(4, 0));

        let skipped = simulate(Rule::new(0), 9, 6, 1);
        assert_eq!(skipped.live_cell_count(), 0);
    }

    #[test]
    fn simulate_is_reproducible() {
        for rule in [1u8, 30, 90, 110, 184, 254] {
            let a = simulate(Rule::new(rule), 70, 40, 0);
            let b = simulate(Rule::new(rule), 70, 40, 0);
            assert_eq!(a, b, "rule {rule}");
        }
    }

    #[test]
    fn wide_rows_span_multiple_words() {
        let grid = simulate(Rule::new(90), 130, 3, 0);
        assert_eq!(grid.row(0).iter().filter(|&&c| c).count(), 1);
        assert!(grid.is_alive(64, 1) && grid.is_alive(66, 1));
        assert!(grid.is_alive(63, 2) && grid.is_alive(67, 2));
    }

    #[test]
    fn zero_steps_and_zero_size() {
        assert_eq!(simulate(Rule::new(30), 8, 0, 4).rows(), 0);
        let narrow = simulate(Rule::new(30), 0, 3, 0);
        assert_eq!((narrow.rows(), narrow.cols()), (3, 0));
    }

    #[test]
    fn random_seed_row_is_injectable() {
        let a = simulate_random(Rule::new(110), 32, 16, 4, &mut StdRng::seed_from_u64(7));
        let b = simulate_random(Rule::new(110), 32, 16, 4, &mut StdRng::seed_from_u64(7));
        assert_eq!(a, b);
    }

    #[test]
    fn display_uses_life_glyphs() {
        let grid = simulate(Rule::new(30), 5, 2, 0);
        assert_eq!(grid.to_string(), "..*..\n.***.\n");
    }
}
