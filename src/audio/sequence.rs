//! Overlap-add sequencer.
//!
//! A [`Sequence`] is an unordered bag of tones in practice: rendering only
//! ever adds, and each tone's noise generator is seeded from the tone
//! itself, so the buffer does not depend on insertion order. Identical
//! tones are numbered by occurrence and draw independent noise.

use std::collections::HashMap;

use log::{debug, info};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rayon::prelude::*;

use super::tone::Tone;
use super::{AudioBuffer, RenderOptions};
use crate::error::{Error, Result};

/// Shortest sequence ever rendered, in seconds.
pub const MIN_DURATION: f64 = 1.0;

/// Global sample window `[start, end)` a tone can contribute to.
///
/// e.g. a tone starting at 1.00001 s lasting 0.5 s at 1000 Hz covers
/// samples 1000 up to (not including) 1501.
pub fn find_bounds(tone: &Tone, sample_rate: u32) -> (usize, usize) {
    let sr = sample_rate as f64;
    let start = (tone.start_time() * sr).floor().max(0.0) as usize;
    let end = (tone.end_time() * sr).ceil().max(0.0) as usize;
    (start, end)
}

/// `n` evenly spaced values from `start` to `stop`, both inclusive.
pub fn linspace(start: f64, stop: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (stop - start) / (n - 1) as f64;
            let mut out: Vec<f64> = (0..n).map(|i| start + i as f64 * step).collect();
            out[n - 1] = stop;
            out
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Sequence {
    tones: Vec<Tone>,
}

impl Sequence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, tone: Tone) {
        self.tones.push(tone);
    }

    pub fn len(&self) -> usize {
        self.tones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tones.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Tone> {
        self.tones.iter()
    }

    /// End of the last tone, never less than [`MIN_DURATION`].
    pub fn duration(&self) -> f64 {
        self.tones
            .iter()
            .map(Tone::end_time)
            .fold(MIN_DURATION, f64::max)
    }

    /// Render every tone into one buffer on the calling thread.
    pub fn render(&self, options: &RenderOptions) -> Result<AudioBuffer> {
        let (mut buffer, t) = self.prepare(options)?;
        let seeds = self.noise_seeds(options.noise_seed);
        for (tone, &seed) in self.tones.iter().zip(&seeds) {
            mix_tone(&mut buffer, tone, &t, options, seed);
        }
        finish(&mut buffer, options);
        Ok(buffer)
    }

    /// Same output as [`Sequence::render`] (up to float rounding), with
    /// per-tone synthesis spread over the rayon pool. Each worker
    /// accumulates into its own buffer and the partial buffers are summed,
    /// so memory grows with the buffer length rather than the tone count.
    pub fn render_parallel(&self, options: &RenderOptions) -> Result<AudioBuffer> {
        let (buffer, t) = self.prepare(options)?;
        let seeds = self.noise_seeds(options.noise_seed);
        let frames = buffer.frames();
        let silent = || AudioBuffer::silent(options.sample_rate, options.channels, frames);
        let mut buffer = self
            .tones
            .par_iter()
            .zip(seeds.par_iter())
            .fold(silent, |mut acc, (tone, &seed)| {
                mix_tone(&mut acc, tone, &t, options, seed);
                acc
            })
            .reduce_with(|mut a, b| {
                a.mix(&b);
                a
            })
            .unwrap_or(buffer);
        finish(&mut buffer, options);
        Ok(buffer)
    }

    /// Noise seed of every tone, in insertion order. The n-th copy of an
    /// identical tone gets occurrence n.
    fn noise_seeds(&self, base: u64) -> Vec<u64> {
        let mut seen: HashMap<u64, u32> = HashMap::new();
        self.tones
            .iter()
            .map(|tone| {
                let count = seen.entry(tone.noise_seed(base, 0)).or_insert(0);
                let seed = tone.noise_seed(base, *count);
                *count += 1;
                seed
            })
            .collect()
    }

    fn prepare(&self, options: &RenderOptions) -> Result<(AudioBuffer, Vec<f64>)> {
        if options.sample_rate == 0 {
            return Err(Error::InvalidSampleRate);
        }
        let duration = self.duration();
        let frames = (options.sample_rate as f64 * duration).ceil() as usize;
        info!(
            "rendering {} tones, {:.3}s ({} frames @ {} Hz, {} ch)",
            self.len(),
            duration,
            frames,
            options.sample_rate,
            options.channels.count()
        );
        let buffer = AudioBuffer::silent(options.sample_rate, options.channels, frames);
        Ok((buffer, linspace(0.0, duration, frames)))
    }
}

impl Extend<Tone> for Sequence {
    fn extend<I: IntoIterator<Item = Tone>>(&mut self, iter: I) {
        self.tones.extend(iter);
    }
}

impl FromIterator<Tone> for Sequence {
    fn from_iter<I: IntoIterator<Item = Tone>>(iter: I) -> Self {
        Self {
            tones: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a Sequence {
    type Item = &'a Tone;
    type IntoIter = std::slice::Iter<'a, Tone>;

    fn into_iter(self) -> Self::IntoIter {
        self.tones.iter()
    }
}

/// Add the samples of `tone` over its window of the global timeline `t`.
fn mix_tone(buffer: &mut AudioBuffer, tone: &Tone, t: &[f64], options: &RenderOptions, seed: u64) {
    let (start, end) = find_bounds(tone, options.sample_rate);
    let end = end.min(t.len());
    if start >= end {
        return;
    }
    let mut rng = StdRng::seed_from_u64(seed);
    buffer.add_at(start, &tone.render_channels(&t[start..end], options.channels, &mut rng));
}

fn finish(buffer: &mut AudioBuffer, options: &RenderOptions) {
    if options.normalize {
        let peak = buffer.peak();
        buffer.normalize();
        debug!("normalized by peak {peak:.6}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::{Channels, Envelope, Waveform};

    fn short_env() -> Envelope {
        Envelope::new(0.01, 0.02, 0.03, 0.5, 0.04).unwrap()
    }

    fn tones() -> Vec<Tone> {
        (0..12)
            .map(|i| {
                Tone::new(short_env())
                    .at(0.05 * i as f64)
                    .with_pitch(220.0 * (1.0 + (i % 5) as f64 / 4.0))
                    .with_volume(0.5)
                    .with_pan((i % 3) as f64 / 2.0)
                    .with_wave(if i % 2 == 0 { Waveform::Square } else { Waveform::Sine })
                    .with_noise_ratio(0.1)
                    .unwrap()
            })
            .collect()
    }

    fn assert_close(a: &AudioBuffer, b: &AudioBuffer) {
        assert_eq!(a.samples().len(), b.samples().len());
        for (x, y) in a.samples().iter().zip(b.samples()) {
            assert!((x - y).abs() < 1e-9, "{x} vs {y}");
        }
    }

    #[test]
    fn find_bounds_floors_start_and_ceils_end() {
        let tone = Tone::new(Envelope::new(0.0, 0.5, 0.0, 0.0, 0.0).unwrap()).at(1.00001);
        assert_eq!(find_bounds(&tone, 1000), (1000, 1501));
    }

    #[test]
    fn empty_sequence_is_one_second_of_silence() {
        let seq = Sequence::new();
        assert!(seq.is_empty());
        assert_eq!(seq.duration(), 1.0);
        let buf = seq.render(&RenderOptions::new(110)).unwrap();
        assert_eq!(buf.frames(), 110);
        assert!(buf.samples().iter().all(|&s| s == 0.0));
    }

    #[test]
    fn duration_is_last_tone_end() {
        let mut seq = Sequence::new();
        seq.add(Tone::new(short_env()).at(0.5));
        assert_eq!(seq.duration(), 1.0);
        seq.add(Tone::new(short_env()).at(2.0));
        assert!((seq.duration() - 2.1).abs() < 1e-12);
        assert_eq!(seq.len(), 2);
    }

    #[test]
    fn render_length_is_ceil_of_duration() {
        let seq: Sequence = std::iter::once(Tone::new(short_env()).at(1.0)).collect();
        let buf = seq.render(&RenderOptions::new(1000).stereo()).unwrap();
        assert_eq!(buf.frames(), (1000.0 * seq.duration()).ceil() as usize);
        assert_eq!(buf.samples().len(), 2 * buf.frames());
    }

    #[test]
    fn normalized_peak_is_one() {
        let seq: Sequence = tones().into_iter().collect();
        let buf = seq.render(&RenderOptions::new(8000)).unwrap();
        assert!((buf.peak() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn overlapping_tones_add() {
        let tone = Tone::new(short_env()).at(0.2).with_pitch(330.0);
        let options = RenderOptions::new(4000).normalized(false);
        let single: Sequence = std::iter::once(tone.clone()).collect();
        let double: Sequence = vec![tone.clone(), tone].into_iter().collect();
        let a = single.render(&options).unwrap();
        let b = double.render(&options).unwrap();
        for (x, y) in a.samples().iter().zip(b.samples()) {
            assert!((2.0 * x - y).abs() < 1e-12);
        }
        assert!(a.peak() > 0.0);
    }

    #[test]
    fn duplicate_tones_draw_independent_noise() {
        let noise = Tone::new(short_env())
            .at(0.2)
            .with_pitch(0.0)
            .with_noise_ratio(1.0)
            .unwrap();
        let options = RenderOptions::new(4000).normalized(false);
        let single: Sequence = std::iter::once(noise.clone()).collect();
        let double: Sequence = vec![noise.clone(), noise].into_iter().collect();
        let a = single.render(&options).unwrap();
        let b = double.render(&options).unwrap();
        let max_diff = a
            .samples()
            .iter()
            .zip(b.samples())
            .map(|(x, y)| (2.0 * x - y).abs())
            .fold(0.0, f64::max);
        assert!(max_diff > 1e-3, "duplicate noise is correlated: {max_diff}");
        assert_close(&b, &double.render_parallel(&options).unwrap());
    }

    #[test]
    fn empty_sequence_renders_in_parallel() {
        let buf = Sequence::new()
            .render_parallel(&RenderOptions::new(50).stereo())
            .unwrap();
        assert_eq!(buf.frames(), 50);
        assert_eq!(buf.peak(), 0.0);
    }

    #[test]
    fn insertion_order_does_not_matter() {
        let forward: Sequence = tones().into_iter().collect();
        let backward: Sequence = tones().into_iter().rev().collect();
        for options in [
            RenderOptions::new(8000).with_noise_seed(3),
            RenderOptions::new(8000).normalized(false).stereo(),
        ] {
            let a = forward.render(&options).unwrap();
            let b = backward.render(&options).unwrap();
            assert_close(&a, &b);
        }
    }

    #[test]
    fn parallel_matches_sequential() {
        let seq: Sequence = tones().into_iter().collect();
        let options = RenderOptions::new(8000).stereo().with_noise_seed(11);
        let a = seq.render(&options).unwrap();
        let b = seq.render_parallel(&options).unwrap();
        assert_close(&a, &b);
        assert_eq!(b.channels(), Channels::Stereo);
    }

    #[test]
    fn stereo_channels_follow_pan() {
        let hard_left: Sequence =
            std::iter::once(Tone::new(short_env()).with_pan(0.0)).collect();
        let buf = hard_left
            .render(&RenderOptions::new(4000).normalized(false).stereo())
            .unwrap();
        assert!(buf.channel(0).any(|s| s != 0.0));
        assert!(buf.channel(1).all(|s| s.abs() < 1e-12));
    }

    #[test]
    fn tones_past_the_end_are_clipped() {
        let mut seq = Sequence::new();
        seq.add(Tone::new(short_env()).at(0.0));
        let options = RenderOptions::new(100);
        let buf = seq.render(&options).unwrap();
        assert_eq!(buf.frames(), 100);
    }

    #[test]
    fn zero_sample_rate_is_rejected() {
        let seq = Sequence::new();
        assert!(matches!(
            seq.render(&RenderOptions::new(0)),
            Err(Error::InvalidSampleRate)
        ));
    }

    #[test]
    fn linspace_endpoints() {
        assert!(linspace(0.0, 1.0, 0).is_empty());
        assert_eq!(linspace(0.0, 1.0, 1), vec![0.0]);
        assert_eq!(linspace(0.0, 1.0, 5), vec![0.0, 0.25, 0.5, 0.75, 1.0]);
    }
}
