//! 32-bit integer PCM WAV writer.
//!
//! • Channel count and sample rate come from the buffer.
//! • Samples are clamped to [-1, 1] before conversion; this is the only
//!   place the pipeline clips.

use std::path::Path;

use dasp_sample::Sample;

use crate::audio::AudioBuffer;
use crate::error::Result;

pub fn wav_spec(buffer: &AudioBuffer) -> hound::WavSpec {
    hound::WavSpec {
        channels: buffer.channels().count() as u16,
        sample_rate: buffer.sample_rate(),
        bits_per_sample: 32,
        sample_format: hound::SampleFormat::Int,
    }
}

/// Full-scale integer sample for `s`.
#[inline]
pub fn to_pcm(s: f64) -> i32 {
    s.clamp(-1.0, 1.0).to_sample::<i32>()
}

pub fn write_wav(path: &Path, buffer: &AudioBuffer) -> Result<()> {
    let mut writer = hound::WavWriter::create(path, wav_spec(buffer))?;
    for &s in buffer.samples() {
        writer.write_sample(to_pcm(s))?;
    }
    writer.finalize()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::Channels;

    #[test]
    fn pcm_conversion_clips() {
        assert_eq!(to_pcm(0.0), 0);
        assert_eq!(to_pcm(2.0), to_pcm(1.0));
        assert_eq!(to_pcm(-3.0), to_pcm(-1.0));
        assert!(to_pcm(-1.0) < 0);
        assert!(to_pcm(0.5) > 1 << 29);
    }

    #[test]
    fn stereo_header_and_samples() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.wav");
        let mut buffer = AudioBuffer::silent(22_050, Channels::Stereo, 3);
        buffer.add_at(1, &[0.25, -0.25]);
        write_wav(&path, &buffer).unwrap();

        let mut reader = hound::WavReader::open(&path).unwrap();
        let spec = reader.spec();
        assert_eq!(spec.channels, 2);
        assert_eq!(spec.sample_rate, 22_050);
        assert_eq!(spec.bits_per_sample, 32);
        let samples: Vec<i32> = reader.samples::<i32>().map(|s| s.unwrap()).collect();
        assert_eq!(samples.len(), 6);
        assert_eq!(samples[2], to_pcm(0.25));
        assert_eq!(samples[3], to_pcm(-0.25));
    }
}
