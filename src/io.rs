//! Output: parameter summary plus rendered audio, under a directory named
//! by the piece's hash.
//!
//! Layout: `<root>/<hash>/params.txt` and `<root>/<hash>/audio.wav`.

use std::fs;
use std::path::{Path, PathBuf};

use log::info;

use crate::audio::AudioBuffer;
use crate::error::Result;

pub mod wav;
pub use wav::write_wav;

pub const PARAMS_FILE: &str = "params.txt";
pub const AUDIO_FILE: &str = "audio.wav";

/// Write `params` and `buffer` into `<root>/<hash>/`, creating directories
/// as needed. Returns the directory written to.
pub fn write_output(
    buffer: &AudioBuffer,
    output_root: &Path,
    hash: &str,
    params: &str,
) -> Result<PathBuf> {
    let dir = output_root.join(hash);
    fs::create_dir_all(&dir)?;

    let params_path = dir.join(PARAMS_FILE);
    info!("writing parameters to {}", params_path.display());
    fs::write(&params_path, params)?;

    let audio_path = dir.join(AUDIO_FILE);
    info!("writing audio to {}", audio_path.display());
    write_wav(&audio_path, buffer)?;

    Ok(dir)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::Channels;

    #[test]
    fn writes_params_and_audio_under_hash() {
        let root = tempfile::tempdir().unwrap();
        let mut buffer = AudioBuffer::silent(8000, Channels::Mono, 16);
        buffer.add_at(0, &[0.5, -0.5]);

        let dir = write_output(&buffer, root.path(), "abc123", "Skip: 1\n").unwrap();
        assert_eq!(dir, root.path().join("abc123"));
        assert_eq!(fs::read_to_string(dir.join(PARAMS_FILE)).unwrap(), "Skip: 1\n");

        let reader = hound::WavReader::open(dir.join(AUDIO_FILE)).unwrap();
        assert_eq!(reader.len(), 16);
    }

    #[test]
    fn rewriting_same_hash_overwrites() {
        let root = tempfile::tempdir().unwrap();
        let buffer = AudioBuffer::silent(8000, Channels::Mono, 4);
        write_output(&buffer, root.path(), "h", "a").unwrap();
        let dir = write_output(&buffer, root.path(), "h", "b").unwrap();
        assert_eq!(fs::read_to_string(dir.join(PARAMS_FILE)).unwrap(), "b");
    }
}
