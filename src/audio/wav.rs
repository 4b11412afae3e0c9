use std::path::{Path, PathBuf};

use crate::error::SourceError;

use super::data::SampleWidth;
use super::source::AudioSourceSpec;

/// Plays a mono, 16-bit PCM WAV file through the same `AudioSourceSpec`
/// contract a live microphone exposes — the offline counterpart to
/// `Microphone`, for fixture playback and batch testing.
pub struct WavFile {
    path: PathBuf,
    chunk_size: usize,
    reader: Option<hound::WavReader<std::io::BufReader<std::fs::File>>>,
    sample_rate: u32,
}

impl WavFile {
    pub fn new(path: impl AsRef<Path>, chunk_size: usize) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            chunk_size,
            reader: None,
            sample_rate: 0,
        }
    }
}

impl AudioSourceSpec for WavFile {
    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn sample_width(&self) -> SampleWidth {
        SampleWidth::Two
    }

    fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    fn open(&mut self) -> Result<(), SourceError> {
        if self.reader.is_some() {
            return Err(SourceError::AlreadyOpen);
        }
        let reader = hound::WavReader::open(&self.path)
            .map_err(|e| SourceError::Open(e.to_string()))?;
        let spec = reader.spec();
        if spec.bits_per_sample != 16 || spec.channels != 1 {
            return Err(SourceError::Open(format!(
                "expected mono 16-bit PCM, got {} channel(s) at {} bits",
                spec.channels, spec.bits_per_sample
            )));
        }
        self.sample_rate = spec.sample_rate;
        self.reader = Some(reader);
        Ok(())
    }

    fn read(&mut self) -> Result<Vec<u8>, SourceError> {
        let reader = self
            .reader
            .as_mut()
            .expect("read on a WavFile that was never opened");

        let mut buf = Vec::with_capacity(self.chunk_size * 2);
        for sample in reader.samples::<i16>().take(self.chunk_size) {
            let sample = sample.map_err(|e| SourceError::Read(e.to_string()))?;
            buf.extend_from_slice(&sample.to_le_bytes());
        }
        Ok(buf)
    }

    fn close(&mut self) {
        self.reader = None;
    }
}
