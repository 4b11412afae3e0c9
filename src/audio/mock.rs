use std::collections::VecDeque;

use crate::error::SourceError;

use super::data::SampleWidth;
use super::source::AudioSourceSpec;

/// An in-memory, pre-scripted source, for driving the segmentation
/// engine in tests without real audio hardware.
///
/// Buffers are consumed in order; once exhausted, `read()` returns an
/// empty buffer forever (matching a source whose stream has ended).
pub struct MockSource {
    sample_rate: u32,
    sample_width: SampleWidth,
    chunk_size: usize,
    buffers: VecDeque<Vec<u8>>,
    is_open: bool,
}

impl MockSource {
    pub fn new(sample_rate: u32, sample_width: SampleWidth, chunk_size: usize) -> Self {
        Self {
            sample_rate,
            sample_width,
            chunk_size,
            buffers: VecDeque::new(),
            is_open: false,
        }
    }

    /// 16 kHz / 16-bit / 1024-sample-chunk source, matching this
    /// crate's default PCM geometry.
    pub fn default_geometry() -> Self {
        Self::new(16_000, SampleWidth::Two, 1024)
    }

    /// Appends `seconds` worth of constant-energy 16-bit samples.
    pub fn push_tone(&mut self, seconds: f32, amplitude: i16) {
        let total_samples =
            (seconds * self.sample_rate as f32).ceil() as usize;
        let mut remaining = total_samples;
        while remaining > 0 {
            let n = remaining.min(self.chunk_size);
            let mut buf = Vec::with_capacity(n * self.sample_width.bytes());
            for _ in 0..n {
                buf.extend_from_slice(&amplitude.to_le_bytes());
            }
            self.buffers.push_back(buf);
            remaining -= n;
        }
    }

    /// Appends `seconds` worth of zero-energy samples.
    pub fn push_silence(&mut self, seconds: f32) {
        self.push_tone(seconds, 0);
    }

    /// Appends a caller-supplied buffer as-is (must already be a whole
    /// number of `chunk_size` samples; tests that need partial last
    /// chunks should just accept the shorter final read).
    pub fn push_buffer(&mut self, buffer: Vec<u8>) {
        self.buffers.push_back(buffer);
    }
}

impl AudioSourceSpec for MockSource {
    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn sample_width(&self) -> SampleWidth {
        self.sample_width
    }

    fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    fn open(&mut self) -> Result<(), SourceError> {
        if self.is_open {
            return Err(SourceError::AlreadyOpen);
        }
        self.is_open = true;
        Ok(())
    }

    fn read(&mut self) -> Result<Vec<u8>, SourceError> {
        Ok(self.buffers.pop_front().unwrap_or_default())
    }

    fn close(&mut self) {
        self.is_open = false;
    }
}
