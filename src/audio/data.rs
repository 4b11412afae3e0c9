use serde::{Deserialize, Serialize};

/// Bytes per PCM sample. Bounded to the widths the RMS path understands
/// (§9 of the design notes); a fourth byte width would need a new match
/// arm in `audio::rms`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SampleWidth {
    One,
    Two,
    Four,
}

impl SampleWidth {
    pub fn bytes(self) -> usize {
        match self {
            SampleWidth::One => 1,
            SampleWidth::Two => 2,
            SampleWidth::Four => 4,
        }
    }

    pub fn from_bytes(bytes: usize) -> Option<Self> {
        match bytes {
            1 => Some(SampleWidth::One),
            2 => Some(SampleWidth::Two),
            4 => Some(SampleWidth::Four),
            _ => None,
        }
    }
}

/// An immutable PCM phrase: the frames a `Segmenter` captured, tagged
/// with the rate and width of the source that produced them.
///
/// Constructed once, by `Segmenter`; never mutated after.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioData {
    frame_data: Vec<u8>,
    sample_rate: u32,
    sample_width: SampleWidth,
}

impl AudioData {
    /// Panics if `frame_data.len()` is not a multiple of `sample_width`'s
    /// byte count — that would violate the one invariant this type exists
    /// to uphold, and every caller inside this crate builds `frame_data`
    /// out of whole samples already.
    pub fn new(frame_data: Vec<u8>, sample_rate: u32, sample_width: SampleWidth) -> Self {
        assert_eq!(
            frame_data.len() % sample_width.bytes(),
            0,
            "frame_data length must be a multiple of sample_width"
        );
        Self {
            frame_data,
            sample_rate,
            sample_width,
        }
    }

    pub fn frame_data(&self) -> &[u8] {
        &self.frame_data
    }

    pub fn into_frame_data(self) -> Vec<u8> {
        self.frame_data
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn sample_width(&self) -> SampleWidth {
        self.sample_width
    }

    pub fn sample_count(&self) -> usize {
        self.frame_data.len() / self.sample_width.bytes()
    }

    /// Total duration in seconds, derived from sample count and rate.
    pub fn duration(&self) -> f32 {
        self.sample_count() as f32 / self.sample_rate as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duration_matches_sample_count() {
        let data = AudioData::new(vec![0u8; 3200], 16000, SampleWidth::Two);
        assert_eq!(data.sample_count(), 1600);
        assert!((data.duration() - 0.1).abs() < 1e-6);
    }

    #[test]
    #[should_panic]
    fn rejects_misaligned_frame_data() {
        AudioData::new(vec![0u8; 3], 16000, SampleWidth::Two);
    }
}
