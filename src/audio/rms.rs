use super::data::SampleWidth;

/// Root-mean-square energy of a buffer of signed little-endian samples.
///
/// Uses a 64-bit accumulator for the sum of squares so a full buffer of
/// maximum-amplitude 32-bit samples can't overflow.
pub fn rms(buffer: &[u8], width: SampleWidth) -> f32 {
    let width_bytes = width.bytes();
    if buffer.is_empty() {
        return 0.0;
    }
    debug_assert_eq!(buffer.len() % width_bytes, 0, "buffer not sample-aligned");

    let mut sum_sq: i64 = 0;
    let mut count: i64 = 0;
    for chunk in buffer.chunks_exact(width_bytes) {
        let sample: i64 = match width {
            SampleWidth::One => i8::from_le_bytes([chunk[0]]) as i64,
            SampleWidth::Two => i16::from_le_bytes([chunk[0], chunk[1]]) as i64,
            SampleWidth::Four => {
                i32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]) as i64
            }
        };
        sum_sq += sample * sample;
        count += 1;
    }
    if count == 0 {
        return 0.0;
    }
    ((sum_sq as f64) / (count as f64)).sqrt() as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn silence_has_zero_energy() {
        let buf = vec![0u8; 2048];
        assert_eq!(rms(&buf, SampleWidth::Two), 0.0);
    }

    #[test]
    fn constant_amplitude_matches_formula() {
        // every 16-bit sample is exactly 3000
        let sample: i16 = 3000;
        let mut buf = Vec::new();
        for _ in 0..512 {
            buf.extend_from_slice(&sample.to_le_bytes());
        }
        let energy = rms(&buf, SampleWidth::Two);
        assert!((energy - 3000.0).abs() < 1e-3);
    }

    #[test]
    fn empty_buffer_is_zero() {
        assert_eq!(rms(&[], SampleWidth::Two), 0.0);
    }
}
