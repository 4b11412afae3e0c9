use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, trace};

use crate::audio::{rms::rms, AudioData, AudioSourceSpec, OpenSource};
use crate::error::{ConfigError, ListenError, SourceError};

use super::config::RecognizerConfig;

/// The phrase segmentation engine: a streaming state machine over
/// fixed-size audio buffers that decides when a phrase begins, when it
/// ends, whether it's long enough to emit, and how to trim its
/// endpoints.
///
/// `energy_threshold` is the only field mutated after construction; it
/// lives behind a shared mutex so a `BackgroundListener` worker thread
/// and the thread that built the `Segmenter` can both observe it. All
/// other thresholds are fixed for the life of the value — callers who
/// need different timings build a new `Segmenter`.
#[derive(Clone)]
pub struct Segmenter {
    energy_threshold: Arc<Mutex<f32>>,
    dynamic_energy_threshold: bool,
    dynamic_energy_adjustment_damping: f32,
    dynamic_energy_ratio: f32,
    pause_threshold: f32,
    phrase_threshold: f32,
    non_speaking_duration: f32,
}

impl Segmenter {
    pub fn new(config: RecognizerConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            energy_threshold: Arc::new(Mutex::new(config.energy_threshold)),
            dynamic_energy_threshold: config.dynamic_energy_threshold,
            dynamic_energy_adjustment_damping: config.dynamic_energy_adjustment_damping,
            dynamic_energy_ratio: config.dynamic_energy_ratio,
            pause_threshold: config.pause_threshold,
            phrase_threshold: config.phrase_threshold,
            non_speaking_duration: config.non_speaking_duration,
        })
    }

    /// Current adaptive energy threshold. May be stale if a background
    /// listener is concurrently updating it.
    pub fn energy_threshold(&self) -> f32 {
        *self.energy_threshold.lock()
    }

    pub fn set_energy_threshold(&self, value: f32) {
        *self.energy_threshold.lock() = value;
    }

    fn apply_ewma(&self, energy: f32, seconds_per_buffer: f32) {
        let damping = self.dynamic_energy_adjustment_damping.powf(seconds_per_buffer);
        let target = energy * self.dynamic_energy_ratio;
        let mut guard = self.energy_threshold.lock();
        *guard = *guard * damping + target * (1.0 - damping);
    }

    /// Purely time-driven capture: reads until `duration` seconds have
    /// elapsed (or EOF), skipping the first `offset` seconds if given.
    pub fn record<S: AudioSourceSpec>(
        &self,
        source: &mut OpenSource<S>,
        duration: Option<f32>,
        offset: Option<f32>,
    ) -> Result<AudioData, SourceError> {
        let seconds_per_buffer = source.chunk_size() as f32 / source.sample_rate() as f32;
        let mut elapsed_time = 0.0f32;
        let mut offset_time = 0.0f32;
        let mut offset_reached = offset.is_none();
        let mut frames = Vec::new();

        loop {
            if let Some(offset) = offset {
                if !offset_reached {
                    offset_time += seconds_per_buffer;
                    if offset_time > offset {
                        offset_reached = true;
                    }
                }
            }

            let buffer = source.read()?;
            if buffer.is_empty() {
                break;
            }

            if offset_reached {
                elapsed_time += seconds_per_buffer;
                if let Some(duration) = duration {
                    if elapsed_time > duration {
                        break;
                    }
                }
                frames.extend_from_slice(&buffer);
            }
        }

        Ok(AudioData::new(
            frames,
            source.sample_rate(),
            source.sample_width(),
        ))
    }

    /// Calibrates `energy_threshold` against ambient noise for up to
    /// `duration` seconds, unconditionally (regardless of
    /// `dynamic_energy_threshold`).
    pub fn adjust_for_ambient_noise<S: AudioSourceSpec>(
        &self,
        source: &mut OpenSource<S>,
        duration: f32,
    ) -> Result<(), SourceError> {
        let seconds_per_buffer = source.chunk_size() as f32 / source.sample_rate() as f32;
        let mut elapsed_time = 0.0f32;

        loop {
            elapsed_time += seconds_per_buffer;
            if elapsed_time > duration {
                break;
            }
            let buffer = source.read()?;
            if buffer.is_empty() {
                break;
            }
            let energy = rms(&buffer, source.sample_width());
            self.apply_ewma(energy, seconds_per_buffer);
        }

        debug!(threshold = self.energy_threshold() as f64, "ambient noise calibration complete");
        Ok(())
    }

    /// Captures a single phrase, retrying internally until one is long
    /// enough or the stream ends. `timeout` bounds the cumulative time
    /// spent in Phase A across all retries within this call.
    ///
    /// Returns `Ok(None)` when the source hit true end-of-stream without
    /// ever crossing the energy threshold — there is nothing to deliver,
    /// not even leftover pre-roll silence carried over from a previous
    /// call's trailing-silence trim. A caller (e.g. `BackgroundListener`)
    /// should treat `Ok(None)` as "stop, the source is exhausted", and
    /// `Ok(Some(_))` — however short — as a real, deliverable phrase.
    pub fn listen<S: AudioSourceSpec>(
        &self,
        source: &mut OpenSource<S>,
        timeout: Option<f32>,
    ) -> Result<Option<AudioData>, ListenError> {
        let seconds_per_buffer = source.chunk_size() as f32 / source.sample_rate() as f32;
        let pause_buffer_count = (self.pause_threshold / seconds_per_buffer).ceil() as usize;
        let phrase_buffer_count = (self.phrase_threshold / seconds_per_buffer).ceil() as usize;
        let non_speaking_buffer_count =
            (self.non_speaking_duration / seconds_per_buffer).ceil() as usize;

        let mut elapsed_time = 0.0f32;

        loop {
            let mut frames: VecDeque<Vec<u8>> = VecDeque::new();

            // Phase A: await speech.
            let mut eof_in_phase_a = false;
            loop {
                elapsed_time += seconds_per_buffer;
                if let Some(timeout) = timeout {
                    if elapsed_time > timeout {
                        return Err(ListenError::WaitTimeout);
                    }
                }

                let buffer = source.read()?;
                if buffer.is_empty() {
                    eof_in_phase_a = true;
                    break;
                }

                let energy = rms(&buffer, source.sample_width());
                frames.push_back(buffer);
                if frames.len() > non_speaking_buffer_count {
                    frames.pop_front();
                }

                if energy > self.energy_threshold() {
                    trace!(energy = energy as f64, "speech detected, leaving phase A");
                    break;
                }
                if self.dynamic_energy_threshold {
                    self.apply_ewma(energy, seconds_per_buffer);
                }
            }

            if eof_in_phase_a {
                // No buffer in `frames` crossed the energy threshold —
                // Phase A only ever breaks early (leaving the ring
                // non-empty) when it does, so reaching EOF here means
                // every buffer still queued is leftover silence, either
                // genuine ambient quiet or the trailing silence a prior
                // call's trim deliberately left unread. Either way there
                // is no phrase to deliver, so this returns `None` rather
                // than falling through into phase B (see the design
                // notes on this divergence from the upstream reference
                // behaviour).
                return Ok(None);
            }

            // Phase B: capture until silence.
            let mut pause_count = 0usize;
            let mut phrase_count = 0usize;
            let mut eof_in_phase_b = false;
            loop {
                elapsed_time += seconds_per_buffer;
                let buffer = source.read()?;
                if buffer.is_empty() {
                    eof_in_phase_b = true;
                    break;
                }
                phrase_count += 1;
                let energy = rms(&buffer, source.sample_width());
                frames.push_back(buffer);

                if energy > self.energy_threshold() {
                    pause_count = 0;
                } else {
                    pause_count += 1;
                }
                if pause_count > pause_buffer_count {
                    break;
                }
            }

            if eof_in_phase_b {
                // Speech was already detected in phase A, so whatever
                // phase B captured before EOF is a real phrase, however
                // short — unlike the phase-A case, there's no "leftover
                // silence" interpretation available here.
                trim_trailing_silence(&mut frames, pause_count, non_speaking_buffer_count);
                return Ok(Some(to_audio_data(frames, source)));
            }

            let effective_phrase = phrase_count.saturating_sub(pause_count);
            if effective_phrase >= phrase_buffer_count {
                trim_trailing_silence(&mut frames, pause_count, non_speaking_buffer_count);
                return Ok(Some(to_audio_data(frames, source)));
            }
            // Too short: discard and restart phase A. `elapsed_time`
            // (and thus `timeout`) keeps accumulating across retries.
        }
    }
}

fn trim_trailing_silence(
    frames: &mut VecDeque<Vec<u8>>,
    pause_count: usize,
    non_speaking_buffer_count: usize,
) {
    let trim = pause_count.saturating_sub(non_speaking_buffer_count);
    for _ in 0..trim {
        frames.pop_back();
    }
}

fn to_audio_data<S: AudioSourceSpec>(frames: VecDeque<Vec<u8>>, source: &OpenSource<S>) -> AudioData {
    let mut flat = Vec::new();
    for frame in frames {
        flat.extend_from_slice(&frame);
    }
    AudioData::new(flat, source.sample_rate(), source.sample_width())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::MockSource;

    fn segmenter(config: RecognizerConfig) -> Segmenter {
        Segmenter::new(config).unwrap()
    }

    #[test]
    fn silent_stream_times_out() {
        let mut mock = MockSource::default_geometry();
        mock.push_silence(10.0);
        let mut source = OpenSource::acquire(mock).unwrap();

        let seg = segmenter(RecognizerConfig::default());
        let before = seg.energy_threshold();
        let result = seg.listen(&mut source, Some(1.0));
        assert!(matches!(result, Err(ListenError::WaitTimeout)));
        assert_eq!(seg.energy_threshold(), before);
    }

    #[test]
    fn clean_phrase_is_trimmed_and_emitted() {
        let mut mock = MockSource::default_geometry();
        mock.push_silence(0.3);
        mock.push_tone(1.2, 3000);
        mock.push_silence(0.8);
        let mut source = OpenSource::acquire(mock).unwrap();

        let seg = segmenter(RecognizerConfig::default());
        let audio = seg
            .listen(&mut source, None)
            .expect("no source error")
            .expect("phrase captured");

        assert_eq!(audio.frame_data().len() % audio.sample_width().bytes(), 0);
        // body (1.2s) + up to non_speaking_duration on each side, buffer-granular.
        assert!(audio.duration() >= 1.2);
        assert!(audio.duration() <= 1.2 + 0.2 + 0.2 + 0.2);
    }

    #[test]
    fn short_blip_does_not_emit_until_eof() {
        let mut mock = MockSource::default_geometry();
        mock.push_silence(0.5);
        mock.push_tone(0.2, 3000);
        mock.push_silence(0.5);
        let mut source = OpenSource::acquire(mock).unwrap();

        let seg = segmenter(RecognizerConfig::default());
        let audio = seg
            .listen(&mut source, None)
            .expect("no source error")
            .expect("eof returns a short capture");
        assert!(audio.duration() <= 0.2 + 0.6);
    }

    #[test]
    fn eof_before_any_speech_returns_none() {
        // Pure silence to exhaustion never crosses the energy threshold,
        // so phase A hits EOF with nothing to deliver — this is also
        // what the *next* call after a trimmed phrase sees against the
        // leftover trailing silence a prior trim left unread.
        let mut mock = MockSource::default_geometry();
        mock.push_silence(0.5);
        let mut source = OpenSource::acquire(mock).unwrap();

        let seg = segmenter(RecognizerConfig::default());
        let phrase = seg.listen(&mut source, None).expect("no source error");
        assert!(phrase.is_none());
    }

    #[test]
    fn calibration_converges_toward_ratio_times_energy() {
        // Decay is damping^elapsed_seconds by construction (the per-buffer
        // factor is damping ** seconds_per_buffer), so two full seconds at
        // the default damping of 0.15 leaves well under 50 of excess.
        let mut mock = MockSource::default_geometry();
        mock.push_tone(2.0, 100);
        let mut source = OpenSource::acquire(mock).unwrap();

        let seg = segmenter(RecognizerConfig::default());
        seg.adjust_for_ambient_noise(&mut source, 2.0).unwrap();
        assert!((seg.energy_threshold() - 200.0).abs() < 50.0);
    }

    #[test]
    fn record_without_duration_reads_until_eof() {
        let mut mock = MockSource::default_geometry();
        mock.push_tone(0.5, 1000);
        let mut source = OpenSource::acquire(mock).unwrap();

        let seg = segmenter(RecognizerConfig::default());
        let audio = seg.record(&mut source, None, None).unwrap();
        assert!(audio.duration() >= 0.5);
    }
}
