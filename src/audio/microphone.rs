use std::time::Duration;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use ringbuf::traits::{Consumer, Producer, Split};
use ringbuf::HeapRb;
use tracing::{debug, info, warn};

use crate::error::SourceError;

use super::data::SampleWidth;
use super::source::AudioSourceSpec;

/// Sample rates the segmentation engine is tuned for; picked in order
/// of preference, the same way the retrieved corpus's `AudioCapture`
/// prioritizes 16 kHz and falls back through the others.
const PREFERRED_RATES: [u32; 4] = [16_000, 32_000, 48_000, 8_000];

/// The default input device, resampled to 16-bit signed little-endian
/// mono PCM. `open()` claims the device and starts the cpal stream;
/// `close()` drops it.
pub struct Microphone {
    chunk_size: usize,
    sample_rate: u32,
    stream: Option<cpal::Stream>,
    consumer: Option<ringbuf::HeapCons<i16>>,
}

impl Microphone {
    pub fn new(chunk_size: usize) -> Self {
        Self {
            chunk_size,
            sample_rate: 0,
            stream: None,
            consumer: None,
        }
    }
}

impl AudioSourceSpec for Microphone {
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
        if self.stream.is_some() {
            return Err(SourceError::AlreadyOpen);
        }

        let host = cpal::default_host();
        let device = host
            .default_input_device()
            .ok_or_else(|| SourceError::Open("no input device available".into()))?;

        info!(device = %device.name().unwrap_or_default(), "opening audio input device");

        let mut selected = None;
        for &rate in &PREFERRED_RATES {
            let configs = device
                .supported_input_configs()
                .map_err(|e| SourceError::Open(e.to_string()))?;
            for range in configs {
                if range.min_sample_rate().0 <= rate && range.max_sample_rate().0 >= rate {
                    selected = Some((range.with_sample_rate(cpal::SampleRate(rate)), rate));
                    break;
                }
            }
            if selected.is_some() {
                break;
            }
        }

        let (config, sample_rate) = match selected {
            Some(c) => c,
            None => {
                let def = device
                    .default_input_config()
                    .map_err(|e| SourceError::Open(e.to_string()))?;
                let rate = def.sample_rate().0;
                if !PREFERRED_RATES.contains(&rate) {
                    return Err(SourceError::Open(format!(
                        "unsupported sample rate {rate}; need 8k/16k/32k/48k"
                    )));
                }
                (def, rate)
            }
        };

        info!(rate = sample_rate, channels = config.channels(), "audio config selected");

        // Ring sized generously so a slow consumer doesn't stall cpal's
        // realtime callback; a full ring drops samples rather than blocks.
        let ring = HeapRb::<i16>::new(sample_rate as usize * 4);
        let (producer, consumer) = ring.split();

        let err_fn = |err| warn!(error = %err, "audio stream error");
        let sample_format = config.sample_format();
        let mut producer = producer;
        let stream = match sample_format {
            cpal::SampleFormat::I16 => device
                .build_input_stream(
                    &config.into(),
                    move |data: &[i16], _: &_| write_i16(data, &mut producer),
                    err_fn,
                    None,
                )
                .map_err(|e| SourceError::Open(e.to_string()))?,
            cpal::SampleFormat::F32 => device
                .build_input_stream(
                    &config.into(),
                    move |data: &[f32], _: &_| write_f32(data, &mut producer),
                    err_fn,
                    None,
                )
                .map_err(|e| SourceError::Open(e.to_string()))?,
            other => return Err(SourceError::Open(format!("unsupported sample format {other:?}"))),
        };

        stream.play().map_err(|e| SourceError::Open(e.to_string()))?;

        self.sample_rate = sample_rate;
        self.stream = Some(stream);
        self.consumer = Some(consumer);
        Ok(())
    }

    fn read(&mut self) -> Result<Vec<u8>, SourceError> {
        let consumer = self
            .consumer
            .as_mut()
            .expect("read on a Microphone that was never opened");

        while consumer.occupied_len() < self.chunk_size {
            std::thread::sleep(Duration::from_millis(5));
        }

        let mut samples = vec![0i16; self.chunk_size];
        let filled = consumer.pop_slice(&mut samples);
        debug!(filled, "microphone chunk read");

        let mut bytes = Vec::with_capacity(filled * 2);
        for sample in &samples[..filled] {
            bytes.extend_from_slice(&sample.to_le_bytes());
        }
        Ok(bytes)
    }

    fn close(&mut self) {
        self.stream = None;
        self.consumer = None;
    }
}

fn write_i16(input: &[i16], producer: &mut ringbuf::HeapProd<i16>) {
    producer.push_slice(input);
}

fn write_f32(input: &[f32], producer: &mut ringbuf::HeapProd<i16>) {
    for &sample in input {
        let s = (sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16;
        let _ = producer.try_push(s);
    }
}
