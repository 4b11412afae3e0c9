use std::sync::mpsc;
use std::time::Duration;

use auricle::{AudioData, BackgroundListener, RecognizerConfig, Segmenter, SourceError, WavFile};

const SAMPLE_RATE: u32 = 16_000;

fn write_tone(writer: &mut hound::WavWriter<std::io::BufWriter<std::fs::File>>, seconds: f32, amplitude: i16) {
    let samples = (seconds * SAMPLE_RATE as f32) as usize;
    for _ in 0..samples {
        writer.write_sample(amplitude).unwrap();
    }
}

/// Builds a mono 16-bit fixture with two well-separated tone bursts and
/// writes it under a temp directory, the offline counterpart to driving
/// `BackgroundListener` from a live microphone.
fn two_phrase_fixture() -> (tempfile::TempDir, std::path::PathBuf) {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("phrases.wav");

    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: SAMPLE_RATE,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(&path, spec).expect("create wav fixture");
    write_tone(&mut writer, 0.3, 0);
    write_tone(&mut writer, 0.8, 3000);
    write_tone(&mut writer, 0.8, 0);
    write_tone(&mut writer, 0.8, 3000);
    write_tone(&mut writer, 0.8, 0);
    writer.finalize().expect("finalize wav fixture");

    (dir, path)
}

#[test]
fn background_listener_delivers_exactly_two_phrases_from_a_wav_fixture() {
    let (_dir, path) = two_phrase_fixture();

    let segmenter = Segmenter::new(RecognizerConfig::default()).expect("valid config");
    let source = WavFile::new(&path, 1024);

    let (tx, rx) = mpsc::channel::<Result<AudioData, SourceError>>();
    let handle = BackgroundListener::start(segmenter, source, move |result| {
        let _ = tx.send(result);
    });

    let first = rx
        .recv_timeout(Duration::from_secs(5))
        .expect("first phrase delivered")
        .expect("not a source error");
    let second = rx
        .recv_timeout(Duration::from_secs(5))
        .expect("second phrase delivered")
        .expect("not a source error");

    assert!(first.duration() > 0.0);
    assert!(second.duration() > 0.0);

    // The WAV file is now exhausted. `stop()` blocks until the worker
    // has observed true EOF (`Segmenter::listen` returning `Ok(None)`)
    // and exited on its own; no phantom third phrase, built from the
    // trailing silence a prior trim left unread, should ever appear.
    handle.stop();
    assert!(
        rx.try_recv().is_err(),
        "exactly two phrases must be delivered from this fixture, never a third"
    );
}
