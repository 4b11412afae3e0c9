use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use parking_lot::Mutex;
use tracing::{debug, error, info, warn};

use crate::audio::{AudioData, AudioSourceSpec, OpenSource};
use crate::error::{ListenError, SourceError};

use super::segment::Segmenter;

/// How long each `listen` call waits for a phrase to start before the
/// worker re-checks the running flag.
const POLL_TIMEOUT: Duration = Duration::from_secs(1);

type WorkerResult = Result<(), SourceError>;

/// A running background listener's stop signal. Setting it false and
/// joining the worker is idempotent — the second `stop()` call observes
/// the join already performed and returns immediately.
pub struct StopHandle {
    running: Arc<AtomicBool>,
    handle: Mutex<Option<JoinHandle<WorkerResult>>>,
}

impl StopHandle {
    /// Requests the worker stop, then blocks until it has exited and the
    /// source session has been released. Returns the worker's terminal
    /// error, if it ended because of one rather than a clean stop.
    pub fn stop(&self) -> Option<SourceError> {
        self.running.store(false, Ordering::Release);
        let mut guard = self.handle.lock();
        match guard.take() {
            Some(handle) => match handle.join() {
                Ok(Ok(())) => None,
                Ok(Err(err)) => Some(err),
                Err(_) => {
                    error!("background listener worker panicked");
                    Some(SourceError::Read("worker thread panicked".into()))
                }
            },
            None => None,
        }
    }
}

/// Repeatedly invokes a `Segmenter` on a dedicated worker thread,
/// delivering each captured phrase to `callback`. The worker is a plain
/// `std::thread` (not joined automatically), so a process that exits
/// without calling `StopHandle::stop` is never blocked by it.
pub struct BackgroundListener;

impl BackgroundListener {
    /// Acquires `source` as a scoped session on the worker thread and
    /// returns immediately with a handle to stop it later.
    pub fn start<S, F>(segmenter: Segmenter, source: S, mut callback: F) -> StopHandle
    where
        S: AudioSourceSpec + 'static,
        F: FnMut(Result<AudioData, SourceError>) + Send + 'static,
    {
        let running = Arc::new(AtomicBool::new(true));
        let worker_running = Arc::clone(&running);

        let handle = thread::spawn(move || -> WorkerResult {
            let mut session = match OpenSource::acquire(source) {
                Ok(session) => session,
                Err(err) => {
                    callback(Err(err.clone()));
                    return Err(err);
                }
            };

            info!("background listener worker started");
            while worker_running.load(Ordering::Acquire) {
                match segmenter.listen(&mut session, Some(POLL_TIMEOUT.as_secs_f32())) {
                    Ok(None) => {
                        // True end-of-stream: phase A hit EOF without
                        // ever crossing the energy threshold, so there
                        // is nothing to deliver, not even leftover
                        // pre-roll silence from a prior trim (§4.2.3/
                        // §4.2.4). Looping again would just observe the
                        // same EOF forever.
                        debug!("source exhausted; ending background listener");
                        break;
                    }
                    Ok(Some(audio)) => {
                        // Double-check: don't deliver a phrase that
                        // finished capturing after stop was requested.
                        if worker_running.load(Ordering::Acquire) {
                            callback(Ok(audio));
                        } else {
                            debug!("phrase captured after stop; dropping");
                        }
                    }
                    Err(ListenError::WaitTimeout) => continue,
                    Err(ListenError::Source(err)) => {
                        warn!(error = %err, "background listener ending on source error");
                        callback(Err(err.clone()));
                        return Err(err);
                    }
                }
            }
            info!("background listener worker stopping");
            Ok(())
            // `session` drops here, releasing the audio device.
        });

        StopHandle {
            running,
            handle: Mutex::new(Some(handle)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::MockSource;
    use crate::kernel::audio::config::RecognizerConfig;
    use std::sync::mpsc;

    fn segmenter() -> Segmenter {
        Segmenter::new(RecognizerConfig::default()).unwrap()
    }

    #[test]
    fn stop_is_idempotent() {
        let mut mock = MockSource::default_geometry();
        mock.push_silence(30.0);

        let (tx, _rx) = mpsc::channel::<Result<AudioData, SourceError>>();
        let handle = BackgroundListener::start(segmenter(), mock, move |result| {
            let _ = tx.send(result);
        });

        assert!(handle.stop().is_none());
        assert!(handle.stop().is_none());
    }

    #[test]
    fn delivers_two_phrases_in_order() {
        let mut mock = MockSource::default_geometry();
        mock.push_silence(0.3);
        mock.push_tone(0.8, 3000);
        mock.push_silence(0.8);
        mock.push_tone(0.8, 3000);
        mock.push_silence(0.8);

        let (tx, rx) = mpsc::channel::<Result<AudioData, SourceError>>();
        let handle = BackgroundListener::start(segmenter(), mock, move |result| {
            let _ = tx.send(result);
        });

        let first = rx
            .recv_timeout(Duration::from_secs(5))
            .expect("first phrase")
            .expect("not an error");
        let second = rx
            .recv_timeout(Duration::from_secs(5))
            .expect("second phrase")
            .expect("not an error");

        assert!(first.duration() > 0.0);
        assert!(second.duration() > 0.0);

        // The source is now exhausted (trailing silence, then EOF); the
        // worker should see `Segmenter::listen` return `Ok(None)` and
        // stop on its own rather than delivering a phantom third phrase
        // built from leftover trailing silence. `stop()` blocks until
        // that join completes, so the channel is settled by the time we
        // check it.
        handle.stop();
        assert!(
            rx.try_recv().is_err(),
            "exactly two phrases must be delivered, never a third"
        );
    }

    #[test]
    fn stop_mid_silence_delivers_nothing() {
        let mut mock = MockSource::default_geometry();
        mock.push_silence(30.0);

        let (tx, rx) = mpsc::channel::<Result<AudioData, SourceError>>();
        let handle = BackgroundListener::start(segmenter(), mock, move |result| {
            let _ = tx.send(result);
        });

        std::thread::sleep(Duration::from_millis(50));
        handle.stop();
        assert!(rx.try_recv().is_err());
    }
}
