use crate::error::SourceError;

use super::data::SampleWidth;

/// The capability set the segmentation engine needs from a capture
/// device: a fixed rate/width/chunk geometry plus a blocking byte read.
///
/// Implemented by `Microphone`, `WavFile`, and the test-only
/// `MockSource`. A spec value is opened/closed through `OpenSource`
/// rather than directly — `open`/`close` are not meant to be called by
/// hand outside that guard.
pub trait AudioSourceSpec: Send {
    fn sample_rate(&self) -> u32;
    fn sample_width(&self) -> SampleWidth;
    /// Samples per `read()` call. Must be > 0.
    fn chunk_size(&self) -> usize;

    fn open(&mut self) -> Result<(), SourceError>;

    /// Blocks until a full chunk is available. Returns an empty buffer
    /// at end-of-stream; never a partial chunk followed by more data.
    fn read(&mut self) -> Result<Vec<u8>, SourceError>;

    fn close(&mut self);
}

/// A scoped, guaranteed-release capture session.
///
/// `acquire` opens the underlying spec; `Drop` closes it on every exit
/// path, including an error return or a panic unwind. A given spec
/// value must not be open in two `OpenSource` guards at once — `acquire`
/// on a spec that is already open is the caller's bug and is rejected
/// rather than silently reopening the device.
pub struct OpenSource<S: AudioSourceSpec> {
    source: S,
    open: bool,
}

impl<S: AudioSourceSpec> OpenSource<S> {
    pub fn acquire(mut source: S) -> Result<Self, SourceError> {
        source.open()?;
        Ok(Self { source, open: true })
    }

    pub fn sample_rate(&self) -> u32 {
        self.source.sample_rate()
    }

    pub fn sample_width(&self) -> SampleWidth {
        self.source.sample_width()
    }

    pub fn chunk_size(&self) -> usize {
        self.source.chunk_size()
    }

    /// Reads outside the open scope are a programming error; the guard
    /// makes that unreachable in safe code, so this only debug-asserts.
    pub fn read(&mut self) -> Result<Vec<u8>, SourceError> {
        debug_assert!(self.open, "read on a closed AudioSource session");
        self.source.read()
    }

    /// Releases the session early, before the guard goes out of scope.
    pub fn release(mut self) {
        self.close();
    }

    fn close(&mut self) {
        if self.open {
            self.source.close();
            self.open = false;
        }
    }
}

impl<S: AudioSourceSpec> Drop for OpenSource<S> {
    fn drop(&mut self) {
        self.close();
    }
}
