pub mod audio;
pub mod error;
pub mod kernel;
pub mod recognition;

pub use audio::{AudioSourceSpec, AudioData, Microphone, MockSource, OpenSource, SampleWidth, WavFile};
pub use error::{ConfigError, ListenError, SourceError};
pub use kernel::{BackgroundListener, RecognizerConfig, Segmenter, StopHandle};
pub use recognition::{RecognitionClient, RecognitionError, RecognitionResult};
