pub mod audio;

pub use audio::{BackgroundListener, RecognizerConfig, Segmenter, StopHandle};
