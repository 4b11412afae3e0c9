pub mod data;
pub mod microphone;
pub mod mock;
pub mod rms;
pub mod source;
pub mod wav;

pub use data::{AudioData, SampleWidth};
pub use microphone::Microphone;
pub use mock::MockSource;
pub use source::{AudioSourceSpec, OpenSource};
pub use wav::WavFile;
