pub mod client;
pub mod error;

pub use client::{RecognitionClient, RecognitionResult};
pub use error::RecognitionError;
