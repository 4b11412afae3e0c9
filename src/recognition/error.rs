use thiserror::Error;

/// Failures talking to a downstream recognizer. Never raised by the
/// core segmentation engine — only by [`super::client::RecognitionClient`],
/// kept separate so a caller who never touches HTTP never pulls in
/// these variants.
#[derive(Debug, Error)]
pub enum RecognitionError {
    #[error("recognition request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("recognizer returned status {0}")]
    Status(reqwest::StatusCode),

    #[error("failed to decode recognizer response: {0}")]
    Decode(#[from] serde_json::Error),
}
