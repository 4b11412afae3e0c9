use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;

use crate::audio::AudioData;

use super::error::RecognitionError;

/// A recognizer's reply to a submitted phrase. `intent` is left as raw
/// JSON — its shape belongs to the downstream service, not this crate.
#[derive(Debug, Deserialize)]
pub struct RecognitionResult {
    pub result: String,
    pub response: String,
    pub intent: serde_json::Value,
}

/// Thin client for the `/api/audible` wire contract: posts raw PCM with
/// its format as query parameters, gets back a transcript/reply/intent
/// triple. The core engine never constructs one of these itself — it's
/// here so a caller wiring a `BackgroundListener` callback to a real
/// recognizer doesn't have to redefine the contract.
#[derive(Clone)]
pub struct RecognitionClient {
    http: Client,
    base_url: String,
    client_id: String,
}

impl RecognitionClient {
    pub fn new(base_url: impl Into<String>, client_id: impl Into<String>) -> Self {
        Self {
            http: Client::builder()
                .timeout(Duration::from_secs(10))
                .build()
                .unwrap_or_default(),
            base_url: base_url.into(),
            client_id: client_id.into(),
        }
    }

    pub async fn recognize(&self, audio: &AudioData) -> Result<RecognitionResult, RecognitionError> {
        let url = format!("{}/api/audible", self.base_url);
        let response = self
            .http
            .post(url)
            .query(&[
                ("token", self.client_id.as_str()),
                ("samplerate", &audio.sample_rate().to_string()),
                ("samplewidth", &audio.sample_width().bytes().to_string()),
                ("clientid", self.client_id.as_str()),
            ])
            .header("content-type", "application/json")
            .body(audio.frame_data().to_vec())
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(RecognitionError::Status(response.status()));
        }

        let body = response.bytes().await?;
        let parsed = serde_json::from_slice(&body)?;
        Ok(parsed)
    }
}
