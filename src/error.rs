use thiserror::Error;

/// Failures from an [`crate::audio::source::AudioSourceSpec`] — device
/// acquisition or a mid-stream read.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("failed to acquire audio device: {0}")]
    Open(String),

    #[error("audio source is already open")]
    AlreadyOpen,

    #[error("read error: {0}")]
    Read(String),

    #[error("unsupported sample width: {0} bytes")]
    UnsupportedSampleWidth(usize),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Clone for SourceError {
    fn clone(&self) -> Self {
        match self {
            Self::Open(s) => Self::Open(s.clone()),
            Self::AlreadyOpen => Self::AlreadyOpen,
            Self::Read(s) => Self::Read(s.clone()),
            Self::UnsupportedSampleWidth(w) => Self::UnsupportedSampleWidth(*w),
            Self::Io(e) => Self::Read(e.to_string()),
        }
    }
}

/// Violated [`crate::kernel::audio::config::RecognizerConfig`] invariants.
/// Always rejected at construction, before any audio is consumed.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("energy_threshold must be non-negative, got {0}")]
    NegativeEnergyThreshold(f32),

    #[error("non_speaking_duration must be non-negative, got {0}")]
    NegativeNonSpeakingDuration(f32),

    #[error("phrase_threshold must be non-negative, got {0}")]
    NegativePhraseThreshold(f32),

    #[error(
        "pause_threshold ({pause}) must be >= non_speaking_duration ({non_speaking})"
    )]
    PauseBelowNonSpeaking { pause: f32, non_speaking: f32 },
}

/// Outcome of [`crate::kernel::audio::segment::Segmenter::listen`].
#[derive(Debug, Error)]
pub enum ListenError {
    #[error("listening timed out")]
    WaitTimeout,

    #[error(transparent)]
    Source(#[from] SourceError),
}
