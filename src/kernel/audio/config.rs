use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Thresholds and timings for a `Segmenter`. Mutable only between
/// `listen`/`record`/`adjust_for_ambient_noise` invocations — a running
/// `BackgroundListener` only ever mutates `energy_threshold`, and does
/// so through the `Segmenter`'s shared cell, not through this struct.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecognizerConfig {
    /// Minimum per-buffer RMS to count as speech.
    pub energy_threshold: f32,
    /// Enable adaptive threshold updates during Phase A.
    pub dynamic_energy_threshold: bool,
    /// Per-second decay factor for the adaptive threshold EWMA.
    pub dynamic_energy_adjustment_damping: f32,
    /// Multiplier applied to the current RMS to form the adaptive target.
    pub dynamic_energy_ratio: f32,
    /// Trailing silence, in seconds, needed to end a phrase.
    pub pause_threshold: f32,
    /// Minimum speaking duration, in seconds, for a phrase to be emitted.
    pub phrase_threshold: f32,
    /// Silence, in seconds, retained on both sides of a phrase.
    pub non_speaking_duration: f32,
}

impl Default for RecognizerConfig {
    fn default() -> Self {
        Self {
            energy_threshold: 600.0,
            dynamic_energy_threshold: false,
            dynamic_energy_adjustment_damping: 0.15,
            dynamic_energy_ratio: 2.0,
            pause_threshold: 0.5,
            phrase_threshold: 0.5,
            non_speaking_duration: 0.2,
        }
    }
}

impl RecognizerConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.energy_threshold < 0.0 {
            return Err(ConfigError::NegativeEnergyThreshold(self.energy_threshold));
        }
        if self.non_speaking_duration < 0.0 {
            return Err(ConfigError::NegativeNonSpeakingDuration(
                self.non_speaking_duration,
            ));
        }
        if self.phrase_threshold < 0.0 {
            return Err(ConfigError::NegativePhraseThreshold(self.phrase_threshold));
        }
        if self.pause_threshold < self.non_speaking_duration {
            return Err(ConfigError::PauseBelowNonSpeaking {
                pause: self.pause_threshold,
                non_speaking: self.non_speaking_duration,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(RecognizerConfig::default().validate().is_ok());
    }

    #[test]
    fn rejects_pause_below_non_speaking() {
        let config = RecognizerConfig {
            pause_threshold: 0.1,
            non_speaking_duration: 0.2,
            ..RecognizerConfig::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::PauseBelowNonSpeaking {
                pause: 0.1,
                non_speaking: 0.2
            })
        );
    }

    #[test]
    fn rejects_negative_energy_threshold() {
        let config = RecognizerConfig {
            energy_threshold: -1.0,
            ..RecognizerConfig::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::NegativeEnergyThreshold(-1.0))
        );
    }
}
