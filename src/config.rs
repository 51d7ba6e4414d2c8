// src/config.rs

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::time::Duration;

/// Number of envelope buckets drawn by the player.
pub const DEFAULT_RESOLUTION: usize = 40;
pub const DEFAULT_POLL_PERIOD_MS: u64 = 100;
/// Remaining time below which a clip counts as finished.
pub const DEFAULT_FINISH_TOLERANCE_SECS: f64 = 0.01;
/// How long the last frame stays visible before the resource is released.
pub const DEFAULT_GRACE_DELAY_MS: u64 = 200;

/// The tunables of the player core. Everything else is fixed layout.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    pub resolution: usize,
    pub poll_period_ms: u64,
    pub finish_tolerance_secs: f64,
    pub grace_delay_ms: u64,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            resolution: DEFAULT_RESOLUTION,
            poll_period_ms: DEFAULT_POLL_PERIOD_MS,
            finish_tolerance_secs: DEFAULT_FINISH_TOLERANCE_SECS,
            grace_delay_ms: DEFAULT_GRACE_DELAY_MS,
        }
    }
}

impl PlayerConfig {
    pub fn load_from_disk(path: &Path) -> Result<Self, ConfigError> {
        let file = File::open(path)?;
        let reader = BufReader::new(file);
        let config: Self = serde_json::from_reader(reader)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.resolution == 0 {
            return Err(ConfigError::Invalid("resolution must be positive"));
        }
        if self.poll_period_ms == 0 {
            return Err(ConfigError::Invalid("poll period must be positive"));
        }
        if !self.finish_tolerance_secs.is_finite() || self.finish_tolerance_secs < 0.0 {
            return Err(ConfigError::Invalid("finish tolerance must be a non-negative number"));
        }
        Ok(())
    }

    pub fn timing(&self) -> PlaybackTiming {
        PlaybackTiming {
            poll_period: Duration::from_millis(self.poll_period_ms),
            finish_tolerance: self.finish_tolerance_secs,
            grace_delay: Duration::from_millis(self.grace_delay_ms),
        }
    }
}

/// Timing knobs handed to a playback session.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaybackTiming {
    pub poll_period: Duration,
    pub finish_tolerance: f64,
    pub grace_delay: Duration,
}

impl Default for PlaybackTiming {
    fn default() -> Self {
        PlayerConfig::default().timing()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_match_player_constants() {
        let config = PlayerConfig::default();
        assert_eq!(config.resolution, 40);
        let timing = config.timing();
        assert_eq!(timing.poll_period, Duration::from_millis(100));
        assert_eq!(timing.grace_delay, Duration::from_millis(200));
        assert!((timing.finish_tolerance - 0.01).abs() < f64::EPSILON);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "poll_period_ms": 50 }}"#).unwrap();
        let config = PlayerConfig::load_from_disk(file.path()).unwrap();
        assert_eq!(config.poll_period_ms, 50);
        assert_eq!(config.resolution, DEFAULT_RESOLUTION);
    }

    #[test]
    fn test_zero_resolution_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "resolution": 0 }}"#).unwrap();
        let err = PlayerConfig::load_from_disk(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }
}
