//! Configuration for mining runs
//!
//! Defines the success-rate policy (EMA weight, retirement floor, starting
//! rate) and the mining interval.

use mise_extractor::Locale;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the Pattern Miner
///
/// # Examples
///
/// ```
/// use mise_miner::MinerConfig;
///
/// let config = MinerConfig::default();
/// assert_eq!(config.ema_alpha, 0.3);
///
/// // Rules must prove themselves quickly
/// let config = MinerConfig::strict();
/// assert!(config.success_floor > MinerConfig::default().success_floor);
///
/// // Rules are kept around longer
/// let config = MinerConfig::lenient();
/// assert!(config.success_floor < MinerConfig::default().success_floor);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MinerConfig {
    /// How often the background worker mines (in minutes)
    /// Default: 60
    pub interval_minutes: u64,

    /// Weight of the newest outcome in the success-rate EMA
    /// Default: 0.3
    pub ema_alpha: f64,

    /// Rules whose success rate falls below this are retired
    /// Default: 0.2
    pub success_floor: f64,

    /// Success rate a freshly derived rule starts from, before its first replay
    /// Default: 0.5
    pub initial_success_rate: f64,

    /// Share of corrected fields a replay must reproduce to count as a success
    /// Default: 0.75
    pub reproduction_threshold: f64,

    /// Earlier examples per fingerprint replayed after a rule is revised
    /// Default: 5
    pub replay_window: usize,

    /// Vocabulary used when deriving and replaying rules
    pub locale: Locale,

    /// Dry-run mode: mine and log, but neither persist nor publish
    /// Default: false
    pub dry_run: bool,
}

impl Default for MinerConfig {
    fn default() -> Self {
        Self {
            interval_minutes: 60,
            ema_alpha: 0.3,
            success_floor: 0.2,
            initial_success_rate: 0.5,
            reproduction_threshold: 0.75,
            replay_window: 5,
            locale: Locale::default(),
            dry_run: false,
        }
    }
}

impl MinerConfig {
    /// Fast-moving rates and a high floor
    pub fn strict() -> Self {
        Self {
            interval_minutes: 30,
            ema_alpha: 0.5,
            success_floor: 0.35,
            initial_success_rate: 0.4,
            reproduction_threshold: 0.9,
            replay_window: 10,
            ..Default::default()
        }
    }

    /// Slow-moving rates and a low floor
    pub fn lenient() -> Self {
        Self {
            interval_minutes: 120,
            ema_alpha: 0.15,
            success_floor: 0.1,
            initial_success_rate: 0.6,
            reproduction_threshold: 0.6,
            replay_window: 3,
            ..Default::default()
        }
    }

    /// Mining interval as Duration
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_minutes * 60)
    }

    /// Check that every knob is in range
    pub fn validate(&self) -> Result<(), String> {
        if self.interval_minutes == 0 {
            return Err("interval_minutes must be greater than 0".to_string());
        }
        if !(self.ema_alpha > 0.0 && self.ema_alpha <= 1.0) {
            return Err(format!("ema_alpha must be within (0, 1], got {}", self.ema_alpha));
        }
        for (name, value) in [
            ("success_floor", self.success_floor),
            ("initial_success_rate", self.initial_success_rate),
            ("reproduction_threshold", self.reproduction_threshold),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(format!("{} must be within [0, 1], got {}", name, value));
            }
        }
        if self.initial_success_rate < self.success_floor {
            return Err(format!(
                "initial_success_rate ({}) must not be below success_floor ({})",
                self.initial_success_rate, self.success_floor
            ));
        }
        Ok(())
    }

    /// Load from a TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, String> {
        toml::from_str(toml_str).map_err(|e| format!("Failed to parse TOML: {}", e))
    }

    /// Serialize to a TOML string
    pub fn to_toml(&self) -> Result<String, String> {
        toml::to_string_pretty(self).map_err(|e| format!("Failed to serialize to TOML: {}", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = MinerConfig::default();
        assert_eq!(config.interval_minutes, 60);
        assert_eq!(config.success_floor, 0.2);
        assert_eq!(config.initial_success_rate, 0.5);
        assert_eq!(config.reproduction_threshold, 0.75);
        assert_eq!(config.replay_window, 5);
        assert!(!config.dry_run);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_presets_are_valid() {
        assert!(MinerConfig::strict().validate().is_ok());
        assert!(MinerConfig::lenient().validate().is_ok());
        assert!(MinerConfig::strict().ema_alpha > MinerConfig::lenient().ema_alpha);
    }

    #[test]
    fn test_out_of_range_values_rejected() {
        let config = MinerConfig { ema_alpha: 0.0, ..Default::default() };
        assert!(config.validate().is_err());

        let config = MinerConfig { success_floor: 1.5, ..Default::default() };
        assert!(config.validate().is_err());

        let config = MinerConfig {
            initial_success_rate: 0.1,
            success_floor: 0.2,
            ..Default::default()
        };
        assert!(config.validate().unwrap_err().contains("initial_success_rate"));
    }

    #[test]
    fn test_interval() {
        assert_eq!(MinerConfig::default().interval(), Duration::from_secs(3600));
    }

    #[test]
    fn test_toml_round_trip() {
        let config = MinerConfig::strict();
        let parsed = MinerConfig::from_toml(&config.to_toml().unwrap()).unwrap();
        assert_eq!(parsed, config);

        let partial_toml = "ema_alpha = 0.5\nreplay_window = 0\nlocale = \"en\"\n";
        let partial = MinerConfig::from_toml(partial_toml).unwrap();
        assert_eq!(partial.ema_alpha, 0.5);
        assert_eq!(partial.replay_window, 0);
        assert_eq!(partial.locale, Locale::En);
        assert_eq!(partial.success_floor, 0.2);
    }
}
