//! Configuration for the Extractor

use crate::locale::Locale;
use mise_domain::{FieldName, HeuristicVersion};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Fixed confidence per heuristic rule type
///
/// These reflect how often each rule type is right on typical cookbook
/// text. A field's candidate carries the constant of the rule that found it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeuristicConfidences {
    /// Title taken from a heading marker or the segment's heading guess
    pub title_heading: f64,
    /// Title taken from the first line that is nothing else
    pub title_first_line: f64,
    /// Title taken from the first line even though it looks structural
    pub title_fallback: f64,
    /// Servings line ("4 Personen")
    pub servings: f64,
    /// Prep or cook time line with a marker word and a duration
    pub time: f64,
    /// Amount plus known unit ("200 g Mehl")
    pub ingredient_with_unit: f64,
    /// Amount without a unit ("2 Eier")
    pub ingredient_without_unit: f64,
    /// Bare line inside an ingredient section ("Salz")
    pub ingredient_in_section: f64,
    /// "1. ..." / "Schritt 2 ..."
    pub step_ordinal: f64,
    /// Bulleted line outside an ingredient section
    pub step_bullet: f64,
    /// Line led or closed by an imperative verb
    pub step_imperative: f64,
    /// Sentence-like line with no other cue
    pub step_prose: f64,
}

impl Default for HeuristicConfidences {
    fn default() -> Self {
        Self {
            title_heading: 0.85,
            title_first_line: 0.7,
            title_fallback: 0.55,
            servings: 0.8,
            time: 0.75,
            ingredient_with_unit: 0.8,
            ingredient_without_unit: 0.6,
            ingredient_in_section: 0.5,
            step_ordinal: 0.85,
            step_bullet: 0.65,
            step_imperative: 0.6,
            step_prose: 0.5,
        }
    }
}

impl HeuristicConfidences {
    fn values(&self) -> [(&'static str, f64); 12] {
        [
            ("title_heading", self.title_heading),
            ("title_first_line", self.title_first_line),
            ("title_fallback", self.title_fallback),
            ("servings", self.servings),
            ("time", self.time),
            ("ingredient_with_unit", self.ingredient_with_unit),
            ("ingredient_without_unit", self.ingredient_without_unit),
            ("ingredient_in_section", self.ingredient_in_section),
            ("step_ordinal", self.step_ordinal),
            ("step_bullet", self.step_bullet),
            ("step_imperative", self.step_imperative),
            ("step_prose", self.step_prose),
        ]
    }
}

/// Configuration for the Extractor
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractorConfig {
    /// Maximum input text length (bytes)
    pub max_text_length: usize,

    /// Vocabulary used by the heuristic and pattern parsers
    pub locale: Locale,

    /// Which heuristic parser generation runs in the chain
    pub heuristic_version: HeuristicVersion,

    /// Fields whose best local confidence is below this go to the fallback
    pub generative_threshold: f64,

    /// Fields the generative fallback may be asked about
    pub fallback_fields: Vec<FieldName>,

    /// Maximum time for one completion call (seconds)
    pub generative_timeout_secs: u64,

    /// Confidence given to schema-valid generative values
    pub generative_confidence: f64,

    /// Upper bound on concurrent completion calls
    pub max_concurrent_completions: usize,

    /// Minimum confidence for a required field to count as complete
    pub confidence_floor: f64,

    /// Blank lines that, followed by a title-like line, start a new recipe
    pub min_gap_lines: usize,

    /// Longest line (in words) still considered title-like
    pub max_title_words: usize,

    /// Attempts to append a training example before dropping it
    pub learning_max_attempts: u32,

    /// Delay before the first learning-log retry (milliseconds); doubles each time
    pub learning_backoff_ms: u64,

    /// Per-rule heuristic confidences
    pub heuristic: HeuristicConfidences,
}

impl ExtractorConfig {
    /// Get the completion timeout as a Duration
    pub fn generative_timeout(&self) -> Duration {
        Duration::from_secs(self.generative_timeout_secs)
    }

    /// Get the initial learning-log backoff as a Duration
    pub fn learning_backoff(&self) -> Duration {
        Duration::from_millis(self.learning_backoff_ms)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.max_text_length == 0 {
            return Err("max_text_length must be greater than 0".to_string());
        }
        for (name, value) in [
            ("generative_threshold", self.generative_threshold),
            ("generative_confidence", self.generative_confidence),
            ("confidence_floor", self.confidence_floor),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(format!("{} must be within [0, 1], got {}", name, value));
            }
        }
        for (name, value) in self.heuristic.values() {
            if !(0.0..=1.0).contains(&value) {
                return Err(format!("heuristic.{} must be within [0, 1], got {}", name, value));
            }
        }
        if self.generative_timeout_secs == 0 {
            return Err("generative_timeout_secs must be greater than 0".to_string());
        }
        if self.max_concurrent_completions == 0 {
            return Err("max_concurrent_completions must be greater than 0".to_string());
        }
        if self.min_gap_lines == 0 {
            return Err("min_gap_lines must be greater than 0".to_string());
        }
        if self.max_title_words == 0 {
            return Err("max_title_words must be greater than 0".to_string());
        }
        if self.learning_max_attempts == 0 {
            return Err("learning_max_attempts must be greater than 0".to_string());
        }
        Ok(())
    }
}

impl Default for ExtractorConfig {
    /// Default configuration with balanced settings
    fn default() -> Self {
        Self {
            max_text_length: 2_000_000,
            locale: Locale::De,
            heuristic_version: HeuristicVersion::V2,
            heuristic: HeuristicConfidences::default(),
            generative_threshold: 0.6,
            fallback_fields: FieldName::ALL.to_vec(),
            generative_timeout_secs: 30,
            generative_confidence: 0.7,
            max_concurrent_completions: 4,
            confidence_floor: 0.5,
            min_gap_lines: 2,
            max_title_words: 8,
            learning_max_attempts: 3,
            learning_backoff_ms: 200,
        }
    }
}

impl ExtractorConfig {
    /// Strict preset: more fields go to review and to the fallback
    pub fn strict() -> Self {
        Self {
            generative_threshold: 0.75,
            confidence_floor: 0.65,
            min_gap_lines: 3,
            max_title_words: 6,
            ..Self::default()
        }
    }

    /// Lenient preset: trust local strategies more, call out less
    pub fn lenient() -> Self {
        Self {
            generative_threshold: 0.45,
            confidence_floor: 0.4,
            generative_timeout_secs: 60,
            max_concurrent_completions: 8,
            learning_max_attempts: 5,
            ..Self::default()
        }
    }

    /// Load configuration from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, String> {
        toml::from_str(toml_str).map_err(|e| format!("Failed to parse TOML: {}", e))
    }

    /// Serialize configuration to TOML string
    pub fn to_toml(&self) -> Result<String, String> {
        toml::to_string_pretty(self).map_err(|e| format!("Failed to serialize to TOML: {}", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(ExtractorConfig::default().validate().is_ok());
    }

    #[test]
    fn test_presets_are_valid() {
        assert!(ExtractorConfig::strict().validate().is_ok());
        assert!(ExtractorConfig::lenient().validate().is_ok());
        let (strict, lenient) = (ExtractorConfig::strict(), ExtractorConfig::lenient());
        assert!(strict.confidence_floor > lenient.confidence_floor);
    }

    #[test]
    fn test_out_of_range_threshold_rejected() {
        let config = ExtractorConfig {
            generative_threshold: 1.5,
            ..Default::default()
        };
        assert!(config.validate().unwrap_err().contains("generative_threshold"));
    }

    #[test]
    fn test_out_of_range_heuristic_constant_rejected() {
        let mut config = ExtractorConfig::default();
        config.heuristic.step_prose = -0.1;
        assert!(config.validate().unwrap_err().contains("step_prose"));
    }

    #[test]
    fn test_zero_pool_rejected() {
        let config = ExtractorConfig {
            max_concurrent_completions: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_toml_round_trip() {
        let config = ExtractorConfig::strict();
        let toml_str = config.to_toml().unwrap();
        let parsed = ExtractorConfig::from_toml(&toml_str).unwrap();
        assert_eq!(parsed.confidence_floor, config.confidence_floor);
        assert_eq!(parsed.heuristic, config.heuristic);
        assert_eq!(parsed.fallback_fields, config.fallback_fields);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let parsed =
            ExtractorConfig::from_toml("locale = \"en\"\ngenerative_threshold = 0.5\n").unwrap();
        assert_eq!(parsed.locale, Locale::En);
        assert_eq!(parsed.generative_threshold, 0.5);
        assert_eq!(parsed.confidence_floor, 0.5);
        assert_eq!(parsed.heuristic_version, HeuristicVersion::V2);
    }
}
