//! Session engine configuration

use serde::Deserialize;

use super::error::ValidationError;

/// How free-form text is mapped onto workflows and branches.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum InterpretationMode {
    /// Deterministic keyword and rule matching only.
    #[default]
    Keyword,
    /// Deterministic first, language oracle when inconclusive.
    Oracle,
}

/// Session engine configuration
#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub interpretation_mode: InterpretationMode,

    /// Minimum keyword score for a workflow match
    #[serde(default = "default_min_keyword_score")]
    pub min_keyword_score: f64,

    /// Minimum number of shared keywords for a workflow match
    #[serde(default = "default_min_shared_keywords")]
    pub min_shared_keywords: usize,

    /// Minimum oracle confidence to accept its workflow choice
    #[serde(default = "default_oracle_confidence_cutoff")]
    pub oracle_confidence_cutoff: f64,

    /// Longest accepted user message, in characters
    #[serde(default = "default_max_message_chars")]
    pub max_message_chars: usize,

    /// Seed the builtin workflows when the workflow source is empty
    #[serde(default = "default_seed_builtin_workflows")]
    pub seed_builtin_workflows: bool,
}

impl EngineConfig {
    /// Validate engine configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !(0.0..=1.0).contains(&self.min_keyword_score) {
            return Err(ValidationError::InvalidThreshold("min_keyword_score"));
        }
        if !(0.0..=1.0).contains(&self.oracle_confidence_cutoff) {
            return Err(ValidationError::InvalidThreshold("oracle_confidence_cutoff"));
        }
        if self.max_message_chars == 0 {
            return Err(ValidationError::InvalidMessageLimit);
        }
        Ok(())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            interpretation_mode: InterpretationMode::default(),
            min_keyword_score: default_min_keyword_score(),
            min_shared_keywords: default_min_shared_keywords(),
            oracle_confidence_cutoff: default_oracle_confidence_cutoff(),
            max_message_chars: default_max_message_chars(),
            seed_builtin_workflows: default_seed_builtin_workflows(),
        }
    }
}

fn default_min_keyword_score() -> f64 {
    0.2
}

fn default_min_shared_keywords() -> usize {
    1
}

fn default_oracle_confidence_cutoff() -> f64 {
    0.7
}

fn default_max_message_chars() -> usize {
    4000
}

fn default_seed_builtin_workflows() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.interpretation_mode, InterpretationMode::Keyword);
        assert_eq!(config.min_keyword_score, 0.2);
        assert_eq!(config.min_shared_keywords, 1);
        assert_eq!(config.oracle_confidence_cutoff, 0.7);
        assert_eq!(config.max_message_chars, 4000);
        assert!(config.seed_builtin_workflows);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_threshold_bounds() {
        let config = EngineConfig {
            min_keyword_score: 1.5,
            ..Default::default()
        };
        assert_eq!(
            config.validate(),
            Err(ValidationError::InvalidThreshold("min_keyword_score"))
        );

        let config = EngineConfig {
            oracle_confidence_cutoff: -0.1,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_message_limit_rejected() {
        let config = EngineConfig {
            max_message_chars: 0,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ValidationError::InvalidMessageLimit));
    }

    #[test]
    fn test_mode_deserializes_lowercase() {
        let mode: InterpretationMode = serde_json::from_str("\"oracle\"").unwrap();
        assert_eq!(mode, InterpretationMode::Oracle);
    }
}
