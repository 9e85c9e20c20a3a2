//! Scoring weights and thresholds.
//!
//! Every number the analyzers and the aggregation engine compare against lives
//! here. Defaults reproduce the calibrated heuristics; any field can be
//! overridden from the `[scoring]` table of a config file.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

/// Complete scoring configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub weights: Weights,
    pub clarity: ClarityThresholds,
    pub confidence: ConfidenceThresholds,
    pub technical: TechnicalThresholds,
    pub structure: StructureWeights,
    pub suggestions: SuggestionPolicy,
}

/// Weights of the three dimensions in the overall score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Weights {
    pub technical: f64,
    pub clarity: f64,
    pub confidence: f64,
}

impl Default for Weights {
    fn default() -> Self {
        Self {
            technical: 0.4,
            clarity: 0.3,
            confidence: 0.3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClarityThresholds {
    /// Weighted filler count above which the heavy penalty applies.
    pub heavy_filler: f64,
    pub heavy_filler_penalty: f64,
    pub moderate_filler: f64,
    pub moderate_filler_penalty: f64,
    pub min_sentences: usize,
    pub few_sentences_penalty: f64,
    pub max_avg_sentence_words: f64,
    pub min_avg_sentence_words: f64,
    pub sentence_length_penalty: f64,
    pub no_flow_penalty: f64,
    /// Flow connectives needed for the strength.
    pub strong_flow: usize,
}

impl Default for ClarityThresholds {
    fn default() -> Self {
        Self {
            heavy_filler: 8.0,
            heavy_filler_penalty: 4.0,
            moderate_filler: 4.0,
            moderate_filler_penalty: 2.0,
            min_sentences: 3,
            few_sentences_penalty: 2.0,
            max_avg_sentence_words: 25.0,
            min_avg_sentence_words: 8.0,
            sentence_length_penalty: 1.0,
            no_flow_penalty: 2.0,
            strong_flow: 3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfidenceThresholds {
    pub heavy_hesitation: f64,
    pub heavy_hesitation_penalty: f64,
    pub moderate_hesitation: f64,
    pub moderate_hesitation_penalty: f64,
    pub high_passive_ratio: f64,
    pub high_passive_penalty: f64,
    pub moderate_passive_ratio: f64,
    pub moderate_passive_penalty: f64,
    /// Distinct confident words needed for the strength.
    pub strong_confident_words: usize,
    pub no_confident_words_penalty: f64,
    /// Words per minute.
    pub slow_rate: f64,
    pub fast_rate: f64,
    pub rate_penalty: f64,
    /// Assumed rate when audio is present but carries no rate.
    pub default_speaking_rate: f64,
    pub frequent_long_pauses: u32,
    pub long_pause_penalty: f64,
    pub few_long_pauses: u32,
}

impl Default for ConfidenceThresholds {
    fn default() -> Self {
        Self {
            heavy_hesitation: 5.0,
            heavy_hesitation_penalty: 3.0,
            moderate_hesitation: 2.0,
            moderate_hesitation_penalty: 1.0,
            high_passive_ratio: 0.20,
            high_passive_penalty: 2.0,
            moderate_passive_ratio: 0.15,
            moderate_passive_penalty: 1.0,
            strong_confident_words: 3,
            no_confident_words_penalty: 1.0,
            slow_rate: 100.0,
            fast_rate: 180.0,
            rate_penalty: 1.0,
            default_speaking_rate: 150.0,
            frequent_long_pauses: 3,
            long_pause_penalty: 2.0,
            few_long_pauses: 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TechnicalThresholds {
    pub must_have_points: f64,
    pub good_to_have_points: f64,
    pub red_flag_penalty: f64,
    pub comprehensive_ratio: f64,
    pub good_ratio: f64,
    pub insufficient_ratio: f64,
    /// Matched keywords for "Strong technical vocabulary".
    pub strong_vocabulary: usize,
    /// Matched keywords for "Adequate technical knowledge".
    pub adequate_vocabulary: usize,
    /// Missing concepts named in the issue text.
    pub listed_missing: usize,
    pub keyword_evidence: usize,
}

impl Default for TechnicalThresholds {
    fn default() -> Self {
        Self {
            must_have_points: 2.0,
            good_to_have_points: 1.0,
            red_flag_penalty: 2.0,
            comprehensive_ratio: 0.8,
            good_ratio: 0.6,
            insufficient_ratio: 0.4,
            strong_vocabulary: 7,
            adequate_vocabulary: 4,
            listed_missing: 3,
            keyword_evidence: 5,
        }
    }
}

/// Points awarded per detected structural component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StructureWeights {
    pub introduction: f64,
    pub explanation: f64,
    pub example: f64,
    pub conclusion: f64,
    /// Bonus when detected components appear in canonical order.
    pub order_bonus: f64,
}

impl Default for StructureWeights {
    fn default() -> Self {
        Self {
            introduction: 2.5,
            explanation: 3.0,
            example: 2.0,
            conclusion: 2.5,
            order_bonus: 1.0,
        }
    }
}

/// When the engine turns findings into suggestions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SuggestionPolicy {
    /// Dimension scores below this get targeted suggestions.
    pub score_threshold: f64,
    pub max_suggestions: usize,
    pub filler_count: f64,
    pub hesitation_count: f64,
    pub passive_ratio: f64,
    pub coverage_percentage: f64,
}

impl Default for SuggestionPolicy {
    fn default() -> Self {
        Self {
            score_threshold: 6.0,
            max_suggestions: 5,
            filler_count: 5.0,
            hesitation_count: 3.0,
            passive_ratio: 0.15,
            coverage_percentage: 50.0,
        }
    }
}

impl ScoringConfig {
    /// Parse a standalone scoring TOML document and validate it.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: ScoringConfig =
            toml::from_str(content).context("failed to parse scoring config")?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations the engine cannot score with.
    pub fn validate(&self) -> Result<()> {
        let w = &self.weights;
        for (name, value) in [
            ("technical", w.technical),
            ("clarity", w.clarity),
            ("confidence", w.confidence),
        ] {
            if !value.is_finite() || value < 0.0 {
                bail!("weight '{name}' must be a non-negative number, got {value}");
            }
        }
        if w.technical + w.clarity + w.confidence <= 0.0 {
            bail!("at least one dimension weight must be positive");
        }
        if self.suggestions.max_suggestions == 0 {
            bail!("max_suggestions must be at least 1");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_calibration() {
        let config = ScoringConfig::default();
        assert_eq!(config.weights.technical, 0.4);
        assert_eq!(config.structure.explanation, 3.0);
        assert_eq!(config.suggestions.max_suggestions, 5);
        config.validate().unwrap();
    }

    #[test]
    fn partial_override() {
        let config = ScoringConfig::from_toml_str(
            r#"
[weights]
technical = 0.5
clarity = 0.25
confidence = 0.25

[clarity]
heavy_filler = 10.0
"#,
        )
        .unwrap();
        assert_eq!(config.weights.technical, 0.5);
        assert_eq!(config.clarity.heavy_filler, 10.0);
        assert_eq!(config.clarity.moderate_filler, 4.0);
        assert_eq!(config.confidence, ConfidenceThresholds::default());
    }

    #[test]
    fn negative_weight_rejected() {
        let err = ScoringConfig::from_toml_str("[weights]\nclarity = -1.0\n").unwrap_err();
        assert!(format!("{err:#}").contains("clarity"));
    }

    #[test]
    fn all_zero_weights_rejected() {
        let toml = "[weights]\ntechnical = 0.0\nclarity = 0.0\nconfidence = 0.0\n";
        assert!(ScoringConfig::from_toml_str(toml).is_err());
    }

    #[test]
    fn zero_max_suggestions_rejected() {
        let toml = "[suggestions]\nmax_suggestions = 0\n";
        assert!(ScoringConfig::from_toml_str(toml).is_err());
    }
}
