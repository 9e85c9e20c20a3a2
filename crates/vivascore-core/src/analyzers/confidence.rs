//! Verbal and vocal confidence.
//!
//! Text signals are hesitation markers, passive constructions and assertive
//! vocabulary. When audio features are supplied, speaking rate and long pauses
//! adjust the score as well.

use std::sync::Arc;

use tracing::debug;

use crate::config::ConfidenceThresholds;
use crate::error::AnalyzerError;
use crate::lexicon::RuleTables;
use crate::model::{AudioFeatures, ConfidenceMetrics, ConfidenceScore};
use crate::text::{clamp_score, round_to, tokens};
use crate::traits::{AnalysisInput, Analyzer};

pub struct ConfidenceScorer {
    tables: Arc<RuleTables>,
    thresholds: ConfidenceThresholds,
}

impl ConfidenceScorer {
    pub fn new(tables: Arc<RuleTables>, thresholds: ConfidenceThresholds) -> Self {
        Self { tables, thresholds }
    }

    /// Score `transcript`. Empty audio features are ignored.
    pub fn score(&self, transcript: &str, audio: Option<&AudioFeatures>) -> ConfidenceScore {
        let t = &self.thresholds;
        let audio = audio.filter(|a| !a.is_empty());
        let mut score = 10.0;
        let mut issues = Vec::new();
        let mut evidence = Vec::new();
        let mut strengths = Vec::new();

        let mut hesitation_count = 0.0;
        let mut occurrences: Vec<(usize, &str)> = Vec::new();
        for marker in self.tables.hesitation_markers() {
            let before = occurrences.len();
            occurrences.extend(marker.matches(transcript).map(|m| (m.start(), m.as_str())));
            hesitation_count += (occurrences.len() - before) as f64 * marker.weight();
        }
        occurrences.sort_by_key(|(start, _)| *start);

        if hesitation_count > t.heavy_hesitation {
            score -= t.heavy_hesitation_penalty;
            issues.push("Frequent hesitation markers".to_string());
            evidence.extend(occurrences.iter().take(3).map(|(_, s)| s.to_lowercase()));
        } else if hesitation_count > t.moderate_hesitation {
            score -= t.moderate_hesitation_penalty;
            issues.push("Some hesitation detected".to_string());
        } else {
            strengths.push("Speaks with minimal hesitation".to_string());
        }

        let words = tokens(transcript);
        let passive = words
            .iter()
            .filter(|w| self.tables.passive_indicators.contains(w.as_str()))
            .count();
        let passive_ratio = if words.is_empty() {
            0.0
        } else {
            passive as f64 / words.len() as f64
        };

        if passive_ratio > t.high_passive_ratio {
            score -= t.high_passive_penalty;
            issues.push("Heavy use of passive voice".to_string());
        } else if passive_ratio > t.moderate_passive_ratio {
            score -= t.moderate_passive_penalty;
            issues.push("Some passive language".to_string());
        } else {
            strengths.push("Uses active voice effectively".to_string());
        }

        let confident_words = self
            .tables
            .confident_words
            .iter()
            .filter(|w| w.is_match(transcript))
            .count();
        if confident_words >= t.strong_confident_words {
            strengths.push("Strong confident language".to_string());
        } else if confident_words == 0 {
            score -= t.no_confident_words_penalty;
            issues.push("Lacks confident language".to_string());
        }

        if let Some(features) = audio {
            let rate = features.speaking_rate.unwrap_or(t.default_speaking_rate);
            if rate < t.slow_rate {
                score -= t.rate_penalty;
                issues.push("Speaking too slowly".to_string());
            } else if rate > t.fast_rate {
                score -= t.rate_penalty;
                issues.push("Speaking too quickly".to_string());
            } else {
                strengths.push("Good speaking pace".to_string());
            }

            let long_pauses = features.long_pauses.unwrap_or(0);
            if long_pauses > t.frequent_long_pauses {
                score -= t.long_pause_penalty;
                issues.push("Frequent long pauses".to_string());
            } else if long_pauses <= t.few_long_pauses {
                strengths.push("Smooth delivery with minimal pauses".to_string());
            }
        }

        debug!(
            hesitation_count,
            passive_ratio,
            confident_words,
            has_audio = audio.is_some(),
            "confidence scored"
        );

        ConfidenceScore {
            score: clamp_score(score),
            issues,
            evidence,
            strengths,
            metrics: ConfidenceMetrics {
                hesitation_count: round_to(hesitation_count, 1),
                passive_ratio: round_to(passive_ratio, 2),
                confident_words,
                voice_metrics: audio.cloned(),
            },
        }
    }
}

impl Default for ConfidenceScorer {
    fn default() -> Self {
        Self::new(RuleTables::shared(), ConfidenceThresholds::default())
    }
}

impl Analyzer for ConfidenceScorer {
    type Output = ConfidenceScore;

    fn name(&self) -> &'static str {
        "confidence"
    }

    fn analyze(&self, input: &AnalysisInput<'_>) -> Result<ConfidenceScore, AnalyzerError> {
        Ok(self.score(input.transcript, input.audio()))
    }
}
