//! Technical correctness against a rubric, or a keyword list without one.

use std::sync::Arc;

use tracing::debug;

use crate::config::TechnicalThresholds;
use crate::error::AnalyzerError;
use crate::lexicon::RuleTables;
use crate::model::{Rubric, TechnicalMetrics, TechnicalMode, TechnicalScore};
use crate::text::{clamp_score, round_to};
use crate::traits::{AnalysisInput, Analyzer};

pub struct TechnicalScorer {
    tables: Arc<RuleTables>,
    thresholds: TechnicalThresholds,
}

impl TechnicalScorer {
    pub fn new(tables: Arc<RuleTables>, thresholds: TechnicalThresholds) -> Self {
        Self { tables, thresholds }
    }

    /// Score `transcript`, in rubric mode whenever a rubric is given.
    pub fn score(&self, transcript: &str, rubric: Option<&Rubric>) -> TechnicalScore {
        let lower = transcript.to_lowercase();
        let report = match rubric {
            Some(rubric) => self.score_rubric(&lower, rubric),
            None => self.score_keywords(&lower),
        };
        debug!(
            mode = ?report.metrics.mode,
            score = report.score,
            covered = report.metrics.covered_concepts.len(),
            "technical scored"
        );
        report
    }

    fn score_rubric(&self, lower: &str, rubric: &Rubric) -> TechnicalScore {
        let t = &self.thresholds;
        let mut issues = Vec::new();
        let mut strengths = Vec::new();
        let mut covered = Vec::new();
        let mut missing = Vec::new();
        let mut red_flags_found = Vec::new();
        let mut base = 0.0;

        for concept in &rubric.must_have_concepts {
            if lower.contains(&concept.to_lowercase()) {
                base += t.must_have_points;
                covered.push(concept.clone());
            } else {
                missing.push(concept.clone());
            }
        }
        for concept in &rubric.good_to_have_concepts {
            if lower.contains(&concept.to_lowercase()) {
                base += t.good_to_have_points;
                covered.push(concept.clone());
            }
        }
        for flag in &rubric.red_flags {
            if lower.contains(&flag.to_lowercase()) {
                base -= t.red_flag_penalty;
                red_flags_found.push(flag.clone());
            }
        }

        let total = rubric.must_have_concepts.len() + rubric.good_to_have_concepts.len();
        let coverage_ratio = if total > 0 {
            covered.len() as f64 / total as f64
        } else {
            0.0
        };
        if coverage_ratio >= t.comprehensive_ratio {
            strengths.push("Comprehensive coverage of key concepts".to_string());
        } else if coverage_ratio >= t.good_ratio {
            strengths.push("Good coverage of main concepts".to_string());
        } else if coverage_ratio < t.insufficient_ratio {
            issues.push("Insufficient coverage of key concepts".to_string());
        }

        if !missing.is_empty() {
            let listed: Vec<&str> = missing
                .iter()
                .take(t.listed_missing)
                .map(String::as_str)
                .collect();
            issues.push(format!("Missing key concepts: {}", listed.join(", ")));
        }
        if !red_flags_found.is_empty() {
            issues.push(format!(
                "Potential misconceptions: {}",
                red_flags_found.join(", ")
            ));
        }

        let coverage_percentage = coverage_percentage(covered.len(), missing.len());
        TechnicalScore {
            score: clamp_score(base),
            issues,
            evidence: Vec::new(),
            strengths,
            metrics: TechnicalMetrics {
                mode: TechnicalMode::Rubric,
                missing_concepts: missing,
                covered_concepts: covered,
                red_flags_found,
                coverage_percentage,
            },
        }
    }

    fn score_keywords(&self, lower: &str) -> TechnicalScore {
        let t = &self.thresholds;
        let found: Vec<String> = self
            .tables
            .technical_keywords
            .iter()
            .filter(|k| lower.contains(k.as_str()))
            .cloned()
            .collect();

        let mut issues = Vec::new();
        let mut strengths = Vec::new();
        if found.len() >= t.strong_vocabulary {
            strengths.push("Strong technical vocabulary".to_string());
        } else if found.len() >= t.adequate_vocabulary {
            strengths.push("Adequate technical knowledge".to_string());
        } else {
            issues.push("Limited technical terminology".to_string());
        }

        TechnicalScore {
            score: clamp_score(found.len() as f64),
            issues,
            evidence: found.into_iter().take(t.keyword_evidence).collect(),
            strengths,
            // Keyword matches are evidence, not concept coverage.
            metrics: TechnicalMetrics {
                mode: TechnicalMode::Keyword,
                ..Default::default()
            },
        }
    }
}

fn coverage_percentage(covered: usize, missing: usize) -> f64 {
    if covered + missing == 0 {
        0.0
    } else {
        round_to(covered as f64 / (covered + missing) as f64 * 100.0, 1)
    }
}

impl Default for TechnicalScorer {
    fn default() -> Self {
        Self::new(RuleTables::shared(), TechnicalThresholds::default())
    }
}

impl Analyzer for TechnicalScorer {
    type Output = TechnicalScore;

    fn name(&self) -> &'static str {
        "technical"
    }

    fn analyze(&self, input: &AnalysisInput<'_>) -> Result<TechnicalScore, AnalyzerError> {
        Ok(self.score(input.transcript, input.rubric))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hash_rubric() -> Rubric {
        Rubric {
            must_have_concepts: vec!["hash function".into(), "collision".into()],
            good_to_have_concepts: vec!["load factor".into()],
            red_flags: vec!["always constant time".into()],
            ideal_answer: None,
        }
    }

    #[test]
    fn rubric_with_both_must_haves() {
        let transcript = "A Hash Function maps keys to buckets, and a collision is handled \
                          by chaining.";
        let report = TechnicalScorer::default().score(transcript, Some(&hash_rubric()));
        assert_eq!(report.metrics.mode, TechnicalMode::Rubric);
        assert!(report.metrics.missing_concepts.is_empty());
        assert!(report.score >= 4.0);
        assert_eq!(report.metrics.coverage_percentage, 100.0);
        assert!(report
            .strengths
            .contains(&"Good coverage of main concepts".to_string()));
    }

    #[test]
    fn rubric_red_flags_and_missing() {
        let transcript = "Lookups are always constant time.";
        let report = TechnicalScorer::default().score(transcript, Some(&hash_rubric()));
        assert_eq!(report.score, 0.0);
        assert_eq!(report.metrics.red_flags_found, vec!["always constant time"]);
        assert_eq!(
            report.issues,
            vec![
                "Insufficient coverage of key concepts",
                "Missing key concepts: hash function, collision",
                "Potential misconceptions: always constant time",
            ]
        );
        assert_eq!(report.metrics.coverage_percentage, 0.0);
    }

    #[test]
    fn rubric_score_is_capped() {
        let rubric = Rubric {
            must_have_concepts: vec!["a1".into(), "a2".into(), "a3".into(), "a4".into()],
            good_to_have_concepts: vec!["b1".into(), "b2".into(), "b3".into()],
            ..Default::default()
        };
        let report = TechnicalScorer::default().score("a1 a2 a3 a4 b1 b2 b3", Some(&rubric));
        assert_eq!(report.score, 10.0);
    }

    #[test]
    fn rubric_without_concepts_stays_in_rubric_mode() {
        let rubric = Rubric {
            ideal_answer: Some("A hash map hashes each key into a bucket.".into()),
            ..Default::default()
        };
        let report = TechnicalScorer::default()
            .score("hash bucket collision array key value", Some(&rubric));
        assert_eq!(report.metrics.mode, TechnicalMode::Rubric);
        assert_eq!(report.score, 0.0);
        assert_eq!(report.issues, vec!["Insufficient coverage of key concepts"]);
        assert!(report.evidence.is_empty());
        assert_eq!(report.metrics.coverage_percentage, 0.0);
    }

    #[test]
    fn no_rubric_scores_keywords() {
        let transcript = "Each key is hashed into a bucket of the array; a collision uses \
                          chaining and the table will resize past its load factor.";
        let report = TechnicalScorer::default().score(transcript, None);
        assert_eq!(report.metrics.mode, TechnicalMode::Keyword);
        // hash, bucket, collision, array, key, load factor, resize, chaining
        assert_eq!(report.score, 8.0);
        assert_eq!(report.evidence, vec!["hash", "bucket", "collision", "array", "key"]);
        assert!(report.metrics.covered_concepts.is_empty());
        assert_eq!(report.metrics.coverage_percentage, 0.0);
        assert!(report
            .strengths
            .contains(&"Strong technical vocabulary".to_string()));
    }

    #[test]
    fn limited_terminology() {
        let report = TechnicalScorer::default().score("It stores things.", None);
        assert_eq!(report.score, 0.0);
        assert_eq!(report.issues, vec!["Limited technical terminology"]);
        assert_eq!(report.metrics.coverage_percentage, 0.0);
    }
}
