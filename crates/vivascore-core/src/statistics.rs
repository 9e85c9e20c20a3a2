//! Aggregate statistics over a batch of evaluated answers.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::model::EvaluationResult;
use crate::report::AnswerRecord;
use crate::text::round_to;

/// Mean, minimum and maximum of one score across a batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreSummary {
    pub mean: f64,
    pub min: f64,
    pub max: f64,
}

impl ScoreSummary {
    /// Summarize `values`; all zero when empty.
    pub fn from_values(values: &[f64]) -> Self {
        if values.is_empty() {
            return Self::default();
        }
        let sum: f64 = values.iter().sum();
        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        Self {
            mean: round_to(sum / values.len() as f64, 2),
            min,
            max,
        }
    }
}

/// Statistics for every dimension of a batch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchStats {
    /// Number of answers evaluated.
    pub answers: usize,
    /// Answers whose evaluation fell back to the neutral result.
    pub degraded: usize,
    pub clarity: ScoreSummary,
    pub confidence: ScoreSummary,
    pub technical: ScoreSummary,
    pub structure: ScoreSummary,
    /// Coverage percentage, 0..=100.
    pub coverage: ScoreSummary,
    pub overall: ScoreSummary,
    /// Answers per logical-flow label.
    pub logical_flow: BTreeMap<String, usize>,
    /// Answers per coverage-quality label.
    pub coverage_quality: BTreeMap<String, usize>,
    /// Mean overall score per question.
    pub per_question: BTreeMap<u32, QuestionStats>,
}

/// Statistics for a single question across the batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct QuestionStats {
    pub answers: usize,
    pub mean_overall: f64,
}

/// Compute batch statistics from evaluated answer records.
///
/// Degraded evaluations are counted but excluded from the score summaries and
/// distributions, since their neutral scores say nothing about the answer.
pub fn compute_batch_stats(records: &[AnswerRecord]) -> BatchStats {
    let complete: Vec<(&AnswerRecord, &EvaluationResult)> = records
        .iter()
        .filter(|r| !r.evaluation.is_degraded())
        .map(|r| (r, r.evaluation.result()))
        .collect();

    let summarize = |f: fn(&EvaluationResult) -> f64| -> ScoreSummary {
        let values: Vec<f64> = complete.iter().map(|(_, e)| f(e)).collect();
        ScoreSummary::from_values(&values)
    };

    let mut logical_flow = BTreeMap::new();
    let mut coverage_quality = BTreeMap::new();
    let mut question_scores: BTreeMap<u32, Vec<f64>> = BTreeMap::new();
    for (record, result) in &complete {
        *logical_flow
            .entry(result.structure.logical_flow.to_string())
            .or_insert(0) += 1;
        *coverage_quality
            .entry(result.coverage.coverage_quality.to_string())
            .or_insert(0) += 1;
        question_scores
            .entry(record.question_id)
            .or_default()
            .push(result.overall_score);
    }

    let per_question = question_scores
        .into_iter()
        .map(|(id, scores)| {
            let stats = QuestionStats {
                answers: scores.len(),
                mean_overall: ScoreSummary::from_values(&scores).mean,
            };
            (id, stats)
        })
        .collect();

    BatchStats {
        answers: records.len(),
        degraded: records.len() - complete.len(),
        clarity: summarize(|e| e.clarity.score),
        confidence: summarize(|e| e.confidence.score),
        technical: summarize(|e| e.technical.score),
        structure: summarize(|e| e.structure.structure_score),
        coverage: summarize(|e| e.coverage.coverage_percentage),
        overall: summarize(|e| e.overall_score),
        logical_flow,
        coverage_quality,
        per_question,
    }
}
