//! Batch report types with JSON persistence and regression detection.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::model::{Evaluation, QuestionBank, Session};
use crate::statistics::BatchStats;

/// A complete batch evaluation report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchReport {
    /// Unique report identifier.
    pub id: Uuid,
    /// When the report was created.
    pub created_at: DateTime<Utc>,
    /// The interview session the answers came from.
    pub session: Session,
    /// Summary of the question bank used for rubrics.
    pub bank: BankSummary,
    /// One record per evaluated answer, in answer-set order.
    pub records: Vec<AnswerRecord>,
    /// Aggregate statistics.
    pub stats: BatchStats,
    /// Total wall-clock duration in milliseconds.
    pub duration_ms: u64,
}

/// Summary of a question bank (without the questions themselves).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BankSummary {
    pub id: String,
    pub name: String,
    pub question_count: usize,
}

impl From<&QuestionBank> for BankSummary {
    fn from(bank: &QuestionBank) -> Self {
        Self {
            id: bank.id.clone(),
            name: bank.name.clone(),
            question_count: bank.questions.len(),
        }
    }
}

/// The evaluation of one answer in a batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerRecord {
    pub answer_id: String,
    pub question_id: u32,
    pub evaluation: Evaluation,
}

impl BatchReport {
    /// Save the report as JSON to a file.
    pub fn save_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("failed to serialize report")?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, json)
            .with_context(|| format!("failed to write report to {}", path.display()))?;
        Ok(())
    }

    /// Load a report from a JSON file.
    pub fn load_json(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read report from {}", path.display()))?;
        let report: BatchReport =
            serde_json::from_str(&content).context("failed to parse report JSON")?;
        Ok(report)
    }

    /// Compare this report against a baseline, answer by answer.
    ///
    /// `threshold` is in overall-score points; a change no larger than it
    /// counts as unchanged. Degraded evaluations are skipped on both sides.
    pub fn compare(&self, baseline: &BatchReport, threshold: f64) -> RegressionReport {
        let score_map = |report: &BatchReport| -> BTreeMap<String, f64> {
            report
                .records
                .iter()
                .filter(|r| !r.evaluation.is_degraded())
                .map(|r| (r.answer_id.clone(), r.evaluation.result().overall_score))
                .collect()
        };

        let baseline_scores = score_map(baseline);
        let current_scores = score_map(self);

        let mut regressions = Vec::new();
        let mut improvements = Vec::new();
        let mut unchanged = 0usize;
        let mut new_answers = 0usize;

        for (answer_id, &current) in &current_scores {
            let Some(&baseline_score) = baseline_scores.get(answer_id) else {
                new_answers += 1;
                continue;
            };
            let delta = current - baseline_score;
            let change = ScoreChange {
                answer_id: answer_id.clone(),
                baseline_score,
                current_score: current,
                delta,
            };
            if delta < -threshold {
                regressions.push(change);
            } else if delta > threshold {
                improvements.push(change);
            } else {
                unchanged += 1;
            }
        }

        let removed_answers = baseline_scores
            .keys()
            .filter(|k| !current_scores.contains_key(*k))
            .count();

        RegressionReport {
            regressions,
            improvements,
            unchanged,
            new_answers,
            removed_answers,
        }
    }
}

/// Result of comparing two batch reports.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegressionReport {
    /// Answers whose overall score went down.
    pub regressions: Vec<ScoreChange>,
    /// Answers whose overall score went up.
    pub improvements: Vec<ScoreChange>,
    /// Answers with no significant change.
    pub unchanged: usize,
    /// Answers in current but not baseline.
    pub new_answers: usize,
    /// Answers in baseline but not current.
    pub removed_answers: usize,
}

/// An overall-score change for one answer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreChange {
    pub answer_id: String,
    pub baseline_score: f64,
    pub current_score: f64,
    pub delta: f64,
}

impl RegressionReport {
    /// Format the regression report as markdown.
    pub fn to_markdown(&self) -> String {
        let mut md = String::new();

        md.push_str(&format!(
            "**Summary:** {} regressions, {} improvements, {} unchanged, {} new, {} removed\n\n",
            self.regressions.len(),
            self.improvements.len(),
            self.unchanged,
            self.new_answers,
            self.removed_answers
        ));

        if !self.regressions.is_empty() {
            md.push_str("### Regressions\n\n");
            md.push_str(&change_table(&self.regressions));
            md.push('\n');
        }

        if !self.improvements.is_empty() {
            md.push_str("### Improvements\n\n");
            md.push_str(&change_table(&self.improvements));
        }

        md
    }

    /// Returns true if there are any regressions.
    pub fn has_regressions(&self) -> bool {
        !self.regressions.is_empty()
    }
}

fn change_table(changes: &[ScoreChange]) -> String {
    let mut md = String::from("| Answer | Baseline | Current | Delta |\n");
    md.push_str("|--------|----------|---------|-------|\n");
    for c in changes {
        md.push_str(&format!(
            "| {} | {:.1} | {:.1} | {:+.1} |\n",
            c.answer_id, c.baseline_score, c.current_score, c.delta
        ));
    }
    md
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{fallback_result, Evaluator};
    use crate::statistics::compute_batch_stats;

    fn evaluation(overall: f64) -> Evaluation {
        let mut result = Evaluator::default()
            .evaluate("A queue is first in first out.", None, None)
            .into_result();
        result.overall_score = overall;
        Evaluation::Complete(result)
    }

    fn make_report(records: Vec<(&str, Evaluation)>) -> BatchReport {
        let records: Vec<AnswerRecord> = records
            .into_iter()
            .map(|(id, evaluation)| AnswerRecord {
                answer_id: id.into(),
                question_id: 1,
                evaluation,
            })
            .collect();
        BatchReport {
            id: Uuid::nil(),
            created_at: Utc::now(),
            session: Session {
                id: "s1".into(),
                candidate: None,
            },
            bank: BankSummary {
                id: "test".into(),
                name: "Test".into(),
                question_count: 1,
            },
            stats: compute_batch_stats(&records),
            records,
            duration_ms: 0,
        }
    }

    #[test]
    fn compare_identical_reports() {
        let baseline = make_report(vec![("a1", evaluation(6.0))]);
        let current = make_report(vec![("a1", evaluation(6.0))]);

        let report = current.compare(&baseline, 0.5);
        assert!(report.regressions.is_empty());
        assert!(report.improvements.is_empty());
        assert_eq!(report.unchanged, 1);
    }

    #[test]
    fn compare_with_regression_and_improvement() {
        let baseline = make_report(vec![("a1", evaluation(7.0)), ("a2", evaluation(3.0))]);
        let current = make_report(vec![("a1", evaluation(5.5)), ("a2", evaluation(3.4))]);

        let report = current.compare(&baseline, 0.5);
        assert_eq!(report.regressions.len(), 1);
        assert_eq!(report.regressions[0].answer_id, "a1");
        assert!(report.improvements.is_empty());
        assert_eq!(report.unchanged, 1);
        assert!(report.has_regressions());

        let report = current.compare(&baseline, 0.2);
        assert_eq!(report.improvements.len(), 1);
    }

    #[test]
    fn compare_with_new_and_removed() {
        let baseline = make_report(vec![("old", evaluation(5.0))]);
        let current = make_report(vec![("new", evaluation(5.0))]);

        let report = current.compare(&baseline, 0.5);
        assert_eq!(report.new_answers, 1);
        assert_eq!(report.removed_answers, 1);
    }

    #[test]
    fn degraded_answers_are_skipped() {
        let baseline = make_report(vec![("a1", evaluation(8.0))]);
        let current = make_report(vec![(
            "a1",
            Evaluation::Degraded {
                result: fallback_result(),
                reason: "boom".into(),
            },
        )]);

        let report = current.compare(&baseline, 0.5);
        assert!(report.regressions.is_empty());
        assert_eq!(report.removed_answers, 1);
    }

    #[test]
    fn json_roundtrip() {
        let report = make_report(vec![("a1", evaluation(6.0))]);
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("report.json");

        report.save_json(&path).unwrap();
        let loaded = BatchReport::load_json(&path).unwrap();

        assert_eq!(loaded.bank.id, "test");
        assert_eq!(loaded.records.len(), 1);
        assert_eq!(loaded.records[0].evaluation, report.records[0].evaluation);
    }

    #[test]
    fn markdown_output() {
        let baseline = make_report(vec![("a1", evaluation(7.0))]);
        let current = make_report(vec![("a1", evaluation(4.0))]);

        let md = current.compare(&baseline, 0.5).to_markdown();
        assert!(md.contains("Regressions"));
        assert!(md.contains("| a1 | 7.0 | 4.0 | -3.0 |"));
    }
}
