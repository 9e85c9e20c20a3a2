//! Expressive clarity: filler words, sentence shape, logical connectives.

use std::sync::Arc;

use tracing::debug;

use crate::config::ClarityThresholds;
use crate::error::AnalyzerError;
use crate::lexicon::RuleTables;
use crate::model::{ClarityMetrics, ClarityScore};
use crate::text::{clamp_score, round_to, split_sentences, word_count};
use crate::traits::{AnalysisInput, Analyzer};

pub struct ClarityScorer {
    tables: Arc<RuleTables>,
    thresholds: ClarityThresholds,
}

impl ClarityScorer {
    pub fn new(tables: Arc<RuleTables>, thresholds: ClarityThresholds) -> Self {
        Self { tables, thresholds }
    }

    pub fn score(&self, transcript: &str) -> ClarityScore {
        let t = &self.thresholds;
        let mut score = 10.0;
        let mut issues = Vec::new();
        let mut evidence = Vec::new();
        let mut strengths = Vec::new();

        // Weighted filler tally, occurrences kept in transcript order.
        let mut filler_count = 0.0;
        let mut occurrences: Vec<(usize, &str)> = Vec::new();
        for filler in self.tables.fillers() {
            let before = occurrences.len();
            occurrences.extend(
                filler
                    .matches(transcript)
                    .map(|m| (m.start(), m.as_str())),
            );
            filler_count += (occurrences.len() - before) as f64 * filler.weight();
        }
        occurrences.sort_by_key(|(start, _)| *start);

        if filler_count > t.heavy_filler {
            score -= t.heavy_filler_penalty;
            issues.push("Excessive filler words detected".to_string());
            evidence.extend(occurrences.iter().take(5).map(|(_, s)| s.to_lowercase()));
        } else if filler_count > t.moderate_filler {
            score -= t.moderate_filler_penalty;
            issues.push("Some filler words present".to_string());
            evidence.extend(occurrences.iter().take(3).map(|(_, s)| s.to_lowercase()));
        } else {
            strengths.push("Minimal use of filler words".to_string());
        }

        let sentences = split_sentences(transcript);
        let avg_sentence_length = if sentences.is_empty() {
            0.0
        } else {
            sentences.iter().map(|s| word_count(s)).sum::<usize>() as f64 / sentences.len() as f64
        };

        if sentences.len() < t.min_sentences {
            score -= t.few_sentences_penalty;
            issues.push("Too few complete sentences".to_string());
        } else if avg_sentence_length > t.max_avg_sentence_words {
            score -= t.sentence_length_penalty;
            issues.push("Sentences too long and complex".to_string());
        } else if avg_sentence_length < t.min_avg_sentence_words {
            score -= t.sentence_length_penalty;
            issues.push("Sentences too short and choppy".to_string());
        } else {
            strengths.push("Good sentence structure and length".to_string());
        }

        let flow_count: usize = self
            .tables
            .flow_words
            .iter()
            .map(|w| w.count(transcript))
            .sum();
        if flow_count == 0 {
            score -= t.no_flow_penalty;
            issues.push("Lacks logical flow indicators".to_string());
        } else if flow_count >= t.strong_flow {
            strengths.push("Good logical flow with transitions".to_string());
        }

        debug!(filler_count, sentences = sentences.len(), flow_count, "clarity scored");

        ClarityScore {
            score: clamp_score(score),
            issues,
            evidence,
            strengths,
            metrics: ClarityMetrics {
                filler_count: round_to(filler_count, 1),
                sentence_count: sentences.len(),
                avg_sentence_length: round_to(avg_sentence_length, 1),
                flow_count,
            },
        }
    }
}

impl Default for ClarityScorer {
    fn default() -> Self {
        Self::new(RuleTables::shared(), ClarityThresholds::default())
    }
}

impl Analyzer for ClarityScorer {
    type Output = ClarityScore;

    fn name(&self) -> &'static str {
        "clarity"
    }

    fn analyze(&self, input: &AnalysisInput<'_>) -> Result<ClarityScore, AnalyzerError> {
        Ok(self.score(input.transcript))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn heavy_fillers_are_penalized() {
        let transcript = "Um, a hash map stores pairs, uh. Um, it uses buckets, uh. \
                          Um, and uh, collisions um happen uh. Then um it uh resizes.";
        let report = ClarityScorer::default().score(transcript);
        assert_eq!(report.metrics.filler_count, 10.0);
        assert!(report.score <= 6.0);
        assert!(report
            .issues
            .contains(&"Excessive filler words detected".to_string()));
        assert_eq!(report.evidence, vec!["um", "uh", "um", "uh", "um"]);
    }

    #[test]
    fn moderate_fillers() {
        let transcript = "Um it is fine. Uh it works. Well, like, it is basically a map. \
                          Um that is all.";
        let report = ClarityScorer::default().score(transcript);
        // um x2, uh, well, like, basically
        assert_eq!(report.metrics.filler_count, 4.1);
        assert!(report.issues.contains(&"Some filler words present".to_string()));
        assert_eq!(report.evidence.len(), 3);
    }

    #[test]
    fn fillers_are_matched_as_whole_words() {
        let transcript = "The umbrella is well known. Something else happens here.";
        let report = ClarityScorer::default().score(transcript);
        // only "well"; "um" inside "umbrella" and "so" inside "something" do not count
        assert_eq!(report.metrics.filler_count, 0.3);
    }

    #[test]
    fn well_formed_answer() {
        let transcript = "First, a hash map stores key value pairs in an array of buckets. \
                          Then a hash function maps every key to one of those buckets. \
                          Because two keys can collide, each bucket keeps a short chain. \
                          Finally, the table resizes when the load factor grows too high.";
        let report = ClarityScorer::default().score(transcript);
        assert_eq!(report.score, 10.0);
        assert!(report.issues.is_empty());
        assert_eq!(report.metrics.sentence_count, 4);
        assert_eq!(report.metrics.flow_count, 4);
        assert!(report
            .strengths
            .contains(&"Good logical flow with transitions".to_string()));
        assert!(report
            .strengths
            .contains(&"Good sentence structure and length".to_string()));
    }

    #[test]
    fn too_few_sentences_and_no_flow() {
        let report = ClarityScorer::default().score("A hash map stores pairs.");
        assert_eq!(report.score, 6.0);
        assert_eq!(
            report.issues,
            vec!["Too few complete sentences", "Lacks logical flow indicators"]
        );
    }

    #[test]
    fn empty_transcript_is_scored() {
        let report = ClarityScorer::default().score("");
        assert_eq!(report.metrics.sentence_count, 0);
        assert_eq!(report.metrics.avg_sentence_length, 0.0);
        assert_eq!(report.score, 6.0);
    }

    #[test]
    fn choppy_sentences() {
        let report = ClarityScorer::default().score("It hashes. Then it stores. It is fast.");
        assert!(report
            .issues
            .contains(&"Sentences too short and choppy".to_string()));
    }
}
