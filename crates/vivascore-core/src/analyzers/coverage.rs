//! Concept coverage against the rubric and the reference answer.
//!
//! Concepts are lexical: category-term matches, alphabetic words taken in
//! non-overlapping pairs, and rubric concept phrases found verbatim. All sets
//! are ordered so reports are deterministic.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use crate::error::AnalyzerError;
use crate::lexicon::{phrase_regex, RuleTables};
use crate::model::{
    CategoryBreakdown, CoverageQuality, CoverageReport, IdealComparison, Rubric,
    SimilarityRating,
};
use crate::text::{round_to, word_count};
use crate::traits::{AnalysisInput, Analyzer};

static WORD_PAIR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b[a-z]+(?:\s+[a-z]+)?\b").expect("static pattern"));

const NAME: &str = "coverage";

pub struct CoverageAnalyzer {
    tables: Arc<RuleTables>,
}

impl CoverageAnalyzer {
    pub fn new(tables: Arc<RuleTables>) -> Self {
        Self { tables }
    }

    pub fn analyze_coverage(
        &self,
        transcript: &str,
        rubric: Option<&Rubric>,
    ) -> Result<CoverageReport, AnalyzerError> {
        let lower = transcript.to_lowercase();

        let rubric_concepts: BTreeSet<String> = rubric
            .map(|r| {
                r.expected_concepts()
                    .map(|c| c.trim().to_lowercase())
                    .filter(|c| !c.is_empty())
                    .collect()
            })
            .unwrap_or_default();
        let ideal = rubric
            .and_then(|r| r.ideal_answer.as_deref())
            .map(str::trim)
            .filter(|i| !i.is_empty());

        let extracted = self.extract_concepts(&lower);
        let mut transcript_concepts = extracted.clone();
        for concept in &rubric_concepts {
            let re = phrase_regex(concept).map_err(|e| AnalyzerError::InvalidInput {
                analyzer: NAME,
                message: format!("rubric concept '{concept}': {e}"),
            })?;
            if re.is_match(&lower) {
                transcript_concepts.insert(concept.clone());
            }
        }

        let mut expected = rubric_concepts;
        let ideal_concepts = ideal.map(|i| self.extract_concepts(&i.to_lowercase()));
        if let Some(ideal_concepts) = &ideal_concepts {
            expected.extend(ideal_concepts.iter().cloned());
        }

        let covered: BTreeSet<String> =
            transcript_concepts.intersection(&expected).cloned().collect();
        let missing: BTreeSet<String> = expected.difference(&transcript_concepts).cloned().collect();
        let additional: BTreeSet<String> =
            transcript_concepts.difference(&expected).cloned().collect();

        let coverage_percentage = if expected.is_empty() {
            0.0
        } else {
            round_to(covered.len() as f64 / expected.len() as f64 * 100.0, 1)
        };
        let coverage_quality = CoverageQuality::from_percentage(coverage_percentage);

        let ideal_comparison = match (ideal, &ideal_concepts) {
            (Some(ideal), Some(ideal_concepts)) => Some(compare_with_ideal(
                transcript,
                &extracted,
                ideal,
                ideal_concepts,
            )),
            _ => None,
        };

        let mut issues = Vec::new();
        if expected.is_empty() {
            issues.push("No expected concepts to measure coverage against".to_string());
        }
        let suggestions = coverage_suggestions(coverage_quality, &missing);

        debug!(
            coverage_percentage,
            expected = expected.len(),
            covered = covered.len(),
            "coverage analyzed"
        );

        Ok(CoverageReport {
            coverage_percentage,
            total_expected: expected.len(),
            total_covered: covered.len(),
            covered_concepts: covered,
            missing_concepts: missing,
            additional_concepts: additional,
            coverage_quality,
            concept_analysis: self.category_breakdown(&lower),
            ideal_comparison,
            suggestions,
            issues,
        })
    }

    /// Jaccard similarity of the concept sets of two texts. Symmetric.
    pub fn similarity(&self, a: &str, b: &str) -> f64 {
        jaccard_similarity(
            &self.extract_concepts(&a.to_lowercase()),
            &self.extract_concepts(&b.to_lowercase()),
        )
    }

    /// Category matches plus the words of `lower` scanned left to right as
    /// non-overlapping pairs; a word with no partner stands alone.
    pub fn extract_concepts(&self, lower: &str) -> BTreeSet<String> {
        let mut concepts = BTreeSet::new();
        for (_, pattern) in &self.tables.concept_categories {
            concepts.extend(pattern.find_iter(lower).map(|m| m.as_str().to_lowercase()));
        }
        concepts.extend(WORD_PAIR.find_iter(lower).map(|m| m.as_str().to_string()));
        concepts
    }

    fn category_breakdown(&self, lower: &str) -> BTreeMap<String, CategoryBreakdown> {
        self.tables
            .concept_categories
            .iter()
            .map(|(name, pattern)| {
                let matches: Vec<String> = pattern
                    .find_iter(lower)
                    .map(|m| m.as_str().to_lowercase())
                    .collect();
                let unique: BTreeSet<String> = matches.iter().cloned().collect();
                let breakdown = CategoryBreakdown {
                    count: matches.len(),
                    unique_concepts: unique.len(),
                    concepts: unique.into_iter().take(5).collect(),
                };
                (name.clone(), breakdown)
            })
            .collect()
    }
}

/// `|a ∩ b| / |a ∪ b|`, 0 when both sets are empty.
pub fn jaccard_similarity(a: &BTreeSet<String>, b: &BTreeSet<String>) -> f64 {
    let union = a.union(b).count();
    if union == 0 {
        return 0.0;
    }
    a.intersection(b).count() as f64 / union as f64
}

fn compare_with_ideal(
    transcript: &str,
    transcript_concepts: &BTreeSet<String>,
    ideal: &str,
    ideal_concepts: &BTreeSet<String>,
) -> IdealComparison {
    let jaccard = jaccard_similarity(transcript_concepts, ideal_concepts);
    let ideal_words = word_count(ideal);
    let length_ratio = if ideal_words == 0 {
        0.0
    } else {
        word_count(transcript) as f64 / ideal_words as f64
    };
    IdealComparison {
        jaccard_similarity: round_to(jaccard, 3),
        length_ratio: round_to(length_ratio, 2),
        common_concepts: transcript_concepts
            .intersection(ideal_concepts)
            .take(10)
            .cloned()
            .collect(),
        transcript_only: transcript_concepts
            .difference(ideal_concepts)
            .take(5)
            .cloned()
            .collect(),
        ideal_only: ideal_concepts
            .difference(transcript_concepts)
            .take(10)
            .cloned()
            .collect(),
        similarity_rating: SimilarityRating::from_jaccard(jaccard),
    }
}

fn coverage_suggestions(quality: CoverageQuality, missing: &BTreeSet<String>) -> Vec<String> {
    let mut suggestions = Vec::new();
    if matches!(quality, CoverageQuality::Poor | CoverageQuality::VeryPoor) {
        suggestions.push("Focus on covering the fundamental concepts first".to_string());
        suggestions.push("Study the core terminology and definitions".to_string());
    }
    if !missing.is_empty() {
        let top: Vec<&str> = missing.iter().take(3).map(String::as_str).collect();
        suggestions.push(format!("Consider including: {}", top.join(", ")));
    }
    match quality {
        CoverageQuality::Adequate | CoverageQuality::Good => {
            suggestions.push("Add more depth to your explanations".to_string());
            suggestions.push("Include real-world examples to illustrate concepts".to_string());
        }
        CoverageQuality::VeryGood | CoverageQuality::Excellent => {
            suggestions.push("Great coverage! Consider edge cases and advanced topics".to_string());
        }
        CoverageQuality::Poor | CoverageQuality::VeryPoor => {}
    }
    suggestions
}

impl Default for CoverageAnalyzer {
    fn default() -> Self {
        Self::new(RuleTables::shared())
    }
}

impl Analyzer for CoverageAnalyzer {
    type Output = CoverageReport;

    fn name(&self) -> &'static str {
        NAME
    }

    fn analyze(&self, input: &AnalysisInput<'_>) -> Result<CoverageReport, AnalyzerError> {
        self.analyze_coverage(input.transcript, input.rubric)
    }
}
