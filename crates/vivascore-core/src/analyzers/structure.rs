//! Rhetorical structure: introduction, explanation, example, conclusion.

use std::sync::Arc;

use tracing::debug;

use crate::config::StructureWeights;
use crate::error::AnalyzerError;
use crate::lexicon::RuleTables;
use crate::model::{
    ComponentDetection, LogicalFlow, SentenceReport, SentenceType, StructureComponent,
    StructureReport,
};
use crate::text::{char_offset, round_to, snippet, split_sentences, word_count};
use crate::traits::{AnalysisInput, Analyzer};

const EVIDENCE_CONTEXT: usize = 20;
const MAX_EVIDENCE: usize = 2;

pub struct StructureAnalyzer {
    tables: Arc<RuleTables>,
    weights: StructureWeights,
}

impl StructureAnalyzer {
    pub fn new(tables: Arc<RuleTables>, weights: StructureWeights) -> Self {
        Self { tables, weights }
    }

    pub fn analyze_structure(&self, transcript: &str) -> StructureReport {
        let components: Vec<ComponentDetection> = self
            .tables
            .structure
            .iter()
            .map(|(component, patterns)| detect(transcript, *component, patterns))
            .collect();

        let in_order = is_canonical_order(&components);
        let detected: Vec<StructureComponent> = components
            .iter()
            .filter(|c| c.detected)
            .map(|c| c.component)
            .collect();

        let mut structure_score = detected
            .iter()
            .fold(0.0, |total, &c| total + self.weight(c));
        if in_order {
            structure_score += self.weights.order_bonus;
        }
        let structure_score = structure_score.min(10.0);

        let issues = identify_issues(&components);
        let suggestions = suggestions(&components, issues.len());
        let logical_flow = match detected.len() {
            0 => LogicalFlow::NoStructure,
            1 => LogicalFlow::MinimalStructure,
            2 => LogicalFlow::BasicStructure,
            3 => LogicalFlow::GoodStructure,
            _ if in_order => LogicalFlow::ExcellentStructure,
            _ => LogicalFlow::DisorganizedStructure,
        };

        let sentences = split_sentences(transcript);
        let sentence_analysis = self.sentence_report(&sentences);

        debug!(
            detected = detected.len(),
            structure_score,
            %logical_flow,
            "structure analyzed"
        );

        StructureReport {
            components,
            structure_score,
            issues,
            suggestions,
            logical_flow,
            total_sentences: sentences.len(),
            sentence_analysis,
        }
    }

    fn weight(&self, component: StructureComponent) -> f64 {
        match component {
            StructureComponent::Introduction => self.weights.introduction,
            StructureComponent::Explanation => self.weights.explanation,
            StructureComponent::Example => self.weights.example,
            StructureComponent::Conclusion => self.weights.conclusion,
        }
    }

    fn sentence_report(&self, sentences: &[&str]) -> SentenceReport {
        if sentences.is_empty() {
            return SentenceReport::default();
        }
        let lengths: Vec<usize> = sentences.iter().map(|s| word_count(s)).collect();
        let n = lengths.len() as f64;
        let avg = lengths.iter().sum::<usize>() as f64 / n;
        let variance = lengths
            .iter()
            .map(|&l| (l as f64 - avg).powi(2))
            .sum::<f64>()
            / n;

        let sentence_types = sentences
            .iter()
            .take(5)
            .map(|s| {
                if self.tables.complex_markers.iter().any(|m| m.is_match(s)) {
                    SentenceType::Complex
                } else if self.tables.compound_markers.iter().any(|m| m.is_match(s)) {
                    SentenceType::Compound
                } else {
                    SentenceType::Simple
                }
            })
            .collect();

        SentenceReport {
            avg_length: round_to(avg, 1),
            length_variance: round_to(variance, 1),
            complex_sentences: lengths.iter().filter(|&&l| l > 20).count(),
            simple_sentences: lengths.iter().filter(|&&l| l < 8).count(),
            sentence_types,
        }
    }
}

/// Earliest match across `patterns`, plus up to two evidence snippets.
fn detect(
    transcript: &str,
    component: StructureComponent,
    patterns: &[regex::Regex],
) -> ComponentDetection {
    let mut first: Option<usize> = None;
    let mut evidence = Vec::new();
    for pattern in patterns {
        for m in pattern.find_iter(transcript) {
            first = Some(first.map_or(m.start(), |f| f.min(m.start())));
            if evidence.len() < MAX_EVIDENCE {
                evidence.push(snippet(transcript, m.start(), m.end(), EVIDENCE_CONTEXT));
            }
        }
    }
    ComponentDetection {
        component,
        detected: first.is_some(),
        position: first.map(|byte| char_offset(transcript, byte)),
        evidence,
    }
}

/// Detected components, sorted by position, never step backwards in the
/// canonical order.
fn is_canonical_order(components: &[ComponentDetection]) -> bool {
    let mut found: Vec<(usize, usize)> = components
        .iter()
        .filter_map(|c| c.position.map(|p| (p, c.component.canonical_index())))
        .collect();
    found.sort();
    found.windows(2).all(|w| w[0].1 <= w[1].1)
}

fn position(components: &[ComponentDetection], component: StructureComponent) -> Option<usize> {
    components
        .iter()
        .find(|c| c.component == component)
        .and_then(|c| c.position)
}

fn identify_issues(components: &[ComponentDetection]) -> Vec<String> {
    let mut issues: Vec<String> = components
        .iter()
        .filter(|c| !c.detected)
        .map(|c| {
            match c.component {
                StructureComponent::Introduction => "Missing clear introduction",
                StructureComponent::Explanation => "Lacks detailed explanation",
                StructureComponent::Example => "No examples provided",
                StructureComponent::Conclusion => "Missing conclusion or summary",
            }
            .to_string()
        })
        .collect();

    let intro = position(components, StructureComponent::Introduction);
    let example = position(components, StructureComponent::Example);
    let explanation = position(components, StructureComponent::Explanation);
    if let (Some(_), Some(example)) = (intro, example) {
        if explanation.map_or(true, |e| e > example) {
            issues.push("Example appears before explanation".to_string());
        }
    }
    issues
}

fn suggestions(components: &[ComponentDetection], issue_count: usize) -> Vec<String> {
    let mut suggestions: Vec<String> = components
        .iter()
        .filter(|c| !c.detected)
        .map(|c| {
            match c.component {
                StructureComponent::Introduction => "Start with a clear definition or overview",
                StructureComponent::Explanation => {
                    "Provide detailed explanation of how things work"
                }
                StructureComponent::Example => {
                    "Include real-world examples to illustrate concepts"
                }
                StructureComponent::Conclusion => "End with a summary or key takeaway",
            }
            .to_string()
        })
        .collect();
    if issue_count > 2 {
        suggestions
            .push("Structure your answer with clear beginning, middle, and end".to_string());
    }
    suggestions
}

impl Default for StructureAnalyzer {
    fn default() -> Self {
        Self::new(RuleTables::shared(), StructureWeights::default())
    }
}

impl Analyzer for StructureAnalyzer {
    type Output = StructureReport;

    fn name(&self) -> &'static str {
        "structure"
    }

    fn analyze(&self, input: &AnalysisInput<'_>) -> Result<StructureReport, AnalyzerError> {
        Ok(self.analyze_structure(input.transcript))
    }
}
