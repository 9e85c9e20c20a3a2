//! Aggregation engine.
//!
//! Fans one answer out to the five analyzers, combines the three scorable
//! dimensions into an overall score and folds every report's findings into a
//! short suggestion list. Any analyzer failure, including a panic, degrades
//! the whole evaluation to a neutral result instead of propagating.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, warn};

use crate::analyzers::{
    ClarityScorer, ConfidenceScorer, CoverageAnalyzer, StructureAnalyzer, TechnicalScorer,
};
use crate::config::ScoringConfig;
use crate::error::AnalyzerError;
use crate::lexicon::RuleTables;
use crate::model::{
    AudioFeatures, ClarityScore, ConfidenceScore, CoverageReport, DimensionScore, Evaluation,
    EvaluationResult, Rubric, StructureReport, TechnicalScore,
};
use crate::text::{clamp_score, round_to};
use crate::traits::{AnalysisInput, Analyzer, AudioFeatureSource, FeatureRequest};

/// The single suggestion returned with a degraded evaluation.
pub const FALLBACK_SUGGESTION: &str = "Please try again or contact support if the issue persists";

type BoxedAnalyzer<O> = Box<dyn Analyzer<Output = O>>;

/// Evaluates answers. Cheap to share behind an `Arc`; holds no per-call state.
pub struct Evaluator {
    clarity: BoxedAnalyzer<ClarityScore>,
    confidence: BoxedAnalyzer<ConfidenceScore>,
    technical: BoxedAnalyzer<TechnicalScore>,
    structure: BoxedAnalyzer<StructureReport>,
    coverage: BoxedAnalyzer<CoverageReport>,
    config: ScoringConfig,
}

impl Evaluator {
    /// Build the five standard analyzers over `tables`.
    pub fn new(tables: Arc<RuleTables>, config: ScoringConfig) -> Self {
        Self {
            clarity: Box::new(ClarityScorer::new(
                Arc::clone(&tables),
                config.clarity.clone(),
            )),
            confidence: Box::new(ConfidenceScorer::new(
                Arc::clone(&tables),
                config.confidence.clone(),
            )),
            technical: Box::new(TechnicalScorer::new(
                Arc::clone(&tables),
                config.technical.clone(),
            )),
            structure: Box::new(StructureAnalyzer::new(
                Arc::clone(&tables),
                config.structure.clone(),
            )),
            coverage: Box::new(CoverageAnalyzer::new(tables)),
            config,
        }
    }

    pub fn with_clarity(mut self, analyzer: impl Analyzer<Output = ClarityScore> + 'static) -> Self {
        self.clarity = Box::new(analyzer);
        self
    }

    pub fn with_confidence(
        mut self,
        analyzer: impl Analyzer<Output = ConfidenceScore> + 'static,
    ) -> Self {
        self.confidence = Box::new(analyzer);
        self
    }

    pub fn with_technical(
        mut self,
        analyzer: impl Analyzer<Output = TechnicalScore> + 'static,
    ) -> Self {
        self.technical = Box::new(analyzer);
        self
    }

    pub fn with_structure(
        mut self,
        analyzer: impl Analyzer<Output = StructureReport> + 'static,
    ) -> Self {
        self.structure = Box::new(analyzer);
        self
    }

    pub fn with_coverage(
        mut self,
        analyzer: impl Analyzer<Output = CoverageReport> + 'static,
    ) -> Self {
        self.coverage = Box::new(analyzer);
        self
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    /// Evaluate one answer. Never fails: analyzer faults yield
    /// [`Evaluation::Degraded`].
    pub fn evaluate(
        &self,
        transcript: &str,
        rubric: Option<&Rubric>,
        audio: Option<&AudioFeatures>,
    ) -> Evaluation {
        let input = AnalysisInput::new(transcript)
            .with_rubric(rubric)
            .with_audio(audio);
        match self.try_evaluate(&input) {
            Ok(result) => Evaluation::Complete(result),
            Err(e) => {
                error!(analyzer = e.analyzer(), "analyzer failed: {e}");
                warn!("returning degraded evaluation");
                Evaluation::Degraded {
                    result: fallback_result(),
                    reason: e.to_string(),
                }
            }
        }
    }

    /// Fetch audio features from `source` under `deadline`, then evaluate.
    ///
    /// A slow or failing source only removes the audio signal; it never fails
    /// or degrades the evaluation.
    pub async fn evaluate_with_source(
        &self,
        transcript: &str,
        rubric: Option<&Rubric>,
        source: &dyn AudioFeatureSource,
        request: &FeatureRequest,
        deadline: Duration,
    ) -> Evaluation {
        let audio = fetch_features(source, request, deadline).await;
        self.evaluate(transcript, rubric, Some(&audio))
    }

    fn try_evaluate(&self, input: &AnalysisInput<'_>) -> Result<EvaluationResult, AnalyzerError> {
        let clarity = run(self.clarity.as_ref(), input)?;
        let confidence = run(self.confidence.as_ref(), input)?;
        let technical = run(self.technical.as_ref(), input)?;
        let structure = run(self.structure.as_ref(), input)?;
        let coverage = run(self.coverage.as_ref(), input)?;

        let overall_score = self.overall_score(technical.score, clarity.score, confidence.score);
        let suggestions =
            self.synthesize_suggestions(&clarity, &confidence, &technical, &structure, &coverage);
        debug!(overall_score, suggestions = suggestions.len(), "evaluation complete");

        Ok(EvaluationResult {
            clarity,
            confidence,
            technical,
            structure,
            coverage,
            overall_score,
            suggestions,
        })
    }

    /// Weighted overall score, one decimal.
    pub fn overall_score(&self, technical: f64, clarity: f64, confidence: f64) -> f64 {
        let w = &self.config.weights;
        let overall = w.technical * technical + w.clarity * clarity + w.confidence * confidence;
        round_to(clamp_score(overall), 1)
    }

    fn synthesize_suggestions(
        &self,
        clarity: &ClarityScore,
        confidence: &ConfidenceScore,
        technical: &TechnicalScore,
        structure: &StructureReport,
        coverage: &CoverageReport,
    ) -> Vec<String> {
        let policy = &self.config.suggestions;
        let mut suggestions: Vec<String> = Vec::new();

        if clarity.score < policy.score_threshold {
            let m = &clarity.metrics;
            if m.filler_count > policy.filler_count {
                suggestions.push("Practice reducing filler words like 'um', 'uh', 'like'".into());
            }
            if m.sentence_count < self.config.clarity.min_sentences {
                suggestions.push("Structure your answer with more complete sentences".into());
            }
            if m.flow_count == 0 {
                suggestions.push(
                    "Use transition words like 'first', 'because' and 'finally' to connect ideas"
                        .into(),
                );
            }
        }

        if confidence.score < policy.score_threshold {
            let m = &confidence.metrics;
            if m.hesitation_count > policy.hesitation_count {
                suggestions.push("Practice your answers to reduce hesitation".into());
            }
            if m.passive_ratio > policy.passive_ratio {
                suggestions.push("Use more active voice to sound more confident".into());
            }
            if m.confident_words == 0 {
                suggestions
                    .push("Include confident language like 'definitely', 'certainly'".into());
            }
        }

        if technical.score < policy.score_threshold {
            let m = &technical.metrics;
            if !m.missing_concepts.is_empty() {
                let listed: Vec<&str> = m
                    .missing_concepts
                    .iter()
                    .take(self.config.technical.listed_missing)
                    .map(String::as_str)
                    .collect();
                suggestions.push(format!("Study these key concepts: {}", listed.join(", ")));
            }
            if m.coverage_percentage < policy.coverage_percentage {
                suggestions.push("Focus on covering the fundamental concepts first".into());
            }
        }

        if !structure.issues.is_empty() {
            suggestions.extend(structure.suggestions.iter().cloned());
        }
        suggestions.extend(coverage.suggestions.iter().cloned());

        dedup_preserving_order(suggestions, policy.max_suggestions)
    }
}

impl Default for Evaluator {
    fn default() -> Self {
        Self::new(RuleTables::shared(), ScoringConfig::default())
    }
}

/// Retrieve audio features, yielding an empty bag on timeout or error.
pub async fn fetch_features(
    source: &dyn AudioFeatureSource,
    request: &FeatureRequest,
    deadline: Duration,
) -> AudioFeatures {
    match tokio::time::timeout(deadline, source.features(request)).await {
        Ok(Ok(features)) => features,
        Ok(Err(e)) => {
            warn!(
                source = source.name(),
                answer = %request.answer_id,
                "audio feature retrieval failed: {e:#}"
            );
            AudioFeatures::default()
        }
        Err(_) => {
            warn!(
                source = source.name(),
                answer = %request.answer_id,
                "audio feature retrieval timed out after {deadline:?}"
            );
            AudioFeatures::default()
        }
    }
}

/// The neutral result used when any analyzer fails.
pub fn fallback_result() -> EvaluationResult {
    EvaluationResult {
        clarity: DimensionScore::neutral("Evaluation failed"),
        confidence: DimensionScore::neutral("Evaluation failed"),
        technical: DimensionScore::neutral("Evaluation failed"),
        structure: StructureReport::fallback(),
        coverage: CoverageReport::fallback(),
        overall_score: 5.0,
        suggestions: vec![FALLBACK_SUGGESTION.to_string()],
    }
}

fn run<O>(
    analyzer: &dyn Analyzer<Output = O>,
    input: &AnalysisInput<'_>,
) -> Result<O, AnalyzerError> {
    match panic::catch_unwind(AssertUnwindSafe(|| analyzer.analyze(input))) {
        Ok(result) => result,
        Err(payload) => Err(AnalyzerError::Panicked {
            analyzer: analyzer.name(),
            message: panic_message(payload.as_ref()),
        }),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

fn dedup_preserving_order(items: Vec<String>, limit: usize) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    items
        .into_iter()
        .filter(|s| seen.insert(s.clone()))
        .take(limit)
        .collect()
}
