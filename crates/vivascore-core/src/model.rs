//! Core data model types for vivascore.
//!
//! These are the records every analyzer produces and the engine aggregates.
//! All of them are plain serde structures so an API or storage layer can
//! serialize an [`EvaluationResult`] directly.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Inputs
// ---------------------------------------------------------------------------

/// Per-question grading criteria supplied by the question bank.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Rubric {
    /// Concepts a complete answer must mention.
    #[serde(default)]
    pub must_have_concepts: Vec<String>,
    /// Concepts that earn bonus credit.
    #[serde(default)]
    pub good_to_have_concepts: Vec<String>,
    /// Known misconceptions; mentioning one is penalized.
    #[serde(default)]
    pub red_flags: Vec<String>,
    /// Optional reference answer used for coverage comparison.
    #[serde(default)]
    pub ideal_answer: Option<String>,
}

impl Rubric {
    /// Returns `true` if the rubric lists no concepts and no red flags.
    ///
    /// An ideal answer alone does not count: it feeds coverage analysis, but
    /// the technical scorer has nothing to award points for.
    pub fn has_no_criteria(&self) -> bool {
        self.must_have_concepts.is_empty()
            && self.good_to_have_concepts.is_empty()
            && self.red_flags.is_empty()
    }

    /// Must-have and good-to-have concepts, in rubric order.
    pub fn expected_concepts(&self) -> impl Iterator<Item = &str> {
        self.must_have_concepts
            .iter()
            .chain(self.good_to_have_concepts.iter())
            .map(String::as_str)
    }
}

/// Voice features derived from the answer's audio by an upstream collaborator.
///
/// Every field is optional. An empty bag is treated exactly like "no audio".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AudioFeatures {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_secs: Option<f64>,
    /// Words per minute.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speaking_rate: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_pauses: Option<u32>,
    /// Pauses longer than one second.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub long_pauses: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avg_pause_duration: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avg_energy: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub energy_variance: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub energy_range: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avg_pitch: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pitch_variance: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pitch_range: Option<f64>,
    /// Any further features the collaborator reports, numeric or nested.
    #[serde(default, flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl AudioFeatures {
    /// Returns `true` if no feature at all is present.
    pub fn is_empty(&self) -> bool {
        self.duration_secs.is_none()
            && self.speaking_rate.is_none()
            && self.total_pauses.is_none()
            && self.long_pauses.is_none()
            && self.avg_pause_duration.is_none()
            && self.avg_energy.is_none()
            && self.energy_variance.is_none()
            && self.energy_range.is_none()
            && self.avg_pitch.is_none()
            && self.pitch_variance.is_none()
            && self.pitch_range.is_none()
            && self.extra.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Question banks and answer sets
// ---------------------------------------------------------------------------

/// Question difficulty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Difficulty::Easy => write!(f, "easy"),
            Difficulty::Medium => write!(f, "medium"),
            Difficulty::Hard => write!(f, "hard"),
        }
    }
}

impl FromStr for Difficulty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "medium" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            other => Err(format!("unknown difficulty: {other}")),
        }
    }
}

/// One interview question with its grading rubric.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub id: u32,
    pub question: String,
    pub category: String,
    pub difficulty: Difficulty,
    pub rubric: Rubric,
}

/// A collection of questions loaded from one bank file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionBank {
    pub id: String,
    pub name: String,
    pub description: String,
    pub questions: Vec<Question>,
}

impl QuestionBank {
    pub fn get(&self, id: u32) -> Option<&Question> {
        self.questions.iter().find(|q| q.id == id)
    }

    /// Rubric for question `id`, if the question exists.
    pub fn rubric(&self, id: u32) -> Option<&Rubric> {
        self.get(id).map(|q| &q.rubric)
    }

    /// Distinct categories, sorted.
    pub fn categories(&self) -> BTreeSet<&str> {
        self.questions.iter().map(|q| q.category.as_str()).collect()
    }

    pub fn difficulties(&self) -> BTreeSet<Difficulty> {
        self.questions.iter().map(|q| q.difficulty).collect()
    }

    /// Questions matching the optional category and difficulty filters.
    pub fn filter<'a>(
        &'a self,
        category: Option<&'a str>,
        difficulty: Option<Difficulty>,
    ) -> impl Iterator<Item = &'a Question> + 'a {
        self.questions.iter().filter(move |q| {
            category.map_or(true, |c| q.category.eq_ignore_ascii_case(c))
                && difficulty.map_or(true, |d| q.difficulty == d)
        })
    }

    pub fn count(&self, category: Option<&str>, difficulty: Option<Difficulty>) -> usize {
        self.filter(category, difficulty).count()
    }
}

/// Who was interviewed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    #[serde(default)]
    pub candidate: Option<String>,
}

/// One recorded answer awaiting evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Answer {
    pub id: String,
    pub question_id: u32,
    pub transcript: String,
    /// Features supplied inline with the answer.
    #[serde(default)]
    pub audio: Option<AudioFeatures>,
    /// Feature file or recording handed to the audio source.
    #[serde(default)]
    pub audio_path: Option<std::path::PathBuf>,
}

/// All answers of one interview session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerSet {
    pub session: Session,
    pub answers: Vec<Answer>,
}

// ---------------------------------------------------------------------------
// Dimension scores (clarity, confidence, technical)
// ---------------------------------------------------------------------------

/// A 0–10 score for one dimension with its supporting findings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DimensionScore<M> {
    /// Score clamped to `[0, 10]`.
    pub score: f64,
    /// Problems found, in detection order.
    pub issues: Vec<String>,
    /// Matched text backing the issues.
    pub evidence: Vec<String>,
    /// Things the answer did well.
    pub strengths: Vec<String>,
    /// Dimension-specific raw measurements.
    #[serde(flatten)]
    pub metrics: M,
}

impl<M: Default> DimensionScore<M> {
    /// A neutral score carrying a single diagnostic issue.
    pub fn neutral(issue: &str) -> Self {
        Self {
            score: 5.0,
            issues: vec![issue.to_string()],
            evidence: Vec::new(),
            strengths: Vec::new(),
            metrics: M::default(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClarityMetrics {
    /// Weighted filler-word tally.
    pub filler_count: f64,
    pub sentence_count: usize,
    pub avg_sentence_length: f64,
    /// Logical-flow connectives found.
    pub flow_count: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceMetrics {
    /// Weighted hesitation-marker tally.
    pub hesitation_count: f64,
    pub passive_ratio: f64,
    /// Distinct confident words present.
    pub confident_words: usize,
    /// Echo of the audio features used, if any.
    #[serde(default)]
    pub voice_metrics: Option<AudioFeatures>,
}

/// How the technical score was derived.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TechnicalMode {
    /// Graded against a rubric.
    Rubric,
    /// No rubric criteria; graded against the static keyword list.
    #[default]
    Keyword,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TechnicalMetrics {
    pub mode: TechnicalMode,
    pub missing_concepts: Vec<String>,
    pub covered_concepts: Vec<String>,
    pub red_flags_found: Vec<String>,
    /// `covered / (covered + missing) * 100`, 0 when both are empty.
    pub coverage_percentage: f64,
}

pub type ClarityScore = DimensionScore<ClarityMetrics>;
pub type ConfidenceScore = DimensionScore<ConfidenceMetrics>;
pub type TechnicalScore = DimensionScore<TechnicalMetrics>;

// ---------------------------------------------------------------------------
// Structure
// ---------------------------------------------------------------------------

/// A rhetorical component of an answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StructureComponent {
    Introduction,
    Explanation,
    Example,
    Conclusion,
}

impl StructureComponent {
    /// All components in canonical order.
    pub const ALL: [StructureComponent; 4] = [
        StructureComponent::Introduction,
        StructureComponent::Explanation,
        StructureComponent::Example,
        StructureComponent::Conclusion,
    ];

    /// Position in the canonical introduction → conclusion order.
    pub fn canonical_index(self) -> usize {
        match self {
            StructureComponent::Introduction => 0,
            StructureComponent::Explanation => 1,
            StructureComponent::Example => 2,
            StructureComponent::Conclusion => 3,
        }
    }
}

impl fmt::Display for StructureComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StructureComponent::Introduction => write!(f, "introduction"),
            StructureComponent::Explanation => write!(f, "explanation"),
            StructureComponent::Example => write!(f, "example"),
            StructureComponent::Conclusion => write!(f, "conclusion"),
        }
    }
}

impl FromStr for StructureComponent {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "introduction" | "intro" => Ok(StructureComponent::Introduction),
            "explanation" => Ok(StructureComponent::Explanation),
            "example" => Ok(StructureComponent::Example),
            "conclusion" => Ok(StructureComponent::Conclusion),
            other => Err(format!("unknown structure component: {other}")),
        }
    }
}

/// Detection result for one component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentDetection {
    pub component: StructureComponent,
    pub detected: bool,
    /// Character offset of the earliest trigger match.
    pub position: Option<usize>,
    /// Up to two snippets of surrounding text.
    pub evidence: Vec<String>,
}

/// Categorical assessment of how an answer is organized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogicalFlow {
    NoStructure,
    MinimalStructure,
    BasicStructure,
    GoodStructure,
    ExcellentStructure,
    DisorganizedStructure,
}

impl LogicalFlow {
    pub fn as_str(self) -> &'static str {
        match self {
            LogicalFlow::NoStructure => "no_structure",
            LogicalFlow::MinimalStructure => "minimal_structure",
            LogicalFlow::BasicStructure => "basic_structure",
            LogicalFlow::GoodStructure => "good_structure",
            LogicalFlow::ExcellentStructure => "excellent_structure",
            LogicalFlow::DisorganizedStructure => "disorganized_structure",
        }
    }
}

impl fmt::Display for LogicalFlow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SentenceType {
    Complex,
    Compound,
    Simple,
}

/// Sentence-level diagnostics. Does not affect any score.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SentenceReport {
    pub avg_length: f64,
    pub length_variance: f64,
    /// Sentences longer than 20 words.
    pub complex_sentences: usize,
    /// Sentences shorter than 8 words.
    pub simple_sentences: usize,
    /// Types of the first five sentences.
    pub sentence_types: Vec<SentenceType>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructureReport {
    /// One entry per component, in canonical order.
    pub components: Vec<ComponentDetection>,
    pub structure_score: f64,
    pub issues: Vec<String>,
    pub suggestions: Vec<String>,
    pub logical_flow: LogicalFlow,
    pub total_sentences: usize,
    pub sentence_analysis: SentenceReport,
}

impl StructureReport {
    /// Detection entry for `component`.
    pub fn component(&self, component: StructureComponent) -> Option<&ComponentDetection> {
        self.components.iter().find(|c| c.component == component)
    }

    /// Returns `true` if `component` was detected.
    pub fn detected(&self, component: StructureComponent) -> bool {
        self.component(component).is_some_and(|c| c.detected)
    }

    /// Number of detected components.
    pub fn detected_count(&self) -> usize {
        self.components.iter().filter(|c| c.detected).count()
    }

    pub(crate) fn fallback() -> Self {
        Self {
            components: StructureComponent::ALL
                .iter()
                .map(|&component| ComponentDetection {
                    component,
                    detected: false,
                    position: None,
                    evidence: Vec::new(),
                })
                .collect(),
            structure_score: 5.0,
            issues: vec!["Structure analysis failed".to_string()],
            suggestions: Vec::new(),
            logical_flow: LogicalFlow::NoStructure,
            total_sentences: 0,
            sentence_analysis: SentenceReport::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// Coverage
// ---------------------------------------------------------------------------

/// Bucketed coverage percentage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoverageQuality {
    Excellent,
    VeryGood,
    Good,
    Adequate,
    Poor,
    VeryPoor,
}

impl CoverageQuality {
    pub fn from_percentage(percentage: f64) -> Self {
        if percentage >= 90.0 {
            CoverageQuality::Excellent
        } else if percentage >= 75.0 {
            CoverageQuality::VeryGood
        } else if percentage >= 60.0 {
            CoverageQuality::Good
        } else if percentage >= 40.0 {
            CoverageQuality::Adequate
        } else if percentage >= 25.0 {
            CoverageQuality::Poor
        } else {
            CoverageQuality::VeryPoor
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            CoverageQuality::Excellent => "excellent",
            CoverageQuality::VeryGood => "very_good",
            CoverageQuality::Good => "good",
            CoverageQuality::Adequate => "adequate",
            CoverageQuality::Poor => "poor",
            CoverageQuality::VeryPoor => "very_poor",
        }
    }
}

impl fmt::Display for CoverageQuality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Bucketed Jaccard similarity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SimilarityRating {
    VeryHigh,
    High,
    Moderate,
    Low,
    VeryLow,
}

impl SimilarityRating {
    pub fn from_jaccard(similarity: f64) -> Self {
        if similarity >= 0.8 {
            SimilarityRating::VeryHigh
        } else if similarity >= 0.6 {
            SimilarityRating::High
        } else if similarity >= 0.4 {
            SimilarityRating::Moderate
        } else if similarity >= 0.2 {
            SimilarityRating::Low
        } else {
            SimilarityRating::VeryLow
        }
    }
}

/// Concept matches for one lexical category.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CategoryBreakdown {
    /// Total matches, duplicates included.
    pub count: usize,
    pub unique_concepts: usize,
    /// Up to five unique concepts, sorted.
    pub concepts: Vec<String>,
}

/// Comparison of the transcript against the rubric's reference answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdealComparison {
    pub jaccard_similarity: f64,
    /// Transcript word count over reference word count.
    pub length_ratio: f64,
    pub common_concepts: Vec<String>,
    pub transcript_only: Vec<String>,
    pub ideal_only: Vec<String>,
    pub similarity_rating: SimilarityRating,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoverageReport {
    pub coverage_percentage: f64,
    pub covered_concepts: BTreeSet<String>,
    pub missing_concepts: BTreeSet<String>,
    pub additional_concepts: BTreeSet<String>,
    pub total_expected: usize,
    pub total_covered: usize,
    pub coverage_quality: CoverageQuality,
    /// Keyed by category name.
    pub concept_analysis: BTreeMap<String, CategoryBreakdown>,
    pub ideal_comparison: Option<IdealComparison>,
    pub suggestions: Vec<String>,
    /// Diagnostics; empty for a normal analysis.
    #[serde(default)]
    pub issues: Vec<String>,
}

impl CoverageReport {
    pub(crate) fn fallback() -> Self {
        Self {
            coverage_percentage: 50.0,
            covered_concepts: BTreeSet::new(),
            missing_concepts: BTreeSet::new(),
            additional_concepts: BTreeSet::new(),
            total_expected: 0,
            total_covered: 0,
            coverage_quality: CoverageQuality::from_percentage(50.0),
            concept_analysis: BTreeMap::new(),
            ideal_comparison: None,
            suggestions: Vec::new(),
            issues: vec!["Coverage analysis failed".to_string()],
        }
    }
}

// ---------------------------------------------------------------------------
// Evaluation
// ---------------------------------------------------------------------------

/// The complete evaluation of one answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationResult {
    pub clarity: ClarityScore,
    pub confidence: ConfidenceScore,
    pub technical: TechnicalScore,
    pub structure: StructureReport,
    pub coverage: CoverageReport,
    /// Weighted overall score, rounded to one decimal.
    pub overall_score: f64,
    /// At most five unique suggestions, most relevant first.
    pub suggestions: Vec<String>,
}

/// Outcome of an evaluation call.
///
/// Both variants carry a well-formed [`EvaluationResult`]; `Degraded` marks a
/// neutral stand-in produced because an analyzer failed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum Evaluation {
    Complete(EvaluationResult),
    Degraded {
        result: EvaluationResult,
        reason: String,
    },
}

impl Evaluation {
    pub fn result(&self) -> &EvaluationResult {
        match self {
            Evaluation::Complete(result) | Evaluation::Degraded { result, .. } => result,
        }
    }

    pub fn into_result(self) -> EvaluationResult {
        match self {
            Evaluation::Complete(result) | Evaluation::Degraded { result, .. } => result,
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, Evaluation::Degraded { .. })
    }

    /// Why the evaluation degraded, if it did.
    pub fn degraded_reason(&self) -> Option<&str> {
        match self {
            Evaluation::Complete(_) => None,
            Evaluation::Degraded { reason, .. } => Some(reason),
        }
    }
}
