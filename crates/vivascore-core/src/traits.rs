//! Seams between the engine and its analyzers and collaborators.
//!
//! [`Analyzer`] is implemented by the five scorers in this crate and lets the
//! engine hold them behind trait objects. [`AudioFeatureSource`] is the async
//! boundary to whatever extracts voice features from the recorded answer; its
//! implementations live in `vivascore-sources`.

use std::path::PathBuf;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::AnalyzerError;
use crate::model::{AudioFeatures, Rubric};

// ---------------------------------------------------------------------------
// Analyzer trait
// ---------------------------------------------------------------------------

/// Everything an analyzer may look at for one answer.
#[derive(Debug, Clone, Copy)]
pub struct AnalysisInput<'a> {
    pub transcript: &'a str,
    pub rubric: Option<&'a Rubric>,
    audio: Option<&'a AudioFeatures>,
}

impl<'a> AnalysisInput<'a> {
    pub fn new(transcript: &'a str) -> Self {
        Self {
            transcript,
            rubric: None,
            audio: None,
        }
    }

    pub fn with_rubric(mut self, rubric: Option<&'a Rubric>) -> Self {
        self.rubric = rubric;
        self
    }

    pub fn with_audio(mut self, audio: Option<&'a AudioFeatures>) -> Self {
        self.audio = audio;
        self
    }

    /// Audio features, or `None` when absent or empty.
    pub fn audio(&self) -> Option<&'a AudioFeatures> {
        self.audio.filter(|a| !a.is_empty())
    }
}

/// A stateless scorer over one answer.
///
/// Implementations must not keep per-call mutable state: one instance is
/// shared across every concurrent evaluation.
pub trait Analyzer: Send + Sync {
    type Output;

    /// Short lowercase name used in logs and error reports.
    fn name(&self) -> &'static str;

    fn analyze(&self, input: &AnalysisInput<'_>) -> Result<Self::Output, AnalyzerError>;
}

// ---------------------------------------------------------------------------
// Audio feature source
// ---------------------------------------------------------------------------

/// Identifies the answer whose audio features are wanted.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FeatureRequest {
    /// Answer identifier, forwarded to remote sources.
    pub answer_id: String,
    /// Local recording or feature file, if the caller has one.
    #[serde(default)]
    pub audio_path: Option<PathBuf>,
}

impl FeatureRequest {
    pub fn new(answer_id: impl Into<String>) -> Self {
        Self {
            answer_id: answer_id.into(),
            audio_path: None,
        }
    }

    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.audio_path = Some(path.into());
        self
    }
}

/// Collaborator that yields voice features for an answer.
#[async_trait]
pub trait AudioFeatureSource: Send + Sync {
    /// Human-readable source name (e.g. "http").
    fn name(&self) -> &str;

    /// Fetch features for one answer.
    async fn features(&self, request: &FeatureRequest) -> anyhow::Result<AudioFeatures>;
}
