//! Precomputed audio features stored as JSON files.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::instrument;

use vivascore_core::model::AudioFeatures;
use vivascore_core::traits::{AudioFeatureSource, FeatureRequest};

use crate::error::SourceError;

/// Reads features from `request.audio_path`, or from `<dir>/<answer_id>.json`
/// when the request carries no path.
#[derive(Debug, Clone, Default)]
pub struct JsonFileSource {
    dir: Option<PathBuf>,
}

impl JsonFileSource {
    pub fn new(dir: Option<PathBuf>) -> Self {
        Self { dir }
    }

    fn resolve(&self, request: &FeatureRequest) -> Option<PathBuf> {
        match (&request.audio_path, &self.dir) {
            (Some(path), _) => Some(path.clone()),
            (None, Some(dir)) => Some(dir.join(format!("{}.json", request.answer_id))),
            (None, None) => None,
        }
    }
}

async fn read_features(path: &Path) -> Result<AudioFeatures, SourceError> {
    let content = tokio::fs::read_to_string(path).await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            SourceError::NotFound(path.display().to_string())
        } else {
            SourceError::InvalidData(format!("{}: {e}", path.display()))
        }
    })?;
    serde_json::from_str(&content)
        .map_err(|e| SourceError::InvalidData(format!("{}: {e}", path.display())))
}

#[async_trait]
impl AudioFeatureSource for JsonFileSource {
    fn name(&self) -> &str {
        "file"
    }

    #[instrument(skip(self, request), fields(answer = %request.answer_id))]
    async fn features(&self, request: &FeatureRequest) -> anyhow::Result<AudioFeatures> {
        let Some(path) = self.resolve(request) else {
            return Err(SourceError::NotFound(format!(
                "no feature file for answer {}",
                request.answer_id
            ))
            .into());
        };
        Ok(read_features(&path).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn reads_explicit_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.json");
        std::fs::write(&path, r#"{"speaking_rate": 95.0, "long_pauses": 4}"#).unwrap();

        let source = JsonFileSource::default();
        let features = source
            .features(&FeatureRequest::new("a1").with_path(&path))
            .await
            .unwrap();
        assert_eq!(features.speaking_rate, Some(95.0));
        assert_eq!(features.long_pauses, Some(4));
    }

    #[tokio::test]
    async fn falls_back_to_answer_id_in_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a7.json"), r#"{"avg_pitch": 180.0}"#).unwrap();

        let source = JsonFileSource::new(Some(dir.path().to_path_buf()));
        let features = source.features(&FeatureRequest::new("a7")).await.unwrap();
        assert_eq!(features.avg_pitch, Some(180.0));
    }

    #[tokio::test]
    async fn missing_file_and_bad_json() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("bad.json"), "{ nope").unwrap();
        let source = JsonFileSource::new(Some(dir.path().to_path_buf()));

        let err = source.features(&FeatureRequest::new("absent")).await.unwrap_err();
        assert!(err.to_string().contains("not found"));
        let err = source.features(&FeatureRequest::new("bad")).await.unwrap_err();
        assert!(err.to_string().contains("invalid feature data"));

        let err = JsonFileSource::default()
            .features(&FeatureRequest::new("a1"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("no feature file"));
    }
}
