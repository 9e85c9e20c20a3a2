//! Mock audio feature source for testing.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use vivascore_core::model::AudioFeatures;
use vivascore_core::traits::{AudioFeatureSource, FeatureRequest};

use crate::error::SourceError;

/// A mock feature source for exercising the engine without a feature service.
///
/// Returns configured features by answer id, with an optional artificial
/// delay to test deadlines.
pub struct MockFeatureSource {
    /// Map of answer id → features.
    features: HashMap<String, AudioFeatures>,
    /// Returned when no answer id matches; `None` means "not found".
    default_features: Option<AudioFeatures>,
    delay: Option<Duration>,
    call_count: AtomicU32,
    last_request: Mutex<Option<FeatureRequest>>,
}

impl MockFeatureSource {
    /// Create a mock with per-answer features.
    pub fn new(features: HashMap<String, AudioFeatures>) -> Self {
        Self {
            features,
            default_features: None,
            delay: None,
            call_count: AtomicU32::new(0),
            last_request: Mutex::new(None),
        }
    }

    /// Create a mock that always returns the same features.
    pub fn with_fixed_features(features: AudioFeatures) -> Self {
        Self {
            default_features: Some(features),
            ..Self::new(HashMap::new())
        }
    }

    /// Sleep for `delay` before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Get the number of calls made to this source.
    pub fn call_count(&self) -> u32 {
        self.call_count.load(Ordering::Relaxed)
    }

    /// Get the last request made to this source.
    pub fn last_request(&self) -> Option<FeatureRequest> {
        self.last_request
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

#[async_trait]
impl AudioFeatureSource for MockFeatureSource {
    fn name(&self) -> &str {
        "mock"
    }

    async fn features(&self, request: &FeatureRequest) -> anyhow::Result<AudioFeatures> {
        self.call_count.fetch_add(1, Ordering::Relaxed);
        *self.last_request.lock().unwrap_or_else(|e| e.into_inner()) = Some(request.clone());

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        self.features
            .get(&request.answer_id)
            .or(self.default_features.as_ref())
            .cloned()
            .ok_or_else(|| SourceError::NotFound(request.answer_id.clone()).into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vivascore_core::engine::fetch_features;

    fn slow_speaker() -> AudioFeatures {
        AudioFeatures {
            speaking_rate: Some(80.0),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn returns_features_by_answer_id() {
        let mut map = HashMap::new();
        map.insert("a1".to_string(), slow_speaker());
        let source = MockFeatureSource::new(map);

        let features = source.features(&FeatureRequest::new("a1")).await.unwrap();
        assert_eq!(features.speaking_rate, Some(80.0));
        assert!(source.features(&FeatureRequest::new("a2")).await.is_err());
        assert_eq!(source.call_count(), 2);
        assert_eq!(source.last_request().map(|r| r.answer_id), Some("a2".into()));
    }

    #[tokio::test(start_paused = true)]
    async fn delayed_source_hits_deadline() {
        let source =
            MockFeatureSource::with_fixed_features(slow_speaker()).with_delay(Duration::from_secs(10));

        let features =
            fetch_features(&source, &FeatureRequest::new("a1"), Duration::from_secs(1)).await;
        assert!(features.is_empty());

        let features =
            fetch_features(&source, &FeatureRequest::new("a1"), Duration::from_secs(30)).await;
        assert_eq!(features.speaking_rate, Some(80.0));
    }
}
