//! Remote audio feature service over HTTP.
//!
//! `POST {base_url}/features` with the answer id and recording path, answered
//! with a JSON object of voice features.

use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use serde::Serialize;
use tracing::instrument;

use vivascore_core::model::AudioFeatures;
use vivascore_core::traits::{AudioFeatureSource, FeatureRequest};

use crate::error::SourceError;

const DEFAULT_TIMEOUT_MS: u64 = 5_000;

/// Audio feature source backed by an HTTP feature-extraction service.
pub struct HttpFeatureSource {
    base_url: String,
    api_key: Option<String>,
    client: reqwest::Client,
    timeout_ms: u64,
    max_retries: u32,
    retry_delay: Duration,
}

impl std::fmt::Debug for HttpFeatureSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpFeatureSource")
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "***"))
            .field("timeout_ms", &self.timeout_ms)
            .finish()
    }
}

#[derive(Serialize)]
struct FeaturesRequestBody<'a> {
    answer_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    audio_path: Option<String>,
}

impl HttpFeatureSource {
    pub fn new(base_url: &str, api_key: Option<String>, timeout_ms: Option<u64>) -> anyhow::Result<Self> {
        let timeout_ms = timeout_ms.unwrap_or(DEFAULT_TIMEOUT_MS);
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(timeout_ms))
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.filter(|k| !k.is_empty()),
            client,
            timeout_ms,
            max_retries: 1,
            retry_delay: Duration::from_millis(200),
        })
    }

    /// Retry transient failures up to `max_retries` times.
    pub fn with_retries(mut self, max_retries: u32, retry_delay: Duration) -> Self {
        self.max_retries = max_retries;
        self.retry_delay = retry_delay;
        self
    }

    async fn fetch_once(&self, request: &FeatureRequest) -> Result<AudioFeatures, SourceError> {
        let body = FeaturesRequestBody {
            answer_id: &request.answer_id,
            audio_path: request
                .audio_path
                .as_ref()
                .map(|p| p.display().to_string()),
        };

        let mut builder = self
            .client
            .post(format!("{}/features", self.base_url))
            .json(&body);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                SourceError::Timeout(self.timeout_ms)
            } else if e.is_connect() {
                SourceError::NetworkError(format!(
                    "feature service not reachable at {}",
                    self.base_url
                ))
            } else {
                SourceError::NetworkError(e.to_string())
            }
        })?;

        let status = response.status().as_u16();
        match status {
            401 | 403 => {
                let body = response.text().await.unwrap_or_default();
                return Err(SourceError::AuthenticationFailed(body));
            }
            404 => return Err(SourceError::NotFound(request.answer_id.clone())),
            s if s >= 400 => {
                let body = response.text().await.unwrap_or_default();
                return Err(SourceError::ApiError {
                    status,
                    message: body,
                });
            }
            _ => {}
        }

        response
            .json::<AudioFeatures>()
            .await
            .map_err(|e| SourceError::InvalidData(format!("failed to parse response: {e}")))
    }
}

#[async_trait]
impl AudioFeatureSource for HttpFeatureSource {
    fn name(&self) -> &str {
        "http"
    }

    #[instrument(skip(self, request), fields(answer = %request.answer_id))]
    async fn features(&self, request: &FeatureRequest) -> anyhow::Result<AudioFeatures> {
        let mut delay = self.retry_delay;
        let mut attempt = 0;
        loop {
            match self.fetch_once(request).await {
                Ok(features) => return Ok(features),
                Err(e) if e.is_permanent() || attempt >= self.max_retries => return Err(e.into()),
                Err(e) => {
                    tracing::debug!("retrying feature request after error: {e}");
                    attempt += 1;
                    tokio::time::sleep(delay).await;
                    delay = (delay * 2).min(Duration::from_secs(5));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn successful_fetch() {
        let server = MockServer::start().await;

        let response_body = serde_json::json!({
            "duration_secs": 42.0,
            "speaking_rate": 165.5,
            "long_pauses": 1,
            "avg_energy": 0.02
        });

        Mock::given(method("POST"))
            .and(path("/features"))
            .and(body_partial_json(serde_json::json!({"answer_id": "a1"})))
            .and(header("authorization", "Bearer secret"))
            .respond_with(ResponseTemplate::new(200).set_body_json(&response_body))
            .mount(&server)
            .await;

        let source = HttpFeatureSource::new(&server.uri(), Some("secret".into()), None).unwrap();
        let features = source.features(&FeatureRequest::new("a1")).await.unwrap();
        assert_eq!(features.speaking_rate, Some(165.5));
        assert_eq!(features.long_pauses, Some(1));
        assert_eq!(features.avg_energy, Some(0.02));
    }

    #[tokio::test]
    async fn nested_analysis_objects_are_kept() {
        let server = MockServer::start().await;

        let response_body = serde_json::json!({
            "speaking_rate": 128.0,
            "pause_analysis": {"total_pauses": 6, "long_pauses": 2},
            "pitch_analysis": {"avg_pitch": 190.0}
        });

        Mock::given(method("POST"))
            .and(path("/features"))
            .respond_with(ResponseTemplate::new(200).set_body_json(&response_body))
            .mount(&server)
            .await;

        let source = HttpFeatureSource::new(&server.uri(), None, None).unwrap();
        let features = source.features(&FeatureRequest::new("a2")).await.unwrap();
        assert_eq!(features.speaking_rate, Some(128.0));
        assert_eq!(features.extra["pause_analysis"]["total_pauses"], 6);
    }

    #[tokio::test]
    async fn not_found_is_not_retried() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/features"))
            .respond_with(ResponseTemplate::new(404))
            .expect(1)
            .mount(&server)
            .await;

        let source = HttpFeatureSource::new(&server.uri(), None, None)
            .unwrap()
            .with_retries(3, Duration::from_millis(1));
        let err = source
            .features(&FeatureRequest::new("missing"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("not found"));
    }

    #[tokio::test]
    async fn server_error_is_retried() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/features"))
            .respond_with(ResponseTemplate::new(503).set_body_string("busy"))
            .expect(3)
            .mount(&server)
            .await;

        let source = HttpFeatureSource::new(&server.uri(), None, None)
            .unwrap()
            .with_retries(2, Duration::from_millis(1));
        let err = source.features(&FeatureRequest::new("a1")).await.unwrap_err();
        assert!(err.to_string().contains("HTTP 503"));
    }

    #[tokio::test]
    async fn malformed_body() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/features"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let source = HttpFeatureSource::new(&server.uri(), None, None).unwrap();
        let err = source.features(&FeatureRequest::new("a1")).await.unwrap_err();
        assert!(err.to_string().contains("invalid feature data"));
    }

    #[test]
    fn debug_masks_api_key() {
        let source =
            HttpFeatureSource::new("http://localhost:9000/", Some("secret".into()), None).unwrap();
        let debug = format!("{source:?}");
        assert!(!debug.contains("secret"));
        assert!(debug.contains("http://localhost:9000\""));
    }
}
