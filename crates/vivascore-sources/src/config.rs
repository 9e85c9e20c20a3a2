//! Top-level configuration and audio source factory.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use vivascore_core::config::ScoringConfig;
use vivascore_core::lexicon::{Lexicon, RuleTables};
use vivascore_core::traits::AudioFeatureSource;
use vivascore_core::Evaluator;

use crate::file::JsonFileSource;
use crate::http::HttpFeatureSource;

/// Which audio feature source to use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioSourceKind {
    /// Score on the transcript alone.
    #[default]
    None,
    /// Precomputed JSON feature files.
    File,
    /// Remote feature-extraction service.
    Http,
}

/// `[audio]` section.
///
/// Note: Custom Debug impl masks the API key to prevent accidental exposure in logs.
#[derive(Clone, Serialize, Deserialize)]
pub struct AudioConfig {
    #[serde(rename = "type", default)]
    pub kind: AudioSourceKind,
    /// Directory of `<answer_id>.json` files (file source).
    #[serde(default)]
    pub dir: Option<PathBuf>,
    /// Service base URL (http source).
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub api_key: Option<String>,
    /// Deadline for each feature request.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

impl std::fmt::Debug for AudioConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AudioConfig")
            .field("kind", &self.kind)
            .field("dir", &self.dir)
            .field("url", &self.url)
            .field("api_key", &self.api_key.as_ref().map(|_| "***"))
            .field("timeout_ms", &self.timeout_ms)
            .finish()
    }
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            kind: AudioSourceKind::None,
            dir: None,
            url: None,
            api_key: None,
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl AudioConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

fn default_timeout_ms() -> u64 {
    5_000
}

/// Top-level vivascore configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VivascoreConfig {
    /// Weights, thresholds and deductions.
    #[serde(default)]
    pub scoring: ScoringConfig,
    /// Optional TOML lexicon replacing built-in word tables.
    #[serde(default)]
    pub lexicon_path: Option<PathBuf>,
    #[serde(default)]
    pub audio: AudioConfig,
    /// Default question bank for `evaluate` and `batch`.
    #[serde(default)]
    pub question_bank: Option<PathBuf>,
    /// Max answers evaluated concurrently.
    #[serde(default = "default_parallelism")]
    pub parallelism: usize,
    /// Output directory for reports.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

fn default_parallelism() -> usize {
    4
}
fn default_output_dir() -> PathBuf {
    PathBuf::from("./vivascore-results")
}

impl Default for VivascoreConfig {
    fn default() -> Self {
        Self {
            scoring: ScoringConfig::default(),
            lexicon_path: None,
            audio: AudioConfig::default(),
            question_bank: None,
            parallelism: default_parallelism(),
            output_dir: default_output_dir(),
        }
    }
}

impl VivascoreConfig {
    /// Compile the configured lexicon, or share the built-in tables.
    pub fn rule_tables(&self) -> Result<Arc<RuleTables>> {
        match &self.lexicon_path {
            Some(path) => {
                let lexicon = Lexicon::load(path)?;
                let tables = RuleTables::compile(&lexicon)
                    .with_context(|| format!("invalid lexicon: {}", path.display()))?;
                Ok(Arc::new(tables))
            }
            None => Ok(RuleTables::shared()),
        }
    }

    /// Build an evaluator from the scoring and lexicon settings.
    pub fn evaluator(&self) -> Result<Evaluator> {
        Ok(Evaluator::new(self.rule_tables()?, self.scoring.clone()))
    }
}

/// Resolve environment variable references like `${VAR_NAME}` in a string.
fn resolve_env_vars(s: &str) -> String {
    let mut result = s.to_string();
    while let Some(start) = result.find("${") {
        if let Some(end) = result[start..].find('}') {
            let var_name = &result[start + 2..start + end];
            let value = std::env::var(var_name).unwrap_or_default();
            result = format!(
                "{}{}{}",
                &result[..start],
                value,
                &result[start + end + 1..]
            );
        } else {
            break;
        }
    }
    result
}

/// Load configuration from well-known paths.
///
/// Search order:
/// 1. `vivascore.toml` in the current directory
/// 2. `~/.config/vivascore/config.toml`
///
/// Environment variable override: `VIVASCORE_AUDIO_URL`.
pub fn load_config() -> Result<VivascoreConfig> {
    load_config_from(None)
}

/// Load config from an explicit path, or search the default locations.
pub fn load_config_from(path: Option<&Path>) -> Result<VivascoreConfig> {
    let config_path = if let Some(p) = path {
        if p.exists() {
            Some(p.to_path_buf())
        } else {
            anyhow::bail!("config file not found: {}", p.display());
        }
    } else {
        let local = PathBuf::from("vivascore.toml");
        if local.exists() {
            Some(local)
        } else {
            dirs_path()
                .map(|home| home.join("config.toml"))
                .filter(|global| global.exists())
        }
    };

    let config = match config_path {
        Some(path) => {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            parse_config_str(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?
        }
        None => VivascoreConfig::default(),
    };

    Ok(apply_env_overrides(config))
}

/// Parse and validate a configuration document.
pub fn parse_config_str(content: &str) -> Result<VivascoreConfig> {
    let config: VivascoreConfig = toml::from_str(content)?;
    config.scoring.validate()?;
    if config.parallelism == 0 {
        anyhow::bail!("parallelism must be at least 1");
    }
    Ok(config)
}

fn apply_env_overrides(mut config: VivascoreConfig) -> VivascoreConfig {
    if let Ok(url) = std::env::var("VIVASCORE_AUDIO_URL") {
        config.audio.kind = AudioSourceKind::Http;
        config.audio.url = Some(url);
    }

    config.audio.url = config.audio.url.as_deref().map(resolve_env_vars);
    config.audio.api_key = config.audio.api_key.as_deref().map(resolve_env_vars);
    config
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("vivascore"))
}

/// Create the configured audio feature source, if any.
pub fn create_source(config: &AudioConfig) -> Result<Option<Arc<dyn AudioFeatureSource>>> {
    match config.kind {
        AudioSourceKind::None => Ok(None),
        AudioSourceKind::File => Ok(Some(Arc::new(JsonFileSource::new(config.dir.clone())))),
        AudioSourceKind::Http => {
            let url = config
                .url
                .as_deref()
                .filter(|u| !u.is_empty())
                .context("audio source 'http' requires a url")?;
            let source =
                HttpFeatureSource::new(url, config.api_key.clone(), Some(config.timeout_ms))?;
            Ok(Some(Arc::new(source)))
        }
    }
}
