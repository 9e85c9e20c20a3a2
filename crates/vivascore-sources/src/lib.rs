//! vivascore-sources: Audio feature sources and configuration.
//!
//! Implements the `AudioFeatureSource` trait for a remote feature service
//! over HTTP, precomputed JSON feature files, and an in-memory mock, and
//! loads the top-level `vivascore.toml` configuration.

pub mod config;
pub mod error;
pub mod file;
pub mod http;
pub mod mock;

pub use config::{create_source, load_config, load_config_from, AudioConfig, VivascoreConfig};
pub use error::SourceError;
