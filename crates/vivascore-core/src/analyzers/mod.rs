//! The five heuristic analyzers.
//!
//! Each analyzer owns an `Arc<RuleTables>` and its slice of
//! [`ScoringConfig`](crate::config::ScoringConfig) and nothing else, so a
//! single instance can be shared by every evaluation.

pub mod clarity;
pub mod confidence;
pub mod coverage;
pub mod structure;
pub mod technical;

pub use clarity::ClarityScorer;
pub use confidence::ConfidenceScorer;
pub use coverage::{jaccard_similarity, CoverageAnalyzer};
pub use structure::StructureAnalyzer;
pub use technical::TechnicalScorer;
