//! vivascore-core: Answer analyzers, aggregation engine, and data model.
//!
//! Scores a spoken interview answer on clarity, confidence and technical
//! correctness, analyzes its rhetorical structure and concept coverage, and
//! turns the findings into a short list of suggestions.

pub mod analyzers;
pub mod batch;
pub mod config;
pub mod engine;
pub mod error;
pub mod lexicon;
pub mod model;
pub mod parser;
pub mod report;
pub mod statistics;
pub mod text;
pub mod traits;

pub use config::ScoringConfig;
pub use engine::Evaluator;
pub use error::{AnalyzerError, LexiconError};
pub use lexicon::{Lexicon, RuleTables};
pub use model::{Evaluation, EvaluationResult, Rubric};
