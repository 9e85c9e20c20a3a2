//! Analyzer and lexicon error types.
//!
//! Analyzer errors never escape [`Evaluator::evaluate`](crate::engine::Evaluator::evaluate):
//! the engine converts them into a degraded evaluation. They are still typed so
//! the engine can log and report *which* analyzer failed and why.

use thiserror::Error;

/// Errors raised by an individual analyzer.
#[derive(Debug, Clone, Error)]
pub enum AnalyzerError {
    /// The analyzer rejected its input.
    #[error("{analyzer}: invalid input: {message}")]
    InvalidInput {
        analyzer: &'static str,
        message: String,
    },

    /// The analyzer failed while computing its report.
    #[error("{analyzer}: {message}")]
    Failed {
        analyzer: &'static str,
        message: String,
    },

    /// The analyzer panicked; the panic was caught at the engine boundary.
    #[error("{analyzer} panicked: {message}")]
    Panicked {
        analyzer: &'static str,
        message: String,
    },
}

impl AnalyzerError {
    /// Shorthand for [`AnalyzerError::Failed`].
    pub fn failed(analyzer: &'static str, message: impl Into<String>) -> Self {
        AnalyzerError::Failed {
            analyzer,
            message: message.into(),
        }
    }

    /// Name of the analyzer that raised this error.
    pub fn analyzer(&self) -> &'static str {
        match self {
            AnalyzerError::InvalidInput { analyzer, .. }
            | AnalyzerError::Failed { analyzer, .. }
            | AnalyzerError::Panicked { analyzer, .. } => analyzer,
        }
    }
}

/// Errors that can occur when compiling a [`Lexicon`](crate::lexicon::Lexicon)
/// into [`RuleTables`](crate::lexicon::RuleTables).
#[derive(Debug, Error)]
pub enum LexiconError {
    /// A structural or concept pattern is not a valid regular expression.
    #[error("invalid pattern in {table}: {source}")]
    InvalidPattern {
        table: String,
        #[source]
        source: regex::Error,
    },

    /// A weighted entry carries a negative or non-finite weight.
    #[error("invalid weight {weight} for '{phrase}' in {table}")]
    InvalidWeight {
        table: String,
        phrase: String,
        weight: f64,
    },

    /// A table that must not be empty was empty.
    #[error("lexicon table '{0}' is empty")]
    EmptyTable(String),
}
