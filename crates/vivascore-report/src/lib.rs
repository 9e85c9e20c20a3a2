//! vivascore-report: Feedback report generation.
//!
//! Renders batch reports as self-contained HTML and single evaluations as
//! candidate-facing Markdown.

pub mod html;
pub mod markdown;

pub use html::{generate_html, write_html_report};
pub use markdown::generate_markdown;
