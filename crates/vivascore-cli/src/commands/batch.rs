//! The `vivascore batch` command.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};

use vivascore_core::batch::{BatchConfig, BatchRunner, ProgressReporter};
use vivascore_core::parser;
use vivascore_core::report::{AnswerRecord, BatchReport};
use vivascore_report::html::write_html_report;
use vivascore_sources::{create_source, load_config_from};

/// Console progress reporter.
struct ConsoleReporter;

impl ProgressReporter for ConsoleReporter {
    fn on_answer_start(&self, answer_id: &str, question_id: u32) {
        eprintln!("  Queued: {answer_id} (question {question_id})");
    }

    fn on_answer_complete(&self, record: &AnswerRecord) {
        let status = if record.evaluation.is_degraded() {
            "DEGRADED"
        } else {
            "OK"
        };
        eprintln!(
            "  Done: {} [{}] overall {:.1}",
            record.answer_id,
            status,
            record.evaluation.result().overall_score
        );
    }

    fn on_answer_error(&self, answer_id: &str, error: &str) {
        eprintln!("  ERROR: {answer_id}: {error}");
    }

    fn on_batch_complete(&self, total: usize, completed: usize, degraded: usize, elapsed: Duration) {
        eprintln!(
            "\nComplete: {completed}/{total} evaluated, {degraded} degraded ({:.1}s)",
            elapsed.as_secs_f64()
        );
    }
}

pub async fn execute(
    answers_path: PathBuf,
    bank_path: Option<PathBuf>,
    parallelism: Option<usize>,
    output: Option<PathBuf>,
    format: String,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;

    let parallelism = parallelism.unwrap_or(config.parallelism);
    anyhow::ensure!(parallelism >= 1, "parallelism must be at least 1");

    let formats: Vec<&str> = if format == "all" {
        vec!["json", "html"]
    } else {
        format.split(',').map(str::trim).collect()
    };
    if let Some(unknown) = formats.iter().find(|f| !matches!(**f, "json" | "html")) {
        anyhow::bail!("unknown format '{unknown}', expected json, html or all");
    }

    let bank_path = bank_path
        .or(config.question_bank.clone())
        .context("no question bank given; pass --bank or set question_bank in vivascore.toml")?;
    let bank = parser::parse_question_bank(&bank_path)?;
    let answers = parser::parse_answer_set(&answers_path)?;

    for w in parser::validate_answer_set(&answers, &bank) {
        let prefix = w
            .item_id
            .as_ref()
            .map(|id| format!("[{id}] "))
            .unwrap_or_default();
        eprintln!("Warning: {prefix}{}", w.message);
    }

    let mut runner = BatchRunner::new(
        Arc::new(config.evaluator()?),
        BatchConfig {
            parallelism,
            audio_timeout: config.audio.timeout(),
        },
    );
    if let Some(source) = create_source(&config.audio)? {
        runner = runner.with_source(source);
    }

    eprintln!(
        "vivascore v{} | Evaluating {} answers against '{}'",
        env!("CARGO_PKG_VERSION"),
        answers.answers.len(),
        bank.name
    );
    eprintln!();

    let report = runner.run(&answers, &bank, &ConsoleReporter).await?;

    print_summary(&report);

    let output = output.unwrap_or_else(|| config.output_dir.clone());
    std::fs::create_dir_all(&output)
        .with_context(|| format!("failed to create output directory: {}", output.display()))?;
    let timestamp = chrono::Utc::now().format("%Y-%m-%dT%H%M%S");

    for fmt in &formats {
        match *fmt {
            "json" => {
                let path = output.join(format!("report-{timestamp}.json"));
                report.save_json(&path)?;
                eprintln!("Results saved to: {}", path.display());
            }
            "html" => {
                let path = output.join(format!("report-{timestamp}.html"));
                write_html_report(&report, &path)?;
                eprintln!("HTML report: {}", path.display());
            }
            _ => {}
        }
    }

    Ok(())
}

fn print_summary(report: &BatchReport) {
    use comfy_table::{Cell, Table};

    let mut table = Table::new();
    table.set_header(vec![
        "Answer",
        "Question",
        "Overall",
        "Technical",
        "Clarity",
        "Confidence",
        "Structure",
        "Coverage",
    ]);

    for r in &report.records {
        let e = r.evaluation.result();
        let overall = if r.evaluation.is_degraded() {
            format!("{:.1}*", e.overall_score)
        } else {
            format!("{:.1}", e.overall_score)
        };
        table.add_row(vec![
            Cell::new(&r.answer_id),
            Cell::new(r.question_id),
            Cell::new(overall),
            Cell::new(format!("{:.1}", e.technical.score)),
            Cell::new(format!("{:.1}", e.clarity.score)),
            Cell::new(format!("{:.1}", e.confidence.score)),
            Cell::new(format!("{:.1}", e.structure.structure_score)),
            Cell::new(format!("{:.1}%", e.coverage.coverage_percentage)),
        ]);
    }

    eprintln!("\n{table}");
    eprintln!(
        "Mean overall: {:.2} (min {:.1}, max {:.1})",
        report.stats.overall.mean, report.stats.overall.min, report.stats.overall.max
    );
    if report.stats.degraded > 0 {
        eprintln!("* degraded evaluation, excluded from the mean");
    }
}
