//! The `vivascore evaluate` command.

use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use vivascore_core::model::{Evaluation, EvaluationResult, Rubric};
use vivascore_core::parser;
use vivascore_core::traits::FeatureRequest;
use vivascore_report::generate_markdown;
use vivascore_sources::file::JsonFileSource;
use vivascore_sources::{create_source, load_config_from};

pub async fn execute(
    transcript_path: PathBuf,
    bank_path: Option<PathBuf>,
    question: Option<u32>,
    audio_path: Option<PathBuf>,
    format: String,
    config_path: Option<PathBuf>,
) -> Result<()> {
    anyhow::ensure!(
        matches!(format.as_str(), "text" | "json" | "markdown" | "md"),
        "unknown format '{format}', expected text, json or markdown"
    );

    let config = load_config_from(config_path.as_deref())?;
    let evaluator = config.evaluator()?;
    let transcript = read_transcript(&transcript_path)?;

    let rubric = resolve_rubric(bank_path.or(config.question_bank.clone()), question)?;

    let request = FeatureRequest::new("cli");
    let evaluation = if let Some(path) = audio_path {
        let source = JsonFileSource::default();
        evaluator
            .evaluate_with_source(
                &transcript,
                rubric.as_ref(),
                &source,
                &request.with_path(path),
                config.audio.timeout(),
            )
            .await
    } else if let Some(source) = create_source(&config.audio)? {
        evaluator
            .evaluate_with_source(
                &transcript,
                rubric.as_ref(),
                source.as_ref(),
                &request,
                config.audio.timeout(),
            )
            .await
    } else {
        evaluator.evaluate(&transcript, rubric.as_ref(), None)
    };

    if let Some(reason) = evaluation.degraded_reason() {
        eprintln!("Warning: evaluation degraded ({reason})");
    }

    match format.as_str() {
        "json" => println!("{}", serde_json::to_string_pretty(&evaluation)?),
        "markdown" | "md" => print!("{}", generate_markdown(evaluation.result())),
        _ => print_text(&evaluation),
    }

    Ok(())
}

fn read_transcript(path: &Path) -> Result<String> {
    let transcript = if path == Path::new("-") {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("failed to read transcript from stdin")?;
        buf
    } else {
        std::fs::read_to_string(path)
            .with_context(|| format!("failed to read transcript: {}", path.display()))?
    };
    anyhow::ensure!(!transcript.trim().is_empty(), "transcript is empty");
    Ok(transcript)
}

fn resolve_rubric(bank_path: Option<PathBuf>, question: Option<u32>) -> Result<Option<Rubric>> {
    let Some(question) = question else {
        return Ok(None);
    };
    let bank_path = bank_path.context("--question needs a question bank")?;
    let bank = parser::parse_question_bank(&bank_path)?;
    let rubric = bank
        .rubric(question)
        .with_context(|| format!("question {question} not found in bank '{}'", bank.id))?;
    Ok(Some(rubric.clone()))
}

fn print_text(evaluation: &Evaluation) {
    use comfy_table::{Cell, Table};

    let result: &EvaluationResult = evaluation.result();

    let mut table = Table::new();
    table.set_header(vec!["Dimension", "Score", "Notes"]);
    let notes = |strengths: &[String], issues: &[String]| {
        strengths
            .iter()
            .chain(issues)
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join("; ")
    };
    table.add_row(vec![
        Cell::new("Technical"),
        Cell::new(format!("{:.1}", result.technical.score)),
        Cell::new(notes(&result.technical.strengths, &result.technical.issues)),
    ]);
    table.add_row(vec![
        Cell::new("Clarity"),
        Cell::new(format!("{:.1}", result.clarity.score)),
        Cell::new(notes(&result.clarity.strengths, &result.clarity.issues)),
    ]);
    table.add_row(vec![
        Cell::new("Confidence"),
        Cell::new(format!("{:.1}", result.confidence.score)),
        Cell::new(notes(&result.confidence.strengths, &result.confidence.issues)),
    ]);
    table.add_row(vec![
        Cell::new("Structure"),
        Cell::new(format!("{:.1}", result.structure.structure_score)),
        Cell::new(result.structure.logical_flow.as_str()),
    ]);
    table.add_row(vec![
        Cell::new("Coverage"),
        Cell::new(format!("{:.1}%", result.coverage.coverage_percentage)),
        Cell::new(result.coverage.coverage_quality.as_str()),
    ]);

    println!("{table}");
    println!("\nOverall score: {:.1} / 10", result.overall_score);

    if !result.suggestions.is_empty() {
        println!("\nSuggestions:");
        for (i, s) in result.suggestions.iter().enumerate() {
            println!("  {}. {}", i + 1, s);
        }
    }
}
