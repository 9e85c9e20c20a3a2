//! The `vivascore compare` command.

use std::path::PathBuf;

use anyhow::Result;

use vivascore_core::report::{BatchReport, RegressionReport, ScoreChange};

pub fn execute(
    baseline_path: PathBuf,
    current_path: PathBuf,
    threshold: f64,
    fail_on_regression: bool,
    format: String,
) -> Result<()> {
    anyhow::ensure!(
        threshold.is_finite() && threshold >= 0.0,
        "threshold must be a non-negative number"
    );
    anyhow::ensure!(
        matches!(format.as_str(), "text" | "json" | "markdown" | "md"),
        "unknown format '{format}', expected text, json or markdown"
    );

    let baseline = BatchReport::load_json(&baseline_path)?;
    let current = BatchReport::load_json(&current_path)?;
    let diff = current.compare(&baseline, threshold);

    match format.as_str() {
        "json" => println!("{}", serde_json::to_string_pretty(&diff)?),
        "markdown" | "md" => println!("{}", diff.to_markdown()),
        _ => print_text(&baseline, &current, &diff, threshold),
    }

    if fail_on_regression && diff.has_regressions() {
        eprintln!(
            "{} answer(s) dropped by more than {threshold} points",
            diff.regressions.len()
        );
        std::process::exit(1);
    }

    Ok(())
}

fn print_text(baseline: &BatchReport, current: &BatchReport, diff: &RegressionReport, threshold: f64) {
    use comfy_table::{Cell, Table};

    println!(
        "Baseline: {} ({}), mean overall {:.2}",
        baseline.session.id,
        baseline.created_at.format("%Y-%m-%d %H:%M"),
        baseline.stats.overall.mean
    );
    println!(
        "Current:  {} ({}), mean overall {:.2}",
        current.session.id,
        current.created_at.format("%Y-%m-%d %H:%M"),
        current.stats.overall.mean
    );

    let changes: Vec<(&ScoreChange, &str)> = diff
        .regressions
        .iter()
        .map(|c| (c, "regression"))
        .chain(diff.improvements.iter().map(|c| (c, "improvement")))
        .collect();

    if !changes.is_empty() {
        let mut table = Table::new();
        table.set_header(vec!["Answer", "Baseline", "Current", "Delta", "Change"]);
        for (change, kind) in changes {
            table.add_row(vec![
                Cell::new(&change.answer_id),
                Cell::new(format!("{:.1}", change.baseline_score)),
                Cell::new(format!("{:.1}", change.current_score)),
                Cell::new(format!("{:+.1}", change.delta)),
                Cell::new(kind),
            ]);
        }
        println!("\n{table}");
    }

    println!(
        "\n{} regression(s), {} improvement(s), {} unchanged (threshold {threshold})",
        diff.regressions.len(),
        diff.improvements.len(),
        diff.unchanged
    );
    if diff.new_answers > 0 || diff.removed_answers > 0 {
        println!(
            "{} new answer(s), {} removed or degraded",
            diff.new_answers, diff.removed_answers
        );
    }
}
