//! HTML report generator.
//!
//! Produces a self-contained HTML file with all CSS/JS inlined.

use anyhow::Result;
use std::path::Path;

use vivascore_core::report::BatchReport;
use vivascore_core::statistics::ScoreSummary;

/// Escape a string for safe HTML insertion.
pub(crate) fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

/// Generate an HTML report from a batch report.
pub fn generate_html(report: &BatchReport) -> String {
    let mut html = String::new();

    html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n");
    html.push_str("<meta charset=\"utf-8\">\n");
    html.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n");
    html.push_str(&format!(
        "<title>vivascore report: {}</title>\n",
        html_escape(&report.bank.name)
    ));
    html.push_str("<style>\n");
    html.push_str(CSS);
    html.push_str("</style>\n");
    html.push_str("</head>\n<body>\n");

    // Header
    html.push_str("<header>\n");
    html.push_str("<h1>vivascore report</h1>\n");
    let candidate = report
        .session
        .candidate
        .as_deref()
        .map(|c| format!(" | Candidate: <strong>{}</strong>", html_escape(c)))
        .unwrap_or_default();
    html.push_str(&format!(
        "<p class=\"meta\">Session: <strong>{}</strong>{} | Bank: <strong>{}</strong> | {} answers | {}</p>\n",
        html_escape(&report.session.id),
        candidate,
        html_escape(&report.bank.name),
        report.records.len(),
        report.created_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    html.push_str("</header>\n");

    // Summary dashboard
    let stats = &report.stats;
    html.push_str("<section class=\"dashboard\">\n");
    html.push_str("<h2>Summary</h2>\n");
    if stats.degraded > 0 {
        html.push_str(&format!(
            "<p class=\"warning\">{} of {} answers could not be fully evaluated and are excluded from the averages.</p>\n",
            stats.degraded, stats.answers
        ));
    }

    let dimensions = dimension_rows(report);
    html.push_str("<table class=\"summary\">\n");
    html.push_str("<thead><tr><th>Dimension</th><th>Mean</th><th>Min</th><th>Max</th></tr></thead>\n");
    html.push_str("<tbody>\n");
    for (name, summary, _) in &dimensions {
        html.push_str(&format!(
            "<tr><td>{}</td><td>{:.1}</td><td>{:.1}</td><td>{:.1}</td></tr>\n",
            name, summary.mean, summary.min, summary.max
        ));
    }
    html.push_str("</tbody></table>\n");

    if stats.answers > stats.degraded {
        html.push_str(&generate_bar_chart(&dimensions));
    }

    if !stats.logical_flow.is_empty() {
        html.push_str("<h3>Answer structure</h3>\n<ul class=\"distribution\">\n");
        for (label, count) in &stats.logical_flow {
            html.push_str(&format!(
                "<li>{}: {}</li>\n",
                html_escape(&label.replace('_', " ")),
                count
            ));
        }
        html.push_str("</ul>\n");
    }

    html.push_str("</section>\n");

    // Per-answer results
    html.push_str("<section class=\"results\">\n");
    html.push_str("<h2>Answers</h2>\n");
    html.push_str("<table class=\"results-table\" id=\"results\">\n");
    html.push_str("<thead><tr><th onclick=\"sortTable(0)\">Answer</th><th onclick=\"sortTable(1)\">Question</th><th onclick=\"sortTable(2)\">Overall</th><th onclick=\"sortTable(3)\">Clarity</th><th onclick=\"sortTable(4)\">Confidence</th><th onclick=\"sortTable(5)\">Technical</th><th onclick=\"sortTable(6)\">Structure</th><th onclick=\"sortTable(7)\">Coverage</th></tr></thead>\n");
    html.push_str("<tbody>\n");

    for r in &report.records {
        let e = r.evaluation.result();
        let row_class = if r.evaluation.is_degraded() {
            "degraded"
        } else {
            score_class(e.overall_score)
        };
        html.push_str(&format!(
            "<tr class=\"{}\"><td>{}</td><td>{}</td><td>{:.1}</td><td>{:.1}</td><td>{:.1}</td><td>{:.1}</td><td>{:.1}</td><td>{:.1}%</td></tr>\n",
            row_class,
            html_escape(&r.answer_id),
            r.question_id,
            e.overall_score,
            e.clarity.score,
            e.confidence.score,
            e.technical.score,
            e.structure.structure_score,
            e.coverage.coverage_percentage,
        ));
    }

    html.push_str("</tbody></table>\n");
    html.push_str("</section>\n");

    // Suggestions
    html.push_str("<section class=\"feedback\">\n");
    html.push_str("<h2>Feedback</h2>\n");
    for r in &report.records {
        let e = r.evaluation.result();
        html.push_str(&format!(
            "<details>\n<summary>{} (question {}): {:.1}/10</summary>\n",
            html_escape(&r.answer_id),
            r.question_id,
            e.overall_score
        ));
        if let Some(reason) = r.evaluation.degraded_reason() {
            html.push_str(&format!(
                "<p class=\"warning\">Evaluation degraded: {}</p>\n",
                html_escape(reason)
            ));
        }
        let strengths: Vec<&String> = e
            .clarity
            .strengths
            .iter()
            .chain(&e.confidence.strengths)
            .chain(&e.technical.strengths)
            .collect();
        if !strengths.is_empty() {
            html.push_str("<h4>Strengths</h4>\n<ul>\n");
            for s in strengths {
                html.push_str(&format!("<li>{}</li>\n", html_escape(s)));
            }
            html.push_str("</ul>\n");
        }
        if !e.suggestions.is_empty() {
            html.push_str("<h4>Suggestions</h4>\n<ol>\n");
            for s in &e.suggestions {
                html.push_str(&format!("<li>{}</li>\n", html_escape(s)));
            }
            html.push_str("</ol>\n");
        }
        html.push_str("</details>\n");
    }
    html.push_str("</section>\n");

    // Raw JSON
    html.push_str("<section class=\"raw-data\">\n");
    html.push_str("<details>\n<summary>Raw JSON Data</summary>\n");
    html.push_str("<pre><code>");
    html.push_str(&html_escape(
        &serde_json::to_string_pretty(report).unwrap_or_default(),
    ));
    html.push_str("</code></pre>\n");
    html.push_str("</details>\n</section>\n");

    // JavaScript for sorting
    html.push_str("<script>\n");
    html.push_str(JS);
    html.push_str("</script>\n");

    html.push_str("</body>\n</html>");
    html
}

/// Write an HTML report to a file.
pub fn write_html_report(report: &BatchReport, path: &Path) -> Result<()> {
    let html = generate_html(report);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, html)?;
    Ok(())
}

/// (label, summary, mean on a 0..=10 scale)
fn dimension_rows(report: &BatchReport) -> Vec<(&'static str, ScoreSummary, f64)> {
    let s = &report.stats;
    vec![
        ("Overall", s.overall, s.overall.mean),
        ("Technical", s.technical, s.technical.mean),
        ("Clarity", s.clarity, s.clarity.mean),
        ("Confidence", s.confidence, s.confidence.mean),
        ("Structure", s.structure, s.structure.mean),
        ("Coverage %", s.coverage, s.coverage.mean / 10.0),
    ]
}

fn score_class(score: f64) -> &'static str {
    if score >= 7.0 {
        "pass"
    } else if score >= 5.0 {
        "warn"
    } else {
        "fail"
    }
}

fn generate_bar_chart(dimensions: &[(&'static str, ScoreSummary, f64)]) -> String {
    let bar_height = 30;
    let max_width = 400;
    let padding = 10;
    let label_width = 140;

    let total_height = dimensions.len() * (bar_height + padding) + padding;

    let mut svg = format!(
        "<svg width=\"{}\" height=\"{}\" xmlns=\"http://www.w3.org/2000/svg\">\n",
        label_width + max_width + 60,
        total_height
    );

    for (i, (label, _, score)) in dimensions.iter().enumerate() {
        let y = i * (bar_height + padding) + padding;
        let width = (score.clamp(0.0, 10.0) / 10.0 * max_width as f64) as usize;

        let color = if *score >= 7.0 {
            "#22c55e"
        } else if *score >= 5.0 {
            "#eab308"
        } else {
            "#ef4444"
        };

        svg.push_str(&format!(
            "  <text x=\"{}\" y=\"{}\" font-size=\"14\" fill=\"currentColor\" text-anchor=\"end\" dominant-baseline=\"middle\">{}</text>\n",
            label_width - 10,
            y + bar_height / 2,
            html_escape(label)
        ));
        svg.push_str(&format!(
            "  <rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" fill=\"{}\" rx=\"4\"/>\n",
            label_width, y, width, bar_height, color
        ));
        svg.push_str(&format!(
            "  <text x=\"{}\" y=\"{}\" font-size=\"12\" fill=\"currentColor\" dominant-baseline=\"middle\">{:.1}</text>\n",
            label_width + width + 8,
            y + bar_height / 2,
            score
        ));
    }

    svg.push_str("</svg>\n");
    svg
}

const CSS: &str = r#"
:root { --bg: #fff; --fg: #1a1a1a; --border: #e5e7eb; --pass: #dcfce7; --warn: #fef9c3; --fail: #fde2e2; --degraded: #e5e7eb; }
@media (prefers-color-scheme: dark) {
  :root { --bg: #111827; --fg: #f9fafb; --border: #374151; --pass: #064e3b; --warn: #713f12; --fail: #7f1d1d; --degraded: #374151; }
}
body { font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', sans-serif; margin: 0; padding: 2rem; background: var(--bg); color: var(--fg); }
h1, h2 { margin-top: 2rem; }
.meta { color: #6b7280; }
.warning { color: #b45309; }
table { border-collapse: collapse; width: 100%; margin: 1rem 0; }
th, td { border: 1px solid var(--border); padding: 0.5rem 1rem; text-align: left; }
th { background: var(--border); cursor: pointer; }
.pass { background: var(--pass); }
.warn { background: var(--warn); }
.fail { background: var(--fail); }
.degraded { background: var(--degraded); font-style: italic; }
pre { overflow-x: auto; padding: 1rem; background: var(--border); border-radius: 8px; }
code { font-family: 'JetBrains Mono', 'Fira Code', monospace; font-size: 0.85rem; }
details { margin: 1rem 0; }
summary { cursor: pointer; font-weight: bold; }
svg { margin: 1rem 0; }
"#;

const JS: &str = r#"
function sortTable(col) {
  const table = document.getElementById('results');
  const tbody = table.querySelector('tbody');
  const rows = Array.from(tbody.querySelectorAll('tr'));
  const asc = table.dataset.sortCol == col && table.dataset.sortDir == 'asc' ? false : true;
  rows.sort((a, b) => {
    const va = a.cells[col].textContent;
    const vb = b.cells[col].textContent;
    const na = parseFloat(va), nb = parseFloat(vb);
    const cmp = isNaN(na) || isNaN(nb) ? va.localeCompare(vb) : na - nb;
    return asc ? cmp : -cmp;
  });
  table.dataset.sortCol = col;
  table.dataset.sortDir = asc ? 'asc' : 'desc';
  rows.forEach(r => tbody.appendChild(r));
}
"#;
