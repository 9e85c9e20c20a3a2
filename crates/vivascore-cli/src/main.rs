//! vivascore CLI: the user-facing command-line interface.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "vivascore", version, about = "Interview answer evaluator")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate a single answer transcript
    Evaluate {
        /// Transcript file, or "-" for stdin
        #[arg(long)]
        transcript: PathBuf,

        /// Question bank TOML supplying the rubric
        #[arg(long)]
        bank: Option<PathBuf>,

        /// Question id within the bank
        #[arg(long, requires = "bank")]
        question: Option<u32>,

        /// JSON file of precomputed audio features
        #[arg(long)]
        audio: Option<PathBuf>,

        /// Output format: text, json, markdown
        #[arg(long, default_value = "text")]
        format: String,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Evaluate every answer in an answer set
    Batch {
        /// Answer set TOML
        #[arg(long)]
        answers: PathBuf,

        /// Question bank TOML (defaults to `question_bank` from config)
        #[arg(long)]
        bank: Option<PathBuf>,

        /// Max concurrent evaluations
        #[arg(long)]
        parallelism: Option<usize>,

        /// Output directory
        #[arg(long)]
        output: Option<PathBuf>,

        /// Output format: json, html, all
        #[arg(long, default_value = "json")]
        format: String,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Validate question bank TOML files
    Validate {
        /// Path to question bank file or directory
        #[arg(long)]
        bank: PathBuf,

        /// Answer set to check against the bank
        #[arg(long)]
        answers: Option<PathBuf>,
    },

    /// Compare two batch reports
    Compare {
        /// Baseline report JSON
        #[arg(long)]
        baseline: PathBuf,

        /// Current report JSON
        #[arg(long)]
        current: PathBuf,

        /// Regression threshold in overall-score points
        #[arg(long, default_value = "0.5")]
        threshold: f64,

        /// Exit code 1 if regressions found
        #[arg(long)]
        fail_on_regression: bool,

        /// Output format: text, json, markdown
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// Create starter config, question bank and answer set
    Init,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("vivascore=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Evaluate {
            transcript,
            bank,
            question,
            audio,
            format,
            config,
        } => commands::evaluate::execute(transcript, bank, question, audio, format, config).await,
        Commands::Batch {
            answers,
            bank,
            parallelism,
            output,
            format,
            config,
        } => commands::batch::execute(answers, bank, parallelism, output, format, config).await,
        Commands::Validate { bank, answers } => commands::validate::execute(bank, answers),
        Commands::Compare {
            baseline,
            current,
            threshold,
            fail_on_regression,
            format,
        } => commands::compare::execute(baseline, current, threshold, fail_on_regression, format),
        Commands::Init => commands::init::execute(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
