//! The `vivascore validate` command.

use std::path::PathBuf;

use anyhow::Result;

use vivascore_core::parser::{self, ValidationWarning};

pub fn execute(bank_path: PathBuf, answers_path: Option<PathBuf>) -> Result<()> {
    let banks = if bank_path.is_dir() {
        parser::load_bank_directory(&bank_path)?
    } else {
        vec![parser::parse_question_bank(&bank_path)?]
    };

    let mut total_warnings = 0;

    for bank in &banks {
        println!("Question bank: {} ({} questions)", bank.name, bank.questions.len());
        let categories: Vec<&str> = bank.categories().into_iter().collect();
        if !categories.is_empty() {
            println!("  Categories: {}", categories.join(", "));
        }

        let warnings = parser::validate_question_bank(bank);
        print_warnings(&warnings);
        total_warnings += warnings.len();
    }

    if let Some(answers_path) = answers_path {
        anyhow::ensure!(
            banks.len() == 1,
            "--answers needs exactly one question bank, found {}",
            banks.len()
        );
        let answers = parser::parse_answer_set(&answers_path)?;
        println!(
            "Answer set: session {} ({} answers)",
            answers.session.id,
            answers.answers.len()
        );
        let warnings = parser::validate_answer_set(&answers, &banks[0]);
        print_warnings(&warnings);
        total_warnings += warnings.len();
    }

    if total_warnings == 0 {
        println!("All question banks valid.");
    } else {
        println!("\n{total_warnings} warning(s) found.");
    }

    Ok(())
}

fn print_warnings(warnings: &[ValidationWarning]) {
    for w in warnings {
        let prefix = w
            .item_id
            .as_ref()
            .map(|id| format!("  [{id}]"))
            .unwrap_or_else(|| "  ".to_string());
        println!("{prefix} WARNING: {}", w.message);
    }
}
