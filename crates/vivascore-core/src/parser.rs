//! TOML question bank and answer set parser.
//!
//! Loads question banks and answer sets from TOML files and directories, and
//! validates them.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::model::{
    Answer, AnswerSet, AudioFeatures, Difficulty, Question, QuestionBank, Rubric, Session,
};

/// Intermediate TOML structure for parsing question bank files.
#[derive(Debug, Deserialize)]
struct TomlBankFile {
    bank: TomlBankHeader,
    #[serde(default)]
    questions: Vec<TomlQuestion>,
}

#[derive(Debug, Deserialize)]
struct TomlBankHeader {
    id: String,
    name: String,
    #[serde(default)]
    description: String,
}

#[derive(Debug, Deserialize)]
struct TomlQuestion {
    id: u32,
    question: String,
    #[serde(default = "default_category")]
    category: String,
    #[serde(default = "default_difficulty")]
    difficulty: String,
    #[serde(default)]
    must_have_concepts: Vec<String>,
    #[serde(default)]
    good_to_have_concepts: Vec<String>,
    #[serde(default)]
    red_flags: Vec<String>,
    #[serde(default)]
    ideal_answer: Option<String>,
}

fn default_category() -> String {
    "General".to_string()
}

fn default_difficulty() -> String {
    "medium".to_string()
}

/// Intermediate TOML structure for parsing answer set files.
#[derive(Debug, Deserialize)]
struct TomlAnswerFile {
    session: TomlSession,
    #[serde(default)]
    answers: Vec<TomlAnswer>,
}

#[derive(Debug, Deserialize)]
struct TomlSession {
    id: String,
    #[serde(default)]
    candidate: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TomlAnswer {
    id: String,
    question_id: u32,
    transcript: String,
    #[serde(default)]
    audio: Option<AudioFeatures>,
    #[serde(default)]
    audio_path: Option<PathBuf>,
}

/// Parse a single TOML file into a `QuestionBank`.
pub fn parse_question_bank(path: &Path) -> Result<QuestionBank> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read question bank file: {}", path.display()))?;

    parse_question_bank_str(&content, path)
}

/// Parse a TOML string into a `QuestionBank` (useful for testing).
pub fn parse_question_bank_str(content: &str, source_path: &Path) -> Result<QuestionBank> {
    let parsed: TomlBankFile = toml::from_str(content)
        .with_context(|| format!("failed to parse TOML: {}", source_path.display()))?;

    let questions = parsed
        .questions
        .into_iter()
        .map(|q| {
            let difficulty: Difficulty = q
                .difficulty
                .parse()
                .map_err(|e: String| anyhow::anyhow!("question {}: {}", q.id, e))?;

            Ok(Question {
                id: q.id,
                question: q.question,
                category: q.category,
                difficulty,
                rubric: Rubric {
                    must_have_concepts: q.must_have_concepts,
                    good_to_have_concepts: q.good_to_have_concepts,
                    red_flags: q.red_flags,
                    ideal_answer: q.ideal_answer.filter(|a| !a.trim().is_empty()),
                },
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(QuestionBank {
        id: parsed.bank.id,
        name: parsed.bank.name,
        description: parsed.bank.description,
        questions,
    })
}

/// Recursively load all `.toml` question bank files from a directory.
pub fn load_bank_directory(dir: &Path) -> Result<Vec<QuestionBank>> {
    let mut banks = Vec::new();

    if !dir.is_dir() {
        anyhow::bail!("not a directory: {}", dir.display());
    }

    for entry in std::fs::read_dir(dir)
        .with_context(|| format!("failed to read directory: {}", dir.display()))?
    {
        let entry = entry?;
        let path = entry.path();

        if path.is_dir() {
            banks.extend(load_bank_directory(&path)?);
        } else if path.extension().is_some_and(|ext| ext == "toml") {
            match parse_question_bank(&path) {
                Ok(bank) => banks.push(bank),
                Err(e) => {
                    tracing::warn!("skipping {}: {}", path.display(), e);
                }
            }
        }
    }

    banks.sort_by(|a, b| a.id.cmp(&b.id));
    Ok(banks)
}

/// Parse an answer set file. Relative `audio_path`s are resolved against the
/// file's directory.
pub fn parse_answer_set(path: &Path) -> Result<AnswerSet> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read answer set file: {}", path.display()))?;

    let mut set = parse_answer_set_str(&content, path)?;
    if let Some(base) = path.parent() {
        for answer in &mut set.answers {
            if let Some(audio_path) = answer.audio_path.as_mut() {
                if audio_path.is_relative() {
                    *audio_path = base.join(&*audio_path);
                }
            }
        }
    }
    Ok(set)
}

/// Parse a TOML string into an `AnswerSet`.
pub fn parse_answer_set_str(content: &str, source_path: &Path) -> Result<AnswerSet> {
    let parsed: TomlAnswerFile = toml::from_str(content)
        .with_context(|| format!("failed to parse TOML: {}", source_path.display()))?;

    Ok(AnswerSet {
        session: Session {
            id: parsed.session.id,
            candidate: parsed.session.candidate,
        },
        answers: parsed
            .answers
            .into_iter()
            .map(|a| Answer {
                id: a.id,
                question_id: a.question_id,
                transcript: a.transcript,
                audio: a.audio,
                audio_path: a.audio_path,
            })
            .collect(),
    })
}

/// A warning from question bank or answer set validation.
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    /// The question or answer ID (if applicable).
    pub item_id: Option<String>,
    /// Warning message.
    pub message: String,
}

/// Validate a question bank for common issues.
pub fn validate_question_bank(bank: &QuestionBank) -> Vec<ValidationWarning> {
    let mut warnings = Vec::new();

    // Check for duplicate question IDs
    let mut seen_ids = HashSet::new();
    for q in &bank.questions {
        if !seen_ids.insert(q.id) {
            warnings.push(ValidationWarning {
                item_id: Some(q.id.to_string()),
                message: format!("duplicate question ID: {}", q.id),
            });
        }
    }

    for q in &bank.questions {
        if q.question.trim().is_empty() {
            warnings.push(ValidationWarning {
                item_id: Some(q.id.to_string()),
                message: "question text is empty".into(),
            });
        }

        let required: HashSet<String> = q
            .rubric
            .expected_concepts()
            .map(|c| c.trim().to_lowercase())
            .collect();
        for flag in &q.rubric.red_flags {
            if required.contains(&flag.trim().to_lowercase()) {
                warnings.push(ValidationWarning {
                    item_id: Some(q.id.to_string()),
                    message: format!("'{flag}' is listed as both a concept and a red flag"),
                });
            }
        }

        if q.rubric.expected_concepts().next().is_none() && q.rubric.ideal_answer.is_none() {
            warnings.push(ValidationWarning {
                item_id: Some(q.id.to_string()),
                message: "no concepts and no ideal answer; coverage cannot be measured".into(),
            });
        } else if q.rubric.has_no_criteria() {
            warnings.push(ValidationWarning {
                item_id: Some(q.id.to_string()),
                message: "only an ideal answer; the technical score will always be 0".into(),
            });
        }
    }

    warnings
}

/// Validate an answer set against the bank it will be scored with.
pub fn validate_answer_set(set: &AnswerSet, bank: &QuestionBank) -> Vec<ValidationWarning> {
    let mut warnings = Vec::new();

    let mut seen_ids = HashSet::new();
    for answer in &set.answers {
        if !seen_ids.insert(answer.id.as_str()) {
            warnings.push(ValidationWarning {
                item_id: Some(answer.id.clone()),
                message: format!("duplicate answer ID: {}", answer.id),
            });
        }
        if bank.get(answer.question_id).is_none() {
            warnings.push(ValidationWarning {
                item_id: Some(answer.id.clone()),
                message: format!(
                    "question {} not found in bank '{}'",
                    answer.question_id, bank.id
                ),
            });
        }
        if answer.transcript.trim().is_empty() {
            warnings.push(ValidationWarning {
                item_id: Some(answer.id.clone()),
                message: "transcript is empty".into(),
            });
        }
    }

    warnings
}
