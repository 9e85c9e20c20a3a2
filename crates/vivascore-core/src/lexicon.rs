//! Word and phrase tables that drive every analyzer.
//!
//! A [`Lexicon`] is plain data: it can be loaded from TOML and partially
//! overridden. [`RuleTables`] is its compiled, immutable form. Analyzers hold
//! an `Arc<RuleTables>`; the tables are never mutated after compilation, so
//! one instance can back any number of concurrent evaluations.

use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::LexiconError;
use crate::model::StructureComponent;

/// A phrase with a weight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightedPhrase {
    pub phrase: String,
    pub weight: f64,
}

impl WeightedPhrase {
    fn new(phrase: &str, weight: f64) -> Self {
        Self {
            phrase: phrase.to_string(),
            weight,
        }
    }
}

/// Trigger patterns (regular expressions) for each structural component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StructurePatterns {
    pub introduction: Vec<String>,
    pub explanation: Vec<String>,
    pub example: Vec<String>,
    pub conclusion: Vec<String>,
}

impl StructurePatterns {
    fn for_component(&self, component: StructureComponent) -> &[String] {
        match component {
            StructureComponent::Introduction => &self.introduction,
            StructureComponent::Explanation => &self.explanation,
            StructureComponent::Example => &self.example,
            StructureComponent::Conclusion => &self.conclusion,
        }
    }
}

impl Default for StructurePatterns {
    fn default() -> Self {
        Self {
            introduction: strings(&[
                r"\b(?:first|to start|in the beginning|initially|let me begin|i'll start)\b",
                r"\b(?:a|an|the) \w+(?: \w+)? is\b",
                r"\b\w+ (?:refers to|can be defined as)\b",
            ]),
            explanation: strings(&[
                r"\b(?:it works by|the way it works|how it works|the mechanism)\b",
                r"\b(?:because|since|due to|as a result|therefore)\b",
                r"\b(?:the process involves|steps include|the algorithm)\b",
            ]),
            example: strings(&[
                r"\b(?:for example|for instance|such as|like|consider)\b",
                r"\b(?:let's say|imagine|suppose|if we have)\b",
                r"\b(?:in practice|in the real world|in real world|practically)\b",
            ]),
            conclusion: strings(&[
                r"\b(?:finally|in conclusion|to summarize|in summary|so overall)\b",
                r"\b(?:to wrap up|as you can see)\b",
                r"\b(?:the key point is|the main takeaway is)\b",
            ]),
        }
    }
}

/// A named group of domain terms used for concept extraction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConceptCategory {
    pub name: String,
    pub terms: Vec<String>,
}

/// All heuristic word tables, as data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Lexicon {
    pub fillers: Vec<WeightedPhrase>,
    pub hesitation_markers: Vec<WeightedPhrase>,
    pub passive_indicators: Vec<String>,
    pub confident_words: Vec<String>,
    pub flow_words: Vec<String>,
    /// Keyword list used when no rubric is available.
    pub technical_keywords: Vec<String>,
    pub structure: StructurePatterns,
    pub concept_categories: Vec<ConceptCategory>,
    /// Words that mark a sentence as complex.
    pub complex_markers: Vec<String>,
    /// Words that mark a sentence as compound.
    pub compound_markers: Vec<String>,
}

impl Default for Lexicon {
    fn default() -> Self {
        Self {
            fillers: vec![
                WeightedPhrase::new("uh", 1.0),
                WeightedPhrase::new("um", 1.0),
                WeightedPhrase::new("like", 0.5),
                WeightedPhrase::new("you know", 0.5),
                WeightedPhrase::new("actually", 0.3),
                WeightedPhrase::new("basically", 0.3),
                WeightedPhrase::new("sort of", 0.5),
                WeightedPhrase::new("kind of", 0.5),
                WeightedPhrase::new("i mean", 0.3),
                WeightedPhrase::new("you see", 0.3),
                WeightedPhrase::new("right", 0.2),
                WeightedPhrase::new("so", 0.2),
                WeightedPhrase::new("well", 0.3),
            ],
            hesitation_markers: vec![
                WeightedPhrase::new("let me think", 2.0),
                WeightedPhrase::new("let's see", 1.5),
                WeightedPhrase::new("i guess", 1.0),
                WeightedPhrase::new("maybe", 1.0),
                WeightedPhrase::new("perhaps", 1.0),
                WeightedPhrase::new("i think", 0.5),
                WeightedPhrase::new("i believe", 0.3),
                WeightedPhrase::new("probably", 0.5),
            ],
            passive_indicators: strings(&["is", "are", "was", "were", "been", "being", "by"]),
            confident_words: strings(&[
                "definitely",
                "certainly",
                "absolutely",
                "clearly",
                "obviously",
                "without doubt",
                "undoubtedly",
                "specifically",
                "precisely",
            ]),
            flow_words: strings(&[
                "first", "then", "next", "finally", "because", "therefore", "so", "however",
            ]),
            technical_keywords: strings(&[
                "hash",
                "bucket",
                "collision",
                "array",
                "linked list",
                "key",
                "value",
                "hashcode",
                "equals",
                "load factor",
                "capacity",
                "resize",
                "rehash",
                "time complexity",
                "space complexity",
                "o(1)",
                "constant time",
                "chaining",
                "open addressing",
                "tree map",
                "red-black tree",
            ]),
            structure: StructurePatterns::default(),
            concept_categories: vec![
                ConceptCategory {
                    name: "technical_terms".into(),
                    terms: strings(&[
                        "hash",
                        "bucket",
                        "collision",
                        "array",
                        "linked list",
                        "key",
                        "value",
                        "hashcode",
                        "equals",
                        "load factor",
                        "capacity",
                        "resize",
                        "rehash",
                        "time complexity",
                        "space complexity",
                        "o(1)",
                        "constant time",
                        "chaining",
                        "open addressing",
                        "tree map",
                        "red-black tree",
                        "thread safety",
                        "synchronization",
                        "concurrent",
                    ]),
                },
                ConceptCategory {
                    name: "process_terms".into(),
                    terms: strings(&[
                        "initialize",
                        "insert",
                        "delete",
                        "search",
                        "lookup",
                        "iterate",
                        "resize",
                        "rehash",
                        "collision resolution",
                        "hash function",
                    ]),
                },
                ConceptCategory {
                    name: "performance_terms".into(),
                    terms: strings(&[
                        "average case",
                        "worst case",
                        "amortized",
                        "big o",
                        "complexity",
                        "scalability",
                        "performance",
                        "efficiency",
                        "optimization",
                    ]),
                },
                ConceptCategory {
                    name: "implementation_terms".into(),
                    terms: strings(&[
                        "java",
                        "python",
                        "c++",
                        "implementation",
                        "code",
                        "algorithm",
                        "data structure",
                        "class",
                        "method",
                        "function",
                    ]),
                },
            ],
            complex_markers: strings(&["because", "since", "therefore", "however"]),
            compound_markers: strings(&["and", "but", "or"]),
        }
    }
}

impl Lexicon {
    /// Parse a lexicon from TOML. Tables missing from the document keep their
    /// built-in contents.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).context("failed to parse lexicon TOML")
    }

    /// Load a lexicon from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read lexicon file: {}", path.display()))?;
        Self::from_toml_str(&content)
            .with_context(|| format!("invalid lexicon: {}", path.display()))
    }
}

/// A phrase compiled into a case-insensitive, word-bounded matcher.
#[derive(Debug, Clone)]
pub struct PhraseMatcher {
    phrase: String,
    weight: f64,
    regex: Regex,
}

impl PhraseMatcher {
    fn compile(table: &str, phrase: &str, weight: f64) -> Result<Self, LexiconError> {
        if !weight.is_finite() || weight < 0.0 {
            return Err(LexiconError::InvalidWeight {
                table: table.to_string(),
                phrase: phrase.to_string(),
                weight,
            });
        }
        let phrase = phrase.trim().to_lowercase();
        let regex = phrase_regex(&phrase).map_err(|source| {
            LexiconError::InvalidPattern {
                table: table.to_string(),
                source,
            }
        })?;
        Ok(Self {
            phrase,
            weight,
            regex,
        })
    }

    pub fn phrase(&self) -> &str {
        &self.phrase
    }

    pub fn weight(&self) -> f64 {
        self.weight
    }

    /// Number of non-overlapping occurrences in `text`.
    pub fn count(&self, text: &str) -> usize {
        self.regex.find_iter(text).count()
    }

    /// Occurrences in `text`, left to right.
    pub fn matches<'r, 't>(&'r self, text: &'t str) -> regex::Matches<'r, 't> {
        self.regex.find_iter(text)
    }

    pub fn is_match(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }
}

/// Compiled, immutable rule tables.
#[derive(Debug, Clone)]
pub struct RuleTables {
    pub(crate) fillers: Vec<PhraseMatcher>,
    pub(crate) hesitation_markers: Vec<PhraseMatcher>,
    pub(crate) passive_indicators: HashSet<String>,
    pub(crate) confident_words: Vec<PhraseMatcher>,
    pub(crate) flow_words: Vec<PhraseMatcher>,
    pub(crate) technical_keywords: Vec<String>,
    pub(crate) structure: Vec<(StructureComponent, Vec<Regex>)>,
    pub(crate) concept_categories: Vec<(String, Regex)>,
    pub(crate) complex_markers: Vec<PhraseMatcher>,
    pub(crate) compound_markers: Vec<PhraseMatcher>,
}

static SHARED: Lazy<Arc<RuleTables>> = Lazy::new(|| {
    Arc::new(
        RuleTables::compile(&Lexicon::default()).expect("built-in lexicon must compile"),
    )
});

impl RuleTables {
    /// Compile a lexicon. Every pattern is compiled exactly once here.
    pub fn compile(lexicon: &Lexicon) -> Result<Self, LexiconError> {
        let weighted = |table: &str, phrases: &[WeightedPhrase]| {
            phrases
                .iter()
                .map(|p| PhraseMatcher::compile(table, &p.phrase, p.weight))
                .collect::<Result<Vec<_>, _>>()
        };
        let plain = |table: &str, phrases: &[String]| {
            phrases
                .iter()
                .map(|p| PhraseMatcher::compile(table, p, 1.0))
                .collect::<Result<Vec<_>, _>>()
        };

        let mut structure = Vec::with_capacity(StructureComponent::ALL.len());
        for component in StructureComponent::ALL {
            let table = format!("structure.{component}");
            let patterns = lexicon.structure.for_component(component);
            if patterns.is_empty() {
                return Err(LexiconError::EmptyTable(table));
            }
            let compiled = patterns
                .iter()
                .map(|p| {
                    Regex::new(&format!("(?i){p}")).map_err(|source| {
                        LexiconError::InvalidPattern {
                            table: table.clone(),
                            source,
                        }
                    })
                })
                .collect::<Result<Vec<_>, _>>()?;
            structure.push((component, compiled));
        }

        let concept_categories = lexicon
            .concept_categories
            .iter()
            .filter(|c| !c.terms.is_empty())
            .map(|c| {
                let table = format!("concept_categories.{}", c.name);
                compile_alternation(&c.terms)
                    .map(|regex| (c.name.clone(), regex))
                    .map_err(|source| LexiconError::InvalidPattern { table, source })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            fillers: weighted("fillers", &lexicon.fillers)?,
            hesitation_markers: weighted("hesitation_markers", &lexicon.hesitation_markers)?,
            passive_indicators: lexicon
                .passive_indicators
                .iter()
                .map(|w| w.trim().to_lowercase())
                .collect(),
            confident_words: plain("confident_words", &lexicon.confident_words)?,
            flow_words: plain("flow_words", &lexicon.flow_words)?,
            technical_keywords: lexicon
                .technical_keywords
                .iter()
                .map(|k| k.trim().to_lowercase())
                .filter(|k| !k.is_empty())
                .collect(),
            structure,
            concept_categories,
            complex_markers: plain("complex_markers", &lexicon.complex_markers)?,
            compound_markers: plain("compound_markers", &lexicon.compound_markers)?,
        })
    }

    /// The process-wide tables compiled from [`Lexicon::default`].
    pub fn shared() -> Arc<RuleTables> {
        Arc::clone(&SHARED)
    }

    pub fn fillers(&self) -> &[PhraseMatcher] {
        &self.fillers
    }

    pub fn hesitation_markers(&self) -> &[PhraseMatcher] {
        &self.hesitation_markers
    }

    pub fn concept_category_names(&self) -> impl Iterator<Item = &str> {
        self.concept_categories.iter().map(|(name, _)| name.as_str())
    }
}

/// Wrap an escaped phrase in word boundaries where its ends are word characters.
fn bounded(phrase: &str) -> String {
    let escaped = regex::escape(phrase);
    let is_word = |c: Option<char>| c.is_some_and(|c| c.is_alphanumeric() || c == '_');
    let prefix = if is_word(phrase.chars().next()) { r"\b" } else { "" };
    let suffix = if is_word(phrase.chars().last()) { r"\b" } else { "" };
    format!("{prefix}{escaped}{suffix}")
}

/// A case-insensitive, word-bounded regex for a single literal phrase.
pub(crate) fn phrase_regex(phrase: &str) -> Result<Regex, regex::Error> {
    Regex::new(&format!("(?i){}", bounded(&phrase.trim().to_lowercase())))
}

/// One case-insensitive regex matching any of `terms`, longest first.
pub(crate) fn compile_alternation(terms: &[String]) -> Result<Regex, regex::Error> {
    let mut terms: Vec<String> = terms
        .iter()
        .map(|t| t.trim().to_lowercase())
        .filter(|t| !t.is_empty())
        .collect();
    terms.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
    terms.dedup();
    let body = terms
        .iter()
        .map(|t| bounded(t))
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&format!("(?i)(?:{body})"))
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_lexicon_compiles() {
        let tables = RuleTables::compile(&Lexicon::default()).unwrap();
        assert_eq!(tables.fillers.len(), 13);
        assert_eq!(tables.structure.len(), 4);
        assert_eq!(tables.concept_categories.len(), 4);
    }

    #[test]
    fn shared_tables_are_one_instance() {
        let a = RuleTables::shared();
        let b = RuleTables::shared();
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn phrase_matching_is_word_bounded_and_case_insensitive() {
        let m = PhraseMatcher::compile("test", "so", 0.2).unwrap();
        assert_eq!(m.count("So, I also think so."), 2);

        let m = PhraseMatcher::compile("test", "I mean", 0.3).unwrap();
        assert_eq!(m.phrase(), "i mean");
        assert_eq!(m.count("I mean, it's what I meant. i mean it."), 2);
    }

    #[test]
    fn alternation_handles_symbols() {
        let re = compile_alternation(&["o(1)".into(), "c++".into(), "hash".into()]).unwrap();
        let found: Vec<&str> = re
            .find_iter("Lookup is O(1) in C++ with a hash, not hashcode")
            .map(|m| m.as_str())
            .collect();
        assert_eq!(found, vec!["O(1)", "C++", "hash"]);
    }

    #[test]
    fn negative_weight_is_rejected() {
        let mut lexicon = Lexicon::default();
        lexicon.fillers.push(WeightedPhrase::new("er", -1.0));
        let err = RuleTables::compile(&lexicon).unwrap_err();
        assert!(matches!(err, LexiconError::InvalidWeight { .. }));
    }

    #[test]
    fn invalid_structure_pattern_is_rejected() {
        let mut lexicon = Lexicon::default();
        lexicon.structure.example = vec!["(unclosed".into()];
        let err = RuleTables::compile(&lexicon).unwrap_err();
        assert!(err.to_string().contains("structure.example"));
    }

    #[test]
    fn empty_structure_table_is_rejected() {
        let mut lexicon = Lexicon::default();
        lexicon.structure.conclusion.clear();
        let err = RuleTables::compile(&lexicon).unwrap_err();
        assert!(matches!(err, LexiconError::EmptyTable(_)));
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let toml = r#"
[[fillers]]
phrase = "er"
weight = 1.0
"#;
        let lexicon = Lexicon::from_toml_str(toml).unwrap();
        assert_eq!(lexicon.fillers.len(), 1);
        assert_eq!(lexicon.hesitation_markers.len(), 8);
        assert_eq!(lexicon.structure, StructurePatterns::default());
    }
}
