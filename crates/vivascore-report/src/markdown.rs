//! Candidate-facing Markdown feedback for a single evaluation.

use vivascore_core::model::{DimensionScore, EvaluationResult, StructureComponent};

/// Render one evaluation as Markdown feedback.
pub fn generate_markdown(result: &EvaluationResult) -> String {
    let mut md = String::new();

    md.push_str("# Interview answer feedback\n\n");
    md.push_str(&format!("**Overall score:** {:.1} / 10\n\n", result.overall_score));

    md.push_str("| Dimension | Score |\n");
    md.push_str("|-----------|-------|\n");
    md.push_str(&format!("| Technical | {:.1} |\n", result.technical.score));
    md.push_str(&format!("| Clarity | {:.1} |\n", result.clarity.score));
    md.push_str(&format!("| Confidence | {:.1} |\n", result.confidence.score));
    md.push_str(&format!(
        "| Structure | {:.1} |\n",
        result.structure.structure_score
    ));
    md.push_str(&format!(
        "| Coverage | {:.1}% ({}) |\n\n",
        result.coverage.coverage_percentage,
        result.coverage.coverage_quality.as_str().replace('_', " ")
    ));

    if !result.suggestions.is_empty() {
        md.push_str("## Suggestions\n\n");
        for (i, s) in result.suggestions.iter().enumerate() {
            md.push_str(&format!("{}. {}\n", i + 1, s));
        }
        md.push('\n');
    }

    push_dimension(&mut md, "Technical", &result.technical);
    push_dimension(&mut md, "Clarity", &result.clarity);
    push_dimension(&mut md, "Confidence", &result.confidence);

    md.push_str("## Structure\n\n");
    md.push_str(&format!(
        "Logical flow: {}\n\n",
        result.structure.logical_flow.as_str().replace('_', " ")
    ));
    for component in StructureComponent::ALL {
        let mark = if result.structure.detected(component) {
            "x"
        } else {
            " "
        };
        md.push_str(&format!("- [{mark}] {component}\n"));
    }
    md.push('\n');

    let coverage = &result.coverage;
    if !coverage.missing_concepts.is_empty() {
        md.push_str("## Concepts to review\n\n");
        for concept in &coverage.missing_concepts {
            md.push_str(&format!("- {concept}\n"));
        }
        md.push('\n');
    }

    md
}

fn push_dimension<M>(md: &mut String, name: &str, score: &DimensionScore<M>) {
    if score.strengths.is_empty() && score.issues.is_empty() {
        return;
    }
    md.push_str(&format!("## {name}\n\n"));
    for s in &score.strengths {
        md.push_str(&format!("- ✅ {s}\n"));
    }
    for i in &score.issues {
        md.push_str(&format!("- ⚠️ {i}\n"));
    }
    md.push('\n');
}

#[cfg(test)]
mod tests {
    use super::*;
    use vivascore_core::engine::{fallback_result, Evaluator, FALLBACK_SUGGESTION};
    use vivascore_core::model::Rubric;

    #[test]
    fn markdown_lists_scores_and_missing_concepts() {
        let rubric = Rubric {
            must_have_concepts: vec!["hash function".into(), "collision".into()],
            ..Default::default()
        };
        let result = Evaluator::default()
            .evaluate(
                "A hash map is a table. It works by using a hash function.",
                Some(&rubric),
                None,
            )
            .into_result();
        let md = generate_markdown(&result);

        assert!(md.starts_with("# Interview answer feedback"));
        assert!(md.contains(&format!("**Overall score:** {:.1} / 10", result.overall_score)));
        assert!(md.contains("| Technical |"));
        assert!(md.contains("- [x] introduction"));
        assert!(md.contains("- [ ] conclusion"));
        assert!(md.contains("## Concepts to review"));
        assert!(md.contains("- collision"));
    }

    #[test]
    fn markdown_for_fallback() {
        let md = generate_markdown(&fallback_result());
        assert!(md.contains("**Overall score:** 5.0 / 10"));
        assert!(md.contains(&format!("1. {FALLBACK_SUGGESTION}")));
        assert!(!md.contains("## Concepts to review"));
    }
}
