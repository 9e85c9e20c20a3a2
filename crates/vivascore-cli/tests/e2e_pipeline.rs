//! End-to-end pipeline tests over the bundled question banks and answer set.
//!
//! These tests verify that parsing, batch evaluation, audio retrieval and
//! report rendering work together on realistic answers.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use vivascore_core::batch::{BatchConfig, BatchRunner, NoopReporter};
use vivascore_core::model::{AudioFeatures, LogicalFlow, TechnicalMode};
use vivascore_core::parser::{parse_answer_set, parse_question_bank, validate_answer_set};
use vivascore_core::Evaluator;
use vivascore_report::{generate_html, generate_markdown};
use vivascore_sources::mock::MockFeatureSource;

fn fixtures() -> (
    vivascore_core::model::QuestionBank,
    vivascore_core::model::AnswerSet,
) {
    let bank = parse_question_bank(Path::new("../../question-banks/data-structures.toml")).unwrap();
    let answers = parse_answer_set(Path::new("../../answers/sample-session.toml")).unwrap();
    (bank, answers)
}

fn runner() -> BatchRunner {
    BatchRunner::new(
        Arc::new(Evaluator::default()),
        BatchConfig {
            parallelism: 2,
            audio_timeout: Duration::from_secs(1),
        },
    )
}

#[tokio::test]
async fn e2e_sample_session() {
    let (bank, answers) = fixtures();
    assert!(validate_answer_set(&answers, &bank).is_empty());

    let report = runner().run(&answers, &bank, &NoopReporter).await.unwrap();
    assert_eq!(report.records.len(), 3);
    assert_eq!(report.stats.degraded, 0);

    let strong = report.records[0].evaluation.result();
    let weak = report.records[1].evaluation.result();

    // The strong answer covers every must-have concept and all four parts.
    assert_eq!(strong.technical.metrics.mode, TechnicalMode::Rubric);
    assert!(strong.technical.metrics.missing_concepts.is_empty());
    assert_eq!(strong.structure.logical_flow, LogicalFlow::ExcellentStructure);
    assert!(strong.overall_score > weak.overall_score);

    // The weak answer is full of fillers and hedges.
    assert!(weak.clarity.metrics.filler_count > 0.0);
    assert!(!weak.suggestions.is_empty());
    assert!(weak.suggestions.len() <= 5);

    for record in &report.records {
        let e = record.evaluation.result();
        for score in [
            e.clarity.score,
            e.confidence.score,
            e.technical.score,
            e.structure.structure_score,
            e.overall_score,
        ] {
            assert!((0.0..=10.0).contains(&score));
        }
    }
}

#[tokio::test]
async fn e2e_audio_from_mock_source() {
    let (bank, answers) = fixtures();
    let mut features = HashMap::new();
    features.insert(
        "stack-queue-weak".to_string(),
        AudioFeatures {
            speaking_rate: Some(80.0),
            long_pauses: Some(6),
            ..Default::default()
        },
    );
    let source = Arc::new(MockFeatureSource::new(features));

    let report = runner()
        .with_source(source.clone())
        .run(&answers, &bank, &NoopReporter)
        .await
        .unwrap();

    // The first answer carries inline audio, so only two lookups happen.
    assert_eq!(source.call_count(), 2);

    let weak = report.records[1].evaluation.result();
    let voice = weak.confidence.metrics.voice_metrics.as_ref().unwrap();
    assert_eq!(voice.long_pauses, Some(6));

    // A failed lookup only drops the audio signal.
    let partial = &report.records[2].evaluation;
    assert!(!partial.is_degraded());
    assert!(partial.result().confidence.metrics.voice_metrics.is_none());
}

#[tokio::test]
async fn e2e_slow_source_does_not_block() {
    let (bank, answers) = fixtures();
    let source = Arc::new(
        MockFeatureSource::with_fixed_features(AudioFeatures {
            speaking_rate: Some(150.0),
            ..Default::default()
        })
        .with_delay(Duration::from_secs(30)),
    );
    let runner = BatchRunner::new(
        Arc::new(Evaluator::default()),
        BatchConfig {
            parallelism: 4,
            audio_timeout: Duration::from_millis(50),
        },
    )
    .with_source(source);

    let report = runner.run(&answers, &bank, &NoopReporter).await.unwrap();
    assert_eq!(report.records.len(), 3);
    assert_eq!(report.stats.degraded, 0);
    assert!(report.records[1]
        .evaluation
        .result()
        .confidence
        .metrics
        .voice_metrics
        .is_none());
}

#[tokio::test]
async fn e2e_reports_render() {
    let (bank, answers) = fixtures();
    let report = runner().run(&answers, &bank, &NoopReporter).await.unwrap();

    let html = generate_html(&report);
    assert!(html.contains("hash-map-strong"));
    assert!(html.contains("Sample Candidate"));

    let md = generate_markdown(report.records[0].evaluation.result());
    assert!(md.contains("- [x] conclusion"));
}

#[test]
fn evaluation_is_deterministic() {
    let (bank, answers) = fixtures();
    let evaluator = Evaluator::default();
    let answer = &answers.answers[0];
    let rubric = bank.rubric(answer.question_id);

    let first = evaluator.evaluate(&answer.transcript, rubric, answer.audio.as_ref());
    let second = evaluator.evaluate(&answer.transcript, rubric, answer.audio.as_ref());
    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );
}
