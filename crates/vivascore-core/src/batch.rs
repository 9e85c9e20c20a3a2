//! Batch evaluation of an answer set.
//!
//! Evaluates every answer of an [`AnswerSet`] against the rubrics of a
//! [`QuestionBank`] with bounded parallelism, fetching audio features from an
//! optional [`AudioFeatureSource`].

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use futures::stream::{FuturesUnordered, StreamExt};
use tokio::sync::Semaphore;
use uuid::Uuid;

use crate::engine::{fetch_features, Evaluator};
use crate::model::{Answer, AnswerSet, QuestionBank};
use crate::report::{AnswerRecord, BankSummary, BatchReport};
use crate::statistics::compute_batch_stats;
use crate::traits::{AudioFeatureSource, FeatureRequest};

/// Configuration for the batch runner.
#[derive(Debug, Clone)]
pub struct BatchConfig {
    /// Maximum answers evaluated at once.
    pub parallelism: usize,
    /// Deadline for each audio feature request.
    pub audio_timeout: Duration,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            parallelism: 4,
            audio_timeout: Duration::from_secs(5),
        }
    }
}

/// Progress reporting trait.
pub trait ProgressReporter: Send + Sync {
    fn on_answer_start(&self, answer_id: &str, question_id: u32);
    fn on_answer_complete(&self, record: &AnswerRecord);
    fn on_answer_error(&self, answer_id: &str, error: &str);
    fn on_batch_complete(&self, total: usize, completed: usize, degraded: usize, elapsed: Duration);
}

/// No-op progress reporter.
pub struct NoopReporter;

impl ProgressReporter for NoopReporter {
    fn on_answer_start(&self, _: &str, _: u32) {}
    fn on_answer_complete(&self, _: &AnswerRecord) {}
    fn on_answer_error(&self, _: &str, _: &str) {}
    fn on_batch_complete(&self, _: usize, _: usize, _: usize, _: Duration) {}
}

/// Runs an [`Evaluator`] over whole answer sets.
pub struct BatchRunner {
    evaluator: Arc<Evaluator>,
    source: Option<Arc<dyn AudioFeatureSource>>,
    config: BatchConfig,
}

impl BatchRunner {
    pub fn new(evaluator: Arc<Evaluator>, config: BatchConfig) -> Self {
        Self {
            evaluator,
            source: None,
            config,
        }
    }

    /// Fetch audio for answers without inline features from `source`.
    pub fn with_source(mut self, source: Arc<dyn AudioFeatureSource>) -> Self {
        self.source = Some(source);
        self
    }

    /// Evaluate every answer in `answers`. Records keep answer-set order.
    pub async fn run(
        &self,
        answers: &AnswerSet,
        bank: &QuestionBank,
        progress: &dyn ProgressReporter,
    ) -> Result<BatchReport> {
        let start = Instant::now();
        let semaphore = Arc::new(Semaphore::new(self.config.parallelism.max(1)));

        let mut futures = FuturesUnordered::new();

        for (index, answer) in answers.answers.iter().enumerate() {
            let rubric = bank.rubric(answer.question_id).cloned();
            if rubric.is_none() {
                tracing::warn!(
                    answer = %answer.id,
                    "question {} not in bank '{}', scoring without a rubric",
                    answer.question_id,
                    bank.id
                );
            }

            let evaluator = Arc::clone(&self.evaluator);
            let source = self.source.clone();
            let semaphore = Arc::clone(&semaphore);
            let answer = answer.clone();
            let audio_timeout = self.config.audio_timeout;

            progress.on_answer_start(&answer.id, answer.question_id);

            futures.push(async move {
                let answer_id = answer.id.clone();
                let inner = async move {
                    let _permit = semaphore
                        .acquire_owned()
                        .await
                        .map_err(|_| anyhow::anyhow!("semaphore closed"))?;

                    let audio = match (&answer.audio, &source) {
                        (Some(inline), _) => Some(inline.clone()),
                        (None, Some(source)) => Some(
                            fetch_features(source.as_ref(), &feature_request(&answer), audio_timeout)
                                .await,
                        ),
                        (None, None) => None,
                    };

                    let Answer {
                        id,
                        question_id,
                        transcript,
                        ..
                    } = answer;
                    let evaluation = tokio::task::spawn_blocking(move || {
                        evaluator.evaluate(&transcript, rubric.as_ref(), audio.as_ref())
                    })
                    .await?;

                    Ok::<_, anyhow::Error>(AnswerRecord {
                        answer_id: id,
                        question_id,
                        evaluation,
                    })
                };
                (index, answer_id, inner.await)
            });
        }

        let total = futures.len();
        let mut records = Vec::with_capacity(total);
        let mut degraded = 0usize;

        while let Some((index, answer_id, result)) = futures.next().await {
            match result {
                Ok(record) => {
                    if record.evaluation.is_degraded() {
                        degraded += 1;
                    }
                    progress.on_answer_complete(&record);
                    records.push((index, record));
                }
                Err(e) => {
                    tracing::error!("evaluation task failed for {answer_id}: {e:#}");
                    progress.on_answer_error(&answer_id, &e.to_string());
                }
            }
        }

        let elapsed = start.elapsed();
        progress.on_batch_complete(total, records.len(), degraded, elapsed);

        records.sort_by_key(|(index, _)| *index);
        let records: Vec<AnswerRecord> = records.into_iter().map(|(_, r)| r).collect();
        let stats = compute_batch_stats(&records);

        Ok(BatchReport {
            id: Uuid::new_v4(),
            created_at: chrono::Utc::now(),
            session: answers.session.clone(),
            bank: BankSummary::from(bank),
            records,
            stats,
            duration_ms: elapsed.as_millis() as u64,
        })
    }
}

fn feature_request(answer: &Answer) -> FeatureRequest {
    let request = FeatureRequest::new(&answer.id);
    match &answer.audio_path {
        Some(path) => request.with_path(path),
        None => request,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use async_trait::async_trait;

    use crate::model::{AudioFeatures, Difficulty, Question, Rubric, Session};

    fn bank() -> QuestionBank {
        QuestionBank {
            id: "ds".into(),
            name: "Data Structures".into(),
            description: String::new(),
            questions: vec![Question {
                id: 1,
                question: "How does a hash map work?".into(),
                category: "Data Structures".into(),
                difficulty: Difficulty::Medium,
                rubric: Rubric {
                    must_have_concepts: vec!["hash function".into(), "bucket".into()],
                    ..Default::default()
                },
            }],
        }
    }

    fn answer(id: &str, question_id: u32, audio: Option<AudioFeatures>) -> Answer {
        Answer {
            id: id.into(),
            question_id,
            transcript: "A hash map is a table. It works by running a hash function to \
                         pick a bucket. For example, a phone book. In summary, it is fast."
                .into(),
            audio,
            audio_path: None,
        }
    }

    fn answer_set(answers: Vec<Answer>) -> AnswerSet {
        AnswerSet {
            session: Session {
                id: "s1".into(),
                candidate: Some("Sam".into()),
            },
            answers,
        }
    }

    #[derive(Default)]
    struct CountingSource {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl AudioFeatureSource for CountingSource {
        fn name(&self) -> &str {
            "counting"
        }

        async fn features(&self, _: &FeatureRequest) -> anyhow::Result<AudioFeatures> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(AudioFeatures {
                long_pauses: Some(5),
                ..Default::default()
            })
        }
    }

    #[derive(Default)]
    struct RecordingReporter {
        completed: Mutex<Vec<String>>,
        summary: Mutex<Option<(usize, usize, usize)>>,
    }

    impl ProgressReporter for RecordingReporter {
        fn on_answer_start(&self, _: &str, _: u32) {}
        fn on_answer_complete(&self, record: &AnswerRecord) {
            self.completed.lock().unwrap().push(record.answer_id.clone());
        }
        fn on_answer_error(&self, _: &str, _: &str) {}
        fn on_batch_complete(&self, total: usize, completed: usize, degraded: usize, _: Duration) {
            *self.summary.lock().unwrap() = Some((total, completed, degraded));
        }
    }

    #[tokio::test]
    async fn evaluates_every_answer_in_order() {
        let runner = BatchRunner::new(
            Arc::new(Evaluator::default()),
            BatchConfig {
                parallelism: 2,
                ..Default::default()
            },
        );
        let set = answer_set(vec![
            answer("a1", 1, None),
            answer("a2", 1, None),
            answer("a3", 1, None),
        ]);
        let reporter = RecordingReporter::default();

        let report = runner.run(&set, &bank(), &reporter).await.unwrap();
        let ids: Vec<&str> = report.records.iter().map(|r| r.answer_id.as_str()).collect();
        assert_eq!(ids, vec!["a1", "a2", "a3"]);
        assert_eq!(report.stats.answers, 3);
        assert_eq!(report.bank.question_count, 1);
        assert_eq!(reporter.completed.lock().unwrap().len(), 3);
        assert_eq!(*reporter.summary.lock().unwrap(), Some((3, 3, 0)));

        let technical = &report.records[0].evaluation.result().technical;
        assert!(technical.metrics.missing_concepts.is_empty());
    }

    #[tokio::test]
    async fn inline_audio_takes_priority_over_source() {
        let source = Arc::new(CountingSource::default());
        let runner = BatchRunner::new(Arc::new(Evaluator::default()), BatchConfig::default())
            .with_source(source.clone());
        let inline = AudioFeatures {
            speaking_rate: Some(140.0),
            ..Default::default()
        };
        let set = answer_set(vec![answer("a1", 1, Some(inline)), answer("a2", 1, None)]);

        let report = runner.run(&set, &bank(), &NoopReporter).await.unwrap();
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);

        let voice = |i: usize| {
            report.records[i]
                .evaluation
                .result()
                .confidence
                .metrics
                .voice_metrics
                .clone()
        };
        assert_eq!(voice(0).and_then(|v| v.speaking_rate), Some(140.0));
        assert_eq!(voice(1).and_then(|v| v.long_pauses), Some(5));
    }

    #[tokio::test]
    async fn unknown_question_scores_without_rubric() {
        let runner = BatchRunner::new(Arc::new(Evaluator::default()), BatchConfig::default());
        let set = answer_set(vec![answer("a1", 42, None)]);

        let report = runner.run(&set, &bank(), &NoopReporter).await.unwrap();
        let technical = &report.records[0].evaluation.result().technical;
        assert_eq!(technical.metrics.mode, crate::model::TechnicalMode::Keyword);
    }

    #[tokio::test]
    async fn empty_answer_set() {
        let runner = BatchRunner::new(Arc::new(Evaluator::default()), BatchConfig::default());
        let report = runner
            .run(&answer_set(vec![]), &bank(), &NoopReporter)
            .await
            .unwrap();
        assert!(report.records.is_empty());
        assert_eq!(report.stats.answers, 0);
    }
}
