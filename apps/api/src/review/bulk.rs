//! Review orchestration: the single-CV pipeline and the fault-isolated batch.
//!
//! Flow per CV: fetch text → reviewer → extract fit score → `ReviewOutcome`.
//!
//! `review_batch` never fails. Each CV runs in its own future with bounded
//! fan-out; a failure is turned into an error outcome scored 0 and the batch
//! carries on. Outcomes are collected in input order and then stable-sorted by
//! score, so completion order never leaks into the response.

use std::future::Future;
use std::time::Duration;

use futures::stream::{self, StreamExt};
use thiserror::Error;
use tracing::{info, warn};

use crate::llm_client::LlmError;
use crate::models::cv::{CvDescriptor, ReviewOutcome};
use crate::review::reviewer::Reviewer;
use crate::review::score::detect_fit_score;
use crate::sources::{ContentSources, SourceError};

/// Why a single CV could not be reviewed.
#[derive(Debug, Error)]
pub enum ReviewItemError {
    #[error("failed to fetch CV: {0}")]
    Fetch(#[from] SourceError),

    #[error("reviewer failed: {0}")]
    Reviewer(#[from] LlmError),

    #[error("{stage} timed out after {}s", .after.as_secs())]
    Timeout {
        stage: &'static str,
        after: Duration,
    },
}

#[derive(Debug, Clone, Copy)]
pub struct BulkOptions {
    /// Max CVs in flight at once. 1 processes strictly sequentially.
    pub concurrency: usize,
    /// Applied separately to the fetch and to the reviewer call.
    pub call_timeout: Option<Duration>,
}

impl Default for BulkOptions {
    fn default() -> Self {
        Self {
            concurrency: 4,
            call_timeout: None,
        }
    }
}

/// Reviews one CV end to end. Errors propagate to the caller.
///
/// The descriptor's own job description takes precedence over `job_description`.
pub async fn review_one(
    sources: &ContentSources,
    reviewer: &dyn Reviewer,
    cv: &CvDescriptor,
    job_description: Option<&str>,
    call_timeout: Option<Duration>,
) -> Result<ReviewOutcome, ReviewItemError> {
    let job_description = cv.job_description.as_deref().or(job_description);

    let cv_text = with_timeout(
        "fetch",
        call_timeout,
        sources.get(cv.source).fetch_text(&cv.path),
    )
    .await??;

    let result = with_timeout(
        "review",
        call_timeout,
        reviewer.review(&cv_text, &cv.name, job_description),
    )
    .await??;

    let detected = detect_fit_score(&result.text);

    Ok(ReviewOutcome {
        cv_name: cv.name.clone(),
        review_text: result.text,
        fit_score: detected.unwrap_or(0),
        score_detected: detected.is_some(),
    })
}

/// Reviews every CV and returns exactly one outcome per input, best score first.
pub async fn review_batch(
    sources: &ContentSources,
    reviewer: &dyn Reviewer,
    cvs: Vec<CvDescriptor>,
    job_description: Option<&str>,
    options: BulkOptions,
) -> Vec<ReviewOutcome> {
    let total = cvs.len();
    info!(
        "Reviewing {total} CVs (concurrency {})",
        options.concurrency.max(1)
    );

    let mut outcomes: Vec<ReviewOutcome> = stream::iter(cvs)
        .map(move |cv| async move {
            match review_one(sources, reviewer, &cv, job_description, options.call_timeout).await
            {
                Ok(outcome) => {
                    info!("Reviewed {}: fit score {}", cv.name, outcome.fit_score);
                    outcome
                }
                Err(e) => {
                    warn!("Error processing CV {}: {e}", cv.name);
                    ReviewOutcome::failed(cv.name, e)
                }
            }
        })
        .buffered(options.concurrency.max(1))
        .collect()
        .await;

    rank_outcomes(&mut outcomes);

    let failed = outcomes.iter().filter(|o| !o.score_detected).count();
    info!("Batch review complete: {total} CVs, {failed} without a detected score");
    outcomes
}

/// Highest score first. Stable, so equal scores keep input order.
pub fn rank_outcomes(outcomes: &mut [ReviewOutcome]) {
    outcomes.sort_by(|a, b| b.fit_score.cmp(&a.fit_score));
}

async fn with_timeout<T>(
    stage: &'static str,
    limit: Option<Duration>,
    future: impl Future<Output = T>,
) -> Result<T, ReviewItemError> {
    match limit {
        Some(after) => tokio::time::timeout(after, future)
            .await
            .map_err(|_| ReviewItemError::Timeout { stage, after }),
        None => Ok(future.await),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;

    use super::*;
    use crate::models::cv::CvSource;
    use crate::review::reviewer::ReviewerResult;
    use crate::sources::ContentSource;

    /// Serves CV text from memory; paths missing from the map fail.
    struct FakeSource {
        texts: HashMap<String, String>,
    }

    impl FakeSource {
        fn new(entries: &[(&str, &str)]) -> Self {
            Self {
                texts: entries
                    .iter()
                    .map(|(p, t)| (p.to_string(), t.to_string()))
                    .collect(),
            }
        }
    }

    #[async_trait]
    impl ContentSource for FakeSource {
        async fn list_cvs(&self) -> Result<Vec<CvDescriptor>, SourceError> {
            Ok(Vec::new())
        }

        async fn fetch_text(&self, path: &str) -> Result<String, SourceError> {
            self.texts
                .get(path)
                .cloned()
                .ok_or_else(|| SourceError::Api {
                    service: "fake",
                    status: 404,
                    body: format!("{path} not found"),
                })
        }
    }

    /// Echoes the CV text back as the review, unless it says FAIL or HANG.
    #[derive(Default)]
    struct EchoReviewer {
        calls: AtomicUsize,
        job_descriptions: Mutex<Vec<Option<String>>>,
    }

    #[async_trait]
    impl Reviewer for EchoReviewer {
        async fn review(
            &self,
            cv_text: &str,
            _cv_name: &str,
            job_description: Option<&str>,
        ) -> Result<ReviewerResult, LlmError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.job_descriptions
                .lock()
                .unwrap()
                .push(job_description.map(String::from));

            if cv_text.contains("HANG") {
                std::future::pending::<()>().await;
            }
            if cv_text.contains("FAIL") {
                return Err(LlmError::Api {
                    status: 503,
                    message: "model overloaded".to_string(),
                });
            }
            Ok(ReviewerResult {
                text: cv_text.to_string(),
            })
        }
    }

    fn sources(entries: &[(&str, &str)]) -> ContentSources {
        let source: Arc<dyn ContentSource> = Arc::new(FakeSource::new(entries));
        ContentSources {
            gdrive: source.clone(),
            github: source,
        }
    }

    fn cv(name: &str) -> CvDescriptor {
        CvDescriptor::new(name, CvSource::Github, name)
    }

    fn options(concurrency: usize) -> BulkOptions {
        BulkOptions {
            concurrency,
            call_timeout: None,
        }
    }

    #[tokio::test]
    async fn test_review_one_extracts_score() {
        let sources = sources(&[("a.pdf", "Great fit.\nFit Score: 81")]);
        let reviewer = EchoReviewer::default();

        let outcome = review_one(&sources, &reviewer, &cv("a.pdf"), None, None)
            .await
            .unwrap();
        assert_eq!(outcome.cv_name, "a.pdf");
        assert_eq!(outcome.fit_score, 81);
        assert!(outcome.score_detected);
    }

    #[tokio::test]
    async fn test_review_one_propagates_fetch_error() {
        let sources = sources(&[]);
        let reviewer = EchoReviewer::default();

        let err = review_one(&sources, &reviewer, &cv("missing.pdf"), None, None)
            .await
            .unwrap_err();
        assert!(matches!(err, ReviewItemError::Fetch(_)));
        assert_eq!(reviewer.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_review_one_without_score_marks_undetected() {
        let sources = sources(&[("a.pdf", "No numbers here.")]);
        let reviewer = EchoReviewer::default();

        let outcome = review_one(&sources, &reviewer, &cv("a.pdf"), None, None)
            .await
            .unwrap();
        assert_eq!(outcome.fit_score, 0);
        assert!(!outcome.score_detected);
    }

    #[tokio::test]
    async fn test_batch_keeps_every_cv_and_isolates_failures() {
        let sources = sources(&[
            ("one.pdf", "Fit Score: 70"),
            ("two.pdf", "FAIL"),
            ("three.pdf", "Fit Score: 90"),
        ]);
        let reviewer = EchoReviewer::default();
        let cvs = vec![cv("one.pdf"), cv("two.pdf"), cv("three.pdf")];

        let outcomes = review_batch(&sources, &reviewer, cvs, Some("Rust"), options(1)).await;

        assert_eq!(outcomes.len(), 3);
        assert_eq!(outcomes[0].cv_name, "three.pdf");
        assert_eq!(outcomes[0].fit_score, 90);
        assert_eq!(outcomes[1].cv_name, "one.pdf");
        assert_eq!(outcomes[1].fit_score, 70);
        assert_eq!(outcomes[2].cv_name, "two.pdf");
        assert_eq!(outcomes[2].fit_score, 0);
        assert!(outcomes[2]
            .review_text
            .starts_with("[Error processing CV: reviewer failed:"));
        assert!(outcomes[2].review_text.contains("model overloaded"));
    }

    #[tokio::test]
    async fn test_batch_counts_fetch_and_review_failures() {
        let sources = sources(&[
            ("a.pdf", "Fit Score: 55"),
            ("b.pdf", "FAIL"),
            ("d.pdf", "rated 61%"),
            ("e.pdf", "FAIL again"),
        ]);
        let reviewer = EchoReviewer::default();
        // c.pdf is not served by the source, so its fetch fails
        let cvs = ["a.pdf", "b.pdf", "c.pdf", "d.pdf", "e.pdf"]
            .into_iter()
            .map(cv)
            .collect();

        let outcomes = review_batch(&sources, &reviewer, cvs, None, options(3)).await;

        assert_eq!(outcomes.len(), 5);
        let errors: Vec<_> = outcomes
            .iter()
            .filter(|o| o.review_text.starts_with("[Error processing CV:"))
            .collect();
        assert_eq!(errors.len(), 3);
        assert!(errors.iter().all(|o| o.fit_score == 0));
        assert!(outcomes
            .windows(2)
            .all(|pair| pair[0].fit_score >= pair[1].fit_score));
    }

    #[tokio::test]
    async fn test_batch_result_independent_of_concurrency() {
        let entries = [
            ("a.pdf", "Fit Score: 40"),
            ("b.pdf", "Fit Score: 85"),
            ("c.pdf", "FAIL"),
            ("d.pdf", "Fit Score: 40"),
            ("e.pdf", "Score: 99/100"),
        ];
        let sources = sources(&entries);
        let cvs: Vec<_> = entries.iter().map(|(p, _)| cv(p)).collect();

        let sequential =
            review_batch(&sources, &EchoReviewer::default(), cvs.clone(), None, options(1)).await;
        let concurrent =
            review_batch(&sources, &EchoReviewer::default(), cvs, None, options(8)).await;

        assert_eq!(sequential, concurrent);
        let names: Vec<_> = sequential.iter().map(|o| o.cv_name.as_str()).collect();
        // equal scores keep input order
        assert_eq!(names, vec!["e.pdf", "b.pdf", "a.pdf", "d.pdf", "c.pdf"]);
    }

    #[tokio::test]
    async fn test_batch_uses_descriptor_job_description_first() {
        let sources = sources(&[("a.pdf", "x"), ("b.pdf", "y")]);
        let reviewer = EchoReviewer::default();
        let mut own = cv("b.pdf");
        own.job_description = Some("Data engineer".to_string());

        review_batch(
            &sources,
            &reviewer,
            vec![cv("a.pdf"), own],
            Some("Backend engineer"),
            options(1),
        )
        .await;

        let seen = reviewer.job_descriptions.lock().unwrap().clone();
        assert_eq!(
            seen,
            vec![
                Some("Backend engineer".to_string()),
                Some("Data engineer".to_string())
            ]
        );
    }

    #[tokio::test]
    async fn test_empty_batch_returns_empty() {
        let outcomes = review_batch(
            &sources(&[]),
            &EchoReviewer::default(),
            Vec::new(),
            None,
            BulkOptions::default(),
        )
        .await;
        assert!(outcomes.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_hung_reviewer_times_out_without_stalling_batch() {
        let sources = sources(&[("slow.pdf", "HANG"), ("fast.pdf", "Fit Score: 77")]);
        let reviewer = EchoReviewer::default();
        let opts = BulkOptions {
            concurrency: 2,
            call_timeout: Some(Duration::from_secs(30)),
        };

        let outcomes =
            review_batch(&sources, &reviewer, vec![cv("slow.pdf"), cv("fast.pdf")], None, opts)
                .await;

        assert_eq!(outcomes.len(), 2);
        assert_eq!(outcomes[0].cv_name, "fast.pdf");
        assert_eq!(outcomes[0].fit_score, 77);
        assert_eq!(
            outcomes[1].review_text,
            "[Error processing CV: review timed out after 30s]"
        );
    }

    #[test]
    fn test_rank_outcomes_is_non_increasing() {
        let mut outcomes: Vec<_> = [10, 90, 0, 55, 90]
            .into_iter()
            .enumerate()
            .map(|(i, score)| ReviewOutcome {
                cv_name: format!("cv{i}"),
                review_text: String::new(),
                fit_score: score,
                score_detected: true,
            })
            .collect();

        rank_outcomes(&mut outcomes);

        let scores: Vec<_> = outcomes.iter().map(|o| o.fit_score).collect();
        assert_eq!(scores, vec![90, 90, 55, 10, 0]);
        assert_eq!(outcomes[0].cv_name, "cv1");
        assert_eq!(outcomes[1].cv_name, "cv4");
    }
}
