//! Reviewer — pluggable, trait-based producer of free-text CV reviews.
//!
//! Default: `LlmReviewer` (Gemini via `LlmClient`).
//! Without an API key the service runs with `UnconfiguredReviewer`, which
//! answers every request with a fixed notice instead of failing.
//!
//! `AppState` holds an `Arc<dyn Reviewer>`, chosen at startup from config.

use async_trait::async_trait;

use crate::llm_client::prompts::FIT_SCORE_INSTRUCTION;
use crate::llm_client::{LlmClient, LlmError};
use crate::review::prompts::{JOB_REVIEW_PROMPT_TEMPLATE, REVIEW_PROMPT_TEMPLATE, REVIEW_SYSTEM};

/// Returned by `UnconfiguredReviewer` in place of a review.
pub const MISSING_API_KEY_NOTICE: &str = "Gemini API key not set.";

/// Reviewer output. Provider-specific unwrapping happens inside the reviewer.
#[derive(Debug, Clone, PartialEq)]
pub struct ReviewerResult {
    pub text: String,
}

#[async_trait]
pub trait Reviewer: Send + Sync {
    async fn review(
        &self,
        cv_text: &str,
        cv_name: &str,
        job_description: Option<&str>,
    ) -> Result<ReviewerResult, LlmError>;
}

pub struct LlmReviewer {
    llm: LlmClient,
}

impl LlmReviewer {
    pub fn new(llm: LlmClient) -> Self {
        Self { llm }
    }
}

#[async_trait]
impl Reviewer for LlmReviewer {
    async fn review(
        &self,
        cv_text: &str,
        cv_name: &str,
        job_description: Option<&str>,
    ) -> Result<ReviewerResult, LlmError> {
        let prompt = build_review_prompt(cv_text, cv_name, job_description);
        let system = format!("{REVIEW_SYSTEM}\n\n{FIT_SCORE_INSTRUCTION}");
        let text = self.llm.call_text(&prompt, &system).await?;
        Ok(ReviewerResult { text })
    }
}

pub struct UnconfiguredReviewer;

#[async_trait]
impl Reviewer for UnconfiguredReviewer {
    async fn review(
        &self,
        _cv_text: &str,
        _cv_name: &str,
        _job_description: Option<&str>,
    ) -> Result<ReviewerResult, LlmError> {
        Ok(ReviewerResult {
            text: MISSING_API_KEY_NOTICE.to_string(),
        })
    }
}

/// Picks the job-specific template when a non-blank job description is given.
/// Placeholders are filled in one pass, so caller-supplied text is never
/// re-scanned for `{...}` markers.
fn build_review_prompt(cv_text: &str, cv_name: &str, job_description: Option<&str>) -> String {
    match job_description.map(str::trim).filter(|jd| !jd.is_empty()) {
        Some(jd) => fill_template(
            JOB_REVIEW_PROMPT_TEMPLATE,
            &[("cv_name", cv_name), ("job_description", jd), ("cv_text", cv_text)],
        ),
        None => fill_template(
            REVIEW_PROMPT_TEMPLATE,
            &[("cv_name", cv_name), ("cv_text", cv_text)],
        ),
    }
}

/// Replaces each `{key}` in `template` with its value. Unknown braces are kept.
fn fill_template(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let after = &rest[start + 1..];
        let placeholder = values.iter().find(|(key, _)| {
            after.starts_with(key) && after[key.len()..].starts_with('}')
        });
        match placeholder {
            Some((key, value)) => {
                out.push_str(value);
                rest = &after[key.len() + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}
