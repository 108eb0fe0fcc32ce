//! Axum route handlers for the Review API.

use axum::extract::{Query, State};
use axum::Json;
use bytes::Bytes;
use serde::Deserialize;
use tracing::info;

use crate::errors::AppError;
use crate::models::cv::{CvDescriptor, CvSource, ReviewOutcome};
use crate::review::bulk::{review_batch, review_one, ReviewItemError};
use crate::sources::handlers::SourceQuery;
use crate::state::AppState;

/// Review text returned for a `/review` body naming an unknown source.
pub const INVALID_SOURCE_REVIEW: &str = "Invalid source.";

/// Body of `POST /review`. `source` stays a string so an unknown value can be
/// answered in-band rather than rejected by the extractor.
#[derive(Debug, Deserialize)]
pub struct ReviewRequest {
    pub name: String,
    pub source: String,
    pub path: String,
    #[serde(default)]
    pub job_description: Option<String>,
}

/// POST /review
///
/// Reviews a single CV. Fetch and reviewer failures surface as 5xx.
pub async fn handle_review(
    State(state): State<AppState>,
    Json(request): Json<ReviewRequest>,
) -> Result<Json<ReviewOutcome>, AppError> {
    let Ok(source) = request.source.parse::<CvSource>() else {
        return Ok(Json(ReviewOutcome {
            cv_name: request.name,
            review_text: INVALID_SOURCE_REVIEW.to_string(),
            fit_score: 0,
            score_detected: false,
        }));
    };

    let cv = CvDescriptor {
        name: request.name,
        source,
        path: request.path,
        job_description: non_blank(request.job_description),
    };

    let outcome = review_one(
        &state.sources,
        state.reviewer.as_ref(),
        &cv,
        None,
        state.config.review_call_timeout,
    )
    .await
    .map_err(|e| match e {
        ReviewItemError::Fetch(e) => AppError::Source(format!("Fetching {} failed: {e}", cv.path)),
        ReviewItemError::Reviewer(e) => AppError::Llm(format!("Reviewing {} failed: {e}", cv.name)),
        timeout @ ReviewItemError::Timeout { .. } => AppError::Timeout(timeout.to_string()),
    })?;

    info!("Reviewed {}: fit score {}", outcome.cv_name, outcome.fit_score);
    Ok(Json(outcome))
}

/// POST /review_all?source=gdrive|github
///
/// Body is an optional JSON string holding the job description. Lists every CV in
/// the source, reviews them all, and returns them best fit first. Per-CV
/// failures become entries scored 0; only listing failures fail the request.
pub async fn handle_review_all(
    State(state): State<AppState>,
    Query(query): Query<SourceQuery>,
    body: Bytes,
) -> Result<Json<Vec<ReviewOutcome>>, AppError> {
    let source = query.parse()?;
    let job_description = parse_job_description(&body)?;

    let cvs = state
        .sources
        .get(source)
        .list_cvs()
        .await
        .map_err(|e| AppError::Source(format!("Listing {source} CVs failed: {e}")))?;

    let outcomes = review_batch(
        &state.sources,
        state.reviewer.as_ref(),
        cvs,
        job_description.as_deref(),
        state.bulk_options(),
    )
    .await;

    Ok(Json(outcomes))
}

/// Accepts an empty body, `null`, or a JSON string. Blank strings count as absent.
fn parse_job_description(body: &[u8]) -> Result<Option<String>, AppError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }
    let parsed: Option<String> = serde_json::from_slice(body).map_err(|e| {
        AppError::Validation(format!("body must be a JSON string job description: {e}"))
    })?;
    Ok(non_blank(parsed))
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_job_description_accepts_json_string() {
        let jd = parse_job_description(br#""Senior Rust engineer""#).unwrap();
        assert_eq!(jd.as_deref(), Some("Senior Rust engineer"));
    }

    #[test]
    fn test_parse_job_description_empty_null_and_blank() {
        assert_eq!(parse_job_description(b"").unwrap(), None);
        assert_eq!(parse_job_description(b"  \n").unwrap(), None);
        assert_eq!(parse_job_description(b"null").unwrap(), None);
        assert_eq!(parse_job_description(br#""   ""#).unwrap(), None);
    }

    #[test]
    fn test_parse_job_description_rejects_objects() {
        let err = parse_job_description(br#"{"jd": "x"}"#).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }
}
