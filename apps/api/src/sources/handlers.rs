//! Axum route handlers for listing CVs and reading their text.

use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;

use crate::errors::AppError;
use crate::models::cv::{CvDescriptor, CvSource, InvalidSource};
use crate::state::AppState;

/// Plain-text answer for an unknown `source` on `/cv_content`.
pub const INVALID_SOURCE: &str = "Invalid source";

#[derive(Debug, Deserialize)]
pub struct SourceQuery {
    pub source: String,
}

#[derive(Debug, Deserialize)]
pub struct ContentQuery {
    pub source: String,
    pub path: String,
}

impl SourceQuery {
    pub fn parse(&self) -> Result<CvSource, AppError> {
        self.source
            .parse()
            .map_err(|e: InvalidSource| AppError::Validation(e.to_string()))
    }
}

/// GET /cvs?source=gdrive|github
pub async fn handle_list_cvs(
    State(state): State<AppState>,
    Query(query): Query<SourceQuery>,
) -> Result<Json<Vec<CvDescriptor>>, AppError> {
    let source = query.parse()?;
    let cvs = state
        .sources
        .get(source)
        .list_cvs()
        .await
        .map_err(|e| AppError::Source(format!("Listing {source} CVs failed: {e}")))?;
    Ok(Json(cvs))
}

/// GET /cv_content?source=...&path=...
///
/// Returns extracted text as `text/plain`, or a fixed sentinel string.
pub async fn handle_cv_content(
    State(state): State<AppState>,
    Query(query): Query<ContentQuery>,
) -> Result<String, AppError> {
    let Ok(source) = query.source.parse::<CvSource>() else {
        return Ok(INVALID_SOURCE.to_string());
    };

    state
        .sources
        .get(source)
        .fetch_text(&query.path)
        .await
        .map_err(|e| AppError::Source(format!("Reading {} from {source} failed: {e}", query.path)))
}
