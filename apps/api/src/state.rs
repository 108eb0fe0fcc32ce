use std::sync::Arc;

use crate::config::Config;
use crate::review::bulk::BulkOptions;
use crate::review::reviewer::Reviewer;
use crate::sources::ContentSources;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub sources: ContentSources,
    /// Pluggable reviewer. `LlmReviewer` when GEMINI_API_KEY is set, otherwise `UnconfiguredReviewer`.
    pub reviewer: Arc<dyn Reviewer>,
}

impl AppState {
    pub fn bulk_options(&self) -> BulkOptions {
        BulkOptions {
            concurrency: self.config.review_concurrency,
            call_timeout: self.config.review_call_timeout,
        }
    }
}
