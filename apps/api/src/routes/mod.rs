pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::review::handlers as review;
use crate::sources::handlers as sources;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route("/cvs", get(sources::handle_list_cvs))
        .route("/cv_content", get(sources::handle_cv_content))
        .route("/review", post(review::handle_review))
        .route("/review_all", post(review::handle_review_all))
        .with_state(state)
}
