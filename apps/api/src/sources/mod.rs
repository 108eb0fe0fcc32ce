//! Content sources: where CV documents live and how their text is obtained.
//!
//! `AppState` holds a `ContentSources` registry with one `Arc<dyn ContentSource>`
//! per `CvSource`. Adapters built without credentials degrade silently: they
//! list nothing and fetch empty text.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::cv::{CvDescriptor, CvSource};

pub mod extract;
pub mod gdrive;
pub mod github;
pub mod handlers;

/// Returned in place of text when a document is neither PDF nor DOCX.
pub const UNSUPPORTED_FILE_TYPE: &str = "Unsupported file type";

/// Sent with every source API request; GitHub rejects requests without one.
const USER_AGENT: &str = concat!("cvreview/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{service} API request failed with status {status}: {body}")]
    Api {
        service: &'static str,
        status: u16,
        body: String,
    },

    #[error("Unexpected {service} response: {detail}")]
    InvalidResponse {
        service: &'static str,
        detail: String,
    },

    #[error("Failed to extract text: {0}")]
    Extract(String),
}

/// A place CVs can be listed from and read from.
#[async_trait]
pub trait ContentSource: Send + Sync {
    /// Lists the PDF/DOCX files visible to this source.
    async fn list_cvs(&self) -> Result<Vec<CvDescriptor>, SourceError>;

    /// Returns the extracted text of the document at `path`.
    async fn fetch_text(&self, path: &str) -> Result<String, SourceError>;
}

/// One adapter per `CvSource`.
#[derive(Clone)]
pub struct ContentSources {
    pub gdrive: Arc<dyn ContentSource>,
    pub github: Arc<dyn ContentSource>,
}

impl ContentSources {
    pub fn get(&self, source: CvSource) -> &dyn ContentSource {
        match source {
            CvSource::Gdrive => self.gdrive.as_ref(),
            CvSource::Github => self.github.as_ref(),
        }
    }
}

/// Reads the body of a failed response into a `SourceError::Api`.
async fn api_error(service: &'static str, response: reqwest::Response) -> SourceError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    SourceError::Api {
        service,
        status,
        body,
    }
}
