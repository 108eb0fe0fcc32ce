use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use reqwest::{Client, RequestBuilder};
use serde::Deserialize;
use tracing::{debug, info};

use super::extract::{extract_text, DocumentKind};
use super::{api_error, ContentSource, SourceError, UNSUPPORTED_FILE_TYPE, USER_AGENT};
use crate::config::GithubConfig;
use crate::models::cv::{CvDescriptor, CvSource};

const GITHUB_API: &str = "https://api.github.com";
const SERVICE: &str = "GitHub";

#[derive(Debug, Deserialize)]
struct ContentItem {
    name: String,
    path: String,
    #[serde(rename = "type")]
    item_type: String,
    /// Base64, line-wrapped. Empty for files over 1 MB.
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    download_url: Option<String>,
}

/// The contents endpoint returns an array for directories and an object for files.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ContentsResponse {
    Directory(Vec<ContentItem>),
    File(Box<ContentItem>),
}

/// Lists and reads CVs stored in a folder of one GitHub repository.
pub struct GithubSource {
    client: Client,
    config: Option<GithubConfig>,
}

impl GithubSource {
    pub fn new(client: Client, config: Option<GithubConfig>) -> Self {
        Self { client, config }
    }

    fn authorized(&self, request: RequestBuilder, token: &str) -> RequestBuilder {
        request
            .bearer_auth(token)
            .header(reqwest::header::USER_AGENT, USER_AGENT)
            .header(reqwest::header::ACCEPT, "application/vnd.github+json")
    }

    async fn get_contents(
        &self,
        config: &GithubConfig,
        path: &str,
    ) -> Result<ContentsResponse, SourceError> {
        let url = contents_url(&config.repo, path);
        let response = self
            .authorized(self.client.get(url), &config.token)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(api_error(SERVICE, response).await);
        }

        Ok(response.json().await?)
    }

    async fn file_bytes(
        &self,
        config: &GithubConfig,
        item: &ContentItem,
    ) -> Result<Vec<u8>, SourceError> {
        if let Some(content) = item.content.as_deref().filter(|c| !c.trim().is_empty()) {
            return decode_content(content);
        }

        let url = item.download_url.as_deref().ok_or_else(|| SourceError::InvalidResponse {
            service: SERVICE,
            detail: format!("{} has neither inline content nor a download URL", item.path),
        })?;

        let response = self
            .authorized(self.client.get(url), &config.token)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(api_error(SERVICE, response).await);
        }

        Ok(response.bytes().await?.to_vec())
    }
}

#[async_trait]
impl ContentSource for GithubSource {
    async fn list_cvs(&self) -> Result<Vec<CvDescriptor>, SourceError> {
        let Some(config) = &self.config else {
            debug!("GitHub not configured, listing nothing");
            return Ok(Vec::new());
        };

        let items = match self.get_contents(config, &config.folder).await? {
            ContentsResponse::Directory(items) => items,
            ContentsResponse::File(item) => vec![*item],
        };

        let cvs: Vec<CvDescriptor> = items.into_iter().filter_map(descriptor_for).collect();
        info!("Listed {} CVs from GitHub repo {}", cvs.len(), config.repo);
        Ok(cvs)
    }

    async fn fetch_text(&self, path: &str) -> Result<String, SourceError> {
        let Some(config) = &self.config else {
            return Ok(String::new());
        };

        let item = match self.get_contents(config, path).await? {
            ContentsResponse::File(item) => item,
            ContentsResponse::Directory(_) => {
                return Err(SourceError::InvalidResponse {
                    service: SERVICE,
                    detail: format!("{path} is a directory"),
                })
            }
        };

        let Some(kind) = DocumentKind::from_file_name(&item.name) else {
            return Ok(UNSUPPORTED_FILE_TYPE.to_string());
        };

        let data = self.file_bytes(config, &item).await?;
        extract_text(kind, data).await
    }
}

fn contents_url(repo: &str, path: &str) -> String {
    let path = path.trim_matches('/');
    format!("{GITHUB_API}/repos/{repo}/contents/{path}")
}

fn descriptor_for(item: ContentItem) -> Option<CvDescriptor> {
    if item.item_type != "file" || DocumentKind::from_file_name(&item.name).is_none() {
        return None;
    }
    Some(CvDescriptor::new(item.name, CvSource::Github, item.path))
}

/// GitHub wraps base64 content at 60 columns; strip whitespace before decoding.
fn decode_content(content: &str) -> Result<Vec<u8>, SourceError> {
    let compact: String = content.chars().filter(|c| !c.is_whitespace()).collect();
    STANDARD
        .decode(compact.as_bytes())
        .map_err(|e| SourceError::InvalidResponse {
            service: SERVICE,
            detail: format!("invalid base64 content: {e}"),
        })
}
