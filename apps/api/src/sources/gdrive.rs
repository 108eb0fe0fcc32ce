use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info};

use super::extract::{extract_text, DocumentKind, DOCX_MIME, PDF_MIME};
use super::{api_error, ContentSource, SourceError, UNSUPPORTED_FILE_TYPE, USER_AGENT};
use crate::config::GoogleDriveConfig;
use crate::models::cv::{CvDescriptor, CvSource};

const DRIVE_FILES_ENDPOINT: &str = "https://www.googleapis.com/drive/v3/files";
const SERVICE: &str = "Google Drive";
const PAGE_SIZE: &str = "100";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DriveFilesResponse {
    files: Option<Vec<DriveFileItem>>,
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DriveFileItem {
    id: Option<String>,
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DriveFileMetadata {
    name: String,
    mime_type: String,
}

/// Lists and reads CVs stored in one Google Drive folder.
pub struct GoogleDriveSource {
    client: Client,
    config: Option<GoogleDriveConfig>,
}

impl GoogleDriveSource {
    pub fn new(client: Client, config: Option<GoogleDriveConfig>) -> Self {
        Self { client, config }
    }

    async fn get_metadata(
        &self,
        access_token: &str,
        file_id: &str,
    ) -> Result<DriveFileMetadata, SourceError> {
        let response = self
            .client
            .get(format!("{DRIVE_FILES_ENDPOINT}/{file_id}"))
            .bearer_auth(access_token)
            .header(reqwest::header::USER_AGENT, USER_AGENT)
            .query(&[("fields", "name,mimeType")])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(api_error(SERVICE, response).await);
        }

        Ok(response.json().await?)
    }

    async fn download(&self, access_token: &str, file_id: &str) -> Result<Vec<u8>, SourceError> {
        let response = self
            .client
            .get(format!("{DRIVE_FILES_ENDPOINT}/{file_id}"))
            .bearer_auth(access_token)
            .header(reqwest::header::USER_AGENT, USER_AGENT)
            .query(&[("alt", "media")])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(api_error(SERVICE, response).await);
        }

        Ok(response.bytes().await?.to_vec())
    }
}

#[async_trait]
impl ContentSource for GoogleDriveSource {
    async fn list_cvs(&self) -> Result<Vec<CvDescriptor>, SourceError> {
        let Some(config) = &self.config else {
            debug!("Google Drive not configured, listing nothing");
            return Ok(Vec::new());
        };

        let query = folder_query(&config.folder_id);
        let mut cvs = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut request = self
                .client
                .get(DRIVE_FILES_ENDPOINT)
                .bearer_auth(&config.access_token)
                .header(reqwest::header::USER_AGENT, USER_AGENT)
                .query(&[
                    ("q", query.as_str()),
                    ("fields", "files(id,name),nextPageToken"),
                    ("pageSize", PAGE_SIZE),
                ]);

            if let Some(token) = page_token.as_deref() {
                request = request.query(&[("pageToken", token)]);
            }

            let response = request.send().await?;
            if !response.status().is_success() {
                return Err(api_error(SERVICE, response).await);
            }

            let page: DriveFilesResponse = response.json().await?;
            cvs.extend(descriptors_from_page(page.files.unwrap_or_default()));

            page_token = page.next_page_token;
            if page_token.is_none() {
                break;
            }
        }

        info!("Listed {} CVs from Google Drive", cvs.len());
        Ok(cvs)
    }

    async fn fetch_text(&self, file_id: &str) -> Result<String, SourceError> {
        let Some(config) = &self.config else {
            return Ok(String::new());
        };

        let metadata = self.get_metadata(&config.access_token, file_id).await?;
        let Some(kind) = DocumentKind::from_mime(&metadata.mime_type) else {
            debug!(
                "Skipping {} with unsupported MIME type {}",
                metadata.name, metadata.mime_type
            );
            return Ok(UNSUPPORTED_FILE_TYPE.to_string());
        };

        let data = self.download(&config.access_token, file_id).await?;
        extract_text(kind, data).await
    }
}

fn folder_query(folder_id: &str) -> String {
    format!(
        "'{folder_id}' in parents and (mimeType='{PDF_MIME}' or mimeType='{DOCX_MIME}') and trashed=false"
    )
}

fn descriptors_from_page(items: Vec<DriveFileItem>) -> impl Iterator<Item = CvDescriptor> {
    items.into_iter().filter_map(|item| {
        let (Some(id), Some(name)) = (item.id, item.name) else {
            return None;
        };
        Some(CvDescriptor::new(name, CvSource::Gdrive, id))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_folder_query_filters_pdf_and_docx() {
        let query = folder_query("abc123");
        assert!(query.starts_with("'abc123' in parents"));
        assert!(query.contains("mimeType='application/pdf'"));
        assert!(query.contains(DOCX_MIME));
        assert!(query.ends_with("trashed=false"));
    }

    #[test]
    fn test_page_items_without_id_or_name_are_skipped() {
        let page: DriveFilesResponse = serde_json::from_str(
            r#"{
                "files": [
                    {"id": "f1", "name": "jane.pdf"},
                    {"name": "no-id.pdf"},
                    {"id": "f3"}
                ],
                "nextPageToken": "next"
            }"#,
        )
        .unwrap();
        assert_eq!(page.next_page_token.as_deref(), Some("next"));

        let cvs: Vec<_> = descriptors_from_page(page.files.unwrap()).collect();
        assert_eq!(cvs, vec![CvDescriptor::new("jane.pdf", CvSource::Gdrive, "f1")]);
    }

    #[tokio::test]
    async fn test_unconfigured_source_degrades_silently() {
        let source = GoogleDriveSource::new(Client::new(), None);
        assert!(source.list_cvs().await.unwrap().is_empty());
        assert_eq!(source.fetch_text("any").await.unwrap(), "");
    }
}
