use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::llm_client::DEFAULT_MODEL;

/// Application configuration loaded from environment variables once at startup.
///
/// Source credentials are optional: a source with missing credentials lists
/// nothing and fetches empty text instead of failing startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub rust_log: String,
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,
    pub llm_timeout: Duration,
    pub llm_max_attempts: u32,
    /// HTTP timeout for Google Drive and GitHub calls.
    pub source_timeout: Duration,
    pub gdrive: Option<GoogleDriveConfig>,
    pub github: Option<GithubConfig>,
    pub review_concurrency: usize,
    pub review_call_timeout: Option<Duration>,
}

#[derive(Debug, Clone)]
pub struct GoogleDriveConfig {
    pub access_token: String,
    pub folder_id: String,
}

#[derive(Debug, Clone)]
pub struct GithubConfig {
    pub token: String,
    /// `owner/name`
    pub repo: String,
    pub folder: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let gdrive = match (
            optional_env("GOOGLE_DRIVE_ACCESS_TOKEN"),
            optional_env("GOOGLE_DRIVE_FOLDER_ID"),
        ) {
            (Some(access_token), Some(folder_id)) => Some(GoogleDriveConfig {
                access_token,
                folder_id,
            }),
            _ => None,
        };

        let github = match (optional_env("GITHUB_TOKEN"), optional_env("GITHUB_REPO")) {
            (Some(token), Some(repo)) => Some(GithubConfig {
                token,
                repo,
                folder: optional_env("GITHUB_FOLDER").unwrap_or_default(),
            }),
            _ => None,
        };

        Ok(Config {
            port: parse_env("PORT", 8080)?,
            rust_log: optional_env("RUST_LOG").unwrap_or_else(|| "info".to_string()),
            gemini_api_key: optional_env("GEMINI_API_KEY"),
            gemini_model: optional_env("GEMINI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            llm_timeout: Duration::from_secs(parse_env("LLM_TIMEOUT_SECS", 120)?),
            llm_max_attempts: parse_env::<u32>("LLM_MAX_ATTEMPTS", 3)?.max(1),
            source_timeout: Duration::from_secs(parse_env("SOURCE_TIMEOUT_SECS", 60)?),
            gdrive,
            github,
            review_concurrency: parse_env::<usize>("REVIEW_CONCURRENCY", 4)?.max(1),
            review_call_timeout: optional_env("REVIEW_CALL_TIMEOUT_SECS")
                .map(|raw| parse_value::<u64>("REVIEW_CALL_TIMEOUT_SECS", &raw))
                .transpose()?
                .map(Duration::from_secs),
        })
    }
}

/// Reads an env var, treating unset and blank values alike.
fn optional_env(key: &str) -> Option<String> {
    non_blank(std::env::var(key).ok())
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match optional_env(key) {
        Some(raw) => parse_value(key, &raw),
        None => Ok(default),
    }
}

fn parse_value<T>(key: &str, raw: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    raw.parse::<T>()
        .with_context(|| format!("Environment variable '{key}' has an invalid value: '{raw}'"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_blank_filters_whitespace() {
        assert_eq!(non_blank(Some("   ".to_string())), None);
        assert_eq!(non_blank(None), None);
        assert_eq!(non_blank(Some(" abc ".to_string())), Some("abc".to_string()));
    }

    #[test]
    fn test_parse_value_valid_port() {
        let port: u16 = parse_value("PORT", "9000").unwrap();
        assert_eq!(port, 9000);
    }

    #[test]
    fn test_parse_value_invalid_reports_key() {
        let err = parse_value::<u16>("PORT", "not-a-port").unwrap_err();
        assert!(err.to_string().contains("PORT"));
    }
}
