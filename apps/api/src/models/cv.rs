use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Where a CV document lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CvSource {
    /// Google Drive folder; `path` is a Drive file id.
    Gdrive,
    /// GitHub repository; `path` is a file path inside the repo.
    Github,
}

impl CvSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            CvSource::Gdrive => "gdrive",
            CvSource::Github => "github",
        }
    }
}

impl fmt::Display for CvSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidSource(pub String);

impl fmt::Display for InvalidSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "source must be 'gdrive' or 'github', got '{}'", self.0)
    }
}

impl FromStr for CvSource {
    type Err = InvalidSource;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "gdrive" => Ok(CvSource::Gdrive),
            "github" => Ok(CvSource::Github),
            other => Err(InvalidSource(other.to_string())),
        }
    }
}

/// Identifies one candidate document. Built by a listing call or supplied by a caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CvDescriptor {
    pub name: String,
    pub source: CvSource,
    pub path: String,
    /// Absent means a general review.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_description: Option<String>,
}

impl CvDescriptor {
    pub fn new(name: impl Into<String>, source: CvSource, path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            source,
            path: path.into(),
            job_description: None,
        }
    }
}

/// Result of reviewing one CV.
///
/// `fit_score` is 0 both for a genuine zero and when no score was found;
/// `score_detected` tells the two apart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewOutcome {
    pub cv_name: String,
    #[serde(rename = "review")]
    pub review_text: String,
    pub fit_score: u32,
    pub score_detected: bool,
}

impl ReviewOutcome {
    pub fn failed(cv_name: impl Into<String>, message: impl fmt::Display) -> Self {
        Self {
            cv_name: cv_name.into(),
            review_text: format!("[Error processing CV: {message}]"),
            fit_score: 0,
            score_detected: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_parses_wire_names() {
        assert_eq!("gdrive".parse::<CvSource>(), Ok(CvSource::Gdrive));
        assert_eq!("github".parse::<CvSource>(), Ok(CvSource::Github));
        assert_eq!(
            "dropbox".parse::<CvSource>(),
            Err(InvalidSource("dropbox".to_string()))
        );
        assert_eq!(
            InvalidSource("ftp".to_string()).to_string(),
            "source must be 'gdrive' or 'github', got 'ftp'"
        );
    }

    #[test]
    fn test_descriptor_deserializes_without_job_description() {
        let json = r#"{"name": "jane.pdf", "source": "github", "path": "cvs/jane.pdf"}"#;
        let cv: CvDescriptor = serde_json::from_str(json).unwrap();
        assert_eq!(cv.source, CvSource::Github);
        assert!(cv.job_description.is_none());
    }

    #[test]
    fn test_outcome_serializes_review_field() {
        let outcome = ReviewOutcome {
            cv_name: "jane.pdf".to_string(),
            review_text: "Solid.".to_string(),
            fit_score: 77,
            score_detected: true,
        };
        let value = serde_json::to_value(&outcome).unwrap();
        assert_eq!(value["review"], "Solid.");
        assert_eq!(value["fit_score"], 77);
    }

    #[test]
    fn test_failed_outcome_has_error_prefix_and_zero_score() {
        let outcome = ReviewOutcome::failed("bob.docx", "boom");
        assert_eq!(outcome.review_text, "[Error processing CV: boom]");
        assert_eq!(outcome.fit_score, 0);
        assert!(!outcome.score_detected);
    }
}
