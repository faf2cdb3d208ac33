//! Submission request and response bodies.

use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationErrors};

use crate::Theme;

/// Body of `POST /api/github/stars`.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SubmitStarsRequest {
    #[validate(length(min = 1, message = "Repository owner cannot be empty"))]
    pub owner: String,

    #[validate(length(min = 1, message = "Repository name cannot be empty"))]
    pub repo: String,

    #[serde(default)]
    pub theme: Theme,
}

impl SubmitStarsRequest {
    pub fn new(owner: impl Into<String>, repo: impl Into<String>, theme: Theme) -> Self {
        Self {
            owner: owner.into(),
            repo: repo.into(),
            theme,
        }
    }

    /// Validate and return the first human-readable message on failure.
    pub fn check(&self) -> Result<(), String> {
        self.validate().map_err(|e| first_message(&e))
    }
}

fn first_message(errors: &ValidationErrors) -> String {
    // Report in field declaration order so "owner" wins over "repo".
    for field in ["owner", "repo"] {
        if let Some(list) = errors.field_errors().get(field) {
            if let Some(message) = list.iter().find_map(|e| e.message.as_ref()) {
                return message.to_string();
            }
        }
    }
    "Invalid request body".to_string()
}

/// Successful submission response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitStarsResponse {
    pub success: bool,
    pub message: String,
    pub job_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_theme_defaults_to_dark() {
        let req: SubmitStarsRequest =
            serde_json::from_str(r#"{"owner":"octocat","repo":"Hello-World"}"#).unwrap();
        assert_eq!(req.theme, Theme::Dark);
        assert!(req.check().is_ok());
    }

    #[test]
    fn test_unknown_theme_rejected() {
        let result: Result<SubmitStarsRequest, _> =
            serde_json::from_str(r#"{"owner":"o","repo":"r","theme":"blue"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_empty_fields_rejected() {
        let req = SubmitStarsRequest::new("", "x", Theme::Dark);
        assert_eq!(req.check().unwrap_err(), "Repository owner cannot be empty");

        let req = SubmitStarsRequest::new("o", "", Theme::Light);
        assert_eq!(req.check().unwrap_err(), "Repository name cannot be empty");

        let req = SubmitStarsRequest::new("", "", Theme::Light);
        assert_eq!(req.check().unwrap_err(), "Repository owner cannot be empty");
    }

    #[test]
    fn test_response_uses_camel_case() {
        let resp = SubmitStarsResponse {
            success: true,
            message: "ok".into(),
            job_id: "o-r-1".into(),
        };
        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json["jobId"], "o-r-1");
    }
}
