// invoice-design-service/src/models.rs

use crate::document::{Contact, Document};
use crate::substitution::ResolutionWarning;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Where a rendered document is going.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputTarget {
    Preview,
    Email,
    Pdf,
}

impl OutputTarget {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputTarget::Preview => "preview",
            OutputTarget::Email => "email",
            OutputTarget::Pdf => "pdf",
        }
    }
}

impl std::fmt::Display for OutputTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

fn default_targets() -> Vec<OutputTarget> {
    vec![OutputTarget::Preview]
}

/// Request-supplied design. Rendered with the same restricted grammar as
/// the built-in designs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomDesign {
    #[serde(default = "default_custom_name")]
    pub name: String,
    #[serde(default)]
    pub head: String,
    #[serde(default)]
    pub header: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub footer: String,
}

fn default_custom_name() -> String {
    "Custom".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentRender {
    pub document: Document,
    #[serde(default)]
    pub recipient: Option<Contact>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderRequest {
    #[serde(default)]
    pub request_id: Option<String>,
    /// Built-in design name; the configured default when absent.
    #[serde(default)]
    pub design: Option<String>,
    /// Takes precedence over `design`.
    #[serde(default)]
    pub custom_design: Option<CustomDesign>,
    #[serde(default = "default_targets")]
    pub targets: Vec<OutputTarget>,
    pub documents: Vec<DocumentRender>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedDocument {
    pub document_number: String,
    pub target: OutputTarget,
    pub content_base64: String,
    pub filename: String,
    pub mime_type: String,
    pub size_bytes: usize,
    pub sha256: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderFailure {
    pub document_number: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub target: Option<OutputTarget>,
    pub error: String,
    pub error_type: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderResponse {
    pub request_id: String,
    pub status: String,
    pub documents: Vec<GeneratedDocument>,
    #[serde(default)]
    pub failures: Vec<RenderFailure>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub generated_at: DateTime<Utc>,
}

impl RenderResponse {
    /// `partial` when some documents failed, `success` otherwise.
    pub fn success(
        request_id: String,
        documents: Vec<GeneratedDocument>,
        failures: Vec<RenderFailure>,
    ) -> Self {
        let status = if failures.is_empty() { "success" } else { "partial" };
        Self {
            request_id,
            status: status.to_string(),
            documents,
            failures,
            error: None,
            generated_at: Utc::now(),
        }
    }

    pub fn error(request_id: String, error: String, failures: Vec<RenderFailure>) -> Self {
        Self {
            request_id,
            status: "error".to_string(),
            documents: vec![],
            failures,
            error: Some(error),
            generated_at: Utc::now(),
        }
    }
}

pub(crate) fn warning_strings(warnings: &[ResolutionWarning]) -> Vec<String> {
    warnings.iter().map(ToString::to_string).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_defaults_to_preview() {
        let request: RenderRequest = serde_json::from_value(serde_json::json!({
            "documents": [{
                "document": {
                    "number": "INV-1",
                    "customer": { "name": "Acme" },
                    "company": { "name": "Widgets Ltd" }
                }
            }]
        }))
        .unwrap();
        assert_eq!(request.targets, vec![OutputTarget::Preview]);
        assert!(request.design.is_none());
        assert!(request.documents[0].recipient.is_none());
    }

    #[test]
    fn targets_use_snake_case() {
        let targets: Vec<OutputTarget> =
            serde_json::from_str(r#"["preview", "email", "pdf"]"#).unwrap();
        assert_eq!(
            targets,
            vec![OutputTarget::Preview, OutputTarget::Email, OutputTarget::Pdf]
        );
        assert!(serde_json::from_str::<OutputTarget>(r#""markRead""#).is_err());
    }

    #[test]
    fn partial_status_when_some_documents_fail() {
        let failure = RenderFailure {
            document_number: "INV-2".to_string(),
            target: None,
            error: "boom".to_string(),
            error_type: "invalid_data".to_string(),
        };
        let response = RenderResponse::success("r1".to_string(), vec![], vec![failure]);
        assert_eq!(response.status, "partial");
    }
}
