// invoice-design-service/src/error.rs

use crate::template::RenderError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, DocumentError>;

#[derive(Error, Debug)]
pub enum DocumentError {
    #[error("Design not found: {0}")]
    DesignNotFound(String),

    #[error("Rendering error: {0}")]
    Render(#[from] RenderError),

    #[error("Subject template error: {0}")]
    SubjectTemplate(#[from] handlebars::RenderError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("PDF conversion error: {0}")]
    PdfConversion(String),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Locale data error: {0}")]
    LocaleData(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),
}

impl DocumentError {
    pub fn error_type(&self) -> &'static str {
        match self {
            DocumentError::DesignNotFound(_) => "design_not_found",
            DocumentError::Render(e) => e.error_type(),
            DocumentError::SubjectTemplate(_) => "subject_template_error",
            DocumentError::IoError(_) => "io_error",
            DocumentError::PdfConversion(_) => "pdf_conversion_error",
            DocumentError::SerializationError(_) => "serialization_error",
            DocumentError::LocaleData(_) => "locale_data_error",
            DocumentError::InvalidData(_) => "invalid_data",
        }
    }

    pub fn to_error_response(&self) -> ErrorResponse {
        ErrorResponse {
            error: self.to_string(),
            error_type: self.error_type().to_string(),
        }
    }
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub error_type: String,
}
