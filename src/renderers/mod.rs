// invoice-design-service/src/renderers/mod.rs

mod email;
mod html;
mod pdf;

use crate::error::Result;
use crate::generators::GeneratedHtml;
use async_trait::async_trait;

pub use email::EmailRenderer;
pub use html::HtmlRenderer;
pub use pdf::PdfRenderer;

/// Bytes produced for one output target.
#[derive(Debug, Clone)]
pub struct RenderedTarget {
    pub bytes: Vec<u8>,
    pub mime_type: &'static str,
    pub extension: &'static str,
    pub subject: Option<String>,
}

/// Packages generated HTML for one kind of output.
#[async_trait]
pub trait TargetRenderer: Send + Sync {
    async fn render(&self, generated: &GeneratedHtml) -> Result<RenderedTarget>;
}
