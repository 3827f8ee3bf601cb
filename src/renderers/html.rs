// invoice-design-service/src/renderers/html.rs

use crate::error::Result;
use crate::generators::GeneratedHtml;
use crate::renderers::{RenderedTarget, TargetRenderer};
use async_trait::async_trait;
use tracing::info;

/// In-browser preview: the HTML as rendered.
pub struct HtmlRenderer;

impl HtmlRenderer {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl TargetRenderer for HtmlRenderer {
    async fn render(&self, generated: &GeneratedHtml) -> Result<RenderedTarget> {
        info!(
            document_number = %generated.number,
            size_bytes = generated.html.len(),
            "Rendering HTML preview"
        );

        Ok(RenderedTarget {
            bytes: generated.html.as_bytes().to_vec(),
            mime_type: "text/html; charset=utf-8",
            extension: "html",
            subject: None,
        })
    }
}
