// invoice-design-service/src/pubsub/handler.rs

use crate::config::PdfConfig;
use crate::designs::DesignVariant;
use crate::error::{DocumentError, Result};
use crate::generators::{DesignSelection, GeneratedHtml, InvoiceHtmlGenerator};
use crate::locale::LocaleCatalog;
use crate::models::{
    warning_strings, DocumentRender, GeneratedDocument, OutputTarget, RenderFailure,
    RenderRequest, RenderResponse,
};
use crate::renderers::{EmailRenderer, HtmlRenderer, PdfRenderer, TargetRenderer};
use base64::{engine::general_purpose, Engine as _};
use futures::future::join_all;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use tracing::{error, info, warn};

pub struct MessageHandler {
    generator: InvoiceHtmlGenerator,
    html_renderer: HtmlRenderer,
    email_renderer: EmailRenderer,
    pdf_renderer: PdfRenderer,
    default_design: String,
}

impl MessageHandler {
    pub fn new(
        catalog: Arc<LocaleCatalog>,
        pdf: &PdfConfig,
        default_design: impl Into<String>,
    ) -> Self {
        Self {
            generator: InvoiceHtmlGenerator::new(catalog.clone()),
            html_renderer: HtmlRenderer::new(),
            email_renderer: EmailRenderer::new(catalog),
            pdf_renderer: PdfRenderer::new(pdf),
            default_design: default_design.into(),
        }
    }

    pub async fn handle_message(&self, data: &[u8]) -> RenderResponse {
        // Parse the request
        let request: RenderRequest = match serde_json::from_slice(data) {
            Ok(req) => req,
            Err(e) => {
                let err = DocumentError::from(e);
                error!(error_type = err.error_type(), "Failed to parse request: {}", err);
                return RenderResponse::error(
                    "unknown".to_string(),
                    format!("Invalid request format: {}", err),
                    vec![],
                );
            }
        };

        self.handle_request(request).await
    }

    pub async fn handle_request(&self, request: RenderRequest) -> RenderResponse {
        let request_id = request
            .request_id
            .clone()
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

        let design = match &request.custom_design {
            Some(custom) => DesignSelection::Custom(DesignVariant::custom(
                custom.name.clone(),
                custom.head.clone(),
                custom.header.clone(),
                custom.body.clone(),
                custom.footer.clone(),
            )),
            None => DesignSelection::builtin(
                request
                    .design
                    .clone()
                    .unwrap_or_else(|| self.default_design.clone()),
            ),
        };

        info!(
            request_id = %request_id,
            design = %design_name(&design),
            targets = ?request.targets,
            document_count = request.documents.len(),
            "Processing render request"
        );

        if request.documents.is_empty() || request.targets.is_empty() {
            warn!(request_id = %request_id, "Request has no documents or no targets");
            return RenderResponse::error(
                request_id,
                "Request must name at least one document and one target".to_string(),
                vec![],
            );
        }

        let results = join_all(
            request
                .documents
                .iter()
                .map(|item| self.render_document(&request_id, &design, item, &request.targets)),
        )
        .await;

        let mut documents = Vec::new();
        let mut failures = Vec::new();
        for (generated, failed) in results {
            documents.extend(generated);
            failures.extend(failed);
        }

        if documents.is_empty() {
            error!(
                request_id = %request_id,
                failures = failures.len(),
                "Failed to generate any documents"
            );
            return RenderResponse::error(
                request_id,
                "Failed to generate any documents".to_string(),
                failures,
            );
        }

        info!(
            request_id = %request_id,
            document_count = documents.len(),
            failure_count = failures.len(),
            "Successfully generated documents"
        );

        RenderResponse::success(request_id, documents, failures)
    }

    fn renderer_for(&self, target: OutputTarget) -> &dyn TargetRenderer {
        match target {
            OutputTarget::Preview => &self.html_renderer,
            OutputTarget::Email => &self.email_renderer,
            OutputTarget::Pdf => &self.pdf_renderer,
        }
    }

    async fn render_document(
        &self,
        request_id: &str,
        design: &DesignSelection,
        item: &DocumentRender,
        targets: &[OutputTarget],
    ) -> (Vec<GeneratedDocument>, Vec<RenderFailure>) {
        let number = item.document.number.clone();

        let generated =
            match self
                .generator
                .generate(design, &item.document, item.recipient.as_ref())
            {
                Ok(generated) => generated,
                Err(e) => {
                    warn!(
                        request_id = %request_id,
                        document_number = %number,
                        error = %e,
                        "Failed to generate document"
                    );
                    return (vec![], vec![failure(number, None, &e)]);
                }
            };

        let mut documents = Vec::new();
        let mut failures = Vec::new();

        for target in targets {
            match self.render_target(*target, &generated).await {
                Ok(doc) => documents.push(doc),
                Err(e) => {
                    // Continue with other targets instead of failing completely
                    warn!(
                        request_id = %request_id,
                        document_number = %number,
                        target = %target,
                        error = %e,
                        "Failed to render target"
                    );
                    failures.push(failure(number.clone(), Some(*target), &e));
                }
            }
        }

        (documents, failures)
    }

    async fn render_target(
        &self,
        target: OutputTarget,
        generated: &GeneratedHtml,
    ) -> Result<GeneratedDocument> {
        let rendered = self.renderer_for(target).render(generated).await?;

        let content_base64 = general_purpose::STANDARD.encode(&rendered.bytes);
        let sha256 = hex::encode(Sha256::digest(&rendered.bytes));
        let size_bytes = rendered.bytes.len();

        let suffix = match target {
            OutputTarget::Email => "-email",
            OutputTarget::Preview | OutputTarget::Pdf => "",
        };
        let filename = format!(
            "{}-{}{}.{}",
            generated.kind.key(),
            file_stem(&generated.number),
            suffix,
            rendered.extension
        );

        Ok(GeneratedDocument {
            document_number: generated.number.clone(),
            target,
            content_base64,
            filename,
            mime_type: rendered.mime_type.to_string(),
            size_bytes,
            sha256,
            subject: rendered.subject,
            warnings: warning_strings(&generated.warnings),
        })
    }
}

fn design_name(design: &DesignSelection) -> &str {
    match design {
        DesignSelection::Builtin(name) => name.as_str(),
        DesignSelection::Custom(variant) => variant.name.as_ref(),
    }
}

fn failure(document_number: String, target: Option<OutputTarget>, e: &DocumentError) -> RenderFailure {
    let response = e.to_error_response();
    RenderFailure {
        document_number,
        target,
        error: response.error,
        error_type: response.error_type,
    }
}

/// File-name-safe form of a document number.
fn file_stem(number: &str) -> String {
    let stem: String = number
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '-'
            }
        })
        .collect();
    if stem.is_empty() {
        "document".to_string()
    } else {
        stem
    }
}
