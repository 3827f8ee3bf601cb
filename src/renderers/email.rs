// invoice-design-service/src/renderers/email.rs

use crate::error::Result;
use crate::generators::GeneratedHtml;
use crate::locale::LocaleCatalog;
use crate::renderers::{RenderedTarget, TargetRenderer};
use async_trait::async_trait;
use handlebars::{no_escape, Handlebars};
use std::sync::Arc;
use tracing::{info, warn};

const DEFAULT_SUBJECT: &str = "{{number}}";

/// Email body plus a localized subject line.
///
/// Subjects come from the `email_subject_<kind>` translation and may use
/// `{{number}}`, `{{company}}`, `{{client}}` and `{{amount}}`. The subject is
/// plain text, so nothing is HTML-escaped.
pub struct EmailRenderer {
    catalog: Arc<LocaleCatalog>,
    handlebars: Handlebars<'static>,
}

impl EmailRenderer {
    pub fn new(catalog: Arc<LocaleCatalog>) -> Self {
        let mut handlebars = Handlebars::new();
        handlebars.set_strict_mode(false);
        handlebars.register_escape_fn(no_escape);

        Self {
            catalog,
            handlebars,
        }
    }

    pub fn subject(&self, generated: &GeneratedHtml) -> Result<String> {
        let locale = self.catalog.locale(Some(&generated.locale));
        let key = format!("email_subject_{}", generated.kind.key());
        let template = match locale.translate(&key) {
            Some(template) => template,
            None => {
                warn!(
                    locale = %generated.locale,
                    key = %key,
                    "Missing email subject translation"
                );
                DEFAULT_SUBJECT
            }
        };

        let context = serde_json::json!({
            "number": generated.number,
            "company": generated.company_name,
            "client": generated.client_name,
            "amount": generated.balance_due,
        });
        let subject = self.handlebars.render_template(template, &context)?;
        Ok(subject.trim().to_string())
    }
}

#[async_trait]
impl TargetRenderer for EmailRenderer {
    async fn render(&self, generated: &GeneratedHtml) -> Result<RenderedTarget> {
        let subject = self.subject(generated)?;

        info!(
            document_number = %generated.number,
            subject = %subject,
            "Rendering email body"
        );

        Ok(RenderedTarget {
            bytes: generated.html.as_bytes().to_vec(),
            mime_type: "text/html; charset=utf-8",
            extension: "html",
            subject: Some(subject),
        })
    }
}
