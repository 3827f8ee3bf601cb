// invoice-design-service/src/generators/mod.rs

use crate::compositor::compose;
use crate::designs::{get_variant, DesignVariant};
use crate::document::{Contact, Document, DocumentKind};
use crate::error::Result;
use crate::locale::LocaleCatalog;
use crate::resolver::Resolver;
use crate::substitution::ResolutionWarning;
use crate::template::Template;
use serde::Serialize;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{info, warn};

/// Which design a document is rendered with.
#[derive(Debug, Clone)]
pub enum DesignSelection {
    Builtin(String),
    Custom(DesignVariant),
}

impl DesignSelection {
    pub fn builtin(name: impl Into<String>) -> Self {
        DesignSelection::Builtin(name.into())
    }

    fn variant(&self) -> Result<&DesignVariant> {
        match self {
            DesignSelection::Builtin(name) => get_variant(name),
            DesignSelection::Custom(variant) => Ok(variant),
        }
    }
}

/// A rendered document plus what the output targets need to package it.
#[derive(Debug, Clone, Serialize)]
pub struct GeneratedHtml {
    pub html: String,
    pub design: String,
    pub locale: String,
    pub kind: DocumentKind,
    pub number: String,
    pub company_name: String,
    pub client_name: String,
    /// Formatted in the customer's currency, e.g. `$1,204.50`.
    pub balance_due: String,
    pub warnings: Vec<ResolutionWarning>,
    pub unresolved: BTreeSet<String>,
}

pub struct InvoiceHtmlGenerator {
    catalog: Arc<LocaleCatalog>,
}

impl InvoiceHtmlGenerator {
    pub fn new(catalog: Arc<LocaleCatalog>) -> Self {
        Self { catalog }
    }

    pub fn catalog(&self) -> &LocaleCatalog {
        &self.catalog
    }

    /// Look up the design, resolve the document and render the composed
    /// template. A template error fails this document only.
    pub fn generate(
        &self,
        design: &DesignSelection,
        document: &Document,
        recipient: Option<&Contact>,
    ) -> Result<GeneratedHtml> {
        let variant = design.variant()?;

        info!(
            design = %variant.name,
            document_number = %document.number,
            kind = document.kind.key(),
            "Generating document HTML"
        );

        document.check_amounts()?;
        let template = Template::parse(&compose(variant))?;
        let resolution = Resolver::new(&self.catalog).resolve(document, recipient);
        let substitutions = &resolution.substitutions;

        for warning in substitutions.warnings() {
            warn!(
                document_number = %document.number,
                placeholder = %warning.placeholder,
                reason = %warning.reason,
                "Placeholder resolution warning"
            );
        }

        let rendered = template.render(substitutions, &resolution.line_items)?;

        info!(
            design = %variant.name,
            document_number = %document.number,
            locale = %substitutions.locale(),
            size_bytes = rendered.html.len(),
            unresolved = rendered.unresolved.len(),
            "Document HTML generated"
        );

        Ok(GeneratedHtml {
            html: rendered.html,
            design: variant.name.to_string(),
            locale: substitutions.locale().to_string(),
            kind: document.kind,
            number: document.number.trim().to_string(),
            company_name: document.company.name.trim().to_string(),
            client_name: document.customer.name.trim().to_string(),
            balance_due: substitutions
                .get("$balance_due")
                .unwrap_or_default()
                .to_string(),
            warnings: substitutions.warnings().to_vec(),
            unresolved: rendered.unresolved,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{Company, Customer, LineItem};
    use crate::error::DocumentError;

    fn generator() -> InvoiceHtmlGenerator {
        InvoiceHtmlGenerator::new(Arc::new(LocaleCatalog::embedded("en").unwrap()))
    }

    fn document() -> Document {
        Document {
            number: "INV-7".to_string(),
            line_items: vec![LineItem {
                product_key: "Support".to_string(),
                quantity: 1.0,
                cost: 80.0,
                ..LineItem::default()
            }],
            customer: Customer {
                name: "Acme".to_string(),
                ..Customer::default()
            },
            company: Company {
                name: "Widgets Ltd".to_string(),
                ..Company::default()
            },
            ..Document::default()
        }
    }

    #[test]
    fn every_builtin_design_renders() {
        let generator = generator();
        for variant in crate::designs::variants() {
            let html = generator
                .generate(&DesignSelection::builtin(variant.name.as_ref()), &document(), None)
                .unwrap();
            assert!(html.html.contains("INV-7"), "{}", variant.name);
            assert!(html.html.contains("Support"), "{}", variant.name);
            assert_eq!(html.balance_due, "$80.00");
            assert!(html.unresolved.is_empty(), "{}: {:?}", variant.name, html.unresolved);
        }
    }

    #[test]
    fn unknown_design_fails() {
        let err = generator()
            .generate(&DesignSelection::builtin("Fancy"), &document(), None)
            .unwrap_err();
        assert!(matches!(err, DocumentError::DesignNotFound(_)));
    }

    #[test]
    fn oversized_amounts_fail_the_document() {
        let mut doc = document();
        doc.line_items.push(LineItem {
            product_key: "Fleet".to_string(),
            quantity: 1.0,
            cost: 9.0e16,
            ..LineItem::default()
        });
        doc.line_items[0].cost = 9.0e16;
        let err = generator()
            .generate(&DesignSelection::builtin("Modern"), &doc, None)
            .unwrap_err();
        assert!(matches!(err, DocumentError::InvalidData(_)));
    }

    #[test]
    fn custom_design_with_code_is_rejected() {
        let design = DesignSelection::Custom(DesignVariant::custom(
            "Mine",
            "<html><head></head>",
            "<body>@php echo 1; @endphp",
            "$number",
            "</body></html>",
        ));
        let err = generator().generate(&design, &document(), None).unwrap_err();
        assert_eq!(err.error_type(), "unsupported_construct");
    }
}
