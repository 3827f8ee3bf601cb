// invoice-design-service/src/renderers/pdf.rs

use crate::config::PdfConfig;
use crate::error::{DocumentError, Result};
use crate::generators::GeneratedHtml;
use crate::renderers::{RenderedTarget, TargetRenderer};
use async_trait::async_trait;
use std::io::Write;
use std::time::Duration;
use tempfile::Builder;
use tokio::fs;
use tokio::process::Command;
use tracing::{debug, info};

/// Converts HTML to PDF with an external command such as `wkhtmltopdf`.
///
/// The command is run as `<command> <args...> <input.html> <output.pdf>`.
pub struct PdfRenderer {
    command: String,
    args: Vec<String>,
    timeout: Duration,
}

impl PdfRenderer {
    pub fn new(config: &PdfConfig) -> Self {
        Self {
            command: config.command.clone(),
            args: config.args.clone(),
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }
}

#[async_trait]
impl TargetRenderer for PdfRenderer {
    async fn render(&self, generated: &GeneratedHtml) -> Result<RenderedTarget> {
        info!(document_number = %generated.number, "Rendering PDF document");

        let mut html_file = Builder::new().suffix(".html").tempfile()?;
        let pdf_file = Builder::new().suffix(".pdf").tempfile()?;

        html_file.write_all(generated.html.as_bytes())?;
        html_file.flush()?;

        debug!("HTML written to: {:?}", html_file.path());

        let mut cmd = Command::new(&self.command);
        cmd.args(&self.args)
            .arg(html_file.path())
            .arg(pdf_file.path())
            .kill_on_drop(true);

        debug!("Running PDF converter: {:?}", cmd);

        let output = tokio::time::timeout(self.timeout, cmd.output())
            .await
            .map_err(|_| {
                DocumentError::PdfConversion(format!(
                    "{} timed out after {}s",
                    self.command,
                    self.timeout.as_secs()
                ))
            })?
            .map_err(|e| DocumentError::PdfConversion(format!("{}: {}", self.command, e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(DocumentError::PdfConversion(stderr.trim().to_string()));
        }

        let pdf_bytes = fs::read(pdf_file.path()).await?;
        if pdf_bytes.is_empty() {
            return Err(DocumentError::PdfConversion(format!(
                "{} produced an empty file",
                self.command
            )));
        }

        info!(
            document_number = %generated.number,
            size_kb = pdf_bytes.len() / 1024,
            "PDF generated successfully"
        );

        Ok(RenderedTarget {
            bytes: pdf_bytes,
            mime_type: "application/pdf",
            extension: "pdf",
            subject: None,
        })
    }
}
