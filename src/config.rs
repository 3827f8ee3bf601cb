// invoice-design-service/src/config.rs

use config::{Config as ConfigLoader, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub service: ServiceConfig,
    pub pubsub: PubSubConfig,
    pub rendering: RenderingConfig,
    pub locales: LocalesConfig,
    pub pdf: PdfConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
    pub name: String,
    pub log_level: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PubSubConfig {
    pub project_id: String,
    pub request_subscription: String,
    pub response_topic: String,
    pub max_concurrent_messages: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RenderingConfig {
    pub default_design: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LocalesConfig {
    pub fallback: String,
    /// Directory of `<code>.json` files merged over the embedded tables.
    #[serde(default)]
    pub path: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PdfConfig {
    pub command: String,
    #[serde(default = "default_pdf_args")]
    pub args: Vec<String>,
    pub timeout_secs: u64,
}

fn default_pdf_args() -> Vec<String> {
    vec!["--quiet".to_string(), "--encoding".to_string(), "utf-8".to_string()]
}

impl Default for PdfConfig {
    fn default() -> Self {
        Self {
            command: "wkhtmltopdf".to_string(),
            args: default_pdf_args(),
            timeout_secs: 30,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self, ConfigError> {
        let pdf = PdfConfig::default();
        let config = ConfigLoader::builder()
            // Start with default values
            .set_default("service.name", "invoice-design-service")?
            .set_default("service.log_level", "info")?
            .set_default("pubsub.project_id", "mcxtest")?
            .set_default("pubsub.request_subscription", "invoice-render-requests-sub")?
            .set_default("pubsub.response_topic", "invoice-render-results")?
            .set_default("pubsub.max_concurrent_messages", "10")?
            .set_default("rendering.default_design", "Modern")?
            .set_default("locales.fallback", "en")?
            .set_default("pdf.command", pdf.command)?
            .set_default("pdf.args", pdf.args)?
            .set_default("pdf.timeout_secs", pdf.timeout_secs.to_string())?
            // Load from config file if it exists
            .add_source(File::with_name("config").required(false))
            // Override with environment variables (e.g., SERVICE__PDF__COMMAND)
            .add_source(Environment::with_prefix("SERVICE").separator("__"))
            .build()?;

        config.try_deserialize()
    }
}
