// invoice-design-service/src/lib.rs

//! Renders invoices, quotes and credits through named HTML designs.
//!
//! The pipeline is: pick a [`designs::DesignVariant`], [`compositor::compose`]
//! its fragments, [`resolver::Resolver::resolve`] the document into labels,
//! values and line-item rows, then render the composed template with the
//! restricted [`template`] engine. [`generators::InvoiceHtmlGenerator`] runs
//! those steps; [`renderers`] package the HTML for preview, email or PDF.

pub mod compositor;
pub mod config;
pub mod designs;
pub mod document;
pub mod error;
pub mod generators;
pub mod locale;
pub mod models;
pub mod pubsub;
pub mod renderers;
pub mod resolver;
pub mod substitution;
pub mod template;
