//! GenInv: rental invoice generation for a small property portfolio.
//!
//! A JSON ledger keeps one record per property together with every invoice
//! number ever issued for it; invoices are produced by overlaying a record's
//! fields onto a one-page PDF template.

pub mod catalog;
pub mod config;
pub mod error;
pub mod invoice;
pub mod ledger;
pub mod preferences;
pub mod workflow;

pub use config::Config;
pub use error::{CatalogError, ConfigError, GenerateError, LedgerError, PreferencesError, RenderError};
pub use workflow::{generate, submit, submit_form, InvoiceRequest, UserMessage};
