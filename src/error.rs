//! Error types for the ledger, the renderer and the generation workflow.
//!
//! Storage errors split into "unavailable" (missing or malformed document),
//! which callers may treat as a first-run state, and plain I/O failures.

use std::path::PathBuf;

use printpdf::lopdf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("ledger file not found: {}", .0.display())]
    Missing(PathBuf),

    #[error("ledger file {} is malformed: {source}", path.display())]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("ledger I/O failed on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize ledger: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("no matching tenant data found for {0:?}")]
    NoMatchingTenant(String),

    #[error("invoice numbers are exhausted for this record")]
    InvoiceNumberExhausted,
}

impl LedgerError {
    /// True for the "storage unavailable" kinds: absent or corrupt document.
    pub fn is_storage_unavailable(&self) -> bool {
        matches!(self, LedgerError::Missing(_) | LedgerError::Malformed { .. })
    }
}

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("template {} is unreadable: {source}", path.display())]
    TemplateUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("template is not a valid PDF: {0}")]
    TemplateInvalid(#[from] lopdf::Error),

    #[error("template has no pages")]
    EmptyTemplate,

    #[error("failed to encode PDF: {0}")]
    Encode(String),

    #[error("failed to write invoice {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("config {} is malformed: {source}", path.display())]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("unknown property: {0}")]
    UnknownProperty(String),

    #[error("The 'tenants' folder for {0} was not found.")]
    TenantsFolderMissing(String),

    #[error("failed to list {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Error)]
pub enum PreferencesError {
    #[error("Please select a property before setting a default tenant.")]
    MissingProperty,

    #[error("Please select a valid tenant before setting it as the default.")]
    MissingTenant,

    #[error("preferences file {} is malformed: {source}", path.display())]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to serialize preferences: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("preferences I/O failed on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("Please select both property and tenant.")]
    Selection,

    #[error("invalid billing date {0:?}, expected MM-DD-YYYY, MM/DD/YYYY or MM/DD/YY")]
    InvalidDate(String),

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error(transparent)]
    Render(#[from] RenderError),
}
