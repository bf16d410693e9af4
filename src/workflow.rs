//! The "Generate" operation: ledger update, render and write, with every
//! failure turned into one message for the user.

use std::path::PathBuf;

use serde::Serialize;
use time::macros::format_description;
use time::Date;

use crate::config::Config;
use crate::error::{GenerateError, LedgerError};
use crate::invoice::{invoice_file_name, render_invoice, write_invoice};
use crate::ledger::LedgerStore;

#[derive(Debug, Clone)]
pub struct InvoiceRequest {
    pub property: String,
    pub tenant: String,
    pub billing_date: Date,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedInvoice {
    pub number: u64,
    pub path: PathBuf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum MessageKind {
    Success,
    Error,
}

/// What the front end shows after an operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserMessage {
    pub kind: MessageKind,
    pub text: String,
}

impl UserMessage {
    pub fn success(text: impl Into<String>) -> Self {
        Self {
            kind: MessageKind::Success,
            text: text.into(),
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            kind: MessageKind::Error,
            text: text.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.kind == MessageKind::Error
    }
}

impl From<&GenerateError> for UserMessage {
    fn from(err: &GenerateError) -> Self {
        match err {
            GenerateError::Selection | GenerateError::InvalidDate(_) => UserMessage::error(err.to_string()),
            GenerateError::Ledger(LedgerError::NoMatchingTenant(_)) => {
                UserMessage::error("No matching tenant data found.")
            }
            GenerateError::Ledger(e) => UserMessage::error(format!("Error: {e}")),
            GenerateError::Render(_) => UserMessage::error("Failed to generate invoice."),
        }
    }
}

/// Accepts `MM-DD-YYYY`, `MM/DD/YYYY` and the calendar's `MM/DD/YY`.
pub fn parse_billing_date(text: &str) -> Result<Date, GenerateError> {
    let text = text.trim();
    let dashed = format_description!("[month]-[day]-[year]");
    let slashed = format_description!("[month]/[day]/[year]");

    if let Ok(date) = Date::parse(text, &dashed).or_else(|_| Date::parse(text, &slashed)) {
        return Ok(date);
    }
    parse_short_date(text).ok_or_else(|| GenerateError::InvalidDate(text.to_string()))
}

// `time` cannot resolve a two-digit year on its own; the date picker's
// years are always 20xx.
fn parse_short_date(text: &str) -> Option<Date> {
    let mut parts = text.split('/');
    let month: u8 = parts.next()?.parse().ok()?;
    let day: u8 = parts.next()?.parse().ok()?;
    let year_text = parts.next()?;
    if parts.next().is_some() || year_text.len() != 2 {
        return None;
    }
    let year = 2000 + year_text.parse::<i32>().ok()?;
    let month = time::Month::try_from(month).ok()?;
    Date::from_calendar_date(year, month, day).ok()
}

/// Allocates the next invoice number for the tenant and writes its PDF.
///
/// The ledger is saved before rendering. If rendering or writing fails the
/// number stays allocated and no PDF exists for it.
pub fn generate(config: &Config, request: &InvoiceRequest) -> Result<GeneratedInvoice, GenerateError> {
    if request.property.trim().is_empty() || request.tenant.trim().is_empty() {
        return Err(GenerateError::Selection);
    }

    let store = LedgerStore::new(config.ledger_path());
    let mut document = store.load_or_empty()?;

    let record = document.find_record_mut(&request.tenant)?;
    record.set_date(request.billing_date);
    let number = record.allocate_next_invoice_number()?;
    let invoice_data = record.for_invoice(number);

    store.save(&document)?;
    tracing::info!(number, tenant = %request.tenant, "invoice number allocated");

    let bytes = render_invoice(&config.template_path(), &invoice_data, &config.layout)?;
    let path = config.output_directory().join(invoice_file_name(number));
    write_invoice(&path, &bytes)?;

    tracing::info!(number, path = %path.display(), "invoice generated");
    Ok(GeneratedInvoice { number, path })
}

/// Runs `generate` and reports the outcome as a message. Never fails.
pub fn submit(config: &Config, request: &InvoiceRequest) -> UserMessage {
    match generate(config, request) {
        Ok(invoice) => UserMessage::success(format!("Invoice {} generated successfully!", invoice.number)),
        Err(e) => {
            tracing::error!(error = %e, property = %request.property, tenant = %request.tenant, "invoice generation failed");
            UserMessage::from(&e)
        }
    }
}

/// Form entry point: the billing date arrives as typed text. A date that
/// does not parse is reported and logged like any other generation failure.
pub fn submit_form(config: &Config, property: &str, tenant: &str, date_text: &str) -> UserMessage {
    match parse_billing_date(date_text) {
        Ok(billing_date) => submit(
            config,
            &InvoiceRequest {
                property: property.to_string(),
                tenant: tenant.to_string(),
                billing_date,
            },
        ),
        Err(e) => {
            tracing::error!(error = %e, property, tenant, "invoice generation failed");
            UserMessage::from(&e)
        }
    }
}
