//! Property ledger: the records, their invoice-number history and the JSON
//! file they live in. This module is the only writer of `invoice_no`.

pub mod history;
pub mod record;
pub mod store;

pub use history::{current_invoice_number, invoice_history, HistoryEntry};
pub use record::{InvoiceNumbers, LineItem, PropertyRecord};
pub use store::{LedgerDocument, LedgerStore};
