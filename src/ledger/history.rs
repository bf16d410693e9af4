use std::cmp::Reverse;

use serde::Serialize;

use super::record::{parse_ledger_date, renter_key, InvoiceNumbers};
use super::store::LedgerDocument;

/// One row of the invoice history view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistoryEntry {
    pub date: String,
    pub invoice_no: u64,
    pub property: String,
    pub tenant: String,
    pub amount: String,
}

/// Every issued invoice, newest first by (date, number).
///
/// Records still holding a legacy scalar number are not listed. Rows whose
/// date does not parse sort after all dated rows.
pub fn invoice_history(document: &LedgerDocument) -> Vec<HistoryEntry> {
    let mut entries: Vec<HistoryEntry> = Vec::new();
    for prop in &document.properties {
        let InvoiceNumbers::Sequence(numbers) = &prop.invoice_no else {
            continue;
        };
        for &number in numbers {
            entries.push(HistoryEntry {
                date: prop.date.clone().unwrap_or_default(),
                invoice_no: number,
                property: prop.property_address1.clone().unwrap_or_default(),
                tenant: prop.to_renter.as_deref().map(renter_key).unwrap_or_default().to_string(),
                amount: prop.total.clone().unwrap_or_default(),
            });
        }
    }

    entries.sort_by_key(|e| Reverse((parse_ledger_date(&e.date), e.invoice_no)));
    entries
}

/// Latest invoice number of the property named `property_name`.
///
/// Only the part before the first comma is compared, as a substring of
/// `property_address1` (catalog names look like "3306 Seminole Ave, Lynwood Property").
pub fn current_invoice_number(document: &LedgerDocument, property_name: &str) -> Option<u64> {
    let short = renter_key(property_name);
    if short.is_empty() {
        return None;
    }
    document
        .properties
        .iter()
        .find(|p| {
            p.property_address1
                .as_deref()
                .is_some_and(|addr| addr.contains(short))
        })
        .and_then(|p| p.invoice_no.latest())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn document() -> LedgerDocument {
        serde_json::from_str(
            r#"{
                "properties": [
                    {
                        "property_address1": "3306 Seminole Ave",
                        "date": "09-13-2024",
                        "invoice_no": [27, 28],
                        "to_renter": "Hector Garcia, Maria Garcia",
                        "total": "$1500.00"
                    },
                    {
                        "property_address1": "10755 State St",
                        "date": "10-01-2024",
                        "invoice_no": [3],
                        "to_renter": "Ana Lopez",
                        "total": "$1200.00"
                    },
                    {
                        "property_address1": "10756 State St",
                        "date": "10-01-2024",
                        "invoice_no": 9,
                        "to_renter": "Legacy Tenant"
                    },
                    {
                        "property_address1": "10757 State St",
                        "date": "someday",
                        "invoice_no": [1],
                        "to_renter": "No Date"
                    }
                ]
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn history_is_newest_first_and_skips_scalars() {
        let rows = invoice_history(&document());
        let numbers: Vec<(u64, &str)> = rows
            .iter()
            .map(|r| (r.invoice_no, r.tenant.as_str()))
            .collect();
        assert_eq!(
            numbers,
            vec![
                (3, "Ana Lopez"),
                (28, "Hector Garcia"),
                (27, "Hector Garcia"),
                (1, "No Date"),
            ]
        );
        assert_eq!(rows[0].amount, "$1200.00");
        assert_eq!(rows[1].property, "3306 Seminole Ave");
    }

    #[test]
    fn current_number_uses_short_property_name() {
        let doc = document();
        assert_eq!(
            current_invoice_number(&doc, "3306 Seminole Ave, Lynwood Property"),
            Some(28)
        );
        assert_eq!(current_invoice_number(&doc, "10756 State St, Lynwood Property"), Some(9));
        assert_eq!(current_invoice_number(&doc, "1 Nowhere Rd, Nowhere"), None);
    }

    #[test]
    fn empty_ledger_has_no_history() {
        assert!(invoice_history(&LedgerDocument::default()).is_empty());
    }
}
