use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use time::macros::format_description;
use time::Date;

use crate::error::LedgerError;

/// Text fields accept a JSON string, number or boolean and keep its textual form.
fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| value_text(&v)))
}

fn lenient_text_required<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(lenient_text(deserializer)?.unwrap_or_default())
}

fn value_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        other => Some(other.to_string()),
    }
}

/// Invoice numbers as stored: a legacy bare integer or the full history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum InvoiceNumbers {
    Single(u64),
    Sequence(Vec<u64>),
}

impl Default for InvoiceNumbers {
    fn default() -> Self {
        InvoiceNumbers::Sequence(Vec::new())
    }
}

fn invoice_numbers_or_empty<'de, D>(deserializer: D) -> Result<InvoiceNumbers, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<InvoiceNumbers>::deserialize(deserializer)?.unwrap_or_default())
}

impl InvoiceNumbers {
    /// Appends and returns `max + 1` (or `1` for an empty history), turning
    /// a legacy scalar into a sequence first.
    ///
    /// Not idempotent: every call issues a new number. Fails without
    /// touching the history once `u64::MAX` has been issued.
    pub fn allocate_next(&mut self) -> Result<u64, LedgerError> {
        let next = match self {
            InvoiceNumbers::Single(n) => n.checked_add(1),
            InvoiceNumbers::Sequence(seq) => seq.iter().copied().max().map_or(Some(1), |max| max.checked_add(1)),
        }
        .ok_or(LedgerError::InvoiceNumberExhausted)?;

        let mut seq = match std::mem::take(self) {
            InvoiceNumbers::Single(n) => vec![n],
            InvoiceNumbers::Sequence(seq) => seq,
        };
        seq.push(next);
        *self = InvoiceNumbers::Sequence(seq);
        Ok(next)
    }

    /// Most recently issued number, if any.
    pub fn latest(&self) -> Option<u64> {
        match self {
            InvoiceNumbers::Single(n) => Some(*n),
            InvoiceNumbers::Sequence(seq) => seq.last().copied(),
        }
    }
}

/// One `[description, amount]` row of an invoice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem(
    #[serde(deserialize_with = "lenient_text_required")] pub String,
    #[serde(deserialize_with = "lenient_text_required")] pub String,
);

impl LineItem {
    pub fn new(description: impl Into<String>, amount: impl Into<String>) -> Self {
        LineItem(description.into(), amount.into())
    }

    pub fn description(&self) -> &str {
        &self.0
    }

    pub fn amount(&self) -> &str {
        &self.1
    }
}

/// Billing and contact data of one property plus its invoice history.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PropertyRecord {
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub property_address1: Option<String>,
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub property_address2: Option<String>,
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(default, deserialize_with = "invoice_numbers_or_empty")]
    pub invoice_no: InvoiceNumbers,

    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub to_renter: Option<String>,
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub to_address: Option<String>,
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub to_city_state: Option<String>,
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub to_zip: Option<String>,
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub to_phone: Option<String>,
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub to_email: Option<String>,

    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub from_company: Option<String>,
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub from_email: Option<String>,
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub from_phone: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line_items: Option<Vec<LineItem>>,

    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub subtotal: Option<String>,
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub discount: Option<String>,
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub fees: Option<String>,
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub tax: Option<String>,
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub total: Option<String>,

    /// Keys this tool does not know about, kept verbatim for the next save.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// First comma-separated segment, trimmed. This is the tenant match key.
///
/// String matching is a known weakness: two tenants sharing a first name
/// segment collide. A stable record id would replace it.
pub fn renter_key(renter: &str) -> &str {
    renter.split(',').next().unwrap_or_default().trim()
}

impl PropertyRecord {
    /// Canonical tenant name: first comma segment of `to_renter`.
    pub fn renter_key(&self) -> Option<&str> {
        self.to_renter.as_deref().map(renter_key)
    }

    pub fn matches_tenant(&self, tenant_name: &str) -> bool {
        self.renter_key() == Some(renter_key(tenant_name))
    }

    pub fn allocate_next_invoice_number(&mut self) -> Result<u64, LedgerError> {
        self.invoice_no.allocate_next()
    }

    /// Stores the billing date as `MM-DD-YYYY`.
    pub fn set_date(&mut self, date: Date) {
        self.date = Some(format_ledger_date(date));
    }

    /// Copy of this record carrying only `number` as its invoice number,
    /// which is what gets drawn on the invoice.
    pub fn for_invoice(&self, number: u64) -> PropertyRecord {
        PropertyRecord {
            invoice_no: InvoiceNumbers::Single(number),
            ..self.clone()
        }
    }

    /// Display text of a scalar field by its JSON key.
    ///
    /// `invoice_no` renders as the latest number; `line_items` is not a
    /// scalar field and yields `None`. Unknown keys fall back to `extra`.
    pub fn field_text(&self, key: &str) -> Option<String> {
        let known = match key {
            "property_address1" => &self.property_address1,
            "property_address2" => &self.property_address2,
            "date" => &self.date,
            "to_renter" => &self.to_renter,
            "to_address" => &self.to_address,
            "to_city_state" => &self.to_city_state,
            "to_zip" => &self.to_zip,
            "to_phone" => &self.to_phone,
            "to_email" => &self.to_email,
            "from_company" => &self.from_company,
            "from_email" => &self.from_email,
            "from_phone" => &self.from_phone,
            "subtotal" => &self.subtotal,
            "discount" => &self.discount,
            "fees" => &self.fees,
            "tax" => &self.tax,
            "total" => &self.total,
            "invoice_no" => return self.invoice_no.latest().map(|n| n.to_string()),
            "line_items" => return None,
            other => return self.extra.get(other).and_then(value_text),
        };
        known.clone()
    }
}

pub fn format_ledger_date(date: Date) -> String {
    format!(
        "{:02}-{:02}-{:04}",
        u8::from(date.month()),
        date.day(),
        date.year()
    )
}

/// Parses a stored `MM-DD-YYYY` date.
pub fn parse_ledger_date(text: &str) -> Option<Date> {
    let format = format_description!("[month]-[day]-[year]");
    Date::parse(text.trim(), &format).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::Month;

    fn record_with(numbers: InvoiceNumbers) -> PropertyRecord {
        PropertyRecord {
            to_renter: Some("Hector Garcia, Spouse".to_string()),
            invoice_no: numbers,
            ..Default::default()
        }
    }

    #[test]
    fn allocation_appends_next_after_existing() {
        let mut record = record_with(InvoiceNumbers::Sequence(vec![28]));
        assert_eq!(record.allocate_next_invoice_number().unwrap(), 29);
        assert_eq!(record.invoice_no, InvoiceNumbers::Sequence(vec![28, 29]));
    }

    #[test]
    fn allocation_normalizes_legacy_scalar() {
        let mut record = record_with(InvoiceNumbers::Single(5));
        assert_eq!(record.allocate_next_invoice_number().unwrap(), 6);
        assert_eq!(record.invoice_no, InvoiceNumbers::Sequence(vec![5, 6]));
    }

    #[test]
    fn allocation_starts_at_one_when_empty() {
        let mut record = record_with(InvoiceNumbers::Sequence(Vec::new()));
        assert_eq!(record.allocate_next_invoice_number().unwrap(), 1);
        assert_eq!(record.invoice_no, InvoiceNumbers::Sequence(vec![1]));
    }

    #[test]
    fn allocation_is_not_idempotent() {
        let mut record = record_with(InvoiceNumbers::Sequence(vec![3, 4]));
        assert_eq!(record.allocate_next_invoice_number().unwrap(), 5);
        assert_eq!(record.allocate_next_invoice_number().unwrap(), 6);
        assert_eq!(record.invoice_no.latest(), Some(6));
    }

    #[test]
    fn allocation_follows_the_maximum() {
        let mut numbers = InvoiceNumbers::Sequence(vec![10, 12, 11]);
        assert_eq!(numbers.allocate_next().unwrap(), 13);
    }

    #[test]
    fn allocation_refuses_to_wrap_past_the_largest_number() {
        let mut record: PropertyRecord = serde_json::from_str(r#"{"invoice_no": [18446744073709551615]}"#).unwrap();
        assert!(matches!(
            record.allocate_next_invoice_number(),
            Err(LedgerError::InvoiceNumberExhausted)
        ));
        assert_eq!(record.invoice_no, InvoiceNumbers::Sequence(vec![u64::MAX]));

        let mut legacy = InvoiceNumbers::Single(u64::MAX);
        assert!(legacy.allocate_next().is_err());
        assert_eq!(legacy, InvoiceNumbers::Single(u64::MAX));
    }

    #[test]
    fn tenant_match_uses_first_comma_segment() {
        let record = record_with(InvoiceNumbers::default());
        assert!(record.matches_tenant("Hector Garcia"));
        assert!(record.matches_tenant("  Hector Garcia , Someone Else"));
        assert!(!record.matches_tenant("hector garcia"));
        assert!(!record.matches_tenant("Spouse"));
    }

    #[test]
    fn set_date_writes_month_day_year() {
        let mut record = PropertyRecord::default();
        let date = Date::from_calendar_date(2024, Month::September, 3).unwrap();
        record.set_date(date);
        assert_eq!(record.date.as_deref(), Some("09-03-2024"));
        assert_eq!(parse_ledger_date("09-03-2024"), Some(date));
    }

    #[test]
    fn deserializes_legacy_and_lenient_fields() {
        let json = r#"{
            "to_renter": "X",
            "invoice_no": 5,
            "to_zip": 90280,
            "line_items": [["Rent", "$1500.00"], ["Water", 42]],
            "custom_note": "keep me"
        }"#;
        let record: PropertyRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.invoice_no, InvoiceNumbers::Single(5));
        assert_eq!(record.to_zip.as_deref(), Some("90280"));
        let items = record.line_items.as_ref().unwrap();
        assert_eq!(items[1], LineItem::new("Water", "42"));
        assert_eq!(record.field_text("custom_note").as_deref(), Some("keep me"));
    }

    #[test]
    fn missing_or_null_invoice_no_is_empty_history() {
        let absent: PropertyRecord = serde_json::from_str(r#"{"to_renter": "X"}"#).unwrap();
        assert_eq!(absent.invoice_no, InvoiceNumbers::Sequence(Vec::new()));

        let null: PropertyRecord =
            serde_json::from_str(r#"{"to_renter": "X", "invoice_no": null}"#).unwrap();
        assert_eq!(null.invoice_no, InvoiceNumbers::Sequence(Vec::new()));
    }

    #[test]
    fn invoice_copy_shows_only_the_new_number() {
        let record = record_with(InvoiceNumbers::Sequence(vec![28, 29]));
        let copy = record.for_invoice(29);
        assert_eq!(copy.field_text("invoice_no").as_deref(), Some("29"));
        assert_eq!(record.invoice_no, InvoiceNumbers::Sequence(vec![28, 29]));
        assert_eq!(copy.field_text("line_items"), None);
        assert_eq!(copy.field_text("tax"), None);
    }
}
