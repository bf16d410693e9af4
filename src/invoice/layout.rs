use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::ledger::PropertyRecord;

/// Where the line-item table starts and how it steps down the page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LineItemLayout {
    pub start_y: f32,
    pub line_height: f32,
    pub description_x: f32,
    pub amount_x: f32,
}

impl Default for LineItemLayout {
    fn default() -> Self {
        Self {
            start_y: 480.0,
            line_height: 20.0,
            description_x: 60.0,
            amount_x: 480.0,
        }
    }
}

/// Field name to page position, in PDF points from the bottom-left corner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoordinateMap {
    pub fields: BTreeMap<String, (f32, f32)>,
    pub line_items: LineItemLayout,
    pub font_size: f32,
}

const DEFAULT_FIELDS: &[(&str, f32, f32)] = &[
    ("date", 345.0, 742.0),
    ("invoice_no", 380.0, 725.0),
    ("property_address1", 425.0, 710.0),
    ("property_address2", 310.0, 695.0),
    // from
    ("from_company", 120.0, 652.0),
    ("from_email", 105.0, 635.0),
    ("from_phone", 105.0, 205.0),
    // bill to
    ("to_renter", 370.0, 652.0),
    ("to_address", 370.0, 617.0),
    ("to_city_state", 378.0, 600.0),
    ("to_zip", 333.0, 583.0),
    ("to_phone", 350.0, 567.0),
    ("to_email", 350.0, 549.0),
    // totals
    ("subtotal", 480.0, 243.0),
    ("discount", 480.0, 219.0),
    ("fees", 480.0, 197.0),
    ("tax", 480.0, 174.0),
    ("total", 480.0, 152.0),
];

impl Default for CoordinateMap {
    fn default() -> Self {
        Self {
            fields: DEFAULT_FIELDS
                .iter()
                .map(|&(name, x, y)| (name.to_string(), (x, y)))
                .collect(),
            line_items: LineItemLayout::default(),
            font_size: 10.0,
        }
    }
}

/// One string to draw at an absolute position.
#[derive(Debug, Clone, PartialEq)]
pub struct TextRun {
    pub x: f32,
    pub y: f32,
    pub text: String,
}

impl TextRun {
    fn new(x: f32, y: f32, text: impl Into<String>) -> Self {
        Self {
            x,
            y,
            text: text.into(),
        }
    }
}

/// Places every field the record and the map have in common, then the line
/// items as a two-column list.
///
/// There is no pagination: a long item list keeps descending past the
/// bottom of the page.
pub fn plan_overlay(record: &PropertyRecord, map: &CoordinateMap) -> Vec<TextRun> {
    let mut runs: Vec<TextRun> = map
        .fields
        .iter()
        .filter_map(|(name, &(x, y))| record.field_text(name).map(|text| TextRun::new(x, y, text)))
        .collect();

    if let Some(items) = &record.line_items {
        let table = &map.line_items;
        let mut y = table.start_y;
        for item in items {
            runs.push(TextRun::new(table.description_x, y, item.description()));
            runs.push(TextRun::new(table.amount_x, y, item.amount()));
            y -= table.line_height;
        }
    }

    runs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::{InvoiceNumbers, LineItem};

    fn record() -> PropertyRecord {
        PropertyRecord {
            date: Some("09-13-2024".to_string()),
            invoice_no: InvoiceNumbers::Single(29),
            to_renter: Some("Hector Garcia".to_string()),
            line_items: Some(vec![
                LineItem::new("Rent", "$1500.00"),
                LineItem::new("Fees", "$50.00"),
            ]),
            total: Some("$1550.00".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn two_line_items_give_two_rows() {
        let runs = plan_overlay(&record(), &CoordinateMap::default());

        let rows: Vec<(f32, f32, &str)> = runs
            .iter()
            .filter(|r| r.x == 60.0 || (r.x == 480.0 && r.y >= 400.0))
            .map(|r| (r.x, r.y, r.text.as_str()))
            .collect();
        assert_eq!(
            rows,
            vec![
                (60.0, 480.0, "Rent"),
                (480.0, 480.0, "$1500.00"),
                (60.0, 460.0, "Fees"),
                (480.0, 460.0, "$50.00"),
            ]
        );
        assert!(!runs.iter().any(|r| r.y == 440.0));
    }

    #[test]
    fn only_shared_fields_are_placed() {
        let mut map = CoordinateMap::default();
        map.fields.remove("to_renter");
        map.fields.insert("not_in_record".to_string(), (10.0, 10.0));

        let runs = plan_overlay(&record(), &map);
        let texts: Vec<&str> = runs.iter().map(|r| r.text.as_str()).collect();

        assert!(!texts.contains(&"Hector Garcia"));
        assert!(!runs.iter().any(|r| (r.x, r.y) == (10.0, 10.0)));
        assert!(texts.contains(&"09-13-2024"));
        assert!(texts.contains(&"29"));
        assert!(texts.contains(&"$1550.00"));
        // date, invoice_no, total plus two rows of two cells
        assert_eq!(runs.len(), 3 + 4);
    }

    #[test]
    fn long_item_lists_are_not_paginated() {
        let mut rec = record();
        rec.line_items = Some((0..30).map(|i| LineItem::new(format!("Item {i}"), "$1.00")).collect());

        let runs = plan_overlay(&rec, &CoordinateMap::default());
        let lowest = runs
            .iter()
            .filter(|r| r.x == 60.0)
            .map(|r| r.y)
            .fold(f32::MAX, f32::min);
        assert_eq!(lowest, 480.0 - 29.0 * 20.0);
    }

    #[test]
    fn map_overrides_merge_with_defaults() {
        let map: CoordinateMap =
            serde_json::from_str(r#"{ "font_size": 9, "line_items": { "start_y": 500 } }"#).unwrap();
        assert_eq!(map.font_size, 9.0);
        assert_eq!(map.line_items.start_y, 500.0);
        assert_eq!(map.line_items.line_height, 20.0);
        assert_eq!(map.fields.get("total"), Some(&(480.0, 152.0)));
    }
}
