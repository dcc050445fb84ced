//! Waste and shrinkage

use std::collections::BTreeMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{label_or, UNCATEGORIZED, UNKNOWN_ITEM};
use crate::models::WasteRecord;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WasteRow {
    pub id: Uuid,
    pub item_name: String,
    pub category: String,
    pub quantity: Decimal,
    pub value: Decimal,
    pub date: NaiveDate,
    pub reason: Option<String>,
    pub recorded_by: Option<String>,
}

/// Waste value totals keyed by category
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WasteByCategory {
    pub categories: BTreeMap<String, Decimal>,
    pub total_value: Decimal,
    pub skipped_records: usize,
}

/// One row per waste record, in input order
pub fn waste_report(records: &[WasteRecord]) -> Vec<WasteRow> {
    records
        .iter()
        .map(|record| WasteRow {
            id: record.id,
            item_name: label_or(record.item_name.as_deref(), UNKNOWN_ITEM),
            category: label_or(record.category.as_deref(), UNCATEGORIZED),
            quantity: record.quantity,
            value: record.value,
            date: record.date,
            reason: record.reason.clone(),
            recorded_by: record.recorded_by.clone(),
        })
        .collect()
}

/// Total waste value per category. Negative values, and values that would
/// overflow a total, are skipped.
pub fn waste_by_category(records: &[WasteRecord]) -> WasteByCategory {
    let mut summary = WasteByCategory::default();

    for record in records {
        if record.value < Decimal::ZERO {
            tracing::warn!(waste_id = %record.id, value = %record.value, "skipping waste record with negative value");
            summary.skipped_records += 1;
            continue;
        }
        let category = label_or(record.category.as_deref(), UNCATEGORIZED);
        let category_total = summary.categories.get(&category).copied().unwrap_or_default();
        let (Some(category_total), Some(total_value)) = (
            category_total.checked_add(record.value),
            summary.total_value.checked_add(record.value),
        ) else {
            tracing::warn!(
                waste_id = %record.id,
                value = %record.value,
                "skipping waste record that overflows the totals"
            );
            summary.skipped_records += 1;
            continue;
        };
        summary.categories.insert(category, category_total);
        summary.total_value = total_value;
    }

    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn waste(category: Option<&str>, value: &str) -> WasteRecord {
        WasteRecord {
            id: Uuid::new_v4(),
            item_id: None,
            item_name: Some("Milk".to_string()),
            category: category.map(str::to_string),
            quantity: Decimal::ONE,
            value: dec(value),
            date: NaiveDate::from_ymd_opt(2024, 2, 3).unwrap(),
            reason: Some("expired".to_string()),
            recorded_by: None,
        }
    }

    #[test]
    fn totals_by_category() {
        let records = vec![
            waste(Some("Dairy"), "4.50"),
            waste(Some("Dairy"), "1.50"),
            waste(Some("Produce"), "3"),
            waste(None, "2"),
        ];
        let summary = waste_by_category(&records);

        assert_eq!(summary.categories["Dairy"], dec("6.00"));
        assert_eq!(summary.categories["Produce"], dec("3"));
        assert_eq!(summary.categories[UNCATEGORIZED], dec("2"));
        assert_eq!(summary.total_value, dec("11.00"));
    }

    #[test]
    fn negative_values_are_skipped() {
        let summary = waste_by_category(&[waste(Some("Dairy"), "-1"), waste(Some("Dairy"), "2")]);
        assert_eq!(summary.skipped_records, 1);
        assert_eq!(summary.total_value, dec("2"));
    }

    #[test]
    fn overflowing_values_are_skipped() {
        let records = vec![
            waste(Some("Dairy"), "2"),
            waste(Some("Produce"), &Decimal::MAX.to_string()),
            waste(Some("Dairy"), "3"),
        ];
        let summary = waste_by_category(&records);
        assert_eq!(summary.skipped_records, 1);
        assert_eq!(summary.categories["Dairy"], dec("5"));
        assert!(!summary.categories.contains_key("Produce"));
        assert_eq!(summary.total_value, dec("5"));
    }

    #[test]
    fn rows_pass_through() {
        let rows = waste_report(&[waste(None, "2")]);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].category, UNCATEGORIZED);
        assert_eq!(rows[0].value, dec("2"));
    }
}
