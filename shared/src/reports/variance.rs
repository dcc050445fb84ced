//! Controller count variance

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{label_or, UNKNOWN_ITEM};
use crate::models::CountRecord;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountVarianceRow {
    pub id: Uuid,
    pub item_name: String,
    pub expected: Decimal,
    pub counted: Decimal,
    /// `counted - expected`; negative means stock is missing
    pub variance: Decimal,
    pub date: NaiveDate,
    pub counted_by: Option<String>,
}

/// One row per count, in input order. Counts whose variance does not fit in a
/// `Decimal` are skipped.
pub fn count_variance_report(counts: &[CountRecord]) -> Vec<CountVarianceRow> {
    counts
        .iter()
        .filter_map(|count| {
            let Some(variance) = count.counted.checked_sub(count.expected) else {
                tracing::warn!(
                    count_id = %count.id,
                    expected = %count.expected,
                    counted = %count.counted,
                    "skipping count whose variance overflows"
                );
                return None;
            };
            Some(CountVarianceRow {
                id: count.id,
                item_name: label_or(count.item_name.as_deref(), UNKNOWN_ITEM),
                expected: count.expected,
                counted: count.counted,
                variance,
                date: count.date,
                counted_by: count.counted_by.clone(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn count(expected: i64, counted: i64) -> CountRecord {
        CountRecord {
            id: Uuid::new_v4(),
            item_id: Some(Uuid::new_v4()),
            item_name: Some("Lemons".to_string()),
            expected: Decimal::from(expected),
            counted: Decimal::from(counted),
            date: NaiveDate::from_ymd_opt(2024, 6, 2).unwrap(),
            counted_by: Some("Sam".to_string()),
        }
    }

    #[test]
    fn variance_is_signed() {
        let rows = count_variance_report(&[count(10, 12), count(10, 7), count(4, 4)]);
        assert_eq!(rows[0].variance, Decimal::from(2));
        assert_eq!(rows[1].variance, Decimal::from(-3));
        assert_eq!(rows[2].variance, Decimal::ZERO);
    }

    #[test]
    fn overflowing_variance_is_skipped() {
        let mut record = count(1, 1);
        record.expected = Decimal::MIN;
        record.counted = Decimal::MAX;
        let rows = count_variance_report(&[record, count(3, 5)]);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].variance, Decimal::from(2));
    }

    #[test]
    fn unresolved_item_gets_placeholder_name() {
        let mut record = count(1, 1);
        record.item_name = None;
        let rows = count_variance_report(&[record]);
        assert_eq!(rows[0].item_name, UNKNOWN_ITEM);
    }
}
