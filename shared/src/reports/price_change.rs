//! Price change variance and alerts

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{label_or, percentage, UNKNOWN_ITEM};
use crate::models::PriceChange;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceChangeRow {
    pub id: Uuid,
    pub item_name: String,
    pub old_price: Decimal,
    pub new_price: Decimal,
    pub change_amount: Decimal,
    /// Change relative to the old price; zero when the old price is not positive
    pub variance_percentage: Decimal,
    /// Absolute variance reached the alert threshold
    pub exceeds_threshold: bool,
    pub date: NaiveDate,
    pub changed_by: Option<String>,
}

/// One row per price change, in input order.
///
/// `alert_threshold_percent` is compared against the absolute variance, so
/// price drops raise alerts as well as increases. A threshold of zero or less
/// disables alerting. Changes whose amount does not fit in a `Decimal` are
/// skipped.
pub fn price_change_report(changes: &[PriceChange], alert_threshold_percent: Decimal) -> Vec<PriceChangeRow> {
    changes
        .iter()
        .filter_map(|change| {
            let Some(change_amount) = change.new_price.checked_sub(change.old_price) else {
                tracing::warn!(
                    change_id = %change.id,
                    old_price = %change.old_price,
                    new_price = %change.new_price,
                    "skipping price change whose amount overflows"
                );
                return None;
            };
            let variance_percentage = percentage(change_amount, change.old_price);
            Some(PriceChangeRow {
                id: change.id,
                item_name: label_or(change.item_name.as_deref(), UNKNOWN_ITEM),
                old_price: change.old_price,
                new_price: change.new_price,
                change_amount,
                variance_percentage,
                exceeds_threshold: alert_threshold_percent > Decimal::ZERO
                    && variance_percentage.abs() >= alert_threshold_percent,
                date: change.date,
                changed_by: change.changed_by.clone(),
            })
        })
        .collect()
}
