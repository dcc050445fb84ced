//! Sales models

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A daily sales entry.
///
/// `department` is the optional cost-centre attribution. Sales recorded
/// without one only count towards store-level totals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sale {
    pub id: Uuid,
    pub date: NaiveDate,
    #[serde(default)]
    pub food_sales: Decimal,
    #[serde(default)]
    pub beverage_sales: Decimal,
    #[serde(default)]
    pub total_sales: Decimal,
    #[serde(default)]
    pub department: Option<String>,
}

impl Sale {
    /// Total to use for reporting. Falls back to food + beverage when the
    /// stored total was left at zero; `None` when that sum overflows.
    pub fn reported_total(&self) -> Option<Decimal> {
        if self.total_sales.is_zero() {
            self.food_sales.checked_add(self.beverage_sales)
        } else {
            Some(self.total_sales)
        }
    }
}
