//! Stock control records: price changes, waste and physical counts

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A change to an inventory item's unit cost
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceChange {
    pub id: Uuid,
    pub item_id: Option<Uuid>,
    /// Resolved item name
    #[serde(default)]
    pub item_name: Option<String>,
    #[serde(default)]
    pub old_price: Decimal,
    #[serde(default)]
    pub new_price: Decimal,
    pub date: NaiveDate,
    #[serde(default)]
    pub changed_by: Option<String>,
}

/// Stock written off as waste or shrinkage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WasteRecord {
    pub id: Uuid,
    pub item_id: Option<Uuid>,
    #[serde(default)]
    pub item_name: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub quantity: Decimal,
    /// Cost value written off
    #[serde(default)]
    pub value: Decimal,
    pub date: NaiveDate,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub recorded_by: Option<String>,
}

/// A controller's physical count against the expected book quantity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountRecord {
    pub id: Uuid,
    pub item_id: Option<Uuid>,
    #[serde(default)]
    pub item_name: Option<String>,
    #[serde(default)]
    pub expected: Decimal,
    #[serde(default)]
    pub counted: Decimal,
    pub date: NaiveDate,
    #[serde(default)]
    pub counted_by: Option<String>,
}
