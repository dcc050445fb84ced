//! Inventory models

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A stocked inventory item with its category and department names resolved.
///
/// Numeric fields default to zero when absent so partially populated rows
/// coming from the browser still deserialize.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryItem {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub unit: String,
    /// Category name, `None` when the reference did not resolve
    #[serde(default)]
    pub category: Option<String>,
    /// Department name, `None` when the reference did not resolve
    #[serde(default)]
    pub department: Option<String>,
    #[serde(default)]
    pub quantity: Decimal,
    /// Unit cost
    #[serde(default)]
    pub cost: Decimal,
    #[serde(default)]
    pub supplier: Option<String>,
    #[serde(default)]
    pub par_level: Decimal,
    #[serde(default)]
    pub reorder_point: Decimal,
}

impl InventoryItem {
    /// Stock value held: quantity × unit cost, `None` when it overflows
    pub fn value(&self) -> Option<Decimal> {
        self.quantity.checked_mul(self.cost)
    }

    /// Quantity and cost must both be non-negative
    pub fn is_well_formed(&self) -> bool {
        self.quantity >= Decimal::ZERO && self.cost >= Decimal::ZERO
    }

    /// At or below the reorder point
    pub fn needs_reorder(&self) -> bool {
        self.quantity <= self.reorder_point
    }

    /// Quantity required to bring stock back up to par
    pub fn shortfall_to_par(&self) -> Decimal {
        self.par_level.saturating_sub(self.quantity).max(Decimal::ZERO)
    }
}

/// Inventory category (Food, Beverage, Non-Food, ...)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: Uuid,
    pub name: String,
}

/// Cost centre department (Kitchen, Bar, ...)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Department {
    pub id: Uuid,
    pub name: String,
}
