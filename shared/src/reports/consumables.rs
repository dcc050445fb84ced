//! Non-food consumables

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::InventoryItem;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsumableRow {
    pub id: Uuid,
    pub name: String,
    pub unit: String,
    pub quantity: Decimal,
    pub value: Decimal,
    pub needs_reorder: bool,
}

/// Inventory rows whose category matches `category` (case-insensitive).
/// Rows whose stock value overflows are skipped.
pub fn non_food_consumables(inventory: &[InventoryItem], category: &str) -> Vec<ConsumableRow> {
    inventory
        .iter()
        .filter(|item| {
            item.category
                .as_deref()
                .is_some_and(|name| name.trim().eq_ignore_ascii_case(category.trim()))
        })
        .filter_map(|item| {
            let Some(value) = item.value() else {
                tracing::warn!(
                    item_id = %item.id,
                    quantity = %item.quantity,
                    cost = %item.cost,
                    "skipping consumable whose value overflows"
                );
                return None;
            };
            Some(ConsumableRow {
                id: item.id,
                name: item.name.clone(),
                unit: item.unit.clone(),
                quantity: item.quantity,
                value,
                needs_reorder: item.needs_reorder(),
            })
        })
        .collect()
}
