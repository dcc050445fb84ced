//! Recipe models

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A menu recipe and the inventory it consumes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recipe {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub selling_price: Decimal,
    #[serde(default)]
    pub ingredients: Vec<RecipeIngredient>,
}

/// Link between a recipe and an inventory item.
///
/// `item` is `None` when the inventory reference no longer resolves
/// (the item was deleted or the link was never set).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeIngredient {
    pub id: Uuid,
    #[serde(default)]
    pub quantity: Decimal,
    #[serde(default)]
    pub item: Option<IngredientItem>,
}

/// The inventory fields a recipe link needs for costing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngredientItem {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub unit: String,
    #[serde(default)]
    pub cost: Decimal,
}
