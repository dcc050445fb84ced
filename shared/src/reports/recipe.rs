//! Recipe cost against selling price

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::percentage;
use crate::models::Recipe;

/// Costing row for one recipe
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeCostRow {
    pub id: Uuid,
    pub name: String,
    pub total_cost: Decimal,
    pub selling_price: Decimal,
    pub profit_margin_amount: Decimal,
    /// Margin as a share of selling price; zero when the price is not positive
    pub profit_margin_percentage: Decimal,
    /// Ingredient cost as a share of selling price; zero when the price is not positive
    pub cost_percentage: Decimal,
    pub ingredient_count: usize,
    /// Ingredient links dropped because their inventory item did not resolve
    /// or their cost overflowed the recipe total
    pub skipped_ingredients: usize,
}

/// Cost every recipe from its resolved ingredient links
pub fn recipe_cost_report(recipes: &[Recipe]) -> Vec<RecipeCostRow> {
    recipes.iter().map(cost_recipe).collect()
}

/// Cost a single recipe
pub fn cost_recipe(recipe: &Recipe) -> RecipeCostRow {
    let mut total_cost = Decimal::ZERO;
    let mut profit_margin_amount = recipe.selling_price;
    let mut ingredient_count = 0;
    let mut skipped_ingredients = 0;

    for ingredient in &recipe.ingredients {
        match &ingredient.item {
            Some(item) => {
                let costed = ingredient
                    .quantity
                    .checked_mul(item.cost)
                    .and_then(|line| total_cost.checked_add(line))
                    .and_then(|total| Some((total, recipe.selling_price.checked_sub(total)?)));
                match costed {
                    Some((total, margin)) => {
                        total_cost = total;
                        profit_margin_amount = margin;
                        ingredient_count += 1;
                    }
                    None => {
                        tracing::warn!(
                            recipe_id = %recipe.id,
                            ingredient_id = %ingredient.id,
                            quantity = %ingredient.quantity,
                            cost = %item.cost,
                            "skipping recipe ingredient whose cost overflows"
                        );
                        skipped_ingredients += 1;
                    }
                }
            }
            None => {
                tracing::warn!(
                    recipe_id = %recipe.id,
                    ingredient_id = %ingredient.id,
                    "skipping recipe ingredient with unresolved inventory item"
                );
                skipped_ingredients += 1;
            }
        }
    }

    RecipeCostRow {
        id: recipe.id,
        name: recipe.name.clone(),
        total_cost,
        selling_price: recipe.selling_price,
        profit_margin_amount,
        profit_margin_percentage: percentage(profit_margin_amount, recipe.selling_price),
        cost_percentage: percentage(total_cost, recipe.selling_price),
        ingredient_count,
        skipped_ingredients,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{IngredientItem, RecipeIngredient};
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn ingredient(quantity: &str, cost: Option<&str>) -> RecipeIngredient {
        RecipeIngredient {
            id: Uuid::new_v4(),
            quantity: dec(quantity),
            item: cost.map(|cost| IngredientItem {
                id: Uuid::new_v4(),
                name: "ingredient".to_string(),
                unit: "ea".to_string(),
                cost: dec(cost),
            }),
        }
    }

    fn recipe(selling_price: &str, ingredients: Vec<RecipeIngredient>) -> Recipe {
        Recipe {
            id: Uuid::new_v4(),
            name: "Margherita".to_string(),
            selling_price: dec(selling_price),
            ingredients,
        }
    }

    #[test]
    fn costing_example() {
        let row = cost_recipe(&recipe(
            "15.00",
            vec![ingredient("2", Some("3.00")), ingredient("1", Some("4.00"))],
        ));

        assert_eq!(row.total_cost, dec("10.00"));
        assert_eq!(row.profit_margin_amount, dec("5.00"));
        assert_eq!(row.profit_margin_percentage.round_dp(2), dec("33.33"));
        assert_eq!(row.cost_percentage.round_dp(2), dec("66.67"));
        assert_eq!(row.ingredient_count, 2);
    }

    #[test]
    fn zero_selling_price_is_guarded() {
        let row = cost_recipe(&recipe("0", vec![ingredient("1", Some("2"))]));
        assert_eq!(row.profit_margin_amount, dec("-2"));
        assert_eq!(row.profit_margin_percentage, Decimal::ZERO);
        assert_eq!(row.cost_percentage, Decimal::ZERO);
    }

    #[test]
    fn negative_selling_price_is_guarded() {
        let row = cost_recipe(&recipe("-4", vec![]));
        assert_eq!(row.profit_margin_percentage, Decimal::ZERO);
    }

    #[test]
    fn unresolved_ingredients_are_skipped() {
        let row = cost_recipe(&recipe(
            "10",
            vec![ingredient("2", Some("1.50")), ingredient("4", None)],
        ));
        assert_eq!(row.total_cost, dec("3.00"));
        assert_eq!(row.ingredient_count, 1);
        assert_eq!(row.skipped_ingredients, 1);
    }

    #[test]
    fn overflowing_ingredients_are_skipped() {
        let huge = "100000000000000000000";
        let row = cost_recipe(&recipe(
            "12",
            vec![ingredient(huge, Some(huge)), ingredient("2", Some("2.50"))],
        ));

        assert_eq!(row.total_cost, dec("5.00"));
        assert_eq!(row.profit_margin_amount, dec("7.00"));
        assert_eq!(row.ingredient_count, 1);
        assert_eq!(row.skipped_ingredients, 1);
    }

    #[test]
    fn one_row_per_recipe_in_input_order() {
        let recipes = vec![recipe("5", vec![]), recipe("6", vec![])];
        let rows = recipe_cost_report(&recipes);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].id, recipes[0].id);
        assert_eq!(rows[1].id, recipes[1].id);
    }
}
