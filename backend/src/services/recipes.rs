//! Recipes and their ingredient links

use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::{FromRow, PgPool};
use std::collections::HashMap;
use uuid::Uuid;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::models::{IngredientItem, Recipe, RecipeIngredient};

#[derive(Clone)]
pub struct RecipeService {
    db: PgPool,
}

#[derive(Debug, FromRow)]
struct RecipeRow {
    id: Uuid,
    name: String,
    selling_price: Decimal,
}

/// Ingredient link with the inventory columns the cost report needs.
/// Item columns are NULL when the link no longer resolves.
#[derive(Debug, FromRow)]
struct IngredientRow {
    id: Uuid,
    recipe_id: Uuid,
    quantity: Decimal,
    item_id: Option<Uuid>,
    item_name: Option<String>,
    item_unit: Option<String>,
    item_cost: Option<Decimal>,
}

impl From<IngredientRow> for RecipeIngredient {
    fn from(row: IngredientRow) -> Self {
        let item = match (row.item_id, row.item_name) {
            (Some(id), Some(name)) => Some(IngredientItem {
                id,
                name,
                unit: row.item_unit.unwrap_or_default(),
                cost: row.item_cost.unwrap_or_default(),
            }),
            _ => None,
        };
        RecipeIngredient {
            id: row.id,
            quantity: row.quantity,
            item,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct IngredientInput {
    pub inventory_item_id: Uuid,
    pub quantity: Decimal,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateRecipeInput {
    #[validate(length(min = 1, message = "Recipe name is required"))]
    pub name: String,
    #[serde(default)]
    pub selling_price: Decimal,
    #[serde(default)]
    pub ingredients: Vec<IngredientInput>,
}

impl RecipeService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// All recipes with ingredients resolved against current inventory
    pub async fn list(&self) -> AppResult<Vec<Recipe>> {
        self.load(None).await
    }

    pub async fn get(&self, recipe_id: Uuid) -> AppResult<Recipe> {
        self.load(Some(recipe_id))
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| AppError::NotFound("Recipe".to_string()))
    }

    async fn load(&self, recipe_id: Option<Uuid>) -> AppResult<Vec<Recipe>> {
        let recipes = sqlx::query_as::<_, RecipeRow>(
            "SELECT id, name, selling_price FROM recipes WHERE $1::uuid IS NULL OR id = $1 ORDER BY name",
        )
        .bind(recipe_id)
        .fetch_all(&self.db)
        .await?;

        let ingredients = sqlx::query_as::<_, IngredientRow>(
            r#"
            SELECT ri.id, ri.recipe_id, ri.quantity,
                   i.id AS item_id, i.name AS item_name, i.unit AS item_unit, i.cost AS item_cost
            FROM recipe_ingredients ri
            LEFT JOIN inventory i ON i.id = ri.inventory_item_id
            WHERE $1::uuid IS NULL OR ri.recipe_id = $1
            ORDER BY ri.id
            "#,
        )
        .bind(recipe_id)
        .fetch_all(&self.db)
        .await?;

        let mut by_recipe: HashMap<Uuid, Vec<RecipeIngredient>> = HashMap::new();
        for row in ingredients {
            by_recipe.entry(row.recipe_id).or_default().push(row.into());
        }

        Ok(recipes
            .into_iter()
            .map(|row| Recipe {
                ingredients: by_recipe.remove(&row.id).unwrap_or_default(),
                id: row.id,
                name: row.name,
                selling_price: row.selling_price,
            })
            .collect())
    }

    pub async fn create(&self, input: CreateRecipeInput) -> AppResult<Recipe> {
        input.validate()?;
        shared::validate_non_negative(input.selling_price).map_err(|m| AppError::validation("selling_price", m))?;
        for ingredient in &input.ingredients {
            shared::validate_positive(ingredient.quantity)
                .map_err(|m| AppError::validation("ingredients", m))?;
        }

        let mut tx = self.db.begin().await?;

        let recipe_id = sqlx::query_scalar::<_, Uuid>(
            "INSERT INTO recipes (name, selling_price) VALUES ($1, $2) RETURNING id",
        )
        .bind(input.name.trim())
        .bind(input.selling_price)
        .fetch_one(&mut *tx)
        .await?;

        for ingredient in &input.ingredients {
            let exists = sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM inventory WHERE id = $1)")
                .bind(ingredient.inventory_item_id)
                .fetch_one(&mut *tx)
                .await?;
            if !exists {
                return Err(AppError::validation(
                    "ingredients",
                    format!("Unknown inventory item {}", ingredient.inventory_item_id),
                ));
            }

            sqlx::query(
                "INSERT INTO recipe_ingredients (recipe_id, inventory_item_id, quantity) VALUES ($1, $2, $3)",
            )
            .bind(recipe_id)
            .bind(ingredient.inventory_item_id)
            .bind(ingredient.quantity)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        tracing::info!(%recipe_id, ingredients = input.ingredients.len(), "recipe created");
        self.get(recipe_id).await
    }

    pub async fn delete(&self, recipe_id: Uuid) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM recipes WHERE id = $1")
            .bind(recipe_id)
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Recipe".to_string()));
        }
        Ok(())
    }
}
