//! Inventory service: stock items, reorder list and price-change capture

use chrono::Utc;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use uuid::Uuid;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::models::InventoryItem;
use crate::services::catalog::{CatalogKind, CatalogService};

/// Inventory service for managing stock items
#[derive(Clone)]
pub struct InventoryService {
    db: PgPool,
}

/// Inventory row with category and department names joined in
#[derive(Debug, FromRow)]
pub(crate) struct InventoryRow {
    pub id: Uuid,
    pub name: String,
    pub unit: String,
    pub category: Option<String>,
    pub department: Option<String>,
    pub quantity: Decimal,
    pub cost: Decimal,
    pub supplier: Option<String>,
    pub par_level: Decimal,
    pub reorder_point: Decimal,
}

impl From<InventoryRow> for InventoryItem {
    fn from(row: InventoryRow) -> Self {
        InventoryItem {
            id: row.id,
            name: row.name,
            unit: row.unit,
            category: row.category,
            department: row.department,
            quantity: row.quantity,
            cost: row.cost,
            supplier: row.supplier,
            par_level: row.par_level,
            reorder_point: row.reorder_point,
        }
    }
}

pub(crate) const INVENTORY_SELECT: &str = r#"
    SELECT i.id, i.name, i.unit, c.name AS category, d.name AS department,
           i.quantity, i.cost, i.supplier, i.par_level, i.reorder_point
    FROM inventory i
    LEFT JOIN categories c ON c.id = i.category_id
    LEFT JOIN departments d ON d.id = i.department_id
"#;

/// Input for creating an inventory item.
///
/// Category and department are given by name and resolved to ids.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateInventoryInput {
    #[validate(length(min = 1, message = "Item name is required"))]
    pub name: String,
    #[serde(default)]
    pub unit: String,
    pub category: Option<String>,
    pub department: Option<String>,
    #[serde(default)]
    pub quantity: Decimal,
    #[serde(default)]
    pub cost: Decimal,
    pub supplier: Option<String>,
    #[serde(default)]
    pub par_level: Decimal,
    #[serde(default)]
    pub reorder_point: Decimal,
}

/// Partial update; absent fields keep their value
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateInventoryInput {
    #[validate(length(min = 1, message = "Item name is required"))]
    pub name: Option<String>,
    pub unit: Option<String>,
    pub category: Option<String>,
    pub department: Option<String>,
    pub quantity: Option<Decimal>,
    pub cost: Option<Decimal>,
    pub supplier: Option<String>,
    pub par_level: Option<Decimal>,
    pub reorder_point: Option<Decimal>,
}

/// Item at or below its reorder point
#[derive(Debug, Clone, Serialize)]
pub struct ReorderLine {
    #[serde(flatten)]
    pub item: InventoryItem,
    /// Quantity needed to get back to par
    pub shortfall: Decimal,
    pub shortfall_value: Decimal,
}

impl From<InventoryItem> for ReorderLine {
    fn from(item: InventoryItem) -> Self {
        let shortfall = item.shortfall_to_par();
        Self {
            shortfall_value: shortfall.saturating_mul(item.cost),
            shortfall,
            item,
        }
    }
}

fn check_amounts(quantity: Decimal, cost: Decimal, par_level: Decimal, reorder_point: Decimal) -> AppResult<()> {
    shared::validate_non_negative(quantity).map_err(|m| AppError::validation("quantity", m))?;
    shared::validate_non_negative(cost).map_err(|m| AppError::validation("cost", m))?;
    shared::validate_stock_levels(par_level, reorder_point).map_err(|m| AppError::validation("par_level", m))?;
    Ok(())
}

impl InventoryService {
    /// Create a new InventoryService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// List all items by name
    pub async fn list(&self) -> AppResult<Vec<InventoryItem>> {
        let rows = sqlx::query_as::<_, InventoryRow>(&format!("{} ORDER BY i.name", INVENTORY_SELECT))
            .fetch_all(&self.db)
            .await?;

        Ok(rows.into_iter().map(InventoryItem::from).collect())
    }

    /// Get a single item
    pub async fn get(&self, item_id: Uuid) -> AppResult<InventoryItem> {
        let row = sqlx::query_as::<_, InventoryRow>(&format!("{} WHERE i.id = $1", INVENTORY_SELECT))
            .bind(item_id)
            .fetch_optional(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("Inventory item".to_string()))?;

        Ok(row.into())
    }

    /// Items at or below their reorder point, largest shortfall first
    pub async fn reorder_list(&self) -> AppResult<Vec<ReorderLine>> {
        let rows = sqlx::query_as::<_, InventoryRow>(&format!(
            "{} WHERE i.quantity <= i.reorder_point ORDER BY i.name",
            INVENTORY_SELECT
        ))
        .fetch_all(&self.db)
        .await?;

        let mut lines: Vec<ReorderLine> = rows
            .into_iter()
            .map(InventoryItem::from)
            .filter(InventoryItem::needs_reorder)
            .map(ReorderLine::from)
            .collect();
        lines.sort_by(|a, b| b.shortfall.cmp(&a.shortfall));

        Ok(lines)
    }

    /// Create an item
    pub async fn create(&self, input: CreateInventoryInput) -> AppResult<InventoryItem> {
        input.validate()?;
        check_amounts(input.quantity, input.cost, input.par_level, input.reorder_point)?;

        let mut tx = self.db.begin().await?;

        let category_id = CatalogService::resolve(&mut tx, CatalogKind::Category, input.category.as_deref()).await?;
        let department_id =
            CatalogService::resolve(&mut tx, CatalogKind::Department, input.department.as_deref()).await?;

        let item_id = sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO inventory (
                name, unit, category_id, department_id, quantity, cost,
                supplier, par_level, reorder_point
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING id
            "#,
        )
        .bind(input.name.trim())
        .bind(&input.unit)
        .bind(category_id)
        .bind(department_id)
        .bind(input.quantity)
        .bind(input.cost)
        .bind(&input.supplier)
        .bind(input.par_level)
        .bind(input.reorder_point)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(%item_id, "inventory item created");
        self.get(item_id).await
    }

    /// Update an item; a cost change is recorded as a price change
    pub async fn update(&self, item_id: Uuid, user_id: Uuid, input: UpdateInventoryInput) -> AppResult<InventoryItem> {
        input.validate()?;

        let mut tx = self.db.begin().await?;

        let current = sqlx::query_as::<_, InventoryRow>(&format!("{} WHERE i.id = $1 FOR UPDATE OF i", INVENTORY_SELECT))
            .bind(item_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| AppError::NotFound("Inventory item".to_string()))?;

        check_amounts(
            input.quantity.unwrap_or(current.quantity),
            input.cost.unwrap_or(current.cost),
            input.par_level.unwrap_or(current.par_level),
            input.reorder_point.unwrap_or(current.reorder_point),
        )?;

        let category_id = match input.category.as_deref() {
            Some(name) => Some(CatalogService::resolve(&mut tx, CatalogKind::Category, Some(name)).await?),
            None => None,
        };
        let department_id = match input.department.as_deref() {
            Some(name) => Some(CatalogService::resolve(&mut tx, CatalogKind::Department, Some(name)).await?),
            None => None,
        };

        // Outer None keeps the column, inner None clears it
        sqlx::query(
            r#"
            UPDATE inventory SET
                name = COALESCE($2, name),
                unit = COALESCE($3, unit),
                category_id = CASE WHEN $4 THEN $5 ELSE category_id END,
                department_id = CASE WHEN $6 THEN $7 ELSE department_id END,
                quantity = COALESCE($8, quantity),
                cost = COALESCE($9, cost),
                supplier = COALESCE($10, supplier),
                par_level = COALESCE($11, par_level),
                reorder_point = COALESCE($12, reorder_point),
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(item_id)
        .bind(input.name.as_deref().map(str::trim))
        .bind(&input.unit)
        .bind(category_id.is_some())
        .bind(category_id.flatten())
        .bind(department_id.is_some())
        .bind(department_id.flatten())
        .bind(input.quantity)
        .bind(input.cost)
        .bind(&input.supplier)
        .bind(input.par_level)
        .bind(input.reorder_point)
        .execute(&mut *tx)
        .await?;

        if let Some(new_cost) = input.cost.filter(|cost| *cost != current.cost) {
            record_price_change(&mut tx, item_id, current.cost, new_cost, user_id).await?;
        }

        tx.commit().await?;

        self.get(item_id).await
    }

    /// Delete an item; recipe links and history keep a NULL reference
    pub async fn delete(&self, item_id: Uuid) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM inventory WHERE id = $1")
            .bind(item_id)
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Inventory item".to_string()));
        }

        tracing::info!(%item_id, "inventory item deleted");
        Ok(())
    }
}

async fn record_price_change(
    tx: &mut Transaction<'_, Postgres>,
    item_id: Uuid,
    old_price: Decimal,
    new_price: Decimal,
    user_id: Uuid,
) -> AppResult<()> {
    sqlx::query(
        r#"
        INSERT INTO price_changes (item_id, old_price, new_price, date, changed_by)
        VALUES ($1, $2, $3, $4, $5)
        "#,
    )
    .bind(item_id)
    .bind(old_price)
    .bind(new_price)
    .bind(Utc::now().date_naive())
    .bind(user_id)
    .execute(&mut **tx)
    .await?;

    tracing::info!(%item_id, %old_price, %new_price, "price change recorded");
    Ok(())
}
