//! Controller counts and waste records
//!
//! A count sets the item's on-hand quantity to what was counted; waste
//! takes the wasted quantity out of stock. Both keep a dated record for the
//! variance and waste reports.

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{CountRecord, WasteRecord};
use shared::types::ReportFilter;

#[derive(Clone)]
pub struct StockRecordService {
    db: PgPool,
}

#[derive(Debug, FromRow)]
pub(crate) struct CountRow {
    pub id: Uuid,
    pub item_id: Option<Uuid>,
    pub item_name: Option<String>,
    pub expected: Decimal,
    pub counted: Decimal,
    pub date: NaiveDate,
    pub counted_by: Option<String>,
}

impl From<CountRow> for CountRecord {
    fn from(row: CountRow) -> Self {
        CountRecord {
            id: row.id,
            item_id: row.item_id,
            item_name: row.item_name,
            expected: row.expected,
            counted: row.counted,
            date: row.date,
            counted_by: row.counted_by,
        }
    }
}

#[derive(Debug, FromRow)]
pub(crate) struct WasteRow {
    pub id: Uuid,
    pub item_id: Option<Uuid>,
    pub item_name: Option<String>,
    pub category: Option<String>,
    pub quantity: Decimal,
    pub value: Decimal,
    pub date: NaiveDate,
    pub reason: Option<String>,
    pub recorded_by: Option<String>,
}

impl From<WasteRow> for WasteRecord {
    fn from(row: WasteRow) -> Self {
        WasteRecord {
            id: row.id,
            item_id: row.item_id,
            item_name: row.item_name,
            category: row.category,
            quantity: row.quantity,
            value: row.value,
            date: row.date,
            reason: row.reason,
            recorded_by: row.recorded_by,
        }
    }
}

pub(crate) const COUNTS_SELECT: &str = r#"
    SELECT ct.id, ct.item_id, i.name AS item_name, ct.expected, ct.counted, ct.date,
           u.name AS counted_by
    FROM counts ct
    LEFT JOIN inventory i ON i.id = ct.item_id
    LEFT JOIN users u ON u.id = ct.counted_by
    WHERE ($1::date IS NULL OR ct.date >= $1) AND ($2::date IS NULL OR ct.date <= $2)
"#;

pub(crate) const WASTE_SELECT: &str = r#"
    SELECT w.id, w.item_id, i.name AS item_name, c.name AS category, w.quantity, w.value,
           w.date, w.reason, u.name AS recorded_by
    FROM waste w
    LEFT JOIN inventory i ON i.id = w.item_id
    LEFT JOIN categories c ON c.id = i.category_id
    LEFT JOIN users u ON u.id = w.recorded_by
    WHERE ($1::date IS NULL OR w.date >= $1) AND ($2::date IS NULL OR w.date <= $2)
"#;

#[derive(Debug, Deserialize)]
pub struct RecordCountInput {
    pub item_id: Uuid,
    pub counted: Decimal,
    /// Defaults to the item's current on-hand quantity
    pub expected: Option<Decimal>,
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub struct RecordWasteInput {
    pub item_id: Uuid,
    pub quantity: Decimal,
    /// Defaults to quantity × current unit cost
    pub value: Option<Decimal>,
    pub reason: Option<String>,
    pub date: Option<NaiveDate>,
}

#[derive(Debug, FromRow)]
struct StockRow {
    quantity: Decimal,
    cost: Decimal,
}

impl StockRecordService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    pub async fn list_counts(&self, filter: &ReportFilter) -> AppResult<Vec<CountRecord>> {
        let rows = sqlx::query_as::<_, CountRow>(&format!("{} ORDER BY ct.date DESC", COUNTS_SELECT))
            .bind(filter.start_date)
            .bind(filter.end_date)
            .fetch_all(&self.db)
            .await?;

        Ok(rows.into_iter().map(CountRecord::from).collect())
    }

    pub async fn list_waste(&self, filter: &ReportFilter) -> AppResult<Vec<WasteRecord>> {
        let rows = sqlx::query_as::<_, WasteRow>(&format!("{} ORDER BY w.date DESC", WASTE_SELECT))
            .bind(filter.start_date)
            .bind(filter.end_date)
            .fetch_all(&self.db)
            .await?;

        Ok(rows.into_iter().map(WasteRecord::from).collect())
    }

    /// Record a controller count and set on-hand stock to the counted quantity
    pub async fn record_count(&self, user_id: Uuid, input: RecordCountInput) -> AppResult<CountRecord> {
        shared::validate_non_negative(input.counted).map_err(|m| AppError::validation("counted", m))?;

        let mut tx = self.db.begin().await?;
        let stock = lock_stock(&mut tx, input.item_id).await?;
        let expected = input.expected.unwrap_or(stock.quantity);
        let variance = count_variance(input.counted, expected)?;
        let date = input.date.unwrap_or_else(|| Utc::now().date_naive());

        let count_id = sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO counts (item_id, expected, counted, date, counted_by)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id
            "#,
        )
        .bind(input.item_id)
        .bind(expected)
        .bind(input.counted)
        .bind(date)
        .bind(user_id)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("UPDATE inventory SET quantity = $2, updated_at = NOW() WHERE id = $1")
            .bind(input.item_id)
            .bind(input.counted)
            .execute(&mut *tx)
            .await?;

        let record = sqlx::query_as::<_, CountRow>(&format!("{} AND ct.id = $3", COUNTS_SELECT))
            .bind(None::<NaiveDate>)
            .bind(None::<NaiveDate>)
            .bind(count_id)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;

        if !variance.is_zero() {
            tracing::info!(item_id = %input.item_id, %variance, "count variance recorded");
        }
        Ok(record.into())
    }

    /// Record waste and take it out of stock (never below zero)
    pub async fn record_waste(&self, user_id: Uuid, input: RecordWasteInput) -> AppResult<WasteRecord> {
        shared::validate_positive(input.quantity).map_err(|m| AppError::validation("quantity", m))?;
        if let Some(value) = input.value {
            shared::validate_non_negative(value).map_err(|m| AppError::validation("value", m))?;
        }

        let mut tx = self.db.begin().await?;
        let stock = lock_stock(&mut tx, input.item_id).await?;
        let value = waste_value(input.quantity, input.value, stock.cost)?;
        let date = input.date.unwrap_or_else(|| Utc::now().date_naive());

        if input.quantity > stock.quantity {
            tracing::warn!(
                item_id = %input.item_id,
                wasted = %input.quantity,
                on_hand = %stock.quantity,
                "waste exceeds on-hand stock, clamping to zero"
            );
        }

        let waste_id = sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO waste (item_id, quantity, value, date, reason, recorded_by)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id
            "#,
        )
        .bind(input.item_id)
        .bind(input.quantity)
        .bind(value)
        .bind(date)
        .bind(&input.reason)
        .bind(user_id)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("UPDATE inventory SET quantity = GREATEST(quantity - $2, 0), updated_at = NOW() WHERE id = $1")
            .bind(input.item_id)
            .bind(input.quantity)
            .execute(&mut *tx)
            .await?;

        let record = sqlx::query_as::<_, WasteRow>(&format!("{} AND w.id = $3", WASTE_SELECT))
            .bind(None::<NaiveDate>)
            .bind(None::<NaiveDate>)
            .bind(waste_id)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(record.into())
    }
}

async fn lock_stock(tx: &mut sqlx::PgConnection, item_id: Uuid) -> AppResult<StockRow> {
    sqlx::query_as::<_, StockRow>("SELECT quantity, cost FROM inventory WHERE id = $1 FOR UPDATE")
        .bind(item_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Inventory item".to_string()))
}

fn count_variance(counted: Decimal, expected: Decimal) -> AppResult<Decimal> {
    counted
        .checked_sub(expected)
        .ok_or_else(|| AppError::validation("expected", "Count variance is out of range"))
}

/// Explicit value, or quantity × unit cost
fn waste_value(quantity: Decimal, value: Option<Decimal>, cost: Decimal) -> AppResult<Decimal> {
    match value {
        Some(value) => Ok(value),
        None => quantity
            .checked_mul(cost)
            .ok_or_else(|| AppError::validation("quantity", "Waste value is out of range")),
    }
}
