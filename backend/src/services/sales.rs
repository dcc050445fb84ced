//! Daily sales entry

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::Sale;
use crate::services::catalog::{CatalogKind, CatalogService};
use shared::types::ReportFilter;

#[derive(Clone)]
pub struct SalesService {
    db: PgPool,
}

#[derive(Debug, FromRow)]
pub(crate) struct SaleRow {
    pub id: Uuid,
    pub date: NaiveDate,
    pub food_sales: Decimal,
    pub beverage_sales: Decimal,
    pub total_sales: Decimal,
    pub department: Option<String>,
}

impl From<SaleRow> for Sale {
    fn from(row: SaleRow) -> Self {
        Sale {
            id: row.id,
            date: row.date,
            food_sales: row.food_sales,
            beverage_sales: row.beverage_sales,
            total_sales: row.total_sales,
            department: row.department,
        }
    }
}

pub(crate) const SALES_SELECT: &str = r#"
    SELECT s.id, s.date, s.food_sales, s.beverage_sales, s.total_sales, d.name AS department
    FROM sales s
    LEFT JOIN departments d ON d.id = s.department_id
    WHERE ($1::date IS NULL OR s.date >= $1) AND ($2::date IS NULL OR s.date <= $2)
"#;

/// Input for recording a day's sales. Without a total, food plus beverage
/// is stored as the total.
#[derive(Debug, Deserialize)]
pub struct CreateSaleInput {
    pub date: NaiveDate,
    #[serde(default)]
    pub food_sales: Decimal,
    #[serde(default)]
    pub beverage_sales: Decimal,
    pub total_sales: Option<Decimal>,
    /// Department name; leave empty for store-wide sales
    pub department: Option<String>,
}

impl CreateSaleInput {
    fn resolved_total(&self) -> AppResult<Decimal> {
        match self.total_sales {
            Some(total) => Ok(total),
            None => self
                .food_sales
                .checked_add(self.beverage_sales)
                .ok_or_else(|| AppError::validation("total_sales", "Food and beverage sales are out of range")),
        }
    }
}

/// Single sale by id, with the department name as stored
fn sale_by_id_query() -> String {
    format!("{} AND s.id = $3", SALES_SELECT)
}

impl SalesService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Sales within the filter, newest first
    pub async fn list(&self, filter: &ReportFilter) -> AppResult<Vec<Sale>> {
        let rows = sqlx::query_as::<_, SaleRow>(&format!("{} ORDER BY s.date DESC", SALES_SELECT))
            .bind(filter.start_date)
            .bind(filter.end_date)
            .fetch_all(&self.db)
            .await?;

        Ok(rows.into_iter().map(Sale::from).collect())
    }

    pub async fn create(&self, user_id: Uuid, input: CreateSaleInput) -> AppResult<Sale> {
        let total = input.resolved_total()?;
        shared::validate_sales_breakdown(input.food_sales, input.beverage_sales, total)
            .map_err(|m| AppError::validation("total_sales", m))?;

        let mut tx = self.db.begin().await?;
        let department_id =
            CatalogService::resolve(&mut tx, CatalogKind::Department, input.department.as_deref()).await?;

        let sale_id = sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO sales (date, food_sales, beverage_sales, total_sales, department_id, recorded_by)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id
            "#,
        )
        .bind(input.date)
        .bind(input.food_sales)
        .bind(input.beverage_sales)
        .bind(total)
        .bind(department_id)
        .bind(user_id)
        .fetch_one(&mut *tx)
        .await?;

        let record = sqlx::query_as::<_, SaleRow>(&sale_by_id_query())
            .bind(None::<NaiveDate>)
            .bind(None::<NaiveDate>)
            .bind(sale_id)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;

        tracing::info!(%sale_id, date = %input.date, %total, "sale recorded");

        Ok(record.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(total: Option<i64>) -> CreateSaleInput {
        CreateSaleInput {
            date: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
            food_sales: Decimal::from(60),
            beverage_sales: Decimal::from(40),
            total_sales: total.map(Decimal::from),
            department: None,
        }
    }

    #[test]
    fn test_total_defaults_to_breakdown() {
        assert_eq!(input(None).resolved_total().unwrap(), Decimal::from(100));
        assert_eq!(input(Some(120)).resolved_total().unwrap(), Decimal::from(120));
    }

    #[test]
    fn test_overflowing_breakdown_is_rejected() {
        let mut sale = input(None);
        sale.food_sales = Decimal::MAX;
        sale.beverage_sales = Decimal::MAX;
        let err = sale.resolved_total().unwrap_err();
        assert!(matches!(err, AppError::Validation { ref field, .. } if field == "total_sales"));

        sale.total_sales = Some(Decimal::MAX);
        assert_eq!(sale.resolved_total().unwrap(), Decimal::MAX);
    }

    #[test]
    fn test_created_sale_is_read_back_with_stored_department_name() {
        let query = sale_by_id_query();
        assert!(query.contains("d.name AS department"));
        assert!(query.trim_end().ends_with("AND s.id = $3"));

        let sale = Sale::from(SaleRow {
            id: Uuid::new_v4(),
            date: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
            food_sales: Decimal::from(60),
            beverage_sales: Decimal::from(40),
            total_sales: Decimal::from(100),
            department: Some("Kitchen".to_string()),
        });
        assert_eq!(sale.department.as_deref(), Some("Kitchen"));
    }
}
