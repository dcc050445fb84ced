//! Reporting service
//!
//! Reads go through [`ReportSource`]; each report fetches its inputs
//! concurrently and then runs the pure aggregation from `shared::reports`.

use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::config::ReportsConfig;
use crate::error::{AppError, AppResult};
use crate::models::{CountRecord, InventoryItem, PriceChange, Recipe, Sale, WasteRecord};
use crate::services::{InventoryService, RecipeService, SalesService, StockRecordService};
use shared::reports::{
    count_variance_report, departmental_cost_summary, non_food_consumables, price_change_report,
    recipe_cost_report, waste_by_category, waste_report, ConsumableRow, CountVarianceRow,
    DepartmentalCostReport, PriceChangeRow, RecipeCostRow, WasteByCategory, WasteRow,
};
use shared::types::ReportFilter;

/// Data the reports read. Snapshot collections (inventory, recipes) ignore
/// the filter; dated collections apply it inclusively.
#[async_trait]
pub trait ReportSource: Send + Sync {
    async fn inventory(&self, filter: &ReportFilter) -> AppResult<Vec<InventoryItem>>;
    async fn sales(&self, filter: &ReportFilter) -> AppResult<Vec<Sale>>;
    async fn recipes(&self, filter: &ReportFilter) -> AppResult<Vec<Recipe>>;
    async fn counts(&self, filter: &ReportFilter) -> AppResult<Vec<CountRecord>>;
    async fn waste(&self, filter: &ReportFilter) -> AppResult<Vec<WasteRecord>>;
    async fn price_changes(&self, filter: &ReportFilter) -> AppResult<Vec<PriceChange>>;
}

/// PostgreSQL-backed source
#[derive(Clone)]
pub struct PgReportSource {
    db: PgPool,
}

impl PgReportSource {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[derive(Debug, FromRow)]
struct PriceChangeDbRow {
    id: Uuid,
    item_id: Option<Uuid>,
    item_name: Option<String>,
    old_price: Decimal,
    new_price: Decimal,
    date: NaiveDate,
    changed_by: Option<String>,
}

#[async_trait]
impl ReportSource for PgReportSource {
    async fn inventory(&self, _filter: &ReportFilter) -> AppResult<Vec<InventoryItem>> {
        InventoryService::new(self.db.clone()).list().await
    }

    async fn sales(&self, filter: &ReportFilter) -> AppResult<Vec<Sale>> {
        SalesService::new(self.db.clone()).list(filter).await
    }

    async fn recipes(&self, _filter: &ReportFilter) -> AppResult<Vec<Recipe>> {
        RecipeService::new(self.db.clone()).list().await
    }

    async fn counts(&self, filter: &ReportFilter) -> AppResult<Vec<CountRecord>> {
        StockRecordService::new(self.db.clone()).list_counts(filter).await
    }

    async fn waste(&self, filter: &ReportFilter) -> AppResult<Vec<WasteRecord>> {
        StockRecordService::new(self.db.clone()).list_waste(filter).await
    }

    async fn price_changes(&self, filter: &ReportFilter) -> AppResult<Vec<PriceChange>> {
        let rows = sqlx::query_as::<_, PriceChangeDbRow>(
            r#"
            SELECT pc.id, pc.item_id, i.name AS item_name, pc.old_price, pc.new_price, pc.date,
                   u.name AS changed_by
            FROM price_changes pc
            LEFT JOIN inventory i ON i.id = pc.item_id
            LEFT JOIN users u ON u.id = pc.changed_by
            WHERE ($1::date IS NULL OR pc.date >= $1) AND ($2::date IS NULL OR pc.date <= $2)
            ORDER BY pc.date DESC
            "#,
        )
        .bind(filter.start_date)
        .bind(filter.end_date)
        .fetch_all(&self.db)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| PriceChange {
                id: row.id,
                item_id: row.item_id,
                item_name: row.item_name,
                old_price: row.old_price,
                new_price: row.new_price,
                date: row.date,
                changed_by: row.changed_by,
            })
            .collect())
    }
}

/// Flat departmental row for CSV export
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DepartmentCostCsvRow {
    pub department: String,
    pub cogs: Decimal,
    pub sales: Decimal,
    pub cost_percentage: Decimal,
    pub item_count: usize,
}

/// Label of the store-wide row in the departmental CSV
pub const STORE_ROW: &str = "Store total";

impl DepartmentCostCsvRow {
    /// One row per department followed by the store total
    pub fn from_report(report: &DepartmentalCostReport) -> Vec<Self> {
        let mut rows: Vec<Self> = report
            .departments
            .iter()
            .map(|(department, summary)| Self {
                department: department.clone(),
                cogs: summary.cogs,
                sales: summary.sales,
                cost_percentage: summary.cost_percentage,
                item_count: summary.items.len(),
            })
            .collect();
        rows.push(Self {
            department: STORE_ROW.to_string(),
            cogs: report.store.cogs,
            sales: report.store.sales,
            cost_percentage: report.store.cost_percentage,
            item_count: report.departments.values().map(|d| d.items.len()).sum(),
        });
        rows
    }
}

/// Flat waste-by-category row for CSV export
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WasteCategoryCsvRow {
    pub category: String,
    pub value: Decimal,
}

impl WasteCategoryCsvRow {
    pub fn from_report(report: &WasteByCategory) -> Vec<Self> {
        report
            .categories
            .iter()
            .map(|(category, value)| Self {
                category: category.clone(),
                value: *value,
            })
            .collect()
    }
}

/// Reporting service
#[derive(Clone)]
pub struct ReportingService<S = PgReportSource> {
    source: S,
    settings: ReportsConfig,
}

impl ReportingService<PgReportSource> {
    pub fn new(db: PgPool, settings: ReportsConfig) -> Self {
        Self::with_source(PgReportSource::new(db), settings)
    }
}

impl<S: ReportSource> ReportingService<S> {
    pub fn with_source(source: S, settings: ReportsConfig) -> Self {
        Self { source, settings }
    }

    /// Inventory value per department against attributed sales
    pub async fn departmental_cost(&self, filter: &ReportFilter) -> AppResult<DepartmentalCostReport> {
        filter.validate()?;
        let (inventory, sales) = tokio::try_join!(self.source.inventory(filter), self.source.sales(filter))?;

        let report = departmental_cost_summary(&inventory, &sales);
        tracing::debug!(
            departments = report.departments.len(),
            skipped = report.skipped_records,
            "departmental cost summary built"
        );
        Ok(report)
    }

    /// Cost and margin for every recipe
    pub async fn recipe_cost(&self, filter: &ReportFilter) -> AppResult<Vec<RecipeCostRow>> {
        filter.validate()?;
        let recipes = self.source.recipes(filter).await?;
        Ok(recipe_cost_report(&recipes))
    }

    pub async fn count_variance(&self, filter: &ReportFilter) -> AppResult<Vec<CountVarianceRow>> {
        filter.validate()?;
        let counts = self.source.counts(filter).await?;
        Ok(count_variance_report(&counts))
    }

    pub async fn waste(&self, filter: &ReportFilter) -> AppResult<Vec<WasteRow>> {
        filter.validate()?;
        let records = self.source.waste(filter).await?;
        Ok(waste_report(&records))
    }

    pub async fn waste_by_category(&self, filter: &ReportFilter) -> AppResult<WasteByCategory> {
        filter.validate()?;
        let records = self.source.waste(filter).await?;
        Ok(waste_by_category(&records))
    }

    /// Price changes flagged against the configured alert threshold
    pub async fn price_change(&self, filter: &ReportFilter) -> AppResult<Vec<PriceChangeRow>> {
        filter.validate()?;
        let changes = self.source.price_changes(filter).await?;
        Ok(price_change_report(&changes, self.settings.price_alert_threshold_percent))
    }

    /// Inventory in the configured non-food category
    pub async fn non_food(&self, filter: &ReportFilter) -> AppResult<Vec<ConsumableRow>> {
        filter.validate()?;
        let inventory = self.source.inventory(filter).await?;
        Ok(non_food_consumables(&inventory, &self.settings.non_food_category))
    }
}

/// Export report data as CSV
pub fn export_to_csv<T: Serialize>(data: &[T]) -> AppResult<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    for record in data {
        wtr.serialize(record)
            .map_err(|e| AppError::Internal(format!("CSV serialization error: {}", e)))?;
    }
    let csv_data = String::from_utf8(
        wtr.into_inner()
            .map_err(|e| AppError::Internal(format!("CSV writer error: {}", e)))?,
    )
    .map_err(|e| AppError::Internal(format!("UTF-8 conversion error: {}", e)))?;
    Ok(csv_data)
}
