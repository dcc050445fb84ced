//! Report handlers
//!
//! Every report takes `start_date`, `end_date` (YYYY-MM-DD, inclusive) and
//! `format=json|csv`. Reports are limited to managers and admins.

use axum::{
    extract::{Query, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::middleware::CurrentUser;
use crate::services::reporting::{
    export_to_csv, DepartmentCostCsvRow, ReportingService, WasteCategoryCsvRow,
};
use crate::AppState;
use shared::types::{ExportFormat, ReportFilter};

#[derive(Debug, Default, Deserialize)]
pub struct ReportQuery {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub format: Option<String>, // "json" or "csv"
}

impl ReportQuery {
    /// Parse and validate the date range
    pub fn filter(&self) -> AppResult<ReportFilter> {
        let start = parse_date("start_date", self.start_date.as_deref())?;
        let end = parse_date("end_date", self.end_date.as_deref())?;
        Ok(ReportFilter::new(start, end)?)
    }

    pub fn format(&self) -> ExportFormat {
        ExportFormat::from_query(self.format.as_deref())
    }
}

fn parse_date(field: &str, value: Option<&str>) -> AppResult<Option<NaiveDate>> {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        None => Ok(None),
        Some(v) => NaiveDate::parse_from_str(v, "%Y-%m-%d")
            .map(Some)
            .map_err(|_| AppError::validation(field, "Expected a date in YYYY-MM-DD format")),
    }
}

fn csv_response(csv: String, filename: &str) -> Response {
    let disposition = format!("attachment; filename=\"{}.csv\"", filename);
    (
        [
            (header::CONTENT_TYPE, "text/csv".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        csv,
    )
        .into_response()
}

/// JSON as-is, or CSV of the same rows
fn rows_response<T: Serialize>(rows: Vec<T>, format: ExportFormat, filename: &str) -> AppResult<Response> {
    match format {
        ExportFormat::Csv => Ok(csv_response(export_to_csv(&rows)?, filename)),
        ExportFormat::Json => Ok(Json(rows).into_response()),
    }
}

fn reporting_service(state: &AppState) -> ReportingService {
    ReportingService::new(state.db.clone(), state.config.reports.clone())
}

/// Cost of goods per department against attributed sales
pub async fn get_departmental_cost(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(query): Query<ReportQuery>,
) -> AppResult<Response> {
    current_user.0.require_manager()?;
    let report = reporting_service(&state)
        .departmental_cost(&query.filter()?)
        .await?;

    match query.format() {
        ExportFormat::Csv => {
            let csv = export_to_csv(&DepartmentCostCsvRow::from_report(&report))?;
            Ok(csv_response(csv, "departmental_cost"))
        }
        ExportFormat::Json => Ok(Json(report).into_response()),
    }
}

pub async fn get_recipe_cost(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(query): Query<ReportQuery>,
) -> AppResult<Response> {
    current_user.0.require_manager()?;
    let rows = reporting_service(&state).recipe_cost(&query.filter()?).await?;
    rows_response(rows, query.format(), "recipe_cost")
}

pub async fn get_count_variance(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(query): Query<ReportQuery>,
) -> AppResult<Response> {
    current_user.0.require_manager()?;
    let rows = reporting_service(&state).count_variance(&query.filter()?).await?;
    rows_response(rows, query.format(), "count_variance")
}

pub async fn get_waste(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(query): Query<ReportQuery>,
) -> AppResult<Response> {
    current_user.0.require_manager()?;
    let rows = reporting_service(&state).waste(&query.filter()?).await?;
    rows_response(rows, query.format(), "waste")
}

pub async fn get_waste_by_category(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(query): Query<ReportQuery>,
) -> AppResult<Response> {
    current_user.0.require_manager()?;
    let report = reporting_service(&state)
        .waste_by_category(&query.filter()?)
        .await?;

    match query.format() {
        ExportFormat::Csv => {
            let csv = export_to_csv(&WasteCategoryCsvRow::from_report(&report))?;
            Ok(csv_response(csv, "waste_by_category"))
        }
        ExportFormat::Json => Ok(Json(report).into_response()),
    }
}

/// Price changes, flagged against the configured alert threshold
pub async fn get_price_change(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(query): Query<ReportQuery>,
) -> AppResult<Response> {
    current_user.0.require_manager()?;
    let rows = reporting_service(&state).price_change(&query.filter()?).await?;
    rows_response(rows, query.format(), "price_change")
}

pub async fn get_non_food(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(query): Query<ReportQuery>,
) -> AppResult<Response> {
    current_user.0.require_manager()?;
    let rows = reporting_service(&state).non_food(&query.filter()?).await?;
    rows_response(rows, query.format(), "non_food")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(start: Option<&str>, end: Option<&str>, format: Option<&str>) -> ReportQuery {
        ReportQuery {
            start_date: start.map(str::to_string),
            end_date: end.map(str::to_string),
            format: format.map(str::to_string),
        }
    }

    #[test]
    fn test_filter_parses_dates() {
        let filter = query(Some("2024-01-01"), Some("2024-01-31"), None).filter().unwrap();
        assert_eq!(filter.start_date, NaiveDate::from_ymd_opt(2024, 1, 1));
        assert_eq!(filter.end_date, NaiveDate::from_ymd_opt(2024, 1, 31));
    }

    #[test]
    fn test_blank_dates_are_open() {
        let filter = query(Some(""), None, None).filter().unwrap();
        assert!(filter.is_unbounded());
    }

    #[test]
    fn test_bad_date_is_validation_error() {
        let err = query(None, Some("31/01/2024"), None).filter().unwrap_err();
        match err {
            AppError::Validation { field, .. } => assert_eq!(field, "end_date"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_inverted_range_rejected() {
        let err = query(Some("2024-02-01"), Some("2024-01-01"), None).filter().unwrap_err();
        assert!(matches!(err, AppError::Validation { .. }));
    }

    #[test]
    fn test_format_defaults_to_json() {
        assert_eq!(query(None, None, None).format(), ExportFormat::Json);
        assert_eq!(query(None, None, Some("CSV")).format(), ExportFormat::Csv);
        assert_eq!(query(None, None, Some("xml")).format(), ExportFormat::Json);
    }

    #[test]
    fn test_csv_response_headers() {
        let response = csv_response("a,b\n".to_string(), "waste");
        assert_eq!(response.headers()[header::CONTENT_TYPE], "text/csv");
        assert_eq!(
            response.headers()[header::CONTENT_DISPOSITION],
            "attachment; filename=\"waste.csv\""
        );
    }
}
