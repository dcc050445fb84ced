//! Business logic services for the Annu restaurant ERP

pub mod auth;
pub mod catalog;
pub mod inventory;
pub mod purchasing;
pub mod recipes;
pub mod reporting;
pub mod sales;
pub mod stock_records;
pub mod users;

pub use auth::AuthService;
pub use catalog::{CatalogKind, CatalogService};
pub use inventory::InventoryService;
pub use purchasing::PurchasingService;
pub use recipes::RecipeService;
pub use reporting::{PgReportSource, ReportSource, ReportingService};
pub use sales::SalesService;
pub use stock_records::StockRecordService;
pub use users::UserService;
