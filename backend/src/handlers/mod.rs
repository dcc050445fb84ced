//! HTTP handlers, one module per API area

pub mod auth;
pub mod catalog;
pub mod health;
pub mod inventory;
pub mod purchasing;
pub mod recipes;
pub mod reporting;
pub mod sales;
pub mod stock_records;
pub mod users;

pub use auth::*;
pub use catalog::*;
pub use health::*;
pub use inventory::*;
pub use purchasing::*;
pub use recipes::*;
pub use reporting::*;
pub use sales::*;
pub use stock_records::*;
pub use users::*;
