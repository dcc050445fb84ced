//! Domain models for the Annu restaurant ERP

mod inventory;
mod purchasing;
mod recipe;
mod records;
mod sales;
mod user;

pub use inventory::*;
pub use purchasing::*;
pub use recipe::*;
pub use records::*;
pub use sales::*;
pub use user::*;
