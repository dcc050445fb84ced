//! Database models for the Annu ERP server
//!
//! Re-exports models from the shared crate and adds backend-specific models

pub use shared::models::*;
