//! Shared types, models and report computations for the Annu restaurant ERP
//!
//! This crate contains the domain models shared between the backend and the
//! browser (via WASM), the report aggregation engine, and the client-side
//! auth-session state machine. Nothing in here performs I/O.

pub mod models;
pub mod reports;
pub mod session;
pub mod types;
pub mod validation;

pub use models::*;
pub use types::*;
pub use validation::*;
