//! External API integrations

pub mod auth_provider;

pub use auth_provider::AuthProviderClient;
