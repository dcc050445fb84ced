//! WebAssembly module for the Annu ERP frontend
//!
//! Provides client-side computation for:
//! - Report aggregation on data the browser already holds
//! - The auth session state machine behind the provider's auth events
//!
//! Every report takes JSON strings and returns a JSON string.

use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;
use uuid::Uuid;
use wasm_bindgen::prelude::*;

use shared::models::{CountRecord, InventoryItem, PriceChange, Recipe, Sale, UserProfile, WasteRecord};
use shared::reports;
use shared::session::{AuthEvent, AuthListener, SessionError, Subscription};

// Re-export shared types for Rust consumers of the rlib
pub use shared::models::*;
pub use shared::types::*;

#[derive(Debug, Error)]
pub enum WasmError {
    #[error("invalid {what} JSON: {source}")]
    Decode {
        what: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to encode result: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("invalid {what}: {value}")]
    InvalidValue { what: &'static str, value: String },

    #[error(transparent)]
    Session(#[from] SessionError),
}

impl From<WasmError> for JsValue {
    fn from(err: WasmError) -> Self {
        JsValue::from_str(&err.to_string())
    }
}

fn decode<T: DeserializeOwned>(what: &'static str, json: &str) -> Result<T, WasmError> {
    serde_json::from_str(json).map_err(|source| WasmError::Decode { what, source })
}

fn encode<T: Serialize>(value: &T) -> Result<String, WasmError> {
    Ok(serde_json::to_string(value)?)
}

fn parse_decimal(what: &'static str, value: &str) -> Result<Decimal, WasmError> {
    Decimal::from_str(value.trim()).map_err(|_| WasmError::InvalidValue {
        what,
        value: value.to_string(),
    })
}

fn parse_user_id(value: Option<String>) -> Result<Option<Uuid>, WasmError> {
    value
        .filter(|v| !v.trim().is_empty())
        .map(|v| {
            Uuid::parse_str(v.trim()).map_err(|_| WasmError::InvalidValue {
                what: "user id",
                value: v,
            })
        })
        .transpose()
}

// ============================================================================
// Reports
// ============================================================================

fn departmental_cost_json(inventory_json: &str, sales_json: &str) -> Result<String, WasmError> {
    let inventory: Vec<InventoryItem> = decode("inventory", inventory_json)?;
    let sales: Vec<Sale> = decode("sales", sales_json)?;
    encode(&reports::departmental_cost_summary(&inventory, &sales))
}

fn recipe_cost_json(recipes_json: &str) -> Result<String, WasmError> {
    let recipes: Vec<Recipe> = decode("recipes", recipes_json)?;
    encode(&reports::recipe_cost_report(&recipes))
}

fn count_variance_json(counts_json: &str) -> Result<String, WasmError> {
    let counts: Vec<CountRecord> = decode("counts", counts_json)?;
    encode(&reports::count_variance_report(&counts))
}

fn price_change_json(changes_json: &str, threshold: &str) -> Result<String, WasmError> {
    let changes: Vec<PriceChange> = decode("price changes", changes_json)?;
    let threshold = parse_decimal("alert threshold", threshold)?;
    encode(&reports::price_change_report(&changes, threshold))
}

fn waste_by_category_json(waste_json: &str) -> Result<String, WasmError> {
    let records: Vec<WasteRecord> = decode("waste", waste_json)?;
    encode(&reports::waste_by_category(&records))
}

/// Cost of goods per department against attributed sales
#[wasm_bindgen]
pub fn departmental_cost_summary(inventory_json: &str, sales_json: &str) -> Result<String, JsValue> {
    Ok(departmental_cost_json(inventory_json, sales_json)?)
}

#[wasm_bindgen]
pub fn recipe_cost_report(recipes_json: &str) -> Result<String, JsValue> {
    Ok(recipe_cost_json(recipes_json)?)
}

#[wasm_bindgen]
pub fn count_variance_report(counts_json: &str) -> Result<String, JsValue> {
    Ok(count_variance_json(counts_json)?)
}

/// `threshold` is a decimal string, e.g. `"10"` for 10 %
#[wasm_bindgen]
pub fn price_change_report(changes_json: &str, threshold: &str) -> Result<String, JsValue> {
    Ok(price_change_json(changes_json, threshold)?)
}

#[wasm_bindgen]
pub fn waste_by_category(waste_json: &str) -> Result<String, JsValue> {
    Ok(waste_by_category_json(waste_json)?)
}

// ============================================================================
// Auth session
// ============================================================================

/// Auth state for the page, fed by the provider's `onAuthStateChange`.
///
/// Construct it with the subscription's unsubscribe callback; `close()` or
/// garbage collection of the object calls it exactly once.
#[wasm_bindgen]
pub struct AuthSession {
    listener: AuthListener,
}

#[wasm_bindgen]
impl AuthSession {
    #[wasm_bindgen(constructor)]
    pub fn new(unsubscribe: js_sys::Function) -> AuthSession {
        let subscription = Subscription::new(move || {
            if let Err(err) = unsubscribe.call0(&JsValue::NULL) {
                web_sys::console::warn_2(&JsValue::from_str("auth unsubscribe failed"), &err);
            }
        });
        AuthSession {
            listener: AuthListener::new(subscription),
        }
    }

    /// Feed a provider callback; returns the effect to run as JSON
    #[wasm_bindgen(js_name = handleProviderEvent)]
    pub fn handle_provider_event(&mut self, event: &str, user_id: Option<String>) -> Result<String, JsValue> {
        Ok(provider_event(&mut self.listener, event, user_id)?)
    }

    /// Feed a session event in its JSON form (`{"type": "sign_in_requested"}`)
    #[wasm_bindgen(js_name = handleEvent)]
    pub fn handle_event(&mut self, event_json: &str) -> Result<String, JsValue> {
        Ok(session_event(&mut self.listener, event_json)?)
    }

    #[wasm_bindgen(js_name = profileLoaded)]
    pub fn profile_loaded(&mut self, profile_json: &str) -> Result<String, JsValue> {
        Ok(profile_event(&mut self.listener, profile_json)?)
    }

    /// Current state as JSON
    pub fn state(&self) -> Result<String, JsValue> {
        Ok(encode(self.listener.state())?)
    }

    #[wasm_bindgen(getter, js_name = isAuthenticated)]
    pub fn is_authenticated(&self) -> bool {
        self.listener.machine().is_authenticated()
    }

    #[wasm_bindgen(getter, js_name = isLoading)]
    pub fn is_loading(&self) -> bool {
        self.listener.machine().is_loading()
    }

    /// Unsubscribe from the provider and release the machine
    pub fn close(self) {
        self.listener.close();
    }
}

fn provider_event(listener: &mut AuthListener, event: &str, user_id: Option<String>) -> Result<String, WasmError> {
    let user_id = parse_user_id(user_id)?;
    let effect = listener.handle_provider_event(event, user_id)?;
    encode(&effect)
}

fn session_event(listener: &mut AuthListener, event_json: &str) -> Result<String, WasmError> {
    let event: AuthEvent = decode("auth event", event_json)?;
    encode(&listener.handle(event)?)
}

fn profile_event(listener: &mut AuthListener, profile_json: &str) -> Result<String, WasmError> {
    let profile: UserProfile = decode("profile", profile_json)?;
    encode(&listener.handle(AuthEvent::ProfileLoaded { profile })?)
}
