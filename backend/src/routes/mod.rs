//! Route definitions for the Annu ERP API

use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};

use crate::{handlers, middleware::auth_middleware, AppState};

/// Create API routes. Everything except health and the sign-in flows
/// requires a bearer token.
pub fn api_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        // Health check (public)
        .route("/health", get(handlers::health_check))
        .nest("/auth", auth_routes(state))
        .nest("/users", user_routes(state))
        .nest("/inventory", inventory_routes(state))
        .nest("/categories", category_routes(state))
        .nest("/departments", department_routes(state))
        .nest("/purchase-orders", purchase_order_routes(state))
        .route(
            "/receiving",
            get(handlers::get_receiving_log).route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware)),
        )
        .nest("/sales", sales_routes(state))
        .nest("/recipes", recipe_routes(state))
        .nest("/counts", count_routes(state))
        .nest("/waste", waste_routes(state))
        .nest("/reports", report_routes(state))
}

/// Authentication routes; sign-in flows are public
fn auth_routes(state: &AppState) -> Router<AppState> {
    let protected = Router::new()
        .route("/me", get(handlers::me))
        .route("/logout", post(handlers::logout))
        .route("/password", post(handlers::change_password))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .route("/login", post(handlers::login))
        .route("/register", post(handlers::register))
        .route("/password-reset", post(handlers::password_reset))
        .merge(protected)
}

/// User administration routes (admin only)
fn user_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_users).post(handlers::create_user))
        .route(
            "/:id",
            get(handlers::get_user)
                .put(handlers::update_user)
                .delete(handlers::deactivate_user),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
}

fn inventory_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_inventory).post(handlers::create_inventory_item))
        .route("/reorder", get(handlers::get_reorder_list))
        .route(
            "/:id",
            get(handlers::get_inventory_item)
                .put(handlers::update_inventory_item)
                .delete(handlers::delete_inventory_item),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
}

fn category_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_categories).post(handlers::create_category))
        .route("/:id", put(handlers::update_category).delete(handlers::delete_category))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
}

fn department_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_departments).post(handlers::create_department))
        .route("/:id", put(handlers::update_department).delete(handlers::delete_department))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
}

fn purchase_order_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_purchase_orders).post(handlers::create_purchase_order))
        .route(
            "/:id",
            get(handlers::get_purchase_order)
                .put(handlers::update_purchase_order)
                .delete(handlers::delete_purchase_order),
        )
        .route("/:id/receive", post(handlers::receive_purchase_order))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
}

fn sales_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_sales).post(handlers::create_sale))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
}

fn recipe_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_recipes).post(handlers::create_recipe))
        .route("/:id", get(handlers::get_recipe).delete(handlers::delete_recipe))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
}

fn count_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_counts).post(handlers::record_count))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
}

fn waste_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_waste).post(handlers::record_waste))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
}

/// Report routes; each accepts `start_date`, `end_date` and `format`
fn report_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/departmental-cost", get(handlers::get_departmental_cost))
        .route("/recipe-cost", get(handlers::get_recipe_cost))
        .route("/count-variance", get(handlers::get_count_variance))
        .route("/waste", get(handlers::get_waste))
        .route("/waste/by-category", get(handlers::get_waste_by_category))
        .route("/price-change", get(handlers::get_price_change))
        .route("/non-food", get(handlers::get_non_food))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
}
