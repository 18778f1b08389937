//! Router assembly.
//!
//! SYSTEM CONTEXT
//! ==============
//! Binds the REST API and the realtime websocket endpoint under a single
//! Axum router. The browser frontend is served separately; this process is
//! API-only.

pub mod auth;
pub mod inventory;
pub mod orders;
pub mod query;
pub mod users;
pub mod ws;

use axum::Router;
use axum::http::StatusCode;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Assemble the application router.
pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/me", get(auth::me))
        .route("/api/auth/logout", post(auth::logout))
        .route("/api/auth/ws-ticket", post(auth::ws_ticket))
        .route("/api/orders", get(orders::list_orders).post(orders::create_order))
        .route(
            "/api/orders/{id}",
            get(orders::get_order).patch(orders::update_order).delete(orders::delete_order),
        )
        .route("/api/orders/{id}/activity", get(orders::order_activity))
        .route("/api/orders/export.csv", get(orders::export_csv))
        .route("/api/orders/export.xlsx", get(orders::export_xlsx))
        .route("/api/inventory", get(inventory::list_items).post(inventory::create_item))
        .route(
            "/api/inventory/{id}",
            axum::routing::patch(inventory::update_item).delete(inventory::delete_item),
        )
        .route("/api/inventory/{id}/adjust", post(inventory::adjust_stock))
        .route("/api/inventory/export.csv", get(inventory::export_csv))
        .route("/api/users", get(users::list_users).post(users::create_user))
        .route("/api/users/technicians", get(users::list_technicians))
        .route("/api/users/{id}", axum::routing::delete(users::delete_user))
        .route("/api/ws", get(ws::handle_ws))
        .route("/healthz", get(healthz))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}
