//! Inventory routes — listing, CRUD, stock adjustment, export.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{Json, Response};
use serde::Deserialize;
use uuid::Uuid;

use crate::export::{self, Column};
use crate::listing::{Direction, derive_view, filter_and_sort};
use crate::routes::auth::AuthUser;
use crate::routes::orders::attachment;
use crate::routes::query::{ListQuery, ListResponse};
use crate::services::inventory::{self, InventoryError, ItemPatch, NewItem};
use crate::state::{AppState, InventoryItem};

pub(crate) fn inventory_error_to_status(err: &InventoryError) -> StatusCode {
    match err {
        InventoryError::NotFound(_) => StatusCode::NOT_FOUND,
        InventoryError::InsufficientStock { .. } | InventoryError::Validation(_) => StatusCode::BAD_REQUEST,
        InventoryError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

// =============================================================================
// LISTING
// =============================================================================

/// `GET /api/inventory` — derived page; `low_stock=true` filters to items
/// at or below their threshold.
pub async fn list_items(
    State(state): State<AppState>,
    _auth: AuthUser,
    Query(query): Query<ListQuery>,
) -> Result<Json<ListResponse<InventoryItem>>, StatusCode> {
    inventory::ensure_hydrated(&state).await.map_err(|e| inventory_error_to_status(&e))?;

    let records = state.inventory.snapshot().await;
    let page = query.page();
    let view = derive_view(
        &records,
        &query.filter_for_inventory(),
        &query.sort_spec("name", Direction::Asc),
        page,
    );
    Ok(Json(ListResponse::from_view(view, page)))
}

// =============================================================================
// CRUD
// =============================================================================

/// `POST /api/inventory`.
pub async fn create_item(
    State(state): State<AppState>,
    _auth: AuthUser,
    Json(body): Json<NewItem>,
) -> Result<(StatusCode, Json<InventoryItem>), StatusCode> {
    let item =
        inventory::create_item(&state, body).await.map_err(|e| inventory_error_to_status(&e))?;
    Ok((StatusCode::CREATED, Json(item)))
}

/// `PATCH /api/inventory/:id` — descriptive fields only.
pub async fn update_item(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(item_id): Path<Uuid>,
    Json(body): Json<ItemPatch>,
) -> Result<Json<InventoryItem>, StatusCode> {
    let item = inventory::update_item(&state, item_id, body)
        .await
        .map_err(|e| inventory_error_to_status(&e))?;
    Ok(Json(item))
}

#[derive(Deserialize)]
pub struct AdjustBody {
    /// Signed stock delta: positive restocks, negative consumes.
    pub delta: i64,
}

/// `POST /api/inventory/:id/adjust`.
pub async fn adjust_stock(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(item_id): Path<Uuid>,
    Json(body): Json<AdjustBody>,
) -> Result<Json<InventoryItem>, StatusCode> {
    let item = inventory::adjust_stock(&state, item_id, body.delta)
        .await
        .map_err(|e| inventory_error_to_status(&e))?;
    Ok(Json(item))
}

/// `DELETE /api/inventory/:id`.
pub async fn delete_item(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(item_id): Path<Uuid>,
) -> Result<StatusCode, StatusCode> {
    inventory::delete_item(&state, item_id).await.map_err(|e| inventory_error_to_status(&e))?;
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// EXPORT
// =============================================================================

const ITEM_COLUMNS: &[Column<InventoryItem>] = &[
    Column { header: "Nama", extract: |i| i.name.clone() },
    Column { header: "Kategori", extract: |i| i.category.clone() },
    Column { header: "Stok", extract: |i| i.quantity.to_string() },
    Column { header: "Stok Minimal", extract: |i| i.min_stock.to_string() },
    Column { header: "Harga Satuan", extract: |i| i.unit_price.to_string() },
    Column { header: "Pemasok", extract: |i| i.supplier.clone().unwrap_or_default() },
];

/// `GET /api/inventory/export.csv` — filtered inventory as CSV.
pub async fn export_csv(
    State(state): State<AppState>,
    _auth: AuthUser,
    Query(query): Query<ListQuery>,
) -> Result<Response, StatusCode> {
    inventory::ensure_hydrated(&state).await.map_err(|e| inventory_error_to_status(&e))?;

    let records = state.inventory.snapshot().await;
    let items = filter_and_sort(
        &records,
        &query.filter_for_inventory(),
        &query.sort_spec("name", Direction::Asc),
    );
    let csv = export::to_csv(&items, ITEM_COLUMNS);
    let filename = export::export_filename("inventaris", "semua", "csv");
    Ok(attachment(csv.into_bytes(), "text/csv; charset=utf-8", &filename))
}
