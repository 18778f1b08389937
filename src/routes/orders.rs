//! Service-order routes — listing, CRUD, activity, exports.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use axum::response::{IntoResponse, Json, Response};
use serde::Serialize;
use uuid::Uuid;

use crate::activity;
use crate::export::{self, Column};
use crate::listing::{Direction, derive_view, filter_and_sort};
use crate::routes::auth::AuthUser;
use crate::routes::query::{ListQuery, ListResponse};
use crate::services::order::{self, NewOrder, OrderError, OrderPatch};
use crate::state::{AppState, ServiceOrder};

pub(crate) fn order_error_to_status(err: &OrderError) -> StatusCode {
    match err {
        OrderError::NotFound(_) | OrderError::TechnicianNotFound(_) => StatusCode::NOT_FOUND,
        OrderError::InvalidStatus(_) | OrderError::Validation(_) => StatusCode::BAD_REQUEST,
        OrderError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

// =============================================================================
// LISTING
// =============================================================================

/// `GET /api/orders` — derived page over the hydrated order collection.
pub async fn list_orders(
    State(state): State<AppState>,
    _auth: AuthUser,
    Query(query): Query<ListQuery>,
) -> Result<Json<ListResponse<ServiceOrder>>, StatusCode> {
    order::ensure_hydrated(&state).await.map_err(|e| order_error_to_status(&e))?;

    let records = state.orders.snapshot().await;
    let page = query.page();
    let view = derive_view(
        &records,
        &query.filter_for_orders(),
        &query.sort_spec("created_at", Direction::Desc),
        page,
    );
    Ok(Json(ListResponse::from_view(view, page)))
}

// =============================================================================
// CRUD
// =============================================================================

/// `POST /api/orders` — intake a new service order.
pub async fn create_order(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(body): Json<NewOrder>,
) -> Result<(StatusCode, Json<ServiceOrder>), StatusCode> {
    let order = order::create_order(&state, body, Some(&auth.user.full_name))
        .await
        .map_err(|e| order_error_to_status(&e))?;
    Ok((StatusCode::CREATED, Json(order)))
}

/// `GET /api/orders/:id`.
pub async fn get_order(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(order_id): Path<Uuid>,
) -> Result<Json<ServiceOrder>, StatusCode> {
    let order = order::get_order(&state, order_id).await.map_err(|e| order_error_to_status(&e))?;
    Ok(Json(order))
}

/// `PATCH /api/orders/:id` — status / technician / cost / notes.
pub async fn update_order(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(order_id): Path<Uuid>,
    Json(body): Json<OrderPatch>,
) -> Result<Json<ServiceOrder>, StatusCode> {
    let order = order::update_order(&state, order_id, body, Some(&auth.user.full_name))
        .await
        .map_err(|e| order_error_to_status(&e))?;
    Ok(Json(order))
}

/// `DELETE /api/orders/:id`.
pub async fn delete_order(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(order_id): Path<Uuid>,
) -> Result<StatusCode, StatusCode> {
    order::delete_order(&state, order_id).await.map_err(|e| order_error_to_status(&e))?;
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// ACTIVITY
// =============================================================================

#[derive(Serialize)]
pub struct ActivityView {
    pub id: Uuid,
    pub action: String,
    pub description: String,
    pub actor: Option<String>,
    pub created_at: i64,
}

/// `GET /api/orders/:id/activity` — rendered history, newest first.
pub async fn order_activity(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(order_id): Path<Uuid>,
) -> Result<Json<Vec<ActivityView>>, StatusCode> {
    let entries = activity::list_for_order(&state.pool, order_id)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    Ok(Json(
        entries
            .into_iter()
            .map(|entry| ActivityView {
                id: entry.id,
                description: activity::describe(&entry.action, &entry.payload),
                action: entry.action,
                actor: entry.actor,
                created_at: entry.created_at,
            })
            .collect(),
    ))
}

// =============================================================================
// EXPORT
// =============================================================================

const ORDER_COLUMNS: &[Column<ServiceOrder>] = &[
    Column { header: "Pelanggan", extract: |o| o.customer_name.clone() },
    Column { header: "Telepon", extract: |o| o.customer_phone.clone() },
    Column { header: "Perangkat", extract: |o| o.device.clone() },
    Column { header: "Keluhan", extract: |o| o.complaint.clone() },
    Column { header: "Status", extract: |o| o.status.clone() },
    Column { header: "Teknisi", extract: |o| o.technician_name.clone().unwrap_or_default() },
    Column { header: "Biaya", extract: |o| o.cost.to_string() },
    Column { header: "Catatan", extract: |o| o.notes.clone() },
];

fn range_tag(query: &ListQuery) -> String {
    match query.days {
        Some(days) if days > 0 => format!("{days}hari"),
        _ => "semua".to_string(),
    }
}

async fn filtered_orders(state: &AppState, query: &ListQuery) -> Result<Vec<ServiceOrder>, StatusCode> {
    order::ensure_hydrated(state).await.map_err(|e| order_error_to_status(&e))?;
    let records = state.orders.snapshot().await;
    Ok(filter_and_sort(
        &records,
        &query.filter_for_orders(),
        &query.sort_spec("created_at", Direction::Desc),
    ))
}

pub(crate) fn attachment(bytes: Vec<u8>, content_type: &str, filename: &str) -> Response {
    (
        [
            (CONTENT_TYPE, content_type.to_string()),
            (CONTENT_DISPOSITION, format!("attachment; filename=\"{filename}\"")),
        ],
        bytes,
    )
        .into_response()
}

/// `GET /api/orders/export.csv` — filtered orders as CSV.
pub async fn export_csv(
    State(state): State<AppState>,
    _auth: AuthUser,
    Query(query): Query<ListQuery>,
) -> Result<Response, StatusCode> {
    let orders = filtered_orders(&state, &query).await?;
    let csv = export::to_csv(&orders, ORDER_COLUMNS);
    let filename = export::export_filename("servis", &range_tag(&query), "csv");
    Ok(attachment(csv.into_bytes(), "text/csv; charset=utf-8", &filename))
}

/// `GET /api/orders/export.xlsx` — filtered orders as a spreadsheet.
pub async fn export_xlsx(
    State(state): State<AppState>,
    _auth: AuthUser,
    Query(query): Query<ListQuery>,
) -> Result<Response, StatusCode> {
    let orders = filtered_orders(&state, &query).await?;
    let bytes = export::to_xlsx(&orders, ORDER_COLUMNS).map_err(|e| {
        tracing::error!(error = %e, "xlsx encoding failed");
        StatusCode::INTERNAL_SERVER_ERROR
    })?;
    let filename = export::export_filename("servis", &range_tag(&query), "xlsx");
    Ok(attachment(
        bytes,
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        &filename,
    ))
}
