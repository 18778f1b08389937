//! Service-order service — CRUD, status flow, assignment, activity trail.
//!
//! DESIGN
//! ======
//! Orders live in Postgres; the order hub keeps a newest-first in-memory
//! copy, hydrated on first use, so list derivation never re-queries per
//! interaction. Every mutation is DB-first: the hub is only updated (and
//! subscribers notified) after the write has been confirmed, so a failed
//! call never leaves tentative state behind.
//!
//! Each meaningful change (status, technician, cost, notes) appends an
//! `activity_log` row. Activity writes are best-effort: a failure is logged
//! and the mutation still succeeds.

use sqlx::Row;
use sqlx::postgres::PgRow;
use tracing::{info, warn};
use uuid::Uuid;

use crate::activity;
use crate::event::{ChangeEvent, now_ms};
use crate::state::{AppState, ServiceOrder};

// =============================================================================
// TYPES
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum OrderError {
    #[error("order not found: {0}")]
    NotFound(Uuid),
    #[error("technician not found: {0}")]
    TechnicianNotFound(Uuid),
    #[error("invalid status: {0}")]
    InvalidStatus(String),
    #[error("{0}")]
    Validation(&'static str),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Order status flow: Baru → Diproses → Selesai → Diambil.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderStatus {
    Baru,
    Diproses,
    Selesai,
    Diambil,
}

impl OrderStatus {
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "Baru" => Some(Self::Baru),
            "Diproses" => Some(Self::Diproses),
            "Selesai" => Some(Self::Selesai),
            "Diambil" => Some(Self::Diambil),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Baru => "Baru",
            Self::Diproses => "Diproses",
            Self::Selesai => "Selesai",
            Self::Diambil => "Diambil",
        }
    }
}

/// Fields a receptionist fills in at intake.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct NewOrder {
    pub customer_name: String,
    #[serde(default)]
    pub customer_phone: String,
    pub device: String,
    #[serde(default)]
    pub complaint: String,
}

/// Partial update; absent fields are left untouched.
#[derive(Debug, Clone, Default, serde::Deserialize)]
pub struct OrderPatch {
    pub status: Option<String>,
    pub technician_id: Option<Uuid>,
    pub cost: Option<i64>,
    pub notes: Option<String>,
}

fn order_from_row(row: &PgRow) -> ServiceOrder {
    ServiceOrder {
        id: row.get("id"),
        customer_name: row.get("customer_name"),
        customer_phone: row.get("customer_phone"),
        device: row.get("device"),
        complaint: row.get("complaint"),
        status: row.get("status"),
        technician_id: row.get("technician_id"),
        technician_name: row.get("technician_name"),
        cost: row.get("cost"),
        notes: row.get("notes"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

const ORDER_COLUMNS: &str = "id, customer_name, customer_phone, device, complaint, status, \
     technician_id, technician_name, cost, notes, created_at, updated_at";

// =============================================================================
// HYDRATION
// =============================================================================

/// Hydrate the order hub from Postgres if it hasn't been loaded yet.
///
/// # Errors
///
/// Returns a database error if the fetch fails.
pub async fn ensure_hydrated(state: &AppState) -> Result<(), OrderError> {
    if state.orders.is_hydrated().await {
        return Ok(());
    }
    let rows = sqlx::query(&format!(
        "SELECT {ORDER_COLUMNS} FROM service_orders ORDER BY created_at DESC"
    ))
    .fetch_all(&state.pool)
    .await?;

    let orders: Vec<ServiceOrder> = rows.iter().map(order_from_row).collect();
    info!(count = orders.len(), "hydrated service orders from database");
    state.orders.hydrate(orders).await;
    Ok(())
}

// =============================================================================
// CRUD
// =============================================================================

/// Create a new service order with status `Baru`.
///
/// # Errors
///
/// Returns a validation error for blank required fields, or a database
/// error if the insert fails.
pub async fn create_order(
    state: &AppState,
    new: NewOrder,
    actor: Option<&str>,
) -> Result<ServiceOrder, OrderError> {
    if new.customer_name.trim().is_empty() {
        return Err(OrderError::Validation("customer name is required"));
    }
    if new.device.trim().is_empty() {
        return Err(OrderError::Validation("device is required"));
    }

    let now = now_ms();
    let order = ServiceOrder {
        id: Uuid::new_v4(),
        customer_name: new.customer_name.trim().to_string(),
        customer_phone: new.customer_phone.trim().to_string(),
        device: new.device.trim().to_string(),
        complaint: new.complaint.trim().to_string(),
        status: OrderStatus::Baru.as_str().to_string(),
        technician_id: None,
        technician_name: None,
        cost: 0,
        notes: String::new(),
        created_at: now,
        updated_at: now,
    };

    sqlx::query(
        "INSERT INTO service_orders
             (id, customer_name, customer_phone, device, complaint, status, cost, notes, created_at, updated_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)",
    )
    .bind(order.id)
    .bind(&order.customer_name)
    .bind(&order.customer_phone)
    .bind(&order.device)
    .bind(&order.complaint)
    .bind(&order.status)
    .bind(order.cost)
    .bind(&order.notes)
    .bind(order.created_at)
    .bind(order.updated_at)
    .execute(&state.pool)
    .await?;

    record_activity(
        state,
        order.id,
        "order_created",
        serde_json::json!({ "customer": order.customer_name, "device": order.device }),
        actor,
    )
    .await;

    info!(order_id = %order.id, customer = %order.customer_name, "service order created");
    state.orders.publish(ChangeEvent::Insert { record: order.clone() }).await;
    Ok(order)
}

/// Fetch one order by id.
///
/// # Errors
///
/// Returns `NotFound` for an unknown id, or a database error.
pub async fn get_order(state: &AppState, order_id: Uuid) -> Result<ServiceOrder, OrderError> {
    let row = sqlx::query(&format!("SELECT {ORDER_COLUMNS} FROM service_orders WHERE id = $1"))
        .bind(order_id)
        .fetch_optional(&state.pool)
        .await?
        .ok_or(OrderError::NotFound(order_id))?;
    Ok(order_from_row(&row))
}

/// Apply a partial update, logging one activity entry per changed field.
///
/// # Errors
///
/// Returns `NotFound`, `InvalidStatus`, `TechnicianNotFound`, a validation
/// error for a negative cost, or a database error.
pub async fn update_order(
    state: &AppState,
    order_id: Uuid,
    patch: OrderPatch,
    actor: Option<&str>,
) -> Result<ServiceOrder, OrderError> {
    let current = get_order(state, order_id).await?;
    let mut updated = current.clone();

    if let Some(status) = &patch.status {
        let parsed =
            OrderStatus::parse(status).ok_or_else(|| OrderError::InvalidStatus(status.clone()))?;
        updated.status = parsed.as_str().to_string();
    }
    if let Some(technician_id) = patch.technician_id {
        let name: Option<String> =
            sqlx::query_scalar("SELECT full_name FROM users WHERE id = $1 AND role = 'teknisi'")
                .bind(technician_id)
                .fetch_optional(&state.pool)
                .await?;
        let name = name.ok_or(OrderError::TechnicianNotFound(technician_id))?;
        updated.technician_id = Some(technician_id);
        updated.technician_name = Some(name);
    }
    if let Some(cost) = patch.cost {
        if cost < 0 {
            return Err(OrderError::Validation("cost must not be negative"));
        }
        updated.cost = cost;
    }
    if let Some(notes) = &patch.notes {
        updated.notes = notes.clone();
    }
    updated.updated_at = now_ms();

    sqlx::query(
        "UPDATE service_orders
         SET status = $2, technician_id = $3, technician_name = $4, cost = $5, notes = $6, updated_at = $7
         WHERE id = $1",
    )
    .bind(order_id)
    .bind(&updated.status)
    .bind(updated.technician_id)
    .bind(&updated.technician_name)
    .bind(updated.cost)
    .bind(&updated.notes)
    .bind(updated.updated_at)
    .execute(&state.pool)
    .await?;

    log_changes(state, &current, &updated, actor).await;

    state.orders.publish(ChangeEvent::Update { record: updated.clone() }).await;
    Ok(updated)
}

/// Delete an order by id.
///
/// # Errors
///
/// Returns `NotFound` for an unknown id, or a database error.
pub async fn delete_order(state: &AppState, order_id: Uuid) -> Result<(), OrderError> {
    let result = sqlx::query("DELETE FROM service_orders WHERE id = $1")
        .bind(order_id)
        .execute(&state.pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(OrderError::NotFound(order_id));
    }

    info!(%order_id, "service order deleted");
    state.orders.publish(ChangeEvent::Delete { id: order_id }).await;
    Ok(())
}

// =============================================================================
// ACTIVITY TRAIL
// =============================================================================

async fn log_changes(state: &AppState, before: &ServiceOrder, after: &ServiceOrder, actor: Option<&str>) {
    if before.status != after.status {
        record_activity(
            state,
            after.id,
            "status_change",
            serde_json::json!({ "old": before.status, "new": after.status }),
            actor,
        )
        .await;
    }
    if before.technician_id != after.technician_id {
        record_activity(
            state,
            after.id,
            "technician_assigned",
            serde_json::json!({
                "old": before.technician_name,
                "new": after.technician_name,
                "technician": after.technician_name,
            }),
            actor,
        )
        .await;
    }
    if before.cost != after.cost {
        record_activity(
            state,
            after.id,
            "cost_update",
            serde_json::json!({ "old": before.cost, "new": after.cost }),
            actor,
        )
        .await;
    }
    if before.notes != after.notes {
        record_activity(
            state,
            after.id,
            "field_update",
            serde_json::json!({ "field": "Catatan", "old": before.notes, "new": after.notes }),
            actor,
        )
        .await;
    }
}

async fn record_activity(
    state: &AppState,
    order_id: Uuid,
    action: &str,
    payload: serde_json::Value,
    actor: Option<&str>,
) {
    if let Err(e) = activity::record(&state.pool, order_id, action, payload, actor).await {
        warn!(error = %e, %order_id, action, "activity log write failed");
    }
}

#[cfg(test)]
#[path = "order_test.rs"]
mod tests;
