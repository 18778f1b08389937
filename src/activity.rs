//! Activity log — recording and human-readable rendering of order history.
//!
//! DESIGN
//! ======
//! Each mutation on a service order appends one `activity_log` row: an
//! action tag plus a free-form JSON payload. Payload shapes have drifted
//! over time (and upstream writers are not all under our control), so
//! `describe` is a total function: it dispatches on the normalized action
//! tag, extracts sub-fields defensively, and falls back to generic
//! rendering for anything it does not recognize. It must never panic for
//! any input.

use serde_json::Value;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::event::now_ms;

/// Shown in place of a sub-field the payload is missing.
const MISSING: &str = "-";

// =============================================================================
// TYPES
// =============================================================================

/// One audit-log row for a service order.
#[derive(Debug, Clone, serde::Serialize)]
pub struct ActivityEntry {
    pub id: Uuid,
    pub order_id: Uuid,
    pub action: String,
    pub payload: Value,
    pub actor: Option<String>,
    /// Milliseconds since Unix epoch.
    pub created_at: i64,
}

// =============================================================================
// RENDERING
// =============================================================================

/// Render one log entry as display text. Total: any action tag and any
/// payload shape produce a string, never an error.
#[must_use]
pub fn describe(action: &str, payload: &Value) -> String {
    match action.trim().to_lowercase().as_str() {
        "status_change" | "ubah_status" => describe_status_change(payload),
        "technician_assigned" | "assign_technician" => describe_assignment(payload),
        "cost_update" | "update_biaya" => describe_cost_update(payload),
        "order_created" | "created" => describe_creation(payload),
        "field_update" => describe_field_update(payload),
        _ => describe_fallback(payload),
    }
}

/// First present key from `keys`, rendered as text. Strings come through
/// as-is; numbers and booleans via display; anything else is opaque.
fn text_field(payload: &Value, keys: &[&str]) -> Option<String> {
    let object = payload.as_object()?;
    for key in keys {
        match object.get(*key) {
            Some(Value::String(s)) if !s.is_empty() => return Some(s.clone()),
            Some(Value::Number(n)) => return Some(n.to_string()),
            Some(Value::Bool(b)) => return Some(b.to_string()),
            _ => {}
        }
    }
    None
}

fn old_new(payload: &Value) -> (String, String) {
    let old = text_field(payload, &["old", "from", "sebelum"]).unwrap_or_else(|| MISSING.into());
    let new = text_field(payload, &["new", "to", "sesudah"]).unwrap_or_else(|| MISSING.into());
    (old, new)
}

fn describe_status_change(payload: &Value) -> String {
    let (old, new) = old_new(payload);
    format!("Status diubah dari '{old}' menjadi '{new}'")
}

fn describe_assignment(payload: &Value) -> String {
    match text_field(payload, &["technician", "new", "teknisi"]) {
        Some(name) => format!("Teknisi ditugaskan: {name}"),
        None => format!("Teknisi ditugaskan: {MISSING}"),
    }
}

fn describe_cost_update(payload: &Value) -> String {
    let (old, new) = old_new(payload);
    format!("Biaya diubah dari {old} menjadi {new}")
}

fn describe_creation(payload: &Value) -> String {
    match text_field(payload, &["customer", "customer_name", "pelanggan"]) {
        Some(customer) => format!("Order servis dibuat untuk {customer}"),
        None => "Order servis dibuat".into(),
    }
}

fn describe_field_update(payload: &Value) -> String {
    let Some(field) = text_field(payload, &["field", "kolom"]) else {
        return describe_fallback(payload);
    };
    let (old, new) = old_new(payload);
    format!("{field} diubah dari '{old}' menjadi '{new}'")
}

/// Unrecognized action or payload shape. A non-empty string payload is
/// shown verbatim (upstream parsing already failed once); a plain object
/// is rendered as `key: value` pairs; anything else gets a fixed
/// placeholder.
fn describe_fallback(payload: &Value) -> String {
    match payload {
        Value::String(s) if !s.trim().is_empty() => format!("[tidak terurai] {s}"),
        Value::Object(map) if !map.is_empty() => map
            .iter()
            .map(|(key, value)| match value {
                Value::String(s) => format!("{key}: {s}"),
                other => format!("{key}: {other}"),
            })
            .collect::<Vec<_>>()
            .join(", "),
        _ => "Aktivitas tidak dikenal".into(),
    }
}

// =============================================================================
// PERSISTENCE
// =============================================================================

/// Append one activity row.
///
/// # Errors
///
/// Returns a database error if the insert fails.
pub async fn record(
    pool: &PgPool,
    order_id: Uuid,
    action: &str,
    payload: Value,
    actor: Option<&str>,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO activity_log (id, order_id, action, payload, actor, created_at)
         VALUES ($1, $2, $3, $4, $5, $6)",
    )
    .bind(Uuid::new_v4())
    .bind(order_id)
    .bind(action)
    .bind(payload)
    .bind(actor)
    .bind(now_ms())
    .execute(pool)
    .await?;
    Ok(())
}

/// Fetch an order's activity, newest first.
///
/// # Errors
///
/// Returns a database error if the query fails.
pub async fn list_for_order(pool: &PgPool, order_id: Uuid) -> Result<Vec<ActivityEntry>, sqlx::Error> {
    let rows = sqlx::query(
        "SELECT id, order_id, action, payload, actor, created_at
         FROM activity_log WHERE order_id = $1 ORDER BY created_at DESC",
    )
    .bind(order_id)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|row| ActivityEntry {
            id: row.get("id"),
            order_id: row.get("order_id"),
            action: row.get("action"),
            payload: row.get("payload"),
            actor: row.get("actor"),
            created_at: row.get("created_at"),
        })
        .collect())
}

#[cfg(test)]
#[path = "activity_test.rs"]
mod tests;
