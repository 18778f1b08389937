//! Inventory service — stock CRUD and quantity adjustments.
//!
//! DESIGN
//! ======
//! Same shape as the order service: Postgres is the source of truth, the
//! inventory hub carries the hydrated in-memory copy, and every confirmed
//! write publishes a change event. Low-stock alerting is a list-engine
//! predicate (`quantity <= min_stock`), not a stored flag.

use sqlx::Row;
use sqlx::postgres::PgRow;
use tracing::info;
use uuid::Uuid;

use crate::event::{ChangeEvent, now_ms};
use crate::state::{AppState, InventoryItem};

// =============================================================================
// TYPES
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum InventoryError {
    #[error("inventory item not found: {0}")]
    NotFound(Uuid),
    #[error("insufficient stock: have {have}, tried to remove {remove}")]
    InsufficientStock { have: i64, remove: i64 },
    #[error("{0}")]
    Validation(&'static str),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct NewItem {
    pub name: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub quantity: i64,
    #[serde(default)]
    pub min_stock: i64,
    #[serde(default)]
    pub unit_price: i64,
    #[serde(default)]
    pub supplier: Option<String>,
}

/// Partial update; absent fields are left untouched.
#[derive(Debug, Clone, Default, serde::Deserialize)]
pub struct ItemPatch {
    pub name: Option<String>,
    pub category: Option<String>,
    pub min_stock: Option<i64>,
    pub unit_price: Option<i64>,
    pub supplier: Option<String>,
}

fn item_from_row(row: &PgRow) -> InventoryItem {
    InventoryItem {
        id: row.get("id"),
        name: row.get("name"),
        category: row.get("category"),
        quantity: row.get("quantity"),
        min_stock: row.get("min_stock"),
        unit_price: row.get("unit_price"),
        supplier: row.get("supplier"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

const ITEM_COLUMNS: &str =
    "id, name, category, quantity, min_stock, unit_price, supplier, created_at, updated_at";

// =============================================================================
// HYDRATION
// =============================================================================

/// Hydrate the inventory hub from Postgres if it hasn't been loaded yet.
///
/// # Errors
///
/// Returns a database error if the fetch fails.
pub async fn ensure_hydrated(state: &AppState) -> Result<(), InventoryError> {
    if state.inventory.is_hydrated().await {
        return Ok(());
    }
    let rows =
        sqlx::query(&format!("SELECT {ITEM_COLUMNS} FROM inventory_items ORDER BY created_at DESC"))
            .fetch_all(&state.pool)
            .await?;

    let items: Vec<InventoryItem> = rows.iter().map(item_from_row).collect();
    info!(count = items.len(), "hydrated inventory from database");
    state.inventory.hydrate(items).await;
    Ok(())
}

// =============================================================================
// CRUD
// =============================================================================

/// Create a new inventory item.
///
/// # Errors
///
/// Returns a validation error for a blank name or negative quantities, or a
/// database error if the insert fails.
pub async fn create_item(state: &AppState, new: NewItem) -> Result<InventoryItem, InventoryError> {
    if new.name.trim().is_empty() {
        return Err(InventoryError::Validation("item name is required"));
    }
    if new.quantity < 0 || new.min_stock < 0 || new.unit_price < 0 {
        return Err(InventoryError::Validation("quantities and price must not be negative"));
    }

    let now = now_ms();
    let item = InventoryItem {
        id: Uuid::new_v4(),
        name: new.name.trim().to_string(),
        category: new.category.trim().to_string(),
        quantity: new.quantity,
        min_stock: new.min_stock,
        unit_price: new.unit_price,
        supplier: new.supplier.map(|s| s.trim().to_string()).filter(|s| !s.is_empty()),
        created_at: now,
        updated_at: now,
    };

    sqlx::query(
        "INSERT INTO inventory_items
             (id, name, category, quantity, min_stock, unit_price, supplier, created_at, updated_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
    )
    .bind(item.id)
    .bind(&item.name)
    .bind(&item.category)
    .bind(item.quantity)
    .bind(item.min_stock)
    .bind(item.unit_price)
    .bind(&item.supplier)
    .bind(item.created_at)
    .bind(item.updated_at)
    .execute(&state.pool)
    .await?;

    info!(item_id = %item.id, name = %item.name, "inventory item created");
    state.inventory.publish(ChangeEvent::Insert { record: item.clone() }).await;
    Ok(item)
}

/// Fetch one item by id.
///
/// # Errors
///
/// Returns `NotFound` for an unknown id, or a database error.
pub async fn get_item(state: &AppState, item_id: Uuid) -> Result<InventoryItem, InventoryError> {
    let row = sqlx::query(&format!("SELECT {ITEM_COLUMNS} FROM inventory_items WHERE id = $1"))
        .bind(item_id)
        .fetch_optional(&state.pool)
        .await?
        .ok_or(InventoryError::NotFound(item_id))?;
    Ok(item_from_row(&row))
}

/// Apply a partial update to descriptive fields. Stock levels change only
/// through `adjust_stock`.
///
/// # Errors
///
/// Returns `NotFound`, a validation error, or a database error.
pub async fn update_item(
    state: &AppState,
    item_id: Uuid,
    patch: ItemPatch,
) -> Result<InventoryItem, InventoryError> {
    let mut item = get_item(state, item_id).await?;

    if let Some(name) = &patch.name {
        if name.trim().is_empty() {
            return Err(InventoryError::Validation("item name is required"));
        }
        item.name = name.trim().to_string();
    }
    if let Some(category) = &patch.category {
        item.category = category.trim().to_string();
    }
    if let Some(min_stock) = patch.min_stock {
        if min_stock < 0 {
            return Err(InventoryError::Validation("min stock must not be negative"));
        }
        item.min_stock = min_stock;
    }
    if let Some(unit_price) = patch.unit_price {
        if unit_price < 0 {
            return Err(InventoryError::Validation("unit price must not be negative"));
        }
        item.unit_price = unit_price;
    }
    if let Some(supplier) = patch.supplier {
        let supplier = supplier.trim().to_string();
        item.supplier = if supplier.is_empty() { None } else { Some(supplier) };
    }
    item.updated_at = now_ms();

    sqlx::query(
        "UPDATE inventory_items
         SET name = $2, category = $3, min_stock = $4, unit_price = $5, supplier = $6, updated_at = $7
         WHERE id = $1",
    )
    .bind(item.id)
    .bind(&item.name)
    .bind(&item.category)
    .bind(item.min_stock)
    .bind(item.unit_price)
    .bind(&item.supplier)
    .bind(item.updated_at)
    .execute(&state.pool)
    .await?;

    state.inventory.publish(ChangeEvent::Update { record: item.clone() }).await;
    Ok(item)
}

/// Adjust stock by a signed delta (restock or usage). The quantity never
/// goes below zero.
///
/// # Errors
///
/// Returns `InsufficientStock` if the delta would make the quantity
/// negative, `NotFound`, or a database error.
pub async fn adjust_stock(
    state: &AppState,
    item_id: Uuid,
    delta: i64,
) -> Result<InventoryItem, InventoryError> {
    let mut item = get_item(state, item_id).await?;

    let new_quantity = item.quantity + delta;
    if new_quantity < 0 {
        return Err(InventoryError::InsufficientStock { have: item.quantity, remove: -delta });
    }
    item.quantity = new_quantity;
    item.updated_at = now_ms();

    sqlx::query("UPDATE inventory_items SET quantity = $2, updated_at = $3 WHERE id = $1")
        .bind(item.id)
        .bind(item.quantity)
        .bind(item.updated_at)
        .execute(&state.pool)
        .await?;

    if item.quantity <= item.min_stock {
        info!(item_id = %item.id, name = %item.name, quantity = item.quantity, "item at or below stock threshold");
    }
    state.inventory.publish(ChangeEvent::Update { record: item.clone() }).await;
    Ok(item)
}

/// Delete an item by id.
///
/// # Errors
///
/// Returns `NotFound` for an unknown id, or a database error.
pub async fn delete_item(state: &AppState, item_id: Uuid) -> Result<(), InventoryError> {
    let result = sqlx::query("DELETE FROM inventory_items WHERE id = $1")
        .bind(item_id)
        .execute(&state.pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(InventoryError::NotFound(item_id));
    }

    info!(%item_id, "inventory item deleted");
    state.inventory.publish(ChangeEvent::Delete { id: item_id }).await;
    Ok(())
}

#[cfg(test)]
#[path = "inventory_test.rs"]
mod tests;
