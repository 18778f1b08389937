//! Staff service — account listing and provision-backed create/delete.
//!
//! DESIGN
//! ======
//! Staff accounts exist in two places: the local `users` table (credentials
//! and roles for this app) and the external directory behind the
//! provisioning API. Creation invokes the API first and only writes the
//! local row once the API has accepted; deletion likewise. When no
//! provisioner is configured the admin user-management surface reports
//! itself unavailable instead of silently diverging from the directory.

use sqlx::Row;
use sqlx::postgres::PgRow;
use tracing::info;
use uuid::Uuid;

use crate::event::{ChangeEvent, now_ms};
use crate::services::auth;
use crate::services::provision::{ProvisionError, ProvisionRequest};
use crate::state::{AppState, StaffUser};

// =============================================================================
// TYPES
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum StaffError {
    #[error("user not found: {0}")]
    NotFound(Uuid),
    #[error("email already registered: {0}")]
    DuplicateEmail(String),
    #[error("invalid role: {0}")]
    InvalidRole(String),
    #[error("{0}")]
    Validation(&'static str),
    #[error("provisioning unavailable")]
    ProvisionerUnavailable,
    #[error(transparent)]
    Provision(#[from] ProvisionError),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub const ROLES: &[&str] = &["admin", "resepsionis", "teknisi"];

#[derive(Debug, Clone, serde::Deserialize)]
pub struct NewStaff {
    pub full_name: String,
    pub email: String,
    pub password: String,
    pub role: String,
}

fn staff_from_row(row: &PgRow) -> StaffUser {
    StaffUser {
        id: row.get("id"),
        full_name: row.get("full_name"),
        email: row.get("email"),
        role: row.get("role"),
        created_at: row.get("created_at"),
    }
}

// =============================================================================
// HYDRATION
// =============================================================================

/// Hydrate the staff hub from Postgres if it hasn't been loaded yet.
///
/// # Errors
///
/// Returns a database error if the fetch fails.
pub async fn ensure_hydrated(state: &AppState) -> Result<(), StaffError> {
    if state.staff.is_hydrated().await {
        return Ok(());
    }
    let rows = sqlx::query(
        "SELECT id, full_name, email, role, created_at FROM users ORDER BY created_at DESC",
    )
    .fetch_all(&state.pool)
    .await?;

    let staff: Vec<StaffUser> = rows.iter().map(staff_from_row).collect();
    info!(count = staff.len(), "hydrated staff from database");
    state.staff.hydrate(staff).await;
    Ok(())
}

/// List technicians for the assignment dropdown.
///
/// # Errors
///
/// Returns a database error if the query fails.
pub async fn list_technicians(state: &AppState) -> Result<Vec<StaffUser>, StaffError> {
    let rows = sqlx::query(
        "SELECT id, full_name, email, role, created_at
         FROM users WHERE role = 'teknisi' ORDER BY full_name ASC",
    )
    .fetch_all(&state.pool)
    .await?;
    Ok(rows.iter().map(staff_from_row).collect())
}

// =============================================================================
// PROVISIONED CREATE / DELETE
// =============================================================================

/// Create a staff account: external directory first, then the local row.
///
/// # Errors
///
/// Returns `ProvisionerUnavailable` if no provisioning client is
/// configured, `Provision` if the API rejects the request, validation or
/// duplicate-email errors, or a database error.
pub async fn create_staff(state: &AppState, new: NewStaff) -> Result<StaffUser, StaffError> {
    let provisioner = state.provisioner.as_ref().ok_or(StaffError::ProvisionerUnavailable)?;

    if new.full_name.trim().is_empty() || new.email.trim().is_empty() {
        return Err(StaffError::Validation("name and email are required"));
    }
    if new.password.len() < 8 {
        return Err(StaffError::Validation("password must be at least 8 characters"));
    }
    if !ROLES.contains(&new.role.as_str()) {
        return Err(StaffError::InvalidRole(new.role));
    }

    let email = new.email.trim().to_lowercase();
    let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE email = $1)")
        .bind(&email)
        .fetch_one(&state.pool)
        .await?;
    if exists {
        return Err(StaffError::DuplicateEmail(email));
    }

    let message = provisioner
        .create_user(&ProvisionRequest {
            email: email.clone(),
            password: new.password.clone(),
            full_name: new.full_name.trim().to_string(),
            role: new.role.clone(),
        })
        .await?;
    info!(%email, message, "provisioning API accepted account creation");

    let salt = auth::generate_salt();
    let hash = auth::hash_password(&salt, &new.password);
    let staff = StaffUser {
        id: Uuid::new_v4(),
        full_name: new.full_name.trim().to_string(),
        email,
        role: new.role,
        created_at: now_ms(),
    };

    sqlx::query(
        "INSERT INTO users (id, full_name, email, role, password_salt, password_hash, created_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7)",
    )
    .bind(staff.id)
    .bind(&staff.full_name)
    .bind(&staff.email)
    .bind(&staff.role)
    .bind(&salt)
    .bind(&hash)
    .bind(staff.created_at)
    .execute(&state.pool)
    .await?;

    state.staff.publish(ChangeEvent::Insert { record: staff.clone() }).await;
    Ok(staff)
}

/// Delete a staff account: external directory first, then the local row.
///
/// # Errors
///
/// Returns `ProvisionerUnavailable`, `Provision`, `NotFound`, or a
/// database error.
pub async fn delete_staff(state: &AppState, user_id: Uuid) -> Result<(), StaffError> {
    let provisioner = state.provisioner.as_ref().ok_or(StaffError::ProvisionerUnavailable)?;

    let message = provisioner.delete_user(user_id).await?;
    info!(%user_id, message, "provisioning API accepted account deletion");

    let result = sqlx::query("DELETE FROM users WHERE id = $1")
        .bind(user_id)
        .execute(&state.pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(StaffError::NotFound(user_id));
    }

    state.staff.publish(ChangeEvent::Delete { id: user_id }).await;
    Ok(())
}

#[cfg(test)]
#[path = "staff_test.rs"]
mod tests;
