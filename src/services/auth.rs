//! Authentication — passwords, sessions, and WS tickets.
//!
//! ARCHITECTURE
//! ============
//! HTTP auth uses long-lived cookie session tokens; websocket upgrades use
//! one-time short-lived tickets so tokens never ride in WS query params.
//!
//! TRADE-OFFS
//! ==========
//! Ticket consumption is destructive (`DELETE ... RETURNING`) to guarantee
//! single use; this favors replay safety over reconnect convenience.
//! Passwords are salted sha-256 hashes: adequate for an internal staff tool
//! with a handful of accounts, and dependency-free beyond `sha2`.

use std::fmt::Write;

use rand::Rng;
use sha2::{Digest, Sha256};
use sqlx::{PgPool, Row};
use uuid::Uuid;

pub(crate) fn bytes_to_hex(bytes: &[u8]) -> String {
    let mut s = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        let _ = write!(s, "{b:02x}");
    }
    s
}

/// Generate a cryptographically random 32-byte hex token.
#[must_use]
pub fn generate_token() -> String {
    let bytes: [u8; 32] = rand::rng().random();
    bytes_to_hex(&bytes)
}

/// Generate a short-lived 16-byte hex WS ticket.
#[must_use]
pub(crate) fn generate_ws_ticket() -> String {
    let bytes: [u8; 16] = rand::rng().random();
    bytes_to_hex(&bytes)
}

/// Generate a random 16-byte hex password salt.
#[must_use]
pub fn generate_salt() -> String {
    let bytes: [u8; 16] = rand::rng().random();
    bytes_to_hex(&bytes)
}

/// Salted password hash: hex(sha256(salt || password)).
#[must_use]
pub fn hash_password(salt: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    bytes_to_hex(&hasher.finalize())
}

/// User row returned from session validation.
#[derive(Debug, Clone, serde::Serialize)]
pub struct SessionUser {
    /// Unique user identifier.
    pub id: Uuid,
    /// Display name.
    pub full_name: String,
    pub email: String,
    /// `admin`, `resepsionis`, or `teknisi`.
    pub role: String,
}

impl SessionUser {
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role == "admin"
    }
}

/// Verify credentials. Returns the user on a match, `None` otherwise
/// (unknown email and wrong password are indistinguishable to the caller).
///
/// # Errors
///
/// Returns a database error if the lookup fails.
pub async fn verify_credentials(
    pool: &PgPool,
    email: &str,
    password: &str,
) -> Result<Option<SessionUser>, sqlx::Error> {
    let row = sqlx::query(
        "SELECT id, full_name, email, role, password_salt, password_hash
         FROM users WHERE email = $1",
    )
    .bind(email)
    .fetch_optional(pool)
    .await?;

    let Some(row) = row else {
        return Ok(None);
    };

    let salt: String = row.get("password_salt");
    let expected: String = row.get("password_hash");
    if hash_password(&salt, password) != expected {
        return Ok(None);
    }

    Ok(Some(SessionUser {
        id: row.get("id"),
        full_name: row.get("full_name"),
        email: row.get("email"),
        role: row.get("role"),
    }))
}

/// Create a session for the given user, returning the token.
///
/// # Errors
///
/// Returns a database error if the insert fails.
pub async fn create_session(pool: &PgPool, user_id: Uuid) -> Result<String, sqlx::Error> {
    let token = generate_token();
    sqlx::query("INSERT INTO sessions (token, user_id) VALUES ($1, $2)")
        .bind(&token)
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(token)
}

/// Validate a session token and return the associated user.
///
/// # Errors
///
/// Returns a database error if the lookup fails.
pub async fn validate_session(pool: &PgPool, token: &str) -> Result<Option<SessionUser>, sqlx::Error> {
    let row = sqlx::query(
        r"SELECT u.id, u.full_name, u.email, u.role
          FROM sessions s
          JOIN users u ON u.id = s.user_id
          WHERE s.token = $1 AND s.expires_at > now()",
    )
    .bind(token)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(|r| SessionUser {
        id: r.get("id"),
        full_name: r.get("full_name"),
        email: r.get("email"),
        role: r.get("role"),
    }))
}

/// Delete a session by token.
///
/// # Errors
///
/// Returns a database error if the delete fails.
pub async fn delete_session(pool: &PgPool, token: &str) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM sessions WHERE token = $1")
        .bind(token)
        .execute(pool)
        .await?;
    Ok(())
}

/// Create a short-lived WS ticket for the given user.
///
/// # Errors
///
/// Returns a database error if the insert fails.
pub async fn create_ws_ticket(pool: &PgPool, user_id: Uuid) -> Result<String, sqlx::Error> {
    let ticket = generate_ws_ticket();
    sqlx::query("INSERT INTO ws_tickets (ticket, user_id) VALUES ($1, $2)")
        .bind(&ticket)
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(ticket)
}

/// Consume a WS ticket (single use). Returns the user id if the ticket was
/// valid and unexpired.
///
/// # Errors
///
/// Returns a database error if the delete fails.
pub async fn consume_ws_ticket(pool: &PgPool, ticket: &str) -> Result<Option<Uuid>, sqlx::Error> {
    let row = sqlx::query(
        "DELETE FROM ws_tickets
         WHERE ticket = $1 AND expires_at > now()
         RETURNING user_id",
    )
    .bind(ticket)
    .fetch_optional(pool)
    .await?;
    Ok(row.map(|r| r.get("user_id")))
}

/// Create the initial admin account from `ADMIN_EMAIL` / `ADMIN_PASSWORD`
/// when the users table is empty. No-op otherwise.
///
/// # Errors
///
/// Returns a database error if the check or insert fails.
pub async fn bootstrap_admin(pool: &PgPool) -> Result<(), sqlx::Error> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users").fetch_one(pool).await?;
    if count > 0 {
        return Ok(());
    }

    let (Ok(email), Ok(password)) = (std::env::var("ADMIN_EMAIL"), std::env::var("ADMIN_PASSWORD"))
    else {
        tracing::warn!("users table is empty and ADMIN_EMAIL/ADMIN_PASSWORD are not set");
        return Ok(());
    };

    let salt = generate_salt();
    let hash = hash_password(&salt, &password);
    sqlx::query(
        "INSERT INTO users (id, full_name, email, role, password_salt, password_hash, created_at)
         VALUES ($1, $2, $3, 'admin', $4, $5, $6)",
    )
    .bind(Uuid::new_v4())
    .bind("Administrator")
    .bind(&email)
    .bind(&salt)
    .bind(&hash)
    .bind(crate::event::now_ms())
    .execute(pool)
    .await?;

    tracing::info!(%email, "bootstrapped initial admin account");
    Ok(())
}

#[cfg(test)]
#[path = "auth_test.rs"]
mod tests;
