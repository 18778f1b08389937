//! WebSocket handler — realtime change-event fan-out.
//!
//! DESIGN
//! ======
//! On upgrade, generates a client ID and enters a `select!` loop:
//! - Incoming client commands → subscribe/unsubscribe per table
//! - Change events from the hubs → forward to the client
//!
//! Subscribing also hydrates the table's hub so subsequent events merge
//! into a complete cache. Events arrive on a per-client mpsc channel in
//! publish order and are relayed verbatim.
//!
//! LIFECYCLE
//! =========
//! 1. Upgrade (ticket auth) → send `connected` with `client_id`
//! 2. Client subscribes to tables → ack per table
//! 3. Hub publishes → envelope relayed to every subscriber
//! 4. Close → unsubscribe from all hubs

use std::collections::{HashMap, HashSet};

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Deserialize;
use tokio::sync::mpsc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::services::{auth, inventory, order, staff};
use crate::state::AppState;

// =============================================================================
// UPGRADE
// =============================================================================

pub async fn handle_ws(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
    ws: WebSocketUpgrade,
) -> Response {
    let Some(ticket) = params.get("ticket") else {
        return (StatusCode::UNAUTHORIZED, "ticket required").into_response();
    };

    let user_id = match auth::consume_ws_ticket(&state.pool, ticket).await {
        Ok(Some(uid)) => uid,
        Ok(None) => return (StatusCode::UNAUTHORIZED, "invalid or expired ticket").into_response(),
        Err(e) => {
            tracing::error!(error = %e, "ws ticket validation failed");
            return (StatusCode::INTERNAL_SERVER_ERROR, "ticket validation error").into_response();
        }
    };

    ws.on_upgrade(move |socket| run_ws(socket, state, user_id))
}

// =============================================================================
// CONNECTION
// =============================================================================

/// Inbound client command.
#[derive(Debug, Deserialize)]
#[serde(tag = "action", rename_all = "lowercase")]
enum Command {
    Subscribe { table: String },
    Unsubscribe { table: String },
}

async fn run_ws(mut socket: WebSocket, state: AppState, user_id: Uuid) {
    let client_id = Uuid::new_v4();

    // Per-connection channel carrying serialized event envelopes.
    let (client_tx, mut client_rx) = mpsc::channel::<String>(256);

    let welcome = serde_json::json!({
        "type": "connected",
        "client_id": client_id,
        "user_id": user_id,
    });
    if socket.send(Message::Text(welcome.to_string().into())).await.is_err() {
        return;
    }

    info!(%client_id, %user_id, "ws: client connected");

    let mut subscribed: HashSet<&'static str> = HashSet::new();

    loop {
        tokio::select! {
            msg = socket.recv() => {
                let Some(Ok(msg)) = msg else { break };
                match msg {
                    Message::Text(text) => {
                        let reply = handle_command(&state, client_id, &client_tx, &mut subscribed, &text).await;
                        if socket.send(Message::Text(reply.to_string().into())).await.is_err() {
                            break;
                        }
                    }
                    Message::Close(_) => break,
                    _ => {}
                }
            }
            Some(payload) = client_rx.recv() => {
                if socket.send(Message::Text(payload.into())).await.is_err() {
                    break;
                }
            }
        }
    }

    for table in subscribed {
        unsubscribe_table(&state, client_id, table).await;
    }
    info!(%client_id, "ws: client disconnected");
}

// =============================================================================
// COMMANDS
// =============================================================================

/// Parse and apply one inbound command, returning the JSON ack/error.
async fn handle_command(
    state: &AppState,
    client_id: Uuid,
    client_tx: &mpsc::Sender<String>,
    subscribed: &mut HashSet<&'static str>,
    text: &str,
) -> serde_json::Value {
    let command: Command = match serde_json::from_str(text) {
        Ok(command) => command,
        Err(e) => {
            warn!(%client_id, error = %e, "ws: invalid inbound command");
            return serde_json::json!({ "type": "error", "message": format!("invalid json: {e}") });
        }
    };

    match command {
        Command::Subscribe { table } => match subscribe_table(state, client_id, client_tx, &table).await {
            Ok(table) => {
                subscribed.insert(table);
                info!(%client_id, table, "ws: subscribed");
                serde_json::json!({ "type": "subscribed", "table": table })
            }
            Err(message) => serde_json::json!({ "type": "error", "message": message }),
        },
        Command::Unsubscribe { table } => match known_table(&table) {
            Some(table) => {
                subscribed.remove(table);
                unsubscribe_table(state, client_id, table).await;
                serde_json::json!({ "type": "unsubscribed", "table": table })
            }
            None => serde_json::json!({ "type": "error", "message": format!("unknown table: {table}") }),
        },
    }
}

fn known_table(table: &str) -> Option<&'static str> {
    match table {
        "service_orders" => Some("service_orders"),
        "inventory_items" => Some("inventory_items"),
        "users" => Some("users"),
        _ => None,
    }
}

/// Register the client on a hub, hydrating the hub first so later events
/// merge into a complete cache.
async fn subscribe_table(
    state: &AppState,
    client_id: Uuid,
    client_tx: &mpsc::Sender<String>,
    table: &str,
) -> Result<&'static str, String> {
    match known_table(table) {
        Some("service_orders") => {
            order::ensure_hydrated(state).await.map_err(|e| e.to_string())?;
            state.orders.subscribe(client_id, client_tx.clone()).await;
            Ok("service_orders")
        }
        Some("inventory_items") => {
            inventory::ensure_hydrated(state).await.map_err(|e| e.to_string())?;
            state.inventory.subscribe(client_id, client_tx.clone()).await;
            Ok("inventory_items")
        }
        Some("users") => {
            staff::ensure_hydrated(state).await.map_err(|e| e.to_string())?;
            state.staff.subscribe(client_id, client_tx.clone()).await;
            Ok("users")
        }
        _ => Err(format!("unknown table: {table}")),
    }
}

async fn unsubscribe_table(state: &AppState, client_id: Uuid, table: &str) {
    match table {
        "service_orders" => state.orders.unsubscribe(client_id).await,
        "inventory_items" => state.inventory.unsubscribe(client_id).await,
        "users" => state.staff.unsubscribe(client_id).await,
        _ => {}
    }
}

#[cfg(test)]
#[path = "ws_test.rs"]
mod tests;
