//! ChangeEvent — the realtime push message for every tracked collection.
//!
//! DESIGN
//! ======
//! Mutations publish one `ChangeEvent` per confirmed write. The event is
//! merged into the in-memory record cache and fanned out to websocket
//! subscribers as an `Envelope` tagged with the source table. Delivery is
//! at-least-once: the merge in `listing::merge` is idempotent, so duplicate
//! events are harmless.

use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One insert/update/delete notification for a tracked collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "lowercase")]
pub enum ChangeEvent<T> {
    Insert { record: T },
    Update { record: T },
    Delete { id: Uuid },
}

impl<T> ChangeEvent<T> {
    /// Operation name for logging.
    #[must_use]
    pub fn op(&self) -> &'static str {
        match self {
            Self::Insert { .. } => "insert",
            Self::Update { .. } => "update",
            Self::Delete { .. } => "delete",
        }
    }
}

/// Wire envelope sent to websocket subscribers.
#[derive(Debug, Serialize)]
pub struct Envelope<'a, T> {
    pub table: &'a str,
    #[serde(flatten)]
    pub event: &'a ChangeEvent<T>,
}

/// Current time as milliseconds since Unix epoch.
#[must_use]
pub fn now_ms() -> i64 {
    let Ok(dur) = SystemTime::now().duration_since(UNIX_EPOCH) else {
        return 0;
    };
    i64::try_from(dur.as_millis()).unwrap_or(0)
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Row {
        id: Uuid,
        name: String,
    }

    #[test]
    fn insert_round_trip() {
        let row = Row { id: Uuid::new_v4(), name: "kabel".into() };
        let event = ChangeEvent::Insert { record: row.clone() };
        let json = serde_json::to_string(&event).expect("serialize");
        let restored: ChangeEvent<Row> = serde_json::from_str(&json).expect("deserialize");
        match restored {
            ChangeEvent::Insert { record } => assert_eq!(record, row),
            other => panic!("unexpected variant: {}", other.op()),
        }
    }

    #[test]
    fn delete_is_tagged_with_op() {
        let id = Uuid::new_v4();
        let event: ChangeEvent<Row> = ChangeEvent::Delete { id };
        let value = serde_json::to_value(&event).expect("serialize");
        assert_eq!(value["op"], "delete");
        assert_eq!(value["id"], id.to_string());
    }

    #[test]
    fn envelope_carries_table_tag() {
        let event: ChangeEvent<Row> = ChangeEvent::Delete { id: Uuid::new_v4() };
        let envelope = Envelope { table: "service_orders", event: &event };
        let value = serde_json::to_value(&envelope).expect("serialize");
        assert_eq!(value["table"], "service_orders");
        assert_eq!(value["op"], "delete");
    }

    #[test]
    fn now_ms_is_positive() {
        assert!(now_ms() > 0);
    }
}
