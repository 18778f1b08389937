//! Realtime merge — apply change events to a raw record collection.
//!
//! DESIGN
//! ======
//! The raw collection is kept newest-first, so inserts prepend. Merging is
//! idempotent and tolerant of out-of-order or duplicate delivery: a repeated
//! insert is a no-op, an update for an unknown id is treated as an insert,
//! and a delete for an absent id is a no-op. Unrelated records are never
//! reordered.

use crate::event::ChangeEvent;
use crate::listing::Listable;

/// Merge one change event into `records`, in place.
pub fn apply_change_event<T: Listable>(records: &mut Vec<T>, event: ChangeEvent<T>) {
    match event {
        ChangeEvent::Insert { record } => {
            // Duplicate delivery guard.
            if records.iter().any(|r| r.id() == record.id()) {
                return;
            }
            records.insert(0, record);
        }
        ChangeEvent::Update { record } => {
            match records.iter().position(|r| r.id() == record.id()) {
                Some(index) => records[index] = record,
                // Defensive insert: the update may have raced the initial fetch.
                None => records.insert(0, record),
            }
        }
        ChangeEvent::Delete { id } => {
            records.retain(|r| r.id() != id);
        }
    }
}

#[cfg(test)]
#[path = "merge_test.rs"]
mod tests;
