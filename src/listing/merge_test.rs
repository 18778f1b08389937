use super::*;
use crate::event::ChangeEvent;
use crate::state::test_helpers::dummy_order;

#[test]
fn insert_prepends_new_record() {
    let mut records = vec![dummy_order("Old", "Baru", 1_000)];
    let incoming = dummy_order("New", "Baru", 2_000);
    let incoming_id = incoming.id;

    apply_change_event(&mut records, ChangeEvent::Insert { record: incoming });

    assert_eq!(records.len(), 2);
    assert_eq!(records[0].id, incoming_id);
    assert_eq!(records[1].customer_name, "Old");
}

#[test]
fn duplicate_insert_is_a_no_op() {
    let order = dummy_order("Budi", "Baru", 1_000);
    let mut records = vec![order.clone()];

    apply_change_event(&mut records, ChangeEvent::Insert { record: order });

    assert_eq!(records.len(), 1);
}

#[test]
fn update_replaces_in_place() {
    let mut records = vec![
        dummy_order("First", "Baru", 3_000),
        dummy_order("Second", "Baru", 2_000),
        dummy_order("Third", "Baru", 1_000),
    ];
    let mut changed = records[1].clone();
    changed.status = "Diproses".into();

    apply_change_event(&mut records, ChangeEvent::Update { record: changed });

    assert_eq!(records.len(), 3);
    assert_eq!(records[1].status, "Diproses");
    assert_eq!(records[0].customer_name, "First");
    assert_eq!(records[2].customer_name, "Third");
}

#[test]
fn repeated_update_is_idempotent() {
    let mut records = vec![dummy_order("Budi", "Baru", 1_000)];
    let mut changed = records[0].clone();
    changed.status = "Selesai".into();

    apply_change_event(&mut records, ChangeEvent::Update { record: changed.clone() });
    let after_first = records.clone();
    apply_change_event(&mut records, ChangeEvent::Update { record: changed });

    assert_eq!(records.len(), after_first.len());
    assert_eq!(records[0].status, "Selesai");
}

#[test]
fn update_for_unknown_id_inserts_at_front() {
    let mut records = vec![dummy_order("Known", "Baru", 1_000)];
    let stray = dummy_order("Stray", "Diproses", 2_000);
    let stray_id = stray.id;

    apply_change_event(&mut records, ChangeEvent::Update { record: stray });

    assert_eq!(records.len(), 2);
    assert_eq!(records[0].id, stray_id);
}

#[test]
fn delete_removes_matching_record_only() {
    let mut records = vec![dummy_order("Keep", "Baru", 2_000), dummy_order("Drop", "Baru", 1_000)];
    let victim = records[1].id;

    apply_change_event(&mut records, ChangeEvent::Delete { id: victim });

    assert_eq!(records.len(), 1);
    assert_eq!(records[0].customer_name, "Keep");
}

#[test]
fn delete_for_unknown_id_is_a_no_op() {
    let mut records = vec![dummy_order("Keep", "Baru", 1_000)];

    apply_change_event(&mut records, ChangeEvent::Delete { id: uuid::Uuid::new_v4() });

    assert_eq!(records.len(), 1);
}

#[test]
fn insert_then_delete_restores_original_collection() {
    let original = vec![dummy_order("A", "Baru", 2_000), dummy_order("B", "Baru", 1_000)];
    let mut records = original.clone();
    let transient = dummy_order("Transient", "Baru", 3_000);
    let transient_id = transient.id;

    apply_change_event(&mut records, ChangeEvent::Insert { record: transient });
    apply_change_event(&mut records, ChangeEvent::Delete { id: transient_id });

    let ids: Vec<_> = records.iter().map(|o| o.id).collect();
    let original_ids: Vec<_> = original.iter().map(|o| o.id).collect();
    assert_eq!(ids, original_ids);
}
