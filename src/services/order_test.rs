use super::*;
use crate::state::test_helpers::test_app_state;

#[test]
fn status_parse_accepts_the_four_states_exactly() {
    assert_eq!(OrderStatus::parse("Baru"), Some(OrderStatus::Baru));
    assert_eq!(OrderStatus::parse("Diproses"), Some(OrderStatus::Diproses));
    assert_eq!(OrderStatus::parse("Selesai"), Some(OrderStatus::Selesai));
    assert_eq!(OrderStatus::parse("Diambil"), Some(OrderStatus::Diambil));

    assert_eq!(OrderStatus::parse("baru"), None);
    assert_eq!(OrderStatus::parse("Dikembalikan"), None);
    assert_eq!(OrderStatus::parse(""), None);
}

#[test]
fn status_round_trips_through_as_str() {
    for status in [OrderStatus::Baru, OrderStatus::Diproses, OrderStatus::Selesai, OrderStatus::Diambil] {
        assert_eq!(OrderStatus::parse(status.as_str()), Some(status));
    }
}

#[tokio::test]
async fn create_rejects_blank_customer_name() {
    let state = test_app_state();
    let result = create_order(
        &state,
        NewOrder {
            customer_name: "   ".into(),
            customer_phone: String::new(),
            device: "Asus ROG".into(),
            complaint: String::new(),
        },
        None,
    )
    .await;

    assert!(matches!(result, Err(OrderError::Validation("customer name is required"))));
}

#[tokio::test]
async fn create_rejects_blank_device() {
    let state = test_app_state();
    let result = create_order(
        &state,
        NewOrder {
            customer_name: "Budi".into(),
            customer_phone: String::new(),
            device: "".into(),
            complaint: String::new(),
        },
        None,
    )
    .await;

    assert!(matches!(result, Err(OrderError::Validation("device is required"))));
}

#[test]
fn patch_deserializes_with_all_fields_optional() {
    let patch: OrderPatch = serde_json::from_str("{}").unwrap();
    assert!(patch.status.is_none());
    assert!(patch.technician_id.is_none());
    assert!(patch.cost.is_none());
    assert!(patch.notes.is_none());

    let patch: OrderPatch = serde_json::from_str(r#"{"status":"Diproses","cost":50000}"#).unwrap();
    assert_eq!(patch.status.as_deref(), Some("Diproses"));
    assert_eq!(patch.cost, Some(50000));
}

#[cfg(feature = "live-db-tests")]
mod live {
    use super::*;
    use crate::activity;
    use crate::services::auth::{generate_salt, hash_password};

    fn intake(customer: &str) -> NewOrder {
        NewOrder {
            customer_name: customer.into(),
            customer_phone: "08123456789".into(),
            device: "Asus ROG".into(),
            complaint: "mati total".into(),
        }
    }

    async fn insert_technician(state: &crate::state::AppState, name: &str) -> Uuid {
        let id = Uuid::new_v4();
        let salt = generate_salt();
        sqlx::query(
            "INSERT INTO users (id, full_name, email, role, password_salt, password_hash, created_at)
             VALUES ($1, $2, $3, 'teknisi', $4, $5, $6)",
        )
        .bind(id)
        .bind(name)
        .bind(format!("tech-{id}@bengkel.test"))
        .bind(&salt)
        .bind(hash_password(&salt, "rahasia-123"))
        .bind(now_ms())
        .execute(&state.pool)
        .await
        .unwrap();
        id
    }

    #[tokio::test]
    async fn create_then_get_round_trips() {
        let state = test_app_state();
        let created = create_order(&state, intake("  Budi Santoso  "), Some("admin")).await.unwrap();

        assert_eq!(created.customer_name, "Budi Santoso");
        assert_eq!(created.status, "Baru");
        assert_eq!(created.cost, 0);
        assert!(created.technician_id.is_none());

        let fetched = get_order(&state, created.id).await.unwrap();
        assert_eq!(fetched.id, created.id);
        assert_eq!(fetched.customer_name, "Budi Santoso");

        delete_order(&state, created.id).await.unwrap();
    }

    #[tokio::test]
    async fn get_unknown_order_is_not_found() {
        let state = test_app_state();
        let missing = Uuid::new_v4();
        assert!(matches!(get_order(&state, missing).await, Err(OrderError::NotFound(id)) if id == missing));
    }

    #[tokio::test]
    async fn update_validates_status_and_cost() {
        let state = test_app_state();
        let order = create_order(&state, intake("Siti"), None).await.unwrap();

        let bad_status = OrderPatch { status: Some("Hilang".into()), ..OrderPatch::default() };
        assert!(matches!(
            update_order(&state, order.id, bad_status, None).await,
            Err(OrderError::InvalidStatus(s)) if s == "Hilang"
        ));

        let bad_cost = OrderPatch { cost: Some(-1), ..OrderPatch::default() };
        assert!(matches!(
            update_order(&state, order.id, bad_cost, None).await,
            Err(OrderError::Validation(_))
        ));

        delete_order(&state, order.id).await.unwrap();
    }

    #[tokio::test]
    async fn update_rejects_unknown_technician() {
        let state = test_app_state();
        let order = create_order(&state, intake("Agus"), None).await.unwrap();

        let ghost = Uuid::new_v4();
        let patch = OrderPatch { technician_id: Some(ghost), ..OrderPatch::default() };
        assert!(matches!(
            update_order(&state, order.id, patch, None).await,
            Err(OrderError::TechnicianNotFound(id)) if id == ghost
        ));

        delete_order(&state, order.id).await.unwrap();
    }

    #[tokio::test]
    async fn update_writes_one_activity_entry_per_changed_field() {
        let state = test_app_state();
        let order = create_order(&state, intake("Rina"), Some("admin")).await.unwrap();
        let technician_id = insert_technician(&state, "Rudi Hartono").await;

        let patch = OrderPatch {
            status: Some("Diproses".into()),
            technician_id: Some(technician_id),
            cost: Some(250_000),
            notes: Some("ganti layar".into()),
        };
        let updated = update_order(&state, order.id, patch, Some("admin")).await.unwrap();

        assert_eq!(updated.status, "Diproses");
        assert_eq!(updated.technician_name.as_deref(), Some("Rudi Hartono"));
        assert_eq!(updated.cost, 250_000);
        assert!(updated.updated_at >= order.updated_at);

        let entries = activity::list_for_order(&state.pool, order.id).await.unwrap();
        let actions: Vec<_> = entries.iter().map(|e| e.action.as_str()).collect();
        assert!(actions.contains(&"order_created"));
        assert!(actions.contains(&"status_change"));
        assert!(actions.contains(&"technician_assigned"));
        assert!(actions.contains(&"cost_update"));
        assert!(actions.contains(&"field_update"));

        delete_order(&state, order.id).await.unwrap();
    }

    #[tokio::test]
    async fn unchanged_fields_log_nothing() {
        let state = test_app_state();
        let order = create_order(&state, intake("Dewi"), None).await.unwrap();

        // An empty patch touches no fields.
        update_order(&state, order.id, OrderPatch::default(), None).await.unwrap();

        let entries = activity::list_for_order(&state.pool, order.id).await.unwrap();
        let actions: Vec<_> = entries.iter().map(|e| e.action.as_str()).collect();
        assert_eq!(actions, ["order_created"]);

        delete_order(&state, order.id).await.unwrap();
    }

    #[tokio::test]
    async fn delete_unknown_order_is_not_found() {
        let state = test_app_state();
        assert!(matches!(delete_order(&state, Uuid::new_v4()).await, Err(OrderError::NotFound(_))));
    }

    #[tokio::test]
    async fn mutations_publish_into_a_hydrated_hub() {
        let state = test_app_state();
        ensure_hydrated(&state).await.unwrap();

        let created = create_order(&state, intake("Hub Test"), None).await.unwrap();
        let snapshot = state.orders.snapshot().await;
        assert_eq!(snapshot.first().map(|o| o.id), Some(created.id));

        delete_order(&state, created.id).await.unwrap();
        let snapshot = state.orders.snapshot().await;
        assert!(snapshot.iter().all(|o| o.id != created.id));
    }
}
