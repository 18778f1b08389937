use super::*;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use crate::state::test_helpers::{test_app_state, test_app_state_with_provisioner};

/// Scriptable provisioning double: counts calls and optionally rejects.
struct MockProvisioner {
    reject_with: Option<String>,
    creates: AtomicUsize,
    deletes: AtomicUsize,
}

impl MockProvisioner {
    fn accepting() -> Arc<Self> {
        Arc::new(Self { reject_with: None, creates: AtomicUsize::new(0), deletes: AtomicUsize::new(0) })
    }

    fn rejecting(reason: &str) -> Arc<Self> {
        Arc::new(Self {
            reject_with: Some(reason.to_string()),
            creates: AtomicUsize::new(0),
            deletes: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl crate::services::provision::ProvisionApi for MockProvisioner {
    async fn create_user(&self, _request: &ProvisionRequest) -> Result<String, ProvisionError> {
        self.creates.fetch_add(1, Ordering::SeqCst);
        match &self.reject_with {
            Some(reason) => Err(ProvisionError::Rejected(reason.clone())),
            None => Ok("User created".into()),
        }
    }

    async fn delete_user(&self, _user_id: Uuid) -> Result<String, ProvisionError> {
        self.deletes.fetch_add(1, Ordering::SeqCst);
        match &self.reject_with {
            Some(reason) => Err(ProvisionError::Rejected(reason.clone())),
            None => Ok("User deleted".into()),
        }
    }
}

fn new_staff(name: &str, email: &str, role: &str) -> NewStaff {
    NewStaff {
        full_name: name.into(),
        email: email.into(),
        password: "rahasia-123".into(),
        role: role.into(),
    }
}

#[tokio::test]
async fn create_without_provisioner_is_unavailable() {
    let state = test_app_state();
    let result = create_staff(&state, new_staff("Siti", "siti@bengkel.test", "resepsionis")).await;
    assert!(matches!(result, Err(StaffError::ProvisionerUnavailable)));
}

#[tokio::test]
async fn delete_without_provisioner_is_unavailable() {
    let state = test_app_state();
    let result = delete_staff(&state, Uuid::new_v4()).await;
    assert!(matches!(result, Err(StaffError::ProvisionerUnavailable)));
}

#[tokio::test]
async fn create_validates_before_calling_the_api() {
    let mock = MockProvisioner::accepting();
    let state = test_app_state_with_provisioner(mock.clone());

    let blank = create_staff(&state, new_staff("  ", "siti@bengkel.test", "teknisi")).await;
    assert!(matches!(blank, Err(StaffError::Validation(_))));

    let short = create_staff(
        &state,
        NewStaff {
            full_name: "Siti".into(),
            email: "siti@bengkel.test".into(),
            password: "pendek".into(),
            role: "teknisi".into(),
        },
    )
    .await;
    assert!(matches!(short, Err(StaffError::Validation(_))));

    let bad_role = create_staff(&state, new_staff("Siti", "siti@bengkel.test", "manajer")).await;
    assert!(matches!(bad_role, Err(StaffError::InvalidRole(role)) if role == "manajer"));

    assert_eq!(mock.creates.load(Ordering::SeqCst), 0);
}

#[test]
fn role_list_is_closed() {
    assert!(ROLES.contains(&"admin"));
    assert!(ROLES.contains(&"resepsionis"));
    assert!(ROLES.contains(&"teknisi"));
    assert_eq!(ROLES.len(), 3);
}

#[cfg(feature = "live-db-tests")]
mod live {
    use super::*;

    #[tokio::test]
    async fn create_lowercases_email_and_stores_the_row() {
        let mock = MockProvisioner::accepting();
        let state = test_app_state_with_provisioner(mock.clone());
        let email = format!("STAFF-{}@Bengkel.Test", Uuid::new_v4());

        let staff = create_staff(&state, new_staff("Rina Wulandari", &email, "resepsionis"))
            .await
            .unwrap();
        assert_eq!(staff.email, email.to_lowercase());
        assert_eq!(mock.creates.load(Ordering::SeqCst), 1);

        // The stored credentials work for login.
        let user = crate::services::auth::verify_credentials(&state.pool, &staff.email, "rahasia-123")
            .await
            .unwrap();
        assert_eq!(user.map(|u| u.id), Some(staff.id));

        delete_staff(&state, staff.id).await.unwrap();
        assert_eq!(mock.deletes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn duplicate_email_is_rejected_before_the_api_call() {
        let mock = MockProvisioner::accepting();
        let state = test_app_state_with_provisioner(mock.clone());
        let email = format!("dup-{}@bengkel.test", Uuid::new_v4());

        let first = create_staff(&state, new_staff("Pertama", &email, "teknisi")).await.unwrap();
        let second = create_staff(&state, new_staff("Kedua", &email, "teknisi")).await;
        assert!(matches!(second, Err(StaffError::DuplicateEmail(e)) if e == email));
        assert_eq!(mock.creates.load(Ordering::SeqCst), 1);

        delete_staff(&state, first.id).await.unwrap();
    }

    #[tokio::test]
    async fn api_rejection_leaves_no_local_row() {
        let mock = MockProvisioner::rejecting("directory quota exceeded");
        let state = test_app_state_with_provisioner(mock);
        let email = format!("rej-{}@bengkel.test", Uuid::new_v4());

        let result = create_staff(&state, new_staff("Gagal", &email, "teknisi")).await;
        assert!(matches!(result, Err(StaffError::Provision(ProvisionError::Rejected(_)))));

        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE email = $1)")
            .bind(&email)
            .fetch_one(&state.pool)
            .await
            .unwrap();
        assert!(!exists);
    }

    #[tokio::test]
    async fn delete_of_unknown_user_after_api_accept_is_not_found() {
        let mock = MockProvisioner::accepting();
        let state = test_app_state_with_provisioner(mock);

        let result = delete_staff(&state, Uuid::new_v4()).await;
        assert!(matches!(result, Err(StaffError::NotFound(_))));
    }

    #[tokio::test]
    async fn technician_listing_filters_by_role() {
        let mock = MockProvisioner::accepting();
        let state = test_app_state_with_provisioner(mock);
        let tech_email = format!("tek-{}@bengkel.test", Uuid::new_v4());
        let front_email = format!("res-{}@bengkel.test", Uuid::new_v4());

        let tech = create_staff(&state, new_staff("Zul Teknisi", &tech_email, "teknisi")).await.unwrap();
        let front =
            create_staff(&state, new_staff("Ani Resepsionis", &front_email, "resepsionis")).await.unwrap();

        let technicians = list_technicians(&state).await.unwrap();
        assert!(technicians.iter().any(|t| t.id == tech.id));
        assert!(technicians.iter().all(|t| t.role == "teknisi"));

        delete_staff(&state, tech.id).await.unwrap();
        delete_staff(&state, front.id).await.unwrap();
    }
}
