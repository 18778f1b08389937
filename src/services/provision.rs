//! User provisioning — client for the privileged account admin API.
//!
//! ARCHITECTURE
//! ============
//! Staff accounts are mirrored to an external directory through two
//! serverless endpoints, `create-user` and `delete-user`. The API is opaque
//! to us: it answers either `{"message": ...}` on success or
//! `{"error": ...}` on rejection, and those two shapes are all this client
//! handles. The trait keeps the HTTP implementation swappable and lets
//! tests substitute a mock.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// =============================================================================
// TYPES
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum ProvisionError {
    #[error("provisioning rejected: {0}")]
    Rejected(String),
    #[error("provisioning request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("provisioning response had neither message nor error")]
    MalformedResponse,
}

/// Payload for `create-user`.
#[derive(Debug, Clone, Serialize)]
pub struct ProvisionRequest {
    pub email: String,
    pub password: String,
    pub full_name: String,
    pub role: String,
}

/// The two response shapes the admin API produces.
#[derive(Debug, Deserialize)]
struct FnResponse {
    message: Option<String>,
    error: Option<String>,
}

impl FnResponse {
    fn into_result(self) -> Result<String, ProvisionError> {
        if let Some(error) = self.error {
            return Err(ProvisionError::Rejected(error));
        }
        self.message.ok_or(ProvisionError::MalformedResponse)
    }
}

/// Privileged account creation/deletion, behind a trait for mocking.
#[async_trait]
pub trait ProvisionApi: Send + Sync {
    async fn create_user(&self, request: &ProvisionRequest) -> Result<String, ProvisionError>;
    async fn delete_user(&self, user_id: Uuid) -> Result<String, ProvisionError>;
}

// =============================================================================
// HTTP CLIENT
// =============================================================================

/// Reqwest-backed provisioning client.
pub struct HttpProvisioner {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl HttpProvisioner {
    /// Build from `PROVISION_API_URL` and `PROVISION_API_KEY`.
    ///
    /// # Errors
    ///
    /// Returns a description of the missing variable; the caller treats the
    /// client as optional.
    pub fn from_env() -> Result<Self, String> {
        let base_url =
            std::env::var("PROVISION_API_URL").map_err(|_| "PROVISION_API_URL not set".to_string())?;
        let api_key =
            std::env::var("PROVISION_API_KEY").map_err(|_| "PROVISION_API_KEY not set".to_string())?;
        Ok(Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    async fn invoke<B: Serialize + Sync>(&self, function: &str, body: &B) -> Result<String, ProvisionError> {
        let response = self
            .client
            .post(format!("{}/{function}", self.base_url))
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .await?
            .json::<FnResponse>()
            .await?;
        response.into_result()
    }
}

#[async_trait]
impl ProvisionApi for HttpProvisioner {
    async fn create_user(&self, request: &ProvisionRequest) -> Result<String, ProvisionError> {
        self.invoke("create-user", request).await
    }

    async fn delete_user(&self, user_id: Uuid) -> Result<String, ProvisionError> {
        self.invoke("delete-user", &serde_json::json!({ "userId": user_id })).await
    }
}

#[cfg(test)]
#[path = "provision_test.rs"]
mod tests;
