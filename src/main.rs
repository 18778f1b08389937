mod activity;
mod db;
mod event;
mod export;
mod listing;
mod modal;
mod routes;
mod services;
mod state;

use std::sync::Arc;

use services::provision::{HttpProvisioner, ProvisionApi};

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt::init();

    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL required");
    let port: u16 = std::env::var("PORT")
        .unwrap_or_else(|_| "3000".into())
        .parse()
        .expect("invalid PORT");

    let pool = db::init_pool(&database_url)
        .await
        .expect("database init failed");

    services::auth::bootstrap_admin(&pool)
        .await
        .expect("admin bootstrap failed");

    // Provisioning client (non-fatal: admin user management disabled if config missing).
    let provisioner: Option<Arc<dyn ProvisionApi>> = match HttpProvisioner::from_env() {
        Ok(client) => {
            tracing::info!("provisioning client initialized");
            Some(Arc::new(client))
        }
        Err(e) => {
            tracing::warn!(error = %e, "provisioning client not configured — user management disabled");
            None
        }
    };

    let state = state::AppState::new(pool, provisioner);

    let app = routes::app(state);
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{port}"))
        .await
        .expect("failed to bind");

    tracing::info!(%port, "bengkel listening");
    axum::serve(listener, app).await.expect("server failed");
}
