//! Staff management routes (admin only) plus the technician dropdown.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::Json;
use uuid::Uuid;

use crate::listing::{Direction, derive_view};
use crate::routes::auth::{AdminUser, AuthUser};
use crate::routes::query::{ListQuery, ListResponse};
use crate::services::provision::ProvisionError;
use crate::services::staff::{self, NewStaff, StaffError};
use crate::state::{AppState, StaffUser};

fn staff_error_to_status(err: &StaffError) -> StatusCode {
    match err {
        StaffError::NotFound(_) => StatusCode::NOT_FOUND,
        StaffError::DuplicateEmail(_) | StaffError::InvalidRole(_) | StaffError::Validation(_) => {
            StatusCode::BAD_REQUEST
        }
        StaffError::ProvisionerUnavailable => StatusCode::SERVICE_UNAVAILABLE,
        StaffError::Provision(ProvisionError::Rejected(_)) => StatusCode::FORBIDDEN,
        StaffError::Provision(_) => StatusCode::BAD_GATEWAY,
        StaffError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Error body surfaced to the admin UI as a notification.
fn error_body(err: &StaffError) -> Json<serde_json::Value> {
    Json(serde_json::json!({ "error": err.to_string() }))
}

// =============================================================================
// HANDLERS
// =============================================================================

/// `GET /api/users` — derived staff page (admin only).
pub async fn list_users(
    State(state): State<AppState>,
    _admin: AdminUser,
    Query(query): Query<ListQuery>,
) -> Result<Json<ListResponse<StaffUser>>, StatusCode> {
    staff::ensure_hydrated(&state).await.map_err(|e| staff_error_to_status(&e))?;

    let records = state.staff.snapshot().await;
    let page = query.page();
    let view = derive_view(
        &records,
        &query.filter_for_staff(),
        &query.sort_spec("full_name", Direction::Asc),
        page,
    );
    Ok(Json(ListResponse::from_view(view, page)))
}

/// `GET /api/users/technicians` — assignment dropdown, any staff member.
pub async fn list_technicians(
    State(state): State<AppState>,
    _auth: AuthUser,
) -> Result<Json<Vec<StaffUser>>, StatusCode> {
    let technicians =
        staff::list_technicians(&state).await.map_err(|e| staff_error_to_status(&e))?;
    Ok(Json(technicians))
}

/// `POST /api/users` — provision and record a staff account (admin only).
pub async fn create_user(
    State(state): State<AppState>,
    _admin: AdminUser,
    Json(body): Json<NewStaff>,
) -> Result<(StatusCode, Json<StaffUser>), (StatusCode, Json<serde_json::Value>)> {
    match staff::create_staff(&state, body).await {
        Ok(user) => Ok((StatusCode::CREATED, Json(user))),
        Err(err) => Err((staff_error_to_status(&err), error_body(&err))),
    }
}

/// `DELETE /api/users/:id` — deprovision and remove (admin only).
pub async fn delete_user(
    State(state): State<AppState>,
    admin: AdminUser,
    Path(user_id): Path<Uuid>,
) -> Result<StatusCode, (StatusCode, Json<serde_json::Value>)> {
    // An admin removing their own account would orphan the session mid-request.
    if admin.user.id == user_id {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({ "error": "cannot delete your own account" })),
        ));
    }
    match staff::delete_staff(&state, user_id).await {
        Ok(()) => Ok(StatusCode::NO_CONTENT),
        Err(err) => Err((staff_error_to_status(&err), error_body(&err))),
    }
}
