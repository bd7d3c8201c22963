//! Access-check and project-role routes
//!
//! Role writes go through the same structural validation the engine applies
//! at decision time, so malformed custom policies are rejected up front
//! instead of silently denying everything later.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use uuid::Uuid;

use crate::app::AppState;
use crate::authz::{validate, RoleKind};
use crate::db::roles::{delete_project_role, find_project_role, upsert_project_role};
use crate::errors::{AppError, AppResult};
use crate::models::rbac::*;

// =============================================================================
// ROUTER
// =============================================================================

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/projects/:project_id/access", post(check_access))
        .route(
            "/projects/:project_id/roles/:user_id",
            get(get_role).put(assign_role).delete(remove_role),
        )
}

// =============================================================================
// ACCESS CHECK
// =============================================================================

/// Decide whether a user may perform the requested actions
#[utoipa::path(
    post,
    path = "/projects/{project_id}/access",
    tag = "Access",
    params(
        ("project_id" = Uuid, Path, description = "Project ID"),
    ),
    request_body = AccessCheckRequest,
    responses(
        (status = 200, description = "Decision; `allowed: false` only outside strict mode", body = AccessCheckResponse),
        (status = 403, description = "Strict mode: request denied or user has no role in project"),
        (status = 500, description = "Role store failure"),
    )
)]
pub async fn check_access(
    State(state): State<AppState>,
    Path(project_id): Path<Uuid>,
    Json(body): Json<AccessCheckRequest>,
) -> AppResult<Json<AccessCheckResponse>> {
    let allowed = state
        .authorizer
        .authorize(body.user_id, project_id, &body.request)
        .await?;

    Ok(Json(AccessCheckResponse { allowed }))
}

// =============================================================================
// PROJECT ROLES
// =============================================================================

/// Get the role a user holds in a project
#[utoipa::path(
    get,
    path = "/projects/{project_id}/roles/{user_id}",
    tag = "Roles",
    params(
        ("project_id" = Uuid, Path, description = "Project ID"),
        ("user_id" = Uuid, Path, description = "User ID"),
    ),
    responses(
        (status = 200, description = "Role details", body = ProjectRole),
        (status = 404, description = "User has no role in project"),
    )
)]
pub async fn get_role(
    State(state): State<AppState>,
    Path((project_id, user_id)): Path<(Uuid, Uuid)>,
) -> AppResult<Json<ProjectRole>> {
    let role = find_project_role(&state.pool, user_id, project_id)
        .await?
        .ok_or_else(|| AppError::not_found("Role not found"))?;

    Ok(Json(ProjectRole::try_from(role)?))
}

/// Assign or replace a user's role in a project
#[utoipa::path(
    put,
    path = "/projects/{project_id}/roles/{user_id}",
    tag = "Roles",
    params(
        ("project_id" = Uuid, Path, description = "Project ID"),
        ("user_id" = Uuid, Path, description = "User ID"),
    ),
    request_body = RoleAssignRequest,
    responses(
        (status = 200, description = "Role stored", body = ProjectRole),
        (status = 400, description = "Policy missing, unexpected, or structurally invalid"),
    )
)]
pub async fn assign_role(
    State(state): State<AppState>,
    Path((project_id, user_id)): Path<(Uuid, Uuid)>,
    Json(req): Json<RoleAssignRequest>,
) -> AppResult<Json<ProjectRole>> {
    match (req.kind, req.policy.as_deref()) {
        (RoleKind::Custom, None) | (RoleKind::Custom, Some([])) => {
            return Err(AppError::bad_request("custom roles require a policy"));
        }
        (RoleKind::Custom, Some(policy)) => {
            for doc in policy {
                validate(doc)?;
            }
        }
        (kind, Some(_)) => {
            return Err(AppError::bad_request(format!(
                "{kind} roles use a built-in policy and cannot carry their own"
            )));
        }
        (_, None) => {}
    }

    let role = upsert_project_role(&state.pool, user_id, project_id, req.kind, req.policy.as_deref()).await?;

    tracing::info!(%user_id, %project_id, kind = %req.kind, "project role assigned");

    Ok(Json(ProjectRole::try_from(role)?))
}

/// Remove a user's role from a project
#[utoipa::path(
    delete,
    path = "/projects/{project_id}/roles/{user_id}",
    tag = "Roles",
    params(
        ("project_id" = Uuid, Path, description = "Project ID"),
        ("user_id" = Uuid, Path, description = "User ID"),
    ),
    responses(
        (status = 204, description = "Role removed"),
        (status = 404, description = "User has no role in project"),
    )
)]
pub async fn remove_role(
    State(state): State<AppState>,
    Path((project_id, user_id)): Path<(Uuid, Uuid)>,
) -> AppResult<StatusCode> {
    if !delete_project_role(&state.pool, user_id, project_id).await? {
        return Err(AppError::not_found("Role not found"));
    }

    tracing::info!(%user_id, %project_id, "project role removed");

    Ok(StatusCode::NO_CONTENT)
}
