use axum::extract::State;
use axum::Json;
use serde::Serialize;
use utoipa::ToSchema;

use crate::app::AppState;
use crate::errors::AppResult;

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// `ok` when the role store answers, `degraded` otherwise
    pub status: &'static str,
    pub db_ok: bool,
    pub db_error: Option<String>,
    /// Enforcement mode of the authorizer (`off`, `advisory`, `strict`)
    pub authz_mode: &'static str,
    /// Number of stored project roles, when the store is reachable
    pub role_count: Option<i64>,
}

#[utoipa::path(
    get,
    path = "/api/health",
    tag = "Health",
    responses((status = 200, description = "Role store and authorizer status", body = HealthResponse))
)]
pub async fn health(State(state): State<AppState>) -> AppResult<Json<HealthResponse>> {
    let authz_mode = state.authorizer.mode().as_str();

    // a missing table counts as unreachable: decisions would fail the same way
    let roles = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM project_roles")
        .fetch_one(&state.pool)
        .await;

    let response = match roles {
        Ok(count) => HealthResponse {
            status: "ok",
            db_ok: true,
            db_error: None,
            authz_mode,
            role_count: Some(count),
        },
        Err(err) => {
            tracing::warn!(error = %err, "health check could not reach role store");
            HealthResponse {
                status: "degraded",
                db_ok: false,
                db_error: Some(err.to_string()),
                authz_mode,
                role_count: None,
            }
        }
    };

    Ok(Json(response))
}
