//! Persistence for per-project role assignments.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::authz::{PolicyDocument, RoleKind};
use crate::errors::{AppError, AppResult};

use super::row_parsers::db_project_role_from_row;

/// A `project_roles` row as stored. `kind` stays raw text so callers decide
/// how to treat kinds they do not recognize.
#[derive(Debug, Clone)]
pub struct DbProjectRole {
    pub user_id: Uuid,
    pub project_id: Uuid,
    pub kind: String,
    /// JSON array of policy documents, set only for custom roles.
    pub policy: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

const SELECT_ROLE: &str = "SELECT user_id, project_id, kind, policy, created_at, updated_at FROM project_roles WHERE user_id = ? AND project_id = ?";

pub async fn find_project_role(
    pool: &SqlitePool,
    user_id: Uuid,
    project_id: Uuid,
) -> AppResult<Option<DbProjectRole>> {
    let row = sqlx::query(SELECT_ROLE)
        .bind(user_id.to_string())
        .bind(project_id.to_string())
        .fetch_optional(pool)
        .await?;

    row.as_ref().map(db_project_role_from_row).transpose()
}

/// Inserts or replaces the role of `user_id` in `project_id`, keeping the
/// original `created_at` on replacement.
pub async fn upsert_project_role(
    pool: &SqlitePool,
    user_id: Uuid,
    project_id: Uuid,
    kind: RoleKind,
    policy: Option<&[PolicyDocument]>,
) -> AppResult<DbProjectRole> {
    let now = Utc::now();
    let policy_json = policy
        .map(serde_json::to_string)
        .transpose()
        .map_err(|err| AppError::internal(format!("failed to encode policy: {err}")))?;

    sqlx::query(
        r#"
        INSERT INTO project_roles (user_id, project_id, kind, policy, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?)
        ON CONFLICT (user_id, project_id)
        DO UPDATE SET kind = excluded.kind, policy = excluded.policy, updated_at = excluded.updated_at
        "#,
    )
    .bind(user_id.to_string())
    .bind(project_id.to_string())
    .bind(kind.as_str())
    .bind(&policy_json)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await?;

    tracing::debug!(%user_id, %project_id, kind = %kind, "project role stored");

    find_project_role(pool, user_id, project_id)
        .await?
        .ok_or_else(|| AppError::internal("project role vanished after upsert"))
}

/// Returns whether a role was removed.
pub async fn delete_project_role(pool: &SqlitePool, user_id: Uuid, project_id: Uuid) -> AppResult<bool> {
    let result = sqlx::query("DELETE FROM project_roles WHERE user_id = ? AND project_id = ?")
        .bind(user_id.to_string())
        .bind(project_id.to_string())
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}
