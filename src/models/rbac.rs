use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::authz::{AccessRequest, PolicyDocument, RoleKind};
use crate::db::roles::DbProjectRole;
use crate::errors::AppError;

// =============================================================================
// PROJECT ROLE
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ProjectRole {
    pub user_id: Uuid,
    pub project_id: Uuid,
    pub kind: RoleKind,
    /// Policy documents of a custom role
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Object)]
    pub policy: Option<Vec<PolicyDocument>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<DbProjectRole> for ProjectRole {
    type Error = AppError;

    fn try_from(db: DbProjectRole) -> Result<Self, Self::Error> {
        let kind = db.kind.parse::<RoleKind>().map_err(AppError::internal)?;
        let policy = db
            .policy
            .as_deref()
            .map(|raw| serde_json::from_str::<Vec<PolicyDocument>>(raw))
            .transpose()
            .map_err(|err| AppError::internal(format!("stored policy is malformed: {err}")))?;

        Ok(ProjectRole {
            user_id: db.user_id,
            project_id: db.project_id,
            kind,
            policy,
            created_at: db.created_at,
            updated_at: db.updated_at,
        })
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct RoleAssignRequest {
    #[schema(example = "developer")]
    pub kind: RoleKind,
    /// Required for custom roles, rejected for the built-in kinds
    #[serde(default)]
    #[schema(value_type = Object)]
    pub policy: Option<Vec<PolicyDocument>>,
}

// =============================================================================
// ACCESS CHECK
// =============================================================================

#[derive(Debug, Deserialize, ToSchema)]
pub struct AccessCheckRequest {
    pub user_id: Uuid,
    /// Scope-keyed actions, e.g. {"cluster": {"verb": "get", "resource": {"uint": 1}}}
    #[schema(value_type = Object)]
    pub request: AccessRequest,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AccessCheckResponse {
    pub allowed: bool,
}
