use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::SqlitePool;
use uuid::Uuid;

use super::policies::RoleKind;
use super::types::PolicyDocument;
use crate::db::roles::{find_project_role, DbProjectRole};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LoadError {
    #[error("principal has no role in this project")]
    Forbidden,
    #[error("failed to load policy: {0}")]
    Internal(String),
}

pub type LoadResult<T> = Result<T, LoadError>;

/// Supplies the policy documents authored for a principal in a project.
#[async_trait]
pub trait PolicyLoader: Send + Sync {
    async fn load(&self, user_id: Uuid, project_id: Uuid) -> LoadResult<Vec<PolicyDocument>>;
}

async fn fetch_role(pool: &SqlitePool, user_id: Uuid, project_id: Uuid) -> LoadResult<DbProjectRole> {
    find_project_role(pool, user_id, project_id)
        .await
        .map_err(|err| LoadError::Internal(err.to_string()))?
        .ok_or(LoadError::Forbidden)
}

fn parse_kind(role: &DbProjectRole) -> LoadResult<RoleKind> {
    role.kind.parse::<RoleKind>().map_err(|err| {
        tracing::warn!(
            user_id = %role.user_id,
            project_id = %role.project_id,
            error = %err,
            "role kind not understood"
        );
        LoadError::Forbidden
    })
}

/// Maps the stored role kind to its built-in template. Custom roles are
/// refused since this loader has no way to interpret them.
#[derive(Debug, Clone)]
pub struct RolePolicyLoader {
    pool: SqlitePool,
}

impl RolePolicyLoader {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PolicyLoader for RolePolicyLoader {
    async fn load(&self, user_id: Uuid, project_id: Uuid) -> LoadResult<Vec<PolicyDocument>> {
        let role = fetch_role(&self.pool, user_id, project_id).await?;
        parse_kind(&role)?.template().ok_or(LoadError::Forbidden)
    }
}

/// Like [`RolePolicyLoader`], but custom roles yield their stored documents.
#[derive(Debug, Clone)]
pub struct CustomRolePolicyLoader {
    pool: SqlitePool,
}

impl CustomRolePolicyLoader {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PolicyLoader for CustomRolePolicyLoader {
    async fn load(&self, user_id: Uuid, project_id: Uuid) -> LoadResult<Vec<PolicyDocument>> {
        let role = fetch_role(&self.pool, user_id, project_id).await?;
        let kind = parse_kind(&role)?;

        if let Some(template) = kind.template() {
            return Ok(template);
        }

        let raw = role.policy.as_deref().ok_or(LoadError::Forbidden)?;
        serde_json::from_str(raw).map_err(|err| {
            LoadError::Internal(format!("stored policy for custom role is malformed: {err}"))
        })
    }
}

/// Fixed in-memory policies keyed by `(user_id, project_id)`.
#[derive(Debug, Clone, Default)]
pub struct StaticPolicyLoader {
    policies: HashMap<(Uuid, Uuid), Vec<PolicyDocument>>,
}

impl StaticPolicyLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_policy(mut self, user_id: Uuid, project_id: Uuid, policy: Vec<PolicyDocument>) -> Self {
        self.policies.insert((user_id, project_id), policy);
        self
    }
}

#[async_trait]
impl PolicyLoader for StaticPolicyLoader {
    async fn load(&self, user_id: Uuid, project_id: Uuid) -> LoadResult<Vec<PolicyDocument>> {
        self.policies
            .get(&(user_id, project_id))
            .cloned()
            .ok_or(LoadError::Forbidden)
    }
}
