use std::sync::Arc;

use uuid::Uuid;

use super::evaluator::has_access;
use super::loader::{LoadError, LoadResult, PolicyLoader};
use super::request::AccessRequest;
use crate::config::AuthzMode;
use crate::errors::{AppError, AppResult};

/// Couples a [`PolicyLoader`] with the decision function for request handlers.
#[derive(Clone)]
pub struct Authorizer {
    loader: Arc<dyn PolicyLoader>,
    mode: AuthzMode,
}

impl Authorizer {
    pub fn new(loader: Arc<dyn PolicyLoader>, mode: AuthzMode) -> Self {
        Self { loader, mode }
    }

    pub fn mode(&self) -> AuthzMode {
        self.mode
    }

    /// The raw decision, regardless of mode.
    pub async fn check(&self, user_id: Uuid, project_id: Uuid, request: &AccessRequest) -> LoadResult<bool> {
        let policy = self.loader.load(user_id, project_id).await?;
        Ok(has_access(&policy, request))
    }

    /// The decision as reported at the HTTP boundary.
    ///
    /// Returns the real outcome in every mode. A denial, including a principal
    /// without a role, is `Forbidden` in strict mode and `Ok(false)` otherwise
    /// (logged at warn in advisory mode). Store failures always propagate.
    pub async fn authorize(&self, user_id: Uuid, project_id: Uuid, request: &AccessRequest) -> AppResult<bool> {
        let denial = match self.check(user_id, project_id, request).await {
            Ok(true) => return Ok(true),
            Ok(false) => AppError::forbidden("access denied"),
            Err(LoadError::Forbidden) => AppError::from(LoadError::Forbidden),
            Err(err) => return Err(err.into()),
        };

        match self.mode {
            AuthzMode::Strict => {
                tracing::info!(%user_id, %project_id, request = ?request, reason = %denial, "access denied");
                Err(denial)
            }
            AuthzMode::Advisory => {
                tracing::warn!(%user_id, %project_id, request = ?request, reason = %denial, "advisory: access would be denied");
                Ok(false)
            }
            AuthzMode::Off => Ok(false),
        }
    }
}

impl std::fmt::Debug for Authorizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Authorizer").field("mode", &self.mode).finish_non_exhaustive()
    }
}
