use std::sync::Arc;

use axum::http::Method;
use axum::routing::get;
use axum::{Json, Router};
use sqlx::SqlitePool;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;

use crate::authz::{Authorizer, CustomRolePolicyLoader, PolicyLoader, RolePolicyLoader};
use crate::config::Config;
use crate::docs::ApiDoc;
use crate::routes::{health, rbac};

#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub authorizer: Arc<Authorizer>,
}

impl AppState {
    pub fn new(pool: SqlitePool, authorizer: Authorizer) -> Self {
        Self {
            pool,
            authorizer: Arc::new(authorizer),
        }
    }

    /// Builds the authorizer the configuration asks for over `pool`.
    pub fn from_config(pool: SqlitePool, config: &Config) -> Self {
        let loader: Arc<dyn PolicyLoader> = if config.custom_roles {
            Arc::new(CustomRolePolicyLoader::new(pool.clone()))
        } else {
            Arc::new(RolePolicyLoader::new(pool.clone()))
        };

        tracing::info!(
            mode = ?config.authz_mode,
            custom_roles = config.custom_roles,
            "authorizer configured"
        );

        Self::new(pool, Authorizer::new(loader, config.authz_mode))
    }
}

pub fn create_app(pool: SqlitePool, config: &Config) -> Router {
    router(AppState::from_config(pool, config))
}

fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_origin(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/health", get(health::health))
        .route("/api-docs/openapi.json", get(|| async { Json(ApiDoc::openapi()) }))
        .merge(rbac::routes())
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
