use std::str::FromStr;

use crate::errors::AppError;

/// How access denials are enforced at the HTTP boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthzMode {
    /// Report denials as `allowed: false` (development mode)
    Off,
    /// Report denials as `allowed: false` and log them at warn (rollout mode)
    Advisory,
    /// Reject denied requests with 403
    #[default]
    Strict,
}

impl AuthzMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthzMode::Off => "off",
            AuthzMode::Advisory => "advisory",
            AuthzMode::Strict => "strict",
        }
    }
}

impl FromStr for AuthzMode {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "off" => Ok(AuthzMode::Off),
            "advisory" => Ok(AuthzMode::Advisory),
            "strict" => Ok(AuthzMode::Strict),
            other => Err(AppError::configuration(format!(
                "AUTHZ_MODE must be one of off/advisory/strict, got {other:?}"
            ))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub authz_mode: AuthzMode,
    /// Serve stored documents for custom roles instead of refusing them.
    pub custom_roles: bool,
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let database_url = lookup("DATABASE_URL").ok_or_else(|| AppError::configuration("DATABASE_URL not set"))?;

        let port = lookup("APP_PORT")
            .map(|val| val.parse::<u16>())
            .unwrap_or(Ok(8000))
            .map_err(|_| AppError::configuration("APP_PORT must be a valid port number"))?;

        let authz_mode = lookup("AUTHZ_MODE")
            .map(|val| val.parse::<AuthzMode>())
            .transpose()?
            .unwrap_or_default();

        let custom_roles = lookup("AUTHZ_CUSTOM_ROLES")
            .map(|val| val.parse::<bool>())
            .unwrap_or(Ok(true))
            .map_err(|_| AppError::configuration("AUTHZ_CUSTOM_ROLES must be true or false"))?;

        Ok(Self {
            database_url,
            port,
            authz_mode,
            custom_roles,
        })
    }

    /// Settings for tests and embedding: strict mode, custom roles enabled.
    pub fn for_database(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            port: 8000,
            authz_mode: AuthzMode::Strict,
            custom_roles: true,
        }
    }
}
