//! Built-in policy templates for the fixed role kinds.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::types::{read_verbs, readwrite_verbs, PolicyDocument, Scope, VerbSet};

/// Kind of role a user holds in a project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum RoleKind {
    Admin,
    Developer,
    Viewer,
    /// Carries a user-defined policy instead of a template.
    Custom,
}

impl RoleKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RoleKind::Admin => "admin",
            RoleKind::Developer => "developer",
            RoleKind::Viewer => "viewer",
            RoleKind::Custom => "custom",
        }
    }

    /// The template for built-in kinds, `None` for [`RoleKind::Custom`].
    pub fn template(&self) -> Option<Vec<PolicyDocument>> {
        match self {
            RoleKind::Admin => Some(admin_policy()),
            RoleKind::Developer => Some(developer_policy()),
            RoleKind::Viewer => Some(viewer_policy()),
            RoleKind::Custom => None,
        }
    }
}

impl fmt::Display for RoleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RoleKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(RoleKind::Admin),
            "developer" => Ok(RoleKind::Developer),
            "viewer" => Ok(RoleKind::Viewer),
            "custom" => Ok(RoleKind::Custom),
            other => Err(format!("unrecognized role kind: {other}")),
        }
    }
}

pub fn admin_policy() -> Vec<PolicyDocument> {
    vec![PolicyDocument::new(Scope::Project, readwrite_verbs())]
}

/// Full project access except settings, which are read-only.
pub fn developer_policy() -> Vec<PolicyDocument> {
    vec![PolicyDocument::new(Scope::Project, readwrite_verbs())
        .with_child(PolicyDocument::new(Scope::Settings, read_verbs()))]
}

/// Read-only project access with settings hidden entirely.
pub fn viewer_policy() -> Vec<PolicyDocument> {
    vec![PolicyDocument::new(Scope::Project, read_verbs())
        .with_child(PolicyDocument::new(Scope::Settings, VerbSet::new()))]
}
