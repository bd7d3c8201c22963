//! The fixed tree of permission scopes.
//!
//! This table is the only place scope nesting is declared. Validation and
//! document authoring both read it; adding a scope means adding a row here.

use super::types::Scope;

/// Root of every policy document.
pub const ROOT: Scope = Scope::Project;

const TREE: &[(Scope, &[Scope])] = &[
    (Scope::Project, &[Scope::Cluster, Scope::Registry, Scope::Settings]),
    (Scope::Cluster, &[Scope::Namespace]),
    (Scope::Namespace, &[Scope::Release]),
];

/// Scopes that may appear directly beneath `scope`.
pub fn children_of(scope: Scope) -> &'static [Scope] {
    TREE.iter()
        .find(|(parent, _)| *parent == scope)
        .map(|(_, children)| *children)
        .unwrap_or(&[])
}

pub fn allows_child(parent: Scope, child: Scope) -> bool {
    children_of(parent).contains(&child)
}

/// Whether `scope` is reachable from [`ROOT`].
pub fn contains(scope: Scope) -> bool {
    scope == ROOT || TREE.iter().any(|(_, children)| children.contains(&scope))
}
