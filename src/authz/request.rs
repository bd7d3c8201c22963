use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::types::{Resource, Scope, Verb};

/// The verb and resource requested at one scope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestAction {
    pub verb: Verb,
    pub resource: Resource,
}

impl RequestAction {
    pub fn new(verb: Verb, resource: Resource) -> Self {
        Self { verb, resource }
    }
}

/// Everything a caller asks to do, keyed by scope. A scope appears at most once.
///
/// Serialized as a plain object: `{"cluster": {"verb": "get", "resource": {...}}}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccessRequest {
    actions: BTreeMap<Scope, RequestAction>,
}

impl AccessRequest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests `verb` on `resource` at `scope`, replacing any earlier action there.
    pub fn with(mut self, scope: Scope, verb: Verb, resource: Resource) -> Self {
        self.actions.insert(scope, RequestAction::new(verb, resource));
        self
    }

    pub fn get(&self, scope: Scope) -> Option<&RequestAction> {
        self.actions.get(&scope)
    }

    pub fn contains(&self, scope: Scope) -> bool {
        self.actions.contains_key(&scope)
    }

    /// Requested scopes in `Scope` order.
    pub fn scopes(&self) -> impl Iterator<Item = Scope> + '_ {
        self.actions.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Scope, &RequestAction)> + '_ {
        self.actions.iter().map(|(scope, action)| (*scope, action))
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}
