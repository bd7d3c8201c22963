use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A named level in the authority tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    User,
    Project,
    Cluster,
    Registry,
    Namespace,
    Settings,
    Release,
}

impl Scope {
    pub const ALL: [Scope; 7] = [
        Scope::User,
        Scope::Project,
        Scope::Cluster,
        Scope::Registry,
        Scope::Namespace,
        Scope::Settings,
        Scope::Release,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Scope::User => "user",
            Scope::Project => "project",
            Scope::Cluster => "cluster",
            Scope::Registry => "registry",
            Scope::Namespace => "namespace",
            Scope::Settings => "settings",
            Scope::Release => "release",
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Scope {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Scope::ALL
            .into_iter()
            .find(|scope| scope.as_str() == s)
            .ok_or_else(|| format!("unknown scope: {s}"))
    }
}

/// An API action tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verb {
    Get,
    List,
    Create,
    Update,
    Delete,
}

impl Verb {
    pub fn as_str(&self) -> &'static str {
        match self {
            Verb::Get => "get",
            Verb::List => "list",
            Verb::Create => "create",
            Verb::Update => "update",
            Verb::Delete => "delete",
        }
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub type VerbSet = BTreeSet<Verb>;

/// `{get, list}`
pub fn read_verbs() -> VerbSet {
    [Verb::Get, Verb::List].into_iter().collect()
}

/// `{get, list, create, update, delete}`
pub fn readwrite_verbs() -> VerbSet {
    [Verb::Get, Verb::List, Verb::Create, Verb::Update, Verb::Delete]
        .into_iter()
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResourceError {
    #[error("resource must set exactly one of `name` or `uint`, got neither")]
    Empty,
    #[error("resource must set exactly one of `name` or `uint`, got both")]
    Ambiguous,
}

/// Identifies a single resource, either by numeric id or by name.
///
/// Serialized as `{"name": <string>, "uint": <integer>}` with the unused
/// variant left at its zero value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "ResourceWire", into = "ResourceWire")]
pub enum Resource {
    Id(u64),
    Name(String),
}

impl Resource {
    pub fn id(id: u64) -> Self {
        Resource::Id(id)
    }

    pub fn name(name: impl Into<String>) -> Self {
        Resource::Name(name.into())
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resource::Id(id) => write!(f, "#{id}"),
            Resource::Name(name) => f.write_str(name),
        }
    }
}

/// `{"name": <string>, "uint": <integer>}`: both keys are always written,
/// with `""` / `0` marking the unused variant. Missing keys read as sentinels.
#[derive(Debug, Default, Serialize, Deserialize)]
struct ResourceWire {
    #[serde(default)]
    name: String,
    #[serde(default)]
    uint: u64,
}

impl TryFrom<ResourceWire> for Resource {
    type Error = ResourceError;

    fn try_from(wire: ResourceWire) -> Result<Self, Self::Error> {
        match (wire.name.is_empty(), wire.uint) {
            (true, 0) => Err(ResourceError::Empty),
            (true, id) => Ok(Resource::Id(id)),
            (false, 0) => Ok(Resource::Name(wire.name)),
            (false, _) => Err(ResourceError::Ambiguous),
        }
    }
}

impl From<Resource> for ResourceWire {
    fn from(resource: Resource) -> Self {
        match resource {
            Resource::Id(uint) => ResourceWire { uint, ..Default::default() },
            Resource::Name(name) => ResourceWire { name, ..Default::default() },
        }
    }
}

/// A grant of verbs at one scope, optionally narrowed to specific resources,
/// with documents for the scopes nested below it.
///
/// A child scope missing from `children` is not the same as a child with no
/// verbs: the former inherits (see [`crate::authz::walk`]), the latter grants
/// nothing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyDocument {
    pub scope: Scope,
    #[serde(default)]
    pub resources: Vec<Resource>,
    #[serde(default)]
    pub verbs: VerbSet,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub children: BTreeMap<Scope, PolicyDocument>,
}

impl PolicyDocument {
    pub fn new(scope: Scope, verbs: VerbSet) -> Self {
        Self {
            scope,
            resources: Vec::new(),
            verbs,
            children: BTreeMap::new(),
        }
    }

    pub fn with_resources(mut self, resources: impl IntoIterator<Item = Resource>) -> Self {
        self.resources = resources.into_iter().collect();
        self
    }

    /// Adds `child` under its own scope, replacing any earlier child there.
    pub fn with_child(mut self, child: PolicyDocument) -> Self {
        self.children.insert(child.scope, child);
        self
    }

    /// Adds `child` under an explicit key. The key is not checked against
    /// the child's scope; a mismatch is a structural error at evaluation.
    pub fn with_child_at(mut self, key: Scope, child: PolicyDocument) -> Self {
        self.children.insert(key, child);
        self
    }
}
