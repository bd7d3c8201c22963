//! Authorization module - scope-tree policy engine
//!
//! A principal's policy is a list of documents, each a tree of verb grants
//! rooted at the project scope. A request names one (verb, resource) per
//! scope and is admitted when a single document grants all of them.
//!
//! - `hierarchy`: the fixed scope tree every document is checked against
//! - `validator`: structural checks and effective-document resolution
//! - `evaluator`: the admit/deny decision
//! - `loader`: where documents come from (role templates, stored custom roles)
//! - `authorizer`: loader + decision, with configurable enforcement

mod authorizer;
mod evaluator;
pub mod hierarchy;
mod loader;
mod policies;
mod request;
mod types;
mod validator;

pub use authorizer::Authorizer;
pub use evaluator::has_access;
pub use loader::{
    CustomRolePolicyLoader, LoadError, LoadResult, PolicyLoader, RolePolicyLoader, StaticPolicyLoader,
};
pub use policies::{admin_policy, developer_policy, viewer_policy, RoleKind};
pub use request::{AccessRequest, RequestAction};
pub use types::{
    read_verbs, readwrite_verbs, PolicyDocument, Resource, ResourceError, Scope, Verb, VerbSet,
};
pub use validator::{validate, walk, Matches, StructureError};
