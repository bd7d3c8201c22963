use super::hierarchy::{self, ROOT};
use super::request::{AccessRequest, RequestAction};
use super::types::{readwrite_verbs, PolicyDocument, Scope, Verb};
use super::validator::walk;

/// Decides whether any single document in `policy` admits every action in
/// `request`.
///
/// Evaluation per document:
/// 1. walk the document from the project scope, seeded with readwrite
/// 2. structurally invalid documents are skipped
/// 3. every requested scope needs an effective document that passes both
///    the resource check and the verb check
///
/// Documents are tried in order and the first admitting one wins. An empty
/// request, or one naming a scope outside the hierarchy, is never admitted.
pub fn has_access(policy: &[PolicyDocument], request: &AccessRequest) -> bool {
    if request.is_empty() {
        tracing::debug!("empty access request denied");
        return false;
    }

    // no document can govern a scope outside the tree
    if let Some(scope) = request.scopes().find(|scope| !hierarchy::contains(*scope)) {
        tracing::debug!(scope = %scope, "request names a scope outside the hierarchy");
        return false;
    }

    let seed = readwrite_verbs();

    for (index, doc) in policy.iter().enumerate() {
        let matches = match walk(Some(doc), ROOT, &seed, request) {
            Ok(matches) => matches,
            Err(err) => {
                tracing::debug!(document = index, error = %err, "skipping invalid policy document");
                continue;
            }
        };

        let admitted = request.iter().all(|(scope, action)| match matches.get(&scope) {
            Some(effective) => admits(effective, scope, action, index),
            None => {
                tracing::debug!(document = index, scope = %scope, "no effective document for scope");
                false
            }
        });

        if admitted {
            tracing::debug!(document = index, "access granted");
            return true;
        }
    }

    tracing::debug!(documents = policy.len(), "access denied");
    false
}

fn admits(effective: &PolicyDocument, scope: Scope, action: &RequestAction, index: usize) -> bool {
    // list is collection-scoped, so resource narrowing does not apply to it
    let resource_ok = effective.resources.is_empty()
        || action.verb == Verb::List
        || effective.resources.contains(&action.resource);

    if !resource_ok {
        tracing::debug!(
            document = index,
            scope = %scope,
            resource = %action.resource,
            "resource not granted"
        );
        return false;
    }

    if !effective.verbs.contains(&action.verb) {
        tracing::debug!(
            document = index,
            scope = %scope,
            verb = %action.verb,
            "verb not granted"
        );
        return false;
    }

    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::authz::policies::{admin_policy, developer_policy, viewer_policy};
    use crate::authz::types::{read_verbs, Resource, VerbSet};

    fn single(scope: Scope, verb: Verb, resource: Resource) -> AccessRequest {
        AccessRequest::new().with(scope, verb, resource)
    }

    fn cluster_policy(cluster: u64, namespace: &str) -> PolicyDocument {
        PolicyDocument::new(Scope::Project, readwrite_verbs()).with_child(
            PolicyDocument::new(Scope::Cluster, read_verbs())
                .with_resources([Resource::id(cluster)])
                .with_child(
                    PolicyDocument::new(Scope::Namespace, read_verbs())
                        .with_resources([Resource::name(namespace)]),
                ),
        )
    }

    #[test]
    fn admin_has_full_access() {
        let request = single(Scope::Project, Verb::Get, Resource::id(1));
        assert!(has_access(&admin_policy(), &request));
    }

    #[test]
    fn admin_gets_nothing_implicitly_below_project() {
        let request = single(Scope::Cluster, Verb::Get, Resource::id(1));
        assert!(!has_access(&admin_policy(), &request));
    }

    #[test]
    fn viewer_cannot_write_cluster() {
        let request = single(Scope::Cluster, Verb::Create, Resource::id(1));
        assert!(!has_access(&viewer_policy(), &request));
    }

    #[test]
    fn viewer_can_read_project_but_not_settings() {
        assert!(has_access(&viewer_policy(), &single(Scope::Project, Verb::List, Resource::id(1))));
        assert!(!has_access(&viewer_policy(), &single(Scope::Settings, Verb::Get, Resource::id(1))));
    }

    #[test]
    fn developer_cannot_write_settings() {
        let request = single(Scope::Settings, Verb::Update, Resource::id(1));
        assert!(!has_access(&developer_policy(), &request));
        assert!(has_access(&developer_policy(), &single(Scope::Settings, Verb::Get, Resource::id(1))));
    }

    #[test]
    fn custom_policy_narrows_to_specific_cluster() {
        let policy = vec![PolicyDocument::new(Scope::Project, readwrite_verbs()).with_child(
            PolicyDocument::new(Scope::Cluster, readwrite_verbs()).with_resources([Resource::id(1)]),
        )];

        assert!(has_access(&policy, &single(Scope::Cluster, Verb::Update, Resource::id(1))));
        assert!(!has_access(&policy, &single(Scope::Cluster, Verb::Update, Resource::id(2))));
    }

    #[test]
    fn list_bypasses_resource_narrowing() {
        let policy = vec![PolicyDocument::new(Scope::Project, readwrite_verbs()).with_child(
            PolicyDocument::new(Scope::Cluster, read_verbs()).with_resources([Resource::id(1)]),
        )];

        assert!(has_access(&policy, &single(Scope::Cluster, Verb::List, Resource::id(2))));
        assert!(!has_access(&policy, &single(Scope::Cluster, Verb::Get, Resource::id(2))));
    }

    #[test]
    fn create_is_narrowed_like_other_item_verbs() {
        let policy = vec![PolicyDocument::new(Scope::Project, readwrite_verbs()).with_child(
            PolicyDocument::new(Scope::Cluster, readwrite_verbs()).with_resources([Resource::id(1)]),
        )];

        assert!(!has_access(&policy, &single(Scope::Cluster, Verb::Create, Resource::id(2))));
    }

    #[test]
    fn nested_namespace_restriction() {
        let policy = vec![cluster_policy(500, "abelanger"), cluster_policy(501, "default")];

        let other_namespace = AccessRequest::new()
            .with(Scope::Cluster, Verb::Get, Resource::id(500))
            .with(Scope::Namespace, Verb::Get, Resource::name("default"));
        assert!(!has_access(&policy, &other_namespace));

        let own_namespace = AccessRequest::new()
            .with(Scope::Cluster, Verb::Get, Resource::id(500))
            .with(Scope::Namespace, Verb::Get, Resource::name("abelanger"));
        assert!(has_access(&policy, &own_namespace));

        let write_namespace = AccessRequest::new()
            .with(Scope::Cluster, Verb::Get, Resource::id(500))
            .with(Scope::Namespace, Verb::Delete, Resource::name("abelanger"));
        assert!(!has_access(&policy, &write_namespace));
    }

    #[test]
    fn release_inherits_namespace_verbs() {
        let policy = vec![cluster_policy(500, "abelanger")];
        let request = AccessRequest::new()
            .with(Scope::Namespace, Verb::Get, Resource::name("abelanger"))
            .with(Scope::Release, Verb::Get, Resource::name("web"));
        assert!(has_access(&policy, &request));

        let write = AccessRequest::new().with(Scope::Release, Verb::Update, Resource::name("web"));
        assert!(!has_access(&policy, &write));
    }

    #[test]
    fn cluster_above_project_is_invalid() {
        let policy = vec![PolicyDocument::new(Scope::Cluster, readwrite_verbs()).with_child(
            PolicyDocument::new(Scope::Project, readwrite_verbs()).with_resources([Resource::id(1)]),
        )];

        assert!(!has_access(&policy, &single(Scope::Project, Verb::Get, Resource::id(1))));
    }

    #[test]
    fn release_directly_under_cluster_is_invalid() {
        let policy = vec![PolicyDocument::new(Scope::Project, readwrite_verbs()).with_child(
            PolicyDocument::new(Scope::Cluster, readwrite_verbs())
                .with_child(PolicyDocument::new(Scope::Release, readwrite_verbs())),
        )];

        for scope in [Scope::Project, Scope::Cluster, Scope::Release] {
            for verb in [Verb::Get, Verb::List, Verb::Delete] {
                assert!(!has_access(&policy, &single(scope, verb, Resource::id(1))));
            }
        }
    }

    #[test]
    fn invalid_document_does_not_block_valid_one() {
        let invalid = PolicyDocument::new(Scope::Cluster, readwrite_verbs());
        let policy = vec![invalid, admin_policy().remove(0)];

        assert!(has_access(&policy, &single(Scope::Project, Verb::Delete, Resource::id(9))));
    }

    #[test]
    fn adding_documents_never_revokes_access() {
        let request = AccessRequest::new()
            .with(Scope::Cluster, Verb::Get, Resource::id(500))
            .with(Scope::Namespace, Verb::Get, Resource::name("abelanger"));
        let mut policy = vec![cluster_policy(500, "abelanger")];
        assert!(has_access(&policy, &request));

        for extra in [
            PolicyDocument::new(Scope::Project, VerbSet::new()),
            PolicyDocument::new(Scope::Settings, readwrite_verbs()),
            cluster_policy(501, "default"),
        ] {
            policy.push(extra);
            assert!(has_access(&policy, &request));
        }
    }

    #[test]
    fn document_order_does_not_matter() {
        let request = single(Scope::Cluster, Verb::Get, Resource::id(501));
        let forward = vec![cluster_policy(500, "a"), cluster_policy(501, "b")];
        let reverse: Vec<_> = forward.iter().rev().cloned().collect();

        assert_eq!(has_access(&forward, &request), has_access(&reverse, &request));
        assert!(has_access(&forward, &request));
    }

    #[test]
    fn requests_must_be_satisfied_by_a_single_document() {
        let cluster_only = PolicyDocument::new(Scope::Project, VerbSet::new())
            .with_child(PolicyDocument::new(Scope::Cluster, read_verbs()));
        let registry_only = PolicyDocument::new(Scope::Project, VerbSet::new())
            .with_child(PolicyDocument::new(Scope::Registry, read_verbs()));
        let request = AccessRequest::new()
            .with(Scope::Cluster, Verb::Get, Resource::id(1))
            .with(Scope::Registry, Verb::Get, Resource::id(2));

        assert!(!has_access(&[cluster_only, registry_only], &request));
    }

    #[test]
    fn empty_verbs_at_project_deny() {
        let policy = vec![PolicyDocument::new(Scope::Project, VerbSet::new())];
        assert!(!has_access(&policy, &single(Scope::Project, Verb::Get, Resource::id(1))));
    }

    #[test]
    fn empty_request_or_policy_is_denied() {
        assert!(!has_access(&admin_policy(), &AccessRequest::new()));
        assert!(!has_access(&[], &single(Scope::Project, Verb::Get, Resource::id(1))));
    }

    #[test]
    fn user_scope_is_never_admitted() {
        let request = single(Scope::User, Verb::Get, Resource::id(1));
        assert!(!has_access(&admin_policy(), &request));

        // an otherwise admitted request is denied once it names `user`
        let mixed = single(Scope::Project, Verb::Get, Resource::id(1)).with(Scope::User, Verb::Get, Resource::id(1));
        assert!(has_access(&admin_policy(), &single(Scope::Project, Verb::Get, Resource::id(1))));
        assert!(!has_access(&admin_policy(), &mixed));
    }

    #[test]
    fn decision_is_repeatable_and_leaves_inputs_untouched() {
        let policy = vec![viewer_policy().remove(0), cluster_policy(500, "abelanger")];
        let request = AccessRequest::new()
            .with(Scope::Cluster, Verb::Get, Resource::id(500))
            .with(Scope::Namespace, Verb::Get, Resource::name("abelanger"));
        let (policy_before, request_before) = (policy.clone(), request.clone());

        let first = has_access(&policy, &request);
        let second = has_access(&policy, &request);

        assert!(first);
        assert_eq!(first, second);
        assert_eq!(policy, policy_before);
        assert_eq!(request, request_before);
    }
}
