//! Structural validation of policy documents and effective-document resolution.
//!
//! [`walk`] traverses a document alongside the scope hierarchy. At every scope
//! it decides which document governs that scope for the current request:
//! the one written in the tree, or a synthesized one carrying inherited verbs
//! when the tree leaves the scope out.

use std::borrow::Cow;
use std::collections::BTreeMap;

use super::hierarchy::{self, ROOT};
use super::request::AccessRequest;
use super::types::{PolicyDocument, Scope, VerbSet};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StructureError {
    #[error("document at {expected} scope declares scope {found}")]
    ScopeMismatch { expected: Scope, found: Scope },
    #[error("{child} is not an allowed child of {parent}")]
    ChildNotAllowed { parent: Scope, child: Scope },
}

/// Effective document per requested scope. Borrowed when the policy spells
/// the scope out, owned when it was synthesized.
pub type Matches<'a> = BTreeMap<Scope, Cow<'a, PolicyDocument>>;

/// Validates `doc` as the document for `expected` and collects the effective
/// document of every scope in `request`.
///
/// `None` means the parent had no entry for `expected`; the effective document
/// is then `{scope: expected, verbs: parent_verbs}`. Verbs are inherited from
/// parent to child, except below [`ROOT`], where children start from nothing.
pub fn walk<'a>(
    doc: Option<&'a PolicyDocument>,
    expected: Scope,
    parent_verbs: &VerbSet,
    request: &AccessRequest,
) -> Result<Matches<'a>, StructureError> {
    let mut matches = Matches::new();
    walk_into(doc, expected, parent_verbs, request, &mut matches)?;
    Ok(matches)
}

fn walk_into<'a>(
    doc: Option<&'a PolicyDocument>,
    expected: Scope,
    parent_verbs: &VerbSet,
    request: &AccessRequest,
    matches: &mut Matches<'a>,
) -> Result<(), StructureError> {
    let effective: Cow<'a, PolicyDocument> = match doc {
        Some(doc) => Cow::Borrowed(doc),
        None => Cow::Owned(PolicyDocument::new(expected, parent_verbs.clone())),
    };

    if effective.scope != expected {
        return Err(StructureError::ScopeMismatch {
            expected,
            found: effective.scope,
        });
    }

    if let Some(stray) = effective
        .children
        .keys()
        .find(|child| !hierarchy::allows_child(expected, **child))
    {
        return Err(StructureError::ChildNotAllowed {
            parent: expected,
            child: *stray,
        });
    }

    let inherited = if expected == ROOT {
        VerbSet::new()
    } else {
        effective.verbs.clone()
    };

    for child_scope in hierarchy::children_of(expected) {
        let child = doc.and_then(|doc| doc.children.get(child_scope));
        walk_into(child, *child_scope, &inherited, request, matches)?;
    }

    if request.contains(expected) {
        matches.insert(expected, effective);
    }

    Ok(())
}

/// Checks `doc` as a root document without resolving any request.
pub fn validate(doc: &PolicyDocument) -> Result<(), StructureError> {
    walk(Some(doc), ROOT, &VerbSet::new(), &AccessRequest::new()).map(|_| ())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::authz::types::{read_verbs, readwrite_verbs, Resource, Verb};

    fn request_at(scopes: &[Scope]) -> AccessRequest {
        scopes.iter().fold(AccessRequest::new(), |request, scope| {
            request.with(*scope, Verb::Get, Resource::id(1))
        })
    }

    #[test]
    fn absent_children_are_synthesized_with_empty_verbs_below_project() {
        let doc = PolicyDocument::new(Scope::Project, readwrite_verbs());
        let request = request_at(&[Scope::Project, Scope::Cluster, Scope::Release]);

        let matches = walk(Some(&doc), Scope::Project, &readwrite_verbs(), &request).unwrap();

        assert_eq!(matches.len(), 3);
        assert!(matches!(matches[&Scope::Project], Cow::Borrowed(_)));
        assert_eq!(matches[&Scope::Project].verbs, readwrite_verbs());

        let cluster = &matches[&Scope::Cluster];
        assert!(matches!(cluster, Cow::Owned(_)));
        assert_eq!(cluster.scope, Scope::Cluster);
        assert!(cluster.verbs.is_empty());
        assert!(matches[&Scope::Release].verbs.is_empty());
    }

    #[test]
    fn intermediate_scopes_pass_their_verbs_down() {
        let doc = PolicyDocument::new(Scope::Project, readwrite_verbs())
            .with_child(PolicyDocument::new(Scope::Cluster, read_verbs()));
        let request = request_at(&[Scope::Namespace, Scope::Release]);

        let matches = walk(Some(&doc), Scope::Project, &readwrite_verbs(), &request).unwrap();

        assert_eq!(matches[&Scope::Namespace].verbs, read_verbs());
        assert_eq!(matches[&Scope::Namespace].scope, Scope::Namespace);
        assert_eq!(matches[&Scope::Release].verbs, read_verbs());
    }

    #[test]
    fn present_child_with_no_verbs_does_not_inherit() {
        let doc = PolicyDocument::new(Scope::Project, readwrite_verbs()).with_child(
            PolicyDocument::new(Scope::Cluster, readwrite_verbs())
                .with_child(PolicyDocument::new(Scope::Namespace, VerbSet::new())),
        );
        let request = request_at(&[Scope::Namespace, Scope::Release]);

        let matches = walk(Some(&doc), Scope::Project, &readwrite_verbs(), &request).unwrap();

        assert!(matches[&Scope::Namespace].verbs.is_empty());
        assert!(matches[&Scope::Release].verbs.is_empty());
    }

    #[test]
    fn only_requested_scopes_are_collected() {
        let doc = PolicyDocument::new(Scope::Project, readwrite_verbs());
        let matches = walk(Some(&doc), Scope::Project, &readwrite_verbs(), &request_at(&[Scope::Registry])).unwrap();

        assert_eq!(matches.keys().copied().collect::<Vec<_>>(), vec![Scope::Registry]);
    }

    #[test]
    fn scopes_outside_the_tree_never_match() {
        let doc = PolicyDocument::new(Scope::Project, readwrite_verbs());
        let matches = walk(Some(&doc), Scope::Project, &readwrite_verbs(), &request_at(&[Scope::User])).unwrap();
        assert!(matches.is_empty());
    }

    #[test]
    fn root_must_be_project() {
        let doc = PolicyDocument::new(Scope::Cluster, readwrite_verbs()).with_child(
            PolicyDocument::new(Scope::Project, readwrite_verbs()).with_resources([Resource::id(1)]),
        );

        assert_eq!(
            validate(&doc),
            Err(StructureError::ScopeMismatch {
                expected: Scope::Project,
                found: Scope::Cluster,
            })
        );
    }

    #[test]
    fn child_not_in_hierarchy_is_rejected() {
        let doc = PolicyDocument::new(Scope::Project, readwrite_verbs()).with_child(
            PolicyDocument::new(Scope::Cluster, readwrite_verbs())
                .with_child(PolicyDocument::new(Scope::Release, readwrite_verbs())),
        );

        assert_eq!(
            validate(&doc),
            Err(StructureError::ChildNotAllowed {
                parent: Scope::Cluster,
                child: Scope::Release,
            })
        );
    }

    #[test]
    fn child_keyed_under_wrong_scope_is_rejected() {
        let doc = PolicyDocument::new(Scope::Project, readwrite_verbs())
            .with_child_at(Scope::Cluster, PolicyDocument::new(Scope::Registry, read_verbs()));

        assert_eq!(
            validate(&doc),
            Err(StructureError::ScopeMismatch {
                expected: Scope::Cluster,
                found: Scope::Registry,
            })
        );
    }

    #[test]
    fn deep_valid_document_passes() {
        let doc = PolicyDocument::new(Scope::Project, read_verbs())
            .with_child(PolicyDocument::new(Scope::Settings, VerbSet::new()))
            .with_child(PolicyDocument::new(Scope::Registry, readwrite_verbs()))
            .with_child(
                PolicyDocument::new(Scope::Cluster, read_verbs()).with_child(
                    PolicyDocument::new(Scope::Namespace, read_verbs())
                        .with_child(PolicyDocument::new(Scope::Release, readwrite_verbs())),
                ),
            );

        assert_eq!(validate(&doc), Ok(()));
    }
}
