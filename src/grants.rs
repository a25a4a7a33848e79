use crate::error::{Error, Result};
use crate::permission::Permission;
use crate::rule::FieldRule;
use crate::types::{Action, ResourceName, RoleId, Scope};
use std::collections::{HashMap, HashSet};

type ActionGrants = HashMap<(Action, Scope), FieldRule>;
type ResourceGrants = HashMap<ResourceName, ActionGrants>;

/// Immutable grant table with the role inheritance closure precomputed.
///
/// Built once from a declarative [`GrantsBuilder`] and never mutated
/// afterwards, so it can be resolved against from any number of threads
/// without locks.
#[derive(Debug)]
pub struct Grants {
    effective: HashMap<RoleId, ResourceGrants>,
}

/// Builder for [`Grants`].
///
/// Declaration methods are infallible and chainable; all validation
/// happens in [`GrantsBuilder::build`].
#[derive(Debug, Default)]
pub struct GrantsBuilder {
    grants: Vec<GrantDecl>,
    extensions: Vec<(String, String)>,
}

#[derive(Debug)]
struct GrantDecl {
    role: String,
    resource: String,
    action_scope: String,
    fields: Vec<String>,
}

impl GrantsBuilder {
    /// Creates an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares one grant.
    ///
    /// `action_scope` uses the key grammar `"action"` or `"action:scope"`,
    /// e.g. `"read:own"` or `"create"` (scope defaults to `any`). `fields`
    /// uses the allow-list marker grammar of [`FieldRule::parse`]. Repeated
    /// declarations for the same key union their field rules.
    pub fn grant(
        mut self,
        role: impl Into<String>,
        resource: impl Into<String>,
        action_scope: impl Into<String>,
        fields: &[&str],
    ) -> Self {
        self.grants.push(GrantDecl {
            role: role.into(),
            resource: resource.into(),
            action_scope: action_scope.into(),
            fields: fields.iter().map(|f| f.to_string()).collect(),
        });
        self
    }

    /// Declares that `role` inherits all grants of `parent`.
    ///
    /// Each role may have at most one parent; re-extending a role toward a
    /// different parent or forming a cycle fails in [`GrantsBuilder::build`].
    pub fn extend_role(mut self, role: impl Into<String>, parent: impl Into<String>) -> Self {
        self.extensions.push((role.into(), parent.into()));
        self
    }

    /// Validates the declarations and builds the flattened grant table.
    pub fn build(self) -> Result<Grants> {
        let mut direct: HashMap<RoleId, ResourceGrants> = HashMap::new();
        for decl in self.grants {
            let role = RoleId::new(&decl.role)?;
            let resource = ResourceName::new(&decl.resource)?;
            let (action, scope) = parse_action_scope(&decl.action_scope)?;
            let rule = FieldRule::parse(&decl.fields)?;
            merge_rule(
                direct.entry(role).or_default().entry(resource).or_default(),
                (action, scope),
                &rule,
            );
        }

        let mut parents: HashMap<RoleId, RoleId> = HashMap::new();
        for (role, parent) in self.extensions {
            let role = RoleId::new(&role)?;
            let parent = RoleId::new(&parent)?;
            if let Some(existing) = parents.get(&role) {
                if *existing != parent {
                    return Err(Error::ConflictingParent {
                        role,
                        existing: existing.clone(),
                        requested: parent,
                    });
                }
                continue;
            }
            parents.insert(role, parent);
        }

        let mut roles: HashSet<RoleId> = direct.keys().cloned().collect();
        for (role, parent) in &parents {
            roles.insert(role.clone());
            roles.insert(parent.clone());
        }

        // single-parent chains, so a cycle shows up as a revisit while
        // walking one role's ancestor line
        for role in &roles {
            let mut seen = HashSet::new();
            let mut current = role;
            while let Some(parent) = parents.get(current) {
                if !seen.insert(parent.clone()) {
                    return Err(Error::RoleCycleDetected {
                        role: parent.clone(),
                    });
                }
                current = parent;
            }
        }

        let mut effective: HashMap<RoleId, ResourceGrants> = HashMap::new();
        for role in &roles {
            let mut flattened = direct.get(role).cloned().unwrap_or_default();
            let mut current = role;
            while let Some(parent) = parents.get(current) {
                if let Some(inherited) = direct.get(parent) {
                    for (resource, actions) in inherited {
                        let target = flattened.entry(resource.clone()).or_default();
                        for (key, rule) in actions {
                            merge_rule(target, *key, rule);
                        }
                    }
                }
                current = parent;
            }
            effective.insert(role.clone(), flattened);
        }

        Ok(Grants { effective })
    }
}

fn parse_action_scope(value: &str) -> Result<(Action, Scope)> {
    match value.split_once(':') {
        Some((action, scope)) => Ok((action.parse()?, scope.parse()?)),
        None => Ok((value.parse()?, Scope::default())),
    }
}

fn merge_rule(target: &mut ActionGrants, key: (Action, Scope), rule: &FieldRule) {
    match target.remove(&key) {
        Some(existing) => {
            target.insert(key, existing.union(rule));
        }
        None => {
            target.insert(key, rule.clone());
        }
    }
}

impl Grants {
    /// Creates a builder.
    pub fn builder() -> GrantsBuilder {
        GrantsBuilder::new()
    }

    /// Resolves a permission for a role set.
    ///
    /// Matching rules of every held role are unioned; roles never shadow
    /// each other. Own and any scopes are independent keys, so an `own`
    /// query is never satisfied by an `any` grant or vice versa. A role the
    /// table does not declare is a configuration error, not a denial.
    pub fn resolve(
        &self,
        roles: &[RoleId],
        action: Action,
        resource: &ResourceName,
        scope: Scope,
    ) -> Result<Permission> {
        let mut resolved: Option<FieldRule> = None;
        for role in roles {
            let effective = self
                .effective
                .get(role)
                .ok_or_else(|| Error::UnknownRole(role.clone()))?;
            let matched = effective
                .get(resource)
                .and_then(|actions| actions.get(&(action, scope)));
            if let Some(rule) = matched {
                resolved = Some(match resolved {
                    Some(acc) => acc.union(rule),
                    None => rule.clone(),
                });
            }
        }

        Ok(match resolved {
            Some(rule) => Permission::granted_with(rule),
            None => Permission::denied(),
        })
    }

    /// Convenience for `resolve(..).granted()`.
    pub fn is_allowed(
        &self,
        roles: &[RoleId],
        action: Action,
        resource: &ResourceName,
        scope: Scope,
    ) -> Result<bool> {
        self.resolve(roles, action, resource, scope)
            .map(|permission| permission.granted())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn role(value: &str) -> RoleId {
        RoleId::try_from(value).unwrap()
    }

    fn resource(value: &str) -> ResourceName {
        ResourceName::try_from(value).unwrap()
    }

    #[test]
    fn build_should_reject_unknown_action_keyword() {
        let result = Grants::builder()
            .grant("reader", "notes", "browse", &["*"])
            .build();
        assert!(matches!(result, Err(Error::InvalidAction(_))));
    }

    #[test]
    fn build_should_reject_unknown_scope_keyword() {
        let result = Grants::builder()
            .grant("reader", "notes", "read:mine", &["*"])
            .build();
        assert!(matches!(result, Err(Error::InvalidScope(_))));
    }

    #[test]
    fn build_should_reject_conflicting_parent() {
        let result = Grants::builder()
            .grant("a", "notes", "read", &["*"])
            .extend_role("c", "a")
            .extend_role("c", "b")
            .build();
        assert!(matches!(result, Err(Error::ConflictingParent { .. })));
    }

    #[test]
    fn build_should_tolerate_repeated_identical_extension() {
        let grants = Grants::builder()
            .grant("a", "notes", "read", &["*"])
            .extend_role("b", "a")
            .extend_role("b", "a")
            .build()
            .unwrap();
        assert!(
            grants
                .is_allowed(&[role("b")], Action::Read, &resource("notes"), Scope::Any)
                .unwrap()
        );
    }

    #[test]
    fn build_should_reject_cycle() {
        let result = Grants::builder()
            .extend_role("a", "b")
            .extend_role("b", "c")
            .extend_role("c", "a")
            .build();
        assert!(matches!(result, Err(Error::RoleCycleDetected { .. })));
    }

    #[test]
    fn resolve_should_error_on_undeclared_role() {
        let grants = Grants::builder()
            .grant("reader", "notes", "read", &["*"])
            .build()
            .unwrap();
        let result = grants.resolve(
            &[role("ghost")],
            Action::Read,
            &resource("notes"),
            Scope::Any,
        );
        assert!(matches!(result, Err(Error::UnknownRole(_))));
    }

    #[test]
    fn child_should_inherit_every_parent_grant() {
        let grants = Grants::builder()
            .grant("reader", "notes", "read", &["id", "title"])
            .grant("editor", "notes", "update", &["title"])
            .extend_role("editor", "reader")
            .build()
            .unwrap();

        let permission = grants
            .resolve(
                &[role("editor")],
                Action::Read,
                &resource("notes"),
                Scope::Any,
            )
            .unwrap();
        assert!(permission.granted());
        assert_eq!(*permission.attributes(), FieldRule::only(["id", "title"]));
    }

    #[test]
    fn own_grant_should_not_satisfy_any_query() {
        let grants = Grants::builder()
            .grant("reader", "notes", "read:own", &["*"])
            .build()
            .unwrap();
        assert!(
            !grants
                .is_allowed(&[role("reader")], Action::Read, &resource("notes"), Scope::Any)
                .unwrap()
        );
        assert!(
            grants
                .is_allowed(&[role("reader")], Action::Read, &resource("notes"), Scope::Own)
                .unwrap()
        );
    }

    #[test]
    fn any_grant_should_not_satisfy_own_query() {
        let grants = Grants::builder()
            .grant("auditor", "notes", "read", &["*"])
            .build()
            .unwrap();
        assert!(
            !grants
                .is_allowed(&[role("auditor")], Action::Read, &resource("notes"), Scope::Own)
                .unwrap()
        );
    }

    #[test]
    fn bare_action_key_should_default_to_any_scope() {
        let grants = Grants::builder()
            .grant("reader", "notes", "read", &["*"])
            .build()
            .unwrap();
        assert!(
            grants
                .is_allowed(&[role("reader")], Action::Read, &resource("notes"), Scope::Any)
                .unwrap()
        );
    }

    #[test]
    fn duplicate_grant_should_union_field_rules() {
        let grants = Grants::builder()
            .grant("reader", "notes", "read", &["id"])
            .grant("reader", "notes", "read", &["title"])
            .build()
            .unwrap();
        let permission = grants
            .resolve(
                &[role("reader")],
                Action::Read,
                &resource("notes"),
                Scope::Any,
            )
            .unwrap();
        assert_eq!(*permission.attributes(), FieldRule::only(["id", "title"]));
    }

    #[test]
    fn resolve_should_union_across_held_roles() {
        let grants = Grants::builder()
            .grant("support", "notes", "delete:own", &["*"])
            .grant("moderator", "notes", "delete", &["*"])
            .build()
            .unwrap();

        // moderator alone has no own grant, but the pair does through support
        let roles = [role("support"), role("moderator")];
        assert!(
            grants
                .is_allowed(&roles, Action::Delete, &resource("notes"), Scope::Own)
                .unwrap()
        );
        assert!(
            grants
                .is_allowed(&roles, Action::Delete, &resource("notes"), Scope::Any)
                .unwrap()
        );
    }

    #[test]
    fn positive_grant_should_cancel_inherited_exclusion() {
        let grants = Grants::builder()
            .grant("editor", "notes", "update", &["*", "!locked"])
            .grant("owner", "notes", "update", &["*"])
            .extend_role("owner", "editor")
            .build()
            .unwrap();
        let permission = grants
            .resolve(
                &[role("owner")],
                Action::Update,
                &resource("notes"),
                Scope::Any,
            )
            .unwrap();
        assert!(permission.attributes().allows("locked"));
    }

    #[test]
    fn granted_empty_field_list_should_stay_distinguishable_from_denial() {
        let grants = Grants::builder()
            .grant("counter", "notes", "read", &[])
            .build()
            .unwrap();
        let permission = grants
            .resolve(
                &[role("counter")],
                Action::Read,
                &resource("notes"),
                Scope::Any,
            )
            .unwrap();
        assert!(permission.granted());
        assert!(permission.attributes().is_empty());
    }

    #[test]
    fn empty_role_set_should_resolve_to_denial() {
        let grants = Grants::builder()
            .grant("reader", "notes", "read", &["*"])
            .build()
            .unwrap();
        let permission = grants
            .resolve(&[], Action::Read, &resource("notes"), Scope::Any)
            .unwrap();
        assert!(!permission.granted());
    }
}
