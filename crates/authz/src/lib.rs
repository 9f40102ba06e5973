//! Access policies for Shelf resources.
//!
//! A policy is a decision table from (action, principal) to a [`Decision`].
//! Nothing here performs I/O; the HTTP layer resolves the principal and
//! turns a decision into a response.

use std::collections::HashMap;

use serde::Deserialize;

/// Roles ordered by privilege: `Viewer < Editor < Admin`.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    Viewer,
    Editor,
    Admin,
}

impl Role {
    pub const fn as_str(self) -> &'static str {
        match self {
            Role::Viewer => "viewer",
            Role::Editor => "editor",
            Role::Admin => "admin",
        }
    }
}

/// An authenticated actor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub username: String,
    pub role: Role,
}

impl Principal {
    pub fn new(username: impl Into<String>, role: Role) -> Self {
        Self {
            username: username.into(),
            role,
        }
    }
}

/// Operation performed against a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    List,
    Retrieve,
    Create,
    Update,
    Delete,
}

impl Action {
    pub const fn as_str(self) -> &'static str {
        match self {
            Action::List => "list",
            Action::Retrieve => "retrieve",
            Action::Create => "create",
            Action::Update => "update",
            Action::Delete => "delete",
        }
    }
}

/// What an actor needs in order to perform an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requirement {
    Anyone,
    Authenticated,
    AtLeast(Role),
}

/// Outcome of a policy check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    /// No credentials were presented but the action needs them.
    Unauthenticated,
    /// Credentials were presented but the role is too low.
    Forbidden,
}

impl Decision {
    pub const fn is_allowed(self) -> bool {
        matches!(self, Decision::Allow)
    }
}

/// Per-resource decision table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccessPolicy {
    pub read: Requirement,
    pub create: Requirement,
    pub update: Requirement,
    pub delete: Requirement,
}

impl AccessPolicy {
    /// Reads are open, every write needs an authenticated actor.
    pub const fn authenticated_or_read_only() -> Self {
        Self {
            read: Requirement::Anyone,
            create: Requirement::Authenticated,
            update: Requirement::Authenticated,
            delete: Requirement::Authenticated,
        }
    }

    /// Like [`AccessPolicy::authenticated_or_read_only`] but deletes are
    /// reserved for admins.
    pub const fn admin_deletes() -> Self {
        Self {
            delete: Requirement::AtLeast(Role::Admin),
            ..Self::authenticated_or_read_only()
        }
    }

    /// Editors write, admins delete, everybody reads.
    pub const fn editorial() -> Self {
        Self {
            read: Requirement::Anyone,
            create: Requirement::AtLeast(Role::Editor),
            update: Requirement::AtLeast(Role::Editor),
            delete: Requirement::AtLeast(Role::Admin),
        }
    }

    pub const fn requirement(&self, action: Action) -> Requirement {
        match action {
            Action::List | Action::Retrieve => self.read,
            Action::Create => self.create,
            Action::Update => self.update,
            Action::Delete => self.delete,
        }
    }

    /// Decide whether `principal` may perform `action`.
    pub fn decide(&self, action: Action, principal: Option<&Principal>) -> Decision {
        match (self.requirement(action), principal) {
            (Requirement::Anyone, _) => Decision::Allow,
            (_, None) => Decision::Unauthenticated,
            (Requirement::Authenticated, Some(_)) => Decision::Allow,
            (Requirement::AtLeast(role), Some(p)) if p.role >= role => Decision::Allow,
            (Requirement::AtLeast(_), Some(_)) => Decision::Forbidden,
        }
    }
}

/// Static token → principal lookup standing in for an external identity
/// provider.
#[derive(Debug, Clone, Default)]
pub struct TokenDirectory {
    tokens: HashMap<String, Principal>,
}

impl TokenDirectory {
    pub fn new<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (String, Principal)>,
    {
        let tokens: HashMap<_, _> = entries.into_iter().collect();
        tracing::debug!(count = tokens.len(), "token directory loaded");
        Self { tokens }
    }

    pub fn authenticate(&self, token: &str) -> Option<&Principal> {
        self.tokens.get(token)
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn actor(role: Role) -> Principal {
        Principal::new("someone", role)
    }

    #[test]
    fn reads_are_open_to_anonymous_actors() {
        for policy in [
            AccessPolicy::authenticated_or_read_only(),
            AccessPolicy::admin_deletes(),
            AccessPolicy::editorial(),
        ] {
            assert_eq!(policy.decide(Action::List, None), Decision::Allow);
            assert_eq!(policy.decide(Action::Retrieve, None), Decision::Allow);
        }
    }

    #[test]
    fn writes_without_credentials_are_unauthenticated() {
        let policy = AccessPolicy::editorial();
        for action in [Action::Create, Action::Update, Action::Delete] {
            assert_eq!(policy.decide(action, None), Decision::Unauthenticated);
        }
    }

    #[test]
    fn role_requirements_follow_privilege_order() {
        let policy = AccessPolicy::editorial();
        assert_eq!(
            policy.decide(Action::Create, Some(&actor(Role::Viewer))),
            Decision::Forbidden
        );
        assert_eq!(
            policy.decide(Action::Create, Some(&actor(Role::Editor))),
            Decision::Allow
        );
        assert_eq!(
            policy.decide(Action::Delete, Some(&actor(Role::Editor))),
            Decision::Forbidden
        );
        assert_eq!(
            policy.decide(Action::Delete, Some(&actor(Role::Admin))),
            Decision::Allow
        );
    }

    #[test]
    fn admin_deletes_lets_any_actor_write() {
        let policy = AccessPolicy::admin_deletes();
        let viewer = actor(Role::Viewer);
        assert!(policy.decide(Action::Update, Some(&viewer)).is_allowed());
        assert_eq!(policy.decide(Action::Delete, Some(&viewer)), Decision::Forbidden);
    }

    #[test]
    fn token_directory_resolves_known_tokens_only() {
        let directory = TokenDirectory::new([(
            "secret".to_string(),
            Principal::new("alice", Role::Admin),
        )]);
        assert_eq!(directory.len(), 1);
        assert_eq!(
            directory.authenticate("secret").map(|p| p.username.as_str()),
            Some("alice")
        );
        assert!(directory.authenticate("guess").is_none());
    }
}
