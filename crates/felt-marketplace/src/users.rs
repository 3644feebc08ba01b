//! User directory and identity
//!
//! Profiles are registered from outside the core; the core only reads them.
//! The acting user comes from an [`IdentityProvider`].

use std::collections::HashMap;
use std::sync::Arc;

use felt_types::*;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

/// Supplies the acting user
pub trait IdentityProvider: Send + Sync {
    /// The current user, or `None` when nobody is signed in
    fn current_user(&self) -> Option<Actor>;
}

/// Role-switching identity for demos and tests
#[derive(Clone, Default)]
pub struct MockIdentity {
    current: Arc<RwLock<Option<Actor>>>,
}

impl MockIdentity {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start acting as `profile`
    pub fn login_as(&self, profile: &UserProfile) {
        tracing::debug!(user = %profile.id, role = %profile.role, "Switched identity");
        *self.current.write() = Some(profile.actor());
    }

    pub fn logout(&self) {
        *self.current.write() = None;
    }
}

impl IdentityProvider for MockIdentity {
    fn current_user(&self) -> Option<Actor> {
        *self.current.read()
    }
}

/// A profile joined with its ledger-derived reputation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserView {
    pub profile: UserProfile,
    pub reputation: Reputation,
}

/// Registered user profiles. Clones share state.
#[derive(Clone, Default)]
pub struct UserDirectory {
    users: Arc<RwLock<HashMap<UserId, UserProfile>>>,
}

impl UserDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register or replace a profile
    pub fn register(&self, profile: UserProfile) -> Result<UserProfile> {
        if profile.username.trim().is_empty() {
            return Err(FeltError::validation("username", "must not be empty"));
        }
        let mut users = self.users.write();
        let taken = users.values().any(|u| {
            u.id != profile.id && u.username.eq_ignore_ascii_case(&profile.username)
        });
        if taken {
            return Err(FeltError::validation(
                "username",
                format!("{} is already taken", profile.username),
            ));
        }
        users.insert(profile.id, profile.clone());
        tracing::debug!(user = %profile.id, username = %profile.username, "User registered");
        Ok(profile)
    }

    pub fn get(&self, id: &UserId) -> Result<UserProfile> {
        self.users
            .read()
            .get(id)
            .cloned()
            .ok_or_else(|| FeltError::not_found("User", id))
    }

    /// Look up a profile by exact username (case-insensitive)
    pub fn by_username(&self, username: &str) -> Option<UserProfile> {
        self.users
            .read()
            .values()
            .find(|u| u.username.eq_ignore_ascii_case(username))
            .cloned()
    }

    /// Profiles with an optional role, whose username contains `name`
    /// (case-insensitive), sorted by username
    pub fn search(&self, role: Option<UserRole>, name: &str) -> Vec<UserProfile> {
        let needle = name.trim().to_lowercase();
        let mut found: Vec<UserProfile> = self
            .users
            .read()
            .values()
            .filter(|u| role.map_or(true, |r| u.role == r))
            .filter(|u| u.username.to_lowercase().contains(&needle))
            .cloned()
            .collect();
        found.sort_by(|a, b| a.username.cmp(&b.username));
        found
    }

    pub fn len(&self) -> usize {
        self.users.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
