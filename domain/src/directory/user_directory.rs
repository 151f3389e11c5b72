//! Static user → role lookup table used at admission time.

use super::entities::{RoleLabel, UserId};
use crate::core::error::DomainError;
use std::collections::BTreeMap;

/// Validated, read-only mapping from user identifier to role label.
///
/// Built once at startup (from configuration or [`Default`]) and shared
/// behind an `Arc`. Admission checks go through [`UserDirectory::resolve`];
/// a user missing from this table never reaches the batch queue or the
/// conversation store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserDirectory {
    entries: BTreeMap<UserId, RoleLabel>,
}

impl UserDirectory {
    /// Build a directory from raw `(user, role)` pairs.
    ///
    /// Fails on blank users, blank role labels, or an empty table.
    /// Later duplicates overwrite earlier ones.
    pub fn new<I, U, R>(entries: I) -> Result<Self, DomainError>
    where
        I: IntoIterator<Item = (U, R)>,
        U: Into<String>,
        R: Into<String>,
    {
        let mut map = BTreeMap::new();
        for (user, role) in entries {
            let user = UserId::new(user)?;
            let role = RoleLabel::new(role)
                .ok_or_else(|| DomainError::InvalidRoleLabel(user.to_string()))?;
            map.insert(user, role);
        }

        if map.is_empty() {
            return Err(DomainError::EmptyDirectory);
        }

        Ok(Self { entries: map })
    }

    /// Admission check: map a raw identifier to a registered user and role.
    pub fn resolve(&self, user: &str) -> Result<(UserId, RoleLabel), DomainError> {
        let id = UserId::new(user).map_err(|_| DomainError::UnknownUser(user.to_string()))?;
        match self.entries.get(&id) {
            Some(role) => Ok((id, role.clone())),
            None => Err(DomainError::UnknownUser(user.to_string())),
        }
    }

    pub fn role_of(&self, user: &UserId) -> Option<&RoleLabel> {
        self.entries.get(user)
    }

    pub fn contains(&self, user: &UserId) -> bool {
        self.entries.contains_key(user)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&UserId, &RoleLabel)> {
        self.entries.iter()
    }
}

impl Default for UserDirectory {
    fn default() -> Self {
        let entries = [
            ("Linda", "Student"),
            ("Miguel", "Counselor"),
            ("Mike", "Athlete"),
        ]
        .into_iter()
        .map(|(u, r)| (UserId::from_static(u), RoleLabel::from_static(r)))
        .collect();
        Self { entries }
    }
}
