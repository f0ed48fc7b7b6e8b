//! Shared session state, mirrored to durable storage.

#[cfg(test)]
#[path = "state_test.rs"]
mod state_test;

use std::sync::{Arc, Mutex, PoisonError};

use super::{Identity, Scope, Session};
use crate::storage::{self, Storage};

/// Both sessions plus the storage they persist to.
///
/// Invariant: for each scope, an identity is held iff a non-empty token is
/// stored. Every mutation goes through [`SessionState::establish`] or
/// [`SessionState::clear`], which write memory and storage together.
pub struct SessionState {
    storage: Arc<dyn Storage>,
    user: Mutex<Option<Session>>,
    admin: Mutex<Option<Session>>,
}

impl std::fmt::Debug for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionState")
            .field("user", &self.identity(Scope::User))
            .field("admin", &self.identity(Scope::Admin))
            .finish_non_exhaustive()
    }
}

/// Tokens the browser console sometimes wrote for "no token".
fn usable_token(raw: Option<String>) -> Option<String> {
    raw.filter(|t| {
        let t = t.trim();
        !t.is_empty() && t != "undefined" && t != "null"
    })
}

impl SessionState {
    /// Restore both sessions from `storage`.
    ///
    /// A scope whose stored token or identity is missing or unreadable starts
    /// signed out and its leftover keys are removed.
    pub fn hydrate(storage: Arc<dyn Storage>) -> Self {
        let user = Self::restore(storage.as_ref(), Scope::User);
        let admin = Self::restore(storage.as_ref(), Scope::Admin);
        Self { storage, user: Mutex::new(user), admin: Mutex::new(admin) }
    }

    fn restore(storage: &dyn Storage, scope: Scope) -> Option<Session> {
        let token = usable_token(storage.get(scope.token_key()));
        let identity = storage::load_json::<Identity>(storage, scope.info_key());
        match (token, identity) {
            (Some(token), Some(identity)) => {
                tracing::debug!(scope = scope.as_str(), user = %identity.display_name, "session restored");
                Some(Session { token, identity })
            }
            (None, None) => {
                if storage.get(scope.token_key()).is_some() || storage.get(scope.info_key()).is_some() {
                    Self::purge(storage, scope);
                }
                None
            }
            _ => {
                tracing::warn!(scope = scope.as_str(), "incomplete stored session; starting signed out");
                Self::purge(storage, scope);
                None
            }
        }
    }

    fn purge(storage: &dyn Storage, scope: Scope) {
        storage.remove(scope.token_key());
        storage.remove(scope.info_key());
    }

    fn slot(&self, scope: Scope) -> &Mutex<Option<Session>> {
        match scope {
            Scope::User => &self.user,
            Scope::Admin => &self.admin,
        }
    }

    #[must_use]
    pub fn storage(&self) -> &Arc<dyn Storage> {
        &self.storage
    }

    /// Token to attach to a request in `scope`, read from durable storage.
    #[must_use]
    pub fn token(&self, scope: Scope) -> Option<String> {
        usable_token(self.storage.get(scope.token_key()))
    }

    #[must_use]
    pub fn session(&self, scope: Scope) -> Option<Session> {
        self.slot(scope).lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    #[must_use]
    pub fn identity(&self, scope: Scope) -> Option<Identity> {
        self.session(scope).map(|s| s.identity)
    }

    #[must_use]
    pub fn is_authenticated(&self, scope: Scope) -> bool {
        self.slot(scope).lock().unwrap_or_else(PoisonError::into_inner).is_some()
    }

    /// Install a freshly decoded session for `scope`.
    pub fn establish(&self, scope: Scope, session: Session) {
        let mut slot = self.slot(scope).lock().unwrap_or_else(PoisonError::into_inner);
        self.storage.set(scope.token_key(), &session.token);
        storage::save_json(self.storage.as_ref(), scope.info_key(), &session.identity);
        tracing::info!(scope = scope.as_str(), user = %session.identity.display_name, role = %session.identity.role, "session established");
        *slot = Some(session);
    }

    /// Drop the session for `scope`. Returns whether anything was held.
    pub fn clear(&self, scope: Scope) -> bool {
        let mut slot = self.slot(scope).lock().unwrap_or_else(PoisonError::into_inner);
        let had_memory = slot.take().is_some();
        let had_storage =
            self.storage.get(scope.token_key()).is_some() || self.storage.get(scope.info_key()).is_some();
        Self::purge(self.storage.as_ref(), scope);
        if had_memory || had_storage {
            tracing::info!(scope = scope.as_str(), "session cleared");
        }
        had_memory || had_storage
    }
}
