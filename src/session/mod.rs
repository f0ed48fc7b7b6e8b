//! Sessions: who is signed in, for the user chat client and the admin console.
//!
//! DESIGN
//! ======
//! There are two independent sessions, one per [`Scope`]. [`SessionState`]
//! owns both and is the only writer of the session storage keys; the HTTP
//! client (forced logout) and [`SessionStore`] (login/logout) both mutate
//! through it, so memory and durable storage never disagree.

pub mod state;
pub mod store;
pub mod token;

use serde::{Deserialize, Deserializer, Serialize};

pub use state::SessionState;
pub use store::{Credentials, LoginError, Registration, SessionStore};
pub use token::{TokenClaims, TokenError, decode_claims};

use crate::routing;
use crate::storage::keys;

/// Console roles. Users of the chat client are always [`Role::User`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Lecturer,
    SuperAdmin,
    #[default]
    User,
}

impl Role {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Lecturer => "LECTURER",
            Self::SuperAdmin => "SUPER_ADMIN",
            Self::User => "USER",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Decoded identity of the signed-in principal.
///
/// Persisted as `{id, displayName, role}`. Older console builds wrote
/// `userId`/`username`/`adminRole`; those names are still accepted on read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    #[serde(alias = "userId", alias = "adminId", deserialize_with = "deserialize_id")]
    pub id: String,
    #[serde(alias = "username", alias = "adminName")]
    pub display_name: String,
    #[serde(alias = "adminRole", default)]
    pub role: Role,
}

pub(crate) fn deserialize_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    token::IdValue::deserialize(deserializer).map(token::IdValue::into_string)
}

/// Bearer token plus the identity decoded from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub token: String,
    pub identity: Identity,
}

/// Which session a request or action belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scope {
    User,
    Admin,
}

impl Scope {
    /// Requests under the admin namespace use the admin session.
    #[must_use]
    pub fn for_path(path: &str) -> Self {
        if routing::is_admin_path(path) { Self::Admin } else { Self::User }
    }

    #[must_use]
    pub fn token_key(self) -> &'static str {
        match self {
            Self::User => keys::USER_TOKEN,
            Self::Admin => keys::ADMIN_TOKEN,
        }
    }

    #[must_use]
    pub fn info_key(self) -> &'static str {
        match self {
            Self::User => keys::USER_INFO,
            Self::Admin => keys::ADMIN_INFO,
        }
    }

    #[must_use]
    pub fn login_endpoint(self) -> &'static str {
        match self {
            Self::User => "/user/auth/login",
            Self::Admin => "/admin/auth/login",
        }
    }

    /// Self-registration exists only for chat users.
    #[must_use]
    pub fn register_endpoint(self) -> Option<&'static str> {
        match self {
            Self::User => Some("/user/auth/register"),
            Self::Admin => None,
        }
    }

    /// Page shown after logout or forced expiry.
    #[must_use]
    pub fn login_screen(self) -> &'static str {
        match self {
            Self::User => routing::LOGIN,
            Self::Admin => routing::ADMIN_LOGIN,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Admin => "admin",
        }
    }
}
