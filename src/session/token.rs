//! Login token payload decoding.
//!
//! The backend answers a successful login with a signed JWT. The console
//! trusts the server for signature checks and only reads the payload segment
//! to learn who is signed in, so this module never verifies signatures. What
//! it does do is validate the claims strictly: a payload without an id or a
//! display name is an error, not an empty identity.

#[cfg(test)]
#[path = "token_test.rs"]
mod token_test;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::Deserialize;

use super::{Identity, Role, Scope};

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("token is not a three-part JWT")]
    Malformed,
    #[error("token payload is not base64url: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("token payload is not a JSON claims object: {0}")]
    Json(#[from] serde_json::Error),
    #[error("token payload is missing `{0}`")]
    MissingClaim(&'static str),
}

/// Claims the console relies on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenClaims {
    pub id: String,
    pub display_name: String,
    pub role: Option<Role>,
    /// Expiry as seconds since the Unix epoch, when the token carries one.
    pub expires_at: Option<i64>,
}

/// Identifiers arrive as numbers from some services and strings from others.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum IdValue {
    Number(i64),
    Text(String),
}

impl IdValue {
    pub(crate) fn into_string(self) -> String {
        match self {
            Self::Number(n) => n.to_string(),
            Self::Text(s) => s,
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawClaims {
    #[serde(rename = "userId")]
    user_id: Option<IdValue>,
    #[serde(rename = "adminId")]
    admin_id: Option<IdValue>,
    #[serde(rename = "userName")]
    user_name: Option<String>,
    username: Option<String>,
    #[serde(rename = "adminName")]
    admin_name: Option<String>,
    role: Option<Role>,
    #[serde(rename = "adminRole")]
    admin_role: Option<Role>,
    exp: Option<i64>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Decode and validate the payload segment of `token`.
///
/// # Errors
///
/// Returns [`TokenError`] when the token is not three dot-separated segments,
/// the payload is not base64url JSON, or a required claim is absent.
pub fn decode_claims(token: &str) -> Result<TokenClaims, TokenError> {
    let mut segments = token.trim().split('.');
    let (Some(_header), Some(payload), Some(_signature), None) =
        (segments.next(), segments.next(), segments.next(), segments.next())
    else {
        return Err(TokenError::Malformed);
    };
    if payload.is_empty() {
        return Err(TokenError::Malformed);
    }

    let bytes = URL_SAFE_NO_PAD.decode(payload.trim_end_matches('='))?;
    let raw: RawClaims = serde_json::from_slice(&bytes)?;

    let id = raw
        .user_id
        .or(raw.admin_id)
        .map(IdValue::into_string)
        .filter(|id| !id.trim().is_empty())
        .ok_or(TokenError::MissingClaim("userId"))?;
    let display_name = non_blank(raw.user_name)
        .or_else(|| non_blank(raw.username))
        .or_else(|| non_blank(raw.admin_name))
        .ok_or(TokenError::MissingClaim("userName"))?;

    Ok(TokenClaims { id, display_name, role: raw.role.or(raw.admin_role), expires_at: raw.exp })
}

/// Build the identity for `scope` from validated claims.
///
/// User tokens default to [`Role::User`]; admin tokens must name their role.
///
/// # Errors
///
/// Returns [`TokenError::MissingClaim`] for an admin token without a role.
pub fn identity_from_claims(claims: TokenClaims, scope: Scope) -> Result<Identity, TokenError> {
    let role = match (scope, claims.role) {
        (_, Some(role)) => role,
        (Scope::User, None) => Role::User,
        (Scope::Admin, None) => return Err(TokenError::MissingClaim("adminRole")),
    };
    Ok(Identity { id: claims.id, display_name: claims.display_name, role })
}
