//! Session store: login, registration and logout for one [`Scope`].

#[cfg(test)]
#[path = "store_test.rs"]
mod store_test;

use std::sync::Arc;

use serde::Serialize;
use serde_json::{Map, Value};

use super::token::{self, TokenError};
use super::{Identity, Scope, Session, SessionState};
use crate::error::ApiError;
use crate::net::{ApiClient, ApiRequest, CallState};
use crate::notify::{Notice, Notifier};

const LOGIN_FAILED: &str = "Login failed";
const LOGIN_SUCCEEDED: &str = "Login successful";
const REGISTER_FAILED: &str = "Registration failed";
const REGISTER_SUCCEEDED: &str = "Registration successful";
const REGISTER_UNAVAILABLE: &str = "Registration is not available here";

/// Login form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Credentials {
    #[serde(rename = "userName")]
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self { username: username.into(), password: password.into() }
    }
}

/// Registration form. Fields beyond name and password pass through as-is.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Registration {
    #[serde(rename = "userName")]
    pub username: String,
    pub password: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Registration {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self { username: username.into(), password: password.into(), extra: Map::new() }
    }

    #[must_use]
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LoginError {
    #[error(transparent)]
    Request(#[from] ApiError),
    #[error("login response carried no token")]
    MissingToken,
    #[error("login token rejected: {0}")]
    Token(#[from] TokenError),
}

/// Login/logout actions and read-only getters for one scope.
#[derive(Clone)]
pub struct SessionStore {
    scope: Scope,
    client: Arc<ApiClient>,
}

impl SessionStore {
    pub fn new(scope: Scope, client: Arc<ApiClient>) -> Self {
        Self { scope, client }
    }

    /// Store for the chat user session.
    pub fn user(client: Arc<ApiClient>) -> Self {
        Self::new(Scope::User, client)
    }

    /// Store for the admin console session.
    pub fn admin(client: Arc<ApiClient>) -> Self {
        Self::new(Scope::Admin, client)
    }

    #[must_use]
    pub fn scope(&self) -> Scope {
        self.scope
    }

    fn sessions(&self) -> &SessionState {
        self.client.sessions()
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.sessions().is_authenticated(self.scope)
    }

    #[must_use]
    pub fn current_identity(&self) -> Option<Identity> {
        self.sessions().identity(self.scope)
    }

    /// Sign in. `true` iff the backend answered 200 with a decodable token.
    pub async fn login(&self, credentials: &Credentials) -> bool {
        self.login_detailed(credentials).await.is_ok()
    }

    /// Sign in and report why it failed.
    ///
    /// Exactly one notice is shown either way. On failure the session is
    /// left as it was before the call.
    ///
    /// # Errors
    ///
    /// Returns [`LoginError`] when the request fails, the response has no
    /// token, or the token payload does not decode.
    pub async fn login_detailed(&self, credentials: &Credentials) -> Result<Identity, LoginError> {
        let request =
            ApiRequest::post(self.scope.login_endpoint()).failure_message(LOGIN_FAILED).keep_session().json(credentials);
        let mut call = CallState::new(&request);
        let result = self.attempt_login(request, &mut call).await;

        let notifier = self.client.notifier();
        match &result {
            Ok(identity) => {
                call.report(notifier, Notice::success(LOGIN_SUCCEEDED));
                tracing::info!(scope = self.scope.as_str(), user = %identity.display_name, "login succeeded");
            }
            Err(e) => {
                call.report(notifier, Notice::error(login_failure_text(e)));
                tracing::warn!(scope = self.scope.as_str(), error = %e, "login failed");
            }
        }
        result
    }

    async fn attempt_login(
        &self,
        request: ApiRequest,
        call: &mut CallState,
    ) -> Result<Identity, LoginError> {
        let data = self.client.send_tracked(request, call).await?;

        let token = match data {
            Value::String(token) if !token.trim().is_empty() => token,
            _ => return Err(LoginError::MissingToken),
        };
        let claims = token::decode_claims(&token)?;
        let identity = token::identity_from_claims(claims, self.scope)?;

        self.sessions().establish(self.scope, Session { token: token.clone(), identity: identity.clone() });
        if self.scope == Scope::User {
            self.client.set_default_credential(Some(token));
        }
        Ok(identity)
    }

    /// Create a chat user account. Does not sign in.
    pub async fn register(&self, registration: &Registration) -> bool {
        let Some(endpoint) = self.scope.register_endpoint() else {
            self.client.notifier().notify(Notice::error(REGISTER_UNAVAILABLE));
            return false;
        };

        let request = ApiRequest::post(endpoint).failure_message(REGISTER_FAILED).keep_session().json(registration);
        let mut call = CallState::new(&request);
        match self.client.send_tracked(request, &mut call).await {
            Ok(_) => {
                call.report(self.client.notifier(), Notice::success(REGISTER_SUCCEEDED));
                true
            }
            Err(_) => false,
        }
    }

    /// Sign out and show the login screen. A second call does nothing.
    pub fn logout(&self) {
        if self.scope == Scope::User {
            self.client.set_default_credential(None);
        }
        if !self.sessions().clear(self.scope) {
            tracing::debug!(scope = self.scope.as_str(), "logout with no session");
            return;
        }
        self.client.navigator().push(self.scope.login_screen());
    }
}

fn login_failure_text(error: &LoginError) -> String {
    match error {
        LoginError::Request(_) => LOGIN_FAILED.to_owned(),
        LoginError::MissingToken => format!("{LOGIN_FAILED}: no token returned"),
        LoginError::Token(_) => format!("{LOGIN_FAILED}: unreadable token"),
    }
}
