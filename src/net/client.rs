//! Authenticated API client.
//!
//! SYSTEM CONTEXT
//! ==============
//! Every console call goes through [`ApiClient::send`]. The client picks the
//! bearer token by namespace, dispatches through its [`Transport`], and turns
//! the `{code, message, data}` envelope into `Ok(data)` or an [`ApiError`].
//!
//! DESIGN
//! ======
//! The client is constructed explicitly and shared by `Arc`; it carries its
//! own transport, session state, notifier and navigator. Nothing here is a
//! process-wide hook.
//!
//! ERROR HANDLING
//! ==============
//! Each call owns a [`CallState`]. All failure paths report through it, and
//! it lets through at most one notice per call, so layered handlers (the
//! client, then the session store) cannot double-notify. Side effects on
//! failure are limited to: one notice, clearing a session, one redirect.
//! Nothing is retried.

#[cfg(test)]
#[path = "client_test.rs"]
mod client_test;

use std::sync::{Arc, Mutex, PoisonError};

use envelope::{EnvelopeStatus, decode_envelope};
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

use super::transport::{Body, HttpRequest, HttpResponse, Method, ReqwestTransport, Transport, TransportError};
use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::notify::{Notice, Notifier};
use crate::routing::{self, Navigator};
use crate::session::{Scope, SessionState};
use crate::storage::Storage;

pub const DEFAULT_FAILURE_MESSAGE: &str = "System error";
pub const NETWORK_FAILURE_MESSAGE: &str = "Network error, please try again later";
pub const SESSION_EXPIRED_MESSAGE: &str = "Login expired, please log in again";
pub const FORBIDDEN_MESSAGE: &str = "Access denied";

// =============================================================================
// REQUEST
// =============================================================================

/// A console API call before credentials are attached.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Body,
    /// Notice text when the envelope carries no message.
    pub failure_message: Option<String>,
    /// HTTP 401 means the submitted credentials were refused, not that the
    /// current session expired.
    pub keeps_session: bool,
    /// Reason this request cannot be sent. Reported before dispatch.
    rejected: Option<String>,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: Body::Empty,
            failure_message: None,
            keeps_session: false,
            rejected: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::Get, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::Post, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::Put, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::Delete, path)
    }

    #[must_use]
    pub fn query(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((key.into(), value.to_string()));
        self
    }

    #[must_use]
    pub fn query_pairs(mut self, pairs: impl IntoIterator<Item = (String, String)>) -> Self {
        self.query.extend(pairs);
        self
    }

    /// Attach a JSON body. An encode failure rejects the request when sent.
    #[must_use]
    pub fn json<T: Serialize + ?Sized>(mut self, body: &T) -> Self {
        match serde_json::to_value(body) {
            Ok(value) => self.body = Body::Json(value),
            Err(e) => self.rejected = Some(format!("body encode failed: {e}")),
        }
        self
    }

    #[must_use]
    pub fn multipart(mut self, parts: Vec<super::transport::Part>) -> Self {
        self.body = Body::Multipart(parts);
        self
    }

    #[must_use]
    pub fn failure_message(mut self, message: impl Into<String>) -> Self {
        self.failure_message = Some(message.into());
        self
    }

    /// Keep the current session when the backend answers 401. Used by login
    /// and registration.
    #[must_use]
    pub fn keep_session(mut self) -> Self {
        self.keeps_session = true;
        self
    }

    /// Mark the request unsendable. [`ApiClient::send`] notifies once and
    /// returns [`ApiError::Config`] without touching the network.
    #[must_use]
    pub fn reject(mut self, reason: impl Into<String>) -> Self {
        self.rejected.get_or_insert_with(|| reason.into());
        self
    }

    #[must_use]
    pub fn scope(&self) -> Scope {
        Scope::for_path(&self.path)
    }

    fn validate(&self) -> Result<(), ApiError> {
        if let Some(reason) = &self.rejected {
            return Err(ApiError::Config(reason.clone()));
        }
        if self.path.trim().is_empty() {
            return Err(ApiError::Config("request path is empty".to_owned()));
        }
        if !self.path.starts_with('/') {
            return Err(ApiError::Config(format!("request path must start with '/': {}", self.path)));
        }
        if self.path.chars().any(char::is_whitespace) {
            return Err(ApiError::Config(format!("request path contains whitespace: {}", self.path)));
        }
        Ok(())
    }
}

// =============================================================================
// CALL STATE
// =============================================================================

/// Per-call bookkeeping threaded through the failure path.
#[derive(Debug)]
pub struct CallState {
    id: Uuid,
    path: String,
    scope: Scope,
    notified: bool,
}

impl CallState {
    #[must_use]
    pub fn new(request: &ApiRequest) -> Self {
        Self { id: Uuid::new_v4(), path: request.path.clone(), scope: request.scope(), notified: false }
    }

    #[must_use]
    pub fn id(&self) -> Uuid {
        self.id
    }

    #[must_use]
    pub fn scope(&self) -> Scope {
        self.scope
    }

    /// Whether a notice has already been shown for this call.
    #[must_use]
    pub fn is_handled(&self) -> bool {
        self.notified
    }

    /// Show `notice` unless this call already showed one.
    pub fn report(&mut self, notifier: &dyn Notifier, notice: Notice) {
        if self.notified {
            tracing::debug!(call = %self.id, path = %self.path, "suppressed duplicate notice");
            return;
        }
        self.notified = true;
        notifier.notify(notice);
    }
}

// =============================================================================
// CLIENT
// =============================================================================

pub struct ApiClient {
    transport: Arc<dyn Transport>,
    sessions: Arc<SessionState>,
    notifier: Arc<dyn Notifier>,
    navigator: Arc<dyn Navigator>,
    default_credential: Mutex<Option<String>>,
}

impl ApiClient {
    pub fn new(
        transport: Arc<dyn Transport>,
        sessions: Arc<SessionState>,
        notifier: Arc<dyn Notifier>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        let default_credential = sessions.token(Scope::User);
        Self { transport, sessions, notifier, navigator, default_credential: Mutex::new(default_credential) }
    }

    /// Build a client with a [`ReqwestTransport`] and sessions hydrated from `storage`.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Build`] if the HTTP client fails to build.
    pub fn from_config(
        config: &ClientConfig,
        storage: Arc<dyn Storage>,
        notifier: Arc<dyn Notifier>,
        navigator: Arc<dyn Navigator>,
    ) -> Result<Self, TransportError> {
        let transport = ReqwestTransport::new(&config.base_url, config.timeouts)?;
        let sessions = Arc::new(SessionState::hydrate(storage));
        Ok(Self::new(Arc::new(transport), sessions, notifier, navigator))
    }

    #[must_use]
    pub fn sessions(&self) -> &Arc<SessionState> {
        &self.sessions
    }

    #[must_use]
    pub fn notifier(&self) -> &dyn Notifier {
        self.notifier.as_ref()
    }

    #[must_use]
    pub fn navigator(&self) -> &dyn Navigator {
        self.navigator.as_ref()
    }

    /// Credential used for user-namespace calls when storage holds none.
    pub fn set_default_credential(&self, token: Option<String>) {
        *self.default_credential.lock().unwrap_or_else(PoisonError::into_inner) = token;
    }

    #[must_use]
    pub fn default_credential(&self) -> Option<String> {
        self.default_credential.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Bearer token for a request in `scope`. Admin calls never fall back.
    #[must_use]
    pub fn credential_for(&self, scope: Scope) -> Option<String> {
        match scope {
            Scope::Admin => self.sessions.token(Scope::Admin),
            Scope::User => self.sessions.token(Scope::User).or_else(|| self.default_credential()),
        }
    }

    /// Send `request` and return the envelope's `data` on success.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] for any failure; the user has already been notified.
    pub async fn send(&self, request: ApiRequest) -> Result<Value, ApiError> {
        let mut call = CallState::new(&request);
        self.send_tracked(request, &mut call).await
    }

    /// Like [`ApiClient::send`], reporting through a caller-owned [`CallState`]
    /// so follow-up handling can share the one-notice budget.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] for any failure; the user has already been notified.
    pub async fn send_tracked(&self, request: ApiRequest, call: &mut CallState) -> Result<Value, ApiError> {
        let result = self.dispatch(request, call).await;
        if let Err(e) = &result {
            tracing::warn!(call = %call.id, path = %call.path, scope = call.scope.as_str(), error = %e, "request failed");
        }
        result
    }

    async fn dispatch(&self, request: ApiRequest, call: &mut CallState) -> Result<Value, ApiError> {
        let fallback = request.failure_message.clone().unwrap_or_else(|| DEFAULT_FAILURE_MESSAGE.to_owned());
        if let Err(e) = request.validate() {
            call.report(self.notifier.as_ref(), Notice::error(fallback));
            return Err(e);
        }

        let scope = request.scope();
        let keeps_session = request.keeps_session;
        let http = self.build_http(request, scope);
        tracing::debug!(call = %call.id, method = http.method.as_str(), path = %http.path, scope = scope.as_str(), authenticated = http.header("Authorization").is_some(), "dispatching request");

        let response = match self.transport.execute(http).await {
            Ok(response) => response,
            Err(TransportError::Build(message)) => {
                call.report(self.notifier.as_ref(), Notice::error(fallback));
                return Err(ApiError::Config(message));
            }
            Err(e) => {
                call.report(self.notifier.as_ref(), Notice::error(NETWORK_FAILURE_MESSAGE));
                return Err(ApiError::Transport(e.to_string()));
            }
        };

        self.handle_response(response, scope, keeps_session, &fallback, call)
    }

    fn build_http(&self, request: ApiRequest, scope: Scope) -> HttpRequest {
        let mut headers = Vec::new();
        if let Some(token) = self.credential_for(scope) {
            headers.push(("Authorization".to_owned(), format!("Bearer {token}")));
        }
        HttpRequest { method: request.method, path: request.path, query: request.query, headers, body: request.body }
    }

    fn handle_response(
        &self,
        response: HttpResponse,
        scope: Scope,
        keeps_session: bool,
        fallback: &str,
        call: &mut CallState,
    ) -> Result<Value, ApiError> {
        match response.status {
            401 if keeps_session => {
                call.report(self.notifier.as_ref(), Notice::error(fallback));
                return Err(ApiError::Unauthorized { message: fallback.to_owned() });
            }
            401 => {
                call.report(self.notifier.as_ref(), Notice::error(SESSION_EXPIRED_MESSAGE));
                self.expire_session(scope);
                return Err(ApiError::Unauthorized { message: SESSION_EXPIRED_MESSAGE.to_owned() });
            }
            403 => {
                call.report(self.notifier.as_ref(), Notice::error(FORBIDDEN_MESSAGE));
                return Err(ApiError::Application { code: 403, message: FORBIDDEN_MESSAGE.to_owned() });
            }
            _ => {}
        }

        let envelope = match decode_envelope(&response.body) {
            Ok(envelope) => envelope,
            Err(e) => {
                call.report(self.notifier.as_ref(), Notice::error(fallback));
                return Err(if response.is_success() {
                    ApiError::Transport(format!("unreadable response: {e}"))
                } else {
                    ApiError::Transport(format!("HTTP {}", response.status))
                });
            }
        };

        match envelope.status() {
            EnvelopeStatus::Success => Ok(envelope.into_data()),
            EnvelopeStatus::TokenRejected => {
                let message = envelope.message_or(fallback).to_owned();
                call.report(self.notifier.as_ref(), Notice::error(message.clone()));
                self.force_admin_logout();
                Err(ApiError::Unauthorized { message })
            }
            EnvelopeStatus::Failure => {
                let message = envelope.message_or(fallback).to_owned();
                call.report(self.notifier.as_ref(), Notice::error(message.clone()));
                Err(ApiError::Application { code: envelope.code, message })
            }
        }
    }

    /// Token sentinel path: drop the admin session and, when the console is
    /// showing an admin page, send it to the admin login.
    fn force_admin_logout(&self) {
        self.sessions.clear(Scope::Admin);
        if routing::is_admin_path(&self.navigator.current_path()) {
            self.navigator.push(routing::ADMIN_LOGIN);
        }
    }

    /// HTTP 401 path: drop the session the request was made under.
    fn expire_session(&self, scope: Scope) {
        match scope {
            Scope::Admin => self.force_admin_logout(),
            Scope::User => {
                self.sessions.clear(Scope::User);
                self.set_default_credential(None);
                self.navigator.push(routing::LOGIN);
            }
        }
    }
}
