//! Shared fixtures for unit tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde_json::Value;

use crate::net::{ApiClient, HttpRequest, HttpResponse, Transport, TransportError};
use crate::notify::RecordingNotifier;
use crate::routing::MemoryNavigator;
use crate::session::{Identity, Role, Scope, Session, SessionState};
use crate::storage::MemoryStorage;

// =========================================================================
// Tokens and sessions
// =========================================================================

/// Unsigned JWT carrying `claims` as its payload.
pub fn jwt(claims: &Value) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD.encode(serde_json::to_vec(claims).unwrap());
    format!("{header}.{payload}.signature")
}

pub fn user_session(token: &str) -> Session {
    Session {
        token: token.to_owned(),
        identity: Identity { id: "1".into(), display_name: "student".into(), role: Role::User },
    }
}

pub fn admin_session(token: &str, role: Role) -> Session {
    Session {
        token: token.to_owned(),
        identity: Identity { id: "100".into(), display_name: "staff".into(), role },
    }
}

// =========================================================================
// MockTransport
// =========================================================================

pub struct MockTransport {
    responses: Mutex<VecDeque<Result<HttpResponse, TransportError>>>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self { responses: Mutex::new(VecDeque::new()), requests: Mutex::new(Vec::new()) }
    }

    pub fn push(&self, response: Result<HttpResponse, TransportError>) {
        self.responses.lock().unwrap().push_back(response);
    }

    /// Queue an HTTP 200 carrying `{code, message, data}`.
    pub fn push_envelope(&self, code: i64, message: &str, data: Value) {
        let body = serde_json::json!({ "code": code, "message": message, "data": data });
        self.push(Ok(HttpResponse { status: 200, body: serde_json::to_vec(&body).unwrap() }));
    }

    pub fn push_status(&self, status: u16, body: &str) {
        self.push(Ok(HttpResponse { status, body: body.as_bytes().to_vec() }));
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn last_request(&self) -> HttpRequest {
        self.requests.lock().unwrap().last().cloned().expect("no request sent")
    }
}

#[async_trait::async_trait]
impl Transport for MockTransport {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        self.requests.lock().unwrap().push(request);
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(TransportError::Other("no scripted response".into())))
    }
}

// =========================================================================
// Harness
// =========================================================================

pub struct Harness {
    pub client: Arc<ApiClient>,
    pub transport: Arc<MockTransport>,
    pub notifier: Arc<RecordingNotifier>,
    pub navigator: Arc<MemoryNavigator>,
    pub storage: Arc<MemoryStorage>,
}

impl Harness {
    pub fn sessions(&self) -> &SessionState {
        self.client.sessions()
    }

    pub fn sign_in(&self, scope: Scope, session: Session) {
        self.client.sessions().establish(scope, session);
    }
}

/// Client over a mock transport, starting at `location`.
pub fn harness(location: &str) -> Harness {
    harness_with_storage(location, Arc::new(MemoryStorage::new()))
}

pub fn harness_with_storage(location: &str, storage: Arc<MemoryStorage>) -> Harness {
    let transport = Arc::new(MockTransport::new());
    let notifier = Arc::new(RecordingNotifier::new());
    let navigator = Arc::new(MemoryNavigator::new(location));
    let sessions = Arc::new(SessionState::hydrate(storage.clone()));
    let client =
        Arc::new(ApiClient::new(transport.clone(), sessions, notifier.clone(), navigator.clone()));
    Harness { client, transport, notifier, navigator, storage }
}
