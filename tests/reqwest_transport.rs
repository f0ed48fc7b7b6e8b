//! End-to-end: `ApiClient` over the real `reqwest` transport against a
//! local mock backend.

use std::sync::Arc;
use std::time::Duration;

use lectern::config::Timeouts;
use lectern::net::{ApiClient, ApiRequest, HttpRequest, Method, ReqwestTransport, Transport, TransportError};
use lectern::notify::RecordingNotifier;
use lectern::routing::{MemoryNavigator, Navigator};
use lectern::storage::{MemoryStorage, Storage, keys};
use lectern::{ApiError, SessionState};
use serde_json::json;
use wiremock::matchers::{body_string_contains, header, header_regex, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

struct Fixture {
    client: ApiClient,
    storage: Arc<MemoryStorage>,
    notifier: Arc<RecordingNotifier>,
    navigator: Arc<MemoryNavigator>,
}

fn fixture(base_url: &str, location: &str, entries: &[(&str, &str)]) -> Fixture {
    let storage = Arc::new(MemoryStorage::with_entries(entries.iter().copied()));
    let notifier = Arc::new(RecordingNotifier::new());
    let navigator = Arc::new(MemoryNavigator::new(location));
    let transport = ReqwestTransport::new(base_url, Timeouts::default()).unwrap();
    let sessions = Arc::new(SessionState::hydrate(storage.clone()));
    let client = ApiClient::new(Arc::new(transport), sessions, notifier.clone(), navigator.clone());
    Fixture { client, storage, notifier, navigator }
}

fn envelope(code: i64, message: &str, data: serde_json::Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({ "code": code, "message": message, "data": data }))
}

const ADMIN_INFO: &str = r#"{"id":"1","displayName":"root","role":"SUPER_ADMIN"}"#;

#[tokio::test]
async fn bearer_and_query_reach_the_server() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/admin/superAdmin/knowledgeDoc/detail"))
        .and(query_param("id", "5"))
        .and(header("Authorization", "Bearer admin-token"))
        .respond_with(envelope(200, "success", json!({ "id": 5 })))
        .expect(1)
        .mount(&server)
        .await;

    let f = fixture(&server.uri(), "/admin/knowledge-management", &[
        (keys::ADMIN_TOKEN, "admin-token"),
        (keys::ADMIN_INFO, ADMIN_INFO),
    ]);
    let data = f.client.send(ApiRequest::get("/admin/superAdmin/knowledgeDoc/detail").query("id", 5)).await.unwrap();

    assert_eq!(data, json!({ "id": 5 }));
    assert!(f.notifier.notices().is_empty());
}

#[tokio::test]
async fn sentinel_code_over_the_wire_signs_admin_out() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/admin/lecturer/lectures/page"))
        .respond_with(envelope(11004, "Token invalidated", json!(null)))
        .mount(&server)
        .await;

    let f = fixture(&server.uri(), "/admin/students", &[(keys::ADMIN_TOKEN, "admin-token"), (keys::ADMIN_INFO, ADMIN_INFO)]);
    let err = f.client.send(ApiRequest::get("/admin/lecturer/lectures/page")).await.unwrap_err();

    assert!(err.is_unauthorized());
    assert!(f.storage.get(keys::ADMIN_TOKEN).is_none());
    assert!(f.storage.get(keys::ADMIN_INFO).is_none());
    assert_eq!(f.navigator.current_path(), "/admin/login");
}

#[tokio::test]
async fn http_401_clears_user_session() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/user/chat/history"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let f = fixture(&server.uri(), "/chat", &[
        (keys::USER_TOKEN, "user-token"),
        (keys::USER_INFO, r#"{"id":"2","displayName":"ada","role":"USER"}"#),
    ]);
    let err = f.client.send(ApiRequest::get("/user/chat/history")).await.unwrap_err();

    assert!(err.is_unauthorized());
    assert!(f.storage.get(keys::USER_TOKEN).is_none());
    assert_eq!(f.navigator.last_push().as_deref(), Some("/login"));
}

#[tokio::test]
async fn multipart_upload_is_form_data() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/admin/auth/uploadFile"))
        .and(header_regex("content-type", "^multipart/form-data; boundary="))
        .and(body_string_contains("name=\"file\"; filename=\"a.png\""))
        .respond_with(envelope(200, "success", json!("https://files.example.test/a.png")))
        .expect(1)
        .mount(&server)
        .await;

    let f = fixture(&server.uri(), "/admin/profile", &[(keys::ADMIN_TOKEN, "t"), (keys::ADMIN_INFO, ADMIN_INFO)]);
    let url = lectern::api::upload_file(&f.client, lectern::api::Upload::new("a.png", vec![137, 80, 78, 71])).await.unwrap();

    assert_eq!(url, json!("https://files.example.test/a.png"));
}

#[tokio::test]
async fn non_envelope_error_body_is_transport_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(502).set_body_string("<html>Bad Gateway</html>"))
        .mount(&server)
        .await;

    let f = fixture(&server.uri(), "/chat", &[]);
    let err = f.client.send(ApiRequest::get("/user/chat/history")).await.unwrap_err();

    assert_eq!(err, ApiError::Transport("HTTP 502".to_owned()));
    assert_eq!(f.notifier.errors().len(), 1);
}

#[tokio::test]
async fn slow_backend_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(envelope(200, "", json!(null)).set_delay(Duration::from_secs(3)))
        .mount(&server)
        .await;

    let transport = ReqwestTransport::new(server.uri(), Timeouts { request_secs: 1, connect_secs: 1 }).unwrap();
    let request = HttpRequest {
        method: Method::Get,
        path: "/user/chat/history".to_owned(),
        query: Vec::new(),
        headers: Vec::new(),
        body: lectern::net::Body::Empty,
    };

    assert_eq!(transport.execute(request).await.unwrap_err(), TransportError::Timeout);
}

#[tokio::test]
async fn unreachable_backend_is_a_network_error() {
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };

    let f = fixture(&format!("http://127.0.0.1:{port}"), "/chat", &[(keys::USER_TOKEN, "user-token")]);
    let err = f.client.send(ApiRequest::get("/user/chat/history")).await.unwrap_err();

    assert!(matches!(err, ApiError::Transport(_)));
    assert_eq!(f.notifier.errors(), vec![lectern::net::client::NETWORK_FAILURE_MESSAGE.to_owned()]);
    assert!(f.navigator.history().is_empty());
}
