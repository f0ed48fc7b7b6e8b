use super::*;
use crate::net::{Body, TransportError};
use crate::notify::NoticeLevel;
use crate::routing::{self, GuardState, Navigator};
use crate::session::Role;
use crate::storage::{Storage, keys};
use crate::test_helpers::{Harness, admin_session, harness, jwt, user_session};
use serde_json::json;

fn user_store(h: &Harness) -> SessionStore {
    SessionStore::user(h.client.clone())
}

fn admin_store(h: &Harness) -> SessionStore {
    SessionStore::admin(h.client.clone())
}

fn user_token() -> String {
    jwt(&json!({ "userId": 42, "userName": "ada" }))
}

// =========================================================================
// login
// =========================================================================

#[tokio::test]
async fn login_success_stores_session_everywhere() {
    let h = harness("/login");
    let token = user_token();
    h.transport.push_envelope(200, "success", json!(token));

    assert!(user_store(&h).login(&Credentials::new("ada", "pw")).await);

    let identity = user_store(&h).current_identity().unwrap();
    assert_eq!(identity, Identity { id: "42".into(), display_name: "ada".into(), role: Role::User });
    assert_eq!(h.storage.get(keys::USER_TOKEN), Some(token.clone()));
    assert!(h.storage.get(keys::USER_INFO).unwrap().contains("\"displayName\":\"ada\""));
    assert_eq!(h.client.default_credential(), Some(token));

    let notices = h.notifier.notices();
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].level, NoticeLevel::Success);
}

#[tokio::test]
async fn login_posts_credentials_to_scope_endpoint() {
    let h = harness("/admin/login");
    h.transport.push_envelope(200, "", json!(jwt(&json!({ "adminId": 1, "adminName": "root", "adminRole": "SUPER_ADMIN" }))));

    assert!(admin_store(&h).login(&Credentials::new("root", "secret")).await);

    let request = h.transport.last_request();
    assert_eq!(request.path, "/admin/auth/login");
    assert_eq!(request.body, Body::Json(json!({ "userName": "root", "password": "secret" })));
    assert_eq!(h.storage.get(keys::ADMIN_INFO).map(|s| s.contains("SUPER_ADMIN")), Some(true));
    assert!(h.client.default_credential().is_none());
}

#[tokio::test]
async fn login_rejected_returns_false_and_keeps_previous_session() {
    let h = harness("/login");
    h.sign_in(Scope::User, user_session("old-token"));
    h.transport.push_envelope(10002, "wrong password", json!(null));

    assert!(!user_store(&h).login(&Credentials::new("ada", "bad")).await);

    assert_eq!(h.storage.get(keys::USER_TOKEN).as_deref(), Some("old-token"));
    assert_eq!(user_store(&h).current_identity().unwrap().display_name, "student");
    assert_eq!(h.notifier.errors(), vec!["wrong password".to_owned()]);
}

#[tokio::test]
async fn login_without_token_fails_with_one_notice() {
    let h = harness("/login");
    h.transport.push_envelope(200, "success", json!(null));

    let err = user_store(&h).login_detailed(&Credentials::new("ada", "pw")).await.unwrap_err();

    assert!(matches!(err, LoginError::MissingToken));
    assert!(!user_store(&h).is_authenticated());
    assert_eq!(h.notifier.errors(), vec!["Login failed: no token returned".to_owned()]);
}

#[tokio::test]
async fn login_with_undecodable_token_fails() {
    let h = harness("/login");
    h.transport.push_envelope(200, "success", json!("not-a-jwt"));

    let err = user_store(&h).login_detailed(&Credentials::new("ada", "pw")).await.unwrap_err();

    assert!(matches!(err, LoginError::Token(TokenError::Malformed)));
    assert!(h.storage.is_empty());
    assert_eq!(h.notifier.notices().len(), 1);
}

#[tokio::test]
async fn admin_login_requires_role_claim() {
    let h = harness("/admin/login");
    h.transport.push_envelope(200, "", json!(jwt(&json!({ "adminId": 1, "adminName": "root" }))));

    assert!(!admin_store(&h).login(&Credentials::new("root", "pw")).await);
    assert!(!admin_store(&h).is_authenticated());
}

#[tokio::test]
async fn login_network_failure_returns_false_after_notice() {
    let h = harness("/login");
    h.transport.push(Err(TransportError::Connect("refused".into())));

    assert!(!user_store(&h).login(&Credentials::new("ada", "pw")).await);

    assert_eq!(h.notifier.errors(), vec![crate::net::client::NETWORK_FAILURE_MESSAGE.to_owned()]);
    assert!(!user_store(&h).is_authenticated());
}

#[tokio::test]
async fn login_answered_with_401_keeps_previous_session() {
    let h = harness("/login");
    h.sign_in(Scope::User, user_session("old-token"));
    h.client.set_default_credential(Some("old-token".into()));
    h.transport.push_status(401, "");

    assert!(!user_store(&h).login(&Credentials::new("ada", "bad")).await);

    assert_eq!(h.storage.get(keys::USER_TOKEN).as_deref(), Some("old-token"));
    assert!(user_store(&h).is_authenticated());
    assert_eq!(h.client.default_credential().as_deref(), Some("old-token"));
    assert!(h.navigator.history().is_empty());
    assert_eq!(h.notifier.errors(), vec![LOGIN_FAILED.to_owned()]);
}

#[tokio::test]
async fn sentinel_on_user_login_signs_admin_out() {
    let h = harness("/admin/lectures");
    h.sign_in(Scope::Admin, admin_session("admin-token", Role::Lecturer));
    h.sign_in(Scope::User, user_session("user-token"));
    h.transport.push_envelope(11004, "Token invalidated", json!(null));

    assert!(!user_store(&h).login(&Credentials::new("ada", "pw")).await);

    assert!(h.storage.get(keys::ADMIN_TOKEN).is_none());
    assert!(!admin_store(&h).is_authenticated());
    assert_eq!(h.storage.get(keys::USER_TOKEN).as_deref(), Some("user-token"));
    assert_eq!(h.navigator.last_push().as_deref(), Some(routing::ADMIN_LOGIN));
    assert_eq!(h.notifier.errors(), vec!["Token invalidated".to_owned()]);
}

// =========================================================================
// register
// =========================================================================

#[tokio::test]
async fn register_success_does_not_sign_in() {
    let h = harness("/login");
    h.transport.push_envelope(200, "success", json!(null));

    let form = Registration::new("ada", "pw").with_field("email", "ada@example.test");
    assert!(user_store(&h).register(&form).await);

    let request = h.transport.last_request();
    assert_eq!(request.path, "/user/auth/register");
    assert_eq!(
        request.body,
        Body::Json(json!({ "userName": "ada", "password": "pw", "email": "ada@example.test" }))
    );
    assert!(!user_store(&h).is_authenticated());
    assert_eq!(h.notifier.notices()[0].message, "Registration successful");
}

#[tokio::test]
async fn register_failure_returns_false() {
    let h = harness("/login");
    h.transport.push_envelope(10010, "", json!(null));

    assert!(!user_store(&h).register(&Registration::new("ada", "pw")).await);
    assert_eq!(h.notifier.errors(), vec!["Registration failed".to_owned()]);
}

#[tokio::test]
async fn admin_scope_has_no_registration() {
    let h = harness("/admin/login");

    assert!(!admin_store(&h).register(&Registration::new("x", "y")).await);
    assert!(h.transport.requests().is_empty());
    assert_eq!(h.notifier.notices().len(), 1);
}

// =========================================================================
// logout
// =========================================================================

#[test]
fn logout_clears_and_navigates_once() {
    let h = harness("/chat");
    h.sign_in(Scope::User, user_session("user-token"));
    h.client.set_default_credential(Some("user-token".into()));
    let store = user_store(&h);

    store.logout();
    assert!(!store.is_authenticated());
    assert!(store.current_identity().is_none());
    assert!(h.storage.get(keys::USER_TOKEN).is_none());
    assert!(h.client.default_credential().is_none());
    assert_eq!(h.navigator.history(), vec!["/login".to_owned()]);

    store.logout();
    assert_eq!(h.navigator.history(), vec!["/login".to_owned()]);
}

#[test]
fn admin_logout_leaves_user_session() {
    let h = harness("/admin/lectures");
    h.sign_in(Scope::User, user_session("user-token"));
    h.sign_in(Scope::Admin, admin_session("admin-token", Role::Lecturer));

    admin_store(&h).logout();

    assert!(user_store(&h).is_authenticated());
    assert!(!admin_store(&h).is_authenticated());
    assert_eq!(h.navigator.current_path(), "/admin/login");
}

#[test]
fn logout_then_authenticated_route_redirects_to_login() {
    let h = harness("/chat");
    h.sign_in(Scope::User, user_session("user-token"));
    user_store(&h).logout();

    let landed = routing::navigate_guarded(&*h.navigator, h.sessions(), "/chat");
    assert_eq!(landed, "/login");
    assert_eq!(
        routing::decide("/chat", &GuardState::from_sessions(h.sessions())),
        routing::Decision::Redirect("/login".into())
    );
}

// =========================================================================
// Hydration
// =========================================================================

#[tokio::test]
async fn store_sees_session_restored_at_start_up() {
    let first = harness("/login");
    first.transport.push_envelope(200, "success", json!(user_token()));
    assert!(user_store(&first).login(&Credentials::new("ada", "pw")).await);

    let second = crate::test_helpers::harness_with_storage("/", first.storage.clone());
    assert!(user_store(&second).is_authenticated());
    assert_eq!(second.client.default_credential(), Some(user_token()));
}
