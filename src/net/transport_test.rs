use super::*;
use serde_json::json;

#[test]
fn join_url_handles_slashes() {
    assert_eq!(join_url("http://h:7816", "/admin/auth/detail"), "http://h:7816/admin/auth/detail");
    assert_eq!(join_url("http://h:7816/", "/user/auth/login"), "http://h:7816/user/auth/login");
    assert_eq!(join_url("http://h:7816", "user/auth/login"), "http://h:7816/user/auth/login");
}

#[test]
fn method_names() {
    assert_eq!(Method::Get.as_str(), "GET");
    assert_eq!(Method::Delete.as_str(), "DELETE");
    assert_eq!(Method::Put.to_reqwest(), reqwest::Method::PUT);
}

#[test]
fn json_part_encodes_value() {
    let part = Part::json("dto", &json!({ "title": "Intro" })).unwrap();
    assert_eq!(part.name, "dto");
    assert!(part.file_name.is_none());
    assert_eq!(part.content_type, "application/json");
    assert_eq!(serde_json::from_slice::<Value>(&part.bytes).unwrap(), json!({ "title": "Intro" }));
}

#[test]
fn header_lookup_is_case_insensitive() {
    let request = HttpRequest {
        method: Method::Get,
        path: "/x".into(),
        query: Vec::new(),
        headers: vec![("Authorization".into(), "Bearer t".into())],
        body: Body::Empty,
    };
    assert_eq!(request.header("authorization"), Some("Bearer t"));
    assert_eq!(request.header("cookie"), None);
}

#[test]
fn response_success_range() {
    assert!(HttpResponse { status: 200, body: Vec::new() }.is_success());
    assert!(HttpResponse { status: 204, body: Vec::new() }.is_success());
    assert!(!HttpResponse { status: 401, body: Vec::new() }.is_success());
}

#[test]
fn multipart_form_rejects_bad_content_type() {
    let parts = vec![Part::file("file", "a.pdf", "not a mime type", vec![1, 2, 3])];
    let err = multipart_form(parts).unwrap_err();
    assert!(matches!(err, TransportError::Build(msg) if msg.contains("file")));
}

#[test]
fn reqwest_transport_trims_base_url() {
    let transport = ReqwestTransport::new("http://localhost:7816/", Timeouts::default()).unwrap();
    assert_eq!(transport.base_url(), "http://localhost:7816");
    assert_eq!(transport.url_for("/admin/auth/detail"), "http://localhost:7816/admin/auth/detail");
}
