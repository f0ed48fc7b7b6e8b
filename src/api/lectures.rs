//! Lecture endpoints.
//!
//! Lecturers create, edit, delete and resubmit their own lectures; a super
//! admin reviews them. The page endpoint differs by role, so it is chosen
//! from the stored admin identity on every call.

#[cfg(test)]
#[path = "lectures_test.rs"]
mod lectures_test;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{Page, PageQuery, decode_data};
use crate::error::ApiError;
use crate::net::{ApiClient, ApiRequest};
use crate::session::{Role, Scope};

pub const CREATE: &str = "/admin/lecturer/lectures/create";
pub const UPDATE: &str = "/admin/lecturer/lectures/update";
pub const DELETE: &str = "/admin/lecturer/lectures/delete";
pub const RECREATE: &str = "/admin/lecturer/lectures/recreate";
pub const LECTURER_PAGE: &str = "/admin/lecturer/lectures/page";
pub const SUPER_ADMIN_PAGE: &str = "/admin/superAdmin/lectures/page";
pub const CHECK: &str = "/admin/superAdmin/lectures/check";

/// A lecture as listed by the page endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lecture {
    pub id: i64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub capacity: Option<i64>,
    #[serde(default)]
    pub status: Option<i64>,
    /// Everything else the backend returns.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Body of create, update and recreate.
///
/// `id` and `capacity` always go out as JSON numbers.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct LectureForm {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub capacity: i64,
    #[serde(flatten)]
    pub details: Map<String, Value>,
}

impl LectureForm {
    #[must_use]
    pub fn new(capacity: i64) -> Self {
        Self { capacity, ..Self::default() }
    }

    #[must_use]
    pub fn with_id(mut self, id: i64) -> Self {
        self.id = Some(id);
        self
    }

    #[must_use]
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.details.insert(key.into(), value.into());
        self
    }
}

/// # Errors
///
/// Returns [`ApiError`] if the request fails.
pub async fn create_lecture(client: &ApiClient, form: &LectureForm) -> Result<Value, ApiError> {
    client.send(ApiRequest::post(CREATE).json(form)).await
}

/// Update an existing lecture. The form must carry its id.
///
/// # Errors
///
/// Returns [`ApiError::Config`] without dispatching when `form.id` is unset,
/// otherwise any request failure.
pub async fn update_lecture(client: &ApiClient, form: &LectureForm) -> Result<Value, ApiError> {
    let mut request = ApiRequest::put(UPDATE).json(form);
    if form.id.is_none() {
        request = request.reject("lecture update needs an id");
    }
    client.send(request).await
}

/// Resubmit a rejected lecture for review.
///
/// # Errors
///
/// Returns [`ApiError`] if the request fails.
pub async fn recreate_lecture(client: &ApiClient, form: &LectureForm) -> Result<Value, ApiError> {
    client.send(ApiRequest::post(RECREATE).json(form)).await
}

/// Page endpoint for whoever is signed in to the console.
#[must_use]
pub fn page_endpoint(client: &ApiClient) -> &'static str {
    let role = client.sessions().identity(Scope::Admin).map(|identity| identity.role);
    if role == Some(Role::SuperAdmin) { SUPER_ADMIN_PAGE } else { LECTURER_PAGE }
}

/// # Errors
///
/// Returns [`ApiError`] if the request fails or the page does not decode.
pub async fn lecture_page(client: &ApiClient, query: &PageQuery) -> Result<Page<Lecture>, ApiError> {
    let path = page_endpoint(client);
    let data = client.send(ApiRequest::get(path).query_pairs(query.to_pairs())).await?;
    decode_data(client, path, data)
}

/// # Errors
///
/// Returns [`ApiError`] if the request fails.
pub async fn delete_lecture(client: &ApiClient, id: i64) -> Result<Value, ApiError> {
    client.send(ApiRequest::delete(DELETE).query("id", id)).await
}

/// Approve or reject a lecture (super admin).
///
/// # Errors
///
/// Returns [`ApiError`] if the request fails.
pub async fn check_lecture(client: &ApiClient, id: i64, status: i64) -> Result<Value, ApiError> {
    client.send(ApiRequest::put(CHECK).query("id", id).query("status", status)).await
}
