//! Signed-in admin's own profile.

#[cfg(test)]
#[path = "admin_test.rs"]
mod admin_test;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{Upload, decode_data};
use crate::error::ApiError;
use crate::net::{ApiClient, ApiRequest};
use crate::session::Role;

pub const DETAIL: &str = "/admin/auth/detail";
pub const UPDATE: &str = "/admin/auth/update";
pub const UPLOAD_FILE: &str = "/admin/auth/uploadFile";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminProfile {
    #[serde(alias = "adminId", deserialize_with = "crate::session::deserialize_id")]
    pub id: String,
    #[serde(alias = "adminName", alias = "userName", default)]
    pub name: String,
    #[serde(alias = "adminRole", default)]
    pub role: Option<Role>,
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// # Errors
///
/// Returns [`ApiError`] if the request fails or the profile does not decode.
pub async fn admin_detail(client: &ApiClient) -> Result<AdminProfile, ApiError> {
    let data = client.send(ApiRequest::get(DETAIL)).await?;
    decode_data(client, DETAIL, data)
}

/// Save profile fields. Only the fields present in `changes` are sent.
///
/// # Errors
///
/// Returns [`ApiError`] if the request fails.
pub async fn update_admin_profile(client: &ApiClient, changes: &Map<String, Value>) -> Result<Value, ApiError> {
    client.send(ApiRequest::post(UPDATE).json(changes)).await
}

/// Upload a file (avatar, attachment) and return whatever the backend
/// answers with, usually the stored URL.
///
/// # Errors
///
/// Returns [`ApiError`] if the request fails.
pub async fn upload_file(client: &ApiClient, file: Upload) -> Result<Value, ApiError> {
    client.send(ApiRequest::post(UPLOAD_FILE).multipart(vec![file.into_part("file")])).await
}
