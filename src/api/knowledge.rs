//! Knowledge-base documents (super admin only).
//!
//! Creation is multi-part: a `dto` part holding the document fields as JSON
//! and a `file` part holding the document itself.

#[cfg(test)]
#[path = "knowledge_test.rs"]
mod knowledge_test;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{Page, PageQuery, Upload, decode_data};
use crate::error::ApiError;
use crate::net::{ApiClient, ApiRequest, Part};

pub const CREATE: &str = "/admin/superAdmin/knowledgeDoc/create";
pub const UPDATE: &str = "/admin/superAdmin/knowledgeDoc/update";
pub const DELETE: &str = "/admin/superAdmin/knowledgeDoc/delete";
pub const DETAIL: &str = "/admin/superAdmin/knowledgeDoc/detail";
pub const PAGE: &str = "/admin/superAdmin/knowledgeDoc/page";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KnowledgeDoc {
    pub id: i64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub resource_url: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Document fields sent on create (as the `dto` part) and update.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct KnowledgeDocForm {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl KnowledgeDocForm {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_id(mut self, id: i64) -> Self {
        self.id = Some(id);
        self
    }

    #[must_use]
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }
}

/// Upload a new document.
///
/// # Errors
///
/// Returns [`ApiError`] if the form does not encode or the request fails.
pub async fn create_knowledge_doc(
    client: &ApiClient,
    form: &KnowledgeDocForm,
    file: Upload,
) -> Result<Value, ApiError> {
    let request = match serde_json::to_value(form).and_then(|dto| Part::json("dto", &dto)) {
        Ok(dto) => ApiRequest::post(CREATE).multipart(vec![dto, file.into_part("file")]),
        Err(e) => ApiRequest::post(CREATE).reject(format!("dto encode failed: {e}")),
    };
    client.send(request).await
}

/// # Errors
///
/// Returns [`ApiError`] if the request fails.
pub async fn update_knowledge_doc(client: &ApiClient, form: &KnowledgeDocForm) -> Result<Value, ApiError> {
    client.send(ApiRequest::put(UPDATE).json(form)).await
}

/// Delete a document and its stored file.
///
/// # Errors
///
/// Returns [`ApiError`] if the request fails.
pub async fn delete_knowledge_doc(client: &ApiClient, id: i64, resource_url: &str) -> Result<Value, ApiError> {
    client.send(ApiRequest::delete(DELETE).query("id", id).query("resourceUrl", resource_url)).await
}

/// # Errors
///
/// Returns [`ApiError`] if the request fails or the document does not decode.
pub async fn knowledge_doc_detail(client: &ApiClient, id: i64) -> Result<KnowledgeDoc, ApiError> {
    let data = client.send(ApiRequest::get(DETAIL).query("id", id)).await?;
    decode_data(client, DETAIL, data)
}

/// # Errors
///
/// Returns [`ApiError`] if the request fails or the page does not decode.
pub async fn knowledge_doc_page(client: &ApiClient, query: &PageQuery) -> Result<Page<KnowledgeDoc>, ApiError> {
    let data = client.send(ApiRequest::get(PAGE).query_pairs(query.to_pairs())).await?;
    decode_data(client, PAGE, data)
}
