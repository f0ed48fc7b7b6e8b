//! Typed console endpoints.
//!
//! Each function builds one [`ApiRequest`](crate::net::ApiRequest), sends it
//! through a shared [`ApiClient`](crate::net::ApiClient) and decodes `data`.
//! Failures have already been shown to the user by the client; callers only
//! decide what to do next.

pub mod admin;
pub mod knowledge;
pub mod lectures;


use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

pub use admin::{AdminProfile, admin_detail, update_admin_profile, upload_file};
pub use knowledge::{
    KnowledgeDoc, KnowledgeDocForm, create_knowledge_doc, delete_knowledge_doc, knowledge_doc_detail,
    knowledge_doc_page, update_knowledge_doc,
};
pub use lectures::{
    Lecture, LectureForm, check_lecture, create_lecture, delete_lecture, lecture_page, recreate_lecture,
    update_lecture,
};

use crate::error::ApiError;
use crate::net::client::DEFAULT_FAILURE_MESSAGE;
use crate::net::{ApiClient, Part};
use crate::notify::Notice;

const DEFAULT_PAGE_SIZE: u32 = 10;

/// Paging parameters shared by every `.../page` endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageQuery {
    pub page_num: u32,
    pub page_size: u32,
    /// Endpoint-specific filters, sent verbatim.
    pub filters: BTreeMap<String, String>,
}

impl Default for PageQuery {
    fn default() -> Self {
        Self { page_num: 1, page_size: DEFAULT_PAGE_SIZE, filters: BTreeMap::new() }
    }
}

impl PageQuery {
    #[must_use]
    pub fn new(page_num: u32, page_size: u32) -> Self {
        Self { page_num: page_num.max(1), page_size: page_size.max(1), filters: BTreeMap::new() }
    }

    #[must_use]
    pub fn filter(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.filters.insert(key.into(), value.to_string());
        self
    }

    /// Query-string pairs, paging first.
    #[must_use]
    pub fn to_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = vec![
            ("pageNum".to_owned(), self.page_num.to_string()),
            ("pageSize".to_owned(), self.page_size.to_string()),
        ];
        pairs.extend(self.filters.iter().map(|(k, v)| (k.clone(), v.clone())));
        pairs
    }
}

/// One page of results.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    #[serde(default = "Vec::new", alias = "list", alias = "rows")]
    pub records: Vec<T>,
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub size: u64,
    #[serde(default, alias = "pageNum")]
    pub current: u64,
    #[serde(default)]
    pub pages: u64,
}

/// A file to send as the `file` part of a multi-part request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Upload {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl Upload {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        let file_name = file_name.into();
        let content_type = guess_content_type(&file_name).to_owned();
        Self { file_name, content_type, bytes }
    }

    /// Read `path` from disk.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Config`] if the file cannot be read.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ApiError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|e| ApiError::Config(format!("{}: {e}", path.display())))?;
        let file_name = path.file_name().map_or_else(|| "upload".to_owned(), |n| n.to_string_lossy().into_owned());
        Ok(Self::new(file_name, bytes))
    }

    pub(crate) fn into_part(self, name: &str) -> Part {
        Part::file(name, self.file_name, self.content_type, self.bytes)
    }
}

/// Content type from the file extension; unknown types are sent as octet-stream.
#[must_use]
pub fn guess_content_type(file_name: &str) -> &'static str {
    let ext = file_name.rsplit_once('.').map(|(_, ext)| ext.to_ascii_lowercase()).unwrap_or_default();
    match ext.as_str() {
        "pdf" => "application/pdf",
        "txt" => "text/plain",
        "md" => "text/markdown",
        "json" => "application/json",
        "doc" => "application/msword",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "ppt" => "application/vnd.ms-powerpoint",
        "pptx" => "application/vnd.openxmlformats-officedocument.presentationml.presentation",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        _ => "application/octet-stream",
    }
}

/// Decode a success `data` payload into `T`. A payload of the wrong shape
/// gets the same notice as an unreadable envelope.
pub(crate) fn decode_data<T: DeserializeOwned>(client: &ApiClient, path: &str, data: Value) -> Result<T, ApiError> {
    serde_json::from_value(data).map_err(|e| {
        tracing::warn!(%path, error = %e, "unexpected response data");
        client.notifier().notify(Notice::error(DEFAULT_FAILURE_MESSAGE));
        ApiError::Transport(format!("unexpected response data from {path}: {e}"))
    })
}
