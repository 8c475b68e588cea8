//! Destination-server API: catalog listing and creation, multipart document
//! upload, and consumption-task status.
//!
//! [`PaperlessApi`] is the seam between the pipeline and the network; the
//! pipeline and its tests run against any implementation, while
//! [`PaperlessClient`] is the `reqwest::blocking` one used by the binary.

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::error::MigrationError;

/// Request timeout for every call, uploads included.
const HTTP_TIMEOUT_SECS: u64 = 120;

/// The two remote catalogs resolved by name.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum CatalogKind {
    Tag,
    DocumentType,
}

impl CatalogKind {
    /// URL path segment under the API base.
    pub fn path(&self) -> &'static str {
        match self {
            CatalogKind::Tag => "tags",
            CatalogKind::DocumentType => "document_types",
        }
    }
}

impl std::fmt::Display for CatalogKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            CatalogKind::Tag => "tag",
            CatalogKind::DocumentType => "document type",
        })
    }
}

/// One entry of a remote catalog.
#[derive(Debug, Clone, Deserialize)]
pub struct CatalogEntry {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Deserialize)]
struct CatalogPage {
    results: Vec<CatalogEntry>,
}

#[derive(Debug, Deserialize)]
struct TaskInfo {
    status: String,
}

/// State of a consumption task.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TaskStatus {
    Pending,
    Success,
    Failure,
}

impl TaskStatus {
    /// Any status string other than the two terminal ones counts as pending.
    pub fn parse(status: &str) -> TaskStatus {
        match status {
            "SUCCESS" => TaskStatus::Success,
            "FAILURE" => TaskStatus::Failure,
            _ => TaskStatus::Pending,
        }
    }
}

/// Metadata accompanying one document upload.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadPayload {
    pub title: Option<String>,
    pub created: Option<String>,
    pub tags: Vec<i64>,
    pub document_type: Option<i64>,
    pub archive_serial_number: Option<i64>,
}

impl UploadPayload {
    /// The multipart form fields for this payload.
    ///
    /// Absent and falsy values (empty strings, a zero serial number) are
    /// omitted entirely rather than sent as null; `tags` repeats once per
    /// id.
    pub fn form_fields(&self) -> Vec<(&'static str, String)> {
        let mut fields = Vec::new();
        if let Some(title) = self.title.as_deref().filter(|t| !t.is_empty()) {
            fields.push(("title", title.to_string()));
        }
        if let Some(created) = self.created.as_deref().filter(|c| !c.is_empty()) {
            fields.push(("created", created.to_string()));
        }
        for id in &self.tags {
            fields.push(("tags", id.to_string()));
        }
        if let Some(id) = self.document_type {
            fields.push(("document_type", id.to_string()));
        }
        if let Some(asn) = self.archive_serial_number.filter(|n| *n != 0) {
            fields.push(("archive_serial_number", asn.to_string()));
        }
        fields
    }
}

/// Operations the pipeline needs from the destination server.
pub trait PaperlessApi {
    /// Fetch the full catalog of the given kind.
    fn list_catalog(&self, kind: CatalogKind) -> Result<Vec<CatalogEntry>, MigrationError>;

    /// Create a catalog entry by name. Anything but a created status is a
    /// [`MigrationError::CatalogCreationFailure`].
    fn create_catalog_entry(&self, kind: CatalogKind, name: &str) -> Result<(), MigrationError>;

    /// Upload one document; returns the opaque consumption-task id.
    fn upload_document(
        &self,
        file_path: &Path,
        payload: &UploadPayload,
    ) -> Result<String, MigrationError>;

    /// Fetch the current status of a consumption task.
    fn task_status(&self, task_id: &str) -> Result<TaskStatus, MigrationError>;
}

/// HTTP implementation over `reqwest::blocking`.
///
/// Every request carries an `Authorization: Token …` header. The base URL is
/// stored without a trailing slash.
pub struct PaperlessClient {
    base_url: String,
    client: reqwest::blocking::Client,
}

impl PaperlessClient {
    pub fn new(api_url: &str, token: &str) -> Result<Self, MigrationError> {
        let mut auth = reqwest::header::HeaderValue::from_str(&format!("Token {}", token))
            .map_err(|e| MigrationError::Network(format!("API token is not a valid header value: {}", e)))?;
        auth.set_sensitive(true);

        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(reqwest::header::AUTHORIZATION, auth);

        let client = reqwest::blocking::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(HTTP_TIMEOUT_SECS))
            .build()
            .map_err(net)?;

        Ok(Self {
            base_url: api_url.trim_end_matches('/').to_string(),
            client,
        })
    }
}

impl PaperlessApi for PaperlessClient {
    fn list_catalog(&self, kind: CatalogKind) -> Result<Vec<CatalogEntry>, MigrationError> {
        let url = format!("{}/{}/", self.base_url, kind.path());
        let response = self.client.get(&url).send().map_err(net)?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(MigrationError::Network(format!(
                "listing {}s failed: {} {}",
                kind, status, body
            )));
        }
        let page: CatalogPage = response.json().map_err(net)?;
        Ok(page.results)
    }

    fn create_catalog_entry(&self, kind: CatalogKind, name: &str) -> Result<(), MigrationError> {
        let url = format!("{}/{}/", self.base_url, kind.path());
        let response = self
            .client
            .post(&url)
            .json(&serde_json::json!({ "name": name }))
            .send()
            .map_err(net)?;
        let status = response.status();
        if status != reqwest::StatusCode::CREATED {
            let body = response.text().unwrap_or_default();
            return Err(MigrationError::CatalogCreationFailure {
                kind,
                name: name.to_string(),
                detail: format!("{} {}", status, body),
            });
        }
        Ok(())
    }

    fn upload_document(
        &self,
        file_path: &Path,
        payload: &UploadPayload,
    ) -> Result<String, MigrationError> {
        let url = format!("{}/documents/post_document/", self.base_url);

        let mut form = reqwest::blocking::multipart::Form::new()
            .file("document", file_path)
            .map_err(|e| MigrationError::SourceFileUnreadable {
                path: file_path.display().to_string(),
                detail: e.to_string(),
            })?;
        for (name, value) in payload.form_fields() {
            form = form.text(name, value);
        }

        let response = self.client.post(&url).multipart(form).send().map_err(net)?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(MigrationError::UploadRejected {
                status: status.as_u16(),
                body,
            });
        }

        // The response body is the task id as a JSON string.
        let task_id: String = response.json().map_err(net)?;
        Ok(task_id)
    }

    fn task_status(&self, task_id: &str) -> Result<TaskStatus, MigrationError> {
        let url = format!("{}/tasks/", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[("task_id", task_id)])
            .send()
            .map_err(net)?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(MigrationError::Network(format!(
                "fetching status of task {} failed: {} {}",
                task_id, status, body
            )));
        }

        let tasks: Vec<TaskInfo> = response.json().map_err(net)?;
        // An empty list means the server has not registered the task yet.
        Ok(tasks
            .first()
            .map(|t| TaskStatus::parse(&t.status))
            .unwrap_or(TaskStatus::Pending))
    }
}

fn net(e: reqwest::Error) -> MigrationError {
    MigrationError::Network(e.to_string())
}
