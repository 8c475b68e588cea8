//! Error taxonomy for the migration pipeline.
//!
//! Errors come in two scopes. *Fatal* kinds unwind the whole run: a
//! malformed export, a rejected catalog creation, a transport failure, or a
//! ledger write failure. *Document-level* kinds are caught at the
//! per-document boundary in [`migrate`](crate::migrate), logged with the
//! source path and remote detail, and do not stop subsequent documents.
//! [`MigrationError::is_fatal`] encodes the split.

use crate::paperless::CatalogKind;

#[derive(Debug)]
pub enum MigrationError {
    /// Required structure or attribute missing from the export XML.
    MalformedSource(String),
    /// A document lacks the file, classification record, or version needed
    /// to derive destination metadata.
    IncompleteSource { docid: String, reason: String },
    /// The running-number field is neither the "null" sentinel nor a number.
    InvalidRunningNumber { docid: String, value: String },
    /// A catalog name is empty or whitespace-only.
    EmptyCatalogName { kind: CatalogKind },
    /// The server rejected a tag/document-type creation, or the created
    /// entry was still missing after a full refetch.
    CatalogCreationFailure {
        kind: CatalogKind,
        name: String,
        detail: String,
    },
    /// The source file for one document could not be read for upload.
    SourceFileUnreadable { path: String, detail: String },
    /// Non-success status from the upload endpoint.
    UploadRejected { status: u16, body: String },
    /// The consumption task reported FAILURE.
    TaskFailure { task_id: String },
    /// The consumption task did not reach a terminal state within the poll
    /// bound.
    TaskTimedOut { task_id: String, attempts: u32 },
    /// Transport-level failure talking to the destination server.
    Network(String),
    /// The ledger backing file could not be read or written.
    LedgerIo(String),
}

impl MigrationError {
    /// Whether this error aborts the whole run rather than one document.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            MigrationError::MalformedSource(_)
                | MigrationError::CatalogCreationFailure { .. }
                | MigrationError::Network(_)
                | MigrationError::LedgerIo(_)
        )
    }
}

impl std::fmt::Display for MigrationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MigrationError::MalformedSource(detail) => {
                write!(f, "malformed export: {}", detail)
            }
            MigrationError::IncompleteSource { docid, reason } => {
                write!(f, "document {} cannot be migrated: {}", docid, reason)
            }
            MigrationError::InvalidRunningNumber { docid, value } => {
                write!(f, "document {} has an invalid running number '{}'", docid, value)
            }
            MigrationError::EmptyCatalogName { kind } => {
                write!(f, "refusing to resolve an empty {} name", kind)
            }
            MigrationError::CatalogCreationFailure { kind, name, detail } => {
                write!(f, "creating {} '{}' failed: {}", kind, name, detail)
            }
            MigrationError::SourceFileUnreadable { path, detail } => {
                write!(f, "cannot read source file {}: {}", path, detail)
            }
            MigrationError::UploadRejected { status, body } => {
                write!(f, "upload rejected with status {}: {}", status, body)
            }
            MigrationError::TaskFailure { task_id } => {
                write!(f, "consumption task {} reported FAILURE", task_id)
            }
            MigrationError::TaskTimedOut { task_id, attempts } => {
                write!(
                    f,
                    "consumption task {} still not terminal after {} polls",
                    task_id, attempts
                )
            }
            MigrationError::Network(detail) => write!(f, "network error: {}", detail),
            MigrationError::LedgerIo(detail) => write!(f, "ledger I/O error: {}", detail),
        }
    }
}

impl std::error::Error for MigrationError {}
