//! Projection of one source document into one upload intent.
//!
//! Pure, no I/O. The first version of the first classification record is the
//! authoritative metadata; a document without a file, classification record,
//! or version cannot be migrated and is a data-quality error, never a
//! silent default.

use std::path::{Path, PathBuf};

use crate::ecodms::SourceDocument;
use crate::error::MigrationError;

/// Sentinel the export writes for an unset running number.
const RUNNING_NUMBER_NULL: &str = "null";

/// Tax-relevance codes that map to a tax-relevant document.
const TAX_RELEVANT_CODES: [&str; 2] = ["0", "2"];

/// Everything needed to upload one document to the destination server.
///
/// String metadata is carried verbatim from the source, including absence;
/// the destination accepts free-form date strings, so `created` is not
/// parsed or validated here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentIntent {
    /// Absolute path of the binary content to upload.
    pub file_path: PathBuf,
    pub title: Option<String>,
    pub created: Option<String>,
    pub folder: Option<String>,
    pub document_type: Option<String>,
    pub archive_serial_number: Option<i64>,
    pub tax_relevant: bool,
}

/// Project a source document into a [`DocumentIntent`].
///
/// `export_dir` is the directory containing the export file; it anchors the
/// file paths in the export, which are relative to it.
pub fn project(doc: &SourceDocument, export_dir: &Path) -> Result<DocumentIntent, MigrationError> {
    let incomplete = |reason: &str| MigrationError::IncompleteSource {
        docid: doc.docid.clone(),
        reason: reason.to_string(),
    };

    let file = doc.files.first().ok_or_else(|| incomplete("no files"))?;
    let record = doc
        .classifications
        .first()
        .ok_or_else(|| incomplete("no classification records"))?;
    let version = record
        .versions
        .first()
        .ok_or_else(|| incomplete("no versions"))?;

    Ok(DocumentIntent {
        file_path: export_dir.join(&file.file_path),
        title: version.note.clone(),
        created: version.created.clone(),
        folder: version.parent_folder.clone(),
        document_type: version.document_kind.clone(),
        archive_serial_number: parse_running_number(
            &doc.docid,
            version.running_number.as_deref(),
        )?,
        tax_relevant: is_tax_relevant(version.tax_code.as_deref()),
    })
}

/// The running number is stored as a decimal string ("7.0"); parse as a
/// float and truncate. The literal "null" means absent.
fn parse_running_number(
    docid: &str,
    value: Option<&str>,
) -> Result<Option<i64>, MigrationError> {
    match value {
        None => Ok(None),
        Some(RUNNING_NUMBER_NULL) => Ok(None),
        Some(raw) => match raw.trim().parse::<f64>() {
            Ok(number) => Ok(Some(number as i64)),
            Err(_) => Err(MigrationError::InvalidRunningNumber {
                docid: docid.to_string(),
                value: raw.to_string(),
            }),
        },
    }
}

fn is_tax_relevant(code: Option<&str>) -> bool {
    matches!(code, Some(c) if TAX_RELEVANT_CODES.contains(&c))
}
