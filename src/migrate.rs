//! Migration run orchestration.
//!
//! Coordinates the full flow for every document in export order: project →
//! ledger check → resolve names → upload → poll the consumption task →
//! record completion. Strictly sequential; the only blocking operations are
//! the network calls and the fixed-interval sleep in the polling loop.
//! Document-level failures are logged and counted, fatal errors unwind the
//! whole run (see [`MigrationError::is_fatal`]).

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Utc;

use crate::config::Config;
use crate::ecodms::{self, Export, SourceDocument};
use crate::error::MigrationError;
use crate::ledger::Ledger;
use crate::logging::MigrationLog;
use crate::mapping::{self, DocumentIntent};
use crate::paperless::{CatalogKind, PaperlessApi, PaperlessClient, TaskStatus, UploadPayload};
use crate::resolver::AttributeResolver;

/// Tag applied to every migrated document, marking its origin system.
pub const SOURCE_MARKER_TAG: &str = "EcoDMS";
/// Tag applied to documents whose tax-relevance code maps to true.
pub const TAX_RELEVANT_TAG: &str = "Steuerrelevant";

/// Knobs for one migration run.
pub struct MigrationOptions {
    /// Parse, map, and consult the ledger, but perform no network calls and
    /// write nothing.
    pub dry_run: bool,
    /// Process at most this many documents, in export order.
    pub limit: Option<usize>,
    /// Pause between consumption-task polls.
    pub poll_interval: Duration,
    /// Polls per task before giving up with [`MigrationError::TaskTimedOut`].
    pub poll_max_attempts: u32,
}

/// Counters accumulated over one run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct MigrationReport {
    /// Documents considered (after `--limit`).
    pub documents: usize,
    pub uploaded: usize,
    pub already_migrated: usize,
    /// Dry-run only: documents that would have been uploaded.
    pub planned: usize,
    pub failed: usize,
}

enum Outcome {
    Uploaded,
    AlreadyMigrated,
    Planned,
}

/// Entry point for the CLI: read the export, connect, migrate, report.
pub fn run(config: &Config, opts: &MigrationOptions, log: &dyn MigrationLog) -> Result<()> {
    let xml = std::fs::read_to_string(&config.export_file)
        .with_context(|| format!("Failed to read export file: {}", config.export_file.display()))?;
    let export = ecodms::parse_export(&xml)?;

    // The export's own location anchors every relative file path.
    let export_dir = config
        .export_file
        .parent()
        .unwrap_or_else(|| Path::new("."))
        .to_path_buf();

    let client = PaperlessClient::new(&config.api_url, &config.api_token)?;
    let ledger = Ledger::new(&config.ledger_path);

    let report = migrate_export(&export, &export_dir, &client, &ledger, log, opts)?;

    println!(
        "migrate {}{}",
        config.export_file.display(),
        if opts.dry_run { " (dry-run)" } else { "" }
    );
    println!("  documents: {}", report.documents);
    if opts.dry_run {
        println!("  would upload: {}", report.planned);
    } else {
        println!("  uploaded: {}", report.uploaded);
    }
    println!("  already migrated: {}", report.already_migrated);
    println!("  failed: {}", report.failed);
    println!("ok");

    Ok(())
}

/// Migrate every document of a parsed export through the given API.
pub fn migrate_export(
    export: &Export,
    export_dir: &Path,
    api: &dyn PaperlessApi,
    ledger: &Ledger,
    log: &dyn MigrationLog,
    opts: &MigrationOptions,
) -> Result<MigrationReport, MigrationError> {
    let count = opts
        .limit
        .unwrap_or(export.documents.len())
        .min(export.documents.len());
    let docs = &export.documents[..count];

    let mut report = MigrationReport {
        documents: docs.len(),
        ..MigrationReport::default()
    };

    if opts.dry_run {
        for doc in docs {
            record_outcome(
                plan_document(doc, export_dir, ledger, log),
                doc,
                log,
                &mut report,
            )?;
        }
        return Ok(report);
    }

    let mut resolver = AttributeResolver::bootstrap(api)?;
    for doc in docs {
        record_outcome(
            migrate_document(doc, export_dir, api, &mut resolver, ledger, log, opts),
            doc,
            log,
            &mut report,
        )?;
    }
    Ok(report)
}

fn record_outcome(
    outcome: Result<Outcome, MigrationError>,
    doc: &SourceDocument,
    log: &dyn MigrationLog,
    report: &mut MigrationReport,
) -> Result<(), MigrationError> {
    match outcome {
        Ok(Outcome::Uploaded) => report.uploaded += 1,
        Ok(Outcome::AlreadyMigrated) => report.already_migrated += 1,
        Ok(Outcome::Planned) => report.planned += 1,
        Err(e) if e.is_fatal() => return Err(e),
        Err(e) => {
            log.warn(&format!("document {} failed: {}", doc.docid, e));
            report.failed += 1;
        }
    }
    Ok(())
}

fn plan_document(
    doc: &SourceDocument,
    export_dir: &Path,
    ledger: &Ledger,
    log: &dyn MigrationLog,
) -> Result<Outcome, MigrationError> {
    let intent = mapping::project(doc, export_dir)?;
    let path_key = intent.file_path.display().to_string();
    if !ledger.is_new(&path_key)? {
        log.info(&format!("skipping {} (already migrated)", path_key));
        return Ok(Outcome::AlreadyMigrated);
    }
    log.info(&format!(
        "would upload {} (title: {}, type: {}, asn: {}, tax relevant: {})",
        path_key,
        intent.title.as_deref().unwrap_or("-"),
        intent.document_type.as_deref().unwrap_or("-"),
        intent
            .archive_serial_number
            .map(|n| n.to_string())
            .unwrap_or_else(|| "-".to_string()),
        intent.tax_relevant,
    ));
    Ok(Outcome::Planned)
}

fn migrate_document(
    doc: &SourceDocument,
    export_dir: &Path,
    api: &dyn PaperlessApi,
    resolver: &mut AttributeResolver,
    ledger: &Ledger,
    log: &dyn MigrationLog,
    opts: &MigrationOptions,
) -> Result<Outcome, MigrationError> {
    let intent = mapping::project(doc, export_dir)?;
    let path_key = intent.file_path.display().to_string();

    if !ledger.is_new(&path_key)? {
        log.info(&format!("skipping {} (already migrated)", path_key));
        return Ok(Outcome::AlreadyMigrated);
    }

    let payload = build_payload(&intent, api, resolver, log)?;

    log.info(&format!("uploading {}", path_key));
    let task_id = api.upload_document(&intent.file_path, &payload)?;

    wait_for_task(api, &task_id, opts)?;

    ledger.record_completed(&path_key, Utc::now())?;
    log.info(&format!("migrated {} (task {})", path_key, task_id));
    Ok(Outcome::Uploaded)
}

/// Resolve every name on the intent to remote ids and assemble the payload.
///
/// Tag ids accumulate in resolution order (folder, source marker, tax
/// marker) without deduplication; the destination tolerates list-form tag
/// assignment.
fn build_payload(
    intent: &DocumentIntent,
    api: &dyn PaperlessApi,
    resolver: &mut AttributeResolver,
    log: &dyn MigrationLog,
) -> Result<UploadPayload, MigrationError> {
    let mut tags = Vec::new();
    if let Some(folder) = &intent.folder {
        tags.push(resolver.resolve_or_create(api, CatalogKind::Tag, folder, log)?);
    }
    tags.push(resolver.resolve_or_create(api, CatalogKind::Tag, SOURCE_MARKER_TAG, log)?);
    if intent.tax_relevant {
        tags.push(resolver.resolve_or_create(api, CatalogKind::Tag, TAX_RELEVANT_TAG, log)?);
    }

    let document_type = match &intent.document_type {
        Some(name) => {
            Some(resolver.resolve_or_create(api, CatalogKind::DocumentType, name, log)?)
        }
        None => None,
    };

    Ok(UploadPayload {
        title: intent.title.clone(),
        created: intent.created.clone(),
        tags,
        document_type,
        archive_serial_number: intent.archive_serial_number,
    })
}

/// Poll the consumption task until it reaches a terminal state.
fn wait_for_task(
    api: &dyn PaperlessApi,
    task_id: &str,
    opts: &MigrationOptions,
) -> Result<(), MigrationError> {
    for attempt in 1..=opts.poll_max_attempts {
        match api.task_status(task_id)? {
            TaskStatus::Success => return Ok(()),
            TaskStatus::Failure => {
                return Err(MigrationError::TaskFailure {
                    task_id: task_id.to_string(),
                })
            }
            TaskStatus::Pending => {
                if attempt < opts.poll_max_attempts {
                    std::thread::sleep(opts.poll_interval);
                }
            }
        }
    }
    Err(MigrationError::TaskTimedOut {
        task_id: task_id.to_string(),
        attempts: opts.poll_max_attempts,
    })
}
