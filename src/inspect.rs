//! Offline inspection of an export file.
//!
//! Parses the export and prints the projected destination metadata for
//! every document. No network, no ledger, no uploads.

use anyhow::{Context, Result};
use std::path::Path;

use crate::ecodms;
use crate::mapping;

pub fn run_inspect(export_file: &Path) -> Result<()> {
    let xml = std::fs::read_to_string(export_file)
        .with_context(|| format!("Failed to read export file: {}", export_file.display()))?;
    let export = ecodms::parse_export(&xml)?;
    let export_dir = export_file.parent().unwrap_or_else(|| Path::new("."));

    println!("export {}", export_file.display());
    println!("  user: {}", export.user);
    println!("  id range: {}..{}", export.start_id, export.end_id);
    println!("  documents: {}", export.documents.len());
    println!();
    println!(
        "{:<8} {:<32} {:<20} {:>6} {:<4} STATUS",
        "DOCID", "TITLE", "TYPE", "ASN", "TAX"
    );

    for doc in &export.documents {
        match mapping::project(doc, export_dir) {
            Ok(intent) => {
                println!(
                    "{:<8} {:<32} {:<20} {:>6} {:<4} ok",
                    doc.docid,
                    intent.title.as_deref().unwrap_or("-"),
                    intent.document_type.as_deref().unwrap_or("-"),
                    intent
                        .archive_serial_number
                        .map(|n| n.to_string())
                        .unwrap_or_else(|| "-".to_string()),
                    if intent.tax_relevant { "yes" } else { "no" },
                );
            }
            Err(e) => {
                println!(
                    "{:<8} {:<32} {:<20} {:>6} {:<4} {}",
                    doc.docid, "-", "-", "-", "-", e
                );
            }
        }
    }

    Ok(())
}
