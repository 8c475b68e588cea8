//! Idempotency ledger of already-migrated source files.
//!
//! A flat JSON object mapping source file path → ISO-8601 completion
//! timestamp. The backing file is read in full on every check and rewritten
//! in full on every update; fine at migration-run scale, not built for
//! write volume. A missing file is an empty ledger (first run); any other
//! read or write failure is a [`MigrationError::LedgerIo`].

use std::collections::BTreeMap;
use std::path::PathBuf;

use chrono::{DateTime, Utc};

use crate::error::MigrationError;

pub struct Ledger {
    path: PathBuf,
}

impl Ledger {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// True when no completed migration is recorded for `file_path`.
    pub fn is_new(&self, file_path: &str) -> Result<bool, MigrationError> {
        Ok(!self.load()?.contains_key(file_path))
    }

    /// Record a completed migration, overwriting any prior entry for the
    /// same path.
    pub fn record_completed(
        &self,
        file_path: &str,
        completed_at: DateTime<Utc>,
    ) -> Result<(), MigrationError> {
        let mut entries = self.load()?;
        entries.insert(file_path.to_string(), completed_at.to_rfc3339());

        let json = serde_json::to_string_pretty(&entries)
            .map_err(|e| MigrationError::LedgerIo(e.to_string()))?;
        std::fs::write(&self.path, json).map_err(|e| {
            MigrationError::LedgerIo(format!("writing {}: {}", self.path.display(), e))
        })?;
        Ok(())
    }

    fn load(&self) -> Result<BTreeMap<String, String>, MigrationError> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(e) => {
                return Err(MigrationError::LedgerIo(format!(
                    "reading {}: {}",
                    self.path.display(),
                    e
                )))
            }
        };
        serde_json::from_str(&content).map_err(|e| {
            MigrationError::LedgerIo(format!("parsing {}: {}", self.path.display(), e))
        })
    }
}
