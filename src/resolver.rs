//! Name→id resolution against the remote catalogs.

use std::collections::HashMap;

use crate::error::MigrationError;
use crate::logging::MigrationLog;
use crate::paperless::{CatalogKind, PaperlessApi};

/// Client-side cache of the two remote catalogs.
///
/// Each catalog is cached as a full name→id map and replaced wholesale after
/// any creation, so the cache matches server truth even when the server
/// normalizes or deduplicates names on its side.
pub struct AttributeResolver {
    tags: HashMap<String, i64>,
    document_types: HashMap<String, i64>,
}

impl AttributeResolver {
    /// Fetch both catalogs once. Names known at this point resolve with no
    /// further network calls.
    pub fn bootstrap(api: &dyn PaperlessApi) -> Result<Self, MigrationError> {
        Ok(Self {
            tags: fetch_catalog(api, CatalogKind::Tag)?,
            document_types: fetch_catalog(api, CatalogKind::DocumentType)?,
        })
    }

    /// Resolve `name` to its remote id, creating the entry if absent.
    ///
    /// On a cache miss: create once, refetch the entire catalog once, look
    /// up once. A second miss means the server did not surface the created
    /// entry and is surfaced as a creation failure rather than retried.
    pub fn resolve_or_create(
        &mut self,
        api: &dyn PaperlessApi,
        kind: CatalogKind,
        name: &str,
        log: &dyn MigrationLog,
    ) -> Result<i64, MigrationError> {
        if name.trim().is_empty() {
            return Err(MigrationError::EmptyCatalogName { kind });
        }

        if let Some(id) = self.cache(kind).get(name) {
            return Ok(*id);
        }

        log.info(&format!("creating {} '{}'", kind, name));
        api.create_catalog_entry(kind, name)?;
        *self.cache_mut(kind) = fetch_catalog(api, kind)?;

        self.cache(kind).get(name).copied().ok_or_else(|| {
            MigrationError::CatalogCreationFailure {
                kind,
                name: name.to_string(),
                detail: "entry missing after creation and refetch".to_string(),
            }
        })
    }

    fn cache(&self, kind: CatalogKind) -> &HashMap<String, i64> {
        match kind {
            CatalogKind::Tag => &self.tags,
            CatalogKind::DocumentType => &self.document_types,
        }
    }

    fn cache_mut(&mut self, kind: CatalogKind) -> &mut HashMap<String, i64> {
        match kind {
            CatalogKind::Tag => &mut self.tags,
            CatalogKind::DocumentType => &mut self.document_types,
        }
    }
}

fn fetch_catalog(
    api: &dyn PaperlessApi,
    kind: CatalogKind,
) -> Result<HashMap<String, i64>, MigrationError> {
    Ok(api
        .list_catalog(kind)?
        .into_iter()
        .map(|entry| (entry.name, entry.id))
        .collect())
}
