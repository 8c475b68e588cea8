//! # ecodms2paperless
//!
//! Migrates documents and their metadata from an EcoDMS XML export into a
//! Paperless-ngx instance via its REST API.
//!
//! The pipeline is strictly sequential: parse the export, project each
//! source document into an upload intent, skip documents the ledger already
//! records, resolve tag and document-type names to remote ids (creating
//! missing entries), upload the binary content as a multipart request, poll
//! the consumption task to a terminal state, and record completion in the
//! ledger so re-runs do not duplicate uploads.
//!
//! ```text
//! export.xml ──▶ ecodms ──▶ mapping ──▶ migrate ──▶ paperless ──▶ Paperless-ngx
//!                                      │       │
//!                                      ▼       ▼
//!                                   ledger  resolver
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | Environment configuration |
//! | [`ecodms`] | Export model and XML parser |
//! | [`mapping`] | Projection to upload intents |
//! | [`resolver`] | Name→id catalog resolution |
//! | [`paperless`] | Destination API trait and HTTP client |
//! | [`ledger`] | Idempotency ledger |
//! | [`migrate`] | Run orchestration |
//! | [`inspect`] | Offline export inspection |
//! | [`logging`] | Injected logging capability |
//! | [`error`] | Error taxonomy |

pub mod config;
pub mod ecodms;
pub mod error;
pub mod inspect;
pub mod ledger;
pub mod logging;
pub mod mapping;
pub mod migrate;
pub mod paperless;
pub mod resolver;
