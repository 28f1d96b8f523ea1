//! Persistent catalogue of generated descriptions.
//!
//! The store is the pipeline's only durable state: which objects are
//! done is derived from the records it holds, never tracked separately.
//! `DescriptionStore` hides the storage format behind a narrow interface.

pub mod jsonl;

use std::collections::HashSet;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use jsonl::JsonlDescriptionStore;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Failed to read descriptions table '{path}': {source}")]
    ReadTable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to create directory '{path}': {source}")]
    CreateDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to append record for object {object_id}: {source}")]
    AppendRecord {
        object_id: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize record for object {object_id}: {source}")]
    SerializeRecord {
        object_id: String,
        #[source]
        source: serde_json::Error,
    },
}

/// One finished catalogue entry. Every content field is populated;
/// sections the model could not fill hold the explicit "not available"
/// marker instead of being omitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DescriptionRecord {
    pub object_id: String,
    pub english: String,
    pub german: String,
    pub polish: String,
    pub french: String,
    pub source_info: String,
    pub technical_details: String,
    pub historical_context: String,
    pub conservation_notes: String,
    pub exhibition_history: String,
    pub bibliography: String,
    pub generated_at: DateTime<Utc>,
}

/// Append-only description storage shared between the runner and the
/// resume check.
pub trait DescriptionStore: Send + Sync {
    /// Ids of objects that already have a record. Read once at the start
    /// of a run.
    fn completed_ids(&self) -> Result<HashSet<String>, StoreError>;

    /// Persists one record. Must be durable before the runner moves on
    /// to the next object.
    fn append(&self, record: &DescriptionRecord) -> Result<(), StoreError>;
}
