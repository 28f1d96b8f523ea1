//! Batch orchestration: walks the pending work items, calls the
//! generation client and commits each finished record before moving on.

pub mod runner;

use thiserror::Error;

use crate::store::StoreError;

pub use runner::{BatchRunner, RunSummary};

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Failed to determine completed objects: {0}")]
    CompletedIds(#[source] StoreError),

    /// A generated description could not be persisted. Continuing would
    /// silently drop paid-for work, so the run stops here.
    #[error("Failed to persist record for object {object_id}: {source}")]
    Persist {
        object_id: String,
        #[source]
        source: StoreError,
    },
}
