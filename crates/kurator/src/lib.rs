//! Batch generation of museum catalogue descriptions.
//!
//! One invocation scans the photo archive, joins the collection metadata,
//! skips objects that already have a description and sends a capped batch
//! of the rest to a vision-capable chat model, committing each finished
//! record before the next request.

pub mod config;
pub mod enumerate;
pub mod error;
pub mod generate;
pub mod metadata;
pub mod pipeline;
pub mod store;

pub use config::{load_config, Config};
pub use enumerate::{ArchiveScanner, ObjectWorkItem};
pub use error::{ConfigError, KuratorError, Result};
pub use generate::{GenerationClient, GenerationError, OpenAiClient};
pub use metadata::{JsonMetadataSource, MetadataSource, ObjectMetadata};
pub use pipeline::{BatchRunner, PipelineError, RunSummary};
pub use store::{DescriptionRecord, DescriptionStore, JsonlDescriptionStore};
