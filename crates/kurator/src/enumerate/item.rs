use std::path::PathBuf;

use crate::metadata::ObjectMetadata;

/// One unit of work for the batch runner: an object with its selected
/// photos and a metadata snapshot taken at enumeration time.
///
/// Work items are rebuilt from the archive on every run and never
/// persisted. An item always carries at least one image; objects without
/// images are dropped during enumeration.
#[derive(Debug, Clone)]
pub struct ObjectWorkItem {
    pub object_id: String,
    /// Selected photos, numerically ordered, capped at the configured
    /// per-object maximum.
    pub image_paths: Vec<PathBuf>,
    pub metadata: ObjectMetadata,
}
