//! Object metadata lookup.
//!
//! The collection database exports one or more tables keyed by object
//! number. `MetadataSource` keeps the storage format behind a narrow
//! read-only interface so the pipeline never depends on it directly.

pub mod source;

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use source::{normalize_object_id, JsonMetadataSource, MetadataSource};

/// Marker for fields the collection database does not provide. The
/// generation prompt requires this exact phrase so the model can tell
/// absent facts apart from empty strings.
pub const NOT_AVAILABLE: &str = "not available";

fn not_available() -> String {
    NOT_AVAILABLE.to_string()
}

#[derive(Error, Debug)]
pub enum MetadataError {
    #[error("Failed to read metadata table '{path}': {source}")]
    ReadTable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse metadata table '{path}': {source}")]
    ParseTable {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Descriptive fields attached to one museum object. Absent fields hold
/// [`NOT_AVAILABLE`], never an empty string, so every prompt placeholder
/// always resolves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectMetadata {
    #[serde(default = "not_available")]
    pub inventory_no: String,
    #[serde(default = "not_available")]
    pub contributors: String,
    #[serde(default = "not_available")]
    pub materials: String,
    #[serde(default = "not_available")]
    pub dimensions: String,
    #[serde(default = "not_available")]
    pub location: String,
    #[serde(default = "not_available")]
    pub location_description: String,
    #[serde(default = "not_available")]
    pub object_name: String,
    #[serde(default = "not_available")]
    pub year_of_manufacture: String,
}

impl Default for ObjectMetadata {
    fn default() -> Self {
        Self {
            inventory_no: not_available(),
            contributors: not_available(),
            materials: not_available(),
            dimensions: not_available(),
            location: not_available(),
            location_description: not_available(),
            object_name: not_available(),
            year_of_manufacture: not_available(),
        }
    }
}

impl ObjectMetadata {
    /// Metadata for an object that has no table row. The inventory number
    /// falls back to the object id so catalogue entries stay addressable.
    pub fn for_object(object_id: &str) -> Self {
        Self {
            inventory_no: object_id.to_string(),
            ..Self::default()
        }
    }

    /// Fills every still-missing field from `other`. Earlier tables keep
    /// priority; `other` only contributes where this row has no data.
    pub fn merge_missing_from(&mut self, other: &ObjectMetadata) {
        for (mine, theirs) in [
            (&mut self.inventory_no, &other.inventory_no),
            (&mut self.contributors, &other.contributors),
            (&mut self.materials, &other.materials),
            (&mut self.dimensions, &other.dimensions),
            (&mut self.location, &other.location),
            (&mut self.location_description, &other.location_description),
            (&mut self.object_name, &other.object_name),
            (&mut self.year_of_manufacture, &other.year_of_manufacture),
        ] {
            if mine == NOT_AVAILABLE && theirs != NOT_AVAILABLE {
                *mine = theirs.clone();
            }
        }
    }

    /// Prompt placeholder names paired with their values, in the order
    /// the catalogue template lists them.
    pub fn placeholder_fields(&self) -> [(&'static str, &str); 8] {
        [
            ("InventoryNo", self.inventory_no.as_str()),
            ("Contributors", self.contributors.as_str()),
            ("Materials", self.materials.as_str()),
            ("Dimensions", self.dimensions.as_str()),
            ("Location", self.location.as_str()),
            ("LocationDescription", self.location_description.as_str()),
            ("DetailedObjectName", self.object_name.as_str()),
            ("YearOfManufacture", self.year_of_manufacture.as_str()),
        ]
    }

    /// Normalizes a raw table cell: trimmed non-empty text passes through,
    /// everything else becomes the explicit marker.
    pub(crate) fn clean_field(raw: Option<&str>) -> String {
        match raw {
            Some(s) if !s.trim().is_empty() => s.trim().to_string(),
            _ => not_available(),
        }
    }
}
