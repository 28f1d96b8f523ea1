use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use log::{debug, warn};
use regex::Regex;
use serde::Deserialize;

use super::{MetadataError, ObjectMetadata, NOT_AVAILABLE};

static RE_OBJECT_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(\d+)[/-](\d{4})[/-](\d{4})").unwrap());

/// Read-only access to the collection metadata, keyed by normalized
/// object id.
pub trait MetadataSource {
    fn read_all(&self) -> Result<HashMap<String, ObjectMetadata>, MetadataError>;
}

/// Raw table row as exported from the collection database. The object
/// number keeps its export format, e.g. `"1/1997/1063 0"`.
#[derive(Debug, Deserialize)]
struct MetadataRow {
    object_number: String,
    #[serde(default)]
    inventory_no: Option<String>,
    #[serde(default)]
    contributors: Option<String>,
    #[serde(default)]
    materials: Option<String>,
    #[serde(default)]
    dimensions: Option<String>,
    #[serde(default)]
    location: Option<String>,
    #[serde(default)]
    location_description: Option<String>,
    #[serde(default)]
    object_name: Option<String>,
    #[serde(default)]
    year_of_manufacture: Option<String>,
}

/// Extracts the three-block object id from an export cell, accepting
/// both slash and dash separators: `"1/1997/1063 0"` and `"1-1997-1063"`
/// normalize to `"1-1997-1063"`.
pub fn normalize_object_id(raw: &str) -> Option<String> {
    let caps = RE_OBJECT_NUMBER.captures(raw)?;
    Some(format!("{}-{}-{}", &caps[1], &caps[2], &caps[3]))
}

/// Metadata source backed by JSON tables. Tables are merged in the order
/// given; the first table providing a field for an object wins.
pub struct JsonMetadataSource {
    tables: Vec<PathBuf>,
}

impl JsonMetadataSource {
    pub fn new<P: AsRef<Path>>(tables: impl IntoIterator<Item = P>) -> Self {
        Self {
            tables: tables
                .into_iter()
                .map(|p| p.as_ref().to_path_buf())
                .collect(),
        }
    }

    fn read_table(path: &Path) -> Result<Vec<MetadataRow>, MetadataError> {
        let content = std::fs::read_to_string(path).map_err(|e| MetadataError::ReadTable {
            path: path.to_path_buf(),
            source: e,
        })?;

        serde_json::from_str(&content).map_err(|e| MetadataError::ParseTable {
            path: path.to_path_buf(),
            source: e,
        })
    }
}

impl MetadataSource for JsonMetadataSource {
    fn read_all(&self) -> Result<HashMap<String, ObjectMetadata>, MetadataError> {
        let mut mapping: HashMap<String, ObjectMetadata> = HashMap::new();

        for path in &self.tables {
            if !path.exists() {
                warn!("Metadata table not found, skipping: {}", path.display());
                continue;
            }

            let rows = Self::read_table(path)?;
            debug!("Read {} metadata rows from {}", rows.len(), path.display());

            for row in rows {
                let Some(object_id) = normalize_object_id(&row.object_number) else {
                    warn!(
                        "Skipping metadata row with unparseable object number '{}' in {}",
                        row.object_number,
                        path.display()
                    );
                    continue;
                };

                let entry = ObjectMetadata {
                    inventory_no: ObjectMetadata::clean_field(row.inventory_no.as_deref()),
                    contributors: ObjectMetadata::clean_field(row.contributors.as_deref()),
                    materials: ObjectMetadata::clean_field(row.materials.as_deref()),
                    dimensions: ObjectMetadata::clean_field(row.dimensions.as_deref()),
                    location: ObjectMetadata::clean_field(row.location.as_deref()),
                    location_description: ObjectMetadata::clean_field(
                        row.location_description.as_deref(),
                    ),
                    object_name: ObjectMetadata::clean_field(row.object_name.as_deref()),
                    year_of_manufacture: ObjectMetadata::clean_field(
                        row.year_of_manufacture.as_deref(),
                    ),
                };

                mapping
                    .entry(object_id)
                    .and_modify(|existing| existing.merge_missing_from(&entry))
                    .or_insert(entry);
            }
        }

        // Entries without an inventory number stay addressable via their id.
        for (object_id, meta) in mapping.iter_mut() {
            if meta.inventory_no == NOT_AVAILABLE {
                meta.inventory_no = object_id.clone();
            }
        }

        Ok(mapping)
    }
}
