use std::collections::HashSet;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use log::{debug, warn};

use super::{DescriptionRecord, DescriptionStore, StoreError};

/// Description store backed by a JSON Lines file, one record per line.
///
/// Appending a line is the commit point for an object. A crash can at
/// worst truncate the final line; recovery skips that line and the
/// object is simply regenerated on the next run.
pub struct JsonlDescriptionStore {
    path: PathBuf,
}

impl JsonlDescriptionStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl DescriptionStore for JsonlDescriptionStore {
    fn completed_ids(&self) -> Result<HashSet<String>, StoreError> {
        if !self.path.exists() {
            debug!(
                "Descriptions table {} does not exist yet, starting fresh",
                self.path.display()
            );
            return Ok(HashSet::new());
        }

        let content =
            std::fs::read_to_string(&self.path).map_err(|e| StoreError::ReadTable {
                path: self.path.clone(),
                source: e,
            })?;

        let mut ids = HashSet::new();
        for (line_no, line) in content.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<DescriptionRecord>(line) {
                Ok(record) => {
                    ids.insert(record.object_id);
                }
                Err(e) => {
                    warn!(
                        "Skipping corrupt record at {}:{}: {}",
                        self.path.display(),
                        line_no + 1,
                        e
                    );
                }
            }
        }

        debug!("Loaded {} completed object ids", ids.len());
        Ok(ids)
    }

    fn append(&self, record: &DescriptionRecord) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|e| StoreError::CreateDirectory {
                    path: parent.to_path_buf(),
                    source: e,
                })?;
            }
        }

        let line =
            serde_json::to_string(record).map_err(|e| StoreError::SerializeRecord {
                object_id: record.object_id.clone(),
                source: e,
            })?;

        let append_err = |e: std::io::Error| StoreError::AppendRecord {
            object_id: record.object_id.clone(),
            source: e,
        };

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(append_err)?;

        file.write_all(line.as_bytes()).map_err(append_err)?;
        file.write_all(b"\n").map_err(append_err)?;
        file.flush().map_err(append_err)?;

        Ok(())
    }
}
