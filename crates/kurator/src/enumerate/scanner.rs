use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use log::{debug, info, warn};
use regex::Regex;
use walkdir::WalkDir;

use crate::enumerate::item::ObjectWorkItem;
use crate::metadata::ObjectMetadata;

/// Image extensions accepted by the archive scan (case-insensitive).
const ALLOWED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "tif", "tiff", "bmp"];

/// Sort key rank for filenames without a parseable numeric suffix; they
/// sort after every numbered photo.
const UNNUMBERED: u32 = u32::MAX;

static RE_OBJECT_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+)-(\d{4})-(\d{4})").unwrap());
static RE_SUFFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+-\d{4}-\d{4}-(\d{3})-(\d{3})").unwrap());

/// Scans the image archive and groups photos into per-object work items.
///
/// Photo filenames follow the convention
/// `<collection>-<year>-<number>-<series>-<index>.<ext>`, e.g.
/// `1-1997-0457-000-002.jpg`. The first three blocks identify the
/// object; the last two give the numeric photo order.
pub struct ArchiveScanner {
    input_directories: Vec<PathBuf>,
    max_images_per_object: usize,
}

impl ArchiveScanner {
    pub fn new<P: AsRef<Path>>(
        input_directories: impl IntoIterator<Item = P>,
        max_images_per_object: usize,
    ) -> Self {
        Self {
            input_directories: input_directories
                .into_iter()
                .map(|p| p.as_ref().to_path_buf())
                .collect(),
            max_images_per_object,
        }
    }

    /// Enumerates work items in ascending object-id order. Deterministic
    /// for unchanged archive contents, which keeps batch boundaries
    /// reproducible across runs.
    pub fn scan(&self, metadata: &HashMap<String, ObjectMetadata>) -> Vec<ObjectWorkItem> {
        let mut groups: BTreeMap<String, Vec<PathBuf>> = BTreeMap::new();

        for root in &self.input_directories {
            if !root.exists() {
                warn!("Input directory not found, skipping: {}", root.display());
                continue;
            }

            for entry in WalkDir::new(root)
                .min_depth(1)
                .into_iter()
                .filter_map(|e| e.ok())
            {
                let path = entry.path();
                if !path.is_file() || !has_allowed_extension(path) {
                    continue;
                }

                let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                    continue;
                };

                if let Some(object_id) = extract_object_id(name) {
                    groups.entry(object_id).or_default().push(path.to_path_buf());
                }
            }
        }

        let mut items = Vec::with_capacity(groups.len());
        for (object_id, paths) in groups {
            let mut paths = dedupe_by_filename(paths);
            paths.sort_by(|a, b| suffix_key(a).cmp(&suffix_key(b)));

            if paths.len() > self.max_images_per_object {
                debug!(
                    "Object {}: keeping first {} of {} images",
                    object_id,
                    self.max_images_per_object,
                    paths.len()
                );
                paths.truncate(self.max_images_per_object);
            }

            let metadata = metadata
                .get(&object_id)
                .cloned()
                .unwrap_or_else(|| ObjectMetadata::for_object(&object_id));

            items.push(ObjectWorkItem {
                object_id,
                image_paths: paths,
                metadata,
            });
        }

        // Objects listed in the metadata but absent from the archive are
        // excluded from the run, not treated as a failure.
        let found: HashSet<&str> = items.iter().map(|i| i.object_id.as_str()).collect();
        for object_id in metadata.keys() {
            if !found.contains(object_id.as_str()) {
                warn!(
                    "Object {} listed in metadata but no matching images found",
                    object_id
                );
            }
        }

        info!(
            "Enumerated {} objects across {} input directories",
            items.len(),
            self.input_directories.len()
        );

        items
    }

}

/// Extracts the object id (first three filename blocks) or `None`
/// for files outside the naming convention.
fn extract_object_id(filename: &str) -> Option<String> {
    let caps = RE_OBJECT_ID.captures(filename)?;
    Some(format!("{}-{}-{}", &caps[1], &caps[2], &caps[3]))
}

/// Numeric sort key from the `-SSS-III` suffix blocks. Files without
/// the suffix fall back to lexicographic order after all numbered ones.
fn suffix_key(path: &Path) -> (u32, u32, String) {
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or_default();

    if let Some(caps) = RE_SUFFIX.captures(stem) {
        let series = caps[1].parse().unwrap_or(UNNUMBERED);
        let index = caps[2].parse().unwrap_or(UNNUMBERED);
        return (series, index, stem.to_lowercase());
    }

    (UNNUMBERED, UNNUMBERED, stem.to_lowercase())
}

fn has_allowed_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| ALLOWED_EXTENSIONS.contains(&e.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// Drops files whose name (case-insensitive) was already seen. The same
/// photo can be exported into more than one archive directory.
fn dedupe_by_filename(paths: Vec<PathBuf>) -> Vec<PathBuf> {
    let mut seen = HashSet::new();
    paths
        .into_iter()
        .filter(|p| {
            p.file_name()
                .and_then(|n| n.to_str())
                .map(|n| seen.insert(n.to_lowercase()))
                .unwrap_or(false)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn touch(dir: &Path, name: &str) {
        std::fs::write(dir.join(name), b"img").unwrap();
    }

    fn scan(dir: &Path, max: usize) -> Vec<ObjectWorkItem> {
        ArchiveScanner::new([dir], max).scan(&HashMap::new())
    }

    #[test]
    fn test_scan_empty_directory() {
        let tmp = TempDir::new().unwrap();
        assert!(scan(tmp.path(), 5).is_empty());
    }

    #[test]
    fn test_groups_by_object_id() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "1-1997-0457-000-000.jpg");
        touch(tmp.path(), "1-1997-0457-000-001.jpg");
        touch(tmp.path(), "1-2024-0501-000-000.png");

        let items = scan(tmp.path(), 5);
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].object_id, "1-1997-0457");
        assert_eq!(items[0].image_paths.len(), 2);
        assert_eq!(items[1].object_id, "1-2024-0501");
    }

    #[test]
    fn test_ignores_files_outside_convention() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "notes.txt");
        touch(tmp.path(), "thumbnail.jpg");
        touch(tmp.path(), "1-1997-0457-000-000.jpg");

        let items = scan(tmp.path(), 5);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].image_paths.len(), 1);
    }

    #[test]
    fn test_image_cap_keeps_lowest_numbered_in_order() {
        let tmp = TempDir::new().unwrap();
        // Eight candidates, written out of order.
        for index in [5, 1, 7, 0, 3, 2, 6, 4] {
            touch(tmp.path(), &format!("1-1997-0457-000-{:03}.jpg", index));
        }

        let items = scan(tmp.path(), 5);
        let names: Vec<String> = items[0]
            .image_paths
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();

        assert_eq!(
            names,
            vec![
                "1-1997-0457-000-000.jpg",
                "1-1997-0457-000-001.jpg",
                "1-1997-0457-000-002.jpg",
                "1-1997-0457-000-003.jpg",
                "1-1997-0457-000-004.jpg",
            ]
        );
    }

    #[test]
    fn test_series_block_sorts_before_index_block() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "1-1997-0457-001-000.jpg");
        touch(tmp.path(), "1-1997-0457-000-002.jpg");

        let items = scan(tmp.path(), 5);
        let first = items[0].image_paths[0].file_name().unwrap().to_string_lossy().into_owned();
        assert_eq!(first, "1-1997-0457-000-002.jpg");
    }

    #[test]
    fn test_unnumbered_files_sort_last() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "1-1997-0457.jpg");
        touch(tmp.path(), "1-1997-0457-000-001.jpg");

        let items = scan(tmp.path(), 5);
        let last = items[0].image_paths[1].file_name().unwrap().to_string_lossy().into_owned();
        assert_eq!(last, "1-1997-0457.jpg");
    }

    #[test]
    fn test_duplicate_filenames_across_directories_are_dropped() {
        let tmp = TempDir::new().unwrap();
        let a = tmp.path().join("a");
        let b = tmp.path().join("b");
        std::fs::create_dir_all(&a).unwrap();
        std::fs::create_dir_all(&b).unwrap();
        touch(&a, "1-1997-0457-000-000.jpg");
        touch(&b, "1-1997-0457-000-000.JPG");
        touch(&b, "1-1997-0457-000-001.jpg");

        let items = ArchiveScanner::new([&a, &b], 5).scan(&HashMap::new());
        assert_eq!(items[0].image_paths.len(), 2);
    }

    #[test]
    fn test_deterministic_across_scans() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "1-2024-0501-000-000.jpg");
        touch(tmp.path(), "1-1997-0457-000-001.jpg");
        touch(tmp.path(), "1-1997-0457-000-000.jpg");

        let scanner = ArchiveScanner::new([tmp.path()], 5);
        let first: Vec<_> = scanner
            .scan(&HashMap::new())
            .into_iter()
            .map(|i| (i.object_id, i.image_paths))
            .collect();
        let second: Vec<_> = scanner
            .scan(&HashMap::new())
            .into_iter()
            .map(|i| (i.object_id, i.image_paths))
            .collect();

        assert_eq!(first, second);
    }

    #[test]
    fn test_metadata_snapshot_attached() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "1-1997-0457-000-000.jpg");

        let mut metadata = HashMap::new();
        metadata.insert(
            "1-1997-0457".to_string(),
            ObjectMetadata {
                materials: "painted steel".to_string(),
                ..ObjectMetadata::default()
            },
        );

        let items = ArchiveScanner::new([tmp.path()], 5).scan(&metadata);
        assert_eq!(items[0].metadata.materials, "painted steel");
    }

    #[test]
    fn test_object_without_metadata_gets_id_as_inventory_no() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "1-1997-0457-000-000.jpg");

        let items = scan(tmp.path(), 5);
        assert_eq!(items[0].metadata.inventory_no, "1-1997-0457");
    }

    #[test]
    fn test_missing_input_directory_is_skipped() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "1-1997-0457-000-000.jpg");
        let missing = tmp.path().join("absent");

        let items = ArchiveScanner::new([tmp.path(), missing.as_path()], 5).scan(&HashMap::new());
        assert_eq!(items.len(), 1);
    }
}
