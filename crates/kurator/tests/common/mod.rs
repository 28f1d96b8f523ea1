use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use image::{ImageBuffer, Rgb};

use kurator::generate::Sleeper;
use kurator::{DescriptionRecord, GenerationClient, GenerationError, ObjectWorkItem};

/// Writes `count` numbered photos for each object id into `dir`, using
/// the archive filename convention.
pub fn make_archive(dir: &Path, object_ids: &[&str], count: usize) -> Vec<PathBuf> {
    let mut paths = Vec::new();
    for object_id in object_ids {
        for i in 0..count {
            let path = dir.join(format!("{object_id}-000-{i:03}.jpg"));
            let img: ImageBuffer<Rgb<u8>, Vec<u8>> =
                ImageBuffer::from_pixel(16, 16, Rgb([100, 100, 100]));
            img.save(&path).unwrap();
            paths.push(path);
        }
    }
    paths
}

pub fn record_for(object_id: &str) -> DescriptionRecord {
    DescriptionRecord {
        object_id: object_id.to_string(),
        english: format!("Catalogue entry for {object_id}."),
        german: "not available".to_string(),
        polish: "not available".to_string(),
        french: "not available".to_string(),
        source_info: "not available".to_string(),
        technical_details: "not available".to_string(),
        historical_context: "not available".to_string(),
        conservation_notes: "not available".to_string(),
        exhibition_history: "not available".to_string(),
        bibliography: "not available".to_string(),
        generated_at: Utc::now(),
    }
}

/// Generation double: answers per object id from a script, defaulting
/// to success, and records the order of calls.
pub struct MockClient {
    failures: Mutex<HashMap<String, GenerationError>>,
    pub calls: Mutex<Vec<String>>,
}

impl MockClient {
    pub fn succeeding() -> Arc<Self> {
        Arc::new(Self {
            failures: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn failing_on(failures: Vec<(&str, GenerationError)>) -> Arc<Self> {
        Arc::new(Self {
            failures: Mutex::new(
                failures
                    .into_iter()
                    .map(|(id, e)| (id.to_string(), e))
                    .collect(),
            ),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn call_log(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl GenerationClient for MockClient {
    async fn generate(
        &self,
        item: &ObjectWorkItem,
    ) -> Result<DescriptionRecord, GenerationError> {
        self.calls.lock().unwrap().push(item.object_id.clone());
        if let Some(err) = self.failures.lock().unwrap().remove(&item.object_id) {
            return Err(err);
        }
        Ok(record_for(&item.object_id))
    }
}

/// Sleeper that records requested delays instead of waiting.
pub struct RecordingSleeper {
    pub delays: Mutex<Vec<Duration>>,
}

impl RecordingSleeper {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            delays: Mutex::new(Vec::new()),
        })
    }

    pub fn delay_count(&self) -> usize {
        self.delays.lock().unwrap().len()
    }
}

#[async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        self.delays.lock().unwrap().push(duration);
    }
}
