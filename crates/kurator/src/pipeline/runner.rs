use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::enumerate::ObjectWorkItem;
use crate::generate::{GenerationClient, Sleeper, TokioSleeper};
use crate::store::DescriptionStore;

use super::PipelineError;

/// Outcome counts for one invocation.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunSummary {
    /// Objects attempted in this run.
    pub processed: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// Objects skipped because a record already existed.
    pub skipped: usize,
    /// Pending objects left for future runs after the batch limit.
    pub remaining: usize,
    /// Set when a fatal generation error stopped the run early.
    pub aborted: Option<String>,
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} processed ({} ok, {} failed), {} already done, {} remaining",
            self.processed, self.succeeded, self.failed, self.skipped, self.remaining
        )?;
        if let Some(reason) = &self.aborted {
            write!(f, ", aborted: {reason}")?;
        }
        Ok(())
    }
}

/// Drives one batch: filters out completed objects, caps the batch,
/// then generates and persists record by record.
///
/// Each append is the commit point for its object. An interrupt between
/// objects loses nothing; re-running resumes behind the last committed
/// record.
pub struct BatchRunner {
    client: Arc<dyn GenerationClient>,
    store: Arc<dyn DescriptionStore>,
    sleeper: Arc<dyn Sleeper>,
    batch_size: usize,
    cooldown: Duration,
}

impl BatchRunner {
    pub fn new(
        client: Arc<dyn GenerationClient>,
        store: Arc<dyn DescriptionStore>,
        sleeper: Arc<dyn Sleeper>,
        batch_size: usize,
        cooldown: Duration,
    ) -> Self {
        Self {
            client,
            store,
            sleeper,
            batch_size,
            cooldown,
        }
    }

    pub fn from_config(
        config: &Config,
        client: Arc<dyn GenerationClient>,
        store: Arc<dyn DescriptionStore>,
    ) -> Self {
        Self::new(
            client,
            store,
            Arc::new(TokioSleeper),
            config.batch_size,
            Duration::from_secs_f64(config.request_cooldown_secs),
        )
    }

    pub async fn run(
        &self,
        work_items: Vec<ObjectWorkItem>,
    ) -> Result<RunSummary, PipelineError> {
        let completed = self
            .store
            .completed_ids()
            .map_err(PipelineError::CompletedIds)?;

        let total = work_items.len();
        let pending: Vec<ObjectWorkItem> = work_items
            .into_iter()
            .filter(|item| !completed.contains(&item.object_id))
            .collect();

        let mut summary = RunSummary {
            skipped: total - pending.len(),
            remaining: pending.len().saturating_sub(self.batch_size),
            ..RunSummary::default()
        };

        info!(
            total,
            pending = pending.len(),
            batch_size = self.batch_size,
            "Starting description batch"
        );

        for item in pending.into_iter().take(self.batch_size) {
            if summary.processed > 0 && !self.cooldown.is_zero() {
                self.sleeper.sleep(self.cooldown).await;
            }
            summary.processed += 1;

            info!(
                object_id = %item.object_id,
                images = item.image_paths.len(),
                "Generating description"
            );

            match self.client.generate(&item).await {
                Ok(record) => {
                    self.store
                        .append(&record)
                        .map_err(|e| PipelineError::Persist {
                            object_id: item.object_id.clone(),
                            source: e,
                        })?;
                    summary.succeeded += 1;
                    info!(object_id = %item.object_id, "Description saved");
                }
                Err(e) if e.aborts_run() => {
                    error!(object_id = %item.object_id, error = %e, "Aborting batch");
                    summary.failed += 1;
                    summary.aborted = Some(e.to_string());
                    break;
                }
                Err(e) => {
                    warn!(object_id = %item.object_id, error = %e, "Object failed, continuing");
                    summary.failed += 1;
                }
            }
        }

        info!(%summary, "Batch finished");
        Ok(summary)
    }
}
