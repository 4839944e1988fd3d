use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::{Mutex, RwLock};
use tokio_cron_scheduler::{Job, JobScheduler};
use uuid::Uuid;

use crate::config::SchedulerConfig;
use crate::notifications::{FanoutReport, NotificationFanout};
use crate::price_check::PriceCheckCycle;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CheckSummary {
    pub id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub checked: usize,
    pub skipped: usize,
    /// Names of the products whose price moved.
    pub changed: Vec<String>,
    pub notifications: FanoutReport,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatchStats {
    pub completed_runs: u64,
    pub rejected_runs: u64,
    pub running: bool,
    pub last_run: Option<CheckSummary>,
}

/// Runs one price check (cycle, then fan-out) at a time. Triggers arriving while a
/// run is in flight are turned away rather than queued.
pub struct PriceWatch {
    cycle: PriceCheckCycle,
    fanout: NotificationFanout,
    running: Mutex<()>,
    last_run: RwLock<Option<CheckSummary>>,
    completed_runs: AtomicU64,
    rejected_runs: AtomicU64,
}

impl PriceWatch {
    pub fn new(cycle: PriceCheckCycle, fanout: NotificationFanout) -> Self {
        Self {
            cycle,
            fanout,
            running: Mutex::new(()),
            last_run: RwLock::new(None),
            completed_runs: AtomicU64::new(0),
            rejected_runs: AtomicU64::new(0),
        }
    }

    /// `None` when another check is already in progress.
    pub async fn run_check(&self) -> Option<CheckSummary> {
        let Ok(_guard) = self.running.try_lock() else {
            self.rejected_runs.fetch_add(1, Ordering::Relaxed);
            tracing::warn!("Price check already in progress, ignoring trigger");
            return None;
        };

        let id = Uuid::new_v4();
        let started_at = Utc::now();
        tracing::info!(run_id = %id, "Price check started");

        let delta = self.cycle.run_cycle().await;
        let notifications = self.fanout.notify(&delta).await;

        let summary = CheckSummary {
            id,
            started_at,
            finished_at: Utc::now(),
            checked: delta.checked,
            skipped: delta.skipped,
            changed: delta.changed.iter().map(|p| p.name.clone()).collect(),
            notifications,
        };

        tracing::info!(
            run_id = %id,
            checked = summary.checked,
            changed = summary.changed.len(),
            sent = notifications.sent,
            failed = notifications.failed,
            "Price check finished"
        );

        self.completed_runs.fetch_add(1, Ordering::Relaxed);
        *self.last_run.write().await = Some(summary.clone());
        Some(summary)
    }

    pub fn is_running(&self) -> bool {
        self.running.try_lock().is_err()
    }

    pub async fn stats(&self) -> WatchStats {
        WatchStats {
            completed_runs: self.completed_runs.load(Ordering::Relaxed),
            rejected_runs: self.rejected_runs.load(Ordering::Relaxed),
            running: self.is_running(),
            last_run: self.last_run.read().await.clone(),
        }
    }
}

/// In-process cron trigger for [`PriceWatch::run_check`].
pub struct PriceScheduler {
    scheduler: JobScheduler,
    watch: Arc<PriceWatch>,
    config: SchedulerConfig,
}

impl PriceScheduler {
    pub async fn new(watch: Arc<PriceWatch>, config: SchedulerConfig) -> Result<Self> {
        let scheduler = JobScheduler::new().await?;

        Ok(Self {
            scheduler,
            watch,
            config,
        })
    }

    pub async fn start(&mut self) -> Result<()> {
        let watch = Arc::clone(&self.watch);
        let job = Job::new_async(self.config.cron.as_str(), move |_uuid, _l| {
            let watch = Arc::clone(&watch);
            Box::pin(async move {
                tracing::debug!("Scheduled price check triggered");
                watch.run_check().await;
            })
        })?;

        self.scheduler.add(job).await?;
        self.scheduler.start().await?;
        tracing::info!(cron = %self.config.cron, "Price scheduler started");
        Ok(())
    }

    pub async fn shutdown(&mut self) -> Result<()> {
        self.scheduler.shutdown().await?;
        tracing::info!("Price scheduler shutdown");
        Ok(())
    }
}
