//! Named periodic jobs on cron schedules

mod job;

pub use job::{BoxedJob, JobFuture, JobState};

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use chrono::Utc;
use parking_lot::Mutex;
use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use warden_common::{CronSpec, CronSpecError};
use warden_core::error::DomainError;

/// Flush the message buffer into the database
pub const STORE_NEW_MESSAGES: &str = "STORE_NEW_MESSAGES";
/// Remove stored messages older than the configured ttl
pub const DELETE_OLD_MESSAGES: &str = "DELETE_OLD_MESSAGES";
/// Clear the guild settings cache
pub const DELETE_GUILD_CACHE: &str = "DELETE_GUILD_CACHE";

/// Scheduler errors
#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("Invalid schedule for job {job}: {source}")]
    InvalidSchedule {
        job: String,
        #[source]
        source: CronSpecError,
    },

    #[error("Scheduler is shut down")]
    ShutDown,
}

/// Runs named jobs on cron schedules (UTC)
///
/// A tick is skipped while the previous run of the same job is still in
/// flight. Scheduling a name twice replaces the earlier job.
pub struct Scheduler {
    jobs: Mutex<HashMap<String, ScheduledJob>>,
    shutdown_tx: watch::Sender<bool>,
}

struct ScheduledJob {
    state: JobState,
    handle: JoinHandle<()>,
}

impl Scheduler {
    pub fn new() -> Self {
        let (shutdown_tx, _) = watch::channel(false);
        Self {
            jobs: Mutex::new(HashMap::new()),
            shutdown_tx,
        }
    }

    /// Register a job, replacing any job with the same name
    pub fn schedule<F, Fut>(&self, name: &str, spec: &CronSpec, job: F) -> Result<(), SchedulerError>
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), DomainError>> + Send + 'static,
    {
        if *self.shutdown_tx.borrow() {
            return Err(SchedulerError::ShutDown);
        }

        let schedule = spec.schedule().map_err(|source| SchedulerError::InvalidSchedule {
            job: name.to_string(),
            source,
        })?;

        let state = JobState::new(name, move || -> JobFuture { Box::pin(job()) });
        let handle = tokio::spawn(run_job_loop(
            state.clone(),
            schedule,
            self.shutdown_tx.subscribe(),
        ));

        let previous = self
            .jobs
            .lock()
            .insert(name.to_string(), ScheduledJob { state, handle });
        if let Some(previous) = previous {
            previous.handle.abort();
            debug!(job = name, "Replaced existing schedule");
        }

        info!(job = name, cron = %spec, "Job scheduled");
        Ok(())
    }

    /// Check whether a job with this name is registered
    pub fn is_scheduled(&self, name: &str) -> bool {
        self.jobs.lock().contains_key(name)
    }

    /// Whether a run of the named job is in flight
    pub fn is_running(&self, name: &str) -> bool {
        self.jobs
            .lock()
            .get(name)
            .is_some_and(|job| job.state.is_running())
    }

    /// Remove a job, returns false if it was not registered
    pub fn cancel(&self, name: &str) -> bool {
        match self.jobs.lock().remove(name) {
            Some(job) => {
                job.handle.abort();
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.jobs.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.lock().is_empty()
    }

    /// Stop every job loop and wait for the loops to exit
    ///
    /// Runs already in flight are left to finish on their own.
    pub async fn shutdown(&self) {
        self.shutdown_tx.send_replace(true);

        let jobs: Vec<(String, ScheduledJob)> = self.jobs.lock().drain().collect();
        for (name, job) in jobs {
            if let Err(e) = job.handle.await {
                if !e.is_cancelled() {
                    warn!(job = %name, error = %e, "Job loop ended abnormally");
                }
            }
        }

        info!("Scheduler stopped");
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<String> = self.jobs.lock().keys().cloned().collect();
        f.debug_struct("Scheduler").field("jobs", &names).finish()
    }
}

async fn run_job_loop(
    state: JobState,
    schedule: cron::Schedule,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    loop {
        let now = Utc::now();
        let Some(next) = schedule.after(&now).next() else {
            warn!(job = %state.name(), "Schedule has no upcoming runs, stopping");
            return;
        };
        let wait = (next - now).to_std().unwrap_or_default();

        tokio::select! {
            () = tokio::time::sleep(wait) => {
                state.fire();
            }
            _ = shutdown_rx.changed() => {
                debug!(job = %state.name(), "Job loop stopping");
                return;
            }
        }
    }
}
