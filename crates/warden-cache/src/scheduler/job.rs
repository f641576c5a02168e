//! Per-job run state

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::{debug, error};
use warden_core::error::DomainError;

/// Future returned by a job invocation
pub type JobFuture = Pin<Box<dyn Future<Output = Result<(), DomainError>> + Send>>;

/// Type-erased job callback
pub type BoxedJob = Arc<dyn Fn() -> JobFuture + Send + Sync>;

/// Clears the in-flight flag when dropped, including on unwind
struct RunningGuard(Arc<AtomicBool>);

impl Drop for RunningGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// A job callback plus its in-flight flag
#[derive(Clone)]
pub struct JobState {
    name: Arc<str>,
    job: BoxedJob,
    is_running: Arc<AtomicBool>,
}

impl JobState {
    pub fn new<F>(name: &str, job: F) -> Self
    where
        F: Fn() -> JobFuture + Send + Sync + 'static,
    {
        Self {
            name: Arc::from(name),
            job: Arc::new(job),
            is_running: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_running(&self) -> bool {
        self.is_running.load(Ordering::SeqCst)
    }

    /// Spawn one run of the job unless the previous run is still in flight
    ///
    /// Returns false when the tick was skipped.
    pub fn fire(&self) -> bool {
        // Claim the flag before spawning so a tick racing this one sees it set
        if self.is_running.swap(true, Ordering::SeqCst) {
            debug!(job = %self.name, "Skipping tick, previous invocation still running");
            return false;
        }

        let guard = RunningGuard(Arc::clone(&self.is_running));
        let name = Arc::clone(&self.name);
        let run = (self.job)();

        tokio::spawn(async move {
            let _guard = guard;
            if let Err(e) = run.await {
                error!(job = %name, error = %e, "Scheduled job failed");
            }
        });

        true
    }
}
