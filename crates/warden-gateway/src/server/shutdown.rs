//! Shutdown signal and drain

use tracing::{error, info, warn};
use warden_cache::{MessageBuffer, Scheduler};

/// Wait for SIGINT, SIGTERM or SIGHUP (ctrl-c where unix signals are unavailable)
pub async fn wait_for_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
        info!("Received SIGINT");
    };

    #[cfg(unix)]
    let unix_signals = async {
        use tokio::signal::unix::{signal, SignalKind};

        match (signal(SignalKind::terminate()), signal(SignalKind::hangup())) {
            (Ok(mut terminate), Ok(mut hangup)) => {
                tokio::select! {
                    _ = terminate.recv() => info!("Received SIGTERM"),
                    _ = hangup.recv() => info!("Received SIGHUP"),
                }
            }
            (Err(e), _) | (_, Err(e)) => {
                warn!(error = %e, "Failed to install unix signal handlers");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let unix_signals = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = unix_signals => {}
    }
}

/// Stop the periodic jobs and flush what is still buffered
///
/// Returns the number of messages written. Failures are logged, never
/// propagated: shutdown continues either way.
pub async fn drain(scheduler: &Scheduler, messages: &MessageBuffer) -> usize {
    scheduler.shutdown().await;

    let pending = messages.size();
    match messages.store().await {
        Ok(stored) => {
            info!(stored, "Flushed message buffer");
            stored
        }
        Err(e) => {
            error!(pending, error = %e, "Failed to flush message buffer");
            0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use warden_cache::testing::{incoming_message, InMemoryMessageRepository};
    use warden_common::CronSpec;
    use warden_core::Snowflake;

    const GUILD: i64 = 300_000_000_000_000_001;

    fn buffer_with(repo: &Arc<InMemoryMessageRepository>, ids: &[i64]) -> MessageBuffer {
        let buffer = MessageBuffer::new(repo.clone());
        for &id in ids {
            buffer.queue(&incoming_message(id, Some(GUILD), 2, 3, "bye"));
        }
        buffer
    }

    #[tokio::test]
    async fn test_drain_flushes_and_stops_jobs() {
        let repo = Arc::new(InMemoryMessageRepository::new());
        let buffer = buffer_with(&repo, &[10, 11]);
        let scheduler = Scheduler::new();
        scheduler.schedule("job", &CronSpec::hourly(), || async { Ok(()) }).unwrap();

        let stored = drain(&scheduler, &buffer).await;

        assert_eq!(stored, 2);
        assert_eq!(buffer.size(), 0);
        assert!(repo.row(Snowflake::new(10)).is_some());
        assert!(scheduler.is_empty());
    }

    #[tokio::test]
    async fn test_drain_survives_store_failure() {
        let repo = Arc::new(InMemoryMessageRepository::new());
        let buffer = buffer_with(&repo, &[10]);
        repo.fail_next();

        let stored = drain(&Scheduler::new(), &buffer).await;

        assert_eq!(stored, 0);
        assert_eq!(buffer.size(), 1);
        assert!(repo.is_empty());
    }
}
