//! Event dispatcher
//!
//! Receives [`GatewayEvent`]s from the platform client and routes each one to
//! its handler.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use warden_cache::Scheduler;
use warden_core::GatewayEvent;
use warden_service::{CommandDispatcher, ServiceContext};

use crate::error::GatewayResult;
use crate::handlers;

/// Capacity of the event channel between the client and the dispatcher
pub const EVENT_BUFFER: usize = 1024;

/// Routes gateway events to the handlers
pub struct EventDispatcher {
    /// Command pipeline, also the owner of the service context
    commands: Arc<CommandDispatcher>,
    /// Periodic jobs, started on the first ready event
    scheduler: Arc<Scheduler>,
    /// Whether the periodic jobs have been registered
    schedules_started: AtomicBool,
}

impl EventDispatcher {
    /// Create a new event dispatcher
    pub fn new(commands: Arc<CommandDispatcher>, scheduler: Arc<Scheduler>) -> Self {
        Self {
            commands,
            scheduler,
            schedules_started: AtomicBool::new(false),
        }
    }

    fn services(&self) -> &ServiceContext {
        self.commands.services()
    }

    /// Start the dispatch loop
    ///
    /// The loop ends once every sender of `events` is dropped.
    pub fn start(self: Arc<Self>, mut events: mpsc::Receiver<GatewayEvent>) -> JoinHandle<()> {
        tracing::info!("Event dispatcher started");

        tokio::spawn(async move {
            while let Some(event) = events.recv().await {
                self.dispatch(event).await;
            }
            tracing::info!("Event dispatcher loop ended");
        })
    }

    /// Handle one event, logging handler failures
    pub async fn dispatch(&self, event: GatewayEvent) {
        let event_type = event.event_type();
        tracing::trace!(event_type, guild_id = ?event.guild_id(), "Dispatching event");

        if let Err(e) = self.route(event).await {
            tracing::error!(event_type, error = %e, "Event handler failed");
        }
    }

    async fn route(&self, event: GatewayEvent) -> GatewayResult<()> {
        match event {
            GatewayEvent::Ready(ready) => handlers::on_ready(
                self.services(),
                &self.scheduler,
                &self.schedules_started,
                ready,
            ),
            GatewayEvent::GuildCreate(e) => handlers::on_guild_create(self.services(), e).await,
            GatewayEvent::GuildDelete(e) => handlers::on_guild_delete(self.services(), e).await,
            GatewayEvent::MessageCreate(message) => {
                // Detached: commands must not stall the event stream
                drop(handlers::on_message_create(&self.commands, *message));
                Ok(())
            }
            GatewayEvent::MessageUpdate(e) => handlers::on_message_update(self.services(), e).await,
            GatewayEvent::MessageDelete(e) => {
                handlers::on_message_delete(self.services(), e).await.map(|_| ())
            }
            GatewayEvent::MessageBulkDelete(e) => {
                handlers::on_message_bulk_delete(self.services(), e).await
            }
        }
    }

    /// Whether the periodic jobs have been registered
    pub fn schedules_started(&self) -> bool {
        self.schedules_started.load(Ordering::SeqCst)
    }
}

impl std::fmt::Debug for EventDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventDispatcher")
            .field("scheduler", &self.scheduler)
            .field("schedules_started", &self.schedules_started())
            .finish_non_exhaustive()
    }
}
