//! # warden-gateway
//!
//! The bot process: translates platform events into [`GatewayEvent`]s,
//! handles them in one dispatch loop and drains state on shutdown.
//!
//! [`GatewayEvent`]: warden_core::GatewayEvent

pub mod client;
pub mod error;
pub mod events;
pub mod handlers;
pub mod server;

pub use error::{GatewayError, GatewayResult};
pub use events::EventDispatcher;
pub use server::run;
