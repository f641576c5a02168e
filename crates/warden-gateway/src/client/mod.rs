//! Platform adapter
//!
//! Inbound: [`GatewayHandler`] turns serenity callbacks into gateway events.
//! Outbound: [`SerenityPlatform`] implements the service layer's platform port.

pub mod convert;
mod handler;
mod platform;

pub use handler::GatewayHandler;
pub use platform::SerenityPlatform;
