//! # warden-service
//!
//! The message command pipeline: prefix resolution and dispatch,
//! preconditions, the built-in commands and how their failures are shown.

pub mod commands;
pub mod dispatch;
pub mod platform;
pub mod preconditions;
pub mod presenter;
pub mod services;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use commands::{Args, Command, CommandCategory, CommandContext, CommandMetadata, CommandRegistry};
pub use dispatch::{CommandDispatcher, CommandEvent, CommandListener, CommandLogger, DispatchOutcome};
pub use platform::{ChatPlatform, PlatformResult, SentMessage};
pub use preconditions::{Denial, Identifier, Precondition, PreconditionChain, Verdict};
pub use presenter::ErrorPresenter;
pub use services::{ServiceContext, ServiceError, ServiceResult};
