//! Message command dispatch: prefix resolution, lookup, preconditions and
//! the command lifecycle events

mod dispatcher;
mod events;
mod prefix;

pub use dispatcher::{CommandDispatcher, DispatchOutcome, IgnoreShortcuts, RawMessageHandler};
pub use events::{CommandEvent, CommandListener, CommandLogger, CommandPayload};
pub use prefix::{PrefixKind, PrefixResolution, PrefixResolver};
