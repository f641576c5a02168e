//! Gateway event handlers
//!
//! One function per event kind. Handlers only talk to the service layer, so
//! they run the same way against in-memory doubles in tests.

mod guild;
mod message;
mod ready;

pub use guild::{on_guild_create, on_guild_delete};
pub use message::{on_message_bulk_delete, on_message_create, on_message_delete, on_message_update};
pub use ready::on_ready;
