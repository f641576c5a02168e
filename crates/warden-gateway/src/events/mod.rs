//! Event dispatch
//!
//! Gateway events arrive on one channel and are handled in order by the
//! [`EventDispatcher`] loop.

mod dispatcher;

pub use dispatcher::{EventDispatcher, EVENT_BUFFER};
