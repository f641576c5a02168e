//! Integration test utilities for warden
//!
//! Scenarios drive the real dispatch pipeline and gateway handlers over
//! in-memory storage and a recording platform. Database-backed tests run
//! against `DATABASE_URL` when it is set.

pub mod fixtures;
pub mod helpers;

pub use fixtures::*;
pub use helpers::*;
