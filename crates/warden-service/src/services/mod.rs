//! Shared dependencies and the error type of the command pipeline

pub mod context;
pub mod error;

pub use context::{ServiceContext, ServiceContextBuilder};
pub use error::{ServiceError, ServiceResult};
