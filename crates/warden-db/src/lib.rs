//! # warden-db
//!
//! Database layer implementing repository traits with PostgreSQL via SQLx.
//!
//! ## Overview
//!
//! This crate provides PostgreSQL implementations for the repository traits
//! defined in `warden-core`. It handles:
//!
//! - Connection pool management and schema migrations
//! - Database models with SQLx `FromRow` derives
//! - Entity ↔ Model mappers
//! - Repository implementations
//!
//! ## Usage
//!
//! ```rust,ignore
//! use warden_db::pool::{create_pool, run_migrations, DatabaseConfig};
//! use warden_db::repositories::PgGuildSettingsRepository;
//!
//! async fn example(url: String, settings: &DatabaseSettings) -> anyhow::Result<()> {
//!     let pool = create_pool(&DatabaseConfig::new(url, settings)).await?;
//!     run_migrations(&pool).await?;
//!     let guilds = PgGuildSettingsRepository::new(pool);
//!     Ok(())
//! }
//! ```

pub mod mappers;
pub mod models;
pub mod pool;
pub mod repositories;

// Re-export commonly used types
pub use pool::{create_pool, run_migrations, DatabaseConfig, PgPool};
pub use repositories::{
    PgGuildSettingsRepository, PgInfractionRepository, PgMessageRepository, PgStoreHealth,
};
