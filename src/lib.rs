//! # surl
//!
//! A sharded short URL redirect service built with Axum and SQLite.
//!
//! ## Architecture
//!
//! This crate follows Clean Architecture principles with clear layer separation:
//!
//! - **Domain Layer** ([`domain`]) - Core entities and the storage capability trait
//! - **Application Layer** ([`application`]) - Write-path manager and read-path resolver
//! - **Infrastructure Layer** ([`infrastructure`]) - SQLite shards, cache, invalidation
//! - **API Layer** ([`api`]) - Redirect and health handlers
//!
//! ## Features
//!
//! - Identifiers partitioned across independent SQLite shard files
//! - Monotonic shard-encoded 64-bit ids with base58 external encoding
//! - Write-path deduplication keyed on (url, expiration)
//! - In-process TTL cache with negative entries and coarse invalidation
//! - Atomic expired-row cleanup safe against concurrent readers
//!
//! ## Quick Start
//!
//! ```bash
//! # Create a shard and add a destination
//! cargo run --bin admin -- --file shard0.db --node 0 add https://example.com/docs
//!
//! # Serve redirects
//! export SHARD_DBS="shard0.db"
//! export BASE_URL="https://s.example.com/"
//! cargo run
//! ```
//!
//! ## Configuration
//!
//! Service configuration is loaded from environment variables via
//! [`config::Config`]. See [`config`] module for available options.

pub mod api;
pub mod application;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod state;
pub mod utils;

pub mod config;
pub mod server;

pub mod routes;

pub use error::AppError;
pub use state::AppState;

/// Commonly used types for external consumers.
///
/// Re-exports frequently used types to simplify imports for library users
/// and integration tests.
pub mod prelude {
    pub use crate::application::services::{Manager, Resolution, Resolver, ShardRouter};
    pub use crate::domain::entities::UrlEntry;
    pub use crate::domain::repositories::Backend;
    pub use crate::error::AppError;
    pub use crate::state::AppState;
    pub use crate::utils::snowflake::{IdGenerator, ShortId};
}
