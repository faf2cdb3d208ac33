//! Key-value state store for job records and cached star data.
//!
//! This crate provides:
//! - A `StateStore` trait mapping `(namespace, id)` to a JSON document
//! - In-memory and Redis backends
//! - Typed repositories for job records and star data

pub mod error;
pub mod memory;
pub mod metrics;
pub mod redis_store;
pub mod repos;
pub mod store;

pub use error::{StoreError, StoreResult};
pub use memory::MemoryStore;
pub use redis_store::RedisStore;
pub use repos::{JobRepository, StarsRepository};
pub use store::StateStore;
