//! Stage hand-off queue.
//!
//! This crate provides:
//! - `ProcessStars` and `RenderVideo` stage messages
//! - A `JobQueue` trait with at-least-once delivery
//! - Redis Streams (consumer group) and in-process backends

pub mod error;
pub mod job;
pub mod memory;
pub mod queue;

pub use error::{QueueError, QueueResult};
pub use job::{ProcessStarsJob, QueueJob, RenderVideoJob};
pub use memory::MemoryJobQueue;
pub use queue::{JobQueue, QueueConfig, RedisJobQueue};
