//! Client side of the job lifecycle.
//!
//! [`ApiClient`] submits jobs and reads their status; [`StatusPoller`] polls a
//! job on a fixed interval until it completes or fails.

pub mod client;
pub mod error;
pub mod poller;

pub use client::ApiClient;
pub use error::{PollError, PollResult};
pub use poller::{PollerConfig, StatusPoller};
