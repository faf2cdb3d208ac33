//! Request handlers.

pub mod health;
pub mod jobs;
pub mod stars;
pub mod videos;

pub use health::*;
pub use jobs::*;
pub use stars::*;
pub use videos::*;
