//! Local artifact storage for rendered videos.
//!
//! Videos live as flat files in one directory and are served under
//! `/videos/<file>`.

pub mod error;
pub mod local;
pub mod range;

pub use error::{StorageError, StorageResult};
pub use local::{validate_filename, Artifact, LocalArtifactStore};
pub use range::ByteRange;
