//! Filesystem-backed artifact store.

use std::io::SeekFrom;
use std::path::{Path, PathBuf};

use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tracing::debug;

use crate::error::{StorageError, StorageResult};
use crate::range::ByteRange;

/// Public path prefix for served videos.
pub const PUBLIC_PREFIX: &str = "/videos";

/// Reject names that could escape the artifact directory.
pub fn validate_filename(name: &str) -> StorageResult<()> {
    if name.is_empty() || name.contains("..") || name.contains('/') || name.contains('\\') {
        return Err(StorageError::invalid_filename(name));
    }
    Ok(())
}

/// Bytes read from an artifact.
#[derive(Debug, Clone)]
pub struct Artifact {
    pub bytes: Vec<u8>,
    /// Size of the whole object
    pub total_len: u64,
    /// Set when only part of the object was read
    pub range: Option<ByteRange>,
}

/// Flat directory of rendered videos.
#[derive(Debug, Clone)]
pub struct LocalArtifactStore {
    root: PathBuf,
}

impl LocalArtifactStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Public URL of a stored file.
    pub fn video_url(file_name: &str) -> String {
        format!("{}/{}", PUBLIC_PREFIX, file_name)
    }

    /// Create the directory if it does not exist yet.
    pub async fn ensure_dir(&self) -> StorageResult<()> {
        tokio::fs::create_dir_all(&self.root).await?;
        Ok(())
    }

    /// Check the directory exists and is a directory.
    pub async fn health_check(&self) -> StorageResult<()> {
        let meta = tokio::fs::metadata(&self.root).await?;
        if !meta.is_dir() {
            return Err(StorageError::not_found(self.root.display().to_string()));
        }
        Ok(())
    }

    fn resolve(&self, name: &str) -> StorageResult<PathBuf> {
        validate_filename(name)?;
        Ok(self.root.join(name))
    }

    async fn open(&self, name: &str) -> StorageResult<(tokio::fs::File, u64)> {
        let path = self.resolve(name)?;
        let file = match tokio::fs::File::open(&path).await {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StorageError::not_found(name));
            }
            Err(e) => return Err(e.into()),
        };
        let meta = file.metadata().await?;
        if !meta.is_file() {
            return Err(StorageError::not_found(name));
        }
        Ok((file, meta.len()))
    }

    /// Read a whole artifact.
    pub async fn read(&self, name: &str) -> StorageResult<Artifact> {
        self.read_range(name, None).await
    }

    /// Read an artifact, honoring a single-range `Range` header if given.
    pub async fn read_range(&self, name: &str, range_header: Option<&str>) -> StorageResult<Artifact> {
        let (mut file, total_len) = self.open(name).await?;

        let range = match range_header {
            Some(header) => ByteRange::parse(header, total_len)?,
            None => None,
        };

        let bytes = match range {
            Some(range) => {
                file.seek(SeekFrom::Start(range.start)).await?;
                let mut buf = vec![0u8; range.len() as usize];
                file.read_exact(&mut buf).await?;
                buf
            }
            None => {
                let mut buf = Vec::with_capacity(total_len as usize);
                file.read_to_end(&mut buf).await?;
                buf
            }
        };

        debug!(file = name, bytes = bytes.len(), total_len, "Read artifact");
        Ok(Artifact {
            bytes,
            total_len,
            range,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn store_with(name: &str, content: &[u8]) -> (tempfile::TempDir, LocalArtifactStore) {
        let dir = tempfile::tempdir().unwrap();
        tokio::fs::write(dir.path().join(name), content).await.unwrap();
        let store = LocalArtifactStore::new(dir.path());
        (dir, store)
    }

    #[test]
    fn test_validate_filename() {
        assert!(validate_filename("octocat-Hello-World-1.mp4").is_ok());
        assert!(validate_filename("../../etc/passwd").is_err());
        assert!(validate_filename("..").is_err());
        assert!(validate_filename("a/b.mp4").is_err());
        assert!(validate_filename("a\\b.mp4").is_err());
        assert!(validate_filename("").is_err());
    }

    #[test]
    fn test_video_url() {
        assert_eq!(LocalArtifactStore::video_url("a.mp4"), "/videos/a.mp4");
    }

    #[tokio::test]
    async fn test_read_whole_and_range() {
        let (_dir, store) = store_with("v.mp4", b"0123456789").await;

        let whole = store.read("v.mp4").await.unwrap();
        assert_eq!(whole.bytes, b"0123456789");
        assert_eq!(whole.total_len, 10);
        assert!(whole.range.is_none());

        let part = store.read_range("v.mp4", Some("bytes=2-4")).await.unwrap();
        assert_eq!(part.bytes, b"234");
        assert_eq!(part.range, Some(ByteRange { start: 2, end: 4 }));
    }

    #[tokio::test]
    async fn test_missing_and_invalid() {
        let (_dir, store) = store_with("v.mp4", b"x").await;

        assert!(matches!(
            store.read("nope.mp4").await,
            Err(StorageError::NotFound(_))
        ));
        assert!(matches!(
            store.read("../v.mp4").await,
            Err(StorageError::InvalidFilename(_))
        ));
        assert!(matches!(
            store.read_range("v.mp4", Some("bytes=5-")).await,
            Err(StorageError::RangeNotSatisfiable(1))
        ));
    }

    #[tokio::test]
    async fn test_health_check() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalArtifactStore::new(dir.path().join("videos"));
        assert!(store.health_check().await.is_err());
        store.ensure_dir().await.unwrap();
        assert!(store.health_check().await.is_ok());
    }
}
