//! Single byte-range parsing for `Range` headers.

use crate::error::{StorageError, StorageResult};

/// Inclusive byte range within an object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    pub start: u64,
    pub end: u64,
}

impl ByteRange {
    /// Number of bytes covered. Never zero.
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> u64 {
        self.end - self.start + 1
    }

    /// Value for the `Content-Range` response header.
    pub fn content_range(&self, total_len: u64) -> String {
        format!("bytes {}-{}/{}", self.start, self.end, total_len)
    }

    /// Resolve a `Range` header against an object size.
    ///
    /// Returns `Ok(None)` when the header should be ignored (malformed, not
    /// bytes, or multiple ranges) and the full object served instead.
    pub fn parse(header: &str, total_len: u64) -> StorageResult<Option<Self>> {
        let Some(spec) = header.trim().strip_prefix("bytes=") else {
            return Ok(None);
        };
        if spec.contains(',') {
            return Ok(None);
        }
        let Some((start, end)) = spec.trim().split_once('-') else {
            return Ok(None);
        };

        let range = match (start.trim(), end.trim()) {
            ("", "") => return Ok(None),
            // Suffix range: last N bytes.
            ("", suffix) => {
                let Ok(n) = suffix.parse::<u64>() else {
                    return Ok(None);
                };
                if n == 0 || total_len == 0 {
                    return Err(StorageError::RangeNotSatisfiable(total_len));
                }
                ByteRange {
                    start: total_len.saturating_sub(n),
                    end: total_len - 1,
                }
            }
            (start, end) => {
                let Ok(start) = start.parse::<u64>() else {
                    return Ok(None);
                };
                let end = if end.is_empty() {
                    u64::MAX
                } else {
                    match end.parse::<u64>() {
                        Ok(end) if end >= start => end,
                        _ => return Ok(None),
                    }
                };
                if start >= total_len {
                    return Err(StorageError::RangeNotSatisfiable(total_len));
                }
                ByteRange {
                    start,
                    end: end.min(total_len - 1),
                }
            }
        };

        Ok(Some(range))
    }
}
