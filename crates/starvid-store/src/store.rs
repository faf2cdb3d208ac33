//! State store abstraction.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::StoreResult;

/// Key-value store mapping `(namespace, id)` to a JSON document.
///
/// Each `set` is an atomic whole-document overwrite; there is no merge.
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Read a document. Returns `None` when absent.
    async fn get(&self, namespace: &str, id: &str) -> StoreResult<Option<Value>>;

    /// Write (overwrite) a document.
    async fn set(&self, namespace: &str, id: &str, value: Value) -> StoreResult<()>;

    /// Delete a document. Deleting an absent document is not an error.
    async fn delete(&self, namespace: &str, id: &str) -> StoreResult<()>;

    /// List the ids present in a namespace.
    async fn keys(&self, namespace: &str) -> StoreResult<Vec<String>>;

    /// Backend name for logs and readiness checks.
    fn backend_name(&self) -> &'static str;
}
