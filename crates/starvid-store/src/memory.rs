//! In-process state store.

use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;

use crate::error::StoreResult;
use crate::metrics::record_operation;
use crate::store::StateStore;

const BACKEND: &str = "memory";

/// State store backed by a process-local map. Contents are lost on restart.
#[derive(Default)]
pub struct MemoryStore {
    namespaces: RwLock<HashMap<String, HashMap<String, Value>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StateStore for MemoryStore {
    async fn get(&self, namespace: &str, id: &str) -> StoreResult<Option<Value>> {
        record_operation(BACKEND, "get", namespace);
        let namespaces = self.namespaces.read().await;
        Ok(namespaces.get(namespace).and_then(|ns| ns.get(id)).cloned())
    }

    async fn set(&self, namespace: &str, id: &str, value: Value) -> StoreResult<()> {
        record_operation(BACKEND, "set", namespace);
        let mut namespaces = self.namespaces.write().await;
        namespaces
            .entry(namespace.to_string())
            .or_default()
            .insert(id.to_string(), value);
        Ok(())
    }

    async fn delete(&self, namespace: &str, id: &str) -> StoreResult<()> {
        record_operation(BACKEND, "delete", namespace);
        let mut namespaces = self.namespaces.write().await;
        if let Some(ns) = namespaces.get_mut(namespace) {
            ns.remove(id);
        }
        Ok(())
    }

    async fn keys(&self, namespace: &str) -> StoreResult<Vec<String>> {
        record_operation(BACKEND, "keys", namespace);
        let namespaces = self.namespaces.read().await;
        let mut keys: Vec<String> = namespaces
            .get(namespace)
            .map(|ns| ns.keys().cloned().collect())
            .unwrap_or_default();
        keys.sort();
        Ok(keys)
    }

    fn backend_name(&self) -> &'static str {
        BACKEND
    }
}
