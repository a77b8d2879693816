use super::base::{ResultSink, StorageError};
use super::types::ResultSet;
use async_trait::async_trait;
use parking_lot::RwLock;
use std::sync::Arc;

/// Keeps the result set in process memory. Clones share the same set.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    rows: Arc<RwLock<Option<ResultSet>>>,
    stores: Arc<RwLock<usize>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rows(rows: ResultSet) -> Self {
        let sink = Self::default();
        *sink.rows.write() = Some(rows);
        sink
    }

    pub fn snapshot(&self) -> Option<ResultSet> {
        self.rows.read().clone()
    }

    pub fn store_count(&self) -> usize {
        *self.stores.read()
    }
}

#[async_trait]
impl ResultSink for MemorySink {
    fn describe(&self) -> String {
        "memory".to_string()
    }

    async fn load(&self) -> Result<Option<ResultSet>, StorageError> {
        Ok(self.rows.read().clone())
    }

    async fn store(&self, rows: &ResultSet) -> Result<(), StorageError> {
        *self.rows.write() = Some(rows.clone());
        *self.stores.write() += 1;
        Ok(())
    }
}
