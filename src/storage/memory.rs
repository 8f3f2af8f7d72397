//! In-process context store.

use super::traits::ContextStore;
use crate::models::ContextRecord;
use crate::{Error, Result};
use std::sync::RwLock;

/// Context store backed by a `Vec` behind an `RwLock`.
///
/// Records live for the lifetime of the process.
#[derive(Debug, Default)]
pub struct MemoryContextStore {
    records: RwLock<Vec<ContextRecord>>,
}

impl MemoryContextStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-populated with records, in the given order.
    #[must_use]
    pub const fn with_records(records: Vec<ContextRecord>) -> Self {
        Self {
            records: RwLock::new(records),
        }
    }
}

fn lock_error(operation: &str, e: impl std::fmt::Display) -> Error {
    Error::OperationFailed {
        operation: operation.to_string(),
        cause: e.to_string(),
    }
}

impl ContextStore for MemoryContextStore {
    fn name(&self) -> &'static str {
        "memory"
    }

    fn append(&self, record: ContextRecord) -> Result<()> {
        self.records
            .write()
            .map_err(|e| lock_error("memory_store_append", e))?
            .push(record);
        Ok(())
    }

    fn list_all(&self) -> Result<Vec<ContextRecord>> {
        Ok(self
            .records
            .read()
            .map_err(|e| lock_error("memory_store_list", e))?
            .clone())
    }

    fn reset(&self) -> Result<usize> {
        let mut guard = self
            .records
            .write()
            .map_err(|e| lock_error("memory_store_reset", e))?;
        let cleared = guard.len();
        guard.clear();
        Ok(cleared)
    }

    fn count(&self) -> Result<usize> {
        Ok(self
            .records
            .read()
            .map_err(|e| lock_error("memory_store_count", e))?
            .len())
    }
}
