//! Key/value store seam used by the registry

use std::collections::BTreeMap;

use crate::error::Result;

/// Trait for the persisted scratch pad behind the registry
pub trait KeyValueStore {
    /// Read a raw value
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Write a raw value, replacing any previous one
    fn set(&mut self, key: &str, value: &str) -> Result<()>;

    /// Delete a key; deleting a missing key is not an error
    fn remove(&mut self, key: &str) -> Result<()>;

    /// Run `f` as one unit of work. Writers sharing the backing storage are
    /// serialized, and if `f` fails none of its writes are kept.
    ///
    /// Calls nested inside `f` join the outer unit.
    fn atomically<T, F>(&mut self, f: F) -> Result<T>
    where
        Self: Sized,
        F: FnOnce(&mut Self) -> Result<T>;

    /// Read and delete a key as one step
    fn take(&mut self, key: &str) -> Result<Option<String>>
    where
        Self: Sized,
    {
        self.atomically(|store| {
            let value = store.get(key)?;
            if value.is_some() {
                store.remove(key)?;
            }
            Ok(value)
        })
    }
}

/// In-memory `KeyValueStore`, used by tests and throwaway sessions
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: BTreeMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.entries.remove(key);
        Ok(())
    }

    /// `&mut self` already excludes other writers; a snapshot handles rollback
    fn atomically<T, F>(&mut self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Self) -> Result<T>,
    {
        let snapshot = self.entries.clone();
        let result = f(self);
        if result.is_err() {
            self.entries = snapshot;
        }
        result
    }

    fn take(&mut self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.remove(key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn memory_store_take_removes_value() {
        let mut store = MemoryStore::new();
        store.set("k", "v").unwrap();
        assert_eq!(store.take("k").unwrap().as_deref(), Some("v"));
        assert!(store.is_empty());
        assert_eq!(store.take("k").unwrap(), None);
    }

    #[test]
    fn memory_store_failed_unit_leaves_no_writes() {
        let mut store = MemoryStore::new();
        store.set("kept", "1").unwrap();

        let result: Result<()> = store.atomically(|store| {
            store.set("kept", "2")?;
            store.set("added", "3")?;
            Err(Error::NotFound("added".to_string()))
        });

        assert!(result.is_err());
        assert_eq!(store.get("kept").unwrap().as_deref(), Some("1"));
        assert_eq!(store.get("added").unwrap(), None);
        assert_eq!(store.len(), 1);
    }
}
