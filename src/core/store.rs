use std::collections::HashMap;
use std::sync::Mutex;

use anyhow::anyhow;
use serde::{de::DeserializeOwned, Serialize};
use spin_sdk::key_value::Store;

use crate::core::errors::Result;

/// Byte-level key-value backend. Mirrors the Spin key-value API so the same
/// code runs inside a Spin component and natively.
pub trait KvStore {
    fn get(&self, key: &str) -> anyhow::Result<Option<Vec<u8>>>;
    fn set(&self, key: &str, value: &[u8]) -> anyhow::Result<()>;
    fn delete(&self, key: &str) -> anyhow::Result<()>;

    fn exists(&self, key: &str) -> anyhow::Result<bool> {
        Ok(self.get(key)?.is_some())
    }

    fn get_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>>
    where
        Self: Sized,
    {
        match self.get(key)? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    fn set_json<T: Serialize>(&self, key: &str, value: &T) -> Result<()>
    where
        Self: Sized,
    {
        self.set(key, &serde_json::to_vec(value)?)?;
        Ok(())
    }
}

/// The Spin host's key-value store.
pub struct SpinStore(Store);

impl SpinStore {
    pub fn open_default() -> anyhow::Result<Self> {
        Store::open_default()
            .map(SpinStore)
            .map_err(|e| anyhow!("failed to open default KV store: {e:?}"))
    }

    pub fn open(label: &str) -> anyhow::Result<Self> {
        Store::open(label)
            .map(SpinStore)
            .map_err(|e| anyhow!("failed to open KV store {label}: {e:?}"))
    }
}

impl KvStore for SpinStore {
    fn get(&self, key: &str) -> anyhow::Result<Option<Vec<u8>>> {
        self.0.get(key).map_err(|e| anyhow!("get {key}: {e:?}"))
    }

    fn set(&self, key: &str, value: &[u8]) -> anyhow::Result<()> {
        self.0.set(key, value).map_err(|e| anyhow!("set {key}: {e:?}"))
    }

    fn delete(&self, key: &str) -> anyhow::Result<()> {
        self.0.delete(key).map_err(|e| anyhow!("delete {key}: {e:?}"))
    }

    fn exists(&self, key: &str) -> anyhow::Result<bool> {
        self.0.exists(key).map_err(|e| anyhow!("exists {key}: {e:?}"))
    }
}

/// In-process store for native use and tests.
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> anyhow::Result<usize> {
        Ok(self.entries()?.len())
    }

    pub fn is_empty(&self) -> anyhow::Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Every key currently stored, sorted.
    pub fn keys(&self) -> anyhow::Result<Vec<String>> {
        let mut keys: Vec<String> = self.entries()?.keys().cloned().collect();
        keys.sort();
        Ok(keys)
    }

    fn entries(&self) -> anyhow::Result<std::sync::MutexGuard<'_, HashMap<String, Vec<u8>>>> {
        self.entries
            .lock()
            .map_err(|_| anyhow!("memory store lock poisoned"))
    }
}

impl KvStore for MemoryStore {
    fn get(&self, key: &str) -> anyhow::Result<Option<Vec<u8>>> {
        Ok(self.entries()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &[u8]) -> anyhow::Result<()> {
        self.entries()?.insert(key.to_string(), value.to_vec());
        Ok(())
    }

    fn delete(&self, key: &str) -> anyhow::Result<()> {
        self.entries()?.remove(key);
        Ok(())
    }

    fn exists(&self, key: &str) -> anyhow::Result<bool> {
        Ok(self.entries()?.contains_key(key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn poisoned_lock_is_an_error_everywhere() {
        let store = MemoryStore::new();
        store.set("user:1", b"{}").unwrap();

        let _ = std::thread::scope(|s| {
            s.spawn(|| {
                let _guard = store.entries.lock().unwrap();
                panic!("poison the lock");
            })
            .join()
        });

        assert!(store.get("user:1").is_err());
        assert!(store.set("user:2", b"{}").is_err());
        assert!(store.len().is_err());
        assert!(store.is_empty().is_err());
        assert!(store.keys().is_err());
    }
}
