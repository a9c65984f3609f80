//! Named-slot persistence for the board.
//!
//! A store holds string values under fixed keys. [`read_slot`] and
//! [`write_slot`] layer JSON on top: a missing or unreadable slot falls back to
//! the caller's default without writing anything back.

mod file_store;

pub use file_store::{FileSlotStore, PERMANOTE_DIR};

use std::collections::HashMap;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::Result;

pub trait SlotStore {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&mut self, key: &str, value: &str) -> Result<()>;
}

/// In-process store, used for embedding and tests
#[derive(Debug, Default, Clone)]
pub struct MemorySlotStore {
    slots: HashMap<String, String>,
}

impl MemorySlotStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_slot(key: &str, value: impl Into<String>) -> Self {
        let mut store = Self::new();
        store.slots.insert(key.to_string(), value.into());
        store
    }

    pub fn raw(&self, key: &str) -> Option<&str> {
        self.slots.get(key).map(String::as_str)
    }
}

impl SlotStore for MemorySlotStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.slots.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.slots.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Load and deserialize a slot, returning `default` when it is absent,
/// unreadable, or fails to parse.
pub fn read_slot<T, S>(store: &S, key: &str, default: T) -> T
where
    T: DeserializeOwned,
    S: SlotStore + ?Sized,
{
    let raw = match store.get(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => return default,
        Err(e) => {
            tracing::warn!(key, error = %e, "failed to read slot, using default");
            return default;
        }
    };

    match serde_json::from_str(&raw) {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!(key, error = %e, "slot is not valid, using default");
            default
        }
    }
}

pub fn write_slot<T, S>(store: &mut S, key: &str, value: &T) -> Result<()>
where
    T: Serialize + ?Sized,
    S: SlotStore + ?Sized,
{
    let raw = serde_json::to_string(value)?;
    store.set(key, &raw)
}
