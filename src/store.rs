/// Preference store abstraction over chrome.storage.local
///
/// Handlers talk to a `PreferenceStore` instead of the browser store
/// directly, so tests can run against `MemoryStore` on the host target.
use serde_json::{Map, Value};
use std::cell::RefCell;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum StoreError {
    #[error("storage backend error: {0}")]
    Backend(String),
    #[error("malformed value for {key}: {reason}")]
    Malformed { key: String, reason: String },
}

/// chrome.storage.local semantics: `get` returns only the keys that are
/// present, `set` merges the given entries into the store.
#[allow(async_fn_in_trait)]
pub trait PreferenceStore {
    async fn get(&self, keys: &[&str]) -> Result<Map<String, Value>, StoreError>;
    async fn set(&self, entries: Map<String, Value>) -> Result<(), StoreError>;
}

/// Read one key and deserialize it, `Ok(None)` when absent
pub async fn get_value<T, S>(store: &S, key: &str) -> Result<Option<T>, StoreError>
where
    T: serde::de::DeserializeOwned,
    S: PreferenceStore,
{
    let mut values = store.get(&[key]).await?;
    match values.remove(key) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => serde_json::from_value(value)
            .map(Some)
            .map_err(|e| StoreError::Malformed {
                key: key.to_string(),
                reason: e.to_string(),
            }),
    }
}

/// In-memory store fake with the same merge semantics as the browser store
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RefCell<Map<String, Value>>,
    fail_writes: RefCell<bool>,
}

impl MemoryStore {
    pub fn new() -> MemoryStore {
        MemoryStore::default()
    }

    /// Make subsequent `set` calls fail, for error-path tests
    pub fn fail_writes(&self, fail: bool) {
        *self.fail_writes.borrow_mut() = fail;
    }

    pub fn snapshot(&self) -> Map<String, Value> {
        self.entries.borrow().clone()
    }
}

impl PreferenceStore for MemoryStore {
    async fn get(&self, keys: &[&str]) -> Result<Map<String, Value>, StoreError> {
        let entries = self.entries.borrow();
        let mut values = Map::new();
        for key in keys {
            if let Some(value) = entries.get(*key) {
                values.insert((*key).to_string(), value.clone());
            }
        }
        Ok(values)
    }

    async fn set(&self, new_entries: Map<String, Value>) -> Result<(), StoreError> {
        if *self.fail_writes.borrow() {
            return Err(StoreError::Backend("QUOTA_BYTES exceeded".to_string()));
        }
        let mut entries = self.entries.borrow_mut();
        for (key, value) in new_entries {
            entries.insert(key, value);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::executor::block_on;
    use serde_json::json;

    #[test]
    fn test_get_omits_missing_keys() {
        let store = MemoryStore::new();
        let mut entries = Map::new();
        entries.insert("learningMode".to_string(), json!("beginner"));
        block_on(store.set(entries)).unwrap();

        let values = block_on(store.get(&["learningMode", "currentQuestion"])).unwrap();

        assert_eq!(values.get("learningMode"), Some(&json!("beginner")));
        assert!(!values.contains_key("currentQuestion"));
    }

    #[test]
    fn test_set_merges_entries() {
        let store = MemoryStore::new();
        let mut first = Map::new();
        first.insert("learningMode".to_string(), json!("beginner"));
        first.insert("notificationsEnabled".to_string(), json!(true));
        block_on(store.set(first)).unwrap();

        let mut second = Map::new();
        second.insert("learningMode".to_string(), json!("advanced"));
        block_on(store.set(second)).unwrap();

        let snapshot = store.snapshot();
        assert_eq!(snapshot.get("learningMode"), Some(&json!("advanced")));
        assert_eq!(snapshot.get("notificationsEnabled"), Some(&json!(true)));
    }

    #[test]
    fn test_failing_writes() {
        let store = MemoryStore::new();
        store.fail_writes(true);

        let mut entries = Map::new();
        entries.insert("currentQuestion".to_string(), json!("q"));
        let err = block_on(store.set(entries)).unwrap_err();

        assert!(matches!(err, StoreError::Backend(_)));
        assert!(store.snapshot().is_empty());
    }

    #[test]
    fn test_get_value_typed() {
        let store = MemoryStore::new();
        let mut entries = Map::new();
        entries.insert("notificationsEnabled".to_string(), json!(false));
        entries.insert("lastProblemId".to_string(), Value::Null);
        block_on(store.set(entries)).unwrap();

        let enabled: Option<bool> = block_on(get_value(&store, "notificationsEnabled")).unwrap();
        assert_eq!(enabled, Some(false));

        // Null and absent both read back as None
        let last: Option<String> = block_on(get_value(&store, "lastProblemId")).unwrap();
        assert_eq!(last, None);
        let missing: Option<String> = block_on(get_value(&store, "currentQuestion")).unwrap();
        assert_eq!(missing, None);
    }

    #[test]
    fn test_get_value_malformed() {
        let store = MemoryStore::new();
        let mut entries = Map::new();
        entries.insert("notificationsEnabled".to_string(), json!("yes"));
        block_on(store.set(entries)).unwrap();

        let err = block_on(get_value::<bool, _>(&store, "notificationsEnabled")).unwrap_err();

        assert!(matches!(err, StoreError::Malformed { .. }));
    }
}
