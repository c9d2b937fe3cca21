//! Persisted keyed-state contract.
//!
//! The surrounding app owns the actual storage (device-local preferences,
//! whatever the platform provides); the engine only reads the training and
//! home-location keys and owns the reservation status log. The trait keeps
//! that boundary explicit and lets tests run against [`MemoryStore`].

use std::collections::HashMap;

use serde::de::DeserializeOwned;

use crate::error::StoreError;

/// Key holding the liked training-prompt ids (JSON array of strings).
pub const PREFS_LIKED_KEY: &str = "prefs.liked";

/// Key holding the disliked training-prompt ids (JSON array of strings).
pub const PREFS_DISLIKED_KEY: &str = "prefs.disliked";

/// Key holding the saved home location (JSON `{label, lat, lng}`).
pub const HOME_LOCATION_KEY: &str = "home.location";

/// Prefix for reservation status records, keyed by job id.
pub const RESERVATION_STATUS_PREFIX: &str = "reservation.status.";

/// Minimal key/value contract over the app's persisted state.
pub trait KeyValueStore: Send {
    fn get(&self, key: &str) -> Option<String>;

    fn put(&mut self, key: &str, value: String);

    fn remove(&mut self, key: &str);

    /// Keys beginning with `prefix`, in unspecified order.
    fn keys_with_prefix(&self, prefix: &str) -> Vec<String>;
}

/// Decode a JSON value from a store key. Missing keys yield `Ok(None)`;
/// present-but-corrupt values are an error rather than silently dropped.
pub fn get_json<T: DeserializeOwned>(
    store: &dyn KeyValueStore,
    key: &str,
) -> Result<Option<T>, StoreError> {
    match store.get(key) {
        None => Ok(None),
        Some(raw) => serde_json::from_str(&raw)
            .map(Some)
            .map_err(|source| StoreError::Decode {
                key: key.to_string(),
                source,
            }),
    }
}

/// In-memory store for tests and the demo binary.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn put(&mut self, key: &str, value: String) {
        self.entries.insert(key.to_string(), value);
    }

    fn remove(&mut self, key: &str) {
        self.entries.remove(key);
    }

    fn keys_with_prefix(&self, prefix: &str) -> Vec<String> {
        self.entries
            .keys()
            .filter(|k| k.starts_with(prefix))
            .cloned()
            .collect()
    }
}
