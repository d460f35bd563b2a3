use dashmap::DashMap;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::warn;
use uuid::Uuid;

use crate::error::AppError;

/// Session-scoped key holding the last submitted order.
pub const ORDER_DETAILS_KEY: &str = "pickAndOrderDetails";

/// Local key holding the signed-in user's `{name, phone}`.
pub const USER_DATA_KEY: &str = "userData";

/// String key-value store partitioned by client, shaped like browser storage.
pub struct KeyValueStore {
    name: &'static str,
    entries: DashMap<(Uuid, String), String>,
}

impl KeyValueStore {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            entries: DashMap::new(),
        }
    }

    pub fn get_item(&self, client_id: Uuid, key: &str) -> Option<String> {
        self.entries
            .get(&(client_id, key.to_string()))
            .map(|entry| entry.value().clone())
    }

    pub fn set_item(&self, client_id: Uuid, key: &str, value: String) {
        self.entries.insert((client_id, key.to_string()), value);
    }

    pub fn remove_item(&self, client_id: Uuid, key: &str) -> Option<String> {
        self.entries
            .remove(&(client_id, key.to_string()))
            .map(|(_, value)| value)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Absent and unparseable entries both read as `None`.
    pub fn load_json<T: DeserializeOwned>(&self, client_id: Uuid, key: &str) -> Option<T> {
        let raw = self.get_item(client_id, key)?;
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(err) => {
                warn!(store = self.name, %client_id, key, error = %err, "ignoring malformed stored value");
                None
            }
        }
    }

    pub fn save_json<T: Serialize>(&self, client_id: Uuid, key: &str, value: &T) -> Result<(), AppError> {
        let json = serde_json::to_string(value).map_err(|err| {
            AppError::Internal(format!("failed to serialize {key} for {}: {err}", self.name))
        })?;
        self.set_item(client_id, key, json);
        Ok(())
    }
}
