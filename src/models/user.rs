use serde::{Deserialize, Serialize};

/// Sender identity read from the local profile store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserIdentity {
    pub name: String,
    pub phone: String,
}

impl UserIdentity {
    /// A profile with a blank name or phone is treated as absent.
    pub fn is_usable(&self) -> bool {
        !self.name.trim().is_empty() && !self.phone.trim().is_empty()
    }
}
