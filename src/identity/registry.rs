// Key Directory - resolves a ledger name to the public key bound to it
//
// The first key announced for a name is the one on record. Later messages
// can never replace it, so a claimed sender is always checked against the
// original binding rather than a key supplied alongside the message.

use crate::identity::PublicKey;
use std::collections::HashMap;
use std::sync::RwLock;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DirectoryError {
    #[error("Name '{0}' is already bound to a different key")]
    NameTaken(String),

    #[error("Name cannot be empty")]
    EmptyName,
}

/// Lookup of the public key registered for each name
pub trait KeyDirectory: Send + Sync {
    /// Bind `name` to `key`. Re-registering the same key is a no-op.
    fn register(&self, name: &str, key: PublicKey) -> Result<(), DirectoryError>;

    /// The key originally bound to `name`, if any
    fn public_key_of(&self, name: &str) -> Option<PublicKey>;
}

/// In-memory, first-binding-wins key directory
#[derive(Debug, Default)]
pub struct KeyRegistry {
    keys: RwLock<HashMap<String, PublicKey>>,
}

impl KeyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of registered names
    pub fn len(&self) -> usize {
        self.keys.read().map(|keys| keys.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All registered names, sorted
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = match self.keys.read() {
            Ok(keys) => keys.keys().cloned().collect(),
            Err(poisoned) => poisoned.into_inner().keys().cloned().collect(),
        };
        names.sort();
        names
    }
}

impl KeyDirectory for KeyRegistry {
    fn register(&self, name: &str, key: PublicKey) -> Result<(), DirectoryError> {
        if name.is_empty() {
            return Err(DirectoryError::EmptyName);
        }

        let mut keys = match self.keys.write() {
            Ok(keys) => keys,
            Err(poisoned) => poisoned.into_inner(),
        };

        match keys.get(name) {
            Some(existing) if *existing == key => Ok(()),
            Some(_) => Err(DirectoryError::NameTaken(name.to_string())),
            None => {
                keys.insert(name.to_string(), key);
                Ok(())
            }
        }
    }

    fn public_key_of(&self, name: &str) -> Option<PublicKey> {
        match self.keys.read() {
            Ok(keys) => keys.get(name).cloned(),
            Err(poisoned) => poisoned.into_inner().get(name).cloned(),
        }
    }
}
