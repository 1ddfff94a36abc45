use std::sync::Arc;

use tracing::warn;

use crate::storage::{KeyValueStore, StoreResult};

/// Storage key for the saved password
pub const PASSWORD_KEY: &str = "@mock-bank-password";

/// Storage key for the saved nickname
pub const NICKNAME_KEY: &str = "@mock-bank-apelido";

/// Storage key for the biometric opt-in flag
pub const BIOMETRIC_FLAG_KEY: &str = "@allow-fingerprint";

/// Whether the user has opted into biometric unlock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BiometricFlag {
    /// Nothing recorded yet (first run, or an unrecognised value)
    Unset,
    Enabled,
    Disabled,
}

impl BiometricFlag {
    /// Interpret the raw stored value. Only `"true"` and `"false"` count.
    pub fn from_stored(value: Option<&str>) -> Self {
        match value {
            Some("true") => BiometricFlag::Enabled,
            Some("false") => BiometricFlag::Disabled,
            _ => BiometricFlag::Unset,
        }
    }

    pub fn is_enabled(&self) -> bool {
        matches!(self, BiometricFlag::Enabled)
    }
}

/// Saved login convenience data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredCredential {
    pub nickname: String,
    pub password: String,
    pub biometric_enabled: bool,
}

/// Saved nickname, password and biometric flag on top of a `KeyValueStore`.
/// Values are plain strings; no encryption.
#[derive(Clone)]
pub struct CredentialStore {
    store: Arc<dyn KeyValueStore>,
}

impl CredentialStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Store nickname and password, replacing whatever was saved before.
    /// If the password write fails the previous nickname is put back, so a
    /// new nickname is never paired with an old password.
    pub fn store(&self, nickname: &str, password: &str) -> StoreResult<()> {
        let previous = self.store.get(NICKNAME_KEY)?;
        self.store.set(NICKNAME_KEY, nickname)?;

        if let Err(e) = self.store.set(PASSWORD_KEY, password) {
            let restored = match previous {
                Some(ref old) => self.store.set(NICKNAME_KEY, old),
                None => self.store.remove(NICKNAME_KEY),
            };
            if let Err(rollback) = restored {
                warn!(error = %rollback, "Failed to restore previous nickname");
            }
            return Err(e);
        }
        Ok(())
    }

    pub fn nickname(&self) -> StoreResult<Option<String>> {
        self.store.get(NICKNAME_KEY)
    }

    pub fn password(&self) -> StoreResult<Option<String>> {
        self.store.get(PASSWORD_KEY)
    }

    /// Load the saved pair. `None` unless both nickname and password exist.
    pub fn load(&self) -> StoreResult<Option<StoredCredential>> {
        let password = self.password()?;
        let nickname = self.nickname()?;
        match (nickname, password) {
            (Some(nickname), Some(password)) => Ok(Some(StoredCredential {
                nickname,
                password,
                biometric_enabled: self.biometric_flag()?.is_enabled(),
            })),
            _ => Ok(None),
        }
    }

    /// Check if both nickname and password are saved
    pub fn has_credentials(&self) -> bool {
        matches!(self.load(), Ok(Some(_)))
    }

    pub fn biometric_flag(&self) -> StoreResult<BiometricFlag> {
        let raw = self.store.get(BIOMETRIC_FLAG_KEY)?;
        Ok(BiometricFlag::from_stored(raw.as_deref()))
    }

    pub fn set_biometric_enabled(&self, enabled: bool) -> StoreResult<()> {
        self.store
            .set(BIOMETRIC_FLAG_KEY, if enabled { "true" } else { "false" })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{MemoryStore, StoreError};

    /// Delegates to memory but refuses to write the password
    struct PasswordWriteFails(MemoryStore);

    impl KeyValueStore for PasswordWriteFails {
        fn get(&self, key: &str) -> StoreResult<Option<String>> {
            self.0.get(key)
        }
        fn set(&self, key: &str, value: &str) -> StoreResult<()> {
            if key == PASSWORD_KEY {
                return Err(StoreError::Unavailable("keychain locked".to_string()));
            }
            self.0.set(key, value)
        }
        fn remove(&self, key: &str) -> StoreResult<()> {
            self.0.remove(key)
        }
    }

    fn credential_store() -> (Arc<MemoryStore>, CredentialStore) {
        let backend = Arc::new(MemoryStore::new());
        let store = CredentialStore::new(backend.clone());
        (backend, store)
    }

    #[test]
    fn test_biometric_flag_from_stored() {
        assert_eq!(BiometricFlag::from_stored(None), BiometricFlag::Unset);
        assert_eq!(BiometricFlag::from_stored(Some("true")), BiometricFlag::Enabled);
        assert_eq!(BiometricFlag::from_stored(Some("false")), BiometricFlag::Disabled);
        assert_eq!(BiometricFlag::from_stored(Some("TRUE")), BiometricFlag::Unset);
        assert_eq!(BiometricFlag::from_stored(Some("")), BiometricFlag::Unset);
    }

    #[test]
    fn test_store_uses_fixed_keys() {
        let (backend, store) = credential_store();
        store.store("felipe", "senha123").unwrap();

        assert_eq!(backend.get(NICKNAME_KEY).unwrap().as_deref(), Some("felipe"));
        assert_eq!(backend.get(PASSWORD_KEY).unwrap().as_deref(), Some("senha123"));
        assert_eq!(backend.get(BIOMETRIC_FLAG_KEY).unwrap(), None);
    }

    #[test]
    fn test_load_requires_both_values() {
        let (backend, store) = credential_store();
        assert_eq!(store.load().unwrap(), None);

        backend.set(NICKNAME_KEY, "felipe").unwrap();
        assert_eq!(store.load().unwrap(), None);
        assert!(!store.has_credentials());

        backend.set(PASSWORD_KEY, "senha123").unwrap();
        let loaded = store.load().unwrap().unwrap();
        assert_eq!(loaded.nickname, "felipe");
        assert_eq!(loaded.password, "senha123");
        assert!(!loaded.biometric_enabled);
    }

    #[test]
    fn test_biometric_flag_roundtrip() {
        let (backend, store) = credential_store();
        assert_eq!(store.biometric_flag().unwrap(), BiometricFlag::Unset);

        store.set_biometric_enabled(true).unwrap();
        assert_eq!(backend.get(BIOMETRIC_FLAG_KEY).unwrap().as_deref(), Some("true"));
        assert_eq!(store.biometric_flag().unwrap(), BiometricFlag::Enabled);

        store.set_biometric_enabled(false).unwrap();
        assert_eq!(store.biometric_flag().unwrap(), BiometricFlag::Disabled);
    }

    #[test]
    fn test_store_overwrites_previous_login() {
        let (_backend, store) = credential_store();
        store.store("felipe", "senha123").unwrap();
        store.store("maria", "outra456").unwrap();

        let loaded = store.load().unwrap().unwrap();
        assert_eq!(loaded.nickname, "maria");
        assert_eq!(loaded.password, "outra456");
    }

    #[test]
    fn test_failed_password_write_keeps_previous_pair() {
        let inner = MemoryStore::new();
        inner.set(NICKNAME_KEY, "felipe").unwrap();
        inner.set(PASSWORD_KEY, "senha123").unwrap();
        let store = CredentialStore::new(Arc::new(PasswordWriteFails(inner)));

        assert!(store.store("maria", "outra456").is_err());

        let loaded = store.load().unwrap().unwrap();
        assert_eq!(loaded.nickname, "felipe");
        assert_eq!(loaded.password, "senha123");
    }

    #[test]
    fn test_failed_password_write_on_first_save_leaves_nothing() {
        let store = CredentialStore::new(Arc::new(PasswordWriteFails(MemoryStore::new())));

        assert!(store.store("maria", "outra456").is_err());
        assert_eq!(store.nickname().unwrap(), None);
        assert_eq!(store.load().unwrap(), None);
    }
}
