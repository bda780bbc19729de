//! Authentication session
//!
//! Owns the credential, persists it across restarts, and decides when a
//! rejected token forces a logout.

pub mod storage;
pub mod store;

use std::sync::Arc;

pub use storage::{DurableStorage, FileStorage, KeyringStorage, MemoryStorage, StorageError};
pub use store::{SessionEvent, SessionStore, TOKEN_KEY, USERNAME_KEY, USER_ID_KEY};

use crate::storage::config::{get_data_dir, SessionBackend, SessionSettings};

/// Build the storage backend selected in the configuration.
pub fn storage_from_settings(settings: &SessionSettings) -> Arc<dyn DurableStorage> {
    match settings.backend {
        SessionBackend::File => Arc::new(FileStorage::new(get_data_dir().join(&settings.file_name))),
        SessionBackend::Keyring => Arc::new(KeyringStorage::new(settings.keyring_service.clone())),
        SessionBackend::Memory => Arc::new(MemoryStorage::new()),
    }
}
