//! Session store: the single owner of the authenticated credential.

use std::sync::{Arc, PoisonError, RwLock};

use tokio::sync::broadcast;

use super::storage::{DurableStorage, MemoryStorage};
use crate::exercises::{Credential, UserId};

/// Storage key for the bearer token.
pub const TOKEN_KEY: &str = "authToken";
/// Storage key for the user id.
pub const USER_ID_KEY: &str = "userId";
/// Storage key for the display name.
pub const USERNAME_KEY: &str = "username";

const EVENT_CAPACITY: usize = 16;

/// Session lifecycle notifications.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// A credential was stored
    LoggedIn { user_id: UserId },
    /// The user logged out
    LoggedOut,
    /// The service rejected the credential and it was discarded
    Expired,
}

/// Holds the current credential in memory and in durable storage.
///
/// Shared behind an `Arc` by the gateway and the board. Mutation only
/// happens through [`login`](Self::login), [`logout`](Self::logout) and
/// [`invalidate`](Self::invalidate).
pub struct SessionStore {
    storage: Arc<dyn DurableStorage>,
    current: RwLock<Option<Credential>>,
    events: broadcast::Sender<SessionEvent>,
}

impl SessionStore {
    /// Open a session over `storage`, rehydrating any persisted credential.
    pub fn open(storage: Arc<dyn DurableStorage>) -> Self {
        let current = Self::rehydrate(storage.as_ref());
        match &current {
            Some(credential) => tracing::info!(
                "Restored session for {} (user {})",
                credential.username,
                credential.user_id
            ),
            None => tracing::debug!("No persisted session"),
        }

        let (events, _) = broadcast::channel(EVENT_CAPACITY);

        Self {
            storage,
            current: RwLock::new(current),
            events,
        }
    }

    /// A session that forgets everything on drop.
    pub fn in_memory() -> Self {
        Self::open(Arc::new(MemoryStorage::new()))
    }

    fn rehydrate(storage: &dyn DurableStorage) -> Option<Credential> {
        let read = |key: &str| match storage.get(key) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!("Failed to read {} from session storage: {}", key, e);
                None
            }
        };

        let token = read(TOKEN_KEY)?;
        let user_id = read(USER_ID_KEY)?;
        let username = read(USERNAME_KEY)?;

        match user_id.parse::<UserId>() {
            Ok(user_id) => Some(Credential::new(token, user_id, username)),
            Err(_) => {
                tracing::warn!("Ignoring persisted session with invalid user id");
                None
            }
        }
    }

    /// Store a credential; later gateway calls authenticate as this identity.
    ///
    /// Always succeeds. A persistence failure is logged and the in-memory
    /// session is still replaced.
    pub fn login(&self, token: impl Into<String>, user_id: UserId, username: impl Into<String>) {
        let credential = Credential::new(token, user_id, username);

        // Storage changes under the write guard so it never lags memory.
        let mut current = self.write();
        self.persist(&credential);
        tracing::info!(
            "Logged in as {} (user {})",
            credential.username,
            credential.user_id
        );
        *current = Some(credential);
        drop(current);

        let _ = self.events.send(SessionEvent::LoggedIn { user_id });
    }

    /// Clear the session. Safe to call when already logged out.
    pub fn logout(&self) {
        let mut current = self.write();
        let previous = current.take();
        self.clear_storage();
        drop(current);

        if previous.is_some() {
            tracing::info!("Logged out");
            let _ = self.events.send(SessionEvent::LoggedOut);
        }
    }

    /// Discard the session because the service rejected `token`.
    ///
    /// Only clears when `token` is still the stored one, so several requests
    /// failing with the same token cause a single forced logout and a stale
    /// rejection never ends a newer session. Returns whether it cleared.
    pub fn invalidate(&self, token: &str) -> bool {
        let mut current = self.write();
        match current.as_ref() {
            Some(credential) if credential.token == token => {}
            _ => return false,
        }
        *current = None;
        self.clear_storage();
        drop(current);

        tracing::warn!("Session expired, credential discarded");
        let _ = self.events.send(SessionEvent::Expired);
        true
    }

    /// The stored credential, if any.
    pub fn current_credential(&self) -> Option<Credential> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Subscribe to session lifecycle events.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, Option<Credential>> {
        self.current.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn persist(&self, credential: &Credential) {
        let user_id = credential.user_id.to_string();
        let pairs = [
            (TOKEN_KEY, credential.token.as_str()),
            (USER_ID_KEY, user_id.as_str()),
            (USERNAME_KEY, credential.username.as_str()),
        ];

        for (key, value) in pairs {
            if let Err(e) = self.storage.set(key, value) {
                tracing::warn!("Failed to persist {}: {}", key, e);
            }
        }
    }

    fn clear_storage(&self) {
        for key in [TOKEN_KEY, USER_ID_KEY, USERNAME_KEY] {
            if let Err(e) = self.storage.remove(key) {
                tracing::warn!("Failed to clear {}: {}", key, e);
            }
        }
    }
}
