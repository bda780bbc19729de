//! Session persistence across restarts, backed by a session file.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, OnceLock};
use std::thread::JoinHandle;
use std::time::Duration;

use tempfile::TempDir;

use liftlog::session::{
    DurableStorage, FileStorage, MemoryStorage, SessionEvent, SessionStore, StorageError,
    TOKEN_KEY, USERNAME_KEY, USER_ID_KEY,
};

fn file_storage(dir: &TempDir) -> Arc<FileStorage> {
    Arc::new(FileStorage::new(dir.path().join("session.json")))
}

#[test]
fn test_credential_survives_reopen() {
    let dir = TempDir::new().unwrap();

    let session = SessionStore::open(file_storage(&dir));
    session.login("tok-9", 9, "carol");
    drop(session);

    let reopened = SessionStore::open(file_storage(&dir));
    let credential = reopened.current_credential().unwrap();
    assert_eq!(credential.token, "tok-9");
    assert_eq!(credential.user_id, 9);
    assert_eq!(credential.username, "carol");
}

#[test]
fn test_logout_clears_persisted_keys() {
    let dir = TempDir::new().unwrap();
    let storage = file_storage(&dir);

    let session = SessionStore::open(storage.clone());
    session.login("tok-9", 9, "carol");
    session.logout();

    assert_eq!(storage.get(TOKEN_KEY).unwrap(), None);
    assert_eq!(storage.get(USER_ID_KEY).unwrap(), None);
    assert_eq!(storage.get(USERNAME_KEY).unwrap(), None);
    assert!(SessionStore::open(file_storage(&dir))
        .current_credential()
        .is_none());
}

#[test]
fn test_partial_persisted_session_is_absent() {
    let dir = TempDir::new().unwrap();
    let storage = file_storage(&dir);
    storage.set(TOKEN_KEY, "orphan").unwrap();
    storage.set(USERNAME_KEY, "carol").unwrap();

    let session = SessionStore::open(storage);
    assert!(!session.is_authenticated());
}

#[test]
fn test_invalidate_is_scoped_to_token() {
    let dir = TempDir::new().unwrap();
    let session = SessionStore::open(file_storage(&dir));
    let mut events = session.subscribe();

    session.login("old", 1, "carol");
    session.login("new", 1, "carol");

    // A late 401 for the replaced token must not end the new session.
    assert!(!session.invalidate("old"));
    assert!(session.is_authenticated());

    assert!(session.invalidate("new"));
    assert!(!session.invalidate("new"));

    assert_eq!(events.try_recv().unwrap(), SessionEvent::LoggedIn { user_id: 1 });
    assert_eq!(events.try_recv().unwrap(), SessionEvent::LoggedIn { user_id: 1 });
    assert_eq!(events.try_recv().unwrap(), SessionEvent::Expired);
    assert!(events.try_recv().is_err());
    assert!(SessionStore::open(file_storage(&dir))
        .current_credential()
        .is_none());
}

/// Storage that starts a competing login from another thread the first
/// time a key is removed.
struct RacingStorage {
    inner: MemoryStorage,
    session: OnceLock<Arc<SessionStore>>,
    fired: AtomicBool,
    racer: Mutex<Option<JoinHandle<()>>>,
}

impl DurableStorage for RacingStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.inner.get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.inner.set(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        if !self.fired.swap(true, Ordering::SeqCst) {
            if let Some(session) = self.session.get().cloned() {
                let handle = std::thread::spawn(move || session.login("new", 2, "carol"));
                *self.racer.lock().unwrap() = Some(handle);
                // Give the competing login every chance to run mid-clear.
                std::thread::sleep(Duration::from_millis(50));
            }
        }
        self.inner.remove(key)
    }
}

#[test]
fn test_login_during_invalidate_stays_persisted() {
    let storage = Arc::new(RacingStorage {
        inner: MemoryStorage::new(),
        session: OnceLock::new(),
        fired: AtomicBool::new(false),
        racer: Mutex::new(None),
    });
    let session = Arc::new(SessionStore::open(storage.clone()));
    let _ = storage.session.set(session.clone());

    session.login("old", 1, "carol");
    assert!(session.invalidate("old"));

    let racer = storage.racer.lock().unwrap().take().unwrap();
    racer.join().unwrap();

    assert_eq!(session.current_credential().unwrap().token, "new");
    assert_eq!(storage.get(TOKEN_KEY).unwrap().as_deref(), Some("new"));
    assert_eq!(storage.get(USER_ID_KEY).unwrap().as_deref(), Some("2"));

    let reopened = SessionStore::open(storage.clone());
    assert_eq!(reopened.current_credential().unwrap().token, "new");
}

#[test]
fn test_login_recovers_corrupt_session_file() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("session.json"), "{not json").unwrap();

    let session = SessionStore::open(file_storage(&dir));
    assert!(!session.is_authenticated());
    session.login("tok", 1, "alice");
    drop(session);

    let reopened = SessionStore::open(file_storage(&dir));
    assert_eq!(reopened.current_credential().unwrap().token, "tok");
}

#[test]
fn test_logout_clears_corrupt_session_file() {
    let dir = TempDir::new().unwrap();
    let storage = file_storage(&dir);
    std::fs::write(storage.path(), "{not json").unwrap();

    SessionStore::open(storage.clone()).logout();

    assert_eq!(storage.get(TOKEN_KEY).unwrap(), None);
}
