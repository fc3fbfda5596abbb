//! Session storage for access and refresh tokens.
//!
//! The [`SessionStore`] is the only owner of the session. It keeps the
//! current values in memory and writes every change through to a
//! [`SessionPersistence`] backend so a session survives restarts.
//!
//! Persisted entries are keyed by fixed names:
//!
//! - `token` - access token
//! - `refreshToken` - refresh token
//! - `user` - identity returned by the last login
//! - `rememberedUsername` - login convenience, survives [`SessionStore::clear`]

use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::RwLock;

use crate::types::User;

/// Persisted key for the access token.
pub const ACCESS_TOKEN_KEY: &str = "token";

/// Persisted key for the refresh token.
pub const REFRESH_TOKEN_KEY: &str = "refreshToken";

/// Persisted key for the logged-in identity.
pub const USER_KEY: &str = "user";

/// Persisted key for the username pre-filled at login.
pub const REMEMBERED_USERNAME_KEY: &str = "rememberedUsername";

/// Default session file name within the envmon data directory.
pub const SESSION_FILE: &str = "session.json";

/// Snapshot of every persisted entry.
pub type SessionEntries = BTreeMap<String, String>;

// ============================================================================
// Persistence backends
// ============================================================================

/// Durable storage for the session entries.
///
/// Backends store whole snapshots, so a save never exposes a half-written
/// token pair.
pub trait SessionPersistence: Send + Sync + std::fmt::Debug {
    /// Load the last saved snapshot. A missing store is an empty snapshot.
    fn load(&self) -> io::Result<SessionEntries>;

    /// Replace the saved snapshot.
    fn save(&self, entries: &SessionEntries) -> io::Result<()>;
}

/// JSON file backend.
#[derive(Debug)]
pub struct FileSessionStorage {
    path: PathBuf,
}

impl FileSessionStorage {
    /// Store the session in `session.json` under `data_dir`.
    pub fn new(data_dir: &Path) -> Self {
        Self {
            path: data_dir.join(SESSION_FILE),
        }
    }

    /// Store the session at an explicit file path.
    pub fn with_path(path: PathBuf) -> Self {
        Self { path }
    }

    /// Get the session file path.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SessionPersistence for FileSessionStorage {
    fn load(&self) -> io::Result<SessionEntries> {
        match std::fs::read_to_string(&self.path) {
            Ok(content) => serde_json::from_str(&content)
                .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(SessionEntries::new()),
            Err(e) => Err(e),
        }
    }

    fn save(&self, entries: &SessionEntries) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(entries)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

        // Write then rename so readers never see a partial file.
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, &self.path)
    }
}

/// In-memory backend (tests, and sessions that should not outlive the process).
#[derive(Debug, Default)]
pub struct MemorySessionStorage {
    entries: RwLock<SessionEntries>,
}

impl MemorySessionStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionPersistence for MemorySessionStorage {
    fn load(&self) -> io::Result<SessionEntries> {
        Ok(self.entries.read().clone())
    }

    fn save(&self, entries: &SessionEntries) -> io::Result<()> {
        *self.entries.write() = entries.clone();
        Ok(())
    }
}

// ============================================================================
// SessionStore
// ============================================================================

/// Authentication status derived from which tokens are present.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    /// An access token is available.
    Authenticated,
    /// Only a refresh token is available; a refresh can still succeed.
    Recoverable,
    /// No tokens at all.
    Unauthenticated,
}

/// Session changes made by the request pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    /// A new access token was obtained.
    Refreshed,
    /// The session could not be recovered and has been cleared.
    Expired,
}

/// Process-wide holder of the session.
///
/// Reads never fail. Writes are persisted immediately; if the backend fails
/// the store logs a warning and keeps working in memory only for the rest of
/// the process lifetime.
#[derive(Debug)]
pub struct SessionStore {
    entries: RwLock<SessionEntries>,
    backend: Arc<dyn SessionPersistence>,
    persistent: AtomicBool,
}

/// Shared session store handle.
pub type SharedSessionStore = Arc<SessionStore>;

impl SessionStore {
    /// Open a store over `backend`, loading whatever it holds.
    pub fn open(backend: Arc<dyn SessionPersistence>) -> Self {
        let (entries, persistent) = match backend.load() {
            Ok(entries) => (entries, true),
            Err(e) => {
                tracing::warn!("Session storage unavailable, keeping session in memory: {}", e);
                (SessionEntries::new(), false)
            }
        };

        Self {
            entries: RwLock::new(entries),
            backend,
            persistent: AtomicBool::new(persistent),
        }
    }

    /// Open a store persisted to `session.json` under `data_dir`.
    pub fn open_file(data_dir: &Path) -> Self {
        Self::open(Arc::new(FileSessionStorage::new(data_dir)))
    }

    /// Create an empty store that is never written to disk.
    pub fn in_memory() -> Self {
        Self::open(Arc::new(MemorySessionStorage::new()))
    }

    /// Whether changes are still being written to the backend.
    pub fn is_persistent(&self) -> bool {
        self.persistent.load(Ordering::SeqCst)
    }

    /// Current access token.
    pub fn access_token(&self) -> Option<String> {
        self.get(ACCESS_TOKEN_KEY)
    }

    /// Current refresh token.
    pub fn refresh_token(&self) -> Option<String> {
        self.get(REFRESH_TOKEN_KEY)
    }

    /// Current authentication status.
    pub fn status(&self) -> SessionStatus {
        let entries = self.entries.read();
        if entries.contains_key(ACCESS_TOKEN_KEY) {
            SessionStatus::Authenticated
        } else if entries.contains_key(REFRESH_TOKEN_KEY) {
            SessionStatus::Recoverable
        } else {
            SessionStatus::Unauthenticated
        }
    }

    /// Replace both tokens at once.
    pub fn set_tokens(&self, access: impl Into<String>, refresh: impl Into<String>) {
        self.update(|entries| {
            entries.insert(ACCESS_TOKEN_KEY.to_string(), access.into());
            entries.insert(REFRESH_TOKEN_KEY.to_string(), refresh.into());
        });
    }

    /// Replace only the access token.
    pub fn set_access_token(&self, access: impl Into<String>) {
        self.update(|entries| {
            entries.insert(ACCESS_TOKEN_KEY.to_string(), access.into());
        });
    }

    /// Drop both tokens and the remembered identity.
    pub fn clear(&self) {
        self.update(|entries| {
            entries.remove(ACCESS_TOKEN_KEY);
            entries.remove(REFRESH_TOKEN_KEY);
            entries.remove(USER_KEY);
        });
    }

    /// Identity stored by the last login, if any.
    pub fn current_user(&self) -> Option<User> {
        let raw = self.get(USER_KEY)?;
        match serde_json::from_str(&raw) {
            Ok(user) => Some(user),
            Err(e) => {
                tracing::debug!("Ignoring unreadable stored identity: {}", e);
                None
            }
        }
    }

    /// Remember the logged-in identity.
    pub fn set_current_user(&self, user: &User) {
        match serde_json::to_string(user) {
            Ok(raw) => self.update(|entries| {
                entries.insert(USER_KEY.to_string(), raw);
            }),
            Err(e) => tracing::warn!("Could not serialize identity: {}", e),
        }
    }

    /// Username to pre-fill at the next login.
    pub fn remembered_username(&self) -> Option<String> {
        self.get(REMEMBERED_USERNAME_KEY)
    }

    /// Set or forget the username to pre-fill at the next login.
    pub fn set_remembered_username(&self, username: Option<&str>) {
        self.update(|entries| match username {
            Some(name) => {
                entries.insert(REMEMBERED_USERNAME_KEY.to_string(), name.to_string());
            }
            None => {
                entries.remove(REMEMBERED_USERNAME_KEY);
            }
        });
    }

    fn get(&self, key: &str) -> Option<String> {
        self.entries.read().get(key).cloned()
    }

    /// Apply a change and persist the resulting snapshot while still holding
    /// the write lock, so saves land in the same order as the changes.
    fn update(&self, change: impl FnOnce(&mut SessionEntries)) {
        let mut entries = self.entries.write();
        change(&mut entries);

        if !self.persistent.load(Ordering::SeqCst) {
            return;
        }
        if let Err(e) = self.backend.save(&entries) {
            tracing::warn!(
                "Failed to persist session, continuing in memory only: {}",
                e
            );
            self.persistent.store(false, Ordering::SeqCst);
        }
    }
}
