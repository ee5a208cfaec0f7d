//! Pluggable token surfaces for the client auth state cache.
//!
//! Besides its in-memory slot, the cache mirrors the access token into a
//! persistent [`TokenStore`] and a [`CookieJar`] when the host environment
//! provides them. Both traits are synchronous: they model local surfaces
//! (files, browser-style jars), not network calls.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;

use tracing::warn;

/// Persistent storage surface for the access token.
pub trait TokenStore: Send + Sync {
    fn get(&self) -> Option<String>;
    fn set(&self, token: &str);
    /// Removing an absent token is a no-op, never an error.
    fn remove(&self);
}

/// Cookie surface for the access token. Hosts without a document-like
/// environment simply configure no jar.
pub trait CookieJar: Send + Sync {
    fn get(&self, name: &str) -> Option<String>;
    fn set(&self, name: &str, value: &str);
    fn remove(&self, name: &str);
}

/// In-memory token store, mainly for tests and short-lived processes.
#[derive(Default)]
pub struct MemoryTokenStore {
    value: Mutex<Option<String>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TokenStore for MemoryTokenStore {
    fn get(&self) -> Option<String> {
        self.value.lock().unwrap().clone()
    }

    fn set(&self, token: &str) {
        *self.value.lock().unwrap() = Some(token.to_string());
    }

    fn remove(&self) {
        *self.value.lock().unwrap() = None;
    }
}

/// File-backed token store. I/O failures are logged and swallowed: losing the
/// persistent mirror degrades session restoration, it must not break the
/// calling flow.
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl TokenStore for FileTokenStore {
    fn get(&self) -> Option<String> {
        match std::fs::read_to_string(&self.path) {
            Ok(contents) => {
                let trimmed = contents.trim();
                (!trimmed.is_empty()).then(|| trimmed.to_string())
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => None,
            Err(err) => {
                warn!(error = %err, path = %self.path.display(), "failed to read token store");
                None
            }
        }
    }

    fn set(&self, token: &str) {
        if let Some(parent) = self.path.parent() {
            if let Err(err) = std::fs::create_dir_all(parent) {
                warn!(error = %err, "failed to create token store directory");
                return;
            }
        }
        if let Err(err) = std::fs::write(&self.path, token) {
            warn!(error = %err, path = %self.path.display(), "failed to write token store");
        }
    }

    fn remove(&self) {
        match std::fs::remove_file(&self.path) {
            Ok(()) => {}
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
            Err(err) => {
                warn!(error = %err, path = %self.path.display(), "failed to remove token store");
            }
        }
    }
}

/// In-memory cookie jar for hosts and tests that emulate a browser surface.
#[derive(Default)]
pub struct MemoryCookieJar {
    cookies: Mutex<HashMap<String, String>>,
}

impl MemoryCookieJar {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CookieJar for MemoryCookieJar {
    fn get(&self, name: &str) -> Option<String> {
        self.cookies.lock().unwrap().get(name).cloned()
    }

    fn set(&self, name: &str, value: &str) {
        self.cookies.lock().unwrap().insert(name.to_string(), value.to_string());
    }

    fn remove(&self, name: &str) {
        self.cookies.lock().unwrap().remove(name);
    }
}
