//! Process-wide client authentication state cache.
//!
//! Keeps the access token consistent across three surfaces (memory, the
//! configured persistent store, the configured cookie jar) and propagates
//! principal identity changes to subscribers. Every mutation funnels through
//! [`AuthStateCache::set_token`] and [`AuthStateCache::set_principal`]; those
//! two are the only writers.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use once_cell::sync::Lazy;
use tracing::{debug, warn};

use crate::auth::principal::PrincipalInfo;
use crate::client::surfaces::{CookieJar, TokenStore};
use crate::errors::{PassageError, Result};

/// Default remote-validation timeout.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default cookie the cache mirrors the token into.
const DEFAULT_COOKIE_NAME: &str = "passage_session";

/// Client configuration applied by [`AuthStateCache::initialize`].
#[derive(Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub timeout: Duration,
    /// Extra headers sent with the remote session check.
    pub headers: Vec<(String, String)>,
    pub cookie_name: String,
    pub store: Option<Arc<dyn TokenStore>>,
    pub cookies: Option<Arc<dyn CookieJar>>,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout: DEFAULT_TIMEOUT,
            headers: Vec::new(),
            cookie_name: DEFAULT_COOKIE_NAME.to_string(),
            store: None,
            cookies: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn with_cookie_name(mut self, name: impl Into<String>) -> Self {
        self.cookie_name = name.into();
        self
    }

    pub fn with_store(mut self, store: Arc<dyn TokenStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn with_cookies(mut self, cookies: Arc<dyn CookieJar>) -> Self {
        self.cookies = Some(cookies);
        self
    }
}

type Subscriber = Arc<dyn Fn(Option<&PrincipalInfo>) + Send + Sync>;

/// Opaque handle identifying a registered subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubscriberId(u64);

#[derive(Default)]
struct Inner {
    config: Option<ClientConfig>,
    token: Option<String>,
    principal: Option<PrincipalInfo>,
    initialized: bool,
    subscribers: Vec<(u64, Subscriber)>,
    next_subscriber: u64,
}

static GLOBAL: Lazy<AuthStateCache> = Lazy::new(AuthStateCache::new);

/// Client-side authentication state, usually accessed through
/// [`AuthStateCache::global`].
#[derive(Default)]
pub struct AuthStateCache {
    inner: Mutex<Inner>,
}

impl AuthStateCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide singleton instance.
    pub fn global() -> &'static AuthStateCache {
        &GLOBAL
    }

    /// Apply configuration and attempt session restoration.
    ///
    /// Idempotent: calling again re-applies configuration and re-attempts
    /// restoration. When no token is found on any surface the remote check is
    /// skipped entirely and the state is cleared. Any remote failure also
    /// clears the state and resolves to `None` rather than an error.
    pub async fn initialize(&self, config: ClientConfig) -> Result<Option<PrincipalInfo>> {
        let (base_url, timeout, headers) = {
            let mut inner = self.inner.lock().unwrap();
            let snapshot =
                (config.base_url.clone(), config.timeout, config.headers.clone());
            inner.config = Some(config);
            snapshot
        };

        // Resolve the token through the converging getter; no token means no
        // session to restore and no network call to make.
        let Some(token) = self.token() else {
            self.clear();
            return Ok(None);
        };

        let client = reqwest::Client::builder().timeout(timeout).build().map_err(|err| {
            PassageError::internal(format!("Failed to build HTTP client: {}", err))
        })?;

        let mut request = client
            .get(format!("{}/auth/account", base_url.trim_end_matches('/')))
            .bearer_auth(&token);
        for (name, value) in &headers {
            request = request.header(name.as_str(), value.as_str());
        }

        let response = match request.send().await {
            Ok(response) => response,
            Err(err) => {
                debug!(error = %err, "remote session check failed");
                self.clear();
                return Ok(None);
            }
        };

        if !response.status().is_success() {
            debug!(status = %response.status(), "remote session check rejected");
            self.clear();
            return Ok(None);
        }

        let principal = match response.json::<PrincipalInfo>().await {
            Ok(principal) => principal,
            Err(err) => {
                debug!(error = %err, "remote session check returned an unreadable body");
                self.clear();
                return Ok(None);
            }
        };

        self.set_principal(Some(principal.clone()));
        self.inner.lock().unwrap().initialized = true;

        Ok(Some(principal))
    }

    /// The current access token.
    ///
    /// Resolution order: memory, cookie, persistent store. A token found
    /// outside memory is written back through the single-writer path so all
    /// three surfaces converge before this returns.
    pub fn token(&self) -> Option<String> {
        let mut inner = self.inner.lock().unwrap();

        if inner.token.is_some() {
            return inner.token.clone();
        }

        let from_cookie = inner
            .config
            .as_ref()
            .and_then(|c| c.cookies.as_ref().map(|jar| (jar.clone(), c.cookie_name.clone())))
            .and_then(|(jar, name)| jar.get(&name));

        if let Some(token) = from_cookie {
            Self::write_token_surfaces(&mut inner, Some(token.clone()));
            return Some(token);
        }

        let from_store =
            inner.config.as_ref().and_then(|c| c.store.as_ref()).and_then(|store| store.get());

        if let Some(token) = from_store {
            Self::write_token_surfaces(&mut inner, Some(token.clone()));
            return Some(token);
        }

        None
    }

    /// Single writer for all three token surfaces. Clearing a token that was
    /// never set is a no-op on every surface.
    pub fn set_token(&self, value: Option<String>) {
        let mut inner = self.inner.lock().unwrap();
        Self::write_token_surfaces(&mut inner, value);
    }

    fn write_token_surfaces(inner: &mut Inner, value: Option<String>) {
        inner.token = value.clone();

        if let Some(config) = inner.config.as_ref() {
            if let Some(store) = config.store.as_ref() {
                match value.as_deref() {
                    Some(token) => store.set(token),
                    None => store.remove(),
                }
            }
            if let Some(jar) = config.cookies.as_ref() {
                match value.as_deref() {
                    Some(token) => jar.set(&config.cookie_name, token),
                    None => jar.remove(&config.cookie_name),
                }
            }
        }
    }

    /// Single writer for the cached principal.
    ///
    /// Subscribers run only when the principal identity actually changed
    /// (different id, or a null↔non-null transition), and a panicking
    /// subscriber never prevents the remaining ones from running.
    pub fn set_principal(&self, value: Option<PrincipalInfo>) {
        let (changed, subscribers) = {
            let mut inner = self.inner.lock().unwrap();
            let changed = inner.principal.as_ref().map(|p| &p.id) != value.as_ref().map(|p| &p.id);
            inner.principal = value.clone();
            let subscribers: Vec<Subscriber> = if changed {
                inner.subscribers.iter().map(|(_, s)| s.clone()).collect()
            } else {
                Vec::new()
            };
            (changed, subscribers)
        };

        if !changed {
            return;
        }

        for subscriber in subscribers {
            let result = catch_unwind(AssertUnwindSafe(|| subscriber(value.as_ref())));
            if result.is_err() {
                warn!("principal change subscriber panicked");
            }
        }
    }

    /// The currently cached principal, if any.
    pub fn principal(&self) -> Option<PrincipalInfo> {
        self.inner.lock().unwrap().principal.clone()
    }

    /// Whether a session has been successfully restored since configuration.
    pub fn is_initialized(&self) -> bool {
        self.inner.lock().unwrap().initialized
    }

    /// Register a callback invoked on every principal identity change.
    pub fn on_principal_change<F>(&self, callback: F) -> SubscriberId
    where
        F: Fn(Option<&PrincipalInfo>) + Send + Sync + 'static,
    {
        let mut inner = self.inner.lock().unwrap();
        let id = inner.next_subscriber;
        inner.next_subscriber += 1;
        inner.subscribers.push((id, Arc::new(callback)));
        SubscriberId(id)
    }

    /// Remove a previously registered callback. Unknown ids are ignored.
    pub fn off_principal_change(&self, id: SubscriberId) {
        self.inner.lock().unwrap().subscribers.retain(|(sid, _)| *sid != id.0);
    }

    /// Tear down every token surface, then unset the principal. Token first,
    /// so subscribers observing the principal transition already see a state
    /// with no token.
    pub fn clear(&self) {
        self.set_token(None);
        self.set_principal(None);
    }

    /// The configured base URL.
    pub fn base_url(&self) -> Result<String> {
        self.inner
            .lock()
            .unwrap()
            .config
            .as_ref()
            .map(|config| config.base_url.clone())
            .ok_or_else(|| PassageError::invalid_state("client auth state not initialized"))
    }

    #[cfg(test)]
    pub(crate) fn reset_for_tests(&self) {
        let mut inner = self.inner.lock().unwrap();
        *inner = Inner::default();
    }
}
