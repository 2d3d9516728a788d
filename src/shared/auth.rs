use serde::{Deserialize, Serialize};
use url::Url;

use crate::shared::error::EspError;

/// Query parameter a bot-issued link carries the key in.
pub const URL_KEY_PARAM: &str = "key";
/// Browser storage slot for the key.
pub const STORAGE_KEY: &str = "esp_access_key";
pub const HEADER_NAME: &str = "X-Access-Key";
pub const INVALID_KEY_MESSAGE: &str = "Invalid or expired access key";

/// Credential sent as `X-Access-Key` on every request.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessKey(String);

impl AccessKey {
    /// `None` for blank input.
    pub fn new(raw: impl AsRef<str>) -> Option<Self> {
        let trimmed = raw.as_ref().trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for AccessKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("AccessKey(***)")
    }
}

/// Somewhere the key survives a reload: browser storage, a file, memory.
pub trait KeyStore {
    fn load(&self) -> Option<AccessKey>;
    fn save(&self, key: &AccessKey);
    fn clear(&self);
}

#[derive(Debug, Default)]
pub struct MemoryKeyStore {
    slot: std::cell::RefCell<Option<AccessKey>>,
}

impl MemoryKeyStore {
    pub fn with_key(key: AccessKey) -> Self {
        Self {
            slot: std::cell::RefCell::new(Some(key)),
        }
    }
}

impl KeyStore for MemoryKeyStore {
    fn load(&self) -> Option<AccessKey> {
        self.slot.borrow().clone()
    }

    fn save(&self, key: &AccessKey) {
        *self.slot.borrow_mut() = Some(key.clone());
    }

    fn clear(&self) {
        *self.slot.borrow_mut() = None;
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bootstrap {
    pub key: Option<AccessKey>,
    /// Set when the page URL must be replaced to drop the key parameter.
    pub cleaned_url: Option<String>,
}

/// Resolve the key on page load.
///
/// A key in the URL wins and is persisted. Whenever the URL has a `key`
/// parameter, `cleaned_url` is the same URL without it. Otherwise the
/// stored key is used.
pub fn bootstrap(store: &dyn KeyStore, page_url: &str) -> Bootstrap {
    if let Ok(url) = Url::parse(page_url) {
        let from_url = url
            .query_pairs()
            .find(|(k, _)| k == URL_KEY_PARAM)
            .map(|(_, v)| AccessKey::new(v));
        if let Some(key) = from_url {
            // The parameter is consumed even when blank.
            let key = match key {
                Some(key) => {
                    store.save(&key);
                    Some(key)
                }
                None => store.load(),
            };
            return Bootstrap {
                key,
                cleaned_url: Some(strip_key_param(url)),
            };
        }
    }
    Bootstrap {
        key: store.load(),
        cleaned_url: None,
    }
}

fn strip_key_param(mut url: Url) -> String {
    let kept: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(k, _)| k != URL_KEY_PARAM)
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    if kept.is_empty() {
        url.set_query(None);
    } else {
        url.query_pairs_mut().clear().extend_pairs(kept);
    }
    url.to_string()
}

/// The service refused the key (401/403).
pub fn is_rejection<T>(result: &Result<T, EspError>) -> bool {
    matches!(result, Err(e) if e.is_auth())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthPhase {
    /// Key not resolved yet (before the first client render).
    Bootstrapping,
    Validating,
    Ready,
    SignedOut,
}

/// Access gate in front of the dashboard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthGate {
    pub phase: AuthPhase,
    pub key: Option<AccessKey>,
    pub error: Option<String>,
}

impl Default for AuthGate {
    fn default() -> Self {
        Self {
            phase: AuthPhase::Bootstrapping,
            key: None,
            error: None,
        }
    }
}

impl AuthGate {
    pub fn with_key(&mut self, key: Option<AccessKey>) {
        self.phase = if key.is_some() {
            AuthPhase::Validating
        } else {
            AuthPhase::SignedOut
        };
        self.key = key;
    }

    /// Key typed on the login screen.
    pub fn sign_in(&mut self, store: &dyn KeyStore, key: AccessKey) {
        store.save(&key);
        self.error = None;
        self.with_key(Some(key));
    }

    /// Result of the validation probe. Only an auth rejection locks the user
    /// out; any other failure lets the dashboard show its stale state.
    pub fn validated<T>(&mut self, store: &dyn KeyStore, result: &Result<T, EspError>) {
        match result {
            Err(e) if e.is_auth() => self.reject(store),
            _ => {
                self.phase = AuthPhase::Ready;
                self.error = None;
            }
        }
    }

    /// Any request came back 401/403.
    pub fn reject(&mut self, store: &dyn KeyStore) {
        store.clear();
        self.key = None;
        self.phase = AuthPhase::SignedOut;
        self.error = Some(INVALID_KEY_MESSAGE.to_string());
    }

    pub fn sign_out(&mut self, store: &dyn KeyStore) {
        store.clear();
        self.key = None;
        self.error = None;
        self.phase = AuthPhase::SignedOut;
    }
}
