//! Browser glue: where the access key lives and how the page URL is read
//! and rewritten. Off the web every call degrades to an in-memory no-op.

pub mod telegram;

use std::rc::Rc;

use crate::shared::auth::KeyStore;
#[cfg(not(feature = "web"))]
use crate::shared::auth::MemoryKeyStore;
#[cfg(feature = "web")]
use crate::shared::auth::{AccessKey, STORAGE_KEY};
#[cfg(feature = "web")]
use dioxus::logger::tracing::warn;

pub use telegram::TelegramHost;

/// `localStorage`-backed key slot.
#[cfg(feature = "web")]
pub struct LocalKeyStore;

#[cfg(feature = "web")]
impl LocalKeyStore {
    fn storage() -> Option<web_sys::Storage> {
        web_sys::window().and_then(|w| w.local_storage().ok().flatten())
    }
}

#[cfg(feature = "web")]
impl KeyStore for LocalKeyStore {
    fn load(&self) -> Option<AccessKey> {
        Self::storage()
            .and_then(|s| s.get_item(STORAGE_KEY).ok().flatten())
            .and_then(AccessKey::new)
    }

    fn save(&self, key: &AccessKey) {
        if let Some(storage) = Self::storage() {
            if storage.set_item(STORAGE_KEY, key.as_str()).is_err() {
                warn!("[auth] could not persist access key");
            }
        }
    }

    fn clear(&self) {
        if let Some(storage) = Self::storage() {
            let _ = storage.remove_item(STORAGE_KEY);
        }
    }
}

#[cfg(feature = "web")]
pub fn key_store() -> Rc<dyn KeyStore> {
    Rc::new(LocalKeyStore)
}

#[cfg(not(feature = "web"))]
pub fn key_store() -> Rc<dyn KeyStore> {
    Rc::new(MemoryKeyStore::default())
}

/// Full address of the current page.
#[cfg(feature = "web")]
pub fn page_url() -> Option<String> {
    web_sys::window().and_then(|w| w.location().href().ok())
}

#[cfg(not(feature = "web"))]
pub fn page_url() -> Option<String> {
    None
}

/// Swap the address bar without a reload or a new history entry.
#[cfg(feature = "web")]
pub fn replace_url(url: &str) {
    let replaced = web_sys::window()
        .and_then(|w| w.history().ok())
        .map(|h| h.replace_state_with_url(&wasm_bindgen::JsValue::NULL, "", Some(url)));
    if !matches!(replaced, Some(Ok(()))) {
        warn!("[auth] could not strip key from the address bar");
    }
}

#[cfg(not(feature = "web"))]
pub fn replace_url(_url: &str) {}
