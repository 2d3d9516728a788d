#![cfg(feature = "server")]
use std::fs;
use std::path::{Path, PathBuf};

use dioxus::logger::tracing::warn;

use crate::shared::auth::{AccessKey, KeyStore};

const KEY_FILE_NAME: &str = "access_key";

/// Key store for the CLI: one file under the data directory.
#[derive(Debug, Clone)]
pub struct FileKeyStore {
    path: PathBuf,
}

impl FileKeyStore {
    pub fn in_dir(data_dir: &Path) -> Self {
        Self {
            path: data_dir.join(KEY_FILE_NAME),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl KeyStore for FileKeyStore {
    fn load(&self) -> Option<AccessKey> {
        let raw = fs::read_to_string(&self.path).ok()?;
        AccessKey::new(raw)
    }

    fn save(&self, key: &AccessKey) {
        if let Some(dir) = self.path.parent() {
            let _ = fs::create_dir_all(dir);
        }
        if let Err(e) = fs::write(&self.path, key.as_str()) {
            warn!("[auth] could not store key at {}: {}", self.path.display(), e);
        }
    }

    fn clear(&self) {
        match fs::remove_file(&self.path) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!("[auth] could not remove {}: {}", self.path.display(), e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("esp-dash-{}-{}", name, std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        dir
    }

    #[test]
    fn save_load_clear() {
        let dir = scratch_dir("keys");
        let store = FileKeyStore::in_dir(&dir);
        assert_eq!(store.load(), None);

        store.save(&AccessKey::new("abc123").unwrap());
        assert_eq!(store.load().unwrap().as_str(), "abc123");

        store.clear();
        assert_eq!(store.load(), None);
        // clearing twice is fine
        store.clear();
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn blank_file_means_no_key() {
        let dir = scratch_dir("blank");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(KEY_FILE_NAME), "\n").unwrap();
        assert_eq!(FileKeyStore::in_dir(&dir).load(), None);
        let _ = fs::remove_dir_all(&dir);
    }
}
