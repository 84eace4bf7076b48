use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Result, SwitchboardError};

/// Key the upstream credential is stored under.
pub const API_KEY_KEY: &str = "openrouter_api_key";

/// Key the current theme (`light` / `dark`) is stored under.
pub const THEME_KEY: &str = "theme";

/// String key-value storage for preferences and the credential.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
    /// Removing a missing key is not an error.
    fn remove(&self, key: &str) -> Result<()>;
}

/// Process-local store.
#[derive(Debug, Default)]
pub struct MemoryKeyValueStore {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryKeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let values = self.values.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(values.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut values = self.values.lock().unwrap_or_else(PoisonError::into_inner);
        values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let mut values = self.values.lock().unwrap_or_else(PoisonError::into_inner);
        values.remove(key);
        Ok(())
    }
}

/// File-backed store keeping every key in one TOML file.
///
/// # Example
/// ```no_run
/// use switchboard::storage::{FileKeyValueStore, KeyValueStore, API_KEY_KEY};
///
/// let store = FileKeyValueStore::new_default();
/// store.set(API_KEY_KEY, "sk-or-v1-0123456789")?;
/// # Ok::<(), switchboard::error::SwitchboardError>(())
/// ```
#[derive(Debug)]
pub struct FileKeyValueStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileKeyValueStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// `settings.toml` inside `dir`.
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        Self::new(dir.as_ref().join("settings.toml"))
    }

    pub fn new_default() -> Self {
        Self::in_dir(super::default_data_dir())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<SettingsFile> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(data) => data,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Ok(SettingsFile::default())
            }
            Err(err) => return Err(err.into()),
        };
        toml::from_str(&raw).map_err(|e| {
            SwitchboardError::Storage(format!("invalid settings file {}: {e}", self.path.display()))
        })
    }

    fn store(&self, mut file: SettingsFile) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        file.version = 1;
        file.saved_at = Some(Utc::now());
        let serialized = toml::to_string(&file)?;

        let mut options = fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }
        let mut handle = options.open(&self.path)?;
        // `mode` only applies on creation; an existing file keeps its old bits.
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            handle.set_permissions(fs::Permissions::from_mode(0o600))?;
        }
        handle.write_all(serialized.as_bytes())?;
        handle.sync_all()?;
        Ok(())
    }
}

impl KeyValueStore for FileKeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.load()?.values.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut file = self.load()?;
        file.values.insert(key.to_string(), value.to_string());
        self.store(file)
    }

    fn remove(&self, key: &str) -> Result<()> {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut file = self.load()?;
        if file.values.remove(key).is_none() {
            return Ok(());
        }
        self.store(file)
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct SettingsFile {
    #[serde(default)]
    version: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    saved_at: Option<DateTime<Utc>>,
    #[serde(default)]
    values: BTreeMap<String, String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn temp_store() -> (TempDir, FileKeyValueStore) {
        let dir = TempDir::new().unwrap();
        let store = FileKeyValueStore::in_dir(dir.path());
        (dir, store)
    }

    #[test]
    fn missing_file_reads_as_empty() {
        let (_dir, store) = temp_store();
        assert_eq!(store.get(API_KEY_KEY).unwrap(), None);
    }

    #[test]
    fn values_persist_across_instances() {
        let (dir, store) = temp_store();
        store.set(API_KEY_KEY, "sk-or-v1-abcdef").unwrap();
        store.set(THEME_KEY, "dark").unwrap();

        let reopened = FileKeyValueStore::in_dir(dir.path());
        assert_eq!(reopened.get(API_KEY_KEY).unwrap().as_deref(), Some("sk-or-v1-abcdef"));
        assert_eq!(reopened.get(THEME_KEY).unwrap().as_deref(), Some("dark"));
    }

    #[test]
    fn remove_deletes_only_that_key() {
        let (_dir, store) = temp_store();
        store.set(API_KEY_KEY, "sk-or-v1-abcdef").unwrap();
        store.set(THEME_KEY, "light").unwrap();

        store.remove(API_KEY_KEY).unwrap();
        store.remove("never-set").unwrap();

        assert_eq!(store.get(API_KEY_KEY).unwrap(), None);
        assert_eq!(store.get(THEME_KEY).unwrap().as_deref(), Some("light"));
    }

    #[cfg(unix)]
    #[test]
    fn settings_file_is_private() {
        use std::os::unix::fs::PermissionsExt;
        let (_dir, store) = temp_store();
        store.set(API_KEY_KEY, "sk-or-v1-abcdef").unwrap();
        let mode = fs::metadata(store.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[cfg(unix)]
    #[test]
    fn loose_existing_file_is_tightened_on_write() {
        use std::os::unix::fs::PermissionsExt;
        let (_dir, store) = temp_store();
        fs::write(store.path(), "version = 1\n").unwrap();
        fs::set_permissions(store.path(), fs::Permissions::from_mode(0o644)).unwrap();

        store.set(API_KEY_KEY, "sk-or-v1-abcdef").unwrap();

        let mode = fs::metadata(store.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
        assert_eq!(store.get(API_KEY_KEY).unwrap().as_deref(), Some("sk-or-v1-abcdef"));
    }

    #[test]
    fn corrupt_file_is_a_storage_error() {
        let (_dir, store) = temp_store();
        fs::write(store.path(), "values = [not toml").unwrap();
        assert!(matches!(store.get(THEME_KEY), Err(SwitchboardError::Storage(_))));
    }
}
