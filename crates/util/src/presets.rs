//! Named sequence presets backed by a JSON key-value store.
//!
//! A preset maps a name to an ordered step sequence. The built-in presets are
//! always available; user-saved presets persist to a JSON file in the config
//! directory (`~/.config/radtest/presets.json` on most platforms) and shadow
//! a built-in of the same name.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use dirs_next::config_dir;
use indexmap::IndexMap;
use radtest_types::StepKind;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

/// Environment variable controlling the preset file location.
pub const PRESETS_PATH_ENV: &str = "RADTEST_PRESETS_PATH";

/// Default filename for the persisted preset store.
pub const PRESETS_FILE_NAME: &str = "presets.json";

/// Errors surfaced by preset store operations.
#[derive(Debug, Error)]
pub enum PresetStoreError {
    /// I/O failure while reading or writing the preset file.
    #[error("preset I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// Serialization or deserialization failure.
    #[error("preset serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Presets available without any stored state, in display order.
pub fn builtin_presets() -> IndexMap<String, Vec<StepKind>> {
    IndexMap::from([
        (
            "full-session".to_string(),
            vec![StepKind::Auth, StepKind::Start, StepKind::Alive, StepKind::Stop],
        ),
        ("auth-only".to_string(), vec![StepKind::Auth]),
        (
            "accounting-only".to_string(),
            vec![StepKind::Start, StepKind::Alive, StepKind::Stop],
        ),
    ])
}

#[derive(Default, Serialize, Deserialize)]
struct PresetFile {
    presets: IndexMap<String, Vec<StepKind>>,
}

/// Shared trait implemented by preset persistence backends.
pub trait PresetStore: Send + Sync {
    /// Look up one preset by name, checking stored presets before built-ins.
    fn get(&self, name: &str) -> Result<Option<Vec<StepKind>>, PresetStoreError>;

    /// Save or replace a named preset.
    fn insert(&self, name: String, sequence: Vec<StepKind>) -> Result<(), PresetStoreError>;

    /// Delete a stored preset. Returns `false` when nothing was stored under
    /// that name (built-ins cannot be deleted).
    fn remove(&self, name: &str) -> Result<bool, PresetStoreError>;

    /// Built-in presets followed by stored ones; a stored preset shadows a
    /// built-in of the same name.
    fn all(&self) -> Result<IndexMap<String, Vec<StepKind>>, PresetStoreError>;
}

fn merged_with_builtins(stored: &IndexMap<String, Vec<StepKind>>) -> IndexMap<String, Vec<StepKind>> {
    let mut merged = builtin_presets();
    for (name, sequence) in stored {
        merged.insert(name.clone(), sequence.clone());
    }
    merged
}

/// JSON-backed preset store persisted on disk.
pub struct JsonPresetStore {
    path: PathBuf,
    entries: Mutex<PresetFile>,
}

impl JsonPresetStore {
    /// Create a store at the provided path, or the default path when omitted.
    pub fn new<P: Into<Option<PathBuf>>>(path: P) -> Result<Self, PresetStoreError> {
        let resolved_path = path.into().unwrap_or_else(default_presets_path);
        let file = load_preset_file(&resolved_path)?;
        Ok(Self {
            path: resolved_path,
            entries: Mutex::new(file),
        })
    }

    /// Initialize a store using the default settings.
    pub fn with_defaults() -> Result<Self, PresetStoreError> {
        Self::new(None::<PathBuf>)
    }

    /// Path to the underlying JSON file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn save_locked(&self, file: &PresetFile) -> Result<(), PresetStoreError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(file)?;
        fs::write(&self.path, content)?;
        Ok(())
    }
}

impl PresetStore for JsonPresetStore {
    fn get(&self, name: &str) -> Result<Option<Vec<StepKind>>, PresetStoreError> {
        let entries = self.entries.lock().expect("preset lock poisoned");
        Ok(entries
            .presets
            .get(name)
            .cloned()
            .or_else(|| builtin_presets().shift_remove(name)))
    }

    fn insert(&self, name: String, sequence: Vec<StepKind>) -> Result<(), PresetStoreError> {
        let mut entries = self.entries.lock().expect("preset lock poisoned");
        entries.presets.insert(name, sequence);
        self.save_locked(&entries)
    }

    fn remove(&self, name: &str) -> Result<bool, PresetStoreError> {
        let mut entries = self.entries.lock().expect("preset lock poisoned");
        let removed = entries.presets.shift_remove(name).is_some();
        if removed {
            self.save_locked(&entries)?;
        }
        Ok(removed)
    }

    fn all(&self) -> Result<IndexMap<String, Vec<StepKind>>, PresetStoreError> {
        let entries = self.entries.lock().expect("preset lock poisoned");
        Ok(merged_with_builtins(&entries.presets))
    }
}

/// In-memory preset store primarily used for unit testing.
#[derive(Default)]
pub struct InMemoryPresetStore {
    entries: Mutex<PresetFile>,
}

impl InMemoryPresetStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PresetStore for InMemoryPresetStore {
    fn get(&self, name: &str) -> Result<Option<Vec<StepKind>>, PresetStoreError> {
        let entries = self.entries.lock().expect("preset lock poisoned");
        Ok(entries
            .presets
            .get(name)
            .cloned()
            .or_else(|| builtin_presets().shift_remove(name)))
    }

    fn insert(&self, name: String, sequence: Vec<StepKind>) -> Result<(), PresetStoreError> {
        let mut entries = self.entries.lock().expect("preset lock poisoned");
        entries.presets.insert(name, sequence);
        Ok(())
    }

    fn remove(&self, name: &str) -> Result<bool, PresetStoreError> {
        let mut entries = self.entries.lock().expect("preset lock poisoned");
        Ok(entries.presets.shift_remove(name).is_some())
    }

    fn all(&self) -> Result<IndexMap<String, Vec<StepKind>>, PresetStoreError> {
        let entries = self.entries.lock().expect("preset lock poisoned");
        Ok(merged_with_builtins(&entries.presets))
    }
}

fn default_presets_path() -> PathBuf {
    if let Ok(path) = env::var(PRESETS_PATH_ENV)
        && !path.trim().is_empty()
    {
        return PathBuf::from(path.trim());
    }

    config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("radtest")
        .join(PRESETS_FILE_NAME)
}

fn load_preset_file(path: &Path) -> Result<PresetFile, PresetStoreError> {
    match fs::read_to_string(path) {
        Ok(content) => match serde_json::from_str::<PresetFile>(&content) {
            Ok(file) => Ok(file),
            Err(error) => {
                warn!("Failed to parse preset file at {}: {}", path.display(), error);
                Ok(PresetFile::default())
            }
        },
        Err(error) if error.kind() == std::io::ErrorKind::NotFound => Ok(PresetFile::default()),
        Err(error) => Err(PresetStoreError::Io(error)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use radtest_types::StepKind::{Alive, Auth, Start, Stop};
    use tempfile::tempdir;

    #[test]
    fn builtins_are_always_visible() {
        let store = InMemoryPresetStore::new();
        let all = store.all().unwrap();
        assert_eq!(all["full-session"], vec![Auth, Start, Alive, Stop]);
        assert_eq!(store.get("auth-only").unwrap(), Some(vec![Auth]));
    }

    #[test]
    fn stored_presets_shadow_builtins() {
        let store = InMemoryPresetStore::new();
        store.insert("auth-only".into(), vec![Auth, Auth]).unwrap();
        assert_eq!(store.get("auth-only").unwrap(), Some(vec![Auth, Auth]));

        assert!(store.remove("auth-only").unwrap());
        assert_eq!(store.get("auth-only").unwrap(), Some(vec![Auth]));
        assert!(!store.remove("auth-only").unwrap(), "built-ins cannot be deleted");
    }

    #[test]
    fn json_store_persists_entries() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("presets.json");
        let store = JsonPresetStore::new(Some(path.clone())).unwrap();
        store.insert("keep-alive-soak".into(), vec![Auth, Start, Alive, Alive]).unwrap();

        drop(store);
        let reloaded = JsonPresetStore::new(Some(path)).unwrap();
        assert_eq!(
            reloaded.get("keep-alive-soak").unwrap(),
            Some(vec![Auth, Start, Alive, Alive])
        );
    }

    #[test]
    fn invalid_json_returns_builtins_only() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("presets.json");
        fs::write(&path, "not json").unwrap();

        let store = JsonPresetStore::new(Some(path)).unwrap();
        assert_eq!(store.all().unwrap().len(), builtin_presets().len());
    }

    #[test]
    fn default_path_honors_env_override() {
        temp_env::with_var(PRESETS_PATH_ENV, Some("/tmp/custom-presets.json"), || {
            assert_eq!(default_presets_path(), PathBuf::from("/tmp/custom-presets.json"));
        });
    }
}
