//! Hierarchical key-value store backed by a JSON document
//!
//! Keys are slash-separated paths (`"overlay/zoom"`, `"net/proxy_host"`);
//! each path segment is an object in the underlying document. The store is
//! the only persistence boundary of this crate: the codec in `settings.rs`
//! maps every preference field to exactly one path here.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::{info, warn};

use crate::error::{StoreError, ValueError};

/// Defines an enum persisted as a `u32` index.
///
/// Generated `from_index` returns `None` for out-of-range values so the
/// codec can clamp to the field default instead of propagating an invalid
/// variant.
macro_rules! stored_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident = $index:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub fn index(self) -> u32 {
                match self { $(Self::$variant => $index),+ }
            }

            pub fn from_index(index: u32) -> Option<Self> {
                match index {
                    $($index => Some(Self::$variant),)+
                    _ => None,
                }
            }
        }
    };
}

pub(crate) use stored_enum;

/// Read a `stored_enum!` value persisted as its `u32` index. Absent keys
/// keep `current` silently; mismatched or out-of-range values keep
/// `current` and log.
pub(crate) fn read_enum<E: Copy>(
    store: &SettingsStore,
    key: &str,
    current: E,
    from_index: fn(u32) -> Option<E>,
) -> E {
    match store.get::<u32>(key) {
        Ok(index) => from_index(index).unwrap_or_else(|| {
            warn!(key, value = index, "enumeration out of range, keeping default");
            current
        }),
        Err(ValueError::Absent) => current,
        Err(ValueError::TypeMismatch) => {
            warn!(key, "stored value has the wrong shape, keeping default");
            current
        }
    }
}

/// A loaded settings document, addressed by slash-separated key paths.
///
/// All reads and writes are in-memory; [`SettingsStore::flush`] writes the
/// document back to disk. Last write wins, there is no merging.
#[derive(Debug, Clone, Default)]
pub struct SettingsStore {
    root: Map<String, Value>,
    path: Option<PathBuf>,
}

impl SettingsStore {
    /// An empty store with no backing file. Used in tests and as the
    /// fallback when no configuration has ever been written.
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Default on-disk location: `<config dir>/voxcom/settings.json`.
    pub fn default_path() -> PathBuf {
        let mut path = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        path.push("voxcom");
        path.push("settings.json");
        path
    }

    /// Open the store at `path`. A missing file yields an empty store bound
    /// to that path; an unreadable or unparseable file is a store-wide
    /// failure.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if !path.exists() {
            info!(path = %path.display(), "no settings file, starting from defaults");
            return Ok(Self {
                root: Map::new(),
                path: Some(path.to_path_buf()),
            });
        }

        let contents = fs::read_to_string(path)?;
        let value: Value = serde_json::from_str(&contents)?;
        let root = match value {
            Value::Object(map) => map,
            _ => {
                warn!(path = %path.display(), "settings file is not a JSON object, ignoring it");
                Map::new()
            }
        };

        Ok(Self {
            root,
            path: Some(path.to_path_buf()),
        })
    }

    /// Write the document back to the file this store was opened at.
    pub fn flush(&self) -> Result<(), StoreError> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(&Value::Object(self.root.clone()))?;
        fs::write(path, json)?;
        info!(path = %path.display(), "saved settings");
        Ok(())
    }

    fn node(&self, key: &str) -> Option<&Value> {
        let mut current: &Value = self.root.get(key.split('/').next()?)?;
        for segment in key.split('/').skip(1) {
            current = current.as_object()?.get(segment)?;
        }
        Some(current)
    }

    /// Typed read. `Absent` if any path segment is missing, `TypeMismatch`
    /// if the stored value does not deserialize into `T`.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Result<T, ValueError> {
        let value = self.node(key).ok_or(ValueError::Absent)?;
        serde_json::from_value(value.clone()).map_err(|_| ValueError::TypeMismatch)
    }

    /// Read with fallback: absent keys keep the default silently, mismatched
    /// values keep the default and log.
    pub fn read_or<T: DeserializeOwned>(&self, key: &str, default: T) -> T {
        match self.get(key) {
            Ok(value) => value,
            Err(ValueError::Absent) => default,
            Err(ValueError::TypeMismatch) => {
                warn!(key, "stored value has the wrong shape, keeping default");
                default
            }
        }
    }

    /// Set the value at `key`, creating intermediate objects as needed.
    /// An intermediate node of the wrong shape is replaced.
    pub fn set<T: Serialize>(&mut self, key: &str, value: &T) {
        // Serializing a plain settings field cannot fail
        let value = serde_json::to_value(value).unwrap_or(Value::Null);

        let mut segments = key.split('/').peekable();
        let mut current = &mut self.root;
        while let Some(segment) = segments.next() {
            if segments.peek().is_none() {
                current.insert(segment.to_string(), value);
                return;
            }
            let entry = current
                .entry(segment.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            if !entry.is_object() {
                *entry = Value::Object(Map::new());
            }
            let Value::Object(map) = entry else { return };
            current = map;
        }
    }

    /// Remove the node at `key` (a leaf or an entire subtree). Missing keys
    /// are ignored.
    pub fn remove(&mut self, key: &str) {
        let Some((parent, leaf)) = key.rsplit_once('/') else {
            self.root.remove(key);
            return;
        };

        let mut current: Option<&mut Value> = None;
        let mut segments = parent.split('/');
        if let Some(first) = segments.next() {
            current = self.root.get_mut(first);
        }
        for segment in segments {
            current = current.and_then(|v| v.as_object_mut()).and_then(|m| m.get_mut(segment));
        }
        if let Some(map) = current.and_then(|v| v.as_object_mut()) {
            map.remove(leaf);
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.node(key).is_some()
    }

    /// Child key names directly under a group key. Used to enumerate
    /// persisted sub-structures (e.g. plugin digests).
    pub fn child_keys(&self, group: &str) -> Vec<String> {
        self.node(group)
            .and_then(|v| v.as_object())
            .map(|m| m.keys().cloned().collect())
            .unwrap_or_default()
    }
}
