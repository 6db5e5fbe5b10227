//! Per-plugin settings, keyed by a digest of the plugin's path
//!
//! The registry key is the hex SHA-256 of the plugin's UTF-8 encoded
//! absolute path. A derived key stays fixed-size for arbitrarily long paths,
//! survives path re-encoding, and is independent of whatever identity
//! metadata the plugin binary itself carries. Lookups re-hash the path at
//! query time; the raw path is never a map key.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::warn;

use crate::store::SettingsStore;

const GROUP: &str = "plugin_settings/pluginSettingHash";

/// Hex digest of a plugin's absolute path. Two distinct paths hashing to the
/// same digest are treated as the same plugin; collisions are neither
/// detected nor resolved here.
pub fn path_hash(path: &str) -> String {
    hex::encode(Sha256::digest(path.as_bytes()))
}

/// Enable and feature flags for one plugin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginSetting {
    /// Absolute filesystem path of the plugin library
    pub path: String,
    pub enabled: bool,
    pub positional_data_enabled: bool,
    pub allow_keyboard_monitoring: bool,
}

impl PluginSetting {
    /// Compiled defaults for a plugin that has never been configured.
    pub fn defaults_for(path: &str) -> Self {
        Self {
            path: path.to_string(),
            enabled: true,
            positional_data_enabled: true,
            allow_keyboard_monitoring: false,
        }
    }
}

/// All configured plugins, keyed by [`path_hash`] of their path.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PluginRegistry {
    entries: HashMap<String, PluginSetting>,
}

impl PluginRegistry {
    /// Settings for `path`. A plugin that was never configured gets its
    /// compiled defaults without being inserted, so scanning a plugin
    /// directory does not persist an entry per plugin ever seen.
    pub fn get(&self, path: &str) -> PluginSetting {
        self.entries
            .get(&path_hash(path))
            .cloned()
            .unwrap_or_else(|| PluginSetting::defaults_for(path))
    }

    /// Upsert the settings for `path`. The stored path is forced to the
    /// queried one so a digest collision cannot smuggle in a foreign path.
    pub fn set(&mut self, path: &str, mut setting: PluginSetting) {
        setting.path = path.to_string();
        self.entries.insert(path_hash(path), setting);
    }

    pub fn contains(&self, path: &str) -> bool {
        self.entries.contains_key(&path_hash(path))
    }

    pub fn remove(&mut self, path: &str) {
        self.entries.remove(&path_hash(path));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &PluginSetting)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Rebuild the registry from every digest persisted under the plugin
    /// group. Entries without a readable path are skipped.
    pub fn load(&mut self, store: &SettingsStore) {
        self.entries.clear();
        for digest in store.child_keys(GROUP) {
            let prefix = format!("{GROUP}/{digest}");
            let Ok(path) = store.get::<String>(&format!("{prefix}/path")) else {
                warn!(digest = %digest, "plugin entry without a path, skipping");
                continue;
            };
            let defaults = PluginSetting::defaults_for(&path);
            let setting = PluginSetting {
                path,
                enabled: store.read_or(&format!("{prefix}/enabled"), defaults.enabled),
                positional_data_enabled: store.read_or(
                    &format!("{prefix}/positional_data_enabled"),
                    defaults.positional_data_enabled,
                ),
                allow_keyboard_monitoring: store.read_or(
                    &format!("{prefix}/allow_keyboard_monitoring"),
                    defaults.allow_keyboard_monitoring,
                ),
            };
            self.entries.insert(digest, setting);
        }
    }

    /// Persist every entry as `pluginSettingHash/<digest>/<field>`,
    /// replacing whatever digests were stored before.
    pub fn save(&self, store: &mut SettingsStore) {
        store.remove(GROUP);
        for (digest, setting) in &self.entries {
            let prefix = format!("{GROUP}/{digest}");
            store.set(&format!("{prefix}/path"), &setting.path);
            store.set(&format!("{prefix}/enabled"), &setting.enabled);
            store.set(
                &format!("{prefix}/positional_data_enabled"),
                &setting.positional_data_enabled,
            );
            store.set(
                &format!("{prefix}/allow_keyboard_monitoring"),
                &setting.allow_keyboard_monitoring,
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_returns_defaults_without_inserting() {
        let registry = PluginRegistry::default();
        let setting = registry.get("/usr/lib/voxcom/positional.so");

        assert_eq!(setting.path, "/usr/lib/voxcom/positional.so");
        assert!(setting.enabled);
        assert!(setting.positional_data_enabled);
        assert!(!setting.allow_keyboard_monitoring);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_set_then_get() {
        let mut registry = PluginRegistry::default();
        let path = "/usr/lib/voxcom/game_link.so";
        let mut setting = PluginSetting::defaults_for(path);
        setting.enabled = false;
        setting.allow_keyboard_monitoring = true;

        registry.set(path, setting.clone());
        assert_eq!(registry.get(path), setting);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_non_ascii_and_long_paths() {
        let mut registry = PluginRegistry::default();
        let non_ascii = "/home/ユーザー/プラグイン/位置情報.so";
        let long: String = format!("/deep{}/plugin.so", "/nested".repeat(200));
        assert!(long.len() > 1000);

        for path in [non_ascii, long.as_str()] {
            let mut setting = PluginSetting::defaults_for(path);
            setting.positional_data_enabled = false;
            registry.set(path, setting.clone());
            assert_eq!(registry.get(path), setting);
        }
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_distinct_paths_do_not_collide() {
        let paths = [
            "/usr/lib/a.so",
            "/usr/lib/b.so",
            "/usr/lib/a.so ",
            "/usr/lib/A.so",
            "/home/ユーザー/a.so",
        ];
        let digests: std::collections::BTreeSet<String> =
            paths.iter().map(|p| path_hash(p)).collect();
        assert_eq!(digests.len(), paths.len());
    }

    #[test]
    fn test_digest_is_fixed_width_hex() {
        let digest = path_hash("/usr/lib/voxcom/positional.so");
        assert_eq!(digest.len(), 64);
        assert!(digest.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_store_roundtrip() {
        let mut registry = PluginRegistry::default();
        let mut setting = PluginSetting::defaults_for("/usr/lib/voxcom/link.so");
        setting.enabled = false;
        registry.set("/usr/lib/voxcom/link.so", setting);
        registry.set(
            "/usr/lib/voxcom/other.so",
            PluginSetting::defaults_for("/usr/lib/voxcom/other.so"),
        );

        let mut store = SettingsStore::in_memory();
        registry.save(&mut store);

        let mut loaded = PluginRegistry::default();
        loaded.load(&store);
        assert_eq!(loaded, registry);
    }

    #[test]
    fn test_save_drops_stale_digests() {
        let mut store = SettingsStore::in_memory();

        let mut registry = PluginRegistry::default();
        registry.set("/old.so", PluginSetting::defaults_for("/old.so"));
        registry.save(&mut store);

        registry.remove("/old.so");
        registry.set("/new.so", PluginSetting::defaults_for("/new.so"));
        registry.save(&mut store);

        let mut loaded = PluginRegistry::default();
        loaded.load(&store);
        assert_eq!(loaded.len(), 1);
        assert!(loaded.contains("/new.so"));
        assert!(!loaded.contains("/old.so"));
    }
}
