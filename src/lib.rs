//! Settings core for the VoxCom voice chat client
//!
//! Everything user-configurable lives in one [`Settings`] aggregate:
//! typed fields with compiled defaults, overlaid from a JSON-backed
//! key-path store on load and written back field-per-key on save. The
//! crate also carries the pieces the aggregate is built from: shortcut
//! bindings with set-semantics chords, shortcut target matching, overlay
//! layout presets and the per-plugin registry.
//!
//! The aggregate is owned by one context; every other consumer works on a
//! [`Settings::snapshot`] clone.

pub mod error;
pub mod overlay;
pub mod plugin;
pub mod settings;
pub mod shortcut;
pub mod store;
pub mod target;

pub use error::{StoreError, ValueError};
pub use overlay::{OverlayExclusionMode, OverlayPreset, OverlaySettings};
pub use plugin::{PluginRegistry, PluginSetting};
pub use settings::{SETTINGS_VERSION, Settings};
pub use shortcut::{ActionData, ButtonChord, ButtonId, Shortcut, find_chord_conflicts};
pub use store::SettingsStore;
pub use target::ShortcutTarget;
