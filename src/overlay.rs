//! Overlay configuration and the layout preset engine
//!
//! The overlay paints talking users on top of fullscreen applications; this
//! module only models its configuration. Geometry is stored as fractions of
//! the overlay size so the renderer can scale freely. Presets rewrite a
//! curated subset of the layout fields and leave everything else alone, in
//! particular the exclusion lists.

use serde::{Deserialize, Serialize};

use crate::store::{SettingsStore, read_enum, stored_enum};

/// Relative rectangle, all fields fractions of the overlay cell size.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RectF {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl RectF {
    pub const fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }
}

/// Font request for one overlay element. The renderer resolves the family;
/// this model only stores the choice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FontSpec {
    pub family: String,
    pub point_size: f32,
    #[serde(default)]
    pub bold: bool,
    #[serde(default)]
    pub italic: bool,
}

impl FontSpec {
    pub fn named(family: &str, point_size: f32) -> Self {
        Self {
            family: family.to_string(),
            point_size,
            bold: false,
            italic: false,
        }
    }
}

impl Default for FontSpec {
    fn default() -> Self {
        Self::named("DejaVu Sans", 20.0)
    }
}

stored_enum! {
    /// Which users the overlay shows
    OverlayShow {
        Talking = 0,
        Active = 1,
        HomeChannel = 2,
        LinkedChannels = 3,
    }
}

stored_enum! {
    /// How shown users are ordered
    OverlaySort {
        Alphabetical = 0,
        LastStateChange = 1,
    }
}

stored_enum! {
    /// Which include/exclude list pair governs overlay visibility.
    /// Switching modes keeps the inactive lists; no user-entered data is
    /// dropped.
    OverlayExclusionMode {
        LauncherFilter = 0,
        Whitelist = 1,
        Blacklist = 2,
    }
}

stored_enum! {
    /// Named layout presets
    OverlayPreset {
        AvatarAndName = 0,
        LargeSquareAvatar = 1,
    }
}

stored_enum! {
    /// Anchor of an element within its rectangle
    Alignment {
        TopLeft = 0,
        TopCenter = 1,
        TopRight = 2,
        CenterLeft = 3,
        Center = 4,
        CenterRight = 5,
        BottomLeft = 6,
        BottomCenter = 7,
        BottomRight = 8,
    }
}

/// Colors for the five user talk states: passive, talking, whispering,
/// shouting, muted-while-talking. Hex `#AARRGGBB` strings throughout.
pub const TALK_STATES: usize = 5;

/// Complete overlay configuration.
///
/// One flat bundle; subsystems take a `Clone` of it. The renderer reads it,
/// only the owning UI context writes it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverlaySettings {
    pub enable: bool,

    pub show: OverlayShow,
    /// Always show the local user even when not talking
    pub always_self: bool,
    /// Seconds a user stays shown after they stop talking (Active mode)
    pub active_time_secs: u32,
    pub sort: OverlaySort,

    // Overall placement, fractions of screen size
    pub x: f32,
    pub y: f32,
    pub zoom: f32,
    pub columns: u32,

    pub user_name_colors: [String; TALK_STATES],
    pub user_name_font: FontSpec,
    pub channel_color: String,
    pub channel_font: FontSpec,
    pub fps_color: String,
    pub fps_font: FontSpec,

    pub box_pad: f32,
    pub box_pen_width: f32,
    pub box_pen_color: String,
    pub box_fill_color: String,

    // Element visibility
    pub show_user_name: bool,
    pub show_channel: bool,
    pub show_muted_deafened: bool,
    pub show_avatar: bool,
    pub show_box: bool,
    pub show_fps: bool,
    pub show_time: bool,

    // Relative element heights
    pub user_name_height: f32,
    pub channel_height: f32,
    pub muted_deafened_height: f32,
    pub avatar_height: f32,
    pub fps_height: f32,
    /// Whole-cell opacity per talk state
    pub user_opacity: [f32; TALK_STATES],

    pub user_name_rect: RectF,
    pub channel_rect: RectF,
    pub muted_deafened_rect: RectF,
    pub avatar_rect: RectF,
    pub fps_rect: RectF,
    pub time_rect: RectF,

    pub user_name_align: Alignment,
    pub channel_align: Alignment,
    pub muted_deafened_align: Alignment,
    pub avatar_align: Alignment,

    pub exclusion_mode: OverlayExclusionMode,
    pub launchers: Vec<String>,
    pub launchers_exclude: Vec<String>,
    pub whitelist: Vec<String>,
    pub whitelist_exclude: Vec<String>,
    pub paths: Vec<String>,
    pub paths_exclude: Vec<String>,
    pub blacklist: Vec<String>,
    pub blacklist_exclude: Vec<String>,
}

impl Default for OverlaySettings {
    fn default() -> Self {
        let mut settings = Self {
            enable: false,

            show: OverlayShow::Talking,
            always_self: true,
            active_time_secs: 5,
            sort: OverlaySort::Alphabetical,

            x: 1.0,
            y: 0.0,
            zoom: 0.875,
            columns: 2,

            user_name_colors: [
                "#C0FFFFFF".to_string(), // passive
                "#FFFFFFFF".to_string(), // talking
                "#FF8080FF".to_string(), // whispering
                "#FFFFE080".to_string(), // shouting
                "#C0FF8080".to_string(), // muted while talking
            ],
            user_name_font: FontSpec::default(),
            channel_color: "#C0FFFFFF".to_string(),
            channel_font: FontSpec::default(),
            fps_color: "#FFFFFFFF".to_string(),
            fps_font: FontSpec::default(),

            box_pad: 0.01,
            box_pen_width: 0.002,
            box_pen_color: "#3F000000".to_string(),
            box_fill_color: "#3F808080".to_string(),

            show_user_name: true,
            show_channel: false,
            show_muted_deafened: true,
            show_avatar: true,
            show_box: false,
            show_fps: false,
            show_time: false,

            user_name_height: 0.75,
            channel_height: 0.75,
            muted_deafened_height: 0.5,
            avatar_height: 1.0,
            fps_height: 0.75,
            user_opacity: [0.5, 1.0, 1.0, 1.0, 0.5],

            user_name_rect: RectF::default(),
            channel_rect: RectF::default(),
            muted_deafened_rect: RectF::default(),
            avatar_rect: RectF::default(),
            fps_rect: RectF::new(0.0, 0.05, 0.2, 0.1),
            time_rect: RectF::new(0.0, 0.2, 0.2, 0.1),

            user_name_align: Alignment::CenterLeft,
            channel_align: Alignment::CenterLeft,
            muted_deafened_align: Alignment::Center,
            avatar_align: Alignment::Center,

            exclusion_mode: OverlayExclusionMode::LauncherFilter,
            launchers: Vec::new(),
            launchers_exclude: Vec::new(),
            whitelist: Vec::new(),
            whitelist_exclude: Vec::new(),
            paths: Vec::new(),
            paths_exclude: Vec::new(),
            blacklist: Vec::new(),
            blacklist_exclude: Vec::new(),
        };
        settings.apply_preset(OverlayPreset::AvatarAndName);
        settings
    }
}

impl OverlaySettings {
    /// Rewrite the preset's declared layout subset: element rectangles,
    /// heights, alignments, fonts, optional-element visibility and column
    /// count. Overall position, colors, show/sort modes, the enable flag and
    /// the exclusion configuration are out of every preset's subset.
    /// Applying the same preset twice is a no-op the second time.
    pub fn apply_preset(&mut self, preset: OverlayPreset) {
        match preset {
            OverlayPreset::AvatarAndName => {
                self.columns = 2;

                self.show_user_name = true;
                self.show_channel = false;
                self.show_muted_deafened = true;
                self.show_avatar = true;
                self.show_box = false;

                self.user_name_height = 0.75;
                self.channel_height = 0.75;
                self.muted_deafened_height = 0.5;
                self.avatar_height = 1.0;

                self.avatar_rect = RectF::new(0.0, 0.0, 0.125, 1.0);
                self.user_name_rect = RectF::new(0.15, 0.0, 0.85, 1.0);
                self.channel_rect = RectF::new(0.15, 0.0, 0.85, 1.0);
                self.muted_deafened_rect = RectF::new(0.85, 0.0, 0.125, 1.0);

                self.user_name_align = Alignment::CenterLeft;
                self.channel_align = Alignment::CenterLeft;
                self.muted_deafened_align = Alignment::Center;
                self.avatar_align = Alignment::Center;

                self.user_name_font = FontSpec::named("DejaVu Sans", 20.0);
                self.channel_font = FontSpec::named("DejaVu Sans", 20.0);
            }
            OverlayPreset::LargeSquareAvatar => {
                self.columns = 4;

                self.show_user_name = true;
                self.show_channel = false;
                self.show_muted_deafened = true;
                self.show_avatar = true;
                self.show_box = false;

                self.user_name_height = 0.2;
                self.channel_height = 0.2;
                self.muted_deafened_height = 0.35;
                self.avatar_height = 1.0;

                self.avatar_rect = RectF::new(0.0, 0.0, 1.0, 0.78);
                self.user_name_rect = RectF::new(0.0, 0.8, 1.0, 0.2);
                self.channel_rect = RectF::new(0.0, 0.8, 1.0, 0.2);
                self.muted_deafened_rect = RectF::new(0.625, 0.425, 0.35, 0.35);

                self.user_name_align = Alignment::BottomCenter;
                self.channel_align = Alignment::BottomCenter;
                self.muted_deafened_align = Alignment::Center;
                self.avatar_align = Alignment::TopCenter;

                self.user_name_font = FontSpec::named("DejaVu Sans", 12.0);
                self.channel_font = FontSpec::named("DejaVu Sans", 12.0);
            }
        }
    }

    /// Read every overlay field from the `overlay` group, keeping current
    /// values for absent or malformed keys.
    pub fn load(&mut self, store: &SettingsStore) {
        self.enable = store.read_or("overlay/enable", self.enable);

        self.show = read_enum(store, "overlay/show", self.show, OverlayShow::from_index);
        self.always_self = store.read_or("overlay/always_self", self.always_self);
        self.active_time_secs = store.read_or("overlay/active_time_secs", self.active_time_secs);
        self.sort = read_enum(store, "overlay/sort", self.sort, OverlaySort::from_index);

        self.x = store.read_or("overlay/x", self.x);
        self.y = store.read_or("overlay/y", self.y);
        self.zoom = store.read_or("overlay/zoom", self.zoom);
        self.columns = store.read_or("overlay/columns", self.columns);

        self.user_name_colors =
            store.read_or("overlay/user_name_colors", self.user_name_colors.clone());
        self.user_name_font = store.read_or("overlay/user_name_font", self.user_name_font.clone());
        self.channel_color = store.read_or("overlay/channel_color", self.channel_color.clone());
        self.channel_font = store.read_or("overlay/channel_font", self.channel_font.clone());
        self.fps_color = store.read_or("overlay/fps_color", self.fps_color.clone());
        self.fps_font = store.read_or("overlay/fps_font", self.fps_font.clone());

        self.box_pad = store.read_or("overlay/box_pad", self.box_pad);
        self.box_pen_width = store.read_or("overlay/box_pen_width", self.box_pen_width);
        self.box_pen_color = store.read_or("overlay/box_pen_color", self.box_pen_color.clone());
        self.box_fill_color = store.read_or("overlay/box_fill_color", self.box_fill_color.clone());

        self.show_user_name = store.read_or("overlay/show_user_name", self.show_user_name);
        self.show_channel = store.read_or("overlay/show_channel", self.show_channel);
        self.show_muted_deafened =
            store.read_or("overlay/show_muted_deafened", self.show_muted_deafened);
        self.show_avatar = store.read_or("overlay/show_avatar", self.show_avatar);
        self.show_box = store.read_or("overlay/show_box", self.show_box);
        self.show_fps = store.read_or("overlay/show_fps", self.show_fps);
        self.show_time = store.read_or("overlay/show_time", self.show_time);

        self.user_name_height = store.read_or("overlay/user_name_height", self.user_name_height);
        self.channel_height = store.read_or("overlay/channel_height", self.channel_height);
        self.muted_deafened_height =
            store.read_or("overlay/muted_deafened_height", self.muted_deafened_height);
        self.avatar_height = store.read_or("overlay/avatar_height", self.avatar_height);
        self.fps_height = store.read_or("overlay/fps_height", self.fps_height);
        self.user_opacity = store.read_or("overlay/user_opacity", self.user_opacity);

        self.user_name_rect = store.read_or("overlay/user_name_rect", self.user_name_rect);
        self.channel_rect = store.read_or("overlay/channel_rect", self.channel_rect);
        self.muted_deafened_rect =
            store.read_or("overlay/muted_deafened_rect", self.muted_deafened_rect);
        self.avatar_rect = store.read_or("overlay/avatar_rect", self.avatar_rect);
        self.fps_rect = store.read_or("overlay/fps_rect", self.fps_rect);
        self.time_rect = store.read_or("overlay/time_rect", self.time_rect);

        self.user_name_align = read_enum(
            store,
            "overlay/user_name_align",
            self.user_name_align,
            Alignment::from_index,
        );
        self.channel_align = read_enum(
            store,
            "overlay/channel_align",
            self.channel_align,
            Alignment::from_index,
        );
        self.muted_deafened_align = read_enum(
            store,
            "overlay/muted_deafened_align",
            self.muted_deafened_align,
            Alignment::from_index,
        );
        self.avatar_align = read_enum(
            store,
            "overlay/avatar_align",
            self.avatar_align,
            Alignment::from_index,
        );

        self.exclusion_mode = read_enum(
            store,
            "overlay/exclusion_mode",
            self.exclusion_mode,
            OverlayExclusionMode::from_index,
        );
        self.launchers = store.read_or("overlay/launchers", self.launchers.clone());
        self.launchers_exclude =
            store.read_or("overlay/launchers_exclude", self.launchers_exclude.clone());
        self.whitelist = store.read_or("overlay/whitelist", self.whitelist.clone());
        self.whitelist_exclude =
            store.read_or("overlay/whitelist_exclude", self.whitelist_exclude.clone());
        self.paths = store.read_or("overlay/paths", self.paths.clone());
        self.paths_exclude = store.read_or("overlay/paths_exclude", self.paths_exclude.clone());
        self.blacklist = store.read_or("overlay/blacklist", self.blacklist.clone());
        self.blacklist_exclude =
            store.read_or("overlay/blacklist_exclude", self.blacklist_exclude.clone());
    }

    /// Write every overlay field under the `overlay` group.
    pub fn save(&self, store: &mut SettingsStore) {
        store.set("overlay/enable", &self.enable);

        store.set("overlay/show", &self.show.index());
        store.set("overlay/always_self", &self.always_self);
        store.set("overlay/active_time_secs", &self.active_time_secs);
        store.set("overlay/sort", &self.sort.index());

        store.set("overlay/x", &self.x);
        store.set("overlay/y", &self.y);
        store.set("overlay/zoom", &self.zoom);
        store.set("overlay/columns", &self.columns);

        store.set("overlay/user_name_colors", &self.user_name_colors);
        store.set("overlay/user_name_font", &self.user_name_font);
        store.set("overlay/channel_color", &self.channel_color);
        store.set("overlay/channel_font", &self.channel_font);
        store.set("overlay/fps_color", &self.fps_color);
        store.set("overlay/fps_font", &self.fps_font);

        store.set("overlay/box_pad", &self.box_pad);
        store.set("overlay/box_pen_width", &self.box_pen_width);
        store.set("overlay/box_pen_color", &self.box_pen_color);
        store.set("overlay/box_fill_color", &self.box_fill_color);

        store.set("overlay/show_user_name", &self.show_user_name);
        store.set("overlay/show_channel", &self.show_channel);
        store.set("overlay/show_muted_deafened", &self.show_muted_deafened);
        store.set("overlay/show_avatar", &self.show_avatar);
        store.set("overlay/show_box", &self.show_box);
        store.set("overlay/show_fps", &self.show_fps);
        store.set("overlay/show_time", &self.show_time);

        store.set("overlay/user_name_height", &self.user_name_height);
        store.set("overlay/channel_height", &self.channel_height);
        store.set("overlay/muted_deafened_height", &self.muted_deafened_height);
        store.set("overlay/avatar_height", &self.avatar_height);
        store.set("overlay/fps_height", &self.fps_height);
        store.set("overlay/user_opacity", &self.user_opacity);

        store.set("overlay/user_name_rect", &self.user_name_rect);
        store.set("overlay/channel_rect", &self.channel_rect);
        store.set("overlay/muted_deafened_rect", &self.muted_deafened_rect);
        store.set("overlay/avatar_rect", &self.avatar_rect);
        store.set("overlay/fps_rect", &self.fps_rect);
        store.set("overlay/time_rect", &self.time_rect);

        store.set("overlay/user_name_align", &self.user_name_align.index());
        store.set("overlay/channel_align", &self.channel_align.index());
        store.set(
            "overlay/muted_deafened_align",
            &self.muted_deafened_align.index(),
        );
        store.set("overlay/avatar_align", &self.avatar_align.index());

        store.set("overlay/exclusion_mode", &self.exclusion_mode.index());
        store.set("overlay/launchers", &self.launchers);
        store.set("overlay/launchers_exclude", &self.launchers_exclude);
        store.set("overlay/whitelist", &self.whitelist);
        store.set("overlay/whitelist_exclude", &self.whitelist_exclude);
        store.set("overlay/paths", &self.paths);
        store.set("overlay/paths_exclude", &self.paths_exclude);
        store.set("overlay/blacklist", &self.blacklist);
        store.set("overlay/blacklist_exclude", &self.blacklist_exclude);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preset_is_idempotent() {
        for preset in [OverlayPreset::AvatarAndName, OverlayPreset::LargeSquareAvatar] {
            let mut settings = OverlaySettings::default();
            settings.apply_preset(preset);
            let first = settings.clone();
            settings.apply_preset(preset);
            assert_eq!(settings, first);
        }
    }

    #[test]
    fn test_preset_leaves_exclusion_config_alone() {
        let mut settings = OverlaySettings::default();
        settings.exclusion_mode = OverlayExclusionMode::Blacklist;
        settings.whitelist = vec!["game.exe".to_string()];
        settings.blacklist = vec!["browser".to_string()];
        settings.launchers_exclude = vec!["steam".to_string()];

        settings.apply_preset(OverlayPreset::LargeSquareAvatar);

        assert_eq!(settings.exclusion_mode, OverlayExclusionMode::Blacklist);
        assert_eq!(settings.whitelist, vec!["game.exe"]);
        assert_eq!(settings.blacklist, vec!["browser"]);
        assert_eq!(settings.launchers_exclude, vec!["steam"]);
    }

    #[test]
    fn test_preset_leaves_enable_and_modes_alone() {
        let mut settings = OverlaySettings::default();
        settings.enable = true;
        settings.show = OverlayShow::LinkedChannels;
        settings.sort = OverlaySort::LastStateChange;
        settings.x = 0.25;
        settings.y = 0.75;

        settings.apply_preset(OverlayPreset::AvatarAndName);

        assert!(settings.enable);
        assert_eq!(settings.show, OverlayShow::LinkedChannels);
        assert_eq!(settings.sort, OverlaySort::LastStateChange);
        assert_eq!(settings.x, 0.25);
        assert_eq!(settings.y, 0.75);
    }

    #[test]
    fn test_presets_differ_in_declared_subset() {
        let mut a = OverlaySettings::default();
        a.apply_preset(OverlayPreset::AvatarAndName);
        let mut b = OverlaySettings::default();
        b.apply_preset(OverlayPreset::LargeSquareAvatar);

        assert_ne!(a.avatar_rect, b.avatar_rect);
        assert_ne!(a.columns, b.columns);
    }

    #[test]
    fn test_roundtrip_defaults() {
        let mut store = SettingsStore::in_memory();
        let original = OverlaySettings::default();
        original.save(&mut store);

        let mut loaded = OverlaySettings::default();
        loaded.load(&store);
        assert_eq!(loaded, original);
    }

    #[test]
    fn test_roundtrip_modified() {
        let mut store = SettingsStore::in_memory();
        let mut original = OverlaySettings::default();
        original.enable = true;
        original.zoom = 1.5;
        original.columns = 7;
        original.exclusion_mode = OverlayExclusionMode::Whitelist;
        original.whitelist = vec!["äöü game".to_string()];
        original.user_name_colors[1] = "#FF00FF00".to_string();
        original.apply_preset(OverlayPreset::LargeSquareAvatar);
        original.save(&mut store);

        let mut loaded = OverlaySettings::default();
        loaded.load(&store);
        assert_eq!(loaded, original);
    }

    #[test]
    fn test_never_saved_install_loads_defaults() {
        let store = SettingsStore::in_memory();
        let mut loaded = OverlaySettings::default();
        loaded.load(&store);
        assert_eq!(loaded, OverlaySettings::default());
    }

    #[test]
    fn test_out_of_range_enum_keeps_default() {
        let mut store = SettingsStore::in_memory();
        store.set("overlay/show", &99u32);
        store.set("overlay/sort", &7u32);
        store.set("overlay/exclusion_mode", &42u32);
        store.set("overlay/user_name_align", &200u32);
        store.set("overlay/avatar_align", &9u32);

        let defaults = OverlaySettings::default();
        let mut loaded = OverlaySettings::default();
        loaded.load(&store);
        assert_eq!(loaded.show, defaults.show);
        assert_eq!(loaded.sort, defaults.sort);
        assert_eq!(loaded.exclusion_mode, defaults.exclusion_mode);
        assert_eq!(loaded.user_name_align, defaults.user_name_align);
        assert_eq!(loaded.avatar_align, defaults.avatar_align);
    }

    #[test]
    fn test_position_roundtrips_exactly() {
        let mut store = SettingsStore::in_memory();
        let mut original = OverlaySettings::default();
        original.x = 1.5;
        original.y = -0.25;
        original.save(&mut store);

        let mut loaded = OverlaySettings::default();
        loaded.load(&store);
        assert_eq!(loaded.x, 1.5);
        assert_eq!(loaded.y, -0.25);
        assert_eq!(loaded, original);
    }

    #[test]
    fn test_enum_indices_roundtrip() {
        for index in 0..3 {
            let mode = OverlayExclusionMode::from_index(index).unwrap();
            assert_eq!(mode.index(), index);
        }
        assert_eq!(OverlayExclusionMode::from_index(3), None);
    }
}
