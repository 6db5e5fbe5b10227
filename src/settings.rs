//! The top-level preference aggregate and its persistence codec
//!
//! One `Settings` value lives for the whole session, owned by the UI
//! context. Audio, network and overlay subsystems run elsewhere and get
//! `Clone` snapshots; they never hold a live reference into the owner's
//! copy. Every persisted field maps to exactly one key path in the store;
//! loading falls back to the compiled default per field and never fails as
//! a whole unless the store itself is unavailable.

use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use crate::overlay::OverlaySettings;
use crate::plugin::PluginRegistry;
use crate::shortcut::Shortcut;
use crate::store::{SettingsStore, read_enum, stored_enum};

/// Schema generation written by `save`. Readers tolerate stores written
/// under older generations by running the migrations below before the
/// regular field reads.
pub const SETTINGS_VERSION: u32 = 2;

stored_enum! {
    /// How transmission is triggered
    AudioTransmit {
        Continuous = 0,
        VoiceActivity = 1,
        PushToTalk = 2,
    }
}

stored_enum! {
    /// Signal measure driving voice-activity detection
    VadSource {
        Amplitude = 0,
        SignalToNoise = 1,
    }
}

stored_enum! {
    NoiseCancel {
        Off = 0,
        Speex = 1,
        Rnn = 2,
        Both = 3,
    }
}

stored_enum! {
    EchoCancel {
        Disabled = 0,
        SpeexMixed = 1,
        SpeexMultichannel = 2,
    }
}

stored_enum! {
    /// What to do after `idle_time_secs` without input
    IdleAction {
        Nothing = 0,
        Deafen = 1,
        Mute = 2,
    }
}

stored_enum! {
    /// Audio loopback for testing. Runtime-only, never persisted.
    LoopMode {
        None = 0,
        Local = 1,
        Server = 2,
    }
}

stored_enum! {
    ChannelExpand {
        None = 0,
        WithUsers = 1,
        All = 2,
    }
}

stored_enum! {
    ChannelDrag {
        Ask = 0,
        DoNothing = 1,
        Move = 2,
    }
}

stored_enum! {
    /// Which servers the connect dialog lists
    ServerShow {
        Populated = 0,
        Reachable = 1,
        All = 2,
    }
}

stored_enum! {
    AlwaysOnTop {
        Never = 0,
        Always = 1,
        InMinimal = 2,
        InNormal = 3,
    }
}

stored_enum! {
    ProxyType {
        None = 0,
        Http = 1,
        Socks5 = 2,
    }
}

stored_enum! {
    RecordingMode {
        Mixdown = 0,
        Multichannel = 1,
    }
}

/// The complete preference bundle.
///
/// Constructed at compiled defaults, overlaid with persisted values by
/// [`Settings::load`], mutated only by the owning context, written back by
/// [`Settings::save`]. `Clone` is the snapshot operation for consumers on
/// other threads.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    // Audio input
    pub transmit: AudioTransmit,
    /// Window within which a second push-to-talk press locks transmit on
    pub double_push_msec: u64,
    /// How long transmission continues after push-to-talk is released
    pub ptt_hold_msec: u64,
    pub tx_audio_cue: bool,
    pub tx_audio_cue_on: String,
    pub tx_audio_cue_off: String,
    pub tx_mute_cue: bool,
    pub tx_mute_cue_file: String,
    pub quality_bitrate: i32,
    pub min_loudness: i32,
    pub voice_hold: i32,
    pub jitter_buffer: i32,
    pub allow_low_delay: bool,
    pub noise_cancel: NoiseCancel,
    pub speex_noise_cancel_strength: i32,
    pub vad_source: VadSource,
    pub vad_min: f32,
    pub vad_max: f32,
    pub frames_per_packet: i32,
    pub audio_input_device: String,
    pub echo_cancel: EchoCancel,
    pub transmit_position: bool,
    pub mute: bool,
    pub deaf: bool,

    // Idle auto actions
    pub idle_time_secs: u32,
    pub idle_action: IdleAction,
    pub undo_idle_action_on_activity: bool,

    // Audio output
    pub audio_output_device: String,
    pub volume: f32,
    pub other_volume: f32,
    pub attenuate_others_on_talk: bool,
    pub attenuate_others: bool,
    pub attenuate_users_on_priority_speak: bool,
    pub only_attenuate_same_output: bool,
    pub attenuate_loopbacks: bool,
    pub output_delay_frames: i32,
    pub positional_audio: bool,
    pub positional_headphone: bool,
    pub audio_min_distance: f32,
    pub audio_max_distance: f32,
    pub audio_max_dist_volume: f32,
    pub audio_bloom: f32,

    // Shortcuts
    pub shortcuts_enable: bool,
    pub enable_evdev: bool,
    pub enable_xinput2: bool,
    pub enable_gamepad_input: bool,
    pub shortcuts: Vec<Shortcut>,

    pub overlay: OverlaySettings,
    pub plugins: PluginRegistry,

    // Messages / TTS
    pub max_log_blocks: i32,
    pub log_24_hour_clock: bool,
    pub chat_message_margins: i32,
    pub whisper_friends: bool,
    pub message_limit_user_threshold: i32,
    pub tts: bool,
    pub tts_volume: i32,
    pub tts_threshold: i32,
    pub tts_language: String,

    // UI
    pub language: String,
    pub theme_name: String,
    pub theme_style_name: String,
    pub expand: ChannelExpand,
    pub channel_drag: ChannelDrag,
    pub user_drag: ChannelDrag,
    pub minimal_view: bool,
    pub hide_frame: bool,
    pub always_on_top: AlwaysOnTop,
    pub ask_on_quit: bool,
    pub minimize_on_quit: bool,
    pub hide_in_tray: bool,
    pub user_top: bool,
    pub show_user_count: bool,
    pub show_volume_adjustments: bool,
    pub show_nicknames_only: bool,
    pub filter_hides_empty_channels: bool,
    pub filter_active: bool,
    pub username: String,
    pub last_server: String,
    pub server_show: ServerShow,
    pub update_check: bool,
    pub plugin_check: bool,
    pub plugin_auto_update: bool,

    // Network
    pub force_tcp: bool,
    pub reconnect: bool,
    pub auto_connect: bool,
    pub qos: bool,
    pub disable_public_list: bool,
    pub proxy_type: ProxyType,
    pub proxy_host: String,
    pub proxy_port: u16,
    pub proxy_username: String,
    pub proxy_password: String,
    pub ping_interval_msec: i32,
    pub connection_timeout_msec: i32,
    pub max_in_flight_tcp_pings: i32,
    pub udp_force_tcp_addr: bool,
    pub ssl_ciphers: String,

    // Privacy
    pub hide_os: bool,
    pub suppress_identity: bool,

    // Accessibility
    pub high_contrast: bool,

    // Recording
    pub recording_path: String,
    pub recording_file_pattern: String,
    pub recording_mode: RecordingMode,
    pub recording_format: i32,

    /// Schema generation last written to the store
    pub update_counter: u32,

    // Runtime-only fields. Defaulted on every construction, never read
    // from or written to the store.
    pub loop_mode: LoopMode,
    pub packet_loss: f32,
    pub max_packet_delay_msec: f32,
    pub require_restart_to_apply: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            transmit: AudioTransmit::VoiceActivity,
            double_push_msec: 0,
            ptt_hold_msec: 0,
            tx_audio_cue: false,
            tx_audio_cue_on: "cues/push_on.ogg".to_string(),
            tx_audio_cue_off: "cues/push_off.ogg".to_string(),
            tx_mute_cue: false,
            tx_mute_cue_file: "cues/muted.ogg".to_string(),
            quality_bitrate: 40_000,
            min_loudness: 1_000,
            voice_hold: 50,
            jitter_buffer: 1,
            allow_low_delay: true,
            noise_cancel: NoiseCancel::Rnn,
            speex_noise_cancel_strength: -30,
            vad_source: VadSource::SignalToNoise,
            vad_min: 0.8,
            vad_max: 0.98,
            frames_per_packet: 2,
            audio_input_device: String::new(),
            echo_cancel: EchoCancel::Disabled,
            transmit_position: false,
            mute: false,
            deaf: false,

            idle_time_secs: 5 * 60,
            idle_action: IdleAction::Nothing,
            undo_idle_action_on_activity: false,

            audio_output_device: String::new(),
            volume: 1.0,
            other_volume: 0.5,
            attenuate_others_on_talk: false,
            attenuate_others: true,
            attenuate_users_on_priority_speak: false,
            only_attenuate_same_output: false,
            attenuate_loopbacks: false,
            output_delay_frames: 5,
            positional_audio: true,
            positional_headphone: false,
            audio_min_distance: 1.0,
            audio_max_distance: 15.0,
            audio_max_dist_volume: 0.8,
            audio_bloom: 0.5,

            shortcuts_enable: true,
            enable_evdev: false,
            enable_xinput2: true,
            enable_gamepad_input: true,
            shortcuts: Vec::new(),

            overlay: OverlaySettings::default(),
            plugins: PluginRegistry::default(),

            max_log_blocks: 0,
            log_24_hour_clock: true,
            chat_message_margins: 3,
            whisper_friends: false,
            message_limit_user_threshold: 20,
            tts: true,
            tts_volume: 75,
            tts_threshold: 250,
            tts_language: String::new(),

            language: String::new(),
            theme_name: String::new(),
            theme_style_name: String::new(),
            expand: ChannelExpand::WithUsers,
            channel_drag: ChannelDrag::Ask,
            user_drag: ChannelDrag::Ask,
            minimal_view: false,
            hide_frame: false,
            always_on_top: AlwaysOnTop::Never,
            ask_on_quit: false,
            minimize_on_quit: false,
            hide_in_tray: true,
            user_top: true,
            show_user_count: false,
            show_volume_adjustments: true,
            show_nicknames_only: false,
            filter_hides_empty_channels: true,
            filter_active: false,
            username: String::new(),
            last_server: String::new(),
            server_show: ServerShow::Reachable,
            update_check: true,
            plugin_check: true,
            plugin_auto_update: false,

            force_tcp: false,
            reconnect: true,
            auto_connect: false,
            qos: true,
            disable_public_list: false,
            proxy_type: ProxyType::None,
            proxy_host: String::new(),
            proxy_port: 0,
            proxy_username: String::new(),
            proxy_password: String::new(),
            ping_interval_msec: 5_000,
            connection_timeout_msec: 30_000,
            max_in_flight_tcp_pings: 4,
            udp_force_tcp_addr: false,
            ssl_ciphers: String::new(),

            hide_os: false,
            suppress_identity: false,

            high_contrast: false,

            recording_path: String::new(),
            recording_file_pattern: "%user_%date".to_string(),
            recording_mode: RecordingMode::Mixdown,
            recording_format: 0,

            update_counter: 0,

            loop_mode: LoopMode::None,
            packet_loss: 0.0,
            max_packet_delay_msec: 0.0,
            require_restart_to_apply: false,
        }
    }
}

impl Settings {
    /// True iff acoustic echo cancellation should run.
    pub fn do_echo(&self) -> bool {
        self.echo_cancel != EchoCancel::Disabled
    }

    /// True iff positional audio processing should run.
    pub fn do_positional_audio(&self) -> bool {
        self.positional_audio && !self.deaf
    }

    /// Snapshot for a consuming subsystem on another thread. The snapshot is
    /// immutable for that operation's duration; the owner keeps mutating its
    /// own copy freely.
    pub fn snapshot(&self) -> Self {
        self.clone()
    }

    /// Field-specific schema migrations, run against the raw store before
    /// the regular field reads. Gated on the generation the store was last
    /// written under.
    fn migrate(&mut self, store: &SettingsStore, stored_version: u32) {
        // Generation 2 moved the account name out of the audio section.
        if stored_version < 2 && !store.contains("net/username") {
            if let Ok(name) = store.get::<String>("audio/input/username") {
                info!("migrating username from legacy audio/input key");
                self.username = name;
            }
        }
    }

    /// Overlay persisted values onto the compiled defaults already present
    /// in `self`. Absent keys keep their defaults, malformed keys keep their
    /// defaults and log; only store-wide unavailability is an error, and
    /// that is surfaced where the store is opened, not here.
    pub fn load(&mut self, store: &SettingsStore) {
        let stored_version = store.read_or("settings/update_counter", 0u32);
        self.migrate(store, stored_version);
        self.update_counter = stored_version;

        self.transmit = read_enum(
            store,
            "audio/input/transmit",
            self.transmit,
            AudioTransmit::from_index,
        );
        self.double_push_msec = store.read_or("audio/input/double_push_msec", self.double_push_msec);
        self.ptt_hold_msec = store.read_or("audio/input/ptt_hold_msec", self.ptt_hold_msec);
        self.tx_audio_cue = store.read_or("audio/input/tx_audio_cue", self.tx_audio_cue);
        self.tx_audio_cue_on =
            store.read_or("audio/input/tx_audio_cue_on", self.tx_audio_cue_on.clone());
        self.tx_audio_cue_off =
            store.read_or("audio/input/tx_audio_cue_off", self.tx_audio_cue_off.clone());
        self.tx_mute_cue = store.read_or("audio/input/tx_mute_cue", self.tx_mute_cue);
        self.tx_mute_cue_file =
            store.read_or("audio/input/tx_mute_cue_file", self.tx_mute_cue_file.clone());
        self.quality_bitrate = store.read_or("audio/input/quality", self.quality_bitrate);
        self.min_loudness = store.read_or("audio/input/min_loudness", self.min_loudness);
        self.voice_hold = store.read_or("audio/input/voice_hold", self.voice_hold);
        self.jitter_buffer = store.read_or("audio/input/jitter_buffer", self.jitter_buffer);
        self.allow_low_delay = store.read_or("audio/input/allow_low_delay", self.allow_low_delay);
        self.noise_cancel = read_enum(
            store,
            "audio/input/noise_cancel",
            self.noise_cancel,
            NoiseCancel::from_index,
        );
        self.speex_noise_cancel_strength = store.read_or(
            "audio/input/speex_noise_cancel_strength",
            self.speex_noise_cancel_strength,
        );
        self.vad_source = read_enum(
            store,
            "audio/input/vad_source",
            self.vad_source,
            VadSource::from_index,
        );
        self.vad_min = store.read_or("audio/input/vad_min", self.vad_min);
        self.vad_max = store.read_or("audio/input/vad_max", self.vad_max);
        self.frames_per_packet =
            store.read_or("audio/input/frames_per_packet", self.frames_per_packet);
        self.audio_input_device =
            store.read_or("audio/input/device", self.audio_input_device.clone());
        self.echo_cancel = read_enum(
            store,
            "audio/input/echo_cancel",
            self.echo_cancel,
            EchoCancel::from_index,
        );
        self.transmit_position =
            store.read_or("audio/input/transmit_position", self.transmit_position);
        self.mute = store.read_or("audio/input/mute", self.mute);
        self.deaf = store.read_or("audio/input/deaf", self.deaf);

        self.idle_time_secs = store.read_or("audio/input/idle_time_secs", self.idle_time_secs);
        self.idle_action = read_enum(
            store,
            "audio/input/idle_action",
            self.idle_action,
            IdleAction::from_index,
        );
        self.undo_idle_action_on_activity = store.read_or(
            "audio/input/undo_idle_action_on_activity",
            self.undo_idle_action_on_activity,
        );

        self.audio_output_device =
            store.read_or("audio/output/device", self.audio_output_device.clone());
        self.volume = store.read_or("audio/output/volume", self.volume);
        self.other_volume = store.read_or("audio/output/other_volume", self.other_volume);
        self.attenuate_others_on_talk = store.read_or(
            "audio/output/attenuate_others_on_talk",
            self.attenuate_others_on_talk,
        );
        self.attenuate_others =
            store.read_or("audio/output/attenuate_others", self.attenuate_others);
        self.attenuate_users_on_priority_speak = store.read_or(
            "audio/output/attenuate_users_on_priority_speak",
            self.attenuate_users_on_priority_speak,
        );
        self.only_attenuate_same_output = store.read_or(
            "audio/output/only_attenuate_same_output",
            self.only_attenuate_same_output,
        );
        self.attenuate_loopbacks =
            store.read_or("audio/output/attenuate_loopbacks", self.attenuate_loopbacks);
        self.output_delay_frames =
            store.read_or("audio/output/delay_frames", self.output_delay_frames);
        self.positional_audio =
            store.read_or("audio/output/positional_audio", self.positional_audio);
        self.positional_headphone = store.read_or(
            "audio/output/positional_headphone",
            self.positional_headphone,
        );
        self.audio_min_distance =
            store.read_or("audio/output/min_distance", self.audio_min_distance);
        self.audio_max_distance =
            store.read_or("audio/output/max_distance", self.audio_max_distance);
        self.audio_max_dist_volume =
            store.read_or("audio/output/max_dist_volume", self.audio_max_dist_volume);
        self.audio_bloom = store.read_or("audio/output/bloom", self.audio_bloom);

        self.shortcuts_enable = store.read_or("shortcut/enable", self.shortcuts_enable);
        self.enable_evdev = store.read_or("shortcut/enable_evdev", self.enable_evdev);
        self.enable_xinput2 = store.read_or("shortcut/enable_xinput2", self.enable_xinput2);
        self.enable_gamepad_input =
            store.read_or("shortcut/enable_gamepad_input", self.enable_gamepad_input);
        self.shortcuts = store.read_or("shortcut/list", self.shortcuts.clone());

        self.overlay.load(store);
        self.plugins.load(store);

        self.max_log_blocks = store.read_or("messages/max_log_blocks", self.max_log_blocks);
        self.log_24_hour_clock =
            store.read_or("messages/log_24_hour_clock", self.log_24_hour_clock);
        self.chat_message_margins =
            store.read_or("messages/chat_message_margins", self.chat_message_margins);
        self.whisper_friends = store.read_or("messages/whisper_friends", self.whisper_friends);
        self.message_limit_user_threshold = store.read_or(
            "messages/message_limit_user_threshold",
            self.message_limit_user_threshold,
        );
        self.tts = store.read_or("tts/enable", self.tts);
        self.tts_volume = store.read_or("tts/volume", self.tts_volume);
        self.tts_threshold = store.read_or("tts/threshold", self.tts_threshold);
        self.tts_language = store.read_or("tts/language", self.tts_language.clone());

        self.language = store.read_or("ui/language", self.language.clone());
        self.theme_name = store.read_or("ui/theme_name", self.theme_name.clone());
        self.theme_style_name =
            store.read_or("ui/theme_style_name", self.theme_style_name.clone());
        self.expand = read_enum(store, "ui/expand", self.expand, ChannelExpand::from_index);
        self.channel_drag = read_enum(
            store,
            "ui/channel_drag",
            self.channel_drag,
            ChannelDrag::from_index,
        );
        self.user_drag = read_enum(store, "ui/user_drag", self.user_drag, ChannelDrag::from_index);
        self.minimal_view = store.read_or("ui/minimal_view", self.minimal_view);
        self.hide_frame = store.read_or("ui/hide_frame", self.hide_frame);
        self.always_on_top = read_enum(
            store,
            "ui/always_on_top",
            self.always_on_top,
            AlwaysOnTop::from_index,
        );
        self.ask_on_quit = store.read_or("ui/ask_on_quit", self.ask_on_quit);
        self.minimize_on_quit = store.read_or("ui/minimize_on_quit", self.minimize_on_quit);
        self.hide_in_tray = store.read_or("ui/hide_in_tray", self.hide_in_tray);
        self.user_top = store.read_or("ui/user_top", self.user_top);
        self.show_user_count = store.read_or("ui/show_user_count", self.show_user_count);
        self.show_volume_adjustments =
            store.read_or("ui/show_volume_adjustments", self.show_volume_adjustments);
        self.show_nicknames_only =
            store.read_or("ui/show_nicknames_only", self.show_nicknames_only);
        self.filter_hides_empty_channels = store.read_or(
            "ui/filter_hides_empty_channels",
            self.filter_hides_empty_channels,
        );
        self.filter_active = store.read_or("ui/filter_active", self.filter_active);
        self.username = store.read_or("net/username", self.username.clone());
        self.last_server = store.read_or("net/last_server", self.last_server.clone());
        self.server_show = read_enum(
            store,
            "ui/server_show",
            self.server_show,
            ServerShow::from_index,
        );
        self.update_check = store.read_or("ui/update_check", self.update_check);
        self.plugin_check = store.read_or("ui/plugin_check", self.plugin_check);
        self.plugin_auto_update =
            store.read_or("ui/plugin_auto_update", self.plugin_auto_update);

        self.force_tcp = store.read_or("net/force_tcp", self.force_tcp);
        self.reconnect = store.read_or("net/reconnect", self.reconnect);
        self.auto_connect = store.read_or("net/auto_connect", self.auto_connect);
        self.qos = store.read_or("net/qos", self.qos);
        self.disable_public_list =
            store.read_or("net/disable_public_list", self.disable_public_list);
        self.proxy_type = read_enum(
            store,
            "net/proxy_type",
            self.proxy_type,
            ProxyType::from_index,
        );
        self.proxy_host = store.read_or("net/proxy_host", self.proxy_host.clone());
        self.proxy_port = store.read_or("net/proxy_port", self.proxy_port);
        self.proxy_username = store.read_or("net/proxy_username", self.proxy_username.clone());
        self.proxy_password = store.read_or("net/proxy_password", self.proxy_password.clone());
        self.ping_interval_msec =
            store.read_or("net/ping_interval_msec", self.ping_interval_msec);
        self.connection_timeout_msec =
            store.read_or("net/connection_timeout_msec", self.connection_timeout_msec);
        self.max_in_flight_tcp_pings =
            store.read_or("net/max_in_flight_tcp_pings", self.max_in_flight_tcp_pings);
        self.udp_force_tcp_addr =
            store.read_or("net/udp_force_tcp_addr", self.udp_force_tcp_addr);
        self.ssl_ciphers = store.read_or("net/ssl_ciphers", self.ssl_ciphers.clone());

        self.hide_os = store.read_or("privacy/hide_os", self.hide_os);
        self.suppress_identity =
            store.read_or("privacy/suppress_identity", self.suppress_identity);

        self.high_contrast = store.read_or("accessibility/high_contrast", self.high_contrast);

        self.recording_path = store.read_or("recording/path", self.recording_path.clone());
        self.recording_file_pattern =
            store.read_or("recording/file_pattern", self.recording_file_pattern.clone());
        self.recording_mode = read_enum(
            store,
            "recording/mode",
            self.recording_mode,
            RecordingMode::from_index,
        );
        self.recording_format = store.read_or("recording/format", self.recording_format);
    }

    /// Write every persisted field to its key and stamp the current schema
    /// generation. Runtime-only fields and legacy keys are never written;
    /// legacy keys are removed so a later load cannot resurrect them.
    pub fn save(&self, store: &mut SettingsStore) {
        store.set("audio/input/transmit", &self.transmit.index());
        store.set("audio/input/double_push_msec", &self.double_push_msec);
        store.set("audio/input/ptt_hold_msec", &self.ptt_hold_msec);
        store.set("audio/input/tx_audio_cue", &self.tx_audio_cue);
        store.set("audio/input/tx_audio_cue_on", &self.tx_audio_cue_on);
        store.set("audio/input/tx_audio_cue_off", &self.tx_audio_cue_off);
        store.set("audio/input/tx_mute_cue", &self.tx_mute_cue);
        store.set("audio/input/tx_mute_cue_file", &self.tx_mute_cue_file);
        store.set("audio/input/quality", &self.quality_bitrate);
        store.set("audio/input/min_loudness", &self.min_loudness);
        store.set("audio/input/voice_hold", &self.voice_hold);
        store.set("audio/input/jitter_buffer", &self.jitter_buffer);
        store.set("audio/input/allow_low_delay", &self.allow_low_delay);
        store.set("audio/input/noise_cancel", &self.noise_cancel.index());
        store.set(
            "audio/input/speex_noise_cancel_strength",
            &self.speex_noise_cancel_strength,
        );
        store.set("audio/input/vad_source", &self.vad_source.index());
        store.set("audio/input/vad_min", &self.vad_min);
        store.set("audio/input/vad_max", &self.vad_max);
        store.set("audio/input/frames_per_packet", &self.frames_per_packet);
        store.set("audio/input/device", &self.audio_input_device);
        store.set("audio/input/echo_cancel", &self.echo_cancel.index());
        store.set("audio/input/transmit_position", &self.transmit_position);
        store.set("audio/input/mute", &self.mute);
        store.set("audio/input/deaf", &self.deaf);

        store.set("audio/input/idle_time_secs", &self.idle_time_secs);
        store.set("audio/input/idle_action", &self.idle_action.index());
        store.set(
            "audio/input/undo_idle_action_on_activity",
            &self.undo_idle_action_on_activity,
        );

        store.set("audio/output/device", &self.audio_output_device);
        store.set("audio/output/volume", &self.volume);
        store.set("audio/output/other_volume", &self.other_volume);
        store.set(
            "audio/output/attenuate_others_on_talk",
            &self.attenuate_others_on_talk,
        );
        store.set("audio/output/attenuate_others", &self.attenuate_others);
        store.set(
            "audio/output/attenuate_users_on_priority_speak",
            &self.attenuate_users_on_priority_speak,
        );
        store.set(
            "audio/output/only_attenuate_same_output",
            &self.only_attenuate_same_output,
        );
        store.set("audio/output/attenuate_loopbacks", &self.attenuate_loopbacks);
        store.set("audio/output/delay_frames", &self.output_delay_frames);
        store.set("audio/output/positional_audio", &self.positional_audio);
        store.set(
            "audio/output/positional_headphone",
            &self.positional_headphone,
        );
        store.set("audio/output/min_distance", &self.audio_min_distance);
        store.set("audio/output/max_distance", &self.audio_max_distance);
        store.set("audio/output/max_dist_volume", &self.audio_max_dist_volume);
        store.set("audio/output/bloom", &self.audio_bloom);

        store.set("shortcut/enable", &self.shortcuts_enable);
        store.set("shortcut/enable_evdev", &self.enable_evdev);
        store.set("shortcut/enable_xinput2", &self.enable_xinput2);
        store.set("shortcut/enable_gamepad_input", &self.enable_gamepad_input);
        store.set("shortcut/list", &self.shortcuts);

        self.overlay.save(store);
        self.plugins.save(store);

        store.set("messages/max_log_blocks", &self.max_log_blocks);
        store.set("messages/log_24_hour_clock", &self.log_24_hour_clock);
        store.set("messages/chat_message_margins", &self.chat_message_margins);
        store.set("messages/whisper_friends", &self.whisper_friends);
        store.set(
            "messages/message_limit_user_threshold",
            &self.message_limit_user_threshold,
        );
        store.set("tts/enable", &self.tts);
        store.set("tts/volume", &self.tts_volume);
        store.set("tts/threshold", &self.tts_threshold);
        store.set("tts/language", &self.tts_language);

        store.set("ui/language", &self.language);
        store.set("ui/theme_name", &self.theme_name);
        store.set("ui/theme_style_name", &self.theme_style_name);
        store.set("ui/expand", &self.expand.index());
        store.set("ui/channel_drag", &self.channel_drag.index());
        store.set("ui/user_drag", &self.user_drag.index());
        store.set("ui/minimal_view", &self.minimal_view);
        store.set("ui/hide_frame", &self.hide_frame);
        store.set("ui/always_on_top", &self.always_on_top.index());
        store.set("ui/ask_on_quit", &self.ask_on_quit);
        store.set("ui/minimize_on_quit", &self.minimize_on_quit);
        store.set("ui/hide_in_tray", &self.hide_in_tray);
        store.set("ui/user_top", &self.user_top);
        store.set("ui/show_user_count", &self.show_user_count);
        store.set("ui/show_volume_adjustments", &self.show_volume_adjustments);
        store.set("ui/show_nicknames_only", &self.show_nicknames_only);
        store.set(
            "ui/filter_hides_empty_channels",
            &self.filter_hides_empty_channels,
        );
        store.set("ui/filter_active", &self.filter_active);
        store.set("net/username", &self.username);
        store.set("net/last_server", &self.last_server);
        store.set("ui/server_show", &self.server_show.index());
        store.set("ui/update_check", &self.update_check);
        store.set("ui/plugin_check", &self.plugin_check);
        store.set("ui/plugin_auto_update", &self.plugin_auto_update);

        store.set("net/force_tcp", &self.force_tcp);
        store.set("net/reconnect", &self.reconnect);
        store.set("net/auto_connect", &self.auto_connect);
        store.set("net/qos", &self.qos);
        store.set("net/disable_public_list", &self.disable_public_list);
        store.set("net/proxy_type", &self.proxy_type.index());
        store.set("net/proxy_host", &self.proxy_host);
        store.set("net/proxy_port", &self.proxy_port);
        store.set("net/proxy_username", &self.proxy_username);
        store.set("net/proxy_password", &self.proxy_password);
        store.set("net/ping_interval_msec", &self.ping_interval_msec);
        store.set("net/connection_timeout_msec", &self.connection_timeout_msec);
        store.set("net/max_in_flight_tcp_pings", &self.max_in_flight_tcp_pings);
        store.set("net/udp_force_tcp_addr", &self.udp_force_tcp_addr);
        store.set("net/ssl_ciphers", &self.ssl_ciphers);

        store.set("privacy/hide_os", &self.hide_os);
        store.set("privacy/suppress_identity", &self.suppress_identity);

        store.set("accessibility/high_contrast", &self.high_contrast);

        store.set("recording/path", &self.recording_path);
        store.set("recording/file_pattern", &self.recording_file_pattern);
        store.set("recording/mode", &self.recording_mode.index());
        store.set("recording/format", &self.recording_format);

        // Migrated keys must not come back on the next load
        store.remove("audio/input/username");

        store.set("settings/update_counter", &SETTINGS_VERSION);
    }

    /// Load from the settings file at `path`. A missing file yields the
    /// compiled defaults; an unavailable store is an error and the caller's
    /// current state stays authoritative.
    pub fn load_from(path: &Path) -> Result<Self> {
        let store = SettingsStore::open(path)
            .with_context(|| format!("failed to open settings store at {}", path.display()))?;
        let mut settings = Self::default();
        settings.load(&store);
        Ok(settings)
    }

    /// Save to the settings file at `path`, preserving foreign keys already
    /// present in the document.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        let mut store = SettingsStore::open(path)
            .with_context(|| format!("failed to open settings store at {}", path.display()))?;
        self.save(&mut store);
        store
            .flush()
            .with_context(|| format!("failed to write settings to {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::overlay::{OverlayExclusionMode, OverlayPreset, OverlayShow};
    use crate::plugin::PluginSetting;
    use crate::shortcut::{ActionData, ButtonChord, ButtonId};
    use crate::target::ShortcutTarget;

    /// An aggregate with every field kind moved off its default.
    fn non_default_settings() -> Settings {
        let mut settings = Settings::default();
        settings.transmit = AudioTransmit::PushToTalk;
        settings.ptt_hold_msec = 250;
        settings.quality_bitrate = 72_000;
        settings.vad_min = 0.5;
        settings.audio_input_device = "pipewire:mic".to_string();
        settings.mute = true;
        settings.idle_action = IdleAction::Deafen;
        settings.volume = 0.65;
        settings.positional_audio = false;
        settings.shortcuts_enable = false;
        settings.shortcuts = vec![
            Shortcut::new(
                1,
                ButtonChord::new([ButtonId::keyboard(29), ButtonId::keyboard(56)]),
                ActionData::None,
                true,
            ),
            Shortcut::new(
                4,
                ButtonChord::new([ButtonId::mouse(4)]),
                ActionData::Target(ShortcutTarget::users(["alice", "bob"])),
                false,
            ),
        ];
        settings.overlay.enable = true;
        settings.overlay.show = OverlayShow::Active;
        settings.overlay.exclusion_mode = OverlayExclusionMode::Whitelist;
        settings.overlay.whitelist = vec!["game".to_string()];
        settings.overlay.apply_preset(OverlayPreset::LargeSquareAvatar);
        settings.plugins.set(
            "/usr/lib/voxcom/positional.so",
            PluginSetting {
                path: String::new(),
                enabled: false,
                positional_data_enabled: true,
                allow_keyboard_monitoring: true,
            },
        );
        settings.tts = false;
        settings.language = "de".to_string();
        settings.always_on_top = AlwaysOnTop::InMinimal;
        settings.username = "speaker".to_string();
        settings.server_show = ServerShow::All;
        settings.proxy_type = ProxyType::Socks5;
        settings.proxy_host = "127.0.0.1".to_string();
        settings.proxy_port = 1080;
        settings.hide_os = true;
        settings.high_contrast = true;
        settings.recording_mode = RecordingMode::Multichannel;
        settings
    }

    fn roundtrip(original: &Settings) -> Settings {
        let mut store = SettingsStore::in_memory();
        original.save(&mut store);
        let mut loaded = Settings::default();
        loaded.load(&store);
        loaded
    }

    #[test]
    fn test_roundtrip_at_defaults() {
        let original = Settings::default();
        let mut loaded = roundtrip(&original);
        // The save stamped the schema generation
        assert_eq!(loaded.update_counter, SETTINGS_VERSION);
        loaded.update_counter = original.update_counter;
        assert_eq!(loaded, original);
    }

    #[test]
    fn test_roundtrip_non_default() {
        let original = non_default_settings();
        let mut loaded = roundtrip(&original);
        loaded.update_counter = original.update_counter;
        assert_eq!(loaded, original);
    }

    #[test]
    fn test_roundtrip_empty_lists() {
        let mut original = Settings::default();
        original.shortcuts = Vec::new();
        original.overlay.whitelist = Vec::new();
        original.overlay.blacklist = Vec::new();
        let mut loaded = roundtrip(&original);
        loaded.update_counter = original.update_counter;
        assert_eq!(loaded, original);
        assert!(loaded.shortcuts.is_empty());
    }

    #[test]
    fn test_nonsaved_fields_never_persisted() {
        let mut original = Settings::default();
        original.loop_mode = LoopMode::Server;
        original.packet_loss = 0.3;
        original.max_packet_delay_msec = 120.0;
        original.require_restart_to_apply = true;

        let mut store = SettingsStore::in_memory();
        original.save(&mut store);
        assert!(!store.contains("net/loop_mode"));
        assert!(!store.contains("net/packet_loss"));

        let mut loaded = Settings::default();
        loaded.load(&store);
        assert_eq!(loaded.loop_mode, LoopMode::None);
        assert_eq!(loaded.packet_loss, 0.0);
        assert!(!loaded.require_restart_to_apply);
    }

    #[test]
    fn test_corrupt_field_falls_back_to_default() {
        let mut store = SettingsStore::in_memory();
        Settings::default().save(&mut store);
        store.set("audio/output/volume", &"loud".to_string());
        store.set("audio/input/transmit", &99u32);
        store.set("shortcut/list", &17u32);

        let mut loaded = Settings::default();
        loaded.load(&store);
        assert_eq!(loaded.volume, Settings::default().volume);
        assert_eq!(loaded.transmit, Settings::default().transmit);
        assert!(loaded.shortcuts.is_empty());
    }

    #[test]
    fn test_migration_legacy_username_key() {
        let mut store = SettingsStore::in_memory();
        // A store written by generation 1: username under the audio group
        store.set("settings/update_counter", &1u32);
        store.set("audio/input/username", &"old_name".to_string());

        let mut settings = Settings::default();
        settings.load(&store);
        assert_eq!(settings.username, "old_name");
        assert_eq!(settings.update_counter, 1);

        settings.save(&mut store);
        assert_eq!(
            store.get::<u32>("settings/update_counter"),
            Ok(SETTINGS_VERSION)
        );
        assert_eq!(store.get::<String>("net/username"), Ok("old_name".to_string()));
        assert!(!store.contains("audio/input/username"));
    }

    #[test]
    fn test_migration_skipped_when_new_key_present() {
        let mut store = SettingsStore::in_memory();
        store.set("settings/update_counter", &1u32);
        store.set("audio/input/username", &"old_name".to_string());
        store.set("net/username", &"new_name".to_string());

        let mut settings = Settings::default();
        settings.load(&store);
        assert_eq!(settings.username, "new_name");
    }

    #[test]
    fn test_migration_skipped_for_current_generation() {
        let mut store = SettingsStore::in_memory();
        store.set("settings/update_counter", &SETTINGS_VERSION);
        store.set("audio/input/username", &"stale".to_string());

        let mut settings = Settings::default();
        settings.load(&store);
        assert_eq!(settings.username, "");
    }

    #[test]
    fn test_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");

        let original = non_default_settings();
        original.save_to(&path).unwrap();
        let loaded = Settings::load_from(&path).unwrap();

        assert_eq!(loaded.transmit, original.transmit);
        assert_eq!(loaded.shortcuts, original.shortcuts);
        assert_eq!(loaded.overlay, original.overlay);
        assert_eq!(loaded.update_counter, SETTINGS_VERSION);
    }

    #[test]
    fn test_load_from_missing_file_is_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("never_written.json");

        let loaded = Settings::load_from(&path).unwrap();
        assert_eq!(loaded, Settings::default());
    }

    #[test]
    fn test_save_preserves_foreign_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");

        let mut store = SettingsStore::open(&path).unwrap();
        store.set("thirdparty/key", &"kept".to_string());
        store.flush().unwrap();

        Settings::default().save_to(&path).unwrap();

        let reopened = SettingsStore::open(&path).unwrap();
        assert_eq!(reopened.get::<String>("thirdparty/key"), Ok("kept".to_string()));
    }

    #[test]
    fn test_derived_helpers() {
        let mut settings = Settings::default();
        assert!(!settings.do_echo());
        settings.echo_cancel = EchoCancel::SpeexMixed;
        assert!(settings.do_echo());

        assert!(settings.do_positional_audio());
        settings.deaf = true;
        assert!(!settings.do_positional_audio());
    }

    #[test]
    fn test_snapshot_is_independent() {
        let mut owner = Settings::default();
        let snapshot = owner.snapshot();
        owner.volume = 0.1;
        assert_eq!(snapshot.volume, Settings::default().volume);
    }
}
