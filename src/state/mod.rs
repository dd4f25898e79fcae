//! State Management Module
//!
//! Settings persisted between sessions.

pub mod settings;

pub use settings::{
    app_data_dir, default_recording_dir, persisted_duration, JsonSettingsFile, MemorySettings,
    Properties, SettingsStore, Theme,
};
