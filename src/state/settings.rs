//! Persisted plugin settings.
//!
//! The buffer manager only needs the stored buffer length; the rest of the
//! keys belong to the editor (theme, recording folder, window size). Storage
//! is abstracted behind [`SettingsStore`] so the engine never touches a
//! concrete file format.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, warn};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::engine::MAX_BUFFER_LENGTH_SECS;
use crate::error::{ResamplerError, Result};

/// Folder (under the platform data directory) holding settings and takes
pub const APP_FOLDER: &str = "ReSampler";

/// Settings file name inside [`APP_FOLDER`]
pub const SETTINGS_FILE_NAME: &str = "TKRS.settings";

pub const KEY_BUFFER_LENGTH: &str = "bufferLength";
pub const KEY_THEME: &str = "theme";
pub const KEY_RECORDING_PATH: &str = "recordingPath";
pub const KEY_WIDTH: &str = "width";
pub const KEY_HEIGHT: &str = "height";

/// Default editor size in pixels
pub const DEFAULT_WIDTH: u32 = 800;
pub const DEFAULT_HEIGHT: u32 = 100;

/// Key-value persistence collaborator
pub trait SettingsStore: Send {
    /// Look up a stored value
    fn get(&self, key: &str) -> Option<Value>;

    /// Store a value; not durable until [`flush`](SettingsStore::flush)
    fn set(&mut self, key: &str, value: Value);

    /// Persist pending changes
    fn flush(&mut self) -> Result<()>;
}

/// Buffer length stored by a previous session, if any
///
/// Non-positive, non-integer or over-long values are treated as absent.
pub fn persisted_duration(store: &dyn SettingsStore) -> Option<u32> {
    let value = store.get(KEY_BUFFER_LENGTH)?;
    match value.as_u64().and_then(|v| u32::try_from(v).ok()) {
        Some(secs) if secs > 0 && secs <= MAX_BUFFER_LENGTH_SECS => Some(secs),
        _ => {
            warn!("Ignoring stored buffer length {}", value);
            None
        }
    }
}

/// `<data dir>/ReSampler`, falling back to the temp directory
pub fn app_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join(APP_FOLDER)
}

/// Where takes go when the user never picked a folder
pub fn default_recording_dir() -> PathBuf {
    app_data_dir().join("Recordings")
}

// ============================================================================
// Stores
// ============================================================================

/// Settings stored as a JSON object on disk
#[derive(Debug)]
pub struct JsonSettingsFile {
    path: PathBuf,
    values: Map<String, Value>,
    dirty: bool,
}

impl JsonSettingsFile {
    /// Open (or start) the settings file at `path`
    ///
    /// A missing file yields empty settings; an unreadable or corrupt one is
    /// an error.
    pub fn open(path: &Path) -> Result<Self> {
        let values = if path.exists() {
            let content = fs::read_to_string(path).map_err(|e| ResamplerError::io(path, e))?;
            serde_json::from_str::<Map<String, Value>>(&content)?
        } else {
            Map::new()
        };

        debug!("Loaded {} settings from {}", values.len(), path.display());

        Ok(Self {
            path: path.to_path_buf(),
            values,
            dirty: false,
        })
    }

    /// Open the per-user settings file
    pub fn open_default() -> Result<Self> {
        Self::open(&app_data_dir().join(SETTINGS_FILE_NAME))
    }
}

impl SettingsStore for JsonSettingsFile {
    fn get(&self, key: &str) -> Option<Value> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: Value) {
        if self.values.get(key) != Some(&value) {
            self.values.insert(key.to_string(), value);
            self.dirty = true;
        }
    }

    fn flush(&mut self) -> Result<()> {
        if !self.dirty {
            return Ok(());
        }

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| ResamplerError::io(parent, e))?;
        }

        let content = serde_json::to_string_pretty(&self.values)?;
        fs::write(&self.path, content).map_err(|e| ResamplerError::io(&self.path, e))?;
        self.dirty = false;

        debug!("Saved settings to {}", self.path.display());
        Ok(())
    }
}

/// Non-persistent store for hosts without a writable profile, and for tests
#[derive(Debug, Default, Clone)]
pub struct MemorySettings {
    values: HashMap<String, Value>,
    flushes: usize,
}

impl MemorySettings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with a stored buffer length
    pub fn with_duration(secs: u32) -> Self {
        let mut settings = Self::new();
        settings.set(KEY_BUFFER_LENGTH, Value::from(secs));
        settings
    }

    /// How many times `flush` has been called
    pub fn flush_count(&self) -> usize {
        self.flushes
    }
}

impl SettingsStore for MemorySettings {
    fn get(&self, key: &str) -> Option<Value> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: Value) {
        self.values.insert(key.to_string(), value);
    }

    fn flush(&mut self) -> Result<()> {
        self.flushes += 1;
        Ok(())
    }
}

// ============================================================================
// Editor properties
// ============================================================================

/// Colour theme of the capture view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Theme {
    #[default]
    Rainbow,
    Light,
    Dark,
    Matrix,
}

impl std::str::FromStr for Theme {
    type Err = ResamplerError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "rainbow" => Ok(Theme::Rainbow),
            "light" => Ok(Theme::Light),
            "dark" => Ok(Theme::Dark),
            "matrix" => Ok(Theme::Matrix),
            other => Err(ResamplerError::invalid(format!("unknown theme '{}'", other))),
        }
    }
}

/// Editor-owned settings
#[derive(Debug, Clone, PartialEq)]
pub struct Properties {
    pub theme: Theme,
    pub recording_path: PathBuf,
    pub width: u32,
    pub height: u32,
}

impl Default for Properties {
    fn default() -> Self {
        Self {
            theme: Theme::default(),
            recording_path: default_recording_dir(),
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
        }
    }
}

impl Properties {
    /// Read editor properties, using defaults for missing or malformed keys
    pub fn load(store: &dyn SettingsStore) -> Self {
        let defaults = Self::default();

        let theme = store
            .get(KEY_THEME)
            .and_then(|v| serde_json::from_value(v).ok())
            .unwrap_or(defaults.theme);

        let recording_path = store
            .get(KEY_RECORDING_PATH)
            .and_then(|v| v.as_str().map(PathBuf::from))
            .unwrap_or(defaults.recording_path);

        // Width and height are only honoured as a pair
        let (width, height) = match (
            store.get(KEY_WIDTH).and_then(|v| v.as_u64()),
            store.get(KEY_HEIGHT).and_then(|v| v.as_u64()),
        ) {
            (Some(w), Some(h)) => (w as u32, h as u32),
            _ => (defaults.width, defaults.height),
        };

        Self {
            theme,
            recording_path,
            width,
            height,
        }
    }

    /// Write editor properties plus the current buffer length, then flush
    pub fn save(&self, store: &mut dyn SettingsStore, buffer_length: u32) -> Result<()> {
        store.set(KEY_WIDTH, Value::from(self.width));
        store.set(KEY_HEIGHT, Value::from(self.height));
        store.set(KEY_THEME, serde_json::to_value(self.theme)?);
        store.set(
            KEY_RECORDING_PATH,
            Value::from(self.recording_path.to_string_lossy().into_owned()),
        );
        store.set(KEY_BUFFER_LENGTH, Value::from(buffer_length));
        store.flush()
    }
}
