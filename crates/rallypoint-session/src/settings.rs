//! Persisted user settings: display name and cursor lock.
//!
//! Settings are loaded once at startup and written back through the
//! [`SettingsStore`] every time one of them changes. Missing values fall
//! back to their defaults, so an empty or partial file is never an error.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use serde::{Deserialize, Serialize};

use crate::SessionError;

/// Display name used when none is saved or the saved one is blank.
pub const DEFAULT_DISPLAY_NAME: &str = "Noobie";

fn default_display_name() -> String {
    DEFAULT_DISPLAY_NAME.to_string()
}

fn default_cursor_lock() -> bool {
    true
}

/// The persisted values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_display_name")]
    pub display_name: String,
    #[serde(default = "default_cursor_lock")]
    pub cursor_lock: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            display_name: default_display_name(),
            cursor_lock: default_cursor_lock(),
        }
    }
}

// ---------------------------------------------------------------------------
// Stores
// ---------------------------------------------------------------------------

/// Where settings live between runs.
pub trait SettingsStore: Send {
    /// Reads saved settings; `Ok(None)` if nothing has been saved yet.
    fn load(&self) -> Result<Option<Settings>, SessionError>;

    /// Replaces the saved settings.
    fn save(&mut self, settings: &Settings) -> Result<(), SessionError>;
}

/// Keeps settings as a pretty-printed JSON document on disk.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> SessionError {
        SessionError::SettingsIo {
            path: self.path.clone(),
            source,
        }
    }
}

impl SettingsStore for JsonFileStore {
    fn load(&self) -> Result<Option<Settings>, SessionError> {
        let bytes = match std::fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(self.io_error(e)),
        };
        Ok(Some(serde_json::from_slice(&bytes)?))
    }

    fn save(&mut self, settings: &Settings) -> Result<(), SessionError> {
        let json = serde_json::to_vec_pretty(settings)?;
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir).map_err(|e| self.io_error(e))?;
        }
        std::fs::write(&self.path, json).map_err(|e| self.io_error(e))
    }
}

/// Keeps settings in memory. Clones share the same slot, so a test can keep
/// one handle and inspect what the session saved through another.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    saved: Arc<Mutex<Option<Settings>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store that starts out holding `settings`.
    pub fn with(settings: Settings) -> Self {
        Self {
            saved: Arc::new(Mutex::new(Some(settings))),
        }
    }

    /// What was last saved.
    pub fn saved(&self) -> Option<Settings> {
        self.saved
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl SettingsStore for MemoryStore {
    fn load(&self) -> Result<Option<Settings>, SessionError> {
        Ok(self.saved())
    }

    fn save(&mut self, settings: &Settings) -> Result<(), SessionError> {
        *self.saved.lock().unwrap_or_else(PoisonError::into_inner) = Some(settings.clone());
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// UserSettings
// ---------------------------------------------------------------------------

/// Settings bound to the store they persist to.
pub struct UserSettings {
    current: Settings,
    store: Box<dyn SettingsStore>,
}

impl UserSettings {
    /// Loads saved settings, falling back to defaults if nothing is saved.
    ///
    /// # Errors
    /// Propagates store errors; a malformed file is reported, not ignored.
    pub fn load(store: Box<dyn SettingsStore>) -> Result<Self, SessionError> {
        let mut current = store.load()?.unwrap_or_default();
        if current.display_name.trim().is_empty() {
            current.display_name = default_display_name();
        }
        tracing::debug!(display_name = %current.display_name, "user settings loaded");
        Ok(Self { current, store })
    }

    pub fn display_name(&self) -> &str {
        &self.current.display_name
    }

    pub fn cursor_lock(&self) -> bool {
        self.current.cursor_lock
    }

    pub fn settings(&self) -> &Settings {
        &self.current
    }

    /// Sets and saves the display name. Blank input stores the default name.
    pub fn set_display_name(&mut self, name: &str) -> Result<(), SessionError> {
        let name = name.trim();
        self.current.display_name = if name.is_empty() {
            default_display_name()
        } else {
            name.to_string()
        };
        self.store.save(&self.current)
    }

    /// Sets and saves the cursor-lock preference.
    pub fn set_cursor_lock(&mut self, locked: bool) -> Result<(), SessionError> {
        self.current.cursor_lock = locked;
        self.store.save(&self.current)
    }
}

impl std::fmt::Debug for UserSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserSettings")
            .field("current", &self.current)
            .finish_non_exhaustive()
    }
}
