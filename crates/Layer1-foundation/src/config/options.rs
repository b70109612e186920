//! Persisted user options
//!
//! Stored as `options.json` under the platform config directory, one
//! directory per project, so checkpoints never pick the file up and a
//! reset never rolls it back. Loading never fails: a missing or unreadable
//! file yields the built-in defaults. Saving is best-effort and only logs
//! on failure.

use super::paths::encode_project_dir;
use crate::storage::JsonStore;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Options file name
pub const OPTIONS_FILE: &str = "options.json";

/// User-toggleable options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Options {
    /// Play audio cues
    #[serde(alias = "audio")]
    pub audio_enabled: bool,

    /// Prefix custom checkpoint labels with "Vibe: "
    pub custom_prefix_enabled: bool,

    /// Create checkpoints automatically from new conversation input
    pub auto_checkpoint_enabled: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            audio_enabled: true,
            custom_prefix_enabled: true,
            auto_checkpoint_enabled: false,
        }
    }
}

impl Options {
    pub fn get(&self, key: OptionKey) -> bool {
        match key {
            OptionKey::Audio => self.audio_enabled,
            OptionKey::CustomPrefix => self.custom_prefix_enabled,
            OptionKey::AutoCheckpoint => self.auto_checkpoint_enabled,
        }
    }

    /// Flip one option, returning its new value
    pub fn toggle(&mut self, key: OptionKey) -> bool {
        let slot = match key {
            OptionKey::Audio => &mut self.audio_enabled,
            OptionKey::CustomPrefix => &mut self.custom_prefix_enabled,
            OptionKey::AutoCheckpoint => &mut self.auto_checkpoint_enabled,
        };
        *slot = !*slot;
        *slot
    }
}

/// Identifies one entry of the options screen, in display order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OptionKey {
    Audio,
    CustomPrefix,
    AutoCheckpoint,
}

impl OptionKey {
    pub const ALL: [OptionKey; 3] = [
        OptionKey::Audio,
        OptionKey::CustomPrefix,
        OptionKey::AutoCheckpoint,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            OptionKey::Audio => "Audio",
            OptionKey::CustomPrefix => "Custom label prefix",
            OptionKey::AutoCheckpoint => "Auto checkpoints",
        }
    }
}

/// Loads and saves [`Options`] through a [`JsonStore`]. Without a store
/// (no config directory) options live for the session only.
#[derive(Debug, Clone)]
pub struct OptionsStore {
    store: Option<JsonStore>,
}

impl OptionsStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            store: Some(JsonStore::new(dir)),
        }
    }

    /// `<config dir>/vibepoints/projects/<encoded project>/options.json`
    pub fn for_project(project: &Path) -> Self {
        let store = match JsonStore::global() {
            Ok(global) => Some(global.join("projects").join(encode_project_dir(project))),
            Err(e) => {
                warn!("Options will not be saved: {}", e);
                None
            }
        };
        Self { store }
    }

    pub fn path(&self) -> Option<PathBuf> {
        self.store.as_ref().map(|s| s.file_path(OPTIONS_FILE))
    }

    /// Load options, falling back to defaults on any failure
    pub fn load(&self) -> Options {
        let Some(store) = &self.store else {
            return Options::default();
        };
        match store.load_optional::<Options>(OPTIONS_FILE) {
            Ok(Some(options)) => {
                debug!("Loaded options from {}", store.file_path(OPTIONS_FILE).display());
                options
            }
            Ok(None) => Options::default(),
            Err(e) => {
                warn!("Using default options: {}", e);
                Options::default()
            }
        }
    }

    /// Save options; write failures are logged and ignored
    pub fn save(&self, options: &Options) {
        let Some(store) = &self.store else {
            return;
        };
        if let Err(e) = store.save(OPTIONS_FILE, options) {
            warn!("Failed to save options: {}", e);
        }
    }
}
