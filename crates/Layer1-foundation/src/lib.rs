//! # vibepoints-foundation
//!
//! Foundation layer for Vibepoints:
//! - Error: shared error type for configuration and persistence
//! - Config: persisted options (`options.json`) and well-known paths
//! - Storage: JsonStore for small JSON documents
//! - Strings: char-safe truncation helpers

pub mod config;
pub mod error;
pub mod storage;
pub mod strings;

// ============================================================================
// Error
// ============================================================================
pub use error::{Error, Result};

// ============================================================================
// Config
// ============================================================================
pub use config::{
    conversation_dir_for, encode_project_dir, log_file_path, OptionKey, Options, OptionsStore,
    APP_DIR, LOG_FILE, OPTIONS_FILE,
};

// ============================================================================
// Storage
// ============================================================================
pub use storage::JsonStore;
