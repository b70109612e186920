//! Config - persisted options and well-known paths
//!
//! - `options.rs` - user toggles stored in `options.json`
//! - `paths.rs` - conversation and log locations

mod options;
mod paths;

pub use options::{OptionKey, Options, OptionsStore, OPTIONS_FILE};
pub use paths::{conversation_dir_for, encode_project_dir, log_file_path, APP_DIR, LOG_FILE};
