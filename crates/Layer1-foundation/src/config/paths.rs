//! Well-known filesystem locations

use std::path::{Path, PathBuf};

/// Application directory name under the platform cache dir
pub const APP_DIR: &str = "vibepoints";

/// Log file name used by the interactive mode
pub const LOG_FILE: &str = "vibepoints.log";

/// Encode a project path the way Claude Code names its per-project
/// conversation directories: every character outside `[A-Za-z0-9]` becomes
/// `-` (`/home/me.x/my_app` -> `-home-me-x-my-app`)
pub fn encode_project_dir(project: &Path) -> String {
    project
        .to_string_lossy()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
        .collect()
}

/// `~/.claude/projects/<encoded project path>`
pub fn conversation_dir_for(project: &Path) -> Option<PathBuf> {
    let home = dirs::home_dir()?;
    Some(
        home.join(".claude")
            .join("projects")
            .join(encode_project_dir(project)),
    )
}

/// `<cache dir>/vibepoints/vibepoints.log`
pub fn log_file_path() -> Option<PathBuf> {
    dirs::cache_dir().map(|dir| dir.join(APP_DIR).join(LOG_FILE))
}
