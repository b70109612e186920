//! Audio cues
//!
//! Short sounds for menu movement, confirmation, revert and cancel. Playback
//! is best effort: a missing player or sound file is silently skipped.

use std::path::{Path, PathBuf};
use tokio::process::Command;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoundCue {
    MenuMove,
    Confirm,
    Revert,
    Cancel,
}

impl SoundCue {
    pub fn file_name(&self) -> &'static str {
        match self {
            SoundCue::MenuMove => "menu-move.wav",
            SoundCue::Confirm | SoundCue::Cancel => "next.wav",
            SoundCue::Revert => "revert.wav",
        }
    }
}

pub trait SoundPlayer: Send {
    fn play(&self, cue: SoundCue);
}

/// Plays nothing
#[derive(Debug, Default)]
pub struct SilentPlayer;

impl SoundPlayer for SilentPlayer {
    fn play(&self, _cue: SoundCue) {}
}

/// Command-line players tried in order
const PLAYERS: [&str; 3] = ["afplay", "paplay", "aplay"];

/// Spawns the first available system player on a sound file
#[derive(Debug)]
pub struct SystemPlayer {
    program: PathBuf,
    sounds_dir: PathBuf,
}

impl SystemPlayer {
    /// `None` when no known player is installed
    pub fn detect(sounds_dir: impl Into<PathBuf>) -> Option<Self> {
        let program = PLAYERS.iter().find_map(|name| which::which(name).ok());
        debug!("Audio player: {:?}", program);
        Some(Self {
            program: program?,
            sounds_dir: sounds_dir.into(),
        })
    }

    /// `sounds/` next to the executable, else under `workdir`
    pub fn default_sounds_dir(workdir: &Path) -> PathBuf {
        std::env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(|dir| dir.join("sounds")))
            .filter(|dir| dir.is_dir())
            .unwrap_or_else(|| workdir.join("sounds"))
    }
}

impl SoundPlayer for SystemPlayer {
    fn play(&self, cue: SoundCue) {
        let file = self.sounds_dir.join(cue.file_name());
        if !file.is_file() {
            return;
        }
        // Fire and forget; the runtime reaps the child
        if let Err(e) = Command::new(&self.program)
            .arg(&file)
            .stdin(std::process::Stdio::null())
            .stdout(std::process::Stdio::null())
            .stderr(std::process::Stdio::null())
            .spawn()
        {
            debug!("Sound playback failed: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cue_files() {
        assert_eq!(SoundCue::MenuMove.file_name(), "menu-move.wav");
        assert_eq!(SoundCue::Revert.file_name(), "revert.wav");
        assert_eq!(SoundCue::Cancel.file_name(), "next.wav");
    }

    #[test]
    fn test_missing_files_are_skipped() {
        let dir = tempfile::TempDir::new().unwrap();
        let player = SystemPlayer {
            program: PathBuf::from("/nonexistent/player"),
            sounds_dir: dir.path().to_path_buf(),
        };
        // Returns before spawning anything
        player.play(SoundCue::Confirm);
        SilentPlayer.play(SoundCue::Revert);
    }
}
