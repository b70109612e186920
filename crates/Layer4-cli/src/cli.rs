//! Non-interactive subcommands

use anyhow::Context;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use vibepoints_core::{ConversationSource, GitOps, VcsBackend};

/// Print every user input of the project, oldest-first
pub async fn print_history(workdir: &Path, conversation_dir: Option<PathBuf>) -> anyhow::Result<()> {
    let source = match conversation_dir {
        Some(dir) => ConversationSource::new(Some(dir)),
        None => ConversationSource::for_project(workdir),
    };

    println!("# Conversation history");
    println!("Project: {}", workdir.display());
    match source.dir() {
        Some(dir) => println!("Source:  {}", dir.display()),
        None => {
            println!("No home directory; cannot locate conversation logs.");
            return Ok(());
        }
    }
    println!();

    let history = source.history().await;
    if history.files == 0 {
        println!("No conversation files found for this project.");
        return Ok(());
    }
    if history.inputs.is_empty() {
        println!("No user inputs found (system messages and commands are skipped).");
        return Ok(());
    }

    println!("## {} user inputs\n", history.inputs.len());
    for input in &history.inputs {
        println!("- {}  ({})", input.text, input.display_timestamp);
    }

    println!("\n## Summary");
    println!("- Conversation files: {}", history.files);
    println!("- User inputs: {}", history.inputs.len());
    if let Some((first, last)) = history.time_span() {
        println!("- Time span: {} to {}", first, last);
    }
    Ok(())
}

/// `<parent>/<name>-trial` next to `workdir`
pub fn trial_dir_for(workdir: &Path) -> anyhow::Result<PathBuf> {
    let name = workdir
        .file_name()
        .context("The working directory has no name")?;
    let parent = workdir
        .parent()
        .context("The working directory has no parent")?;
    let mut trial = name.to_os_string();
    trial.push("-trial");
    Ok(parent.join(trial))
}

/// Entries left out of a trial copy
fn skip_entry(name: &str, top_level: bool) -> bool {
    name == "node_modules" || name == ".git" || (top_level && name.starts_with('.'))
}

fn copy_tree(from: &Path, to: &Path, top_level: bool) -> anyhow::Result<usize> {
    fs::create_dir_all(to).with_context(|| format!("Failed to create {}", to.display()))?;
    let mut copied = 0;
    for entry in fs::read_dir(from).with_context(|| format!("Failed to read {}", from.display()))? {
        let entry = entry?;
        let name = entry.file_name();
        if skip_entry(&name.to_string_lossy(), top_level) {
            debug!("Skipping {}", entry.path().display());
            continue;
        }
        let target = to.join(&name);
        let file_type = entry.file_type()?;
        if file_type.is_dir() {
            copied += copy_tree(&entry.path(), &target, false)?;
        } else if file_type.is_file() {
            fs::copy(entry.path(), &target)
                .with_context(|| format!("Failed to copy {}", entry.path().display()))?;
            copied += 1;
        } else {
            debug!("Skipping special file {}", entry.path().display());
        }
    }
    Ok(copied)
}

/// Copy `workdir` into a fresh sibling trial directory with its own
/// repository. Returns the trial directory.
pub async fn create_trial(workdir: &Path) -> anyhow::Result<PathBuf> {
    let trial = trial_dir_for(workdir)?;
    println!("Current directory: {}", workdir.display());
    println!("Trial directory:   {}", trial.display());

    if trial.exists() {
        println!("Removing the previous trial copy...");
        fs::remove_dir_all(&trial)
            .with_context(|| format!("Failed to remove {}", trial.display()))?;
    }

    let copied = copy_tree(workdir, &trial, true)?;
    info!("Copied {} files into {}", copied, trial.display());
    println!("✓ Copied {} files", copied);

    // `.git` is never copied, so the trial always starts a fresh history
    GitOps::new(&trial)
        .init()
        .await
        .context("git init failed")?;
    println!("✓ Initialized a repository");

    println!("Trial copy ready. To start: cd {}", trial.display());
    Ok(trial)
}
