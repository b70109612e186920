//! Prompts sent to the assistant
//!
//! Both prompts start with [`TASK_PROMPT_MARKER`] so the conversation
//! source never mistakes them for user input.

use super::SuggestionContext;

/// Leading marker of every prompt this tool sends
pub const TASK_PROMPT_MARKER: &str = "[vibepoints:task]";

fn file_section(context: &SuggestionContext) -> String {
    let mut lines = Vec::new();
    for (label, paths) in [
        ("Added", &context.added),
        ("Modified", &context.modified),
        ("Removed", &context.removed),
    ] {
        if !paths.is_empty() {
            lines.push(format!("{}: {}", label, paths.join(", ")));
        }
    }
    if lines.is_empty() {
        "(no file changes)".to_string()
    } else {
        lines.join("\n")
    }
}

fn recent_section(context: &SuggestionContext) -> String {
    if context.recent_subjects.is_empty() {
        "(none)".to_string()
    } else {
        context
            .recent_subjects
            .iter()
            .map(|s| format!("- {}", s))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Natural-language message from what the user asked for plus the diff
pub fn vibecoder_prompt(context: &SuggestionContext) -> String {
    let intent = context
        .latest_input
        .as_deref()
        .unwrap_or("(no recent request)");
    format!(
        r#"{marker} Write a checkpoint message for the changes below.

Rules:
1. Describe what changed in plain language, from the user's point of view
2. Keep it to one line under 72 characters
3. Use imperative mood ("add" not "added")

What the user asked for:
{intent}

Recent checkpoints:
{recent}

Files:
{files}

Summary:
{summary}

Diff:
```
{diff}
```

Respond with the message wrapped in <message></message> tags."#,
        marker = TASK_PROMPT_MARKER,
        intent = intent,
        recent = recent_section(context),
        files = file_section(context),
        summary = context.diff_summary,
        diff = context.diff,
    )
}

/// Conventional-commit message from the diff alone
pub fn prototyper_prompt(context: &SuggestionContext) -> String {
    format!(
        r#"{marker} Generate a concise git commit message for the following changes.

Rules:
1. Use conventional commit format: type(scope): description
2. Types: feat, fix, docs, style, refactor, perf, test, chore
3. Keep the first line under 72 characters
4. Be specific but concise
5. Use imperative mood ("add" not "added")

Recent commits:
{recent}

Files:
{files}

Diff:
```
{diff}
```

Respond with only the commit message, nothing else."#,
        marker = TASK_PROMPT_MARKER,
        recent = recent_section(context),
        files = file_section(context),
        diff = context.diff,
    )
}
