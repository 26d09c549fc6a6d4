//! Managed `.gitignore` block.
//!
//! pyve owns the lines between [`BLOCK_START`] and [`BLOCK_END`]. Anything
//! outside the block belongs to the user and is never rewritten.

use std::path::Path;

use crate::error::Result;
use crate::io;
use crate::paths;

pub const BLOCK_START: &str = "# >>> pyve >>>";
pub const BLOCK_END: &str = "# <<< pyve <<<";

const BUILD_ARTIFACTS_HEADER: &str = "# Python build and test artifacts";
const BUILD_ARTIFACTS: &[&str] = &[
    "__pycache__",
    "*.py[cod]",
    "*.egg-info",
    "build/",
    "dist/",
    ".pytest_cache",
    ".coverage",
];

const ENVIRONMENT_HEADER: &str = "# Pyve virtual environment";

/// Ignore entries for the environment itself. `env_dir` is the venv
/// directory or `.pyve/envs` for micromamba.
pub fn environment_entries(env_dir: &str) -> Vec<String> {
    vec![
        env_dir.trim_end_matches('/').to_string(),
        paths::DOTENV_FILE.to_string(),
        paths::ENVRC_FILE.to_string(),
        paths::TESTENV_DIR.to_string(),
    ]
}

/// Build the managed block, leaving out entries already present in
/// `user_content`. Section headers are always emitted.
pub fn render_block(env_dir: &str, user_content: &str) -> String {
    let existing: Vec<&str> = user_content.lines().map(str::trim).collect();
    let keep = |entry: &str| !existing.contains(&entry);

    let mut out = String::new();
    out.push_str(BLOCK_START);
    out.push('\n');
    out.push_str(BUILD_ARTIFACTS_HEADER);
    out.push('\n');
    for entry in BUILD_ARTIFACTS.iter().copied().filter(|e| keep(*e)) {
        out.push_str(entry);
        out.push('\n');
    }
    out.push('\n');
    out.push_str(ENVIRONMENT_HEADER);
    out.push('\n');
    for entry in environment_entries(env_dir) {
        if keep(entry.as_str()) {
            out.push_str(&entry);
            out.push('\n');
        }
    }
    out.push_str(BLOCK_END);
    out.push('\n');
    out
}

/// Text of the file with the managed block removed.
fn without_block(content: &str) -> String {
    io::splice_between_markers(content, BLOCK_START, BLOCK_END, "")
        .unwrap_or_else(|| content.to_string())
}

/// Write or refresh the managed block in `.gitignore`, creating the file
/// if needed.
pub fn apply(root: &Path, env_dir: &str) -> Result<()> {
    let path = paths::gitignore_path(root);
    let current = if path.exists() {
        std::fs::read_to_string(&path)?
    } else {
        String::new()
    };
    let user = without_block(&current);
    let block = render_block(env_dir, &user);

    let updated = if current.contains(BLOCK_START) && current.contains(BLOCK_END) {
        io::splice_between_markers(&current, BLOCK_START, BLOCK_END, &block)
            .unwrap_or_else(|| current.clone())
    } else if current.is_empty() {
        block
    } else {
        // One newline before the block; `remove` takes exactly this one back.
        format!("{current}\n{block}")
    };

    if updated != current {
        io::atomic_write(&path, updated.as_bytes())?;
    }
    Ok(())
}

/// Remove the managed block and the newline `apply` put in front of it,
/// leaving the user's text byte for byte. A file left empty is deleted only
/// when `delete_if_empty` is set. Returns true if the file changed.
pub fn remove(root: &Path, delete_if_empty: bool) -> Result<bool> {
    let path = paths::gitignore_path(root);
    if !path.is_file() {
        return Ok(false);
    }
    let current = std::fs::read_to_string(&path)?;
    let Some(start) = current.find(BLOCK_START) else {
        return Ok(false);
    };
    let Some(mut updated) = io::splice_between_markers(&current, BLOCK_START, BLOCK_END, "")
    else {
        return Ok(false);
    };
    if start > 0 && updated[..start].ends_with('\n') {
        updated.remove(start - 1);
    }
    if delete_if_empty && updated.trim().is_empty() {
        std::fs::remove_file(&path)?;
        return Ok(true);
    }
    io::atomic_write(&path, updated.as_bytes())?;
    Ok(true)
}
