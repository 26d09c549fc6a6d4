//! `.envrc` and `.env` management.

use std::path::Path;

use crate::backend::Backend;
use crate::error::Result;
use crate::io;
use crate::paths;

/// First line of every `.envrc` pyve writes. Files without it are never
/// touched.
pub const ENVRC_HEADER: &str = "# pyve-managed .envrc (regenerate with: pyve --init --update)";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvrcOutcome {
    Created,
    Updated,
    Unchanged,
    /// An `.envrc` not written by pyve exists and was left alone.
    Foreign,
}

/// Render the activation script. `env_dir` is relative to the project root.
pub fn render_envrc(backend: Backend, env_dir: &str) -> String {
    let body = match backend {
        Backend::Venv => format!(
            "export VIRTUAL_ENV=\"$PWD/{env_dir}\"\nPATH_add \"$VIRTUAL_ENV/bin\"\n"
        ),
        Backend::Micromamba => format!(
            "export CONDA_PREFIX=\"$PWD/{env_dir}\"\nPATH_add \"$CONDA_PREFIX/bin\"\n"
        ),
    };
    format!("{ENVRC_HEADER}\n{body}dotenv_if_exists {}\n", paths::DOTENV_FILE)
}

pub fn is_managed(content: &str) -> bool {
    content.lines().next() == Some(ENVRC_HEADER)
}

pub fn write_envrc(root: &Path, content: &str) -> Result<EnvrcOutcome> {
    let path = paths::envrc_path(root);
    if !path.exists() {
        io::atomic_write(&path, content.as_bytes())?;
        return Ok(EnvrcOutcome::Created);
    }
    let existing = std::fs::read_to_string(&path)?;
    if !is_managed(&existing) {
        return Ok(EnvrcOutcome::Foreign);
    }
    if existing == content {
        return Ok(EnvrcOutcome::Unchanged);
    }
    io::atomic_write(&path, content.as_bytes())?;
    Ok(EnvrcOutcome::Updated)
}

/// Remove `.envrc` if pyve wrote it. Returns true if removed.
pub fn remove_envrc(root: &Path) -> Result<bool> {
    let path = paths::envrc_path(root);
    if !path.is_file() {
        return Ok(false);
    }
    if !is_managed(&std::fs::read_to_string(&path)?) {
        return Ok(false);
    }
    std::fs::remove_file(&path)?;
    Ok(true)
}

/// Create an empty, owner-only `.env` if missing. Returns true if created.
pub fn ensure_dotenv(root: &Path) -> Result<bool> {
    let path = paths::dotenv_path(root);
    if !io::write_if_missing(&path, b"")? {
        return Ok(false);
    }
    io::set_owner_only(&path)?;
    Ok(true)
}

/// Remove `.env` only when it holds nothing. Returns true if removed.
pub fn remove_dotenv_if_empty(root: &Path) -> Result<bool> {
    let path = paths::dotenv_path(root);
    if !path.is_file() {
        return Ok(false);
    }
    if !std::fs::read_to_string(&path)?.trim().is_empty() {
        return Ok(false);
    }
    std::fs::remove_file(&path)?;
    Ok(true)
}
