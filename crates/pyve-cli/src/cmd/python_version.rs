use crate::output::print_json;
use anyhow::Context;
use pyve_core::config::ProjectConfig;
use pyve_core::interpreter::VersionManager;
use pyve_core::version;
use std::path::Path;

/// Without `value`, print the resolved version. With it, pin the version in
/// `.python-version`.
pub fn run(
    root: &Path,
    value: Option<&str>,
    default_version: Option<&str>,
    json: bool,
) -> anyhow::Result<()> {
    match value {
        None => show(root, default_version, json),
        Some(v) => set(root, v),
    }
}

fn show(root: &Path, default_version: Option<&str>, json: bool) -> anyhow::Result<()> {
    let config = ProjectConfig::load_optional(root).context("failed to read .pyve/config")?;
    let resolved = version::resolve_version(root, None, default_version, config.as_ref())?;
    if json {
        return print_json(&resolved);
    }
    println!("{}", resolved.version);
    Ok(())
}

fn set(root: &Path, value: &str) -> anyhow::Result<()> {
    let value = value.trim();
    version::validate_version(value)?;
    if let Some(manager) = VersionManager::detect() {
        manager
            .ensure_installed(value)
            .with_context(|| format!("failed to install Python {value} with {}", manager.name()))?;
    }
    version::write_version_file(root, value)?;
    println!("✓ Python version set to {value} in .python-version");
    Ok(())
}
