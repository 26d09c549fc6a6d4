use crate::output::print_json;
use anyhow::Context;
use pyve_core::config::{ProjectConfig, PYVE_VERSION};
use pyve_core::paths;
use pyve_core::project::{self, InitOptions};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;

/// Environment variables pyve reads.
const OVERRIDES: &[&str] = &[
    "PYVE_BACKEND",
    "PYVE_PYTHON_VERSION",
    "PYVE_ROOT",
    "PYVE_FORCE_YES",
    "PYVE_TEST_AUTO_INSTALL_PYTEST",
    "CI",
];

#[derive(Serialize)]
struct ConfigView {
    pyve_version: &'static str,
    root: String,
    config_file: Option<String>,
    backend: String,
    backend_source: &'static str,
    python_version: String,
    python_source: &'static str,
    venv_dir: Option<String>,
    env_name: Option<String>,
    environment: String,
    overrides: BTreeMap<&'static str, String>,
}

pub fn run(root: &Path, opts: &InitOptions, json: bool) -> anyhow::Result<()> {
    let config = ProjectConfig::load_optional(root).context("failed to read .pyve/config")?;
    let settings = project::resolve(root, opts, config.as_ref())?;

    let view = ConfigView {
        pyve_version: PYVE_VERSION,
        root: root.display().to_string(),
        config_file: config.as_ref().map(|_| paths::CONFIG_FILE.to_string()),
        backend: settings.backend().to_string(),
        backend_source: settings.backend.source.as_str(),
        python_version: settings.python.version.clone(),
        python_source: settings.python.source.as_str(),
        venv_dir: settings.env_name.is_none().then(|| settings.venv_dir.clone()),
        env_name: settings.env_name.clone(),
        environment: settings.env_dir(),
        overrides: OVERRIDES
            .iter()
            .filter_map(|name| std::env::var(name).ok().map(|v| (*name, v)))
            .collect(),
    };

    if json {
        return print_json(&view);
    }

    println!("Pyve version:   {}", view.pyve_version);
    println!("Project root:   {}", view.root);
    println!(
        "Config file:    {}",
        view.config_file.as_deref().unwrap_or("none (not initialized)")
    );
    println!("Backend:        {} (from {})", view.backend, view.backend_source);
    println!(
        "Python version: {} (from {})",
        view.python_version, view.python_source
    );
    if let Some(dir) = &view.venv_dir {
        println!("Venv directory: {dir}");
    }
    if let Some(name) = &view.env_name {
        println!("Env name:       {name}");
    }
    println!("Environment:    {}", view.environment);
    if !view.overrides.is_empty() {
        println!("Environment overrides:");
        for (name, value) in &view.overrides {
            println!("  {name}={value}");
        }
    }
    Ok(())
}
