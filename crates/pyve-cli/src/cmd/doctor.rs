use crate::output::{print_heading, print_json, print_table};
use anyhow::Context;
use pyve_core::backend::Backend;
use pyve_core::config::{ProjectConfig, PYVE_VERSION};
use pyve_core::interpreter::{Interpreter, VersionManager};
use pyve_core::{micromamba, paths, venv, version};
use serde::Serialize;
use std::path::Path;

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct EnvironmentStatus {
    path: String,
    present: bool,
}

#[derive(Serialize)]
struct ToolStatus {
    name: &'static str,
    path: Option<String>,
}

#[derive(Serialize)]
struct DoctorReport {
    pyve_version: &'static str,
    initialized: bool,
    backend: Option<Backend>,
    environment: Option<EnvironmentStatus>,
    python_version: Option<String>,
    micromamba_version: Option<String>,
    env_name: Option<String>,
    tools: Vec<ToolStatus>,
    warnings: Vec<String>,
}

fn tools(root: &Path) -> Vec<ToolStatus> {
    let on_path = |name: &'static str| ToolStatus {
        name,
        path: which::which(name).ok().map(|p| p.display().to_string()),
    };
    vec![
        on_path("asdf"),
        on_path("pyenv"),
        on_path("direnv"),
        ToolStatus {
            name: "micromamba",
            path: micromamba::find_binary(root).map(|p| p.display().to_string()),
        },
    ]
}

fn inspect(root: &Path, config: &ProjectConfig) -> DoctorReport {
    let mut warnings = Vec::new();
    if let Some(w) = config.version_status().describe() {
        warnings.push(w);
    }

    let backend = config.backend.unwrap_or(Backend::Venv);
    if config.backend.is_none() {
        warnings.push("backend not recorded in .pyve/config; assuming venv".to_string());
    }

    let (env_rel, env_name) = match backend {
        Backend::Venv => (config.venv_dir().to_string(), None),
        Backend::Micromamba => {
            let name = config.micromamba.env_name.clone();
            let rel = match &name {
                Some(n) => format!("{}/{n}", paths::ENVS_DIR),
                None => {
                    warnings.push("micromamba.env_name not recorded in .pyve/config".to_string());
                    paths::ENVS_DIR.to_string()
                }
            };
            (rel, name)
        }
    };
    let env_path = root.join(&env_rel);
    let present = match backend {
        Backend::Venv => venv::is_venv(&env_path),
        Backend::Micromamba => micromamba::env_exists(&env_path),
    };

    let python_version = if present {
        version::read_pyvenv_version(&env_path)
            .or_else(|| Interpreter::probe(paths::env_python(&env_path)).map(|i| i.version))
    } else {
        None
    };

    let micromamba_version = match backend {
        Backend::Micromamba => micromamba::find_binary(root).and_then(|b| micromamba::binary_version(&b)),
        Backend::Venv => None,
    };

    DoctorReport {
        pyve_version: PYVE_VERSION,
        initialized: true,
        backend: Some(backend),
        environment: Some(EnvironmentStatus {
            path: env_rel,
            present,
        }),
        python_version,
        micromamba_version,
        env_name,
        tools: tools(root),
        warnings,
    }
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

pub fn run(root: &Path, json: bool) -> anyhow::Result<()> {
    let config = ProjectConfig::load_optional(root).context("failed to read .pyve/config")?;

    let report = match &config {
        Some(cfg) => inspect(root, cfg),
        None => DoctorReport {
            pyve_version: PYVE_VERSION,
            initialized: false,
            backend: None,
            environment: None,
            python_version: None,
            micromamba_version: None,
            env_name: None,
            tools: tools(root),
            warnings: Vec::new(),
        },
    };

    if json {
        return print_json(&report);
    }

    print_heading("Pyve Environment Diagnostics");
    println!("Pyve version: {}", report.pyve_version);
    if !report.initialized {
        println!("Environment not initialized (run 'pyve --init')");
    }
    if let Some(backend) = report.backend {
        println!("Backend: {backend}");
    }
    if let Some(env) = &report.environment {
        let state = if env.present { "present" } else { "missing" };
        println!("Environment: {} ({state})", env.path);
    }
    if let Some(name) = &report.env_name {
        println!("Environment name: {name}");
    }
    if report.initialized {
        println!(
            "Python: {}",
            report.python_version.as_deref().unwrap_or("unknown")
        );
    }
    if let Some(v) = &report.micromamba_version {
        println!("Micromamba: {v}");
    }

    println!();
    let rows = report
        .tools
        .iter()
        .map(|t| {
            vec![
                t.name.to_string(),
                t.path.clone().unwrap_or_else(|| "not found".to_string()),
            ]
        })
        .collect();
    print_table(&["TOOL", "LOCATION"], rows);
    if let Some(manager) = VersionManager::detect() {
        println!("Python version manager: {}", manager.name());
    } else {
        println!("Python version manager: none (install asdf or pyenv)");
    }

    for w in &report.warnings {
        println!("⚠ {w}");
    }
    Ok(())
}
