//! Consistency checks behind `pyve --validate`.

use serde::Serialize;
use std::path::Path;

use crate::backend::{Backend, Markers};
use crate::config::{ProjectConfig, VersionStatus, PYVE_VERSION};
use crate::direnv;
use crate::micromamba;
use crate::paths;
use crate::venv;
use crate::version;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckLevel {
    Pass,
    Info,
    Warning,
    Error,
}

impl CheckLevel {
    pub fn symbol(self) -> &'static str {
        match self {
            CheckLevel::Pass => "✓",
            CheckLevel::Info => "·",
            CheckLevel::Warning => "⚠",
            CheckLevel::Error => "✗",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Check {
    pub name: &'static str,
    pub level: CheckLevel,
    pub message: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Report {
    pub checks: Vec<Check>,
}

impl Report {
    fn push(&mut self, name: &'static str, level: CheckLevel, message: impl Into<String>) {
        self.checks.push(Check {
            name,
            level,
            message: message.into(),
        });
    }

    pub fn worst(&self) -> CheckLevel {
        self.checks
            .iter()
            .map(|c| c.level)
            .max()
            .unwrap_or(CheckLevel::Pass)
    }

    /// 0 when everything passed, 2 when only warnings, 1 on any error.
    pub fn exit_code(&self) -> i32 {
        match self.worst() {
            CheckLevel::Error => 1,
            CheckLevel::Warning => 2,
            CheckLevel::Pass | CheckLevel::Info => 0,
        }
    }
}

/// Run every check against the project at `root`.
pub fn validate(root: &Path) -> Report {
    let mut report = Report::default();

    if !paths::pyve_dir(root).is_dir() {
        report.push("pyve_dir", CheckLevel::Error, "Missing .pyve directory (run 'pyve --init')");
        return report;
    }
    report.push("pyve_dir", CheckLevel::Pass, ".pyve directory present");

    let config = match ProjectConfig::load_optional(root) {
        Ok(Some(cfg)) => cfg,
        Ok(None) => {
            report.push("config", CheckLevel::Error, "Missing .pyve/config");
            return report;
        }
        Err(e) => {
            report.push("config", CheckLevel::Error, e.to_string());
            return report;
        }
    };
    report.push("config", CheckLevel::Pass, "Configuration is valid");

    let Some(backend) = config.backend else {
        report.push("backend", CheckLevel::Error, "Backend not set in .pyve/config");
        return report;
    };
    report.push("backend", CheckLevel::Pass, format!("Backend: {backend}"));

    match config.version_status() {
        VersionStatus::Current => report.push(
            "pyve_version",
            CheckLevel::Pass,
            format!("Pyve version: {PYVE_VERSION}"),
        ),
        status => report.push(
            "pyve_version",
            CheckLevel::Warning,
            status.describe().unwrap_or_default(),
        ),
    }

    check_environment(root, &config, backend, &mut report);
    check_markers(root, backend, &mut report);
    if backend == Backend::Venv {
        check_python_version(root, &config, &mut report);
    }
    check_direnv(root, &mut report);

    report
}

fn check_environment(root: &Path, config: &ProjectConfig, backend: Backend, report: &mut Report) {
    match backend {
        Backend::Venv => {
            let dir = config.venv_dir();
            if venv::is_venv(&root.join(dir)) {
                report.push("environment", CheckLevel::Pass, format!("Virtual environment: {dir}"));
            } else {
                report.push(
                    "environment",
                    CheckLevel::Error,
                    format!("Virtual environment not found: {dir}"),
                );
            }
        }
        Backend::Micromamba => {
            let Some(name) = config.micromamba.env_name.as_deref() else {
                report.push(
                    "environment",
                    CheckLevel::Error,
                    "micromamba.env_name not set in .pyve/config",
                );
                return;
            };
            let prefix = paths::micromamba_prefix(root, name);
            if micromamba::env_exists(&prefix) {
                report.push(
                    "environment",
                    CheckLevel::Pass,
                    format!("Micromamba environment: {}/{name}", paths::ENVS_DIR),
                );
            } else {
                report.push(
                    "environment",
                    CheckLevel::Error,
                    format!("Micromamba environment not found: {}/{name}", paths::ENVS_DIR),
                );
            }
        }
    }
}

fn check_markers(root: &Path, backend: Backend, report: &mut Report) {
    let markers = Markers::scan(root);
    match backend {
        Backend::Micromamba if !markers.has_conda() => report.push(
            "markers",
            CheckLevel::Error,
            "micromamba backend but no environment.yml or conda-lock.yml",
        ),
        Backend::Micromamba => {
            if micromamba::lock_is_stale(root) {
                report.push(
                    "markers",
                    CheckLevel::Warning,
                    "conda-lock.yml is older than environment.yml",
                );
            } else {
                report.push("markers", CheckLevel::Pass, "Environment file present");
            }
        }
        Backend::Venv if markers.has_conda() && !markers.has_pip() => report.push(
            "markers",
            CheckLevel::Warning,
            "environment.yml present but backend is venv",
        ),
        Backend::Venv => report.push("markers", CheckLevel::Pass, "Project files match backend"),
    }
}

fn check_python_version(root: &Path, config: &ProjectConfig, report: &mut Report) {
    let file_version = match version::read_version_file(root) {
        Ok(Some(v)) => v,
        Ok(None) => {
            report.push("python_version", CheckLevel::Warning, ".python-version not found");
            return;
        }
        Err(e) => {
            report.push("python_version", CheckLevel::Error, e.to_string());
            return;
        }
    };

    if let Some(recorded) = config.python.version.as_deref() {
        if !version::version_matches(recorded, &file_version)
            && !version::version_matches(&file_version, recorded)
        {
            report.push(
                "python_version",
                CheckLevel::Warning,
                format!(".python-version is {file_version} but .pyve/config records {recorded}"),
            );
            return;
        }
    }

    let venv_path = root.join(config.venv_dir());
    match version::read_pyvenv_version(&venv_path) {
        Some(actual) if !version::version_matches(&file_version, &actual) => report.push(
            "python_version",
            CheckLevel::Error,
            format!(
                "Virtual environment uses Python {actual} but .python-version requests {file_version}"
            ),
        ),
        _ => report.push(
            "python_version",
            CheckLevel::Pass,
            format!("Python version: {file_version}"),
        ),
    }
}

fn check_direnv(root: &Path, report: &mut Report) {
    let envrc = paths::envrc_path(root);
    let message = match std::fs::read_to_string(&envrc) {
        Ok(content) if direnv::is_managed(&content) => ".envrc present",
        Ok(_) => ".envrc present (not managed by pyve)",
        Err(_) => ".envrc not present",
    };
    let tool = if which::which("direnv").is_ok() {
        "direnv installed"
    } else {
        "direnv not installed"
    };
    report.push("direnv", CheckLevel::Info, format!("{message}; {tool}"));
}
