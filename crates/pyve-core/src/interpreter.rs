//! Python interpreter discovery.
//!
//! Version managers are preferred in this order:
//! 1. asdf (`asdf where python <v>`)
//! 2. pyenv (`pyenv prefix <v>`)
//!
//! Without a manager, `python<major.minor>`, `python3` and `python` on PATH
//! are probed and the first whose `--version` satisfies the request wins.

use std::path::PathBuf;
use std::process::Command;

use crate::error::{PyveError, Result};
use crate::process;
use crate::version::{self, VersionResolution, VersionSource};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionManager {
    Asdf,
    Pyenv,
}

impl VersionManager {
    pub fn name(&self) -> &'static str {
        match self {
            VersionManager::Asdf => "asdf",
            VersionManager::Pyenv => "pyenv",
        }
    }

    /// Detect the preferred version manager on PATH.
    pub fn detect() -> Option<Self> {
        if which::which("asdf").is_ok() {
            return Some(VersionManager::Asdf);
        }
        if which::which("pyenv").is_ok() {
            return Some(VersionManager::Pyenv);
        }
        None
    }

    /// Installation prefix for `version`, if the manager has it.
    fn prefix(&self, version: &str) -> Option<PathBuf> {
        let mut cmd = Command::new(self.name());
        match self {
            VersionManager::Asdf => cmd.args(["where", "python", version]),
            VersionManager::Pyenv => cmd.args(["prefix", version]),
        };
        process::probe(&mut cmd)
            .map(PathBuf::from)
            .filter(|p| p.is_dir())
    }

    pub fn is_installed(&self, version: &str) -> bool {
        self.prefix(version).is_some()
    }

    pub fn install(&self, version: &str) -> Result<()> {
        let mut cmd = Command::new(self.name());
        match self {
            VersionManager::Asdf => cmd.args(["install", "python", version]),
            VersionManager::Pyenv => cmd.args(["install", "--skip-existing", version]),
        };
        process::run_streaming(&mut cmd)
    }

    /// Make sure `version` is installed, installing it when missing.
    /// Returns true if an install happened.
    pub fn ensure_installed(&self, version: &str) -> Result<bool> {
        if self.is_installed(version) {
            return Ok(false);
        }
        println!("Installing Python {version} with {}...", self.name());
        self.install(version)?;
        Ok(true)
    }

    pub fn python_path(&self, version: &str) -> Result<PathBuf> {
        let prefix = self
            .prefix(version)
            .ok_or_else(|| PyveError::PythonUnavailable {
                version: version.to_string(),
                reason: format!("{} has no installation of this version", self.name()),
            })?;
        Ok(prefix.join("bin").join("python"))
    }
}

// ---------------------------------------------------------------------------
// Interpreter
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interpreter {
    pub path: PathBuf,
    pub version: String,
}

impl Interpreter {
    /// Probe `path --version`.
    pub fn probe(path: PathBuf) -> Option<Self> {
        let line = process::probe(Command::new(&path).arg("--version"))?;
        let version = version::parse_python_version_output(&line)?;
        Some(Self { path, version })
    }
}

/// Executable names to try on PATH for `requested`, most specific first.
pub fn candidate_names(requested: &str) -> Vec<String> {
    let mut names = Vec::new();
    if let Some(mm) = version::major_minor(requested) {
        names.push(format!("python{mm}"));
    }
    names.push("python3".to_string());
    names.push("python".to_string());
    names
}

/// Find an interpreter satisfying `requested`.
///
/// An explicitly requested version (flag, `.python-version`, environment or
/// config) must be satisfied exactly; the built-in default falls back to any
/// `python3` with a warning.
pub fn find_interpreter(requested: &VersionResolution) -> Result<Interpreter> {
    let wanted = requested.version.as_str();

    if let Some(manager) = VersionManager::detect() {
        tracing::debug!(manager = manager.name(), version = wanted, "using version manager");
        manager.ensure_installed(wanted)?;
        let path = manager.python_path(wanted)?;
        return Interpreter::probe(path.clone()).ok_or_else(|| PyveError::PythonUnavailable {
            version: wanted.to_string(),
            reason: format!("{} did not run", path.display()),
        });
    }

    let mut fallback = None;
    for name in candidate_names(wanted) {
        let Ok(path) = which::which(&name) else {
            continue;
        };
        let Some(interp) = Interpreter::probe(path) else {
            continue;
        };
        if version::version_matches(wanted, &interp.version) {
            return Ok(interp);
        }
        if fallback.is_none() {
            fallback = Some(interp);
        }
    }

    match fallback {
        Some(interp) if requested.source == VersionSource::Default => {
            tracing::warn!(
                requested = wanted,
                found = %interp.version,
                "default Python version unavailable, using system interpreter"
            );
            eprintln!(
                "warning: Python {wanted} not found and no version manager (asdf/pyenv) installed; using {} ({})",
                interp.path.display(),
                interp.version
            );
            Ok(interp)
        }
        Some(interp) => Err(PyveError::PythonUnavailable {
            version: wanted.to_string(),
            reason: format!(
                "found only Python {} at {}; install asdf or pyenv to manage versions",
                interp.version,
                interp.path.display()
            ),
        }),
        None => Err(PyveError::PythonUnavailable {
            version: wanted.to_string(),
            reason: "no python interpreter on PATH".to_string(),
        }),
    }
}
