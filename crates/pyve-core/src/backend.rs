//! Backend selection.
//!
//! A directory gets exactly one backend. The choice is made from, in order:
//! the `--backend` flag (or `PYVE_BACKEND`), the `backend` key in
//! `.pyve/config`, marker files on disk, and finally the venv default.

use crate::error::PyveError;
use crate::paths;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

// ---------------------------------------------------------------------------
// Backend
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Backend {
    Venv,
    Micromamba,
}

impl Backend {
    pub fn as_str(self) -> &'static str {
        match self {
            Backend::Venv => "venv",
            Backend::Micromamba => "micromamba",
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Backend {
    type Err = PyveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "venv" => Ok(Backend::Venv),
            "micromamba" => Ok(Backend::Micromamba),
            other => Err(PyveError::InvalidBackend(other.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// BackendRequest: what the user asked for on the command line
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendRequest {
    Auto,
    Explicit(Backend),
}

impl std::str::FromStr for BackendRequest {
    type Err = PyveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("auto") {
            return Ok(BackendRequest::Auto);
        }
        s.parse().map(BackendRequest::Explicit)
    }
}

// ---------------------------------------------------------------------------
// Marker detection
// ---------------------------------------------------------------------------

/// Which backend marker files are present in a directory.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Markers {
    pub environment_yml: bool,
    pub conda_lock: bool,
    pub requirements_txt: bool,
    pub pyproject_toml: bool,
}

impl Markers {
    pub fn scan(dir: &Path) -> Self {
        Self {
            environment_yml: dir.join(paths::ENVIRONMENT_YML).is_file(),
            conda_lock: dir.join(paths::CONDA_LOCK_YML).is_file(),
            requirements_txt: dir.join(paths::REQUIREMENTS_TXT).is_file(),
            pyproject_toml: dir.join(paths::PYPROJECT_TOML).is_file(),
        }
    }

    pub fn has_conda(&self) -> bool {
        self.environment_yml || self.conda_lock
    }

    pub fn has_pip(&self) -> bool {
        self.requirements_txt || self.pyproject_toml
    }

    /// Both pip-style and conda-style markers are present.
    pub fn is_ambiguous(&self) -> bool {
        self.has_conda() && self.has_pip()
    }
}

/// Map marker files to a backend. Pure and total: conda markers alone select
/// micromamba; every other combination (pip markers, both, none) selects venv.
pub fn detect_backend(markers: &Markers) -> Backend {
    if markers.has_conda() && !markers.has_pip() {
        Backend::Micromamba
    } else {
        Backend::Venv
    }
}

// ---------------------------------------------------------------------------
// Resolution
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendSource {
    Flag,
    Config,
    Detected,
    Default,
}

impl BackendSource {
    pub fn as_str(self) -> &'static str {
        match self {
            BackendSource::Flag => "command line",
            BackendSource::Config => ".pyve/config",
            BackendSource::Detected => "project files",
            BackendSource::Default => "default",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BackendResolution {
    pub backend: Backend,
    pub source: BackendSource,
    pub ambiguous: bool,
}

/// Resolve the backend for `dir`.
///
/// `requested` is the flag value (`None` when no flag was given), `configured`
/// is the `backend` key from `.pyve/config`.
pub fn resolve_backend(
    dir: &Path,
    requested: Option<BackendRequest>,
    configured: Option<Backend>,
) -> BackendResolution {
    let markers = Markers::scan(dir);
    let ambiguous = markers.is_ambiguous();

    if let Some(BackendRequest::Explicit(backend)) = requested {
        return BackendResolution {
            backend,
            source: BackendSource::Flag,
            ambiguous,
        };
    }
    // An explicit `auto` flag skips the config layer.
    if requested.is_none() {
        if let Some(backend) = configured {
            return BackendResolution {
                backend,
                source: BackendSource::Config,
                ambiguous,
            };
        }
    }

    let source = if markers.has_conda() || markers.has_pip() {
        BackendSource::Detected
    } else {
        BackendSource::Default
    };
    BackendResolution {
        backend: detect_backend(&markers),
        source,
        ambiguous,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
