use crate::backend::Backend;
use crate::error::{PyveError, Result};
use crate::paths;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Version of the pyve binary embedded at compile time.
pub const PYVE_VERSION: &str = env!("CARGO_PKG_VERSION");

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VenvConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub directory: Option<String>,
}

impl VenvConfig {
    fn is_empty(&self) -> bool {
        self.directory.is_none()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PythonConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

impl PythonConfig {
    fn is_empty(&self) -> bool {
        self.version.is_none()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MicromambaConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub env_name: Option<String>,
}

impl MicromambaConfig {
    fn is_empty(&self) -> bool {
        self.env_name.is_none()
    }
}

// ---------------------------------------------------------------------------
// ProjectConfig (.pyve/config)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// pyve version that last wrote this file. Absent in legacy projects.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pyve_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backend: Option<Backend>,
    #[serde(default, skip_serializing_if = "VenvConfig::is_empty")]
    pub venv: VenvConfig,
    #[serde(default, skip_serializing_if = "PythonConfig::is_empty")]
    pub python: PythonConfig,
    #[serde(default, skip_serializing_if = "MicromambaConfig::is_empty")]
    pub micromamba: MicromambaConfig,
    /// Paths `--init` created, relative to the project root. Purge deletes
    /// only these. Absent in configs written before creation was recorded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<Vec<String>>,
}

impl ProjectConfig {
    pub fn new(backend: Backend) -> Self {
        Self {
            pyve_version: Some(PYVE_VERSION.to_string()),
            backend: Some(backend),
            ..Self::default()
        }
    }

    /// Load `.pyve/config`. Missing file is `NotInitialized`.
    pub fn load(root: &Path) -> Result<Self> {
        Self::load_optional(root)?.ok_or(PyveError::NotInitialized)
    }

    /// Load `.pyve/config` if it exists.
    pub fn load_optional(root: &Path) -> Result<Option<Self>> {
        let path = paths::config_path(root);
        if !path.exists() {
            return Ok(None);
        }
        let data = std::fs::read_to_string(&path)?;
        Self::parse(&data).map(Some)
    }

    pub fn parse(data: &str) -> Result<Self> {
        if data.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(data).map_err(|e| PyveError::ConfigInvalid {
            path: paths::CONFIG_FILE.to_string(),
            reason: e.to_string(),
        })
    }

    pub fn save(&self, root: &Path) -> Result<()> {
        let path = paths::config_path(root);
        let data = serde_yaml::to_string(self)?;
        crate::io::atomic_write(&path, data.as_bytes())
    }

    /// Directory of the venv relative to the project root.
    pub fn venv_dir(&self) -> &str {
        self.venv
            .directory
            .as_deref()
            .filter(|d| !d.trim().is_empty())
            .unwrap_or(paths::DEFAULT_VENV_DIR)
    }

    /// Whether pyve created `rel`. Without a record every path counts as
    /// pyve's, which is how purge behaved before the record existed.
    pub fn was_created(&self, rel: &str) -> bool {
        self.created
            .as_ref()
            .map_or(true, |list| list.iter().any(|p| p == rel))
    }

    /// Record the running pyve version. Returns the previous value.
    pub fn stamp_version(&mut self) -> Option<String> {
        self.pyve_version.replace(PYVE_VERSION.to_string())
    }

    pub fn version_status(&self) -> VersionStatus {
        VersionStatus::compare(self.pyve_version.as_deref(), PYVE_VERSION)
    }
}

// ---------------------------------------------------------------------------
// VersionStatus: recorded pyve version vs the running binary
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "recorded", rename_all = "snake_case")]
pub enum VersionStatus {
    /// No `pyve_version` key (project predates version tracking).
    NotRecorded,
    Current,
    Older(String),
    Newer(String),
    Unparseable(String),
}

impl VersionStatus {
    pub fn compare(recorded: Option<&str>, current: &str) -> Self {
        let Some(recorded) = recorded.map(str::trim).filter(|s| !s.is_empty()) else {
            return VersionStatus::NotRecorded;
        };
        let (Ok(rec), Ok(cur)) = (
            semver::Version::parse(recorded.trim_start_matches('v')),
            semver::Version::parse(current),
        ) else {
            return VersionStatus::Unparseable(recorded.to_string());
        };
        match rec.cmp(&cur) {
            std::cmp::Ordering::Less => VersionStatus::Older(recorded.to_string()),
            std::cmp::Ordering::Greater => VersionStatus::Newer(recorded.to_string()),
            std::cmp::Ordering::Equal => VersionStatus::Current,
        }
    }

    /// Human-readable description, `None` when the versions match.
    pub fn describe(&self) -> Option<String> {
        match self {
            VersionStatus::Current => None,
            VersionStatus::NotRecorded => Some(
                "pyve version not recorded (legacy project); run 'pyve --init --update' to record it"
                    .to_string(),
            ),
            VersionStatus::Older(v) => Some(format!(
                "project initialized with pyve {v}, running {PYVE_VERSION}; run 'pyve --init --update'"
            )),
            VersionStatus::Newer(v) => Some(format!(
                "project initialized with newer pyve {v}, running {PYVE_VERSION}; consider upgrading pyve"
            )),
            VersionStatus::Unparseable(v) => Some(format!(
                "recorded pyve version '{v}' is not a valid version"
            )),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
