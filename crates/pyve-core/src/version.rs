//! Python version resolution.
//!
//! Precedence: explicit argument > `.python-version` > configured default
//! (`PYVE_PYTHON_VERSION`, then `python.version` in `.pyve/config`) > built-in.

use crate::config::ProjectConfig;
use crate::error::{PyveError, Result};
use crate::paths;
use regex::Regex;
use serde::Serialize;
use std::path::Path;
use std::sync::OnceLock;

pub const DEFAULT_PYTHON_VERSION: &str = "3.12.8";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VersionSource {
    Explicit,
    File,
    Environment,
    Config,
    Default,
}

impl VersionSource {
    pub fn as_str(self) -> &'static str {
        match self {
            VersionSource::Explicit => "command line",
            VersionSource::File => paths::PYTHON_VERSION_FILE,
            VersionSource::Environment => "PYVE_PYTHON_VERSION",
            VersionSource::Config => ".pyve/config",
            VersionSource::Default => "default",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VersionResolution {
    pub version: String,
    pub source: VersionSource,
}

static VERSION_RE: OnceLock<Regex> = OnceLock::new();

fn version_re() -> &'static Regex {
    VERSION_RE.get_or_init(|| Regex::new(r"^\d+\.\d+(\.\d+)?$").expect("valid regex"))
}

pub fn validate_version(version: &str) -> Result<()> {
    if version_re().is_match(version) {
        Ok(())
    } else {
        Err(PyveError::InvalidPythonVersion(version.to_string()))
    }
}

/// Read the version from `.python-version`: the first non-empty,
/// non-comment line, trimmed.
pub fn read_version_file(root: &Path) -> Result<Option<String>> {
    let path = paths::python_version_path(root);
    if !path.exists() {
        return Ok(None);
    }
    let content = std::fs::read_to_string(&path)?;
    Ok(content
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty() && !l.starts_with('#'))
        .map(str::to_string))
}

pub fn write_version_file(root: &Path, version: &str) -> Result<()> {
    validate_version(version)?;
    crate::io::atomic_write(
        &paths::python_version_path(root),
        format!("{version}\n").as_bytes(),
    )
}

pub fn resolve_version(
    root: &Path,
    explicit: Option<&str>,
    env_default: Option<&str>,
    config: Option<&ProjectConfig>,
) -> Result<VersionResolution> {
    let non_empty = |s: &&str| !s.trim().is_empty();

    let (version, source) = if let Some(v) = explicit.filter(non_empty) {
        (v.trim().to_string(), VersionSource::Explicit)
    } else if let Some(v) = read_version_file(root)? {
        (v, VersionSource::File)
    } else if let Some(v) = env_default.filter(non_empty) {
        (v.trim().to_string(), VersionSource::Environment)
    } else if let Some(v) = config.and_then(|c| c.python.version.as_deref()).filter(non_empty) {
        (v.trim().to_string(), VersionSource::Config)
    } else {
        (DEFAULT_PYTHON_VERSION.to_string(), VersionSource::Default)
    };

    Ok(VersionResolution { version, source })
}

/// True when `actual` satisfies `requested` component-wise
/// (`3.11` accepts `3.11.5`, `3.11.5` accepts only `3.11.5`).
pub fn version_matches(requested: &str, actual: &str) -> bool {
    let req: Vec<&str> = requested.trim().split('.').collect();
    let act: Vec<&str> = actual.trim().split('.').collect();
    req.len() <= act.len() && req.iter().zip(&act).all(|(r, a)| r == a)
}

/// `3.11.5` → `3.11`.
pub fn major_minor(version: &str) -> Option<String> {
    let mut parts = version.split('.');
    let major = parts.next()?;
    let minor = parts.next()?;
    Some(format!("{major}.{minor}"))
}

/// Extract the version from `python --version` output (`Python 3.11.5`).
pub fn parse_python_version_output(output: &str) -> Option<String> {
    output
        .split_whitespace()
        .find(|tok| tok.chars().next().is_some_and(|c| c.is_ascii_digit()))
        .map(|tok| tok.trim().to_string())
}

/// Python version recorded in a venv's `pyvenv.cfg`.
pub fn read_pyvenv_version(venv: &Path) -> Option<String> {
    let content = std::fs::read_to_string(venv.join(paths::PYVENV_CFG)).ok()?;
    let mut fallback = None;
    for line in content.lines() {
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        match key.trim() {
            "version" => return Some(value.trim().to_string()),
            "version_info" => {
                // uv writes `3.11.5.final.0`
                let v: Vec<&str> = value.trim().split('.').take(3).collect();
                fallback = Some(v.join("."));
            }
            _ => {}
        }
    }
    fallback
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn explicit_overrides_file() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(".python-version"), "3.11.5\n").unwrap();
        let res = resolve_version(dir.path(), Some("3.10"), None, None).unwrap();
        assert_eq!(res.version, "3.10");
        assert_eq!(res.source, VersionSource::Explicit);
    }

    #[test]
    fn file_wins_over_configured_default() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(".python-version"), "# pinned\n3.11.5\n").unwrap();
        let res = resolve_version(dir.path(), None, Some("3.9"), None).unwrap();
        assert_eq!(res.version, "3.11.5");
        assert_eq!(res.source, VersionSource::File);
    }

    #[test]
    fn environment_then_config_then_builtin() {
        let dir = TempDir::new().unwrap();
        let cfg = ProjectConfig::parse("python:\n  version: \"3.10\"\n").unwrap();

        let res = resolve_version(dir.path(), None, Some("3.9"), Some(&cfg)).unwrap();
        assert_eq!((res.version.as_str(), res.source), ("3.9", VersionSource::Environment));

        let res = resolve_version(dir.path(), None, Some(" "), Some(&cfg)).unwrap();
        assert_eq!((res.version.as_str(), res.source), ("3.10", VersionSource::Config));

        let res = resolve_version(dir.path(), None, None, None).unwrap();
        assert_eq!(res.version, DEFAULT_PYTHON_VERSION);
        assert_eq!(res.source, VersionSource::Default);
    }

    #[test]
    fn write_then_read_version_file() {
        let dir = TempDir::new().unwrap();
        write_version_file(dir.path(), "3.11.5").unwrap();
        assert_eq!(
            std::fs::read_to_string(dir.path().join(".python-version")).unwrap(),
            "3.11.5\n"
        );
        assert_eq!(read_version_file(dir.path()).unwrap().as_deref(), Some("3.11.5"));
        assert!(write_version_file(dir.path(), "latest").is_err());
    }

    #[test]
    fn matching_is_component_prefix() {
        assert!(version_matches("3.11", "3.11.5"));
        assert!(version_matches("3.11.5", "3.11.5"));
        assert!(!version_matches("3.1", "3.11.5"));
        assert!(!version_matches("3.11.5", "3.11"));
        assert_eq!(major_minor("3.11.5").as_deref(), Some("3.11"));
        assert_eq!(major_minor("3"), None);
    }

    #[test]
    fn parses_interpreter_output() {
        assert_eq!(
            parse_python_version_output("Python 3.11.5\n").as_deref(),
            Some("3.11.5")
        );
        assert_eq!(parse_python_version_output("garbage"), None);
    }

    #[test]
    fn reads_pyvenv_cfg() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("pyvenv.cfg"),
            "home = /usr/bin\ninclude-system-site-packages = false\nversion = 3.11.5\n",
        )
        .unwrap();
        assert_eq!(read_pyvenv_version(dir.path()).as_deref(), Some("3.11.5"));

        std::fs::write(dir.path().join("pyvenv.cfg"), "version_info = 3.12.1.final.0\n").unwrap();
        assert_eq!(read_pyvenv_version(dir.path()).as_deref(), Some("3.12.1"));
    }
}
