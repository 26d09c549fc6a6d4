//! micromamba backend: binary lookup, environment.yml handling, and
//! environment creation under `.pyve/envs/<name>`.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::config::ProjectConfig;
use crate::error::{PyveError, Result};
use crate::paths;
use crate::process;

const INSTALL_HINT: &str =
    "install micromamba (https://mamba.readthedocs.io/en/latest/installation/micromamba-installation.html) \
     or place the binary at .pyve/bin/micromamba";

// ---------------------------------------------------------------------------
// Binary lookup
// ---------------------------------------------------------------------------

/// Locate micromamba: project sandbox, user sandbox, then PATH.
pub fn find_binary(root: &Path) -> Option<PathBuf> {
    let project = root.join(paths::PROJECT_BIN_DIR).join("micromamba");
    if project.is_file() {
        return Some(project);
    }
    if let Some(home) = home::home_dir() {
        let user = home.join(paths::PROJECT_BIN_DIR).join("micromamba");
        if user.is_file() {
            return Some(user);
        }
    }
    which::which("micromamba").ok()
}

pub fn require_binary(root: &Path) -> Result<PathBuf> {
    find_binary(root).ok_or_else(|| PyveError::ToolNotFound {
        tool: "micromamba".to_string(),
        hint: INSTALL_HINT.to_string(),
    })
}

pub fn binary_version(binary: &Path) -> Option<String> {
    process::probe(Command::new(binary).arg("--version"))
}

// ---------------------------------------------------------------------------
// environment.yml
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct EnvironmentFile {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub channels: Vec<String>,
    /// Strings, or a nested `{pip: [...]}` mapping.
    #[serde(default)]
    pub dependencies: Vec<serde_yaml::Value>,
}

impl EnvironmentFile {
    pub fn load(root: &Path) -> Result<Option<Self>> {
        let path = root.join(paths::ENVIRONMENT_YML);
        if !path.exists() {
            return Ok(None);
        }
        let data = std::fs::read_to_string(&path)?;
        Self::parse(&data).map(Some)
    }

    pub fn parse(data: &str) -> Result<Self> {
        if data.trim().is_empty() {
            return Err(PyveError::InvalidEnvironmentFile("file is empty".to_string()));
        }
        serde_yaml::from_str(data).map_err(|e| PyveError::InvalidEnvironmentFile(e.to_string()))
    }

    /// The `python` dependency spec, e.g. `3.11` from `python=3.11`.
    pub fn python_spec(&self) -> Option<String> {
        self.dependencies.iter().filter_map(|d| d.as_str()).find_map(|dep| {
            let rest = dep.trim().strip_prefix("python")?;
            if rest.is_empty() {
                return None;
            }
            let first = rest.chars().next()?;
            if !matches!(first, '=' | '>' | '<' | '~' | ' ' | '!') {
                return None;
            }
            Some(rest.trim_start_matches(['=', ' ']).to_string())
        })
    }
}

// ---------------------------------------------------------------------------
// Environment name
// ---------------------------------------------------------------------------

/// Resolve the environment name: flag > config > environment.yml > directory.
pub fn resolve_env_name(
    root: &Path,
    flag: Option<&str>,
    config: Option<&ProjectConfig>,
    env_file: Option<&EnvironmentFile>,
) -> Result<String> {
    let name = flag
        .map(str::to_string)
        .or_else(|| config.and_then(|c| c.micromamba.env_name.clone()))
        .or_else(|| env_file.and_then(|f| f.name.clone()))
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| {
            let dir = root
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            paths::sanitize_env_name(&dir)
        });
    paths::validate_env_name(&name)?;
    Ok(name)
}

// ---------------------------------------------------------------------------
// Spec selection
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpecFile {
    Lock(PathBuf),
    Environment(PathBuf),
}

impl SpecFile {
    pub fn path(&self) -> &Path {
        match self {
            SpecFile::Lock(p) | SpecFile::Environment(p) => p,
        }
    }
}

/// True when `conda-lock.yml` is older than `environment.yml`.
pub fn lock_is_stale(root: &Path) -> bool {
    let modified = |name: &str| std::fs::metadata(root.join(name)).and_then(|m| m.modified()).ok();
    match (modified(paths::CONDA_LOCK_YML), modified(paths::ENVIRONMENT_YML)) {
        (Some(lock), Some(env)) => lock < env,
        _ => false,
    }
}

/// Prefer `conda-lock.yml` for reproducibility, else `environment.yml`.
pub fn select_spec(root: &Path) -> Result<SpecFile> {
    let lock = root.join(paths::CONDA_LOCK_YML);
    let env = root.join(paths::ENVIRONMENT_YML);
    if lock.is_file() {
        if lock_is_stale(root) {
            tracing::warn!("conda-lock.yml is older than environment.yml");
            eprintln!(
                "warning: conda-lock.yml is older than environment.yml; regenerate it with conda-lock"
            );
        }
        return Ok(SpecFile::Lock(lock));
    }
    if env.is_file() {
        return Ok(SpecFile::Environment(env));
    }
    Err(PyveError::MissingEnvironmentFile(root.display().to_string()))
}

// ---------------------------------------------------------------------------
// Create / run
// ---------------------------------------------------------------------------

pub fn env_exists(prefix: &Path) -> bool {
    prefix.join("conda-meta").is_dir()
}

/// Create the environment at `prefix` from `spec`. An existing environment
/// is left untouched.
pub fn create_env(binary: &Path, prefix: &Path, spec: &SpecFile) -> Result<()> {
    if env_exists(prefix) {
        tracing::debug!(prefix = %prefix.display(), "micromamba env already present");
        return Ok(());
    }
    if let Some(parent) = prefix.parent() {
        std::fs::create_dir_all(parent)?;
    }
    println!(
        "Creating micromamba environment at {} from {}",
        prefix.display(),
        spec.path().file_name().unwrap_or_default().to_string_lossy()
    );
    let mut cmd = Command::new(binary);
    cmd.arg("create")
        .arg("--yes")
        .arg("--prefix")
        .arg(prefix)
        .arg("--file")
        .arg(spec.path());
    process::run_streaming(&mut cmd)
}

/// `micromamba run -p <prefix> <argv...>`.
pub fn run_command(binary: &Path, prefix: &Path, argv: &[String]) -> Command {
    let mut cmd = Command::new(binary);
    cmd.arg("run").arg("--prefix").arg(prefix).args(argv);
    cmd
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const ENV_YML: &str = "name: test-env\nchannels:\n  - conda-forge\ndependencies:\n  - python=3.11\n  - requests\n  - pip:\n    - rich\n";

    #[test]
    fn parses_environment_file() {
        let f = EnvironmentFile::parse(ENV_YML).unwrap();
        assert_eq!(f.name.as_deref(), Some("test-env"));
        assert_eq!(f.channels, vec!["conda-forge"]);
        assert_eq!(f.python_spec().as_deref(), Some("3.11"));
    }

    #[test]
    fn python_spec_ignores_similar_packages() {
        let f = EnvironmentFile::parse("dependencies:\n  - python-dateutil\n  - python >=3.10\n").unwrap();
        assert_eq!(f.python_spec().as_deref(), Some(">=3.10"));
    }

    #[test]
    fn empty_or_broken_environment_file_is_error() {
        assert!(EnvironmentFile::parse("").is_err());
        assert!(EnvironmentFile::parse("invalid: yaml: content: [").is_err());
    }

    #[test]
    fn env_name_precedence() {
        let dir = TempDir::new().unwrap();
        let file = EnvironmentFile::parse(ENV_YML).unwrap();
        let cfg = ProjectConfig::parse("micromamba:\n  env_name: from-config\n").unwrap();

        let name = resolve_env_name(dir.path(), Some("custom-env"), Some(&cfg), Some(&file)).unwrap();
        assert_eq!(name, "custom-env");
        let name = resolve_env_name(dir.path(), None, Some(&cfg), Some(&file)).unwrap();
        assert_eq!(name, "from-config");
        let name = resolve_env_name(dir.path(), None, None, Some(&file)).unwrap();
        assert_eq!(name, "test-env");
    }

    #[test]
    fn env_name_from_directory() {
        let dir = TempDir::new().unwrap();
        let project = dir.path().join("my project");
        std::fs::create_dir(&project).unwrap();
        assert_eq!(resolve_env_name(&project, None, None, None).unwrap(), "my-project");
    }

    #[test]
    fn reserved_env_name_rejected() {
        let dir = TempDir::new().unwrap();
        let file = EnvironmentFile::parse("name: base\ndependencies: [python=3.11]\n").unwrap();
        assert!(matches!(
            resolve_env_name(dir.path(), None, None, Some(&file)),
            Err(PyveError::ReservedEnvName(_))
        ));
    }

    #[test]
    fn select_spec_prefers_lock() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            select_spec(dir.path()),
            Err(PyveError::MissingEnvironmentFile(_))
        ));
        std::fs::write(dir.path().join("environment.yml"), ENV_YML).unwrap();
        assert!(matches!(select_spec(dir.path()).unwrap(), SpecFile::Environment(_)));
        std::fs::write(dir.path().join("conda-lock.yml"), "# lock\n").unwrap();
        assert!(matches!(select_spec(dir.path()).unwrap(), SpecFile::Lock(_)));
    }

    #[test]
    fn run_command_shape() {
        let cmd = run_command(
            Path::new("/bin/micromamba"),
            Path::new("/p/.pyve/envs/x"),
            &["python".to_string(), "-V".to_string()],
        );
        let args: Vec<_> = cmd.get_args().map(|a| a.to_string_lossy().into_owned()).collect();
        assert_eq!(args, vec!["run", "--prefix", "/p/.pyve/envs/x", "python", "-V"]);
    }
}
