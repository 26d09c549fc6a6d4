use crate::error::{PyveError, Result};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

// ---------------------------------------------------------------------------
// File and directory names
// ---------------------------------------------------------------------------

pub const PYVE_DIR: &str = ".pyve";
pub const CONFIG_FILE: &str = ".pyve/config";
pub const ENVS_DIR: &str = ".pyve/envs";
pub const TESTENV_DIR: &str = ".pyve/testenv";
pub const TESTENV_VENV_DIR: &str = ".pyve/testenv/venv";
pub const PROJECT_BIN_DIR: &str = ".pyve/bin";

pub const DEFAULT_VENV_DIR: &str = ".venv";

pub const PYTHON_VERSION_FILE: &str = ".python-version";
pub const ENVRC_FILE: &str = ".envrc";
pub const DOTENV_FILE: &str = ".env";
pub const GITIGNORE_FILE: &str = ".gitignore";

pub const REQUIREMENTS_TXT: &str = "requirements.txt";
pub const PYPROJECT_TOML: &str = "pyproject.toml";
pub const ENVIRONMENT_YML: &str = "environment.yml";
pub const CONDA_LOCK_YML: &str = "conda-lock.yml";

pub const PYVENV_CFG: &str = "pyvenv.cfg";

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

pub fn pyve_dir(root: &Path) -> PathBuf {
    root.join(PYVE_DIR)
}

pub fn config_path(root: &Path) -> PathBuf {
    root.join(CONFIG_FILE)
}

pub fn envs_dir(root: &Path) -> PathBuf {
    root.join(ENVS_DIR)
}

pub fn micromamba_prefix(root: &Path, env_name: &str) -> PathBuf {
    envs_dir(root).join(env_name)
}

pub fn testenv_venv(root: &Path) -> PathBuf {
    root.join(TESTENV_VENV_DIR)
}

pub fn python_version_path(root: &Path) -> PathBuf {
    root.join(PYTHON_VERSION_FILE)
}

pub fn envrc_path(root: &Path) -> PathBuf {
    root.join(ENVRC_FILE)
}

pub fn dotenv_path(root: &Path) -> PathBuf {
    root.join(DOTENV_FILE)
}

pub fn gitignore_path(root: &Path) -> PathBuf {
    root.join(GITIGNORE_FILE)
}

/// `bin` directory of a venv or conda prefix.
pub fn env_bin_dir(prefix: &Path) -> PathBuf {
    if cfg!(windows) {
        prefix.join("Scripts")
    } else {
        prefix.join("bin")
    }
}

/// Python executable inside a venv or conda prefix.
pub fn env_python(prefix: &Path) -> PathBuf {
    if cfg!(windows) {
        prefix.join("Scripts").join("python.exe")
    } else {
        prefix.join("bin").join("python")
    }
}

// ---------------------------------------------------------------------------
// Environment name validation
// ---------------------------------------------------------------------------

pub const RESERVED_ENV_NAMES: &[&str] = &["base", "root"];

static ENV_NAME_RE: OnceLock<Regex> = OnceLock::new();

fn env_name_re() -> &'static Regex {
    ENV_NAME_RE.get_or_init(|| Regex::new(r"^[A-Za-z0-9][A-Za-z0-9._\-]*$").expect("valid regex"))
}

pub fn validate_env_name(name: &str) -> Result<()> {
    if RESERVED_ENV_NAMES.contains(&name) {
        return Err(PyveError::ReservedEnvName(name.to_string()));
    }
    if name.len() > 64 || !env_name_re().is_match(name) {
        return Err(PyveError::InvalidEnvName(name.to_string()));
    }
    Ok(())
}

/// Derive an environment name from a directory name, replacing anything
/// micromamba would reject with `-`.
pub fn sanitize_env_name(raw: &str) -> String {
    let mut out: String = raw
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '_' || c == '-' {
                c
            } else {
                '-'
            }
        })
        .collect();
    while out.starts_with(['-', '.', '_']) {
        out.remove(0);
    }
    if out.is_empty() || RESERVED_ENV_NAMES.contains(&out.as_str()) {
        let stem = if out.is_empty() { "project" } else { out.as_str() };
        out = format!("{stem}-env");
    }
    out
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_env_names() {
        for name in ["test-env", "a", "py3.11", "My_Env"] {
            validate_env_name(name).unwrap_or_else(|_| panic!("expected valid: {name}"));
        }
    }

    #[test]
    fn invalid_env_names() {
        for name in ["", "-dash", "has space", "slash/name", ".hidden"] {
            assert!(
                matches!(validate_env_name(name), Err(PyveError::InvalidEnvName(_))),
                "expected invalid: {name}"
            );
        }
    }

    #[test]
    fn reserved_env_names() {
        for name in ["base", "root"] {
            assert!(matches!(
                validate_env_name(name),
                Err(PyveError::ReservedEnvName(_))
            ));
        }
    }

    #[test]
    fn sanitize_directory_names() {
        assert_eq!(sanitize_env_name("my project"), "my-project");
        assert_eq!(sanitize_env_name("--weird"), "weird");
        assert_eq!(sanitize_env_name("base"), "base-env");
        assert_eq!(sanitize_env_name(""), "project-env");
        validate_env_name(&sanitize_env_name("a b/c")).unwrap();
    }

    #[test]
    fn path_helpers() {
        let root = Path::new("/tmp/proj");
        assert_eq!(config_path(root), PathBuf::from("/tmp/proj/.pyve/config"));
        assert_eq!(
            micromamba_prefix(root, "test-env"),
            PathBuf::from("/tmp/proj/.pyve/envs/test-env")
        );
        assert_eq!(
            testenv_venv(root),
            PathBuf::from("/tmp/proj/.pyve/testenv/venv")
        );
    }
}
