//! Dedicated test-runner venv at `.pyve/testenv/venv`.
//!
//! Kept apart from the project environment so pytest and friends never end
//! up in the project's dependency set. Survives `--init --force`.

use std::path::{Path, PathBuf};
use std::process::Command;

use crate::error::Result;
use crate::paths;
use crate::process;
use crate::venv;

/// True when pytest may be installed without asking.
pub fn auto_install_enabled(pyve_flag: Option<&str>, ci: Option<&str>) -> bool {
    let truthy = |v: Option<&str>| {
        v.map(|s| s.trim().to_ascii_lowercase())
            .is_some_and(|s| matches!(s.as_str(), "1" | "true" | "yes"))
    };
    truthy(pyve_flag) || truthy(ci)
}

/// Create the testenv with `base_python` if it does not exist yet.
pub fn ensure(root: &Path, base_python: &Path) -> Result<PathBuf> {
    let target = paths::testenv_venv(root);
    if venv::is_venv(&target) {
        return Ok(target);
    }
    if let Some(parent) = target.parent() {
        std::fs::create_dir_all(parent)?;
    }
    println!("Creating test environment at {}", paths::TESTENV_VENV_DIR);
    let mut cmd = Command::new(base_python);
    cmd.arg("-m").arg("venv").arg(&target).current_dir(root);
    process::run_checked(&mut cmd)?;
    Ok(target)
}

pub fn has_pytest(testenv: &Path) -> bool {
    venv::has_module(testenv, "pytest")
}

pub fn install_pytest(testenv: &Path) -> Result<()> {
    println!("Installing pytest into {}", paths::TESTENV_VENV_DIR);
    venv::pip_install(testenv, &["pytest"])
}

/// `python -m pytest ARGS` from the testenv, with `project_bin` ahead of
/// the testenv on `PATH` so tests see the project's tools.
pub fn pytest_command(root: &Path, testenv: &Path, project_bin: Option<&Path>, args: &[String]) -> Command {
    let mut cmd = Command::new(paths::env_python(testenv));
    cmd.arg("-m").arg("pytest").args(args).current_dir(root);
    venv::activate(&mut cmd, testenv);
    if let Some(bin) = project_bin {
        let mut entries = vec![bin.to_path_buf(), paths::env_bin_dir(testenv)];
        if let Some(existing) = std::env::var_os("PATH") {
            entries.extend(std::env::split_paths(&existing));
        }
        if let Ok(joined) = std::env::join_paths(entries) {
            cmd.env("PATH", joined);
        }
    }
    cmd
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auto_install_flags() {
        assert!(auto_install_enabled(Some("1"), None));
        assert!(auto_install_enabled(None, Some("true")));
        assert!(auto_install_enabled(None, Some("TRUE")));
        assert!(!auto_install_enabled(Some("0"), Some("false")));
        assert!(!auto_install_enabled(None, None));
    }

    #[test]
    fn pytest_command_shape() {
        let root = Path::new("/proj");
        let testenv = Path::new("/proj/.pyve/testenv/venv");
        let cmd = pytest_command(
            root,
            testenv,
            Some(Path::new("/proj/.venv/bin")),
            &["-q".to_string(), "tests".to_string()],
        );
        let args: Vec<_> = cmd.get_args().map(|a| a.to_string_lossy().into_owned()).collect();
        assert_eq!(args, vec!["-m", "pytest", "-q", "tests"]);
        let path = cmd
            .get_envs()
            .find(|(k, _)| *k == "PATH")
            .and_then(|(_, v)| v)
            .unwrap();
        let first = std::env::split_paths(path).next().unwrap();
        assert_eq!(first, PathBuf::from("/proj/.venv/bin"));
    }
}
