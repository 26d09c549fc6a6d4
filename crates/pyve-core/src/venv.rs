use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::error::Result;
use crate::interpreter::Interpreter;
use crate::paths;
use crate::process;

/// True when `venv` looks like a usable virtual environment.
pub fn is_venv(venv: &Path) -> bool {
    paths::env_python(venv).exists()
}

/// Create a virtual environment at `root/venv_dir` with `interpreter`.
/// An existing venv is left untouched. Returns the venv path.
pub fn create(root: &Path, venv_dir: &str, interpreter: &Interpreter) -> Result<PathBuf> {
    let target = root.join(venv_dir);
    if is_venv(&target) {
        tracing::debug!(path = %target.display(), "venv already present");
        return Ok(target);
    }
    println!(
        "Creating venv {venv_dir} with Python {} ({})",
        interpreter.version,
        interpreter.path.display()
    );
    let mut cmd = Command::new(&interpreter.path);
    cmd.arg("-m").arg("venv").arg(&target).current_dir(root);
    process::run_checked(&mut cmd)?;
    Ok(target)
}

/// `PATH` with `dir` prepended.
pub fn path_with(dir: &Path) -> OsString {
    let mut entries = vec![dir.to_path_buf()];
    if let Some(existing) = std::env::var_os("PATH") {
        entries.extend(std::env::split_paths(&existing));
    }
    std::env::join_paths(entries).unwrap_or_else(|_| dir.as_os_str().to_os_string())
}

/// Configure `cmd` to run as if `venv` were activated.
pub fn activate(cmd: &mut Command, venv: &Path) {
    cmd.env("VIRTUAL_ENV", venv)
        .env("PATH", path_with(&paths::env_bin_dir(venv)))
        .env_remove("PYTHONHOME");
}

/// Run `python -m pip install <args>` inside `venv`.
pub fn pip_install(venv: &Path, args: &[&str]) -> Result<()> {
    let mut cmd = Command::new(paths::env_python(venv));
    cmd.args(["-m", "pip", "install", "--disable-pip-version-check"])
        .args(args);
    activate(&mut cmd, venv);
    process::run_streaming(&mut cmd)
}

/// True when `module` imports inside `venv`.
pub fn has_module(venv: &Path, module: &str) -> bool {
    let mut cmd = Command::new(paths::env_python(venv));
    cmd.args(["-c", &format!("import {module}")]);
    process::run_checked(&mut cmd).is_ok()
}
