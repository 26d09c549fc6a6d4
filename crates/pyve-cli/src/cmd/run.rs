use anyhow::Context;
use pyve_core::backend::Backend;
use pyve_core::config::ProjectConfig;
use pyve_core::{micromamba, paths, process, venv};
use std::path::Path;
use std::process::Command;

/// Run `argv` inside the project environment and return its exit code.
pub fn run(root: &Path, argv: &[String]) -> anyhow::Result<i32> {
    let Some((program, rest)) = argv.split_first() else {
        anyhow::bail!("no command given: usage 'pyve run <command> [args...]'");
    };
    let config = ProjectConfig::load(root)?;
    let mut cmd = command_for(root, &config, program, rest)?;
    Ok(process::run_passthrough(&mut cmd)?)
}

fn command_for(
    root: &Path,
    config: &ProjectConfig,
    program: &str,
    args: &[String],
) -> anyhow::Result<Command> {
    match config.backend.unwrap_or(Backend::Venv) {
        Backend::Venv => {
            let venv_path = root.join(config.venv_dir());
            if !venv::is_venv(&venv_path) {
                anyhow::bail!(
                    "virtual environment not found at {} (run 'pyve --init')",
                    config.venv_dir()
                );
            }
            // Prefer the venv's own executable over anything on PATH.
            let local = paths::env_bin_dir(&venv_path).join(program);
            let mut cmd = if local.is_file() {
                Command::new(local)
            } else {
                Command::new(program)
            };
            cmd.args(args);
            venv::activate(&mut cmd, &venv_path);
            Ok(cmd)
        }
        Backend::Micromamba => {
            let name = config
                .micromamba
                .env_name
                .as_deref()
                .context("micromamba.env_name missing from .pyve/config")?;
            let prefix = paths::micromamba_prefix(root, name);
            if !micromamba::env_exists(&prefix) {
                anyhow::bail!(
                    "micromamba environment not found at {} (run 'pyve --init')",
                    prefix.display()
                );
            }
            let binary = micromamba::require_binary(root)?;
            let mut argv = vec![program.to_string()];
            argv.extend_from_slice(args);
            Ok(micromamba::run_command(&binary, &prefix, &argv))
        }
    }
}
