//! Subprocess invocation for the external tools pyve wraps.
//!
//! Every tool call goes through one of three helpers:
//! - [`run_checked`]: capture stdout/stderr, non-zero exit becomes
//!   [`PyveError::CommandFailed`] carrying the tool's stderr.
//! - [`run_streaming`]: stdout flows to the terminal, stderr is captured for
//!   the failure message. Used for long-running installs.
//! - [`run_passthrough`]: fully inherited stdio, returns the exit code. Used
//!   for `pyve run` and `pyve test`.

use std::process::{Command, ExitStatus, Output, Stdio};

use crate::error::{PyveError, Result};

/// Exit code reported when the program could not be started at all.
pub const EXIT_COMMAND_NOT_FOUND: i32 = 127;

pub fn program_name(cmd: &Command) -> String {
    cmd.get_program().to_string_lossy().into_owned()
}

fn describe(cmd: &Command) -> String {
    let mut parts = vec![program_name(cmd)];
    parts.extend(cmd.get_args().map(|a| a.to_string_lossy().into_owned()));
    parts.join(" ")
}

fn spawn_error(cmd: &Command, e: std::io::Error) -> PyveError {
    PyveError::SpawnFailed {
        program: program_name(cmd),
        reason: e.to_string(),
    }
}

/// Map an exit status to a shell-style exit code (`128 + signal` when killed).
pub fn exit_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(sig) = status.signal() {
            return 128 + sig;
        }
    }
    1
}

fn failure(cmd: &Command, status: ExitStatus, stderr: &[u8], stdout: &[u8]) -> PyveError {
    let mut reason = String::from_utf8_lossy(stderr).trim().to_string();
    if reason.is_empty() {
        reason = String::from_utf8_lossy(stdout).trim().to_string();
    }
    if reason.is_empty() {
        reason = "no output".to_string();
    }
    PyveError::CommandFailed {
        program: program_name(cmd),
        code: exit_code(status),
        stderr: reason,
    }
}

/// Run to completion with captured output; a non-zero exit is an error.
pub fn run_checked(cmd: &mut Command) -> Result<Output> {
    tracing::debug!(command = %describe(cmd), "running");
    cmd.stdin(Stdio::null());
    let output = cmd.output().map_err(|e| spawn_error(cmd, e))?;
    if !output.status.success() {
        return Err(failure(cmd, output.status, &output.stderr, &output.stdout));
    }
    Ok(output)
}

/// Run with stdout on the terminal and stderr captured for error reporting.
pub fn run_streaming(cmd: &mut Command) -> Result<()> {
    tracing::debug!(command = %describe(cmd), "running (streaming)");
    cmd.stdin(Stdio::null());
    cmd.stdout(Stdio::inherit());
    cmd.stderr(Stdio::piped());
    let child = cmd.spawn().map_err(|e| spawn_error(cmd, e))?;
    let output = child.wait_with_output()?;
    if !output.status.success() {
        return Err(failure(cmd, output.status, &output.stderr, &[]));
    }
    Ok(())
}

/// Run with inherited stdio and return the child's exit code. A program
/// that does not exist yields [`EXIT_COMMAND_NOT_FOUND`].
pub fn run_passthrough(cmd: &mut Command) -> Result<i32> {
    tracing::debug!(command = %describe(cmd), "running (passthrough)");
    match cmd.status() {
        Ok(status) => Ok(exit_code(status)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            eprintln!("pyve: {}: command not found", program_name(cmd));
            Ok(EXIT_COMMAND_NOT_FOUND)
        }
        Err(e) => Err(spawn_error(cmd, e)),
    }
}

/// First line of a tool's combined stdout/stderr, or `None` if it fails.
/// Used for version probes (`micromamba --version`, `python --version`).
pub fn probe(cmd: &mut Command) -> Option<String> {
    let output = run_checked(cmd).ok()?;
    let text = if output.stdout.iter().all(u8::is_ascii_whitespace) {
        output.stderr
    } else {
        output.stdout
    };
    String::from_utf8_lossy(&text)
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .map(str::to_string)
}
