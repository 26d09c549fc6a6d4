//! Self-install into `~/.local/bin` and the shell profile PATH block.

use std::path::{Path, PathBuf};

use crate::error::{PyveError, Result};
use crate::io;

pub const INSTALL_DIR: &str = ".local/bin";
pub const BINARY_NAME: &str = "pyve";

pub const PROFILE_START: &str = "# >>> pyve path >>>";
pub const PROFILE_END: &str = "# <<< pyve path <<<";

const PROFILES: &[&str] = &[".zprofile", ".bash_profile"];

pub fn home_dir() -> Result<PathBuf> {
    home::home_dir().ok_or(PyveError::HomeNotFound)
}

pub fn install_path(home: &Path) -> PathBuf {
    home.join(INSTALL_DIR).join(BINARY_NAME)
}

/// `~/.zprofile` for zsh, `~/.bash_profile` otherwise.
pub fn profile_for_shell(home: &Path, shell: Option<&str>) -> PathBuf {
    let zsh = shell
        .and_then(|s| Path::new(s).file_name())
        .is_some_and(|n| n == "zsh");
    home.join(if zsh { PROFILES[0] } else { PROFILES[1] })
}

fn profile_block() -> String {
    format!("{PROFILE_START}\nexport PATH=\"$HOME/{INSTALL_DIR}:$PATH\"\n{PROFILE_END}\n")
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallReport {
    pub binary: PathBuf,
    pub binary_copied: bool,
    pub profile: PathBuf,
    pub profile_updated: bool,
}

/// Copy `exe` to `~/.local/bin/pyve` and add the PATH block to the profile.
pub fn install(home: &Path, exe: &Path, shell: Option<&str>) -> Result<InstallReport> {
    let target = install_path(home);
    let same = match (exe.canonicalize(), target.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    };
    if !same {
        let data = std::fs::read(exe)?;
        io::atomic_write(&target, &data)?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&target, std::fs::Permissions::from_mode(0o755))?;
        }
    }

    let profile = profile_for_shell(home, shell);
    let profile_updated = add_profile_block(&profile)?;

    Ok(InstallReport {
        binary: target,
        binary_copied: !same,
        profile,
        profile_updated,
    })
}

/// Append the PATH block if missing. Returns true if the file changed.
fn add_profile_block(profile: &Path) -> Result<bool> {
    let current = if profile.exists() {
        std::fs::read_to_string(profile)?
    } else {
        String::new()
    };
    if current.contains(PROFILE_START) {
        return Ok(false);
    }
    let sep = if current.is_empty() || current.ends_with('\n') { "" } else { "\n" };
    io::atomic_write(profile, format!("{current}{sep}{}", profile_block()).as_bytes())?;
    Ok(true)
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UninstallReport {
    pub binary_removed: bool,
    pub profiles_cleaned: Vec<PathBuf>,
}

/// Remove the installed binary and the PATH block from every profile.
pub fn uninstall(home: &Path) -> Result<UninstallReport> {
    let mut report = UninstallReport {
        binary_removed: io::remove_path(&install_path(home))?,
        ..UninstallReport::default()
    };
    for name in PROFILES {
        let profile = home.join(name);
        if io::replace_between_markers(&profile, PROFILE_START, PROFILE_END, "")? {
            report.profiles_cleaned.push(profile);
        }
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn fake_exe(dir: &TempDir) -> PathBuf {
        let exe = dir.path().join("pyve-build");
        std::fs::write(&exe, b"#!/bin/sh\n").unwrap();
        exe
    }

    #[test]
    fn profile_choice_follows_shell() {
        let home = Path::new("/home/u");
        assert_eq!(profile_for_shell(home, Some("/bin/zsh")), home.join(".zprofile"));
        assert_eq!(profile_for_shell(home, Some("/bin/bash")), home.join(".bash_profile"));
        assert_eq!(profile_for_shell(home, None), home.join(".bash_profile"));
    }

    #[test]
    fn install_is_idempotent() {
        let home = TempDir::new().unwrap();
        let exe = fake_exe(&home);

        let first = install(home.path(), &exe, Some("/bin/bash")).unwrap();
        assert!(first.binary_copied);
        assert!(first.profile_updated);
        assert!(home.path().join(".local/bin/pyve").is_file());

        let second = install(home.path(), &exe, Some("/bin/bash")).unwrap();
        assert!(!second.profile_updated);
        let profile = std::fs::read_to_string(home.path().join(".bash_profile")).unwrap();
        assert_eq!(profile.matches(PROFILE_START).count(), 1);
    }

    #[test]
    fn uninstall_restores_profile() {
        let home = TempDir::new().unwrap();
        std::fs::write(home.path().join(".zprofile"), "export EDITOR=vim\n").unwrap();
        let exe = fake_exe(&home);
        install(home.path(), &exe, Some("zsh")).unwrap();

        let report = uninstall(home.path()).unwrap();
        assert!(report.binary_removed);
        assert_eq!(report.profiles_cleaned, vec![home.path().join(".zprofile")]);
        assert_eq!(
            std::fs::read_to_string(home.path().join(".zprofile")).unwrap(),
            "export EDITOR=vim\n"
        );

        let again = uninstall(home.path()).unwrap();
        assert_eq!(again, UninstallReport::default());
    }
}
