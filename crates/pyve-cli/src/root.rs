use std::path::{Path, PathBuf};

/// Resolve the project root for commands that act on an existing project.
///
/// Priority:
/// 1. `--root` flag / `PYVE_ROOT` env var (passed in as `explicit`)
/// 2. Walk upward from `cwd` looking for `.pyve/config`
/// 3. Fall back to `cwd`
pub fn resolve_root(explicit: Option<&Path>) -> PathBuf {
    if let Some(p) = explicit {
        return p.to_path_buf();
    }
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    find_project(&cwd).unwrap_or(cwd)
}

/// Root for `--init`: never walks upward, so a nested directory gets its
/// own environment.
pub fn init_root(explicit: Option<&Path>) -> PathBuf {
    explicit
        .map(Path::to_path_buf)
        .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")))
}

fn find_project(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|dir| dir.join(pyve_core::paths::CONFIG_FILE).is_file())
        .map(Path::to_path_buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn explicit_root_wins() {
        let dir = TempDir::new().unwrap();
        assert_eq!(resolve_root(Some(dir.path())), dir.path());
        assert_eq!(init_root(Some(dir.path())), dir.path());
    }

    #[test]
    fn finds_project_above_subdir() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join(".pyve")).unwrap();
        std::fs::write(dir.path().join(".pyve/config"), "backend: venv\n").unwrap();
        let subdir = dir.path().join("src/deep");
        std::fs::create_dir_all(&subdir).unwrap();

        assert_eq!(find_project(&subdir).as_deref(), Some(dir.path()));
    }

    #[test]
    fn bare_pyve_dir_is_not_a_project() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join(".pyve/bin")).unwrap();
        assert_eq!(find_project(dir.path()), None);
    }
}
