//! Environment lifecycle for a project directory.
//!
//! `uninitialized -> initialized -> purged` where purged is the same as
//! uninitialized. [`resolve`] decides *what* to build, [`materialize`] runs
//! the backend tool, [`write_project_files`] writes the managed files, and
//! [`purge`] undoes both.

use serde::Serialize;
use std::path::{Component, Path, PathBuf};

use crate::backend::{self, Backend, BackendRequest, BackendResolution};
use crate::config::ProjectConfig;
use crate::direnv::{self, EnvrcOutcome};
use crate::error::{PyveError, Result};
use crate::gitignore;
use crate::interpreter;
use crate::io;
use crate::micromamba::{self, EnvironmentFile};
use crate::paths;
use crate::venv;
use crate::version::{self, VersionResolution, VersionSource};

// ---------------------------------------------------------------------------
// Resolution
// ---------------------------------------------------------------------------

/// User-supplied inputs for resolving a project's settings.
#[derive(Debug, Clone, Default)]
pub struct InitOptions {
    /// Positional `--init VERSION` or `--python-version VERSION`.
    pub python_version: Option<String>,
    /// `PYVE_PYTHON_VERSION`.
    pub default_python_version: Option<String>,
    pub backend: Option<BackendRequest>,
    pub venv_dir: Option<String>,
    pub env_name: Option<String>,
    pub no_direnv: bool,
}

/// The resolved plan for one project directory.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Settings {
    pub backend: BackendResolution,
    pub python: VersionResolution,
    /// venv directory relative to the project root (venv backend).
    pub venv_dir: String,
    /// micromamba environment name (micromamba backend).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub env_name: Option<String>,
}

impl Settings {
    pub fn backend(&self) -> Backend {
        self.backend.backend
    }

    /// Environment directory relative to the root, as written to `.envrc`.
    pub fn env_dir(&self) -> String {
        match (self.backend(), &self.env_name) {
            (Backend::Micromamba, Some(name)) => format!("{}/{name}", paths::ENVS_DIR),
            _ => self.venv_dir.clone(),
        }
    }

    pub fn env_path(&self, root: &Path) -> PathBuf {
        root.join(self.env_dir())
    }

    /// The entry listed in the managed `.gitignore` block.
    fn ignore_entry(&self) -> &str {
        match self.backend() {
            Backend::Venv => &self.venv_dir,
            Backend::Micromamba => paths::ENVS_DIR,
        }
    }

    /// The `.pyve/config` this plan records.
    pub fn to_config(&self) -> ProjectConfig {
        let mut cfg = ProjectConfig::new(self.backend());
        match self.backend() {
            Backend::Venv => {
                cfg.venv.directory = Some(self.venv_dir.clone());
                cfg.python.version = Some(self.python.version.clone());
            }
            Backend::Micromamba => cfg.micromamba.env_name = self.env_name.clone(),
        }
        cfg
    }
}

/// Reject venv directories that would escape the project root.
pub fn validate_venv_dir(dir: &str) -> Result<()> {
    let path = Path::new(dir);
    let escapes = path
        .components()
        .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
    let reserved = path.starts_with(paths::PYVE_DIR);
    if dir.trim().is_empty() || escapes || reserved {
        return Err(PyveError::ConfigInvalid {
            path: "venv directory".to_string(),
            reason: format!("'{dir}' must be a relative path inside the project, outside .pyve"),
        });
    }
    Ok(())
}

/// Resolve backend, Python version, and environment location for `root`.
pub fn resolve(root: &Path, opts: &InitOptions, config: Option<&ProjectConfig>) -> Result<Settings> {
    let backend = backend::resolve_backend(root, opts.backend, config.and_then(|c| c.backend));
    if backend.ambiguous && backend.source != backend::BackendSource::Flag {
        tracing::warn!("both pip and conda markers present");
        eprintln!(
            "warning: found both environment.yml/conda-lock.yml and requirements.txt/pyproject.toml; \
             using {} (pass --backend to choose)",
            backend.backend
        );
    }

    let python = version::resolve_version(
        root,
        opts.python_version.as_deref(),
        opts.default_python_version.as_deref(),
        config,
    )?;
    if matches!(python.source, VersionSource::Explicit | VersionSource::Environment) {
        version::validate_version(&python.version)?;
    }

    let venv_dir = opts
        .venv_dir
        .clone()
        .unwrap_or_else(|| config.map_or(paths::DEFAULT_VENV_DIR, |c| c.venv_dir()).to_string());
    validate_venv_dir(&venv_dir)?;

    let env_name = match backend.backend {
        Backend::Venv => None,
        Backend::Micromamba => {
            let env_file = EnvironmentFile::load(root)?;
            Some(micromamba::resolve_env_name(
                root,
                opts.env_name.as_deref(),
                config,
                env_file.as_ref(),
            )?)
        }
    };

    Ok(Settings {
        backend,
        python,
        venv_dir,
        env_name,
    })
}

// ---------------------------------------------------------------------------
// Initialization
// ---------------------------------------------------------------------------

/// Which pyve-managed paths existed before init touched the project, so the
/// config can record what pyve itself created.
#[derive(Debug, Clone)]
pub struct Footprint {
    existing: Vec<String>,
    recorded: Option<Vec<String>>,
}

impl Footprint {
    /// Snapshot `root` before materializing. `previous` carries the record of
    /// an earlier init forward; a fresh init starts an empty one.
    pub fn take(root: &Path, settings: &Settings, previous: Option<&ProjectConfig>) -> Self {
        let existing = Self::candidates(settings)
            .into_iter()
            .filter(|rel| root.join(rel).exists())
            .collect();
        let recorded = match previous {
            Some(cfg) => cfg.created.clone(),
            None => Some(Vec::new()),
        };
        Self { existing, recorded }
    }

    fn candidates(settings: &Settings) -> Vec<String> {
        let mut out = vec![
            paths::PYVE_DIR.to_string(),
            paths::DOTENV_FILE.to_string(),
            paths::GITIGNORE_FILE.to_string(),
        ];
        if settings.backend() == Backend::Venv {
            out.push(settings.venv_dir.clone());
        }
        out
    }

    /// The record to save: earlier entries plus candidates that appeared
    /// since the snapshot.
    fn created(&self, root: &Path, settings: &Settings) -> Option<Vec<String>> {
        let mut list = self.recorded.clone()?;
        for rel in Self::candidates(settings) {
            if !self.existing.contains(&rel) && root.join(&rel).exists() && !list.contains(&rel) {
                list.push(rel);
            }
        }
        Some(list)
    }
}

/// Fail when an existing venv was built for a different Python than
/// `requested`. An unreadable `pyvenv.cfg` is not an error.
pub fn check_existing_venv(venv: &Path, requested: &str) -> Result<()> {
    if !venv::is_venv(venv) {
        return Ok(());
    }
    match version::read_pyvenv_version(venv) {
        Some(found) if !version::version_matches(requested, &found) => Err(PyveError::StaleVenv {
            path: venv.display().to_string(),
            found,
            requested: requested.to_string(),
        }),
        _ => Ok(()),
    }
}

/// Create the environment directory with the backend's own tooling.
/// An existing environment is reused when it matches the requested Python.
pub fn materialize(root: &Path, settings: &Settings) -> Result<PathBuf> {
    match settings.backend() {
        Backend::Venv => {
            check_existing_venv(&settings.env_path(root), &settings.python.version)?;
            let interp = interpreter::find_interpreter(&settings.python)?;
            venv::create(root, &settings.venv_dir, &interp)
        }
        Backend::Micromamba => {
            let binary = micromamba::require_binary(root)?;
            let spec = micromamba::select_spec(root)?;
            let prefix = settings.env_path(root);
            micromamba::create_env(&binary, &prefix, &spec)?;
            Ok(prefix)
        }
    }
}

/// What [`write_project_files`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilesReport {
    pub envrc: Option<EnvrcOutcome>,
    pub dotenv_created: bool,
    pub python_version_written: bool,
}

/// Write `.pyve/config` and the managed project files for `settings`.
/// `before` is the snapshot taken ahead of [`materialize`].
pub fn write_project_files(
    root: &Path,
    settings: &Settings,
    no_direnv: bool,
    before: &Footprint,
) -> Result<FilesReport> {
    io::ensure_dir(&paths::pyve_dir(root))?;

    let mut python_version_written = false;
    if settings.backend() == Backend::Venv && version::read_version_file(root)?.is_none() {
        version::write_version_file(root, &settings.python.version)?;
        python_version_written = true;
    }

    let envrc = if no_direnv {
        None
    } else {
        let text = direnv::render_envrc(settings.backend(), &settings.env_dir());
        let outcome = direnv::write_envrc(root, &text)?;
        if outcome == EnvrcOutcome::Foreign {
            tracing::warn!("existing .envrc is not managed by pyve");
            eprintln!("warning: .envrc exists and was not written by pyve; leaving it unchanged");
        }
        Some(outcome)
    };

    let dotenv_created = direnv::ensure_dotenv(root)?;
    gitignore::apply(root, settings.ignore_entry())?;

    let mut config = settings.to_config();
    config.created = before.created(root, settings);
    config.save(root)?;

    Ok(FilesReport {
        envrc,
        dotenv_created,
        python_version_written,
    })
}

/// Result of a fresh [`initialize`].
#[derive(Debug, Clone)]
pub struct Initialized {
    pub env: PathBuf,
    pub files: FilesReport,
}

/// Full `--init` for an uninitialized directory.
pub fn initialize(root: &Path, settings: &Settings, no_direnv: bool) -> Result<Initialized> {
    let before = Footprint::take(root, settings, None);
    let env = materialize(root, settings)?;
    let files = write_project_files(root, settings, no_direnv, &before)?;
    Ok(Initialized { env, files })
}

// ---------------------------------------------------------------------------
// Update in place
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct UpdateReport {
    pub previous_version: Option<String>,
    pub settings: Settings,
}

/// Fail when the resolved backend differs from the recorded one.
pub fn check_backend_change(config: &ProjectConfig, settings: &Settings) -> Result<()> {
    match config.backend {
        Some(recorded) if recorded != settings.backend() => Err(PyveError::BackendChange {
            from: recorded.to_string(),
            to: settings.backend().to_string(),
        }),
        _ => Ok(()),
    }
}

/// `--init --update`: keep the environment, refresh managed files, and stamp
/// the running pyve version.
pub fn update(root: &Path, opts: &InitOptions) -> Result<UpdateReport> {
    let config = ProjectConfig::load(root)?;
    let settings = resolve(root, opts, Some(&config))?;
    check_backend_change(&config, &settings)?;

    let before = Footprint::take(root, &settings, Some(&config));
    let env = settings.env_path(root);
    let present = match settings.backend() {
        Backend::Venv => venv::is_venv(&env),
        Backend::Micromamba => micromamba::env_exists(&env),
    };
    if !present {
        materialize(root, &settings)?;
    }
    write_project_files(root, &settings, opts.no_direnv, &before)?;

    Ok(UpdateReport {
        previous_version: config.pyve_version,
        settings,
    })
}

// ---------------------------------------------------------------------------
// Purge
// ---------------------------------------------------------------------------

/// Paths removed by [`purge`], relative to the root.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PurgeReport {
    pub removed: Vec<String>,
    pub skipped: Vec<String>,
}

impl PurgeReport {
    fn removed(&mut self, what: impl Into<String>) {
        self.removed.push(what.into());
    }
}

/// Delete the environment and the files pyve created. Idempotent.
///
/// Only paths recorded in `.pyve/config` as created by init are deleted;
/// user files pyve merely edited get their managed content taken out.
/// Kept: `.python-version`, `.pyve/testenv`, `.pyve/bin`, a non-empty `.env`,
/// and any `.envrc` pyve did not write. `venv_dir_override` names a venv to
/// delete regardless of the record.
pub fn purge(root: &Path, venv_dir_override: Option<&str>) -> Result<PurgeReport> {
    let mut report = PurgeReport::default();

    let config = match ProjectConfig::load_optional(root) {
        Ok(cfg) => cfg,
        Err(e) => {
            tracing::warn!(error = %e, "ignoring unreadable config during purge");
            Some(ProjectConfig::default())
        }
    };
    let owns = |rel: &str| config.as_ref().is_some_and(|c| c.was_created(rel));

    let venv_dir = venv_dir_override
        .map(str::to_string)
        .unwrap_or_else(|| config.as_ref().map_or(paths::DEFAULT_VENV_DIR, |c| c.venv_dir()).to_string());
    if validate_venv_dir(&venv_dir).is_ok() {
        let venv_path = root.join(&venv_dir);
        let ours = venv_dir_override.is_some()
            || config.as_ref().is_some_and(|c| match &c.created {
                Some(_) => c.was_created(&venv_dir),
                None => c.backend != Some(Backend::Micromamba),
            });
        let looks_like_venv = venv::is_venv(&venv_path) || venv_path.join(paths::PYVENV_CFG).is_file();
        if ours && looks_like_venv {
            io::remove_path(&venv_path)?;
            report.removed(venv_dir);
        } else if venv_path.exists() {
            tracing::debug!(path = %venv_path.display(), "leaving directory pyve did not create");
            report.skipped.push(venv_dir);
        }
    }

    if io::remove_path(&paths::envs_dir(root))? {
        report.removed(paths::ENVS_DIR);
    }
    if direnv::remove_envrc(root)? {
        report.removed(paths::ENVRC_FILE);
    }
    if owns(paths::DOTENV_FILE) && direnv::remove_dotenv_if_empty(root)? {
        report.removed(paths::DOTENV_FILE);
    }
    if gitignore::remove(root, owns(paths::GITIGNORE_FILE))? {
        report.removed(paths::GITIGNORE_FILE);
    }
    if io::remove_path(&paths::config_path(root))? {
        report.removed(paths::CONFIG_FILE);
    }
    if owns(paths::PYVE_DIR) {
        io::remove_dir_if_empty(&paths::pyve_dir(root))?;
    }

    Ok(report)
}

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

pub fn is_initialized(root: &Path) -> bool {
    paths::config_path(root).is_file()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use tempfile::TempDir;

    fn snapshot(root: &Path) -> BTreeMap<String, Vec<u8>> {
        let mut out = BTreeMap::new();
        let mut stack = vec![root.to_path_buf()];
        while let Some(dir) = stack.pop() {
            for entry in std::fs::read_dir(&dir).unwrap() {
                let path = entry.unwrap().path();
                let rel = path.strip_prefix(root).unwrap().to_string_lossy().into_owned();
                if path.is_dir() {
                    out.insert(format!("{rel}/"), Vec::new());
                    stack.push(path);
                } else {
                    out.insert(rel, std::fs::read(&path).unwrap());
                }
            }
        }
        out
    }

    /// Stand-in for `python -m venv`.
    fn fake_venv(root: &Path, dir: &str) {
        let venv = root.join(dir);
        std::fs::create_dir_all(venv.join("bin")).unwrap();
        std::fs::write(venv.join("bin/python"), "").unwrap();
        std::fs::write(venv.join("pyvenv.cfg"), "version = 3.12.8\n").unwrap();
    }

    fn venv_settings(root: &Path) -> Settings {
        resolve(root, &InitOptions::default(), None).unwrap()
    }

    #[test]
    fn resolve_defaults_to_venv() {
        let dir = TempDir::new().unwrap();
        let s = venv_settings(dir.path());
        assert_eq!(s.backend(), Backend::Venv);
        assert_eq!(s.python.source, VersionSource::Default);
        assert_eq!(s.venv_dir, ".venv");
        assert_eq!(s.env_name, None);
    }

    #[test]
    fn resolve_micromamba_from_environment_file() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("environment.yml"),
            "name: test-env\ndependencies:\n  - python=3.11\n",
        )
        .unwrap();
        let s = venv_settings(dir.path());
        assert_eq!(s.backend(), Backend::Micromamba);
        assert_eq!(s.env_name.as_deref(), Some("test-env"));
        assert_eq!(s.env_dir(), ".pyve/envs/test-env");
    }

    #[test]
    fn resolve_rejects_bad_inputs() {
        let dir = TempDir::new().unwrap();
        let opts = InitOptions {
            python_version: Some("3.x".to_string()),
            ..InitOptions::default()
        };
        assert!(matches!(
            resolve(dir.path(), &opts, None),
            Err(PyveError::InvalidPythonVersion(_))
        ));
        let opts = InitOptions {
            venv_dir: Some("../outside".to_string()),
            ..InitOptions::default()
        };
        assert!(resolve(dir.path(), &opts, None).is_err());
    }

    #[test]
    fn config_records_venv_settings() {
        let dir = TempDir::new().unwrap();
        let opts = InitOptions {
            python_version: Some("3.11.5".to_string()),
            venv_dir: Some("my_venv".to_string()),
            ..InitOptions::default()
        };
        let cfg = resolve(dir.path(), &opts, None).unwrap().to_config();
        assert_eq!(cfg.backend, Some(Backend::Venv));
        assert_eq!(cfg.venv_dir(), "my_venv");
        assert_eq!(cfg.python.version.as_deref(), Some("3.11.5"));
    }

    #[test]
    fn write_files_then_purge_restores_directory() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        std::fs::write(root.join("requirements.txt"), "requests\n").unwrap();
        std::fs::write(root.join(".gitignore"), "node_modules\n").unwrap();
        std::fs::write(root.join(".python-version"), "3.12.8\n").unwrap();
        let before = snapshot(root);

        let settings = venv_settings(root);
        let footprint = Footprint::take(root, &settings, None);
        fake_venv(root, &settings.venv_dir);
        let report = write_project_files(root, &settings, false, &footprint).unwrap();
        assert_eq!(report.envrc, Some(EnvrcOutcome::Created));
        assert!(report.dotenv_created);
        assert!(!report.python_version_written);
        assert!(is_initialized(root));

        let purged = purge(root, None).unwrap();
        assert!(purged.removed.contains(&".venv".to_string()));
        assert_eq!(snapshot(root), before);
    }

    /// Init with a fake venv standing in for `materialize`, then purge, and
    /// return the tree before and after.
    fn init_then_purge(root: &Path) -> (BTreeMap<String, Vec<u8>>, BTreeMap<String, Vec<u8>>) {
        std::fs::write(root.join(".python-version"), "3.12.8\n").unwrap();
        let before = snapshot(root);
        let settings = venv_settings(root);
        let footprint = Footprint::take(root, &settings, None);
        fake_venv(root, &settings.venv_dir);
        write_project_files(root, &settings, false, &footprint).unwrap();
        purge(root, None).unwrap();
        (before, snapshot(root))
    }

    #[test]
    fn purge_keeps_empty_user_dotenv() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(".env"), "").unwrap();
        let (before, after) = init_then_purge(dir.path());
        assert_eq!(after, before);
    }

    #[test]
    fn purge_keeps_empty_user_gitignore() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(".gitignore"), "").unwrap();
        let (before, after) = init_then_purge(dir.path());
        assert_eq!(after, before);
    }

    #[test]
    fn purge_keeps_gitignore_without_trailing_newline() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(".gitignore"), "node_modules").unwrap();
        let (before, after) = init_then_purge(dir.path());
        assert_eq!(after, before);
        assert_eq!(
            std::fs::read_to_string(dir.path().join(".gitignore")).unwrap(),
            "node_modules"
        );
    }

    #[test]
    fn purge_keeps_empty_user_pyve_dir() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir(dir.path().join(".pyve")).unwrap();
        let (before, after) = init_then_purge(dir.path());
        assert_eq!(after, before);
    }

    #[test]
    fn purge_keeps_venv_that_predates_init() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        fake_venv(root, ".venv");
        let settings = venv_settings(root);
        let footprint = Footprint::take(root, &settings, None);
        write_project_files(root, &settings, true, &footprint).unwrap();

        let saved = ProjectConfig::load(root).unwrap();
        assert!(!saved.was_created(".venv"));
        assert!(saved.was_created(".pyve"));

        let report = purge(root, None).unwrap();
        assert_eq!(report.skipped, vec![".venv".to_string()]);
        assert!(root.join(".venv/bin/python").exists());
    }

    #[test]
    fn purge_leaves_venv_in_micromamba_project() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        fake_venv(root, ".venv");
        ProjectConfig::new(Backend::Micromamba).save(root).unwrap();
        purge(root, None).unwrap();
        assert!(root.join(".venv/bin/python").exists());
    }

    #[test]
    fn update_carries_created_record_forward() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        let settings = venv_settings(root);
        let footprint = Footprint::take(root, &settings, None);
        fake_venv(root, ".venv");
        write_project_files(root, &settings, true, &footprint).unwrap();
        std::fs::remove_file(root.join(".env")).unwrap();

        update(root, &InitOptions::default()).unwrap();
        let saved = ProjectConfig::load(root).unwrap();
        for rel in [".venv", ".pyve", ".env", ".gitignore"] {
            assert!(saved.was_created(rel), "{rel} not recorded");
        }
    }

    #[test]
    fn materialize_rejects_venv_for_other_python() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        let venv = root.join(".venv");
        std::fs::create_dir_all(venv.join("bin")).unwrap();
        std::fs::write(venv.join("bin/python"), "").unwrap();
        std::fs::write(venv.join("pyvenv.cfg"), "version = 3.10.2\n").unwrap();

        let opts = InitOptions {
            python_version: Some("3.11".to_string()),
            ..InitOptions::default()
        };
        let settings = resolve(root, &opts, None).unwrap();
        let err = materialize(root, &settings).unwrap_err();
        assert!(matches!(err, PyveError::StaleVenv { .. }));
        assert!(err.to_string().contains("uses Python 3.10.2"));
        assert!(venv.join("pyvenv.cfg").exists());
    }

    #[test]
    fn existing_venv_with_matching_python_is_accepted() {
        let dir = TempDir::new().unwrap();
        fake_venv(dir.path(), ".venv");
        let venv = dir.path().join(".venv");
        assert!(check_existing_venv(&venv, "3.12").is_ok());
        assert!(check_existing_venv(&venv, "3.12.8").is_ok());
        assert!(check_existing_venv(&venv, "3.11").is_err());
        assert!(check_existing_venv(&dir.path().join("missing"), "3.11").is_ok());
    }

    #[test]
    fn purge_keeps_python_version_and_testenv() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        let settings = venv_settings(root);
        let before = Footprint::take(root, &settings, None);
        fake_venv(root, ".venv");
        let report = write_project_files(root, &settings, true, &before).unwrap();
        assert!(report.python_version_written);
        assert_eq!(report.envrc, None);
        fake_venv(root, ".pyve/testenv/venv");

        purge(root, None).unwrap();
        assert!(root.join(".python-version").exists());
        assert!(root.join(".pyve/testenv/venv/bin/python").exists());
        assert!(!root.join(".pyve/config").exists());
        assert!(!root.join(".venv").exists());
    }

    #[test]
    fn purge_is_idempotent() {
        let dir = TempDir::new().unwrap();
        assert!(purge(dir.path(), None).unwrap().removed.is_empty());
        assert!(purge(dir.path(), None).unwrap().removed.is_empty());
    }

    #[test]
    fn purge_skips_directory_that_is_not_a_venv() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir(dir.path().join(".venv")).unwrap();
        std::fs::write(dir.path().join(".venv/notes.txt"), "mine").unwrap();
        let report = purge(dir.path(), None).unwrap();
        assert_eq!(report.skipped, vec![".venv".to_string()]);
        assert!(dir.path().join(".venv/notes.txt").exists());
    }

    #[test]
    fn purge_removes_micromamba_envs() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        std::fs::create_dir_all(root.join(".pyve/envs/test-env/conda-meta")).unwrap();
        ProjectConfig::new(Backend::Micromamba).save(root).unwrap();
        purge(root, None).unwrap();
        assert!(!root.join(".pyve").exists());
    }

    #[test]
    fn backend_change_is_detected() {
        let dir = TempDir::new().unwrap();
        let config = ProjectConfig::new(Backend::Venv);
        let opts = InitOptions {
            backend: Some(BackendRequest::Explicit(Backend::Micromamba)),
            env_name: Some("test-env".to_string()),
            ..InitOptions::default()
        };
        let settings = resolve(dir.path(), &opts, Some(&config)).unwrap();
        let err = check_backend_change(&config, &settings).unwrap_err();
        assert!(err.to_string().contains("Backend change detected"));
        assert!(err.to_string().contains("venv → micromamba"));
    }

    #[test]
    fn update_keeps_custom_venv_dir() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        let mut cfg = ProjectConfig::new(Backend::Venv);
        cfg.venv.directory = Some("custom_venv".to_string());
        cfg.pyve_version = None;
        cfg.save(root).unwrap();
        fake_venv(root, "custom_venv");

        let report = update(root, &InitOptions::default()).unwrap();
        assert_eq!(report.previous_version, None);
        assert_eq!(report.settings.venv_dir, "custom_venv");
        let saved = ProjectConfig::load(root).unwrap();
        assert_eq!(saved.venv_dir(), "custom_venv");
        assert_eq!(saved.pyve_version.as_deref(), Some(crate::config::PYVE_VERSION));
    }

    #[test]
    fn update_requires_initialization() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            update(dir.path(), &InitOptions::default()),
            Err(PyveError::NotInitialized)
        ));
    }
}
