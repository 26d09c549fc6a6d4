use thiserror::Error;

#[derive(Debug, Error)]
pub enum PyveError {
    #[error("not initialized: run 'pyve --init'")]
    NotInitialized,

    #[error("invalid config {path}: {reason}")]
    ConfigInvalid { path: String, reason: String },

    #[error("invalid backend '{0}': expected venv, micromamba, or auto")]
    InvalidBackend(String),

    #[error("invalid environment name '{0}': must start with a letter or digit and contain only letters, digits, '.', '_' or '-'")]
    InvalidEnvName(String),

    #[error("environment name '{0}' is reserved by micromamba; choose another with --env-name")]
    ReservedEnvName(String),

    #[error("micromamba backend needs environment.yml or conda-lock.yml in {0}")]
    MissingEnvironmentFile(String),

    #[error("invalid environment.yml: {0}")]
    InvalidEnvironmentFile(String),

    #[error("{tool} not found: {hint}")]
    ToolNotFound { tool: String, hint: String },

    #[error("invalid Python version '{0}': expected MAJOR.MINOR or MAJOR.MINOR.PATCH")]
    InvalidPythonVersion(String),

    #[error("Python {version} is not available: {reason}")]
    PythonUnavailable { version: String, reason: String },

    #[error("existing virtual environment {path} uses Python {found}, not the requested {requested}; delete it or choose another --venv-dir")]
    StaleVenv {
        path: String,
        found: String,
        requested: String,
    },

    #[error("`{program}` failed (exit {code}): {stderr}")]
    CommandFailed {
        program: String,
        code: i32,
        stderr: String,
    },

    #[error("failed to launch `{program}`: {reason}")]
    SpawnFailed { program: String, reason: String },

    #[error("Cannot update in-place: Backend change detected ({from} → {to}); use --force to re-initialize")]
    BackendChange { from: String, to: String },

    #[error("home directory not found: set HOME environment variable")]
    HomeNotFound,

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),
}

pub type Result<T> = std::result::Result<T, PyveError>;
