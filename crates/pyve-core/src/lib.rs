pub mod backend;
pub mod config;
pub mod direnv;
pub mod error;
pub mod gitignore;
pub mod install;
pub mod interpreter;
pub mod io;
pub mod micromamba;
pub mod paths;
pub mod process;
pub mod project;
pub mod testenv;
pub mod validate;
pub mod venv;
pub mod version;

pub use error::{PyveError, Result};
