pub mod config;
pub mod doctor;
pub mod init;
pub mod install;
pub mod purge;
pub mod python_version;
pub mod run;
pub mod validate;
