use crate::output::rel;
use crate::prompt;
use anyhow::Context;
use pyve_core::backend::BackendSource;
use pyve_core::config::{ProjectConfig, PYVE_VERSION};
use pyve_core::direnv::EnvrcOutcome;
use pyve_core::project::{self, FilesReport, InitOptions, Settings};
use std::io::BufRead;
use std::path::Path;

pub struct InitArgs {
    pub options: InitOptions,
    pub update: bool,
    pub force: bool,
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

pub fn run(root: &Path, args: InitArgs) -> anyhow::Result<()> {
    let stdin = std::io::stdin();
    run_with_input(root, &args, &mut stdin.lock())
}

fn run_with_input<R: BufRead>(root: &Path, args: &InitArgs, input: &mut R) -> anyhow::Result<()> {
    if !project::is_initialized(root) {
        if args.update {
            anyhow::bail!(
                "nothing to update: {} is not initialized (run 'pyve --init')",
                root.display()
            );
        }
        return fresh(root, &args.options);
    }
    if args.update {
        return update(root, &args.options);
    }
    if args.force {
        return force(root, &args.options, input);
    }
    interactive(root, &args.options, input)
}

// ---------------------------------------------------------------------------
// Fresh init
// ---------------------------------------------------------------------------

fn fresh(root: &Path, opts: &InitOptions) -> anyhow::Result<()> {
    let settings = project::resolve(root, opts, None)?;
    print_plan(&settings);

    let done = project::initialize(root, &settings, opts.no_direnv)
        .context("failed to initialize environment")?;
    print_files(&done.files);

    println!();
    println!(
        "✓ Initialized {} environment at {}",
        settings.backend(),
        rel(root, &done.env)
    );
    print_next_steps(opts.no_direnv);
    Ok(())
}

fn print_plan(settings: &Settings) {
    let backend = &settings.backend;
    let note = match backend.source {
        BackendSource::Default => String::new(),
        source => format!(" (from {})", source.as_str()),
    };
    println!("Backend: {}{note}", backend.backend);
    match &settings.env_name {
        Some(name) => println!("Environment: {name}"),
        None => println!(
            "Python: {} (from {})",
            settings.python.version,
            settings.python.source.as_str()
        ),
    }
}

fn print_files(files: &FilesReport) {
    if files.python_version_written {
        println!("  wrote .python-version");
    }
    match files.envrc {
        Some(EnvrcOutcome::Created) => println!("  wrote .envrc"),
        Some(EnvrcOutcome::Updated) => println!("  updated .envrc"),
        _ => {}
    }
    if files.dotenv_created {
        println!("  created .env");
    }
    println!("  updated .gitignore");
}

fn print_next_steps(no_direnv: bool) {
    if no_direnv {
        println!("Use 'pyve run <command>' to run inside the environment.");
    } else if which::which("direnv").is_ok() {
        println!("Run 'direnv allow' to activate the environment.");
    } else {
        println!("direnv not found; use 'pyve run <command>' or install direnv for automatic activation.");
    }
}

// ---------------------------------------------------------------------------
// Re-init: update
// ---------------------------------------------------------------------------

fn update(root: &Path, opts: &InitOptions) -> anyhow::Result<()> {
    println!("Updating existing Pyve installation...");
    let report = project::update(root, opts)?;
    let previous = report.previous_version.as_deref().unwrap_or("not recorded");
    println!("  Pyve version: {previous} → {PYVE_VERSION}");
    println!("  Backend: {}", report.settings.backend());
    println!("  Environment: {} (preserved)", report.settings.env_dir());
    println!("✓ Configuration updated");
    Ok(())
}

// ---------------------------------------------------------------------------
// Re-init: force
// ---------------------------------------------------------------------------

fn force<R: BufRead>(root: &Path, opts: &InitOptions, input: &mut R) -> anyhow::Result<()> {
    println!("Force re-initialization: the existing environment will be purged.");
    match ProjectConfig::load(root) {
        Ok(config) => print_versions(&config),
        Err(e) => tracing::warn!(error = %e, "existing config unreadable"),
    }
    if !prompt::assume_yes() && !prompt::confirm(input, "Continue?")? {
        println!("Re-initialization cancelled");
        return Ok(());
    }
    purge_and_reinit(root, opts)
}

fn purge_and_reinit(root: &Path, opts: &InitOptions) -> anyhow::Result<()> {
    println!("Purging existing environment...");
    let report = project::purge(root, None).context("purge failed")?;
    for path in &report.removed {
        println!("  removed {path}");
    }
    println!();
    fresh(root, opts)
}

// ---------------------------------------------------------------------------
// Re-init: interactive
// ---------------------------------------------------------------------------

fn interactive<R: BufRead>(root: &Path, opts: &InitOptions, input: &mut R) -> anyhow::Result<()> {
    let config = ProjectConfig::load(root).context("failed to read .pyve/config")?;
    println!("Pyve is already initialized in {}", root.display());
    print_versions(&config);
    println!();
    println!("What would you like to do?");
    println!("  1) Update (keep environment, refresh configuration)");
    println!("  2) Purge and re-initialize");
    println!("  3) Cancel");

    match prompt::ask(input, "Choice [1-3]:")?.as_deref() {
        Some("1") => update(root, opts),
        Some("2") => purge_and_reinit(root, opts),
        Some("3") | None => {
            println!("Re-initialization cancelled");
            Ok(())
        }
        Some(other) => anyhow::bail!("Invalid choice '{other}': expected 1, 2 or 3"),
    }
}

fn print_versions(config: &ProjectConfig) {
    let recorded = config.pyve_version.as_deref().unwrap_or("not recorded");
    println!("  Project pyve version: {recorded}");
    println!("  Current pyve version: {PYVE_VERSION}");
    if let Some(backend) = config.backend {
        println!("  Backend: {backend}");
    }
}
