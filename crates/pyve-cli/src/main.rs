mod cmd;
mod output;
mod prompt;
mod root;

use clap::{Args, Parser, Subcommand};
use pyve_core::backend::BackendRequest;
use pyve_core::project::InitOptions;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "pyve",
    about = "Per-project Python environments: venv or micromamba, pinned Python, direnv activation",
    version
)]
struct Cli {
    /// Project root (default: nearest directory with .pyve/config, else cwd)
    #[arg(long, global = true, env = "PYVE_ROOT")]
    root: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    #[command(flatten)]
    action: Action,

    #[command(flatten)]
    init: InitFlags,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Args)]
#[group(id = "action", multiple = false)]
struct Action {
    /// Create the project environment, optionally pinning a Python version
    #[arg(long, value_name = "VERSION", num_args = 0..=1)]
    init: Option<Option<String>>,

    /// Remove the environment and pyve-managed files (keeps .python-version)
    #[arg(long, value_name = "VENV_DIR", num_args = 0..=1)]
    purge: Option<Option<String>>,

    /// Check environment, config and project files for consistency (exit 0/1/2)
    #[arg(long)]
    validate: bool,

    /// Show resolved settings and where each came from
    #[arg(long)]
    config: bool,

    /// Install pyve into ~/.local/bin and add it to PATH
    #[arg(long)]
    install: bool,

    /// Remove the installed pyve binary and PATH entry
    #[arg(long)]
    uninstall: bool,
}

#[derive(Args)]
struct InitFlags {
    /// Print the resolved Python version, or pin VERSION in .python-version.
    /// With --init, selects the Python version to use.
    #[arg(
        long,
        value_name = "VERSION",
        num_args = 0..=1,
        conflicts_with_all = ["purge", "validate", "config", "install", "uninstall"]
    )]
    python_version: Option<Option<String>>,

    /// Backend: venv, micromamba or auto
    #[arg(long, env = "PYVE_BACKEND", value_name = "BACKEND")]
    backend: Option<BackendRequest>,

    /// Virtual environment directory (venv backend, default .venv)
    #[arg(long, value_name = "DIR")]
    venv_dir: Option<String>,

    /// Environment name (micromamba backend)
    #[arg(long, value_name = "NAME")]
    env_name: Option<String>,

    /// Do not write .envrc
    #[arg(long)]
    no_direnv: bool,

    /// Re-init: refresh configuration, keep the environment
    #[arg(long, requires = "init", conflicts_with = "force")]
    update: bool,

    /// Re-init: purge and rebuild the environment
    #[arg(long, requires = "init")]
    force: bool,
}

impl InitFlags {
    fn options(&self, version: Option<String>) -> InitOptions {
        InitOptions {
            python_version: version.or_else(|| self.python_version.clone().flatten()),
            default_python_version: default_python_version(),
            backend: self.backend,
            venv_dir: self.venv_dir.clone(),
            env_name: self.env_name.clone(),
            no_direnv: self.no_direnv,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Report environment health and tool availability
    Doctor,

    /// Run a command inside the project environment
    Run {
        #[arg(
            required = true,
            trailing_var_arg = true,
            allow_hyphen_values = true,
            value_name = "COMMAND"
        )]
        argv: Vec<String>,
    },

    /// Run pytest from the dedicated test environment
    Test {
        #[arg(trailing_var_arg = true, allow_hyphen_values = true, value_name = "ARGS")]
        args: Vec<String>,
    },
}

fn default_python_version() -> Option<String> {
    std::env::var("PYVE_PYTHON_VERSION")
        .ok()
        .filter(|v| !v.trim().is_empty())
}

fn dispatch(cli: Cli) -> anyhow::Result<i32> {
    let explicit_root = cli.root.as_deref();
    let json = cli.json;

    if let Some(command) = cli.command {
        let root = root::resolve_root(explicit_root);
        return match command {
            Commands::Doctor => cmd::doctor::run(&root, json).map(|()| 0),
            Commands::Run { argv } => cmd::run::run(&root, &argv),
            Commands::Test { args } => cmd::test::run(&root, &args),
        };
    }

    let action = cli.action;
    let flags = cli.init;

    if let Some(version) = action.init {
        let root = root::init_root(explicit_root);
        let args = cmd::init::InitArgs {
            options: flags.options(version),
            update: flags.update,
            force: flags.force,
        };
        return cmd::init::run(&root, args).map(|()| 0);
    }

    let root = root::resolve_root(explicit_root);
    if let Some(venv_dir) = action.purge {
        cmd::purge::run(&root, venv_dir.as_deref(), json)?;
    } else if action.validate {
        return cmd::validate::run(&root, json);
    } else if action.config {
        cmd::config::run(&root, &flags.options(None), json)?;
    } else if action.install {
        cmd::install::run_install()?;
    } else if action.uninstall {
        cmd::install::run_uninstall()?;
    } else if let Some(value) = flags.python_version {
        cmd::python_version::run(
            &root,
            value.as_deref(),
            default_python_version().as_deref(),
            json,
        )?;
    } else {
        use clap::CommandFactory;
        Cli::command().print_help()?;
        println!();
        return Ok(2);
    }
    Ok(0)
}

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match dispatch(cli) {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            // Print the full error chain (anyhow's alternate Display)
            eprintln!("error: {e:#}");
            std::process::exit(1);
        }
    }
}
