use crate::output::print_json;
use anyhow::Context;
use pyve_core::project;
use std::path::Path;

pub fn run(root: &Path, venv_dir: Option<&str>, json: bool) -> anyhow::Result<()> {
    let report = project::purge(root, venv_dir).context("purge failed")?;

    if json {
        return print_json(&report);
    }

    for path in &report.skipped {
        eprintln!("warning: {path} is not a virtual environment; left in place");
    }
    if report.removed.is_empty() {
        println!("Nothing to purge");
        return Ok(());
    }
    println!("Purging pyve environment in {}", root.display());
    for path in &report.removed {
        println!("  removed {path}");
    }
    println!("✓ Purge complete (.python-version and .pyve/testenv kept)");
    Ok(())
}
