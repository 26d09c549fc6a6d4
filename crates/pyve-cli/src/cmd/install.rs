use anyhow::Context;
use pyve_core::install;

pub fn run_install() -> anyhow::Result<()> {
    let home = install::home_dir()?;
    let exe = std::env::current_exe().context("cannot locate the running pyve binary")?;
    let shell = std::env::var("SHELL").ok();
    let report = install::install(&home, &exe, shell.as_deref())?;

    if report.binary_copied {
        println!("✓ Installed pyve to {}", report.binary.display());
    } else {
        println!("pyve already installed at {}", report.binary.display());
    }
    if report.profile_updated {
        println!("✓ Added {} to PATH in {}", install::INSTALL_DIR, report.profile.display());
        println!("Open a new shell (or source {}) to pick it up.", report.profile.display());
    }
    Ok(())
}

pub fn run_uninstall() -> anyhow::Result<()> {
    let home = install::home_dir()?;
    let report = install::uninstall(&home)?;

    if report.binary_removed {
        println!("✓ Removed {}", install::install_path(&home).display());
    }
    for profile in &report.profiles_cleaned {
        println!("✓ Removed PATH entry from {}", profile.display());
    }
    if !report.binary_removed && report.profiles_cleaned.is_empty() {
        println!("pyve is not installed");
    }
    Ok(())
}
