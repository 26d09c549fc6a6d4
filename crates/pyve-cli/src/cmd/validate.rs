use crate::output::{print_check, print_heading, print_json};
use pyve_core::validate;
use std::path::Path;

/// Returns the process exit code: 0 pass, 2 warnings, 1 errors.
pub fn run(root: &Path, json: bool) -> anyhow::Result<i32> {
    let report = validate::validate(root);
    let code = report.exit_code();

    if json {
        print_json(&serde_json::json!({
            "exit_code": code,
            "checks": report.checks,
        }))?;
        return Ok(code);
    }

    print_heading("Pyve Configuration Validation");
    for check in &report.checks {
        print_check(check);
    }
    println!();
    match code {
        0 => println!("✓ All validations passed"),
        2 => println!("⚠ Validation passed with warnings"),
        _ => eprintln!("✗ Validation failed"),
    }
    Ok(code)
}
