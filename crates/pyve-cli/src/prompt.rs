//! Line-based prompts on stdin. EOF answers "no" / cancels.

use std::io::{self, BufRead, Write};

fn env_flag(name: &str) -> bool {
    std::env::var(name)
        .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
        .unwrap_or(false)
}

/// Confirmation prompts are skipped under `PYVE_FORCE_YES` or `CI`.
pub fn assume_yes() -> bool {
    env_flag("PYVE_FORCE_YES") || env_flag("CI")
}

/// Print `question` and read one trimmed line. `None` on EOF.
pub fn ask<R: BufRead>(input: &mut R, question: &str) -> io::Result<Option<String>> {
    print!("{question} ");
    io::stdout().flush()?;
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        println!();
        return Ok(None);
    }
    Ok(Some(line.trim().to_string()))
}

pub fn confirm<R: BufRead>(input: &mut R, question: &str) -> io::Result<bool> {
    let answer = ask(input, &format!("{question} [y/N]"))?;
    Ok(answer.is_some_and(|a| matches!(a.to_ascii_lowercase().as_str(), "y" | "yes")))
}
