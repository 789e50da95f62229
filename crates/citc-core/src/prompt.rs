//! Interactive prompts for parameters not supplied up front.

use std::io::{self, BufRead, Write};

fn read_answer(message: &str) -> io::Result<String> {
    print!("{message}");
    io::stdout().flush()?;

    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    Ok(answer.trim().to_string())
}

/// Ask until the user gives a non-empty answer.
pub fn required(message: &str) -> io::Result<String> {
    loop {
        let answer = read_answer(message)?;
        if !answer.is_empty() {
            return Ok(answer);
        }
    }
}

/// Ask with a default offered in brackets; an empty answer takes the
/// default.
pub fn with_default(message: &str, default: &str) -> io::Result<String> {
    let answer = read_answer(&format!("{message} [{default}]? "))?;
    if answer.is_empty() {
        Ok(default.to_string())
    } else {
        Ok(answer)
    }
}

/// Ask a yes/no question; only an explicit `y`/`Y` counts as yes.
pub fn confirm(message: &str) -> io::Result<bool> {
    let answer = read_answer(&format!("{message} [y/N]: "))?;
    Ok(answer.eq_ignore_ascii_case("y"))
}
