//! Interactive prompts on the controlling terminal.
//!
//! Questions go to stderr so stdout stays clean for table or JSON output.

use std::io::{self, BufRead, Write};

/// Ask a yes/no question; only `y` or `yes` (any case) confirms.
///
/// # Errors
///
/// Returns an error if reading or writing fails.
pub fn confirm_with<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
    question: &str,
) -> io::Result<bool> {
    write!(output, "{question} [y/N]: ")?;
    output.flush()?;
    let mut answer = String::new();
    input.read_line(&mut answer)?;
    Ok(matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"))
}

/// [`confirm_with`] on stdin/stderr.
///
/// # Errors
///
/// Returns an error if the terminal cannot be read.
pub fn confirm(question: &str) -> io::Result<bool> {
    confirm_with(&mut io::stdin().lock(), &mut io::stderr(), question)
}

/// Read one trimmed line after printing `label`.
///
/// # Errors
///
/// Returns an error if reading or writing fails.
pub fn line_with<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
    label: &str,
) -> io::Result<String> {
    write!(output, "{label}")?;
    output.flush()?;
    let mut value = String::new();
    input.read_line(&mut value)?;
    Ok(value.trim().to_string())
}

/// [`line_with`] on stdin/stderr.
///
/// # Errors
///
/// Returns an error if the terminal cannot be read.
pub fn line(label: &str) -> io::Result<String> {
    line_with(&mut io::stdin().lock(), &mut io::stderr(), label)
}

/// Read a secret without echo, falling back to a plain line when there is
/// no terminal (piped input).
///
/// # Errors
///
/// Returns an error if neither the terminal nor stdin can be read.
pub fn secret(label: &str) -> io::Result<String> {
    match rpassword::prompt_password(label) {
        Ok(value) => Ok(value.trim().to_string()),
        Err(_) => {
            let mut value = String::new();
            io::stdin().lock().read_line(&mut value)?;
            Ok(value.trim().to_string())
        }
    }
}
