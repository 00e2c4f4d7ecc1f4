//! Terminal input and output helpers.

use std::io::{self, Write};

use anyhow::{Context, Result, anyhow, bail};
use client::{
    ActionError, ValidationErrors,
    notify::{Notice, NoticeLevel, Notifier},
};

/// Prints notices the way a toast would show them: one line, no prompt.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&self, notice: Notice) {
        match notice.level {
            NoticeLevel::Info => println!("{}", notice.message),
            NoticeLevel::Error => eprintln!("error: {}", notice.message),
        }
    }
}

/// Reads one non-empty line from stdin.
pub fn prompt(message: &str) -> Result<String> {
    let value = prompt_optional(message)?;
    if value.is_empty() {
        bail!("input must not be empty");
    }
    Ok(value)
}

/// Reads one line from stdin; an empty answer is allowed.
pub fn prompt_optional(message: &str) -> Result<String> {
    print!("{message}");
    io::stdout().flush().ok();
    let mut input = String::new();
    io::stdin()
        .read_line(&mut input)
        .context("failed to read from stdin")?;
    Ok(input.trim().to_string())
}

pub fn prompt_secret(message: &str) -> Result<String> {
    rpassword::prompt_password(message).context("failed to read password")
}

pub fn print_field_errors(errors: &ValidationErrors) {
    for (field, message) in errors.iter() {
        eprintln!("  {field}: {message}");
    }
}

/// Turns a failed action into the command error, listing field problems
/// first so the final message stays a single line.
pub fn surface(err: impl Into<ActionError>) -> anyhow::Error {
    let err = err.into();
    if let Some(errors) = err.validation() {
        print_field_errors(errors);
    }
    anyhow!(err.user_message())
}
