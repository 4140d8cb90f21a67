//! `paycrypt`: CLI entry point.
//!
//! Startup sequence:
//! 1. Load and validate [`config::Config`] from environment variables.
//! 2. Initialise structured JSON logging.
//! 3. Build the driver factory from `PAYCRYPT_*` key settings.
//! 4. Run the requested operation on stdin and write the result to stdout.

mod config;
mod operation;
mod telemetry;

use std::io::{self, Read, Write};
use std::process::ExitCode;

use anyhow::{Context, Result};
use paycrypt::Crypt;
use tracing::info;

use operation::{Operation, Outcome};

fn main() -> Result<ExitCode> {
    // -----------------------------------------------------------------------
    // 1. Configuration
    // -----------------------------------------------------------------------
    let cfg = config::Config::from_env().map_err(|e| {
        // Telemetry is not yet up; write to stderr directly.
        eprintln!("ERROR: configuration invalid: {e}");
        e
    })?;

    // -----------------------------------------------------------------------
    // 2. Telemetry
    // -----------------------------------------------------------------------
    telemetry::init(&cfg.log_level)?;
    info!(version = env!("CARGO_PKG_VERSION"), driver = %cfg.driver, "paycrypt starting");

    // -----------------------------------------------------------------------
    // 3. Driver factory
    // -----------------------------------------------------------------------
    let op: Operation = std::env::args()
        .nth(1)
        .with_context(Operation::usage)?
        .parse()?;
    let crypt = Crypt::from_env().context("failed to load driver configuration")?;

    // -----------------------------------------------------------------------
    // 4. Operation
    // -----------------------------------------------------------------------
    let mut input = Vec::new();
    io::stdin()
        .read_to_end(&mut input)
        .context("failed to read stdin")?;
    let input = strip_newline(&input);

    let mut stdout = io::stdout().lock();
    match operation::run(&crypt, &cfg.driver, op, input)? {
        Outcome::Output(bytes) => {
            stdout.write_all(&bytes)?;
            stdout.write_all(b"\n")?;
            Ok(ExitCode::SUCCESS)
        }
        Outcome::Verified(ok) => {
            writeln!(stdout, "{ok}")?;
            Ok(if ok { ExitCode::SUCCESS } else { ExitCode::FAILURE })
        }
    }
}

/// Drop one trailing `\n` or `\r\n`, as left by `echo` or a heredoc.
fn strip_newline(input: &[u8]) -> &[u8] {
    match input.strip_suffix(b"\n") {
        Some(rest) => rest.strip_suffix(b"\r").unwrap_or(rest),
        None => input,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_one_trailing_newline() {
        assert_eq!(strip_newline(b"abc\n"), b"abc");
        assert_eq!(strip_newline(b"abc\r\n"), b"abc");
        assert_eq!(strip_newline(b"abc\n\n"), b"abc\n");
        assert_eq!(strip_newline(b"abc"), b"abc");
        assert_eq!(strip_newline(b"abc\r"), b"abc\r");
    }
}
