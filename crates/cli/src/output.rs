// Output format auto-detection for the CLI.
//
// TTY → human-readable text. Piped/redirected → structured JSON.
// `--json` flag forces JSON output regardless of terminal.

use flame_client::api::ConnectError;
use flame_client::{Fault, FaultKind};
use flame_common::protocol::jsonrpc::{NOT_FOUND, NOT_LOGGED_IN};
use serde::Serialize;
use std::io::{self, IsTerminal, Write};

const ANSI_RED: &str = "\x1b[31m";
const ANSI_RESET: &str = "\x1b[0m";

/// Output format for CLI commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable text.
    Human,
    /// Machine-readable JSON (one object per response).
    Json,
}

impl OutputFormat {
    /// Auto-detect format: JSON if `--json` was passed or stdout is not a TTY.
    pub fn detect(json_flag: bool) -> Self {
        if json_flag {
            return Self::Json;
        }
        Self::detect_from_terminal(io::stdout().is_terminal())
    }

    /// Testable variant that takes an explicit `is_tty` flag.
    pub fn detect_from_terminal(is_tty: bool) -> Self {
        if is_tty {
            Self::Human
        } else {
            Self::Json
        }
    }
}

/// Write a value to stdout in the selected format.
pub fn print_output<T, F>(format: OutputFormat, value: &T, human_fn: F) -> io::Result<()>
where
    T: Serialize,
    F: FnOnce(&T) -> String,
{
    write_output(&mut io::stdout().lock(), format, value, human_fn)
}

/// Write a value to a provided writer (useful for testing).
pub fn write_output<W, T, F>(
    writer: &mut W,
    format: OutputFormat,
    value: &T,
    human_fn: F,
) -> io::Result<()>
where
    W: Write,
    T: Serialize,
    F: FnOnce(&T) -> String,
{
    match format {
        OutputFormat::Human => {
            writeln!(writer, "{}", human_fn(value))
        }
        OutputFormat::Json => {
            serde_json::to_writer(&mut *writer, value).map_err(io::Error::other)?;
            writeln!(writer)
        }
    }
}

/// Write an error to stderr in the selected format.
pub fn print_error(format: OutputFormat, code: &str, message: &str) {
    let mut err = io::stderr().lock();
    match format {
        OutputFormat::Human => {
            let line = render_human_stderr_line(message, io::stderr().is_terminal());
            let _ = writeln!(err, "{line}");
        }
        OutputFormat::Json => {
            let obj = serde_json::json!({
                "error": {
                    "code": code,
                    "message": message,
                }
            });
            let _ = serde_json::to_writer(&mut err, &obj);
            let _ = writeln!(err);
        }
    }
}

/// Print a mapped, actionable error for a command failure.
pub fn print_anyhow_error(format: OutputFormat, error: &anyhow::Error) {
    let (code, message) = actionable_error(error);
    print_error(format, code, &message);
}

fn actionable_error(error: &anyhow::Error) -> (&'static str, String) {
    for cause in error.chain() {
        if let Some(fault) = cause.downcast_ref::<Fault>() {
            return actionable_fault(fault);
        }
        if let Some(ConnectError::Config(config_error)) = cause.downcast_ref::<ConnectError>() {
            return (
                "CONFIG_ERROR",
                format!("{config_error}. Check --endpoint or ~/.flame/config.toml"),
            );
        }
    }
    ("ERROR", format!("{error:#}"))
}

fn actionable_fault(fault: &Fault) -> (&'static str, String) {
    match fault.kind() {
        FaultKind::Unavailable => (
            "SERVICE_UNAVAILABLE",
            format!(
                "Could not reach the Flame service ({}). Check --endpoint, then retry",
                fault.message()
            ),
        ),
        FaultKind::Timeout => (
            "TIMEOUT",
            format!("{}. Retry, or raise the deadline with --timeout-ms", fault.message()),
        ),
        FaultKind::Protocol => (
            "PROTOCOL_ERROR",
            format!("The service sent an unexpected response: {}", fault.message()),
        ),
        FaultKind::Rejected if fault.code() == Some(NOT_LOGGED_IN) => {
            ("NOT_LOGGED_IN", "Not logged in. Sign in to the Flame service and retry".to_string())
        }
        FaultKind::Rejected if fault.code() == Some(NOT_FOUND) => (
            "NOT_FOUND",
            format!("{}. Check the project name and path with `flame ls`", fault.message()),
        ),
        FaultKind::Rejected => ("REJECTED", fault.message().to_string()),
        FaultKind::InvalidRequest => ("INVALID_REQUEST", fault.message().to_string()),
        FaultKind::Cancelled => ("CANCELLED", fault.message().to_string()),
    }
}

fn render_human_stderr_line(message: &str, is_tty: bool) -> String {
    if is_tty {
        format!("{ANSI_RED}error:{ANSI_RESET} {message}")
    } else {
        format!("error: {message}")
    }
}
