//! # Terminal Output
//!
//! Helpers for the handful of lines the CLI prints to stdout (log records go
//! to stderr through `env_logger`). Status markers are coloured symbols when
//! colour is enabled and bracketed tags otherwise.
//!
//! Colour follows the `--color` flag; in `auto` mode the usual environment
//! conventions apply:
//! - `NO_COLOR` set (to anything) disables colour
//! - `CLICOLOR=0` disables colour
//! - `CLICOLOR_FORCE=1` enables colour even when stdout is not a terminal
//! - `TERM=dumb` disables colour

use crate::tally::RunTally;
use console::style;
use std::env;

/// Kind of status line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Ok,
    Info,
    Warn,
    Fail,
}

impl Status {
    fn symbol(self) -> &'static str {
        match self {
            Status::Ok => "✔",
            Status::Info => "•",
            Status::Warn => "⚠",
            Status::Fail => "✘",
        }
    }

    fn tag(self) -> &'static str {
        match self {
            Status::Ok => "[OK]",
            Status::Info => "[INFO]",
            Status::Warn => "[WARN]",
            Status::Fail => "[FAIL]",
        }
    }
}

/// Whether output is coloured
#[derive(Debug, Clone, Copy)]
pub struct OutputConfig {
    pub use_color: bool,
}

impl OutputConfig {
    /// Resolve the `--color` flag value (`always`, `never` or `auto`)
    pub fn from_env_and_flag(color_flag: &str) -> Self {
        let use_color = match color_flag.to_lowercase().as_str() {
            "always" => true,
            "never" => false,
            _ => Self::detect_color_support(),
        };
        Self { use_color }
    }

    /// Never colour
    pub fn plain() -> Self {
        Self { use_color: false }
    }

    fn detect_color_support() -> bool {
        if env::var_os("NO_COLOR").is_some() {
            return false;
        }
        if env::var("CLICOLOR").is_ok_and(|v| v == "0") {
            return false;
        }
        if env::var("CLICOLOR_FORCE").is_ok_and(|v| v != "0" && !v.is_empty()) {
            return true;
        }
        if env::var("TERM").is_ok_and(|v| v == "dumb") {
            return false;
        }
        console::Term::stdout().features().colors_supported()
    }

    /// Marker printed at the start of a status line
    pub fn marker(&self, status: Status) -> String {
        if !self.use_color {
            return status.tag().to_string();
        }
        let styled = style(status.symbol()).force_styling(true);
        let styled = match status {
            Status::Ok => styled.green(),
            Status::Info => styled.cyan(),
            Status::Warn => styled.yellow(),
            Status::Fail => styled.red().bold(),
        };
        styled.to_string()
    }

    /// A status line: marker, space, message
    pub fn line(&self, status: Status, message: impl std::fmt::Display) -> String {
        format!("{} {}", self.marker(status), message)
    }

    /// The final line of a run
    pub fn completion_line(&self, tally: &RunTally) -> String {
        let status = if tally.is_success() {
            Status::Ok
        } else {
            Status::Fail
        };
        self.line(status, tally.completion_message())
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self::from_env_and_flag("auto")
    }
}
