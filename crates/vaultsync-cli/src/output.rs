//! Terminal output for CLI commands
//!
//! Human mode prints a marked headline and indented detail lines on stdout,
//! and problems on stderr. JSON mode prints one document per command on
//! stdout and reports problems as one-line objects on stderr.

use serde_json::{json, Value};

/// Output format selected by the global `--json` flag
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Human,
    Json,
}

impl OutputFormat {
    pub fn from_json_flag(json: bool) -> Self {
        if json {
            OutputFormat::Json
        } else {
            OutputFormat::Human
        }
    }

    pub fn formatter(self) -> Box<dyn OutputFormatter> {
        match self {
            OutputFormat::Human => Box::new(HumanFormatter),
            OutputFormat::Json => Box::new(JsonFormatter),
        }
    }
}

/// Sink for everything a command prints
pub trait OutputFormatter {
    /// Headline for a finished operation
    fn success(&self, message: &str);
    fn error(&self, message: &str);
    fn warn(&self, message: &str);
    /// Detail line under the last headline
    fn info(&self, message: &str);
    /// The command's machine-readable result
    fn print_json(&self, value: &Value);
}

pub struct HumanFormatter;

impl OutputFormatter for HumanFormatter {
    fn success(&self, message: &str) {
        println!("\u{2713} {message}");
    }
    fn error(&self, message: &str) {
        eprintln!("\u{2717} {message}");
    }
    fn warn(&self, message: &str) {
        eprintln!("\u{26a0} {message}");
    }
    fn info(&self, message: &str) {
        if message.is_empty() {
            println!();
        } else {
            println!("  {message}");
        }
    }
    fn print_json(&self, _value: &Value) {}
}

/// Only `print_json` writes to stdout; headlines and details are dropped
pub struct JsonFormatter;

impl OutputFormatter for JsonFormatter {
    fn success(&self, _message: &str) {}
    fn error(&self, message: &str) {
        eprintln!("{}", problem("error", message));
    }
    fn warn(&self, message: &str) {
        eprintln!("{}", problem("warning", message));
    }
    fn info(&self, _message: &str) {}
    fn print_json(&self, value: &Value) {
        match serde_json::to_string_pretty(value) {
            Ok(text) => println!("{text}"),
            Err(e) => self.error(&format!("Failed to render output: {e}")),
        }
    }
}

fn problem(level: &str, message: &str) -> Value {
    json!({ "level": level, "message": message })
}
