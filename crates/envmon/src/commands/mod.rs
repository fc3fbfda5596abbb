//! CLI command handlers.

pub mod alerts;
pub mod auth;
pub mod readings;
pub mod reports;
pub mod resources;

use anyhow::Result;
use console::{Style, style};
use envmon_client::EnvmonClient;
use serde::Serialize;

/// Shared context for all commands.
#[derive(Clone)]
pub struct Context {
    /// API client bound to the stored session.
    pub client: EnvmonClient,
    /// Output as JSON for scripting.
    pub json_output: bool,
    /// Verbose output enabled.
    pub verbose: bool,
}

impl Context {
    /// Print `value` as pretty JSON. Returns `false` in human-output mode so
    /// callers can fall through to their own rendering.
    pub fn emit_json<T: Serialize + ?Sized>(&self, value: &T) -> Result<bool> {
        if self.json_output {
            println!("{}", serde_json::to_string_pretty(value)?);
        }
        Ok(self.json_output)
    }
}

/// Print a bold section title with a dim rule under it.
pub fn print_header(title: &str) {
    let dim = Style::new().dim();
    println!("{}", style(title).bold());
    println!("{}", dim.apply_to("─".repeat(50)));
    println!();
}

/// Print a dim note for empty listings.
pub fn print_empty(what: &str) {
    let dim = Style::new().dim();
    println!("{}", dim.apply_to(format!("No {} found", what)));
}

/// Print a green check line.
pub fn print_success(message: impl std::fmt::Display) {
    let green = Style::new().green();
    println!("{} {}", green.apply_to("✓"), message);
}

/// Print an aligned `label: value` line.
pub fn print_field(label: &str, value: impl std::fmt::Display) {
    let dim = Style::new().dim();
    println!("  {} {}", dim.apply_to(format!("{:<14}", format!("{}:", label))), value);
}

/// Render an optional value, dimmed dash when absent.
pub fn or_dash<T: std::fmt::Display>(value: Option<T>) -> String {
    value
        .map(|v| v.to_string())
        .unwrap_or_else(|| "-".to_string())
}

/// Render a statistics object as `key: value` lines; nested objects indent.
pub fn print_stats(stats: &serde_json::Value) {
    fn walk(value: &serde_json::Value, indent: usize) {
        match value {
            serde_json::Value::Object(map) => {
                for (key, value) in map {
                    if value.is_object() {
                        println!("{:indent$}{}:", "", key, indent = indent);
                        walk(value, indent + 2);
                    } else {
                        println!("{:indent$}{}: {}", "", key, value, indent = indent);
                    }
                }
            }
            other => println!("{:indent$}{}", "", other, indent = indent),
        }
    }
    walk(stats, 2);
}

pub(crate) fn truncate(s: &str, max_len: usize) -> String {
    let s = s.replace('\n', " ");
    if s.chars().count() <= max_len {
        s
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
