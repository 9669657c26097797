//! Output formatting utilities

use chrono::DateTime;
use clap::ValueEnum;
use colored::Colorize;
use std::collections::BTreeMap;

/// Output format for CLI commands
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    /// Table format (default)
    #[default]
    Table,
    /// JSON format
    Json,
}

/// Print a success message
pub fn print_success(message: &str) {
    println!("{} {}", "✓".green().bold(), message);
}

/// Print a warning message
pub fn print_warning(message: &str) {
    println!("{} {}", "⚠".yellow().bold(), message);
}

/// Print an info message
pub fn print_info(message: &str) {
    println!("{} {}", "ℹ".blue().bold(), message);
}

/// Color a container status
pub fn color_status(status: &str) -> String {
    match status {
        "running" => status.green().to_string(),
        "paused" => status.blue().to_string(),
        "stopped" | "processing" => status.yellow().to_string(),
        "error" => status.red().to_string(),
        _ => status.to_string(),
    }
}

/// `80/tcp→8080,8081` entries separated by spaces
pub fn format_ports(ports: &BTreeMap<String, Vec<String>>) -> String {
    if ports.is_empty() {
        return "-".to_string();
    }

    ports
        .iter()
        .map(|(container_port, host_ports)| {
            format!("{}→{}", container_port, host_ports.join(","))
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Epoch seconds as RFC 3339
pub fn format_epoch(secs: i64) -> String {
    DateTime::from_timestamp(secs, 0)
        .map(|t| t.to_rfc3339())
        .unwrap_or_else(|| secs.to_string())
}

/// Utilization fraction as a percentage; `-` when unknown
pub fn format_percent(fraction: Option<f64>) -> String {
    match fraction {
        Some(f) => format!("{:.1}%", f * 100.0),
        None => "-".to_string(),
    }
}
