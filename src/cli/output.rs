//! Shared output formatting utilities for CLI commands
//!
//! Provides consistent output formatting across all CLI commands with support
//! for JSON, YAML, and table formats, plus the console notice printer.

use anyhow::{Context, Result};
use serde::Serialize;
use std::io::Write;

use crate::domain::{CertificateRecord, ProxyRouteRecord};
use crate::notify::{Notice, NoticeLevel, Notifier};
use crate::workflow::WorkflowRun;

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Json,
    Yaml,
    Table,
}

impl OutputFormat {
    /// Parse output format from string
    pub fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "json" => Ok(OutputFormat::Json),
            "yaml" => Ok(OutputFormat::Yaml),
            "table" => Ok(OutputFormat::Table),
            _ => anyhow::bail!(
                "Unsupported output format: '{}'. Use 'json', 'yaml', or 'table'.",
                s
            ),
        }
    }
}

/// Print data in the specified format
pub fn print_output<T: Serialize>(data: &T, format: &str) -> Result<()> {
    match OutputFormat::from_str(format)? {
        OutputFormat::Json => print_json(data),
        OutputFormat::Yaml => print_yaml(data),
        OutputFormat::Table => {
            anyhow::bail!("Table format requires custom implementation per data type")
        }
    }
}

/// Print data as JSON
pub fn print_json<T: Serialize>(data: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(data).context("Failed to serialize to JSON")?;
    println!("{}", json);
    Ok(())
}

/// Print data as YAML
pub fn print_yaml<T: Serialize>(data: &T) -> Result<()> {
    let yaml = serde_yaml::to_string(data).context("Failed to serialize to YAML")?;
    println!("{}", yaml);
    Ok(())
}

/// Truncate string to maximum length (in characters) with ellipsis
pub fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Print a horizontal separator line
pub fn print_separator(width: usize) {
    println!("{}", "-".repeat(width));
}

/// Print a table header
pub fn print_table_header(columns: &[(&str, usize)]) {
    println!();
    let mut header = String::new();
    for (name, width) in columns {
        header.push_str(&format!("{:<width$} ", name, width = width));
    }
    println!("{}", header.trim());

    let total_width: usize = columns.iter().map(|(_, w)| w + 1).sum();
    print_separator(total_width.saturating_sub(1));
}

/// Ask for a y/N confirmation on stdin; `yes` skips the prompt
pub fn confirm(prompt: &str, yes: bool) -> Result<bool> {
    if yes {
        return Ok(true);
    }
    print!("{} (y/N) ", prompt);
    std::io::stdout().flush()?;
    let mut input = String::new();
    std::io::stdin().read_line(&mut input)?;
    let confirmed = input.trim().eq_ignore_ascii_case("y");
    if !confirmed {
        println!("Cancelled");
    }
    Ok(confirmed)
}

/// Prints notices to stderr so stdout stays machine readable
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&self, notice: Notice) {
        let marker = match notice.level {
            NoticeLevel::Info => "ℹ️ ",
            NoticeLevel::Success => "✅",
            NoticeLevel::Error => "❌",
        };
        eprintln!("{} {}", marker, notice.message);
    }
}

pub fn print_certificates_table(records: &[CertificateRecord]) {
    if records.is_empty() {
        println!("No certificates found");
        return;
    }

    print_table_header(&[("Identifier", 32), ("Name", 20), ("Kind", 10), ("Key", 5)]);
    for record in records {
        println!(
            "{:<32} {:<20} {:<10} {:<5}",
            truncate(&record.identifier, 30),
            truncate(&record.display_name, 18),
            record.kind.label(),
            if record.has_private_key { "yes" } else { "no" }
        );
    }
    println!();
}

pub fn print_routes_table(routes: &[ProxyRouteRecord]) {
    if routes.is_empty() {
        println!("No routes found");
        return;
    }

    print_table_header(&[("Domain", 30), ("Proxy Target", 35), ("Certificate", 25)]);
    for route in routes {
        println!(
            "{:<30} {:<35} {:<25}",
            truncate(&route.domain, 28),
            truncate(route.proxy_target.as_deref().unwrap_or("<unreadable>"), 33),
            truncate(&route.certificate_ref, 23)
        );
    }
    println!();
}

pub fn print_workflow_run(run: &WorkflowRun) {
    let stages: Vec<&str> = run.history.iter().map(|s| s.label()).collect();
    println!();
    println!("{:<12} {}", "Host", run.target_host);
    println!("{:<12} {}", "Origin", run.target_origin);
    println!("{:<12} {}", "Stages", stages.join(" -> "));
    if let Some(failure) = &run.failure {
        println!("{:<12} {} ({})", "Failed", failure.message, failure.stage);
    }
    if let Some(line) = &run.hosts_line {
        println!("{:<12} {}", "Hosts entry", line);
    }
    if let Some(location) = &run.ca_certificate {
        println!("{:<12} {}", "Root CA", location);
    }
    println!();
}
