// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! CLI output formatting with colors and styling.
//!
//! Respects NO_COLOR and FORCE_COLOR environment variables.
//! Colors are automatically disabled when output is piped.

use colored::{ColoredString, Colorize};
use tickco_rt::{TaskInfo, TaskState};

/// Initialize color support based on environment.
/// Call once at startup.
pub fn init() {
    // colored handles NO_COLOR itself; FORCE_COLOR is ours
    if std::env::var("NO_COLOR").is_ok() {
        colored::control::set_override(false);
    } else if std::env::var("FORCE_COLOR").is_ok() {
        colored::control::set_override(true);
    }
}

// === Error Output ===

pub fn error_label() -> ColoredString {
    "error".red().bold()
}

pub fn hint_label() -> ColoredString {
    "hint".cyan()
}

pub fn hint_text(msg: &str) -> ColoredString {
    msg.dimmed()
}

// === Banners ===

pub fn banner_ok(phase: &str, detail: &str) -> String {
    format!(
        "{} {} {}",
        "===".dimmed(),
        format!("{} OK: {}", phase, detail).green().bold(),
        "===".dimmed()
    )
}

pub fn banner_stopped(phase: &str, detail: &str) -> String {
    format!(
        "{} {} {}",
        "===".dimmed(),
        format!("{} STOPPED: {}", phase, detail).yellow().bold(),
        "===".dimmed()
    )
}

// === Help Output ===

pub fn title(name: &str) -> ColoredString {
    name.bold()
}

pub fn version(v: &str) -> ColoredString {
    v.dimmed()
}

pub fn section_header(header: &str) -> ColoredString {
    header.yellow().bold()
}

pub fn command(name: &str) -> ColoredString {
    name.green()
}

pub fn arg(name: &str) -> ColoredString {
    name.cyan()
}

pub fn separator(width: usize) -> ColoredString {
    "─".repeat(width).dimmed()
}

// === Task Status ===

pub fn task_state(state: TaskState) -> ColoredString {
    let text = state.to_string();
    match state {
        TaskState::Running => text.green(),
        TaskState::Completed => text.normal(),
        TaskState::Stopped | TaskState::Abandoned => text.yellow(),
        TaskState::Failed => text.red().bold(),
    }
}

/// One status row: id, label, wait, state, owner.
pub fn task_row(info: &TaskInfo) -> String {
    let label = info.label.as_deref().unwrap_or(info.origin);
    format!(
        "  {:<8} {:<22} {:<10} {:<10} {}",
        info.id.to_string().bold(),
        label,
        info.wait.cyan(),
        task_state(info.state),
        info.owner_name.dimmed()
    )
}

pub fn live_count(n: usize) -> ColoredString {
    match n {
        0 => "no live tasks".dimmed(),
        1 => "1 live task".normal(),
        n => format!("{} live tasks", n).normal(),
    }
}
