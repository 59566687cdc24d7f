//! Console styling helpers.
//!
//! Thin wrappers over `colored` so the rest of the code reads as intent
//! (`t::warn(…)`, `t::icon_ok(…)`) instead of color names.

use colored::Colorize;

pub fn print_header(title: &str) {
    let line = "─".repeat(title.chars().count() + 4);
    println!("{}", line.bright_blue());
    println!("  {}", title.bold());
    println!("{}", line.bright_blue());
}

pub fn heading(s: &str) -> String {
    s.bold().underline().to_string()
}

pub fn accent(s: &str) -> String {
    s.cyan().to_string()
}

pub fn accent_bright(s: &str) -> String {
    s.bright_cyan().bold().to_string()
}

pub fn muted(s: &str) -> String {
    s.dimmed().to_string()
}

pub fn info(s: &str) -> String {
    s.blue().to_string()
}

pub fn warn(s: &str) -> String {
    s.yellow().to_string()
}

pub fn error(s: &str) -> String {
    s.red().to_string()
}

pub fn icon_ok(s: &str) -> String {
    format!("{} {}", "✔".green(), s)
}

pub fn icon_warn(s: &str) -> String {
    format!("{} {}", "⚠".yellow(), s)
}
