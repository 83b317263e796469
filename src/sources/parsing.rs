//! Line-oriented helpers for backend listings.

use std::collections::HashMap;

/// Non-blank lines of `output`, after dropping `header` leading lines.
///
/// Lines are not trimmed, so empty trailing tab columns survive on every line.
pub fn data_lines(output: &str, header: usize) -> impl Iterator<Item = &str> {
    output
        .lines()
        .skip_while(|line| line.trim().is_empty())
        .skip(header)
        .filter(|line| !line.trim().is_empty())
}

/// Tab-separated columns. Empty trailing columns are kept.
pub fn tab_columns(line: &str) -> Vec<&str> {
    line.split('\t').collect()
}

/// Whitespace-separated columns.
pub fn whitespace_columns(line: &str) -> Vec<&str> {
    line.split_whitespace().collect()
}

/// Column `index`, or an empty string when the line is short.
pub fn column<'a>(columns: &[&'a str], index: usize) -> &'a str {
    columns.get(index).copied().unwrap_or("")
}

/// `Key: value` pairs, as printed by `pacman -Qi` and `dpkg-query -s`.
///
/// Only the first colon splits. Continuation lines without a key are ignored.
pub fn key_values(output: &str) -> HashMap<String, String> {
    output
        .lines()
        .filter(|line| !line.starts_with(' '))
        .filter_map(|line| line.split_once(':'))
        .map(|(key, value)| (key.trim().to_string(), value.trim().to_string()))
        .collect()
}

/// Upper-cases the first character and lower-cases the rest.
pub fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

/// Splits a dependency field such as `glibc  readline>=8.0` or `libc6 (>= 2.34), zlib1g`.
pub fn dependency_list(field: &str) -> Vec<String> {
    if field.is_empty() || field == "None" {
        return Vec::new();
    }
    if field.contains(',') {
        field
            .split(',')
            .map(|dep| dep.trim().to_string())
            .filter(|dep| !dep.is_empty())
            .collect()
    } else {
        field.split_whitespace().map(str::to_string).collect()
    }
}

/// Formats a byte count with binary units, e.g. `1.50 MiB`.
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KiB", "MiB", "GiB", "TiB"];
    if bytes < 1024 {
        return format!("{bytes} B");
    }
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{value:.2} {}", UNITS[unit])
}
