//! Console output for query results.

use colored::Colorize;
use serde::Serialize;

/// List results show at most this many items.
pub const PREVIEW_LIMIT: usize = 5;

/// Render a list result under a labelled banner.
pub fn format_results<T: Serialize>(label: &str, items: &[T]) -> String {
    format!(
        "--- {label} ---\n{}\n--- End {label} ---",
        results_body(items)
    )
}

/// Render a single value (document, count, outcome) under a labelled banner.
pub fn format_value<T: Serialize>(label: &str, value: &T) -> String {
    format!("--- {label} ---\n{}\n--- End {label} ---", to_json(value))
}

/// Print a list result to stdout.
pub fn print_results<T: Serialize>(label: &str, items: &[T]) {
    print_block(label, &results_body(items));
}

/// Print a single value to stdout.
pub fn print_value<T: Serialize>(label: &str, value: &T) {
    print_block(label, &to_json(value));
}

fn print_block(label: &str, body: &str) {
    println!("\n{}", format!("--- {label} ---").cyan().bold());
    println!("{body}");
    println!("{}", format!("--- End {label} ---").dimmed());
}

fn results_body<T: Serialize>(items: &[T]) -> String {
    let shown = &items[..items.len().min(PREVIEW_LIMIT)];
    let mut body = format!("Found {} items:\n{}", items.len(), to_json(&shown));
    if items.len() > PREVIEW_LIMIT {
        body.push_str("\n... more items exist");
    }
    body
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|e| format!("<unprintable: {e}>"))
}
