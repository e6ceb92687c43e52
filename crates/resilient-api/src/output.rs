//! Terminal output utilities

use std::sync::atomic::{AtomicBool, Ordering};

use console::style;
use resilient_api_client::CleanupReport;
use resilient_api_core::PollOutcome;

static QUIET: AtomicBool = AtomicBool::new(false);

/// Silence everything except errors
pub fn set_quiet(quiet: bool) {
    QUIET.store(quiet, Ordering::Relaxed);
}

fn quiet() -> bool {
    QUIET.load(Ordering::Relaxed)
}

/// Print a success message
pub fn success(msg: &str) {
    if quiet() {
        return;
    }
    println!("{} {}", style("✓").green().bold(), msg);
}

/// Print an error message
pub fn error(msg: &str) {
    eprintln!("{} {}", style("✗").red().bold(), msg);
}

/// Print a warning message
pub fn warning(msg: &str) {
    if quiet() {
        return;
    }
    eprintln!("{} {}", style("⚠").yellow().bold(), msg);
}

/// Print an info message
pub fn info(msg: &str) {
    if quiet() {
        return;
    }
    println!("{} {}", style("ℹ").blue().bold(), msg);
}

/// Print a header
pub fn header(msg: &str) {
    if quiet() {
        return;
    }
    println!("\n{}", style(msg).bold().underlined());
}

/// Print a key-value pair
pub fn kv(key: &str, value: &str) {
    if quiet() {
        return;
    }
    println!("  {}: {}", style(key).dim(), value);
}

/// Print one line per deletion outcome
pub fn deletion(user_id: &str, outcome: PollOutcome) {
    let polls = outcome.polls();
    match outcome {
        PollOutcome::Confirmed { .. } => {
            success(&format!("{user_id} deleted (confirmed after {polls} polls)"))
        }
        PollOutcome::Assumed { .. } => {
            warning(&format!("{user_id} assumed deleted after {polls} inconclusive polls"))
        }
        PollOutcome::Unverified { .. } => {
            error(&format!("{user_id} still visible after {polls} polls"))
        }
        PollOutcome::Cancelled { .. } => warning(&format!("{user_id} deletion check cancelled")),
    }
}

/// Summarize a cleanup purge
pub fn cleanup(report: &CleanupReport) {
    kv("Deleted", &report.deleted.len().to_string());
    if !report.unverified.is_empty() {
        kv("Unverified", &report.unverified.join(", "));
    }
    for (user_id, message) in &report.failed {
        error(&format!("cleanup of {user_id} failed: {message}"));
    }
}
