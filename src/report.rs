//! Rendering of a finished run
//!
//! Text mode prints a summary table to stderr so that it never interleaves
//! with the per-iteration lines on stdout; JSON mode returns one document.

use crate::orchestrator::RunResult;
use std::fmt::Write as _;

/// Serialize a run result as pretty-printed JSON
pub fn to_json(result: &RunResult) -> serde_json::Result<String> {
    serde_json::to_string_pretty(result)
}

fn secs(d: Option<std::time::Duration>) -> String {
    match d {
        Some(d) => format!("{:.6}", d.as_secs_f64()),
        None => "-".to_string(),
    }
}

/// Human-readable summary of a run
pub fn format_summary(result: &RunResult) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "threads: {} requested, {} paired, {} started, {} failed (cpus {}, wait {:.3}s)",
        result.threads_requested,
        result.threads_planned,
        result.started.len(),
        result.failures.len(),
        result.affinity,
        result.wait.as_secs_f64()
    );
    let _ = writeln!(out, "thread policy  prio   released    first start   finished      cpu");
    let _ = writeln!(out, "------ ------ ----- ------------ ------------ ------------ ----");
    for report in &result.started {
        let cpu = report
            .iterations
            .last()
            .and_then(|it| it.cpu)
            .map(|c| c.to_string())
            .unwrap_or_else(|| "-".to_string());
        let _ = writeln!(
            out,
            "{:>6} {:<6} {:>5} {:>12} {:>12} {:>12} {:>4}",
            report.id,
            report.policy.to_string(),
            report.priority,
            secs(report.released_at),
            secs(report.first_start()),
            secs(report.finished_at()),
            cpu
        );
    }
    for failure in &result.failures {
        let code = failure
            .code
            .map(|c| c.to_string())
            .unwrap_or_else(|| "-".to_string());
        let _ = writeln!(
            out,
            "{:>6} {:<6} {:>5} failed ({}): {}",
            failure.id,
            failure.policy.to_string(),
            failure.priority,
            code,
            failure.message
        );
    }
    if result.aborted_early {
        let _ = writeln!(out, "strict mode: spawn pass stopped at first failure");
    }
    let _ = write!(out, "elapsed {:.6}s", result.elapsed.as_secs_f64());
    out
}

/// Print the summary to stderr
pub fn print_summary(result: &RunResult) {
    eprintln!("{}", format_summary(result));
}
