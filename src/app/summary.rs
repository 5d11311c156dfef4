use std::time::Duration;

use loadrunner::args::OutputFormat;
use loadrunner::error::AppResult;
use loadrunner::runner::RunSummary;

pub(crate) fn print_summary(summary: &RunSummary, format: OutputFormat) -> AppResult<()> {
    match format {
        OutputFormat::Text => {
            println!();
            for line in summary_lines(summary) {
                println!("{}", line);
            }
        }
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(summary)?),
    }
    Ok(())
}

pub(crate) fn summary_lines(summary: &RunSummary) -> Vec<String> {
    let mut lines = vec![
        "==== Summary ====".to_owned(),
        format!("Elapsed: {}", format_elapsed(summary.elapsed)),
        format!("Success: {}", summary.success),
        format!("Failed : {}", summary.failure),
        format!("Total  : {}", summary.total),
        format!("Success Rate : {:.2}%", summary.success_rate),
        format!("Requests/sec: {:.2}", summary.requests_per_second),
    ];
    if summary.was_cancelled() {
        lines.push("Run was stopped before all requests were sent.".to_owned());
    }

    if !summary.sample_errors.is_empty() {
        lines.push("-- First few errors --".to_owned());
        lines.extend(summary.sample_errors.iter().cloned());
        if summary.error_overflow_count > 0 {
            lines.push(format!("...and {} more", summary.error_overflow_count));
        }
    }
    lines
}

/// `H:MM:SS.mmm`
pub(crate) fn format_elapsed(elapsed: Duration) -> String {
    let total_secs = elapsed.as_secs();
    format!(
        "{}:{:02}:{:02}.{:03}",
        total_secs / 3600,
        (total_secs / 60) % 60,
        total_secs % 60,
        elapsed.subsec_millis()
    )
}
