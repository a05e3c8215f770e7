//! Terminal rendering of events and snapshots.

use std::path::Path;

use anyhow::{Context, Result};
use serde_json::json;
use upload_tracker::{
    format_file_size, Rejection, Snapshot, SnapshotSummary, UploadPhase, UploadProgressEvent,
};

use crate::cli::OutputFormat;

pub(crate) fn print_unreadable(path: &Path, err: &std::io::Error) {
    eprintln!("skipped {}: {err}", path.display());
}

pub(crate) fn print_rejections(rejections: &[Rejection], format: OutputFormat) -> Result<()> {
    for rejection in rejections {
        match format {
            OutputFormat::Json => {
                let line = json!({ "rejected": rejection });
                println!("{line}");
            }
            OutputFormat::Table => println!(
                "rejected   {} ({}): {}",
                rejection.name,
                format_file_size(rejection.size_bytes),
                rejection.reason
            ),
        }
    }
    Ok(())
}

pub(crate) fn print_event(event: &UploadProgressEvent, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            let text = serde_json::to_string(event).context("failed to format event as JSON")?;
            println!("{text}");
        }
        OutputFormat::Table => {
            let detail = match (&event.phase, &event.error) {
                (UploadPhase::Failed, Some(error)) => format!("{}: {error}", event.message),
                _ => event.message.clone(),
            };
            println!(
                "{:<10} {:>3}%  {}  {}",
                event.phase.to_string().to_lowercase(),
                event.progress,
                event.filename,
                detail
            );
        }
    }
    Ok(())
}

pub(crate) fn print_snapshot(snapshot: &Snapshot, format: OutputFormat) -> Result<()> {
    let summary = snapshot.summary();
    match format {
        OutputFormat::Json => {
            let text = serde_json::to_string_pretty(&json!({
                "records": snapshot.records,
                "summary": summary,
            }))
            .context("failed to format snapshot as JSON")?;
            println!("{text}");
        }
        OutputFormat::Table => {
            println!();
            println!("{:<10} {:>4} {:>12}  NAME", "STATUS", "PROG", "SIZE");
            for record in &snapshot.records {
                let progress = format!("{}%", record.progress);
                println!(
                    "{:<10} {:>4} {:>12}  {}",
                    record.status.label(),
                    progress,
                    format_file_size(record.size_bytes),
                    record.name
                );
                if let Some(error) = &record.error {
                    println!("{:<29}{error}", "");
                }
            }
            println!("{}", summary_line(&summary));
        }
    }
    Ok(())
}

fn summary_line(summary: &SnapshotSummary) -> String {
    let mut line = format!(
        "{} file(s): {} succeeded, {} failed",
        summary.total, summary.succeeded, summary.failed
    );
    let active = summary.pending + summary.uploading;
    if active > 0 {
        line.push_str(&format!(", {active} unfinished"));
    }
    line
}
