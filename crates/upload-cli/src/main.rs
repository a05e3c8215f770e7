mod cli;
mod output;

use std::process;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::sync::broadcast::error::{RecvError, TryRecvError};
use tokio::sync::broadcast::Receiver;
use tracing::{info, warn};

use upload_tracker::config::validate_config;
use upload_tracker::{
    init_logging, load_config, FileHandle, LogFormat, LoggingConfig, TrackerConfig, UploadId,
    UploadProgressEvent, UploadStatus, UploadTracker,
};

use crate::cli::{Cli, OutputFormat};

const EXIT_FAILED: i32 = 1;
const EXIT_USAGE: i32 = 2;
const EXIT_INTERRUPTED: i32 = 130;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(0) => {}
        Ok(code) => process::exit(code),
        Err(err) => {
            eprintln!("error: {err:#}");
            process::exit(EXIT_USAGE);
        }
    }
}

async fn run(cli: Cli) -> Result<i32> {
    init_logging(&LoggingConfig {
        level: "warn".to_string(),
        format: if cli.json_logs {
            LogFormat::Json
        } else {
            LogFormat::Pretty
        },
    })?;

    let config = build_config(&cli)?;

    let mut handles = Vec::with_capacity(cli.files.len());
    let mut unreadable = 0;
    for path in &cli.files {
        match FileHandle::from_path(path) {
            Ok(handle) => handles.push(handle),
            Err(err) => {
                output::print_unreadable(path, &err);
                unreadable += 1;
            }
        }
    }

    let tracker = UploadTracker::simulated(&config);
    let mut events = tracker.subscribe();

    let batch = tracker.start_batch(handles);
    output::print_rejections(&batch.rejected, cli.output)?;

    let mut rounds_left = cli.retries;
    let mut interrupted = false;

    let settled = tracker.wait_until_settled();
    tokio::pin!(settled);

    loop {
        tokio::select! {
            event = events.recv() => match event {
                Ok(event) => output::print_event(&event, cli.output)?,
                Err(RecvError::Lagged(skipped)) => warn!("Skipped {} progress events", skipped),
                Err(RecvError::Closed) => break,
            },
            () = &mut settled => {
                drain(&mut events, cli.output)?;

                let failed = failed_ids(&tracker);
                if rounds_left == 0 || failed.is_empty() {
                    break;
                }
                rounds_left -= 1;

                info!("Retrying {} failed upload(s)", failed.len());
                for id in failed {
                    if tracker.retry(id).is_none() {
                        warn!(upload_id = %id, "Upload could not be retried");
                    }
                }
                settled.set(tracker.wait_until_settled());
            }
            signal = tokio::signal::ctrl_c() => {
                signal.context("failed to listen for Ctrl-C")?;
                interrupted = true;
                break;
            }
        }
    }

    let snapshot = tracker.snapshot();
    output::print_snapshot(&snapshot, cli.output)?;

    let code = if interrupted {
        EXIT_INTERRUPTED
    } else if snapshot.summary().failed > 0 || !batch.rejected.is_empty() || unreadable > 0 {
        EXIT_FAILED
    } else {
        0
    };
    Ok(code)
}

fn build_config(cli: &Cli) -> Result<TrackerConfig> {
    let mut config = match &cli.config {
        Some(path) => load_config(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => TrackerConfig::default(),
    };

    if let Some(rate) = cli.fail_rate {
        config.simulation.failure_rate = rate;
    }
    validate_config(&config)?;

    Ok(config)
}

fn failed_ids(tracker: &UploadTracker) -> Vec<UploadId> {
    tracker
        .snapshot()
        .records
        .iter()
        .filter(|r| r.status == UploadStatus::Failed)
        .map(|r| r.id)
        .collect()
}

/// Prints events already queued when the batch settled.
fn drain(events: &mut Receiver<UploadProgressEvent>, format: OutputFormat) -> Result<()> {
    loop {
        match events.try_recv() {
            Ok(event) => output::print_event(&event, format)?,
            Err(TryRecvError::Lagged(skipped)) => warn!("Skipped {} progress events", skipped),
            Err(TryRecvError::Empty | TryRecvError::Closed) => return Ok(()),
        }
    }
}
