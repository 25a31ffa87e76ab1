//! CLI entry point for the overspeed rater.
//!
//! Provides subcommands for running a full violation analysis over a
//! telemetry export and for inspecting the two optional reference datasets
//! (home-signal definitions and the crew roster).

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use overspeed_rater::{
    crew::CrewIndex,
    engine,
    fetch::{BasicClient, fetch_bytes},
    output::{append_record, append_records, print_json, print_pretty, write_json},
    parser::parse_records,
    record::Record,
    report::{build_report, run_record},
    signals::SignalIndex,
};
use std::ffi::OsStr;
use std::path::Path;
use tracing::{debug, info};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "overspeed_rater")]
#[command(about = "Detects speed-limit violations in railway telemetry", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze a telemetry CSV for speed-limit violations
    Analyze {
        /// Telemetry CSV: path to file or URL to fetch
        #[arg(value_name = "FILE_OR_URL")]
        telemetry: String,

        /// Optional home-signal definition CSV (file or URL)
        #[arg(long)]
        signals: Option<String>,

        /// Optional crew roster CSV (file or URL)
        #[arg(long)]
        crew: Option<String>,

        /// Write the JSON report here instead of stdout
        #[arg(short, long)]
        output: Option<String>,

        /// CSV file to append map-marker rows to
        #[arg(long)]
        markers: Option<String>,

        /// CSV file to append a one-line run summary to
        #[arg(long)]
        run_log: Option<String>,

        /// Leaderboard depth for top trains/stations
        #[arg(long, default_value_t = 3)]
        top: usize,
    },
    /// Load a home-signal definition CSV and list the resulting index
    Signals {
        /// Path to file or URL to fetch
        #[arg(value_name = "FILE_OR_URL")]
        source: String,
    },
    /// Load a crew roster CSV and list duty counts per lookup key
    Crew {
        /// Path to file or URL to fetch
        #[arg(value_name = "FILE_OR_URL")]
        source: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/overspeed_rater.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("overspeed_rater.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse().unwrap()));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse().unwrap()));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Analyze {
            telemetry,
            signals,
            crew,
            output,
            markers,
            run_log,
            top,
        } => {
            analyze(telemetry, signals, crew, output, markers, run_log, top).await?;
        }
        Commands::Signals { source } => {
            let rows = load_dataset(&source).await?;
            let index = SignalIndex::build(&rows);

            let mut entries: Vec<_> = index.iter().collect();
            entries.sort_by_key(|(key, _)| key.to_string());
            for (key, sig) in entries {
                info!(
                    key,
                    latitude = sig.latitude,
                    longitude = sig.longitude,
                    "Home signal"
                );
            }
            info!(
                rows = rows.len(),
                entries = index.len(),
                "Signal reference index summary"
            );
        }
        Commands::Crew { source } => {
            let rows = load_dataset(&source).await?;
            let index = CrewIndex::build(&rows);

            let mut trains: Vec<_> = index.train_keys().collect();
            trains.sort();
            for (train, duties) in trains {
                info!(train, duties, "Roster train key");
            }
            let mut locos: Vec<_> = index.loco_keys().collect();
            locos.sort();
            for (loco, duties) in locos {
                info!(loco, duties, "Roster loco key");
            }
            info!(rows = rows.len(), "Crew roster index summary");
        }
    }

    Ok(())
}

/// Runs the full pipeline: build both optional indices, fold the telemetry,
/// emit the report and any requested side outputs.
#[tracing::instrument(skip_all, fields(telemetry = %telemetry))]
async fn analyze(
    telemetry: String,
    signals: Option<String>,
    crew: Option<String>,
    output: Option<String>,
    markers: Option<String>,
    run_log: Option<String>,
    top: usize,
) -> Result<()> {
    let telemetry_rows = load_dataset(&telemetry)
        .await
        .with_context(|| format!("telemetry dataset {telemetry} could not be loaded"))?;
    info!(rows = telemetry_rows.len(), "Telemetry loaded");

    // Both indices must be in place before the scan starts; an absent file
    // just means an empty index and every lookup misses.
    let signal_index = match &signals {
        Some(source) => {
            let rows = load_dataset(source).await?;
            let index = SignalIndex::build(&rows);
            info!(entries = index.len(), "Signal reference index loaded");
            index
        }
        None => SignalIndex::empty(),
    };

    let crew_index = match &crew {
        Some(source) => {
            let rows = load_dataset(source).await?;
            let index = CrewIndex::build(&rows);
            info!("Crew roster index loaded");
            index
        }
        None => CrewIndex::empty(),
    };

    let result = engine::run(&telemetry_rows, &signal_index, &crew_index);
    let report = build_report(result, top);
    print_pretty(&report);

    info!(
        passenger_violations = report.passenger.summary.violation_count,
        goods_violations = report.goods.summary.violation_count,
        max_passenger_speed = report.passenger.summary.max_speed,
        max_goods_speed = report.goods.summary.max_speed,
        "Analysis complete"
    );

    if let Some(path) = &markers {
        append_records(path, &report.markers)?;
        info!(path = %path, count = report.markers.len(), "Markers exported");
    }

    if let Some(path) = &run_log {
        append_record(path, &run_record(&report))?;
    }

    match &output {
        Some(path) => write_json(path, &report)?,
        None => print_json(&report)?,
    }

    Ok(())
}

/// Loads and decodes a dataset from a local file path or over HTTP.
#[tracing::instrument(fields(source = %source))]
async fn load_dataset(source: &str) -> Result<Vec<Record>> {
    let bytes = if source.starts_with("http") {
        let client = BasicClient::new();
        fetch_bytes(&client, source).await?
    } else {
        tokio::fs::read(source).await?
    };
    debug!(bytes = bytes.len(), "Dataset bytes read, decoding");
    parse_records(&bytes)
}
