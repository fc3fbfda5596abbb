//! Readings command - listings, statistics and CSV reports.

use std::path::PathBuf;

use anyhow::{Context as _, Result};
use clap::{Args, Subcommand, ValueEnum};
use envmon_client::api::ReadingsApi;
use envmon_client::{DateRange, ReadingFilters, ReadingQuality};

use super::resources::print_readings;
use super::{Context, print_header, print_stats, print_success};

/// Arguments for the readings command.
#[derive(Args, Debug)]
pub struct ReadingsArgs {
    #[command(subcommand)]
    pub command: ReadingsCommand,
}

#[derive(Subcommand, Debug)]
pub enum ReadingsCommand {
    /// List readings
    List {
        /// Only readings from this sensor
        #[arg(short, long)]
        sensor: Option<u64>,

        /// Start date (YYYY-MM-DD)
        #[arg(long)]
        start: Option<String>,

        /// End date (YYYY-MM-DD)
        #[arg(long)]
        end: Option<String>,

        /// Only readings with this quality grade
        #[arg(short, long, value_enum)]
        quality: Option<QualityArg>,

        /// Maximum readings to return
        #[arg(short, long, default_value = "50")]
        limit: usize,
    },

    /// Show aggregate statistics
    Stats {
        /// Restrict to one sensor
        #[arg(short, long)]
        sensor: Option<u64>,

        /// Start date (YYYY-MM-DD)
        #[arg(long)]
        start: Option<String>,

        /// End date (YYYY-MM-DD)
        #[arg(long)]
        end: Option<String>,
    },

    /// Download a sensor's readings as CSV
    Report {
        /// Sensor ID
        sensor: u64,

        /// Start date (YYYY-MM-DD)
        #[arg(long)]
        start: String,

        /// End date (YYYY-MM-DD)
        #[arg(long)]
        end: String,

        /// Output file (default: reporte_sensor_<id>_<start>_<end>.csv)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

/// Reading quality grade accepted on the command line.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum QualityArg {
    Good,
    Fair,
    Poor,
}

impl From<QualityArg> for ReadingQuality {
    fn from(arg: QualityArg) -> Self {
        match arg {
            QualityArg::Good => ReadingQuality::Good,
            QualityArg::Fair => ReadingQuality::Fair,
            QualityArg::Poor => ReadingQuality::Poor,
        }
    }
}

/// Run the readings command.
pub async fn run(args: ReadingsArgs, ctx: &Context) -> Result<()> {
    let api = ctx.client.readings();

    match args.command {
        ReadingsCommand::List {
            sensor,
            start,
            end,
            quality,
            limit,
        } => {
            let filters = ReadingFilters {
                sensor,
                start_date: start,
                end_date: end,
                quality: quality.map(Into::into),
                limit: Some(limit),
            };
            let readings = api.list_with_filters(&filters).await?;
            if !ctx.emit_json(&readings)? {
                print_header("Readings");
                print_readings(&readings);
            }
        }
        ReadingsCommand::Stats { sensor, start, end } => {
            let range = DateRange {
                start_date: start,
                end_date: end,
                limit: None,
            };
            let stats = api.stats(sensor, &range).await?;
            if ctx.json_output {
                println!("{}", serde_json::to_string_pretty(&stats)?);
            } else {
                print_header("Reading Statistics");
                print_stats(&stats);
            }
        }
        ReadingsCommand::Report {
            sensor,
            start,
            end,
            output,
        } => {
            let bytes = api.download_report(sensor, &start, &end).await?;
            let path = output.unwrap_or_else(|| {
                PathBuf::from(ReadingsApi::report_file_name(sensor, &start, &end))
            });
            std::fs::write(&path, &bytes)
                .with_context(|| format!("Failed to write {}", path.display()))?;

            tracing::debug!(bytes = bytes.len(), path = %path.display(), "Report written");
            if !ctx.emit_json(&serde_json::json!({ "file": path, "bytes": bytes.len() }))? {
                print_success(format!("Report saved to {}", path.display()));
            }
        }
    }

    Ok(())
}
