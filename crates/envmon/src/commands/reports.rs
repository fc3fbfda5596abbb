//! Reports command - report records and generated report files.

use std::path::PathBuf;

use anyhow::{Context as _, Result};
use clap::{Args, Subcommand, ValueEnum};
use console::Style;
use envmon_client::{GenerateReportRequest, ReportSubject};

use super::{Context, print_empty, print_field, print_header, print_success, truncate};

/// Arguments for the reports command.
#[derive(Args, Debug)]
pub struct ReportsArgs {
    #[command(subcommand)]
    pub command: ReportsCommand,
}

#[derive(Subcommand, Debug)]
pub enum ReportsCommand {
    /// List reports
    List,

    /// Show a report and its sections
    Show {
        /// Report ID
        id: u64,
    },

    /// Delete a report
    Delete {
        /// Report ID
        id: u64,
    },

    /// Generate a report file for a period
    Generate {
        /// What the report covers
        #[arg(short = 't', long = "type", value_enum)]
        subject: SubjectArg,

        /// Start date (YYYY-MM-DD)
        #[arg(long)]
        start: String,

        /// End date (YYYY-MM-DD)
        #[arg(long)]
        end: String,

        /// Output file (default: reporte_<type>_<start>.pdf)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Schedule automatic report generation
    Schedule {
        /// What the report covers
        #[arg(short = 't', long = "type", value_enum)]
        subject: SubjectArg,

        /// How often to generate it (e.g. daily, weekly, monthly)
        #[arg(short, long)]
        frequency: String,
    },
}

/// Report subject accepted on the command line.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum SubjectArg {
    Alerts,
    Sensors,
    Readings,
    Maintenance,
}

impl SubjectArg {
    fn as_str(self) -> &'static str {
        match self {
            SubjectArg::Alerts => "alerts",
            SubjectArg::Sensors => "sensors",
            SubjectArg::Readings => "readings",
            SubjectArg::Maintenance => "maintenance",
        }
    }
}

impl From<SubjectArg> for ReportSubject {
    fn from(arg: SubjectArg) -> Self {
        match arg {
            SubjectArg::Alerts => ReportSubject::Alerts,
            SubjectArg::Sensors => ReportSubject::Sensors,
            SubjectArg::Readings => ReportSubject::Readings,
            SubjectArg::Maintenance => ReportSubject::Maintenance,
        }
    }
}

fn generated_file_name(subject: SubjectArg, start: &str) -> String {
    format!("reporte_{}_{}.pdf", subject.as_str(), start)
}

/// Run the reports command.
pub async fn run(args: ReportsArgs, ctx: &Context) -> Result<()> {
    let api = ctx.client.reports();
    let dim = Style::new().dim();

    match args.command {
        ReportsCommand::List => {
            let reports = api.list().await?;
            if ctx.emit_json(&reports)? {
                return Ok(());
            }
            print_header("Reports");
            if reports.is_empty() {
                print_empty("reports");
            }
            for report in &reports {
                println!(
                    "{} {}  {}",
                    dim.apply_to(format!("[{}]", report.id)),
                    truncate(&report.title, 40),
                    dim.apply_to(format!("{} → {}", report.period_start, report.period_end))
                );
            }
        }
        ReportsCommand::Show { id } => {
            let report = api.get(id).await?;
            if ctx.emit_json(&report)? {
                return Ok(());
            }
            print_header("Report Details");
            print_field("ID", report.id);
            print_field("Title", &report.title);
            print_field("Description", &report.description);
            print_field(
                "Period",
                format!("{} → {}", report.period_start, report.period_end),
            );
            print_field("Generated by", report.generated_by);

            let mut details = report.details.unwrap_or_default();
            if !details.is_empty() {
                println!();
                details.sort_by_key(|d| d.position);
                for detail in &details {
                    println!(
                        "  {} {}",
                        dim.apply_to(format!("{}. {:?}", detail.position, detail.content_type)),
                        truncate(&detail.content, 60)
                    );
                }
            }
        }
        ReportsCommand::Delete { id } => {
            api.delete(id).await?;
            if !ctx.emit_json(&serde_json::json!({ "deleted": id }))? {
                print_success(format!("Report {} deleted", id));
            }
        }
        ReportsCommand::Generate {
            subject,
            start,
            end,
            output,
        } => {
            let request = GenerateReportRequest {
                subject: subject.into(),
                start_date: start.clone(),
                end_date: end,
            };
            let bytes = api.generate(&request).await?;
            let path = output.unwrap_or_else(|| PathBuf::from(generated_file_name(subject, &start)));
            std::fs::write(&path, &bytes)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            tracing::debug!(bytes = bytes.len(), path = %path.display(), "Report written");

            if !ctx.emit_json(&serde_json::json!({ "file": path, "bytes": bytes.len() }))? {
                print_success(format!("Report saved to {}", path.display()));
            }
        }
        ReportsCommand::Schedule { subject, frequency } => {
            let response = api
                .generate_automatic(subject.as_str(), frequency.as_str())
                .await?;
            if !ctx.emit_json(&response)? {
                print_success(format!(
                    "Automatic {} report scheduled ({})",
                    subject.as_str(),
                    frequency
                ));
            }
        }
    }

    Ok(())
}
