//! Alerts command - alert listing and attention.

use anyhow::Result;
use clap::{Args, Subcommand, ValueEnum};
use envmon_client::{AlertFilters, AlertLevel, DateRange};

use super::resources::print_alerts;
use super::{Context, or_dash, print_field, print_header, print_stats, print_success};

/// Arguments for the alerts command.
#[derive(Args, Debug)]
pub struct AlertsArgs {
    #[command(subcommand)]
    pub command: AlertsCommand,
}

#[derive(Subcommand, Debug)]
pub enum AlertsCommand {
    /// List alerts
    List {
        /// Only alerts nobody has attended yet
        #[arg(short, long, conflicts_with = "attended")]
        pending: bool,

        /// Only alerts already attended
        #[arg(long)]
        attended: bool,

        /// Only alerts of this severity
        #[arg(short, long, value_enum)]
        level: Option<LevelArg>,

        /// Only alerts of this type
        #[arg(short = 't', long = "type")]
        kind: Option<String>,

        /// Raised on or after this date (YYYY-MM-DD)
        #[arg(long)]
        from: Option<String>,

        /// Raised on or before this date (YYYY-MM-DD)
        #[arg(long)]
        to: Option<String>,
    },

    /// Show a specific alert
    Show {
        /// Alert ID
        id: u64,
    },

    /// Mark an alert as attended by the logged-in user
    Attend {
        /// Alert ID
        id: u64,
    },

    /// Show alert statistics
    Stats {
        /// Start date (YYYY-MM-DD)
        #[arg(long)]
        start: Option<String>,

        /// End date (YYYY-MM-DD)
        #[arg(long)]
        end: Option<String>,
    },
}

/// Alert severity accepted on the command line.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum LevelArg {
    Info,
    Warning,
    Error,
    Critical,
}

impl From<LevelArg> for AlertLevel {
    fn from(arg: LevelArg) -> Self {
        match arg {
            LevelArg::Info => AlertLevel::Info,
            LevelArg::Warning => AlertLevel::Warning,
            LevelArg::Error => AlertLevel::Error,
            LevelArg::Critical => AlertLevel::Critical,
        }
    }
}

/// Build list filters from the command-line flags.
fn filters(
    pending: bool,
    attended: bool,
    level: Option<LevelArg>,
    kind: Option<String>,
    from: Option<String>,
    to: Option<String>,
) -> AlertFilters {
    let attended = match (pending, attended) {
        (true, _) => Some(false),
        (false, true) => Some(true),
        (false, false) => None,
    };
    AlertFilters {
        attended,
        kind,
        level: level.map(Into::into),
        from,
        to,
    }
}

/// Run the alerts command.
pub async fn run(args: AlertsArgs, ctx: &Context) -> Result<()> {
    let api = ctx.client.alerts();

    match args.command {
        AlertsCommand::List {
            pending,
            attended,
            level,
            kind,
            from,
            to,
        } => {
            let filters = filters(pending, attended, level, kind, from, to);
            let alerts = api.list_with_filters(&filters).await?;
            if !ctx.emit_json(&alerts)? {
                print_header(if pending { "Pending Alerts" } else { "Alerts" });
                print_alerts(&alerts);
            }
        }
        AlertsCommand::Show { id } => {
            let alert = api.get(id).await?;
            if ctx.emit_json(&alert)? {
                return Ok(());
            }
            print_header("Alert Details");
            print_field("ID", alert.id);
            print_field("Type", &alert.kind);
            print_field("Level", format!("{:?}", alert.level).to_lowercase());
            print_field("Raised", &alert.raised_at);
            print_field("Description", &alert.description);
            print_field("Attended", alert.attended);
            print_field("Attended by", or_dash(alert.attended_by));
            print_field("Attended at", or_dash(alert.attended_at.as_deref()));
        }
        AlertsCommand::Attend { id } => {
            // The stored identity may be missing if the session predates it.
            let user = match ctx.client.session().current_user() {
                Some(user) => user,
                None => {
                    let user = ctx.client.auth().current_user().await?;
                    ctx.client.session().set_current_user(&user);
                    user
                }
            };
            let alert = api.attend(id, user.id).await?;
            if !ctx.emit_json(&alert)? {
                print_success(format!("Alert {} attended by {}", alert.id, user.username));
            }
        }
        AlertsCommand::Stats { start, end } => {
            let range = DateRange {
                start_date: start,
                end_date: end,
                limit: None,
            };
            let stats = api.stats(&range).await?;
            if ctx.json_output {
                println!("{}", serde_json::to_string_pretty(&stats)?);
            } else {
                print_header("Alert Statistics");
                print_stats(&stats);
            }
        }
    }

    Ok(())
}
