mod campaign;
mod ranking;

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "placerank")]
#[command(about = "Keyword ranking history and contact messaging for place listings")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Which day a chart window ends on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum WindowAnchor {
    /// Today's date (UTC)
    Today,
    /// The newest crawl date in the input
    Latest,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Print the dense leaderboard for the newest crawl date
    Leaderboard {
        /// JSON file with an array of ranking records
        #[arg(long)]
        input: PathBuf,
        /// Keyword to use when the input mixes several keywords
        #[arg(long)]
        keyword: Option<String>,
    },
    /// Print the per-date rank and metrics series
    Chart {
        /// JSON file with an array of ranking records
        #[arg(long)]
        input: PathBuf,
        /// Place to chart; every record is charted when omitted or unmatched
        #[arg(long)]
        place_id: Option<String>,
        /// Keyword to use when the input mixes several keywords
        #[arg(long)]
        keyword: Option<String>,
        /// Window length in days (defaults to PLACERANK_CHART_WINDOW_DAYS)
        #[arg(long, conflicts_with = "all_history")]
        window_days: Option<u32>,
        /// Chart every crawled date instead of a trailing window
        #[arg(long)]
        all_history: bool,
        /// Day the window ends on
        #[arg(long, value_enum, default_value = "today")]
        anchor: WindowAnchor,
    },
    /// Compare the newest point with the point N entries back
    Compare {
        /// JSON file with an array of ranking records
        #[arg(long)]
        input: PathBuf,
        /// How many series entries to look back
        #[arg(long)]
        days_ago: usize,
        #[arg(long)]
        place_id: Option<String>,
        #[arg(long)]
        keyword: Option<String>,
    },
    /// Run a friend-add and message campaign from a YAML plan
    Campaign {
        /// YAML file with the template and contacts
        #[arg(long)]
        plan: PathBuf,
        /// Validate and render the plan without calling the backend
        #[arg(long)]
        dry_run: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    dotenvy::dotenv().ok();
    let config = placerank_core::load_app_config_from_env()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Some(Commands::Leaderboard { input, keyword }) => {
            ranking::run_leaderboard(&input, keyword.as_deref())?;
        }
        Some(Commands::Chart {
            input,
            place_id,
            keyword,
            window_days,
            all_history,
            anchor,
        }) => {
            let window = if all_history {
                ranking::WindowRequest::AllHistory
            } else {
                ranking::WindowRequest::Trailing {
                    days: window_days.unwrap_or(config.chart_window_days),
                    anchor,
                }
            };
            ranking::run_chart(&input, keyword.as_deref(), place_id.as_deref(), window)?;
        }
        Some(Commands::Compare {
            input,
            days_ago,
            place_id,
            keyword,
        }) => {
            ranking::run_compare(&input, keyword.as_deref(), place_id.as_deref(), days_ago)?;
        }
        Some(Commands::Campaign { plan, dry_run }) => {
            campaign::run_campaign_command(&config, &plan, dry_run).await?;
        }
        None => println!("placerank: pass a subcommand, or --help for usage"),
    }

    Ok(())
}
