use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand};
use impactlens_lib::commands::report::{
    get_activity_scores, get_combined_view, get_developer_activity, get_transaction_trends,
    run_full_report,
};
use impactlens_lib::commands::settings::{get_settings, save_settings, SettingsOverrides};
use impactlens_lib::models::activity_score::ScoringMode;
use impactlens_lib::models::combined::CombinedJoin;
use serde::Serialize;
use serde_json::Value;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    match cli.command {
        Command::Report(args) => {
            let (dir, overrides) = args.into_parts()?;
            print_json(&run_full_report(dir, overrides).await.map_err(|e| anyhow!(e))?)
        }
        Command::Scores(args) => {
            let (dir, overrides) = args.into_parts()?;
            print_json(&get_activity_scores(dir, overrides).await.map_err(|e| anyhow!(e))?)
        }
        Command::Trends(args) => {
            let (dir, overrides) = args.into_parts()?;
            print_json(&get_transaction_trends(dir, overrides).await.map_err(|e| anyhow!(e))?)
        }
        Command::Combined(args) => {
            let (dir, overrides) = args.into_parts()?;
            print_json(&get_combined_view(dir, overrides).await.map_err(|e| anyhow!(e))?)
        }
        Command::Developers(args) => {
            let (dir, overrides) = args.into_parts()?;
            print_json(&get_developer_activity(dir, overrides).await.map_err(|e| anyhow!(e))?)
        }
        Command::Settings(SettingsCommand::Show { data_dir }) => {
            print_json(&get_settings(data_dir).await.map_err(|e| anyhow!(e))?)
        }
        Command::Settings(SettingsCommand::Set { data_dir, json }) => {
            let patch: Value = serde_json::from_str(&json).context("--json must be a JSON object")?;
            print_json(&save_settings(data_dir, patch).await.map_err(|e| anyhow!(e))?)
        }
    }
}

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Development activity scores and transaction trends from snapshot CSVs"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Build the full report: scores, trends, developer series, combined view and highlights.
    Report(RunArgs),
    /// Development Activity Index per project, ranked.
    Scores(RunArgs),
    /// Before/after cutoff transaction counts per project.
    Trends(RunArgs),
    /// Scores joined with transaction trends and grantee labels.
    Combined(RunArgs),
    /// Active developer time series summary per project.
    Developers(RunArgs),
    /// Inspect or update `.impactlens/settings.json`.
    #[command(subcommand)]
    Settings(SettingsCommand),
}

#[derive(Args)]
struct RunArgs {
    /// Directory holding the snapshot CSV files.
    #[arg(long, default_value = "data")]
    data_dir: String,
    /// Cutoff instant separating the before/after windows (RFC 3339).
    #[arg(long)]
    cutoff: Option<String>,
    /// Scoring mode: `normalized` or `legacy`.
    #[arg(long)]
    mode: Option<String>,
    /// Combined view join: `metrics-left`, `grantees-left` or `outer`.
    #[arg(long)]
    join: Option<String>,
    /// Number of projects listed in each highlight.
    #[arg(long)]
    top: Option<usize>,
}

impl RunArgs {
    fn into_parts(self) -> Result<(String, SettingsOverrides)> {
        let cutoff = self
            .cutoff
            .as_deref()
            .map(|raw| {
                DateTime::parse_from_rfc3339(raw)
                    .map(|ts| ts.with_timezone(&Utc))
                    .with_context(|| format!("--cutoff {raw:?} is not an RFC 3339 instant"))
            })
            .transpose()?;
        let scoring_mode = self
            .mode
            .as_deref()
            .map(|raw| ScoringMode::parse(raw).ok_or_else(|| anyhow!("unknown --mode {raw:?}")))
            .transpose()?;
        let combined_join = self
            .join
            .as_deref()
            .map(|raw| CombinedJoin::parse(raw).ok_or_else(|| anyhow!("unknown --join {raw:?}")))
            .transpose()?;

        Ok((
            self.data_dir,
            SettingsOverrides {
                scoring_mode,
                cutoff,
                combined_join,
                top_n: self.top,
            },
        ))
    }
}

#[derive(Subcommand)]
enum SettingsCommand {
    /// Print the effective settings (defaults when no file exists).
    Show {
        #[arg(long, default_value = "data")]
        data_dir: String,
    },
    /// Merge a partial JSON object into the settings file.
    Set {
        #[arg(long, default_value = "data")]
        data_dir: String,
        #[arg(long)]
        json: String,
    },
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
