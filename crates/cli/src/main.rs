use anyhow::Context;
use clap::{Parser, Subcommand};
use trend_engine_core::ConfigLoader;

mod commands;

use commands::{
    AnglesArgs, BacktestTiersArgs, OutputFormat, ParlayArgs, PickArgs, QueryArgs,
    SignificanceArgs, TeaserArgs,
};

#[derive(Parser)]
#[command(name = "trend-engine")]
#[command(about = "Historical betting trends, situational angles and pick scoring", long_about = None)]
struct Cli {
    /// Config file path
    #[arg(short, long, global = true, default_value = "config/TrendEngine.toml")]
    config: String,

    /// Config profile overlay (config/TrendEngine.{profile}.toml)
    #[arg(long, global = true, env = "TREND_PROFILE")]
    profile: Option<String>,

    /// Output format
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    /// Optional log file path (logs to file instead of stderr)
    #[arg(long, global = true)]
    log_file: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a trend query over historical records
    Query(QueryArgs),
    /// Test a win-loss record against a baseline rate
    Significance(SignificanceArgs),
    /// List situational angles for an upcoming game
    Angles(AnglesArgs),
    /// Score a pick for an upcoming game
    Pick(PickArgs),
    /// Price a parlay and size a stake
    Parlay(ParlayArgs),
    /// Price a two-leg teaser
    Teaser(TeaserArgs),
    /// Backtest confidence tiers on graded history
    BacktestTiers(BacktestTiersArgs),
    /// List the queryable fields
    Fields,
    /// Print the effective configuration
    ShowConfig,
}

fn init_logging(log_file: Option<&str>) -> anyhow::Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    match log_file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("opening log file {path}"))?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::sync::Mutex::new(file))
                .init();
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_file.as_deref())?;

    trend_engine_trends::verify_resolution_table()
        .context("field whitelist and resolution table are out of step")?;

    let config = match &cli.profile {
        Some(profile) => ConfigLoader::load_with_profile(profile)?,
        None => ConfigLoader::load_from(&cli.config)?,
    };
    let format = cli.format;

    match cli.command {
        Commands::Query(args) => commands::run_query(args, &config, format).await?,
        Commands::Significance(args) => commands::run_significance(&args, &config, format)?,
        Commands::Angles(args) => commands::run_angles(args, &config, format).await?,
        Commands::Pick(args) => commands::run_pick(args, &config, format).await?,
        Commands::Parlay(args) => commands::run_parlay(&args, &config, format)?,
        Commands::Teaser(args) => commands::run_teaser(&args, &config, format)?,
        Commands::BacktestTiers(args) => commands::run_backtest_tiers(&args, &config, format)?,
        Commands::Fields => commands::run_fields(format)?,
        Commands::ShowConfig => commands::run_show_config(&config, format)?,
    }

    Ok(())
}
