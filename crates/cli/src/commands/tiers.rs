//! `backtest-tiers` command.

use anyhow::Result;
use clap::Args;
use trend_engine_core::{EngineConfig, RuleTable};
use trend_engine_picks::{replay, validate_holdout, HistoricalSample, TierBacktest};

use super::output::{pct, print_json, read_json_arg, OutputFormat};

#[derive(Args, Debug, Clone)]
pub struct BacktestTiersArgs {
    /// Graded samples as a JSON array of {gameId, season, inputs, result}, or @path
    #[arg(long)]
    pub samples: String,

    /// Candidate rule table as JSON or @path (defaults to the configured table)
    #[arg(long)]
    pub table: Option<String>,

    /// Season held out to validate the table
    #[arg(long)]
    pub holdout_season: Option<i32>,
}

fn print_report(title: &str, report: &TierBacktest) {
    println!("{title} (table {})", report.version);
    for tier in &report.tiers {
        let ci = tier.confidence_interval.map_or_else(
            || "n/a".to_string(),
            |(lo, hi)| format!("{}..{}", pct(Some(lo)), pct(Some(hi))),
        );
        println!(
            "  {} stars  {}-{}-{}  {:>6}  CI {ci}",
            tier.stars,
            tier.wins,
            tier.losses,
            tier.pushes,
            pct(tier.win_rate)
        );
    }
    println!("  no pick {}  skipped {}", report.no_pick, report.skipped);
    for v in &report.violations {
        println!(
            "  VIOLATION: {} stars {} below {} stars {}",
            v.higher,
            pct(Some(v.higher_rate)),
            v.lower,
            pct(Some(v.lower_rate))
        );
    }
}

/// Runs the backtest-tiers command.
///
/// # Errors
/// Returns an error for malformed samples or an invalid rule table.
pub fn run_backtest_tiers(
    args: &BacktestTiersArgs,
    config: &EngineConfig,
    format: OutputFormat,
) -> Result<()> {
    let samples: Vec<HistoricalSample> = read_json_arg(&args.samples)?;
    let table: RuleTable = match &args.table {
        Some(arg) => read_json_arg(arg)?,
        None => config.tiers.clone(),
    };

    match args.holdout_season {
        Some(season) => {
            let result = validate_holdout(&samples, &table, season)?;
            match format {
                OutputFormat::Json => print_json(&result)?,
                OutputFormat::Text => {
                    print_report("calibration seasons", &result.calibration);
                    print_report(&format!("held-out season {season}"), &result.holdout);
                    println!("{}", if result.passed { "PASSED" } else { "FAILED" });
                }
            }
        }
        None => {
            let report = replay(&samples, &table)?;
            match format {
                OutputFormat::Json => print_json(&report)?,
                OutputFormat::Text => print_report("all seasons", &report),
            }
        }
    }
    Ok(())
}
