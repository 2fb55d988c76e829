//! `query` and `significance` commands.

use anyhow::Result;
use clap::Args;
use serde::Serialize;
use trend_engine_core::{compute_significance, EngineConfig, SignificanceResult, TrendQuery};
use trend_engine_data::RecordScope;
use trend_engine_trends::{evaluate_query, Market, MatchedGame, TrendSummary};

use super::output::{bucket_line, print_json, read_json_arg, significance_line, OutputFormat};
use super::records::{load_records, RecordArgs};

#[derive(Args, Debug, Clone)]
pub struct QueryArgs {
    #[command(flatten)]
    pub source: RecordArgs,

    /// Trend query as JSON, or @path to a JSON file
    #[arg(long)]
    pub query: String,

    /// Include the matched games
    #[arg(long)]
    pub games: bool,

    /// Baseline rate for significance (defaults to scoring.baseline_rate)
    #[arg(long)]
    pub baseline: Option<f64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct MarketSignificance {
    straight_up: SignificanceResult,
    ats: SignificanceResult,
    over_under: SignificanceResult,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct QueryReport {
    summary: TrendSummary,
    significance: MarketSignificance,
    scanned: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    games: Option<Vec<MatchedGame>>,
}

/// Runs the query command.
///
/// # Errors
/// Returns an error for an invalid query or a failing record source.
pub async fn run_query(args: QueryArgs, config: &EngineConfig, format: OutputFormat) -> Result<()> {
    let query: TrendQuery = read_json_arg(&args.query)?;
    let baseline = args.baseline.unwrap_or(config.scoring.baseline_rate);

    // Team scope is applied by the evaluator so opponents' schedules stay whole.
    let scope = RecordScope {
        team: None,
        ..RecordScope::for_query(&query)
    };
    let records = load_records(&args.source, config, &scope).await?;
    let result = evaluate_query(&query, &records);

    let summary = &result.summary;
    let significance = MarketSignificance {
        straight_up: summary.significance(Market::StraightUp, baseline)?,
        ats: summary.significance(Market::Ats, baseline)?,
        over_under: summary.significance(Market::OverUnder, baseline)?,
    };

    match format {
        OutputFormat::Json => print_json(&QueryReport {
            summary: result.summary.clone(),
            significance,
            scanned: result.scanned,
            games: args.games.then(|| result.games.clone()),
        })?,
        OutputFormat::Text => {
            println!(
                "{} games ({} scanned), perspective {:?}",
                summary.games, result.scanned, summary.perspective
            );
            println!("{}  {}", bucket_line("SU", &summary.straight_up), significance_line(&significance.straight_up));
            println!("{}  {}", bucket_line("ATS", &summary.ats), significance_line(&significance.ats));
            println!("{}  {}", bucket_line("O/U", &summary.over_under), significance_line(&significance.over_under));
            if let Some(m) = summary.average_margin {
                println!("avg margin {m:+.1}");
            }
            if let Some(p) = summary.average_total_points {
                println!("avg total  {p:.1}");
            }
            if args.games {
                println!();
                for g in &result.games {
                    println!(
                        "{}  {}  {} vs {}  {}-{}",
                        g.record.date,
                        g.record.id,
                        g.team,
                        g.record.team(g.side.opposite()),
                        g.record.score(g.side).map_or_else(|| "-".to_string(), |s| s.to_string()),
                        g.record
                            .score(g.side.opposite())
                            .map_or_else(|| "-".to_string(), |s| s.to_string()),
                    );
                }
            }
        }
    }
    Ok(())
}

#[derive(Args, Debug, Clone)]
pub struct SignificanceArgs {
    #[arg(long)]
    pub wins: u32,

    #[arg(long)]
    pub losses: u32,

    /// Baseline rate (defaults to scoring.baseline_rate)
    #[arg(long)]
    pub baseline: Option<f64>,
}

/// Runs the significance command.
///
/// # Errors
/// Returns an error for a baseline outside (0, 1).
pub fn run_significance(
    args: &SignificanceArgs,
    config: &EngineConfig,
    format: OutputFormat,
) -> Result<()> {
    let baseline = args.baseline.unwrap_or(config.scoring.baseline_rate);
    let sig = compute_significance(args.wins, args.losses, baseline)?;
    match format {
        OutputFormat::Json => print_json(&sig)?,
        OutputFormat::Text => println!(
            "{}-{} vs {:.3}: {}",
            args.wins,
            args.losses,
            baseline,
            significance_line(&sig)
        ),
    }
    Ok(())
}
