//! `parlay` and `teaser` commands.

use anyhow::Result;
use clap::Args;
use rust_decimal::Decimal;
use trend_engine_core::{EngineConfig, Sport, SportConfig, TeaserConfig};
use trend_engine_parlay::{analyze_parlay, analyze_teaser, ParlayLeg, TeaserLeg};

use super::output::{pct, print_json, read_json_arg, OutputFormat};

#[derive(Args, Debug, Clone)]
pub struct ParlayArgs {
    /// Legs as a JSON array of {odds, modelProb, impliedProb?, gameId?}, or @path
    #[arg(long)]
    pub legs: String,

    /// Bankroll the stake is sized against
    #[arg(long)]
    pub bankroll: Decimal,
}

/// Runs the parlay command.
///
/// # Errors
/// Returns an error for malformed legs or a rejected parlay.
pub fn run_parlay(args: &ParlayArgs, config: &EngineConfig, format: OutputFormat) -> Result<()> {
    let legs: Vec<ParlayLeg> = read_json_arg(&args.legs)?;
    let analysis = analyze_parlay(&legs, args.bankroll, &config.parlay)?;

    match format {
        OutputFormat::Json => print_json(&analysis)?,
        OutputFormat::Text => {
            println!(
                "{}-leg parlay at {:+} (decimal {:.3})",
                analysis.legs, analysis.american_odds, analysis.decimal_odds
            );
            println!(
                "joint {}  book {}  edge {:+.2}%",
                pct(Some(analysis.true_joint_prob)),
                pct(Some(analysis.book_implied_prob)),
                analysis.edge * 100.0
            );
            if analysis.same_game_pairs > 0 {
                println!(
                    "{} same-game pair(s), correlation {:.2}",
                    analysis.same_game_pairs, analysis.correlation
                );
            }
            println!(
                "EV {:+.4}  Kelly {:.4}  stake {} ({:?})",
                analysis.expected_value,
                analysis.kelly_fraction,
                analysis.recommended_stake,
                analysis.bet.reason
            );
        }
    }
    Ok(())
}

#[derive(Args, Debug, Clone)]
pub struct TeaserArgs {
    /// Legs as a JSON array of {line, modelProb, description?}, or @path
    #[arg(long)]
    pub legs: String,

    /// League whose standard teaser points and key numbers apply
    #[arg(long)]
    pub sport: Option<Sport>,

    /// Teaser points (overrides sport and config)
    #[arg(long)]
    pub points: Option<f64>,
}

fn teaser_config(args: &TeaserArgs, config: &EngineConfig) -> TeaserConfig {
    let mut teaser = config.teaser.clone();
    if let Some(sport) = args.sport {
        let sport = SportConfig::for_sport(sport);
        if let Some(points) = sport.teaser_points {
            teaser.points = points;
        }
        teaser.key_numbers = sport.key_numbers;
    }
    if let Some(points) = args.points {
        teaser.points = points;
    }
    teaser
}

/// Runs the teaser command.
///
/// # Errors
/// Returns an error for malformed legs or a rejected teaser.
pub fn run_teaser(args: &TeaserArgs, config: &EngineConfig, format: OutputFormat) -> Result<()> {
    let legs: Vec<TeaserLeg> = read_json_arg(&args.legs)?;
    let analysis = analyze_teaser(&legs, &teaser_config(args, config))?;

    match format {
        OutputFormat::Json => print_json(&analysis)?,
        OutputFormat::Text => {
            println!("{}-point teaser at {:+}", analysis.points, analysis.payout_odds);
            for leg in &analysis.legs {
                let keys = if leg.crossed_key_numbers.is_empty() {
                    String::new()
                } else {
                    format!(
                        "  crosses {:?}",
                        leg.crossed_key_numbers
                    )
                };
                println!(
                    "  {}  {:+} -> {:+}  {} -> {}{keys}",
                    leg.description.as_deref().unwrap_or("leg"),
                    leg.original_line,
                    leg.teased_line,
                    pct(Some(leg.original_prob)),
                    pct(Some(leg.teased_prob)),
                );
            }
            println!(
                "joint {} -> {}  EV {:+.4}  {}",
                pct(Some(analysis.original_joint_prob)),
                pct(Some(analysis.teased_joint_prob)),
                analysis.expected_value,
                analysis.rating
            );
        }
    }
    Ok(())
}
