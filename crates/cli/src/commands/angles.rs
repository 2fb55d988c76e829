//! `angles` and `pick` commands.

use anyhow::{anyhow, Result};
use clap::{Args, ValueEnum};
use trend_engine_core::{EngineConfig, GameRecord, Sport, SportConfig};
use trend_engine_data::RecordScope;
use trend_engine_picks::{score_pick, PickDecision, PickSide, PickType, ScoringContext};
use trend_engine_trends::{angles_for, SituationalAngle};

use super::output::{pct, print_json, OutputFormat};
use super::records::{load_records, RecordArgs};

#[derive(Args, Debug, Clone)]
pub struct GameArgs {
    #[command(flatten)]
    pub source: RecordArgs,

    /// League (NFL, NBA, MLB, NHL, NCAAF, NCAAB)
    #[arg(long)]
    pub sport: Sport,

    /// Id of the upcoming game
    #[arg(long)]
    pub game: String,
}

#[derive(Args, Debug, Clone)]
pub struct AnglesArgs {
    #[command(flatten)]
    pub target: GameArgs,

    /// Hide angles whose strength is noise
    #[arg(long)]
    pub significant_only: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum MarketArg {
    Spread,
    Total,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SideArg {
    Home,
    Away,
    Over,
    Under,
}

impl From<SideArg> for PickSide {
    fn from(side: SideArg) -> Self {
        match side {
            SideArg::Home => Self::Home,
            SideArg::Away => Self::Away,
            SideArg::Over => Self::Over,
            SideArg::Under => Self::Under,
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct PickArgs {
    #[command(flatten)]
    pub target: GameArgs,

    #[arg(long, value_enum, default_value_t = MarketArg::Spread)]
    pub market: MarketArg,

    /// Side to score; both sides are scored when omitted
    #[arg(long, value_enum)]
    pub side: Option<SideArg>,

    /// Line to use instead of the game's (home spread or total)
    #[arg(long, allow_hyphen_values = true)]
    pub line: Option<f64>,
}

/// Loads the sport's history and evaluates the angle catalog for one game.
async fn game_angles(
    target: &GameArgs,
    config: &EngineConfig,
) -> Result<(GameRecord, Vec<SituationalAngle>)> {
    let records = load_records(&target.source, config, &RecordScope::new(target.sport)).await?;
    let upcoming = records
        .iter()
        .find(|r| r.id == target.game)
        .cloned()
        .ok_or_else(|| anyhow!("game {} not found in {} records", target.game, target.sport))?;

    let angles = angles_for(
        &upcoming,
        &records,
        &SportConfig::for_sport(target.sport),
        config.scoring.baseline_rate,
    )?;
    Ok((upcoming, angles))
}

fn print_angle(angle: &SituationalAngle) {
    println!(
        "  {:<28} {:<8} {}-{}-{}  {:>6}  {:<15} p={:.4}  {}",
        angle.id,
        format!("{:?}", angle.favors),
        angle.record.wins,
        angle.record.losses,
        angle.record.pushes,
        pct(angle.rate),
        angle.significance.strength.label(),
        angle.significance.p_value,
        angle.description
    );
}

/// Runs the angles command.
///
/// # Errors
/// Returns an error if records cannot be loaded or the game is unknown.
pub async fn run_angles(args: AnglesArgs, config: &EngineConfig, format: OutputFormat) -> Result<()> {
    let (upcoming, mut angles) = game_angles(&args.target, config).await?;
    if args.significant_only {
        angles.retain(|a| a.significance.strength.multiplier() > 0.0);
    }

    match format {
        OutputFormat::Json => print_json(&angles)?,
        OutputFormat::Text => {
            println!(
                "{} {} @ {} ({}): {} angles",
                upcoming.date,
                upcoming.away_team,
                upcoming.home_team,
                upcoming.id,
                angles.len()
            );
            for angle in &angles {
                print_angle(angle);
            }
        }
    }
    Ok(())
}

/// Runs the pick command.
///
/// # Errors
/// Returns an error if records cannot be loaded, the game is unknown or the
/// tier table is invalid.
pub async fn run_pick(args: PickArgs, config: &EngineConfig, format: OutputFormat) -> Result<()> {
    let (upcoming, angles) = game_angles(&args.target, config).await?;

    let pick_type = match args.market {
        MarketArg::Spread => PickType::Spread,
        MarketArg::Total => PickType::OverUnder,
    };
    let mut ctx = ScoringContext::for_game(&upcoming, pick_type);
    if let Some(side) = args.side {
        let side = PickSide::from(side);
        if !pick_type.sides().contains(&side) {
            return Err(anyhow!("side {side} does not apply to a {:?} pick", pick_type));
        }
        ctx = ctx.with_side(side);
    }
    if let Some(line) = args.line {
        ctx = ctx.with_line(line);
    }

    let decision = score_pick(&angles, &ctx, &config.scoring, &config.tiers)?;
    match format {
        OutputFormat::Json => print_json(&decision)?,
        OutputFormat::Text => match &decision {
            PickDecision::Pick(pick) => {
                println!("{}", pick.headline);
                println!(
                    "score {:.2}  edge {:.3}  agreement {:.2}  table {}",
                    pick.trend_score, pick.edge, pick.agreement, pick.rule_table_version
                );
                for r in &pick.reasoning {
                    println!(
                        "  {:+.2}  {:<28} w={:.2} {:<15} {}-{}-{}",
                        r.contribution,
                        r.angle_id,
                        r.weight,
                        r.strength.label(),
                        r.wins,
                        r.losses,
                        r.pushes
                    );
                }
            }
            PickDecision::NoPick(no) => {
                println!(
                    "no pick for {} ({:?}, score {:.2})",
                    no.game_id, no.reason, no.trend_score
                );
            }
        },
    }
    Ok(())
}
