//! `fields` and `show-config` commands.

use anyhow::Result;
use serde::Serialize;
use trend_engine_core::{EngineConfig, Field, FieldKind, WHITELIST_VERSION};

use super::output::{print_json, OutputFormat};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct FieldInfo {
    name: &'static str,
    kind: FieldKind,
    side_relative: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct FieldList {
    version: &'static str,
    fields: Vec<FieldInfo>,
}

fn field_list() -> FieldList {
    FieldList {
        version: WHITELIST_VERSION,
        fields: Field::ALL
            .iter()
            .map(|f| FieldInfo {
                name: f.name(),
                kind: f.kind(),
                side_relative: f.is_side_relative(),
            })
            .collect(),
    }
}

/// Runs the fields command.
///
/// # Errors
/// Returns an error if JSON output fails.
pub fn run_fields(format: OutputFormat) -> Result<()> {
    let list = field_list();
    match format {
        OutputFormat::Json => print_json(&list)?,
        OutputFormat::Text => {
            println!("whitelist {}", list.version);
            for f in &list.fields {
                println!(
                    "  {:<20} {:<8} {}",
                    f.name,
                    format!("{:?}", f.kind).to_lowercase(),
                    if f.side_relative { "side-relative" } else { "" }
                );
            }
        }
    }
    Ok(())
}

/// Runs the show-config command.
///
/// # Errors
/// Returns an error if JSON output fails.
pub fn run_show_config(config: &EngineConfig, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => print_json(config)?,
        OutputFormat::Text => {
            println!("scoring: baseline {:.3}, default weight {:.2}", config.scoring.baseline_rate, config.scoring.default_weight);
            for (key, weight) in &config.scoring.angle_weights {
                println!("  {key:<10} {weight:.2}");
            }
            println!("tiers: table {}", config.tiers.version);
            for rule in &config.tiers.rules {
                println!(
                    "  {} stars  score >= {:.2}  edge >= {:.3}  agreement >= {:.2}  supporting >= {}",
                    rule.stars, rule.min_score, rule.min_edge, rule.min_agreement, rule.min_supporting
                );
            }
            println!(
                "parlay: kelly {} max stake {} correlation {:.2}",
                config.parlay.kelly_fraction,
                config
                    .parlay
                    .max_stake
                    .map_or_else(|| "none".to_string(), |s| s.to_string()),
                config.parlay.same_game_correlation
            );
            println!(
                "teaser: {} points, +{:.2} probability, payout {:+}",
                config.teaser.points, config.teaser.probability_boost, config.teaser.payout_odds
            );
            println!("cache: rating ttl {}s", config.cache.rating_ttl_secs);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_list_covers_whitelist() {
        let list = field_list();
        assert_eq!(list.fields.len(), Field::ALL.len());
        assert!(list.fields.iter().any(|f| f.name == "isPrimetime"));
        let spread = list.fields.iter().find(|f| f.name == "spread").unwrap();
        assert!(spread.side_relative);
        assert_eq!(spread.kind, FieldKind::Numeric);
    }
}
