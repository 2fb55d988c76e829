//! Output helpers shared by the commands.

use anyhow::{Context, Result};
use clap::ValueEnum;
use serde::de::DeserializeOwned;
use serde::Serialize;
use trend_engine_core::SignificanceResult;
use trend_engine_trends::Bucket;

/// Output format for command results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Parses an inline JSON argument, or the file named after a leading `@`.
pub fn read_json_arg<T: DeserializeOwned>(arg: &str) -> Result<T> {
    match arg.strip_prefix('@') {
        Some(path) => {
            let text =
                std::fs::read_to_string(path).with_context(|| format!("reading {path}"))?;
            serde_json::from_str(&text).with_context(|| format!("parsing {path}"))
        }
        None => serde_json::from_str(arg).context("parsing inline JSON"),
    }
}

pub fn pct(rate: Option<f64>) -> String {
    rate.map_or_else(|| "n/a".to_string(), |r| format!("{:.1}%", r * 100.0))
}

pub fn bucket_line(label: &str, bucket: &Bucket) -> String {
    format!(
        "{label:<6} {}-{}-{}  ({})",
        bucket.wins,
        bucket.losses,
        bucket.pushes,
        bucket
            .win_pct
            .map_or_else(|| "n/a".to_string(), |p| format!("{p:.1}%"))
    )
}

pub fn significance_line(sig: &SignificanceResult) -> String {
    let ci = sig.confidence_interval.map_or_else(
        || "n/a".to_string(),
        |(lo, hi)| format!("{:.1}%..{:.1}%", lo * 100.0, hi * 100.0),
    );
    format!(
        "{} (n={}, z={:.2}, p={:.4}, 95% CI {ci})",
        sig.label, sig.sample_size, sig.z_score, sig.p_value
    )
}
