use crate::config::EngineConfig;
use anyhow::{Context, Result};
use figment::{
    providers::{Env, Format, Json, Serialized, Toml},
    Figment,
};
use std::path::Path;

pub const DEFAULT_CONFIG_PATH: &str = "config/TrendEngine.toml";

pub struct ConfigLoader;

impl ConfigLoader {
    fn base(path: &Path) -> Figment {
        Figment::from(Serialized::defaults(EngineConfig::default())).merge(Toml::file(path))
    }

    fn finish(figment: Figment) -> Result<EngineConfig> {
        let config: EngineConfig = figment
            .merge(Env::prefixed("TREND_").split("__"))
            .join(Json::file("config/TrendEngine.json"))
            .extract()
            .context("failed to load engine configuration")?;

        config.validate()?;
        tracing::info!(
            tier_table = %config.tiers.version,
            angle_weights = config.scoring.angle_weights.len(),
            "loaded engine configuration"
        );
        Ok(config)
    }

    /// Loads configuration by merging defaults, the TOML file, environment
    /// variables (`TREND_` prefix, `__` nesting) and an optional JSON file.
    ///
    /// # Errors
    ///
    /// Returns an error if a file cannot be parsed or a value is out of range.
    pub fn load() -> Result<EngineConfig> {
        Self::load_from(DEFAULT_CONFIG_PATH)
    }

    /// Same as [`ConfigLoader::load`] with a caller-supplied TOML path.
    ///
    /// # Errors
    ///
    /// Returns an error if a file cannot be parsed or a value is out of range.
    pub fn load_from(path: impl AsRef<Path>) -> Result<EngineConfig> {
        Self::finish(Self::base(path.as_ref()))
    }

    /// Loads configuration with a profile overlay (`config/TrendEngine.{profile}.toml`).
    ///
    /// # Errors
    ///
    /// Returns an error if a file cannot be parsed or a value is out of range.
    pub fn load_with_profile(profile: &str) -> Result<EngineConfig> {
        let figment = Self::base(Path::new(DEFAULT_CONFIG_PATH))
            .merge(Toml::file(format!("config/TrendEngine.{profile}.toml")));
        Self::finish(figment)
    }
}
