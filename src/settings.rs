use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::Deserialize;

pub const DEFAULT_ROOT_URL: &str = "https://www.tennis-warehouse.com/TennisRacquets.html";
const CONFIG_FILE: &str = "racquet_harvest";
const ENV_PREFIX: &str = "RACQUET";

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub root_url: String,
    pub store_path: String,
    pub collection: String,
    /// Per-request timeout; 0 disables it.
    pub timeout_secs: u64,
    /// Product pages fetched at once within a brand.
    pub concurrency: usize,
}

impl Settings {
    /// Defaults, then `racquet_harvest.toml` if present, then `RACQUET_*` env vars.
    pub fn load() -> Result<Self> {
        let settings = Config::builder()
            .set_default("root_url", DEFAULT_ROOT_URL)?
            .set_default("store_path", "data/datasets.sqlite")?
            .set_default("collection", "racquets")?
            .set_default("timeout_secs", 30)?
            .set_default("concurrency", 1)?
            .add_source(File::with_name(CONFIG_FILE).required(false))
            .add_source(Environment::with_prefix(ENV_PREFIX))
            .build()
            .context("Failed to read settings")?;

        let mut s: Settings = settings
            .try_deserialize()
            .context("Invalid settings")?;
        s.concurrency = s.concurrency.max(1);
        Ok(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_without_sources() {
        let s = Settings::load().unwrap();
        assert!(s.concurrency >= 1);
        assert!(!s.collection.is_empty());
        assert!(s.root_url.starts_with("http"));
    }
}
