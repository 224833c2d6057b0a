use crate::core::config::AppConfig;
use anyhow::{Context, Result};
use std::path::Path;

const DEFAULT_CONFIG: &str = r#"---
# Every key is optional; the values below are the built-in defaults.
providers:
  coindesk:
    base_url: "https://api.coindesk.com/v1/bpi"
  cryptocompare:
    api_base_url: "https://min-api.cryptocompare.com"
    web_base_url: "https://www.cryptocompare.com"
  coinmarketcap:
    base_url: "https://api.coinmarketcap.com"

polling:
  quote_interval_ms: 10000
  ranking_interval_ms: 600000
  request_timeout_ms: 10000

ranking:
  limit: 10
  convert: "BAM"

# One of BAM, USD, AUD, EUR, CAD
currency: "BAM"
trade_symbol: "BTC"

# Ranking symbol -> metadata symbol, added to MIOTA -> IOT and VERI -> VRM
aliases: {}
"#;

/// Creates a default configuration file at the default location
pub fn setup() -> Result<()> {
    let path = AppConfig::default_config_path()?;
    setup_at_path(path)
}

/// Creates a default configuration file at the specified path
pub fn setup_at_path<P: AsRef<Path>>(path: P) -> Result<()> {
    let path = path.as_ref();

    if path.exists() {
        anyhow::bail!("Configuration file already exists at {}", path.display());
    }

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }

    std::fs::write(path, DEFAULT_CONFIG)
        .with_context(|| format!("Failed to write config file to {}", path.display()))?;

    tracing::info!("Created default configuration at {}", path.display());
    Ok(())
}
