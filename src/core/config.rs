use crate::core::quote::CurrencyCode;
use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;
use std::{fs, path::PathBuf};
use tracing::debug;

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct CoindeskProviderConfig {
    pub base_url: String,
}

impl Default for CoindeskProviderConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.coindesk.com/v1/bpi".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct CryptoCompareProviderConfig {
    pub api_base_url: String,
    /// Site that `ImageUrl` paths are relative to.
    pub web_base_url: String,
}

impl Default for CryptoCompareProviderConfig {
    fn default() -> Self {
        Self {
            api_base_url: "https://min-api.cryptocompare.com".to_string(),
            web_base_url: "https://www.cryptocompare.com".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct CoinMarketCapProviderConfig {
    pub base_url: String,
}

impl Default for CoinMarketCapProviderConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.coinmarketcap.com".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
#[serde(default)]
pub struct ProvidersConfig {
    pub coindesk: CoindeskProviderConfig,
    pub cryptocompare: CryptoCompareProviderConfig,
    pub coinmarketcap: CoinMarketCapProviderConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct PollingConfig {
    pub quote_interval_ms: u64,
    pub ranking_interval_ms: u64,
    pub request_timeout_ms: u64,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            quote_interval_ms: 10_000,
            ranking_interval_ms: 10 * 60 * 1000,
            request_timeout_ms: 10_000,
        }
    }
}

impl PollingConfig {
    pub fn quote_interval(&self) -> Duration {
        Duration::from_millis(self.quote_interval_ms)
    }

    pub fn ranking_interval(&self) -> Duration {
        Duration::from_millis(self.ranking_interval_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct RankingConfig {
    pub limit: usize,
    pub convert: CurrencyCode,
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            limit: 10,
            convert: CurrencyCode::Bam,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct AppConfig {
    pub providers: ProvidersConfig,
    pub polling: PollingConfig,
    pub ranking: RankingConfig,
    pub currency: CurrencyCode,
    pub trade_symbol: String,
    /// Ranking symbol -> metadata symbol, merged over the built-in aliases.
    pub aliases: HashMap<String, String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            providers: ProvidersConfig::default(),
            polling: PollingConfig::default(),
            ranking: RankingConfig::default(),
            currency: CurrencyCode::default(),
            trade_symbol: "BTC".to_string(),
            aliases: HashMap::new(),
        }
    }
}

impl AppConfig {
    /// Loads the default config file, falling back to built-in defaults when it does not exist.
    pub fn load() -> Result<Self> {
        debug!("Loading default config");
        let config_path = Self::default_config_path()?;
        if !config_path.exists() {
            debug!("No config at {}, using defaults", config_path.display());
            return Ok(Self::default());
        }
        Self::load_from_path(&config_path)
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("dev", "coinwatch", "coinwatch")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.config_dir().join("config.yaml"))
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Self = serde_yaml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        debug!("Successfully loaded config");
        Ok(config)
    }
}
