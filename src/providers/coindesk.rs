use super::util::get_json;
use crate::core::error::FetchError;
use crate::core::quote::{CurrencyCode, HistoricalPoint, Quote};
use crate::core::source::{HistoricalSource, SpotPriceSource};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, instrument};

/// CoinDesk Bitcoin Price Index: current and previous-close BTC rates.
pub struct CoindeskProvider {
    base_url: String,
    client: reqwest::Client,
}

impl CoindeskProvider {
    pub fn new(base_url: &str, client: reqwest::Client) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        }
    }
}

#[derive(Debug, Deserialize)]
struct CurrentPriceResponse {
    time: Option<UpdateTime>,
    bpi: HashMap<String, BpiEntry>,
}

#[derive(Debug, Deserialize)]
struct UpdateTime {
    #[serde(rename = "updatedISO")]
    updated_iso: Option<String>,
}

#[derive(Debug, Deserialize)]
struct BpiEntry {
    rate_float: f64,
}

#[derive(Debug, Deserialize)]
struct HistoricalCloseResponse {
    bpi: BTreeMap<String, f64>,
}

#[async_trait]
impl SpotPriceSource for CoindeskProvider {
    #[instrument(name = "CoindeskSpotFetch", skip(self), fields(code = %code))]
    async fn fetch_spot(&self, code: CurrencyCode) -> Result<Quote, FetchError> {
        let url = format!("{}/currentprice/{}.json", self.base_url, code);
        let data: CurrentPriceResponse = get_json(&self.client, &url).await?;

        let entry = data.bpi.get(code.as_str()).ok_or_else(|| {
            FetchError::Permanent(format!("No {code} rate in current price response"))
        })?;

        let as_of = data
            .time
            .and_then(|t| t.updated_iso)
            .and_then(|iso| DateTime::parse_from_rfc3339(&iso).ok())
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(Utc::now);

        debug!(rate = entry.rate_float, "Received spot price");
        Ok(Quote {
            code,
            rate: entry.rate_float,
            as_of,
        })
    }
}

#[async_trait]
impl HistoricalSource for CoindeskProvider {
    #[instrument(name = "CoindeskCloseFetch", skip(self), fields(code = %code))]
    async fn fetch_close(&self, code: CurrencyCode) -> Result<HistoricalPoint, FetchError> {
        let url = format!(
            "{}/historical/close.json?currency={}&for=yesterday",
            self.base_url, code
        );
        let data: HistoricalCloseResponse = get_json(&self.client, &url).await?;

        let (date, close_rate) = data
            .bpi
            .into_iter()
            .next()
            .ok_or_else(|| FetchError::Permanent("Empty historical close response".to_string()))?;

        let date = NaiveDate::parse_from_str(&date, "%Y-%m-%d")
            .map_err(|e| FetchError::Permanent(format!("Invalid close date {date}: {e}")))?;

        Ok(HistoricalPoint { date, close_rate })
    }
}
