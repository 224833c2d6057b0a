use super::util::{get_json, lenient_f64};
use crate::core::error::FetchError;
use crate::core::quote::{CurrencyCode, RankingEntry};
use crate::core::source::RankingSource;
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use tracing::{debug, instrument};

/// CoinMarketCap v1 ticker: top assets by market cap.
pub struct CoinMarketCapProvider {
    base_url: String,
    client: reqwest::Client,
}

impl CoinMarketCapProvider {
    pub fn new(base_url: &str, client: reqwest::Client) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        }
    }
}

#[derive(Debug, Deserialize)]
struct TickerEntry {
    name: String,
    symbol: String,
    #[serde(default, deserialize_with = "lenient_f64")]
    rank: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    percent_change_1h: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    percent_change_24h: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    percent_change_7d: Option<f64>,
    // price_<convert> is keyed by the requested currency
    #[serde(flatten)]
    extra: HashMap<String, serde_json::Value>,
}

fn converted_price(entry: &TickerEntry, convert: CurrencyCode) -> Option<f64> {
    let key = format!("price_{}", convert.as_str().to_lowercase());
    match entry.extra.get(&key)? {
        serde_json::Value::String(s) => s.trim().parse().ok(),
        serde_json::Value::Number(n) => n.as_f64(),
        _ => None,
    }
}

#[async_trait]
impl RankingSource for CoinMarketCapProvider {
    #[instrument(name = "CoinMarketCapTicker", skip(self), fields(convert = %convert))]
    async fn fetch_ranking(
        &self,
        limit: usize,
        convert: CurrencyCode,
    ) -> Result<Vec<RankingEntry>, FetchError> {
        let url = format!(
            "{}/v1/ticker/?convert={}&limit={}",
            self.base_url, convert, limit
        );
        let tickers: Vec<TickerEntry> = get_json(&self.client, &url).await?;

        let mut entries = tickers
            .into_iter()
            .enumerate()
            .map(|(position, ticker)| {
                let price = converted_price(&ticker, convert).ok_or_else(|| {
                    FetchError::Permanent(format!(
                        "No {convert} price for {} in ticker response",
                        ticker.symbol
                    ))
                })?;
                Ok(RankingEntry {
                    rank: ticker.rank.map_or(position as u32 + 1, |r| r as u32),
                    symbol: ticker.symbol,
                    name: ticker.name,
                    price_in_base_currency: price,
                    percent_change_1h: ticker.percent_change_1h,
                    percent_change_24h: ticker.percent_change_24h,
                    percent_change_7d: ticker.percent_change_7d,
                })
            })
            .collect::<Result<Vec<_>, FetchError>>()?;

        entries.sort_by_key(|e| e.rank);
        debug!(entries = entries.len(), "Received market ranking");
        Ok(entries)
    }
}
