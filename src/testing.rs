//! Scripted in-memory sources for unit tests

use crate::core::error::FetchError;
use crate::core::quote::{AssetMetadata, CurrencyCode, HistoricalPoint, Quote, RankingEntry};
use crate::core::source::{
    HistoricalSource, MetadataSource, MetadataTable, RankingSource, SpotPriceSource,
};
use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Answers spot requests from a script of `(delay, rate)` steps, in call order.
#[derive(Default)]
pub struct ScriptedSpot {
    script: Mutex<VecDeque<(Duration, Result<f64, FetchError>)>>,
    pub calls: AtomicUsize,
    pub requested: Mutex<Vec<CurrencyCode>>,
}

impl ScriptedSpot {
    pub fn rates(rates: &[f64]) -> Self {
        let spot = Self::default();
        for rate in rates {
            spot.push(Duration::ZERO, Ok(*rate));
        }
        spot
    }

    pub fn push(&self, delay: Duration, result: Result<f64, FetchError>) {
        self.script.lock().unwrap().push_back((delay, result));
    }
}

#[async_trait]
impl SpotPriceSource for ScriptedSpot {
    async fn fetch_spot(&self, code: CurrencyCode) -> Result<Quote, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requested.lock().unwrap().push(code);
        let step = self.script.lock().unwrap().pop_front();
        let (delay, result) =
            step.unwrap_or((Duration::ZERO, Err(FetchError::Transient("script exhausted".into()))));
        tokio::time::sleep(delay).await;
        result.map(|rate| Quote {
            code,
            rate,
            as_of: Utc::now(),
        })
    }
}

/// Always answers with the configured close (or error), which tests may swap.
pub struct FixedClose {
    pub close: Mutex<Result<f64, FetchError>>,
}

impl FixedClose {
    pub fn new(close: f64) -> Self {
        Self {
            close: Mutex::new(Ok(close)),
        }
    }

    pub fn set(&self, close: Result<f64, FetchError>) {
        *self.close.lock().unwrap() = close;
    }
}

#[async_trait]
impl HistoricalSource for FixedClose {
    async fn fetch_close(&self, _code: CurrencyCode) -> Result<HistoricalPoint, FetchError> {
        let close = self.close.lock().unwrap().clone();
        close.map(|close_rate| HistoricalPoint {
            date: NaiveDate::from_ymd_opt(2018, 1, 3).unwrap(),
            close_rate,
        })
    }
}

pub struct FixedMetadata {
    pub table: Mutex<Result<MetadataTable, FetchError>>,
    pub calls: AtomicUsize,
}

impl FixedMetadata {
    pub fn symbols(symbols: &[&str]) -> Self {
        let table = symbols
            .iter()
            .map(|s| {
                (
                    s.to_string(),
                    AssetMetadata {
                        symbol: s.to_string(),
                        image_url: format!("https://img.test/{}.png", s.to_lowercase()),
                    },
                )
            })
            .collect();
        Self {
            table: Mutex::new(Ok(table)),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            table: Mutex::new(Err(FetchError::Transient("connection refused".into()))),
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl MetadataSource for FixedMetadata {
    async fn fetch_metadata(&self) -> Result<MetadataTable, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.table.lock().unwrap().clone()
    }
}

pub struct FixedRanking {
    pub entries: Mutex<Result<Vec<RankingEntry>, FetchError>>,
    pub calls: AtomicUsize,
}

impl FixedRanking {
    pub fn symbols(symbols: &[&str]) -> Self {
        let entries = symbols
            .iter()
            .enumerate()
            .map(|(i, s)| ranking_entry(s, i as u32 + 1, 1.5))
            .collect();
        Self {
            entries: Mutex::new(Ok(entries)),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn set(&self, entries: Result<Vec<RankingEntry>, FetchError>) {
        *self.entries.lock().unwrap() = entries;
    }
}

#[async_trait]
impl RankingSource for FixedRanking {
    async fn fetch_ranking(
        &self,
        limit: usize,
        _convert: CurrencyCode,
    ) -> Result<Vec<RankingEntry>, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.entries
            .lock()
            .unwrap()
            .clone()
            .map(|entries| entries.into_iter().take(limit).collect())
    }
}

pub fn ranking_entry(symbol: &str, rank: u32, change_24h: f64) -> RankingEntry {
    RankingEntry {
        symbol: symbol.to_string(),
        name: format!("{symbol} coin"),
        price_in_base_currency: 100.0 * rank as f64,
        rank,
        percent_change_1h: Some(-0.1),
        percent_change_24h: Some(change_24h),
        percent_change_7d: None,
    }
}
