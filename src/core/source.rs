//! Quote source abstractions
//!
//! Each trait wraps one remote provider. Results are returned by value so an
//! adapter never has to keep its buffers alive past the call.

use crate::core::error::FetchError;
use crate::core::quote::{AssetMetadata, CurrencyCode, HistoricalPoint, Quote, RankingEntry};
use async_trait::async_trait;
use std::collections::HashMap;

#[async_trait]
pub trait SpotPriceSource: Send + Sync {
    async fn fetch_spot(&self, code: CurrencyCode) -> Result<Quote, FetchError>;
}

#[async_trait]
pub trait HistoricalSource: Send + Sync {
    /// Yesterday's closing rate in `code`.
    async fn fetch_close(&self, code: CurrencyCode) -> Result<HistoricalPoint, FetchError>;
}

/// Known-asset metadata keyed by the provider's symbol.
pub type MetadataTable = HashMap<String, AssetMetadata>;

#[async_trait]
pub trait MetadataSource: Send + Sync {
    async fn fetch_metadata(&self) -> Result<MetadataTable, FetchError>;
}

#[async_trait]
pub trait RankingSource: Send + Sync {
    /// Top `limit` assets priced in `convert`, ordered by provider rank.
    async fn fetch_ranking(
        &self,
        limit: usize,
        convert: CurrencyCode,
    ) -> Result<Vec<RankingEntry>, FetchError>;
}
