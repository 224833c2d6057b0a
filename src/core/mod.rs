//! Core business logic abstractions

pub mod alias;
pub mod config;
pub mod error;
pub mod format;
pub mod log;
pub mod quote;
pub mod source;

// Re-export main types for cleaner imports
pub use alias::AliasTable;
pub use error::{FetchError, ParseError, UnknownSymbol};
pub use quote::{AssetMetadata, CurrencyCode, HistoricalPoint, Quote, RankingEntry};
pub use source::{HistoricalSource, MetadataSource, MetadataTable, RankingSource, SpotPriceSource};
