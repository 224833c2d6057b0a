//! Top-assets list merged with per-asset logo metadata.
//!
//! Ranking and metadata refresh independently and may be out of sync, so rows
//! resolve their logo lazily and tolerate [`UnknownSymbol`].

use crate::core::alias::AliasTable;
use crate::core::error::{FetchError, UnknownSymbol};
use crate::core::format::format_currency;
use crate::core::quote::{CurrencyCode, RankingEntry};
use crate::core::source::{MetadataSource, MetadataTable, RankingSource};
use crate::scheduler::Liveness;
use crate::view::PendingRefresh;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard};
use tokio::sync::watch;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trend {
    Positive,
    Negative,
}

impl Trend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Trend::Positive => "positive",
            Trend::Negative => "negative",
        }
    }
}

/// Strictly greater than zero is positive; zero counts as negative.
pub fn trend_color(value: f64) -> Trend {
    if value > 0.0 {
        Trend::Positive
    } else {
        Trend::Negative
    }
}

#[derive(Debug, Clone)]
pub struct MarketRow {
    pub rank: u32,
    pub symbol: String,
    pub name: String,
    pub price: String,
    pub percent_change_1h: Option<f64>,
    pub percent_change_24h: Option<f64>,
    pub percent_change_7d: Option<f64>,
    pub logo: Result<String, UnknownSymbol>,
}

#[derive(Default)]
struct MarketState {
    metadata: Option<MetadataTable>,
    ranking: Vec<RankingEntry>,
}

pub struct MarketListViewModel {
    metadata_source: Arc<dyn MetadataSource>,
    ranking_source: Arc<dyn RankingSource>,
    aliases: AliasTable,
    limit: usize,
    convert: CurrencyCode,
    state: RwLock<MarketState>,
    pending: AtomicUsize,
    revision: watch::Sender<u64>,
}

impl MarketListViewModel {
    pub fn new(
        metadata_source: Arc<dyn MetadataSource>,
        ranking_source: Arc<dyn RankingSource>,
        aliases: AliasTable,
        limit: usize,
        convert: CurrencyCode,
    ) -> Self {
        let (revision, _) = watch::channel(0);
        Self {
            metadata_source,
            ranking_source,
            aliases,
            limit,
            convert,
            state: RwLock::new(MarketState::default()),
            pending: AtomicUsize::new(0),
            revision,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.revision.subscribe()
    }

    fn read(&self) -> RwLockReadGuard<'_, MarketState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn update<R>(&self, f: impl FnOnce(&mut MarketState) -> R) -> R {
        let result = {
            let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
            f(&mut state)
        };
        self.notify();
        result
    }

    fn notify(&self) {
        self.revision.send_modify(|rev| *rev += 1);
    }

    /// Replaces the metadata table wholesale. A failure keeps the previous table.
    pub async fn refresh_metadata(&self, liveness: &Liveness) -> Result<(), FetchError> {
        let result = self.metadata_source.fetch_metadata().await;
        if !liveness.is_alive() {
            debug!("Discarding asset metadata after stop");
            return Ok(());
        }
        let table = result?;
        self.update(|s| s.metadata = Some(table));
        Ok(())
    }

    /// Replaces the ranking wholesale. A failure keeps the previous ranking.
    pub async fn refresh_ranking(&self, liveness: &Liveness) -> Result<(), FetchError> {
        let pending = PendingRefresh::begin(&self.pending);
        self.notify();
        let result = self
            .ranking_source
            .fetch_ranking(self.limit, self.convert)
            .await;
        drop(pending);
        if !liveness.is_alive() {
            debug!("Discarding market ranking after stop");
            return Ok(());
        }
        match result {
            Ok(entries) => {
                self.update(|s| s.ranking = entries);
                Ok(())
            }
            Err(e) => {
                self.notify();
                Err(e)
            }
        }
    }

    /// One market-list cycle: metadata first while it has never loaded, then ranking.
    /// A metadata failure does not hold back the ranking; the next cycle retries it.
    pub async fn refresh(&self, liveness: &Liveness) -> Result<(), FetchError> {
        if !self.has_metadata() {
            if let Err(e) = self.refresh_metadata(liveness).await {
                warn!(
                    transient = e.is_transient(),
                    error = %e,
                    "Asset metadata unavailable, logos will use placeholders"
                );
            }
        }
        self.refresh_ranking(liveness).await
    }

    pub fn has_metadata(&self) -> bool {
        self.read().metadata.is_some()
    }

    pub fn is_loading(&self) -> bool {
        self.pending.load(Ordering::Acquire) > 0
    }

    pub fn convert_currency(&self) -> CurrencyCode {
        self.convert
    }

    pub fn ranking(&self) -> Vec<RankingEntry> {
        self.read().ranking.clone()
    }

    /// Logo URL for a ranking symbol, looked up under its canonical metadata symbol.
    pub fn resolve_logo(&self, symbol: &str) -> Result<String, UnknownSymbol> {
        let state = self.read();
        self.lookup_logo(&state, symbol)
    }

    fn lookup_logo(&self, state: &MarketState, symbol: &str) -> Result<String, UnknownSymbol> {
        let canonical = self.aliases.canonicalize(symbol);
        state
            .metadata
            .as_ref()
            .and_then(|table| table.get(canonical))
            .map(|meta| meta.image_url.clone())
            .ok_or_else(|| UnknownSymbol(symbol.to_string()))
    }

    pub fn rows(&self) -> Vec<MarketRow> {
        let state = self.read();
        state
            .ranking
            .iter()
            .map(|entry| MarketRow {
                rank: entry.rank,
                symbol: entry.symbol.clone(),
                name: entry.name.clone(),
                price: format_currency(entry.price_in_base_currency, self.convert),
                percent_change_1h: entry.percent_change_1h,
                percent_change_24h: entry.percent_change_24h,
                percent_change_7d: entry.percent_change_7d,
                logo: self.lookup_logo(&state, &entry.symbol),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FixedMetadata, FixedRanking, ranking_entry};
    use std::collections::HashMap;
    use std::sync::atomic::Ordering;

    fn view_model(
        metadata: Arc<FixedMetadata>,
        ranking: Arc<FixedRanking>,
    ) -> MarketListViewModel {
        MarketListViewModel::new(
            metadata,
            ranking,
            AliasTable::default(),
            10,
            CurrencyCode::Bam,
        )
    }

    #[test]
    fn test_trend_color_boundary() {
        assert_eq!(trend_color(0.0), Trend::Negative);
        assert_eq!(trend_color(0.0001), Trend::Positive);
        assert_eq!(trend_color(-3.5), Trend::Negative);
        assert_eq!(trend_color(f64::NAN), Trend::Negative);
        assert_eq!(trend_color(12.0).as_str(), "positive");
        assert_eq!(trend_color(-0.0).as_str(), "negative");
    }

    #[tokio::test]
    async fn test_resolve_logo_through_aliases() {
        let vm = view_model(
            Arc::new(FixedMetadata::symbols(&["BTC", "IOT", "VRM"])),
            Arc::new(FixedRanking::symbols(&["BTC"])),
        );
        vm.refresh_metadata(&Liveness::new()).await.unwrap();

        assert_eq!(vm.resolve_logo("MIOTA").unwrap(), "https://img.test/iot.png");
        assert_eq!(vm.resolve_logo("VERI").unwrap(), "https://img.test/vrm.png");
        assert_eq!(vm.resolve_logo("BTC").unwrap(), "https://img.test/btc.png");
        assert_eq!(
            vm.resolve_logo("DOGE"),
            Err(UnknownSymbol("DOGE".to_string()))
        );
    }

    #[tokio::test]
    async fn test_configured_alias() {
        let vm = MarketListViewModel::new(
            Arc::new(FixedMetadata::symbols(&["BCH"])),
            Arc::new(FixedRanking::symbols(&[])),
            AliasTable::with_overrides(&HashMap::from([("BCC".to_string(), "BCH".to_string())])),
            10,
            CurrencyCode::Bam,
        );
        vm.refresh_metadata(&Liveness::new()).await.unwrap();
        assert!(vm.resolve_logo("BCC").is_ok());
    }

    #[test]
    fn test_resolve_logo_before_metadata_loads() {
        let vm = view_model(
            Arc::new(FixedMetadata::symbols(&["BTC"])),
            Arc::new(FixedRanking::symbols(&["BTC"])),
        );
        assert!(vm.resolve_logo("BTC").is_err());
    }

    #[tokio::test]
    async fn test_rows_tolerate_missing_metadata() {
        let metadata = Arc::new(FixedMetadata::failing());
        let ranking = Arc::new(FixedRanking::symbols(&["BTC", "MIOTA"]));
        let vm = view_model(Arc::clone(&metadata), Arc::clone(&ranking));

        vm.refresh(&Liveness::new()).await.unwrap();

        let rows = vm.rows();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].symbol, "BTC");
        assert_eq!(rows[0].price, "BAM\u{a0}100.00");
        assert!(rows.iter().all(|row| row.logo.is_err()));
        assert!(!vm.has_metadata());
    }

    #[tokio::test]
    async fn test_metadata_loads_once_and_heals() {
        let metadata = Arc::new(FixedMetadata::failing());
        let ranking = Arc::new(FixedRanking::symbols(&["BTC", "MIOTA"]));
        let vm = view_model(Arc::clone(&metadata), Arc::clone(&ranking));

        vm.refresh(&Liveness::new()).await.unwrap();
        assert_eq!(metadata.calls.load(Ordering::SeqCst), 1);

        *metadata.table.lock().unwrap() = FixedMetadata::symbols(&["BTC", "IOT"])
            .table
            .into_inner()
            .unwrap();
        vm.refresh(&Liveness::new()).await.unwrap();
        vm.refresh(&Liveness::new()).await.unwrap();

        assert_eq!(metadata.calls.load(Ordering::SeqCst), 2);
        assert_eq!(ranking.calls.load(Ordering::SeqCst), 3);
        let rows = vm.rows();
        assert_eq!(rows[1].logo.as_deref(), Ok("https://img.test/iot.png"));
    }

    #[tokio::test]
    async fn test_failed_ranking_keeps_previous_rows() {
        let ranking = Arc::new(FixedRanking::symbols(&["BTC", "ETH"]));
        let vm = view_model(
            Arc::new(FixedMetadata::symbols(&["BTC"])),
            Arc::clone(&ranking),
        );
        vm.refresh(&Liveness::new()).await.unwrap();

        ranking.set(Err(FetchError::Permanent("unexpected schema".into())));
        let err = vm.refresh(&Liveness::new()).await.unwrap_err();
        assert!(!err.is_transient());
        assert_eq!(vm.rows().len(), 2);
        assert!(!vm.is_loading());

        ranking.set(Ok(vec![ranking_entry("XRP", 1, 0.0)]));
        vm.refresh(&Liveness::new()).await.unwrap();
        let rows = vm.rows();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].symbol, "XRP");
        assert_eq!(trend_color(rows[0].percent_change_24h.unwrap()), Trend::Negative);
    }

    #[tokio::test]
    async fn test_revoked_liveness_discards_ranking() {
        let vm = view_model(
            Arc::new(FixedMetadata::symbols(&["BTC"])),
            Arc::new(FixedRanking::symbols(&["BTC"])),
        );
        let liveness = Liveness::new();
        liveness.revoke();

        vm.refresh(&liveness).await.unwrap();
        assert!(vm.rows().is_empty());
        assert!(!vm.has_metadata());
        assert!(!vm.is_loading());
    }
}
