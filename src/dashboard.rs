//! Wires quote sources, view models and the poll scheduler together.

use crate::core::config::{AppConfig, PollingConfig};
use crate::core::error::{FetchError, ParseError};
use crate::core::{AliasTable, CurrencyCode};
use crate::providers::{self, CoinMarketCapProvider, CoindeskProvider, CryptoCompareProvider};
use crate::scheduler::{Liveness, PollScheduler, SourceId};
use crate::view::{ConversionViewModel, MarketListViewModel};
use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

pub struct Dashboard {
    pub conversion: Arc<ConversionViewModel>,
    pub market: Arc<MarketListViewModel>,
    scheduler: PollScheduler,
    quote_interval: Duration,
    ranking_interval: Duration,
}

impl Dashboard {
    pub fn new(
        conversion: Arc<ConversionViewModel>,
        market: Arc<MarketListViewModel>,
        polling: &PollingConfig,
    ) -> Self {
        Self {
            conversion,
            market,
            scheduler: PollScheduler::new(),
            quote_interval: polling.quote_interval(),
            ranking_interval: polling.ranking_interval(),
        }
    }

    /// Builds the HTTP-backed sources described by `config`.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let client = providers::util::http_client(config.polling.request_timeout())?;
        let coindesk = Arc::new(CoindeskProvider::new(
            &config.providers.coindesk.base_url,
            client.clone(),
        ));
        let cryptocompare = Arc::new(CryptoCompareProvider::new(
            &config.providers.cryptocompare.api_base_url,
            &config.providers.cryptocompare.web_base_url,
            client.clone(),
        ));
        let coinmarketcap = Arc::new(CoinMarketCapProvider::new(
            &config.providers.coinmarketcap.base_url,
            client,
        ));

        let conversion = Arc::new(ConversionViewModel::new(
            Arc::clone(&coindesk) as _,
            coindesk,
            config.currency,
            &config.trade_symbol,
        ));
        let market = Arc::new(MarketListViewModel::new(
            cryptocompare,
            coinmarketcap,
            AliasTable::with_overrides(&config.aliases),
            config.ranking.limit,
            config.ranking.convert,
        ));

        Ok(Self::new(conversion, market, &config.polling))
    }

    /// Starts both poll cycles; each fires once immediately.
    pub fn start(&self) {
        let conversion = Arc::clone(&self.conversion);
        self.scheduler
            .start(SourceId::Conversion, self.quote_interval, move |liveness| {
                let conversion = Arc::clone(&conversion);
                async move { conversion.refresh(&liveness).await }
            });

        let market = Arc::clone(&self.market);
        self.scheduler
            .start(SourceId::MarketList, self.ranking_interval, move |liveness| {
                let market = Arc::clone(&market);
                async move { market.refresh(&liveness).await }
            });
    }

    /// Stops polling. Responses still in flight are discarded.
    pub fn stop(&self) {
        self.scheduler.stop_all();
    }

    pub fn is_polling(&self) -> bool {
        self.scheduler.is_running(SourceId::Conversion)
            || self.scheduler.is_running(SourceId::MarketList)
    }

    /// Selects a currency and refreshes right away instead of waiting for the next tick.
    pub fn set_currency(&self, code: CurrencyCode) {
        self.conversion.set_currency(code);
        if !self.scheduler.trigger(SourceId::Conversion) {
            debug!(currency = %code, "Refresh already in flight, next tick picks up the currency");
        }
    }

    pub fn set_amount(&self, raw: &str) -> Result<f64, ParseError> {
        self.conversion.set_amount(raw)
    }

    pub fn toggle_inversion(&self) {
        self.conversion.toggle_inversion();
    }

    /// Runs one conversion and one market-list cycle concurrently, outside the scheduler.
    pub async fn refresh_once(&self) -> (Result<(), FetchError>, Result<(), FetchError>) {
        let liveness = Liveness::new();
        tokio::join!(
            self.conversion.refresh(&liveness),
            self.market.refresh(&liveness)
        )
    }
}

impl Drop for Dashboard {
    fn drop(&mut self) {
        self.stop();
    }
}
