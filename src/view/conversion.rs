//! BTC converter state and its derived display strings.
//!
//! Refreshes apply in completion order (last-applied-wins): a slow response
//! issued first still overwrites a faster one issued later. Failed refreshes
//! keep the previous quote and change.

use crate::core::error::{FetchError, ParseError};
use crate::core::format::{NOT_AVAILABLE, format_currency, format_fixed, format_grouped};
use crate::core::quote::{CurrencyCode, Quote};
use crate::core::source::{HistoricalSource, SpotPriceSource};
use crate::scheduler::Liveness;
use crate::view::PendingRefresh;
use chrono::{DateTime, Local};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard};
use tokio::sync::watch;
use tracing::debug;

/// Shown for `change` until both a quote and a previous close are known.
pub const NULL_CHANGE: &str = "null";

#[derive(Debug, Clone)]
pub struct ConversionState {
    pub selected_currency: CurrencyCode,
    pub quote: Option<Quote>,
    /// Percent change of `quote` against the previous close.
    pub change: Option<f64>,
    /// Last valid amount; kept while the input is invalid.
    pub amount_entered: f64,
    pub amount_invalid: bool,
    pub inverted: bool,
    pub updated_at: Option<DateTime<Local>>,
}

impl ConversionState {
    fn new(selected_currency: CurrencyCode) -> Self {
        Self {
            selected_currency,
            quote: None,
            change: None,
            amount_entered: 0.0,
            amount_invalid: false,
            inverted: false,
            updated_at: None,
        }
    }
}

pub struct ConversionViewModel {
    spot: Arc<dyn SpotPriceSource>,
    historical: Arc<dyn HistoricalSource>,
    trade_symbol: String,
    state: RwLock<ConversionState>,
    pending: AtomicUsize,
    revision: watch::Sender<u64>,
}

impl ConversionViewModel {
    pub fn new(
        spot: Arc<dyn SpotPriceSource>,
        historical: Arc<dyn HistoricalSource>,
        currency: CurrencyCode,
        trade_symbol: &str,
    ) -> Self {
        let (revision, _) = watch::channel(0);
        Self {
            spot,
            historical,
            trade_symbol: trade_symbol.to_string(),
            state: RwLock::new(ConversionState::new(currency)),
            pending: AtomicUsize::new(0),
            revision,
        }
    }

    /// Bumped after every state change.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.revision.subscribe()
    }

    pub fn snapshot(&self) -> ConversionState {
        self.read().clone()
    }

    fn read(&self) -> RwLockReadGuard<'_, ConversionState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn update<R>(&self, f: impl FnOnce(&mut ConversionState) -> R) -> R {
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

    /// Selects the quoted currency. The caller is responsible for kicking off a refresh.
    pub fn set_currency(&self, code: CurrencyCode) {
        debug!(currency = %code, "Currency selected");
        self.update(|s| s.selected_currency = code);
    }

    /// Parses a user-entered amount. Empty input counts as zero; anything else that
    /// is not a finite decimal marks the input invalid and keeps the last valid amount.
    pub fn set_amount(&self, raw: &str) -> Result<f64, ParseError> {
        let trimmed = raw.trim();
        let parsed = if trimmed.is_empty() {
            Some(0.0)
        } else {
            trimmed.parse::<f64>().ok().filter(|v| v.is_finite())
        };

        match parsed {
            Some(amount) => {
                self.update(|s| {
                    s.amount_entered = amount;
                    s.amount_invalid = false;
                });
                Ok(amount)
            }
            None => {
                debug!(input = raw, "Ignoring unparseable amount");
                self.update(|s| s.amount_invalid = true);
                Err(ParseError {
                    input: raw.to_string(),
                })
            }
        }
    }

    pub fn toggle_inversion(&self) {
        self.update(|s| s.inverted = !s.inverted);
    }

    /// Fetches the spot price for the selected currency, then its previous close.
    /// Completions after `liveness` is revoked are dropped without touching state.
    pub async fn refresh(&self, liveness: &Liveness) -> Result<(), FetchError> {
        let code = self.selected_currency();
        let pending = PendingRefresh::begin(&self.pending);
        self.notify();

        let spot = self.spot.fetch_spot(code).await;
        drop(pending);
        if !liveness.is_alive() {
            debug!(currency = %code, "Discarding spot price after stop");
            return Ok(());
        }

        let quote = match spot {
            Ok(quote) => quote,
            Err(e) => {
                self.notify();
                return Err(e);
            }
        };
        self.apply_quote(quote);

        let close = self.historical.fetch_close(code).await;
        if !liveness.is_alive() {
            debug!(currency = %code, "Discarding previous close after stop");
            return Ok(());
        }

        let point = close?;
        self.update(|s| {
            // a later quote in another currency may have landed meanwhile
            if let Some(quote) = s.quote.as_ref().filter(|q| q.code == code) {
                s.change = point.change_to(quote.rate);
            }
        });
        Ok(())
    }

    fn apply_quote(&self, quote: Quote) {
        debug!(currency = %quote.code, rate = quote.rate, "Applying quote");
        self.update(|s| {
            if s.quote.as_ref().is_some_and(|prev| prev.code != quote.code) {
                s.change = None;
            }
            s.quote = Some(quote);
            s.updated_at = Some(Local::now());
        });
    }

    pub fn selected_currency(&self) -> CurrencyCode {
        self.read().selected_currency
    }

    /// True while a spot fetch is outstanding.
    pub fn is_loading(&self) -> bool {
        self.pending.load(Ordering::Acquire) > 0
    }

    pub fn is_inverted(&self) -> bool {
        self.read().inverted
    }

    pub fn amount_entered(&self) -> f64 {
        self.read().amount_entered
    }

    pub fn is_amount_invalid(&self) -> bool {
        self.read().amount_invalid
    }

    pub fn trade_symbol(&self) -> &str {
        &self.trade_symbol
    }

    pub fn rate(&self) -> Option<f64> {
        self.read().quote.as_ref().map(|q| q.rate)
    }

    /// The applied quote's rate in its own currency, e.g. `$15,071.67`.
    pub fn display_rate(&self) -> String {
        self.read()
            .quote
            .as_ref()
            .map_or(NOT_AVAILABLE.to_string(), |q| format_currency(q.rate, q.code))
    }

    /// `amount / rate` in the trade symbol, or `amount * rate` in currency when inverted.
    pub fn conversion(&self) -> String {
        let state = self.read();
        if state.amount_invalid {
            return NOT_AVAILABLE.to_string();
        }
        let Some(quote) = state.quote.as_ref() else {
            return NOT_AVAILABLE.to_string();
        };
        if quote.rate == 0.0 || !quote.rate.is_finite() {
            return NOT_AVAILABLE.to_string();
        }

        let value = if state.inverted {
            state.amount_entered * quote.rate
        } else {
            state.amount_entered / quote.rate
        };
        if !value.is_finite() {
            return NOT_AVAILABLE.to_string();
        }

        if state.inverted {
            format_currency(value, quote.code)
        } else {
            format!("{} {}", format_fixed(value, 4), self.trade_symbol)
        }
    }

    pub fn change(&self) -> String {
        let state = self.read();
        match (&state.quote, state.change) {
            (Some(_), Some(change)) => format_grouped(change),
            _ => NULL_CHANGE.to_string(),
        }
    }

    /// Local time of the last applied quote, e.g. `3:07 PM`.
    pub fn last_updated(&self) -> Option<String> {
        self.read()
            .updated_at
            .map(|t| t.format("%-I:%M %p").to_string())
    }
}
