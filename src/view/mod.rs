//! View models the renderer reads from and writes user input into

pub mod conversion;
pub mod market;

pub use conversion::{ConversionState, ConversionViewModel, NULL_CHANGE};
pub use market::{MarketListViewModel, MarketRow, Trend, trend_color};

use std::sync::atomic::{AtomicUsize, Ordering};

/// Counts one refresh as pending until dropped, however the refresh ends.
pub(crate) struct PendingRefresh<'a>(&'a AtomicUsize);

impl<'a> PendingRefresh<'a> {
    pub(crate) fn begin(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::AcqRel);
        Self(counter)
    }
}

impl Drop for PendingRefresh<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::AcqRel);
    }
}
