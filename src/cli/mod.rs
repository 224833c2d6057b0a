pub mod render;
pub mod setup;
pub mod show;
pub mod ui;
pub mod watch;

use crate::core::CurrencyCode;
use crate::dashboard::Dashboard;
use tracing::warn;

/// Initial converter inputs given on the command line.
#[derive(Debug, Clone, Default)]
pub struct ViewOptions {
    pub currency: Option<CurrencyCode>,
    pub amount: Option<String>,
    pub inverted: bool,
}

impl ViewOptions {
    /// Applies the options before polling starts.
    pub fn apply(&self, dashboard: &Dashboard) {
        if let Some(code) = self.currency {
            dashboard.conversion.set_currency(code);
        }
        if let Some(amount) = &self.amount {
            if let Err(e) = dashboard.set_amount(amount) {
                warn!(error = %e, "Ignoring amount");
            }
        }
        if self.inverted {
            dashboard.toggle_inversion();
        }
    }
}
