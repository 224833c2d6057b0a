use super::{ViewOptions, render, ui};
use crate::core::config::AppConfig;
use crate::dashboard::Dashboard;
use anyhow::Result;
use tracing::{info, warn};

/// Fetches every source once, prints the dashboard and exits.
pub async fn run(config: &AppConfig, options: &ViewOptions) -> Result<()> {
    let dashboard = Dashboard::from_config(config)?;
    options.apply(&dashboard);

    let pb = ui::new_spinner("Fetching quotes...");
    let (conversion, market) = dashboard.refresh_once().await;
    pb.finish_and_clear();

    for (source, result) in [("conversion", conversion), ("market-list", market)] {
        match result {
            Ok(()) => info!(source, "Refreshed"),
            Err(e) => warn!(
                source,
                transient = e.is_transient(),
                error = %e,
                "Refresh failed"
            ),
        }
    }

    let width = console::Term::stdout().size_checked().map(|(_, w)| w);
    println!(
        "{}",
        render::render_dashboard(&dashboard.conversion, &dashboard.market, width)
    );
    Ok(())
}
