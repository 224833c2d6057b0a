pub mod cli;
pub mod core;
pub mod dashboard;
pub mod providers;
pub mod scheduler;
pub mod view;

#[cfg(test)]
pub(crate) mod testing;

pub use cli::ViewOptions;
pub use dashboard::Dashboard;

use crate::core::config::AppConfig;
use anyhow::Result;
use tracing::{debug, info};

pub enum AppCommand {
    /// Refresh once, print, exit
    Show(ViewOptions),
    /// Poll continuously and redraw on change
    Watch(ViewOptions),
}

pub fn load_config(config_path: Option<&str>) -> Result<AppConfig> {
    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    debug!("Loaded config: {config:#?}");
    Ok(config)
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    info!("coinwatch starting...");
    let config = load_config(config_path)?;

    match command {
        AppCommand::Show(options) => cli::show::run(&config, &options).await,
        AppCommand::Watch(options) => cli::watch::run(&config, &options).await,
    }
}
