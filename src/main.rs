use anyhow::Result;
use clap::{Args, CommandFactory, Parser, Subcommand};
use coinwatch::core::CurrencyCode;
use coinwatch::core::log::init_logging;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to optional configuration file
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Args, Clone)]
struct ViewArgs {
    /// Currency to quote BTC in (BAM, USD, AUD, EUR, CAD)
    #[arg(long)]
    currency: Option<CurrencyCode>,

    /// Amount to convert
    #[arg(short, long)]
    amount: Option<String>,

    /// Convert BTC into the currency instead
    #[arg(short, long)]
    inverted: bool,
}

impl From<ViewArgs> for coinwatch::ViewOptions {
    fn from(args: ViewArgs) -> Self {
        coinwatch::ViewOptions {
            currency: args.currency,
            amount: args.amount,
            inverted: args.inverted,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Fetch quotes once and print them
    Show(ViewArgs),
    /// Keep polling and redraw on every update
    Watch(ViewArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let config_path = cli.config_path.as_deref();
    let result = match cli.command {
        Some(Commands::Setup) => match config_path {
            Some(path) => coinwatch::cli::setup::setup_at_path(path),
            None => coinwatch::cli::setup::setup(),
        },
        Some(Commands::Show(args)) => {
            coinwatch::run_command(coinwatch::AppCommand::Show(args.into()), config_path).await
        }
        Some(Commands::Watch(args)) => {
            coinwatch::run_command(coinwatch::AppCommand::Watch(args.into()), config_path).await
        }
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    };

    if let Err(e) = &result {
        tracing::error!(error = %e, "Application failed");
    }
    result
}
