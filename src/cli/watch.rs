use super::{ViewOptions, render};
use crate::core::CurrencyCode;
use crate::core::config::AppConfig;
use crate::dashboard::Dashboard;
use anyhow::{Context, Result};
use console::Term;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::debug;

const HELP: &str = "c <CODE> currency | a <amount> amount | i invert | q quit";

/// One line of interactive input.
#[derive(Debug, PartialEq)]
enum Input {
    Currency(CurrencyCode),
    Amount(String),
    Invert,
    Quit,
    Unknown(String),
}

fn parse_input(line: &str) -> Input {
    let line = line.trim();
    let (command, arg) = line.split_once(' ').unwrap_or((line, ""));
    match command {
        "c" => match arg.parse() {
            Ok(code) => Input::Currency(code),
            Err(e) => Input::Unknown(e.to_string()),
        },
        "a" => Input::Amount(arg.trim().to_string()),
        "i" => Input::Invert,
        "q" => Input::Quit,
        _ => Input::Unknown(format!("Unknown command: {line}")),
    }
}

fn redraw(term: &Term, dashboard: &Dashboard, notice: Option<&str>) -> Result<()> {
    let width = term.size_checked().map(|(_, w)| w);
    term.clear_screen().context("Failed to clear terminal")?;
    let mut output = render::render_dashboard(&dashboard.conversion, &dashboard.market, width);
    if let Some(notice) = notice {
        output.push_str(&format!("\n{notice}"));
    }
    output.push_str(&format!("\n{HELP}"));
    term.write_line(&output)
        .context("Failed to write to terminal")
}

/// Polls until `q` or Ctrl-C, redrawing whenever a view model changes.
pub async fn run(config: &AppConfig, options: &ViewOptions) -> Result<()> {
    let dashboard = Dashboard::from_config(config)?;
    options.apply(&dashboard);
    dashboard.start();

    let term = Term::stdout();
    let mut conversion_changes = dashboard.conversion.subscribe();
    let mut market_changes = dashboard.market.subscribe();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;
    let mut notice: Option<String> = None;

    redraw(&term, &dashboard, None)?;
    loop {
        tokio::select! {
            changed = conversion_changes.changed() => {
                if changed.is_err() {
                    break;
                }
            }
            changed = market_changes.changed() => {
                if changed.is_err() {
                    break;
                }
            }
            line = lines.next_line(), if stdin_open => {
                notice = None;
                match line.context("Failed to read input")? {
                    Some(line) => match parse_input(&line) {
                        Input::Currency(code) => dashboard.set_currency(code),
                        Input::Amount(raw) => {
                            // invalid input is shown in the dashboard itself
                            let _ = dashboard.set_amount(&raw);
                        }
                        Input::Invert => dashboard.toggle_inversion(),
                        Input::Quit => break,
                        Input::Unknown(message) => notice = Some(message),
                    },
                    None => {
                        debug!("stdin closed, waiting for Ctrl-C");
                        stdin_open = false;
                    }
                }
            }
            _ = tokio::signal::ctrl_c() => break,
        }
        redraw(&term, &dashboard, notice.as_deref())?;
    }

    dashboard.stop();
    Ok(())
}
