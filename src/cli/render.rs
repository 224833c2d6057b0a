//! Paints the view models as plain terminal text.

use super::ui::{self, StyleType};
use crate::core::format::format_grouped;
use crate::view::{ConversionViewModel, MarketListViewModel, NULL_CHANGE};
use comfy_table::{Cell, CellAlignment, ContentArrangement};

/// Shown in place of a logo the metadata table cannot resolve.
const LOGO_PLACEHOLDER: &str = "-";

pub fn render_conversion(vm: &ConversionViewModel) -> String {
    let state = vm.snapshot();
    let currency = state
        .quote
        .as_ref()
        .map_or(state.selected_currency, |q| q.code);

    let mut output = format!(
        "{}\n\n",
        ui::style_text(
            &format!("{} / {}", vm.trade_symbol(), state.selected_currency),
            StyleType::Title
        )
    );

    let change = vm.change();
    let change = if change == NULL_CHANGE {
        ui::style_text(&change, StyleType::Subtle)
    } else {
        format!("{change}%")
    };
    output.push_str(&format!(
        "{} {}  {} {}\n",
        ui::style_text(&format!("1 {} =", vm.trade_symbol()), StyleType::Label),
        ui::style_text(&vm.display_rate(), StyleType::Value),
        ui::style_text("since yesterday:", StyleType::Subtle),
        change
    ));

    let from = if state.inverted {
        vm.trade_symbol().to_string()
    } else {
        currency.to_string()
    };
    let amount = if state.amount_invalid {
        ui::style_text("invalid amount", StyleType::Error)
    } else {
        format!("{} {from}", format_grouped(state.amount_entered))
    };
    output.push_str(&format!(
        "{} {amount} = {}\n",
        ui::style_text("Convert:", StyleType::Label),
        vm.conversion()
    ));

    let status = match (vm.is_loading(), vm.last_updated()) {
        (true, _) => "Updating...".to_string(),
        (false, Some(at)) => format!("Updated {at}"),
        (false, None) => "Waiting for first quote".to_string(),
    };
    output.push_str(&ui::style_text(&status, StyleType::Subtle));
    output.push('\n');
    output
}

/// `width` pins the table width; `None` lays the table out without wrapping.
pub fn render_market(vm: &MarketListViewModel, width: Option<u16>) -> String {
    let rows = vm.rows();
    let mut output = format!("{}\n\n", ui::style_text("Top assets", StyleType::Title));
    if rows.is_empty() {
        let message = if vm.is_loading() {
            "Loading market data..."
        } else {
            "No market data yet"
        };
        output.push_str(&ui::style_text(message, StyleType::Subtle));
        output.push('\n');
        return output;
    }

    let mut table = ui::new_styled_table();
    match width {
        Some(width) => {
            table.set_width(width);
        }
        None => {
            table.set_content_arrangement(ContentArrangement::Disabled);
        }
    }
    table.set_header(vec![
        ui::header_cell("#"),
        ui::header_cell("Asset"),
        ui::header_cell(&format!("Price ({})", vm.convert_currency())),
        ui::header_cell("1h"),
        ui::header_cell("24h"),
        ui::header_cell("7d"),
        ui::header_cell("Logo"),
    ]);

    for row in rows {
        let logo = row.logo.unwrap_or_else(|_| LOGO_PLACEHOLDER.to_string());
        table.add_row(vec![
            Cell::new(row.rank),
            Cell::new(format!("{} ({})", row.name, row.symbol)),
            Cell::new(row.price).set_alignment(CellAlignment::Right),
            ui::trend_cell(row.percent_change_1h),
            ui::trend_cell(row.percent_change_24h),
            ui::trend_cell(row.percent_change_7d),
            Cell::new(logo),
        ]);
    }

    output.push_str(&format!("{table}\n"));
    output
}

pub fn render_dashboard(
    conversion: &ConversionViewModel,
    market: &MarketListViewModel,
    width: Option<u16>,
) -> String {
    format!(
        "{}\n{}",
        render_conversion(conversion),
        render_market(market, width)
    )
}
