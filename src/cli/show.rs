use super::ui;
use crate::presenter::format::{Locale, format_amount};
use crate::presenter::{CompositeDisplay, CompositePresenter, RateView};
use anyhow::Result;
use comfy_table::Cell;

pub const UNAVAILABLE_MESSAGE: &str = "Rates unavailable. Please try again later.";

/// Renders the composite rate view as printable text.
pub fn render(view: &RateView<CompositeDisplay>, locale: Locale, local_currency: &str) -> String {
    let display = match view {
        RateView::Ready(display) => display,
        RateView::Pending | RateView::Unavailable => {
            return ui::style_text(UNAVAILABLE_MESSAGE, ui::StyleType::Error);
        }
    };

    let mut table = ui::new_styled_table();
    table.set_header(vec![ui::header_cell("Pair"), ui::header_cell("Rate")]);
    table.add_row(vec![
        Cell::new("EUR → USD"),
        ui::amount_cell(format_amount(display.eur_usd, locale)),
    ]);
    table.add_row(vec![
        Cell::new(format!("USD → {local_currency}")),
        ui::amount_cell(format_amount(display.usd_local, locale)),
    ]);
    table.add_row(vec![
        Cell::new(format!("EUR → {local_currency}")),
        ui::highlight_cell(format_amount(display.eur_local, locale)),
    ]);

    let mut output = format!(
        "{}\n\n",
        ui::style_text("Exchange rates", ui::StyleType::Title)
    );
    output.push_str(&table.to_string());

    if let Some(observed_at) = display.observed_at {
        output.push_str(&format!(
            "\n\n{}",
            ui::style_text(
                &format!("Updated {}", observed_at.format("%Y-%m-%d %H:%M UTC")),
                ui::StyleType::Subtle
            )
        ));
    }

    output
}

pub async fn run(
    endpoint: &str,
    client: reqwest::Client,
    locale: Locale,
    local_currency: &str,
) -> Result<()> {
    let mut presenter = CompositePresenter::new(endpoint, client);

    let pb = ui::new_spinner("Fetching rates...");
    let view = presenter.load().await;
    pb.finish_and_clear();

    println!("{}", render(view, locale, local_currency));
    Ok(())
}
