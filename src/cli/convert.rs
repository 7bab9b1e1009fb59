use super::show::UNAVAILABLE_MESSAGE;
use super::ui;
use crate::presenter::format::{Locale, format_money};
use crate::presenter::{BridgeDisplay, BridgePresenter, RateView};
use anyhow::{Result, bail};

pub fn render(view: &RateView<BridgeDisplay>, amount_eur: f64, locale: Locale) -> String {
    let RateView::Ready(display) = view else {
        return ui::style_text(UNAVAILABLE_MESSAGE, ui::StyleType::Error);
    };
    let conversion = display.convert(amount_eur);

    let mut table = ui::new_styled_table();
    table.set_header(vec![ui::header_cell("EUR"), ui::header_cell("USD")]);
    table.add_row(vec![
        ui::amount_cell(format_money(conversion.amount_eur, "EUR", locale)),
        ui::highlight_cell(format_money(conversion.amount_usd, "USD", locale)),
    ]);

    let mut output = table.to_string();
    if let Some(source) = &display.source {
        output.push_str(&format!(
            "\n{}",
            ui::style_text(&format!("Source: {source}"), ui::StyleType::Subtle)
        ));
    }
    output
}

pub async fn run(
    endpoint: &str,
    client: reqwest::Client,
    locale: Locale,
    amount_eur: f64,
) -> Result<()> {
    if !amount_eur.is_finite() || amount_eur < 0.0 {
        bail!("Amount must be a non-negative number, got {amount_eur}");
    }

    let mut presenter = BridgePresenter::new(endpoint, client);

    let pb = ui::new_spinner("Fetching EUR/USD rate...");
    let view = presenter.load().await;
    pb.finish_and_clear();

    println!("{}", render(view, amount_eur, locale));
    Ok(())
}
