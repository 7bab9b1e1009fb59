use super::util::{RateValue, get_json, parse_observed_at};
use crate::core::rate::{CurrencyPair, RateQuote};
use crate::core::source::{RateSource, SourceError};
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, instrument};

const SOURCE_ID: &str = "ecb";

/// Euro reference rates from a Frankfurter-style ECB mirror.
///
/// The service is asked for the price of one USD in EUR, so every figure it
/// returns has to go through [`usd_in_eur_to_eur_usd`] before it can be used
/// as the EUR→USD bridge.
pub struct CentralBankSource {
    base_url: String,
    client: reqwest::Client,
    budget: Duration,
}

impl CentralBankSource {
    pub fn new(base_url: &str, client: reqwest::Client, budget: Duration) -> Self {
        CentralBankSource {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
            budget,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ReferenceRateResponse {
    base: String,
    #[serde(default)]
    date: Option<String>,
    rates: HashMap<String, RateValue>,
}

/// Turns "1 USD = x EUR" into "1 EUR = 1/x USD". Any other pair gives `None`.
pub fn usd_in_eur_to_eur_usd(usd_eur: &RateQuote) -> Option<RateQuote> {
    if usd_eur.pair != CurrencyPair::new("USD", "EUR") {
        return None;
    }
    usd_eur.inverted()
}

#[async_trait]
impl RateSource for CentralBankSource {
    fn source_id(&self) -> &str {
        SOURCE_ID
    }

    fn pair(&self) -> CurrencyPair {
        CurrencyPair::new("EUR", "USD")
    }

    fn budget(&self) -> Duration {
        self.budget
    }

    #[instrument(name = "CentralBankFetch", skip(self))]
    async fn fetch_quote(&self) -> Result<RateQuote, SourceError> {
        let url = format!("{}/latest?from=USD&to=EUR", self.base_url);
        let data: ReferenceRateResponse = get_json(&self.client, &url).await?;
        debug!(response = ?data, "Received reference rate");

        if !data.base.eq_ignore_ascii_case("USD") {
            return Err(SourceError::UnparsableResponse(format!(
                "expected USD base, got {}",
                data.base
            )));
        }

        let usd_eur = data
            .rates
            .get("EUR")
            .and_then(RateValue::to_rate)
            .ok_or_else(|| SourceError::UnparsableResponse("missing EUR rate".to_string()))?;
        let observed_at = data.date.as_deref().and_then(parse_observed_at);

        RateQuote::new(SOURCE_ID, CurrencyPair::new("USD", "EUR"), usd_eur, observed_at)
            .as_ref()
            .and_then(usd_in_eur_to_eur_usd)
            .ok_or_else(|| SourceError::UnparsableResponse(format!("invalid rate {usd_eur}")))
    }
}
