use super::util::{RateValue, get_json, parse_observed_at};
use crate::core::rate::{CurrencyPair, RateQuote};
use crate::core::source::{RateSource, SourceError};
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, instrument};

const SOURCE_ID: &str = "exchangerate-api";

/// General purpose rates from an open.er-api style service, quoted against EUR.
pub struct ExchangeRateApiSource {
    base_url: String,
    client: reqwest::Client,
    budget: Duration,
}

impl ExchangeRateApiSource {
    pub fn new(base_url: &str, client: reqwest::Client, budget: Duration) -> Self {
        ExchangeRateApiSource {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
            budget,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(tag = "result", rename_all = "lowercase")]
enum LatestRatesResponse {
    Success {
        base_code: String,
        #[serde(default)]
        time_last_update_utc: Option<String>,
        rates: HashMap<String, RateValue>,
    },
    Error {
        #[serde(rename = "error-type", default)]
        error_type: Option<String>,
    },
}

#[async_trait]
impl RateSource for ExchangeRateApiSource {
    fn source_id(&self) -> &str {
        SOURCE_ID
    }

    fn pair(&self) -> CurrencyPair {
        CurrencyPair::new("EUR", "USD")
    }

    fn budget(&self) -> Duration {
        self.budget
    }

    #[instrument(name = "ExchangeRateApiFetch", skip(self))]
    async fn fetch_quote(&self) -> Result<RateQuote, SourceError> {
        let url = format!("{}/v6/latest/EUR", self.base_url);
        let data: LatestRatesResponse = get_json(&self.client, &url).await?;

        match data {
            LatestRatesResponse::Success {
                base_code,
                time_last_update_utc,
                rates,
            } => {
                if !base_code.eq_ignore_ascii_case("EUR") {
                    return Err(SourceError::UnparsableResponse(format!(
                        "expected EUR base, got {base_code}"
                    )));
                }
                let eur_usd = rates
                    .get("USD")
                    .and_then(RateValue::to_rate)
                    .ok_or_else(|| {
                        SourceError::UnparsableResponse("missing USD rate".to_string())
                    })?;
                debug!(eur_usd, "Received exchange rate");

                let observed_at = time_last_update_utc.as_deref().and_then(parse_observed_at);
                RateQuote::new(SOURCE_ID, self.pair(), eur_usd, observed_at).ok_or_else(|| {
                    SourceError::UnparsableResponse(format!("invalid rate {eur_usd}"))
                })
            }
            LatestRatesResponse::Error { error_type } => Err(SourceError::UnparsableResponse(
                format!(
                    "upstream reported {}",
                    error_type.as_deref().unwrap_or("an error")
                ),
            )),
        }
    }
}
