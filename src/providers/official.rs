use super::util::{RateValue, get_json, parse_observed_at};
use crate::core::rate::{CurrencyPair, RateQuote};
use crate::core::source::{RateSource, SourceError};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, instrument};

const DEFAULT_SOURCE: &str = "oficial";

/// Which official quote to request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OfficialLeg {
    /// USD to local currency.
    Dollar,
    /// EUR to local currency, published directly.
    Euro,
}

impl OfficialLeg {
    fn path(&self) -> &'static str {
        match self {
            OfficialLeg::Dollar => "/v1/dolares/oficial",
            OfficialLeg::Euro => "/v1/euros/oficial",
        }
    }

    fn base_currency(&self) -> &'static str {
        match self {
            OfficialLeg::Dollar => "USD",
            OfficialLeg::Euro => "EUR",
        }
    }
}

/// Official central-bank rate published through a dolarapi-style service.
pub struct OfficialRateSource {
    base_url: String,
    client: reqwest::Client,
    budget: Duration,
    leg: OfficialLeg,
    local_currency: String,
}

impl OfficialRateSource {
    pub fn new(
        base_url: &str,
        client: reqwest::Client,
        budget: Duration,
        leg: OfficialLeg,
        local_currency: &str,
    ) -> Self {
        OfficialRateSource {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
            budget,
            leg,
            local_currency: local_currency.to_string(),
        }
    }
}

/// The service has published the rate under different field names over time,
/// so every candidate is read and the first usable one wins.
#[derive(Debug, Deserialize)]
struct OfficialResponse {
    #[serde(default)]
    promedio: Option<RateValue>,
    #[serde(default)]
    precio: Option<RateValue>,
    #[serde(default)]
    venta: Option<RateValue>,
    #[serde(default)]
    fuente: Option<String>,
    #[serde(default, rename = "fechaActualizacion")]
    updated_at: Option<String>,
}

impl OfficialResponse {
    /// First of `promedio`, `precio`, `venta` holding a positive, finite rate.
    fn rate(&self) -> Option<f64> {
        [&self.promedio, &self.precio, &self.venta]
            .into_iter()
            .flatten()
            .find_map(RateValue::to_rate)
    }
}

#[async_trait]
impl RateSource for OfficialRateSource {
    fn source_id(&self) -> &str {
        DEFAULT_SOURCE
    }

    fn pair(&self) -> CurrencyPair {
        CurrencyPair::new(self.leg.base_currency(), &self.local_currency)
    }

    fn budget(&self) -> Duration {
        self.budget
    }

    #[instrument(name = "OfficialRateFetch", skip(self), fields(leg = ?self.leg))]
    async fn fetch_quote(&self) -> Result<RateQuote, SourceError> {
        let url = format!("{}{}", self.base_url, self.leg.path());
        let data: OfficialResponse = get_json(&self.client, &url).await?;
        debug!(response = ?data, "Received official rate");

        let value = data.rate().ok_or_else(|| {
            SourceError::UnparsableResponse("no usable rate in response".to_string())
        })?;
        let source_id = data
            .fuente
            .as_deref()
            .filter(|f| !f.trim().is_empty())
            .unwrap_or(DEFAULT_SOURCE);
        let observed_at = data.updated_at.as_deref().and_then(parse_observed_at);

        RateQuote::new(source_id, self.pair(), value, observed_at)
            .ok_or_else(|| SourceError::UnparsableResponse(format!("invalid rate {value}")))
    }
}
