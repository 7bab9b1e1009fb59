//! Client side of the rate endpoints.
//!
//! A presenter fetches its endpoint once and keeps the outcome for the rest of
//! the view. There is no polling and no retry: a failed fetch leaves the view
//! [`RateView::Unavailable`] and nothing older is ever shown in its place.

pub mod format;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::marker::PhantomData;
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Clone, PartialEq)]
pub enum RateView<T> {
    Pending,
    Ready(T),
    Unavailable,
}

/// Response body of a rate endpoint and how to turn it into something displayable.
pub trait RateEnvelope: DeserializeOwned + Send {
    type Display: Clone + Send;

    const PATH: &'static str;

    /// `None` when the envelope reports failure or carries unusable numbers.
    fn into_display(self) -> Option<Self::Display>;
}

fn positive(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite() && *v > 0.0)
}

fn parse_fecha(fecha: Option<&str>) -> Option<DateTime<Utc>> {
    fecha
        .and_then(|f| DateTime::parse_from_rfc3339(f).ok())
        .map(|dt| dt.with_timezone(&Utc))
}

#[derive(Debug, Deserialize)]
pub struct CompositeEnvelope {
    success: bool,
    tasa: Option<f64>,
    #[serde(rename = "tasaEUR_VES")]
    tasa_eur_local: Option<f64>,
    #[serde(rename = "tasaUSD_VES")]
    tasa_usd_local: Option<f64>,
    fecha: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompositeDisplay {
    pub eur_usd: f64,
    pub usd_local: f64,
    pub eur_local: f64,
    pub observed_at: Option<DateTime<Utc>>,
}

impl RateEnvelope for CompositeEnvelope {
    type Display = CompositeDisplay;

    const PATH: &'static str = "/api/tasa-eur";

    fn into_display(self) -> Option<CompositeDisplay> {
        if !self.success {
            return None;
        }
        Some(CompositeDisplay {
            eur_usd: positive(self.tasa)?,
            usd_local: positive(self.tasa_usd_local)?,
            eur_local: positive(self.tasa_eur_local)?,
            observed_at: parse_fecha(self.fecha.as_deref()),
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct BridgeEnvelope {
    success: bool,
    tasa: Option<f64>,
    rate: Option<f64>,
    fuente: Option<String>,
    fecha: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BridgeDisplay {
    pub eur_usd: f64,
    pub source: Option<String>,
    pub observed_at: Option<DateTime<Utc>>,
}

impl RateEnvelope for BridgeEnvelope {
    type Display = BridgeDisplay;

    const PATH: &'static str = "/api/eur-usd";

    fn into_display(self) -> Option<BridgeDisplay> {
        if !self.success {
            return None;
        }
        Some(BridgeDisplay {
            eur_usd: positive(self.tasa).or_else(|| positive(self.rate))?,
            source: self.fuente,
            observed_at: parse_fecha(self.fecha.as_deref()),
        })
    }
}

/// An amount entered in EUR with its equivalents.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Conversion {
    pub amount_eur: f64,
    pub amount_usd: f64,
    pub amount_local: Option<f64>,
}

impl BridgeDisplay {
    pub fn convert(&self, amount_eur: f64) -> Conversion {
        Conversion {
            amount_eur,
            amount_usd: amount_eur * self.eur_usd,
            amount_local: None,
        }
    }
}

impl CompositeDisplay {
    pub fn convert(&self, amount_eur: f64) -> Conversion {
        Conversion {
            amount_eur,
            amount_usd: amount_eur * self.eur_usd,
            amount_local: Some(amount_eur * self.eur_local),
        }
    }
}

/// How long a view waits for the rate server before showing it as unavailable.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

pub struct RatePresenter<E: RateEnvelope> {
    base_url: String,
    client: reqwest::Client,
    timeout: Duration,
    view: RateView<E::Display>,
    _envelope: PhantomData<E>,
}

pub type CompositePresenter = RatePresenter<CompositeEnvelope>;
pub type BridgePresenter = RatePresenter<BridgeEnvelope>;

impl<E: RateEnvelope> RatePresenter<E> {
    pub fn new(base_url: &str, client: reqwest::Client) -> Self {
        RatePresenter {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
            timeout: REQUEST_TIMEOUT,
            view: RateView::Pending,
            _envelope: PhantomData,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn view(&self) -> &RateView<E::Display> {
        &self.view
    }

    /// Fetches the endpoint on the first call; later calls return the held view.
    pub async fn load(&mut self) -> &RateView<E::Display> {
        if matches!(self.view, RateView::Pending) {
            self.view = match self.fetch().await {
                Some(display) => RateView::Ready(display),
                None => RateView::Unavailable,
            };
        }
        &self.view
    }

    async fn fetch(&self) -> Option<E::Display> {
        let url = format!("{}{}", self.base_url, E::PATH);
        debug!("Requesting rates from {}", url);

        let response = match self.client.get(&url).timeout(self.timeout).send().await {
            Ok(response) => response,
            Err(e) => {
                debug!(error = %e, "Rate endpoint unreachable");
                return None;
            }
        };

        // Failure envelopes come with 5xx statuses, so parse the body regardless.
        let status = response.status();
        match response.json::<E>().await {
            Ok(envelope) => {
                let display = envelope.into_display();
                if display.is_none() {
                    debug!(%status, "Rate endpoint reported failure");
                }
                display
            }
            Err(e) => {
                debug!(%status, error = %e, "Failed to parse rate endpoint response");
                None
            }
        }
    }
}
