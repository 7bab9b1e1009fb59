//! Resolves the composite EUR→local rate from several unreliable sources.
//!
//! Every source is queried concurrently under its own time budget and the
//! results are merged only after all of them settle. Precedence:
//!
//! - a direct EUR→local quote beats the computed `EUR→USD × USD→local`;
//! - the primary EUR→USD source beats the secondary one;
//! - a failed leg is reported as a failure, never replaced by an older value.

use crate::core::rate::{CompositeRate, RateQuote};
use crate::core::source::{RateSource, SourceError, fetch_within};
use chrono::Utc;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, instrument, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error("USD rate is unavailable")]
    PrimaryUnavailable,
    #[error("EUR/USD rate is unavailable")]
    BridgeUnavailable,
    #[error("rate sources did not respond in time")]
    Timeout,
}

/// The sources backing a resolver, passed in explicitly so tests can swap them.
#[derive(Clone)]
pub struct RateSources {
    pub usd_local: Arc<dyn RateSource>,
    pub eur_local_direct: Option<Arc<dyn RateSource>>,
    pub bridge_primary: Arc<dyn RateSource>,
    pub bridge_secondary: Arc<dyn RateSource>,
}

#[derive(Clone)]
pub struct RateResolver {
    sources: RateSources,
}

impl RateResolver {
    pub fn new(sources: RateSources) -> Self {
        Self { sources }
    }

    /// USD→local only. There is no fallback for this leg.
    #[instrument(name = "ResolveUsdLocal", skip(self))]
    pub async fn resolve_usd_local(&self) -> Result<RateQuote, ResolveError> {
        let result = fetch_within(self.sources.usd_local.as_ref()).await;
        required_leg(self.sources.usd_local.as_ref(), result)
    }

    /// EUR→USD only, primary first, secondary as fallback.
    #[instrument(name = "ResolveEurUsd", skip(self))]
    pub async fn resolve_eur_usd(&self) -> Result<RateQuote, ResolveError> {
        let (primary, secondary) = futures::join!(
            fetch_within(self.sources.bridge_primary.as_ref()),
            fetch_within(self.sources.bridge_secondary.as_ref()),
        );
        self.select_bridge(primary, secondary)
    }

    #[instrument(name = "ResolveComposite", skip(self))]
    pub async fn resolve(&self) -> Result<CompositeRate, ResolveError> {
        let direct = async {
            match &self.sources.eur_local_direct {
                Some(source) => Some(fetch_within(source.as_ref()).await),
                None => None,
            }
        };

        let (usd_local, primary, secondary, direct) = futures::join!(
            fetch_within(self.sources.usd_local.as_ref()),
            fetch_within(self.sources.bridge_primary.as_ref()),
            fetch_within(self.sources.bridge_secondary.as_ref()),
            direct,
        );

        let usd_local = required_leg(self.sources.usd_local.as_ref(), usd_local)?;
        let bridge = self.select_bridge(primary, secondary)?;

        let direct = match (direct, &self.sources.eur_local_direct) {
            (Some(Ok(quote)), _) => Some(quote),
            (Some(Err(e)), Some(source)) => {
                debug!(
                    source = source.source_id(),
                    error = %e,
                    "Direct EUR rate unavailable, computing it from the bridge"
                );
                None
            }
            _ => None,
        };

        let composite = CompositeRate::compose(usd_local, bridge, direct, Utc::now())
            .ok_or(ResolveError::BridgeUnavailable)?;
        debug!(
            eur_local = composite.derived.value,
            derivation = ?composite.derivation,
            "Resolved composite rate"
        );
        Ok(composite)
    }

    fn select_bridge(
        &self,
        primary: Result<RateQuote, SourceError>,
        secondary: Result<RateQuote, SourceError>,
    ) -> Result<RateQuote, ResolveError> {
        let primary_error = match primary {
            Ok(quote) => return Ok(quote),
            Err(e) => e,
        };
        warn!(
            source = self.sources.bridge_primary.source_id(),
            error = %primary_error,
            "Primary EUR/USD source failed, trying secondary"
        );

        match secondary {
            Ok(quote) => Ok(quote),
            Err(secondary_error) => {
                warn!(
                    source = self.sources.bridge_secondary.source_id(),
                    error = %secondary_error,
                    "Secondary EUR/USD source failed"
                );
                if primary_error.is_transport() && secondary_error.is_transport() {
                    Err(ResolveError::Timeout)
                } else {
                    Err(ResolveError::BridgeUnavailable)
                }
            }
        }
    }
}

fn required_leg(
    source: &dyn RateSource,
    result: Result<RateQuote, SourceError>,
) -> Result<RateQuote, ResolveError> {
    result.map_err(|e| {
        warn!(
            source = source.source_id(),
            pair = %source.pair(),
            error = %e,
            "Required rate source failed"
        );
        if e.is_transport() {
            ResolveError::Timeout
        } else {
            ResolveError::PrimaryUnavailable
        }
    })
}
