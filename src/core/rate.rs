//! Rate quotes and the composite EUR to local currency rate.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt::Display;

/// Source id given to a derived quote that was multiplied out of two legs.
pub const COMPUTED_SOURCE: &str = "computed";

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct CurrencyPair {
    pub base: String,
    pub quote: String,
}

impl CurrencyPair {
    pub fn new(base: &str, quote: &str) -> Self {
        Self {
            base: base.to_uppercase(),
            quote: quote.to_uppercase(),
        }
    }

    pub fn inverse(&self) -> Self {
        Self {
            base: self.quote.clone(),
            quote: self.base.clone(),
        }
    }
}

impl Display for CurrencyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.base, self.quote)
    }
}

/// One unit of `pair.base` is worth `value` units of `pair.quote`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RateQuote {
    pub source_id: String,
    pub pair: CurrencyPair,
    pub value: f64,
    pub observed_at: Option<DateTime<Utc>>,
}

impl RateQuote {
    /// Returns `None` for non-finite or non-positive values, which count as an absent quote.
    pub fn new(
        source_id: &str,
        pair: CurrencyPair,
        value: f64,
        observed_at: Option<DateTime<Utc>>,
    ) -> Option<Self> {
        if !value.is_finite() || value <= 0.0 {
            return None;
        }
        Some(Self {
            source_id: source_id.to_string(),
            pair,
            value,
            observed_at,
        })
    }

    /// Reciprocal of this quote, expressed over the inverse pair.
    pub fn inverted(&self) -> Option<Self> {
        Self::new(
            &self.source_id,
            self.pair.inverse(),
            1.0 / self.value,
            self.observed_at,
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Derivation {
    /// EUR to local was published by a source.
    Direct,
    /// EUR to local is bridge × primary.
    Computed,
}

/// USD→local, EUR→USD and EUR→local, resolved together for one request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompositeRate {
    pub primary: RateQuote,
    pub bridge: RateQuote,
    pub derived: RateQuote,
    pub derivation: Derivation,
    pub resolved_at: DateTime<Utc>,
}

impl CompositeRate {
    /// Builds the composite from its legs. A direct EUR→local quote always
    /// wins over the computed one.
    pub fn compose(
        primary: RateQuote,
        bridge: RateQuote,
        direct: Option<RateQuote>,
        resolved_at: DateTime<Utc>,
    ) -> Option<Self> {
        let (derived, derivation) = match direct {
            Some(quote) => (quote, Derivation::Direct),
            None => {
                let pair = CurrencyPair::new(&bridge.pair.base, &primary.pair.quote);
                let computed = RateQuote::new(
                    COMPUTED_SOURCE,
                    pair,
                    bridge.value * primary.value,
                    primary.observed_at,
                )?;
                (computed, Derivation::Computed)
            }
        };

        Some(Self {
            primary,
            bridge,
            derived,
            derivation,
            resolved_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quote(source: &str, base: &str, quote_ccy: &str, value: f64) -> RateQuote {
        RateQuote::new(source, CurrencyPair::new(base, quote_ccy), value, None).unwrap()
    }

    #[test]
    fn test_quote_rejects_invalid_values() {
        let pair = CurrencyPair::new("USD", "VES");
        assert!(RateQuote::new("oficial", pair.clone(), 0.0, None).is_none());
        assert!(RateQuote::new("oficial", pair.clone(), -5.0, None).is_none());
        assert!(RateQuote::new("oficial", pair.clone(), f64::NAN, None).is_none());
        assert!(RateQuote::new("oficial", pair.clone(), f64::INFINITY, None).is_none());
        assert!(RateQuote::new("oficial", pair, 36.5, None).is_some());
    }

    #[test]
    fn test_pair_is_normalized_and_displayed() {
        let pair = CurrencyPair::new("eur", "usd");
        assert_eq!(pair.to_string(), "EUR/USD");
        assert_eq!(pair.inverse().to_string(), "USD/EUR");
    }

    #[test]
    fn test_inverted_flips_pair_and_value() {
        let usd_eur = quote("ecb", "USD", "EUR", 0.92);
        let eur_usd = usd_eur.inverted().unwrap();
        assert_eq!(eur_usd.pair, CurrencyPair::new("EUR", "USD"));
        assert!((eur_usd.value - 1.0 / 0.92).abs() < 1e-12);
        assert_eq!(eur_usd.source_id, "ecb");
    }

    #[test]
    fn test_compose_computes_derived_leg() {
        for (usd_local, eur_usd) in [(40.0, 1.087), (36.5, 1.05), (0.5, 2.0), (1234.56, 0.99)] {
            let composite = CompositeRate::compose(
                quote("oficial", "USD", "VES", usd_local),
                quote("ecb", "EUR", "USD", eur_usd),
                None,
                Utc::now(),
            )
            .unwrap();

            assert_eq!(composite.derivation, Derivation::Computed);
            assert_eq!(composite.derived.source_id, COMPUTED_SOURCE);
            assert_eq!(composite.derived.pair, CurrencyPair::new("EUR", "VES"));
            assert!((composite.derived.value - eur_usd * usd_local).abs() < 1e-9);
        }
    }

    #[test]
    fn test_compose_prefers_direct_quote() {
        let composite = CompositeRate::compose(
            quote("oficial", "USD", "VES", 40.0),
            quote("ecb", "EUR", "USD", 1.08),
            Some(quote("oficial", "EUR", "VES", 44.1)),
            Utc::now(),
        )
        .unwrap();

        assert_eq!(composite.derivation, Derivation::Direct);
        assert_eq!(composite.derived.value, 44.1);
    }
}
