pub mod central_bank;
pub mod exchange_rate_api;
pub mod official;
pub mod util;

use crate::core::config::AppConfig;
use crate::core::resolver::RateSources;
use crate::core::source::RateSource;
use central_bank::CentralBankSource;
use exchange_rate_api::ExchangeRateApiSource;
use official::{OfficialLeg, OfficialRateSource};
use std::sync::Arc;

/// Wires the configured rate APIs into the sources a resolver needs.
pub fn build_sources(config: &AppConfig, client: reqwest::Client) -> RateSources {
    let providers = &config.providers;
    let local_currency = &config.local_currency;

    let official = |leg| {
        Arc::new(OfficialRateSource::new(
            &providers.official.base_url,
            client.clone(),
            providers.official.timeout(),
            leg,
            local_currency,
        ))
    };

    let eur_local_direct = providers
        .official
        .direct_euro
        .then(|| official(OfficialLeg::Euro) as Arc<dyn RateSource>);

    RateSources {
        usd_local: official(OfficialLeg::Dollar),
        eur_local_direct,
        bridge_primary: Arc::new(CentralBankSource::new(
            &providers.central_bank.base_url,
            client.clone(),
            providers.central_bank.timeout(),
        )),
        bridge_secondary: Arc::new(ExchangeRateApiSource::new(
            &providers.exchange_rate_api.base_url,
            client,
            providers.exchange_rate_api.timeout(),
        )),
    }
}
