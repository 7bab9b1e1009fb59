use super::AppState;
use super::error::ApiError;
use crate::core::RateQuote;
use axum::{Json, extract::State};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use std::sync::Arc;

#[derive(Debug, Serialize)]
pub struct UsdRateResponse {
    pub success: bool,
    pub tasa: f64,
    pub price: f64,
    pub fuente: String,
    pub fecha: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CompositeRateResponse {
    pub success: bool,
    /// EUR/USD.
    pub tasa: f64,
    pub rate: f64,
    #[serde(rename = "tasaEUR_VES")]
    pub tasa_eur_local: f64,
    #[serde(rename = "tasaUSD_VES")]
    pub tasa_usd_local: f64,
    pub fecha: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct EurUsdResponse {
    pub success: bool,
    pub tasa: f64,
    pub rate: f64,
    pub fuente: String,
    pub fecha: Option<String>,
}

fn fecha(observed_at: Option<DateTime<Utc>>) -> Option<String> {
    observed_at.map(|dt| dt.to_rfc3339_opts(SecondsFormat::Secs, true))
}

pub async fn usd_rate_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<UsdRateResponse>, ApiError> {
    let quote: RateQuote = state.resolver.resolve_usd_local().await?;

    Ok(Json(UsdRateResponse {
        success: true,
        tasa: quote.value,
        price: quote.value,
        fuente: quote.source_id,
        fecha: fecha(quote.observed_at),
    }))
}

pub async fn composite_rate_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<CompositeRateResponse>, ApiError> {
    let composite = state.resolver.resolve().await?;

    Ok(Json(CompositeRateResponse {
        success: true,
        tasa: composite.bridge.value,
        rate: composite.bridge.value,
        tasa_eur_local: composite.derived.value,
        tasa_usd_local: composite.primary.value,
        fecha: fecha(composite.primary.observed_at),
    }))
}

pub async fn eur_usd_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<EurUsdResponse>, ApiError> {
    let quote = state.resolver.resolve_eur_usd().await?;

    Ok(Json(EurUsdResponse {
        success: true,
        tasa: quote.value,
        rate: quote.value,
        fuente: quote.source_id,
        fecha: fecha(quote.observed_at),
    }))
}
