use crate::core::source::SourceError;
use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::debug;

/// Builds the HTTP client shared by all rate sources.
pub fn http_client() -> anyhow::Result<reqwest::Client> {
    Ok(reqwest::Client::builder().user_agent("tasa/1.0").build()?)
}

/// Performs one GET request and decodes the JSON body into `T`.
pub async fn get_json<T: DeserializeOwned>(
    client: &reqwest::Client,
    url: &str,
) -> Result<T, SourceError> {
    debug!("Requesting rate data from {}", url);

    let response = client.get(url).send().await.map_err(transport_error)?;

    let status = response.status();
    if !status.is_success() {
        return Err(SourceError::HttpError(status.as_u16()));
    }

    let text = response.text().await.map_err(transport_error)?;
    serde_json::from_str(&text).map_err(|e| {
        debug!(error = %e, response = %text, "Failed to parse rate response");
        SourceError::UnparsableResponse(e.to_string())
    })
}

fn transport_error(e: reqwest::Error) -> SourceError {
    if e.is_timeout() {
        SourceError::Timeout
    } else {
        SourceError::Unreachable(e.to_string())
    }
}

/// A rate field that providers send either as a JSON number or as text.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum RateValue {
    Number(f64),
    Text(String),
}

impl RateValue {
    /// The positive, finite rate this field holds, if any.
    pub fn to_rate(&self) -> Option<f64> {
        match self {
            RateValue::Number(n) => valid_rate(*n),
            RateValue::Text(s) => parse_rate_text(s),
        }
    }
}

fn valid_rate(value: f64) -> Option<f64> {
    (value.is_finite() && value > 0.0).then_some(value)
}

/// Parses rates such as `36,50`, `36.50`, `1.234,56` or `1,234.56`.
///
/// When both `,` and `.` appear, the right-most one is the decimal mark.
/// A single kind of separator repeated more than once is digit grouping.
pub fn parse_rate_text(text: &str) -> Option<f64> {
    let text: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    if text.is_empty() {
        return None;
    }

    let commas = text.matches(',').count();
    let dots = text.matches('.').count();

    let normalized = match (commas, dots) {
        (0, 0) => text,
        (_, 0) if commas > 1 => text.replace(',', ""),
        (_, 0) => text.replace(',', "."),
        (0, _) if dots > 1 => text.replace('.', ""),
        (0, _) => text,
        _ => {
            let last_comma = text.rfind(',')?;
            let last_dot = text.rfind('.')?;
            if last_comma > last_dot {
                text.replace('.', "").replace(',', ".")
            } else {
                text.replace(',', "")
            }
        }
    };

    normalized.parse::<f64>().ok().and_then(valid_rate)
}

/// Parses the timestamp formats used by the rate providers.
pub fn parse_observed_at(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(text) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}
