use serde_json::Value;
use std::fs;
use std::time::{Duration, Instant};
use tasa::presenter::{CompositePresenter, RateView};
use tasa::server::{AppState, router};
use tracing::info;

mod test_utils {
    use std::time::Duration;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    pub struct Upstreams {
        pub official: MockServer,
        pub central_bank: MockServer,
        pub exchange_rate_api: MockServer,
    }

    pub fn json(body: &str) -> ResponseTemplate {
        ResponseTemplate::new(200).set_body_string(body.to_string())
    }

    pub fn slow(body: &str) -> ResponseTemplate {
        json(body).set_delay(Duration::from_secs(5))
    }

    pub async fn create_upstreams(
        usd: ResponseTemplate,
        eur: ResponseTemplate,
        central_bank: ResponseTemplate,
        exchange_rate_api: ResponseTemplate,
    ) -> Upstreams {
        let official = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/dolares/oficial"))
            .respond_with(usd)
            .mount(&official)
            .await;
        Mock::given(method("GET"))
            .and(path("/v1/euros/oficial"))
            .respond_with(eur)
            .mount(&official)
            .await;

        let ecb = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/latest"))
            .and(query_param("from", "USD"))
            .and(query_param("to", "EUR"))
            .respond_with(central_bank)
            .mount(&ecb)
            .await;

        let er = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v6/latest/EUR"))
            .respond_with(exchange_rate_api)
            .mount(&er)
            .await;

        Upstreams {
            official,
            central_bank: ecb,
            exchange_rate_api: er,
        }
    }
}

use test_utils::{create_upstreams, json, slow};

const USD_40: &str = r#"{"fuente": "oficial", "promedio": 40.0, "fechaActualizacion": "2024-03-01T00:00:00.000Z"}"#;
const ECB_092: &str = r#"{"amount": 1.0, "base": "USD", "date": "2024-03-01", "rates": {"EUR": 0.92}}"#;
const ER_108: &str = r#"{"result": "success", "base_code": "EUR", "rates": {"USD": 1.08}}"#;

/// Writes a config file pointing at the mock upstreams and starts the server on
/// an ephemeral port. Returns the server's base URL.
async fn start_app(upstreams: &test_utils::Upstreams, direct_euro: bool) -> String {
    let config_file = tempfile::NamedTempFile::new().expect("Failed to create temp file");
    let config_content = format!(
        r#"
        local_currency: "VES"
        providers:
          official:
            base_url: {}
            timeout_ms: 300
            direct_euro: {}
          central_bank:
            base_url: {}
            timeout_ms: 300
          exchange_rate_api:
            base_url: {}
            timeout_ms: 300
    "#,
        upstreams.official.uri(),
        direct_euro,
        upstreams.central_bank.uri(),
        upstreams.exchange_rate_api.uri(),
    );
    fs::write(config_file.path(), &config_content).expect("Failed to write config file");

    let config = tasa::load_config(Some(config_file.path().to_str().unwrap()))
        .expect("Failed to load config");
    let state = AppState::from_config(&config).expect("Failed to build state");

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router(state)).await.unwrap();
    });

    format!("http://{address}")
}

async fn get(url: &str) -> (u16, Value) {
    let response = reqwest::get(url).await.expect("Request failed");
    let status = response.status().as_u16();
    let body = response.json::<Value>().await.expect("Body is not JSON");
    info!(%url, status, %body, "Endpoint response");
    (status, body)
}

#[test_log::test(tokio::test)]
async fn test_composite_rate_from_inverted_bridge() {
    let upstreams = create_upstreams(
        json(USD_40),
        json("{}"),
        json(ECB_092),
        json(ER_108),
    )
    .await;
    let base_url = start_app(&upstreams, false).await;

    let (status, body) = get(&format!("{base_url}/api/tasa-eur")).await;
    assert_eq!(status, 200);
    assert_eq!(body["success"], true);

    let eur_usd = body["tasa"].as_f64().unwrap();
    assert!((eur_usd - 1.0870).abs() < 1e-4);
    assert_eq!(body["rate"], body["tasa"]);
    assert_eq!(body["tasaUSD_VES"].as_f64(), Some(40.0));
    let eur_local = body["tasaEUR_VES"].as_f64().unwrap();
    assert!((eur_local - 43.48).abs() < 0.01);
    assert_eq!(body["fecha"], "2024-03-01T00:00:00Z");
}

#[test_log::test(tokio::test)]
async fn test_direct_euro_quote_is_preferred() {
    let upstreams = create_upstreams(
        json(USD_40),
        json(r#"{"fuente": "oficial", "promedio": "44,10"}"#),
        json(ECB_092),
        json(ER_108),
    )
    .await;
    let base_url = start_app(&upstreams, true).await;

    let (status, body) = get(&format!("{base_url}/api/tasa-eur")).await;
    assert_eq!(status, 200);
    assert_eq!(body["tasaEUR_VES"].as_f64(), Some(44.1));
}

#[test_log::test(tokio::test)]
async fn test_secondary_bridge_when_central_bank_fails() {
    let upstreams = create_upstreams(
        json(USD_40),
        json("{}"),
        wiremock::ResponseTemplate::new(500),
        json(ER_108),
    )
    .await;
    let base_url = start_app(&upstreams, false).await;

    let (status, body) = get(&format!("{base_url}/api/eur-usd")).await;
    assert_eq!(status, 200);
    assert_eq!(body["tasa"].as_f64(), Some(1.08));
    assert_eq!(body["fuente"], "exchangerate-api");
    assert!(body["fecha"].is_null());

    let (_, body) = get(&format!("{base_url}/api/tasa-eur")).await;
    let eur_local = body["tasaEUR_VES"].as_f64().unwrap();
    assert!((eur_local - 43.2).abs() < 1e-9);
}

#[test_log::test(tokio::test)]
async fn test_usd_rate_endpoint() {
    let upstreams = create_upstreams(
        json(r#"{"fuente": "bcv", "precio": "36,50"}"#),
        json("{}"),
        json(ECB_092),
        json(ER_108),
    )
    .await;
    let base_url = start_app(&upstreams, false).await;

    let (status, body) = get(&format!("{base_url}/api/tasa-usd")).await;
    assert_eq!(status, 200);
    assert_eq!(body["success"], true);
    assert_eq!(body["tasa"].as_f64(), Some(36.5));
    assert_eq!(body["price"].as_f64(), Some(36.5));
    assert_eq!(body["fuente"], "bcv");
    assert!(body["fecha"].is_null());
}

#[test_log::test(tokio::test)]
async fn test_usd_source_timeout_returns_503() {
    let upstreams = create_upstreams(
        slow(USD_40),
        json("{}"),
        json(ECB_092),
        json(ER_108),
    )
    .await;
    let base_url = start_app(&upstreams, false).await;

    let (status, body) = get(&format!("{base_url}/api/tasa-eur")).await;
    assert_eq!(status, 503);
    assert_eq!(body["success"], false);
    assert!(body["error"].as_str().is_some());
    assert!(body.get("tasaEUR_VES").is_none());
}

#[test_log::test(tokio::test)]
async fn test_unparsable_usd_source_returns_500() {
    let upstreams = create_upstreams(
        json(r#"{"promedio": 0}"#),
        json("{}"),
        json(ECB_092),
        json(ER_108),
    )
    .await;
    let base_url = start_app(&upstreams, false).await;

    let (status, body) = get(&format!("{base_url}/api/tasa-usd")).await;
    assert_eq!(status, 500);
    assert_eq!(body["success"], false);
}

#[test_log::test(tokio::test)]
async fn test_all_sources_slow_bounded_by_single_budget() {
    let upstreams = create_upstreams(
        slow(USD_40),
        slow(USD_40),
        slow(ECB_092),
        slow(ER_108),
    )
    .await;
    let base_url = start_app(&upstreams, true).await;

    let started = Instant::now();
    let (status, _) = get(&format!("{base_url}/api/tasa-eur")).await;
    let elapsed = started.elapsed();

    assert_eq!(status, 503);
    // Four sources with a 300ms budget each would need 1.2s one after another.
    assert!(elapsed < Duration::from_millis(900), "took {elapsed:?}");
}

#[test_log::test(tokio::test)]
async fn test_presenter_against_running_server() {
    let upstreams = create_upstreams(
        json(USD_40),
        json("{}"),
        json(ECB_092),
        json(ER_108),
    )
    .await;
    let base_url = start_app(&upstreams, false).await;

    let mut presenter = CompositePresenter::new(&base_url, reqwest::Client::new());
    let RateView::Ready(display) = presenter.load().await.clone() else {
        panic!("Expected rates to be ready");
    };

    let output = tasa::cli::show::render(
        &RateView::Ready(display),
        tasa::presenter::format::Locale::EsVe,
        "VES",
    );
    assert!(output.contains("43,48"));
    assert!(output.contains("40,00"));
}

#[test_log::test(tokio::test)]
async fn test_presenter_shows_unavailable_when_sources_fail() {
    let upstreams = create_upstreams(
        wiremock::ResponseTemplate::new(500),
        json("{}"),
        json(ECB_092),
        json(ER_108),
    )
    .await;
    let base_url = start_app(&upstreams, false).await;

    let mut presenter = CompositePresenter::new(&base_url, reqwest::Client::new());
    let view = presenter.load().await;
    assert_eq!(view, &RateView::Unavailable);

    let output = tasa::cli::show::render(view, tasa::presenter::format::Locale::EsVe, "VES");
    assert!(output.contains(tasa::cli::show::UNAVAILABLE_MESSAGE));
    assert!(!output.contains("40,00"));
}

#[test_log::test(tokio::test)]
async fn test_cross_origin_requests_are_allowed() {
    let upstreams = create_upstreams(
        json(USD_40),
        json("{}"),
        json(ECB_092),
        json(ER_108),
    )
    .await;
    let base_url = start_app(&upstreams, false).await;
    let client = reqwest::Client::new();
    let url = format!("{base_url}/api/tasa-eur");

    let preflight = client
        .request(reqwest::Method::OPTIONS, &url)
        .header("Origin", "http://localhost:5173")
        .header("Access-Control-Request-Method", "GET")
        .send()
        .await
        .expect("Preflight failed");
    assert!(preflight.status().is_success());
    assert_eq!(preflight.headers()["access-control-allow-origin"], "*");

    let response = client
        .get(&url)
        .header("Origin", "http://localhost:5173")
        .send()
        .await
        .expect("Request failed");
    assert_eq!(response.status().as_u16(), 200);
    assert_eq!(response.headers()["access-control-allow-origin"], "*");
}
