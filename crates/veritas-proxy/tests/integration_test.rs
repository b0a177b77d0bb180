//! End-to-end tests: actix app + real reqwest client against an httpmock upstream.

use std::fs;
use std::sync::Arc;
use std::time::{Duration, Instant};

use actix_cors::Cors;
use actix_web::{http::Method, http::StatusCode, test, web, App};
use httpmock::prelude::*;
use serde_json::{json, Value};
use tempfile::TempDir;

use veritas_proxy::config::UpstreamUrls;
use veritas_proxy::testing::StubClient;
use veritas_proxy::{
    configure_routes, CryptoFeed, Gateway, ProxyConfig, ReqwestClient, RouteTable, UpstreamClient,
};

fn config_for(server: &MockServer) -> ProxyConfig {
    ProxyConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        trending_timeout: Duration::from_millis(300),
        crypto_feed: CryptoFeed::Coincap,
        upstreams: UpstreamUrls::all(&server.base_url()),
    }
}

fn live_gateway(config: ProxyConfig) -> web::Data<Gateway> {
    let client = ReqwestClient::new().unwrap();
    web::Data::new(Gateway::new(config, Arc::new(client)))
}

macro_rules! init_app {
    ($gateway:expr) => {
        test::init_service(
            App::new()
                .app_data($gateway)
                .wrap(Cors::permissive())
                .configure(|cfg| configure_routes(cfg, &RouteTable::standard())),
        )
        .await
    };
}

#[actix_web::test]
async fn test_status_route() {
    let stub: Arc<dyn UpstreamClient> = Arc::new(StubClient::new());
    let gateway = web::Data::new(Gateway::new(ProxyConfig::default(), stub));
    let app = init_app!(gateway);

    let resp = test::call_service(&app, test::TestRequest::get().uri("/").to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body, json!({ "status": "Veritas API Proxy is running" }));
}

#[actix_web::test]
async fn test_claude_rejects_bad_key_without_upstream_call() {
    let server = MockServer::start_async().await;
    let upstream = server
        .mock_async(|when, then| {
            when.method(POST).path("/v1/messages");
            then.status(200).json_body(json!({}));
        })
        .await;
    let app = init_app!(live_gateway(config_for(&server)));

    let req = test::TestRequest::post()
        .uri("/api/claude")
        .set_json(json!({ "apiKey": "bad", "messages": [] }))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(
        body,
        json!({ "error": "Invalid API key format. Key must start with sk-ant-" })
    );
    assert_eq!(upstream.hits_async().await, 0);
}

#[actix_web::test]
async fn test_claude_forwards_and_relays() {
    let server = MockServer::start_async().await;
    let reply = json!({
        "id": "msg_01",
        "type": "message",
        "content": [{"type": "text", "text": "Mostly true."}]
    });
    let upstream = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/v1/messages")
                .header("x-api-key", "sk-ant-test")
                .header("anthropic-version", "2023-06-01")
                .json_body(json!({
                    "model": "claude-sonnet-4-20250514",
                    "max_tokens": 1000,
                    "system": "You verify claims.",
                    "messages": [{"role": "user", "content": "The moon is cheese."}]
                }));
            then.status(200).json_body(reply.clone());
        })
        .await;
    let app = init_app!(live_gateway(config_for(&server)));

    let req = test::TestRequest::post()
        .uri("/api/claude")
        .set_json(json!({
            "apiKey": "sk-ant-test",
            "system": "You verify claims.",
            "messages": [{"role": "user", "content": "The moon is cheese."}]
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body, reply);
    upstream.assert_async().await;
}

#[actix_web::test]
async fn test_claude_relays_upstream_error_status() {
    let server = MockServer::start_async().await;
    let overloaded = json!({"type": "error", "error": {"type": "overloaded_error"}});
    server
        .mock_async(|when, then| {
            when.method(POST).path("/v1/messages");
            then.status(529).json_body(overloaded.clone());
        })
        .await;
    let app = init_app!(live_gateway(config_for(&server)));

    let req = test::TestRequest::post()
        .uri("/api/claude")
        .set_json(json!({ "apiKey": "sk-ant-test", "messages": [], "maxTokens": 50 }))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status().as_u16(), 529);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body, overloaded);
}

#[actix_web::test]
async fn test_stock_route_interpolates_ticker() {
    let server = MockServer::start_async().await;
    let chart = json!({"chart": {"result": [{"meta": {"symbol": "BRK.B"}}], "error": null}});
    let upstream = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/v8/finance/chart/BRK.B")
                .query_param("interval", "1d")
                .query_param("range", "1d");
            then.status(200).json_body(chart.clone());
        })
        .await;
    let app = init_app!(live_gateway(config_for(&server)));

    let resp = test::call_service(
        &app,
        test::TestRequest::get().uri("/api/stock/BRK.B").to_request(),
    )
    .await;

    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body, chart);
    upstream.assert_async().await;
}

/// Path parameters arrive percent-decoded from the actix router, except `/`
/// (`%2F`), which stays encoded. The decoded value goes into the template
/// unchanged, so a decoded `?` or `#` splits the upstream URL.
#[actix_web::test]
async fn test_stock_ticker_special_characters() {
    let stub = Arc::new(StubClient::new());
    let client: Arc<dyn UpstreamClient> = stub.clone();
    let config = ProxyConfig {
        upstreams: UpstreamUrls::all("http://upstream.test"),
        ..ProxyConfig::default()
    };
    let app = init_app!(web::Data::new(Gateway::new(config, client)));

    let cases = [
        ("A%20B", "/v8/finance/chart/A%20B", Some("interval=1d&range=1d"), None),
        ("A%2FB", "/v8/finance/chart/A%2FB", Some("interval=1d&range=1d"), None),
        ("A%3Fx", "/v8/finance/chart/A", Some("x?interval=1d&range=1d"), None),
        ("A%23x", "/v8/finance/chart/A", None, Some("x?interval=1d&range=1d")),
    ];

    for (i, (ticker, path, query, fragment)) in cases.iter().enumerate() {
        let uri = format!("/api/stock/{}", ticker);
        let resp = test::call_service(&app, test::TestRequest::get().uri(&uri).to_request()).await;
        assert_eq!(resp.status(), StatusCode::OK, "{}", ticker);

        let requests = stub.requests();
        let url = reqwest::Url::parse(&requests[i].url).unwrap();
        assert_eq!(url.path(), *path, "{}", ticker);
        assert_eq!(url.query(), *query, "{}", ticker);
        assert_eq!(url.fragment(), *fragment, "{}", ticker);
    }
    assert_eq!(stub.call_count(), cases.len());
}

#[actix_web::test]
async fn test_crypto_route_upstream_failure() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/v3/coins/bitcoin");
            then.status(429).body("rate limited");
        })
        .await;
    let app = init_app!(live_gateway(config_for(&server)));

    let resp = test::call_service(
        &app,
        test::TestRequest::get().uri("/api/crypto/bitcoin").to_request(),
    )
    .await;

    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body, json!({ "error": "CoinGecko API returned 429" }));
}

#[actix_web::test]
async fn test_gainers_route() {
    let server = MockServer::start_async().await;
    let screener = json!({
        "finance": {"result": [{"quotes": [{"symbol": "NVDA"}, {"symbol": "AMD"}]}]}
    });
    let upstream = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/v1/finance/screener")
                .query_param("sortField", "percentchange")
                .query_param("count", "10");
            then.status(200).json_body(screener.clone());
        })
        .await;
    let app = init_app!(live_gateway(config_for(&server)));

    let resp = test::call_service(
        &app,
        test::TestRequest::get().uri("/api/trending/gainers").to_request(),
    )
    .await;

    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body, screener);
    upstream.assert_async().await;
}

#[actix_web::test]
async fn test_active_route_times_out() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/v1/finance/screener");
            then.status(200)
                .delay(Duration::from_secs(5))
                .json_body(json!({}));
        })
        .await;
    let app = init_app!(live_gateway(config_for(&server)));

    let started = Instant::now();
    let resp = test::call_service(
        &app,
        test::TestRequest::get().uri("/api/trending/active").to_request(),
    )
    .await;

    assert!(started.elapsed() < Duration::from_secs(3));
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["endpoint"], "active");
    assert_eq!(body["error"], "request timed out after 300ms");
}

#[actix_web::test]
async fn test_trending_crypto_lunar_gecko() {
    let server = MockServer::start_async().await;
    let lunar = json!({"data": [{"symbol": "BTC", "galaxy_score": 72}]});
    let gecko = json!({"coins": [{"item": {"id": "solana"}}]});
    server
        .mock_async(|when, then| {
            when.method(GET).path("/api4/public/coins/list/v1");
            then.status(200).json_body(lunar.clone());
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/v3/search/trending");
            then.status(200).json_body(gecko.clone());
        })
        .await;

    let mut config = config_for(&server);
    config.crypto_feed = CryptoFeed::LunarGecko;
    let app = init_app!(live_gateway(config));

    let resp = test::call_service(
        &app,
        test::TestRequest::get().uri("/api/trending/crypto").to_request(),
    )
    .await;

    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body, json!({ "lunar": lunar, "gecko": gecko }));
}

#[actix_web::test]
async fn test_trending_crypto_unreachable_upstream() {
    let config = ProxyConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        trending_timeout: Duration::from_secs(2),
        crypto_feed: CryptoFeed::Coincap,
        // Nothing listens on port 9 locally.
        upstreams: UpstreamUrls::all("http://127.0.0.1:9"),
    };
    let app = init_app!(live_gateway(config));

    let resp = test::call_service(
        &app,
        test::TestRequest::get().uri("/api/trending/crypto").to_request(),
    )
    .await;

    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["endpoint"], "crypto");
    assert!(body["error"].is_string());
}

#[actix_web::test]
async fn test_custom_route_table() {
    use veritas_proxy::client::HttpMethod;
    use veritas_proxy::routes::{Endpoint, Route};

    let stub = Arc::new(StubClient::new());
    let client: Arc<dyn UpstreamClient> = stub.clone();
    let gateway = web::Data::new(Gateway::new(ProxyConfig::default(), client));
    let table = RouteTable::new(vec![
        Route::new(HttpMethod::Get, "/healthz", Endpoint::Status),
        Route::new(HttpMethod::Get, "/quote/:ticker", Endpoint::Stock),
    ]);
    let app = test::init_service(
        App::new()
            .app_data(gateway)
            .configure(|cfg| configure_routes(cfg, &table)),
    )
    .await;

    let req = test::TestRequest::get().uri("/healthz").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let req = test::TestRequest::get().uri("/quote/NVDA").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(stub.requests()[0].url.contains("/v8/finance/chart/NVDA?"));

    for uri in ["/", "/api/stock/NVDA"] {
        let resp = test::call_service(&app, test::TestRequest::get().uri(uri).to_request()).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND, "{}", uri);
    }
    assert_eq!(stub.call_count(), 1);
}

#[actix_web::test]
async fn test_cors_preflight_any_origin() {
    let stub: Arc<dyn UpstreamClient> = Arc::new(StubClient::new());
    let gateway = web::Data::new(Gateway::new(ProxyConfig::default(), stub));
    let app = init_app!(gateway);

    let req = test::TestRequest::default()
        .method(Method::OPTIONS)
        .uri("/api/claude")
        .insert_header(("Origin", "https://veritas.example"))
        .insert_header(("Access-Control-Request-Method", "POST"))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert!(resp.status().is_success());
    assert!(resp
        .headers()
        .contains_key("access-control-allow-origin"));
}

#[core::prelude::v1::test]
fn test_config_from_yaml_file() {
    let dir = TempDir::new().unwrap();
    let config_path = dir.path().join("veritas.yml");

    fs::write(
        &config_path,
        r#"
proxy:
  port: 8080
  crypto_feed: lunar_gecko
upstreams:
  coincap: "http://localhost:7000/"
"#,
    )
    .unwrap();

    let config = ProxyConfig::from_yaml_file(&config_path).unwrap();

    assert_eq!(config.port, 8080);
    assert_eq!(config.crypto_feed, CryptoFeed::LunarGecko);
    assert_eq!(config.upstreams.coincap, "http://localhost:7000");
    assert_eq!(config.upstreams.yahoo, "https://query1.finance.yahoo.com");
    assert_eq!(config.trending_timeout, Duration::from_secs(10));
}

#[core::prelude::v1::test]
fn test_config_missing_file() {
    let dir = TempDir::new().unwrap();
    assert!(ProxyConfig::from_yaml_file(dir.path().join("absent.yml")).is_err());
}
