//! Forwarding gateway.
//!
//! One operation per route. Each validates its input, makes one upstream call
//! (two for the merged crypto feed), and turns the outcome into a
//! [`ProxyResponse`]. Nothing here knows about actix; the server module only
//! converts the result into an HTTP response.

use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

use crate::client::{UpstreamClient, UpstreamRequest};
use crate::config::{CryptoFeed, ProxyConfig};
use crate::error::ProxyError;
use crate::types::{ClaudeProxyRequest, MessagesRequest};
use crate::upstream::{self, Screener};

pub const API_KEY_PREFIX: &str = "sk-ant-";
pub const STATUS_MESSAGE: &str = "Veritas API Proxy is running";

/// Status code and JSON body handed back to the caller.
#[derive(Debug, Clone, PartialEq)]
pub struct ProxyResponse {
    pub status: u16,
    pub body: Value,
}

impl ProxyResponse {
    pub fn new(status: u16, body: Value) -> Self {
        Self { status, body }
    }

    pub fn ok(body: Value) -> Self {
        Self::new(200, body)
    }
}

/// Format-only check of the caller's Anthropic key.
pub fn validate_api_key(api_key: Option<&str>) -> Result<&str, ProxyError> {
    match api_key {
        Some(key) if key.starts_with(API_KEY_PREFIX) => Ok(key),
        _ => Err(ProxyError::Validation(format!(
            "Invalid API key format. Key must start with {}",
            API_KEY_PREFIX
        ))),
    }
}

fn count_at(data: &Value, pointer: &str) -> usize {
    data.pointer(pointer)
        .and_then(|v| v.as_array())
        .map(|a| a.len())
        .unwrap_or(0)
}

pub struct Gateway {
    config: ProxyConfig,
    client: Arc<dyn UpstreamClient>,
}

impl Gateway {
    pub fn new(config: ProxyConfig, client: Arc<dyn UpstreamClient>) -> Self {
        Self { config, client }
    }

    pub fn status(&self) -> ProxyResponse {
        ProxyResponse::ok(json!({ "status": STATUS_MESSAGE }))
    }

    /// `POST /api/claude`: relays the upstream status and body as-is.
    pub async fn claude(&self, req: ClaudeProxyRequest) -> ProxyResponse {
        match self.forward_claude(req).await {
            Ok(resp) => resp,
            Err(e) if e.is_validation() => {
                warn!(error = %e, "rejected chat request");
                e.into_internal_response()
            }
            Err(e) => {
                error!(error = %e, "Proxy error");
                e.into_internal_response()
            }
        }
    }

    async fn forward_claude(
        &self,
        mut req: ClaudeProxyRequest,
    ) -> Result<ProxyResponse, ProxyError> {
        let api_key = req.api_key.take();
        let api_key = validate_api_key(api_key.as_deref())?;

        let body = MessagesRequest::from_proxy_request(req);
        let request = upstream::claude_messages(&self.config.upstreams, api_key, &body)?;
        debug!(url = %request.url, max_tokens = %body.max_tokens, "forwarding chat request");

        let resp = self.client.call_with_timeout(request, None).await?;
        let data = resp.json()?;
        Ok(ProxyResponse::new(resp.status, data))
    }

    /// `GET /api/stock/:ticker`
    pub async fn stock(&self, ticker: &str) -> ProxyResponse {
        let request = upstream::stock_chart(&self.config.upstreams, ticker);
        match self.fetch_json(request, "Yahoo", None).await {
            Ok(data) => ProxyResponse::ok(data),
            Err(e) => {
                error!(error = %e, ticker, "Stock fetch error");
                e.into_response(None)
            }
        }
    }

    /// `GET /api/crypto/:coinId`
    pub async fn crypto(&self, coin_id: &str) -> ProxyResponse {
        let request = upstream::coin_detail(&self.config.upstreams, coin_id);
        match self.fetch_json(request, "CoinGecko", None).await {
            Ok(data) => ProxyResponse::ok(data),
            Err(e) => {
                error!(error = %e, coin_id, "Crypto fetch error");
                e.into_response(None)
            }
        }
    }

    /// `GET /api/trending/gainers`
    pub async fn trending_gainers(&self) -> ProxyResponse {
        self.screener(Screener::Gainers, "gainers").await
    }

    /// `GET /api/trending/active`
    pub async fn trending_active(&self) -> ProxyResponse {
        self.screener(Screener::MostActive, "active").await
    }

    async fn screener(&self, screener: Screener, endpoint: &'static str) -> ProxyResponse {
        let request = upstream::screener(&self.config.upstreams, screener);
        match self.fetch_json(request, "Yahoo", self.trending_timeout()).await {
            Ok(data) => {
                let count = count_at(&data, "/finance/result/0/quotes");
                info!(endpoint, count, "trending stocks fetched");
                ProxyResponse::ok(data)
            }
            Err(e) => {
                error!(error = %e, endpoint, "Trending fetch error");
                e.into_response(Some(endpoint))
            }
        }
    }

    /// `GET /api/trending/crypto`, backed by the configured [`CryptoFeed`].
    pub async fn trending_crypto(&self) -> ProxyResponse {
        let result = match self.config.crypto_feed {
            CryptoFeed::Coincap => self.coincap_assets().await,
            CryptoFeed::LunarGecko => self.lunar_gecko().await,
        };

        match result {
            Ok(data) => ProxyResponse::ok(data),
            Err(e) => {
                error!(error = %e, feed = %self.config.crypto_feed, "Crypto fetch error");
                e.into_response(Some("crypto"))
            }
        }
    }

    async fn coincap_assets(&self) -> Result<Value, ProxyError> {
        let request = upstream::coincap_assets(&self.config.upstreams);
        let data = self
            .fetch_json(request, "CoinCap", self.trending_timeout())
            .await?;
        info!(count = count_at(&data, "/data"), "crypto assets fetched");
        Ok(data)
    }

    async fn lunar_gecko(&self) -> Result<Value, ProxyError> {
        let timeout = self.trending_timeout();

        let lunar = self
            .fetch_json(upstream::lunar_coins(&self.config.upstreams), "LunarCrush", timeout)
            .await?;
        let gecko = self
            .fetch_json(upstream::gecko_trending(&self.config.upstreams), "CoinGecko", timeout)
            .await?;

        info!(
            lunar = count_at(&lunar, "/data"),
            gecko = count_at(&gecko, "/coins"),
            "crypto assets fetched"
        );
        Ok(json!({ "lunar": lunar, "gecko": gecko }))
    }

    fn trending_timeout(&self) -> Option<Duration> {
        Some(self.config.trending_timeout)
    }

    /// Data routes treat any non-2xx status as a failure.
    async fn fetch_json(
        &self,
        request: UpstreamRequest,
        provider: &'static str,
        timeout: Option<Duration>,
    ) -> Result<Value, ProxyError> {
        debug!(url = %request.url, ?timeout, "forwarding upstream request");
        let resp = self.client.call_with_timeout(request, timeout).await?;
        if !resp.is_success() {
            return Err(ProxyError::UpstreamStatus {
                provider,
                status: resp.status,
            });
        }
        resp.json()
    }
}
