//! Route table and dispatch.
//!
//! The table is a plain list of `(method, path pattern) -> Endpoint` entries
//! built once and handed to the server at startup. Patterns use `:name` for
//! path parameters.

use tracing::error;

use crate::client::HttpMethod;
use crate::error::ProxyError;
use crate::gateway::{Gateway, ProxyResponse};
use crate::types::ClaudeProxyRequest;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Status,
    Claude,
    Stock,
    Crypto,
    TrendingGainers,
    TrendingActive,
    TrendingCrypto,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    pub method: HttpMethod,
    pub pattern: &'static str,
    pub endpoint: Endpoint,
}

impl Route {
    pub const fn new(method: HttpMethod, pattern: &'static str, endpoint: Endpoint) -> Self {
        Self {
            method,
            pattern,
            endpoint,
        }
    }

    /// The pattern in actix-web syntax (`:ticker` becomes `{ticker}`).
    pub fn actix_path(&self) -> String {
        self.pattern
            .split('/')
            .map(|segment| match segment.strip_prefix(':') {
                Some(name) => format!("{{{}}}", name),
                None => segment.to_string(),
            })
            .collect::<Vec<_>>()
            .join("/")
    }
}

#[derive(Debug, Clone)]
pub struct RouteTable {
    routes: Vec<Route>,
}

impl RouteTable {
    pub fn new(routes: Vec<Route>) -> Self {
        Self { routes }
    }

    /// Every route the proxy serves.
    pub fn standard() -> Self {
        use Endpoint::*;
        use HttpMethod::*;

        Self::new(vec![
            Route::new(Get, "/", Status),
            Route::new(Post, "/api/claude", Claude),
            Route::new(Get, "/api/stock/:ticker", Stock),
            Route::new(Get, "/api/crypto/:coinId", Crypto),
            Route::new(Get, "/api/trending/gainers", TrendingGainers),
            Route::new(Get, "/api/trending/active", TrendingActive),
            Route::new(Get, "/api/trending/crypto", TrendingCrypto),
        ])
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }
}

impl Default for RouteTable {
    fn default() -> Self {
        Self::standard()
    }
}

/// Path parameters captured for one request.
#[derive(Debug, Clone, Default)]
pub struct RouteParams {
    values: Vec<(String, String)>,
}

impl RouteParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.push((name.into(), value.into()));
        self
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    fn require(&self, name: &str) -> Result<&str, ProxyError> {
        self.get(name)
            .ok_or_else(|| ProxyError::Internal(format!("missing path parameter: {}", name)))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for RouteParams {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}

/// An empty body reads as `{}`, so a bodyless chat request fails the key check.
pub fn parse_claude_body(body: &[u8]) -> Result<ClaudeProxyRequest, ProxyError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(ClaudeProxyRequest::default());
    }
    serde_json::from_slice(body)
        .map_err(|e| ProxyError::Internal(format!("invalid request body: {}", e)))
}

/// Run the gateway operation behind `endpoint`.
pub async fn dispatch(
    gateway: &Gateway,
    endpoint: Endpoint,
    params: &RouteParams,
    body: &[u8],
) -> ProxyResponse {
    match endpoint {
        Endpoint::Status => gateway.status(),
        Endpoint::Claude => match parse_claude_body(body) {
            Ok(req) => gateway.claude(req).await,
            Err(e) => {
                error!(error = %e, "Proxy error");
                e.into_internal_response()
            }
        },
        Endpoint::Stock => match params.require("ticker") {
            Ok(ticker) => gateway.stock(ticker).await,
            Err(e) => e.into_response(None),
        },
        Endpoint::Crypto => match params.require("coinId") {
            Ok(coin_id) => gateway.crypto(coin_id).await,
            Err(e) => e.into_response(None),
        },
        Endpoint::TrendingGainers => gateway.trending_gainers().await,
        Endpoint::TrendingActive => gateway.trending_active().await,
        Endpoint::TrendingCrypto => gateway.trending_crypto().await,
    }
}
