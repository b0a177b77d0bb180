//! Outbound HTTP capability.
//!
//! The gateway never talks to `reqwest` directly. It hands an
//! [`UpstreamRequest`] to an [`UpstreamClient`], which lets tests swap in a
//! stub that records calls or never answers.

use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;

use crate::error::ProxyError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
}

/// A fully resolved outbound call: target URL, method, headers and optional JSON body.
#[derive(Debug, Clone, PartialEq)]
pub struct UpstreamRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<Value>,
}

impl UpstreamRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: HttpMethod::Get,
            url: url.into(),
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn post_json(url: impl Into<String>, body: Value) -> Self {
        Self {
            method: HttpMethod::Post,
            url: url.into(),
            headers: vec![("content-type".to_string(), "application/json".to_string())],
            body: Some(body),
        }
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Status and raw body of an upstream reply.
#[derive(Debug, Clone, PartialEq)]
pub struct UpstreamResponse {
    pub status: u16,
    pub body: String,
}

impl UpstreamResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn json_body(status: u16, body: &Value) -> Self {
        Self::new(status, body.to_string())
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn json(&self) -> Result<Value, ProxyError> {
        Ok(serde_json::from_str(&self.body)?)
    }
}

#[async_trait]
pub trait UpstreamClient: Send + Sync {
    /// Issue the call and wait for the complete response body.
    async fn call(&self, request: UpstreamRequest) -> Result<UpstreamResponse, ProxyError>;

    /// Issue the call, giving up after `timeout` when one is set.
    ///
    /// Expiry drops the in-flight call and yields [`ProxyError::Timeout`].
    async fn call_with_timeout(
        &self,
        request: UpstreamRequest,
        timeout: Option<Duration>,
    ) -> Result<UpstreamResponse, ProxyError> {
        let Some(limit) = timeout else {
            return self.call(request).await;
        };

        match tokio::time::timeout(limit, self.call(request)).await {
            Ok(result) => result,
            Err(_) => Err(ProxyError::Timeout(limit.as_millis())),
        }
    }
}

/// [`UpstreamClient`] backed by a shared `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct ReqwestClient {
    client: reqwest::Client,
}

impl ReqwestClient {
    pub fn new() -> Result<Self, ProxyError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("veritas-proxy/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl UpstreamClient for ReqwestClient {
    async fn call(&self, request: UpstreamRequest) -> Result<UpstreamResponse, ProxyError> {
        let mut builder = match request.method {
            HttpMethod::Get => self.client.get(&request.url),
            HttpMethod::Post => self.client.post(&request.url),
        };

        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;

        Ok(UpstreamResponse { status, body })
    }
}
