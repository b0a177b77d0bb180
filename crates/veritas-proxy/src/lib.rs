//! Veritas API Proxy - HTTP proxy in front of a few third-party REST APIs.
//!
//! The browser client can't call Anthropic, Yahoo Finance or the crypto data
//! providers directly (CORS, missing headers), so this crate relays its calls:
//! - `POST /api/claude` forwards a chat request using the caller's own key.
//! - `GET /api/stock/:ticker` and `GET /api/crypto/:coinId` fetch quote data.
//! - `GET /api/trending/*` returns screener and trending-asset lists.
//!
//! Every route is a single request/response forward with an optional timeout.
//! Failures are normalized into a small JSON error body.

pub mod client;
pub mod config;
pub mod error;
pub mod gateway;
pub mod routes;
pub mod server;
#[cfg(any(test, feature = "testing"))]
pub mod testing;
pub mod types;
pub mod upstream;

pub use client::{ReqwestClient, UpstreamClient};
pub use config::{CryptoFeed, ProxyConfig};
pub use error::ProxyError;
pub use gateway::{Gateway, ProxyResponse};
pub use routes::RouteTable;
pub use server::{configure_routes, serve};
