//! Configuration from environment variables and veritas.yml.
//!
//! ```yaml
//! proxy:
//!   port: 3000
//!   trending_timeout_secs: 10
//!   crypto_feed: lunar_gecko
//! upstreams:
//!   anthropic: "https://api.anthropic.com"
//! ```
//!
//! **Environment variables:**
//! - `PORT`: server port (default: 3000)
//! - `HOST`: bind address (default: 0.0.0.0)
//! - `VERITAS_CRYPTO_FEED`: `coincap` or `lunar_gecko` (default: coincap)

use anyhow::{Context, Result};
use serde::Deserialize;
use std::env;
use std::fmt;
use std::fs;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_TRENDING_TIMEOUT_SECS: u64 = 10;

/// Provider set backing `/api/trending/crypto`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CryptoFeed {
    /// A single call to CoinCap's asset list.
    #[default]
    Coincap,
    /// LunarCrush and CoinGecko, fetched one after the other and merged as
    /// `{lunar, gecko}`.
    LunarGecko,
}

impl FromStr for CryptoFeed {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "coincap" => Ok(Self::Coincap),
            "lunar_gecko" | "lunar-gecko" => Ok(Self::LunarGecko),
            other => anyhow::bail!("unknown crypto feed: {}", other),
        }
    }
}

impl fmt::Display for CryptoFeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Coincap => f.write_str("coincap"),
            Self::LunarGecko => f.write_str("lunar_gecko"),
        }
    }
}

/// Base URLs of every upstream the proxy talks to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamUrls {
    pub anthropic: String,
    pub yahoo: String,
    pub coingecko: String,
    pub coincap: String,
    pub lunarcrush: String,
}

impl Default for UpstreamUrls {
    fn default() -> Self {
        Self {
            anthropic: "https://api.anthropic.com".to_string(),
            yahoo: "https://query1.finance.yahoo.com".to_string(),
            coingecko: "https://api.coingecko.com".to_string(),
            coincap: "https://api.coincap.io".to_string(),
            lunarcrush: "https://lunarcrush.com".to_string(),
        }
    }
}

impl UpstreamUrls {
    /// Point every upstream at the same base URL.
    pub fn all(base: &str) -> Self {
        let base = base.trim_end_matches('/').to_string();
        Self {
            anthropic: base.clone(),
            yahoo: base.clone(),
            coingecko: base.clone(),
            coincap: base.clone(),
            lunarcrush: base,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ProxyConfig {
    pub host: String,
    pub port: u16,
    pub trending_timeout: Duration,
    pub crypto_feed: CryptoFeed,
    pub upstreams: UpstreamUrls,
}

#[derive(Debug, Default, Deserialize)]
struct VeritasYamlConfig {
    #[serde(default)]
    proxy: ProxySection,
    #[serde(default)]
    upstreams: UpstreamSection,
}

#[derive(Debug, Default, Deserialize)]
struct ProxySection {
    host: Option<String>,
    port: Option<u16>,
    trending_timeout_secs: Option<u64>,
    crypto_feed: Option<CryptoFeed>,
}

#[derive(Debug, Default, Deserialize)]
struct UpstreamSection {
    anthropic: Option<String>,
    yahoo: Option<String>,
    coingecko: Option<String>,
    coincap: Option<String>,
    lunarcrush: Option<String>,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(DEFAULT_PORT),
            trending_timeout: Duration::from_secs(DEFAULT_TRENDING_TIMEOUT_SECS),
            crypto_feed: env::var("VERITAS_CRYPTO_FEED")
                .ok()
                .and_then(|f| f.parse().ok())
                .unwrap_or_default(),
            upstreams: UpstreamUrls::default(),
        }
    }
}

impl ProxyConfig {
    pub fn from_yaml_file(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read veritas.yml from {:?}", path))?;
        Self::from_yaml_str(&content)
    }

    pub fn from_yaml_str(content: &str) -> Result<Self> {
        let yaml: VeritasYamlConfig = if content.trim().is_empty() {
            VeritasYamlConfig::default()
        } else {
            serde_yaml_ng::from_str(content).with_context(|| "Failed to parse veritas.yml")?
        };

        let defaults = Self::default();
        let trim = |url: String| url.trim_end_matches('/').to_string();
        let up = yaml.upstreams;

        Ok(Self {
            host: yaml.proxy.host.unwrap_or(defaults.host),
            port: yaml.proxy.port.unwrap_or(defaults.port),
            trending_timeout: yaml
                .proxy
                .trending_timeout_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.trending_timeout),
            crypto_feed: yaml.proxy.crypto_feed.unwrap_or(defaults.crypto_feed),
            upstreams: UpstreamUrls {
                anthropic: up.anthropic.map(trim).unwrap_or(defaults.upstreams.anthropic),
                yahoo: up.yahoo.map(trim).unwrap_or(defaults.upstreams.yahoo),
                coingecko: up.coingecko.map(trim).unwrap_or(defaults.upstreams.coingecko),
                coincap: up.coincap.map(trim).unwrap_or(defaults.upstreams.coincap),
                lunarcrush: up.lunarcrush.map(trim).unwrap_or(defaults.upstreams.lunarcrush),
            },
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
