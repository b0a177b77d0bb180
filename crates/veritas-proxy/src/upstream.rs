//! Upstream URL templates.
//!
//! Every route proxies to one fixed endpoint. Path parameters are interpolated
//! as given; `reqwest` normalizes anything that is not valid in a URL path.

use serde_json::Value;

use crate::client::UpstreamRequest;
use crate::config::UpstreamUrls;
use crate::error::ProxyError;
use crate::types::MessagesRequest;

pub const ANTHROPIC_VERSION: &str = "2023-06-01";

const SCREENER_PREFIX: &str = "crumb=&lang=en-US&region=US&formatted=true&corsDomain=finance.yahoo.com&count=10&offset=0&quoteType=EQUITY";

// {"operator":"AND","operands":[{"operator":"or","operands":[{"operator":"EQ","operands":["region","us"]}]},
//  {"operator":"gt","operands":["intradaymarketcap",2000000000]},{"operator":"eq","operands":["exchange","NMS"]}]}
const GAINERS_QUERY: &str = "%7B%22operator%22%3A%22AND%22%2C%22operands%22%3A%5B%7B%22operator%22%3A%22or%22%2C%22operands%22%3A%5B%7B%22operator%22%3A%22EQ%22%2C%22operands%22%3A%5B%22region%22%2C%22us%22%5D%7D%5D%7D%2C%7B%22operator%22%3A%22gt%22%2C%22operands%22%3A%5B%22intradaymarketcap%22%2C2000000000%5D%7D%2C%7B%22operator%22%3A%22eq%22%2C%22operands%22%3A%5B%22exchange%22%2C%22NMS%22%5D%7D%5D%7D";

// Same as above without the exchange filter.
const ACTIVE_QUERY: &str = "%7B%22operator%22%3A%22AND%22%2C%22operands%22%3A%5B%7B%22operator%22%3A%22or%22%2C%22operands%22%3A%5B%7B%22operator%22%3A%22EQ%22%2C%22operands%22%3A%5B%22region%22%2C%22us%22%5D%7D%5D%7D%2C%7B%22operator%22%3A%22gt%22%2C%22operands%22%3A%5B%22intradaymarketcap%22%2C2000000000%5D%7D%5D%7D";

/// Which fixed Yahoo screener to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screener {
    /// Top percent change, NASDAQ (NMS) listings above $2B market cap.
    Gainers,
    /// Highest day volume above $2B market cap.
    MostActive,
}

impl Screener {
    fn sort_field(self) -> &'static str {
        match self {
            Screener::Gainers => "percentchange",
            Screener::MostActive => "dayvolume",
        }
    }

    fn query(self) -> &'static str {
        match self {
            Screener::Gainers => GAINERS_QUERY,
            Screener::MostActive => ACTIVE_QUERY,
        }
    }
}

/// `POST /v1/messages` with the caller's key injected.
pub fn claude_messages(
    urls: &UpstreamUrls,
    api_key: &str,
    body: &MessagesRequest,
) -> Result<UpstreamRequest, ProxyError> {
    let payload: Value = serde_json::to_value(body)
        .map_err(|e| ProxyError::Internal(format!("failed to encode request: {}", e)))?;

    Ok(
        UpstreamRequest::post_json(format!("{}/v1/messages", urls.anthropic), payload)
            .header("x-api-key", api_key)
            .header("anthropic-version", ANTHROPIC_VERSION),
    )
}

pub fn stock_chart(urls: &UpstreamUrls, ticker: &str) -> UpstreamRequest {
    UpstreamRequest::get(format!(
        "{}/v8/finance/chart/{}?interval=1d&range=1d",
        urls.yahoo, ticker
    ))
}

pub fn coin_detail(urls: &UpstreamUrls, coin_id: &str) -> UpstreamRequest {
    UpstreamRequest::get(format!(
        "{}/api/v3/coins/{}?localization=false&tickers=false&community_data=false&developer_data=false",
        urls.coingecko, coin_id
    ))
}

pub fn screener(urls: &UpstreamUrls, screener: Screener) -> UpstreamRequest {
    UpstreamRequest::get(format!(
        "{}/v1/finance/screener?{}&sortField={}&sortType=DESC&query={}",
        urls.yahoo,
        SCREENER_PREFIX,
        screener.sort_field(),
        screener.query()
    ))
}

pub fn coincap_assets(urls: &UpstreamUrls) -> UpstreamRequest {
    UpstreamRequest::get(format!("{}/v2/assets?limit=6", urls.coincap))
}

pub fn lunar_coins(urls: &UpstreamUrls) -> UpstreamRequest {
    UpstreamRequest::get(format!(
        "{}/api4/public/coins/list/v1?sort=galaxy_score&limit=6",
        urls.lunarcrush
    ))
}

pub fn gecko_trending(urls: &UpstreamUrls) -> UpstreamRequest {
    UpstreamRequest::get(format!("{}/api/v3/search/trending", urls.coingecko))
}
