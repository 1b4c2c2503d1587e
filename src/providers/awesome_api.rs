use crate::core::cache::{Cache, CacheInfo};
use crate::core::config::HttpConfig;
use crate::core::error::PipelineError;
use crate::core::exchange::{ExchangeRateSource, average_bid};
use crate::providers::util::{get, parse_json_number};
use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::header::CONTENT_TYPE;
use serde_json::Value;
use tracing::{debug, instrument};

/// Exchange-rate gateway for the AwesomeAPI daily quotes endpoint.
///
/// Annual averages are cached per `{pair}-{year}` for the lifetime of the
/// instance. Only successful averages are cached.
pub struct AwesomeApiProvider {
    base_url: String,
    quote_limit: u32,
    http: HttpConfig,
    cache: Cache<String, f64>,
}

impl AwesomeApiProvider {
    pub fn new(base_url: &str, quote_limit: u32, http: HttpConfig) -> Self {
        AwesomeApiProvider {
            base_url: base_url.trim_end_matches('/').to_string(),
            quote_limit,
            http,
            cache: Cache::new(),
        }
    }

    fn daily_url(&self, pair: &str, year: i32) -> Result<String, PipelineError> {
        let (start, end) = year_bounds(year).ok_or_else(|| PipelineError::NoQuotes {
            pair: pair.to_string(),
            year,
            reason: "year out of range".to_string(),
        })?;
        Ok(format!(
            "{}/json/daily/{}/?start_date={}&end_date={}&limit={}",
            self.base_url,
            pair,
            start.format("%Y%m%d"),
            end.format("%Y%m%d"),
            self.quote_limit
        ))
    }
}

/// First and last day of the calendar year.
fn year_bounds(year: i32) -> Option<(NaiveDate, NaiveDate)> {
    Some((
        NaiveDate::from_ymd_opt(year, 1, 1)?,
        NaiveDate::from_ymd_opt(year, 12, 31)?,
    ))
}

/// Bids of every quote in a daily-quotes response. A body that is not an
/// array has no quotes.
fn extract_bids(body: &Value) -> Vec<f64> {
    body.as_array()
        .map(|quotes| {
            quotes
                .iter()
                .filter_map(|quote| quote.get("bid"))
                .map(parse_json_number)
                .collect()
        })
        .unwrap_or_default()
}

#[async_trait]
impl ExchangeRateSource for AwesomeApiProvider {
    #[instrument(
        name = "AwesomeApiAnnualRate",
        skip(self),
        fields(pair = %pair, year = year)
    )]
    async fn annual_average_rate(&self, pair: &str, year: i32) -> Result<f64, PipelineError> {
        let key = format!("{pair}-{year}");
        if let Some(cached) = self.cache.get(&key).await {
            return Ok(cached);
        }

        let url = self.daily_url(pair, year)?;
        debug!("Requesting daily quotes from {}", url);

        let response = get(&url, &self.http).await?;
        let is_json = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| value.contains("application/json"));
        if !is_json {
            return Err(PipelineError::upstream(&url, "response is not JSON"));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| PipelineError::upstream(&url, format!("Failed to parse JSON: {e}")))?;

        let bids = extract_bids(&body);
        if bids.is_empty() {
            return Err(PipelineError::NoQuotes {
                pair: pair.to_string(),
                year,
                reason: "empty response".to_string(),
            });
        }
        let quote_count = bids.len();

        let rate = average_bid(bids).ok_or_else(|| PipelineError::NoQuotes {
            pair: pair.to_string(),
            year,
            reason: format!("none of {quote_count} quotes has a valid bid"),
        })?;

        debug!(rate, quote_count, "Computed annual average rate");
        self.cache.put(key, rate).await;
        Ok(rate)
    }

    async fn clear_cache(&self) {
        self.cache.clear().await;
    }

    async fn cache_info(&self) -> CacheInfo {
        self.cache.info().await
    }
}
