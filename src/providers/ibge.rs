use crate::core::config::HttpConfig;
use crate::core::error::PipelineError;
use crate::core::series::RawSeries;
use crate::core::statistics::StatisticsSource;
use crate::providers::util::{get, parse_json_number};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::{debug, instrument, warn};

/// Statistics gateway for the IBGE aggregates API.
pub struct IbgeProvider {
    base_url: String,
    http: HttpConfig,
}

impl IbgeProvider {
    pub fn new(base_url: &str, http: HttpConfig) -> Self {
        IbgeProvider {
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
        }
    }

    fn url_for(&self, endpoint: &str) -> String {
        if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
            endpoint.to_string()
        } else if endpoint.starts_with('/') {
            format!("{}{}", self.base_url, endpoint)
        } else {
            format!("{}/{}", self.base_url, endpoint)
        }
    }
}

// IBGE answers in Portuguese; the aliases accept its native field names.
#[derive(Debug, Deserialize)]
struct AggregateVariable {
    #[serde(default, alias = "resultados")]
    results: Vec<AggregateResult>,
}

#[derive(Debug, Deserialize)]
struct AggregateResult {
    #[serde(default)]
    series: Vec<LocalitySeries>,
}

#[derive(Debug, Deserialize)]
struct LocalitySeries {
    #[serde(alias = "serie")]
    series_by_year: Option<BTreeMap<String, Value>>,
}

/// Reduces `[0].results[0].series[0].series_by_year` to a `RawSeries`.
pub fn extract_series(body: &str) -> Result<RawSeries, PipelineError> {
    let variables: Vec<AggregateVariable> = serde_json::from_str(body)
        .map_err(|e| PipelineError::MalformedSeries(format!("Failed to parse JSON: {e}")))?;

    let by_year = variables
        .into_iter()
        .next()
        .and_then(|variable| variable.results.into_iter().next())
        .and_then(|result| result.series.into_iter().next())
        .and_then(|series| series.series_by_year)
        .ok_or_else(|| {
            PipelineError::MalformedSeries("missing results[0].series[0] in response".to_string())
        })?;

    let mut pairs = Vec::with_capacity(by_year.len());
    for (year, value) in &by_year {
        match year.trim().parse::<i32>() {
            Ok(year) => pairs.push((year, parse_json_number(value))),
            Err(_) => warn!(key = %year, "Skipping non-numeric year key"),
        }
    }

    if pairs.is_empty() {
        return Err(PipelineError::MalformedSeries(
            "series has no yearly values".to_string(),
        ));
    }
    Ok(RawSeries::from_pairs(pairs))
}

#[async_trait]
impl StatisticsSource for IbgeProvider {
    #[instrument(
        name = "IbgeSeriesFetch",
        skip(self),
        fields(endpoint = %endpoint)
    )]
    async fn fetch_series(&self, endpoint: &str) -> Result<RawSeries, PipelineError> {
        let url = self.url_for(endpoint);
        debug!("Requesting series from {}", url);

        let response = get(&url, &self.http).await?;
        let text = response
            .text()
            .await
            .map_err(|e| PipelineError::upstream(&url, format!("Failed to read body: {e}")))?;

        let series = extract_series(&text)?;
        debug!(years = series.len(), "Extracted series");
        Ok(series)
    }
}
