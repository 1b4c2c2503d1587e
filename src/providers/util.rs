use crate::core::config::HttpConfig;
use crate::core::error::PipelineError;
use serde_json::Value;
use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use tracing::debug;

const USER_AGENT: &str = concat!("pibx/", env!("CARGO_PKG_VERSION"));

/// GETs `url`, retrying transport failures. Non-success statuses are not
/// retried and map to `UpstreamUnavailable`.
pub async fn get(url: &str, http: &HttpConfig) -> Result<reqwest::Response, PipelineError> {
    let client = reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(http.timeout())
        .build()
        .map_err(|e| PipelineError::upstream(url, format!("Client error: {e}")))?;

    let response = with_retry(
        || async { client.get(url).send().await },
        http.retries,
        http.retry_delay(),
    )
    .await
    .map_err(|e| PipelineError::upstream(url, format!("Request error: {e}")))?;

    debug!(status = %response.status(), "Received response from {}", url);
    if !response.status().is_success() {
        return Err(PipelineError::upstream(
            url,
            format!("HTTP error: {}", response.status()),
        ));
    }
    Ok(response)
}

/// Retries an async operation with configurable attempts and delays
///
/// # Parameters
/// - `operation`: Closure returning a future
/// - `retries`: Number of retry attempts (total runs = 1 initial + retries)
/// - `delay`: Pause between retry attempts
///
/// # Returns
/// Either the successful result or the error of the last attempt
pub async fn with_retry<F, Fut, T, E>(
    mut operation: F,
    retries: usize,
    delay: Duration,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    let mut attempt = 1;
    loop {
        match operation().await {
            Ok(val) => return Ok(val),
            Err(err) => {
                if attempt > retries {
                    return Err(err);
                }
                debug!(
                    "Attempt {}/{} failed: {}. Retrying...",
                    attempt, retries, err
                );
                attempt += 1;
                tokio::time::sleep(delay).await;
            }
        }
    }
}

/// Parses a number that may use the Brazilian format (`1.234,56`).
///
/// With a comma present, dots are thousands separators and the comma is the
/// decimal point. Without one, several dots are thousands separators and a
/// single dot is a decimal point. Empty, non-numeric and non-finite input
/// yields 0.
pub fn parse_locale_number(raw: &str) -> f64 {
    let trimmed = raw.trim();
    let normalized = if trimmed.contains(',') {
        trimmed.replace('.', "").replace(',', ".")
    } else if trimmed.matches('.').count() > 1 {
        trimmed.replace('.', "")
    } else {
        trimmed.to_string()
    };
    normalized
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .unwrap_or(0.0)
}

/// Numeric value of a JSON string or number, 0 for anything else.
pub fn parse_json_number(value: &Value) -> f64 {
    match value {
        Value::String(s) => parse_locale_number(s),
        Value::Number(n) => n.as_f64().filter(|v| v.is_finite()).unwrap_or(0.0),
        _ => 0.0,
    }
}
