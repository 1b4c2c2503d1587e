//! Exchange-rate abstractions

use crate::core::cache::CacheInfo;
use crate::core::error::PipelineError;
use async_trait::async_trait;
use futures::future::join_all;
use tracing::warn;

#[async_trait]
pub trait ExchangeRateSource: Send + Sync {
    /// Mean of all valid daily bids of `pair` during `year`.
    async fn annual_average_rate(&self, pair: &str, year: i32) -> Result<f64, PipelineError>;

    /// Resolves every year independently. The output has the same length and
    /// order as `years`; a year whose rate cannot be resolved is `None`.
    async fn rates_for_years(&self, pair: &str, years: &[i32]) -> Vec<Option<f64>> {
        let lookups = years.iter().map(|&year| async move {
            match self.annual_average_rate(pair, year).await {
                Ok(rate) => Some(rate),
                Err(e) => {
                    warn!(year, error = %e, "No exchange rate for year, it will be dropped");
                    None
                }
            }
        });
        join_all(lookups).await
    }

    /// Drops every cached rate. Later lookups go to the network again.
    async fn clear_cache(&self);

    async fn cache_info(&self) -> CacheInfo;
}

/// Arithmetic mean of the bids that are finite and positive.
pub fn average_bid(bids: impl IntoIterator<Item = f64>) -> Option<f64> {
    let (sum, count) = bids
        .into_iter()
        .filter(|bid| bid.is_finite() && *bid > 0.0)
        .fold((0.0, 0usize), |(sum, count), bid| (sum + bid, count + 1));
    (count > 0).then(|| sum / count as f64)
}

/// Converts a local-currency amount using a BRL-per-USD rate.
pub fn convert_to_usd(value: f64, rate: f64, year: i32) -> Result<f64, PipelineError> {
    if !rate.is_finite() || rate <= 0.0 {
        return Err(PipelineError::InvalidRate { year, rate });
    }
    Ok(value / rate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct MockExchange {
        rates: HashMap<i32, f64>,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl ExchangeRateSource for MockExchange {
        async fn annual_average_rate(&self, pair: &str, year: i32) -> Result<f64, PipelineError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.rates
                .get(&year)
                .copied()
                .ok_or_else(|| PipelineError::NoQuotes {
                    pair: pair.to_string(),
                    year,
                    reason: "empty response".to_string(),
                })
        }

        async fn clear_cache(&self) {}

        async fn cache_info(&self) -> CacheInfo {
            CacheInfo::default()
        }
    }

    #[tokio::test]
    async fn test_rates_for_years_keeps_positions() {
        let source = MockExchange {
            rates: HashMap::from([(2020, 5.0), (2022, 5.2)]),
            calls: AtomicUsize::new(0),
        };
        let rates = source
            .rates_for_years("USD-BRL", &[2020, 2021, 2022])
            .await;
        assert_eq!(rates, vec![Some(5.0), None, Some(5.2)]);
        assert_eq!(source.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_rates_for_years_empty() {
        let source = MockExchange {
            rates: HashMap::new(),
            calls: AtomicUsize::new(0),
        };
        assert!(source.rates_for_years("USD-BRL", &[]).await.is_empty());
    }

    #[test]
    fn test_average_bid_ignores_invalid_quotes() {
        let avg = average_bid([5.0, 5.1, 5.2, 0.0, -1.0, f64::NAN, f64::INFINITY]).unwrap();
        assert!((avg - 5.1).abs() < 1e-9);
        assert_eq!(average_bid([]), None);
        assert_eq!(average_bid([0.0, f64::NAN]), None);
    }

    #[test]
    fn test_convert_to_usd() {
        assert_eq!(convert_to_usd(2_000_000_000.0, 5.0, 2020).unwrap(), 400_000_000.0);
        assert_eq!(
            convert_to_usd(100.0, 0.0, 2020),
            Err(PipelineError::InvalidRate { year: 2020, rate: 0.0 })
        );
        assert!(convert_to_usd(100.0, f64::NAN, 2020).is_err());
    }
}
