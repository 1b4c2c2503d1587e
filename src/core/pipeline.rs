//! Orchestrates the statistics and exchange-rate gateways into one
//! USD-denominated, year-aligned series.

use crate::core::config::{AppConfig, UnitScale};
use crate::core::error::PipelineError;
use crate::core::exchange::{ExchangeRateSource, convert_to_usd};
use crate::core::series::{AlignedRecord, EconomicSeries, RawSeries, SeriesMeta};
use crate::core::statistics::StatisticsSource;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Endpoint and unit contract of one pipeline instance.
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub total_endpoint: String,
    pub per_capita_endpoint: String,
    pub total_unit: UnitScale,
    pub per_capita_unit: UnitScale,
    pub currency_pair: String,
    pub statistics_source: String,
    pub rate_source: String,
    pub currency: String,
}

impl PipelineSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        let ibge = &config.providers.ibge;
        PipelineSettings {
            total_endpoint: ibge.total_endpoint.clone(),
            per_capita_endpoint: ibge.per_capita_endpoint.clone(),
            total_unit: ibge.total_unit,
            per_capita_unit: ibge.per_capita_unit,
            currency_pair: config.providers.awesome_api.currency_pair.clone(),
            statistics_source: "IBGE".to_string(),
            rate_source: "AwesomeAPI".to_string(),
            currency: "USD".to_string(),
        }
    }
}

pub struct ConversionPipeline {
    statistics: Arc<dyn StatisticsSource>,
    exchange: Arc<dyn ExchangeRateSource>,
    settings: PipelineSettings,
}

impl ConversionPipeline {
    pub fn new(
        statistics: Arc<dyn StatisticsSource>,
        exchange: Arc<dyn ExchangeRateSource>,
        settings: PipelineSettings,
    ) -> Self {
        ConversionPipeline {
            statistics,
            exchange,
            settings,
        }
    }

    pub fn exchange(&self) -> &dyn ExchangeRateSource {
        self.exchange.as_ref()
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    /// Fetches both GDP series, resolves one rate per year and converts.
    ///
    /// Statistics failures are fatal. Rate failures only drop their year.
    /// An empty result is `NoConvertibleData`.
    pub async fn build(&self) -> Result<EconomicSeries, PipelineError> {
        let settings = &self.settings;
        let (total, per_capita) = self
            .statistics
            .fetch_two_series(&settings.total_endpoint, &settings.per_capita_endpoint)
            .await?;
        info!(
            total_years = total.len(),
            per_capita_years = per_capita.len(),
            "Fetched GDP series"
        );

        let rates = self
            .exchange
            .rates_for_years(&settings.currency_pair, total.years())
            .await;
        debug!(
            resolved = rates.iter().filter(|r| r.is_some()).count(),
            requested = rates.len(),
            "Resolved exchange rates"
        );

        let (records, mut dropped_years) = align(&total, &per_capita, &rates);

        let mut usable = Vec::with_capacity(records.len());
        for record in records {
            match record.rejection() {
                Some(reason) => {
                    warn!(year = record.year, reason, "Dropping year");
                    dropped_years.push(record.year);
                }
                None => usable.push(record),
            }
        }
        dropped_years.sort_unstable();

        if usable.is_empty() {
            error!(?dropped_years, "No convertible GDP data");
            return Err(PipelineError::NoConvertibleData);
        }

        let series = self.assemble(&usable, dropped_years)?;
        if let Err(e) = series.check_alignment() {
            error!(error = %e, "Pipeline produced a misaligned series");
            return Err(e);
        }
        info!(
            first_year = series.meta.first_year,
            last_year = series.meta.last_year,
            years = series.meta.year_count,
            "Built economic series"
        );
        Ok(series)
    }

    fn assemble(
        &self,
        records: &[AlignedRecord],
        dropped_years: Vec<i32>,
    ) -> Result<EconomicSeries, PipelineError> {
        let settings = &self.settings;
        let mut labels = Vec::with_capacity(records.len());
        let mut pib_total = Vec::with_capacity(records.len());
        let mut pib_per_capita = Vec::with_capacity(records.len());

        for record in records {
            // Records without a rate were filtered out; NaN reaches InvalidRate.
            let rate = record.rate.unwrap_or(f64::NAN);
            let total_usd = convert_to_usd(
                settings.total_unit.to_local_currency(record.total_local),
                rate,
                record.year,
            )
            .inspect_err(|e| error!(error = %e, "Conversion invariant violated"))?;
            let per_capita_usd = convert_to_usd(
                settings.per_capita_unit.to_local_currency(record.per_capita_local),
                rate,
                record.year,
            )
            .inspect_err(|e| error!(error = %e, "Conversion invariant violated"))?;

            labels.push(record.year.to_string());
            pib_total.push(total_usd);
            pib_per_capita.push(per_capita_usd);
        }

        let (first_year, last_year) = match (records.first(), records.last()) {
            (Some(first), Some(last)) => (first.year, last.year),
            _ => return Err(PipelineError::NoConvertibleData),
        };

        Ok(EconomicSeries {
            labels,
            pib_total,
            pib_per_capita,
            meta: SeriesMeta {
                first_year,
                last_year,
                year_count: records.len(),
                statistics_source: settings.statistics_source.clone(),
                rate_source: settings.rate_source.clone(),
                currency_pair: settings.currency_pair.clone(),
                currency: settings.currency.clone(),
                dropped_years,
            },
        })
    }
}

/// Zips the total series with per-capita values and rates by position.
///
/// `rates[i]` belongs to `total.years()[i]`. Years missing from the
/// per-capita series are returned separately as dropped.
pub fn align(
    total: &RawSeries,
    per_capita: &RawSeries,
    rates: &[Option<f64>],
) -> (Vec<AlignedRecord>, Vec<i32>) {
    let mut records = Vec::with_capacity(total.len());
    let mut dropped = Vec::new();

    for (index, (&year, &total_local)) in total.years().iter().zip(total.values()).enumerate() {
        let Some(per_capita_local) = per_capita.value_for(year) else {
            warn!(year, "Year missing from per-capita series");
            dropped.push(year);
            continue;
        };
        records.push(AlignedRecord {
            year,
            total_local,
            per_capita_local,
            rate: rates.get(index).copied().flatten(),
        });
    }
    (records, dropped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::cache::CacheInfo;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct MockStatistics {
        total: Result<RawSeries, PipelineError>,
        per_capita: Result<RawSeries, PipelineError>,
    }

    #[async_trait]
    impl StatisticsSource for MockStatistics {
        async fn fetch_series(&self, endpoint: &str) -> Result<RawSeries, PipelineError> {
            match endpoint {
                "total" => self.total.clone(),
                _ => self.per_capita.clone(),
            }
        }
    }

    struct MockExchange {
        rates: HashMap<i32, f64>,
        requested: Mutex<Vec<i32>>,
        calls: AtomicUsize,
    }

    impl MockExchange {
        fn new(rates: &[(i32, f64)]) -> Self {
            MockExchange {
                rates: rates.iter().copied().collect(),
                requested: Mutex::new(Vec::new()),
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl ExchangeRateSource for MockExchange {
        async fn annual_average_rate(&self, pair: &str, year: i32) -> Result<f64, PipelineError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.requested.lock().unwrap().push(year);
            self.rates
                .get(&year)
                .copied()
                .ok_or_else(|| PipelineError::NoQuotes {
                    pair: pair.to_string(),
                    year,
                    reason: "rejected".to_string(),
                })
        }

        async fn clear_cache(&self) {}

        async fn cache_info(&self) -> CacheInfo {
            CacheInfo::default()
        }
    }

    fn settings(total_unit: UnitScale, per_capita_unit: UnitScale) -> PipelineSettings {
        PipelineSettings {
            total_endpoint: "total".to_string(),
            per_capita_endpoint: "per-capita".to_string(),
            total_unit,
            per_capita_unit,
            currency_pair: "USD-BRL".to_string(),
            statistics_source: "IBGE".to_string(),
            rate_source: "AwesomeAPI".to_string(),
            currency: "USD".to_string(),
        }
    }

    fn pipeline(
        total: &[(i32, f64)],
        per_capita: &[(i32, f64)],
        exchange: Arc<MockExchange>,
    ) -> ConversionPipeline {
        let statistics = MockStatistics {
            total: Ok(RawSeries::from_pairs(total.iter().copied())),
            per_capita: Ok(RawSeries::from_pairs(per_capita.iter().copied())),
        };
        ConversionPipeline::new(
            Arc::new(statistics),
            exchange,
            settings(UnitScale::Millions, UnitScale::Units),
        )
    }

    #[tokio::test]
    async fn test_end_to_end_conversion() {
        let exchange = Arc::new(MockExchange::new(&[(2019, 4.0), (2020, 5.0)]));
        let pipeline = pipeline(
            &[(2019, 1900.0), (2020, 2000.0)],
            &[(2019, 9500.0), (2020, 10000.0)],
            exchange,
        );

        let series = pipeline.build().await.unwrap();
        assert_eq!(series.labels, vec!["2019", "2020"]);
        assert_eq!(series.pib_total, vec![475_000_000.0, 400_000_000.0]);
        assert_eq!(series.pib_per_capita, vec![2375.0, 2000.0]);
        assert_eq!(series.meta.first_year, 2019);
        assert_eq!(series.meta.last_year, 2020);
        assert_eq!(series.meta.year_count, 2);
        assert_eq!(series.meta.rate_source, "AwesomeAPI");
        assert_eq!(series.meta.currency, "USD");
        assert!(series.meta.dropped_years.is_empty());
    }

    #[tokio::test]
    async fn test_total_conversion_uses_configured_scale() {
        let exchange = Arc::new(MockExchange::new(&[(2020, 5.0)]));
        let pipeline = pipeline(&[(2020, 2000.0)], &[(2020, 1.0)], exchange);
        let series = pipeline.build().await.unwrap();
        assert_eq!(series.pib_total, vec![(2000.0 * 1_000_000.0) / 5.0]);
        assert_eq!(series.pib_total[0], 400_000_000.0);
    }

    #[tokio::test]
    async fn test_cents_per_capita_scale() {
        let statistics = MockStatistics {
            total: Ok(RawSeries::from_pairs([(2020, 1.0)])),
            per_capita: Ok(RawSeries::from_pairs([(2020, 1_000_000.0)])),
        };
        let pipeline = ConversionPipeline::new(
            Arc::new(statistics),
            Arc::new(MockExchange::new(&[(2020, 5.0)])),
            settings(UnitScale::Thousands, UnitScale::Cents),
        );
        let series = pipeline.build().await.unwrap();
        assert_eq!(series.pib_total, vec![200.0]);
        assert_eq!(series.pib_per_capita, vec![2000.0]);
    }

    #[tokio::test]
    async fn test_year_without_rate_is_dropped() {
        let exchange = Arc::new(MockExchange::new(&[(2020, 5.0), (2022, 5.0)]));
        let pipeline = pipeline(
            &[(2020, 1.0), (2021, 1.0), (2022, 1.0)],
            &[(2020, 1.0), (2021, 1.0), (2022, 1.0)],
            exchange.clone(),
        );

        let series = pipeline.build().await.unwrap();
        assert_eq!(series.labels, vec!["2020", "2022"]);
        assert_eq!(series.pib_total.len(), 2);
        assert_eq!(series.pib_per_capita.len(), 2);
        assert_eq!(series.meta.dropped_years, vec![2021]);
        assert_eq!(exchange.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_rates_requested_in_ascending_year_order() {
        let exchange = Arc::new(MockExchange::new(&[(2009, 2.0), (2010, 1.8), (2011, 1.7)]));
        let pipeline = pipeline(
            &[(2011, 1.0), (2009, 1.0), (2010, 1.0)],
            &[(2010, 1.0), (2011, 1.0), (2009, 1.0)],
            exchange.clone(),
        );
        let series = pipeline.build().await.unwrap();
        assert_eq!(series.labels, vec!["2009", "2010", "2011"]);
        let mut requested = exchange.requested.lock().unwrap().clone();
        requested.sort_unstable();
        assert_eq!(requested, vec![2009, 2010, 2011]);
    }

    #[tokio::test]
    async fn test_invalid_values_are_dropped() {
        let exchange = Arc::new(MockExchange::new(&[(2018, 3.6), (2019, 4.0), (2020, 5.0)]));
        let pipeline = pipeline(
            &[(2018, 0.0), (2019, 1900.0), (2020, f64::NAN)],
            &[(2018, 1.0), (2019, 9500.0), (2020, 1.0)],
            exchange,
        );
        let series = pipeline.build().await.unwrap();
        assert_eq!(series.labels, vec!["2019"]);
        assert_eq!(series.meta.dropped_years, vec![2018, 2020]);
    }

    #[tokio::test]
    async fn test_year_missing_from_per_capita_is_dropped() {
        let exchange = Arc::new(MockExchange::new(&[(2019, 4.0), (2020, 5.0)]));
        let pipeline = pipeline(
            &[(2019, 1900.0), (2020, 2000.0)],
            &[(2020, 10000.0)],
            exchange,
        );
        let series = pipeline.build().await.unwrap();
        assert_eq!(series.labels, vec!["2020"]);
        assert_eq!(series.meta.dropped_years, vec![2019]);
    }

    #[tokio::test]
    async fn test_no_rates_is_fatal() {
        let exchange = Arc::new(MockExchange::new(&[]));
        let pipeline = pipeline(&[(2019, 1.0), (2020, 1.0)], &[(2019, 1.0), (2020, 1.0)], exchange);
        assert_eq!(
            pipeline.build().await,
            Err(PipelineError::NoConvertibleData)
        );
    }

    #[tokio::test]
    async fn test_statistics_failure_is_fatal() {
        let statistics = MockStatistics {
            total: Ok(RawSeries::from_pairs([(2020, 1.0)])),
            per_capita: Err(PipelineError::MalformedSeries("bad".to_string())),
        };
        let exchange = Arc::new(MockExchange::new(&[(2020, 5.0)]));
        let pipeline = ConversionPipeline::new(
            Arc::new(statistics),
            exchange.clone(),
            settings(UnitScale::Millions, UnitScale::Units),
        );
        assert_eq!(
            pipeline.build().await,
            Err(PipelineError::MalformedSeries("bad".to_string()))
        );
        assert_eq!(exchange.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_align_uses_rate_positions() {
        let total = RawSeries::from_pairs([(2020, 1.0), (2021, 2.0)]);
        let per_capita = RawSeries::from_pairs([(2021, 20.0), (2020, 10.0)]);
        let (records, dropped) = align(&total, &per_capita, &[None, Some(5.0)]);
        assert!(dropped.is_empty());
        assert_eq!(records[0].year, 2020);
        assert_eq!(records[0].rate, None);
        assert_eq!(records[1].per_capita_local, 20.0);
        assert_eq!(records[1].rate, Some(5.0));

        // A short rate list leaves trailing years without a rate.
        let (records, _) = align(&total, &per_capita, &[Some(5.0)]);
        assert_eq!(records[1].rate, None);
    }
}
