//! Statistics API abstraction

use crate::core::error::PipelineError;
use crate::core::series::RawSeries;
use async_trait::async_trait;

#[async_trait]
pub trait StatisticsSource: Send + Sync {
    /// Fetches one endpoint and reduces it to a year -> value series.
    async fn fetch_series(&self, endpoint: &str) -> Result<RawSeries, PipelineError>;

    /// Fetches the total and per-capita series concurrently. Fails as soon
    /// as either request fails.
    async fn fetch_two_series(
        &self,
        total_endpoint: &str,
        per_capita_endpoint: &str,
    ) -> Result<(RawSeries, RawSeries), PipelineError> {
        futures::try_join!(
            self.fetch_series(total_endpoint),
            self.fetch_series(per_capita_endpoint)
        )
    }
}
