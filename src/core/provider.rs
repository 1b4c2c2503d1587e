//! Load-state boundary between the conversion pipeline and its readers.

use crate::core::cache::CacheInfo;
use crate::core::config::ReloadConfig;
use crate::core::error::PipelineError;
use crate::core::format::{FormattedRow, formatted_rows};
use crate::core::pipeline::ConversionPipeline;
use crate::core::series::EconomicSeries;
use crate::core::stats::SeriesStats;
use serde::Serialize;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, error, info, instrument, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LoadStatus {
    Idle,
    Loading,
    Success,
    Error,
}

/// Presentation aggregates of one `EconomicSeries`.
#[derive(Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DerivedView {
    pub formatted_data: Vec<FormattedRow>,
    pub stats: Option<SeriesStats>,
}

impl DerivedView {
    pub fn from_series(series: &EconomicSeries) -> Self {
        DerivedView {
            formatted_data: formatted_rows(series),
            stats: SeriesStats::from_series(series),
        }
    }
}

/// Read-only view of the provider at one point in time.
///
/// `series` and `derived` are only present in `Success`.
#[derive(Debug, Clone)]
pub struct ProviderSnapshot {
    pub status: LoadStatus,
    pub error: Option<Arc<PipelineError>>,
    pub series: Option<Arc<EconomicSeries>>,
    pub derived: Option<Arc<DerivedView>>,
}

impl ProviderSnapshot {
    pub fn is_loading(&self) -> bool {
        self.status == LoadStatus::Loading
    }

    pub fn has_data(&self) -> bool {
        self.series.as_ref().is_some_and(|s| !s.is_empty())
    }

    pub fn labels(&self) -> &[String] {
        self.series.as_deref().map(|s| s.labels.as_slice()).unwrap_or_default()
    }

    pub fn pib_total(&self) -> &[f64] {
        self.series.as_deref().map(|s| s.pib_total.as_slice()).unwrap_or_default()
    }

    pub fn pib_per_capita(&self) -> &[f64] {
        self.series.as_deref().map(|s| s.pib_per_capita.as_slice()).unwrap_or_default()
    }

    pub fn formatted_data(&self) -> &[FormattedRow] {
        self.derived.as_deref().map(|d| d.formatted_data.as_slice()).unwrap_or_default()
    }

    pub fn stats(&self) -> Option<&SeriesStats> {
        self.derived.as_deref().and_then(|d| d.stats.as_ref())
    }
}

#[derive(Debug, Clone)]
pub struct ProviderSettings {
    pub auto_retry: bool,
    pub retry_delay: Duration,
}

impl From<&ReloadConfig> for ProviderSettings {
    fn from(config: &ReloadConfig) -> Self {
        ProviderSettings {
            auto_retry: config.auto_retry,
            retry_delay: Duration::from_millis(config.retry_delay_ms),
        }
    }
}

impl Default for ProviderSettings {
    fn default() -> Self {
        ProviderSettings::from(&ReloadConfig::default())
    }
}

#[derive(Debug)]
struct ProviderState {
    status: LoadStatus,
    error: Option<Arc<PipelineError>>,
    series: Option<Arc<EconomicSeries>>,
}

/// Owns the pipeline and the last load outcome.
///
/// Operations never return an error; failures become the `Error` status
/// carrying the cause. Each load takes a request token, and results of a
/// superseded load are discarded.
pub struct PibProvider {
    pipeline: ConversionPipeline,
    settings: ProviderSettings,
    state: RwLock<ProviderState>,
    request_token: AtomicU64,
    derived: Mutex<Option<(Arc<EconomicSeries>, Arc<DerivedView>)>>,
}

impl PibProvider {
    pub fn new(pipeline: ConversionPipeline, settings: ProviderSettings) -> Self {
        PibProvider {
            pipeline,
            settings,
            state: RwLock::new(ProviderState {
                status: LoadStatus::Idle,
                error: None,
                series: None,
            }),
            request_token: AtomicU64::new(0),
            derived: Mutex::new(None),
        }
    }

    pub fn pipeline(&self) -> &ConversionPipeline {
        &self.pipeline
    }

    /// Builds the series, retrying once after `retry_delay` when enabled.
    #[instrument(name = "PibProviderLoad", skip(self))]
    pub async fn load(&self) -> LoadStatus {
        let token = self.request_token.fetch_add(1, Ordering::SeqCst) + 1;
        if !self.begin(token).await {
            return self.status().await;
        }

        let outcome = match self.pipeline.build().await {
            Err(e) if self.settings.auto_retry => {
                warn!(error = %e, "Load failed, retrying once in {:?}", self.settings.retry_delay);
                self.settle(token, Err(e)).await;
                tokio::time::sleep(self.settings.retry_delay).await;
                if !self.begin(token).await {
                    return self.status().await;
                }
                self.pipeline.build().await
            }
            outcome => outcome,
        };
        self.settle(token, outcome).await
    }

    pub async fn reload(&self) -> LoadStatus {
        debug!("Reloading");
        self.load().await
    }

    /// Empties the exchange-rate cache so every year is refetched.
    pub async fn clear_cache_and_reload(&self) -> LoadStatus {
        self.pipeline.exchange().clear_cache().await;
        info!("Cleared exchange rate cache");
        self.load().await
    }

    pub async fn cache_info(&self) -> CacheInfo {
        self.pipeline.exchange().cache_info().await
    }

    pub async fn status(&self) -> LoadStatus {
        self.state.read().await.status
    }

    pub async fn snapshot(&self) -> ProviderSnapshot {
        let (status, error, series) = {
            let state = self.state.read().await;
            (state.status, state.error.clone(), state.series.clone())
        };
        let derived = match &series {
            Some(series) => Some(self.derived_view(series).await),
            None => None,
        };
        ProviderSnapshot {
            status,
            error,
            series,
            derived,
        }
    }

    /// Recomputed only when the series behind it is a different allocation.
    async fn derived_view(&self, series: &Arc<EconomicSeries>) -> Arc<DerivedView> {
        let mut memo = self.derived.lock().await;
        if let Some((source, view)) = memo.as_ref() {
            if Arc::ptr_eq(source, series) {
                return Arc::clone(view);
            }
        }
        debug!(years = series.len(), "Computing derived view");
        let view = Arc::new(DerivedView::from_series(series));
        *memo = Some((Arc::clone(series), Arc::clone(&view)));
        view
    }

    fn is_current(&self, token: u64) -> bool {
        self.request_token.load(Ordering::SeqCst) == token
    }

    async fn begin(&self, token: u64) -> bool {
        let mut state = self.state.write().await;
        if !self.is_current(token) {
            return false;
        }
        state.status = LoadStatus::Loading;
        state.error = None;
        state.series = None;
        true
    }

    async fn settle(
        &self,
        token: u64,
        outcome: Result<EconomicSeries, PipelineError>,
    ) -> LoadStatus {
        let mut state = self.state.write().await;
        if !self.is_current(token) {
            debug!(token, "Discarding result of a superseded load");
            return state.status;
        }
        match outcome {
            Ok(series) => {
                info!(years = series.len(), "Load succeeded");
                state.status = LoadStatus::Success;
                state.error = None;
                state.series = Some(Arc::new(series));
            }
            Err(e) => {
                if e.is_invariant_violation() {
                    error!(error = %e, "Pipeline invariant violated");
                } else {
                    warn!(error = %e, "Load failed");
                }
                state.status = LoadStatus::Error;
                state.error = Some(Arc::new(e));
                state.series = None;
            }
        }
        state.status
    }
}
