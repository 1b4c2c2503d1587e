//! Domain model, gateways' contracts and the load-state boundary

pub mod cache;
pub mod config;
pub mod error;
pub mod exchange;
pub mod format;
pub mod log;
pub mod pipeline;
pub mod provider;
pub mod series;
pub mod statistics;
pub mod stats;

// Re-export main types for cleaner imports
pub use error::PipelineError;
pub use exchange::ExchangeRateSource;
pub use pipeline::{ConversionPipeline, PipelineSettings};
pub use provider::{LoadStatus, PibProvider, ProviderSettings, ProviderSnapshot};
pub use series::EconomicSeries;
pub use statistics::StatisticsSource;
