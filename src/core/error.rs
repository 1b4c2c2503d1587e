//! Error taxonomy for the acquisition and conversion pipeline.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PipelineError {
    /// Transport failure or non-success HTTP status from an upstream API.
    #[error("Upstream unavailable at {url}: {reason}")]
    UpstreamUnavailable { url: String, reason: String },

    /// The statistics response could not be reduced to a year -> value mapping.
    #[error("Malformed series: {0}")]
    MalformedSeries(String),

    /// No valid daily quote for one year. Recovered inside the rate batch.
    #[error("No quotes for {pair} in {year}: {reason}")]
    NoQuotes {
        pair: String,
        year: i32,
        reason: String,
    },

    #[error("No year has both GDP values and an exchange rate")]
    NoConvertibleData,

    /// Conversion attempted with a rate the pipeline should have filtered out.
    #[error("Invalid exchange rate {rate} for {year}")]
    InvalidRate { year: i32, rate: f64 },

    #[error("Series invariant violated: {0}")]
    InvariantViolation(String),
}

impl PipelineError {
    pub(crate) fn upstream(url: &str, reason: impl ToString) -> Self {
        PipelineError::UpstreamUnavailable {
            url: url.to_string(),
            reason: reason.to_string(),
        }
    }

    /// True for errors that indicate a bug rather than bad upstream data.
    pub fn is_invariant_violation(&self) -> bool {
        matches!(
            self,
            PipelineError::InvalidRate { .. } | PipelineError::InvariantViolation(_)
        )
    }
}
