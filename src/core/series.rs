//! Data model shared by the gateways, the pipeline and the provider.

use crate::core::error::PipelineError;
use serde::Serialize;

/// A year -> value series as extracted from the statistics API.
///
/// `years` is ascending and unique, `values[i]` belongs to `years[i]`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawSeries {
    years: Vec<i32>,
    values: Vec<f64>,
}

impl RawSeries {
    /// Builds a series from unordered pairs. Later duplicates of a year win.
    pub fn from_pairs(pairs: impl IntoIterator<Item = (i32, f64)>) -> Self {
        let mut pairs: Vec<(i32, f64)> = pairs.into_iter().collect();
        pairs.sort_by_key(|(year, _)| *year);
        let mut series = RawSeries::default();
        for (year, value) in pairs {
            if series.years.last() == Some(&year) {
                if let Some(last) = series.values.last_mut() {
                    *last = value;
                }
                continue;
            }
            series.years.push(year);
            series.values.push(value);
        }
        series
    }

    pub fn years(&self) -> &[i32] {
        &self.years
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.years.len()
    }

    pub fn is_empty(&self) -> bool {
        self.years.is_empty()
    }

    pub fn value_for(&self, year: i32) -> Option<f64> {
        self.years
            .binary_search(&year)
            .ok()
            .map(|index| self.values[index])
    }
}

/// One year of local-currency GDP data with its exchange rate, if any.
#[derive(Debug, Clone, PartialEq)]
pub struct AlignedRecord {
    pub year: i32,
    pub total_local: f64,
    pub per_capita_local: f64,
    pub rate: Option<f64>,
}

impl AlignedRecord {
    /// Reason the record cannot be converted, `None` when it is usable.
    pub fn rejection(&self) -> Option<&'static str> {
        let positive = |v: f64| v.is_finite() && v > 0.0;
        if !positive(self.total_local) {
            Some("total GDP is missing or non-positive")
        } else if !positive(self.per_capita_local) {
            Some("per-capita GDP is missing or non-positive")
        } else if !self.rate.is_some_and(positive) {
            Some("no exchange rate")
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeriesMeta {
    pub first_year: i32,
    pub last_year: i32,
    pub year_count: usize,
    pub statistics_source: String,
    pub rate_source: String,
    pub currency_pair: String,
    pub currency: String,
    pub dropped_years: Vec<i32>,
}

/// Pipeline output: USD values, index-aligned, ascending by year.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EconomicSeries {
    pub labels: Vec<String>,
    pub pib_total: Vec<f64>,
    pub pib_per_capita: Vec<f64>,
    pub meta: SeriesMeta,
}

impl EconomicSeries {
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Checks equal lengths and strictly ascending numeric labels.
    pub fn check_alignment(&self) -> Result<(), PipelineError> {
        if self.pib_total.len() != self.labels.len()
            || self.pib_per_capita.len() != self.labels.len()
        {
            return Err(PipelineError::InvariantViolation(format!(
                "length mismatch: {} labels, {} totals, {} per-capita values",
                self.labels.len(),
                self.pib_total.len(),
                self.pib_per_capita.len()
            )));
        }

        let mut previous: Option<i32> = None;
        for label in &self.labels {
            let year: i32 = label.parse().map_err(|_| {
                PipelineError::InvariantViolation(format!("label {label:?} is not a year"))
            })?;
            if previous.is_some_and(|p| p >= year) {
                return Err(PipelineError::InvariantViolation(format!(
                    "labels not strictly ascending at {year}"
                )));
            }
            previous = Some(year);
        }

        if self.meta.year_count != self.labels.len() {
            return Err(PipelineError::InvariantViolation(format!(
                "meta reports {} years for {} labels",
                self.meta.year_count,
                self.labels.len()
            )));
        }
        Ok(())
    }
}
