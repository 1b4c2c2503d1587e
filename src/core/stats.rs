//! Aggregates derived from an `EconomicSeries`.

use crate::core::series::EconomicSeries;
use rust_decimal::{Decimal, prelude::*};
use rust_finprim::rate::cagr;
use serde::Serialize;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeriesStats {
    /// Compound annual growth of the total, in percent, first to last year.
    pub average_annual_growth: f64,
    /// Growth of the total between the last two years, in percent per year
    /// elapsed between them.
    pub last_year_growth: f64,
    pub max_total: f64,
    pub min_total: f64,
    pub max_per_capita: f64,
    pub min_per_capita: f64,
    pub current_total: f64,
    pub current_per_capita: f64,
}

impl SeriesStats {
    /// `None` for an empty series.
    pub fn from_series(series: &EconomicSeries) -> Option<Self> {
        let first_total = *series.pib_total.first()?;
        let current_total = *series.pib_total.last()?;
        let current_per_capita = *series.pib_per_capita.last()?;

        // Dropped years leave gaps, so periods are counted in calendar years.
        let periods =
            usize::try_from(series.meta.last_year - series.meta.first_year).unwrap_or(0);
        let average_annual_growth =
            compound_annual_growth(first_total, current_total, periods).unwrap_or(0.0);

        let last_year_growth = match (series.pib_total.as_slice(), series.labels.as_slice()) {
            ([.., previous, last], [.., previous_year, last_year]) => {
                let gap = match (previous_year.parse::<i32>(), last_year.parse::<i32>()) {
                    (Ok(from), Ok(to)) => usize::try_from(to - from).unwrap_or(0),
                    _ => 0,
                };
                compound_annual_growth(*previous, *last, gap).unwrap_or(0.0)
            }
            _ => 0.0,
        };

        let (min_total, max_total) = min_max(&series.pib_total)?;
        let (min_per_capita, max_per_capita) = min_max(&series.pib_per_capita)?;

        Some(SeriesStats {
            average_annual_growth,
            last_year_growth,
            max_total,
            min_total,
            max_per_capita,
            min_per_capita,
            current_total,
            current_per_capita,
        })
    }
}

/// CAGR in percent over `periods` years. `None` when it is undefined.
pub fn compound_annual_growth(begin: f64, end: f64, periods: usize) -> Option<f64> {
    if periods == 0 || begin <= 0.0 || end <= 0.0 {
        return None;
    }
    let begin_bal = Decimal::from_f64(begin)?;
    let end_bal = Decimal::from_f64(end)?;
    let n_years = Decimal::from(periods as u64);

    let rate = cagr(begin_bal, end_bal, n_years);
    let percentage = (rate * Decimal::from(100)).to_f64()?;
    debug!("cagr: {begin_bal}, {end_bal}, {n_years} = {rate}, {percentage}");
    Some(percentage)
}

fn min_max(values: &[f64]) -> Option<(f64, f64)> {
    let first = *values.first()?;
    Some(
        values
            .iter()
            .fold((first, first), |(min, max), &v| (min.min(v), max.max(v))),
    )
}
