use crate::core::format::FormattedRow;
use crate::core::provider::ProviderSnapshot;
use crate::core::series::EconomicSeries;
use crate::core::stats::SeriesStats;
use anyhow::{Context, Result};
use serde::Serialize;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Export<'a> {
    #[serde(flatten)]
    series: &'a EconomicSeries,
    formatted_data: &'a [FormattedRow],
    stats: Option<&'a SeriesStats>,
}

/// The loaded series and its aggregates as pretty JSON.
pub fn render(snapshot: &ProviderSnapshot) -> Result<String> {
    let series = snapshot
        .series
        .as_deref()
        .context("No series loaded to export")?;
    let export = Export {
        series,
        formatted_data: snapshot.formatted_data(),
        stats: snapshot.stats(),
    };
    serde_json::to_string_pretty(&export).context("Failed to serialize series")
}
