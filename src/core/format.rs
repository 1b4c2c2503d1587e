//! USD display formatting for presentation rows.

use crate::core::series::EconomicSeries;
use serde::Serialize;

/// One presentation-ready row of the series.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FormattedRow {
    pub year: String,
    pub total_formatted: String,
    pub per_capita_formatted: String,
    pub total_value: f64,
    pub per_capita_value: f64,
}

pub fn formatted_rows(series: &EconomicSeries) -> Vec<FormattedRow> {
    series
        .labels
        .iter()
        .zip(&series.pib_total)
        .zip(&series.pib_per_capita)
        .map(|((year, &total), &per_capita)| FormattedRow {
            year: year.clone(),
            total_formatted: format_usd_compact(total),
            per_capita_formatted: format_usd(per_capita),
            total_value: total,
            per_capita_value: per_capita,
        })
        .collect()
}

/// `$1.23T`, `$475.00M`, `$12.50K`, or a whole-dollar amount below 1000.
pub fn format_usd_compact(value: f64) -> String {
    let sign = if value < 0.0 { "-" } else { "" };
    let abs = value.abs();
    let (scaled, suffix) = if abs >= 1e12 {
        (abs / 1e12, "T")
    } else if abs >= 1e9 {
        (abs / 1e9, "B")
    } else if abs >= 1e6 {
        (abs / 1e6, "M")
    } else if abs >= 1e3 {
        (abs / 1e3, "K")
    } else {
        return format_usd(value);
    };
    format!("{sign}${scaled:.2}{suffix}")
}

/// Whole dollars with thousands separators, e.g. `$2,375`.
pub fn format_usd(value: f64) -> String {
    let sign = if value < 0.0 { "-" } else { "" };
    let whole = value.abs().round() as u64;
    format!("{sign}${}", group_thousands(whole))
}

fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    grouped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::series::SeriesMeta;

    #[test]
    fn test_format_usd_compact() {
        assert_eq!(format_usd_compact(2.1e12), "$2.10T");
        assert_eq!(format_usd_compact(475_000_000.0), "$475.00M");
        assert_eq!(format_usd_compact(1_450_000_000.0), "$1.45B");
        assert_eq!(format_usd_compact(12_500.0), "$12.50K");
        assert_eq!(format_usd_compact(999.4), "$999");
        assert_eq!(format_usd_compact(-3e6), "-$3.00M");
    }

    #[test]
    fn test_format_usd() {
        assert_eq!(format_usd(2375.0), "$2,375");
        assert_eq!(format_usd(0.0), "$0");
        assert_eq!(format_usd(999.5), "$1,000");
        assert_eq!(format_usd(1_234_567.0), "$1,234,567");
        assert_eq!(format_usd(-10_000.0), "-$10,000");
    }

    #[test]
    fn test_formatted_rows() {
        let series = EconomicSeries {
            labels: vec!["2019".into(), "2020".into()],
            pib_total: vec![475_000_000.0, 400_000_000.0],
            pib_per_capita: vec![2375.0, 2000.0],
            meta: SeriesMeta {
                first_year: 2019,
                last_year: 2020,
                year_count: 2,
                statistics_source: "IBGE".into(),
                rate_source: "AwesomeAPI".into(),
                currency_pair: "USD-BRL".into(),
                currency: "USD".into(),
                dropped_years: vec![],
            },
        };
        let rows = formatted_rows(&series);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].year, "2019");
        assert_eq!(rows[0].total_formatted, "$475.00M");
        assert_eq!(rows[0].per_capita_formatted, "$2,375");
        assert_eq!(rows[1].total_value, 400_000_000.0);
        assert_eq!(rows[1].per_capita_value, 2000.0);
    }
}
