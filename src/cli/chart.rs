use super::ui;
use crate::core::format::FormattedRow;
use crate::core::provider::ProviderSnapshot;
use console::style;

const BAR_WIDTH: usize = 40;

/// Bar proportional to `value / max`, at most `width` blocks.
pub fn bar(value: f64, max: f64, width: usize) -> String {
    if !(value > 0.0 && max > 0.0) {
        return String::new();
    }
    let blocks = ((value / max) * width as f64).round() as usize;
    "█".repeat(blocks.clamp(1, width))
}

fn render_section(
    title: &str,
    rows: &[FormattedRow],
    value: impl Fn(&FormattedRow) -> f64,
    label: impl Fn(&FormattedRow) -> &str,
    green: bool,
) -> String {
    let max = rows.iter().map(&value).fold(0.0_f64, f64::max);
    let mut output = format!("{}\n", ui::style_text(title, ui::StyleType::Label));
    for row in rows {
        let padded = format!("{:<BAR_WIDTH$}", bar(value(row), max, BAR_WIDTH));
        let styled = if green {
            style(padded).green()
        } else {
            style(padded).cyan()
        };
        output.push_str(&format!("{}  {} {}\n", row.year, styled, label(row)));
    }
    output
}

pub fn render(snapshot: &ProviderSnapshot) -> String {
    let rows = snapshot.formatted_data();
    let Some(series) = snapshot.series.as_deref().filter(|_| !rows.is_empty()) else {
        return ui::style_text("No data available to display.", ui::StyleType::Subtle);
    };

    let mut output = format!(
        "{}\n\n",
        ui::style_text(
            &format!(
                "Brazilian GDP in {} ({} to {})",
                series.meta.currency, series.meta.first_year, series.meta.last_year
            ),
            ui::StyleType::Title
        )
    );
    output.push_str(&render_section(
        "GDP Total",
        rows,
        |row| row.total_value,
        |row| row.total_formatted.as_str(),
        true,
    ));
    output.push('\n');
    output.push_str(&render_section(
        "GDP per Capita",
        rows,
        |row| row.per_capita_value,
        |row| row.per_capita_formatted.as_str(),
        false,
    ));
    output.push_str(&format!(
        "\n{}",
        ui::style_text(
            &format!(
                "Source: {} aggregates API, {} {} annual average rates",
                series.meta.statistics_source, series.meta.rate_source, series.meta.currency_pair
            ),
            ui::StyleType::Subtle
        )
    ));
    output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bar_scales_to_max() {
        assert_eq!(bar(100.0, 100.0, 10).chars().count(), 10);
        assert_eq!(bar(50.0, 100.0, 10).chars().count(), 5);
        // Tiny positive values still get one block.
        assert_eq!(bar(0.1, 100.0, 10).chars().count(), 1);
    }

    #[test]
    fn test_bar_for_non_positive_values() {
        assert_eq!(bar(0.0, 100.0, 10), "");
        assert_eq!(bar(5.0, 0.0, 10), "");
        assert_eq!(bar(f64::NAN, 100.0, 10), "");
    }
}
