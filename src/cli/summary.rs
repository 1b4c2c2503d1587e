use super::ui;
use crate::core::cache::CacheInfo;
use crate::core::format::{format_usd, format_usd_compact};
use crate::core::provider::ProviderSnapshot;
use comfy_table::Cell;

pub fn render(snapshot: &ProviderSnapshot, cache: &CacheInfo) -> String {
    let Some(series) = snapshot.series.as_deref() else {
        return ui::style_text("No data available to display.", ui::StyleType::Subtle);
    };
    let meta = &series.meta;

    let mut output = format!(
        "{}\n\n",
        ui::style_text("Brazilian GDP Summary", ui::StyleType::Title)
    );

    let mut table = ui::new_styled_table();
    table.set_header(vec![ui::header_cell("Field"), ui::header_cell("Value")]);
    let dropped = if meta.dropped_years.is_empty() {
        "none".to_string()
    } else {
        meta.dropped_years
            .iter()
            .map(i32::to_string)
            .collect::<Vec<_>>()
            .join(", ")
    };
    for (field, value) in [
        ("Period", format!("{} to {}", meta.first_year, meta.last_year)),
        ("Years", meta.year_count.to_string()),
        ("Statistics source", meta.statistics_source.clone()),
        (
            "Rate source",
            format!("{} ({})", meta.rate_source, meta.currency_pair),
        ),
        ("Currency", meta.currency.clone()),
        ("Dropped years", dropped),
    ] {
        table.add_row(vec![Cell::new(field), Cell::new(value)]);
    }
    output.push_str(&table.to_string());

    if let Some(stats) = snapshot.stats() {
        let mut table = ui::new_styled_table();
        table.set_header(vec![
            ui::header_cell("Statistic"),
            ui::header_cell("GDP Total"),
            ui::header_cell("GDP per Capita"),
        ]);
        table.add_row(vec![
            Cell::new("Current"),
            ui::value_cell(&format_usd_compact(stats.current_total)),
            ui::value_cell(&format_usd(stats.current_per_capita)),
        ]);
        table.add_row(vec![
            Cell::new("Maximum"),
            ui::value_cell(&format_usd_compact(stats.max_total)),
            ui::value_cell(&format_usd(stats.max_per_capita)),
        ]);
        table.add_row(vec![
            Cell::new("Minimum"),
            ui::value_cell(&format_usd_compact(stats.min_total)),
            ui::value_cell(&format_usd(stats.min_per_capita)),
        ]);
        table.add_row(vec![
            Cell::new("Average annual growth"),
            ui::change_cell(stats.average_annual_growth),
            Cell::new(""),
        ]);
        table.add_row(vec![
            Cell::new("Last year growth"),
            ui::change_cell(stats.last_year_growth),
            Cell::new(""),
        ]);
        output.push_str("\n\n");
        output.push_str(&table.to_string());
    }

    output.push_str(&format!(
        "\n\n{} {} ({})",
        ui::style_text("Cached rates:", ui::StyleType::Label),
        ui::style_text(&cache.size.to_string(), ui::StyleType::Value),
        ui::style_text(&cache.keys.join(", "), ui::StyleType::Subtle)
    ));
    output
}
