use super::ui;
use crate::core::format::FormattedRow;
use crate::core::provider::ProviderSnapshot;
use comfy_table::Cell;

pub const ROWS_PER_PAGE: usize = 8;

/// One page of rows ordered by year.
#[derive(Debug, PartialEq)]
pub struct Page<'a> {
    pub rows: Vec<&'a FormattedRow>,
    /// 1-based, clamped to `1..=total_pages`.
    pub number: usize,
    pub total_pages: usize,
    /// 1-based position of the first row shown, 0 when there are none.
    pub first: usize,
    pub last: usize,
    pub total_records: usize,
}

impl Page<'_> {
    pub fn footer(&self) -> String {
        format!(
            "Showing {} to {} of {} records",
            self.first, self.last, self.total_records
        )
    }
}

pub fn paginate(rows: &[FormattedRow], page: usize, descending: bool) -> Page<'_> {
    let mut ordered: Vec<&FormattedRow> = rows.iter().collect();
    ordered.sort_by_key(|row| row.year.parse::<i32>().unwrap_or_default());
    if descending {
        ordered.reverse();
    }

    let total_pages = ordered.len().div_ceil(ROWS_PER_PAGE).max(1);
    let number = page.clamp(1, total_pages);
    let start = (number - 1) * ROWS_PER_PAGE;
    let end = (start + ROWS_PER_PAGE).min(ordered.len());

    Page {
        rows: ordered[start..end].to_vec(),
        number,
        total_pages,
        first: if end > start { start + 1 } else { 0 },
        last: end,
        total_records: ordered.len(),
    }
}

pub fn render(snapshot: &ProviderSnapshot, page: usize, descending: bool) -> String {
    let rows = snapshot.formatted_data();
    if rows.is_empty() {
        return ui::style_text("No data available to display.", ui::StyleType::Subtle);
    }

    let page = paginate(rows, page, descending);
    let arrow = if descending { "↓" } else { "↑" };

    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell(&format!("Year {arrow}")),
        ui::header_cell("GDP Total (USD)"),
        ui::header_cell("GDP per Capita (USD)"),
    ]);
    for row in &page.rows {
        table.add_row(vec![
            Cell::new(&row.year),
            ui::value_cell(&row.total_formatted),
            ui::value_cell(&row.per_capita_formatted),
        ]);
    }

    let mut output = format!(
        "{}\n\n",
        ui::style_text("Brazilian GDP by Year", ui::StyleType::Title)
    );
    output.push_str(&table.to_string());
    output.push_str(&format!(
        "\n\n{}  {}",
        page.footer(),
        ui::style_text(
            &format!("Page {} of {}", page.number, page.total_pages),
            ui::StyleType::Subtle
        )
    ));
    output
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows(years: std::ops::RangeInclusive<i32>) -> Vec<FormattedRow> {
        years
            .map(|year| FormattedRow {
                year: year.to_string(),
                total_formatted: format!("${year}.00M"),
                per_capita_formatted: format!("${year}"),
                total_value: year as f64 * 1e6,
                per_capita_value: year as f64,
            })
            .collect()
    }

    fn years(page: &Page) -> Vec<String> {
        page.rows.iter().map(|row| row.year.clone()).collect()
    }

    #[test]
    fn test_first_page_ascending() {
        let data = rows(2002..=2021);
        let page = paginate(&data, 1, false);
        assert_eq!(page.rows.len(), ROWS_PER_PAGE);
        assert_eq!(years(&page)[0], "2002");
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.footer(), "Showing 1 to 8 of 20 records");
    }

    #[test]
    fn test_last_page_is_partial() {
        let data = rows(2002..=2021);
        let page = paginate(&data, 3, false);
        assert_eq!(years(&page), vec!["2018", "2019", "2020", "2021"]);
        assert_eq!(page.footer(), "Showing 17 to 20 of 20 records");
    }

    #[test]
    fn test_descending_order() {
        let data = rows(2002..=2021);
        let page = paginate(&data, 1, true);
        assert_eq!(years(&page)[0], "2021");
        assert_eq!(years(&page)[7], "2014");
    }

    #[test]
    fn test_out_of_range_pages_are_clamped() {
        let data = rows(2019..=2020);
        assert_eq!(paginate(&data, 0, false).number, 1);
        assert_eq!(paginate(&data, 99, false).number, 1);

        let data = rows(2002..=2021);
        assert_eq!(paginate(&data, 99, false).number, 3);
    }

    #[test]
    fn test_empty_rows() {
        let page = paginate(&[], 1, false);
        assert!(page.rows.is_empty());
        assert_eq!(page.total_pages, 1);
        assert_eq!(page.footer(), "Showing 0 to 0 of 0 records");
    }
}
