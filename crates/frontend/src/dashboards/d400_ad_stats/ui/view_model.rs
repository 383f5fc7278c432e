use contracts::dashboards::d400_ad_stats::{DataRow, FilterOptions, FILTER_ALL};

use crate::shared::components::table::{format_count, format_percent};

/// Number of table columns, used by the no-data row
pub const TABLE_COLUMNS: usize = 16;

/// Column sums of the displayed rows
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Totals {
    pub request_count: i64,
    pub request_success_count: i64,
    pub request_failed_count: i64,
    pub activated_count: i64,
    pub registered_count: i64,
    pub paid_count: i64,
    pub total_callback_count: i64,
    pub callback_failed_count: i64,
}

impl Totals {
    pub fn from_rows(rows: &[DataRow]) -> Self {
        rows.iter().fold(Self::default(), |mut t, row| {
            t.request_count += row.request_count;
            t.request_success_count += row.request_success_count;
            t.request_failed_count += row.request_failed_count;
            t.activated_count += row.activated_count;
            t.registered_count += row.registered_count;
            t.paid_count += row.paid_count;
            t.total_callback_count += row.total_callback_count;
            t.callback_failed_count += row.callback_failed_count;
            t
        })
    }

    /// Overall rate from the sums, not the mean of the row rates
    pub fn callback_rate(&self) -> f64 {
        if self.request_count == 0 {
            0.0
        } else {
            self.total_callback_count as f64 * 100.0 / self.request_count as f64
        }
    }
}

/// Row background classes; the class flips whenever `date_day` changes
pub fn band_classes(rows: &[DataRow]) -> Vec<&'static str> {
    let mut classes = Vec::with_capacity(rows.len());
    let mut odd = false;
    let mut previous: Option<Option<&str>> = None;

    for row in rows {
        let day = row.date_day.as_deref();
        if previous != Some(day) {
            odd = !odd;
            previous = Some(day);
        }
        classes.push(if odd { "date-group-odd" } else { "date-group-even" });
    }
    classes
}

/// CSS display of an overlay
pub fn overlay_display(visible: bool) -> &'static str {
    if visible {
        "flex"
    } else {
        "none"
    }
}

pub fn count_label(count: usize) -> String {
    format!("{} items", count)
}

/// Text cell, "-" when missing or empty
pub fn text_cell(value: Option<&str>) -> String {
    match value {
        Some(v) if !v.is_empty() => v.to_string(),
        _ => "-".to_string(),
    }
}

pub fn count_cell(value: i64) -> String {
    format_count(value)
}

pub fn rate_cell(rate: Option<f64>) -> String {
    rate.map(format_percent).unwrap_or_else(|| "-".to_string())
}

/// Ad name column: mapped display name, otherwise the raw id
pub fn ad_name_cell(options: &FilterOptions, ad_id: Option<&str>) -> String {
    match ad_id {
        Some(id) if !id.is_empty() => options.ad_name(id).to_string(),
        _ => "-".to_string(),
    }
}

/// "all" first, then every value labelled by itself
pub fn plain_options(values: &[String]) -> Vec<(String, String)> {
    with_all(values.iter().map(|v| (v.clone(), v.clone())))
}

/// Ad ids labelled "<id> - <name>" when a display name is known
pub fn ad_options(options: &FilterOptions) -> Vec<(String, String)> {
    with_all(options.ad_ids.iter().map(|id| {
        let label = match options.ad_mapping.get(id) {
            Some(name) => format!("{} - {}", id, name),
            None => id.clone(),
        };
        (id.clone(), label)
    }))
}

pub fn callback_sent_options(values: &[i64]) -> Vec<(String, String)> {
    with_all(
        values
            .iter()
            .map(|v| (v.to_string(), callback_sent_label(*v))),
    )
}

fn callback_sent_label(value: i64) -> String {
    match value {
        0 => "Not sent".to_string(),
        1 => "Sent".to_string(),
        2 => "Deducted".to_string(),
        other => other.to_string(),
    }
}

fn with_all(values: impl Iterator<Item = (String, String)>) -> Vec<(String, String)> {
    std::iter::once((FILTER_ALL.to_string(), "All".to_string()))
        .chain(values)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn row(day: &str, requests: i64, callbacks: i64) -> DataRow {
        DataRow {
            date_day: Some(day.to_string()),
            request_count: requests,
            request_success_count: requests - 1,
            request_failed_count: 1,
            activated_count: callbacks,
            total_callback_count: callbacks,
            ..Default::default()
        }
    }

    #[test]
    fn test_totals_sum_every_column() {
        let rows = vec![row("2024-03-02", 100, 10), row("2024-03-01", 50, 5), row("2024-03-01", 1, 0)];
        let totals = Totals::from_rows(&rows);

        assert_eq!(totals.request_count, 151);
        assert_eq!(totals.request_success_count, 148);
        assert_eq!(totals.request_failed_count, 3);
        assert_eq!(totals.activated_count, 15);
        assert_eq!(totals.total_callback_count, 15);
        assert_eq!(totals.paid_count, 0);
        assert_eq!(format_percent(totals.callback_rate()), "9.93%");
    }

    #[test]
    fn test_total_rate_is_zero_without_requests() {
        let totals = Totals::from_rows(&[]);
        assert_eq!(totals, Totals::default());
        assert_eq!(format_percent(totals.callback_rate()), "0.00%");
    }

    #[test]
    fn test_band_classes_toggle_on_date_change() {
        let rows = vec![
            row("2024-03-03", 1, 0),
            row("2024-03-03", 1, 0),
            row("2024-03-02", 1, 0),
            row("2024-03-01", 1, 0),
            row("2024-03-01", 1, 0),
            row("2024-03-03", 1, 0),
        ];
        assert_eq!(
            band_classes(&rows),
            vec![
                "date-group-odd",
                "date-group-odd",
                "date-group-even",
                "date-group-odd",
                "date-group-odd",
                "date-group-even",
            ]
        );
        assert!(band_classes(&[]).is_empty());
    }

    #[test]
    fn test_overlay_display() {
        assert_eq!(overlay_display(true), "flex");
        assert_eq!(overlay_display(false), "none");
    }

    #[test]
    fn test_cells() {
        assert_eq!(count_label(0), "0 items");
        assert_eq!(count_label(12), "12 items");
        assert_eq!(text_cell(None), "-");
        assert_eq!(text_cell(Some("")), "-");
        assert_eq!(text_cell(Some("ds1")), "ds1");
        assert_eq!(count_cell(1234567), "1,234,567");
        assert_eq!(rate_cell(Some(9.5)), "9.50%");
        assert_eq!(rate_cell(None), "-");
    }

    #[test]
    fn test_option_lists() {
        let options = FilterOptions {
            ad_ids: vec!["A1".to_string(), "A2".to_string()],
            ad_mapping: HashMap::from([("A1".to_string(), "Spring promo".to_string())]),
            ..Default::default()
        };

        assert_eq!(
            ad_options(&options),
            vec![
                ("all".to_string(), "All".to_string()),
                ("A1".to_string(), "A1 - Spring promo".to_string()),
                ("A2".to_string(), "A2".to_string()),
            ]
        );
        assert_eq!(ad_name_cell(&options, Some("A1")), "Spring promo");
        assert_eq!(ad_name_cell(&options, Some("A2")), "A2");
        assert_eq!(ad_name_cell(&options, None), "-");

        assert_eq!(plain_options(&[]), vec![("all".to_string(), "All".to_string())]);
        assert_eq!(
            callback_sent_options(&[0, 2]),
            vec![
                ("all".to_string(), "All".to_string()),
                ("0".to_string(), "Not sent".to_string()),
                ("2".to_string(), "Deducted".to_string()),
            ]
        );
    }
}
