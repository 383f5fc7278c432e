use chrono::NaiveDate;
use contracts::dashboards::d400_ad_stats::{
    active_filter, DataQuery, DateRange, FilterOptions, GroupBy, SortOrder, FILTER_ALL,
};

use crate::shared::date_utils::{format_iso_date, parse_iso_date, trailing_window};

/// Days covered by the default date window
pub const DEFAULT_WINDOW_DAYS: i64 = 14;

/// Current values of the filter widgets
#[derive(Clone, Debug, PartialEq)]
pub struct FilterValues {
    pub start_date: String,
    pub end_date: String,
    pub ds_id: String,
    pub ad_id: String,
    pub channel_id: String,
    pub up_id: String,
    pub is_callback_sent: String,
}

impl Default for FilterValues {
    fn default() -> Self {
        Self {
            start_date: String::new(),
            end_date: String::new(),
            ds_id: FILTER_ALL.to_string(),
            ad_id: FILTER_ALL.to_string(),
            channel_id: FILTER_ALL.to_string(),
            up_id: FILTER_ALL.to_string(),
            is_callback_sent: FILTER_ALL.to_string(),
        }
    }
}

impl FilterValues {
    /// Query for /api/data; blank and "all" widgets are left out
    pub fn to_query(&self, group_by: GroupBy, order: SortOrder) -> DataQuery {
        let param = |value: &str| active_filter(Some(value)).map(str::to_string);
        DataQuery {
            start_date: param(&self.start_date),
            end_date: param(&self.end_date),
            ds_id: param(&self.ds_id),
            ad_id: param(&self.ad_id),
            channel_id: param(&self.channel_id),
            up_id: param(&self.up_id),
            is_callback_sent: param(&self.is_callback_sent),
            os: None,
            group_by: match group_by {
                GroupBy::AdId => Some(GroupBy::AdId),
                GroupBy::Detail => None,
            },
            order: Some(order),
        }
    }

    pub fn apply_default_window(&mut self, range: &DateRange, today: NaiveDate) {
        let (start, end) = default_window(range, today);
        self.start_date = format_iso_date(start);
        self.end_date = format_iso_date(end);
    }

    /// Clears every widget and reapplies the default window
    pub fn reset(&mut self, range: &DateRange, today: NaiveDate) {
        *self = Self::default();
        self.apply_default_window(range, today);
    }

    /// Resets selections that are no longer offered to "all"
    pub fn retain_known_selections(&mut self, options: &FilterOptions) {
        retain(&mut self.ds_id, &options.ds_ids);
        retain(&mut self.ad_id, &options.ad_ids);
        retain(&mut self.channel_id, &options.channel_ids);
        retain(&mut self.up_id, &options.up_ids);

        let flags: Vec<String> = options
            .callback_sent_options
            .iter()
            .map(|v| v.to_string())
            .collect();
        retain(&mut self.is_callback_sent, &flags);
    }
}

fn retain(selection: &mut String, offered: &[String]) {
    if selection != FILTER_ALL && !offered.iter().any(|v| v == selection) {
        *selection = FILTER_ALL.to_string();
    }
}

/// Last `DEFAULT_WINDOW_DAYS` days up to the newest stored date (today when unknown),
/// never starting before the oldest stored date
pub fn default_window(range: &DateRange, today: NaiveDate) -> (NaiveDate, NaiveDate) {
    let end = range
        .max_date
        .as_deref()
        .and_then(parse_iso_date)
        .unwrap_or(today);
    let (mut start, end) = trailing_window(end, DEFAULT_WINDOW_DAYS);
    if let Some(min) = range.min_date.as_deref().and_then(parse_iso_date) {
        if start < min {
            start = min;
        }
    }
    (start, end)
}

/// URL query string of a data query, parameters in a fixed order
pub fn query_string(query: &DataQuery) -> String {
    let mut params: Vec<(&str, String)> = Vec::new();
    let mut push = |name: &'static str, value: &Option<String>| {
        if let Some(v) = value {
            params.push((name, v.clone()));
        }
    };
    push("start_date", &query.start_date);
    push("end_date", &query.end_date);
    push("ds_id", &query.ds_id);
    push("ad_id", &query.ad_id);
    push("channel_id", &query.channel_id);
    push("up_id", &query.up_id);
    push("is_callback_sent", &query.is_callback_sent);
    push("os", &query.os);
    if let Some(group_by) = query.group_by {
        params.push(("group_by", group_by.as_param().to_string()));
    }
    if let Some(order) = query.order {
        params.push(("order", order.as_sql().to_lowercase()));
    }

    params
        .iter()
        .map(|(k, v)| format!("{}={}", k, urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&")
}

/// Hands out query ids so that only the newest query applies its result
#[derive(Clone, Copy, Debug, Default)]
pub struct QueryTracker {
    latest: u64,
}

impl QueryTracker {
    pub fn issue(&mut self) -> u64 {
        self.latest += 1;
        self.latest
    }

    pub fn is_latest(&self, id: u64) -> bool {
        id == self.latest
    }
}
