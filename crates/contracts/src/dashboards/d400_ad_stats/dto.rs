use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashMap;

/// Select value meaning "no filter on this column"
pub const FILTER_ALL: &str = "all";

/// Maximum number of rows returned by `/api/data`
pub const DATA_ROW_LIMIT: u64 = 1000;

/// Maximum number of ad ids offered in the ad filter
pub const AD_OPTIONS_LIMIT: u64 = 50;

/// `is_callback_sent` value marking deducted records
pub const CALLBACK_DEDUCTED: i64 = 2;

/// Returns the trimmed filter value, or `None` when it is blank or `"all"`
pub fn active_filter(value: Option<&str>) -> Option<&str> {
    let value = value?.trim();
    if value.is_empty() || value == FILTER_ALL {
        None
    } else {
        Some(value)
    }
}

/// Date bounds of the stored statistics ("YYYY-MM-DD")
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DateRange {
    pub min_date: Option<String>,
    pub max_date: Option<String>,
}

/// Response of GET /api/filter-options
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterOptions {
    pub date_range: DateRange,
    /// ad_id -> display name, active mappings only
    pub ad_mapping: HashMap<String, String>,
    pub ds_ids: Vec<String>,
    pub ad_ids: Vec<String>,
    pub channel_ids: Vec<String>,
    pub os_list: Vec<String>,
    pub up_ids: Vec<String>,
    pub callback_sent_options: Vec<i64>,
}

impl FilterOptions {
    /// Display name for an ad, falling back to the id itself
    pub fn ad_name<'a>(&'a self, ad_id: &'a str) -> &'a str {
        self.ad_mapping
            .get(ad_id)
            .map(String::as_str)
            .unwrap_or(ad_id)
    }
}

/// Server-side aggregation key of a data query
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum GroupBy {
    /// One row per (date_day, ad_id)
    AdId,
    /// Stored rows as they are
    #[default]
    Detail,
}

impl GroupBy {
    pub fn as_param(&self) -> &'static str {
        match self {
            GroupBy::AdId => "ad_id",
            GroupBy::Detail => "detail",
        }
    }

    /// Unknown keys fall back to the detail view
    pub fn from_param(value: &str) -> Self {
        match value.trim() {
            "ad_id" => GroupBy::AdId,
            _ => GroupBy::Detail,
        }
    }
}

impl Serialize for GroupBy {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_param())
    }
}

impl<'de> Deserialize<'de> for GroupBy {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        Ok(GroupBy::from_param(&value))
    }
}

/// Direction of the date ordering
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub fn as_sql(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }

    /// Anything but a case-insensitive "asc" sorts descending
    pub fn from_param(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("asc") {
            SortOrder::Asc
        } else {
            SortOrder::Desc
        }
    }
}

impl Serialize for SortOrder {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_sql())
    }
}

impl<'de> Deserialize<'de> for SortOrder {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        Ok(SortOrder::from_param(&value))
    }
}

/// Query parameters of GET /api/data, /api/summary and /api/callback-distribution
///
/// Filter values are kept as sent by the page; `"all"` and blanks mean
/// "no filter" (see [`active_filter`]).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ds_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ad_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub up_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_callback_sent: Option<String>,
    /// Only honoured by the callback distribution report
    #[serde(skip_serializing_if = "Option::is_none")]
    pub os: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_by: Option<GroupBy>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order: Option<SortOrder>,
}

impl DataQuery {
    pub fn group_by(&self) -> GroupBy {
        self.group_by.unwrap_or_default()
    }

    pub fn order(&self) -> SortOrder {
        self.order.unwrap_or_default()
    }

    /// True when only deducted records are requested
    pub fn is_deducted_only(&self) -> bool {
        active_filter(self.is_callback_sent.as_deref())
            .and_then(|v| v.parse::<i64>().ok())
            == Some(CALLBACK_DEDUCTED)
    }
}

/// One aggregated metrics row
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataRow {
    /// "YYYY-MM-DD"
    pub date_day: Option<String>,
    pub up_id: Option<String>,
    pub ds_id: Option<String>,
    pub ad_id: Option<String>,
    pub channel_id: Option<String>,
    pub is_callback_sent: Option<i64>,
    pub request_count: i64,
    pub request_success_count: i64,
    pub request_failed_count: i64,
    pub activated_count: i64,
    pub registered_count: i64,
    pub paid_count: i64,
    pub total_callback_count: i64,
    pub callback_failed_count: i64,
    /// Percent with two decimals, `None` when there were no requests
    pub callback_rate: Option<f64>,
    /// "YYYY-MM-DD HH:MM:SS"
    pub updated_at: Option<String>,
}

/// Response of GET /api/data
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DataResponse {
    pub data: Vec<DataRow>,
    #[serde(default)]
    pub count: usize,
}

/// Error body returned by every endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Either an `{error}` body or the expected payload
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ApiPayload<T> {
    Failure(ErrorResponse),
    Success(T),
}

impl<T> ApiPayload<T> {
    pub fn into_result(self) -> Result<T, String> {
        match self {
            ApiPayload::Failure(e) => Err(e.error),
            ApiPayload::Success(value) => Ok(value),
        }
    }
}

/// Response of GET /api/summary
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SummaryResponse {
    pub record_count: i64,
    pub date_count: i64,
    pub ad_count: i64,
    pub total_requests: i64,
    pub total_callbacks: i64,
    pub overall_callback_rate: Option<f64>,
}

/// One row of GET /api/callback-distribution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallbackDistributionRow {
    /// Event type, "NULL" for rows without one
    pub callback_event_type: String,
    pub callback_count: i64,
    pub percentage: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_active_filter_skips_all_and_blank() {
        assert_eq!(active_filter(None), None);
        assert_eq!(active_filter(Some("")), None);
        assert_eq!(active_filter(Some("   ")), None);
        assert_eq!(active_filter(Some("all")), None);
        assert_eq!(active_filter(Some(" ds01 ")), Some("ds01"));
    }

    #[test]
    fn test_order_and_group_by_are_lenient() {
        assert_eq!(SortOrder::from_param("asc"), SortOrder::Asc);
        assert_eq!(SortOrder::from_param("ASC"), SortOrder::Asc);
        assert_eq!(SortOrder::from_param("up"), SortOrder::Desc);
        assert_eq!(GroupBy::from_param("ad_id"), GroupBy::AdId);
        assert_eq!(GroupBy::from_param("channel_id"), GroupBy::Detail);

        let query: DataQuery =
            serde_json::from_str(r#"{"group_by":"ad_id","order":"sideways"}"#).unwrap();
        assert_eq!(query.group_by(), GroupBy::AdId);
        assert_eq!(query.order(), SortOrder::Desc);
    }

    #[test]
    fn test_deducted_only() {
        let mut query = DataQuery::default();
        assert!(!query.is_deducted_only());
        query.is_callback_sent = Some("2".to_string());
        assert!(query.is_deducted_only());
        query.is_callback_sent = Some("1".to_string());
        assert!(!query.is_deducted_only());
    }

    #[test]
    fn test_payload_distinguishes_error_body() {
        let failure: ApiPayload<DataResponse> =
            serde_json::from_str(r#"{"error":"db down"}"#).unwrap();
        assert_eq!(failure.into_result(), Err("db down".to_string()));

        let success: ApiPayload<DataResponse> = serde_json::from_str(
            r#"{"data":[{"date_day":"2025-01-02","request_count":5}],"count":1}"#,
        )
        .unwrap();
        let response = success.into_result().unwrap();
        assert_eq!(response.count, 1);
        assert_eq!(response.data[0].request_count, 5);
        assert_eq!(response.data[0].paid_count, 0);
        assert_eq!(response.data[0].callback_rate, None);
    }

    #[test]
    fn test_filter_options_tolerate_missing_lists() {
        let options: FilterOptions =
            serde_json::from_str(r#"{"date_range":{"min_date":"2025-01-01","max_date":null}}"#)
                .unwrap();
        assert_eq!(options.date_range.min_date.as_deref(), Some("2025-01-01"));
        assert!(options.ad_ids.is_empty());
        assert_eq!(options.ad_name("A1"), "A1");
    }
}
