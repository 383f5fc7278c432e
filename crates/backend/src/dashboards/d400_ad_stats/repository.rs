use anyhow::Result;
use contracts::dashboards::d400_ad_stats::{GroupBy, SortOrder, AD_OPTIONS_LIMIT, DATA_ROW_LIMIT};
use sea_orm::{DatabaseBackend, DatabaseConnection, FromQueryResult, Statement};
use std::collections::HashMap;

use super::filters::WhereClause;

/// Raw metrics row, shared by the detail and the grouped query
#[derive(Debug, Clone, FromQueryResult)]
pub struct AdStatsRow {
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
    pub callback_rate: Option<f64>,
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone, FromQueryResult)]
pub struct DateBounds {
    pub min_date: Option<String>,
    pub max_date: Option<String>,
}

#[derive(Debug, Clone, FromQueryResult)]
pub struct SummaryRow {
    pub record_count: i64,
    pub date_count: i64,
    pub ad_count: i64,
    pub total_requests: i64,
    pub total_callbacks: i64,
    pub overall_callback_rate: Option<f64>,
}

#[derive(Debug, Clone, FromQueryResult)]
pub struct DistributionRow {
    pub callback_event_type: String,
    pub callback_count: i64,
    pub percentage: Option<f64>,
}

/// Column that counts callback events.
///
/// Deducted records never send a callback, so their events are counted by requests.
pub fn callback_metric(deducted_only: bool) -> &'static str {
    if deducted_only {
        "request_count"
    } else {
        "callback_count"
    }
}

pub async fn get_date_bounds(db: &DatabaseConnection) -> Result<DateBounds> {
    let sql = "SELECT MIN(date_day) AS min_date, MAX(date_day) AS max_date FROM ad_stats_daily";
    let stmt = Statement::from_string(DatabaseBackend::Sqlite, sql.to_string());
    let bounds = DateBounds::find_by_statement(stmt).one(db).await?;
    Ok(bounds.unwrap_or(DateBounds {
        min_date: None,
        max_date: None,
    }))
}

/// Distinct non-null values of a text column, ascending
pub async fn get_distinct_values(
    db: &DatabaseConnection,
    column: DistinctColumn,
    limit: Option<u64>,
) -> Result<Vec<String>> {
    #[derive(Debug, FromQueryResult)]
    struct DistinctValue {
        value: Option<String>,
    }

    let column = column.as_sql();
    let mut sql = format!(
        "SELECT DISTINCT {column} AS value FROM ad_stats_daily \
         WHERE {column} IS NOT NULL ORDER BY {column}"
    );
    if let Some(limit) = limit {
        sql.push_str(&format!(" LIMIT {}", limit));
    }

    let stmt = Statement::from_string(DatabaseBackend::Sqlite, sql);
    let rows = DistinctValue::find_by_statement(stmt).all(db).await?;
    Ok(rows.into_iter().filter_map(|r| r.value).collect())
}

/// Text columns offered as filter options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DistinctColumn {
    DsId,
    AdId,
    ChannelId,
    Os,
    UpId,
}

impl DistinctColumn {
    fn as_sql(&self) -> &'static str {
        match self {
            DistinctColumn::DsId => "ds_id",
            DistinctColumn::AdId => "ad_id",
            DistinctColumn::ChannelId => "channel_id",
            DistinctColumn::Os => "os",
            DistinctColumn::UpId => "up_id",
        }
    }

    /// Ad ids are capped, every other list is complete
    pub fn limit(&self) -> Option<u64> {
        match self {
            DistinctColumn::AdId => Some(AD_OPTIONS_LIMIT),
            _ => None,
        }
    }
}

pub async fn get_callback_sent_options(db: &DatabaseConnection) -> Result<Vec<i64>> {
    #[derive(Debug, FromQueryResult)]
    struct Flag {
        is_callback_sent: Option<i64>,
    }

    let sql = "SELECT DISTINCT is_callback_sent FROM ad_stats_daily \
               WHERE is_callback_sent IS NOT NULL ORDER BY is_callback_sent";
    let stmt = Statement::from_string(DatabaseBackend::Sqlite, sql.to_string());
    let rows = Flag::find_by_statement(stmt).all(db).await?;
    Ok(rows.into_iter().filter_map(|r| r.is_callback_sent).collect())
}

/// Active ad_id -> display name pairs
pub async fn get_ad_mapping(db: &DatabaseConnection) -> Result<HashMap<String, String>> {
    #[derive(Debug, FromQueryResult)]
    struct Mapping {
        ad_id: String,
        display_name: String,
    }

    let sql = "SELECT ad_id, display_name FROM ad_name_map WHERE is_active = 1";
    let stmt = Statement::from_string(DatabaseBackend::Sqlite, sql.to_string());
    let rows = Mapping::find_by_statement(stmt).all(db).await?;
    Ok(rows
        .into_iter()
        .map(|m| (m.ad_id, m.display_name))
        .collect())
}

/// SQL of the metrics query; `metric` is one of [`callback_metric`]'s columns
pub fn data_sql(where_sql: &str, group_by: GroupBy, order: SortOrder, metric: &str) -> String {
    let order = order.as_sql();
    match group_by {
        GroupBy::AdId => format!(
            r#"
            SELECT
                date_day,
                MAX(up_id) AS up_id,
                MAX(ds_id) AS ds_id,
                ad_id,
                MAX(channel_id) AS channel_id,
                MAX(is_callback_sent) AS is_callback_sent,
                SUM(request_count) AS request_count,
                SUM(request_success_count) AS request_success_count,
                SUM(request_failed_count) AS request_failed_count,
                SUM(CASE WHEN callback_event_type IN ('ACTIVATED', 'activate') THEN {metric} ELSE 0 END) AS activated_count,
                SUM(CASE WHEN callback_event_type IN ('REGISTERED', 'reg') THEN {metric} ELSE 0 END) AS registered_count,
                SUM(CASE WHEN callback_event_type = 'PAID' THEN {metric} ELSE 0 END) AS paid_count,
                SUM(CASE WHEN callback_event_type IS NOT NULL THEN {metric} ELSE 0 END) AS total_callback_count,
                SUM(callback_failed_count) AS callback_failed_count,
                ROUND(SUM(callback_count) * 100.0 / NULLIF(SUM(request_count), 0), 2) AS callback_rate,
                MAX(updated_at) AS updated_at
            FROM ad_stats_daily
            WHERE {where_sql}
            GROUP BY date_day, ad_id
            ORDER BY date_day {order}, request_count DESC
            LIMIT {limit}
            "#,
            limit = DATA_ROW_LIMIT
        ),
        GroupBy::Detail => format!(
            r#"
            SELECT
                date_day,
                up_id,
                ds_id,
                ad_id,
                channel_id,
                is_callback_sent,
                request_count,
                request_success_count,
                request_failed_count,
                CASE WHEN callback_event_type IN ('ACTIVATED', 'activate') THEN {metric} ELSE 0 END AS activated_count,
                CASE WHEN callback_event_type IN ('REGISTERED', 'reg') THEN {metric} ELSE 0 END AS registered_count,
                CASE WHEN callback_event_type = 'PAID' THEN {metric} ELSE 0 END AS paid_count,
                {metric} AS total_callback_count,
                callback_failed_count,
                ROUND(CASE WHEN request_count > 0 THEN callback_count * 100.0 / request_count ELSE 0 END, 2) AS callback_rate,
                updated_at
            FROM ad_stats_daily
            WHERE {where_sql}
            ORDER BY date_day {order}, request_count DESC
            LIMIT {limit}
            "#,
            limit = DATA_ROW_LIMIT
        ),
    }
}

pub async fn get_rows(
    db: &DatabaseConnection,
    clause: &WhereClause,
    group_by: GroupBy,
    order: SortOrder,
    deducted_only: bool,
) -> Result<Vec<AdStatsRow>> {
    let sql = data_sql(&clause.sql, group_by, order, callback_metric(deducted_only));
    let stmt =
        Statement::from_sql_and_values(DatabaseBackend::Sqlite, &sql, clause.values.clone());
    let rows = AdStatsRow::find_by_statement(stmt).all(db).await?;
    Ok(rows)
}

pub async fn get_summary(db: &DatabaseConnection, clause: &WhereClause) -> Result<SummaryRow> {
    let sql = format!(
        r#"
        SELECT
            COUNT(*) AS record_count,
            COUNT(DISTINCT date_day) AS date_count,
            COUNT(DISTINCT ad_id) AS ad_count,
            COALESCE(SUM(request_count), 0) AS total_requests,
            COALESCE(SUM(callback_count), 0) AS total_callbacks,
            ROUND(SUM(callback_count) * 100.0 / NULLIF(SUM(request_count), 0), 2) AS overall_callback_rate
        FROM ad_stats_daily
        WHERE {}
        "#,
        clause.sql
    );
    let stmt =
        Statement::from_sql_and_values(DatabaseBackend::Sqlite, &sql, clause.values.clone());
    SummaryRow::find_by_statement(stmt)
        .one(db)
        .await?
        .ok_or_else(|| anyhow::anyhow!("summary query returned no row"))
}

pub async fn get_callback_distribution(
    db: &DatabaseConnection,
    clause: &WhereClause,
) -> Result<Vec<DistributionRow>> {
    // The clause appears twice: in the total subquery and in the outer WHERE
    let sql = format!(
        r#"
        SELECT
            COALESCE(callback_event_type, 'NULL') AS callback_event_type,
            COALESCE(SUM(callback_count), 0) AS callback_count,
            ROUND(
                SUM(callback_count) * 100.0 /
                NULLIF((SELECT SUM(callback_count) FROM ad_stats_daily WHERE {where_sql}), 0),
                2
            ) AS percentage
        FROM ad_stats_daily
        WHERE {where_sql}
        GROUP BY callback_event_type
        ORDER BY callback_count DESC
        "#,
        where_sql = clause.sql
    );
    let stmt =
        Statement::from_sql_and_values(DatabaseBackend::Sqlite, &sql, clause.repeated_values(2));
    let rows = DistributionRow::find_by_statement(stmt).all(db).await?;
    Ok(rows)
}
