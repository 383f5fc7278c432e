use anyhow::Result;
use contracts::dashboards::d400_ad_stats::{
    CallbackDistributionRow, DataQuery, DataResponse, DataRow, DateRange, FilterOptions,
    SummaryResponse,
};
use sea_orm::DatabaseConnection;

use super::filters::{build_where, DATA_FILTERS, DISTRIBUTION_FILTERS};
use super::repository::{self, AdStatsRow, DistinctColumn};

impl From<AdStatsRow> for DataRow {
    fn from(row: AdStatsRow) -> Self {
        Self {
            date_day: row.date_day,
            up_id: row.up_id,
            ds_id: row.ds_id,
            ad_id: row.ad_id,
            channel_id: row.channel_id,
            is_callback_sent: row.is_callback_sent,
            request_count: row.request_count,
            request_success_count: row.request_success_count,
            request_failed_count: row.request_failed_count,
            activated_count: row.activated_count,
            registered_count: row.registered_count,
            paid_count: row.paid_count,
            total_callback_count: row.total_callback_count,
            callback_failed_count: row.callback_failed_count,
            callback_rate: row.callback_rate,
            updated_at: row.updated_at,
        }
    }
}

/// Everything the filter bar needs to populate itself
pub async fn get_filter_options(db: &DatabaseConnection) -> Result<FilterOptions> {
    let bounds = repository::get_date_bounds(db).await?;

    let distinct = |column: DistinctColumn| repository::get_distinct_values(db, column, column.limit());
    let ds_ids = distinct(DistinctColumn::DsId).await?;
    let ad_ids = distinct(DistinctColumn::AdId).await?;
    let channel_ids = distinct(DistinctColumn::ChannelId).await?;
    let os_list = distinct(DistinctColumn::Os).await?;
    let up_ids = distinct(DistinctColumn::UpId).await?;
    let callback_sent_options = repository::get_callback_sent_options(db).await?;

    // A broken name map degrades to raw ids instead of failing the page
    let ad_mapping = match repository::get_ad_mapping(db).await {
        Ok(mapping) => {
            tracing::info!("Loaded {} ad name mappings", mapping.len());
            mapping
        }
        Err(e) => {
            tracing::error!("Failed to load ad name mappings: {}", e);
            Default::default()
        }
    };

    Ok(FilterOptions {
        date_range: DateRange {
            min_date: bounds.min_date,
            max_date: bounds.max_date,
        },
        ad_mapping,
        ds_ids,
        ad_ids,
        channel_ids,
        os_list,
        up_ids,
        callback_sent_options,
    })
}

pub async fn get_data(db: &DatabaseConnection, query: &DataQuery) -> Result<DataResponse> {
    let clause = build_where(query, DATA_FILTERS)?;
    let rows = repository::get_rows(
        db,
        &clause,
        query.group_by(),
        query.order(),
        query.is_deducted_only(),
    )
    .await?;

    let data: Vec<DataRow> = rows.into_iter().map(DataRow::from).collect();
    Ok(DataResponse {
        count: data.len(),
        data,
    })
}

pub async fn get_summary(db: &DatabaseConnection, query: &DataQuery) -> Result<SummaryResponse> {
    let clause = build_where(query, DATA_FILTERS)?;
    let row = repository::get_summary(db, &clause).await?;
    Ok(SummaryResponse {
        record_count: row.record_count,
        date_count: row.date_count,
        ad_count: row.ad_count,
        total_requests: row.total_requests,
        total_callbacks: row.total_callbacks,
        overall_callback_rate: row.overall_callback_rate,
    })
}

pub async fn get_callback_distribution(
    db: &DatabaseConnection,
    query: &DataQuery,
) -> Result<Vec<CallbackDistributionRow>> {
    let clause = build_where(query, DISTRIBUTION_FILTERS)?;
    let rows = repository::get_callback_distribution(db, &clause).await?;
    Ok(rows
        .into_iter()
        .map(|r| CallbackDistributionRow {
            callback_event_type: r.callback_event_type,
            callback_count: r.callback_count,
            percentage: r.percentage,
        })
        .collect())
}
