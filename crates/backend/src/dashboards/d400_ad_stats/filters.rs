use chrono::NaiveDate;
use contracts::dashboards::d400_ad_stats::{active_filter, DataQuery};
use sea_orm::Value;

/// Filterable columns of `ad_stats_daily`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterColumn {
    StartDate,
    EndDate,
    DsId,
    AdId,
    ChannelId,
    UpId,
    IsCallbackSent,
    Os,
}

/// Filters honoured by /api/data and /api/summary
pub const DATA_FILTERS: &[FilterColumn] = &[
    FilterColumn::StartDate,
    FilterColumn::EndDate,
    FilterColumn::DsId,
    FilterColumn::AdId,
    FilterColumn::ChannelId,
    FilterColumn::UpId,
    FilterColumn::IsCallbackSent,
];

/// Filters honoured by /api/callback-distribution
pub const DISTRIBUTION_FILTERS: &[FilterColumn] = &[
    FilterColumn::StartDate,
    FilterColumn::EndDate,
    FilterColumn::DsId,
    FilterColumn::AdId,
    FilterColumn::ChannelId,
    FilterColumn::Os,
    FilterColumn::UpId,
];

impl FilterColumn {
    fn param_name(&self) -> &'static str {
        match self {
            FilterColumn::StartDate => "start_date",
            FilterColumn::EndDate => "end_date",
            FilterColumn::DsId => "ds_id",
            FilterColumn::AdId => "ad_id",
            FilterColumn::ChannelId => "channel_id",
            FilterColumn::UpId => "up_id",
            FilterColumn::IsCallbackSent => "is_callback_sent",
            FilterColumn::Os => "os",
        }
    }

    fn condition(&self) -> &'static str {
        match self {
            FilterColumn::StartDate => "date_day >= ?",
            FilterColumn::EndDate => "date_day <= ?",
            FilterColumn::DsId => "ds_id = ?",
            FilterColumn::AdId => "ad_id = ?",
            FilterColumn::ChannelId => "channel_id = ?",
            FilterColumn::UpId => "up_id = ?",
            FilterColumn::IsCallbackSent => "is_callback_sent = ?",
            FilterColumn::Os => "os = ?",
        }
    }

    fn raw_value<'q>(&self, query: &'q DataQuery) -> Option<&'q str> {
        let value = match self {
            FilterColumn::StartDate => &query.start_date,
            FilterColumn::EndDate => &query.end_date,
            FilterColumn::DsId => &query.ds_id,
            FilterColumn::AdId => &query.ad_id,
            FilterColumn::ChannelId => &query.channel_id,
            FilterColumn::UpId => &query.up_id,
            FilterColumn::IsCallbackSent => &query.is_callback_sent,
            FilterColumn::Os => &query.os,
        };
        active_filter(value.as_deref())
    }

    fn bind(&self, value: &str) -> Result<Value, FilterError> {
        let invalid = || FilterError::InvalidValue {
            field: self.param_name(),
            value: value.to_string(),
        };
        match self {
            FilterColumn::StartDate | FilterColumn::EndDate => {
                let date = NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|_| invalid())?;
                Ok(date.format("%Y-%m-%d").to_string().into())
            }
            FilterColumn::IsCallbackSent => {
                let flag = value.parse::<i64>().map_err(|_| invalid())?;
                Ok(flag.into())
            }
            _ => Ok(value.to_string().into()),
        }
    }
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum FilterError {
    #[error("invalid value for {field}: {value:?}")]
    InvalidValue { field: &'static str, value: String },
}

/// WHERE clause with positional parameters
#[derive(Debug, Clone, PartialEq)]
pub struct WhereClause {
    pub sql: String,
    pub values: Vec<Value>,
}

impl WhereClause {
    /// Values for a statement that repeats the clause `times` times
    pub fn repeated_values(&self, times: usize) -> Vec<Value> {
        let mut values = Vec::with_capacity(self.values.len() * times);
        for _ in 0..times {
            values.extend(self.values.iter().cloned());
        }
        values
    }
}

/// Builds the WHERE clause for the given filters; blank and "all" values are skipped
pub fn build_where(query: &DataQuery, columns: &[FilterColumn]) -> Result<WhereClause, FilterError> {
    let mut conditions = Vec::new();
    let mut values = Vec::new();

    for column in columns {
        if let Some(raw) = column.raw_value(query) {
            values.push(column.bind(raw)?);
            conditions.push(column.condition());
        }
    }

    let sql = if conditions.is_empty() {
        "1=1".to_string()
    } else {
        conditions.join(" AND ")
    };

    Ok(WhereClause { sql, values })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query() -> DataQuery {
        DataQuery {
            start_date: Some("2025-03-01".to_string()),
            end_date: Some("2025-03-14".to_string()),
            ds_id: Some("all".to_string()),
            ad_id: Some("AD-7".to_string()),
            channel_id: Some("  ".to_string()),
            up_id: None,
            is_callback_sent: Some("2".to_string()),
            os: Some("ios".to_string()),
            group_by: None,
            order: None,
        }
    }

    #[test]
    fn test_empty_query_matches_everything() {
        let clause = build_where(&DataQuery::default(), DATA_FILTERS).unwrap();
        assert_eq!(clause.sql, "1=1");
        assert!(clause.values.is_empty());
    }

    #[test]
    fn test_data_filters_skip_all_and_blank() {
        let clause = build_where(&query(), DATA_FILTERS).unwrap();
        assert_eq!(
            clause.sql,
            "date_day >= ? AND date_day <= ? AND ad_id = ? AND is_callback_sent = ?"
        );
        assert_eq!(
            clause.values,
            vec![
                Value::from("2025-03-01".to_string()),
                Value::from("2025-03-14".to_string()),
                Value::from("AD-7".to_string()),
                Value::from(2i64),
            ]
        );
    }

    #[test]
    fn test_distribution_filters_use_os_not_callback_flag() {
        let clause = build_where(&query(), DISTRIBUTION_FILTERS).unwrap();
        assert_eq!(
            clause.sql,
            "date_day >= ? AND date_day <= ? AND ad_id = ? AND os = ?"
        );
        assert_eq!(clause.repeated_values(2).len(), 8);
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let mut bad_date = DataQuery::default();
        bad_date.start_date = Some("01/03/2025".to_string());
        assert_eq!(
            build_where(&bad_date, DATA_FILTERS),
            Err(FilterError::InvalidValue {
                field: "start_date",
                value: "01/03/2025".to_string()
            })
        );

        let mut bad_flag = DataQuery::default();
        bad_flag.is_callback_sent = Some("yes".to_string());
        assert!(build_where(&bad_flag, DATA_FILTERS).is_err());
    }
}
