use once_cell::sync::OnceCell;
use sea_orm::{
    ConnectOptions, ConnectionTrait, Database, DatabaseBackend, DatabaseConnection, Statement,
};
use std::path::Path;

static DB_CONN: OnceCell<DatabaseConnection> = OnceCell::new();

/// Tables owned by the dashboard, created on first start
const TABLES: &[(&str, &str)] = &[
    (
        "ad_stats_daily",
        r#"
        CREATE TABLE ad_stats_daily (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            date_day TEXT NOT NULL,
            up_id TEXT,
            ds_id TEXT,
            ad_id TEXT,
            channel_id TEXT,
            os TEXT,
            is_callback_sent INTEGER,
            callback_event_type TEXT,
            request_count INTEGER NOT NULL DEFAULT 0,
            callback_count INTEGER NOT NULL DEFAULT 0,
            request_success_count INTEGER NOT NULL DEFAULT 0,
            request_failed_count INTEGER NOT NULL DEFAULT 0,
            callback_failed_count INTEGER NOT NULL DEFAULT 0,
            updated_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%d %H:%M:%S', 'now'))
        );
        "#,
    ),
    (
        "ad_name_map",
        r#"
        CREATE TABLE ad_name_map (
            ad_id TEXT PRIMARY KEY NOT NULL,
            display_name TEXT NOT NULL,
            is_active INTEGER NOT NULL DEFAULT 1
        );
        "#,
    ),
    (
        "request_log",
        r#"
        CREATE TABLE request_log (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            track_time TEXT NOT NULL,
            up_id TEXT,
            ds_id TEXT,
            ad_id TEXT,
            channel_id TEXT,
            os TEXT,
            is_callback_sent INTEGER NOT NULL DEFAULT 0,
            callback_event_type TEXT,
            request_status TEXT,
            callback_status TEXT
        );
        "#,
    ),
];

const INDEXES: &[&str] = &[
    "CREATE INDEX IF NOT EXISTS idx_ad_stats_daily_date ON ad_stats_daily (date_day);",
    "CREATE INDEX IF NOT EXISTS idx_ad_stats_daily_date_ad ON ad_stats_daily (date_day, ad_id);",
    "CREATE INDEX IF NOT EXISTS idx_request_log_track_time ON request_log (track_time);",
];

/// Opens the SQLite file, bootstraps the schema and stores the global connection
pub async fn initialize_database(db_file: &Path) -> anyhow::Result<()> {
    if let Some(parent) = db_file.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let absolute_path = if db_file.is_absolute() {
        db_file.to_path_buf()
    } else {
        std::env::current_dir()?.join(db_file)
    };
    // Normalize path separators and ensure proper URL form on Windows
    let normalized = absolute_path.to_string_lossy().replace('\\', "/");
    let needs_leading_slash = !normalized.starts_with('/') && normalized.contains(':');
    let prefix = if needs_leading_slash { "/" } else { "" };
    let db_url = format!("sqlite://{}{}?mode=rwc", prefix, normalized);

    tracing::info!("Opening database {}", absolute_path.display());
    let conn = connect(&db_url).await?;
    bootstrap_schema(&conn).await?;

    DB_CONN
        .set(conn)
        .map_err(|_| anyhow::anyhow!("Failed to set DB_CONN"))?;
    Ok(())
}

pub async fn connect(db_url: &str) -> anyhow::Result<DatabaseConnection> {
    let mut options = ConnectOptions::new(db_url.to_string());
    options.sqlx_logging(false);
    if db_url.contains(":memory:") {
        // every pooled connection would get its own empty in-memory database
        options.max_connections(1).min_connections(1);
    }
    Ok(Database::connect(options).await?)
}

/// Creates missing tables and indexes
pub async fn bootstrap_schema(conn: &DatabaseConnection) -> anyhow::Result<()> {
    for (table, create_sql) in TABLES {
        let check_sql = format!(
            "SELECT name FROM sqlite_master WHERE type='table' AND name='{}';",
            table
        );
        let existing = conn
            .query_all(Statement::from_string(DatabaseBackend::Sqlite, check_sql))
            .await?;

        if existing.is_empty() {
            tracing::info!("Creating {} table", table);
            conn.execute(Statement::from_string(
                DatabaseBackend::Sqlite,
                create_sql.to_string(),
            ))
            .await?;
        }
    }

    for index_sql in INDEXES {
        conn.execute(Statement::from_string(
            DatabaseBackend::Sqlite,
            index_sql.to_string(),
        ))
        .await?;
    }

    Ok(())
}

pub fn get_connection() -> anyhow::Result<&'static DatabaseConnection> {
    DB_CONN
        .get()
        .ok_or_else(|| anyhow::anyhow!("Database connection has not been initialized"))
}

/// In-memory database with the dashboard schema
#[cfg(test)]
pub async fn test_connection() -> DatabaseConnection {
    let conn = connect("sqlite::memory:").await.unwrap();
    bootstrap_schema(&conn).await.unwrap();
    conn
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_bootstrap_is_idempotent() {
        let conn = test_connection().await;
        bootstrap_schema(&conn).await.unwrap();

        let tables = conn
            .query_all(Statement::from_string(
                DatabaseBackend::Sqlite,
                "SELECT name FROM sqlite_master WHERE type='table' AND name IN \
                 ('ad_stats_daily', 'ad_name_map', 'request_log') ORDER BY name;"
                    .to_string(),
            ))
            .await
            .unwrap();
        let names: Vec<String> = tables
            .iter()
            .map(|row| row.try_get::<String>("", "name").unwrap())
            .collect();
        assert_eq!(names, vec!["ad_name_map", "ad_stats_daily", "request_log"]);
    }
}
