pub mod api;
pub mod dashboards;
pub mod routes;
pub mod shared;
pub mod system;
pub mod usecases;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    use axum::http::{header, Method};
    use axum::middleware;
    use std::net::SocketAddr;
    use tokio::net::TcpListener;
    use tower_http::cors::{Any, CorsLayer};

    use crate::shared::config;
    use crate::shared::data::db;
    use crate::system::middleware::request_logger;
    use crate::system::tasks::worker::AggregationWorker;

    system::tracing::initialize()?;

    let config = config::load_config()?;
    let db_path = config::get_database_path(&config);
    db::initialize_database(&db_path)
        .await
        .map_err(|e| anyhow::anyhow!("db init failed: {e}"))?;

    if config.aggregation.enabled {
        let worker = AggregationWorker::new(&config.aggregation)?;
        let conn = db::get_connection()?;
        tokio::spawn(worker.run_loop(conn));
    } else {
        tracing::info!("Scheduled aggregation is disabled");
    }

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT]);

    let static_dir = config::get_static_dir(&config);
    tracing::info!("Serving frontend from {}", static_dir.display());

    let app = routes::configure_routes(&static_dir)
        .layer(middleware::from_fn(request_logger))
        .layer(cors);

    let port = config.server.port;
    let addr: SocketAddr = ([0, 0, 0, 0], port).into();

    tracing::info!("Attempting to bind server to http://{}", addr);
    let listener = match TcpListener::bind(addr).await {
        Ok(listener) => {
            tracing::info!("Server successfully bound to {}", addr);
            listener
        }
        Err(e) => {
            if e.kind() == std::io::ErrorKind::AddrInUse {
                tracing::error!(
                    "Error: Port {} is already in use. Please ensure no other process is using this port.",
                    port
                );
            } else {
                tracing::error!("Failed to bind to port {}. Error: {}", port, e);
            }
            return Err(e.into());
        }
    };

    axum::serve(listener, app).await?;

    Ok(())
}
