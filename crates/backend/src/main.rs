use axum::http::{header, Method};
use axum::middleware;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};

use backend::dashboards::d500_accounts_payable::repository::PayablesStore;
use backend::shared::config;
use backend::system;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    system::tracing::initialize()?;

    let config = config::load_config()?;
    let csv_path = config::get_csv_path(&config);
    let delimiter = config::csv_delimiter(&config)?;

    // The table is loaded once here; nothing is served without it
    let store = match PayablesStore::open(&csv_path, delimiter) {
        Ok(store) => store,
        Err(e) => {
            tracing::error!("Cannot load payables from {}: {}", csv_path.display(), e);
            return Err(e.into());
        }
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT]);

    let app = backend::routes::configure_routes(Arc::new(store))
        .layer(middleware::from_fn(
            system::middleware::request_logger::request_logger,
        ))
        .layer(cors);

    let addr = format!("{}:{}", config.server.host, config.server.port);

    tracing::info!("Attempting to bind server to http://{}", addr);
    let listener = match TcpListener::bind(&addr).await {
        Ok(listener) => {
            tracing::info!("Server successfully bound to {}", addr);
            listener
        }
        Err(e) => {
            if e.kind() == std::io::ErrorKind::AddrInUse {
                tracing::error!(
                    "Error: {} is already in use. Please ensure no other process is using this port.",
                    addr
                );
            } else {
                tracing::error!("Failed to bind to {}. Error: {}", addr, e);
            }
            return Err(e.into());
        }
    };

    axum::serve(listener, app).await?;

    Ok(())
}
