//! Dragon Ball catalog gateway binary. Binds `bind_addr` from the catalog config.

use dbz_catalog_core::CatalogConfig;
use dbz_catalog_gateway::{router, AppState};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = CatalogConfig::load()?;
    tracing::info!(
        version = dbz_catalog_core::version(),
        public_api = %config.public_api_url,
        backend = %config.backend_url,
        page_size = config.page_size,
        "catalog config loaded"
    );

    let bind_addr = config.bind_addr.clone();
    let state = Arc::new(AppState::new(config)?);
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!("Dragon Ball catalog gateway listening on http://{}", bind_addr);
    axum::serve(listener, app).await?;
    Ok(())
}
