//! Okta group propagation filter: Pub/Sub push endpoint on POST /.

use grp_api::config::SyncConfig;
use grp_api::server::{self, AppState};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
    );
    let registry = tracing_subscriber::registry().with(filter);
    if std::env::var("LOG_FORMAT").as_deref() == Ok("json") {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }

    let config = SyncConfig::from_env()?;
    tracing::info!(
        parent_group = %config.parent_group,
        okta_groups_only = config.okta_groups_only,
        ranges_url = %config.ranges_url,
        "loaded configuration"
    );

    let state = Arc::new(AppState {
        processor: server::processor_from_config(&config),
    });
    let app = server::router(state);
    tracing::info!("group sync listening on {}", config.listen);
    axum::serve(
        tokio::net::TcpListener::bind(config.listen).await?,
        app.into_make_service(),
    )
    .await?;
    Ok(())
}
