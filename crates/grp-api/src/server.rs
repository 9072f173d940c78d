//! Axum server and routes.

use crate::config::SyncConfig;
use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Router,
};
use grp_directory::{
    AnyTokenProvider, CloudIdentityClient, CloudIdentityPropagator, MetadataTokenProvider,
    StaticTokenProvider,
};
use grp_policy::GroupSync;
use grp_ranges::HttpRangeSource;
use grp_types::EventProcessor;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::Instrument;

pub struct AppState {
    pub processor: Arc<dyn EventProcessor + Send + Sync>,
}

/// Wire the HTTP range source and Cloud Identity propagator from config.
pub fn processor_from_config(config: &SyncConfig) -> Arc<dyn EventProcessor + Send + Sync> {
    let tokens = match config.static_token {
        Some(ref token) => AnyTokenProvider::Static(StaticTokenProvider::new(token.clone())),
        None => AnyTokenProvider::Metadata(MetadataTokenProvider::for_host(&config.metadata_host)),
    };
    let directory =
        CloudIdentityClient::new(config.directory_url.clone(), config.quota_project.clone());
    let propagator = CloudIdentityPropagator::new(tokens, directory, config.parent_group.clone());
    let ranges = HttpRangeSource::new(config.ranges_url.clone());
    Arc::new(GroupSync::new(ranges, propagator, config.okta_groups_only))
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", post(handle_event))
        .route("/health", get(handle_health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// One Pub/Sub delivery. The body is decoded by the processor so malformed
/// payloads get the same 500 as any other undecodable event.
async fn handle_event(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> (StatusCode, String) {
    let ce_id = headers
        .get("ce-id")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();
    let res = state
        .processor
        .process(&body)
        .instrument(tracing::info_span!("cloud_event", ce_id = %ce_id))
        .await;
    let status = StatusCode::from_u16(res.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, res.message)
}

async fn handle_health() -> &'static str {
    "ok"
}
