use axum::extract::State;
use axum::http::header;
use axum::{Json, response::IntoResponse};
use quire_domain::constants::SYSTEM_TAG;
use quire_storage::{BackendKind, StorageManager};
use serde::Serialize;
use std::sync::LazyLock;
use std::time::Instant;
use utoipa::ToSchema;

static STARTED: LazyLock<Instant> = LazyLock::new(Instant::now);

pub(super) fn mark_started() {
    LazyLock::force(&STARTED);
}

#[derive(Debug, Serialize, ToSchema)]
pub(super) struct HealthResponse {
    status: &'static str,
    version: &'static str,
    /// Seconds since the system routes were built.
    uptime: u64,
    /// Backend that receives saves and answers listings.
    #[schema(value_type = String, example = "local")]
    backend: BackendKind,
}

#[utoipa::path(
    get,
    path = "/health",
    responses((status = OK, description = "Service is up", body = HealthResponse)),
    tag = SYSTEM_TAG,
)]
pub(super) async fn health_handler(State(storage): State<StorageManager>) -> impl IntoResponse {
    let body = HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        uptime: STARTED.elapsed().as_secs(),
        backend: storage.default_backend(),
    };

    ([(header::CACHE_CONTROL, "no-store")], Json(body))
}
