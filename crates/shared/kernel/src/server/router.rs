use super::{health, storage};
use axum::extract::FromRef;
use quire_storage::StorageManager;
use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

/// Liveness routes.
pub fn system_router<S>() -> OpenApiRouter<S>
where
    S: Send + Sync + Clone + 'static,
    StorageManager: FromRef<S>,
{
    health::mark_started();
    OpenApiRouter::<S>::new().routes(routes!(health::health_handler))
}

/// Save, retrieve and list under `/api/storage`.
pub fn storage_router<S>() -> OpenApiRouter<S>
where
    S: Send + Sync + Clone + 'static,
    StorageManager: FromRef<S>,
{
    OpenApiRouter::<S>::new()
        .routes(routes!(storage::save_handler))
        .routes(routes!(storage::retrieve_handler))
        .routes(routes!(storage::list_handler))
}
