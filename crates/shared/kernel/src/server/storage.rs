use super::error::ApiError;
use super::models::{
    ErrorBody, ListParams, ListResponse, RetrieveParams, RetrieveResponse, SaveRequest,
    SaveResponse,
};
use axum::Json;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use quire_domain::constants::{DEFAULT_CONTENT_TYPE, STORAGE_TAG};
use quire_storage::{DEFAULT_LIST_LIMIT, Envelope, ListQuery, StorageManager};
use serde_json::Value;

/// Unwraps an envelope, keeping the success payload intact for the `data` field.
fn success<T>(envelope: Envelope<T>) -> Result<Envelope<T>, ApiError> {
    match envelope {
        Envelope::Error(failure) => Err(ApiError::from(failure)),
        success @ Envelope::Success(_) => Ok(success),
    }
}

#[utoipa::path(
    post,
    path = "/api/storage/save",
    request_body = SaveRequest,
    responses(
        (status = OK, description = "Document stored", body = SaveResponse),
        (status = BAD_REQUEST, description = "Missing or malformed content", body = ErrorBody),
        (status = INTERNAL_SERVER_ERROR, description = "Storage failure", body = ErrorBody),
    ),
    tag = STORAGE_TAG,
)]
pub(super) async fn save_handler(
    State(storage): State<StorageManager>,
    payload: Result<Json<SaveRequest>, JsonRejection>,
) -> Result<Json<SaveResponse>, ApiError> {
    let Json(request) = payload.map_err(|e| ApiError::bad_request(e.body_text()))?;

    let document = match request.content {
        Some(Value::Object(map)) if !map.is_empty() => map,
        Some(Value::Object(_)) | None | Some(Value::Null) => {
            return Err(ApiError::bad_request("Content data is required"));
        },
        Some(_) => return Err(ApiError::bad_request("Content data must be a JSON object")),
    };
    let category = request.content_type.as_deref().unwrap_or(DEFAULT_CONTENT_TYPE);

    let data = success(storage.save(document, category).await)?;
    Ok(Json(SaveResponse { status: "success", data }))
}

#[utoipa::path(
    get,
    path = "/api/storage/retrieve/{*filepath}",
    params(
        ("filepath" = String, Path, description = "Storage key, absolute path or s3:// reference"),
        RetrieveParams,
    ),
    responses(
        (status = OK, description = "Document content", body = RetrieveResponse),
        (status = BAD_REQUEST, description = "Malformed reference", body = ErrorBody),
        (status = NOT_FOUND, description = "No such document", body = ErrorBody),
        (status = INTERNAL_SERVER_ERROR, description = "Storage failure", body = ErrorBody),
    ),
    tag = STORAGE_TAG,
)]
pub(super) async fn retrieve_handler(
    State(storage): State<StorageManager>,
    Path(filepath): Path<String>,
    params: Result<Query<RetrieveParams>, QueryRejection>,
) -> Result<Json<RetrieveResponse>, ApiError> {
    let Query(params) = params.map_err(|e| ApiError::bad_request(e.body_text()))?;
    let data = success(storage.retrieve(&filepath, params.is_ref).await)?;
    Ok(Json(RetrieveResponse { status: "success", data }))
}

#[utoipa::path(
    get,
    path = "/api/storage/list",
    params(ListParams),
    responses(
        (status = OK, description = "Stored documents", body = ListResponse),
        (status = BAD_REQUEST, description = "Malformed filter", body = ErrorBody),
        (status = INTERNAL_SERVER_ERROR, description = "Storage failure", body = ErrorBody),
    ),
    tag = STORAGE_TAG,
)]
pub(super) async fn list_handler(
    State(storage): State<StorageManager>,
    params: Result<Query<ListParams>, QueryRejection>,
) -> Result<Json<ListResponse>, ApiError> {
    let Query(params) = params.map_err(|e| ApiError::bad_request(e.body_text()))?;
    let mut query = ListQuery::new()
        .limit(params.limit.unwrap_or(DEFAULT_LIST_LIMIT))
        .date_filter(params.date_filter.unwrap_or_default());
    query.category = params.content_type;
    query.start_date = params.start_date;
    query.end_date = params.end_date;

    let data = success(storage.list(&query).await)?;
    Ok(Json(ListResponse { status: "success", data }))
}
