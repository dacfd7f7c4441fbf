use quire_storage::{DateFilter, ErrorKind, ListResult, RetrieveResult, SaveResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::{IntoParams, ToSchema};

/// Save request
#[derive(Debug, Deserialize, ToSchema)]
pub struct SaveRequest {
    /// JSON object to persist
    #[schema(value_type = Object)]
    pub content: Option<Value>,
    /// Category the document is filed under (defaults to `general`)
    pub content_type: Option<String>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct RetrieveParams {
    /// Force the object store (`true`) or the local tree (`false`)
    #[serde(default, alias = "is_s3_path")]
    pub is_ref: Option<bool>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListParams {
    /// Category filter
    pub content_type: Option<String>,
    /// Inclusive lower bound on the modification time (ISO-8601)
    pub start_date: Option<String>,
    /// Inclusive upper bound on the modification time (ISO-8601)
    pub end_date: Option<String>,
    /// Maximum number of items (default 100, at most 1000)
    pub limit: Option<usize>,
    /// `lexical` (default) compares ISO strings; `parsed` compares parsed datetimes
    #[param(value_type = Option<String>, example = "parsed")]
    pub date_filter: Option<DateFilter>,
}

/// Successful save
#[derive(Debug, Serialize, ToSchema)]
pub struct SaveResponse {
    pub status: &'static str,
    #[schema(value_type = Object)]
    pub data: SaveResult,
}

/// Successful retrieval
#[derive(Debug, Serialize, ToSchema)]
pub struct RetrieveResponse {
    pub status: &'static str,
    #[schema(value_type = Object)]
    pub data: RetrieveResult,
}

/// Successful listing
#[derive(Debug, Serialize, ToSchema)]
pub struct ListResponse {
    pub status: &'static str,
    #[schema(value_type = Object)]
    pub data: ListResult,
}

/// Error response
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ErrorBody {
    pub status: &'static str,
    pub error: String,
    #[schema(value_type = String)]
    pub kind: ErrorKind,
}
