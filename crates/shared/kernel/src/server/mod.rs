mod error;
mod health;
mod models;
pub mod router;
mod state;
mod storage;

pub use error::ApiError;
pub use models::{
    ErrorBody, ListParams, ListResponse, RetrieveParams, RetrieveResponse, SaveRequest,
    SaveResponse,
};
pub use state::{ApiState, ApiStateBuilder, ApiStateError, ApiStateInner};
