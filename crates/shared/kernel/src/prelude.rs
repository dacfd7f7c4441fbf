pub use crate::config::{ConfigError, load_config};
pub use crate::domain::config::ApiConfig;
#[cfg(feature = "server")]
pub use crate::server::{ApiError, ApiState, ApiStateError};
pub use crate::storage::init_storage;
pub use quire_storage::StorageManager;
