//! Kernel utilities shared by the binaries.
//! Keep this crate lightweight; it wires configuration into storage and exposes the HTTP surface.
//!
//! ## Config loading
//! ```rust,no_run
//! use quire_kernel::config::load_config;
//! use quire_kernel::domain::config::ApiConfig;
//!
//! let cfg: ApiConfig = load_config(None::<&str>).unwrap_or_default();
//! assert_eq!(cfg.server.port, 5000);
//! ```
//!
//! ## Storage bootstrap
//! ```rust,no_run
//! # async fn run() -> Result<(), quire_kernel::storage::StorageError> {
//! use quire_kernel::domain::config::StorageConfig;
//! use quire_kernel::storage::init_storage;
//!
//! let manager = init_storage(&StorageConfig::default()).await?;
//! # Ok(())
//! # }
//! ```
pub mod config;
pub mod prelude;
#[cfg(feature = "server")]
pub mod server;
pub mod storage;

pub use quire_domain as domain;
