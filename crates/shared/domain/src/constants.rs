/// Category used when a save request does not name one.
pub const DEFAULT_CONTENT_TYPE: &str = "general";

/// Prefix of environment variables overriding the config file (`QUIRE__SERVER__PORT`).
pub const ENV_PREFIX: &str = "QUIRE";

/// Config file looked up when no explicit path is given.
pub const DEFAULT_CONFIG_FILE: &str = "server";

// OpenAPI tags
pub const SYSTEM_TAG: &str = "System";
pub const STORAGE_TAG: &str = "Storage";
