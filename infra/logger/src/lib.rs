//! # Logger
//!
//! Installs the process-wide `tracing` subscriber: an [`EnvFilter`], an optional console layer
//! and an optional rolling file layer written through a non-blocking worker.
//!
//! `RUST_LOG` is honoured unless an explicit filter is set with [`LoggerBuilder::env_filter`].
//!
//! ## Example
//!
//! ```rust
//! # use quire_logger::{Logger, LevelFilter};
//! let _logger = Logger::builder()
//!     .name("quire-server")
//!     .level(LevelFilter::DEBUG)
//!     .init()
//!     .unwrap();
//!
//! tracing::info!(port = 5000, "Listening");
//! ```

mod error;

pub use crate::error::LoggerError;
pub use tracing::level_filters::LevelFilter;
pub use tracing_appender::rolling::Rotation;

use private::Sealed;
use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::RollingFileAppender;
use tracing_subscriber::fmt;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

const DEFAULT_MAX_FILES: usize = 10;
const LOG_FILE_SUFFIX: &str = "log";

/// Line format shared by every enabled sink.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Single-line human readable output.
    #[default]
    Compact,
    /// One JSON object per event.
    Json,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct FileSink {
    dir: PathBuf,
    rotation: Rotation,
    max_files: usize,
}

#[derive(Debug)]
struct Settings {
    level: LevelFilter,
    directives: Option<String>,
    console: bool,
    format: LogFormat,
    file: Option<FileSink>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            level: LevelFilter::INFO,
            directives: None,
            console: true,
            format: LogFormat::Compact,
            file: None,
        }
    }
}

#[derive(Debug)]
pub struct Unnamed;
#[derive(Debug)]
pub struct Named(String);

mod private {
    pub trait Sealed {}
}
impl Sealed for Unnamed {}
impl Sealed for Named {}

/// A builder for the global tracing subscriber. A name is required before [`init`].
///
/// [`init`]: LoggerBuilder::init
#[derive(Debug)]
pub struct LoggerBuilder<N: Sealed = Unnamed> {
    name: N,
    settings: Settings,
}

impl LoggerBuilder<Unnamed> {
    /// Names the application; rolling files are called `<name>.<date>.log`.
    pub fn name(self, name: impl Into<String>) -> LoggerBuilder<Named> {
        LoggerBuilder { name: Named(name.into()), settings: self.settings }
    }
}

impl LoggerBuilder<Named> {
    /// Default maximum level when no directive matches.
    #[must_use = "The builder must be configured before it can be used to initialize the logger."]
    pub const fn level(mut self, level: LevelFilter) -> Self {
        self.settings.level = level;
        self
    }

    /// Explicit filter directives (e.g., `quire_storage=debug,tower_http=info`).
    ///
    /// Replaces `RUST_LOG`. Invalid directives make [`LoggerBuilder::init`] fail.
    #[must_use = "The builder must be configured before it can be used to initialize the logger."]
    pub fn env_filter(mut self, directives: impl Into<String>) -> Self {
        self.settings.directives = Some(directives.into());
        self
    }

    #[must_use = "The builder must be configured before it can be used to initialize the logger."]
    pub const fn console(mut self, enabled: bool) -> Self {
        self.settings.console = enabled;
        self
    }

    #[must_use = "The builder must be configured before it can be used to initialize the logger."]
    pub const fn format(mut self, format: LogFormat) -> Self {
        self.settings.format = format;
        self
    }

    /// Shorthand for `format(LogFormat::Json)`.
    #[must_use = "The builder must be configured before it can be used to initialize the logger."]
    pub const fn json(self) -> Self {
        self.format(LogFormat::Json)
    }

    /// Also writes logs to rolling files in `dir` (daily, ten files kept by default).
    #[must_use = "The builder must be configured before it can be used to initialize the logger."]
    pub fn path(mut self, dir: impl Into<PathBuf>) -> Self {
        let sink = self.settings.file.take();
        self.settings.file = Some(FileSink {
            dir: dir.into(),
            rotation: sink.as_ref().map_or(Rotation::DAILY, |s| s.rotation.clone()),
            max_files: sink.map_or(DEFAULT_MAX_FILES, |s| s.max_files),
        });
        self
    }

    /// Rotation period of the file sink. Ignored without [`LoggerBuilder::path`].
    #[must_use = "The builder must be configured before it can be used to initialize the logger."]
    pub fn rotation(mut self, rotation: Rotation) -> Self {
        if let Some(sink) = self.settings.file.as_mut() {
            sink.rotation = rotation;
        }
        self
    }

    /// Number of rotated files kept. Ignored without [`LoggerBuilder::path`].
    #[must_use = "The builder must be configured before it can be used to initialize the logger."]
    pub fn max_files(mut self, max: usize) -> Self {
        if let Some(sink) = self.settings.file.as_mut() {
            sink.max_files = max;
        }
        self
    }

    /// Installs the subscriber.
    ///
    /// Keep the returned [`Logger`] alive until shutdown: it owns the worker that flushes the
    /// file sink.
    ///
    /// # Errors
    /// * [`LoggerError::InvalidConfiguration`] for an empty name, bad directives, a zero
    ///   file budget, or when every sink is disabled.
    /// * [`LoggerError::Io`] / [`LoggerError::Appender`] if the log directory is unusable.
    /// * [`LoggerError::Subscriber`] if a global subscriber is already installed.
    pub fn init(self) -> Result<Logger, LoggerError> {
        let Named(name) = self.name;
        let settings = self.settings;

        if name.trim().is_empty() {
            return Err(LoggerError::invalid("Logger name cannot be empty"));
        }
        if !settings.console && settings.file.is_none() {
            return Err(LoggerError::invalid("Enable console output, file output, or both"));
        }

        let filter = env_filter(&settings)?;
        let mut layers = Vec::new();

        if settings.console {
            let console = fmt::layer().with_ansi(true);
            layers.push(match settings.format {
                LogFormat::Compact => console.compact().boxed(),
                LogFormat::Json => console.json().boxed(),
            });
        }

        let guard = match &settings.file {
            Some(sink) => {
                if sink.max_files == 0 {
                    return Err(LoggerError::invalid("max_files must be greater than zero"));
                }

                std::fs::create_dir_all(&sink.dir).map_err(|source| LoggerError::Io {
                    source,
                    context: Some(format!("Failed to create {}", sink.dir.display()).into()),
                })?;

                let appender = RollingFileAppender::builder()
                    .rotation(sink.rotation.clone())
                    .filename_prefix(&name)
                    .filename_suffix(LOG_FILE_SUFFIX)
                    .max_log_files(sink.max_files)
                    .build(&sink.dir)?;
                let (writer, guard) = tracing_appender::non_blocking(appender);

                let file = fmt::layer().with_writer(writer).with_ansi(false);
                layers.push(match settings.format {
                    LogFormat::Compact => file.boxed(),
                    LogFormat::Json => file.json().boxed(),
                });
                Some(guard)
            },
            None => None,
        };

        tracing_subscriber::registry().with(filter).with(layers).try_init()?;

        tracing::debug!(name = %name, format = ?settings.format, "Logger installed");
        Ok(Logger { guard })
    }
}

fn env_filter(settings: &Settings) -> Result<EnvFilter, LoggerError> {
    let builder = EnvFilter::builder().with_default_directive(settings.level.into());
    match &settings.directives {
        None => Ok(builder.from_env_lossy()),
        Some(directives) => builder.parse(directives).map_err(|e| {
            LoggerError::InvalidConfiguration {
                message: directives.clone().into(),
                context: Some(format!("Invalid filter directives: {e}").into()),
            }
        }),
    }
}

/// Handle on the installed subscriber. Dropping it flushes and stops the file worker.
#[must_use = "Dropping this handle stops the background log writer."]
#[derive(Debug)]
pub struct Logger {
    guard: Option<WorkerGuard>,
}

impl Logger {
    #[must_use = "The builder must be configured before it can be used to initialize the logger."]
    pub fn builder() -> LoggerBuilder {
        LoggerBuilder { name: Unnamed, settings: Settings::default() }
    }

    /// Whether a file sink (and its background worker) is active.
    #[must_use]
    pub const fn writes_files(&self) -> bool {
        self.guard.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tempfile::tempdir;

    #[test]
    fn test_defaults() {
        let builder = Logger::builder().name("quire");
        assert!(builder.settings.console);
        assert_eq!(builder.settings.level, LevelFilter::INFO);
        assert_eq!(builder.settings.format, LogFormat::Compact);
        assert!(builder.settings.file.is_none());
    }

    #[test]
    fn test_file_options_need_a_path() {
        let builder = Logger::builder().name("quire").max_files(3);
        assert!(builder.settings.file.is_none());

        let dir = tempdir().unwrap();
        let builder = Logger::builder()
            .name("quire")
            .max_files(3)
            .path(dir.path())
            .max_files(5)
            .rotation(Rotation::HOURLY)
            .json();

        let sink = builder.settings.file.as_ref().unwrap();
        assert_eq!(sink.max_files, 5);
        assert_eq!(sink.rotation, Rotation::HOURLY);
        assert_eq!(builder.settings.format, LogFormat::Json);
    }

    #[test]
    #[serial]
    fn test_invalid_settings_are_rejected_before_install() {
        let err = Logger::builder().name("  ").init().unwrap_err();
        assert!(matches!(err, LoggerError::InvalidConfiguration { .. }));

        let err = Logger::builder().name("quire").console(false).init().unwrap_err();
        assert!(matches!(err, LoggerError::InvalidConfiguration { .. }));

        let err = Logger::builder().name("quire").env_filter("quire=loud").init().unwrap_err();
        assert!(matches!(err, LoggerError::InvalidConfiguration { .. }));
    }
}
