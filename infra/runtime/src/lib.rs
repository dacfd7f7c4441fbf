//! # Runtime
//!
//! Builds the multithreaded [Tokio](https://tokio.rs) runtime the server runs on.
//!
//! Two profiles are provided:
//! * [`RuntimeConfig::high_performance`] for the HTTP server: every core, larger stacks.
//! * [`RuntimeConfig::memory_efficient`] for tools and constrained hosts: half the cores.
//!
//! The worker count honours `QUIRE_WORKER_THREADS`, then `TOKIO_WORKER_THREADS`, and falls
//! back to the available parallelism.
//!
//! ```rust
//! use quire_runtime::{RuntimeConfig, build_runtime_with_config};
//!
//! let runtime = build_runtime_with_config(&RuntimeConfig::memory_efficient().with_worker_threads(2))?;
//! let answer = runtime.block_on(async { 40 + 2 });
//! assert_eq!(answer, 42);
//! # Ok::<(), anyhow::Error>(())
//! ```

pub use anyhow::Result;

use anyhow::Context;
use std::{sync::OnceLock, thread::available_parallelism, time::Duration};
use tokio::runtime::{Builder, Runtime};
use tracing::debug;

const FALLBACK_WORKER_THREADS: usize = 4;
const MAX_WORKER_THREADS: usize = 1024;
const MIN_STACK_SIZE: usize = 1024 * 1024;
const MAX_STACK_SIZE: usize = 16 * 1024 * 1024;
const DEFAULT_THREAD_NAME: &str = "quire-worker";
const WORKER_ENV_VARS: [&str; 2] = ["QUIRE_WORKER_THREADS", "TOKIO_WORKER_THREADS"];

static DETECTED_WORKERS: OnceLock<usize> = OnceLock::new();

fn parse_workers(raw: &str) -> Option<usize> {
    raw.trim().parse::<usize>().ok().filter(|n| (1..=MAX_WORKER_THREADS).contains(n))
}

fn detected_workers() -> usize {
    *DETECTED_WORKERS.get_or_init(|| {
        WORKER_ENV_VARS
            .iter()
            .find_map(|var| std::env::var(var).ok().as_deref().and_then(parse_workers))
            .unwrap_or_else(|| {
                available_parallelism().map_or(FALLBACK_WORKER_THREADS, std::num::NonZero::get)
            })
    })
}

fn thread_name_or_default(name: String) -> String {
    if name.trim().is_empty() { DEFAULT_THREAD_NAME.to_owned() } else { name }
}

/// Worker pool settings for a runtime. Values are clamped to safe bounds on every setter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeConfig {
    pub worker_threads: usize,
    /// Stack size per worker, between 1 and 16 `MiB`.
    pub stack_size: usize,
    pub thread_name: String,
    /// How long an idle blocking thread is kept before it exits.
    pub thread_keep_alive: Duration,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            worker_threads: detected_workers(),
            stack_size: 2 * 1024 * 1024,
            thread_name: DEFAULT_THREAD_NAME.to_owned(),
            thread_keep_alive: Duration::from_secs(60),
        }
    }
}

impl RuntimeConfig {
    /// Server profile: all detected workers with 4 `MiB` stacks.
    #[must_use]
    pub fn high_performance() -> Self {
        Self {
            stack_size: 4 * 1024 * 1024,
            thread_name: "quire-server".to_owned(),
            thread_keep_alive: Duration::from_secs(300),
            ..Self::default()
        }
    }

    /// Half the detected workers (at least one) with the minimum stack.
    #[must_use]
    pub fn memory_efficient() -> Self {
        Self {
            worker_threads: (detected_workers() / 2).max(1),
            stack_size: MIN_STACK_SIZE,
            thread_keep_alive: Duration::from_secs(30),
            ..Self::default()
        }
    }

    #[must_use]
    pub const fn with_worker_threads(mut self, threads: usize) -> Self {
        self.worker_threads = if threads == 0 {
            1
        } else if threads > MAX_WORKER_THREADS {
            MAX_WORKER_THREADS
        } else {
            threads
        };
        self
    }

    #[must_use]
    pub const fn with_stack_size(mut self, size: usize) -> Self {
        self.stack_size = if size < MIN_STACK_SIZE {
            MIN_STACK_SIZE
        } else if size > MAX_STACK_SIZE {
            MAX_STACK_SIZE
        } else {
            size
        };
        self
    }

    #[must_use]
    pub fn with_thread_name(mut self, name: impl Into<String>) -> Self {
        self.thread_name = thread_name_or_default(name.into());
        self
    }

    #[must_use]
    pub const fn with_thread_keep_alive(mut self, keep_alive: Duration) -> Self {
        self.thread_keep_alive = keep_alive;
        self
    }

    /// Re-applies every bound; public fields may have been set directly.
    fn normalized(&self) -> Self {
        self.clone()
            .with_worker_threads(self.worker_threads)
            .with_stack_size(self.stack_size)
            .with_thread_name(self.thread_name.clone())
    }
}

/// Builds a multithreaded runtime with I/O and timers enabled.
///
/// # Errors
/// Fails when the OS refuses to spawn the worker threads.
pub fn build_runtime_with_config(config: &RuntimeConfig) -> Result<Runtime> {
    let config = config.normalized();
    debug!(
        workers = config.worker_threads,
        stack = config.stack_size,
        name = %config.thread_name,
        "Building runtime"
    );

    Builder::new_multi_thread()
        .worker_threads(config.worker_threads)
        .thread_name(&config.thread_name)
        .thread_stack_size(config.stack_size)
        .thread_keep_alive(config.thread_keep_alive)
        .enable_all()
        .build()
        .context("Failed to initialize runtime")
}

/// Builds a runtime from [`RuntimeConfig::default`].
///
/// # Errors
/// See [`build_runtime_with_config`].
pub fn build_runtime() -> Result<Runtime> {
    build_runtime_with_config(&RuntimeConfig::default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_worker_threads_are_clamped() {
        assert_eq!(RuntimeConfig::default().with_worker_threads(0).worker_threads, 1);
        assert_eq!(RuntimeConfig::default().with_worker_threads(5000).worker_threads, 1024);
        assert_eq!(RuntimeConfig::default().with_worker_threads(3).worker_threads, 3);
    }

    #[test]
    fn test_stack_size_is_clamped() {
        assert_eq!(RuntimeConfig::default().with_stack_size(1).stack_size, MIN_STACK_SIZE);
        assert_eq!(RuntimeConfig::default().with_stack_size(usize::MAX).stack_size, MAX_STACK_SIZE);
    }

    #[test]
    fn test_blank_thread_name_falls_back() {
        let config = RuntimeConfig::default().with_thread_name("   ");
        assert_eq!(config.thread_name, DEFAULT_THREAD_NAME);
    }

    #[test]
    fn test_profiles() {
        let fast = RuntimeConfig::high_performance();
        let lean = RuntimeConfig::memory_efficient();
        assert!(fast.worker_threads >= lean.worker_threads);
        assert!(fast.stack_size > lean.stack_size);
        assert!(lean.worker_threads >= 1);
    }

    #[test]
    fn test_parse_workers() {
        assert_eq!(parse_workers(" 8 "), Some(8));
        assert_eq!(parse_workers("0"), None);
        assert_eq!(parse_workers("2048"), None);
        assert_eq!(parse_workers("many"), None);
    }

    #[test]
    fn test_out_of_range_fields_are_normalized_on_build() {
        let config = RuntimeConfig {
            worker_threads: 0,
            stack_size: 0,
            thread_name: String::new(),
            thread_keep_alive: Duration::from_secs(1),
        };
        let normalized = config.normalized();
        assert_eq!(normalized.worker_threads, 1);
        assert_eq!(normalized.stack_size, MIN_STACK_SIZE);
        assert_eq!(normalized.thread_name, DEFAULT_THREAD_NAME);

        let runtime = build_runtime_with_config(&config).unwrap();
        assert_eq!(runtime.block_on(async { 7 }), 7);
    }
}
