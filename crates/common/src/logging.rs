// debughub - Debugger Coordination Hub
// Copyright (C) 2024 Zhuo Zhang and Wuqi Zhang
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Logging configuration for debughub components
//!
//! Provides centralized logging setup with:
//! - Structured console output on stderr (stdout carries protocol traffic)
//! - File logging to a temporary directory with daily rotation
//! - Environment variable support (RUST_LOG)

use eyre::{eyre, Result};
use std::{
    env, fs,
    path::PathBuf,
    sync::{Once, OnceLock},
};
use tracing::Level;
use tracing_appender::{non_blocking, non_blocking::WorkerGuard, rolling};
use tracing_subscriber::{
    fmt::{self, format::FmtSpan, time::LocalTime},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter, Layer,
};

/// Keeps the non-blocking file writer flushing for the lifetime of the process.
static FILE_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

/// Initialize logging for a debughub component
///
/// This function sets up:
/// - Colorful, structured console logging with timestamps, written to stderr
/// - File logging to a temporary directory with daily rotation
/// - Default INFO level if no RUST_LOG is set
///
/// Same as [`init_logging_with_level`] with [`Level::INFO`].
///
/// # Arguments
/// * `component_name` - Name of the component (e.g., "debughub")
/// * `enable_file_logging` - Whether to also write logs to a file
///
/// # Examples
/// ```rust
/// use debughub_common::logging;
///
/// fn main() -> eyre::Result<()> {
///     logging::init_logging("debughub", false)?;
///     tracing::info!("Hub started");
///     Ok(())
/// }
/// ```
pub fn init_logging(component_name: &str, enable_file_logging: bool) -> Result<()> {
    init_logging_with_level(component_name, enable_file_logging, Level::INFO)
}

/// Initialize logging with `default_level` for when RUST_LOG is not set
pub fn init_logging_with_level(
    component_name: &str,
    enable_file_logging: bool,
    default_level: Level,
) -> Result<()> {
    let console_layer = fmt::layer()
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_timer(LocalTime::rfc_3339())
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .pretty();

    if enable_file_logging {
        let log_dir = create_log_directory(component_name)?;

        let file_appender = rolling::daily(&log_dir, format!("{component_name}.log"));
        let (non_blocking_appender, guard) = non_blocking(file_appender);
        // A second initialisation would fail below anyway; keep the first guard.
        let _ = FILE_GUARD.set(guard);

        let file_layer = fmt::layer()
            .with_target(true)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true)
            .with_span_events(FmtSpan::CLOSE)
            .with_timer(LocalTime::rfc_3339())
            .with_ansi(false)
            .with_writer(non_blocking_appender);

        tracing_subscriber::registry()
            .with(console_layer.with_filter(filter_for_console(default_level)?))
            .with(file_layer.with_filter(default_filter(default_level)?))
            .try_init()
            .map_err(|e| eyre!("Failed to initialize tracing subscriber: {e}"))?;

        tracing::info!(
            component = component_name,
            log_dir = %log_dir.display(),
            "Logging initialized with console and file output"
        );
    } else {
        tracing_subscriber::registry()
            .with(console_layer.with_filter(filter_for_console(default_level)?))
            .try_init()
            .map_err(|e| eyre!("Failed to initialize tracing subscriber: {e}"))?;

        tracing::info!(component = component_name, "Logging initialized with console output only");
    }

    log_environment_info(component_name, default_level);

    Ok(())
}

/// RUST_LOG if set, otherwise `level`.
fn default_filter(level: Level) -> Result<EnvFilter> {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level.as_str()))
        .map_err(|e| eyre!("Failed to create environment filter: {e}"))
}

/// Create log directory in system temp folder
fn create_log_directory(component_name: &str) -> Result<PathBuf> {
    let log_dir = env::temp_dir().join("debughub-logs").join(component_name);
    fs::create_dir_all(&log_dir)?;
    Ok(log_dir)
}

/// Filter for console output, with runtime internals quieted
fn filter_for_console(level: Level) -> Result<EnvFilter> {
    let mut filter = default_filter(level)?;
    for directive in ["tokio=warn", "mio=warn"] {
        filter = filter.add_directive(directive.parse()?);
    }
    Ok(filter)
}

fn log_environment_info(component_name: &str, default_level: Level) {
    let rust_log = env::var("RUST_LOG").unwrap_or_else(|_| default_level.as_str().to_lowercase());
    let args: Vec<String> = env::args().collect();

    tracing::info!(
        component = component_name,
        rust_log = %rust_log,
        args = ?args,
        "Environment information"
    );

    if let Ok(current_dir) = env::current_dir() {
        tracing::debug!(working_directory = %current_dir.display(), "Working directory");
    }
}

/// Initialize simple logging (console only, compact formatting)
///
/// Useful for tests and small utilities.
pub fn init_simple_logging(level: Level) -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(default_filter(level)?)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .try_init()
        .map_err(|e| eyre!("Failed to initialize simple logging: {e}"))?;

    Ok(())
}

static TEST_LOGGING_INIT: Once = Once::new();

/// Safe logging initialization for tests, can be called any number of times
///
/// Console-only, INFO by default, RUST_LOG wins if set.
///
/// # Usage
/// ```rust
/// use debughub_common::logging;
///
/// logging::ensure_test_logging(None);
/// tracing::info!("logging from a test");
/// ```
pub fn ensure_test_logging(default_level: Option<Level>) {
    TEST_LOGGING_INIT.call_once(|| {
        // Another subscriber may already be installed; that is fine for tests.
        let _ = init_simple_logging(default_level.unwrap_or(Level::INFO));
    });
}
