//! Rolling Logger
//!
//! Installs a `tracing` subscriber that formats every event (including
//! records emitted through the `log` facade) into a bounded circular buffer
//! of timestamped lines. An optional mirror receives each line as it is
//! written, e.g. the browser console.
//!
//! ```ignore
//! rolling_logger::init_logger(LoggerConfig::new("UserList").with_mirror(console_line))?;
//! let _ = rolling_logger::info("App mounted");
//! ```

mod buffer;

use std::fmt;
use std::sync::OnceLock;
use thiserror::Error;
use tracing_subscriber::util::SubscriberInitExt;

pub use buffer::{LineWriter, LogBuffer};
pub use tracing::level_filters::LevelFilter;

/// Default number of lines kept in memory
pub const DEFAULT_CAPACITY: usize = 500;

/// Sink receiving each formatted line
pub type Mirror = fn(&str);

static LOGGER: OnceLock<(String, LogBuffer)> = OnceLock::new();

#[derive(Debug, Error)]
pub enum LoggerError {
    #[error("logger already initialized: {0}")]
    AlreadyInitialized(String),

    #[error("logger not initialized")]
    NotInitialized,
}

/// Logger configuration
#[derive(Clone)]
pub struct LoggerConfig {
    pub app_name: String,
    pub capacity: usize,
    pub level: LevelFilter,
    pub mirror: Option<Mirror>,
}

impl LoggerConfig {
    pub fn new(app_name: impl Into<String>) -> Self {
        Self {
            app_name: app_name.into(),
            capacity: DEFAULT_CAPACITY,
            level: LevelFilter::INFO,
            mirror: None,
        }
    }

    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    pub fn with_level(mut self, level: LevelFilter) -> Self {
        self.level = level;
        self
    }

    pub fn with_mirror(mut self, mirror: Mirror) -> Self {
        self.mirror = Some(mirror);
        self
    }

    /// Buffer described by this configuration
    pub fn buffer(&self) -> LogBuffer {
        LogBuffer::new(self.capacity, self.mirror)
    }
}

impl fmt::Debug for LoggerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoggerConfig")
            .field("app_name", &self.app_name)
            .field("capacity", &self.capacity)
            .field("level", &self.level)
            .field("mirror", &self.mirror.is_some())
            .finish()
    }
}

/// Install the rolling logger as the global subscriber.
///
/// Fails if a global subscriber is already set.
pub fn init_logger(config: LoggerConfig) -> Result<LogBuffer, LoggerError> {
    let buffer = config.buffer();

    tracing_subscriber::fmt()
        .with_writer(buffer.clone())
        .with_max_level(config.level)
        .with_ansi(false)
        .without_time()
        .finish()
        .try_init()
        .map_err(|e| LoggerError::AlreadyInitialized(e.to_string()))?;

    LOGGER
        .set((config.app_name.clone(), buffer.clone()))
        .map_err(|_| LoggerError::AlreadyInitialized(config.app_name))?;

    Ok(buffer)
}

fn app_name() -> Result<&'static str, LoggerError> {
    LOGGER
        .get()
        .map(|(name, _)| name.as_str())
        .ok_or(LoggerError::NotInitialized)
}

pub fn info(message: &str) -> Result<(), LoggerError> {
    let app = app_name()?;
    tracing::info!(app, "{}", message);
    Ok(())
}

pub fn warn(message: &str) -> Result<(), LoggerError> {
    let app = app_name()?;
    tracing::warn!(app, "{}", message);
    Ok(())
}

pub fn error(message: &str) -> Result<(), LoggerError> {
    let app = app_name()?;
    tracing::error!(app, "{}", message);
    Ok(())
}

/// Lines currently held by the global logger, oldest first
pub fn recent_lines() -> Vec<String> {
    LOGGER
        .get()
        .map(|(_, buffer)| buffer.lines())
        .unwrap_or_default()
}
