//! Builder pattern for assembling a [`Logger`].
//!
//! # Example
//!
//! ```rust,no_run
//! use rotalog::{Level, LogBuilder, fields};
//!
//! let logger = LogBuilder::new(Level::Info)
//!     .with_zone("Asia/Shanghai")
//!     .with_console(true)
//!     .with_file("/var/log/app", "info", "log", 100 * 1024 * 1024, 10)
//!     .build()
//!     .expect("Failed to initialize logging");
//!
//! logger.info(fields!["event", "started"]);
//! ```

use std::fmt;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use crate::alert::{AlertDispatcher, AlertFn};
use crate::clock::{Clock, SystemClock, Zone};
use crate::file::{LogFile, LogFileNames};
use crate::format::{LineFormat, render_fields};
use crate::rotation::RotationPolicy;
use crate::sink::{ConsoleSink, FileSink};
use crate::writer::RotatingWriter;
use crate::{Error, FileLogConfig, Level, LogConfig, Logger, Result, Value};

/// A builder for configuring a logger.
///
/// Every option has a default, so any subset may be given. Nothing touches
/// the file system until [`LogBuilder::build`].
pub struct LogBuilder {
    config: LogConfig,
    console_writer: Option<Box<dyn Write + Send>>,
    alert: Option<AlertFn>,
    clock: Option<Arc<dyn Clock>>,
    size_rotation: bool,
}

impl LogBuilder {
    /// Create a LogBuilder emitting `level` and above.
    pub fn new(level: Level) -> Self {
        Self::from_config(LogConfig::new().with_level(level))
    }

    /// Create a LogBuilder from an existing configuration.
    pub fn from_config(config: LogConfig) -> Self {
        Self {
            config,
            console_writer: None,
            alert: None,
            clock: None,
            size_rotation: true,
        }
    }

    /// Set the IANA time zone used for timestamps and day boundaries.
    pub fn with_zone(mut self, zone: impl Into<String>) -> Self {
        self.config.zone = zone.into();
        self
    }

    /// Enable or disable the stdout sink.
    pub fn with_console(mut self, enabled: bool) -> Self {
        self.config.console = enabled;
        self
    }

    /// Enable the console sink, writing to `writer` instead of stdout.
    pub fn with_console_writer<W: Write + Send + 'static>(mut self, writer: W) -> Self {
        self.config.console = true;
        self.console_writer = Some(Box::new(writer));
        self
    }

    /// Enable the file sink.
    ///
    /// Empty strings and a zero `max_size` are replaced by the defaults.
    /// A `max_files` of zero keeps no size-rotated history.
    pub fn with_file(
        mut self,
        path: impl Into<PathBuf>,
        name: impl Into<String>,
        extension: impl Into<String>,
        max_size: u64,
        max_files: usize,
    ) -> Self {
        self.config.file = Some(
            FileLogConfig::new(path)
                .with_name(name)
                .with_extension(extension)
                .with_rotation(max_size, max_files),
        );
        self
    }

    /// Enable the file sink with a custom FileLogConfig.
    pub fn with_file_config(mut self, file_config: FileLogConfig) -> Self {
        self.config.file = Some(file_config);
        self
    }

    /// Rotate the file only on day boundaries.
    pub fn without_size_rotation(mut self) -> Self {
        self.size_rotation = false;
        self
    }

    /// Set the alert callback and whether alerts are dispatched to it.
    pub fn with_alert<F>(mut self, callback: F, enabled: bool) -> Self
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        self.alert = Some(Arc::new(callback));
        self.config.alert = enabled;
        self
    }

    /// Report the file and line of each call.
    pub fn with_caller(mut self, caller: bool) -> Self {
        self.config.caller = caller;
        self
    }

    /// chrono format string for the line timestamp.
    pub fn with_date_format(mut self, date_format: impl Into<String>) -> Self {
        self.config.date_format = date_format.into();
        self
    }

    /// Initial text prefix, rendered from key/value fields.
    pub fn with_text_prefix(mut self, fields: &[Value]) -> Self {
        self.config.prefix = render_fields(fields);
        self
    }

    /// Replace the system clock, mainly for tests.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Get the current configuration.
    pub fn config(&self) -> &LogConfig {
        &self.config
    }

    /// Open the log file and assemble the logger.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The log directory cannot be created
    /// - The current log file cannot be opened or inspected
    /// - The alert worker thread cannot be started
    pub fn build(self) -> Result<Logger> {
        let config = self.config;
        let zone = Zone::parse(&config.zone);
        let clock = self
            .clock
            .unwrap_or_else(|| Arc::new(SystemClock::new(zone)) as Arc<dyn Clock>);

        let file = match config.file {
            Some(file_config) => {
                let file_config = file_config.normalized();
                let names =
                    LogFileNames::new(&file_config.path, file_config.name, &file_config.extension);
                let log_file = LogFile::open(names, clock.today())?;
                let policy = if self.size_rotation {
                    RotationPolicy::new(file_config.max_size, file_config.max_files)
                } else {
                    RotationPolicy::daily(file_config.max_files)
                };
                Some(FileSink::new(log_file, policy))
            }
            None => None,
        };

        let console = config.console.then(|| match self.console_writer {
            Some(writer) => ConsoleSink::new(writer),
            None => ConsoleSink::stdout(),
        });

        let alerts = match (config.alert, self.alert) {
            (true, Some(callback)) => Some(
                AlertDispatcher::spawn(callback)
                    .map_err(|e| Error::Init(format!("cannot start alert worker: {}", e)))?,
            ),
            (true, None) => {
                tracing::warn!("alert dispatch enabled without a callback");
                None
            }
            (false, _) => None,
        };

        Ok(Logger::from_parts(
            config.level,
            zone,
            LineFormat::new(&config.date_format, config.caller),
            config.prefix,
            RotatingWriter::new(clock, file, console),
            alerts,
        ))
    }
}

impl Default for LogBuilder {
    fn default() -> Self {
        Self::new(Level::default())
    }
}

impl fmt::Debug for LogBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LogBuilder")
            .field("config", &self.config)
            .field("console_writer", &self.console_writer.is_some())
            .field("alert", &self.alert.is_some())
            .field("clock", &self.clock)
            .field("size_rotation", &self.size_rotation)
            .finish()
    }
}
