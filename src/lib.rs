//! # Rotalog
//!
//! A leveled key/value logger for long-running services, writing to the
//! console and to a log file that rotates daily and by size.
//!
//! ## Features
//!
//! - Console and file sinks
//! - One file per day (`{name}_{YYYY-MM-DD}.{ext}`) in any IANA time zone
//! - Size rotation with bounded, numbered history (`{name}_{date}.1.{ext}`, ...)
//! - Safe for concurrent use from many threads
//! - Alert callback dispatched on a background worker
//! - Integration with the `tracing` ecosystem
//!
//! ## Example
//!
//! ```rust
//! use rotalog::{Level, Logger, fields};
//!
//! let dir = tempfile::tempdir()?;
//! let logger = Logger::builder(Level::Info)
//!     .with_zone("UTC")
//!     .with_file(dir.path(), "app", "log", 10 * 1024 * 1024, 5)
//!     .build()?;
//!
//! logger.info(fields!["user", "bob", "action", "login"]);
//! logger.debug(fields!["hidden", true]);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod alert;
pub mod builder;
pub mod clock;
pub mod config;
pub mod error;
pub mod file;
pub mod format;
pub mod global;
pub mod host;
pub mod level;
pub mod logger;
pub mod rotation;
pub mod sink;
pub mod writer;

#[cfg(feature = "tracing-integration")]
pub mod tracing_init;

pub use builder::LogBuilder;
pub use clock::{Clock, ManualClock, SystemClock, Zone};
pub use config::{FileLogConfig, LogConfig};
pub use error::{Error, Result};
pub use format::Value;
pub use level::Level;
pub use logger::Logger;
pub use rotation::RotationPolicy;
pub use writer::RotatingWriter;

#[cfg(feature = "tracing-integration")]
pub use tracing_init::init_logging;

/// Start configuring a logger that emits `level` and above.
pub fn builder(level: Level) -> LogBuilder {
    LogBuilder::new(level)
}
