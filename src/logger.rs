use std::any::Any;
use std::fmt;
use std::io;
use std::panic::{self, AssertUnwindSafe, Location};
use std::path::PathBuf;
use std::sync::{Arc, PoisonError, RwLock};

use crate::alert::{AlertDispatcher, Submit};
use crate::clock::Zone;
use crate::format::{LineFormat, Record, render_fields};
use crate::writer::RotatingWriter;
use crate::{Error, Level, LogBuilder, Result, Value, host};

/// A handle to one logging pipeline.
///
/// Cloning is cheap and every clone writes through the same sinks and
/// rotation state. Logging methods never panic and never return errors to
/// the caller; failures are reported through `tracing`. Use [`Logger::log`]
/// when the outcome of a write matters.
#[derive(Clone)]
pub struct Logger {
    inner: Arc<Inner>,
}

struct Inner {
    level: Level,
    zone: Zone,
    format: LineFormat,
    prefix: RwLock<String>,
    writer: RotatingWriter,
    alerts: Option<AlertDispatcher>,
}

impl Logger {
    /// Start configuring a logger that emits `level` and above.
    pub fn builder(level: Level) -> LogBuilder {
        LogBuilder::new(level)
    }

    pub(crate) fn from_parts(
        level: Level,
        zone: Zone,
        format: LineFormat,
        prefix: String,
        writer: RotatingWriter,
        alerts: Option<AlertDispatcher>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                level,
                zone,
                format,
                prefix: RwLock::new(prefix),
                writer,
                alerts,
            }),
        }
    }

    pub fn level(&self) -> Level {
        self.inner.level
    }

    pub fn zone(&self) -> Zone {
        self.inner.zone
    }

    /// Whether a call at `level` would produce output.
    pub fn enabled(&self, level: Level) -> bool {
        level.enabled_at(self.inner.level)
    }

    /// Replace the text prefix with the rendered `fields`.
    pub fn set_text_prefix(&self, fields: &[Value]) {
        *self.prefix_mut() = render_fields(fields);
    }

    /// Append the rendered `fields` to the text prefix.
    pub fn add_text_prefix(&self, fields: &[Value]) {
        self.prefix_mut().push_str(&render_fields(fields));
    }

    pub fn text_prefix(&self) -> String {
        self.inner
            .prefix
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn prefix_mut(&self) -> std::sync::RwLockWriteGuard<'_, String> {
        self.inner
            .prefix
            .write()
            .unwrap_or_else(PoisonError::into_inner)
    }

    #[track_caller]
    pub fn debug(&self, fields: &[Value]) {
        report(self.dispatch(Level::Debug, None, fields, Location::caller()));
    }

    #[track_caller]
    pub fn info(&self, fields: &[Value]) {
        report(self.dispatch(Level::Info, None, fields, Location::caller()));
    }

    #[track_caller]
    pub fn warn(&self, fields: &[Value]) {
        report(self.dispatch(Level::Warn, None, fields, Location::caller()));
    }

    #[track_caller]
    pub fn error(&self, fields: &[Value]) {
        report(self.dispatch(Level::Error, None, fields, Location::caller()));
    }

    /// Log at [`Level::Fatal`], deliver pending alerts, flush, and exit the
    /// process with status 1.
    #[track_caller]
    pub fn fatal(&self, fields: &[Value]) -> ! {
        report(self.dispatch(Level::Fatal, None, fields, Location::caller()));
        self.shutdown();
        std::process::exit(1)
    }

    /// Log at [`Level::Alert`] tagged with `label`; the line also goes to the
    /// alert callback when alert dispatch is enabled.
    #[track_caller]
    pub fn alert_with_level(&self, label: &str, fields: &[Value]) {
        report(self.dispatch(Level::Alert, Some(label), fields, Location::caller()));
    }

    /// Log at any level and return the number of bytes written to the file
    /// sink, or the error that prevented it. Gated calls return `Ok(0)`.
    #[track_caller]
    pub fn log(&self, level: Level, fields: &[Value]) -> Result<usize> {
        self.dispatch(level, None, fields, Location::caller())
    }

    /// Write pre-rendered bytes to the sinks, bypassing the level gate and
    /// the formatter.
    ///
    /// A logger without sinks accepts and discards everything. `Ok(0)` is
    /// returned when the bytes were dropped because this logger is already
    /// writing on the current thread, e.g. when its own output is routed
    /// back into it.
    pub fn write(&self, buf: &[u8]) -> io::Result<usize> {
        if !self.inner.writer.has_sinks() {
            return Ok(buf.len());
        }
        contain(|| self.inner.writer.emit(buf)).map_err(io::Error::from)
    }

    pub fn flush(&self) -> io::Result<()> {
        self.inner.writer.flush()
    }

    /// Deliver queued alerts and flush the sinks. Further alerts are dropped.
    pub fn shutdown(&self) {
        if let Some(alerts) = &self.inner.alerts {
            alerts.shutdown();
        }
        let _ = self.flush();
    }

    /// Bytes accounted to the active log file.
    pub fn current_size(&self) -> Option<u64> {
        self.inner.writer.current_size()
    }

    /// Path of the active log file.
    pub fn current_path(&self) -> Option<PathBuf> {
        self.inner.writer.current_path()
    }

    /// Size rotations performed since the logger was built.
    pub fn size_rotations(&self) -> u64 {
        self.inner.writer.size_rotations()
    }

    fn dispatch(
        &self,
        level: Level,
        label: Option<&str>,
        fields: &[Value],
        location: &'static Location<'static>,
    ) -> Result<usize> {
        if !self.enabled(level) {
            return Ok(0);
        }
        contain(|| self.emit(level, label, fields, location))
    }

    fn emit(
        &self,
        level: Level,
        label: Option<&str>,
        fields: &[Value],
        location: &'static Location<'static>,
    ) -> Result<usize> {
        let time = self.inner.writer.clock().now();
        let line = {
            let prefix = self
                .inner
                .prefix
                .read()
                .unwrap_or_else(PoisonError::into_inner);
            self.inner.format.render(&Record {
                time,
                level,
                label,
                location,
                ip: host::server_ip(),
                prefix: &prefix,
                fields,
            })
        };

        if level == Level::Alert
            && let Some(alerts) = &self.inner.alerts
        {
            match alerts.submit(line.clone()) {
                Submit::Queued => {}
                Submit::Dropped => tracing::warn!("alert queue full, alert dropped"),
                Submit::Closed => tracing::warn!("alert dispatcher closed, alert dropped"),
            }
        }

        self.inner.writer.emit(line.as_bytes())
    }
}

/// Run one logging operation, turning a panic into an error.
fn contain<F>(f: F) -> Result<usize>
where
    F: FnOnce() -> Result<usize>,
{
    panic::catch_unwind(AssertUnwindSafe(f)).unwrap_or_else(|payload| Err(panic_error(payload)))
}

fn panic_error(payload: Box<dyn Any + Send>) -> Error {
    let message = payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string());
    Error::Panic(message)
}

fn report(result: Result<usize>) {
    if let Err(error) = result {
        tracing::error!(%error, "failed to write log line");
    }
}

impl io::Write for &Logger {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        Logger::write(self, buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        Logger::flush(self)
    }
}

impl io::Write for Logger {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        Logger::write(self, buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        Logger::flush(self)
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("level", &self.inner.level)
            .field("zone", &self.inner.zone)
            .field("format", &self.inner.format)
            .field("writer", &self.inner.writer)
            .field("alerts", &self.inner.alerts)
            .finish()
    }
}
