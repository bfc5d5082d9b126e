use std::cell::RefCell;
use std::fmt;
use std::io;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};

use crate::clock::Clock;
use crate::file::CleanupFailure;
use crate::sink::{ConsoleSink, FileSink, Rotated, Sink};
use crate::{Error, Result};

thread_local! {
    static ACTIVE_WRITERS: RefCell<Vec<usize>> = const { RefCell::new(Vec::new()) };
}

/// Marks one writer as busy on the current thread.
///
/// Other writers stay usable, so a logger can feed another one.
struct ReentryGuard {
    writer: usize,
}

impl ReentryGuard {
    fn enter(writer: usize) -> Option<Self> {
        ACTIVE_WRITERS.with(|active| {
            let mut active = active.borrow_mut();
            if active.contains(&writer) {
                None
            } else {
                active.push(writer);
                Some(ReentryGuard { writer })
            }
        })
    }
}

impl Drop for ReentryGuard {
    fn drop(&mut self) {
        ACTIVE_WRITERS.with(|active| active.borrow_mut().retain(|&w| w != self.writer));
    }
}

#[derive(Debug, Default)]
struct Sinks {
    file: Option<FileSink>,
    console: Option<ConsoleSink>,
}

/// Serializes rotation checks, rotations and writes for one logger.
///
/// Every [`RotatingWriter::emit`] runs the whole check-rotate-write sequence
/// under a single lock, so no write can reach a handle that another thread
/// is closing and the size counter always matches what reached the file.
pub struct RotatingWriter {
    clock: Arc<dyn Clock>,
    sinks: Mutex<Sinks>,
}

impl RotatingWriter {
    pub fn new(
        clock: Arc<dyn Clock>,
        file: Option<FileSink>,
        console: Option<ConsoleSink>,
    ) -> Self {
        Self {
            clock,
            sinks: Mutex::new(Sinks { file, console }),
        }
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    fn id(&self) -> usize {
        self as *const Self as usize
    }

    /// Write one rendered line to every enabled sink.
    ///
    /// Returns the bytes written to the file sink, or to the console when it
    /// is the only sink. File-sink failures are returned; console failures
    /// are ignored. A call that re-enters this writer from inside its own
    /// critical section on the same thread is dropped and returns `Ok(0)`.
    pub fn emit(&self, line: &[u8]) -> Result<usize> {
        let mut failures = Vec::new();
        let mut rotated = Rotated::default();

        let result = match ReentryGuard::enter(self.id()) {
            Some(_guard) => self.emit_locked(line, &mut rotated, &mut failures),
            None => Ok(0),
        };

        report(rotated, &failures);
        result
    }

    fn emit_locked(
        &self,
        line: &[u8],
        rotated: &mut Rotated,
        failures: &mut Vec<CleanupFailure>,
    ) -> Result<usize> {
        let mut sinks = self.lock();

        let file_result = sinks.file.as_mut().map(|file| {
            *rotated = file.rotate_if_due(self.clock.today(), failures)?;
            file.write_line(line).map_err(Error::Io)
        });

        let console_written = sinks
            .console
            .as_mut()
            .and_then(|console| console.write_line(line).ok());

        match file_result {
            Some(result) => result,
            None => Ok(console_written.unwrap_or(0)),
        }
    }

    pub fn flush(&self) -> io::Result<()> {
        let mut sinks = self.lock();
        if let Some(console) = sinks.console.as_mut() {
            let _ = console.flush();
        }
        match sinks.file.as_mut() {
            Some(file) => file.flush(),
            None => Ok(()),
        }
    }

    /// Bytes accounted to the current file; `None` without a file sink.
    pub fn current_size(&self) -> Option<u64> {
        self.lock().file.as_ref().map(|f| f.file().size())
    }

    pub fn current_path(&self) -> Option<PathBuf> {
        self.lock().file.as_ref().map(|f| f.file().current_path())
    }

    /// Size rotations performed since the writer was built.
    pub fn size_rotations(&self) -> u64 {
        self.lock()
            .file
            .as_ref()
            .map_or(0, |f| f.file().size_rotations())
    }

    pub fn has_file(&self) -> bool {
        self.lock().file.is_some()
    }

    pub fn has_console(&self) -> bool {
        self.lock().console.is_some()
    }

    /// Whether any sink is configured at all.
    pub fn has_sinks(&self) -> bool {
        let sinks = self.lock();
        sinks.file.is_some() || sinks.console.is_some()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Sinks> {
        self.sinks.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Called after the lock is released so that any subscriber routing these
/// events back into a logger can take the lock again.
fn report(rotated: Rotated, failures: &[CleanupFailure]) {
    if rotated.date {
        tracing::debug!("log file rotated for new day");
    }
    if rotated.size {
        tracing::debug!("log file rotated by size");
    }
    for failure in failures {
        tracing::warn!(%failure, "log rotation cleanup failed");
    }
}

impl fmt::Debug for RotatingWriter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RotatingWriter")
            .field("clock", &self.clock)
            .field("sinks", &self.sinks)
            .finish()
    }
}
