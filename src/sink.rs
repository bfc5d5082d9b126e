//! Destinations for rendered lines.

use std::fmt;
use std::io::{self, Write};

use chrono::NaiveDate;

use crate::Result;
use crate::file::{CleanupFailure, LogFile};
use crate::rotation::RotationPolicy;

/// A destination that accepts raw bytes.
pub trait Sink: Send {
    /// Write one rendered line, returning how many bytes were accepted.
    fn write_line(&mut self, line: &[u8]) -> io::Result<usize>;

    fn flush(&mut self) -> io::Result<()>;
}

/// Pass-through sink, stdout unless another writer is supplied.
pub struct ConsoleSink {
    out: Box<dyn Write + Send>,
}

impl ConsoleSink {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }

    pub fn new<W: Write + Send + 'static>(out: W) -> Self {
        Self { out: Box::new(out) }
    }
}

impl fmt::Debug for ConsoleSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConsoleSink").finish_non_exhaustive()
    }
}

impl Sink for ConsoleSink {
    fn write_line(&mut self, line: &[u8]) -> io::Result<usize> {
        self.out.write_all(line)?;
        Ok(line.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.out.flush()
    }
}

/// The active log file together with the policy that rotates it.
#[derive(Debug)]
pub struct FileSink {
    file: LogFile,
    policy: RotationPolicy,
}

/// Which rotations [`FileSink::rotate_if_due`] performed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Rotated {
    pub date: bool,
    pub size: bool,
}

impl FileSink {
    pub fn new(file: LogFile, policy: RotationPolicy) -> Self {
        Self { file, policy }
    }

    pub fn file(&self) -> &LogFile {
        &self.file
    }

    pub fn policy(&self) -> &RotationPolicy {
        &self.policy
    }

    /// Apply the date check, then the size check against whatever file is
    /// current afterwards.
    pub fn rotate_if_due(
        &mut self,
        today: NaiveDate,
        failures: &mut Vec<CleanupFailure>,
    ) -> Result<Rotated> {
        self.file.ensure_open()?;

        let mut rotated = Rotated::default();
        if self.policy.date_due(self.file.day(), today) {
            self.file.rotate_by_date(today)?;
            rotated.date = true;
        }
        if self.policy.size_due(self.file.size()) {
            rotated.size = self
                .file
                .rotate_by_size(self.policy.max_files(), failures)?;
        }
        Ok(rotated)
    }
}

impl Sink for FileSink {
    fn write_line(&mut self, line: &[u8]) -> io::Result<usize> {
        self.file.write(line)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file.flush()
    }
}
