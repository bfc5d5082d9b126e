//! On-disk lifecycle of the active log file.
//!
//! The current file for a day is `{dir}/{base}_{YYYY-MM-DD}.{ext}`. Size
//! rotation moves it to `{dir}/{base}_{YYYY-MM-DD}.1.{ext}`, pushing older
//! numbered files up by one and deleting whatever would land past the
//! retention limit.

use std::fmt;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::NaiveDate;

use crate::{Error, Result};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Builds the file names used for one logging pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogFileNames {
    dir: PathBuf,
    base: String,
    extension: String,
}

impl LogFileNames {
    /// `extension` may be given with or without its leading dot.
    pub fn new(dir: impl Into<PathBuf>, base: impl Into<String>, extension: &str) -> Self {
        Self {
            dir: dir.into(),
            base: base.into(),
            extension: extension.trim_start_matches('.').to_string(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the live file for `day`.
    pub fn current(&self, day: NaiveDate) -> PathBuf {
        self.dir
            .join(format!("{}{}", self.stem(day), self.suffix()))
    }

    /// Path of the `n`th size-rotated file for `day`; 1 is the newest.
    pub fn numbered(&self, day: NaiveDate, n: usize) -> PathBuf {
        self.dir
            .join(format!("{}.{}{}", self.stem(day), n, self.suffix()))
    }

    fn stem(&self, day: NaiveDate) -> String {
        format!("{}_{}", self.base, day.format(DATE_FORMAT))
    }

    fn suffix(&self) -> String {
        if self.extension.is_empty() {
            String::new()
        } else {
            format!(".{}", self.extension)
        }
    }
}

/// A historical file that could not be shifted or deleted during rotation.
#[derive(Debug)]
pub struct CleanupFailure {
    pub action: &'static str,
    pub path: PathBuf,
    pub error: io::Error,
}

impl fmt::Display for CleanupFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed to {} {}: {}", self.action, self.path.display(), self.error)
    }
}

/// The active log file plus the bookkeeping needed to rotate it.
#[derive(Debug)]
pub struct LogFile {
    names: LogFileNames,
    day: NaiveDate,
    /// `None` after a rotation failed to reopen the file.
    file: Option<File>,
    size: u64,
    size_rotations: u64,
}

impl LogFile {
    /// Create the directory if needed and open the file for `day`.
    ///
    /// The size counter starts at the file's existing length so a restarted
    /// process keeps accounting for what an earlier run wrote.
    pub fn open(names: LogFileNames, day: NaiveDate) -> Result<Self> {
        let mut log_file = Self {
            names,
            day,
            file: None,
            size: 0,
            size_rotations: 0,
        };
        log_file.open_current()?;
        Ok(log_file)
    }

    fn open_current(&mut self) -> Result<()> {
        let dir = self.names.dir();
        if !dir.as_os_str().is_empty() {
            fs::create_dir_all(dir).map_err(|e| Error::config(dir, e))?;
        }

        let path = self.current_path();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| Error::config(&path, e))?;
        let size = file.metadata().map_err(|e| Error::config(&path, e))?.len();

        self.file = Some(file);
        self.size = size;
        Ok(())
    }

    /// Reopen the current file if an earlier rotation left it closed.
    pub fn ensure_open(&mut self) -> Result<()> {
        if self.file.is_none() {
            self.open_current().map_err(Error::into_reopen)?;
        }
        Ok(())
    }

    pub fn is_open(&self) -> bool {
        self.file.is_some()
    }

    pub fn day(&self) -> NaiveDate {
        self.day
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn size_rotations(&self) -> u64 {
        self.size_rotations
    }

    pub fn names(&self) -> &LogFileNames {
        &self.names
    }

    pub fn current_path(&self) -> PathBuf {
        self.names.current(self.day)
    }

    /// Close the file of the old day and start the file for `day`.
    ///
    /// The old file already carries its date in its name, so nothing is
    /// renamed.
    pub fn rotate_by_date(&mut self, day: NaiveDate) -> Result<()> {
        self.file = None;
        self.day = day;
        self.open_current().map_err(Error::into_reopen)
    }

    /// Move the current file to index 1 and open an empty one in its place,
    /// keeping at most `max_files` numbered files.
    ///
    /// Failures to shift or delete older files are pushed to `failures` and
    /// do not stop the current file from being reopened. When the current
    /// file itself could not be moved, writing continues into it and the
    /// rotation is not counted. Returns whether the current file was moved.
    pub fn rotate_by_size(
        &mut self,
        max_files: usize,
        failures: &mut Vec<CleanupFailure>,
    ) -> Result<bool> {
        self.file = None;

        let mut last = 0;
        while self.names.numbered(self.day, last + 1).exists() {
            last += 1;
        }

        // Largest index first so a rename never lands on a file still to move.
        for n in (1..=last).rev() {
            let from = self.names.numbered(self.day, n);
            if n >= max_files {
                if let Err(error) = fs::remove_file(&from) {
                    failures.push(CleanupFailure {
                        action: "remove",
                        path: from,
                        error,
                    });
                }
            } else if let Err(error) = fs::rename(&from, self.names.numbered(self.day, n + 1)) {
                failures.push(CleanupFailure {
                    action: "shift",
                    path: from,
                    error,
                });
            }
        }

        let current = self.current_path();
        let outcome = if max_files == 0 {
            fs::remove_file(&current).map_err(|e| ("remove", e))
        } else {
            fs::rename(&current, self.names.numbered(self.day, 1)).map_err(|e| ("rotate", e))
        };
        let moved = match outcome {
            Ok(()) => {
                self.size = 0;
                self.size_rotations += 1;
                true
            }
            Err((action, error)) => {
                failures.push(CleanupFailure {
                    action,
                    path: current,
                    error,
                });
                false
            }
        };

        self.open_current().map_err(Error::into_reopen)?;
        Ok(moved)
    }

    /// Write all of `buf`, counting every byte that reached the file even
    /// when a later chunk fails.
    pub fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let file = self
            .file
            .as_mut()
            .ok_or_else(|| io::Error::other("log file is not open"))?;

        let mut written = 0;
        let mut result = Ok(());
        while written < buf.len() {
            match file.write(&buf[written..]) {
                Ok(0) => {
                    result = Err(io::Error::from(io::ErrorKind::WriteZero));
                    break;
                }
                Ok(n) => written += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => {
                    result = Err(e);
                    break;
                }
            }
        }
        self.size += written as u64;
        result.map(|()| written)
    }

    pub fn flush(&mut self) -> io::Result<()> {
        match self.file.as_mut() {
            Some(file) => file.flush(),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 7, 4).unwrap()
    }

    fn names(dir: &Path) -> LogFileNames {
        LogFileNames::new(dir, "app", "log")
    }

    #[test]
    fn test_file_names() {
        let names = LogFileNames::new("/var/log", "info", ".log");
        assert_eq!(
            names.current(day()),
            PathBuf::from("/var/log/info_2024-07-04.log")
        );
        assert_eq!(
            names.numbered(day(), 3),
            PathBuf::from("/var/log/info_2024-07-04.3.log")
        );

        let bare = LogFileNames::new("/tmp", "trace", "");
        assert_eq!(bare.current(day()), PathBuf::from("/tmp/trace_2024-07-04"));
        assert_eq!(bare.numbered(day(), 1), PathBuf::from("/tmp/trace_2024-07-04.1"));
    }

    #[test]
    fn test_open_creates_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("nested/inner");
        let log = LogFile::open(names(&dir), day()).expect("open");
        assert!(log.current_path().exists());
        assert_eq!(log.size(), 0);
    }

    #[test]
    fn test_open_resumes_existing_size() {
        let tmp = tempfile::tempdir().unwrap();
        let names = names(tmp.path());
        fs::write(names.current(day()), b"earlier run\n").unwrap();

        let mut log = LogFile::open(names, day()).unwrap();
        assert_eq!(log.size(), 12);
        log.write(b"more\n").unwrap();
        assert_eq!(log.size(), 17);
        assert_eq!(
            fs::read_to_string(log.current_path()).unwrap(),
            "earlier run\nmore\n"
        );
    }

    #[test]
    fn test_open_fails_when_directory_is_a_file() {
        let tmp = tempfile::tempdir().unwrap();
        let blocker = tmp.path().join("blocker");
        fs::write(&blocker, b"x").unwrap();

        let err = LogFile::open(names(&blocker.join("logs")), day()).unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
    }

    #[test]
    fn test_rotate_by_size_shifts_and_prunes() {
        let tmp = tempfile::tempdir().unwrap();
        let mut log = LogFile::open(names(tmp.path()), day()).unwrap();
        let mut failures = Vec::new();

        for generation in ["first", "second", "third"] {
            log.write(generation.as_bytes()).unwrap();
            log.rotate_by_size(2, &mut failures).unwrap();
        }

        assert!(failures.is_empty(), "{:?}", failures);
        let names = log.names().clone();
        assert_eq!(fs::read_to_string(names.numbered(day(), 1)).unwrap(), "third");
        assert_eq!(fs::read_to_string(names.numbered(day(), 2)).unwrap(), "second");
        assert!(!names.numbered(day(), 3).exists());
        assert_eq!(fs::read(log.current_path()).unwrap().len(), 0);
        assert_eq!(log.size(), 0);
        assert_eq!(log.size_rotations(), 3);
    }

    #[test]
    fn test_rotate_by_size_without_retention() {
        let tmp = tempfile::tempdir().unwrap();
        let mut log = LogFile::open(names(tmp.path()), day()).unwrap();
        let mut failures = Vec::new();

        log.write(b"gone").unwrap();
        assert!(log.rotate_by_size(0, &mut failures).unwrap());

        assert!(failures.is_empty());
        assert!(!log.names().numbered(day(), 1).exists());
        assert!(log.current_path().exists());
        assert_eq!(fs::read_dir(tmp.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_rotate_by_size_prunes_beyond_lowered_limit() {
        let tmp = tempfile::tempdir().unwrap();
        let names = names(tmp.path());
        for n in 1..=4 {
            fs::write(names.numbered(day(), n), n.to_string()).unwrap();
        }

        let mut log = LogFile::open(names.clone(), day()).unwrap();
        log.write(b"live").unwrap();
        let mut failures = Vec::new();
        log.rotate_by_size(2, &mut failures).unwrap();

        assert!(failures.is_empty());
        assert_eq!(fs::read_to_string(names.numbered(day(), 1)).unwrap(), "live");
        assert_eq!(fs::read_to_string(names.numbered(day(), 2)).unwrap(), "1");
        assert!(!names.numbered(day(), 3).exists());
        assert!(!names.numbered(day(), 4).exists());
    }

    #[test]
    fn test_rotate_by_date_leaves_old_file() {
        let tmp = tempfile::tempdir().unwrap();
        let mut log = LogFile::open(names(tmp.path()), day()).unwrap();
        log.write(b"yesterday\n").unwrap();
        let old = log.current_path();

        let next = day().succ_opt().unwrap();
        log.rotate_by_date(next).unwrap();

        assert_eq!(log.day(), next);
        assert_eq!(log.size(), 0);
        assert_eq!(fs::read_to_string(old).unwrap(), "yesterday\n");
        assert!(log.current_path().ends_with("app_2024-07-05.log"));
    }

    #[test]
    fn test_failed_reopen_is_retried() {
        let tmp = tempfile::tempdir().unwrap();
        let names = names(tmp.path());
        let mut log = LogFile::open(names.clone(), day()).unwrap();

        // A directory squatting on the next day's file name cannot be opened
        // for append, whatever the caller's privileges.
        let next = day().succ_opt().unwrap();
        fs::create_dir(names.current(next)).unwrap();

        let err = log.rotate_by_date(next).unwrap_err();
        assert!(matches!(err, Error::Reopen { .. }));
        assert!(!log.is_open());
        assert!(log.write(b"lost").is_err());
        assert!(matches!(log.ensure_open(), Err(Error::Reopen { .. })));

        fs::remove_dir(names.current(next)).unwrap();
        log.ensure_open().unwrap();
        assert_eq!(log.write(b"back\n").unwrap(), 5);
        assert_eq!(fs::read_to_string(names.current(next)).unwrap(), "back\n");
    }

    #[test]
    fn test_blocked_history_keeps_current_file() {
        let tmp = tempfile::tempdir().unwrap();
        let names = names(tmp.path());
        let blocker = names.numbered(day(), 1);
        fs::create_dir(&blocker).unwrap();
        fs::write(blocker.join("keep"), b"x").unwrap();

        let mut log = LogFile::open(names.clone(), day()).unwrap();
        log.write(b"0123456789\n").unwrap();
        let mut failures = Vec::new();
        assert!(!log.rotate_by_size(1, &mut failures).unwrap());

        // Removing the blocker and moving the current file onto it both fail.
        assert_eq!(failures.len(), 2, "{:?}", failures);
        assert_eq!(failures[0].action, "remove");
        assert_eq!(failures[1].action, "rotate");
        assert!(log.is_open());
        assert_eq!(log.size_rotations(), 0);
        assert_eq!(log.size(), 11);

        log.write(b"0123456789\n").unwrap();
        assert_eq!(log.size(), 22);
        assert_eq!(fs::metadata(log.current_path()).unwrap().len(), 22);
        assert!(blocker.join("keep").exists());
    }
}
