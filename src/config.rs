use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::Level;
use crate::format::DEFAULT_DATE_FORMAT;
use crate::rotation::{DEFAULT_MAX_FILES, DEFAULT_MAX_SIZE, deserialize_size};

/// Configuration for logging
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogConfig {
    /// Minimum severity that gets written
    #[serde(default)]
    pub level: Level,
    /// IANA time zone name; empty or unknown means local time
    #[serde(default)]
    pub zone: String,
    /// Enable console logging
    #[serde(default)]
    pub console: bool,
    /// File logging configuration
    #[serde(default)]
    pub file: Option<FileLogConfig>,
    /// Text put in front of the fields of every line
    #[serde(default)]
    pub prefix: String,
    /// chrono format string for the line timestamp
    #[serde(default = "default_date_format")]
    pub date_format: String,
    /// Report the file and line of each call
    #[serde(default = "default_true")]
    pub caller: bool,
    /// Hand alert lines to the alert callback
    #[serde(default)]
    pub alert: bool,
}

impl LogConfig {
    /// Create a new LogConfig with defaults
    pub fn new() -> Self {
        Self {
            level: Level::default(),
            zone: String::new(),
            console: false,
            file: None,
            prefix: String::new(),
            date_format: default_date_format(),
            caller: true,
            alert: false,
        }
    }

    /// Enable console logging
    pub fn with_console(mut self, console: bool) -> Self {
        self.console = console;
        self
    }

    /// Set log level
    pub fn with_level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    /// Set the time zone name
    pub fn with_zone(mut self, zone: impl Into<String>) -> Self {
        self.zone = zone.into();
        self
    }

    /// Set file logging configuration
    pub fn with_file(mut self, file: FileLogConfig) -> Self {
        self.file = Some(file);
        self
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self::new()
    }
}

fn default_date_format() -> String {
    DEFAULT_DATE_FORMAT.to_string()
}

fn default_true() -> bool {
    true
}

/// Configuration for file logging
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileLogConfig {
    /// Directory holding the log files
    #[serde(default = "default_path")]
    pub path: PathBuf,
    /// Base file name, the date is appended to it
    #[serde(default = "default_name")]
    pub name: String,
    /// File extension without the dot
    #[serde(default = "default_extension")]
    pub extension: String,
    /// Size in bytes at which the file is rotated.
    /// Accepts a number of bytes or a string with a K/M/G unit, e.g. "100M".
    #[serde(default = "default_max_size", deserialize_with = "deserialize_size")]
    pub max_size: u64,
    /// Size-rotated files kept per day
    #[serde(default = "default_max_files")]
    pub max_files: usize,
}

impl FileLogConfig {
    /// Create a new FileLogConfig writing to `path`
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    /// Set the base file name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Set the file extension
    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into();
        self
    }

    /// Set size rotation threshold and retention
    pub fn with_rotation(mut self, max_size: u64, max_files: usize) -> Self {
        self.max_size = max_size;
        self.max_files = max_files;
        self
    }

    /// Replace empty or zero values with their defaults and make the
    /// directory absolute.
    pub fn normalized(mut self) -> Self {
        if self.path.as_os_str().is_empty() {
            self.path = default_path();
        }
        self.path = std::path::absolute(&self.path).unwrap_or(self.path);
        if self.name.trim().is_empty() {
            self.name = default_name();
        }
        if self.extension.trim().is_empty() {
            self.extension = default_extension();
        }
        if self.max_size == 0 {
            self.max_size = default_max_size();
        }
        self
    }
}

impl Default for FileLogConfig {
    fn default() -> Self {
        Self {
            path: default_path(),
            name: default_name(),
            extension: default_extension(),
            max_size: default_max_size(),
            max_files: default_max_files(),
        }
    }
}

fn default_path() -> PathBuf {
    PathBuf::from(".")
}

fn default_name() -> String {
    "applog".to_string()
}

fn default_extension() -> String {
    "log".to_string()
}

fn default_max_size() -> u64 {
    DEFAULT_MAX_SIZE
}

fn default_max_files() -> usize {
    DEFAULT_MAX_FILES
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_config_new() {
        let config = LogConfig::new();
        assert!(!config.console);
        assert_eq!(config.level, Level::Info);
        assert_eq!(config.date_format, DEFAULT_DATE_FORMAT);
        assert!(config.caller);
        assert!(!config.alert);
        assert!(config.file.is_none());
        assert_eq!(config, LogConfig::default());
    }

    #[test]
    fn test_log_config_chaining() {
        let config = LogConfig::new()
            .with_console(true)
            .with_level(Level::Warn)
            .with_zone("Asia/Chongqing")
            .with_file(FileLogConfig::new("logs"));
        assert!(config.console);
        assert_eq!(config.level, Level::Warn);
        assert_eq!(config.zone, "Asia/Chongqing");
        assert_eq!(config.file.unwrap().path, PathBuf::from("logs"));
    }

    #[test]
    fn test_file_log_config_defaults() {
        let config = FileLogConfig::default();
        assert_eq!(config.path, PathBuf::from("."));
        assert_eq!(config.name, "applog");
        assert_eq!(config.extension, "log");
        assert_eq!(config.max_size, 100 * 1024 * 1024);
        assert_eq!(config.max_files, 5);
    }

    #[test]
    fn test_normalized_fills_blanks() {
        let config = FileLogConfig {
            path: PathBuf::new(),
            name: " ".to_string(),
            extension: String::new(),
            max_size: 0,
            max_files: 0,
        }
        .normalized();

        assert!(config.path.is_absolute());
        assert_eq!(config.name, "applog");
        assert_eq!(config.extension, "log");
        assert_eq!(config.max_size, DEFAULT_MAX_SIZE);
        assert_eq!(config.max_files, 0);
    }

    #[test]
    fn test_deserialize_yaml() {
        let yaml = r#"
level: warn
zone: Asia/Shanghai
console: true
prefix: "svc=api "
file:
  path: /var/log/api
  name: api
  max_size: "50M"
  max_files: 3
"#;
        let config: LogConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.level, Level::Warn);
        assert_eq!(config.zone, "Asia/Shanghai");
        assert_eq!(config.prefix, "svc=api ");
        let file = config.file.unwrap();
        assert_eq!(file.path, PathBuf::from("/var/log/api"));
        assert_eq!(file.name, "api");
        assert_eq!(file.extension, "log");
        assert_eq!(file.max_size, 50 * 1024 * 1024);
        assert_eq!(file.max_files, 3);
    }

    #[test]
    fn test_deserialize_toml() {
        let text = r#"
level = "debug"
alert = true
caller = false

[file]
max_size = 4096
"#;
        let config: LogConfig = toml::from_str(text).unwrap();
        assert_eq!(config.level, Level::Debug);
        assert!(config.alert);
        assert!(!config.caller);
        let file = config.file.unwrap();
        assert_eq!(file.max_size, 4096);
        assert_eq!(file.name, "applog");
        assert_eq!(file.max_files, DEFAULT_MAX_FILES);
    }

    #[test]
    fn test_deserialize_rejects_bad_level() {
        assert!(serde_yaml::from_str::<LogConfig>("level: chatty").is_err());
    }
}
