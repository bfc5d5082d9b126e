use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer, de};

/// Severity of a log call, in ascending order.
///
/// A logger emits a call only when its level is greater than or equal to the
/// configured threshold. `Alert` sits above `Fatal` so alerts pass every
/// threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum Level {
    /// Diagnostic detail.
    Debug,
    /// Normal operation.
    #[default]
    Info,
    /// Something unexpected that the service recovered from.
    Warn,
    /// A failed operation.
    Error,
    /// An unrecoverable condition; `Logger::fatal` exits after logging it.
    Fatal,
    /// Labelled alert, also handed to the alert callback.
    Alert,
}

impl Level {
    /// All levels, lowest first.
    pub const ALL: [Level; 6] = [
        Level::Debug,
        Level::Info,
        Level::Warn,
        Level::Error,
        Level::Fatal,
        Level::Alert,
    ];

    /// Lower-case name used in configuration files.
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Debug => "debug",
            Level::Info => "info",
            Level::Warn => "warn",
            Level::Error => "error",
            Level::Fatal => "fatal",
            Level::Alert => "alert",
        }
    }

    /// Upper-case tag written into each line.
    pub fn tag(&self) -> &'static str {
        match self {
            Level::Debug => "DEBUG",
            Level::Info => "INFO",
            Level::Warn => "WARN",
            Level::Error => "ERROR",
            Level::Fatal => "FATAL",
            Level::Alert => "ALERT",
        }
    }

    /// Whether a call at `self` passes a gate configured at `threshold`.
    pub fn enabled_at(self, threshold: Level) -> bool {
        self >= threshold
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Level {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "debug" | "trace" => Ok(Level::Debug),
            "info" => Ok(Level::Info),
            "warn" | "warning" => Ok(Level::Warn),
            "error" => Ok(Level::Error),
            "fatal" => Ok(Level::Fatal),
            "alert" => Ok(Level::Alert),
            other => Err(crate::Error::Invalid(format!("unknown log level: {}", other))),
        }
    }
}

impl Serialize for Level {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Level {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_levels_are_ordered() {
        for pair in Level::ALL.windows(2) {
            assert!(pair[0] < pair[1]);
        }
    }

    #[test]
    fn test_gate() {
        assert!(!Level::Debug.enabled_at(Level::Warn));
        assert!(!Level::Info.enabled_at(Level::Warn));
        assert!(Level::Warn.enabled_at(Level::Warn));
        assert!(Level::Error.enabled_at(Level::Warn));
        assert!(Level::Fatal.enabled_at(Level::Warn));
        assert!(Level::Alert.enabled_at(Level::Fatal));
    }

    #[test]
    fn test_parse_level() {
        assert_eq!("DEBUG".parse::<Level>().unwrap(), Level::Debug);
        assert_eq!(" warning ".parse::<Level>().unwrap(), Level::Warn);
        assert_eq!("trace".parse::<Level>().unwrap(), Level::Debug);
        assert!(matches!("loud".parse::<Level>(), Err(crate::Error::Invalid(_))));
    }

    #[test]
    fn test_level_deserialize() {
        let level: Level = serde_yaml::from_str("error").unwrap();
        assert_eq!(level, Level::Error);
        assert!(serde_yaml::from_str::<Level>("nope").is_err());
    }

    #[test]
    fn test_display_round_trips_names() {
        for level in Level::ALL {
            assert_eq!(level.to_string().parse::<Level>().unwrap(), level);
        }
    }
}
