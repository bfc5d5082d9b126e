use std::num::NonZeroU64;

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, de};

/// Size threshold used when none (or zero) is configured: 100 MiB.
pub const DEFAULT_MAX_SIZE: u64 = 100 * 1024 * 1024;

/// Number of size-rotated files kept per day when none is configured.
pub const DEFAULT_MAX_FILES: usize = 5;

/// Parse a size string with an optional unit (B/K/M/G, case-insensitive).
/// A bare number is a byte count.
pub(crate) fn parse_size(s: &str) -> Result<u64, String> {
    let s = s.trim();
    let Some(last) = s.chars().last() else {
        return Err("empty size string".to_string());
    };

    let (num_str, unit) = if last.is_alphabetic() {
        (s[..s.len() - last.len_utf8()].trim_end(), last.to_ascii_uppercase())
    } else {
        (s, 'B')
    };

    let num: u64 = num_str
        .parse()
        .map_err(|_| format!("invalid number: {}", num_str))?;

    let multiplier: u64 = match unit {
        'B' => 1,
        'K' => 1024,
        'M' => 1024 * 1024,
        'G' => 1024 * 1024 * 1024,
        _ => return Err(format!("invalid unit: {}, supported: B/K/M/G", unit)),
    };

    num.checked_mul(multiplier)
        .ok_or_else(|| "size too large".to_string())
}

/// Size value that can be a number or string with units.
#[derive(Deserialize)]
#[serde(untagged)]
enum SizeValue {
    Number(u64),
    String(String),
}

/// `deserialize_with` helper accepting `1048576`, `"512K"` or `"100M"`.
pub(crate) fn deserialize_size<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    match SizeValue::deserialize(deserializer)? {
        SizeValue::Number(n) => Ok(n),
        SizeValue::String(s) => parse_size(&s).map_err(de::Error::custom),
    }
}

/// Decides when the active file has to be rotated.
///
/// The date check runs first and only ever moves forward; the size check is
/// then made against whatever file is current after a date rotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RotationPolicy {
    max_size: Option<NonZeroU64>,
    max_files: usize,
}

impl RotationPolicy {
    /// A `max_size` of zero disables size rotation.
    pub fn new(max_size: u64, max_files: usize) -> Self {
        Self {
            max_size: NonZeroU64::new(max_size),
            max_files,
        }
    }

    /// Rotate only on day boundaries.
    pub fn daily(max_files: usize) -> Self {
        Self::new(0, max_files)
    }

    pub fn max_size(&self) -> Option<u64> {
        self.max_size.map(NonZeroU64::get)
    }

    pub fn max_files(&self) -> usize {
        self.max_files
    }

    /// True when `today` is strictly after the day of the open file.
    pub fn date_due(&self, current: NaiveDate, today: NaiveDate) -> bool {
        today > current
    }

    /// True when the open file has reached the size threshold.
    pub fn size_due(&self, current_size: u64) -> bool {
        match self.max_size {
            Some(max) => current_size >= max.get(),
            None => false,
        }
    }
}

impl Default for RotationPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_SIZE, DEFAULT_MAX_FILES)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, d).unwrap()
    }

    #[test]
    fn test_parse_size_units() {
        assert_eq!(parse_size("10"), Ok(10));
        assert_eq!(parse_size("10b"), Ok(10));
        assert_eq!(parse_size("5K"), Ok(5 * 1024));
        assert_eq!(parse_size("3 m"), Ok(3 * 1024 * 1024));
        assert_eq!(parse_size("2g"), Ok(2 * 1024 * 1024 * 1024));
        assert!(parse_size("").is_err());
        assert!(parse_size("12Q").is_err());
        assert!(parse_size("abcK").is_err());
        assert!(parse_size(&format!("{}G", u64::MAX)).is_err());
    }

    #[test]
    fn test_deserialize_size() {
        #[derive(Deserialize)]
        struct Holder {
            #[serde(deserialize_with = "deserialize_size")]
            size: u64,
        }

        let h: Holder = serde_yaml::from_str("size: 2048").unwrap();
        assert_eq!(h.size, 2048);
        let h: Holder = serde_yaml::from_str("size: \"512K\"").unwrap();
        assert_eq!(h.size, 512 * 1024);
        assert!(serde_yaml::from_str::<Holder>("size: \"1X\"").is_err());
    }

    #[test]
    fn test_date_due_only_forward() {
        let policy = RotationPolicy::default();
        assert!(policy.date_due(day(1), day(2)));
        assert!(policy.date_due(day(1), day(9)));
        assert!(!policy.date_due(day(2), day(2)));
        assert!(!policy.date_due(day(2), day(1)));
    }

    #[test]
    fn test_size_due_at_threshold() {
        let policy = RotationPolicy::new(50, 2);
        assert!(!policy.size_due(0));
        assert!(!policy.size_due(49));
        assert!(policy.size_due(50));
        assert!(policy.size_due(51));
    }

    #[test]
    fn test_zero_threshold_never_due() {
        let policy = RotationPolicy::new(0, 3);
        assert_eq!(policy.max_size(), None);
        assert!(!policy.size_due(0));
        assert!(!policy.size_due(u64::MAX));
        assert_eq!(RotationPolicy::daily(3), policy);
    }

    #[test]
    fn test_default_policy() {
        let policy = RotationPolicy::default();
        assert_eq!(policy.max_size(), Some(DEFAULT_MAX_SIZE));
        assert_eq!(policy.max_files(), DEFAULT_MAX_FILES);
    }
}
