//! Rendering of key/value fields and whole log lines.

use std::fmt::{self, Write as _};
use std::panic::Location;

use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, FixedOffset};

use crate::Level;

/// Timestamp layout used when none is configured.
pub const DEFAULT_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

const MISSING: &str = "(MISSING)";

/// A printable field value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Str(String),
    Int(i64),
    UInt(u64),
    Float(f64),
    Bool(bool),
    Char(char),
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Str(s) if needs_quotes(s) => write!(f, "{:?}", s),
            Value::Str(s) => f.write_str(s),
            Value::Int(v) => write!(f, "{}", v),
            Value::UInt(v) => write!(f, "{}", v),
            Value::Float(v) => write!(f, "{}", v),
            Value::Bool(v) => write!(f, "{}", v),
            Value::Char(v) => write!(f, "{}", v),
        }
    }
}

fn needs_quotes(s: &str) -> bool {
    s.is_empty() || s.chars().any(|c| c.is_whitespace() || c == '=' || c == '"')
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Str(v)
    }
}

impl From<&String> for Value {
    fn from(v: &String) -> Self {
        Value::Str(v.clone())
    }
}

macro_rules! value_from {
    ($variant:ident as $target:ty: $($t:ty),*) => {
        $(
            impl From<$t> for Value {
                fn from(v: $t) -> Self {
                    Value::$variant(v as $target)
                }
            }
        )*
    };
}

value_from!(Int as i64: i8, i16, i32, i64, isize);
value_from!(UInt as u64: u8, u16, u32, u64, usize);
value_from!(Float as f64: f32, f64);

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<char> for Value {
    fn from(v: char) -> Self {
        Value::Char(v)
    }
}

/// Build a `&[Value]` from alternating keys and values.
///
/// ```
/// use rotalog::{fields, Value};
///
/// let f: &[Value] = fields!["user", "bob", "attempts", 3];
/// assert_eq!(rotalog::format::render_fields(f), "user=bob attempts=3 ");
/// ```
#[macro_export]
macro_rules! fields {
    () => {
        &[] as &[$crate::Value]
    };
    ($($v:expr),+ $(,)?) => {
        &[$($crate::Value::from($v)),+] as &[$crate::Value]
    };
}

/// Render fields as `key=value ` pairs. An unpaired trailing key gets a
/// `(MISSING)` value.
pub fn render_fields(fields: &[Value]) -> String {
    let mut out = String::new();
    for pair in fields.chunks(2) {
        match pair {
            [key, value] => {
                let _ = write!(out, "{}={} ", key, value);
            }
            [key] => {
                let _ = write!(out, "{}={} ", key, MISSING);
            }
            _ => {}
        }
    }
    out
}

/// Per-logger settings that shape every rendered line.
#[derive(Debug, Clone)]
pub struct LineFormat {
    pub date_format: String,
    pub caller: bool,
}

impl LineFormat {
    /// An unparsable `date_format` falls back to [`DEFAULT_DATE_FORMAT`].
    pub fn new(date_format: &str, caller: bool) -> Self {
        let valid = !date_format.trim().is_empty()
            && !StrftimeItems::new(date_format).any(|item| matches!(item, Item::Error));
        let date_format = if valid {
            date_format.to_string()
        } else {
            tracing::warn!(date_format, "invalid date format, using default");
            DEFAULT_DATE_FORMAT.to_string()
        };
        Self {
            date_format,
            caller,
        }
    }

    /// `{time} {file}:{line} {LEVEL} IP={ip} {prefix}{fields}`, right-trimmed
    /// and newline-terminated.
    pub fn render(&self, record: &Record<'_>) -> String {
        let mut line = String::with_capacity(128);
        let _ = write!(line, "{} ", record.time.format(&self.date_format));
        if self.caller {
            let _ = write!(
                line,
                "{}:{} ",
                short_file(record.location.file()),
                record.location.line()
            );
        }
        line.push_str(record.level.tag());
        if let Some(label) = record.label {
            let _ = write!(line, "[{}]", label);
        }
        let _ = write!(line, " IP={} {}", record.ip, record.prefix);
        line.push_str(&render_fields(record.fields));

        line.truncate(line.trim_end().len());
        line.push('\n');
        line
    }
}

impl Default for LineFormat {
    fn default() -> Self {
        Self::new(DEFAULT_DATE_FORMAT, true)
    }
}

/// Everything that goes into one line besides the formatter settings.
#[derive(Debug)]
pub struct Record<'a> {
    pub time: DateTime<FixedOffset>,
    pub level: Level,
    pub label: Option<&'a str>,
    pub location: &'a Location<'a>,
    pub ip: &'a str,
    pub prefix: &'a str,
    pub fields: &'a [Value],
}

fn short_file(path: &str) -> &str {
    path.rsplit(['/', '\\']).next().unwrap_or(path)
}
