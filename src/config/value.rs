//! Typed coercion between stored text and caller-facing values.
//!
//! The store keeps every entry as text. Callers pick the type through the
//! default they pass to [`SettingsStore::get_value`](super::SettingsStore::get_value),
//! and this trait decides how that type is read back and written out.

use crate::models::Color;
use chrono::{NaiveDate, NaiveDateTime};
use thiserror::Error;

/// Invariant timestamp encoding used when writing (`MM/DD/YYYY HH:MM:SS`).
pub const INVARIANT_DATETIME_FORMAT: &str = "%m/%d/%Y %H:%M:%S";

/// Additional encodings accepted when reading timestamps.
const ACCEPTED_DATETIME_FORMATS: [&str; 4] = [
    INVARIANT_DATETIME_FORMAT,
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%m/%d/%Y %I:%M:%S %p",
];

/// A stored value could not be read as the requested type.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("cannot read {raw:?} as {expected}")]
pub struct ValueParseError {
    pub expected: &'static str,
    pub raw: String,
}

impl ValueParseError {
    pub fn new(expected: &'static str, raw: &str) -> Self {
        Self {
            expected,
            raw: raw.to_string(),
        }
    }
}

/// A type that can live in the settings store.
pub trait ConfigValue: Sized {
    fn from_config_str(raw: &str) -> Result<Self, ValueParseError>;

    fn to_config_string(&self) -> String;
}

impl ConfigValue for String {
    fn from_config_str(raw: &str) -> Result<Self, ValueParseError> {
        Ok(raw.to_string())
    }

    fn to_config_string(&self) -> String {
        self.clone()
    }
}

macro_rules! impl_numeric_value {
    ($($ty:ty),*) => {
        $(
            impl ConfigValue for $ty {
                fn from_config_str(raw: &str) -> Result<Self, ValueParseError> {
                    raw.trim()
                        .parse::<$ty>()
                        .map_err(|_| ValueParseError::new(stringify!($ty), raw))
                }

                fn to_config_string(&self) -> String {
                    self.to_string()
                }
            }
        )*
    };
}

impl_numeric_value!(i32, i64, u32, f64);

impl ConfigValue for bool {
    fn from_config_str(raw: &str) -> Result<Self, ValueParseError> {
        match raw.trim() {
            s if s.eq_ignore_ascii_case("true") => Ok(true),
            s if s.eq_ignore_ascii_case("false") => Ok(false),
            _ => Err(ValueParseError::new("bool", raw)),
        }
    }

    fn to_config_string(&self) -> String {
        if *self { "True" } else { "False" }.to_string()
    }
}

impl ConfigValue for Color {
    fn from_config_str(raw: &str) -> Result<Self, ValueParseError> {
        raw.parse().map_err(|_| ValueParseError::new("color", raw))
    }

    fn to_config_string(&self) -> String {
        self.to_hex()
    }
}

impl ConfigValue for NaiveDateTime {
    fn from_config_str(raw: &str) -> Result<Self, ValueParseError> {
        let trimmed = raw.trim();
        ACCEPTED_DATETIME_FORMATS
            .iter()
            .find_map(|format| NaiveDateTime::parse_from_str(trimmed, format).ok())
            .ok_or_else(|| ValueParseError::new("timestamp", raw))
    }

    fn to_config_string(&self) -> String {
        self.format(INVARIANT_DATETIME_FORMAT).to_string()
    }
}

/// The earliest representable timestamp, used as the "never" default.
pub fn min_timestamp() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(1, 1, 1)
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .unwrap_or(NaiveDateTime::MIN)
}
