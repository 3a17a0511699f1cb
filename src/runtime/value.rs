//! Typed values for element text
//!
//! Text content may be given as a plain string or as a typed value, which is
//! rendered in its XSD lexical form before being checked against the domain.

use std::fmt;

use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::Decimal;

use crate::schema::ValueFamily;

/// A value assignable as element text
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Literal text, checked lexically against any domain
    String(String),
    /// xs:boolean
    Boolean(bool),
    /// Integer family
    Integer(i64),
    /// xs:decimal
    Decimal(Decimal),
    /// xs:float and xs:double
    Float(f64),
    /// xs:date
    Date(NaiveDate),
    /// xs:time
    Time(NaiveTime),
    /// xs:dateTime
    DateTime(NaiveDateTime),
    /// xs:gMonthDay
    GMonthDay {
        /// Month, 1-12
        month: u32,
        /// Day of month
        day: u32,
    },
    /// xs:gYear
    GYear(i32),
}

impl Value {
    /// A month-day value, if the pair names a real calendar day
    pub fn g_month_day(month: u32, day: u32) -> Option<Self> {
        // 2000 is a leap year, so --02-29 is accepted
        NaiveDate::from_ymd_opt(2000, month, day).map(|d| Value::GMonthDay {
            month: d.month(),
            day: d.day(),
        })
    }

    /// Value family used to match the value against a domain
    pub fn family(&self) -> ValueFamily {
        match self {
            Value::String(_) => ValueFamily::Text,
            Value::Boolean(_) => ValueFamily::Boolean,
            Value::Integer(_) => ValueFamily::Integer,
            Value::Decimal(_) => ValueFamily::Decimal,
            Value::Float(_) => ValueFamily::Float,
            Value::Date(_) => ValueFamily::Date,
            Value::Time(_) => ValueFamily::Time,
            Value::DateTime(_) => ValueFamily::DateTime,
            Value::GMonthDay { .. } => ValueFamily::GMonthDay,
            Value::GYear(_) => ValueFamily::GYear,
        }
    }

    /// XSD lexical form
    pub fn lexical(&self) -> String {
        match self {
            Value::String(s) => s.clone(),
            Value::Boolean(b) => b.to_string(),
            Value::Integer(i) => i.to_string(),
            Value::Decimal(d) => d.normalize().to_string(),
            Value::Float(f) if f.is_nan() => "NaN".to_string(),
            Value::Float(f) if f.is_infinite() && *f > 0.0 => "INF".to_string(),
            Value::Float(f) if f.is_infinite() => "-INF".to_string(),
            Value::Float(f) => f.to_string(),
            Value::Date(d) => d.format("%Y-%m-%d").to_string(),
            Value::Time(t) => t.format("%H:%M:%S%.f").to_string(),
            Value::DateTime(dt) => dt.format("%Y-%m-%dT%H:%M:%S%.f").to_string(),
            Value::GMonthDay { month, day } => format!("--{:02}-{:02}", month, day),
            Value::GYear(y) => format!("{:04}", y),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.lexical())
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Integer(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Integer(i64::from(i))
    }
}

impl From<u32> for Value {
    fn from(i: u32) -> Self {
        Value::Integer(i64::from(i))
    }
}

impl From<Decimal> for Value {
    fn from(d: Decimal) -> Self {
        Value::Decimal(d)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<NaiveDate> for Value {
    fn from(d: NaiveDate) -> Self {
        Value::Date(d)
    }
}

impl From<NaiveTime> for Value {
    fn from(t: NaiveTime) -> Self {
        Value::Time(t)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(dt: NaiveDateTime) -> Self {
        Value::DateTime(dt)
    }
}
