//! XSD built-in types
//!
//! The primitive and derived built-ins that BuildingSync draws on, with the
//! lexical checks applied to attribute values and text content.

use crate::names::is_valid_ncname;
use chrono::{NaiveDate, NaiveTime};
use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

const TZ: &str = r"(Z|[+-]\d{2}:\d{2})?";

static DATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(&format!(r"^(-?\d{{4,}})-(\d{{2}})-(\d{{2}}){}$", TZ)).unwrap());

static TIME: Lazy<Regex> =
    Lazy::new(|| Regex::new(&format!(r"^(\d{{2}}):(\d{{2}}):(\d{{2}})(\.\d+)?{}$", TZ)).unwrap());

static DATE_TIME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"^(-?\d{{4,}})-(\d{{2}})-(\d{{2}})T(\d{{2}}):(\d{{2}}):(\d{{2}})(\.\d+)?{}$",
        TZ
    ))
    .unwrap()
});

static G_YEAR: Lazy<Regex> = Lazy::new(|| Regex::new(&format!(r"^-?\d{{4,}}{}$", TZ)).unwrap());

static G_YEAR_MONTH: Lazy<Regex> =
    Lazy::new(|| Regex::new(&format!(r"^-?\d{{4,}}-(0[1-9]|1[0-2]){}$", TZ)).unwrap());

static G_MONTH_DAY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"^--(0[1-9]|1[0-2])-(0[1-9]|[12]\d|3[01]){}$", TZ)).unwrap()
});

static G_MONTH: Lazy<Regex> =
    Lazy::new(|| Regex::new(&format!(r"^--(0[1-9]|1[0-2]){}$", TZ)).unwrap());

static G_DAY: Lazy<Regex> =
    Lazy::new(|| Regex::new(&format!(r"^---(0[1-9]|[12]\d|3[01]){}$", TZ)).unwrap());

static DURATION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^-?P(\d+Y)?(\d+M)?(\d+D)?(T(\d+H)?(\d+M)?(\d+(\.\d+)?S)?)?$").unwrap()
});

static HEX_BINARY: Lazy<Regex> = Lazy::new(|| Regex::new(r"^([0-9a-fA-F]{2})*$").unwrap());

static BASE64_BINARY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9+/\s]*={0,2}\s*$").unwrap());

/// An XSD built-in simple type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum BuiltinType {
    /// xs:anySimpleType (also used for xs:anyType text)
    AnySimpleType,
    /// xs:string
    String,
    /// xs:normalizedString
    NormalizedString,
    /// xs:token
    Token,
    /// xs:language
    Language,
    /// xs:Name
    Name,
    /// xs:NCName
    NcName,
    /// xs:ID
    Id,
    /// xs:IDREF
    IdRef,
    /// xs:IDREFS
    IdRefs,
    /// xs:NMTOKEN
    NmToken,
    /// xs:NMTOKENS
    NmTokens,
    /// xs:boolean
    Boolean,
    /// xs:decimal
    Decimal,
    /// xs:integer
    Integer,
    /// xs:nonNegativeInteger
    NonNegativeInteger,
    /// xs:positiveInteger
    PositiveInteger,
    /// xs:nonPositiveInteger
    NonPositiveInteger,
    /// xs:negativeInteger
    NegativeInteger,
    /// xs:long
    Long,
    /// xs:int
    Int,
    /// xs:short
    Short,
    /// xs:byte
    Byte,
    /// xs:unsignedLong
    UnsignedLong,
    /// xs:unsignedInt
    UnsignedInt,
    /// xs:unsignedShort
    UnsignedShort,
    /// xs:unsignedByte
    UnsignedByte,
    /// xs:float
    Float,
    /// xs:double
    Double,
    /// xs:duration
    Duration,
    /// xs:dateTime
    DateTime,
    /// xs:date
    Date,
    /// xs:time
    Time,
    /// xs:gYear
    GYear,
    /// xs:gYearMonth
    GYearMonth,
    /// xs:gMonthDay
    GMonthDay,
    /// xs:gMonth
    GMonth,
    /// xs:gDay
    GDay,
    /// xs:anyURI
    AnyUri,
    /// xs:hexBinary
    HexBinary,
    /// xs:base64Binary
    Base64Binary,
    /// xs:QName
    QName,
}

/// Broad value families, used to match typed text values against a built-in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueFamily {
    /// Any string-like type
    Text,
    /// xs:boolean
    Boolean,
    /// The integer hierarchy
    Integer,
    /// xs:decimal
    Decimal,
    /// xs:float and xs:double
    Float,
    /// xs:date
    Date,
    /// xs:time
    Time,
    /// xs:dateTime
    DateTime,
    /// xs:gYear
    GYear,
    /// xs:gMonthDay
    GMonthDay,
    /// Everything else (durations, binary, partial dates)
    Other,
}

impl BuiltinType {
    /// Look up a built-in by its local name in the XSD namespace
    pub fn from_name(local_name: &str) -> Option<Self> {
        use BuiltinType::*;
        let builtin = match local_name {
            "anySimpleType" | "anyType" | "anyAtomicType" => AnySimpleType,
            "string" => String,
            "normalizedString" => NormalizedString,
            "token" => Token,
            "language" => Language,
            "Name" => Name,
            "NCName" => NcName,
            "ID" => Id,
            "IDREF" => IdRef,
            "IDREFS" => IdRefs,
            "NMTOKEN" => NmToken,
            "NMTOKENS" => NmTokens,
            "boolean" => Boolean,
            "decimal" => Decimal,
            "integer" => Integer,
            "nonNegativeInteger" => NonNegativeInteger,
            "positiveInteger" => PositiveInteger,
            "nonPositiveInteger" => NonPositiveInteger,
            "negativeInteger" => NegativeInteger,
            "long" => Long,
            "int" => Int,
            "short" => Short,
            "byte" => Byte,
            "unsignedLong" => UnsignedLong,
            "unsignedInt" => UnsignedInt,
            "unsignedShort" => UnsignedShort,
            "unsignedByte" => UnsignedByte,
            "float" => Float,
            "double" => Double,
            "duration" => Duration,
            "dateTime" => DateTime,
            "date" => Date,
            "time" => Time,
            "gYear" => GYear,
            "gYearMonth" => GYearMonth,
            "gMonthDay" => GMonthDay,
            "gMonth" => GMonth,
            "gDay" => GDay,
            "anyURI" => AnyUri,
            "hexBinary" => HexBinary,
            "base64Binary" => Base64Binary,
            "QName" => QName,
            _ => return None,
        };
        Some(builtin)
    }

    /// The local name of this built-in in the XSD namespace
    pub fn name(&self) -> &'static str {
        use BuiltinType::*;
        match self {
            AnySimpleType => "anySimpleType",
            String => "string",
            NormalizedString => "normalizedString",
            Token => "token",
            Language => "language",
            Name => "Name",
            NcName => "NCName",
            Id => "ID",
            IdRef => "IDREF",
            IdRefs => "IDREFS",
            NmToken => "NMTOKEN",
            NmTokens => "NMTOKENS",
            Boolean => "boolean",
            Decimal => "decimal",
            Integer => "integer",
            NonNegativeInteger => "nonNegativeInteger",
            PositiveInteger => "positiveInteger",
            NonPositiveInteger => "nonPositiveInteger",
            NegativeInteger => "negativeInteger",
            Long => "long",
            Int => "int",
            Short => "short",
            Byte => "byte",
            UnsignedLong => "unsignedLong",
            UnsignedInt => "unsignedInt",
            UnsignedShort => "unsignedShort",
            UnsignedByte => "unsignedByte",
            Float => "float",
            Double => "double",
            Duration => "duration",
            DateTime => "dateTime",
            Date => "date",
            Time => "time",
            GYear => "gYear",
            GYearMonth => "gYearMonth",
            GMonthDay => "gMonthDay",
            GMonth => "gMonth",
            GDay => "gDay",
            AnyUri => "anyURI",
            HexBinary => "hexBinary",
            Base64Binary => "base64Binary",
            QName => "QName",
        }
    }

    /// The value family this built-in belongs to
    pub fn family(&self) -> ValueFamily {
        use BuiltinType::*;
        match self {
            AnySimpleType | String | NormalizedString | Token | Language | Name | NcName | Id
            | IdRef | IdRefs | NmToken | NmTokens | AnyUri | QName => ValueFamily::Text,
            Boolean => ValueFamily::Boolean,
            Decimal => ValueFamily::Decimal,
            Integer | NonNegativeInteger | PositiveInteger | NonPositiveInteger
            | NegativeInteger | Long | Int | Short | Byte | UnsignedLong | UnsignedInt
            | UnsignedShort | UnsignedByte => ValueFamily::Integer,
            Float | Double => ValueFamily::Float,
            Date => ValueFamily::Date,
            Time => ValueFamily::Time,
            DateTime => ValueFamily::DateTime,
            GYear => ValueFamily::GYear,
            GMonthDay => ValueFamily::GMonthDay,
            Duration | GYearMonth | GMonth | GDay | HexBinary | Base64Binary => {
                ValueFamily::Other
            }
        }
    }

    /// Whether whitespace in values is preserved rather than collapsed
    pub fn preserves_whitespace(&self) -> bool {
        matches!(self, BuiltinType::String | BuiltinType::AnySimpleType)
    }

    /// Inclusive integer bounds for the integer hierarchy
    fn integer_bounds(&self) -> Option<(i128, i128)> {
        use BuiltinType::*;
        let bounds = match self {
            Integer => (i128::MIN, i128::MAX),
            NonNegativeInteger => (0, i128::MAX),
            PositiveInteger => (1, i128::MAX),
            NonPositiveInteger => (i128::MIN, 0),
            NegativeInteger => (i128::MIN, -1),
            Long => (i64::MIN as i128, i64::MAX as i128),
            Int => (i32::MIN as i128, i32::MAX as i128),
            Short => (i16::MIN as i128, i16::MAX as i128),
            Byte => (i8::MIN as i128, i8::MAX as i128),
            UnsignedLong => (0, u64::MAX as i128),
            UnsignedInt => (0, u32::MAX as i128),
            UnsignedShort => (0, u16::MAX as i128),
            UnsignedByte => (0, u8::MAX as i128),
            _ => return None,
        };
        Some(bounds)
    }

    /// Check a value against the lexical space of this built-in
    ///
    /// Returns the reason on failure. Callers normalize whitespace first
    /// (see [`BuiltinType::preserves_whitespace`]).
    pub fn check_lexical(&self, value: &str) -> Result<(), String> {
        use BuiltinType::*;
        let ok = match self {
            AnySimpleType | String | NormalizedString | Token | Language | AnyUri => true,
            Name | NmToken => !value.is_empty() && !value.contains(char::is_whitespace),
            NcName | Id | IdRef => is_valid_ncname(value),
            IdRefs => {
                !value.is_empty() && value.split_whitespace().all(is_valid_ncname)
            }
            NmTokens => !value.trim().is_empty(),
            QName => match value.split_once(':') {
                Some((prefix, local)) => is_valid_ncname(prefix) && is_valid_ncname(local),
                None => is_valid_ncname(value),
            },
            Boolean => matches!(value, "true" | "false" | "1" | "0"),
            Decimal => is_decimal(value),
            Float | Double => is_float(value),
            Date => DATE.captures(value).map_or(false, |c| valid_date(&c[1], &c[2], &c[3])),
            Time => TIME.captures(value).map_or(false, |c| valid_time(&c[1], &c[2], &c[3])),
            DateTime => DATE_TIME.captures(value).map_or(false, |c| {
                valid_date(&c[1], &c[2], &c[3]) && valid_time(&c[4], &c[5], &c[6])
            }),
            GYear => G_YEAR.is_match(value),
            GYearMonth => G_YEAR_MONTH.is_match(value),
            GMonthDay => G_MONTH_DAY.is_match(value),
            GMonth => G_MONTH.is_match(value),
            GDay => G_DAY.is_match(value),
            Duration => DURATION.is_match(value) && !value.ends_with('P') && !value.ends_with('T'),
            HexBinary => HEX_BINARY.is_match(value),
            Base64Binary => BASE64_BINARY.is_match(value),
            Integer | NonNegativeInteger | PositiveInteger | NonPositiveInteger
            | NegativeInteger | Long | Int | Short | Byte | UnsignedLong | UnsignedInt
            | UnsignedShort | UnsignedByte => {
                let (min, max) = self.integer_bounds().unwrap_or((i128::MIN, i128::MAX));
                match parse_integer(value) {
                    Some(n) => n >= min && n <= max,
                    None => false,
                }
            }
        };

        if ok {
            Ok(())
        } else {
            Err(format!("not a valid xs:{} value", self.name()))
        }
    }
}

fn parse_integer(value: &str) -> Option<i128> {
    let digits = value.strip_prefix('+').unwrap_or(value);
    if digits.is_empty() || digits.starts_with(['+', '-']) && digits.len() == 1 {
        return None;
    }
    digits.parse::<i128>().ok()
}

fn is_decimal(value: &str) -> bool {
    if value.is_empty() || value.contains(['e', 'E']) {
        return false;
    }
    let unsigned = value.strip_prefix('+').unwrap_or(value);
    Decimal::from_str(unsigned).is_ok()
}

fn is_float(value: &str) -> bool {
    match value {
        "INF" | "-INF" | "NaN" => true,
        // Rust also accepts "inf"/"nan" spellings that XSD does not
        _ if value.chars().any(|c| c.is_ascii_alphabetic() && c != 'e' && c != 'E') => false,
        _ => value.parse::<f64>().is_ok(),
    }
}

fn valid_date(year: &str, month: &str, day: &str) -> bool {
    let (Ok(year), Ok(month), Ok(day)) = (year.parse::<i32>(), month.parse::<u32>(), day.parse::<u32>())
    else {
        return false;
    };
    NaiveDate::from_ymd_opt(year, month, day).is_some()
}

fn valid_time(hour: &str, minute: &str, second: &str) -> bool {
    let (Ok(hour), Ok(minute), Ok(second)) = (hour.parse::<u32>(), minute.parse::<u32>(), second.parse::<u32>())
    else {
        return false;
    };
    // 24:00:00 is allowed as end-of-day
    (hour == 24 && minute == 0 && second == 0) || NaiveTime::from_hms_opt(hour, minute, second).is_some()
}

impl fmt::Display for BuiltinType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "xs:{}", self.name())
    }
}

impl From<BuiltinType> for String {
    fn from(builtin: BuiltinType) -> Self {
        builtin.name().to_string()
    }
}

impl TryFrom<String> for BuiltinType {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        BuiltinType::from_name(&value).ok_or_else(|| format!("unknown built-in type '{}'", value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_round_trip() {
        for name in ["string", "nonNegativeInteger", "dateTime", "gMonthDay", "ID", "anyURI"] {
            let builtin = BuiltinType::from_name(name).unwrap();
            assert_eq!(builtin.name(), name);
        }
        assert_eq!(BuiltinType::from_name("anyType"), Some(BuiltinType::AnySimpleType));
        assert_eq!(BuiltinType::from_name("FacilityType"), None);
    }

    #[test]
    fn test_boolean() {
        assert!(BuiltinType::Boolean.check_lexical("true").is_ok());
        assert!(BuiltinType::Boolean.check_lexical("0").is_ok());
        assert!(BuiltinType::Boolean.check_lexical("yes").is_err());
    }

    #[test]
    fn test_integer_ranges() {
        assert!(BuiltinType::Integer.check_lexical("-42").is_ok());
        assert!(BuiltinType::Integer.check_lexical("+42").is_ok());
        assert!(BuiltinType::Integer.check_lexical("4.2").is_err());
        assert!(BuiltinType::NonNegativeInteger.check_lexical("0").is_ok());
        assert!(BuiltinType::NonNegativeInteger.check_lexical("-1").is_err());
        assert!(BuiltinType::PositiveInteger.check_lexical("0").is_err());
        assert!(BuiltinType::Int.check_lexical("2147483648").is_err());
        assert!(BuiltinType::UnsignedByte.check_lexical("255").is_ok());
        assert!(BuiltinType::UnsignedByte.check_lexical("256").is_err());
    }

    #[test]
    fn test_decimal_and_float() {
        assert!(BuiltinType::Decimal.check_lexical("3.14").is_ok());
        assert!(BuiltinType::Decimal.check_lexical("-0.5").is_ok());
        assert!(BuiltinType::Decimal.check_lexical("1e5").is_err());
        assert!(BuiltinType::Float.check_lexical("1e5").is_ok());
        assert!(BuiltinType::Float.check_lexical("INF").is_ok());
        assert!(BuiltinType::Float.check_lexical("inf").is_err());
        assert!(BuiltinType::Double.check_lexical("abc").is_err());
    }

    #[test]
    fn test_dates_and_times() {
        assert!(BuiltinType::Date.check_lexical("2019-01-01").is_ok());
        assert!(BuiltinType::Date.check_lexical("2019-02-30").is_err());
        assert!(BuiltinType::Date.check_lexical("2019-01-01Z").is_ok());
        assert!(BuiltinType::Time.check_lexical("00:00:00").is_ok());
        assert!(BuiltinType::Time.check_lexical("25:00:00").is_err());
        assert!(BuiltinType::DateTime.check_lexical("2019-01-01T00:00:00").is_ok());
        assert!(BuiltinType::DateTime.check_lexical("2019-01-01 00:00:00").is_err());
        assert!(BuiltinType::GYear.check_lexical("2019").is_ok());
        assert!(BuiltinType::GMonthDay.check_lexical("--01-01").is_ok());
        assert!(BuiltinType::GMonthDay.check_lexical("01-01").is_err());
    }

    #[test]
    fn test_duration() {
        assert!(BuiltinType::Duration.check_lexical("P1Y2M3DT4H5M6S").is_ok());
        assert!(BuiltinType::Duration.check_lexical("PT15M").is_ok());
        assert!(BuiltinType::Duration.check_lexical("P").is_err());
        assert!(BuiltinType::Duration.check_lexical("PT").is_err());
    }

    #[test]
    fn test_identifiers() {
        assert!(BuiltinType::Id.check_lexical("Facility-1").is_ok());
        assert!(BuiltinType::Id.check_lexical("1Facility").is_err());
        assert!(BuiltinType::IdRefs.check_lexical("Site-1 Building-2").is_ok());
    }

    #[test]
    fn test_serde_uses_xsd_names() {
        let json = serde_json::to_string(&BuiltinType::GMonthDay).unwrap();
        assert_eq!(json, "\"gMonthDay\"");
        let back: BuiltinType = serde_json::from_str("\"nonNegativeInteger\"").unwrap();
        assert_eq!(back, BuiltinType::NonNegativeInteger);
    }
}
