//! Native values
//!
//! [`decode`] turns a typed engine [`Value`] into a [`NativeValue`], the
//! dynamic representation handed to callers.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Duration, NaiveDate, Utc};

use crate::bridge::options::DecodeOptions;
use crate::types::{Rational, TypeId, Value};
use crate::utils::datetime::{DateValue, TimeValue};

/// A decoded metadata value
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
pub enum NativeValue {
    Nil,
    Bool(bool),
    Integer(i64),
    Float(f64),
    Rational(Rational),
    String(String),
    Time(DateTime<Utc>),
    Array(Vec<NativeValue>),
    Hash(BTreeMap<String, NativeValue>),
}

impl NativeValue {
    pub fn is_nil(&self) -> bool {
        matches!(self, NativeValue::Nil)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            NativeValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            NativeValue::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[NativeValue]> {
        match self {
            NativeValue::Array(items) => Some(items),
            _ => None,
        }
    }
}

impl From<&str> for NativeValue {
    fn from(s: &str) -> Self {
        NativeValue::String(s.to_string())
    }
}

impl From<String> for NativeValue {
    fn from(s: String) -> Self {
        NativeValue::String(s)
    }
}

impl From<i64> for NativeValue {
    fn from(i: i64) -> Self {
        NativeValue::Integer(i)
    }
}

impl From<Rational> for NativeValue {
    fn from(r: Rational) -> Self {
        NativeValue::Rational(r)
    }
}

/// Inspection form: `nil`, `"text"`, `(4/1)`, `[1, 2]`, `{"k"=>"v"}`
impl fmt::Display for NativeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NativeValue::Nil => f.write_str("nil"),
            NativeValue::Bool(b) => write!(f, "{}", b),
            NativeValue::Integer(i) => write!(f, "{}", i),
            NativeValue::Float(x) => write!(f, "{:?}", x),
            NativeValue::Rational(r) => write!(f, "({})", r),
            NativeValue::String(s) => write!(f, "{:?}", s),
            NativeValue::Time(t) => write!(f, "{}", t.format("%Y-%m-%d %H:%M:%S UTC")),
            NativeValue::Array(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                f.write_str("]")
            }
            NativeValue::Hash(map) => {
                f.write_str("{")?;
                for (i, (key, value)) in map.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{:?}=>{}", key, value)?;
                }
                f.write_str("}")
            }
        }
    }
}

/// Decode a typed value
///
/// Single-component numeric values become scalars, multi-component ones
/// arrays, and an empty value `Nil`.
pub fn decode(value: &Value, options: &DecodeOptions) -> NativeValue {
    match value.type_id() {
        TypeId::Invalid => NativeValue::Nil,
        TypeId::UnsignedByte
        | TypeId::UnsignedShort
        | TypeId::UnsignedLong
        | TypeId::SignedByte
        | TypeId::SignedShort
        | TypeId::SignedLong
        | TypeId::TiffFloat
        | TypeId::TiffDouble
        | TypeId::TiffIfd => by_count(value, |n| {
            value
                .to_long(n)
                .map_or(NativeValue::Nil, NativeValue::Integer)
        }),
        TypeId::UnsignedRational | TypeId::SignedRational => by_count(value, |n| {
            match value.to_rational(n) {
                Some(r) if options.rational_as_float => NativeValue::Float(r.to_f64()),
                Some(r) => NativeValue::Rational(r),
                None => NativeValue::Nil,
            }
        }),
        TypeId::Date => value
            .as_date()
            .and_then(date_to_utc)
            .map_or(NativeValue::Nil, NativeValue::Time),
        TypeId::Time => value
            .as_time()
            .map(time_to_utc)
            .map_or(NativeValue::Nil, NativeValue::Time),
        TypeId::XmpBag | TypeId::XmpSeq => NativeValue::Array(
            value
                .items()
                .unwrap_or_default()
                .iter()
                .map(|item| NativeValue::String(item.clone()))
                .collect(),
        ),
        TypeId::LangAlt => NativeValue::Hash(
            value
                .lang_alt()
                .map(|alts| {
                    alts.iter()
                        .map(|(lang, text)| (lang.clone(), NativeValue::String(text.clone())))
                        .collect()
                })
                .unwrap_or_default(),
        ),
        TypeId::AsciiString
        | TypeId::String
        | TypeId::Comment
        | TypeId::Undefined
        | TypeId::XmpText
        | TypeId::XmpAlt => NativeValue::String(value.to_string()),
    }
}

fn by_count(value: &Value, component: impl Fn(usize) -> NativeValue) -> NativeValue {
    match value.count() {
        0 => NativeValue::Nil,
        1 => component(0),
        count => NativeValue::Array((0..count).map(component).collect()),
    }
}

/// UTC midnight of the date, or `None` for an impossible calendar date
fn date_to_utc(date: DateValue) -> Option<DateTime<Utc>> {
    NaiveDate::from_ymd_opt(date.year, date.month, date.day)?
        .and_hms_opt(0, 0, 0)
        .map(|dt| dt.and_utc())
}

/// The time of day on 1970-01-01 UTC
///
/// The zone offset is added to the clock fields, not subtracted, and the
/// fields are not clamped: a negative hour gains 24 and a negative minute
/// gains 60, and anything past midnight rolls into the following day.
fn time_to_utc(time: TimeValue) -> DateTime<Utc> {
    let mut hour = time.hour + time.tz_hour;
    let mut minute = time.minute + time.tz_minute;
    if hour < 0 {
        hour += 24;
    }
    if minute < 0 {
        minute += 60;
    }
    DateTime::<Utc>::UNIX_EPOCH
        + Duration::hours(hour as i64)
        + Duration::minutes(minute as i64)
        + Duration::seconds(time.second as i64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    fn read(type_id: TypeId, texts: &[&str]) -> Value {
        let mut value = Value::create(type_id);
        for text in texts {
            value.read(text).unwrap();
        }
        value
    }

    fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> NativeValue {
        NativeValue::Time(Utc.with_ymd_and_hms(y, mo, d, h, mi, s).unwrap())
    }

    #[test]
    fn test_single_integer() {
        let value = read(TypeId::UnsignedShort, &["200"]);
        assert_eq!(decode(&value, &DecodeOptions::default()), NativeValue::Integer(200));
    }

    #[test]
    fn test_integer_array() {
        let value = read(TypeId::Undefined, &["48 50 49 48"]);
        assert_eq!(
            decode(&value, &DecodeOptions::default()),
            NativeValue::String("48 50 49 48".to_string())
        );
        let value = read(TypeId::UnsignedShort, &["1 2 3"]);
        assert_eq!(
            decode(&value, &DecodeOptions::default()),
            NativeValue::Array(vec![1.into(), 2.into(), 3.into()])
        );
    }

    #[test]
    fn test_empty_value_is_nil() {
        let value = Value::create(TypeId::UnsignedLong);
        assert_eq!(decode(&value, &DecodeOptions::default()), NativeValue::Nil);
        let value = Value::create(TypeId::Invalid);
        assert_eq!(decode(&value, &DecodeOptions::default()), NativeValue::Nil);
    }

    #[test]
    fn test_rationals_in_order() {
        let value = read(TypeId::UnsignedRational, &["4/1 22/1 1/3"]);
        assert_eq!(
            decode(&value, &DecodeOptions::default()),
            NativeValue::Array(vec![
                Rational::new(4, 1).into(),
                Rational::new(22, 1).into(),
                Rational::new(1, 3).into(),
            ])
        );
    }

    #[test]
    fn test_rational_as_float() {
        let value = read(TypeId::SignedRational, &["-1/4"]);
        let options = DecodeOptions::default().rational_as_float();
        assert_eq!(decode(&value, &options), NativeValue::Float(-0.25));
    }

    #[test]
    fn test_date_is_utc_midnight() {
        let value = read(TypeId::Date, &["2001-03-15"]);
        assert_eq!(
            decode(&value, &DecodeOptions::default()),
            utc(2001, 3, 15, 0, 0, 0)
        );
    }

    #[test]
    fn test_impossible_date_is_nil() {
        let value = Value::with_data(
            TypeId::Date,
            crate::types::value::ValueData::Date(DateValue::new(2001, 2, 30)),
        );
        assert_eq!(decode(&value, &DecodeOptions::default()), NativeValue::Nil);
    }

    #[test]
    fn test_time_offset_is_added() {
        let value = read(TypeId::Time, &["10:30:00+02:00"]);
        assert_eq!(
            decode(&value, &DecodeOptions::default()),
            utc(1970, 1, 1, 12, 30, 0)
        );
    }

    #[test]
    fn test_time_negative_fields_wrap() {
        let time = TimeValue::new(1, 10, 5, -3, -30);
        // hour -2 becomes 22, minute -20 becomes 40
        assert_eq!(
            NativeValue::Time(time_to_utc(time)),
            utc(1970, 1, 1, 22, 40, 5)
        );
    }

    #[test]
    fn test_time_overflow_rolls_into_next_day() {
        let time = TimeValue::new(23, 50, 0, 2, 30);
        assert_eq!(NativeValue::Time(time_to_utc(time)), utc(1970, 1, 2, 2, 20, 0));
    }

    #[test]
    fn test_xmp_arrays_and_lang_alt() {
        let bag = read(TypeId::XmpBag, &["fish", "custard"]);
        assert_eq!(
            decode(&bag, &DecodeOptions::default()),
            NativeValue::Array(vec!["fish".into(), "custard".into()])
        );

        let title = read(TypeId::LangAlt, &["Pickled"]);
        let mut expected = BTreeMap::new();
        expected.insert("x-default".to_string(), NativeValue::from("Pickled"));
        assert_eq!(
            decode(&title, &DecodeOptions::default()),
            NativeValue::Hash(expected)
        );
    }

    #[test]
    fn test_inspection_form() {
        let mut map = BTreeMap::new();
        map.insert("x-default".to_string(), NativeValue::from("Pickled"));
        assert_eq!(NativeValue::Hash(map).to_string(), r#"{"x-default"=>"Pickled"}"#);
        assert_eq!(
            NativeValue::Array(vec![Rational::new(1, 3).into(), NativeValue::Nil]).to_string(),
            "[(1/3), nil]"
        );
        assert_eq!(
            utc(2412, 12, 6, 0, 0, 0).to_string(),
            "2412-12-06 00:00:00 UTC"
        );
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_serializes_untagged() {
        let mut title = BTreeMap::new();
        title.insert("x-default".to_string(), NativeValue::from("Pickled"));
        let value = NativeValue::Array(vec![
            Rational::new(4, 1).into(),
            NativeValue::Hash(title),
            NativeValue::Integer(32),
            NativeValue::Nil,
            utc(1970, 1, 1, 12, 30, 0),
        ]);
        assert_eq!(
            serde_json::to_string(&value).unwrap(),
            r#"[{"numerator":4,"denominator":1},{"x-default":"Pickled"},32,null,"1970-01-01T12:30:00Z"]"#
        );
        assert_eq!(serde_json::to_string(&TypeId::XmpBag).unwrap(), r#""XmpBag""#);
    }
}
