//! Typed metadata values
//!
//! A [`Value`] is created empty for a [`TypeId`] and then populated either
//! by a codec (from bytes) or by [`Value::read`] (from text).

use std::collections::BTreeMap;
use std::fmt;

use crate::core::error::{MetaError, MetaResult};
use crate::types::rational::Rational;
use crate::types::type_id::TypeId;
use crate::utils::datetime::{DateValue, TimeValue};

/// Language used for alternative text without an explicit `lang=` prefix
pub const X_DEFAULT: &str = "x-default";

/// Character set marker of an Exif user comment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CharsetId {
    Ascii,
    Unicode,
    Jis,
    #[default]
    Undefined,
}

impl CharsetId {
    fn from_name(name: &str) -> Option<Self> {
        match name {
            "Ascii" => Some(CharsetId::Ascii),
            "Unicode" => Some(CharsetId::Unicode),
            "Jis" => Some(CharsetId::Jis),
            "Undefined" => Some(CharsetId::Undefined),
            _ => None,
        }
    }

    /// The 8-byte code that prefixes the comment in Exif
    pub fn code(self) -> &'static [u8; 8] {
        match self {
            CharsetId::Ascii => b"ASCII\0\0\0",
            CharsetId::Unicode => b"UNICODE\0",
            CharsetId::Jis => b"JIS\0\0\0\0\0",
            CharsetId::Undefined => b"\0\0\0\0\0\0\0\0",
        }
    }

    pub fn from_code(code: &[u8]) -> Self {
        match code {
            b"ASCII\0\0\0" => CharsetId::Ascii,
            b"UNICODE\0" => CharsetId::Unicode,
            b"JIS\0\0\0\0\0" => CharsetId::Jis,
            _ => CharsetId::Undefined,
        }
    }
}

/// Payload of a [`Value`]
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum ValueData {
    Empty,
    Ints(Vec<i64>),
    Floats(Vec<f64>),
    Rationals(Vec<Rational>),
    Bytes(Vec<u8>),
    Text(String),
    Comment(CharsetId, String),
    Date(DateValue),
    Time(TimeValue),
    Items(Vec<String>),
    LangAlt(BTreeMap<String, String>),
}

/// A typed metadata value
#[derive(Debug, Clone, PartialEq)]
pub struct Value {
    type_id: TypeId,
    data: ValueData,
    ok: bool,
}

impl Value {
    /// Create an empty value of the given type
    pub fn create(type_id: TypeId) -> Self {
        Self {
            type_id,
            data: ValueData::Empty,
            ok: true,
        }
    }

    pub(crate) fn with_data(type_id: TypeId, data: ValueData) -> Self {
        Self {
            type_id,
            data,
            ok: true,
        }
    }

    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// Whether the last [`Value::read`] succeeded
    pub fn ok(&self) -> bool {
        self.ok
    }

    pub(crate) fn data(&self) -> &ValueData {
        &self.data
    }

    /// Number of components
    pub fn count(&self) -> usize {
        match &self.data {
            ValueData::Empty => 0,
            ValueData::Ints(v) => v.len(),
            ValueData::Floats(v) => v.len(),
            ValueData::Rationals(v) => v.len(),
            ValueData::Bytes(v) => v.len(),
            ValueData::Text(s) | ValueData::Comment(_, s) => s.len(),
            ValueData::Date(_) | ValueData::Time(_) => 1,
            ValueData::Items(v) => v.len(),
            ValueData::LangAlt(m) => m.len(),
        }
    }

    /// Populate the value from its textual form
    ///
    /// Integer, rational, byte and text types replace their contents; XMP
    /// arrays append one item per call and language alternatives insert or
    /// replace one language. On failure the value is marked not [`ok`](Self::ok).
    pub fn read(&mut self, text: &str) -> MetaResult<()> {
        match self.parse_text(text) {
            Ok(()) => {
                self.ok = true;
                Ok(())
            }
            Err(e) => {
                self.ok = false;
                Err(e)
            }
        }
    }

    fn parse_text(&mut self, text: &str) -> MetaResult<()> {
        let type_id = self.type_id;
        match type_id {
            TypeId::Invalid => {
                return Err(MetaError::BadValue(
                    "Cannot read into a value of invalid type".to_string(),
                ))
            }
            TypeId::UnsignedByte
            | TypeId::UnsignedShort
            | TypeId::UnsignedLong
            | TypeId::SignedByte
            | TypeId::SignedShort
            | TypeId::SignedLong
            | TypeId::TiffIfd => {
                let (min, max) = int_range(type_id);
                let ints = text
                    .split_whitespace()
                    .map(|t| {
                        t.parse::<i64>()
                            .ok()
                            .filter(|v| (min..=max).contains(v))
                            .ok_or_else(|| {
                                MetaError::BadValue(format!("Invalid {} value: {}", type_id, t))
                            })
                    })
                    .collect::<MetaResult<Vec<_>>>()?;
                self.data = ValueData::Ints(ints);
            }
            TypeId::TiffFloat | TypeId::TiffDouble => {
                let floats = text
                    .split_whitespace()
                    .map(|t| {
                        t.parse::<f64>()
                            .map_err(|_| MetaError::BadValue(format!("Invalid float: {}", t)))
                    })
                    .collect::<MetaResult<Vec<_>>>()?;
                self.data = ValueData::Floats(floats);
            }
            TypeId::UnsignedRational | TypeId::SignedRational => {
                let rationals = text
                    .split_whitespace()
                    .map(Rational::parse)
                    .collect::<MetaResult<Vec<_>>>()?;
                if type_id == TypeId::UnsignedRational
                    && rationals.iter().any(|r| r.numerator < 0 || r.denominator < 0)
                {
                    return Err(MetaError::BadValue(format!(
                        "Negative unsigned rational: {}",
                        text
                    )));
                }
                self.data = ValueData::Rationals(rationals);
            }
            TypeId::Undefined => {
                let bytes = text
                    .split_whitespace()
                    .map(|t| {
                        t.parse::<u8>()
                            .map_err(|_| MetaError::BadValue(format!("Invalid byte: {}", t)))
                    })
                    .collect::<MetaResult<Vec<_>>>()?;
                self.data = ValueData::Bytes(bytes);
            }
            TypeId::AsciiString | TypeId::String | TypeId::XmpText => {
                self.data = ValueData::Text(text.to_string());
            }
            TypeId::Comment => {
                let (charset, comment) = parse_comment(text)?;
                self.data = ValueData::Comment(charset, comment);
            }
            TypeId::Date => {
                self.data = ValueData::Date(DateValue::parse(text)?);
            }
            TypeId::Time => {
                self.data = ValueData::Time(TimeValue::parse(text)?);
            }
            TypeId::XmpAlt | TypeId::XmpBag | TypeId::XmpSeq => {
                match &mut self.data {
                    ValueData::Items(items) => items.push(text.to_string()),
                    _ => self.data = ValueData::Items(vec![text.to_string()]),
                }
            }
            TypeId::LangAlt => {
                let (lang, alt) = parse_lang_alt(text)?;
                match &mut self.data {
                    ValueData::LangAlt(map) => {
                        map.insert(lang, alt);
                    }
                    _ => self.data = ValueData::LangAlt(BTreeMap::from([(lang, alt)])),
                }
            }
        }
        Ok(())
    }

    /// Component `n` as an integer
    ///
    /// Floats are truncated and rationals use integer division (zero for a
    /// zero denominator).
    pub fn to_long(&self, n: usize) -> Option<i64> {
        match &self.data {
            ValueData::Ints(v) => v.get(n).copied(),
            ValueData::Floats(v) => v.get(n).map(|f| *f as i64),
            ValueData::Rationals(v) => v.get(n).map(|r| {
                if r.denominator == 0 {
                    0
                } else {
                    r.numerator as i64 / r.denominator as i64
                }
            }),
            ValueData::Bytes(v) => v.get(n).map(|b| *b as i64),
            ValueData::Text(s) if n == 0 => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Component `n` as a rational
    pub fn to_rational(&self, n: usize) -> Option<Rational> {
        match &self.data {
            ValueData::Rationals(v) => v.get(n).copied(),
            ValueData::Ints(v) => v.get(n).map(|i| Rational::new(*i as i32, 1)),
            ValueData::Floats(v) => v.get(n).map(|f| float_to_rational(*f)),
            ValueData::Bytes(v) => v.get(n).map(|b| Rational::new(*b as i32, 1)),
            _ => None,
        }
    }

    /// Textual form of component `n`
    pub fn to_string_at(&self, n: usize) -> Option<String> {
        match &self.data {
            ValueData::Ints(v) => v.get(n).map(|i| i.to_string()),
            ValueData::Floats(v) => v.get(n).map(|f| f.to_string()),
            ValueData::Rationals(v) => v.get(n).map(|r| r.to_string()),
            ValueData::Bytes(v) => v.get(n).map(|b| b.to_string()),
            ValueData::Items(v) => v.get(n).cloned(),
            ValueData::LangAlt(m) => m.values().nth(n).cloned(),
            _ if n == 0 => Some(self.to_string()),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<DateValue> {
        match &self.data {
            ValueData::Date(d) => Some(*d),
            _ => None,
        }
    }

    pub fn as_time(&self) -> Option<TimeValue> {
        match &self.data {
            ValueData::Time(t) => Some(*t),
            _ => None,
        }
    }

    /// Items of an XMP array value
    pub fn items(&self) -> Option<&[String]> {
        match &self.data {
            ValueData::Items(v) => Some(v),
            _ => None,
        }
    }

    /// Language alternatives, keyed by language
    pub fn lang_alt(&self) -> Option<&BTreeMap<String, String>> {
        match &self.data {
            ValueData::LangAlt(m) => Some(m),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.data {
            ValueData::Empty => Ok(()),
            ValueData::Ints(v) => write_joined(f, v.iter(), " "),
            ValueData::Floats(v) => write_joined(f, v.iter(), " "),
            ValueData::Rationals(v) => write_joined(f, v.iter(), " "),
            ValueData::Bytes(v) => write_joined(f, v.iter(), " "),
            ValueData::Text(s) | ValueData::Comment(_, s) => f.write_str(s),
            ValueData::Date(d) => write!(f, "{}", d),
            ValueData::Time(t) => write!(f, "{}", t),
            ValueData::Items(v) => write_joined(f, v.iter(), ", "),
            ValueData::LangAlt(m) => {
                for (i, (lang, text)) in m.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "lang=\"{}\" {}", lang, text)?;
                }
                Ok(())
            }
        }
    }
}

fn write_joined<T: fmt::Display>(
    f: &mut fmt::Formatter<'_>,
    items: impl Iterator<Item = T>,
    sep: &str,
) -> fmt::Result {
    for (i, item) in items.enumerate() {
        if i > 0 {
            f.write_str(sep)?;
        }
        write!(f, "{}", item)?;
    }
    Ok(())
}

fn int_range(type_id: TypeId) -> (i64, i64) {
    match type_id {
        TypeId::UnsignedByte => (0, u8::MAX as i64),
        TypeId::SignedByte => (i8::MIN as i64, i8::MAX as i64),
        TypeId::UnsignedShort => (0, u16::MAX as i64),
        TypeId::SignedShort => (i16::MIN as i64, i16::MAX as i64),
        TypeId::SignedLong => (i32::MIN as i64, i32::MAX as i64),
        _ => (0, u32::MAX as i64),
    }
}

fn float_to_rational(f: f64) -> Rational {
    if f.fract() == 0.0 {
        return Rational::new(f as i32, 1);
    }
    let denominator = 1_000_000;
    Rational::new((f * denominator as f64).round() as i32, denominator)
}

/// Split `charset=Name text` into its charset and comment text
fn parse_comment(text: &str) -> MetaResult<(CharsetId, String)> {
    let Some(rest) = text.strip_prefix("charset=") else {
        return Ok((CharsetId::Undefined, text.to_string()));
    };
    let (name, comment) = rest.split_once(' ').unwrap_or((rest, ""));
    let name = name.trim_matches('"');
    let charset = CharsetId::from_name(name)
        .ok_or_else(|| MetaError::BadValue(format!("Invalid charset: {}", name)))?;
    Ok((charset, comment.to_string()))
}

/// Split `lang="xx-YY" text` into language and text; plain text is `x-default`
fn parse_lang_alt(text: &str) -> MetaResult<(String, String)> {
    let Some(rest) = text.strip_prefix("lang=") else {
        return Ok((X_DEFAULT.to_string(), text.to_string()));
    };

    let (lang, alt) = if let Some(quoted) = rest.strip_prefix('"') {
        let end = quoted
            .find('"')
            .ok_or_else(|| MetaError::BadValue(format!("Unterminated language: {}", text)))?;
        (&quoted[..end], quoted[end + 1..].trim_start())
    } else {
        let (lang, alt) = rest.split_once(' ').unwrap_or((rest, ""));
        (lang, alt)
    };

    if lang.is_empty()
        || !lang
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-')
    {
        return Err(MetaError::BadValue(format!("Invalid language: {}", lang)));
    }
    Ok((lang.to_string(), alt.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_integers() {
        let mut value = Value::create(TypeId::UnsignedShort);
        value.read("32").unwrap();
        assert_eq!(value.count(), 1);
        assert_eq!(value.to_long(0), Some(32));

        value.read("1 2 3").unwrap();
        assert_eq!(value.count(), 3);
        assert_eq!(value.to_string(), "1 2 3");
    }

    #[test]
    fn test_read_integer_out_of_range() {
        let mut value = Value::create(TypeId::UnsignedShort);
        assert!(value.read("70000").is_err());
        assert!(!value.ok());

        let mut value = Value::create(TypeId::SignedByte);
        value.read("-128").unwrap();
        assert!(value.ok());
        assert!(value.read("abc").is_err());
    }

    #[test]
    fn test_read_rationals() {
        let mut value = Value::create(TypeId::UnsignedRational);
        value.read("4/1 22/1 1/3").unwrap();
        assert_eq!(value.count(), 3);
        assert_eq!(value.to_rational(2), Some(Rational::new(1, 3)));
        assert_eq!(value.to_long(0), Some(4));
        assert_eq!(value.to_string(), "4/1 22/1 1/3");

        assert!(value.read("-1/3").is_err());
        let mut signed = Value::create(TypeId::SignedRational);
        signed.read("-1/3").unwrap();
        assert_eq!(signed.to_rational(0), Some(Rational::new(-1, 3)));
    }

    #[test]
    fn test_read_undefined_bytes() {
        let mut value = Value::create(TypeId::Undefined);
        value.read("48 50 49 48").unwrap();
        assert_eq!(value.count(), 4);
        assert_eq!(value.to_string(), "48 50 49 48");
        assert!(value.read("abc").is_err());
    }

    #[test]
    fn test_read_date_and_time() {
        let mut date = Value::create(TypeId::Date);
        date.read("2412-12-06").unwrap();
        assert_eq!(date.as_date(), Some(DateValue::new(2412, 12, 6)));
        assert_eq!(date.to_string(), "2412-12-06");

        let mut time = Value::create(TypeId::Time);
        time.read("11:11:11+00:00").unwrap();
        assert_eq!(time.as_time(), Some(TimeValue::new(11, 11, 11, 0, 0)));
        assert!(time.read("not a time").is_err());
        assert!(!time.ok());
    }

    #[test]
    fn test_read_comment_charset() {
        let mut value = Value::create(TypeId::Comment);
        value.read("charset=Ascii A comment").unwrap();
        assert_eq!(
            value.data(),
            &ValueData::Comment(CharsetId::Ascii, "A comment".to_string())
        );
        assert_eq!(value.to_string(), "A comment");

        value.read("charset=\"Unicode\" Snowman").unwrap();
        assert_eq!(
            value.data(),
            &ValueData::Comment(CharsetId::Unicode, "Snowman".to_string())
        );

        assert!(value.read("charset=Klingon text").is_err());
    }

    #[test]
    fn test_xmp_bag_appends() {
        let mut value = Value::create(TypeId::XmpBag);
        value.read("kw1").unwrap();
        value.read("kw2").unwrap();
        assert_eq!(value.items(), Some(&["kw1".to_string(), "kw2".to_string()][..]));
        assert_eq!(value.to_string_at(1), Some("kw2".to_string()));
        assert_eq!(value.to_string(), "kw1, kw2");
    }

    #[test]
    fn test_lang_alt_read() {
        let mut value = Value::create(TypeId::LangAlt);
        value.read("abc").unwrap();
        value.read("lang=\"ab-CE\" cde").unwrap();
        let map = value.lang_alt().unwrap();
        assert_eq!(map.get("x-default").map(String::as_str), Some("abc"));
        assert_eq!(map.get("ab-CE").map(String::as_str), Some("cde"));

        value.read("lang=\"x-default\" Changed!").unwrap();
        assert_eq!(
            value.lang_alt().unwrap().get("x-default").map(String::as_str),
            Some("Changed!")
        );
        assert_eq!(value.count(), 2);

        assert!(value.read("lang=\"broken text").is_err());
        assert!(value.read("lang=\"\" empty").is_err());
    }

    #[test]
    fn test_invalid_type_rejects_read() {
        let mut value = Value::create(TypeId::Invalid);
        assert!(value.read("anything").is_err());
        assert!(!value.ok());
        assert_eq!(value.count(), 0);
    }

    #[test]
    fn test_float_truncates_to_long() {
        let mut value = Value::create(TypeId::TiffDouble);
        value.read("2.75 -1.5").unwrap();
        assert_eq!(value.to_long(0), Some(2));
        assert_eq!(value.to_long(1), Some(-1));
        assert_eq!(value.to_rational(0), Some(Rational::new(2_750_000, 1_000_000)));
    }
}
