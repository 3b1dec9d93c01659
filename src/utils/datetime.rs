//! Date and time field values
//!
//! IPTC stores dates as `CCYYMMDD` and times as `HHMMSS±HHMM`; the textual
//! forms accepted by [`Value::read`](crate::types::Value::read) also allow the
//! extended `YYYY-MM-DD` and `HH:MM:SS±HH:MM` variants.

use std::fmt;

use crate::core::error::{MetaError, MetaResult};

/// Calendar date without time zone
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DateValue {
    pub year: i32,
    /// Month (1-12)
    pub month: u32,
    /// Day (1-31)
    pub day: u32,
}

/// Time of day with a time zone offset
///
/// For offsets west of UTC both `tz_hour` and `tz_minute` are negative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TimeValue {
    pub hour: i32,
    pub minute: i32,
    pub second: i32,
    pub tz_hour: i32,
    pub tz_minute: i32,
}

impl DateValue {
    pub fn new(year: i32, month: u32, day: u32) -> Self {
        Self { year, month, day }
    }

    /// Parse `YYYY-MM-DD` or `YYYYMMDD`
    ///
    /// # Example
    ///
    /// ```rust
    /// use metakit::utils::datetime::DateValue;
    ///
    /// let date = DateValue::parse("2412-12-06").unwrap();
    /// assert_eq!(date, DateValue::new(2412, 12, 6));
    /// assert_eq!(DateValue::parse("24121206").unwrap(), date);
    /// ```
    pub fn parse(s: &str) -> MetaResult<Self> {
        let s = s.trim();
        if !s.is_ascii() {
            return Err(MetaError::BadValue(format!("Invalid date, not ASCII: {}", s)));
        }
        let bytes = s.as_bytes();
        let (year, month, day) = match bytes.len() {
            8 => (&s[0..4], &s[4..6], &s[6..8]),
            10 if bytes[4] == b'-' && bytes[7] == b'-' => (&s[0..4], &s[5..7], &s[8..10]),
            _ => {
                return Err(MetaError::BadValue(format!(
                    "Invalid date, expected YYYY-MM-DD: {}",
                    s
                )))
            }
        };

        let year = parse_digits(year, "year")? as i32;
        let month = parse_digits(month, "month")?;
        let day = parse_digits(day, "day")?;
        if !(1..=12).contains(&month) {
            return Err(MetaError::BadValue(format!("Month out of range: {}", month)));
        }
        if !(1..=31).contains(&day) {
            return Err(MetaError::BadValue(format!("Day out of range: {}", day)));
        }

        Ok(Self { year, month, day })
    }

    /// Format as `YYYYMMDD` for IIM datasets
    pub fn to_iptc_string(&self) -> String {
        format!("{:04}{:02}{:02}", self.year, self.month, self.day)
    }
}

impl fmt::Display for DateValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}-{:02}", self.year, self.month, self.day)
    }
}

impl TimeValue {
    pub fn new(hour: i32, minute: i32, second: i32, tz_hour: i32, tz_minute: i32) -> Self {
        Self {
            hour,
            minute,
            second,
            tz_hour,
            tz_minute,
        }
    }

    /// Parse `HH:MM:SS[±HH:MM|Z]` or `HHMMSS[±HHMM]`
    ///
    /// # Example
    ///
    /// ```rust
    /// use metakit::utils::datetime::TimeValue;
    ///
    /// let time = TimeValue::parse("10:30:00-02:15").unwrap();
    /// assert_eq!((time.hour, time.minute), (10, 30));
    /// assert_eq!((time.tz_hour, time.tz_minute), (-2, -15));
    /// ```
    pub fn parse(s: &str) -> MetaResult<Self> {
        let s = s.trim();
        let bad = || MetaError::BadValue(format!("Invalid time, expected HH:MM:SS: {}", s));
        if !s.is_ascii() {
            return Err(bad());
        }

        let (clock, zone) = match s.find(['+', '-', 'Z']) {
            Some(pos) => (&s[..pos], &s[pos..]),
            None => (s, ""),
        };

        let (hour, minute, second) = match clock.len() {
            6 if clock.bytes().all(|b| b.is_ascii_digit()) => {
                (&clock[0..2], &clock[2..4], &clock[4..6])
            }
            8 if clock.as_bytes()[2] == b':' && clock.as_bytes()[5] == b':' => {
                (&clock[0..2], &clock[3..5], &clock[6..8])
            }
            _ => return Err(bad()),
        };
        let hour = parse_digits(hour, "hour")? as i32;
        let minute = parse_digits(minute, "minute")? as i32;
        let second = parse_digits(second, "second")? as i32;
        if hour > 23 || minute > 59 || second > 60 {
            return Err(bad());
        }

        let (tz_hour, tz_minute) = match zone {
            "" | "Z" => (0, 0),
            _ => {
                let sign = if zone.starts_with('-') { -1 } else { 1 };
                let offset = &zone[1..];
                let (h, m) = match offset.len() {
                    4 => (&offset[0..2], &offset[2..4]),
                    5 if offset.as_bytes()[2] == b':' => (&offset[0..2], &offset[3..5]),
                    _ => return Err(bad()),
                };
                let h = parse_digits(h, "timezone hour")? as i32;
                let m = parse_digits(m, "timezone minute")? as i32;
                if h > 23 || m > 59 {
                    return Err(bad());
                }
                (sign * h, sign * m)
            }
        };

        Ok(Self {
            hour,
            minute,
            second,
            tz_hour,
            tz_minute,
        })
    }

    fn zone_parts(&self) -> (char, i32, i32) {
        let sign = if self.tz_hour < 0 || self.tz_minute < 0 {
            '-'
        } else {
            '+'
        };
        (sign, self.tz_hour.abs(), self.tz_minute.abs())
    }

    /// Format as `HHMMSS±HHMM` for IIM datasets
    pub fn to_iptc_string(&self) -> String {
        let (sign, tz_h, tz_m) = self.zone_parts();
        format!(
            "{:02}{:02}{:02}{}{:02}{:02}",
            self.hour, self.minute, self.second, sign, tz_h, tz_m
        )
    }
}

impl fmt::Display for TimeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (sign, tz_h, tz_m) = self.zone_parts();
        write!(
            f,
            "{:02}:{:02}:{:02}{}{:02}:{:02}",
            self.hour, self.minute, self.second, sign, tz_h, tz_m
        )
    }
}

fn parse_digits(s: &str, field: &str) -> MetaResult<u32> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return Err(MetaError::BadValue(format!("Invalid {} value: {}", field, s)));
    }
    s.parse()
        .map_err(|_| MetaError::BadValue(format!("Invalid {} value: {}", field, s)))
}
