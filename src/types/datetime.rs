use std::fmt;

use crate::error::{Error, Result};
use crate::types::DateTimeKind;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Year assumed for kinds that carry no year (a leap year, so `--02-29` stays valid).
pub const DEFAULT_YEAR: i64 = 1972;

/// Offset added to a timezone in minutes before it is written as an 11-bit field.
pub(crate) const TIMEZONE_OFFSET: i32 = 896;

/// Largest timezone offset in minutes.
pub const TIMEZONE_LIMIT: i16 = 14 * 60;

/// Date/time value of one of the eight [`DateTimeKind`]s.
///
/// Fields the kind does not carry hold their defaults: [`DEFAULT_YEAR`], January,
/// the first day of the month and midnight.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DateTime {
    /// Which fields are significant.
    pub kind: DateTimeKind,
    /// Proleptic Gregorian year; may be negative.
    pub year: i64,
    /// Month, 1 to 12.
    pub month: u8,
    /// Day of the month, starting at 1.
    pub day: u8,
    /// Hour, 0 to 24 (24 only at midnight ending a day).
    pub hour: u8,
    /// Minute, 0 to 59.
    pub minute: u8,
    /// Second, 0 to 59.
    pub second: u8,
    /// Fractional second digits without trailing zeros.
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub fraction: Option<String>,
    /// Timezone offset from UTC in minutes.
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub timezone: Option<i16>,
}

impl DateTime {
    /// A value of `kind` with every field at its default.
    pub fn empty(kind: DateTimeKind) -> Self {
        Self {
            kind,
            year: DEFAULT_YEAR,
            month: 1,
            day: 1,
            hour: 0,
            minute: 0,
            second: 0,
            fraction: None,
            timezone: None,
        }
    }

    /// Parses the lexical form of `kind`, for example `2004-03-01T12:30:00.5+01:00`
    /// for [`DateTimeKind::DateTime`] or `---15` for [`DateTimeKind::GDay`].
    pub fn parse(kind: DateTimeKind, text: &str) -> Result<Self> {
        let fail = || Error::domain(kind.type_name(), text);
        let mut out = Self::empty(kind);
        let mut rest = text.trim();

        let (body, timezone) = split_timezone(rest).ok_or_else(fail)?;
        out.timezone = timezone;
        rest = body;

        if kind.has_year() {
            let negative = rest.starts_with('-');
            let digits_start = usize::from(negative);
            let digits_len = rest[digits_start..]
                .bytes()
                .take_while(u8::is_ascii_digit)
                .count();
            if digits_len < 4 {
                return Err(fail());
            }
            let year: i64 = rest[digits_start..digits_start + digits_len]
                .parse()
                .map_err(|_| fail())?;
            out.year = if negative { -year } else { year };
            rest = &rest[digits_start + digits_len..];
            if kind.has_month() {
                rest = rest.strip_prefix('-').ok_or_else(fail)?;
            }
        } else if kind.has_month() {
            rest = rest.strip_prefix("--").ok_or_else(fail)?;
        } else if kind.has_day() {
            rest = rest.strip_prefix("---").ok_or_else(fail)?;
        }

        if kind.has_month() {
            out.month = take_two(&mut rest).ok_or_else(fail)?;
            if kind.has_day() {
                rest = rest.strip_prefix('-').ok_or_else(fail)?;
            }
        }
        if kind.has_day() {
            out.day = take_two(&mut rest).ok_or_else(fail)?;
        }
        if kind == DateTimeKind::DateTime {
            rest = rest.strip_prefix('T').ok_or_else(fail)?;
        }
        if kind.has_time() {
            out.hour = take_two(&mut rest).ok_or_else(fail)?;
            rest = rest.strip_prefix(':').ok_or_else(fail)?;
            out.minute = take_two(&mut rest).ok_or_else(fail)?;
            rest = rest.strip_prefix(':').ok_or_else(fail)?;
            out.second = take_two(&mut rest).ok_or_else(fail)?;
            if let Some(frac) = rest.strip_prefix('.') {
                if frac.is_empty() || !frac.bytes().all(|b| b.is_ascii_digit()) {
                    return Err(fail());
                }
                out.set_fraction(frac);
                rest = "";
            }
        }
        if !rest.is_empty() {
            return Err(fail());
        }
        out.validate().map_err(|_| fail())?;
        Ok(out)
    }

    /// Sets the fractional second digits, dropping trailing zeros.
    pub fn set_fraction(&mut self, digits: &str) {
        let trimmed = digits.trim_end_matches('0');
        self.fraction = (!trimmed.is_empty()).then(|| trimmed.to_string());
    }

    /// Checks field ranges.
    pub fn validate(&self) -> Result<()> {
        let fail = |what: &str| Error::domain(self.kind.type_name(), format_args!("{what} out of range in {self}"));
        if !(1..=12).contains(&self.month) {
            return Err(fail("month"));
        }
        if self.day < 1 || self.day > days_in_month(self.year, self.month) {
            return Err(fail("day"));
        }
        let midnight = self.hour == 24 && self.minute == 0 && self.second == 0 && self.fraction.is_none();
        if (self.hour > 23 && !midnight) || self.minute > 59 || self.second > 59 {
            return Err(fail("time"));
        }
        if let Some(tz) = self.timezone {
            if tz.abs() > TIMEZONE_LIMIT {
                return Err(fail("timezone"));
            }
        }
        Ok(())
    }

    /// Converts a timezoned value to UTC, carrying across day, month and year
    /// boundaries. Values without a timezone only have an hour of 24 rolled over.
    ///
    /// Fails when the carry leaves the representable year range.
    pub fn normalize(&self) -> Result<Self> {
        let mut out = self.clone();
        let offset = i64::from(self.timezone.unwrap_or(0));
        let minutes = i64::from(self.hour) * 60 + i64::from(self.minute) - offset;
        let day_shift = minutes.div_euclid(24 * 60);
        let minutes = minutes.rem_euclid(24 * 60);
        out.hour = (minutes / 60) as u8;
        out.minute = (minutes % 60) as u8;
        if self.timezone.is_some() {
            out.timezone = Some(0);
        }
        if day_shift != 0 && self.kind != DateTimeKind::Time {
            out.shift_days(day_shift)?;
        }
        Ok(out)
    }

    fn shift_days(&mut self, mut days: i64) -> Result<()> {
        let kind = self.kind;
        let overflow = |value: &Self| {
            Error::domain(kind.type_name(), format_args!("year out of range in {value}"))
        };
        while days > 0 {
            if self.day < days_in_month(self.year, self.month) {
                self.day += 1;
            } else {
                self.day = 1;
                if self.month == 12 {
                    self.year = self.year.checked_add(1).ok_or_else(|| overflow(self))?;
                    self.month = 1;
                } else {
                    self.month += 1;
                }
            }
            days -= 1;
        }
        while days < 0 {
            if self.day > 1 {
                self.day -= 1;
            } else {
                if self.month == 1 {
                    self.year = self.year.checked_sub(1).ok_or_else(|| overflow(self))?;
                    self.month = 12;
                } else {
                    self.month -= 1;
                }
                self.day = days_in_month(self.year, self.month);
            }
            days += 1;
        }
        Ok(())
    }

    pub(crate) fn reset_uncarried(&mut self) {
        let kind = self.kind;
        if !kind.has_year() {
            self.year = DEFAULT_YEAR;
        }
        if !kind.has_month() {
            self.month = 1;
        }
        if !kind.has_day() {
            self.day = 1;
        }
        if !kind.has_time() {
            self.hour = 0;
            self.minute = 0;
            self.second = 0;
            self.fraction = None;
        }
    }
}

fn split_timezone(text: &str) -> Option<(&str, Option<i16>)> {
    if let Some(body) = text.strip_suffix('Z') {
        return Some((body, Some(0)));
    }
    let bytes = text.as_bytes();
    if bytes.len() >= 6 && bytes[bytes.len() - 3] == b':' {
        let sign = bytes[bytes.len() - 6];
        if sign == b'+' || sign == b'-' {
            let tz = &text[text.len() - 5..];
            let hours: i16 = tz[..2].parse().ok()?;
            let minutes: i16 = tz[3..].parse().ok()?;
            if minutes > 59 {
                return None;
            }
            let total = hours * 60 + minutes;
            let total = if sign == b'-' { -total } else { total };
            return Some((&text[..text.len() - 6], Some(total)));
        }
    }
    Some((text, None))
}

fn take_two(rest: &mut &str) -> Option<u8> {
    let digits = rest.get(..2)?;
    if !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    *rest = &rest[2..];
    digits.parse().ok()
}

/// Proleptic Gregorian leap-year rule.
pub fn is_leap_year(year: i64) -> bool {
    year.rem_euclid(4) == 0 && (year.rem_euclid(100) != 0 || year.rem_euclid(400) == 0)
}

/// Number of days in `month` of `year`.
pub fn days_in_month(year: i64, month: u8) -> u8 {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 if is_leap_year(year) => 29,
        2 => 28,
        _ => 0,
    }
}

impl fmt::Display for DateTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = self.kind;
        if kind.has_year() {
            if self.year < 0 {
                write!(f, "-{:04}", self.year.unsigned_abs())?;
            } else {
                write!(f, "{:04}", self.year)?;
            }
            if kind.has_month() {
                f.write_str("-")?;
            }
        } else if kind.has_month() {
            f.write_str("--")?;
        } else if kind.has_day() {
            f.write_str("---")?;
        }
        if kind.has_month() {
            write!(f, "{:02}", self.month)?;
            if kind.has_day() {
                f.write_str("-")?;
            }
        }
        if kind.has_day() {
            write!(f, "{:02}", self.day)?;
        }
        if kind == DateTimeKind::DateTime {
            f.write_str("T")?;
        }
        if kind.has_time() {
            write!(f, "{:02}:{:02}:{:02}", self.hour, self.minute, self.second)?;
            if let Some(fraction) = &self.fraction {
                write!(f, ".{fraction}")?;
            }
        }
        match self.timezone {
            Some(0) => f.write_str("Z"),
            Some(tz) => {
                let sign = if tz < 0 { '-' } else { '+' };
                let abs = tz.unsigned_abs();
                write!(f, "{sign}{:02}:{:02}", abs / 60, abs % 60)
            }
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_every_kind() {
        let cases = [
            (DateTimeKind::DateTime, "2004-03-01T12:30:05.250+01:00"),
            (DateTimeKind::Time, "23:59:59Z"),
            (DateTimeKind::Date, "-0044-03-15"),
            (DateTimeKind::GYearMonth, "1999-12"),
            (DateTimeKind::GYear, "12345"),
            (DateTimeKind::GMonthDay, "--02-29"),
            (DateTimeKind::GDay, "---31-05:30"),
            (DateTimeKind::GMonth, "--11"),
        ];
        for (kind, text) in cases {
            let value = DateTime::parse(kind, text).unwrap();
            let expected = text.replace(".250", ".25");
            assert_eq!(value.to_string(), expected, "{kind:?}");
        }
    }

    #[test]
    fn rejects_out_of_range_fields() {
        assert!(DateTime::parse(DateTimeKind::Date, "2001-02-29").is_err());
        assert!(DateTime::parse(DateTimeKind::Time, "24:00:01").is_err());
        assert!(DateTime::parse(DateTimeKind::GMonth, "--13").is_err());
        assert!(DateTime::parse(DateTimeKind::DateTime, "2001-01-01 10:00:00").is_err());
    }

    #[test]
    fn normalize_carries_into_previous_year() {
        let value = DateTime::parse(DateTimeKind::DateTime, "2000-01-01T00:30:00+01:00").unwrap();
        assert_eq!(value.normalize().unwrap().to_string(), "1999-12-31T23:30:00Z");
    }

    #[test]
    fn normalize_rolls_midnight_forward() {
        let value = DateTime::parse(DateTimeKind::DateTime, "2004-02-28T24:00:00").unwrap();
        assert_eq!(value.normalize().unwrap().to_string(), "2004-02-29T00:00:00");
        let value = DateTime::parse(DateTimeKind::DateTime, "2003-12-31T22:00:00-05:00").unwrap();
        assert_eq!(value.normalize().unwrap().to_string(), "2004-01-01T03:00:00Z");
    }

    #[test]
    fn normalize_fails_past_the_year_range() {
        let latest = DateTime {
            year: i64::MAX,
            month: 12,
            day: 31,
            hour: 23,
            minute: 30,
            timezone: Some(-60),
            ..DateTime::empty(DateTimeKind::DateTime)
        };
        assert!(matches!(latest.normalize(), Err(Error::ValueDomain { .. })));

        let earliest = DateTime {
            year: i64::MIN,
            minute: 30,
            timezone: Some(60),
            ..DateTime::empty(DateTimeKind::DateTime)
        };
        assert!(matches!(earliest.normalize(), Err(Error::ValueDomain { .. })));
    }

    #[test]
    fn normalize_keeps_time_within_a_day() {
        let value = DateTime::parse(DateTimeKind::Time, "01:15:00+02:00").unwrap();
        assert_eq!(value.normalize().unwrap().to_string(), "23:15:00Z");
    }
}
