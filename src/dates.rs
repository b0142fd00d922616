//! Relative points in time such as `-7d`, `+2w` or `now`.

use chrono::{DateTime, Duration, Months, SecondsFormat, Utc};
use once_cell::sync::Lazy;
use regex::Regex;

static RELATIVE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([-+]?[0-9]+)([A-Za-z]+)$").expect("relative date pattern is valid")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Unit {
    Milliseconds,
    Seconds,
    Minutes,
    Hours,
    Days,
    Weeks,
    /// Calendar months; quarters and years are multiples.
    Months(u32),
}

impl Unit {
    fn parse(suffix: &str) -> Option<Self> {
        let unit = match suffix {
            "ms" | "millisecond" | "milliseconds" => Unit::Milliseconds,
            "s" | "second" | "seconds" => Unit::Seconds,
            "m" | "minute" | "minutes" => Unit::Minutes,
            "h" | "hour" | "hours" => Unit::Hours,
            "d" | "day" | "days" => Unit::Days,
            "w" | "week" | "weeks" => Unit::Weeks,
            "M" | "month" | "months" => Unit::Months(1),
            "Q" | "quarter" | "quarters" => Unit::Months(3),
            "y" | "year" | "years" => Unit::Months(12),
            _ => return None,
        };
        Some(unit)
    }
}

/// Resolve `now` or `<sign><amount><unit>` against `now`.
///
/// Returns `None` when the text is not a relative date or the result falls
/// outside the representable range.
pub fn resolve(text: &str, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    if text == "now" {
        return Some(now);
    }

    let caps = RELATIVE_RE.captures(text)?;
    let unit = Unit::parse(&caps[2])?;
    let amount: i64 = caps[1].parse().ok()?;

    let delta = match unit {
        Unit::Milliseconds => Duration::try_milliseconds(amount),
        Unit::Seconds => Duration::try_seconds(amount),
        Unit::Minutes => Duration::try_minutes(amount),
        Unit::Hours => Duration::try_hours(amount),
        Unit::Days => Duration::try_days(amount),
        Unit::Weeks => Duration::try_weeks(amount),
        Unit::Months(per) => {
            let months = u32::try_from(amount.unsigned_abs())
                .ok()?
                .checked_mul(per)?;
            return if amount < 0 {
                now.checked_sub_months(Months::new(months))
            } else {
                now.checked_add_months(Months::new(months))
            };
        }
    }?;

    now.checked_add_signed(delta)
}

/// ISO-8601 in UTC with millisecond precision, e.g. `2024-03-01T12:00:00.000Z`.
pub fn to_iso(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 31, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_now_literal() {
        assert_eq!(resolve("now", fixed_now()), Some(fixed_now()));
    }

    #[test]
    fn test_signed_amounts() {
        let now = fixed_now();
        assert_eq!(resolve("-1d", now), Some(now - Duration::days(1)));
        assert_eq!(resolve("+2h", now), Some(now + Duration::hours(2)));
        assert_eq!(resolve("30m", now), Some(now + Duration::minutes(30)));
        assert_eq!(resolve("-500ms", now), Some(now - Duration::milliseconds(500)));
        assert_eq!(resolve("-2weeks", now), Some(now - Duration::weeks(2)));
    }

    #[test]
    fn test_calendar_units_clamp_to_month_end() {
        let now = fixed_now();
        assert_eq!(
            resolve("-1M", now),
            Some(Utc.with_ymd_and_hms(2024, 2, 29, 12, 0, 0).unwrap())
        );
        assert_eq!(
            resolve("1Q", now),
            Some(Utc.with_ymd_and_hms(2024, 6, 30, 12, 0, 0).unwrap())
        );
        assert_eq!(
            resolve("-1y", now),
            Some(Utc.with_ymd_and_hms(2023, 3, 31, 12, 0, 0).unwrap())
        );
    }

    #[test]
    fn test_not_relative() {
        let now = fixed_now();
        for text in ["yesterday", "7", "-7", "2024-01-01", "7x", "d7", ""] {
            assert_eq!(resolve(text, now), None, "{text}");
        }
    }

    #[test]
    fn test_overflow_is_none() {
        assert_eq!(resolve("99999999999999999999d", fixed_now()), None);
        assert_eq!(resolve("9999999999y", fixed_now()), None);
    }

    #[test]
    fn test_iso_format() {
        assert_eq!(to_iso(fixed_now()), "2024-03-31T12:00:00.000Z");
    }
}
