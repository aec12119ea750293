//! Date / DateTime / Time coercions.
//!
//! Values that already carry calendar information convert between the three
//! kinds directly; integers are Unix timestamps (Time only); everything else
//! is parsed from its canonical text. Unparseable text is the failure case.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, Utc};

use crate::error::CoerceError;
use crate::value::Value;

pub(crate) fn to_date(value: &Value) -> Result<NaiveDate, CoerceError> {
    match value {
        Value::Date(d) => Ok(*d),
        Value::DateTime(dt) => Ok(dt.date_naive()),
        Value::Time(t) => Ok(t.date_naive()),
        other => {
            let text = other.to_string();
            if let Ok(d) = NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d") {
                return Ok(d);
            }
            parse_datetime_text(&text)
                .map(|dt| dt.date_naive())
                .ok_or(CoerceError::DateParse { text })
        }
    }
}

pub(crate) fn to_datetime(value: &Value) -> Result<DateTime<FixedOffset>, CoerceError> {
    match value {
        Value::DateTime(dt) => Ok(*dt),
        Value::Time(t) => Ok(t.fixed_offset()),
        Value::Date(d) => Ok(midnight(*d)),
        other => {
            let text = other.to_string();
            parse_datetime_text(&text).ok_or(CoerceError::DateParse { text })
        }
    }
}

pub(crate) fn to_time(value: &Value) -> Result<DateTime<Utc>, CoerceError> {
    match value {
        Value::Time(t) => Ok(*t),
        Value::Int(i) => DateTime::<Utc>::from_timestamp(*i, 0)
            .ok_or_else(|| CoerceError::DateParse { text: i.to_string() }),
        Value::DateTime(dt) => Ok(dt.with_timezone(&Utc)),
        Value::Date(d) => Ok(midnight(*d).with_timezone(&Utc)),
        Value::Foreign(obj) => match obj.as_timestamp() {
            Some(secs) => DateTime::<Utc>::from_timestamp(secs, 0)
                .ok_or_else(|| CoerceError::DateParse { text: secs.to_string() }),
            None => {
                let text = obj.render();
                parse_datetime_text(&text)
                    .map(|dt| dt.with_timezone(&Utc))
                    .ok_or(CoerceError::DateParse { text })
            }
        },
        other => {
            let text = other.to_string();
            parse_datetime_text(&text)
                .map(|dt| dt.with_timezone(&Utc))
                .ok_or(CoerceError::DateParse { text })
        }
    }
}

fn midnight(d: NaiveDate) -> DateTime<FixedOffset> {
    d.and_time(chrono::NaiveTime::MIN).and_utc().fixed_offset()
}

/// Accepted text forms, tried in order: RFC 3339, `Y-m-d H:M:S` with an
/// offset, RFC 2822, offset-less `Y-m-d H:M:S` (read as UTC), bare date.
fn parse_datetime_text(text: &str) -> Option<DateTime<FixedOffset>> {
    let t = text.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(t) {
        return Some(dt);
    }
    if let Ok(dt) = DateTime::parse_from_str(t, "%Y-%m-%d %H:%M:%S %z") {
        return Some(dt);
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(t) {
        return Some(dt);
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(t, "%Y-%m-%d %H:%M:%S") {
        return Some(naive.and_utc().fixed_offset());
    }
    if let Ok(d) = NaiveDate::parse_from_str(t, "%Y-%m-%d") {
        return Some(midnight(d));
    }
    None
}
