use chrono::{
    DateTime, Duration, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc,
};
use thiserror::Error;

pub const OPENING_HOUR: u32 = 11;
pub const CLOSING_HOUR: u32 = 21;

/// Lead time the kitchen needs before a pickup.
pub const PREPARATION_MINUTES: i64 = 30;

const LOCAL_FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S"];

#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid pickup time `{0}`, expected RFC 3339 or YYYY-MM-DD HH:MM")]
pub struct PickupTimeError(pub String);

/// Parses a pickup time. Inputs without an offset are restaurant local time.
pub fn parse_pickup_time(input: &str, offset: FixedOffset) -> Result<DateTime<Utc>, PickupTimeError> {
    let input = input.trim();
    if let Ok(aware) = DateTime::parse_from_rfc3339(input) {
        return Ok(aware.with_timezone(&Utc));
    }

    LOCAL_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(input, format).ok())
        .and_then(|naive| offset.from_local_datetime(&naive).single())
        .map(|local| local.with_timezone(&Utc))
        .ok_or_else(|| PickupTimeError(input.to_string()))
}

/// Earliest sensible pickup: half an hour from now, moved into opening hours.
pub fn suggested_pickup_time(now: DateTime<Utc>, offset: FixedOffset) -> DateTime<Utc> {
    let candidate = now + Duration::minutes(PREPARATION_MINUTES);
    let local = candidate.with_timezone(&offset).naive_local();
    let today = local.date();

    let opening = at_hour(today, OPENING_HOUR);
    let closing = at_hour(today, CLOSING_HOUR);

    let adjusted = if local < opening {
        opening
    } else if local > closing {
        at_hour(today + Duration::days(1), OPENING_HOUR)
    } else {
        return candidate;
    };

    offset
        .from_local_datetime(&adjusted)
        .single()
        .map(|local| local.with_timezone(&Utc))
        .unwrap_or(candidate)
}

/// Calendar date at the restaurant.
pub fn restaurant_today(now: DateTime<Utc>, offset: FixedOffset) -> NaiveDate {
    now.with_timezone(&offset).date_naive()
}

fn at_hour(date: NaiveDate, hour: u32) -> NaiveDateTime {
    date.and_hms_opt(hour, 0, 0)
        .unwrap_or_else(|| date.and_time(NaiveTime::MIN))
}
