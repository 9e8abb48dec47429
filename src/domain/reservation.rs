use chrono::{NaiveDate, NaiveTime};
use thiserror::Error;

pub const MAX_NAME_LEN: usize = 100;
pub const MAX_PHONE_LEN: usize = 20;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ReservationError {
    #[error("{0} is required")]
    Missing(&'static str),
    #[error("{field} must be at most {max} characters")]
    TooLong { field: &'static str, max: usize },
    #[error("Invalid date or time format")]
    InvalidDateTime,
    #[error("guests must be at least 1")]
    InvalidGuests,
    #[error("Cannot cancel past reservations")]
    PastReservation,
}

/// A validated booking, ready to be stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReservationDraft {
    pub name: String,
    pub phone: String,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub guests: i32,
    pub special_requests: Option<String>,
}

impl ReservationDraft {
    pub fn parse(
        name: &str,
        phone: &str,
        date: &str,
        time: &str,
        guests: i32,
        special_requests: Option<&str>,
    ) -> Result<Self, ReservationError> {
        let name = required("name", name, MAX_NAME_LEN)?;
        let phone = required("phone", phone, MAX_PHONE_LEN)?;

        let date = NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d")
            .map_err(|_| ReservationError::InvalidDateTime)?;
        let time = NaiveTime::parse_from_str(time.trim(), "%H:%M")
            .or_else(|_| NaiveTime::parse_from_str(time.trim(), "%H:%M:%S"))
            .map_err(|_| ReservationError::InvalidDateTime)?;

        if guests < 1 {
            return Err(ReservationError::InvalidGuests);
        }

        let special_requests = special_requests
            .map(str::trim)
            .filter(|text| !text.is_empty())
            .map(str::to_string);

        Ok(Self {
            name,
            phone,
            date,
            time,
            guests,
            special_requests,
        })
    }
}

/// Only reservations for today or later may be cancelled.
pub fn ensure_cancellable(date: NaiveDate, today: NaiveDate) -> Result<(), ReservationError> {
    if date >= today {
        Ok(())
    } else {
        Err(ReservationError::PastReservation)
    }
}

fn required(field: &'static str, value: &str, max: usize) -> Result<String, ReservationError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ReservationError::Missing(field));
    }
    if value.chars().count() > max {
        return Err(ReservationError::TooLong { field, max });
    }
    Ok(value.to_string())
}
