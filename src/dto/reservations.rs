use serde::Deserialize;
use utoipa::ToSchema;

use crate::models::Reservation;

#[derive(Debug, Deserialize, ToSchema)]
pub struct ReservationRequest {
    pub name: String,
    pub phone: String,
    /// `YYYY-MM-DD`
    pub date: String,
    /// `HH:MM`
    pub time: String,
    pub guests: i32,
    pub special_requests: Option<String>,
}

#[derive(Debug, serde::Serialize, ToSchema)]
pub struct ReservationList {
    pub items: Vec<Reservation>,
}
