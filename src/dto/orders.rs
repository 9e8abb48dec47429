use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    domain::{status::OrderStatus, timeline::TimelineStep},
    models::{Order, OrderItem},
};

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderWithItems {
    pub order: Order,
    pub items: Vec<OrderItem>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderList {
    pub items: Vec<Order>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderTracking {
    pub order: Order,
    pub timeline: Vec<TimelineStep>,
}

/// Public status projection polled by the tracking page.
#[derive(Debug, Serialize, ToSchema)]
pub struct OrderStatusView {
    pub status: OrderStatus,
    pub confirmed_at: Option<DateTime<Utc>>,
    pub preparing_at: Option<DateTime<Utc>>,
    pub ready_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct FavoriteToggle {
    pub status: String,
    pub is_favorite: bool,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ReorderResponse {
    pub status: String,
    #[schema(value_type = String)]
    pub cart_total: Decimal,
    pub cart_count: i64,
    /// Names of lines whose menu item no longer exists.
    pub skipped: Vec<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateOrderStatusRequest {
    /// One of `confirmed`, `preparing`, `ready`, `completed`.
    pub status: String,
}
