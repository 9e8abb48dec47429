use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    domain::{options::SelectedOptions, status::OrderStatus},
    models::OrderItem,
};

fn default_quantity() -> i32 {
    1
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AddToCartRequest {
    pub menu_item_id: Uuid,
    #[serde(default = "default_quantity")]
    pub quantity: i32,
    #[serde(default)]
    #[schema(value_type = Object)]
    pub options: SelectedOptions,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AddToCartResponse {
    pub status: String,
    #[schema(value_type = String)]
    pub cart_total: Decimal,
    /// Number of distinct lines in the cart.
    pub cart_count: i64,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateCartItemRequest {
    /// Zero or less removes the line.
    pub quantity: i32,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UpdateCartResponse {
    pub status: String,
    #[schema(value_type = String)]
    pub cart_total: Decimal,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CartPreviewItem {
    pub name: String,
    pub quantity: i32,
    #[schema(value_type = String)]
    pub total: Decimal,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CartPreview {
    pub items: Vec<CartPreviewItem>,
    #[schema(value_type = String)]
    pub total: Decimal,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CartView {
    pub order_id: Option<Uuid>,
    pub items: Vec<OrderItem>,
    /// Sum of quantities.
    pub item_count: i64,
    #[schema(value_type = String)]
    pub total_amount: Decimal,
    #[schema(value_type = String)]
    pub tax_rate: Decimal,
    #[schema(value_type = String)]
    pub tax_amount: Decimal,
    #[schema(value_type = String)]
    pub total_with_tax: Decimal,
    pub suggested_pickup_time: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CheckoutRequest {
    /// RFC 3339, or `YYYY-MM-DD HH:MM` in restaurant local time.
    pub pickup_time: String,
    #[serde(default)]
    pub special_instructions: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CheckoutResponse {
    pub order_id: Uuid,
    pub status: OrderStatus,
    #[schema(value_type = String)]
    pub total_amount: Decimal,
    #[schema(value_type = String)]
    pub total_with_tax: Decimal,
    pub pickup_time: DateTime<Utc>,
}
