use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

pub const PAYMENT_SUCCEEDED: &str = "payment_intent.succeeded";

#[derive(Debug, Deserialize, ToSchema)]
pub struct PaymentWebhookEvent {
    pub event: String,
    pub order_id: Uuid,
}
