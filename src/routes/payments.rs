use axum::{
    Json, Router,
    extract::State,
    http::HeaderMap,
    routing::post,
};

use crate::{
    dto::payments::PaymentWebhookEvent,
    error::AppResult,
    extract::ApiJson,
    response::{ApiResponse, StatusAck},
    services::order_service,
    state::AppState,
};

pub const WEBHOOK_SECRET_HEADER: &str = "x-webhook-secret";

pub fn router() -> Router<AppState> {
    Router::new().route("/webhook", post(payment_webhook))
}

#[utoipa::path(
    post,
    path = "/api/payments/webhook",
    params(("x-webhook-secret" = String, Header, description = "Shared webhook secret")),
    request_body = PaymentWebhookEvent,
    responses(
        (status = 200, description = "Event processed", body = ApiResponse<StatusAck>),
        (status = 403, description = "Bad or missing secret"),
        (status = 404, description = "Order not found")
    ),
    tag = "Payments"
)]
pub async fn payment_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    ApiJson(event): ApiJson<PaymentWebhookEvent>,
) -> AppResult<Json<ApiResponse<StatusAck>>> {
    let secret = headers
        .get(WEBHOOK_SECRET_HEADER)
        .and_then(|value| value.to_str().ok());
    let resp = order_service::handle_payment_event(&state, secret, event).await?;
    Ok(Json(resp))
}
