use axum::{
    Json, Router,
    extract::{Path, State},
    routing::get,
};
use uuid::Uuid;

use crate::{
    dto::reservations::{ReservationList, ReservationRequest},
    error::AppResult,
    extract::ApiJson,
    middleware::auth::AuthUser,
    models::Reservation,
    response::ApiResponse,
    services::reservation_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_reservations).post(create_reservation))
        .route(
            "/{id}",
            get(get_reservation)
                .put(update_reservation)
                .delete(cancel_reservation),
        )
}

#[utoipa::path(
    get,
    path = "/api/reservations",
    responses(
        (status = 200, description = "Own reservations, latest first", body = ApiResponse<ReservationList>)
    ),
    security(("bearer_auth" = [])),
    tag = "Reservations"
)]
pub async fn list_reservations(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<ReservationList>>> {
    let resp = reservation_service::list_reservations(&state, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/reservations",
    request_body = ReservationRequest,
    responses(
        (status = 200, description = "Reservation booked", body = ApiResponse<Reservation>),
        (status = 400, description = "Invalid reservation")
    ),
    security(("bearer_auth" = [])),
    tag = "Reservations"
)]
pub async fn create_reservation(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(payload): ApiJson<ReservationRequest>,
) -> AppResult<Json<ApiResponse<Reservation>>> {
    let resp = reservation_service::create_reservation(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/reservations/{id}",
    params(("id" = Uuid, Path, description = "Reservation id")),
    responses(
        (status = 200, description = "Reservation", body = ApiResponse<Reservation>),
        (status = 404, description = "Reservation not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Reservations"
)]
pub async fn get_reservation(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Reservation>>> {
    let resp = reservation_service::get_reservation(&state, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    put,
    path = "/api/reservations/{id}",
    params(("id" = Uuid, Path, description = "Reservation id")),
    request_body = ReservationRequest,
    responses(
        (status = 200, description = "Reservation updated", body = ApiResponse<Reservation>),
        (status = 400, description = "Invalid reservation"),
        (status = 404, description = "Reservation not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Reservations"
)]
pub async fn update_reservation(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    ApiJson(payload): ApiJson<ReservationRequest>,
) -> AppResult<Json<ApiResponse<Reservation>>> {
    let resp = reservation_service::update_reservation(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/reservations/{id}",
    params(("id" = Uuid, Path, description = "Reservation id")),
    responses(
        (status = 200, description = "Reservation cancelled"),
        (status = 404, description = "Reservation not found"),
        (status = 409, description = "Reservation is in the past")
    ),
    security(("bearer_auth" = [])),
    tag = "Reservations"
)]
pub async fn cancel_reservation(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = reservation_service::cancel_reservation(&state, &user, id).await?;
    Ok(Json(resp))
}
