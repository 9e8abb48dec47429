use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;

use crate::{
    audit::record_audit,
    domain::{
        pickup::restaurant_today,
        reservation::{ReservationDraft, ensure_cancellable},
    },
    dto::reservations::{ReservationList, ReservationRequest},
    entity::reservations::{
        ActiveModel, Column, Entity as Reservations, Model as ReservationModel,
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::Reservation,
    response::{ApiResponse, Meta},
    state::AppState,
};

pub async fn create_reservation(
    state: &AppState,
    user: &AuthUser,
    payload: ReservationRequest,
) -> AppResult<ApiResponse<Reservation>> {
    let draft = draft_from_request(&payload)?;

    let reservation = ActiveModel {
        id: Set(Uuid::new_v4()),
        user_id: Set(Some(user.user_id)),
        name: Set(draft.name),
        phone: Set(draft.phone),
        date: Set(draft.date),
        time: Set(draft.time),
        guests: Set(draft.guests),
        special_requests: Set(draft.special_requests),
        created_at: Set(Utc::now().into()),
    }
    .insert(&state.orm)
    .await?;

    record_audit(
        &state.pool,
        Some(user.user_id),
        "reservation_create",
        "reservations",
        serde_json::json!({ "reservation_id": reservation.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Reservation created",
        reservation_from_entity(reservation),
        None,
    ))
}

pub async fn list_reservations(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<ReservationList>> {
    let items: Vec<Reservation> = Reservations::find()
        .filter(Column::UserId.eq(user.user_id))
        .order_by_desc(Column::Date)
        .order_by_desc(Column::Time)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(reservation_from_entity)
        .collect();

    let total = items.len() as i64;
    Ok(ApiResponse::success(
        "Reservations",
        ReservationList { items },
        Some(Meta::new(1, total, total)),
    ))
}

pub async fn get_reservation(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<Reservation>> {
    let reservation = find_owned(&state.orm, id, user.user_id).await?;
    Ok(ApiResponse::success(
        "Reservation",
        reservation_from_entity(reservation),
        None,
    ))
}

pub async fn update_reservation(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: ReservationRequest,
) -> AppResult<ApiResponse<Reservation>> {
    let existing = find_owned(&state.orm, id, user.user_id).await?;
    let draft = draft_from_request(&payload)?;

    let mut active: ActiveModel = existing.into();
    active.name = Set(draft.name);
    active.phone = Set(draft.phone);
    active.date = Set(draft.date);
    active.time = Set(draft.time);
    active.guests = Set(draft.guests);
    active.special_requests = Set(draft.special_requests);
    let reservation = active.update(&state.orm).await?;

    Ok(ApiResponse::success(
        "Reservation updated",
        reservation_from_entity(reservation),
        None,
    ))
}

pub async fn cancel_reservation(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let reservation = find_owned(&state.orm, id, user.user_id).await?;
    let today = restaurant_today(Utc::now(), state.config.utc_offset);
    ensure_cancellable(reservation.date, today)?;

    Reservations::delete_by_id(reservation.id)
        .exec(&state.orm)
        .await?;

    record_audit(
        &state.pool,
        Some(user.user_id),
        "reservation_cancel",
        "reservations",
        serde_json::json!({ "reservation_id": id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Reservation cancelled",
        serde_json::json!({}),
        None,
    ))
}

fn draft_from_request(payload: &ReservationRequest) -> AppResult<ReservationDraft> {
    Ok(ReservationDraft::parse(
        &payload.name,
        &payload.phone,
        &payload.date,
        &payload.time,
        payload.guests,
        payload.special_requests.as_deref(),
    )?)
}

async fn find_owned<C: ConnectionTrait>(
    conn: &C,
    id: Uuid,
    user_id: Uuid,
) -> AppResult<ReservationModel> {
    Reservations::find_by_id(id)
        .filter(Column::UserId.eq(user_id))
        .one(conn)
        .await?
        .ok_or(AppError::NotFound("Reservation"))
}

fn reservation_from_entity(model: ReservationModel) -> Reservation {
    Reservation {
        id: model.id,
        user_id: model.user_id,
        name: model.name,
        phone: model.phone,
        date: model.date,
        time: model.time,
        guests: model.guests,
        special_requests: model.special_requests,
        created_at: model.created_at.with_timezone(&Utc),
    }
}
