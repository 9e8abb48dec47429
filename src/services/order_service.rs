use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    audit::record_audit,
    domain::{
        status::{AdvanceTarget, OrderEvent, OrderStatus},
        timeline::status_timeline,
    },
    dto::{
        orders::{
            FavoriteToggle, OrderList, OrderStatusView, OrderTracking, OrderWithItems,
            UpdateOrderStatusRequest,
        },
        payments::{PAYMENT_SUCCEEDED, PaymentWebhookEvent},
    },
    entity::orders::{ActiveModel as OrderActive, Column as OrderCol, Entity as Orders},
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_staff},
    response::{ApiResponse, Meta, StatusAck},
    routes::params::{OrderListQuery, SortOrder},
    services::order_store::{
        apply_event, find_owned_order, load_order_items, lock_order, order_from_entity,
        order_timestamps,
    },
    state::AppState,
};

/// The user's order history; the open cart is not part of it.
pub async fn list_orders(
    state: &AppState,
    user: &AuthUser,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    let condition = Condition::all()
        .add(OrderCol::UserId.eq(user.user_id))
        .add(OrderCol::Status.ne(OrderStatus::Pending.as_str()));
    list_with(state, condition, query).await
}

pub async fn list_all_orders(
    state: &AppState,
    user: &AuthUser,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    ensure_staff(user)?;
    list_with(state, Condition::all(), query).await
}

async fn list_with(
    state: &AppState,
    mut condition: Condition,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    let (page, limit, offset) = query.pagination().normalize();
    if let Some(status) = query.status.as_deref().filter(|s| !s.is_empty()) {
        let status = status.parse::<OrderStatus>()?;
        condition = condition.add(OrderCol::Status.eq(status.as_str()));
    }

    let sort_order = query.sort_order.unwrap_or(SortOrder::Desc);

    let mut finder = Orders::find().filter(condition);
    finder = match sort_order {
        SortOrder::Asc => finder.order_by_asc(OrderCol::CreatedAt),
        SortOrder::Desc => finder.order_by_desc(OrderCol::CreatedAt),
    };

    let total = finder.clone().count(&state.orm).await? as i64;

    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(order_from_entity)
        .collect::<AppResult<Vec<_>>>()?;

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success("Ok", OrderList { items }, Some(meta)))
}

pub async fn get_order(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<OrderWithItems>> {
    let order = find_owned_order(&state.orm, id, user.user_id).await?;
    let items = load_order_items(&state.orm, order.id).await?;
    Ok(ApiResponse::success(
        "Order",
        OrderWithItems {
            order: order_from_entity(order)?,
            items,
        },
        None,
    ))
}

pub async fn track_order(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<OrderTracking>> {
    let order = order_from_entity(find_owned_order(&state.orm, id, user.user_id).await?)?;
    let timeline = status_timeline(&order_timestamps(&order));
    Ok(ApiResponse::success(
        "Order tracking",
        OrderTracking { order, timeline },
        None,
    ))
}

/// Unauthenticated status poll used by the tracking page.
pub async fn order_status(state: &AppState, id: Uuid) -> AppResult<ApiResponse<OrderStatusView>> {
    let order = Orders::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound("Order"))?;
    let order = order_from_entity(order)?;
    Ok(ApiResponse::success(
        "Order status",
        OrderStatusView {
            status: order.status,
            confirmed_at: order.confirmed_at,
            preparing_at: order.preparing_at,
            ready_at: order.ready_at,
            completed_at: order.completed_at,
        },
        None,
    ))
}

pub async fn toggle_favorite(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<FavoriteToggle>> {
    let txn = state.orm.begin().await?;
    let order = lock_order(&txn, id, Some(user.user_id)).await?;
    let is_favorite = !order.is_favorite;

    let mut active: OrderActive = order.into();
    active.is_favorite = Set(is_favorite);
    active.update(&txn).await?;
    txn.commit().await?;

    Ok(ApiResponse::success(
        "Favorite updated",
        FavoriteToggle {
            status: "success".to_string(),
            is_favorite,
        },
        None,
    ))
}

pub async fn advance_status(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateOrderStatusRequest,
) -> AppResult<ApiResponse<StatusAck>> {
    ensure_staff(user)?;
    let target = payload
        .status
        .parse::<AdvanceTarget>()
        .map_err(|_| AppError::BadRequest("Invalid order status".into()))?;

    let txn = state.orm.begin().await?;
    let order = lock_order(&txn, id, None).await?;
    let order = apply_event(&txn, order, OrderEvent::Advance(target)).await?;
    txn.commit().await?;

    record_audit(
        &state.pool,
        Some(user.user_id),
        "order_status",
        "orders",
        serde_json::json!({ "order_id": order.id, "status": order.status }),
    )
    .await;

    Ok(ApiResponse::success("Order status updated", StatusAck::success(), None))
}

pub async fn cancel_order(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<StatusAck>> {
    ensure_staff(user)?;

    let txn = state.orm.begin().await?;
    let order = lock_order(&txn, id, None).await?;
    let order = apply_event(&txn, order, OrderEvent::Cancel).await?;
    txn.commit().await?;

    record_audit(
        &state.pool,
        Some(user.user_id),
        "order_cancel",
        "orders",
        serde_json::json!({ "order_id": order.id }),
    )
    .await;

    Ok(ApiResponse::success("Order cancelled", StatusAck::success(), None))
}

/// Applies a payment provider notification. The shared secret is compared
/// against `PAYMENT_WEBHOOK_SECRET` in constant time; without one configured
/// every call is refused.
pub async fn handle_payment_event(
    state: &AppState,
    secret: Option<&str>,
    event: PaymentWebhookEvent,
) -> AppResult<ApiResponse<StatusAck>> {
    let expected = state
        .config
        .payment_webhook_secret
        .as_deref()
        .ok_or(AppError::Forbidden)?;
    let matches = secret.is_some_and(|secret| {
        constant_time_eq::constant_time_eq(secret.as_bytes(), expected.as_bytes())
    });
    if !matches {
        tracing::warn!(order_id = %event.order_id, "payment webhook with bad secret");
        return Err(AppError::Forbidden);
    }

    if event.event != PAYMENT_SUCCEEDED {
        tracing::debug!(event = %event.event, "ignoring payment event");
        return Ok(ApiResponse::success("Event ignored", StatusAck::success(), None));
    }

    let txn = state.orm.begin().await?;
    let order = lock_order(&txn, event.order_id, None).await?;
    let order = apply_event(&txn, order, OrderEvent::PaymentSucceeded).await?;
    txn.commit().await?;

    record_audit(
        &state.pool,
        order.user_id,
        "payment_succeeded",
        "orders",
        serde_json::json!({ "order_id": order.id }),
    )
    .await;

    Ok(ApiResponse::success("Payment recorded", StatusAck::success(), None))
}
