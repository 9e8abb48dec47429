//! Storage helpers shared by the cart and order services.
//!
//! Every cart operation starts from [`lock_pending_order`] or
//! [`get_or_create_pending_order`] inside a transaction; the row lock on the
//! order serialises concurrent mutations of the same cart.

use chrono::{Duration, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseTransaction, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, Statement, prelude::DateTimeWithTimeZone, sea_query::LockType,
};
use uuid::Uuid;

use crate::{
    domain::{
        cart::{Cart, LineChange, LineItem},
        options::SelectedOptions,
        pricing::total_with_tax,
        status::{OrderEvent, OrderStatus, StatusStamp, transition},
        timeline::OrderTimestamps,
    },
    entity::{
        menu_items::Model as MenuItemModel,
        order_items::{
            ActiveModel as OrderItemActive, Column as OrderItemCol, Entity as OrderItems,
            Model as OrderItemModel,
        },
        orders::{ActiveModel as OrderActive, Column as OrderCol, Entity as Orders, Model as OrderModel},
        MenuItems,
    },
    error::{AppError, AppResult},
    models::{Order, OrderItem},
};

/// A fresh cart is due one hour after it is opened until checkout says otherwise.
const DEFAULT_PICKUP_LEAD_HOURS: i64 = 1;

pub async fn find_pending_order<C: ConnectionTrait>(
    conn: &C,
    user_id: Uuid,
) -> AppResult<Option<OrderModel>> {
    let order = Orders::find()
        .filter(OrderCol::UserId.eq(user_id))
        .filter(OrderCol::Status.eq(OrderStatus::Pending.as_str()))
        .one(conn)
        .await?;
    Ok(order)
}

pub async fn lock_pending_order(
    txn: &DatabaseTransaction,
    user_id: Uuid,
) -> AppResult<Option<OrderModel>> {
    let order = Orders::find()
        .filter(OrderCol::UserId.eq(user_id))
        .filter(OrderCol::Status.eq(OrderStatus::Pending.as_str()))
        .lock(LockType::Update)
        .one(txn)
        .await?;
    Ok(order)
}

/// Returns the user's locked cart, creating it if needed.
///
/// The partial unique index on `(user_id) WHERE status = 'pending'` decides
/// races: a losing insert does nothing and the winner's row is read back.
pub async fn get_or_create_pending_order(
    txn: &DatabaseTransaction,
    user_id: Uuid,
) -> AppResult<OrderModel> {
    if let Some(order) = lock_pending_order(txn, user_id).await? {
        return Ok(order);
    }

    let pickup_time = Utc::now() + Duration::hours(DEFAULT_PICKUP_LEAD_HOURS);
    let backend = txn.get_database_backend();
    let result = txn
        .execute(Statement::from_sql_and_values(
            backend,
            r#"
            INSERT INTO orders (id, user_id, status, total_amount, pickup_time)
            VALUES ($1, $2, 'pending', 0, $3)
            ON CONFLICT (user_id) WHERE status = 'pending' DO NOTHING
            "#,
            [Uuid::new_v4().into(), user_id.into(), pickup_time.into()],
        ))
        .await?;

    if result.rows_affected() == 0 {
        tracing::debug!(%user_id, "cart created concurrently, reusing it");
    }

    lock_pending_order(txn, user_id)
        .await?
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("pending order missing after insert")))
}

/// Find an order, optionally restricted to its owner, locking it for update.
pub async fn lock_order(
    txn: &DatabaseTransaction,
    id: Uuid,
    owner: Option<Uuid>,
) -> AppResult<OrderModel> {
    let mut finder = Orders::find_by_id(id);
    if let Some(user_id) = owner {
        finder = finder.filter(OrderCol::UserId.eq(user_id));
    }
    finder
        .lock(LockType::Update)
        .one(txn)
        .await?
        .ok_or(AppError::NotFound("Order"))
}

pub async fn find_owned_order<C: ConnectionTrait>(
    conn: &C,
    id: Uuid,
    user_id: Uuid,
) -> AppResult<OrderModel> {
    Orders::find_by_id(id)
        .filter(OrderCol::UserId.eq(user_id))
        .one(conn)
        .await?
        .ok_or(AppError::NotFound("Order"))
}

/// Lines of an order with the menu items they still point at, oldest first.
pub async fn load_order_lines<C: ConnectionTrait>(
    conn: &C,
    order_id: Uuid,
) -> AppResult<Vec<(OrderItemModel, Option<MenuItemModel>)>> {
    let rows = OrderItems::find()
        .filter(OrderItemCol::OrderId.eq(order_id))
        .order_by_asc(OrderItemCol::CreatedAt)
        .order_by_asc(OrderItemCol::Id)
        .find_also_related(MenuItems)
        .all(conn)
        .await?;
    Ok(rows)
}

pub async fn load_cart<C: ConnectionTrait>(conn: &C, order: &OrderModel) -> AppResult<Cart> {
    let lines = load_order_lines(conn, order.id)
        .await?
        .into_iter()
        .map(|(item, menu_item)| line_from_entity(item, menu_item))
        .collect::<AppResult<Vec<_>>>()?;
    Ok(Cart::new(order.id, lines))
}

pub async fn persist_line_change(
    txn: &DatabaseTransaction,
    order_id: Uuid,
    change: &LineChange,
) -> AppResult<()> {
    match change {
        LineChange::Inserted(line) => {
            OrderItemActive {
                id: Set(line.id),
                order_id: Set(order_id),
                menu_item_id: Set(line.menu_item_id),
                item_name: Set(line.item_name.clone()),
                quantity: Set(line.quantity),
                selected_options: Set(serde_json::to_value(&line.selected_options)?),
                item_total: Set(line.item_total),
                created_at: Set(Utc::now().into()),
            }
            .insert(txn)
            .await?;
        }
        LineChange::Updated(line) => {
            OrderItemActive {
                id: Set(line.id),
                quantity: Set(line.quantity),
                selected_options: Set(serde_json::to_value(&line.selected_options)?),
                item_total: Set(line.item_total),
                ..Default::default()
            }
            .update(txn)
            .await?;
        }
        LineChange::Removed(id) => {
            OrderItems::delete_by_id(*id).exec(txn).await?;
        }
    }
    Ok(())
}

/// Store the cart's recomputed total on its order row.
pub async fn save_total(
    txn: &DatabaseTransaction,
    order: OrderModel,
    cart: &Cart,
) -> AppResult<OrderModel> {
    let mut active: OrderActive = order.into();
    active.total_amount = Set(cart.total_amount());
    active.updated_at = Set(Utc::now().into());
    Ok(active.update(txn).await?)
}

/// Apply a lifecycle event, stamping the reached state's timestamp once.
pub async fn apply_event(
    txn: &DatabaseTransaction,
    order: OrderModel,
    event: OrderEvent,
) -> AppResult<OrderModel> {
    let current = parse_status(&order.status)?;
    let step = transition(current, event)?;
    if !step.changes_status(current) {
        return Ok(order);
    }

    let now: DateTimeWithTimeZone = Utc::now().into();
    let mut active: OrderActive = order.clone().into();
    active.status = Set(step.next.as_str().to_string());
    match step.stamp {
        Some(StatusStamp::ConfirmedAt) if order.confirmed_at.is_none() => {
            active.confirmed_at = Set(Some(now));
        }
        Some(StatusStamp::PreparingAt) if order.preparing_at.is_none() => {
            active.preparing_at = Set(Some(now));
        }
        Some(StatusStamp::ReadyAt) if order.ready_at.is_none() => {
            active.ready_at = Set(Some(now));
        }
        Some(StatusStamp::CompletedAt) if order.completed_at.is_none() => {
            active.completed_at = Set(Some(now));
        }
        _ => {}
    }
    active.updated_at = Set(now);

    let updated = active.update(txn).await?;
    tracing::info!(order_id = %updated.id, from = %current, to = %step.next, "order status changed");
    Ok(updated)
}

pub fn parse_status(raw: &str) -> AppResult<OrderStatus> {
    raw.parse::<OrderStatus>()
        .map_err(|err| AppError::Internal(anyhow::anyhow!("stored order has {err}")))
}

pub fn order_from_entity(model: OrderModel) -> AppResult<Order> {
    Ok(Order {
        id: model.id,
        user_id: model.user_id,
        status: parse_status(&model.status)?,
        total_amount: model.total_amount,
        total_with_tax: total_with_tax(model.total_amount),
        special_instructions: model.special_instructions,
        pickup_time: model.pickup_time.with_timezone(&Utc),
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
        confirmed_at: model.confirmed_at.map(|dt| dt.with_timezone(&Utc)),
        preparing_at: model.preparing_at.map(|dt| dt.with_timezone(&Utc)),
        ready_at: model.ready_at.map(|dt| dt.with_timezone(&Utc)),
        completed_at: model.completed_at.map(|dt| dt.with_timezone(&Utc)),
        is_favorite: model.is_favorite,
    })
}

pub fn order_timestamps(order: &Order) -> OrderTimestamps {
    OrderTimestamps {
        created_at: order.created_at,
        confirmed_at: order.confirmed_at,
        preparing_at: order.preparing_at,
        ready_at: order.ready_at,
        completed_at: order.completed_at,
    }
}

pub fn order_item_from_line(order_id: Uuid, line: &LineItem) -> OrderItem {
    OrderItem {
        id: line.id,
        order_id,
        menu_item_id: line.menu_item_id,
        name: line.item_name.clone(),
        available: line.is_available(),
        quantity: line.quantity,
        selected_options: line.selected_options.clone(),
        item_total: line.item_total,
    }
}

pub async fn load_order_items<C: ConnectionTrait>(
    conn: &C,
    order_id: Uuid,
) -> AppResult<Vec<OrderItem>> {
    load_order_lines(conn, order_id)
        .await?
        .into_iter()
        .map(|(item, menu_item)| {
            line_from_entity(item, menu_item).map(|line| order_item_from_line(order_id, &line))
        })
        .collect()
}

fn line_from_entity(item: OrderItemModel, menu_item: Option<MenuItemModel>) -> AppResult<LineItem> {
    let selected_options: SelectedOptions = serde_json::from_value(item.selected_options)?;
    Ok(LineItem {
        id: item.id,
        menu_item_id: item.menu_item_id,
        item_name: item.item_name,
        unit_price: menu_item.map(|menu_item| menu_item.price),
        quantity: item.quantity,
        selected_options,
        item_total: item.item_total,
    })
}
