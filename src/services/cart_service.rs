use chrono::Utc;
use sea_orm::{ActiveModelTrait, Set, TransactionTrait};
use uuid::Uuid;

use crate::{
    audit::record_audit,
    domain::{
        cart::Cart,
        pickup::{parse_pickup_time, suggested_pickup_time},
        pricing::{TAX_RATE, tax_amount, total_with_tax, zero},
        status::{OrderEvent, OrderStatus},
    },
    dto::{
        cart::{
            AddToCartRequest, AddToCartResponse, CartPreview, CartPreviewItem, CartView,
            CheckoutRequest, CheckoutResponse, UpdateCartItemRequest, UpdateCartResponse,
        },
        orders::ReorderResponse,
    },
    entity::orders::ActiveModel as OrderActive,
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    response::{ApiResponse, Meta},
    services::{
        menu_service::catalog_entry,
        order_store::{
            apply_event, find_owned_order, find_pending_order, get_or_create_pending_order,
            load_cart, load_order_lines, lock_pending_order, order_from_entity,
            order_item_from_line, parse_status, persist_line_change, save_total,
        },
    },
    state::AppState,
};

pub async fn add_to_cart(
    state: &AppState,
    user: &AuthUser,
    payload: AddToCartRequest,
) -> AppResult<ApiResponse<AddToCartResponse>> {
    if payload.quantity < 1 {
        return Err(AppError::BadRequest(
            "quantity must be greater than 0".to_string(),
        ));
    }

    let txn = state.orm.begin().await?;

    let entry = catalog_entry(&txn, payload.menu_item_id)
        .await?
        .ok_or(AppError::NotFound("Menu item"))?;

    let order = get_or_create_pending_order(&txn, user.user_id).await?;
    let mut cart = load_cart(&txn, &order).await?;
    let change = cart.add_item(&entry, payload.quantity, payload.options)?;
    persist_line_change(&txn, order.id, &change).await?;
    save_total(&txn, order, &cart).await?;

    txn.commit().await?;

    record_audit(
        &state.pool,
        Some(user.user_id),
        "cart_add",
        "order_items",
        serde_json::json!({
            "order_id": cart.order_id(),
            "menu_item_id": entry.id,
            "quantity": payload.quantity,
        }),
    )
    .await;

    Ok(ApiResponse::success(
        "Added to cart",
        AddToCartResponse {
            status: "success".to_string(),
            cart_total: cart.total_amount(),
            cart_count: cart.line_count() as i64,
        },
        None,
    ))
}

pub async fn update_cart_item(
    state: &AppState,
    user: &AuthUser,
    item_id: Uuid,
    payload: UpdateCartItemRequest,
) -> AppResult<ApiResponse<UpdateCartResponse>> {
    let txn = state.orm.begin().await?;

    let order = lock_pending_order(&txn, user.user_id)
        .await?
        .ok_or(AppError::NotFound("Cart item"))?;
    let mut cart = load_cart(&txn, &order).await?;
    let change = cart.set_quantity(item_id, payload.quantity)?;
    persist_line_change(&txn, order.id, &change).await?;
    save_total(&txn, order, &cart).await?;

    txn.commit().await?;

    Ok(ApiResponse::success(
        "Cart updated",
        UpdateCartResponse {
            status: "success".to_string(),
            cart_total: cart.total_amount(),
        },
        None,
    ))
}

pub async fn view_cart(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<CartView>> {
    let suggested = Some(suggested_pickup_time(Utc::now(), state.config.utc_offset));

    let Some(order) = find_pending_order(&state.orm, user.user_id).await? else {
        let total = zero();
        return Ok(ApiResponse::success(
            "Cart",
            CartView {
                order_id: None,
                items: Vec::new(),
                item_count: 0,
                total_amount: total,
                tax_rate: TAX_RATE,
                tax_amount: tax_amount(total),
                total_with_tax: total_with_tax(total),
                suggested_pickup_time: suggested,
            },
            Some(Meta::empty()),
        ));
    };

    let cart = load_cart(&state.orm, &order).await?;
    let total = cart.total_amount();
    let items = cart
        .lines()
        .iter()
        .map(|line| order_item_from_line(order.id, line))
        .collect();

    Ok(ApiResponse::success(
        "Cart",
        CartView {
            order_id: Some(order.id),
            items,
            item_count: cart.item_count(),
            total_amount: total,
            tax_rate: TAX_RATE,
            tax_amount: tax_amount(total),
            total_with_tax: total_with_tax(total),
            suggested_pickup_time: suggested,
        },
        Some(Meta::empty()),
    ))
}

pub async fn preview_cart(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<CartPreview>> {
    let preview = match find_pending_order(&state.orm, user.user_id).await? {
        Some(order) => {
            let cart = load_cart(&state.orm, &order).await?;
            CartPreview {
                items: cart
                    .lines()
                    .iter()
                    .map(|line| CartPreviewItem {
                        name: line.item_name.clone(),
                        quantity: line.quantity,
                        total: line.item_total,
                    })
                    .collect(),
                total: cart.total_amount(),
            }
        }
        None => CartPreview {
            items: Vec::new(),
            total: zero(),
        },
    };

    Ok(ApiResponse::success("Cart preview", preview, None))
}

pub async fn checkout(
    state: &AppState,
    user: &AuthUser,
    payload: CheckoutRequest,
) -> AppResult<ApiResponse<CheckoutResponse>> {
    let pickup_time = parse_pickup_time(&payload.pickup_time, state.config.utc_offset)?;

    let txn = state.orm.begin().await?;

    let order = lock_pending_order(&txn, user.user_id)
        .await?
        .ok_or(AppError::NotFound("Cart"))?;
    let cart = load_cart(&txn, &order).await?;
    if cart.is_empty() {
        return Err(AppError::BadRequest("Cart is empty".into()));
    }

    let mut active: OrderActive = order.into();
    active.pickup_time = Set(pickup_time.into());
    active.special_instructions = Set(payload.special_instructions.trim().to_string());
    active.total_amount = Set(cart.total_amount());
    let order = active.update(&txn).await?;
    let order = apply_event(&txn, order, OrderEvent::Checkout).await?;

    txn.commit().await?;

    record_audit(
        &state.pool,
        Some(user.user_id),
        "checkout",
        "orders",
        serde_json::json!({ "order_id": order.id, "total_amount": order.total_amount }),
    )
    .await;

    let order = order_from_entity(order)?;
    Ok(ApiResponse::success(
        "Order placed",
        CheckoutResponse {
            order_id: order.id,
            status: order.status,
            total_amount: order.total_amount,
            total_with_tax: order.total_with_tax,
            pickup_time: order.pickup_time,
        },
        Some(Meta::empty()),
    ))
}

/// Copies a past order's lines into the current cart through the add-item path.
pub async fn reorder(
    state: &AppState,
    user: &AuthUser,
    order_id: Uuid,
) -> AppResult<ApiResponse<ReorderResponse>> {
    let txn = state.orm.begin().await?;

    let source = find_owned_order(&txn, order_id, user.user_id).await?;
    if parse_status(&source.status)? == OrderStatus::Pending {
        return Err(AppError::Conflict("Cannot reorder the current cart".into()));
    }
    let source_lines = load_order_lines(&txn, source.id).await?;

    let order = get_or_create_pending_order(&txn, user.user_id).await?;
    let mut cart: Cart = load_cart(&txn, &order).await?;
    let mut skipped = Vec::new();

    for (line, _) in source_lines {
        let entry = match line.menu_item_id {
            Some(menu_item_id) => catalog_entry(&txn, menu_item_id).await?,
            None => None,
        };
        let Some(entry) = entry else {
            skipped.push(line.item_name);
            continue;
        };

        let options = serde_json::from_value(line.selected_options)?;
        match cart.add_item(&entry, line.quantity, options) {
            Ok(change) => persist_line_change(&txn, order.id, &change).await?,
            Err(err) => {
                tracing::debug!(error = %err, item = %line.item_name, "skipping line on reorder");
                skipped.push(line.item_name);
            }
        }
    }

    save_total(&txn, order, &cart).await?;
    txn.commit().await?;

    record_audit(
        &state.pool,
        Some(user.user_id),
        "reorder",
        "orders",
        serde_json::json!({ "source_order_id": order_id, "skipped": skipped.len() }),
    )
    .await;

    Ok(ApiResponse::success(
        "Items added to cart",
        ReorderResponse {
            status: "success".to_string(),
            cart_total: cart.total_amount(),
            cart_count: cart.line_count() as i64,
            skipped,
        },
        None,
    ))
}
