use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, Set};
use uuid::Uuid;

use restaurant_orders_api::{
    config::AppConfig,
    db::{create_orm_conn, run_migrations},
    domain::{
        options::{OptionGroup, SelectedOptions},
        status::OrderStatus,
    },
    dto::{
        cart::{AddToCartRequest, CheckoutRequest, UpdateCartItemRequest},
        menu::{CreateMenuItemRequest, UpdateMenuItemRequest},
        orders::UpdateOrderStatusRequest,
        payments::{PAYMENT_SUCCEEDED, PaymentWebhookEvent},
        reservations::ReservationRequest,
    },
    entity::{
        orders::{Column as OrderCol, Entity as Orders},
        users::ActiveModel as UserActive,
    },
    error::AppError,
    middleware::auth::{AuthUser, CUSTOMER_ROLE, STAFF_ROLE},
    models::MenuCategory,
    routes::params::{OrderListQuery, SortOrder},
    services::{cart_service, menu_service, order_service, reservation_service},
    state::AppState,
};

fn database_url() -> Option<String> {
    match std::env::var("TEST_DATABASE_URL").or_else(|_| std::env::var("DATABASE_URL")) {
        Ok(url) => Some(url),
        Err(_) => {
            eprintln!("Skipping test: set TEST_DATABASE_URL or DATABASE_URL to run order flow tests.");
            None
        }
    }
}

async fn setup_state(database_url: &str) -> anyhow::Result<AppState> {
    let orm = create_orm_conn(database_url).await?;
    let state = AppState::new(orm, AppConfig::for_database(database_url));
    run_migrations(&state.pool).await?;
    Ok(state)
}

async fn create_user(state: &AppState, role: &str) -> anyhow::Result<AuthUser> {
    let id = Uuid::new_v4();
    UserActive {
        id: Set(id),
        username: Set(format!("{role}-{id}")),
        email: Set(format!("{id}@example.com")),
        is_staff: Set(role == STAFF_ROLE),
        created_at: Set(Utc::now().into()),
    }
    .insert(&state.orm)
    .await?;
    Ok(AuthUser {
        user_id: id,
        role: role.to_string(),
    })
}

async fn create_menu_item(state: &AppState, staff: &AuthUser, price_cents: i64) -> anyhow::Result<Uuid> {
    let resp = menu_service::create_menu_item(
        state,
        staff,
        CreateMenuItemRequest {
            name: format!("Classic Bruschetta {}", Uuid::new_v4()),
            description: Some("Toasted bread with tomatoes".into()),
            price: Decimal::new(price_cents, 2),
            category: MenuCategory::Starters,
            image: None,
            options: Vec::new(),
        },
    )
    .await?;
    Ok(resp.data.expect("menu item").id)
}

fn add(menu_item_id: Uuid, quantity: i32) -> AddToCartRequest {
    AddToCartRequest {
        menu_item_id,
        quantity,
        options: SelectedOptions::new(),
    }
}

fn checkout_request() -> CheckoutRequest {
    CheckoutRequest {
        pickup_time: "2030-01-01 19:00".into(),
        special_instructions: "No onions".into(),
    }
}

async fn pending_orders(state: &AppState, user: &AuthUser) -> anyhow::Result<u64> {
    let count = Orders::find()
        .filter(OrderCol::UserId.eq(user.user_id))
        .filter(OrderCol::Status.eq(OrderStatus::Pending.as_str()))
        .count(&state.orm)
        .await?;
    Ok(count)
}

#[tokio::test]
async fn cart_checkout_and_kitchen_flow() -> anyhow::Result<()> {
    let Some(url) = database_url() else {
        return Ok(());
    };
    let state = setup_state(&url).await?;
    let customer = create_user(&state, CUSTOMER_ROLE).await?;
    let staff = create_user(&state, STAFF_ROLE).await?;
    let item = create_menu_item(&state, &staff, 29900).await?;

    cart_service::add_to_cart(&state, &customer, add(item, 2)).await?;
    let added = cart_service::add_to_cart(&state, &customer, add(item, 1))
        .await?
        .data
        .expect("add response");
    assert_eq!(added.cart_total.to_string(), "897.00");
    assert_eq!(added.cart_count, 1);

    let cart = cart_service::view_cart(&state, &customer).await?.data.expect("cart");
    assert_eq!(cart.items.len(), 1);
    assert_eq!(cart.items[0].quantity, 3);
    assert_eq!(cart.item_count, 3);
    assert_eq!(cart.total_with_tax.to_string(), "1058.46");
    let line_id = cart.items[0].id;

    let updated = cart_service::update_cart_item(
        &state,
        &customer,
        line_id,
        UpdateCartItemRequest { quantity: 0 },
    )
    .await?
    .data
    .expect("update response");
    assert_eq!(updated.cart_total.to_string(), "0.00");

    let preview = cart_service::preview_cart(&state, &customer).await?.data.expect("preview");
    assert!(preview.items.is_empty());
    assert_eq!(preview.total.to_string(), "0.00");

    let empty = cart_service::checkout(&state, &customer, checkout_request()).await;
    assert!(matches!(empty, Err(AppError::BadRequest(_))));

    cart_service::add_to_cart(&state, &customer, add(item, 1)).await?;
    let placed = cart_service::checkout(&state, &customer, checkout_request())
        .await?
        .data
        .expect("checkout response");
    assert_eq!(placed.status, OrderStatus::Confirmed);
    assert_eq!(placed.total_amount.to_string(), "299.00");
    assert_eq!(placed.total_with_tax.to_string(), "352.82");
    assert_eq!(pending_orders(&state, &customer).await?, 0);

    let forbidden = order_service::advance_status(
        &state,
        &customer,
        placed.order_id,
        UpdateOrderStatusRequest {
            status: "completed".into(),
        },
    )
    .await;
    assert!(matches!(forbidden, Err(AppError::Forbidden)));

    let invalid = order_service::advance_status(
        &state,
        &staff,
        placed.order_id,
        UpdateOrderStatusRequest {
            status: "shipped".into(),
        },
    )
    .await;
    assert!(matches!(invalid, Err(AppError::BadRequest(_))));

    order_service::advance_status(
        &state,
        &staff,
        placed.order_id,
        UpdateOrderStatusRequest {
            status: "completed".into(),
        },
    )
    .await?;

    let tracking = order_service::track_order(&state, &customer, placed.order_id)
        .await?
        .data
        .expect("tracking");
    assert_eq!(tracking.order.status, OrderStatus::Completed);
    assert!(tracking.order.preparing_at.is_none());
    assert!(tracking.order.ready_at.is_none());
    let completed_at = tracking.order.completed_at.expect("completed_at");
    let flags: Vec<bool> = tracking.timeline.iter().map(|step| step.completed).collect();
    assert_eq!(flags, [true, true, false, false, true]);

    let backwards = order_service::advance_status(
        &state,
        &staff,
        placed.order_id,
        UpdateOrderStatusRequest {
            status: "preparing".into(),
        },
    )
    .await;
    assert!(matches!(backwards, Err(AppError::Conflict(_))));

    order_service::advance_status(
        &state,
        &staff,
        placed.order_id,
        UpdateOrderStatusRequest {
            status: "completed".into(),
        },
    )
    .await?;
    let status = order_service::order_status(&state, placed.order_id)
        .await?
        .data
        .expect("status");
    assert_eq!(status.completed_at, Some(completed_at));

    let favorite = order_service::toggle_favorite(&state, &customer, placed.order_id)
        .await?
        .data
        .expect("favorite");
    assert!(favorite.is_favorite);

    let reorder = cart_service::reorder(&state, &customer, placed.order_id)
        .await?
        .data
        .expect("reorder");
    assert_eq!(reorder.cart_total.to_string(), "299.00");
    assert!(reorder.skipped.is_empty());
    assert_eq!(pending_orders(&state, &customer).await?, 1);

    Ok(())
}

#[tokio::test]
async fn checkout_without_cart_is_not_found() -> anyhow::Result<()> {
    let Some(url) = database_url() else {
        return Ok(());
    };
    let state = setup_state(&url).await?;
    let customer = create_user(&state, CUSTOMER_ROLE).await?;

    let result = cart_service::checkout(&state, &customer, checkout_request()).await;
    assert!(matches!(result, Err(AppError::NotFound(_))));

    let orders = Orders::find()
        .filter(OrderCol::UserId.eq(customer.user_id))
        .count(&state.orm)
        .await?;
    assert_eq!(orders, 0);
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_adds_share_one_cart() -> anyhow::Result<()> {
    let Some(url) = database_url() else {
        return Ok(());
    };
    let state = setup_state(&url).await?;
    let customer = create_user(&state, CUSTOMER_ROLE).await?;
    let staff = create_user(&state, STAFF_ROLE).await?;
    let item = create_menu_item(&state, &staff, 15000).await?;

    let tasks: Vec<_> = (0..8)
        .map(|_| {
            let state = state.clone();
            let customer = customer.clone();
            tokio::spawn(async move { cart_service::add_to_cart(&state, &customer, add(item, 1)).await })
        })
        .collect();
    for task in tasks {
        task.await??;
    }

    assert_eq!(pending_orders(&state, &customer).await?, 1);
    let cart = cart_service::view_cart(&state, &customer).await?.data.expect("cart");
    assert_eq!(cart.items.len(), 1);
    assert_eq!(cart.items[0].quantity, 8);
    assert_eq!(cart.total_amount.to_string(), "1200.00");
    Ok(())
}

#[tokio::test]
async fn deleted_menu_item_keeps_order_lines() -> anyhow::Result<()> {
    let Some(url) = database_url() else {
        return Ok(());
    };
    let state = setup_state(&url).await?;
    let customer = create_user(&state, CUSTOMER_ROLE).await?;
    let staff = create_user(&state, STAFF_ROLE).await?;
    let item = create_menu_item(&state, &staff, 29900).await?;

    cart_service::add_to_cart(&state, &customer, add(item, 2)).await?;
    let placed = cart_service::checkout(&state, &customer, checkout_request())
        .await?
        .data
        .expect("checkout response");

    menu_service::delete_menu_item(&state, &staff, item).await?;

    let detail = order_service::get_order(&state, &customer, placed.order_id)
        .await?
        .data
        .expect("order");
    assert_eq!(detail.order.total_amount.to_string(), "598.00");
    assert_eq!(detail.items.len(), 1);
    assert!(!detail.items[0].available);
    assert!(detail.items[0].menu_item_id.is_none());
    assert_eq!(detail.items[0].item_total.to_string(), "598.00");

    let reorder = cart_service::reorder(&state, &customer, placed.order_id)
        .await?
        .data
        .expect("reorder");
    assert_eq!(reorder.skipped.len(), 1);
    assert_eq!(reorder.cart_total.to_string(), "0.00");
    Ok(())
}

#[tokio::test]
async fn other_users_cannot_touch_a_cart() -> anyhow::Result<()> {
    let Some(url) = database_url() else {
        return Ok(());
    };
    let state = setup_state(&url).await?;
    let owner = create_user(&state, CUSTOMER_ROLE).await?;
    let intruder = create_user(&state, CUSTOMER_ROLE).await?;
    let staff = create_user(&state, STAFF_ROLE).await?;
    let item = create_menu_item(&state, &staff, 29900).await?;

    cart_service::add_to_cart(&state, &owner, add(item, 1)).await?;
    cart_service::add_to_cart(&state, &intruder, add(item, 1)).await?;
    let cart = cart_service::view_cart(&state, &owner).await?.data.expect("cart");
    let line_id = cart.items[0].id;

    let result = cart_service::update_cart_item(
        &state,
        &intruder,
        line_id,
        UpdateCartItemRequest { quantity: 5 },
    )
    .await;
    assert!(matches!(result, Err(AppError::NotFound(_))));

    let unknown = cart_service::add_to_cart(&state, &owner, add(Uuid::new_v4(), 1)).await;
    assert!(matches!(unknown, Err(AppError::NotFound(_))));
    Ok(())
}

fn advance(status: &str) -> UpdateOrderStatusRequest {
    UpdateOrderStatusRequest {
        status: status.into(),
    }
}

fn by_status(status: &str) -> OrderListQuery {
    OrderListQuery {
        status: Some(status.into()),
        ..Default::default()
    }
}

#[tokio::test]
async fn order_history_skips_the_cart_and_filters() -> anyhow::Result<()> {
    let Some(url) = database_url() else {
        return Ok(());
    };
    let state = setup_state(&url).await?;
    let customer = create_user(&state, CUSTOMER_ROLE).await?;
    let staff = create_user(&state, STAFF_ROLE).await?;
    let item = create_menu_item(&state, &staff, 29900).await?;

    cart_service::add_to_cart(&state, &customer, add(item, 1)).await?;
    let first = cart_service::checkout(&state, &customer, checkout_request())
        .await?
        .data
        .expect("first order");
    order_service::advance_status(&state, &staff, first.order_id, advance("preparing")).await?;

    cart_service::add_to_cart(&state, &customer, add(item, 2)).await?;
    let second = cart_service::checkout(&state, &customer, checkout_request())
        .await?
        .data
        .expect("second order");

    // An open cart must not show up in the history.
    cart_service::add_to_cart(&state, &customer, add(item, 1)).await?;
    assert_eq!(pending_orders(&state, &customer).await?, 1);

    let history = order_service::list_orders(&state, &customer, OrderListQuery::default()).await?;
    let ids: Vec<Uuid> = history.data.expect("history").items.iter().map(|o| o.id).collect();
    assert_eq!(ids, [second.order_id, first.order_id]);
    assert_eq!(history.meta.expect("meta").total, Some(2));

    let oldest_first = order_service::list_orders(
        &state,
        &customer,
        OrderListQuery {
            sort_order: Some(SortOrder::Asc),
            ..Default::default()
        },
    )
    .await?
    .data
    .expect("history");
    assert_eq!(oldest_first.items[0].id, first.order_id);

    let second_page = order_service::list_orders(
        &state,
        &customer,
        OrderListQuery {
            page: Some(2),
            per_page: Some(1),
            ..Default::default()
        },
    )
    .await?;
    let meta = second_page.meta.expect("meta");
    assert_eq!((meta.page, meta.per_page, meta.total), (Some(2), Some(1), Some(2)));
    let items = second_page.data.expect("page").items;
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].id, first.order_id);

    let preparing = order_service::list_orders(&state, &customer, by_status("preparing"))
        .await?
        .data
        .expect("filtered");
    assert_eq!(preparing.items.len(), 1);
    assert_eq!(preparing.items[0].status, OrderStatus::Preparing);

    let unknown = order_service::list_orders(&state, &customer, by_status("shipped")).await;
    assert!(matches!(unknown, Err(AppError::BadRequest(_))));

    let forbidden = order_service::list_all_orders(&state, &customer, OrderListQuery::default()).await;
    assert!(matches!(forbidden, Err(AppError::Forbidden)));

    let kitchen = order_service::list_all_orders(
        &state,
        &staff,
        OrderListQuery {
            per_page: Some(100),
            ..by_status("preparing")
        },
    )
    .await?
    .data
    .expect("staff listing");
    assert!(kitchen.items.iter().all(|o| o.status == OrderStatus::Preparing));
    assert!(kitchen.items.iter().any(|o| o.id == first.order_id));
    Ok(())
}

fn booking(date: &str, guests: i32) -> ReservationRequest {
    ReservationRequest {
        name: "Asha".into(),
        phone: "9876543210".into(),
        date: date.into(),
        time: "19:30".into(),
        guests,
        special_requests: None,
    }
}

#[tokio::test]
async fn reservations_belong_to_their_owner() -> anyhow::Result<()> {
    let Some(url) = database_url() else {
        return Ok(());
    };
    let state = setup_state(&url).await?;
    let owner = create_user(&state, CUSTOMER_ROLE).await?;
    let stranger = create_user(&state, CUSTOMER_ROLE).await?;

    let upcoming = reservation_service::create_reservation(&state, &owner, booking("2099-06-01", 2))
        .await?
        .data
        .expect("reservation");
    let past = reservation_service::create_reservation(&state, &owner, booking("2000-01-01", 4))
        .await?
        .data
        .expect("reservation");

    let listed = reservation_service::list_reservations(&state, &owner)
        .await?
        .data
        .expect("list");
    let ids: Vec<Uuid> = listed.items.iter().map(|r| r.id).collect();
    assert_eq!(ids, [upcoming.id, past.id]);

    let peek = reservation_service::get_reservation(&state, &stranger, upcoming.id).await;
    assert!(matches!(peek, Err(AppError::NotFound(_))));
    let hijack =
        reservation_service::update_reservation(&state, &stranger, upcoming.id, booking("2099-06-02", 8)).await;
    assert!(matches!(hijack, Err(AppError::NotFound(_))));
    let cancel_other = reservation_service::cancel_reservation(&state, &stranger, upcoming.id).await;
    assert!(matches!(cancel_other, Err(AppError::NotFound(_))));

    let updated =
        reservation_service::update_reservation(&state, &owner, upcoming.id, booking("2099-06-02", 6))
            .await?
            .data
            .expect("updated");
    assert_eq!(updated.guests, 6);
    assert_eq!(updated.date.to_string(), "2099-06-02");

    let malformed =
        reservation_service::update_reservation(&state, &owner, upcoming.id, booking("02/06/2099", 6)).await;
    assert!(matches!(malformed, Err(AppError::BadRequest(_))));

    let too_late = reservation_service::cancel_reservation(&state, &owner, past.id).await;
    assert!(matches!(too_late, Err(AppError::Conflict(_))));

    reservation_service::cancel_reservation(&state, &owner, upcoming.id).await?;
    let gone = reservation_service::get_reservation(&state, &owner, upcoming.id).await;
    assert!(matches!(gone, Err(AppError::NotFound(_))));
    Ok(())
}

#[tokio::test]
async fn menu_values_beyond_column_limits_are_rejected() -> anyhow::Result<()> {
    let Some(url) = database_url() else {
        return Ok(());
    };
    let state = setup_state(&url).await?;
    let staff = create_user(&state, STAFF_ROLE).await?;

    let request = |name: String, price: Decimal, options: Vec<OptionGroup>| CreateMenuItemRequest {
        name,
        description: None,
        price,
        category: MenuCategory::Mains,
        image: None,
        options,
    };

    let too_expensive = menu_service::create_menu_item(
        &state,
        &staff,
        request(format!("Gold Leaf {}", Uuid::new_v4()), Decimal::new(10_000_000, 0), Vec::new()),
    )
    .await;
    assert!(matches!(too_expensive, Err(AppError::BadRequest(_))));

    let long_name = menu_service::create_menu_item(
        &state,
        &staff,
        request("x".repeat(101), Decimal::new(1000, 2), Vec::new()),
    )
    .await;
    assert!(matches!(long_name, Err(AppError::BadRequest(_))));

    let pricey_option = menu_service::create_menu_item(
        &state,
        &staff,
        request(
            format!("Lobster {}", Uuid::new_v4()),
            Decimal::new(1000, 2),
            vec![OptionGroup {
                name: "Garnish".into(),
                choices: vec!["Caviar".into()],
                required: false,
                additional_cost: Decimal::new(10_000, 0),
            }],
        ),
    )
    .await;
    assert!(matches!(pricey_option, Err(AppError::BadRequest(_))));

    let item = create_menu_item(&state, &staff, 99_999_999).await?;
    let bump = menu_service::update_menu_item(
        &state,
        &staff,
        item,
        UpdateMenuItemRequest {
            name: None,
            description: None,
            price: Some(Decimal::new(100_000_000, 2)),
            category: None,
            image: None,
            options: None,
        },
    )
    .await;
    assert!(matches!(bump, Err(AppError::BadRequest(_))));
    let unchanged = menu_service::get_menu_item(&state, item).await?.data.expect("item");
    assert_eq!(unchanged.price.to_string(), "999999.99");
    Ok(())
}

#[tokio::test]
async fn cart_total_stays_within_the_order_column() -> anyhow::Result<()> {
    let Some(url) = database_url() else {
        return Ok(());
    };
    let state = setup_state(&url).await?;
    let customer = create_user(&state, CUSTOMER_ROLE).await?;
    let staff = create_user(&state, STAFF_ROLE).await?;
    let caviar = create_menu_item(&state, &staff, 99_999_999).await?;
    let truffle = create_menu_item(&state, &staff, 99_999_999).await?;

    let added = cart_service::add_to_cart(&state, &customer, add(caviar, 99))
        .await?
        .data
        .expect("add response");
    assert_eq!(added.cart_total.to_string(), "98999999.01");

    let overflow = cart_service::add_to_cart(&state, &customer, add(truffle, 99)).await;
    assert!(matches!(overflow, Err(AppError::BadRequest(_))));

    let cart = cart_service::view_cart(&state, &customer).await?.data.expect("cart");
    assert_eq!(cart.items.len(), 1);
    assert_eq!(cart.total_amount.to_string(), "98999999.01");
    Ok(())
}

#[tokio::test]
async fn payment_webhook_requires_the_shared_secret() -> anyhow::Result<()> {
    let Some(url) = database_url() else {
        return Ok(());
    };
    let unconfigured = setup_state(&url).await?;
    let state = AppState {
        config: Arc::new(AppConfig {
            payment_webhook_secret: Some("whsec-test".into()),
            ..AppConfig::for_database(&url)
        }),
        ..unconfigured.clone()
    };
    let customer = create_user(&state, CUSTOMER_ROLE).await?;
    let staff = create_user(&state, STAFF_ROLE).await?;
    let item = create_menu_item(&state, &staff, 29900).await?;

    cart_service::add_to_cart(&state, &customer, add(item, 1)).await?;
    let cart = Orders::find()
        .filter(OrderCol::UserId.eq(customer.user_id))
        .filter(OrderCol::Status.eq(OrderStatus::Pending.as_str()))
        .one(&state.orm)
        .await?
        .expect("pending order");
    let paid = || PaymentWebhookEvent {
        event: PAYMENT_SUCCEEDED.into(),
        order_id: cart.id,
    };

    let no_secret_configured =
        order_service::handle_payment_event(&unconfigured, Some("whsec-test"), paid()).await;
    assert!(matches!(no_secret_configured, Err(AppError::Forbidden)));
    let wrong = order_service::handle_payment_event(&state, Some("whsec-tesT"), paid()).await;
    assert!(matches!(wrong, Err(AppError::Forbidden)));
    let missing = order_service::handle_payment_event(&state, None, paid()).await;
    assert!(matches!(missing, Err(AppError::Forbidden)));
    assert_eq!(pending_orders(&state, &customer).await?, 1);

    order_service::handle_payment_event(&state, Some("whsec-test"), paid()).await?;
    // Duplicate deliveries are acknowledged without changes.
    order_service::handle_payment_event(&state, Some("whsec-test"), paid()).await?;

    let status = order_service::order_status(&state, cart.id)
        .await?
        .data
        .expect("status");
    assert_eq!(status.status, OrderStatus::Confirmed);
    assert!(status.confirmed_at.is_some());
    assert_eq!(pending_orders(&state, &customer).await?, 0);
    Ok(())
}
