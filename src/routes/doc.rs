use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    domain::{
        options::{OptionGroup, OptionValue},
        status::{AdvanceTarget, OrderStatus},
        timeline::TimelineStep,
    },
    dto::{
        cart::{
            AddToCartRequest, AddToCartResponse, CartPreview, CartPreviewItem, CartView,
            CheckoutRequest, CheckoutResponse, UpdateCartItemRequest, UpdateCartResponse,
        },
        menu::{CreateMenuItemRequest, Menu, MenuSection, UpdateMenuItemRequest},
        orders::{
            FavoriteToggle, OrderList, OrderStatusView, OrderTracking, OrderWithItems,
            ReorderResponse, UpdateOrderStatusRequest,
        },
        payments::PaymentWebhookEvent,
        reservations::{ReservationList, ReservationRequest},
    },
    models::{MenuCategory, MenuItem, Order, OrderItem, Reservation},
    response::{ApiResponse, Meta, StatusAck},
    routes::{cart, health, menu, orders, params, payments, reservations, staff},
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        menu::list_menu,
        menu::get_menu_item,
        menu::create_menu_item,
        menu::update_menu_item,
        menu::delete_menu_item,
        cart::view_cart,
        cart::add_to_cart,
        cart::update_cart_item,
        cart::preview_cart,
        cart::checkout,
        orders::list_orders,
        orders::get_order,
        orders::track_order,
        orders::order_status,
        orders::toggle_favorite,
        orders::reorder,
        staff::list_all_orders,
        staff::update_order_status,
        staff::cancel_order,
        payments::payment_webhook,
        reservations::list_reservations,
        reservations::create_reservation,
        reservations::get_reservation,
        reservations::update_reservation,
        reservations::cancel_reservation
    ),
    components(
        schemas(
            MenuCategory,
            MenuItem,
            OptionGroup,
            OptionValue,
            Order,
            OrderItem,
            OrderStatus,
            AdvanceTarget,
            Reservation,
            TimelineStep,
            Menu,
            MenuSection,
            CreateMenuItemRequest,
            UpdateMenuItemRequest,
            AddToCartRequest,
            AddToCartResponse,
            UpdateCartItemRequest,
            UpdateCartResponse,
            CartPreview,
            CartPreviewItem,
            CartView,
            CheckoutRequest,
            CheckoutResponse,
            OrderList,
            OrderWithItems,
            OrderTracking,
            OrderStatusView,
            FavoriteToggle,
            ReorderResponse,
            UpdateOrderStatusRequest,
            PaymentWebhookEvent,
            ReservationRequest,
            ReservationList,
            StatusAck,
            params::Pagination,
            params::SortOrder,
            params::OrderListQuery,
            health::HealthData,
            Meta,
            ApiResponse<Menu>,
            ApiResponse<CartView>,
            ApiResponse<OrderList>,
            ApiResponse<OrderWithItems>,
            ApiResponse<StatusAck>
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Menu", description = "Menu catalog"),
        (name = "Cart", description = "Cart and checkout"),
        (name = "Orders", description = "Order history and tracking"),
        (name = "Staff", description = "Kitchen staff order management"),
        (name = "Payments", description = "Payment provider webhook"),
        (name = "Reservations", description = "Table reservations"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
