use axum::Router;

use crate::state::AppState;

pub mod cart;
pub mod doc;
pub mod health;
pub mod menu;
pub mod orders;
pub mod params;
pub mod payments;
pub mod reservations;
pub mod staff;

// Build the API router without binding state; it will be provided at the top level.
pub fn create_api_router() -> Router<AppState> {
    Router::new()
        .nest("/menu", menu::router())
        .nest("/cart", cart::router())
        .nest("/orders", orders::router())
        .nest("/staff", staff::router())
        .nest("/payments", payments::router())
        .nest("/reservations", reservations::router())
}
