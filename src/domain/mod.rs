//! Pure order and cart rules, free of storage and HTTP concerns.

pub mod cart;
pub mod options;
pub mod pickup;
pub mod pricing;
pub mod reservation;
pub mod status;
pub mod timeline;
