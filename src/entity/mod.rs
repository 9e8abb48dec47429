pub mod menu_item_options;
pub mod menu_items;
pub mod order_items;
pub mod orders;
pub mod reservations;
pub mod users;

pub use menu_item_options::Entity as MenuItemOptions;
pub use menu_items::Entity as MenuItems;
pub use order_items::Entity as OrderItems;
pub use orders::Entity as Orders;
pub use reservations::Entity as Reservations;
pub use users::Entity as Users;
