//! In-memory cart aggregate.
//!
//! The service layer loads a pending order and its lines inside a
//! transaction, applies one mutation here, and persists the returned
//! [`LineChange`] together with the recomputed total. Every mutator leaves
//! `total_amount` equal to the sum of the line totals.

use rust_decimal::Decimal;
use thiserror::Error;
use uuid::Uuid;

use super::{
    options::{OptionError, OptionGroup, SelectedOptions, merge_options, validate_options},
    pricing::{MAX_LINE_QUANTITY, MAX_ORDER_TOTAL, line_total, round_money, zero},
};

/// The catalog facts a cart line needs about a menu item.
#[derive(Debug, Clone)]
pub struct CatalogEntry {
    pub id: Uuid,
    pub name: String,
    pub price: Decimal,
    pub option_groups: Vec<OptionGroup>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LineItem {
    pub id: Uuid,
    /// `None` once the menu item has been deleted from the catalog.
    pub menu_item_id: Option<Uuid>,
    pub item_name: String,
    /// Current catalog price; `None` when the menu item is gone.
    pub unit_price: Option<Decimal>,
    pub quantity: i32,
    pub selected_options: SelectedOptions,
    pub item_total: Decimal,
}

impl LineItem {
    pub fn is_available(&self) -> bool {
        self.menu_item_id.is_some()
    }

    /// A line without a price keeps its last computed total.
    fn recompute(&mut self) {
        if let Some(price) = self.unit_price {
            self.item_total = line_total(price, self.quantity);
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum LineChange {
    Inserted(LineItem),
    Updated(LineItem),
    Removed(Uuid),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CartError {
    #[error("quantity must be greater than 0")]
    InvalidQuantity,
    #[error("quantity must not exceed {}", MAX_LINE_QUANTITY)]
    QuantityTooLarge,
    #[error("order total must not exceed {}", MAX_ORDER_TOTAL)]
    TotalTooLarge,
    #[error("cart item {0} not found")]
    LineNotFound(Uuid),
    #[error(transparent)]
    Options(#[from] OptionError),
}

#[derive(Debug, Clone)]
pub struct Cart {
    order_id: Uuid,
    lines: Vec<LineItem>,
    total_amount: Decimal,
}

impl Cart {
    pub fn new(order_id: Uuid, lines: Vec<LineItem>) -> Self {
        let mut cart = Self {
            order_id,
            lines,
            total_amount: zero(),
        };
        cart.recompute_total();
        cart
    }

    pub fn order_id(&self) -> Uuid {
        self.order_id
    }

    pub fn lines(&self) -> &[LineItem] {
        &self.lines
    }

    pub fn total_amount(&self) -> Decimal {
        self.total_amount
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Sum of quantities across all lines.
    pub fn item_count(&self) -> i64 {
        self.lines.iter().map(|line| i64::from(line.quantity)).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Adds `quantity` of a menu item, merging into an existing line for the
    /// same item when there is one.
    pub fn add_item(
        &mut self,
        entry: &CatalogEntry,
        quantity: i32,
        options: SelectedOptions,
    ) -> Result<LineChange, CartError> {
        if quantity < 1 {
            return Err(CartError::InvalidQuantity);
        }

        let existing = self
            .lines
            .iter()
            .position(|line| line.menu_item_id == Some(entry.id));

        let change = match existing {
            Some(index) => {
                let line = &mut self.lines[index];
                let new_quantity = line
                    .quantity
                    .checked_add(quantity)
                    .filter(|q| *q <= MAX_LINE_QUANTITY)
                    .ok_or(CartError::QuantityTooLarge)?;

                let mut merged = line.selected_options.clone();
                merge_options(&mut merged, options);
                validate_options(&entry.option_groups, &merged)?;
                ensure_storable(
                    self.total_amount,
                    line.item_total,
                    line_total(entry.price, new_quantity),
                )?;

                line.quantity = new_quantity;
                line.selected_options = merged;
                line.unit_price = Some(entry.price);
                line.recompute();
                LineChange::Updated(line.clone())
            }
            None => {
                if quantity > MAX_LINE_QUANTITY {
                    return Err(CartError::QuantityTooLarge);
                }
                validate_options(&entry.option_groups, &options)?;
                let item_total = line_total(entry.price, quantity);
                ensure_storable(self.total_amount, zero(), item_total)?;

                let line = LineItem {
                    id: Uuid::new_v4(),
                    menu_item_id: Some(entry.id),
                    item_name: entry.name.clone(),
                    unit_price: Some(entry.price),
                    quantity,
                    selected_options: options,
                    item_total,
                };
                self.lines.push(line.clone());
                LineChange::Inserted(line)
            }
        };

        self.recompute_total();
        Ok(change)
    }

    /// Sets a line's quantity; zero or less removes the line.
    pub fn set_quantity(&mut self, line_id: Uuid, quantity: i32) -> Result<LineChange, CartError> {
        let index = self
            .lines
            .iter()
            .position(|line| line.id == line_id)
            .ok_or(CartError::LineNotFound(line_id))?;

        let change = if quantity <= 0 {
            self.lines.remove(index);
            LineChange::Removed(line_id)
        } else {
            if quantity > MAX_LINE_QUANTITY {
                return Err(CartError::QuantityTooLarge);
            }
            let line = &mut self.lines[index];
            let item_total = line
                .unit_price
                .map_or(line.item_total, |price| line_total(price, quantity));
            ensure_storable(self.total_amount, line.item_total, item_total)?;
            line.quantity = quantity;
            line.recompute();
            LineChange::Updated(line.clone())
        };

        self.recompute_total();
        Ok(change)
    }

    fn recompute_total(&mut self) {
        let sum = self
            .lines
            .iter()
            .fold(zero(), |acc, line| acc + line.item_total);
        self.total_amount = round_money(sum);
    }
}

/// Rejects a change whose resulting total would not fit the order columns.
fn ensure_storable(total: Decimal, replaced: Decimal, added: Decimal) -> Result<(), CartError> {
    if total - replaced + added > MAX_ORDER_TOTAL {
        return Err(CartError::TotalTooLarge);
    }
    Ok(())
}
