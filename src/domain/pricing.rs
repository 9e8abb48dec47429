use rust_decimal::{Decimal, RoundingStrategy};

/// GST applied to every order total shown to customers or charged.
pub const TAX_RATE: Decimal = Decimal::from_parts(18, 0, 0, false, 2);

/// Upper bound on the quantity of a single cart line.
pub const MAX_LINE_QUANTITY: i32 = 99;

/// Largest menu price a `NUMERIC(8, 2)` column holds: 999999.99.
pub const MAX_MENU_PRICE: Decimal = Decimal::from_parts(99_999_999, 0, 0, false, 2);

/// Largest option surcharge a `NUMERIC(6, 2)` column holds: 9999.99.
pub const MAX_OPTION_COST: Decimal = Decimal::from_parts(999_999, 0, 0, false, 2);

/// Largest order or line total a `NUMERIC(10, 2)` column holds: 99999999.99.
pub const MAX_ORDER_TOTAL: Decimal = Decimal::from_parts(1_410_065_407, 2, 0, false, 2);

const MONEY_SCALE: u32 = 2;

/// `0.00`, the total of an empty cart.
pub fn zero() -> Decimal {
    Decimal::new(0, MONEY_SCALE)
}

pub fn round_money(value: Decimal) -> Decimal {
    let mut rounded = value.round_dp_with_strategy(MONEY_SCALE, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(MONEY_SCALE);
    rounded
}

pub fn line_total(unit_price: Decimal, quantity: i32) -> Decimal {
    round_money(unit_price * Decimal::from(quantity))
}

pub fn tax_amount(total: Decimal) -> Decimal {
    round_money(total * TAX_RATE)
}

pub fn total_with_tax(total: Decimal) -> Decimal {
    round_money(total + tax_amount(total))
}
