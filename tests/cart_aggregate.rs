use proptest::prelude::*;
use rust_decimal::Decimal;
use uuid::Uuid;

use restaurant_orders_api::domain::{
    cart::{Cart, CartError, CatalogEntry, LineChange, LineItem},
    options::{OptionError, OptionGroup, OptionValue, SelectedOptions},
    pricing::{MAX_MENU_PRICE, round_money},
};

fn money(cents: i64) -> Decimal {
    Decimal::new(cents, 2)
}

fn bruschetta() -> CatalogEntry {
    CatalogEntry {
        id: Uuid::new_v4(),
        name: "Classic Bruschetta".to_string(),
        price: money(29900),
        option_groups: Vec::new(),
    }
}

fn steak() -> CatalogEntry {
    CatalogEntry {
        id: Uuid::new_v4(),
        name: "Grilled Ribeye Steak".to_string(),
        price: money(129900),
        option_groups: vec![
            OptionGroup {
                name: "Doneness".to_string(),
                choices: vec!["Rare".into(), "Medium".into(), "Well Done".into()],
                required: true,
                additional_cost: Decimal::ZERO,
            },
            OptionGroup {
                name: "Sides".to_string(),
                choices: vec!["Fries".into(), "Salad".into()],
                required: false,
                additional_cost: money(9900),
            },
        ],
    }
}

fn options(pairs: &[(&str, OptionValue)]) -> SelectedOptions {
    pairs
        .iter()
        .map(|(name, value)| (name.to_string(), value.clone()))
        .collect()
}

fn one(label: &str) -> OptionValue {
    OptionValue::One(label.to_string())
}

fn assert_total_matches_lines(cart: &Cart) {
    let sum = cart
        .lines()
        .iter()
        .fold(Decimal::ZERO, |acc, line| acc + line.item_total);
    assert_eq!(cart.total_amount(), round_money(sum));
}

#[test]
fn adding_the_same_item_twice_merges_into_one_line() {
    let item = bruschetta();
    let mut cart = Cart::new(Uuid::new_v4(), Vec::new());

    let first = cart.add_item(&item, 2, SelectedOptions::new()).unwrap();
    assert!(matches!(first, LineChange::Inserted(_)));

    let second = cart.add_item(&item, 1, SelectedOptions::new()).unwrap();
    let LineChange::Updated(line) = second else {
        panic!("expected the existing line to be updated");
    };

    assert_eq!(cart.line_count(), 1);
    assert_eq!(line.quantity, 3);
    assert_eq!(line.item_total.to_string(), "897.00");
    assert_eq!(cart.total_amount().to_string(), "897.00");
    assert_eq!(cart.item_count(), 3);
}

#[test]
fn quantity_below_one_is_rejected() {
    let mut cart = Cart::new(Uuid::new_v4(), Vec::new());
    assert_eq!(
        cart.add_item(&bruschetta(), 0, SelectedOptions::new()),
        Err(CartError::InvalidQuantity)
    );
    assert!(cart.is_empty());
}

#[test]
fn line_quantity_is_capped() {
    let item = bruschetta();
    let mut cart = Cart::new(Uuid::new_v4(), Vec::new());
    cart.add_item(&item, 98, SelectedOptions::new()).unwrap();

    assert_eq!(
        cart.add_item(&item, 2, SelectedOptions::new()),
        Err(CartError::QuantityTooLarge)
    );
    assert_eq!(cart.lines()[0].quantity, 98);
}

#[test]
fn merged_options_override_existing_keys() {
    let item = steak();
    let mut cart = Cart::new(Uuid::new_v4(), Vec::new());
    cart.add_item(
        &item,
        1,
        options(&[("Doneness", one("Rare")), ("Sides", one("Fries"))]),
    )
    .unwrap();
    cart.add_item(&item, 1, options(&[("Doneness", one("Medium"))]))
        .unwrap();

    let line = &cart.lines()[0];
    assert_eq!(line.selected_options.get("Doneness"), Some(&one("Medium")));
    assert_eq!(line.selected_options.get("Sides"), Some(&one("Fries")));
    // Option costs are informational only.
    assert_eq!(line.item_total, money(259800));
}

#[test]
fn options_are_validated_against_the_menu_item() {
    let item = steak();
    let mut cart = Cart::new(Uuid::new_v4(), Vec::new());

    assert_eq!(
        cart.add_item(&item, 1, SelectedOptions::new()),
        Err(CartError::Options(OptionError::MissingRequired(
            "Doneness".to_string()
        )))
    );
    assert_eq!(
        cart.add_item(&item, 1, options(&[("Sauce", one("Pepper"))])),
        Err(CartError::Options(OptionError::UnknownGroup(
            "Sauce".to_string()
        )))
    );
    assert_eq!(
        cart.add_item(&item, 1, options(&[("Doneness", one("Blue"))])),
        Err(CartError::Options(OptionError::InvalidChoice {
            group: "Doneness".to_string(),
            choice: "Blue".to_string(),
        }))
    );
    assert!(
        cart.add_item(
            &item,
            1,
            options(&[
                ("Doneness", one("Rare")),
                ("Sides", OptionValue::Many(vec!["Fries".into(), "Salad".into()])),
            ]),
        )
        .is_ok()
    );
}

#[test]
fn setting_quantity_to_zero_removes_the_line() {
    let item = bruschetta();
    let mut cart = Cart::new(Uuid::new_v4(), Vec::new());
    cart.add_item(&item, 2, SelectedOptions::new()).unwrap();
    let line_id = cart.lines()[0].id;

    assert_eq!(cart.set_quantity(line_id, 0), Ok(LineChange::Removed(line_id)));
    assert!(cart.is_empty());
    assert_eq!(cart.total_amount().to_string(), "0.00");
}

#[test]
fn unknown_line_is_reported() {
    let mut cart = Cart::new(Uuid::new_v4(), Vec::new());
    let missing = Uuid::new_v4();
    assert_eq!(
        cart.set_quantity(missing, 1),
        Err(CartError::LineNotFound(missing))
    );
}

#[test]
fn lines_of_deleted_items_keep_their_frozen_total() {
    let orphan = LineItem {
        id: Uuid::new_v4(),
        menu_item_id: None,
        item_name: "Seasonal Special".to_string(),
        unit_price: None,
        quantity: 2,
        selected_options: SelectedOptions::new(),
        item_total: money(120000),
    };
    let mut cart = Cart::new(Uuid::new_v4(), vec![orphan.clone()]);
    assert!(!cart.lines()[0].is_available());

    cart.set_quantity(orphan.id, 5).unwrap();
    assert_eq!(cart.lines()[0].quantity, 5);
    assert_eq!(cart.lines()[0].item_total, money(120000));

    cart.add_item(&bruschetta(), 1, SelectedOptions::new())
        .unwrap();
    assert_eq!(cart.total_amount(), money(149900));
}

fn priciest(name: &str) -> CatalogEntry {
    CatalogEntry {
        id: Uuid::new_v4(),
        name: name.to_string(),
        price: MAX_MENU_PRICE,
        option_groups: Vec::new(),
    }
}

#[test]
fn totals_beyond_the_order_column_are_rejected() {
    let caviar = priciest("Caviar Platter");
    let truffle = priciest("Truffle Tasting");
    let mut cart = Cart::new(Uuid::new_v4(), Vec::new());

    cart.add_item(&caviar, 99, SelectedOptions::new()).unwrap();
    assert_eq!(cart.total_amount().to_string(), "98999999.01");

    assert_eq!(
        cart.add_item(&truffle, 99, SelectedOptions::new()),
        Err(CartError::TotalTooLarge)
    );
    assert_eq!(cart.line_count(), 1);

    cart.add_item(&truffle, 1, SelectedOptions::new()).unwrap();
    assert_eq!(cart.total_amount().to_string(), "99999999.00");
    let truffle_line = cart.lines()[1].id;

    assert_eq!(
        cart.set_quantity(truffle_line, 2),
        Err(CartError::TotalTooLarge)
    );
    assert_eq!(cart.lines()[1].quantity, 1);
    assert_eq!(cart.total_amount().to_string(), "99999999.00");
    assert_total_matches_lines(&cart);
}

#[derive(Debug, Clone)]
enum Op {
    Add { item: usize, quantity: i32 },
    Set { line: usize, quantity: i32 },
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0usize..3, -2i32..120).prop_map(|(item, quantity)| Op::Add { item, quantity }),
        (0usize..5, -2i32..120).prop_map(|(line, quantity)| Op::Set { line, quantity }),
    ]
}

proptest! {
    #[test]
    fn total_always_equals_sum_of_lines(
        prices in proptest::collection::vec(0i64..500_000, 3),
        ops in proptest::collection::vec(op_strategy(), 0..40),
    ) {
        let catalog: Vec<CatalogEntry> = prices
            .iter()
            .enumerate()
            .map(|(index, cents)| CatalogEntry {
                id: Uuid::new_v4(),
                name: format!("Item {index}"),
                price: money(*cents),
                option_groups: Vec::new(),
            })
            .collect();
        let mut cart = Cart::new(Uuid::new_v4(), Vec::new());

        for op in ops {
            match op {
                Op::Add { item, quantity } => {
                    let _ = cart.add_item(&catalog[item], quantity, SelectedOptions::new());
                }
                Op::Set { line, quantity } => {
                    if let Some(line_id) = cart.lines().get(line).map(|line| line.id) {
                        let _ = cart.set_quantity(line_id, quantity);
                    }
                }
            }

            assert_total_matches_lines(&cart);
            prop_assert!(cart.lines().iter().all(|line| (1..=99).contains(&line.quantity)));
            prop_assert!(cart.line_count() <= catalog.len());
        }
    }
}
