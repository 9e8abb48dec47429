use chrono::Duration;
use rust_decimal::Decimal;
use uuid::Uuid;

use restaurant_orders_api::{
    config::AppConfig,
    db::{DbPool, create_orm_conn, run_migrations},
    middleware::auth::{CUSTOMER_ROLE, STAFF_ROLE, issue_token},
    state::AppState,
};

struct SeedItem {
    name: &'static str,
    price: i64,
    description: &'static str,
    category: &'static str,
}

const DEFAULT_MENU: [SeedItem; 13] = [
    SeedItem {
        name: "Classic Bruschetta",
        price: 29900,
        description: "Toasted bread topped with fresh tomatoes, basil, and extra virgin olive oil",
        category: "starters",
    },
    SeedItem {
        name: "Crispy Calamari",
        price: 39900,
        description: "Lightly fried squid rings served with lemon aioli",
        category: "starters",
    },
    SeedItem {
        name: "Stuffed Mushrooms",
        price: 34900,
        description: "Mushrooms stuffed with cheese and herbs",
        category: "starters",
    },
    SeedItem {
        name: "Grilled Ribeye Steak",
        price: 129900,
        description: "12oz prime ribeye with roasted garlic butter and seasonal vegetables",
        category: "mains",
    },
    SeedItem {
        name: "Herb Roasted Chicken",
        price: 69900,
        description: "Free-range chicken with herbs, roasted potatoes, and natural jus",
        category: "mains",
    },
    SeedItem {
        name: "Margherita Pizza",
        price: 44900,
        description: "Classic pizza with fresh tomatoes, mozzarella, basil, and olive oil",
        category: "mains",
    },
    SeedItem {
        name: "Pan-Seared Sea Bass",
        price: 119900,
        description: "Fresh sea bass fillet with crispy skin, served with saffron risotto and asparagus",
        category: "seafood",
    },
    SeedItem {
        name: "Grilled Octopus",
        price: 89900,
        description: "Tender octopus marinated in herbs and olive oil, served with roasted potatoes",
        category: "seafood",
    },
    SeedItem {
        name: "Seafood Paella",
        price: 129900,
        description: "Spanish rice with mixed seafood, saffron, and seasonal vegetables",
        category: "seafood",
    },
    SeedItem {
        name: "Tuna Tartare",
        price: 79900,
        description: "Fresh tuna diced and seasoned, served with avocado and crispy wontons",
        category: "seafood",
    },
    SeedItem {
        name: "Chocolate Lava Cake",
        price: 29900,
        description: "Warm chocolate cake with molten center and vanilla ice cream",
        category: "desserts",
    },
    SeedItem {
        name: "Tiramisu",
        price: 34900,
        description: "Classic Italian dessert with coffee-soaked ladyfingers and mascarpone",
        category: "desserts",
    },
    SeedItem {
        name: "Crème Brûlée",
        price: 29900,
        description: "Rich vanilla custard with caramelized sugar crust",
        category: "desserts",
    },
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;
    let orm = create_orm_conn(&config.database_url).await?;
    let state = AppState::new(orm, config);
    run_migrations(&state.pool).await?;

    let staff_id = ensure_user(&state.pool, "staff", "staff@example.com", true).await?;
    let customer_id = ensure_user(&state.pool, "customer", "customer@example.com", false).await?;
    seed_menu(&state.pool).await?;

    println!("Seed completed. Staff ID: {staff_id}, Customer ID: {customer_id}");

    match state.config.jwt_secret.as_deref() {
        Some(secret) => {
            let ttl = Duration::days(7);
            let staff_token = issue_token(secret, staff_id, STAFF_ROLE, ttl)?;
            let customer_token = issue_token(secret, customer_id, CUSTOMER_ROLE, ttl)?;
            println!("Staff token: {staff_token}");
            println!("Customer token: {customer_token}");
        }
        None => println!("JWT_SECRET is not set; no tokens issued"),
    }

    Ok(())
}

async fn ensure_user(
    pool: &DbPool,
    username: &str,
    email: &str,
    is_staff: bool,
) -> anyhow::Result<Uuid> {
    let (id,): (Uuid,) = sqlx::query_as(
        r#"
        INSERT INTO users (id, username, email, is_staff)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (username) DO UPDATE SET is_staff = EXCLUDED.is_staff
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(username)
    .bind(email)
    .bind(is_staff)
    .fetch_one(pool)
    .await?;

    println!("Ensured user {username} (staff={is_staff})");
    Ok(id)
}

async fn seed_menu(pool: &DbPool) -> anyhow::Result<()> {
    for item in &DEFAULT_MENU {
        sqlx::query(
            r#"
            INSERT INTO menu_items (id, name, description, price, category)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (name) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(item.name)
        .bind(item.description)
        .bind(Decimal::new(item.price, 2))
        .bind(item.category)
        .execute(pool)
        .await?;
    }

    seed_option(
        pool,
        "Grilled Ribeye Steak",
        "Doneness",
        &["Rare", "Medium Rare", "Medium", "Well Done"],
        true,
        Decimal::ZERO,
    )
    .await?;
    seed_option(
        pool,
        "Margherita Pizza",
        "Extras",
        &["Olives", "Jalapeños", "Extra Cheese"],
        false,
        Decimal::new(4900, 2),
    )
    .await?;

    println!("Seeded menu");
    Ok(())
}

async fn seed_option(
    pool: &DbPool,
    item_name: &str,
    option_name: &str,
    choices: &[&str],
    required: bool,
    additional_cost: Decimal,
) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        INSERT INTO menu_item_options (id, menu_item_id, name, choices, required, additional_cost, position)
        SELECT $1, id, $3, $4, $5, $6, 0 FROM menu_items WHERE name = $2
        ON CONFLICT (menu_item_id, name) DO NOTHING
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(item_name)
    .bind(option_name)
    .bind(serde_json::json!(choices))
    .bind(required)
    .bind(additional_cost)
    .execute(pool)
    .await?;
    Ok(())
}
