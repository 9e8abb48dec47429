use restaurant_orders_api::{
    config::AppConfig,
    db::{create_orm_conn, run_migrations},
    state::AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;
    let orm = create_orm_conn(&config.database_url).await?;
    let state = AppState::new(orm, config);
    run_migrations(&state.pool).await?;
    println!("Migrations applied");
    Ok(())
}
