use std::sync::Arc;

use crate::{
    config::AppConfig,
    db::{DbPool, OrmConn},
};

#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub orm: OrmConn,
    pub config: Arc<AppConfig>,
}

impl AppState {
    /// Shares the ORM connection's pool with the raw sqlx queries.
    pub fn new(orm: OrmConn, config: AppConfig) -> Self {
        let pool = orm.get_postgres_connection_pool().clone();
        Self {
            pool,
            orm,
            config: Arc::new(config),
        }
    }
}
